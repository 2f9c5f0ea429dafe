//! Officers and the user accounts they log in with.
//!
//! | Method | Endpoint | Auth | Description |
//! |--------|----------|------|-------------|
//! | GET | `/api/officers` | Yes | List officers |
//! | POST | `/api/officers` | Yes | Create officer and user |
//! | GET | `/api/officers/{id}` | Yes | Get officer |
//! | PATCH | `/api/officers/{id}` | Yes | Update officer |
//! | DELETE | `/api/officers/{id}` | Yes | Delete officer and user |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use services::OfficerService;
