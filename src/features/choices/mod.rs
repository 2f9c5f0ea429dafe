//! Static choice lists used by forms and validation.
//!
//! | Method | Endpoint | Auth | Description |
//! |--------|----------|------|-------------|
//! | GET | `/api/choices` | No | All choice lists |

pub mod dtos;
pub mod handlers;
pub mod routes;
