//! Username/password login backed by locally signed HS256 tokens.
//!
//! | Method | Endpoint | Auth | Description |
//! |--------|----------|------|-------------|
//! | POST | `/api/auth/token` | No | Obtain a token |
//! | POST | `/api/auth/token/refresh` | No | Refresh a still-valid token |
//! | GET | `/api/auth/me` | Yes | Current user and officer |

pub mod dtos;
pub mod handlers;
pub mod jwt;
pub mod model;
pub mod password;
pub mod routes;
pub mod services;

pub use jwt::JwtService;
pub use services::AuthService;
