//! GCIC/UCR offense codes that incidents are classified under.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use services::OffenseService;
