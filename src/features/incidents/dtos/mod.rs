mod address_dto;
mod incident_dto;

pub use address_dto::*;
pub use incident_dto::*;
