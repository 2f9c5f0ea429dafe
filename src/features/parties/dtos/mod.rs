mod party_dto;

pub use party_dto::*;
