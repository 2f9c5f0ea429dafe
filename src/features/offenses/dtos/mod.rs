mod offense_dto;

pub use offense_dto::*;
