mod choices_dto;

pub use choices_dto::*;
