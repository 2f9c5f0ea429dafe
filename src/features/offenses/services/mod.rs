mod offense_service;

pub use offense_service::OffenseService;
