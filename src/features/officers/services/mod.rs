mod officer_service;

pub use officer_service::OfficerService;
