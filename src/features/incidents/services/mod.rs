pub mod address_service;
mod incident_service;

pub use incident_service::IncidentService;
