mod incident_file_service;

pub(crate) use incident_file_service::{load_for_incident, move_paths};
pub use incident_file_service::IncidentFileService;
