mod incident_file;

pub use incident_file::IncidentFile;
