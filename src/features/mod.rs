pub mod auth;
pub mod choices;
pub mod incident_files;
pub mod incidents;
pub mod offenses;
pub mod officers;
pub mod parties;
