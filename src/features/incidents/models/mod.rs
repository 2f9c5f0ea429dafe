mod address;
mod incident;

pub use address::Address;
pub use incident::{Incident, IncidentListRow, OfficerSummary, Shift};
