//! Incident reports, their locations and offenses.
//!
//! | Method | Endpoint | Auth | Description |
//! |--------|----------|------|-------------|
//! | GET | `/api/incidents` | Yes | List incidents |
//! | POST | `/api/incidents` | Yes | Create incident with victims and suspects |
//! | GET | `/api/incidents/search` | Yes | Filter incidents |
//! | POST | `/api/incidents/form` | Yes | Create from a flat urlencoded form |
//! | GET | `/api/incidents/print/{id}` | Yes | PDF report |
//! | GET | `/api/incidents/{incident_id}` | Yes | Get incident |
//! | PATCH | `/api/incidents/{incident_id}` | Yes | Update incident |
//! | DELETE | `/api/incidents/{incident_id}` | Yes | Delete incident and its files |
//! | GET | `/api/incidents/{incident_id}/form` | Yes | Flattened form data |

pub mod dtos;
pub mod forms;
pub mod handlers;
pub mod models;
pub mod printing;
pub mod routes;
pub mod search;
pub mod services;

pub use services::IncidentService;
