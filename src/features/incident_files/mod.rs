//! Files attached to incidents, stored on disk under
//! `<MEDIA_ROOT>/<incident_number>/`.
//!
//! | Method | Endpoint | Auth | Description |
//! |--------|----------|------|-------------|
//! | GET | `/api/incidents/{incident_id}/files` | Yes | List files |
//! | POST | `/api/incidents/{incident_id}/files` | Yes | Upload (multipart) |
//! | GET | `/api/incidents/{incident_id}/files/{id}` | Yes | File metadata |
//! | DELETE | `/api/incidents/{incident_id}/files/{id}` | Yes | Delete row and file |
//! | GET | `/api/incidents/{incident_id}/files/{id}/download` | Yes | Raw bytes |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use services::IncidentFileService;
