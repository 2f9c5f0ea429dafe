//! Victims and suspects involved in an incident.
//!
//! Both collections share one table and one set of handlers; the route
//! decides the party type.
//!
//! | Method | Endpoint | Auth | Description |
//! |--------|----------|------|-------------|
//! | GET | `/api/incidents/{incident_id}/victims` | Yes | List victims |
//! | POST | `/api/incidents/{incident_id}/victims` | Yes | Add victim |
//! | GET | `/api/incidents/{incident_id}/victims/{id}` | Yes | Get victim |
//! | PATCH | `/api/incidents/{incident_id}/victims/{id}` | Yes | Update victim |
//! | DELETE | `/api/incidents/{incident_id}/victims/{id}` | Yes | Delete victim |
//! | * | `/api/incidents/{incident_id}/suspects[/{id}]` | Yes | Same, for suspects |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use services::PartyService;
