mod party_service;

pub(crate) use party_service::{insert, load_for_incident};
pub use party_service::PartyService;
