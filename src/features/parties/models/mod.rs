mod party;

pub use party::{Party, PartyType, Race, Sex};
