mod party_handler;

pub use party_handler::*;
