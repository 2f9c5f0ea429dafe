mod officer_handler;

pub use officer_handler::*;
