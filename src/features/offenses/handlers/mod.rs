mod offense_handler;

pub use offense_handler::*;
