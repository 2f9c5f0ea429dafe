mod choices_handler;

pub use choices_handler::*;
