mod offense;

pub use offense::Offense;
