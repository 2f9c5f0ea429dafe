//! Plain-text PDF output on US-letter pages.

mod courier_document;

pub use courier_document::{wrap, CourierDocument};
