//! Infrastructure adapters: attachment storage and PDF rendering

pub mod pdf;
pub mod storage;
