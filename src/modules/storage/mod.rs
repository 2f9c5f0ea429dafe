//! Attachment storage.
//!
//! Files are addressed by a path relative to the storage root, laid out as
//! `<incident_number>/<filename>`.

mod local_storage;

use async_trait::async_trait;

use crate::core::error::Result;

pub use local_storage::{sanitize_filename, LocalStorage};

#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Store `content` as `<dir>/<filename>` and return the relative path
    /// actually used. An existing file is never overwritten.
    async fn save(&self, dir: &str, filename: &str, content: &[u8]) -> Result<String>;

    async fn open(&self, path: &str) -> Result<Vec<u8>>;

    /// Delete one file. Missing files are not an error.
    async fn delete(&self, path: &str) -> Result<()>;

    /// Delete a directory and everything in it. Missing directories are not an error.
    async fn remove_dir(&self, dir: &str) -> Result<()>;

    /// Move a directory to a new name. A missing source is not an error; an
    /// existing target is a conflict.
    async fn rename_dir(&self, from: &str, to: &str) -> Result<()>;
}
