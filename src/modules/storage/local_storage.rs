use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::modules::storage::FileStorage;

const SUFFIX_LEN: usize = 7;

/// Reduce an uploaded filename to a safe single path component
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or("");
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

/// `report.pdf` becomes `report_<suffix>.pdf`
fn with_suffix(filename: &str, suffix: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}_{}.{}", stem, suffix, ext),
        _ => format!("{}_{}", filename, suffix),
    }
}

fn random_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..SUFFIX_LEN].to_string()
}

fn storage_error(action: &str, path: &Path, e: std::io::Error) -> AppError {
    tracing::error!("Failed to {} {}: {:?}", action, path.display(), e);
    AppError::Storage(format!("Failed to {} file", action))
}

/// Files on the local disk under a root directory
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a relative path under the root, refusing anything that could
    /// escape it
    fn resolve(&self, relative: &str) -> Result<PathBuf> {
        let relative = Path::new(relative);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !safe || relative.as_os_str().is_empty() {
            return Err(AppError::BadRequest(format!(
                "Invalid storage path '{}'",
                relative.display()
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl FileStorage for LocalStorage {
    async fn save(&self, dir: &str, filename: &str, content: &[u8]) -> Result<String> {
        let dir_path = self.resolve(dir)?;
        fs::create_dir_all(&dir_path)
            .await
            .map_err(|e| storage_error("create", &dir_path, e))?;

        let filename = sanitize_filename(filename);
        let mut candidate = filename.clone();
        loop {
            let path = dir_path.join(&candidate);
            // create_new refuses names that are already taken
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(mut file) => {
                    use tokio::io::AsyncWriteExt;
                    file.write_all(content)
                        .await
                        .map_err(|e| storage_error("write", &path, e))?;
                    file.flush()
                        .await
                        .map_err(|e| storage_error("write", &path, e))?;
                    break;
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    candidate = with_suffix(&filename, &random_suffix());
                }
                Err(e) => return Err(storage_error("create", &path, e)),
            }
        }

        let relative = format!("{}/{}", dir, candidate);
        tracing::debug!("Stored {} ({} bytes)", relative, content.len());
        Ok(relative)
    }

    async fn open(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.resolve(path)?;
        fs::read(&full).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                AppError::NotFound(format!("File '{}' not found", path))
            } else {
                storage_error("read", &full, e)
            }
        })
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let full = self.resolve(path)?;
        match fs::remove_file(&full).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!("File {} was already gone", full.display());
                Ok(())
            }
            Err(e) => Err(storage_error("delete", &full, e)),
        }
    }

    async fn remove_dir(&self, dir: &str) -> Result<()> {
        let full = self.resolve(dir)?;
        match fs::remove_dir_all(&full).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error("delete", &full, e)),
        }
    }

    async fn rename_dir(&self, from: &str, to: &str) -> Result<()> {
        let source = self.resolve(from)?;
        let target = self.resolve(to)?;

        let source_exists = fs::try_exists(&source)
            .await
            .map_err(|e| storage_error("read", &source, e))?;
        if !source_exists {
            return Ok(());
        }
        let target_exists = fs::try_exists(&target)
            .await
            .map_err(|e| storage_error("read", &target, e))?;
        if target_exists {
            return Err(AppError::Conflict(format!(
                "Storage directory '{}' already exists",
                to
            )));
        }

        fs::rename(&source, &target)
            .await
            .map_err(|e| storage_error("move", &source, e))?;
        tracing::debug!("Moved {} to {}", from, to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("report.pdf"), "report.pdf");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\photos\\scene 1.jpg"), "scene_1.jpg");
        assert_eq!(sanitize_filename(".hidden"), "hidden");
        assert_eq!(sanitize_filename(""), "file");
    }

    #[test]
    fn test_with_suffix() {
        assert_eq!(with_suffix("scene.jpg", "abc1234"), "scene_abc1234.jpg");
        assert_eq!(with_suffix("notes", "abc1234"), "notes_abc1234");
        assert_eq!(with_suffix("archive.tar.gz", "x"), "archive.tar_x.gz");
    }

    #[tokio::test]
    async fn test_save_open_and_collisions() {
        let root = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(root.path());

        let first = storage.save("2024-001", "scene.jpg", b"one").await.unwrap();
        assert_eq!(first, "2024-001/scene.jpg");

        let second = storage.save("2024-001", "scene.jpg", b"two").await.unwrap();
        assert_ne!(second, first);
        assert!(second.starts_with("2024-001/scene_"));
        assert!(second.ends_with(".jpg"));
        assert_eq!(second.len(), first.len() + 1 + SUFFIX_LEN);

        assert_eq!(storage.open(&first).await.unwrap(), b"one");
        assert_eq!(storage.open(&second).await.unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_delete_and_remove_dir() {
        let root = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(root.path());

        let path = storage.save("2024-002", "notes.txt", b"x").await.unwrap();
        storage.delete(&path).await.unwrap();
        assert!(matches!(
            storage.open(&path).await,
            Err(AppError::NotFound(_))
        ));
        storage.delete(&path).await.unwrap();

        storage.save("2024-002", "a.txt", b"a").await.unwrap();
        storage.remove_dir("2024-002").await.unwrap();
        assert!(!root.path().join("2024-002").exists());
        storage.remove_dir("2024-002").await.unwrap();
    }

    #[tokio::test]
    async fn test_rename_dir() {
        let root = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(root.path());

        let path = storage.save("2024-003", "scene.jpg", b"img").await.unwrap();
        storage.rename_dir("2024-003", "2024-003A").await.unwrap();
        assert!(!root.path().join("2024-003").exists());
        assert_eq!(storage.open("2024-003A/scene.jpg").await.unwrap(), b"img");
        assert!(matches!(
            storage.open(&path).await,
            Err(AppError::NotFound(_))
        ));

        // nothing stored yet
        storage.rename_dir("2024-004", "2024-005").await.unwrap();
        assert!(!root.path().join("2024-005").exists());

        storage.save("2024-006", "a.txt", b"a").await.unwrap();
        assert!(matches!(
            storage.rename_dir("2024-006", "2024-003A").await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            storage.rename_dir("2024-006", "../outside").await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_escaping_paths() {
        let root = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(root.path());

        assert!(matches!(
            storage.open("../secret").await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            storage.remove_dir("/").await,
            Err(AppError::BadRequest(_))
        ));
    }
}
