//! File-backed preferences document
//!
//! The whole document is read on every request that needs it and replaced on
//! every change.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::Preferences;

/// Persistence for the preferences document
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Reads the stored document; a missing document yields defaults
    async fn load(&self) -> AppResult<Preferences>;

    /// Replaces the stored document
    async fn save(&self, preferences: &Preferences) -> AppResult<()>;
}

/// Stores preferences as pretty-printed JSON in a single file
#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Unique sibling path for one save, so concurrent saves never share a
    /// temp file
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "preferences.json".into());
        name.push(format!(".{}.tmp", Uuid::new_v4().simple()));
        self.path.with_file_name(name)
    }
}

fn storage_error(action: &str, path: &Path, e: std::io::Error) -> AppError {
    let msg = match e.kind() {
        ErrorKind::PermissionDenied => format!("Permission denied: cannot {} {:?}", action, path),
        ErrorKind::NotFound => format!("Cannot {} {:?}: path not found", action, path),
        _ => format!("Failed to {} {:?}: {}", action, path, e),
    };
    AppError::Storage(msg)
}

#[async_trait::async_trait]
impl PreferenceStore for FilePreferenceStore {
    async fn load(&self) -> AppResult<Preferences> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = ?self.path, "No preferences file, using defaults");
                return Ok(Preferences::default());
            }
            Err(e) => return Err(storage_error("read", &self.path, e)),
        };

        // Empty file is treated as non-existent
        if content.trim().is_empty() {
            return Ok(Preferences::default());
        }

        serde_json::from_str(&content)
            .map_err(|e| AppError::Storage(format!("Failed to parse {:?}: {}", self.path, e)))
    }

    async fn save(&self, preferences: &Preferences) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| storage_error("create directory", parent, e))?;
            }
        }

        let content = serde_json::to_string_pretty(preferences)
            .map_err(|e| AppError::Storage(format!("Failed to serialize preferences: {}", e)))?;

        // Write then rename so readers never observe a partial document
        let temp = self.temp_path();
        fs::write(&temp, content)
            .await
            .map_err(|e| storage_error("write", &temp, e))?;
        if let Err(e) = fs::rename(&temp, &self.path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(storage_error("replace", &self.path, e));
        }

        tracing::debug!(path = ?self.path, "Saved preferences");
        Ok(())
    }
}

/// Loads preferences, falling back to defaults when the store fails
pub async fn load_or_default(store: &dyn PreferenceStore) -> Preferences {
    match store.load().await {
        Ok(preferences) => preferences,
        Err(e) => {
            tracing::warn!(error = %e, "Preferences unavailable, using defaults");
            Preferences::default()
        }
    }
}
