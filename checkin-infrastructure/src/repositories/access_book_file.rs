use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use checkin_domain::{AccessBook, AccessRepository};

/// Whitelist and access requests persisted as one JSON document.
pub struct JsonAccessRepository {
    path: PathBuf,
}

impl JsonAccessRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AccessRepository for JsonAccessRepository {
    async fn load(&self) -> anyhow::Result<AccessBook> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "access book not found, starting empty");
            return Ok(AccessBook::default());
        }
        let content = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("read {}", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(AccessBook::default());
        }
        let book = serde_json::from_str(&content)
            .with_context(|| format!("parse {}", self.path.display()))?;
        Ok(book)
    }

    async fn save(&self, book: &AccessBook) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let content = serde_json::to_string_pretty(book)?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, content).await?;
        fs::rename(&staging, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkin_domain::WhitelistEntry;

    #[tokio::test]
    async fn missing_file_loads_empty_book() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = JsonAccessRepository::new(dir.path().join("access_book.json"));
        assert_eq!(repo.load().await.expect("load"), AccessBook::default());
    }

    #[tokio::test]
    async fn save_creates_parent_and_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = JsonAccessRepository::new(dir.path().join("state/access_book.json"));
        let mut book = AccessBook::default();
        book.allow(WhitelistEntry {
            ip: "10.0.0.4".to_string(),
            label: Some("Desk 4".to_string()),
            added_at: 1_700_000_000_000,
            added_by: Some("admin".to_string()),
        });

        repo.save(&book).await.expect("save");

        assert!(repo.path().exists());
        assert!(!repo.path().with_extension("json.tmp").exists());
        assert_eq!(repo.load().await.expect("load"), book);
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("access_book.json");
        std::fs::write(&path, "{ not json").expect("write");

        let err = JsonAccessRepository::new(&path).load().await.expect_err("corrupt");
        assert!(err.to_string().contains("parse"));
    }
}
