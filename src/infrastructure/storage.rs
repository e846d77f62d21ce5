//! Local filesystem implementation of ImageStore

use async_trait::async_trait;
use std::path::PathBuf;

use crate::domain::{DomainError, ImageStore};

/// Writes images under `root`; they are served by `ServeDir` at `public_base`.
pub struct LocalImageStore {
    root: PathBuf,
    public_base: String,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>, public_base: &str) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.trim_end_matches('/').to_string(),
        }
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, DomainError> {
        // Names are generated server-side, but never let one escape the root
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(DomainError::Storage(format!("Invalid object name '{}'", name)));
        }
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn save(&self, name: &str, bytes: &[u8]) -> Result<String, DomainError> {
        let path = self.path_for(name)?;
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(&path, bytes).await?;
        tracing::info!("Stored upload {} ({} bytes)", path.display(), bytes.len());
        Ok(format!("{}/{}", self.public_base, name))
    }

    async fn remove(&self, name: &str) -> Result<(), DomainError> {
        let path = self.path_for(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
