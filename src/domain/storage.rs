//! Storage seam for uploaded pictures

use async_trait::async_trait;

use super::DomainError;

/// A file received from a multipart form
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Where validated images end up.
///
/// `save` receives a collision-free object name and returns the public URL
/// clients should use to fetch the file.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn save(&self, name: &str, bytes: &[u8]) -> Result<String, DomainError>;

    async fn remove(&self, name: &str) -> Result<(), DomainError>;
}
