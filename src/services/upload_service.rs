//! Upload Service - image sniffing and storage

use image::ImageFormat;

use crate::domain::{DomainError, ImageStore, ImageUpload};

/// Image kinds accepted for product and profile pictures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
    WebP,
}

impl ImageKind {
    pub fn mime(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
            ImageKind::Gif => "image/gif",
            ImageKind::WebP => "image/webp",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpg",
            ImageKind::Png => "png",
            ImageKind::Gif => "gif",
            ImageKind::WebP => "webp",
        }
    }

    fn from_extension(filename: &str) -> Option<Self> {
        let ext = filename.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(ImageKind::Jpeg),
            "png" => Some(ImageKind::Png),
            "gif" => Some(ImageKind::Gif),
            "webp" => Some(ImageKind::WebP),
            _ => None,
        }
    }
}

/// Check size and magic bytes. The file extension is only advisory.
pub fn inspect_image(upload: &ImageUpload, max_bytes: usize) -> Result<ImageKind, DomainError> {
    let filename = upload
        .filename
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| DomainError::BadRequest("No file provided".to_string()))?;

    if upload.bytes.len() > max_bytes {
        return Err(DomainError::PayloadTooLarge(format!(
            "File too large. Maximum size is {:.1} MB",
            max_bytes as f64 / (1024.0 * 1024.0)
        )));
    }

    let detected = image::guess_format(&upload.bytes).ok();
    let kind = match detected {
        Some(ImageFormat::Jpeg) => ImageKind::Jpeg,
        Some(ImageFormat::Png) => ImageKind::Png,
        Some(ImageFormat::Gif) => ImageKind::Gif,
        Some(ImageFormat::WebP) => ImageKind::WebP,
        other => {
            let label = other
                .map(|f| format!("{:?}", f).to_lowercase())
                .unwrap_or_else(|| "unknown".to_string());
            return Err(DomainError::UnsupportedMediaType(format!(
                "File type '{}' is not allowed. Allowed types: image/jpeg, image/png, image/gif, image/webp",
                label
            )));
        }
    };

    if let Some(claimed) = ImageKind::from_extension(filename) {
        if claimed != kind {
            tracing::warn!(
                "MIME type mismatch for {}: extension suggests {}, content is {}",
                filename,
                claimed.mime(),
                kind.mime()
            );
        }
    }

    tracing::info!(
        "Image upload validated: {} ({} bytes, {})",
        filename,
        upload.bytes.len(),
        kind.mime()
    );
    Ok(kind)
}

/// Image store plus the size cap, handed to services that accept pictures
#[derive(Clone, Copy)]
pub struct Uploads<'a> {
    pub store: &'a dyn ImageStore,
    pub max_bytes: usize,
}

impl<'a> Uploads<'a> {
    pub fn new(store: &'a dyn ImageStore, max_bytes: usize) -> Self {
        Self { store, max_bytes }
    }

    /// Validate then store under a fresh name; returns the public URL
    pub async fn store(&self, upload: &ImageUpload) -> Result<String, DomainError> {
        let kind = inspect_image(upload, self.max_bytes)?;
        let name = format!("{}.{}", uuid::Uuid::new_v4(), kind.extension());
        self.store.save(&name, &upload.bytes).await
    }

    /// Remove a freshly stored image when the write that should reference it failed
    pub async fn discard_on_error<T, E>(&self, url: Option<&str>, result: Result<T, E>) -> Result<T, E> {
        if let (Err(_), Some(url)) = (&result, url) {
            self.discard(url).await;
        }
        result
    }

    /// Best-effort removal of a previously stored image, given its public URL
    pub async fn discard(&self, url: &str) {
        let Some(name) = url.rsplit('/').next().filter(|n| !n.is_empty()) else {
            return;
        };
        if let Err(e) = self.store.remove(name).await {
            tracing::warn!("Could not remove old image {}: {}", url, e);
        }
    }
}
