use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{HubError, Result};

/// A picked image, held in memory until it is relayed.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Bytes,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".into());
        Ok(Self::new(file_name, bytes))
    }

    pub fn mime_type(&self) -> &'static str {
        let ext = Path::new(&self.file_name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "svg" => "image/svg+xml",
            "bmp" => "image/bmp",
            _ => "application/octet-stream",
        }
    }

    /// Inline `data:` URL carrying the whole image.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), STANDARD.encode(&self.bytes))
    }
}

/// Where an image ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    Hosted(String),
    /// Upload failed; only this process can render it.
    Preview(String),
}

impl ImageRef {
    pub fn url(&self) -> &str {
        match self {
            Self::Hosted(url) | Self::Preview(url) => url,
        }
    }

    pub fn into_url(self) -> String {
        match self {
            Self::Hosted(url) | Self::Preview(url) => url,
        }
    }

    pub fn is_hosted(&self) -> bool {
        matches!(self, Self::Hosted(_))
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    #[serde(default)]
    success: bool,
    data: Option<UploadData>,
}

#[derive(Deserialize)]
struct UploadData {
    url: String,
}

/// Relay to a third-party image host speaking the imgbb upload API.
pub struct ImageHost {
    client: Client,
    key: String,
    endpoint: String,
}

impl ImageHost {
    pub fn new(key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            key: key.into(),
            endpoint: endpoint.into(),
        }
    }

    pub async fn upload(&self, image: &ImageUpload) -> Result<String> {
        debug!("Uploading '{}' ({} bytes)", image.file_name, image.bytes.len());

        let part = Part::stream(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(image.mime_type())?;
        let form = Form::new().text("key", self.key.clone()).part("image", part);

        let resp = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| HubError::Upload(format!("image host unreachable: {}", e)))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(HubError::Upload(format!("image host returned {}", status)));
        }

        let body: UploadResponse = resp.json().await?;
        match body {
            UploadResponse { success: true, data: Some(data) } => Ok(data.url),
            _ => Err(HubError::Upload("image host rejected the upload".into())),
        }
    }

    /// Upload, or fall back to an inline preview when the host is unreachable
    /// or refuses the file.
    pub async fn upload_or_preview(&self, image: &ImageUpload) -> ImageRef {
        match self.upload(image).await {
            Ok(url) => ImageRef::Hosted(url),
            Err(e) => {
                warn!("Image upload failed, keeping a local preview: {}", e);
                ImageRef::Preview(image.data_url())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_from_extension() {
        assert_eq!(ImageUpload::new("a.PNG", Vec::new()).mime_type(), "image/png");
        assert_eq!(ImageUpload::new("b.jpeg", Vec::new()).mime_type(), "image/jpeg");
        assert_eq!(ImageUpload::new("c.svg", Vec::new()).mime_type(), "image/svg+xml");
        assert_eq!(ImageUpload::new("noext", Vec::new()).mime_type(), "application/octet-stream");
    }

    #[test]
    fn data_url_is_base64() {
        let image = ImageUpload::new("dot.gif", b"GIF89a".to_vec());
        assert_eq!(image.data_url(), "data:image/gif;base64,R0lGODlh");
    }

    #[tokio::test]
    async fn unreachable_host_falls_back_to_preview() {
        let host = ImageHost::new("key", "http://127.0.0.1:9/upload");
        let image = ImageUpload::new("pic.png", b"png".to_vec());

        assert!(matches!(host.upload(&image).await, Err(HubError::Upload(_))));

        let stored = host.upload_or_preview(&image).await;
        assert!(!stored.is_hosted());
        assert_eq!(stored.url(), "data:image/png;base64,cG5n");
    }
}
