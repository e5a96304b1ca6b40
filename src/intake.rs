//! Image intake: turning a user-selected file into a base64 payload.

use crate::error::{NanoChefError, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Image formats we know how to name and sniff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format.
    WebP,
    /// GIF format.
    Gif,
    /// HEIC, as produced by most phone cameras.
    Heic,
    /// HEIF container.
    Heif,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
            Self::Gif => "gif",
            Self::Heic => "heic",
            Self::Heif => "heif",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
            Self::Heic => "image/heic",
            Self::Heif => "image/heif",
        }
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            "gif" => Some(Self::Gif),
            "heic" => Some(Self::Heic),
            "heif" => Some(Self::Heif),
            _ => None,
        }
    }

    /// Maps a MIME type back to a format.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.to_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            "image/gif" => Some(Self::Gif),
            "image/heic" => Some(Self::Heic),
            "image/heif" => Some(Self::Heif),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(Self::Gif);
        }

        None
    }
}

/// A base64-encoded image together with its declared content type.
///
/// Payloads are immutable once built; a new upload replaces the whole value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    /// Base64 image data, without any `data:` URL prefix.
    pub data: String,
    /// MIME type, e.g. `image/jpeg`.
    pub content_type: String,
}

impl ImagePayload {
    /// Creates a payload from already-encoded data.
    pub fn new(data: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            content_type: content_type.into(),
        }
    }

    /// Encodes raw bytes.
    pub fn from_bytes(bytes: &[u8], content_type: impl Into<String>) -> Self {
        Self::new(
            base64::engine::general_purpose::STANDARD.encode(bytes),
            content_type,
        )
    }

    /// Decodes the payload back to raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.data)
            .map_err(|e| NanoChefError::Decode(e.to_string()))
    }

    /// The format named by the content type, sniffed from the decoded
    /// bytes when the content type is not one we know.
    pub fn format(&self) -> Option<ImageFormat> {
        ImageFormat::from_mime_type(&self.content_type).or_else(|| {
            self.decode()
                .ok()
                .and_then(|bytes| ImageFormat::from_magic_bytes(&bytes))
        })
    }

    /// Returns the payload as a data URL, suitable for a preview.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.content_type, self.data)
    }

    /// Decodes and writes the image to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.decode()?)?;
        Ok(())
    }
}

/// What to do with a file whose declared type is not an image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IntakePolicy {
    /// Drop it without producing a payload or an error.
    #[default]
    Silent,
    /// Report it as [`NanoChefError::IntakeRejected`].
    Strict,
}

/// Converts user-selected files into [`ImagePayload`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageIntake {
    policy: IntakePolicy,
}

impl ImageIntake {
    /// Creates an intake with the given rejection policy.
    pub fn new(policy: IntakePolicy) -> Self {
        Self { policy }
    }

    /// Returns the rejection policy.
    pub fn policy(&self) -> IntakePolicy {
        self.policy
    }

    /// Accepts raw bytes with a declared media type.
    ///
    /// Returns `Ok(None)` for non-images under [`IntakePolicy::Silent`].
    pub fn accept(&self, media_type: &str, bytes: &[u8]) -> Result<Option<ImagePayload>> {
        if !is_image_type(media_type) {
            return self.reject(media_type);
        }
        Ok(Some(ImagePayload::from_bytes(bytes, media_type)))
    }

    /// Accepts a `data:<type>;base64,<data>` URL, keeping only the part
    /// after the comma.
    pub fn accept_data_url(&self, url: &str) -> Result<Option<ImagePayload>> {
        let (header, data) = url
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(','))
            .ok_or_else(|| NanoChefError::Decode("not a data URL".into()))?;

        let media_type = header.strip_suffix(";base64").ok_or_else(|| {
            NanoChefError::Decode("data URL is not base64 encoded".into())
        })?;

        if !is_image_type(media_type) {
            return self.reject(media_type);
        }
        Ok(Some(ImagePayload::new(data, media_type)))
    }

    /// Reads an image file, declaring its media type from the extension.
    ///
    /// The type check happens before the file is read, so rejected files are
    /// never loaded.
    pub async fn read_file(&self, path: impl AsRef<Path>) -> Result<Option<ImagePayload>> {
        let path = path.as_ref();
        let media_type = declared_media_type(path);

        if !is_image_type(media_type) {
            return self.reject(media_type);
        }

        let bytes = tokio::fs::read(path).await?;
        tracing::debug!(
            path = %path.display(),
            media_type,
            size_bytes = bytes.len(),
            "read image file"
        );
        Ok(Some(ImagePayload::from_bytes(&bytes, media_type)))
    }

    fn reject(&self, media_type: &str) -> Result<Option<ImagePayload>> {
        match self.policy {
            IntakePolicy::Silent => {
                tracing::debug!(media_type, "ignoring non-image selection");
                Ok(None)
            }
            IntakePolicy::Strict => Err(NanoChefError::IntakeRejected(media_type.to_string())),
        }
    }
}

fn is_image_type(media_type: &str) -> bool {
    media_type.starts_with("image/")
}

fn declared_media_type(path: &Path) -> &'static str {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(ImageFormat::from_extension)
        .map(|f| f.mime_type())
        .unwrap_or("application/octet-stream")
}
