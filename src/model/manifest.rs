//! Manifest entries for extracted images.

use serde::{Deserialize, Serialize};

/// Bytes of one image as produced by a document source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedImage {
    /// File extension without the dot (e.g., "jpg")
    pub extension: String,

    /// Raw image bytes
    pub payload: Vec<u8>,
}

impl ExtractedImage {
    /// Create an extracted image.
    pub fn new(extension: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            extension: extension.into(),
            payload,
        }
    }

    /// Create an image whose extension is sniffed from its bytes.
    pub fn sniffed(payload: Vec<u8>) -> Self {
        let extension = extension_from_magic(&payload).unwrap_or("raw");
        Self::new(extension, payload)
    }

    /// Get the size of the payload in bytes.
    pub fn size(&self) -> usize {
        self.payload.len()
    }
}

/// One deduplicated image of a document.
///
/// Entries are created by the image registry and never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Manifest id, `image1`, `image2`, ...
    pub id: String,

    /// File extension without the dot
    pub extension: String,

    /// Raw image bytes
    #[serde(skip)]
    pub payload: Vec<u8>,
}

impl ManifestEntry {
    pub(crate) fn new(id: String, image: ExtractedImage) -> Self {
        Self {
            id,
            extension: image.extension,
            payload: image.payload,
        }
    }

    /// Suggested file name, e.g. `image3.png`.
    pub fn filename(&self) -> String {
        format!("{}.{}", self.id, self.extension)
    }

    /// MIME type for the extension, if it is a known image format.
    pub fn mime_type(&self) -> Option<&'static str> {
        match self.extension.as_str() {
            "jpg" => Some("image/jpeg"),
            "png" => Some("image/png"),
            "gif" => Some("image/gif"),
            "tiff" => Some("image/tiff"),
            "bmp" => Some("image/bmp"),
            "webp" => Some("image/webp"),
            "jp2" => Some("image/jp2"),
            "jb2" => Some("image/x-jbig2"),
            _ => None,
        }
    }

    /// Get the size of the payload in bytes.
    pub fn size(&self) -> usize {
        self.payload.len()
    }
}

/// Detect an image file extension from magic bytes.
pub fn extension_from_magic(data: &[u8]) -> Option<&'static str> {
    if data.len() < 8 {
        return None;
    }

    // JPEG: FF D8 FF
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("jpg");
    }

    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("png");
    }

    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Some("gif");
    }

    // TIFF, little- or big-endian
    if data.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
    {
        return Some("tiff");
    }

    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Some("webp");
    }

    // JPEG 2000 signature box
    if data.starts_with(&[0x00, 0x00, 0x00, 0x0C, 0x6A, 0x50, 0x20, 0x20]) {
        return Some("jp2");
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_from_magic() {
        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46];
        assert_eq!(extension_from_magic(&jpeg), Some("jpg"));

        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(extension_from_magic(&png), Some("png"));

        assert_eq!(extension_from_magic(&[0u8; 4]), None);
        assert_eq!(extension_from_magic(&[0u8; 16]), None);
    }

    #[test]
    fn test_sniffed_falls_back_to_raw() {
        let img = ExtractedImage::sniffed(vec![1, 2, 3, 4, 5, 6, 7, 8, 9]);
        assert_eq!(img.extension, "raw");
        assert_eq!(img.size(), 9);
    }

    #[test]
    fn test_manifest_entry_filename() {
        let entry = ManifestEntry::new("image2".into(), ExtractedImage::new("png", vec![1]));
        assert_eq!(entry.filename(), "image2.png");
        assert_eq!(entry.mime_type(), Some("image/png"));
        assert_eq!(entry.size(), 1);
    }
}
