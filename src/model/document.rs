//! Document-level types.

use super::ManifestEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Assembled text of one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult {
    /// Page number (1-indexed)
    pub page: u32,

    /// Page text with image placeholders
    pub text: String,
}

impl PageResult {
    /// Create a page result.
    pub fn new(page: u32, text: impl Into<String>) -> Self {
        Self {
            page,
            text: text.into(),
        }
    }
}

/// Output of assembling a whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentResult {
    /// Source file name, passed through unmodified
    pub filename: Option<String>,

    /// Document metadata, passed through unmodified
    pub metadata: Metadata,

    /// Total number of pages in the document
    pub page_count: u32,

    /// One result per assembled page, in page order
    pub pages: Vec<PageResult>,

    /// Deduplicated image manifest, in id order
    pub images: Vec<ManifestEntry>,
}

impl DocumentResult {
    /// Get a page result by page number (1-indexed).
    pub fn get_page(&self, page: u32) -> Option<&PageResult> {
        self.pages.iter().find(|p| p.page == page)
    }

    /// Get a manifest entry by id.
    pub fn get_image(&self, id: &str) -> Option<&ManifestEntry> {
        self.images.iter().find(|e| e.id == id)
    }

    /// Check if no pages were assembled.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Total size of all manifest payloads in bytes.
    pub fn payload_size(&self) -> usize {
        self.images.iter().map(ManifestEntry::size).sum()
    }
}

/// Plain page text without placeholders, one record per page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextDocument {
    /// Source file name
    pub filename: Option<String>,

    /// Total number of pages in the document
    pub page_count: u32,

    /// Page texts in page order
    pub pages: Vec<PageResult>,
}

/// Document metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    pub title: Option<String>,

    /// Document author
    pub author: Option<String>,

    /// Document subject
    pub subject: Option<String>,

    /// Creator application
    pub creator: Option<String>,

    /// PDF producer
    pub producer: Option<String>,

    /// Creation date
    pub created: Option<DateTime<Utc>>,

    /// Last modification date
    pub modified: Option<DateTime<Utc>>,

    /// PDF version (e.g., "1.7")
    pub pdf_version: String,

    /// Total number of pages
    pub page_count: u32,

    /// Whether the document is encrypted
    pub encrypted: bool,
}

impl Metadata {
    /// Create new metadata with PDF version.
    pub fn with_version(version: impl Into<String>) -> Self {
        Self {
            pdf_version: version.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ExtractedImage;

    #[test]
    fn test_document_result_lookup() {
        let doc = DocumentResult {
            page_count: 2,
            pages: vec![PageResult::new(1, "A"), PageResult::new(2, "{{image1}}")],
            images: vec![ManifestEntry::new(
                "image1".into(),
                ExtractedImage::new("jpg", vec![1, 2, 3]),
            )],
            ..Default::default()
        };

        assert_eq!(doc.get_page(2).map(|p| p.text.as_str()), Some("{{image1}}"));
        assert!(doc.get_page(3).is_none());
        assert!(doc.get_image("image1").is_some());
        assert!(doc.get_image("image2").is_none());
        assert_eq!(doc.payload_size(), 3);
        assert!(!doc.is_empty());
    }

    #[test]
    fn test_metadata_with_version() {
        let metadata = Metadata::with_version("1.7");
        assert_eq!(metadata.pdf_version, "1.7");
        assert!(metadata.title.is_none());
    }
}
