//! JSON rendering of assembled documents.
//!
//! Payloads are raw bytes everywhere else in the crate; this is the only
//! place they are base64 encoded.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;

use crate::assemble::ImageListing;
use crate::error::{Error, Result};
use crate::model::{DocumentResult, PageResult, TextDocument};

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

#[derive(Serialize)]
struct WireDocument<'a> {
    filename: Option<&'a str>,
    page_count: u32,
    pages: &'a [PageResult],
    images: Vec<WireImage<'a>>,
}

#[derive(Serialize)]
struct WireImage<'a> {
    id: &'a str,
    extension: &'a str,
    base64: String,
}

#[derive(Serialize)]
struct WireListing<'a> {
    filename: Option<&'a str>,
    page_count: u32,
    pages: Vec<WireListingPage<'a>>,
}

#[derive(Serialize)]
struct WireListingPage<'a> {
    page: u32,
    images: Vec<WireListingImage<'a>>,
}

#[derive(Serialize)]
struct WireListingImage<'a> {
    image_id: &'a str,
    ext: &'a str,
    base64: String,
}

fn serialize<T: Serialize>(value: &T, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
        JsonFormat::Compact => serde_json::to_string(value),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

/// Convert an assembled document to JSON.
///
/// Shape: `{filename, page_count, pages: [{page, text}], images: [{id, extension, base64}]}`.
pub fn to_json(result: &DocumentResult, format: JsonFormat) -> Result<String> {
    let wire = WireDocument {
        filename: result.filename.as_deref(),
        page_count: result.page_count,
        pages: &result.pages,
        images: result
            .images
            .iter()
            .map(|entry| WireImage {
                id: &entry.id,
                extension: &entry.extension,
                base64: STANDARD.encode(&entry.payload),
            })
            .collect(),
    };
    serialize(&wire, format)
}

/// Convert a plain-text document to JSON: `{filename, page_count, pages: [{page, text}]}`.
pub fn text_to_json(doc: &TextDocument, format: JsonFormat) -> Result<String> {
    serialize(doc, format)
}

/// Convert a per-page image listing to JSON.
///
/// Shape: `{filename, page_count, pages: [{page, images: [{image_id, ext, base64}]}]}`.
pub fn listing_to_json(listing: &ImageListing, format: JsonFormat) -> Result<String> {
    let wire = WireListing {
        filename: listing.filename.as_deref(),
        page_count: listing.page_count,
        pages: listing
            .pages
            .iter()
            .map(|page| WireListingPage {
                page: page.page,
                images: page
                    .images
                    .iter()
                    .map(|image| WireListingImage {
                        image_id: &image.image_id,
                        ext: &image.extension,
                        base64: STANDARD.encode(&image.payload),
                    })
                    .collect(),
            })
            .collect(),
    };
    serialize(&wire, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::{PageImage, PageImages};
    use crate::model::{ExtractedImage, ManifestEntry};

    fn sample() -> DocumentResult {
        DocumentResult {
            filename: Some("doc.pdf".into()),
            page_count: 1,
            pages: vec![PageResult::new(1, "A {{image1}} B")],
            images: vec![ManifestEntry::new(
                "image1".into(),
                ExtractedImage::new("png", b"hello".to_vec()),
            )],
            ..Default::default()
        }
    }

    #[test]
    fn test_to_json_wire_shape() {
        let json = to_json(&sample(), JsonFormat::Compact).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["filename"], "doc.pdf");
        assert_eq!(value["page_count"], 1);
        assert_eq!(value["pages"][0]["page"], 1);
        assert_eq!(value["pages"][0]["text"], "A {{image1}} B");
        assert_eq!(value["images"][0]["id"], "image1");
        assert_eq!(value["images"][0]["extension"], "png");
        assert_eq!(value["images"][0]["base64"], "aGVsbG8=");
        assert!(value.get("metadata").is_none());
    }

    #[test]
    fn test_to_json_pretty_vs_compact() {
        let pretty = to_json(&sample(), JsonFormat::Pretty).unwrap();
        let compact = to_json(&sample(), JsonFormat::Compact).unwrap();
        assert!(pretty.contains('\n'));
        assert!(!compact.contains('\n'));
    }

    #[test]
    fn test_missing_filename_is_null() {
        let json = to_json(&DocumentResult::default(), JsonFormat::Compact).unwrap();
        assert_eq!(
            json,
            r#"{"filename":null,"page_count":0,"pages":[],"images":[]}"#
        );
    }

    #[test]
    fn test_text_to_json() {
        let doc = TextDocument {
            filename: Some("t.pdf".into()),
            page_count: 1,
            pages: vec![PageResult::new(1, "hi")],
        };
        let json = text_to_json(&doc, JsonFormat::Compact).unwrap();
        assert_eq!(
            json,
            r#"{"filename":"t.pdf","page_count":1,"pages":[{"page":1,"text":"hi"}]}"#
        );
    }

    #[test]
    fn test_listing_to_json() {
        let listing = ImageListing {
            filename: None,
            page_count: 3,
            pages: vec![PageImages {
                page: 2,
                images: vec![PageImage {
                    image_id: "2-14".into(),
                    extension: "jpg".into(),
                    payload: vec![0xFF, 0xD8],
                }],
            }],
        };
        let value: serde_json::Value =
            serde_json::from_str(&listing_to_json(&listing, JsonFormat::Pretty).unwrap()).unwrap();
        assert_eq!(value["page_count"], 3);
        assert_eq!(value["pages"][0]["images"][0]["image_id"], "2-14");
        assert_eq!(value["pages"][0]["images"][0]["ext"], "jpg");
        assert_eq!(value["pages"][0]["images"][0]["base64"], "/9g=");
    }
}
