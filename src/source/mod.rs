//! Document source abstraction layer.
//!
//! A source supplies pages already decomposed into content blocks, an
//! independent image inventory per page, and on-demand image bytes. The
//! assembler only talks to these traits, so any parser that can produce
//! [`Page`] values can feed it.

mod filters;
mod memory;
mod pdf;

pub use memory::MemorySource;
pub use pdf::PdfSource;

use crate::error::{ImageError, Result};
use crate::model::{ExtractedImage, ImageRef, Metadata, Page};

/// Turns an image reference into bytes.
///
/// Implementations must be pure with respect to the reference: calling
/// `extract` twice for the same reference yields the same outcome.
pub trait ImageExtractor {
    /// Extract the image named by `reference`.
    fn extract(&self, reference: ImageRef) -> std::result::Result<ExtractedImage, ImageError>;
}

impl<F> ImageExtractor for F
where
    F: Fn(ImageRef) -> std::result::Result<ExtractedImage, ImageError>,
{
    fn extract(&self, reference: ImageRef) -> std::result::Result<ExtractedImage, ImageError> {
        self(reference)
    }
}

/// A paginated document ready for assembly.
pub trait DocumentSource: ImageExtractor + Sync {
    /// Total number of pages.
    fn page_count(&self) -> u32;

    /// Decode one page (1-indexed).
    fn page(&self, index: u32) -> Result<Page>;

    /// Image inventory of one page, without decoding its content.
    ///
    /// Used to recover images of a page whose blocks could not be read.
    fn page_inventory(&self, index: u32) -> Result<Vec<ImageRef>> {
        Ok(self.page(index)?.image_inventory)
    }

    /// Document metadata.
    fn metadata(&self) -> Metadata;

    /// File name of the document, if known.
    fn filename(&self) -> Option<&str> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_extractor() {
        let extractor = |r: ImageRef| {
            if r.object == 1 {
                Ok(ExtractedImage::new("png", vec![1]))
            } else {
                Err(ImageError::NotFound(r))
            }
        };

        assert!(extractor.extract(ImageRef::new(1, 0)).is_ok());
        assert_eq!(
            extractor.extract(ImageRef::new(2, 0)),
            Err(ImageError::NotFound(ImageRef::new(2, 0)))
        );
    }
}
