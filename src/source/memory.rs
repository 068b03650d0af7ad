//! In-memory document source.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Error, ImageError, Result};
use crate::model::{ExtractedImage, ImageRef, Metadata, Page};

use super::{DocumentSource, ImageExtractor};

/// A document assembled by hand from pages and image bytes.
///
/// Useful when another parser has already produced blocks, and in tests.
/// References without registered bytes fail extraction with
/// [`ImageError::NotFound`]; references registered through
/// [`MemorySource::with_broken_image`] fail with [`ImageError::Decode`].
#[derive(Debug, Default)]
pub struct MemorySource {
    pages: Vec<Page>,
    images: HashMap<ImageRef, std::result::Result<ExtractedImage, String>>,
    metadata: Metadata,
    filename: Option<String>,
    extract_calls: AtomicUsize,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a page. Its index is taken as given.
    pub fn with_page(mut self, page: Page) -> Self {
        self.pages.push(page);
        self.metadata.page_count = self.pages.len() as u32;
        self
    }

    /// Register image bytes for a reference.
    pub fn with_image(mut self, reference: ImageRef, image: ExtractedImage) -> Self {
        self.images.insert(reference, Ok(image));
        self
    }

    /// Register a reference whose extraction fails with a decode error.
    pub fn with_broken_image(mut self, reference: ImageRef, reason: impl Into<String>) -> Self {
        self.images.insert(reference, Err(reason.into()));
        self
    }

    /// Set the file name.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Set metadata. The page count is kept in sync with the pages.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Metadata {
            page_count: self.pages.len() as u32,
            ..metadata
        };
        self
    }

    /// Number of `extract` calls served so far.
    pub fn extract_calls(&self) -> usize {
        self.extract_calls.load(Ordering::Relaxed)
    }
}

impl ImageExtractor for MemorySource {
    fn extract(&self, reference: ImageRef) -> std::result::Result<ExtractedImage, ImageError> {
        self.extract_calls.fetch_add(1, Ordering::Relaxed);
        match self.images.get(&reference) {
            Some(Ok(image)) => Ok(image.clone()),
            Some(Err(reason)) => Err(ImageError::Decode {
                reference,
                reason: reason.clone(),
            }),
            None => Err(ImageError::NotFound(reference)),
        }
    }
}

impl DocumentSource for MemorySource {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page(&self, index: u32) -> Result<Page> {
        if index == 0 {
            return Err(Error::PageOutOfRange(index, self.page_count()));
        }
        self.pages
            .get((index - 1) as usize)
            .cloned()
            .ok_or(Error::PageOutOfRange(index, self.page_count()))
    }

    fn metadata(&self) -> Metadata {
        self.metadata.clone()
    }

    fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }
}
