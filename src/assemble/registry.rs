//! Per-document image deduplication.

use std::collections::HashMap;

use crate::error::ImageError;
use crate::model::{ExtractedImage, ImageRef, ManifestEntry};
use crate::source::ImageExtractor;

use super::placeholder::image_id;

/// Maps image references to manifest ids and owns the manifest.
///
/// A registry belongs to exactly one document. Ids are handed out as
/// `image1`, `image2`, ... in the order references are first resolved
/// successfully; a reference that fails is not recorded, so a later
/// `resolve` of it extracts again.
#[derive(Debug, Default)]
pub struct ImageRegistry {
    ids: HashMap<ImageRef, usize>,
    manifest: Vec<ManifestEntry>,
    retries: u8,
}

impl ImageRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-attempt a failed extraction up to `retries` more times.
    pub fn with_retries(mut self, retries: u8) -> Self {
        self.retries = retries;
        self
    }

    /// Manifest id for `reference`, extracting it on first sight.
    pub fn resolve<E>(&mut self, reference: ImageRef, extractor: &E) -> Result<&str, ImageError>
    where
        E: ImageExtractor + ?Sized,
    {
        if let Some(&slot) = self.ids.get(&reference) {
            log::trace!("image {} already materialized", reference);
            return Ok(&self.manifest[slot].id);
        }

        let image = extract_with_retries(extractor, reference, self.retries)?;
        Ok(self.insert(reference, image))
    }

    /// Record an image extracted elsewhere; returns its id.
    ///
    /// If `reference` is already known the existing id is returned and
    /// `image` is dropped.
    pub fn insert(&mut self, reference: ImageRef, image: ExtractedImage) -> &str {
        let slot = match self.ids.get(&reference) {
            Some(&slot) => slot,
            None => {
                let slot = self.manifest.len();
                let id = image_id(slot + 1);
                log::debug!(
                    "assigned {} to {} ({}, {} bytes)",
                    id,
                    reference,
                    image.extension,
                    image.size()
                );
                self.manifest.push(ManifestEntry::new(id, image));
                self.ids.insert(reference, slot);
                slot
            }
        };
        &self.manifest[slot].id
    }

    /// Id already assigned to `reference`, without extracting.
    pub fn id_of(&self, reference: ImageRef) -> Option<&str> {
        self.ids
            .get(&reference)
            .map(|&slot| self.manifest[slot].id.as_str())
    }

    /// Manifest built so far, in id order.
    pub fn snapshot(&self) -> &[ManifestEntry] {
        &self.manifest
    }

    /// Consume the registry, returning the manifest.
    pub fn into_manifest(self) -> Vec<ManifestEntry> {
        self.manifest
    }

    /// Number of manifest entries.
    pub fn len(&self) -> usize {
        self.manifest.len()
    }

    /// Check if nothing has been extracted yet.
    pub fn is_empty(&self) -> bool {
        self.manifest.is_empty()
    }
}

/// Extract `reference`, trying `retries` more times after a failure.
pub(crate) fn extract_with_retries<E>(
    extractor: &E,
    reference: ImageRef,
    retries: u8,
) -> Result<ExtractedImage, ImageError>
where
    E: ImageExtractor + ?Sized,
{
    let mut attempt = 0;
    loop {
        match extractor.extract(reference) {
            Ok(image) => return Ok(image),
            Err(e) if attempt < retries => {
                attempt += 1;
                log::debug!("retrying {} after: {}", reference, e);
            }
            Err(e) => return Err(e),
        }
    }
}
