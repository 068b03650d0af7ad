//! Two-phase assembly: discover every reference, extract in parallel,
//! then render pages against a fixed id table.
//!
//! Ids must come out exactly as the sequential walk would assign them,
//! so discovery visits pages in order and failed references are skipped
//! when ids are fixed.

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;

use crate::error::ImageError;
use crate::model::{ImageRef, ManifestEntry, Page, PageResult};
use crate::source::ImageExtractor;

use super::page::{render_page, walk_page, Piece};
use super::placeholder::{Placeholder, ERROR_TOKEN};
use super::registry::{extract_with_retries, ImageRegistry};

/// Distinct references of a document in first-occurrence order.
#[derive(Debug, Default)]
pub(crate) struct ExtractionPlan {
    order: Vec<ImageRef>,
}

impl ExtractionPlan {
    /// Walk `pages` in order, recording each reference once.
    pub fn discover(pages: &[Page]) -> Self {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        for page in pages {
            walk_page(page, |piece| {
                if let Piece::Image(reference) | Piece::Orphan(reference) = piece {
                    if seen.insert(reference) {
                        order.push(reference);
                    }
                }
            });
        }
        Self { order }
    }

    /// Number of distinct references.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Extract every reference concurrently and fix ids.
    pub fn execute<E>(self, extractor: &E, retries: u8) -> ResolvedImages
    where
        E: ImageExtractor + Sync + ?Sized,
    {
        let outcomes: Vec<Result<_, ImageError>> = self
            .order
            .par_iter()
            .map(|&reference| extract_with_retries(extractor, reference, retries))
            .collect();

        let mut registry = ImageRegistry::new();
        let mut failures = HashMap::new();
        for (reference, outcome) in self.order.into_iter().zip(outcomes) {
            match outcome {
                Ok(image) => {
                    registry.insert(reference, image);
                }
                Err(e) => {
                    log::warn!("{}", e);
                    failures.insert(reference, e);
                }
            }
        }

        ResolvedImages { registry, failures }
    }
}

/// Outcome of a plan: ids for successes, errors for the rest.
#[derive(Debug)]
pub(crate) struct ResolvedImages {
    registry: ImageRegistry,
    failures: HashMap<ImageRef, ImageError>,
}

impl ResolvedImages {
    /// Render one page. Safe to call from many threads.
    pub fn render(&self, page: &Page) -> PageResult {
        render_page(page, |reference| match self.registry.id_of(reference) {
            Some(id) => Placeholder::Image(id).to_string(),
            None => ERROR_TOKEN.to_string(),
        })
    }

    /// Number of references that failed.
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Consume, returning the manifest.
    pub fn into_manifest(self) -> Vec<ManifestEntry> {
        self.registry.into_manifest()
    }
}

/// Assemble already decoded pages with the two-phase strategy.
pub(crate) fn assemble_pages_parallel<E>(
    pages: &[Page],
    extractor: &E,
    retries: u8,
) -> (Vec<PageResult>, Vec<ManifestEntry>)
where
    E: ImageExtractor + Sync + ?Sized,
{
    let plan = ExtractionPlan::discover(pages);
    log::debug!("extracting {} distinct images", plan.len());

    let resolved = plan.execute(extractor, retries);
    if resolved.failure_count() > 0 {
        log::debug!("{} images failed extraction", resolved.failure_count());
    }

    let results = pages.par_iter().map(|page| resolved.render(page)).collect();
    (results, resolved.into_manifest())
}
