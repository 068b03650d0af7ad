//! Per-page image listing, without cross-page dedup.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::ImageRef;
use crate::source::DocumentSource;

use super::options::{AssembleOptions, ErrorMode};
use super::registry::extract_with_retries;

/// Inventory images of a document, page by page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageListing {
    /// Source file name, if known
    pub filename: Option<String>,
    /// Total pages in the source
    pub page_count: u32,
    /// Selected pages in order
    pub pages: Vec<PageImages>,
}

impl ImageListing {
    /// Number of images across all pages.
    pub fn image_count(&self) -> usize {
        self.pages.iter().map(|p| p.images.len()).sum()
    }
}

/// Images found on one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageImages {
    /// Page number (1-indexed)
    pub page: u32,
    /// Successfully extracted images, in inventory order
    pub images: Vec<PageImage>,
}

/// One image of a page listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageImage {
    /// `"{page}-{object}"`
    pub image_id: String,
    /// File extension without the dot
    pub extension: String,
    /// Raw image bytes
    #[serde(skip)]
    pub payload: Vec<u8>,
}

impl PageImage {
    /// Listing id of `reference` on `page`.
    pub fn listing_id(page: u32, reference: ImageRef) -> String {
        format!("{}-{}", page, reference.object)
    }

    /// Suggested file name.
    pub fn filename(&self) -> String {
        format!("{}.{}", self.image_id, self.extension)
    }
}

/// List every page's inventory images.
///
/// An image shared by several pages appears once per page. Failed
/// extractions are logged and left out.
pub fn collect_page_images<S>(source: &S, options: &AssembleOptions) -> Result<ImageListing>
where
    S: DocumentSource + ?Sized,
{
    let page_count = source.page_count();
    let indices = options.pages.resolve(page_count);
    let list = |&index: &u32| list_page(source, index, options);

    let pages = if options.parallel {
        indices.par_iter().map(list).collect::<Result<Vec<_>>>()?
    } else {
        indices.iter().map(list).collect::<Result<Vec<_>>>()?
    };

    Ok(ImageListing {
        filename: source.filename().map(String::from),
        page_count,
        pages,
    })
}

fn list_page<S>(source: &S, index: u32, options: &AssembleOptions) -> Result<PageImages>
where
    S: DocumentSource + ?Sized,
{
    let inventory = match source.page_inventory(index) {
        Ok(inventory) => inventory,
        Err(e) if options.error_mode == ErrorMode::Lenient => {
            log::warn!("page {}: skipping image listing: {}", index, e);
            Vec::new()
        }
        Err(e) => return Err(e),
    };

    let mut images = Vec::with_capacity(inventory.len());
    for reference in inventory {
        match extract_with_retries(source, reference, options.extract_retries) {
            Ok(image) => images.push(PageImage {
                image_id: PageImage::listing_id(index, reference),
                extension: image.extension,
                payload: image.payload,
            }),
            Err(e) => log::warn!("page {}: {}", index, e),
        }
    }

    Ok(PageImages {
        page: index,
        images,
    })
}
