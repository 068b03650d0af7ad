//! Interleaving of page text with deduplicated image placeholders.
//!
//! [`Assembler`] drives a [`DocumentSource`] page by page. Every image
//! block becomes a placeholder token at its position in the text;
//! images the page lists but never places are appended after the page's
//! blocks. Bytes shared across pages are extracted once and appear once
//! in the manifest.

mod images;
mod options;
mod page;
pub mod placeholder;
mod plan;
mod registry;
mod stats;

pub use images::{collect_page_images, ImageListing, PageImage, PageImages};
pub use options::{AssembleOptions, ErrorMode, PageSelection};
pub use page::assemble_page;
pub use placeholder::Placeholder;
pub use registry::ImageRegistry;
pub use stats::AssemblyStats;

use rayon::prelude::*;

use crate::error::Result;
use crate::model::{DocumentResult, Page, PageResult, TextDocument};
use crate::source::DocumentSource;

/// Document assembler.
#[derive(Debug, Clone, Default)]
pub struct Assembler {
    options: AssembleOptions,
}

impl Assembler {
    /// Create an assembler with the given options.
    pub fn new(options: AssembleOptions) -> Self {
        Self { options }
    }

    /// Options in effect.
    pub fn options(&self) -> &AssembleOptions {
        &self.options
    }

    /// Assemble every selected page of `source`.
    ///
    /// `page_count` of the result is the source's page count, even when
    /// only some pages are selected.
    pub fn assemble<S>(&self, source: &S) -> Result<DocumentResult>
    where
        S: DocumentSource + ?Sized,
    {
        let page_count = source.page_count();
        let indices = self.options.pages.resolve(page_count);
        log::debug!(
            "assembling {} of {} pages ({})",
            indices.len(),
            page_count,
            if self.options.parallel {
                "two-phase"
            } else {
                "sequential"
            }
        );

        let (pages, images) = if self.options.parallel {
            self.assemble_parallel(source, &indices)?
        } else {
            self.assemble_sequential(source, &indices)?
        };

        log::info!(
            "assembled {} pages with {} distinct images",
            pages.len(),
            images.len()
        );

        Ok(DocumentResult {
            filename: source.filename().map(String::from),
            metadata: source.metadata(),
            page_count,
            pages,
            images,
        })
    }

    /// Plain text of every selected page, without placeholders.
    pub fn extract_text<S>(&self, source: &S) -> Result<TextDocument>
    where
        S: DocumentSource + ?Sized,
    {
        let page_count = source.page_count();
        let indices = self.options.pages.resolve(page_count);
        let text_of = |&index: &u32| -> Result<PageResult> {
            let page = self.load_page(source, index)?;
            Ok(PageResult::new(index, page.plain_text()))
        };

        let pages = if self.options.parallel {
            indices.par_iter().map(text_of).collect::<Result<Vec<_>>>()?
        } else {
            indices.iter().map(text_of).collect::<Result<Vec<_>>>()?
        };

        Ok(TextDocument {
            filename: source.filename().map(String::from),
            page_count,
            pages,
        })
    }

    fn assemble_sequential<S>(&self, source: &S, indices: &[u32]) -> Result<Assembled>
    where
        S: DocumentSource + ?Sized,
    {
        let mut registry = ImageRegistry::new().with_retries(self.options.extract_retries);
        let mut pages = Vec::with_capacity(indices.len());
        for &index in indices {
            let page = self.load_page(source, index)?;
            pages.push(assemble_page(&page, &mut registry, source));
        }
        Ok((pages, registry.into_manifest()))
    }

    fn assemble_parallel<S>(&self, source: &S, indices: &[u32]) -> Result<Assembled>
    where
        S: DocumentSource + ?Sized,
    {
        let pages: Vec<Page> = indices
            .par_iter()
            .map(|&index| self.load_page(source, index))
            .collect::<Result<_>>()?;
        Ok(plan::assemble_pages_parallel(
            &pages,
            source,
            self.options.extract_retries,
        ))
    }

    /// Decode a page, degrading to its inventory in lenient mode.
    fn load_page<S>(&self, source: &S, index: u32) -> Result<Page>
    where
        S: DocumentSource + ?Sized,
    {
        match source.page(index) {
            Ok(page) => Ok(page),
            Err(e) if self.options.error_mode == ErrorMode::Lenient => {
                log::warn!("page {}: content unreadable, keeping images only: {}", index, e);
                let image_inventory = source.page_inventory(index).unwrap_or_else(|e| {
                    log::warn!("page {}: inventory unreadable: {}", index, e);
                    Vec::new()
                });
                Ok(Page {
                    index,
                    blocks: Vec::new(),
                    image_inventory,
                })
            }
            Err(e) => Err(e),
        }
    }
}

type Assembled = (Vec<PageResult>, Vec<crate::model::ManifestEntry>);

/// Assemble `source` with default options.
pub fn assemble<S>(source: &S) -> Result<DocumentResult>
where
    S: DocumentSource + ?Sized,
{
    Assembler::default().assemble(source)
}

/// Plain text of `source` with the given options.
pub fn extract_text_pages<S>(source: &S, options: &AssembleOptions) -> Result<TextDocument>
where
    S: DocumentSource + ?Sized,
{
    Assembler::new(options.clone()).extract_text(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ImageError};
    use crate::model::{ExtractedImage, ImageRef, Metadata};
    use crate::source::{ImageExtractor, MemorySource};

    fn r(n: u32) -> ImageRef {
        ImageRef::new(n, 0)
    }

    fn png(n: u8) -> ExtractedImage {
        ExtractedImage::new("png", vec![n])
    }

    /// Page 2 fails to decode; its inventory is still readable.
    struct FlakyPage(MemorySource);

    impl ImageExtractor for FlakyPage {
        fn extract(&self, reference: ImageRef) -> std::result::Result<ExtractedImage, ImageError> {
            self.0.extract(reference)
        }
    }

    impl DocumentSource for FlakyPage {
        fn page_count(&self) -> u32 {
            self.0.page_count()
        }

        fn page(&self, index: u32) -> Result<Page> {
            if index == 2 {
                return Err(Error::PdfParse("bad content stream".into()));
            }
            self.0.page(index)
        }

        fn page_inventory(&self, index: u32) -> Result<Vec<ImageRef>> {
            Ok(self.0.page(index)?.image_inventory)
        }

        fn metadata(&self) -> Metadata {
            self.0.metadata()
        }
    }

    fn flaky() -> FlakyPage {
        FlakyPage(
            MemorySource::new()
                .with_page(Page::new(1).with_text(["one"]).with_image(Some(r(1))))
                .with_page(
                    Page::new(2)
                        .with_text(["lost"])
                        .with_image(Some(r(2)))
                        .with_inventory(r(2))
                        .with_inventory(r(1)),
                )
                .with_image(r(1), png(1))
                .with_image(r(2), png(2)),
        )
    }

    #[test]
    fn test_strict_mode_fails_on_bad_page() {
        let assembler = Assembler::new(AssembleOptions::new().sequential());
        assert!(matches!(assembler.assemble(&flaky()), Err(Error::PdfParse(_))));

        let assembler = Assembler::default();
        assert!(assembler.assemble(&flaky()).is_err());
    }

    #[test]
    fn test_lenient_mode_recovers_inventory() {
        for options in [
            AssembleOptions::new().lenient(),
            AssembleOptions::new().lenient().sequential(),
        ] {
            let result = Assembler::new(options).assemble(&flaky()).unwrap();
            assert_eq!(result.pages[0].text, "one {{image1}}");
            assert_eq!(result.pages[1].text, "{{image2}} {{image1}}");
            assert_eq!(result.images.len(), 2);
        }
    }

    #[test]
    fn test_page_selection_keeps_total_page_count() {
        let source = MemorySource::new()
            .with_page(Page::new(1).with_image(Some(r(1))))
            .with_page(Page::new(2).with_image(Some(r(2))))
            .with_image(r(1), png(1))
            .with_image(r(2), png(2));
        let options = AssembleOptions::new().with_pages(PageSelection::Pages(vec![2]));

        let result = Assembler::new(options).assemble(&source).unwrap();
        assert_eq!(result.page_count, 2);
        assert_eq!(result.pages, vec![PageResult::new(2, "{{image1}}")]);
        assert_eq!(result.images[0].payload, vec![2]);
    }

    #[test]
    fn test_filename_and_metadata_pass_through() {
        let metadata = Metadata {
            title: Some("Report".into()),
            ..Metadata::with_version("1.7")
        };
        let source = MemorySource::new()
            .with_page(Page::new(1).with_text(["x"]))
            .with_metadata(metadata)
            .with_filename("report.pdf");

        let result = assemble(&source).unwrap();
        assert_eq!(result.filename.as_deref(), Some("report.pdf"));
        assert_eq!(result.metadata.title.as_deref(), Some("Report"));
        assert_eq!(result.metadata.pdf_version, "1.7");
    }

    #[test]
    fn test_extract_text_pages_has_no_placeholders() {
        let source = MemorySource::new()
            .with_page(
                Page::new(1)
                    .with_text(["Hello", "world"])
                    .with_image(Some(r(1)))
                    .with_text(["bye"]),
            )
            .with_image(r(1), png(1))
            .with_filename("a.pdf");

        let text = extract_text_pages(&source, &AssembleOptions::new()).unwrap();
        assert_eq!(text.filename.as_deref(), Some("a.pdf"));
        assert_eq!(text.page_count, 1);
        assert_eq!(text.pages[0].text, "Hello world\nbye");
        assert_eq!(source.extract_calls(), 0);
    }

    #[test]
    fn test_empty_document() {
        let result = assemble(&MemorySource::new()).unwrap();
        assert_eq!(result.page_count, 0);
        assert!(result.pages.is_empty());
        assert!(result.images.is_empty());
    }
}
