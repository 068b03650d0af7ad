//! # pdfweave
//!
//! Interleave PDF page text with deduplicated image placeholders.
//!
//! Each page comes out as a single string in which every image sits at
//! its reading-order position as a `{{imageN}}` token, alongside a
//! document-wide manifest that stores each distinct image exactly once.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfweave::{extract_file, render};
//!
//! fn main() -> pdfweave::Result<()> {
//!     let result = extract_file("document.pdf")?;
//!
//!     for page in &result.pages {
//!         println!("--- page {} ---\n{}", page.page, page.text);
//!     }
//!     render::write_manifest(&result, "./images")?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Placeholders
//!
//! - `{{imageN}}`: the N-th distinct image of the document, in the manifest
//! - `{{image-error}}`: an image whose bytes could not be extracted
//! - `{{image-inline}}`: an inline image with no extractable reference
//!
//! Images a page lists in its resources but never draws are appended
//! after the page's own content.

pub mod assemble;
pub mod detect;
pub mod error;
pub mod model;
pub mod render;
pub mod source;

// Re-export commonly used types
pub use assemble::{
    AssembleOptions, Assembler, AssemblyStats, ErrorMode, ImageListing, ImageRegistry,
    PageSelection,
};
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_pdf_content_type};
pub use error::{Error, ImageError, ImageErrorKind, Result};
pub use model::{
    ContentBlock, DocumentResult, ExtractedImage, ImageRef, ManifestEntry, Metadata, Page,
    PageResult, TextDocument,
};
pub use render::JsonFormat;
pub use source::{DocumentSource, ImageExtractor, MemorySource, PdfSource};

use std::io::Read;
use std::path::Path;

/// Assemble a PDF file with default options.
///
/// # Example
///
/// ```no_run
/// use pdfweave::extract_file;
///
/// let result = extract_file("document.pdf").unwrap();
/// println!("{} pages, {} images", result.pages.len(), result.images.len());
/// ```
pub fn extract_file<P: AsRef<Path>>(path: P) -> Result<DocumentResult> {
    let source = PdfSource::open(path)?;
    Assembler::default().assemble(&source)
}

/// Assemble a PDF file with custom options.
///
/// # Example
///
/// ```no_run
/// use pdfweave::{extract_file_with_options, AssembleOptions};
///
/// let options = AssembleOptions::new().lenient().sequential();
/// let result = extract_file_with_options("document.pdf", options).unwrap();
/// ```
pub fn extract_file_with_options<P: AsRef<Path>>(
    path: P,
    options: AssembleOptions,
) -> Result<DocumentResult> {
    let source = PdfSource::open(path)?;
    Assembler::new(options).assemble(&source)
}

/// Assemble a PDF held in memory.
///
/// # Example
///
/// ```no_run
/// use pdfweave::extract_bytes;
///
/// let data = std::fs::read("document.pdf").unwrap();
/// let result = extract_bytes(&data).unwrap();
/// ```
pub fn extract_bytes(data: &[u8]) -> Result<DocumentResult> {
    let source = PdfSource::from_bytes(data)?;
    Assembler::default().assemble(&source)
}

/// Assemble a PDF held in memory with custom options.
pub fn extract_bytes_with_options(data: &[u8], options: AssembleOptions) -> Result<DocumentResult> {
    let source = PdfSource::from_bytes(data)?;
    Assembler::new(options).assemble(&source)
}

/// Assemble a PDF read from `reader`.
pub fn extract_reader<R: Read>(reader: R) -> Result<DocumentResult> {
    let source = PdfSource::from_reader(reader)?;
    Assembler::default().assemble(&source)
}

/// Extract plain page text from a PDF file, without placeholders.
///
/// # Example
///
/// ```no_run
/// use pdfweave::extract_text;
///
/// let text = extract_text("document.pdf").unwrap();
/// for page in text.pages {
///     println!("{}: {}", page.page, page.text);
/// }
/// ```
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<TextDocument> {
    let source = PdfSource::open(path)?;
    Assembler::default().extract_text(&source)
}

/// List the images of every page of a PDF file, without dedup.
pub fn list_images<P: AsRef<Path>>(path: P) -> Result<ImageListing> {
    let source = PdfSource::open(path)?;
    assemble::collect_page_images(&source, &AssembleOptions::default())
}

/// Assemble a PDF file straight to JSON.
///
/// # Example
///
/// ```no_run
/// use pdfweave::{to_json, JsonFormat};
///
/// let json = to_json("document.pdf", JsonFormat::Pretty).unwrap();
/// std::fs::write("output.json", json).unwrap();
/// ```
pub fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    let result = extract_file(path)?;
    render::to_json(&result, format)
}

/// Builder for assembling PDF documents.
///
/// # Example
///
/// ```no_run
/// use pdfweave::{PageSelection, Weaver};
///
/// let json = Weaver::new()
///     .lenient()
///     .with_pages(PageSelection::Range(1..=10))
///     .with_image_dir("./images")
///     .open("document.pdf")?
///     .to_json(pdfweave::JsonFormat::Compact)?;
/// # Ok::<(), pdfweave::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Weaver {
    options: AssembleOptions,
    image_dir: Option<std::path::PathBuf>,
}

impl Weaver {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep going when a page's content cannot be decoded.
    pub fn lenient(mut self) -> Self {
        self.options = self.options.lenient();
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.options = self.options.sequential();
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.options = self.options.with_pages(pages);
        self
    }

    /// Re-attempt failed image extractions.
    pub fn with_retries(mut self, retries: u8) -> Self {
        self.options = self.options.with_retries(retries);
        self
    }

    /// Write manifest images to `dir` after assembling.
    pub fn with_image_dir(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.image_dir = Some(dir.into());
        self
    }

    /// Assemble a PDF file.
    pub fn open<P: AsRef<Path>>(self, path: P) -> Result<WeaveResult> {
        let source = PdfSource::open(path)?;
        self.run(&source)
    }

    /// Assemble a PDF from bytes.
    pub fn open_bytes(self, data: &[u8]) -> Result<WeaveResult> {
        let source = PdfSource::from_bytes(data)?;
        self.run(&source)
    }

    /// Assemble any document source.
    pub fn run<S: DocumentSource + ?Sized>(self, source: &S) -> Result<WeaveResult> {
        let result = Assembler::new(self.options).assemble(source)?;
        if let Some(dir) = &self.image_dir {
            render::write_manifest(&result, dir)?;
        }
        Ok(WeaveResult { result })
    }
}

/// Result of assembling a document.
#[derive(Debug, Clone)]
pub struct WeaveResult {
    /// The assembled document
    pub result: DocumentResult,
}

impl WeaveResult {
    /// Convert to JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        render::to_json(&self.result, format)
    }

    /// Convert to plain text, placeholders included.
    pub fn to_text(&self) -> String {
        render::to_text(&self.result)
    }

    /// Placeholder and word counts.
    pub fn stats(&self) -> AssemblyStats {
        AssemblyStats::from_result(&self.result)
    }

    /// Get the assembled document.
    pub fn document(&self) -> &DocumentResult {
        &self.result
    }
}
