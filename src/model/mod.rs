//! Document model types.
//!
//! Input side: [`Page`] and [`ContentBlock`], as reported by a document
//! source. Output side: [`PageResult`], [`ManifestEntry`] and
//! [`DocumentResult`], as produced by the assembler.

mod document;
mod manifest;
mod page;
mod reference;

pub use document::{DocumentResult, Metadata, PageResult, TextDocument};
pub use manifest::{extension_from_magic, ExtractedImage, ManifestEntry};
pub use page::{ContentBlock, Page};
pub use reference::ImageRef;
