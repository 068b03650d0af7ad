//! Output rendering for assembled documents.

mod files;
mod json;
mod text;

pub use files::{write_listing, write_manifest};
pub use json::{listing_to_json, text_to_json, to_json, JsonFormat};
pub use text::{text_document_to_string, to_text};
