//! Plain text rendering of assembled documents.

use crate::model::{DocumentResult, PageResult, TextDocument};

/// Join page texts with blank lines, skipping empty pages.
fn join_pages(pages: &[PageResult]) -> String {
    pages
        .iter()
        .map(|p| p.text.as_str())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Convert an assembled document to plain text, placeholders included.
pub fn to_text(result: &DocumentResult) -> String {
    join_pages(&result.pages)
}

/// Convert a plain-text document to a single string.
pub fn text_document_to_string(doc: &TextDocument) -> String {
    join_pages(&doc.pages)
}
