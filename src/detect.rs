//! Input validation run before a document is opened.
//!
//! The assembler must never see an unparseable document; these checks
//! reject obviously wrong input early with [`Error::UnknownFormat`] or
//! [`Error::UnsupportedVersion`].

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";
const VERSION_LEN: usize = 3; // e.g., "1.7"

/// Some producers emit junk before the header; readers tolerate this much.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// MIME type accepted by [`is_pdf_content_type`].
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Detect the PDF version from the start of a file.
///
/// # Example
/// ```no_run
/// use pdfweave::detect::detect_format_from_path;
///
/// let version = detect_format_from_path("document.pdf").unwrap();
/// println!("PDF version: {}", version);
/// ```
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<String> {
    let mut header = Vec::with_capacity(HEADER_SEARCH_WINDOW);
    File::open(path)?
        .take(HEADER_SEARCH_WINDOW as u64)
        .read_to_end(&mut header)?;
    detect_format_from_bytes(&header)
}

/// Detect the PDF version from bytes.
///
/// The header may be preceded by up to 1 KiB of other data.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<String> {
    let window = &data[..data.len().min(HEADER_SEARCH_WINDOW)];
    let start = window
        .windows(PDF_MAGIC.len())
        .position(|w| w == PDF_MAGIC)
        .ok_or(Error::UnknownFormat)?;

    let version_start = start + PDF_MAGIC.len();
    let version_bytes = data
        .get(version_start..version_start + VERSION_LEN)
        .ok_or(Error::UnknownFormat)?;
    let version = String::from_utf8_lossy(version_bytes).to_string();

    if !is_valid_version(&version) {
        return Err(Error::UnsupportedVersion(version));
    }

    Ok(version)
}

/// Check if a version string looks like "1.7" or "2.0".
fn is_valid_version(version: &str) -> bool {
    let bytes = version.as_bytes();
    bytes.len() == 3
        && matches!(bytes[0], b'1' | b'2')
        && bytes[1] == b'.'
        && bytes[2].is_ascii_digit()
}

/// Check if bytes carry a PDF header.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    detect_format_from_bytes(data).is_ok()
}

/// Check a declared MIME type, ignoring parameters and case.
///
/// Boundary layers use this to refuse uploads before reading them.
pub fn is_pdf_content_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|mime| mime.trim().eq_ignore_ascii_case(PDF_CONTENT_TYPE))
        .unwrap_or(false)
}
