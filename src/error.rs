//! Error types for pdfweave.
//!
//! Two layers: [`Error`] covers failures that stop a document before or
//! while its pages are read, and [`ImageError`] covers a single image that
//! could not be materialized. Image errors never escape the page that
//! produced them; the assembler turns them into `{{image-error}}`.

use std::io;
use thiserror::Error;

use crate::model::ImageRef;

/// Result type alias for pdfweave operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort reading a document.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not recognized as a PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF header carries a version we cannot read.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// Invalid page range specification.
    #[error("Invalid page range: {0}")]
    InvalidPageRange(String),

    /// Error while serializing or writing output.
    #[error("Rendering error: {0}")]
    Render(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

/// Failure to turn one image reference into bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    /// The reference does not point at any object in the document.
    #[error("image {0}: object not found")]
    NotFound(ImageRef),

    /// The referenced object exists but is not an image stream.
    #[error("image {0}: not an image XObject")]
    NotAnImage(ImageRef),

    /// The stream uses a filter we do not pass through or decode.
    #[error("image {reference}: unsupported filter {filter}")]
    UnsupportedFilter {
        /// Offending reference
        reference: ImageRef,
        /// Filter name as written in the stream dictionary
        filter: String,
    },

    /// The stream data is corrupt.
    #[error("image {reference}: decode failed: {reason}")]
    Decode {
        /// Offending reference
        reference: ImageRef,
        /// Decoder message
        reason: String,
    },

    /// A content block names an image the source cannot resolve at all.
    #[error("image {0}: unresolvable reference")]
    Unresolvable(ImageRef),
}

/// Coarse classification of an [`ImageError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageErrorKind {
    NotFound,
    NotAnImage,
    UnsupportedFilter,
    Decode,
    Unresolvable,
}

impl ImageError {
    /// The kind tag of this failure.
    pub fn kind(&self) -> ImageErrorKind {
        match self {
            ImageError::NotFound(_) => ImageErrorKind::NotFound,
            ImageError::NotAnImage(_) => ImageErrorKind::NotAnImage,
            ImageError::UnsupportedFilter { .. } => ImageErrorKind::UnsupportedFilter,
            ImageError::Decode { .. } => ImageErrorKind::Decode,
            ImageError::Unresolvable(_) => ImageErrorKind::Unresolvable,
        }
    }

    /// The reference that failed.
    pub fn reference(&self) -> ImageRef {
        match self {
            ImageError::NotFound(r) | ImageError::NotAnImage(r) | ImageError::Unresolvable(r) => {
                *r
            }
            ImageError::UnsupportedFilter { reference, .. }
            | ImageError::Decode { reference, .. } => *reference,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Encrypted;
        assert_eq!(err.to_string(), "Document is encrypted");

        let err = Error::PageOutOfRange(10, 5);
        assert_eq!(
            err.to_string(),
            "Page 10 is out of range (document has 5 pages)"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_image_error_kind_and_reference() {
        let r = ImageRef::new(12, 0);
        let err = ImageError::Decode {
            reference: r,
            reason: "corrupt deflate stream".into(),
        };
        assert_eq!(err.kind(), ImageErrorKind::Decode);
        assert_eq!(err.reference(), r);
        assert_eq!(
            err.to_string(),
            "image 12 0 R: decode failed: corrupt deflate stream"
        );

        let err = ImageError::Unresolvable(ImageRef::NULL);
        assert_eq!(err.kind(), ImageErrorKind::Unresolvable);
    }
}
