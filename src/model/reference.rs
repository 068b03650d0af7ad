//! Opaque image references.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-document key correlating an image block with its embedded bytes.
///
/// For PDF sources this is the indirect object id of the image XObject.
/// The assembler only hashes and compares references; it never looks
/// inside them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImageRef {
    /// Object number
    pub object: u32,
    /// Generation number
    pub generation: u16,
}

impl ImageRef {
    /// Object 0 is the head of the PDF free list and never names a real
    /// object. Sources use it for image invocations whose target is missing,
    /// so extraction of it always fails.
    pub const NULL: ImageRef = ImageRef {
        object: 0,
        generation: 65535,
    };

    /// Create a reference from an object id.
    pub const fn new(object: u32, generation: u16) -> Self {
        Self { object, generation }
    }

    /// Whether this is [`ImageRef::NULL`].
    pub fn is_null(&self) -> bool {
        self.object == 0
    }
}

impl From<(u32, u16)> for ImageRef {
    fn from((object, generation): (u32, u16)) -> Self {
        Self::new(object, generation)
    }
}

impl From<ImageRef> for (u32, u16) {
    fn from(r: ImageRef) -> Self {
        (r.object, r.generation)
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.object, self.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_pdf_reference_syntax() {
        assert_eq!(ImageRef::new(7, 0).to_string(), "7 0 R");
    }

    #[test]
    fn test_null_reference() {
        assert!(ImageRef::NULL.is_null());
        assert!(!ImageRef::new(1, 0).is_null());
    }

    #[test]
    fn test_object_id_conversion() {
        let r: ImageRef = (42, 3).into();
        let id: (u32, u16) = r.into();
        assert_eq!(id, (42, 3));
    }
}
