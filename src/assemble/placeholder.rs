//! Placeholder tokens embedded in page text.
//!
//! The vocabulary is closed: `{{imageN}}` for a manifest entry,
//! `{{image-error}}` for an image that failed extraction and
//! `{{image-inline}}` for an image block without a reference.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// Token for an image that could not be extracted.
pub const ERROR_TOKEN: &str = "{{image-error}}";

/// Token for an inline image without extractable bytes.
pub const INLINE_TOKEN: &str = "{{image-inline}}";

/// Prefix of manifest ids.
pub const ID_PREFIX: &str = "image";

/// Manifest id for the `n`-th extracted image (1-based).
pub fn image_id(n: usize) -> String {
    format!("{}{}", ID_PREFIX, n)
}

/// One placeholder occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder<'a> {
    /// Successfully resolved image with its manifest id
    Image(&'a str),
    /// Extraction failed
    Error,
    /// Inline image, registry not consulted
    Inline,
}

impl fmt::Display for Placeholder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placeholder::Image(id) => write!(f, "{{{{{}}}}}", id),
            Placeholder::Error => f.write_str(ERROR_TOKEN),
            Placeholder::Inline => f.write_str(INLINE_TOKEN),
        }
    }
}

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{(image[1-9][0-9]*|image-error|image-inline)\}\}").unwrap()
    })
}

/// All placeholders in `text`, in order of appearance.
pub fn scan(text: &str) -> impl Iterator<Item = Placeholder<'_>> {
    token_regex().captures_iter(text).filter_map(|caps| {
        let name = caps.get(1)?.as_str();
        Some(match name {
            "image-error" => Placeholder::Error,
            "image-inline" => Placeholder::Inline,
            id => Placeholder::Image(id),
        })
    })
}

/// Manifest ids referenced by placeholders in `text`, in order, with repeats.
pub fn referenced_ids(text: &str) -> impl Iterator<Item = &str> {
    scan(text).filter_map(|p| match p {
        Placeholder::Image(id) => Some(id),
        Placeholder::Error | Placeholder::Inline => None,
    })
}
