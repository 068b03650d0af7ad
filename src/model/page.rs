//! Page-level types.

use super::ImageRef;
use serde::{Deserialize, Serialize};

/// A single page as reported by a document source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed)
    pub index: u32,

    /// Content blocks in reading order
    pub blocks: Vec<ContentBlock>,

    /// Images present on the page, reported independently of `blocks`
    pub image_inventory: Vec<ImageRef>,
}

impl Page {
    /// Create an empty page.
    pub fn new(index: u32) -> Self {
        Self {
            index,
            blocks: Vec::new(),
            image_inventory: Vec::new(),
        }
    }

    /// Add a block to the page.
    pub fn add_block(&mut self, block: ContentBlock) {
        self.blocks.push(block);
    }

    /// Add a text block built from spans.
    pub fn add_text<I, S>(&mut self, spans: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blocks.push(ContentBlock::text(spans));
    }

    /// Add an image block.
    pub fn add_image(&mut self, reference: Option<ImageRef>) {
        self.blocks.push(ContentBlock::Image { reference });
    }

    /// Record an image in the page inventory.
    pub fn add_inventory(&mut self, reference: ImageRef) {
        self.image_inventory.push(reference);
    }

    /// Builder form of [`Page::add_text`].
    pub fn with_text<I, S>(mut self, spans: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_text(spans);
        self
    }

    /// Builder form of [`Page::add_image`].
    pub fn with_image(mut self, reference: Option<ImageRef>) -> Self {
        self.add_image(reference);
        self
    }

    /// Builder form of [`Page::add_inventory`].
    pub fn with_inventory(mut self, reference: ImageRef) -> Self {
        self.add_inventory(reference);
        self
    }

    /// Text of the page without any image placeholders.
    ///
    /// Spans are joined by single spaces and blocks by newlines.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { spans } => Some(spans.join(" ")),
                ContentBlock::Image { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }

    /// Check if the page has no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Get the number of blocks on the page.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// References named by image blocks, in block order (duplicates kept).
    pub fn block_references(&self) -> impl Iterator<Item = ImageRef> + '_ {
        self.blocks.iter().filter_map(ContentBlock::reference)
    }
}

/// A content block on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// A run of text spans
    Text {
        /// Span strings in reading order
        spans: Vec<String>,
    },

    /// An image; `None` for inline or drawn images without extractable bytes
    Image {
        /// Reference into the document's images
        reference: Option<ImageRef>,
    },
}

impl ContentBlock {
    /// Create a text block.
    pub fn text<I, S>(spans: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ContentBlock::Text {
            spans: spans.into_iter().map(Into::into).collect(),
        }
    }

    /// Create an image block with a reference.
    pub fn image(reference: ImageRef) -> Self {
        ContentBlock::Image {
            reference: Some(reference),
        }
    }

    /// Create an inline image block.
    pub fn inline_image() -> Self {
        ContentBlock::Image { reference: None }
    }

    /// Check if this block is text.
    pub fn is_text(&self) -> bool {
        matches!(self, ContentBlock::Text { .. })
    }

    /// Check if this block is an image.
    pub fn is_image(&self) -> bool {
        matches!(self, ContentBlock::Image { .. })
    }

    /// The image reference, if this is an image block that has one.
    pub fn reference(&self) -> Option<ImageRef> {
        match self {
            ContentBlock::Image { reference } => *reference,
            ContentBlock::Text { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_new() {
        let page = Page::new(1);
        assert_eq!(page.index, 1);
        assert!(page.is_empty());
        assert!(page.image_inventory.is_empty());
    }

    #[test]
    fn test_plain_text_skips_images() {
        let page = Page::new(1)
            .with_text(["Hello", "world"])
            .with_image(Some(ImageRef::new(5, 0)))
            .with_text(["Bye"]);
        assert_eq!(page.plain_text(), "Hello world\nBye");
        assert_eq!(page.block_count(), 3);
    }

    #[test]
    fn test_block_variants() {
        let img = ContentBlock::image(ImageRef::new(3, 0));
        assert!(img.is_image());
        assert!(!img.is_text());
        assert_eq!(img.reference(), Some(ImageRef::new(3, 0)));

        assert_eq!(ContentBlock::inline_image().reference(), None);
        assert_eq!(ContentBlock::text(["a"]).reference(), None);
    }

    #[test]
    fn test_block_references_keeps_duplicates() {
        let r = ImageRef::new(9, 0);
        let page = Page::new(2)
            .with_image(Some(r))
            .with_image(None)
            .with_image(Some(r));
        assert_eq!(page.block_references().collect::<Vec<_>>(), vec![r, r]);
    }
}
