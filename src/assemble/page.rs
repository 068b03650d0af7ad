//! Page assembly: interleave text and image placeholders.

use std::borrow::Cow;
use std::collections::HashSet;

use crate::model::{ContentBlock, ImageRef, Page, PageResult};
use crate::source::ImageExtractor;

use super::placeholder::{Placeholder, ERROR_TOKEN, INLINE_TOKEN};
use super::registry::ImageRegistry;

/// One element of a page in assembly order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Piece<'a> {
    /// A text span
    Text(&'a str),
    /// An image block with a reference
    Image(ImageRef),
    /// An image block without a reference
    Inline,
    /// An inventory image no block mentioned
    Orphan(ImageRef),
}

/// Visit a page in assembly order: blocks first, then orphans.
///
/// Orphans are the inventory entries not referenced by any image block,
/// in inventory order, each at most once. Running them after the block
/// pass keeps in-flow placeholders independent of the inventory.
pub(crate) fn walk_page<'a>(page: &'a Page, mut visit: impl FnMut(Piece<'a>)) {
    let mut used: HashSet<ImageRef> = HashSet::new();

    for block in &page.blocks {
        match block {
            ContentBlock::Text { spans } => {
                for span in spans {
                    visit(Piece::Text(span));
                }
            }
            ContentBlock::Image { reference: None } => visit(Piece::Inline),
            ContentBlock::Image {
                reference: Some(reference),
            } => {
                used.insert(*reference);
                visit(Piece::Image(*reference));
            }
        }
    }

    for reference in &page.image_inventory {
        if used.insert(*reference) {
            visit(Piece::Orphan(*reference));
        }
    }
}

/// Render a page, asking `token` for the placeholder of each reference.
pub(crate) fn render_page<F>(page: &Page, mut token: F) -> PageResult
where
    F: FnMut(ImageRef) -> String,
{
    let mut pieces: Vec<Cow<'_, str>> = Vec::new();
    walk_page(page, |piece| {
        pieces.push(match piece {
            Piece::Text(text) => Cow::Borrowed(text),
            Piece::Inline => Cow::Borrowed(INLINE_TOKEN),
            Piece::Image(reference) | Piece::Orphan(reference) => Cow::Owned(token(reference)),
        })
    });

    PageResult::new(page.index, pieces.join(" ").trim())
}

/// Assemble one page against a document's registry.
///
/// Images are resolved through `registry`, extracting through `extractor`
/// on first sight. A failed image becomes `{{image-error}}` and the page
/// carries on.
///
/// # Example
///
/// ```
/// use pdfweave::assemble::{assemble_page, ImageRegistry};
/// use pdfweave::model::{ExtractedImage, ImageRef, Page};
/// use pdfweave::ImageError;
///
/// let r1 = ImageRef::new(5, 0);
/// let page = Page::new(1)
///     .with_text(["A"])
///     .with_image(Some(r1))
///     .with_text(["B"]);
///
/// let extractor = |_: ImageRef| -> Result<ExtractedImage, ImageError> {
///     Ok(ExtractedImage::new("png", vec![0x89]))
/// };
/// let mut registry = ImageRegistry::new();
/// let result = assemble_page(&page, &mut registry, &extractor);
/// assert_eq!(result.text, "A {{image1}} B");
/// ```
pub fn assemble_page<E>(page: &Page, registry: &mut ImageRegistry, extractor: &E) -> PageResult
where
    E: ImageExtractor + ?Sized,
{
    render_page(page, |reference| match registry.resolve(reference, extractor) {
        Ok(id) => Placeholder::Image(id).to_string(),
        Err(e) => {
            log::warn!("page {}: {}", page.index, e);
            ERROR_TOKEN.to_string()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImageError;
    use crate::model::ExtractedImage;
    use std::cell::RefCell;

    type Outcome = Result<ExtractedImage, ImageError>;

    fn ok_extractor(r: ImageRef) -> Outcome {
        Ok(ExtractedImage::new("jpg", vec![r.object as u8]))
    }

    #[test]
    fn test_spans_join_with_single_space() {
        let page = Page::new(1).with_text(["Hello", "world"]).with_text(["again"]);
        let mut registry = ImageRegistry::new();
        let result = assemble_page(&page, &mut registry, &ok_extractor);
        assert_eq!(result, PageResult::new(1, "Hello world again"));
    }

    #[test]
    fn test_inner_whitespace_is_kept_outer_is_trimmed() {
        let page = Page::new(3).with_text(["  lead", "mid  ", "tail  "]);
        let mut registry = ImageRegistry::new();
        let result = assemble_page(&page, &mut registry, &ok_extractor);
        assert_eq!(result.text, "lead mid   tail");
        assert_eq!(result.page, 3);
    }

    #[test]
    fn test_order_preservation() {
        let r1 = ImageRef::new(11, 0);
        let page = Page::new(1)
            .with_text(["A"])
            .with_image(Some(r1))
            .with_text(["B"]);
        let mut registry = ImageRegistry::new();
        let result = assemble_page(&page, &mut registry, &ok_extractor);
        assert_eq!(result.text, "A {{image1}} B");
    }

    #[test]
    fn test_orphans_follow_blocks_in_inventory_order() {
        let (r1, r2, r3) = (ImageRef::new(1, 0), ImageRef::new(2, 0), ImageRef::new(3, 0));
        let page = Page::new(1)
            .with_text(["A"])
            .with_image(Some(r2))
            .with_inventory(r3)
            .with_inventory(r2)
            .with_inventory(r1)
            .with_inventory(r3);
        let mut registry = ImageRegistry::new();
        let result = assemble_page(&page, &mut registry, &ok_extractor);
        assert_eq!(result.text, "A {{image1}} {{image2}} {{image3}}");

        let order: Vec<_> = registry.snapshot().iter().map(|e| e.payload[0]).collect();
        assert_eq!(order, vec![2, 3, 1]);
    }

    #[test]
    fn test_inline_image_skips_registry() {
        let calls = RefCell::new(Vec::new());
        let extractor = |r: ImageRef| -> Outcome {
            calls.borrow_mut().push(r);
            ok_extractor(r)
        };
        let page = Page::new(1).with_text(["x"]).with_image(None);
        let mut registry = ImageRegistry::new();
        let result = assemble_page(&page, &mut registry, &extractor);
        assert_eq!(result.text, "x {{image-inline}}");
        assert!(calls.borrow().is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_failure_emits_error_token_and_continues() {
        let bad = ImageRef::new(9, 0);
        let good = ImageRef::new(10, 0);
        let extractor = |r: ImageRef| -> Outcome {
            if r == bad {
                Err(ImageError::Decode {
                    reference: r,
                    reason: "bad huffman table".into(),
                })
            } else {
                ok_extractor(r)
            }
        };
        let page = Page::new(1)
            .with_image(Some(bad))
            .with_text(["after"])
            .with_image(Some(good))
            .with_inventory(bad);
        let mut registry = ImageRegistry::new();
        let result = assemble_page(&page, &mut registry, &extractor);
        assert_eq!(result.text, "{{image-error}} after {{image1}}");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_empty_page() {
        let mut registry = ImageRegistry::new();
        let result = assemble_page(&Page::new(4), &mut registry, &ok_extractor);
        assert_eq!(result, PageResult::new(4, ""));
    }

    #[test]
    fn test_walk_page_pieces() {
        let r = ImageRef::new(1, 0);
        let o = ImageRef::new(2, 0);
        let page = Page::new(1)
            .with_text(["t"])
            .with_image(None)
            .with_image(Some(r))
            .with_inventory(o);
        let mut pieces = Vec::new();
        walk_page(&page, |p| pieces.push(p));
        assert_eq!(
            pieces,
            vec![
                Piece::Text("t"),
                Piece::Inline,
                Piece::Image(r),
                Piece::Orphan(o)
            ]
        );
    }
}
