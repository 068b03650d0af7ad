//! Summary counts over an assembled document.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::DocumentResult;

use super::placeholder::{scan, Placeholder};

/// Counts gathered by scanning placeholder tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyStats {
    /// Pages in the result
    pub pages: usize,
    /// Manifest entries
    pub images: usize,
    /// `{{imageN}}` occurrences
    pub image_placeholders: usize,
    /// `{{image-error}}` occurrences
    pub error_placeholders: usize,
    /// `{{image-inline}}` occurrences
    pub inline_placeholders: usize,
    /// Whitespace-separated words, placeholders excluded
    pub words: usize,
    /// Distinct ids referenced by the text
    pub referenced_ids: usize,
    /// Ids referenced by the text with no manifest entry
    pub dangling_ids: usize,
    /// Manifest entries never referenced by the text
    pub unreferenced_images: usize,
}

impl AssemblyStats {
    /// Compute statistics for `result`.
    pub fn from_result(result: &DocumentResult) -> Self {
        let mut stats = Self {
            pages: result.pages.len(),
            images: result.images.len(),
            ..Self::default()
        };
        let mut ids = BTreeSet::new();

        for page in &result.pages {
            let mut tokens = 0;
            for placeholder in scan(&page.text) {
                tokens += 1;
                match placeholder {
                    Placeholder::Image(id) => {
                        stats.image_placeholders += 1;
                        ids.insert(id);
                    }
                    Placeholder::Error => stats.error_placeholders += 1,
                    Placeholder::Inline => stats.inline_placeholders += 1,
                }
            }
            // Assembly separates every placeholder by spaces.
            stats.words += page.text.split_whitespace().count().saturating_sub(tokens);
        }

        let manifest: BTreeSet<&str> = result.images.iter().map(|e| e.id.as_str()).collect();
        stats.referenced_ids = ids.len();
        stats.dangling_ids = ids.difference(&manifest).count();
        stats.unreferenced_images = manifest.difference(&ids).count();
        stats
    }

    /// Check that every manifest entry is referenced and vice versa.
    pub fn is_consistent(&self) -> bool {
        self.dangling_ids == 0 && self.unreferenced_images == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExtractedImage, ManifestEntry, PageResult};

    #[test]
    fn test_stats_counts() {
        let result = DocumentResult {
            page_count: 2,
            pages: vec![
                PageResult::new(1, "Hello there {{image1}} {{image-error}}"),
                PageResult::new(2, "{{image-inline}} {{image1}} {{image2}} end"),
            ],
            images: vec![
                ManifestEntry::new("image1".into(), ExtractedImage::new("png", vec![1])),
                ManifestEntry::new("image2".into(), ExtractedImage::new("jpg", vec![2])),
            ],
            ..Default::default()
        };

        let stats = AssemblyStats::from_result(&result);
        assert_eq!(stats.pages, 2);
        assert_eq!(stats.images, 2);
        assert_eq!(stats.image_placeholders, 3);
        assert_eq!(stats.error_placeholders, 1);
        assert_eq!(stats.inline_placeholders, 1);
        assert_eq!(stats.words, 3);
        assert_eq!(stats.referenced_ids, 2);
        assert_eq!(stats.dangling_ids, 0);
        assert_eq!(stats.unreferenced_images, 0);
        assert!(stats.is_consistent());
    }

    #[test]
    fn test_stats_empty() {
        let stats = AssemblyStats::from_result(&DocumentResult::default());
        assert_eq!(stats, AssemblyStats::default());
        assert!(stats.is_consistent());
    }

    #[test]
    fn test_stats_detects_mismatched_ids() {
        let result = DocumentResult {
            page_count: 1,
            pages: vec![PageResult::new(1, "{{image9}}")],
            images: vec![ManifestEntry::new(
                "image1".into(),
                ExtractedImage::new("png", vec![1]),
            )],
            ..Default::default()
        };

        let stats = AssemblyStats::from_result(&result);
        assert_eq!(stats.referenced_ids, 1);
        assert_eq!(stats.images, 1);
        assert_eq!(stats.dangling_ids, 1);
        assert_eq!(stats.unreferenced_images, 1);
        assert!(!stats.is_consistent());
    }
}
