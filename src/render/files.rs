//! Writing image payloads to disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::assemble::ImageListing;
use crate::error::Result;
use crate::model::DocumentResult;

/// Write every manifest entry to `dir` as `imageN.ext`.
///
/// The directory is created if needed. Returns the written paths in
/// manifest order.
pub fn write_manifest<P: AsRef<Path>>(result: &DocumentResult, dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(result.images.len());
    for entry in &result.images {
        let path = dir.join(entry.filename());
        fs::write(&path, &entry.payload)?;
        log::debug!("wrote {} ({} bytes)", path.display(), entry.size());
        written.push(path);
    }
    Ok(written)
}

/// Write every listed image to `dir` as `{page}-{object}.ext`.
pub fn write_listing<P: AsRef<Path>>(listing: &ImageListing, dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(listing.image_count());
    for image in listing.pages.iter().flat_map(|p| &p.images) {
        let path = dir.join(image.filename());
        fs::write(&path, &image.payload)?;
        written.push(path);
    }
    Ok(written)
}
