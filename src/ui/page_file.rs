//! Writing the rendered page to disk.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Replaces the page at `dst` with `content` through a sibling temp file
/// and a rename, so a browser reloading `dst` never sees half a page.
pub fn atomic_write(dst: &Path, content: &[u8]) -> Result<()> {
    let temp_path = temp_sibling(dst);

    // create_new refuses an existing path, including a planted symlink
    let mut temp_file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)
        .with_context(|| format!("Cannot create temporary file for page '{}'", dst.display()))?;

    let written = temp_file
        .write_all(content)
        .and_then(|()| temp_file.sync_all());
    drop(temp_file);
    if let Err(e) = written {
        discard(&temp_path);
        return Err(e).with_context(|| format!("Cannot write page '{}'", dst.display()));
    }

    #[cfg(windows)]
    if dst.exists() {
        if let Err(e) = std::fs::remove_file(dst) {
            discard(&temp_path);
            return Err(e).with_context(|| format!("Cannot replace page '{}'", dst.display()));
        }
    }

    if let Err(e) = std::fs::rename(&temp_path, dst) {
        discard(&temp_path);
        return Err(e).with_context(|| format!("Cannot move new page into '{}'", dst.display()));
    }
    Ok(())
}

/// `board.html` → `board.page-<nanos>.tmp` in the same directory, so the
/// rename never crosses filesystems.
fn temp_sibling(dst: &Path) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let stem = dst
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "page".to_string());
    dst.with_file_name(format!("{stem}.page-{nanos:x}.tmp"))
}

fn discard(temp_path: &Path) {
    if let Err(e) = std::fs::remove_file(temp_path) {
        tracing::debug!(path = %temp_path.display(), error = %e, "Failed to remove temporary page");
    }
}
