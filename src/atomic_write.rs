//! Write-then-rename file output.
//!
//! The content is written to a temporary file in the destination directory
//! and renamed over the final path in one step, so a reader never observes
//! a half-written artifact under the final name. On any error the
//! temporary file is removed and an existing file at `path` is untouched.

use anyhow::{Context, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Run `write` against a temp file and atomically move it to `path`.
pub fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    let dir = target_dir(path);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    let mut tmp = NamedTempFile::new_in(&dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    write(tmp.as_file_mut())?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("Failed to flush {}", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;

    Ok(())
}

fn target_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
