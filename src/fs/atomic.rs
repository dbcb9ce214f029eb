//! Atomic file replacement for scaffolded files.
//!
//! Content goes to a sibling temporary file (`.{name}.{pid}.tmp`), is synced
//! to disk and then renamed over the target, so an interrupted `ralph init`
//! never leaves a half-written agent file or config behind. The rename is
//! atomic only when the temporary file and the target share a filesystem,
//! which holds because they share a directory.

use crate::error::{RalphError, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Replace `path` with `content`, creating parent directories as needed.
pub fn write_atomic<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            RalphError::UserError(format!(
                "failed to create directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let temp = temp_path(path)?;
    if let Err(e) = write_synced(&temp, content.as_bytes()) {
        let _ = fs::remove_file(&temp);
        return Err(e);
    }

    fs::rename(&temp, path).map_err(|e| {
        let _ = fs::remove_file(&temp);
        RalphError::UserError(format!(
            "failed to replace '{}': {}",
            path.display(),
            e
        ))
    })
}

fn temp_path(target: &Path) -> Result<PathBuf> {
    let name = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            RalphError::UserError(format!("invalid file path '{}'", target.display()))
        })?;

    let temp_name = format!(".{}.{}.tmp", name, std::process::id());
    Ok(target.with_file_name(temp_name))
}

fn write_synced(path: &Path, content: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| {
        RalphError::UserError(format!(
            "failed to create temporary file '{}': {}",
            path.display(),
            e
        ))
    })?;

    file.write_all(content)
        .and_then(|()| file.sync_all())
        .map_err(|e| {
            RalphError::UserError(format!(
                "failed to write temporary file '{}': {}",
                path.display(),
                e
            ))
        })
}
