//! Source tree discovery.
//!
//! Images live one directory per SKU, e.g. `images/kivy-007/front.jpg`. The
//! directory name is the SKU; files directly under the root are ignored.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::classify::{classify_directory, Candidate};
use crate::error::IngestError;

/// Extensions accepted by the scanner, compared case-insensitively.
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// A directory found by [`scan_source`], not yet reconciled with the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedDirectory {
    pub path: PathBuf,
    pub sku: String,
    pub candidate: Candidate,
    /// Sorted image paths.
    pub images: Vec<PathBuf>,
}

/// Checks that the source path exists, is a directory, and can be listed.
///
/// # Errors
///
/// Returns [`IngestError::InvalidSource`] describing the first failed check.
pub fn validate_source_path(path: &Path) -> Result<(), IngestError> {
    let invalid = |reason: String| IngestError::InvalidSource {
        path: path.to_path_buf(),
        reason,
    };

    let meta = fs::metadata(path).map_err(|e| invalid(format!("cannot access: {e}")))?;
    if !meta.is_dir() {
        return Err(invalid("not a directory".to_string()));
    }
    fs::read_dir(path).map_err(|e| invalid(format!("not readable: {e}")))?;
    Ok(())
}

/// Returns `true` if the file name carries an allowed image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            ALLOWED_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
}

/// Walks `root` recursively and groups supported, non-empty images by the
/// name of their immediate parent directory.
///
/// Unreadable entries are logged and skipped. Directories that end up with no
/// eligible image have no entry in the result.
///
/// # Errors
///
/// Returns [`IngestError::Io`] only if `root` itself cannot be listed.
pub fn scan_source(root: &Path) -> Result<BTreeMap<String, ScannedDirectory>, IngestError> {
    let mut groups: BTreeMap<String, ScannedDirectory> = BTreeMap::new();

    for entry in WalkDir::new(root).min_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(IngestError::Io {
                    path: root.to_path_buf(),
                    source: e.into(),
                });
            }
            Err(e) => {
                tracing::warn!(
                    path = %e.path().map(|p| p.display().to_string()).unwrap_or_default(),
                    error = %e,
                    "skipping unreadable entry"
                );
                continue;
            }
        };

        // Files directly under the root have no SKU directory.
        if entry.file_type().is_dir() || entry.depth() == 1 {
            continue;
        }
        let path = entry.path();
        if !is_supported_image(path) {
            continue;
        }

        match fs::metadata(path) {
            Ok(meta) if meta.is_file() && meta.len() > 0 => {}
            Ok(_) => {
                tracing::debug!(path = %path.display(), "skipping empty file");
                continue;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable file");
                continue;
            }
        }

        let Some(dir) = path.parent() else {
            continue;
        };
        let Some(sku) = dir.file_name().and_then(|n| n.to_str()) else {
            tracing::warn!(path = %dir.display(), "skipping directory with non UTF-8 name");
            continue;
        };

        groups
            .entry(sku.to_string())
            .or_insert_with(|| ScannedDirectory {
                path: dir.to_path_buf(),
                sku: sku.to_string(),
                candidate: classify_directory(sku),
                images: Vec::new(),
            })
            .images
            .push(path.to_path_buf());
    }

    for group in groups.values_mut() {
        group.images.sort();
    }

    Ok(groups)
}
