// ABOUTME: Document discovery and loading from the filesystem.
// ABOUTME: Reads files as text and finds the single markup document behind a directory or bare name.

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::resource::decode_body;

use super::path::{fs_error, markup_files, resolve, unique_markup_match, PathKind, ResolvedPath};

const INDEX_FILE: &str = "index.html";

/// Loads the document a resolved path points at.
///
/// - `File`: the file's contents.
/// - `Directory`: `index.html` (any case), else the only markup file.
/// - `Unknown`: the only markup file in `directory` named `<filename>.<ext>`.
///
/// Returns `Ok(None)` when no single document can be chosen.
pub fn load_document(resolved: &ResolvedPath) -> Result<Option<String>> {
    match resolved.kind {
        PathKind::File => read_text(&resolved.absolute_path).map(Some),
        PathKind::Directory => {
            let Some(files) = markup_files(&resolved.absolute_path)? else {
                return Ok(None);
            };
            let chosen = files
                .iter()
                .find(|name| name.eq_ignore_ascii_case(INDEX_FILE))
                .or(match files.as_slice() {
                    [only] => Some(only),
                    _ => None,
                });
            match chosen {
                Some(name) => load_candidate(&resolved.absolute_path.join(name)),
                None => {
                    tracing::debug!(
                        directory = %resolved.absolute_path.display(),
                        candidates = files.len(),
                        "no single markup document in directory"
                    );
                    Ok(None)
                }
            }
        }
        PathKind::Unknown => {
            match unique_markup_match(&resolved.directory, &resolved.filename)? {
                Some(path) => load_candidate(&path),
                None => Ok(None),
            }
        }
    }
}

// Descends only into candidates that re-resolve to a file, so discovery
// always terminates.
fn load_candidate(path: &Path) -> Result<Option<String>> {
    let resolved = resolve(path, path.parent().unwrap_or(path))?;
    if resolved.kind != PathKind::File {
        return Ok(None);
    }
    tracing::debug!(file = %resolved.absolute_path.display(), "discovered markup document");
    load_document(&resolved)
}

/// Reads a file and decodes it as text, honouring a BOM or falling back to
/// charset detection.
pub fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| fs_error(path, "Read", e))?;
    Ok(decode_body(&bytes, None))
}
