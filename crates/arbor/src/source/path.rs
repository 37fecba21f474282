// ABOUTME: Path resolution: normalizes a raw path against a base directory and classifies it.
// ABOUTME: A directory that collides with a uniquely named markup file resolves to that file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::predicates::is_markup_extension;

/// What a resolved path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    File,
    Directory,
    Unknown,
}

/// A normalized absolute path plus its classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub absolute_path: PathBuf,
    pub directory: PathBuf,
    pub filename: String,
    pub extension: Option<String>,
    pub kind: PathKind,
}

/// True when file names on this platform's usual filesystems compare
/// case-insensitively.
pub const CASE_INSENSITIVE_FS: bool = cfg!(any(windows, target_os = "macos"));

fn fold(name: &str) -> String {
    if CASE_INSENSITIVE_FS {
        name.to_lowercase()
    } else {
        name.to_string()
    }
}

/// Returns true if `name` is `<stem>.<something>`, comparing with the
/// platform's case rules.
pub(crate) fn names_match_prefix(name: &str, stem: &str) -> bool {
    if stem.is_empty() {
        return false;
    }
    let name = fold(name);
    let prefix = format!("{}.", fold(stem));
    name.starts_with(&prefix)
}

/// Names of the regular files in `dir` that carry a markup extension, sorted.
///
/// A missing directory yields `Ok(None)`.
pub(crate) fn markup_files(dir: &Path) -> Result<Option<Vec<String>>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if is_absent(&e) => return Ok(None),
        Err(e) => return Err(fs_error(dir, "ReadDir", e)),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| fs_error(dir, "ReadDir", e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_markup_extension(&name) && entry.path().is_file() {
            names.push(name);
        }
    }
    names.sort();
    Ok(Some(names))
}

/// Returns the single markup file in `dir` named `<stem>.<ext>`, if exactly
/// one exists.
pub(crate) fn unique_markup_match(dir: &Path, stem: &str) -> Result<Option<PathBuf>> {
    let Some(files) = markup_files(dir)? else {
        return Ok(None);
    };
    let mut matches = files.iter().filter(|name| names_match_prefix(name, stem));
    match (matches.next(), matches.next()) {
        (Some(only), None) => Ok(Some(dir.join(only))),
        _ => Ok(None),
    }
}

fn is_absent(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

pub(crate) fn fs_error(path: &Path, op: &str, e: io::Error) -> Error {
    Error::filesystem(
        path.display().to_string(),
        op,
        Some(anyhow::Error::new(e)),
    )
}

/// Resolves `path` against `base` and classifies the result.
///
/// Relative paths are joined onto `base`; the result is lexically
/// normalized. A missing path is `PathKind::Unknown`, not an error.
pub fn resolve(path: impl AsRef<Path>, base: impl AsRef<Path>) -> Result<ResolvedPath> {
    let path = path.as_ref();
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.as_ref().join(path)
    };
    classify(path_clean::clean(&joined))
}

fn classify(absolute: PathBuf) -> Result<ResolvedPath> {
    let kind = match fs::metadata(&absolute) {
        Ok(meta) if meta.is_file() => PathKind::File,
        Ok(meta) if meta.is_dir() => {
            if let Some(file) = colliding_markup_file(&absolute)? {
                tracing::debug!(
                    directory = %absolute.display(),
                    file = %file.display(),
                    "directory collides with markup file, resolving to the file"
                );
                return Ok(details(file, PathKind::File));
            }
            PathKind::Directory
        }
        Ok(_) => PathKind::Unknown,
        Err(e) if is_absent(&e) => PathKind::Unknown,
        Err(e) => return Err(fs_error(&absolute, "Resolve", e)),
    };
    Ok(details(absolute, kind))
}

// A directory `docs` whose parent holds exactly one `docs.<...>.html|xml` file.
fn colliding_markup_file(dir: &Path) -> Result<Option<PathBuf>> {
    let (Some(parent), Some(name)) = (dir.parent(), dir.file_name()) else {
        return Ok(None);
    };
    unique_markup_match(parent, &name.to_string_lossy())
}

fn details(absolute: PathBuf, kind: PathKind) -> ResolvedPath {
    let directory = absolute
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| absolute.clone());
    let filename = absolute
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = absolute
        .extension()
        .map(|e| e.to_string_lossy().into_owned());

    ResolvedPath {
        absolute_path: absolute,
        directory,
        filename,
        extension,
        kind,
    }
}
