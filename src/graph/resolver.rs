//! Resolution of `@import` references to stylesheet files on disk.
//!
//! A reference is a `/`-separated path without extension, relative to the
//! directory of the importing file. Each reference expands to exactly four
//! candidate filenames, probed in a fixed order:
//!
//! 1. `name`
//! 2. `_name`
//! 3. `name.scss`
//! 4. `_name.scss`

use std::path::{Component, Path, PathBuf};

/// Extension appended to candidate filenames.
pub const STYLESHEET_EXTENSION: &str = "scss";

/// Builds the candidate paths for an import reference, in probe order.
///
/// # Arguments
///
/// * `reference` - The string inside `@import '...'`
/// * `importer` - Absolute path of the file containing the import
///
/// # Example
///
/// ```
/// use std::path::{Path, PathBuf};
/// use stylegraph::graph::resolver::candidates;
///
/// let found = candidates("a/b", Path::new("/src/dir/file.scss"));
/// assert_eq!(
///     found,
///     vec![
///         PathBuf::from("/src/dir/a/b"),
///         PathBuf::from("/src/dir/a/_b"),
///         PathBuf::from("/src/dir/a/b.scss"),
///         PathBuf::from("/src/dir/a/_b.scss"),
///     ]
/// );
/// ```
pub fn candidates(reference: &str, importer: &Path) -> Vec<PathBuf> {
    let (directory, filename) = match reference.rsplit_once('/') {
        Some((directory, filename)) => (directory, filename),
        None => ("", reference),
    };

    let base = importer.parent().unwrap_or_else(|| Path::new(""));
    let directory = normalize(&base.join(directory));

    [
        filename.to_string(),
        format!("_{}", filename),
        format!("{}.{}", filename, STYLESHEET_EXTENSION),
        format!("_{}.{}", filename, STYLESHEET_EXTENSION),
    ]
    .into_iter()
    .map(|candidate| directory.join(candidate))
    .collect()
}

/// Resolves an import reference to the first candidate that exists.
///
/// Only regular files count; a directory that happens to share a
/// candidate's name is skipped.
///
/// # Returns
///
/// `Some(path)` for the first existing candidate, `None` if none exist.
pub fn resolve_import(reference: &str, importer: &Path) -> Option<PathBuf> {
    candidates(reference, importer)
        .into_iter()
        .find(|candidate| candidate.is_file())
}

/// Lexically normalizes a path, folding `.` and `..` components.
///
/// No filesystem access is performed, so symlinks are not followed.
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    normalized.pop();
                } else if !normalized.has_root() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }

    normalized
}

/// Computes the graph id of a file: its path relative to the base directory.
///
/// Ids always use `/` separators. Files outside the base directory get
/// leading `..` segments.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use stylegraph::graph::resolver::relative_id;
///
/// let base = Path::new("/repo/src");
/// assert_eq!(relative_id(base, Path::new("/repo/src/globals/_vars.scss")), "globals/_vars.scss");
/// assert_eq!(relative_id(base, Path::new("/repo/vendor/_x.scss")), "../vendor/_x.scss");
/// ```
pub fn relative_id(base: &Path, path: &Path) -> String {
    let base = normalize(base);
    let path = normalize(path);

    let base_parts: Vec<Component> = base.components().collect();
    let path_parts: Vec<Component> = path.components().collect();

    let shared = base_parts
        .iter()
        .zip(path_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments: Vec<String> = Vec::new();
    for _ in shared..base_parts.len() {
        segments.push("..".to_string());
    }
    for part in &path_parts[shared..] {
        segments.push(part.as_os_str().to_string_lossy().into_owned());
    }

    segments.join("/")
}
