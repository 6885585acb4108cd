//! Content path validation
//!
//! Content paths are slash-separated and independent of the host platform,
//! so cleaning is purely lexical and never touches the filesystem.

use super::error::{Result, SetupError};
use super::{PathKind, SliceKey};

/// Lexically clean a slash-separated path
///
/// Repeated separators collapse, `.` segments vanish and `..` removes the
/// preceding segment. `..` at the root stays at the root. A trailing
/// separator is dropped except for the root itself.
pub fn clean(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }

    let rooted = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|last| *last != "..") {
                    segments.pop();
                } else if !rooted {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Whether the path is left untouched by [`clean`]
///
/// A single trailing slash marks a directory entry and is not considered
/// unclean.
pub fn is_clean(path: &str) -> bool {
    let trimmed = match path.strip_suffix('/') {
        Some(rest) if !rest.is_empty() => rest,
        _ => path,
    };
    clean(trimmed) == trimmed
}

/// Validate a content path declared by `slice` for the given kind
pub fn validate_content_path(slice: &SliceKey, path: &str, kind: PathKind) -> Result<()> {
    if !path.starts_with('/') || !is_clean(path) {
        return Err(SetupError::InvalidContentPath {
            slice: slice.clone(),
            path: path.to_string(),
        });
    }

    let slash_terminated = path.ends_with('/');
    match (kind, slash_terminated) {
        (PathKind::Dir, false) => Err(SetupError::DirectoryWithoutSlash {
            slice: slice.clone(),
            path: path.to_string(),
        }),
        (PathKind::Dir, true) => Ok(()),
        (_, true) => Err(SetupError::SlashWithoutDirectory {
            slice: slice.clone(),
            path: path.to_string(),
        }),
        (_, false) => Ok(()),
    }
}
