//! Release setup error types
//!
//! Every message is deterministic for a given input, so callers and tests
//! can match on the rendered text.

use std::path::PathBuf;
use thiserror::Error;

use super::SliceKey;

/// Broad classification of a [`SetupError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The catalog could not be read from disk
    Io,
    /// Unsupported format version or archive configuration
    Format,
    /// A definition is malformed
    Structural,
    /// A slice reference does not resolve
    Reference,
    /// Essential dependencies form a loop
    Cycle,
    /// Two selected slices disagree on a content path
    Conflict,
}

/// Errors produced while loading a release or selecting slices from it
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("cannot read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot walk slice definitions")]
    Walk {
        #[source]
        source: walkdir::Error,
    },

    #[error("{path}: cannot parse definition: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("{path}: expected format \"{expected}\", got \"{got}\"")]
    UnsupportedFormat {
        path: String,
        expected: &'static str,
        got: String,
    },

    #[error("{path}: no archives defined")]
    NoArchives { path: String },

    #[error("{path}: multiple archives not yet supported")]
    MultipleArchives { path: String },

    #[error("{path}: only \"{supported}\" archives are supported for now")]
    UnsupportedArchive {
        path: String,
        supported: &'static str,
    },

    #[error("{path}: invalid slice definition filename")]
    InvalidFilename { path: String },

    #[error("{path}: filename and 'package' field (\"{declared}\") disagree")]
    PackageNameMismatch { path: String, declared: String },

    #[error("package \"{package}\" slices defined more than once: {first} and {second}")]
    DuplicatePackage {
        package: String,
        first: String,
        second: String,
    },

    #[error("{path}: invalid slice name \"{slice}\"")]
    InvalidSliceName { path: String, slice: String },

    #[error("invalid slice reference: \"{token}\"")]
    MalformedSliceKey { token: String },

    #[error("slice {slice} has invalid essential slice reference: \"{token}\"")]
    InvalidEssential { slice: SliceKey, token: String },

    #[error("slice {slice} lists {target} as essential more than once")]
    DuplicateEssential { slice: SliceKey, target: SliceKey },

    #[error("slice {slice} has invalid content path: {path}")]
    InvalidContentPath { slice: SliceKey, path: String },

    #[error("slice {slice} content \"{path}\" must end in / for 'make' to be valid")]
    DirectoryWithoutSlash { slice: SliceKey, path: String },

    #[error("slice {slice} content \"{path}\" ends in / but is not a directory")]
    SlashWithoutDirectory { slice: SliceKey, path: String },

    #[error("slice {slice} mixes {first} and {second} in content path {path}")]
    MixedKinds {
        slice: SliceKey,
        path: String,
        first: &'static str,
        second: &'static str,
    },

    #[error("slice {slice} has invalid mode for {path}")]
    InvalidMode { slice: SliceKey, path: String },

    #[error("{requester} requires {target}, but slice is missing")]
    MissingSlice { requester: SliceKey, target: SliceKey },

    #[error("selection requires {key}, but slice is missing")]
    MissingRequestedSlice { key: SliceKey },

    #[error("essential loop detected: {}", join_keys(.cycle))]
    EssentialLoop { cycle: Vec<SliceKey> },

    #[error("slices {first} and {second} conflict on {path}")]
    Conflict {
        first: SliceKey,
        second: SliceKey,
        path: String,
    },
}

impl SetupError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            SetupError::Read { .. } | SetupError::Walk { .. } => ErrorKind::Io,
            SetupError::UnsupportedFormat { .. }
            | SetupError::NoArchives { .. }
            | SetupError::MultipleArchives { .. }
            | SetupError::UnsupportedArchive { .. } => ErrorKind::Format,
            SetupError::Yaml { .. }
            | SetupError::InvalidFilename { .. }
            | SetupError::PackageNameMismatch { .. }
            | SetupError::DuplicatePackage { .. }
            | SetupError::InvalidSliceName { .. }
            | SetupError::MalformedSliceKey { .. }
            | SetupError::InvalidEssential { .. }
            | SetupError::DuplicateEssential { .. }
            | SetupError::InvalidContentPath { .. }
            | SetupError::DirectoryWithoutSlash { .. }
            | SetupError::SlashWithoutDirectory { .. }
            | SetupError::MixedKinds { .. }
            | SetupError::InvalidMode { .. } => ErrorKind::Structural,
            SetupError::MissingSlice { .. } | SetupError::MissingRequestedSlice { .. } => {
                ErrorKind::Reference
            }
            SetupError::EssentialLoop { .. } => ErrorKind::Cycle,
            SetupError::Conflict { .. } => ErrorKind::Conflict,
        }
    }
}

fn join_keys(keys: &[SliceKey]) -> String {
    keys.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, SetupError>;
