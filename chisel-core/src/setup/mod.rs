//! Release setup: the catalog model and slice selection
//!
//! A release is a directory holding a `chisel.yaml` root document and a
//! `slices/` tree with one YAML definition per package. Loading it yields
//! an immutable [`Release`]; [`select`] resolves requested slices against
//! it into an ordered, conflict-free [`Selection`].
//!
//! ```text
//! release/
//!     ├── chisel.yaml            ← format and archive
//!     └── slices/**/<pkg>.yaml   ← slices of one package
//!            │
//!            ▼
//!     read_release() → Release
//!            │
//!            ▼
//!     select(&release, keys) → Selection
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

mod config;
mod error;
mod graph;
pub mod paths;
mod release;
mod select;
mod slice_key;
mod yaml;

pub use config::{ReleaseConfig, PARALLEL_LOAD_ENV};
pub use error::{ErrorKind, Result, SetupError};
pub use release::{read_release, read_release_with_config};
pub use select::{select, Selection};
pub use slice_key::{is_package_name, is_slice_name, SliceKey};

/// A package source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    pub name: String,
    pub version: String,
    pub components: Vec<String>,
}

/// The whole catalog, as loaded from a release directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    /// Directory the release was read from
    pub path: PathBuf,
    pub default_archive: String,
    pub archives: BTreeMap<String, Archive>,
    pub packages: BTreeMap<String, Package>,
}

impl Release {
    pub fn package(&self, name: &str) -> Option<&Package> {
        self.packages.get(name)
    }

    /// Look up a slice by key
    pub fn slice(&self, key: &SliceKey) -> Option<&Slice> {
        self.packages.get(&key.package)?.slices.get(&key.slice)
    }

    /// Every slice in the release, in key order
    pub fn slices(&self) -> impl Iterator<Item = &Slice> {
        self.packages.values().flat_map(|pkg| pkg.slices.values())
    }
}

/// The slices defined for one package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub archive: String,
    pub name: String,
    /// Definition file, relative to the release directory
    pub path: String,
    pub slices: BTreeMap<String, Slice>,
}

/// A named, installable subset of a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slice {
    pub package: String,
    pub name: String,
    pub essential: Vec<SliceKey>,
    pub contents: BTreeMap<String, PathInfo>,
}

impl Slice {
    pub fn key(&self) -> SliceKey {
        SliceKey::new(&self.package, &self.name)
    }
}

impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.package, self.name)
    }
}

/// How a content path is materialized
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum PathKind {
    #[default]
    Copy,
    Symlink,
    Text,
    Dir,
}

impl PathKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PathKind::Copy => "copy",
            PathKind::Symlink => "symlink",
            PathKind::Text => "text",
            PathKind::Dir => "dir",
        }
    }
}

impl fmt::Display for PathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Materialization details for one content path
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathInfo {
    pub kind: PathKind,
    /// Copy source, symlink target or literal text, depending on `kind`.
    /// Empty for a copy of the same path.
    pub info: String,
    /// Permission bits, zero for the kind default
    pub mode: u32,
    pub mutable: bool,
}

impl PathInfo {
    /// Whether both declarations produce the same content
    ///
    /// Compares the four declared fields only. Where the bytes come from
    /// (the owning package of a copy) is the selector's concern.
    pub fn same_content(&self, other: &PathInfo) -> bool {
        self.kind == other.kind
            && self.info == other.info
            && self.mode == other.mode
            && self.mutable == other.mutable
    }
}
