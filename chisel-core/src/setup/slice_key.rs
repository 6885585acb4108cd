//! Slice identifiers in `pkg.slice` form

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

use super::error::SetupError;

const PACKAGE_NAME: &str = r"[a-z0-9](?:-?[.a-z0-9+]){2,}";
const SLICE_NAME: &str = r"[a-z](?:-?[a-z0-9]){2,}";

static PACKAGE_NAME_EXP: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^{PACKAGE_NAME}$")).expect("valid package name pattern"));

static SLICE_NAME_EXP: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^{SLICE_NAME}$")).expect("valid slice name pattern"));

// Package names may contain dots; the slice name never does, so the last
// dot splits the pair.
static SLICE_KEY_EXP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^({PACKAGE_NAME})\.({SLICE_NAME})$")).expect("valid slice key pattern")
});

/// Identifies one slice of one package
///
/// Keys order by package name first and slice name second, which is the
/// traversal order used everywhere iteration order is observable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SliceKey {
    pub package: String,
    pub slice: String,
}

impl SliceKey {
    pub fn new(package: impl Into<String>, slice: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            slice: slice.into(),
        }
    }
}

impl fmt::Display for SliceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.package, self.slice)
    }
}

impl FromStr for SliceKey {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = SLICE_KEY_EXP
            .captures(s)
            .ok_or_else(|| SetupError::MalformedSliceKey {
                token: s.to_string(),
            })?;
        Ok(SliceKey::new(&caps[1], &caps[2]))
    }
}

/// Whether `name` is acceptable as a package name
pub fn is_package_name(name: &str) -> bool {
    PACKAGE_NAME_EXP.is_match(name)
}

/// Whether `name` is acceptable as a slice name
pub fn is_slice_name(name: &str) -> bool {
    SLICE_NAME_EXP.is_match(name)
}
