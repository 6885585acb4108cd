//! Definition documents: `chisel.yaml` and per-package slice files

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

use super::error::{Result, SetupError};
use super::paths::validate_content_path;
use super::slice_key::is_slice_name;
use super::{Archive, Package, PathInfo, PathKind, Slice, SliceKey};

/// The only catalog format understood
pub const FORMAT: &str = "chisel-v1";

/// The only archive understood
pub const SUPPORTED_ARCHIVE: &str = "ubuntu";

const MAX_MODE: u32 = 0o7777;

#[derive(Debug, Default, Deserialize)]
struct YamlRelease {
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    archives: BTreeMap<String, YamlArchive>,
}

#[derive(Debug, Default, Deserialize)]
struct YamlArchive {
    #[serde(default)]
    version: String,
    #[serde(default)]
    components: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct YamlPackage {
    #[serde(default, rename = "package")]
    name: Option<String>,
    #[serde(default)]
    slices: BTreeMap<String, Option<YamlSlice>>,
}

#[derive(Debug, Default, Deserialize)]
struct YamlSlice {
    #[serde(default)]
    essential: Vec<String>,
    #[serde(default)]
    contents: BTreeMap<String, Option<YamlPath>>,
}

#[derive(Debug, Default, Deserialize)]
struct YamlPath {
    #[serde(default)]
    copy: Option<String>,
    #[serde(default)]
    symlink: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    make: bool,
    #[serde(default)]
    mode: Option<YamlMode>,
    #[serde(default)]
    mutable: bool,
}

/// YAML 1.2 reads `0755` as a string, so octal literals arrive either way
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum YamlMode {
    Int(u64),
    Text(String),
}

impl YamlMode {
    fn bits(&self) -> Option<u32> {
        let value = match self {
            YamlMode::Int(value) => u32::try_from(*value).ok()?,
            YamlMode::Text(text) => {
                let text = text.trim();
                let digits = text
                    .strip_prefix("0o")
                    .or_else(|| text.strip_prefix('0').filter(|rest| !rest.is_empty()))?;
                u32::from_str_radix(digits, 8).ok()?
            }
        };
        (value <= MAX_MODE).then_some(value)
    }
}

/// Result of decoding the root document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootDocument {
    pub default_archive: String,
    pub archives: BTreeMap<String, Archive>,
}

fn decode<T: DeserializeOwned + Default>(path: &str, data: &str) -> Result<T> {
    if data.trim().is_empty() {
        return Ok(T::default());
    }
    serde_yaml_ng::from_str(data).map_err(|source| SetupError::Yaml {
        path: path.to_string(),
        source,
    })
}

/// Decode and validate the root document
///
/// `path` labels errors and is normally the document's name relative to
/// the release directory.
pub fn parse_release(path: &str, data: &str) -> Result<RootDocument> {
    let yaml: YamlRelease = decode(path, data)?;

    let format = yaml.format.unwrap_or_default();
    if format != FORMAT {
        return Err(SetupError::UnsupportedFormat {
            path: path.to_string(),
            expected: FORMAT,
            got: format,
        });
    }

    if yaml.archives.is_empty() {
        return Err(SetupError::NoArchives {
            path: path.to_string(),
        });
    }
    if yaml.archives.len() > 1 {
        return Err(SetupError::MultipleArchives {
            path: path.to_string(),
        });
    }

    let mut archives = BTreeMap::new();
    let mut default_archive = String::new();
    for (name, archive) in yaml.archives {
        if name != SUPPORTED_ARCHIVE {
            return Err(SetupError::UnsupportedArchive {
                path: path.to_string(),
                supported: SUPPORTED_ARCHIVE,
            });
        }
        default_archive = name.clone();
        archives.insert(
            name.clone(),
            Archive {
                name,
                version: archive.version,
                components: archive.components,
            },
        );
    }

    Ok(RootDocument {
        default_archive,
        archives,
    })
}

/// Decode one package definition
///
/// `package` is the name derived from the definition's file name, and
/// `path` is the file's location relative to the release directory.
pub fn parse_package(path: &str, package: &str, archive: &str, data: &str) -> Result<Package> {
    let yaml: YamlPackage = decode(path, data)?;

    if let Some(declared) = yaml.name {
        if declared != package {
            return Err(SetupError::PackageNameMismatch {
                path: path.to_string(),
                declared,
            });
        }
    }

    let mut slices = BTreeMap::new();
    for (name, slice) in yaml.slices {
        if !is_slice_name(&name) {
            return Err(SetupError::InvalidSliceName {
                path: path.to_string(),
                slice: name,
            });
        }
        let key = SliceKey::new(package, &name);
        let slice = parse_slice(&key, slice.unwrap_or_default())?;
        slices.insert(name, slice);
    }

    trace!("Parsed {} slices from {}", slices.len(), path);

    Ok(Package {
        archive: archive.to_string(),
        name: package.to_string(),
        path: path.to_string(),
        slices,
    })
}

fn parse_slice(key: &SliceKey, yaml: YamlSlice) -> Result<Slice> {
    let mut essential = Vec::with_capacity(yaml.essential.len());
    let mut seen = BTreeSet::new();
    for token in yaml.essential {
        let target: SliceKey = token.parse().map_err(|_| SetupError::InvalidEssential {
            slice: key.clone(),
            token: token.clone(),
        })?;
        if !seen.insert(target.clone()) {
            return Err(SetupError::DuplicateEssential {
                slice: key.clone(),
                target,
            });
        }
        essential.push(target);
    }

    let mut contents = BTreeMap::new();
    for (path, entry) in yaml.contents {
        let info = parse_path(key, &path, entry.unwrap_or_default())?;
        contents.insert(path, info);
    }

    Ok(Slice {
        package: key.package.clone(),
        name: key.slice.clone(),
        essential,
        contents,
    })
}

fn parse_path(key: &SliceKey, path: &str, yaml: YamlPath) -> Result<PathInfo> {
    let mut declared: Vec<(PathKind, String)> = Vec::new();
    if let Some(source) = yaml.copy {
        // Copying a path onto itself is the plain form.
        let source = if source == path { String::new() } else { source };
        declared.push((PathKind::Copy, source));
    }
    if let Some(target) = yaml.symlink {
        declared.push((PathKind::Symlink, target));
    }
    if let Some(text) = yaml.text {
        declared.push((PathKind::Text, text));
    }
    if yaml.make {
        declared.push((PathKind::Dir, String::new()));
    }

    if let [(first, _), (second, _), ..] = declared.as_slice() {
        return Err(SetupError::MixedKinds {
            slice: key.clone(),
            path: path.to_string(),
            first: first.as_str(),
            second: second.as_str(),
        });
    }
    let (kind, info) = declared.pop().unwrap_or_default();

    validate_content_path(key, path, kind)?;

    let mode = match yaml.mode {
        Some(mode) => mode.bits().ok_or_else(|| SetupError::InvalidMode {
            slice: key.clone(),
            path: path.to_string(),
        })?,
        None => 0,
    };

    Ok(PathInfo {
        kind,
        info,
        mode,
        mutable: yaml.mutable,
    })
}
