//! Release loading and whole-release validation

use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::config::ReleaseConfig;
use super::error::{Result, SetupError};
use super::graph;
use super::slice_key::is_package_name;
use super::yaml::{parse_package, parse_release};
use super::{Package, Release};

const DEFINITION_EXTENSION: &str = "yaml";

/// A package definition file found under the slices directory
#[derive(Debug, Clone)]
struct DefinitionFile {
    path: PathBuf,
    /// Location relative to the release directory, slash-separated
    label: String,
    package: String,
}

/// Read the release in `dir` with the default configuration
pub fn read_release(dir: impl AsRef<Path>) -> Result<Release> {
    read_release_with_config(dir, &ReleaseConfig::default())
}

/// Read and validate the release in `dir`
pub fn read_release_with_config(dir: impl AsRef<Path>, config: &ReleaseConfig) -> Result<Release> {
    let dir = dir.as_ref();
    info!("Reading release from {:?}", dir);

    let result = load(dir, config);
    match &result {
        Ok(release) => info!(
            "Release loaded: {} packages, {} slices",
            release.packages.len(),
            release.slices().count()
        ),
        Err(e) => warn!("Failed to read release from {:?}: {}", dir, e),
    }
    result
}

fn load(dir: &Path, config: &ReleaseConfig) -> Result<Release> {
    let root_path = dir.join(&config.release_file);
    let data = read_file(&root_path)?;
    let root = parse_release(&config.release_file, &data)?;
    debug!(
        "Root document declares archive {:?}",
        root.default_archive
    );

    let files = find_definitions(dir, &config.slices_dir)?;
    check_unique_packages(&files)?;
    debug!("Found {} package definitions", files.len());

    let parse = |file: &DefinitionFile| -> Result<Package> {
        let data = read_file(&file.path)?;
        let package = parse_package(&file.label, &file.package, &root.default_archive, &data)?;
        debug!("Parsed package {} from {}", package.name, file.label);
        Ok(package)
    };

    // Results keep file order either way, so the first error reported is
    // the same whether or not parsing ran in parallel.
    let parsed: Vec<Result<Package>> = if config.parallel {
        files.par_iter().map(parse).collect()
    } else {
        files.iter().map(parse).collect()
    };

    let mut packages = BTreeMap::new();
    for package in parsed {
        let package = package?;
        packages.insert(package.name.clone(), package);
    }

    let release = Release {
        path: dir.to_path_buf(),
        default_archive: root.default_archive,
        archives: root.archives,
        packages,
    };

    validate(&release)?;
    Ok(release)
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| SetupError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Collect package definitions under `dir/slices_dir`, sorted by location
fn find_definitions(dir: &Path, slices_dir: &str) -> Result<Vec<DefinitionFile>> {
    let root = dir.join(slices_dir);
    if !root.is_dir() {
        debug!("No slice definitions directory at {:?}", root);
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(&root).sort_by_file_name() {
        let entry = entry.map_err(|source| SetupError::Walk { source })?;
        let path = entry.path();
        if !entry.file_type().is_file()
            || path.extension().and_then(|ext| ext.to_str()) != Some(DEFINITION_EXTENSION)
        {
            continue;
        }

        let label = relative_label(dir, path);
        let package = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| is_package_name(stem))
            .ok_or_else(|| SetupError::InvalidFilename {
                path: label.clone(),
            })?
            .to_string();

        files.push(DefinitionFile {
            path: path.to_path_buf(),
            label,
            package,
        });
    }

    files.sort_by(|a, b| a.label.cmp(&b.label));
    Ok(files)
}

fn relative_label(dir: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(dir).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn check_unique_packages(files: &[DefinitionFile]) -> Result<()> {
    let mut seen: BTreeMap<&str, &str> = BTreeMap::new();
    for file in files {
        if let Some(first) = seen.insert(&file.package, &file.label) {
            return Err(SetupError::DuplicatePackage {
                package: file.package.clone(),
                first: first.to_string(),
                second: file.label.clone(),
            });
        }
    }
    Ok(())
}

/// Whole-release checks that need every package in place
fn validate(release: &Release) -> Result<()> {
    for slice in release.slices() {
        for target in &slice.essential {
            if release.slice(target).is_none() {
                return Err(SetupError::MissingSlice {
                    requester: slice.key(),
                    target: target.clone(),
                });
            }
        }
    }
    debug!("Essential references resolved");

    if let Some(cycle) = graph::find_cycle(&graph::from_slices(release.slices())) {
        return Err(SetupError::EssentialLoop { cycle });
    }
    debug!("No essential loops");

    Ok(())
}
