//! Slice selection: essential closure, installation order and conflicts

use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use super::error::{Result, SetupError};
use super::graph;
use super::{PathInfo, PathKind, Release, Slice, SliceKey};

/// Slices resolved from a request, in installation order
///
/// Every slice appears after all of its essential dependencies.
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    pub release: &'a Release,
    pub slices: Vec<&'a Slice>,
}

impl<'a> Selection<'a> {
    /// Keys of the selected slices, in installation order
    pub fn keys(&self) -> Vec<SliceKey> {
        self.slices.iter().map(|slice| slice.key()).collect()
    }

    /// Every selected content path with the slice declaring it
    ///
    /// A path shared by several slices is yielded once per slice.
    pub fn contents(&self) -> impl Iterator<Item = (&'a str, &'a Slice, &'a PathInfo)> + '_ {
        self.slices.iter().flat_map(|&slice| {
            slice
                .contents
                .iter()
                .map(move |(path, info)| (path.as_str(), slice, info))
        })
    }
}

/// Resolve `keys` and their essentials into a conflict-free selection
pub fn select<'a>(release: &'a Release, keys: &[SliceKey]) -> Result<Selection<'a>> {
    debug!("Selecting {} requested slices", keys.len());

    let result = resolve(release, keys);
    match &result {
        Ok(selection) => info!(
            "Selected {} slices: {}",
            selection.slices.len(),
            selection
                .slices
                .iter()
                .map(|slice| slice.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ),
        Err(e) => warn!("Selection failed: {}", e),
    }
    result
}

fn resolve<'a>(release: &'a Release, keys: &[SliceKey]) -> Result<Selection<'a>> {
    for key in keys {
        if release.slice(key).is_none() {
            return Err(SetupError::MissingRequestedSlice { key: key.clone() });
        }
    }

    let selected = closure(release, keys)?;
    debug!("Essential closure holds {} slices", selected.len());

    let order = graph::topological_order(&graph::from_slices(selected.values().copied()))?;
    let slices: Vec<&Slice> = order
        .iter()
        .filter_map(|key| selected.get(key).copied())
        .collect();

    check_conflicts(&slices)?;

    Ok(Selection { release, slices })
}

/// Expand the requested keys over essentials
fn closure<'a>(release: &'a Release, keys: &[SliceKey]) -> Result<BTreeMap<SliceKey, &'a Slice>> {
    let mut selected: BTreeMap<SliceKey, &Slice> = BTreeMap::new();
    let mut pending: Vec<&SliceKey> = keys.iter().rev().collect();

    while let Some(key) = pending.pop() {
        if selected.contains_key(key) {
            continue;
        }
        let slice = release
            .slice(key)
            .ok_or_else(|| SetupError::MissingRequestedSlice { key: key.clone() })?;

        for target in slice.essential.iter().rev() {
            if selected.contains_key(target) {
                continue;
            }
            if release.slice(target).is_none() {
                return Err(SetupError::MissingSlice {
                    requester: slice.key(),
                    target: target.clone(),
                });
            }
            pending.push(target);
        }
        selected.insert(key.clone(), slice);
    }

    Ok(selected)
}

/// Compare every pair of slices declaring the same path
fn check_conflicts(slices: &[&Slice]) -> Result<()> {
    let mut claims: BTreeMap<&str, Vec<(&Slice, &PathInfo)>> = BTreeMap::new();

    for &slice in slices {
        for (path, info) in &slice.contents {
            let holders = claims.entry(path.as_str()).or_default();
            for &(other, other_info) in holders.iter() {
                if !same_content(other, other_info, slice, info) {
                    let (first, second) = if other.key() < slice.key() {
                        (other.key(), slice.key())
                    } else {
                        (slice.key(), other.key())
                    };
                    return Err(SetupError::Conflict {
                        first,
                        second,
                        path: path.clone(),
                    });
                }
            }
            holders.push((slice, info));
        }
    }

    Ok(())
}

/// A copy takes its bytes from the declaring package, so copies from two
/// packages never match even when declared alike.
fn same_content(a: &Slice, a_info: &PathInfo, b: &Slice, b_info: &PathInfo) -> bool {
    if a_info.kind == PathKind::Copy && a.package != b.package {
        return false;
    }
    a_info.same_content(b_info)
}
