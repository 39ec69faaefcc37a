//! Hierarchical merge of configuration layers.
//!
//! Merge semantics per field:
//! - version: all declaring layers must agree; mismatch is fatal
//! - variables: keywise union, higher precedence wins per key
//! - sources, tool_definitions: name-keyed union; a higher-precedence entry
//!   with the same name replaces the lower one entirely
//! - targets, overrides, transforms: concatenate, lowest precedence first

use std::collections::BTreeSet;

use crate::model::{Config, Source, ToolDefinition};
use crate::{Error, Result};

/// Combine two configs; `overlay` takes precedence over `base`.
pub fn merge(base: Config, overlay: Config) -> Result<Config> {
    let version = merge_version(base.version, overlay.version)?;

    let mut variables = base.variables;
    variables.extend(overlay.variables);

    let mut targets = base.targets;
    targets.extend(overlay.targets);
    let mut overrides = base.overrides;
    overrides.extend(overlay.overrides);
    let mut transforms = base.transforms;
    transforms.extend(overlay.transforms);

    Ok(Config {
        version,
        variables,
        sources: merge_named(base.sources, overlay.sources, |s: &Source| s.name.clone()),
        tool_definitions: merge_named(
            base.tool_definitions,
            overlay.tool_definitions,
            |t: &ToolDefinition| t.name.clone(),
        ),
        targets,
        overrides,
        transforms,
    })
}

/// Left-fold merge of layers, lowest precedence first.
pub fn merge_all(configs: Vec<Config>) -> Result<Config> {
    let mut iter = configs.into_iter();
    let Some(first) = iter.next() else {
        return Err(Error::NoLayers);
    };
    iter.try_fold(first, merge)
}

fn merge_version(base: u32, overlay: u32) -> Result<u32> {
    match (base, overlay) {
        // A zero version means the layer did not declare one; validation of
        // the merged result catches the all-zero case.
        (0, v) | (v, 0) => Ok(v),
        (b, o) if b == o => Ok(b),
        (base, overlay) => Err(Error::VersionMismatch { base, overlay }),
    }
}

fn merge_named<T>(base: Vec<T>, overlay: Vec<T>, key: impl Fn(&T) -> String) -> Vec<T> {
    if base.is_empty() {
        return overlay;
    }
    if overlay.is_empty() {
        return base;
    }

    let replaced: BTreeSet<String> = overlay.iter().map(&key).collect();
    let mut result: Vec<T> = base
        .into_iter()
        .filter(|entry| !replaced.contains(&key(entry)))
        .collect();
    result.extend(overlay);
    result
}
