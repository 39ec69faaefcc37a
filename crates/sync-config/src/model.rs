//! Configuration schema for agent-sync.yaml
//!
//! Fields are kept flat and defaulted so a partially filled layer still
//! parses; presence rules are enforced by validation, which aggregates every
//! violation instead of stopping at the first. Unknown fields are ignored
//! for forward compatibility.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The merged agent-sync.yaml document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub version: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, String>,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub targets: Vec<Target>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<Override>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transforms: Vec<Transform>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_definitions: Vec<ToolDefinition>,
}

/// An external source of agent files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    #[serde(default)]
    pub name: String,
    /// One of "git", "url", "local".
    #[serde(rename = "type", default)]
    pub kind: String,

    // git fields
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub repo: String,
    #[serde(rename = "ref", default, skip_serializing_if = "String::is_empty")]
    pub git_ref: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,

    // url fields
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub checksum: String,

    // local fields
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
}

/// Where a source's files are written: a list of tool names or one explicit
/// destination, never both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub destination: String,
}

/// A post-materialization modification of a destination file, matched by
/// its basename.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Override {
    #[serde(default)]
    pub target: String,
    /// One of "append", "prepend", "replace".
    #[serde(default)]
    pub strategy: String,
    #[serde(default)]
    pub file: String,
}

/// A transformation applied to a source's files before targeting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transform {
    #[serde(default)]
    pub source: String,
    /// One of "template", "custom".
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vars: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub command: String,
}

/// A custom tool path mapping; overrides a built-in on name collision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub destination: String,
}
