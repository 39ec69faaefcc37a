//! Tool name to destination mapping.

use std::collections::BTreeMap;

use crate::model::{Target, ToolDefinition};
use crate::{Error, Result};

/// Built-in tool destinations, relative to the project root.
const BUILTIN_TOOLS: &[(&str, &str)] = &[
    ("claude-code", ".claude/"),
    ("cline", ".cline/rules/"),
    ("codex", ".codex/"),
    ("copilot", ".github/copilot/"),
    ("cursor", ".cursor/rules/"),
    ("windsurf", ".windsurf/rules/"),
];

/// Resolves symbolic tool names to destination paths. User definitions
/// overlay the built-in set by name.
#[derive(Debug, Clone)]
pub struct ToolMap {
    definitions: BTreeMap<String, String>,
}

/// A source mapped to one concrete destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub source: String,
    pub destination: String,
    /// Empty for explicit-destination targets.
    pub tool_name: String,
}

impl ToolMap {
    pub fn new(custom: &[ToolDefinition]) -> Self {
        let mut definitions: BTreeMap<String, String> = BUILTIN_TOOLS
            .iter()
            .map(|(name, dest)| (name.to_string(), dest.to_string()))
            .collect();
        for def in custom {
            definitions.insert(def.name.clone(), def.destination.clone());
        }
        Self { definitions }
    }

    /// Destination path for a tool name.
    pub fn resolve(&self, tool: &str) -> Result<&str> {
        self.definitions
            .get(tool)
            .map(String::as_str)
            .ok_or_else(|| Error::UnknownTool {
                name: tool.to_string(),
            })
    }

    /// Expand a target entry into one `ResolvedTarget` per tool, or a single
    /// one for an explicit destination.
    pub fn resolve_target(&self, target: &Target) -> Result<Vec<ResolvedTarget>> {
        if !target.tools.is_empty() && !target.destination.is_empty() {
            return Err(Error::TargetConflict {
                source_path: target.source.clone(),
            });
        }

        if !target.destination.is_empty() {
            return Ok(vec![ResolvedTarget {
                source: target.source.clone(),
                destination: target.destination.clone(),
                tool_name: String::new(),
            }]);
        }

        if target.tools.is_empty() {
            return Err(Error::TargetEmpty {
                source_path: target.source.clone(),
            });
        }

        let mut resolved = Vec::with_capacity(target.tools.len());
        for tool in &target.tools {
            resolved.push(ResolvedTarget {
                source: target.source.clone(),
                destination: self.resolve(tool)?.to_string(),
                tool_name: tool.clone(),
            });
        }
        Ok(resolved)
    }

    /// All known tool names, sorted.
    pub fn known_tools(&self) -> Vec<&str> {
        self.definitions.keys().map(String::as_str).collect()
    }

    /// Whether a name comes from user definitions rather than the built-in
    /// set.
    pub fn is_custom(&self, tool: &str) -> bool {
        self.definitions.contains_key(tool) && !BUILTIN_TOOLS.iter().any(|(name, _)| *name == tool)
    }
}

impl Default for ToolMap {
    fn default() -> Self {
        Self::new(&[])
    }
}
