//! Template variable substitution.
//!
//! Supports `{{ .name }}` actions with dotted variable names looked up in a
//! flat variable map. A referenced variable missing from the map is an
//! error, never an empty string, so a typo cannot silently produce wrong
//! output. The same content against the same variable map yields identical
//! bytes on every run.

use std::collections::BTreeMap;

use crate::{Error, Result};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Apply variable substitution to one file's content.
///
/// Content containing a NUL byte or invalid UTF-8 is treated as binary and
/// returned unchanged.
pub fn apply(file: &str, content: &[u8], vars: &BTreeMap<String, String>) -> Result<Vec<u8>> {
    if content.contains(&0) {
        return Ok(content.to_vec());
    }
    let Ok(text) = std::str::from_utf8(content) else {
        return Ok(content.to_vec());
    };

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let after = &rest[start + OPEN.len()..];
        let Some(end) = after.find(CLOSE) else {
            return Err(Error::TemplateParse {
                file: file.to_string(),
                message: "unclosed '{{' action".to_string(),
            });
        };

        let name = parse_variable(file, after[..end].trim())?;
        match vars.get(name) {
            Some(value) => out.push_str(value),
            None => {
                return Err(Error::MissingVariable {
                    file: file.to_string(),
                    name: name.to_string(),
                });
            }
        }
        rest = &after[end + CLOSE.len()..];
    }
    out.push_str(rest);
    Ok(out.into_bytes())
}

fn parse_variable<'a>(file: &str, action: &'a str) -> Result<&'a str> {
    let Some(name) = action.strip_prefix('.') else {
        return Err(Error::TemplateParse {
            file: file.to_string(),
            message: format!(
                "unsupported action '{{{{ {action} }}}}'; only '.variable' references are supported"
            ),
        });
    };
    if name.is_empty() || !name.split('.').all(is_identifier) {
        return Err(Error::TemplateParse {
            file: file.to_string(),
            message: format!("invalid variable reference '.{name}'"),
        });
    }
    Ok(name)
}

fn is_identifier(part: &str) -> bool {
    !part.is_empty()
        && part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Merge global variables with per-transform values; the transform wins.
pub fn merge_vars(
    global: &BTreeMap<String, String>,
    per_transform: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut merged = global.clone();
    merged.extend(
        per_transform
            .iter()
            .map(|(k, v)| (k.clone(), v.clone())),
    );
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn substitutes_variables() {
        let out = apply(
            "greet.md",
            b"Hello {{ .name }}! Org is {{ .org }}.",
            &vars(&[("name", "World"), ("org", "acme")]),
        )
        .unwrap();
        assert_eq!(out, b"Hello World! Org is acme.");
    }

    #[test]
    fn dotted_names_resolve_as_flat_keys() {
        let out = apply(
            "f.md",
            b"{{ .team.lead }}",
            &vars(&[("team.lead", "morgan")]),
        )
        .unwrap();
        assert_eq!(out, b"morgan");
    }

    #[test]
    fn missing_variable_is_an_error_not_empty() {
        let err = apply("f.md", b"{{ .ghost }}", &vars(&[])).unwrap_err();
        match err {
            Error::MissingVariable { file, name } => {
                assert_eq!(file, "f.md");
                assert_eq!(name, "ghost");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn content_without_actions_passes_through() {
        let out = apply("f.md", b"plain text", &vars(&[])).unwrap();
        assert_eq!(out, b"plain text");
    }

    #[test]
    fn null_byte_marks_binary_passthrough() {
        let content = b"PK\x00\x03{{ .name }}";
        let out = apply("f.bin", content, &vars(&[])).unwrap();
        assert_eq!(out, content);
    }

    #[test]
    fn invalid_utf8_marks_binary_passthrough() {
        let content = &[0xff, 0xfe, b'{', b'{'];
        let out = apply("f.bin", content, &vars(&[])).unwrap();
        assert_eq!(out.as_slice(), content);
    }

    #[test]
    fn unclosed_action_is_a_parse_error() {
        let err = apply("f.md", b"Hello {{ .name", &vars(&[("name", "x")])).unwrap_err();
        assert!(matches!(err, Error::TemplateParse { .. }));
        assert!(err.to_string().contains("f.md"));
    }

    #[test]
    fn non_variable_action_is_a_parse_error() {
        let err = apply("f.md", b"{{ if .x }}", &vars(&[])).unwrap_err();
        assert!(matches!(err, Error::TemplateParse { .. }));
    }

    #[test]
    fn repeated_application_is_deterministic() {
        let content = b"{{ .a }} and {{ .b }}";
        let v = vars(&[("a", "1"), ("b", "2")]);
        let first = apply("f.md", content, &v).unwrap();
        let second = apply("f.md", content, &v).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn transform_vars_override_globals() {
        let merged = merge_vars(
            &vars(&[("org", "global"), ("keep", "kept")]),
            &vars(&[("org", "local")]),
        );
        assert_eq!(merged["org"], "local");
        assert_eq!(merged["keep"], "kept");
    }
}
