use std::path::PathBuf;

use sync_config::loader::{self, HierarchicalOptions};
use sync_config::{ConfigLevel, Error};

fn write_config(dir: &std::path::Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn missing(dir: &std::path::Path) -> Option<PathBuf> {
    Some(dir.join("does-not-exist.yaml"))
}

const VALID_PROJECT: &str = r#"
version: 1
sources:
  - name: rules
    type: local
    path: ./rules/
targets:
  - source: rules
    destination: .out/
"#;

#[test]
fn load_accepts_a_valid_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "agent-sync.yaml", VALID_PROJECT);

    let cfg = loader::load(&path).unwrap();
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.sources.len(), 1);
    assert_eq!(cfg.sources[0].kind, "local");
    assert_eq!(cfg.targets[0].destination, ".out/");
}

#[test]
fn load_ignores_unknown_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        dir.path(),
        "agent-sync.yaml",
        r#"
version: 1
future_field: whatever
sources:
  - name: rules
    type: local
    path: ./rules/
    future_source_field: 1
targets:
  - source: rules
    destination: .out/
"#,
    );

    assert!(loader::load(&path).is_ok());
}

#[test]
fn load_aggregates_validation_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        dir.path(),
        "agent-sync.yaml",
        r#"
version: 3
sources:
  - name: a
    type: git
  - name: a
    type: teleport
targets:
  - source: a
    tools: [cursor]
    destination: .out/
  - source: ghost
    destination: .out/
overrides:
  - target: rules.md
    strategy: sideways
    file: footer.md
transforms:
  - source: a
    type: custom
"#,
    );

    let Err(Error::Validation { errors }) = loader::load(&path) else {
        panic!("expected validation failure");
    };

    let all = errors.join("\n");
    assert!(all.contains("unsupported version 3"));
    assert!(all.contains("requires 'repo'"));
    assert!(all.contains("requires 'ref'"));
    assert!(all.contains("duplicate source name 'a'"));
    assert!(all.contains("unknown source type 'teleport'"));
    assert!(all.contains("mutually exclusive"));
    assert!(all.contains("references undefined source 'ghost'"));
    assert!(all.contains("invalid strategy 'sideways'"));
    assert!(all.contains("custom transform requires 'command'"));
}

#[test]
fn empty_config_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "agent-sync.yaml", "version: 1\n");

    let Err(Error::Validation { errors }) = loader::load(&path) else {
        panic!("expected validation failure");
    };
    assert!(errors.iter().any(|e| e.contains("at least one source")));
}

#[test]
fn hierarchical_merges_system_and_project_layers() {
    let dir = tempfile::tempdir().unwrap();
    let system = write_config(
        dir.path(),
        "system.yaml",
        r#"
version: 1
variables:
  org: acme
sources:
  - name: org
    type: git
    repo: https://example.com/org/rules.git
    ref: main
"#,
    );
    let project = write_config(
        dir.path(),
        "agent-sync.yaml",
        r#"
version: 1
sources:
  - name: local
    type: local
    path: ./rules/
targets:
  - source: org
    destination: .org/
  - source: local
    destination: .local/
"#,
    );

    let result = loader::load_hierarchical(&HierarchicalOptions {
        project_path: project,
        system_config: Some(system),
        user_config: missing(dir.path()),
        no_inherit: false,
    })
    .unwrap();

    let names: Vec<&str> = result
        .config
        .sources
        .iter()
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(names, vec!["org", "local"]);
    assert_eq!(result.config.variables["org"], "acme");

    let loaded: Vec<ConfigLevel> = result
        .layers
        .iter()
        .filter(|l| l.loaded)
        .map(|l| l.level)
        .collect();
    assert_eq!(loaded, vec![ConfigLevel::System, ConfigLevel::Project]);
}

#[test]
fn project_layer_replaces_same_named_source_entirely() {
    let dir = tempfile::tempdir().unwrap();
    let system = write_config(
        dir.path(),
        "system.yaml",
        r#"
version: 1
sources:
  - name: org
    type: git
    repo: https://example.com/org/rules.git
    ref: main
"#,
    );
    let project = write_config(
        dir.path(),
        "agent-sync.yaml",
        r#"
version: 1
sources:
  - name: org
    type: local
    path: ./org-local/
targets:
  - source: org
    destination: .org/
"#,
    );

    let result = loader::load_hierarchical(&HierarchicalOptions {
        project_path: project,
        system_config: Some(system),
        user_config: missing(dir.path()),
        no_inherit: false,
    })
    .unwrap();

    assert_eq!(result.config.sources.len(), 1);
    let org = &result.config.sources[0];
    assert_eq!(org.kind, "local");
    assert_eq!(org.path, "./org-local/");
    assert!(org.repo.is_empty());
}

#[test]
fn missing_project_config_is_fatal() {
    let dir = tempfile::tempdir().unwrap();

    let err = loader::load_hierarchical(&HierarchicalOptions {
        project_path: dir.path().join("agent-sync.yaml"),
        system_config: missing(dir.path()),
        user_config: missing(dir.path()),
        no_inherit: false,
    })
    .unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}

#[test]
fn missing_system_and_user_layers_are_skipped_silently() {
    let dir = tempfile::tempdir().unwrap();
    let project = write_config(dir.path(), "agent-sync.yaml", VALID_PROJECT);

    let result = loader::load_hierarchical(&HierarchicalOptions {
        project_path: project,
        system_config: missing(dir.path()),
        user_config: missing(dir.path()),
        no_inherit: false,
    })
    .unwrap();
    assert_eq!(result.config.sources.len(), 1);
}

#[test]
fn unparsable_system_layer_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let system = write_config(dir.path(), "system.yaml", "version: [not: valid: yaml\n");
    let project = write_config(dir.path(), "agent-sync.yaml", VALID_PROJECT);

    let err = loader::load_hierarchical(&HierarchicalOptions {
        project_path: project,
        system_config: Some(system),
        user_config: missing(dir.path()),
        no_inherit: false,
    })
    .unwrap_err();
    assert!(matches!(err, Error::Parse { .. }));
}

#[test]
fn version_mismatch_across_layers_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let system = write_config(dir.path(), "system.yaml", "version: 2\n");
    let project = write_config(dir.path(), "agent-sync.yaml", VALID_PROJECT);

    let err = loader::load_hierarchical(&HierarchicalOptions {
        project_path: project,
        system_config: Some(system),
        user_config: missing(dir.path()),
        no_inherit: false,
    })
    .unwrap_err();
    assert!(matches!(err, Error::VersionMismatch { .. }));
}

#[test]
fn no_inherit_loads_only_the_project_layer() {
    let dir = tempfile::tempdir().unwrap();
    let system = write_config(
        dir.path(),
        "system.yaml",
        r#"
version: 1
variables:
  org: from-system
"#,
    );
    let project = write_config(dir.path(), "agent-sync.yaml", VALID_PROJECT);

    let result = loader::load_hierarchical(&HierarchicalOptions {
        project_path: project,
        system_config: Some(system),
        user_config: missing(dir.path()),
        no_inherit: true,
    })
    .unwrap();

    assert!(result.config.variables.is_empty());
    assert_eq!(result.layers.len(), 1);
    assert_eq!(result.layers[0].level, ConfigLevel::Project);
}

#[test]
fn duplicate_layer_paths_load_once() {
    let dir = tempfile::tempdir().unwrap();
    let project = write_config(dir.path(), "agent-sync.yaml", VALID_PROJECT);

    // System layer pointed at the project file must not double-count.
    let result = loader::load_hierarchical(&HierarchicalOptions {
        project_path: project.clone(),
        system_config: Some(project),
        user_config: missing(dir.path()),
        no_inherit: false,
    })
    .unwrap();

    assert_eq!(result.config.sources.len(), 1);
    assert_eq!(result.layers.len(), 1);
}
