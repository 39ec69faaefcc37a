use std::collections::BTreeMap;

use pretty_assertions::assert_eq;
use sync_config::lockfile::{self, FileHash, LockedSource, Lockfile, ResolvedState, STATUS_OK};

fn sample() -> Lockfile {
    let mut files = BTreeMap::new();
    files.insert(
        "security.md".to_string(),
        FileHash {
            sha256: "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9".to_string(),
        },
    );
    files.insert(
        "style.md".to_string(),
        FileHash {
            sha256: "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824".to_string(),
        },
    );

    Lockfile {
        version: 1,
        sources: vec![
            LockedSource {
                name: "rules".to_string(),
                kind: "local".to_string(),
                resolved: ResolvedState {
                    files,
                    path: "./rules/".to_string(),
                    ..Default::default()
                },
                status: STATUS_OK.to_string(),
                ..Default::default()
            },
            LockedSource {
                name: "org".to_string(),
                kind: "git".to_string(),
                repo: "https://example.com/org/rules.git".to_string(),
                resolved: ResolvedState {
                    commit: "0123456789abcdef0123456789abcdef01234567".to_string(),
                    tree: "fedcba9876543210fedcba9876543210fedcba98".to_string(),
                    ..Default::default()
                },
                status: STATUS_OK.to_string(),
            },
        ],
    }
}

#[test]
fn save_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agent-sync.lock");
    let lockfile = sample();

    lockfile::save(&path, &lockfile).unwrap();
    let loaded = lockfile::load(&path).unwrap();
    assert_eq!(loaded, lockfile);
}

#[test]
fn repeated_saves_produce_identical_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path_a = dir.path().join("a.lock");
    let path_b = dir.path().join("b.lock");
    let lockfile = sample();

    lockfile::save(&path_a, &lockfile).unwrap();
    lockfile::save(&path_b, &lockfile).unwrap();
    assert_eq!(
        std::fs::read(&path_a).unwrap(),
        std::fs::read(&path_b).unwrap()
    );

    // A load-save cycle must also be byte-stable.
    let reloaded = lockfile::load(&path_a).unwrap();
    let path_c = dir.path().join("c.lock");
    lockfile::save(&path_c, &reloaded).unwrap();
    assert_eq!(
        std::fs::read(&path_a).unwrap(),
        std::fs::read(&path_c).unwrap()
    );
}

#[test]
fn source_order_is_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agent-sync.lock");

    lockfile::save(&path, &sample()).unwrap();
    let loaded = lockfile::load(&path).unwrap();

    let names: Vec<&str> = loaded.sources.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["rules", "org"]);
}

#[test]
fn load_rejects_invalid_lockfile() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agent-sync.lock");
    std::fs::write(
        &path,
        "version: 1\nsources:\n  - name: broken\n    type: local\n",
    )
    .unwrap();

    let err = lockfile::load(&path).unwrap_err();
    assert!(err.to_string().contains("'status' is required"));
}

#[test]
fn load_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(lockfile::load(&dir.path().join("agent-sync.lock")).is_err());
}

#[test]
fn default_lockfile_is_empty_version_one() {
    let lockfile = Lockfile::default();
    assert_eq!(lockfile.version, 1);
    assert!(lockfile.sources.is_empty());
}
