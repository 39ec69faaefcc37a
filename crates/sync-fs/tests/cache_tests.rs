use sync_fs::ContentCache;
use sync_fs::checksum::sha256_hex;

fn open_cache() -> (tempfile::TempDir, ContentCache) {
    let dir = tempfile::tempdir().unwrap();
    let cache = ContentCache::open(dir.path()).unwrap();
    (dir, cache)
}

#[test]
fn put_then_get_round_trips() {
    let (_dir, cache) = open_cache();
    let content = b"cached content";
    let hash = sha256_hex(content);

    cache.put(&hash, content).unwrap();
    assert_eq!(cache.get(&hash).unwrap(), Some(content.to_vec()));
}

#[test]
fn get_missing_entry_is_none() {
    let (_dir, cache) = open_cache();
    let hash = sha256_hex(b"never stored");
    assert_eq!(cache.get(&hash).unwrap(), None);
}

#[test]
fn put_rejects_mismatched_key() {
    let (_dir, cache) = open_cache();
    let wrong = sha256_hex(b"other content");

    let err = cache.put(&wrong, b"actual content");
    assert!(err.is_err());
    assert!(!cache.has(&wrong));
}

#[test]
fn put_is_idempotent() {
    let (_dir, cache) = open_cache();
    let content = b"stable";
    let hash = sha256_hex(content);

    cache.put(&hash, content).unwrap();
    cache.put(&hash, content).unwrap();
    assert_eq!(cache.get(&hash).unwrap(), Some(content.to_vec()));
}

#[test]
fn corrupt_entry_is_removed_and_reported_missing() {
    let (dir, cache) = open_cache();
    let content = b"pristine";
    let hash = sha256_hex(content);
    cache.put(&hash, content).unwrap();

    // Corrupt the blob behind the cache's back.
    let object = dir.path().join("objects").join(&hash[..2]).join(&hash);
    std::fs::write(&object, "tampered").unwrap();

    assert_eq!(cache.get(&hash).unwrap(), None);
    assert!(!object.exists());

    // A later put repopulates the healed slot.
    cache.put(&hash, content).unwrap();
    assert_eq!(cache.get(&hash).unwrap(), Some(content.to_vec()));
}

#[test]
fn has_does_not_require_reading() {
    let (_dir, cache) = open_cache();
    let content = b"present";
    let hash = sha256_hex(content);

    assert!(!cache.has(&hash));
    cache.put(&hash, content).unwrap();
    assert!(cache.has(&hash));
}

#[test]
fn size_sums_all_entries() {
    let (_dir, cache) = open_cache();
    let a = b"aaaa";
    let b = b"bbbbbbbb";
    cache.put(&sha256_hex(a), a).unwrap();
    cache.put(&sha256_hex(b), b).unwrap();

    assert_eq!(cache.size().unwrap(), (a.len() + b.len()) as u64);
}

#[test]
fn objects_are_fanned_out_by_digest_prefix() {
    let (dir, cache) = open_cache();
    let content = b"fanout";
    let hash = sha256_hex(content);
    cache.put(&hash, content).unwrap();

    assert!(
        dir.path()
            .join("objects")
            .join(&hash[..2])
            .join(&hash)
            .is_file()
    );
}
