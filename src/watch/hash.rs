// src/watch/hash.rs

//! Content hashing for the `use_hash` trigger filter. Hashes are kept in
//! memory for the lifetime of the process only.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

use crate::engine::BindingId;

/// Compute the hash of a single file.
pub fn compute_file_hash(path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file =
        File::open(path).with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Compute aggregate hash from a list of `(path, file hash)` pairs.
///
/// Entries must be sorted by path. The path is part of the digest so that
/// renaming a file changes the aggregate.
pub fn compute_aggregate_hash(entries: &[(String, String)]) -> String {
    let mut hasher = Hasher::new();
    for (path, hash) in entries {
        hasher.update(path.as_bytes());
        hasher.update(&[0]);
        hasher.update(hash.as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Last triggered aggregate hash per binding.
#[derive(Debug, Default)]
pub struct MemoryHashStore {
    map: HashMap<BindingId, String>,
}

impl MemoryHashStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self, binding: BindingId) -> Option<&str> {
        self.map.get(&binding).map(String::as_str)
    }

    pub fn save(&mut self, binding: BindingId, hash: String) {
        debug!(binding, hash = %hash, "stored binding hash");
        self.map.insert(binding, hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_hash_tracks_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.scss");
        std::fs::write(&path, "a { color: red }").unwrap();
        let first = compute_file_hash(&path).unwrap();
        std::fs::write(&path, "a { color: blue }").unwrap();
        assert_ne!(first, compute_file_hash(&path).unwrap());
    }

    #[test]
    fn aggregate_includes_paths() {
        let a = compute_aggregate_hash(&[("x.js".into(), "h".into())]);
        let b = compute_aggregate_hash(&[("y.js".into(), "h".into())]);
        assert_ne!(a, b);
    }

    #[test]
    fn store_round_trip() {
        let mut store = MemoryHashStore::new();
        assert_eq!(store.load(0), None);
        store.save(0, "abc".into());
        assert_eq!(store.load(0), Some("abc"));
    }
}
