//! # Snapshot Cache
//!
//! Each repository gets its own directory under the cache base:
//!
//! ```text
//! <base>/<site>/<owner>/<name>/
//! ├── map.json          ref name -> commit hash
//! ├── <hash>.tar.gz     archive-mode snapshots
//! ├── <hash>/           git-mode snapshots
//! └── tmp-<depth>/      stash areas used while directives run
//! ```
//!
//! `map.json` is the degraded-mode source of truth when the remote cannot be
//! reached. Every hash it contains has a snapshot on disk; when a ref moves
//! and nothing else points at its old hash, that snapshot is deleted.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::spec::RepoDescriptor;

/// Ref name to commit hash, as persisted in `map.json`.
pub type CacheMap = BTreeMap<String, String>;

const MAP_FILE: &str = "map.json";
const STASH_DIR: &str = "tmp";

/// Location of one repository's cache entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCacheDir {
    path: PathBuf,
}

impl RepoCacheDir {
    pub fn new(base: &Path, repo: &RepoDescriptor) -> Self {
        Self {
            path: base
                .join(repo.site.as_str())
                .join(&repo.owner)
                .join(&repo.name),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn map_path(&self) -> PathBuf {
        self.path.join(MAP_FILE)
    }

    pub fn archive_path(&self, hash: &str) -> PathBuf {
        self.path.join(format!("{}.tar.gz", hash))
    }

    pub fn snapshot_dir(&self, hash: &str) -> PathBuf {
        self.path.join(hash)
    }

    /// Stash area for directives running at nesting `depth`. Nested clones
    /// of the same repository each get their own.
    pub fn stash_dir(&self, depth: usize) -> PathBuf {
        self.path.join(format!("{}-{}", STASH_DIR, depth))
    }
}

/// Read the ref map for a repository.
///
/// A missing `map.json` is an empty map, not an error.
pub fn get(dir: &RepoCacheDir) -> Result<CacheMap> {
    let map_path = dir.map_path();
    let content = match fs::read_to_string(&map_path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(CacheMap::new()),
        Err(e) => return Err(e.into()),
    };

    serde_json::from_str(&content).map_err(|e| Error::Cache {
        message: format!("Failed to parse '{}': {}", map_path.display(), e),
    })
}

/// Bind `repo.ref` to `hash` and persist the map.
///
/// If the ref previously pointed at a hash no other ref uses, that hash's
/// snapshot is deleted. Deletion is best-effort. Must only be called once the
/// snapshot for `hash` is on disk.
pub fn update(
    dir: &RepoCacheDir,
    repo: &RepoDescriptor,
    hash: &str,
    cached: &mut CacheMap,
) -> Result<()> {
    if cached.get(&repo.r#ref).map(String::as_str) == Some(hash) {
        return Ok(());
    }

    if let Some(old_hash) = cached.get(&repo.r#ref).cloned() {
        let still_used = cached
            .iter()
            .any(|(name, value)| name != &repo.r#ref && value == &old_hash);
        if !still_used {
            evict(dir, &old_hash);
        }
    }

    cached.insert(repo.r#ref.clone(), hash.to_string());

    fs::create_dir_all(dir.path())?;
    let json = serde_json::to_string_pretty(cached)?;
    fs::write(dir.map_path(), json).map_err(|e| Error::Cache {
        message: format!("Failed to write '{}': {}", dir.map_path().display(), e),
    })?;

    Ok(())
}

/// Remove the snapshot for `hash` in whichever form it exists.
fn evict(dir: &RepoCacheDir, hash: &str) {
    let archive = dir.archive_path(hash);
    if let Err(e) = fs::remove_file(&archive) {
        if e.kind() != io::ErrorKind::NotFound {
            log::debug!("Could not remove stale archive {}: {}", archive.display(), e);
        }
    }

    let snapshot = dir.snapshot_dir(hash);
    if let Err(e) = fs::remove_dir_all(&snapshot) {
        if e.kind() != io::ErrorKind::NotFound {
            log::debug!(
                "Could not remove stale snapshot {}: {}",
                snapshot.display(),
                e
            );
        }
    }
}
