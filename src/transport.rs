//! # Transport Primitives
//!
//! Everything that touches the network goes through the [`Transport`] trait:
//! listing remote refs, downloading a tarball, and cloning at a commit.
//! Extraction is part of the trait too so that an implementation can serve
//! snapshots from somewhere other than a `.tar.gz` on disk.
//!
//! [`DefaultTransport`] shells out to `git` (see [`crate::git`]) and uses an
//! HTTPS client for tarballs (see [`crate::archive`]). Tests substitute a
//! scripted implementation so the whole clone flow runs offline.

use std::path::Path;
use std::time::Duration;

use crate::error::Result;

/// External primitives a clone depends on - allows mocking in tests
pub trait Transport: Send + Sync {
    /// Raw `git ls-remote` output for `url`: one `<hash>\t<ref>` per line.
    fn list_refs(&self, url: &str) -> Result<String>;

    /// Fetch `url` into the file `dest`.
    fn download(&self, url: &str, dest: &Path) -> Result<()>;

    /// Unpack `archive` into `dest`, stripping its root directory and, when
    /// given, the `subdir` prefix. Returns the number of entries written.
    fn extract(&self, archive: &Path, dest: &Path, subdir: Option<&str>) -> Result<usize>;

    /// Populate `target` with the tree at `hash`, without `.git`.
    fn clone_at_commit(&self, https_url: &str, ssh_url: &str, hash: &str, target: &Path)
        -> Result<()>;
}

/// The default implementation, backed by the system `git` and an HTTPS client.
#[derive(Debug, Clone, Default)]
pub struct DefaultTransport {
    timeout: Option<Duration>,
}

impl DefaultTransport {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl Transport for DefaultTransport {
    fn list_refs(&self, url: &str) -> Result<String> {
        crate::git::ls_remote(url, self.timeout)
    }

    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        crate::archive::download(url, dest, self.timeout)
    }

    fn extract(&self, archive: &Path, dest: &Path, subdir: Option<&str>) -> Result<usize> {
        crate::archive::extract(archive, dest, subdir)
    }

    fn clone_at_commit(
        &self,
        https_url: &str,
        ssh_url: &str,
        hash: &str,
        target: &Path,
    ) -> Result<()> {
        crate::git::clone_at_commit(https_url, ssh_url, hash, target, self.timeout)
    }
}
