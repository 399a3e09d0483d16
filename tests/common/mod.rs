//! Shared test utilities for integration and E2E tests.
//!
//! This module provides common fixtures and helper functions to reduce
//! duplication across test files.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new();
//!     let transport = FixtureTransport::new()
//!         .with_repo("user/repo", &[("main", HASH_A)])
//!         .with_archive("user/repo", HASH_A, &[("README.md", "hi")]);
//!     // ... test code
//! }
//! ```

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use assert_fs::prelude::*;
use degit::error::{Error, Result};
use degit::events::Event;
use degit::transport::Transport;
use flate2::write::GzEncoder;
use flate2::Compression;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::{
        event_log, should_skip_network_tests, tarball, FixtureTransport, TestFixture, HASH_A,
        HASH_B, HASH_C,
    };
}

#[allow(dead_code)]
pub const HASH_A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
#[allow(dead_code)]
pub const HASH_B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
#[allow(dead_code)]
pub const HASH_C: &str = "cccccccccccccccccccccccccccccccccccccccc";

/// Check if network tests should be skipped.
///
/// Returns `true` if the `SKIP_NETWORK_TESTS` environment variable is set.
#[allow(dead_code)]
pub fn should_skip_network_tests() -> bool {
    env::var("SKIP_NETWORK_TESTS").is_ok()
}

/// Build a `.tar.gz` shaped like a host archive: every file under one
/// synthetic root directory.
#[allow(dead_code)]
pub fn tarball(root: &str, files: &[(&str, &str)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (path, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        builder
            .append_data(&mut header, format!("{}/{}", root, path), content.as_bytes())
            .expect("Failed to append tar entry");
    }
    builder
        .into_inner()
        .and_then(|encoder| encoder.finish())
        .expect("Failed to finish tarball")
}

/// Collect `(code, message)` pairs from a clone.
#[allow(dead_code)]
pub fn event_log() -> (
    Arc<Mutex<Vec<(String, String)>>>,
    impl Fn(&Event) + Send + Sync + 'static,
) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let listener = move |event: &Event| {
        sink.lock()
            .unwrap()
            .push((event.code.to_string(), event.message.clone()))
    };
    (seen, listener)
}

/// A scripted [`Transport`]: ref listings per repository, tarballs per
/// commit, and a switch to simulate being offline.
#[derive(Default)]
pub struct FixtureTransport {
    listings: HashMap<String, String>,
    archives: HashMap<String, Vec<u8>>,
    offline: bool,
    calls: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl FixtureTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advertise `refs` (`(branch, hash)`) for `src`; the first one is HEAD.
    pub fn with_repo(mut self, src: &str, refs: &[(&str, &str)]) -> Self {
        let repo = degit::spec::parse(src).expect("fixture src must parse");
        let mut listing = String::new();
        if let Some((_, hash)) = refs.first() {
            listing.push_str(&format!("{}\tHEAD\n", hash));
        }
        for (name, hash) in refs {
            listing.push_str(&format!("{}\trefs/heads/{}\n", hash, name));
        }
        self.listings.insert(repo.url, listing);
        self
    }

    /// Serve a tarball of `files` for `src` at `hash`.
    pub fn with_archive(mut self, src: &str, hash: &str, files: &[(&str, &str)]) -> Self {
        let repo = degit::spec::parse(src).expect("fixture src must parse");
        let root = format!("{}-{}", repo.name, &hash[..7]);
        self.archives
            .insert(repo.archive_url(hash), tarball(&root, files));
        self
    }

    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn downloads(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.starts_with("download"))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Transport for FixtureTransport {
    fn list_refs(&self, url: &str) -> Result<String> {
        self.record(format!("list_refs {}", url));
        if self.offline {
            return Err(Error::GitCommand {
                command: format!("ls-remote {}", url),
                url: url.to_string(),
                stderr: "Could not resolve host".to_string(),
            });
        }
        self.listings
            .get(url)
            .cloned()
            .ok_or_else(|| Error::GitCommand {
                command: format!("ls-remote {}", url),
                url: url.to_string(),
                stderr: "repository not found".to_string(),
            })
    }

    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        self.record(format!("download {}", url));
        let bytes = match self.archives.get(url) {
            Some(bytes) if !self.offline => bytes,
            _ => {
                return Err(Error::CouldNotDownload {
                    url: url.to_string(),
                    message: "HTTP 404 Not Found".to_string(),
                })
            }
        };
        fs::write(dest, bytes)?;
        Ok(())
    }

    fn extract(&self, archive: &Path, dest: &Path, subdir: Option<&str>) -> Result<usize> {
        degit::archive::extract(archive, dest, subdir)
    }

    fn clone_at_commit(
        &self,
        https_url: &str,
        _ssh_url: &str,
        hash: &str,
        _target: &Path,
    ) -> Result<()> {
        Err(Error::GitClone {
            url: https_url.to_string(),
            r#ref: hash.to_string(),
            message: "git transport is not scripted".to_string(),
            hint: None,
        })
    }
}

/// A temporary workspace with separate cache and destination directories.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Cache base to hand to `Config::new`.
    pub fn cache_dir(&self) -> PathBuf {
        self.temp_dir.path().join("cache")
    }

    /// Default destination for clones.
    pub fn dest(&self) -> PathBuf {
        self.temp_dir.path().join("app")
    }

    /// Read a file from the destination.
    pub fn read_dest(&self, path: &str) -> String {
        fs::read_to_string(self.dest().join(path))
            .unwrap_or_else(|e| panic!("Failed to read {}: {}", path, e))
    }

    /// Relative paths of every file in the destination, sorted.
    pub fn dest_files(&self) -> Vec<String> {
        let root = self.dest();
        let mut files: Vec<String> = walkdir::WalkDir::new(&root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                e.path()
                    .strip_prefix(&root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        files.sort();
        files
    }

    /// Create a command configured to run in this fixture's directory with
    /// an isolated cache.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("degit");
        cmd.current_dir(self.path())
            .env("DEGIT_CACHE", self.cache_dir())
            .env("NO_COLOR", "1");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_temp_dir() {
        let fixture = TestFixture::new();
        assert!(fixture.path().exists());
    }

    #[test]
    fn test_fixture_with_file() {
        let fixture = TestFixture::new().with_file("app/test.txt", "hello");
        assert_eq!(fixture.read_dest("test.txt"), "hello");
        assert_eq!(fixture.dest_files(), vec!["test.txt"]);
    }

    #[test]
    fn test_fixture_transport_lists_head_first() {
        let transport = FixtureTransport::new().with_repo("user/repo", &[("main", HASH_A)]);
        let listing = transport
            .list_refs("https://github.com/user/repo")
            .unwrap();
        assert!(listing.starts_with(&format!("{}\tHEAD", HASH_A)));
    }
}
