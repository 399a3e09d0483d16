//! # Runtime Configuration
//!
//! Process-wide settings shared by every clone in one invocation, including
//! nested clones started by `clone` directives. The cache location is an
//! explicit value rather than an ambient global so tests can point it at a
//! temporary directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::defaults::default_cache_base;

/// Settings for a degit run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root of the snapshot cache (`<base>/<site>/<owner>/<name>/...`).
    pub cache_base: PathBuf,
    /// Upper bound for each network operation (ref listing, download, clone).
    pub timeout: Option<Duration>,
}

impl Config {
    pub fn new(cache_base: impl Into<PathBuf>) -> Self {
        Self {
            cache_base: cache_base.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn cache_base(&self) -> &Path {
        &self.cache_base
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(default_cache_base())
    }
}
