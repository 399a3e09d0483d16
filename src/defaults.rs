//! Default values for degit configuration.
//!
//! This module centralizes defaults used by both the library and the CLI.

use std::path::PathBuf;

/// Name of the cache directory created under the base location.
pub const CACHE_DIR_NAME: &str = ".degit";

/// Name of the directive manifest a template may place at its root.
pub const MANIFEST_NAME: &str = "degit.json";

/// Returns the default cache base directory.
///
/// Uses `~/.degit`, falling back to `.degit` inside the system temporary
/// directory when the home directory cannot be determined.
///
/// This can be overridden by the `--cache-dir` CLI flag or the
/// `DEGIT_CACHE` environment variable.
pub fn default_cache_base() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(CACHE_DIR_NAME)
}
