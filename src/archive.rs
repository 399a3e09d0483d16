//! Tarball download and extraction.
//!
//! Hosts with an archive API serve a `.tar.gz` of any commit. Those archives
//! always wrap the tree in one synthetic top-level directory
//! (`repo-<hash>/`), which extraction strips.

use std::fs;
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use flate2::read::GzDecoder;
use url::Url;

use crate::error::{Error, Result};

/// Download `url` to `dest`, following redirects.
///
/// The body is streamed into `<dest>.part` and renamed into place only once
/// complete, so an interrupted download never leaves a truncated archive
/// where the cache expects a finished one.
pub fn download(url: &str, dest: &Path, timeout: Option<Duration>) -> Result<()> {
    let parsed = Url::parse(url)?;
    let download_error = |message: String| Error::CouldNotDownload {
        url: url.to_string(),
        message,
    };

    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("degit/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .map_err(|e| download_error(format!("Failed to build HTTP client: {}", e)))?;

    log::debug!("GET {}", url);
    let mut response = client
        .get(parsed)
        .send()
        .map_err(|e| download_error(e.to_string()))?;

    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        return Err(download_error(format!(
            "HTTP {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        )));
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    let partial = partial_path(dest);
    let written = fs::File::create(&partial)
        .map_err(Error::from)
        .and_then(|mut file| {
            response
                .copy_to(&mut file)
                .map_err(|e| download_error(e.to_string()))
        });

    match written {
        Ok(bytes) => {
            log::debug!("Downloaded {} bytes from {}", bytes, url);
            fs::rename(&partial, dest)?;
            Ok(())
        }
        Err(e) => {
            let _ = fs::remove_file(&partial);
            Err(e)
        }
    }
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Unpack a `.tar.gz` into `dest`, stripping the synthetic root directory.
///
/// With `subdir`, only entries below that directory are written, relative to
/// it. Returns the number of entries written.
pub fn extract(archive_path: &Path, dest: &Path, subdir: Option<&str>) -> Result<usize> {
    let extract_error = |message: String| Error::Extract {
        archive: archive_path.display().to_string(),
        message,
    };

    let file = fs::File::open(archive_path).map_err(|e| extract_error(e.to_string()))?;
    let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
    fs::create_dir_all(dest)?;

    let prefix: Vec<&str> = subdir
        .map(|s| s.split('/').filter(|part| !part.is_empty()).collect())
        .unwrap_or_default();

    let mut written = 0;
    let entries = archive
        .entries()
        .map_err(|e| extract_error(e.to_string()))?;
    for entry in entries {
        let mut entry = entry.map_err(|e| extract_error(e.to_string()))?;
        if entry.header().entry_type().is_pax_global_extensions() {
            continue;
        }

        let path = entry
            .path()
            .map_err(|e| extract_error(e.to_string()))?
            .into_owned();
        let Some(relative) = strip_components(&path, &prefix) else {
            continue;
        };
        if relative.as_os_str().is_empty() {
            continue;
        }

        let target = dest.join(&relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        log::trace!("Extracting {}", relative.display());
        entry
            .unpack(&target)
            .map_err(|e| extract_error(format!("{}: {}", relative.display(), e)))?;
        written += 1;
    }

    if written == 0 {
        if let Some(subdir) = subdir {
            return Err(extract_error(format!(
                "subdirectory '{}' not found in archive",
                subdir
            )));
        }
    }

    Ok(written)
}

/// Drop the archive root and `prefix` from `path`.
///
/// Returns `None` for entries outside `prefix` and for anything that could
/// escape the destination (absolute paths, `..`).
fn strip_components(path: &Path, prefix: &[&str]) -> Option<PathBuf> {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(_)) => {}
        _ => return None,
    }
    for expected in prefix {
        match components.next() {
            Some(Component::Normal(part)) if part == *expected => {}
            _ => return None,
        }
    }

    let mut relative = PathBuf::new();
    for component in components {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(relative)
}
