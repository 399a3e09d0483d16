//! # Materialization
//!
//! Gets the tree at a resolved commit into the destination directory, going
//! through the snapshot cache so a commit is fetched at most once:
//!
//! - **Archive mode**: `<cache>/<hash>.tar.gz` is downloaded if missing, then
//!   extracted with its synthetic root directory stripped.
//! - **Git mode**: `<cache>/<hash>/` is populated by a git clone if missing,
//!   then copied.
//!
//! In both modes the cache map is only updated once the snapshot is on disk.

use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

use crate::cache::{self, CacheMap, RepoCacheDir};
use crate::error::{Error, Result};
use crate::events::{Emitter, EventCode};
use crate::spec::{RepoDescriptor, TransferMode};
use crate::transport::Transport;

/// Refuse to write into a non-empty destination unless `force` is set.
///
/// A destination that does not exist yet counts as empty.
pub fn check_dir_is_empty(dest: &Path, force: bool, events: &Emitter) -> Result<()> {
    let mut entries = match fs::read_dir(dest) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            events.verbose(EventCode::DestIsEmpty, "destination directory is empty");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if entries.next().is_none() {
        events.verbose(EventCode::DestIsEmpty, "destination directory is empty");
        return Ok(());
    }

    if force {
        events.info(
            EventCode::DestNotEmpty,
            "destination directory is not empty. Using options.force, continuing",
        );
        Ok(())
    } else {
        Err(Error::DestNotEmpty {
            dest: dest.display().to_string(),
        })
    }
}

/// Put the snapshot for `hash` into `dest`, fetching it into the cache first
/// if needed, and bind `repo.ref` to `hash` in `cached`.
pub fn fetch_and_extract(
    repo: &RepoDescriptor,
    hash: &str,
    cache_dir: &RepoCacheDir,
    cached: &mut CacheMap,
    dest: &Path,
    transport: &dyn Transport,
    events: &Emitter,
) -> Result<()> {
    match repo.mode {
        TransferMode::Archive => {
            from_archive(repo, hash, cache_dir, cached, dest, transport, events)
        }
        TransferMode::Git => from_git(repo, hash, cache_dir, cached, dest, transport, events),
    }
}

fn from_archive(
    repo: &RepoDescriptor,
    hash: &str,
    cache_dir: &RepoCacheDir,
    cached: &mut CacheMap,
    dest: &Path,
    transport: &dyn Transport,
    events: &Emitter,
) -> Result<()> {
    let archive = cache_dir.archive_path(hash);

    if archive.exists() {
        events.verbose(
            EventCode::FileExists,
            format!("{} already exists locally", archive.display()),
        );
    } else {
        fs::create_dir_all(cache_dir.path())?;
        let url = repo.archive_url(hash);
        events.verbose(
            EventCode::Downloading,
            format!("downloading {} to {}", url, archive.display()),
        );
        transport.download(&url, &archive)?;
    }

    cache::update(cache_dir, repo, hash, cached)?;

    events.verbose(
        EventCode::Extracting,
        format!(
            "extracting {}{} to {}",
            archive.display(),
            subdir_suffix(repo),
            dest.display()
        ),
    );
    fs::create_dir_all(dest)?;
    let written = transport.extract(&archive, dest, repo.subdir.as_deref())?;
    log::debug!("Extracted {} entries into {}", written, dest.display());
    Ok(())
}

fn from_git(
    repo: &RepoDescriptor,
    hash: &str,
    cache_dir: &RepoCacheDir,
    cached: &mut CacheMap,
    dest: &Path,
    transport: &dyn Transport,
    events: &Emitter,
) -> Result<()> {
    let snapshot = cache_dir.snapshot_dir(hash);

    if snapshot.is_dir() {
        events.verbose(
            EventCode::FileExists,
            format!("{} already exists locally", snapshot.display()),
        );
    } else {
        events.verbose(
            EventCode::Downloading,
            format!("cloning {} at {} to {}", repo.url, hash, snapshot.display()),
        );
        transport.clone_at_commit(&repo.url, &repo.ssh_url, hash, &snapshot)?;
    }

    cache::update(cache_dir, repo, hash, cached)?;

    let source = match &repo.subdir {
        Some(subdir) => snapshot.join(subdir),
        None => snapshot.clone(),
    };
    if !source.is_dir() {
        return Err(Error::Extract {
            archive: snapshot.display().to_string(),
            message: format!(
                "subdirectory '{}' not found in snapshot",
                repo.subdir.as_deref().unwrap_or_default()
            ),
        });
    }

    events.verbose(
        EventCode::Extracting,
        format!(
            "copying {}{} to {}",
            snapshot.display(),
            subdir_suffix(repo),
            dest.display()
        ),
    );
    fs::create_dir_all(dest)?;
    let written = copy_tree(&source, dest, true)?;
    log::debug!("Copied {} entries into {}", written, dest.display());
    Ok(())
}

fn subdir_suffix(repo: &RepoDescriptor) -> String {
    repo.subdir
        .as_ref()
        .map(|s| format!("/{}", s))
        .unwrap_or_default()
}

/// Recursively copy the contents of `src` into `dest`.
///
/// Directories are merged. With `overwrite` unset, anything already present
/// at the target wins: existing files are left untouched, and a source
/// directory whose target is not a directory is skipped with its subtree.
/// Returns the number of files copied.
pub(crate) fn copy_tree(src: &Path, dest: &Path, overwrite: bool) -> Result<usize> {
    let mut copied = 0;
    let mut entries = WalkDir::new(src).min_depth(1).into_iter();

    while let Some(entry) = entries.next() {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(io::Error::other)?;
        let target = dest.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            match target.symlink_metadata() {
                Ok(metadata) if metadata.is_dir() => {}
                Ok(_) if !overwrite => {
                    log::trace!("Keeping existing {}", target.display());
                    entries.skip_current_dir();
                    continue;
                }
                Ok(_) => fs::remove_file(&target)?,
                Err(_) => {}
            }
            fs::create_dir_all(&target)?;
            continue;
        }

        if target.symlink_metadata().is_ok() {
            if !overwrite {
                log::trace!("Keeping existing {}", target.display());
                continue;
            }
            if target.is_dir() {
                fs::remove_dir_all(&target)?;
            } else {
                fs::remove_file(&target)?;
            }
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
        copied += 1;
    }

    Ok(copied)
}

#[cfg(unix)]
fn copy_symlink(src: &Path, target: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(fs::read_link(src)?, target)
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, target: &Path) -> io::Result<()> {
    fs::copy(src, target).map(|_| ())
}
