//! # Template Directives
//!
//! A template may ship a `degit.json` manifest at its root: a JSON array of
//! actions applied after extraction.
//!
//! ```json
//! [
//!   { "action": "remove", "files": ["LICENSE", "docs/"] },
//!   { "action": "clone", "src": "user/another-template", "cache": false }
//! ]
//! ```
//!
//! ## Stash protocol
//!
//! A `clone` directive writes another template into the same destination.
//! Before the first one runs, everything already in the destination is moved
//! to a stash area in the cache. When the directives finish (or fail), the
//! stash is copied back without overwriting anything the directives wrote, so
//! files from composed templates take precedence over the outer template.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use crate::defaults::MANIFEST_NAME;
use crate::error::{Error, Result};
use crate::events::{Emitter, EventCode};
use crate::materialize::copy_tree;

/// A single manifest action.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Directive {
    /// Compose another template into the destination.
    Clone {
        src: String,
        #[serde(default)]
        cache: bool,
        #[serde(default)]
        verbose: bool,
    },
    /// Delete files or directories, relative to the destination.
    Remove {
        #[serde(deserialize_with = "one_or_many")]
        files: Vec<String>,
    },
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(file) => vec![file],
        OneOrMany::Many(files) => files,
    })
}

/// Parse a manifest body.
pub fn parse(content: &str) -> Result<Vec<Directive>> {
    serde_json::from_str(content).map_err(|e| Error::Manifest {
        message: e.to_string(),
    })
}

/// Read and delete `dest/degit.json`.
///
/// Returns `None` when the template has no manifest. The file is deleted
/// even if it fails to parse.
pub fn take_manifest(dest: &Path) -> Result<Option<Vec<Directive>>> {
    let path = dest.join(MANIFEST_NAME);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    fs::remove_file(&path)?;

    parse(&content).map(Some)
}

/// Apply `directives` in order.
///
/// `clone` is invoked for each `Clone` directive with its `src`, `cache` and
/// `verbose` fields; it must write into `dest`. The stash lives in
/// `stash_dir` and is only created if a `Clone` directive is reached.
pub fn run<F>(
    directives: &[Directive],
    dest: &Path,
    stash_dir: &Path,
    events: &Emitter,
    mut clone: F,
) -> Result<()>
where
    F: FnMut(&str, bool, bool) -> Result<()>,
{
    let mut stash: Option<Stash> = None;

    for directive in directives {
        match directive {
            Directive::Remove { files } => remove(files, dest, stash.as_ref(), events)?,
            Directive::Clone {
                src,
                cache,
                verbose,
            } => {
                if stash.is_none() {
                    stash = Some(Stash::create(stash_dir, dest)?);
                }
                clone(src, *cache, *verbose)?;
            }
        }
    }

    match stash {
        Some(stash) => stash.restore(),
        None => Ok(()),
    }
}

/// Delete `files` from `dest`, and from the stash while one is active.
pub fn remove(
    files: &[String],
    dest: &Path,
    stash: Option<&Stash>,
    events: &Emitter,
) -> Result<()> {
    let mut removed = Vec::new();

    for file in files {
        let relative = contained_path(file)?;
        let target = dest.join(&relative);

        let mut found = None;
        if let Ok(metadata) = target.symlink_metadata() {
            delete(&target, metadata.is_dir())?;
            found = Some(metadata.is_dir());
        }
        if let Some(stash) = stash {
            if let Some(is_dir) = stash.discard(&relative)? {
                found = Some(found.unwrap_or(false) || is_dir);
            }
        }

        match found {
            Some(true) => removed.push(format!("{}/", file.trim_end_matches('/'))),
            Some(false) => removed.push(file.clone()),
            None => events.warn(
                EventCode::FileDoesNotExist,
                format!("action wants to remove {} but it does not exist", file),
            ),
        }
    }

    if !removed.is_empty() {
        events.info(
            EventCode::Removed,
            format!("removed: {}", removed.join(", ")),
        );
    }
    Ok(())
}

/// Reject paths that would reach outside the destination.
fn contained_path(file: &str) -> Result<PathBuf> {
    let path = Path::new(file);
    let mut relative = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            _ => {
                return Err(Error::Manifest {
                    message: format!("remove path '{}' is outside the destination", file),
                })
            }
        }
    }
    if relative.as_os_str().is_empty() {
        return Err(Error::Manifest {
            message: format!("remove path '{}' names the destination itself", file),
        });
    }
    Ok(relative)
}

fn delete(path: &Path, is_dir: bool) -> io::Result<()> {
    if is_dir {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// The destination's original contents, parked while `clone` directives run.
///
/// Restored by [`Stash::restore`]; if dropped without that (a directive
/// failed), restoration happens in `Drop` and errors are only logged.
#[derive(Debug)]
pub struct Stash {
    dir: PathBuf,
    dest: PathBuf,
    restored: bool,
}

impl Stash {
    /// Move every entry of `dest` into `dir`.
    pub fn create(dir: &Path, dest: &Path) -> Result<Self> {
        if dir.exists() {
            log::debug!("Removing leftover stash {}", dir.display());
            fs::remove_dir_all(dir)?;
        }
        fs::create_dir_all(dir)?;

        let stash = Self {
            dir: dir.to_path_buf(),
            dest: dest.to_path_buf(),
            restored: false,
        };
        for entry in fs::read_dir(dest)? {
            let entry = entry?;
            move_entry(&entry.path(), &dir.join(entry.file_name()))?;
        }
        log::debug!("Stashed {} into {}", dest.display(), dir.display());
        Ok(stash)
    }

    /// Delete a stashed entry. Returns whether it was a directory, or `None`
    /// if nothing was stashed there.
    pub fn discard(&self, relative: &Path) -> Result<Option<bool>> {
        let target = self.dir.join(relative);
        match target.symlink_metadata() {
            Ok(metadata) => {
                delete(&target, metadata.is_dir())?;
                Ok(Some(metadata.is_dir()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Copy stashed entries back without overwriting, then delete the stash.
    pub fn restore(mut self) -> Result<()> {
        self.restore_in_place()
    }

    fn restore_in_place(&mut self) -> Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;

        let restored = self.copy_back();
        let cleanup = fs::remove_dir_all(&self.dir);
        let restored = restored?;
        cleanup?;
        log::debug!("Restored {} stashed files into {}", restored, self.dest.display());
        Ok(())
    }

    fn copy_back(&self) -> Result<usize> {
        // The outer template's manifest has already been applied.
        let manifest = self.dir.join(MANIFEST_NAME);
        if manifest.is_file() {
            fs::remove_file(&manifest)?;
        }

        fs::create_dir_all(&self.dest)?;
        copy_tree(&self.dir, &self.dest, false)
    }
}

impl Drop for Stash {
    fn drop(&mut self) {
        if let Err(e) = self.restore_in_place() {
            log::warn!(
                "Could not restore stashed files from {}: {}",
                self.dir.display(),
                e
            );
        }
    }
}

/// Rename, falling back to copy and delete across filesystems.
fn move_entry(src: &Path, dst: &Path) -> Result<()> {
    if fs::rename(src, dst).is_ok() {
        return Ok(());
    }

    let metadata = src.symlink_metadata()?;
    if metadata.is_dir() {
        fs::create_dir_all(dst)?;
        copy_tree(src, dst, true)?;
        fs::remove_dir_all(src)?;
    } else {
        fs::copy(src, dst)?;
        fs::remove_file(src)?;
    }
    Ok(())
}
