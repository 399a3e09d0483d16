//! # Ref Resolution
//!
//! Turns the `#ref` part of a repository specifier into a concrete commit
//! hash. The remote's advertised refs are the primary source; the cache map
//! is the fallback when the remote cannot be reached, and the only source
//! when the caller asks for cache-only operation.

use crate::cache::CacheMap;
use crate::error::{Error, Result};
use crate::events::{Emitter, EventCode};
use crate::spec::RepoDescriptor;
use crate::transport::Transport;

/// Selectors shorter than this never match by hash prefix.
const MIN_HASH_PREFIX: usize = 8;

const PEELED_SUFFIX: &str = "^{}";

/// What kind of ref a listing entry is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefKind {
    Head,
    Branch,
    Tag,
    /// Any other namespace under `refs/`, e.g. `pull`.
    Other(String),
}

/// One advertised ref.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefEntry {
    pub name: String,
    pub kind: RefKind,
    pub hash: String,
}

/// Parse `git ls-remote` output.
///
/// Annotated tags are advertised twice, the second time with a `^{}` suffix
/// and the hash of the tagged commit; the commit hash replaces the tag
/// object's. Any malformed line fails the whole listing.
pub fn parse_ls_remote(output: &str) -> Result<Vec<RefEntry>> {
    let mut refs: Vec<RefEntry> = Vec::new();

    for line in output.lines().filter(|l| !l.trim().is_empty()) {
        let bad_ref = || Error::BadRef {
            line: line.to_string(),
        };

        let (hash, full_ref) = line.split_once('\t').ok_or_else(bad_ref)?;
        let hash = hash.trim();
        let full_ref = full_ref.trim();
        if hash.len() != 40 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(bad_ref());
        }

        let (kind, name) = if full_ref == "HEAD" {
            (RefKind::Head, full_ref)
        } else {
            let (namespace, name) = full_ref
                .strip_prefix("refs/")
                .and_then(|rest| rest.split_once('/'))
                .filter(|(namespace, name)| !namespace.is_empty() && !name.is_empty())
                .ok_or_else(bad_ref)?;
            let kind = match namespace {
                "heads" => RefKind::Branch,
                "tags" => RefKind::Tag,
                other => RefKind::Other(other.to_string()),
            };
            (kind, name)
        };

        if let Some(tag) = name.strip_suffix(PEELED_SUFFIX) {
            if let Some(entry) = refs.iter_mut().find(|e| e.kind == kind && e.name == tag) {
                entry.hash = hash.to_ascii_lowercase();
                continue;
            }
        }

        refs.push(RefEntry {
            name: name.to_string(),
            kind,
            hash: hash.to_ascii_lowercase(),
        });
    }

    Ok(refs)
}

/// Pick the entry `selector` names.
///
/// An exact name wins; otherwise a selector of at least eight characters
/// matches the first hash it prefixes. The flag is `true` for a name match.
pub fn select_ref<'a>(refs: &'a [RefEntry], selector: &str) -> Option<(&'a RefEntry, bool)> {
    if let Some(entry) = refs.iter().find(|e| e.name == selector) {
        return Some((entry, true));
    }

    if selector.len() >= MIN_HASH_PREFIX {
        let prefix = selector.to_ascii_lowercase();
        return refs
            .iter()
            .find(|e| e.hash.starts_with(&prefix))
            .map(|entry| (entry, false));
    }

    None
}

/// Resolve `repo.ref` to a commit hash.
///
/// With `use_cache_only` the remote is never contacted. Otherwise a failure
/// to reach the remote falls back to the cache map; a listing that is
/// reachable but has no match is a hard [`Error::MissingRef`].
pub fn resolve(
    repo: &RepoDescriptor,
    cached: &CacheMap,
    use_cache_only: bool,
    transport: &dyn Transport,
    events: &Emitter,
) -> Result<String> {
    if use_cache_only {
        return from_cache(repo, cached, events);
    }

    let listing = match transport.list_refs(&repo.url) {
        Ok(listing) => listing,
        Err(e) => {
            log::debug!("Could not list refs for {}: {}", repo.url, e);
            return from_cache(repo, cached, events);
        }
    };

    let refs = parse_ls_remote(&listing)?;
    match select_ref(&refs, &repo.r#ref) {
        Some((entry, exact)) => {
            if exact {
                events.verbose(
                    EventCode::FoundMatch,
                    format!("found matching commit hash: {}", entry.hash),
                );
            }
            Ok(entry.hash.clone())
        }
        None => Err(Error::MissingRef {
            r#ref: repo.r#ref.clone(),
        }),
    }
}

fn from_cache(repo: &RepoDescriptor, cached: &CacheMap, events: &Emitter) -> Result<String> {
    let hash = cached.get(&repo.r#ref).ok_or_else(|| Error::MissingRef {
        r#ref: repo.r#ref.clone(),
    })?;
    events.info(
        EventCode::UsingCache,
        format!("using cached commit hash {}", hash),
    );
    Ok(hash.clone())
}
