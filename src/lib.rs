//! # degit
//!
//! Straightforward project scaffolding: copy the files of a GitHub, GitLab,
//! Bitbucket or Sourcehut repository at some ref, without its git history.
//!
//! ## Quick Example
//!
//! ```no_run
//! use degit::{CloneOptions, Config, Degit};
//!
//! let mut template = Degit::new(
//!     "sveltejs/template#main",
//!     CloneOptions::default(),
//!     Config::default(),
//! )?;
//! template.on(|event: &degit::events::Event| eprintln!("> {}", event.message));
//! template.clone("my-app")?;
//! # Ok::<(), degit::error::Error>(())
//! ```
//!
//! ## Core Concepts
//!
//! - **Specifiers (`spec`)**: `owner/name[/subdir][#ref]`, optionally prefixed
//!   with a host (`gitlab:`, `https://bitbucket.org/`, `git@github.com:`).
//! - **Ref resolution (`refs`)**: branches, tags, `HEAD` and hash prefixes are
//!   resolved against `git ls-remote`, falling back to the cache offline.
//! - **Snapshot cache (`cache`)**: per-repository `map.json` plus the
//!   downloaded snapshots, garbage-collected when a ref moves.
//! - **Materialization (`materialize`)**: tarball download and extraction, or
//!   a git clone for hosts without an archive API.
//! - **Directives (`directives`)**: a template's `degit.json` can remove
//!   files and compose other templates on top of itself.
//! - **Events (`events`)**: progress is reported to registered listeners.
//!
//! The network-facing primitives sit behind [`transport::Transport`] so the
//! whole flow can be driven offline in tests.

pub mod archive;
pub mod cache;
pub mod config;
pub mod defaults;
pub mod degit;
pub mod directives;
pub mod error;
pub mod events;
pub mod git;
pub mod materialize;
pub mod output;
pub mod refs;
pub mod spec;
pub mod transport;

pub use crate::config::Config;
pub use crate::degit::{CloneOptions, Degit};
pub use crate::error::{Error, Result};

#[cfg(test)]
mod spec_proptest;
