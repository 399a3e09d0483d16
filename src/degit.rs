//! # Clone Orchestration
//!
//! [`Degit`] ties the pieces together. A call to [`Degit::clone`] runs, in
//! order:
//!
//! 1. destination check (refuses a non-empty directory without `force`),
//! 2. cache map read,
//! 3. ref resolution against the remote (or the cache),
//! 4. snapshot fetch and extraction, updating the cache map,
//! 5. `degit.json` directives, which may recursively clone other templates,
//! 6. the terminal `SUCCESS` event.
//!
//! There is no rollback: a failure part-way leaves whatever was already
//! written in the destination.

use std::path::Path;
use std::sync::Arc;

use crate::cache::{self, RepoCacheDir};
use crate::config::Config;
use crate::directives;
use crate::error::{Error, Result};
use crate::events::{Emitter, Event, EventCode, Listener};
use crate::materialize;
use crate::refs;
use crate::spec::{self, RepoDescriptor, TransferMode};
use crate::transport::{DefaultTransport, Transport};

/// How deep `clone` directives may nest.
pub const MAX_NESTING: usize = 16;

/// Per-clone options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CloneOptions {
    /// Write into a non-empty destination.
    pub force: bool,
    /// Resolve refs from the local cache only, never listing remote refs.
    pub cache: bool,
    /// Deliver verbose-only events.
    pub verbose: bool,
    /// Override the host's default transfer mode.
    pub mode: Option<TransferMode>,
}

/// A parsed repository ready to be cloned.
pub struct Degit {
    repo: RepoDescriptor,
    options: CloneOptions,
    config: Config,
    transport: Arc<dyn Transport>,
    events: Emitter,
    /// Repositories whose directives led to this clone, outermost first.
    ancestors: Vec<String>,
}

impl Degit {
    /// Parse `src` and prepare a clone with the default transport.
    ///
    /// # Errors
    ///
    /// Fails with `BAD_SRC` or `UNSUPPORTED_HOST` if `src` is rejected.
    pub fn new(src: &str, options: CloneOptions, config: Config) -> Result<Self> {
        let transport: Arc<dyn Transport> = Arc::new(DefaultTransport::new(config.timeout));
        let events = Emitter::new(options.verbose);
        Self::build(src, options, config, transport, events, Vec::new())
    }

    fn build(
        src: &str,
        options: CloneOptions,
        config: Config,
        transport: Arc<dyn Transport>,
        events: Emitter,
        ancestors: Vec<String>,
    ) -> Result<Self> {
        let mut repo = spec::parse(src)?;
        if let Some(mode) = options.mode {
            repo = repo.with_mode(mode);
        }

        Ok(Self {
            repo,
            options,
            config,
            transport,
            events,
            ancestors,
        })
    }

    /// Replace the transport, e.g. with a scripted one in tests.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Register a listener. Listeners are called in registration order.
    pub fn on<L: Listener + 'static>(&mut self, listener: L) -> &mut Self {
        self.events.add(Arc::new(listener));
        self
    }

    pub fn repo(&self) -> &RepoDescriptor {
        &self.repo
    }

    /// Materialize the repository into `dest`.
    pub fn clone(&self, dest: impl AsRef<Path>) -> Result<()> {
        let dest = dest.as_ref();
        let repo = &self.repo;
        self.check_nesting()?;

        materialize::check_dir_is_empty(dest, self.options.force, &self.events)?;

        let cache_dir = RepoCacheDir::new(self.config.cache_base(), repo);
        let mut cached = cache::get(&cache_dir)?;
        let hash = refs::resolve(
            repo,
            &cached,
            self.options.cache,
            self.transport.as_ref(),
            &self.events,
        )?;
        log::debug!("Resolved {} to {}", repo, hash);

        materialize::fetch_and_extract(
            repo,
            &hash,
            &cache_dir,
            &mut cached,
            dest,
            self.transport.as_ref(),
            &self.events,
        )?;

        if let Some(directives) = directives::take_manifest(dest)? {
            let mut ancestors = self.ancestors.clone();
            ancestors.push(identity(repo));
            directives::run(
                &directives,
                dest,
                &cache_dir.stash_dir(self.ancestors.len()),
                &self.events,
                |src, cache, verbose| {
                    let options = CloneOptions {
                        force: true,
                        cache,
                        verbose,
                        mode: None,
                    };
                    Self::build(
                        src,
                        options,
                        self.config.clone(),
                        Arc::clone(&self.transport),
                        self.events.with_verbose(verbose),
                        ancestors.clone(),
                    )?
                    .clone(dest)
                },
            )?;
        }

        self.events.emit(
            Event::info(EventCode::Success, success_message(repo, dest)).with_context(repo, dest),
        );
        Ok(())
    }

    fn check_nesting(&self) -> Result<()> {
        let current = identity(&self.repo);
        let render = || {
            self.ancestors
                .iter()
                .chain(std::iter::once(&current))
                .cloned()
                .collect::<Vec<_>>()
                .join(" -> ")
        };

        if self.ancestors.contains(&current) {
            return Err(Error::CycleDetected { cycle: render() });
        }
        if self.ancestors.len() >= MAX_NESTING {
            return Err(Error::CycleDetected {
                cycle: format!("more than {} nested clones: {}", MAX_NESTING, render()),
            });
        }
        Ok(())
    }
}

/// A clone is identified by everything that selects its tree, so templates
/// from different subdirectories of one repository can compose.
fn identity(repo: &RepoDescriptor) -> String {
    format!("{}:{}", repo.site, repo)
}

fn success_message(repo: &RepoDescriptor, dest: &Path) -> String {
    let mut message = format!("cloned {}#{}", repo.slug(), repo.r#ref);
    if dest != Path::new(".") {
        message.push_str(&format!(" to {}", dest.display()));
    }
    message
}
