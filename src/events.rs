//! # Lifecycle Events
//!
//! A clone reports its progress through [`Event`]s delivered to registered
//! [`Listener`]s. Listeners are called synchronously, in registration order,
//! on the thread running the clone. There is no global event bus: whoever
//! builds a [`crate::Degit`] decides who hears about it.
//!
//! Every event carries a stable [`EventCode`] so callers can react to, say,
//! `FILE_DOES_NOT_EXIST` without parsing message text.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::spec::RepoDescriptor;

/// Severity of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
}

/// Stable identifiers for lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCode {
    /// Destination is missing or empty.
    DestIsEmpty,
    /// Destination has files but `force` allows continuing.
    DestNotEmpty,
    /// The commit hash came from the local cache map.
    UsingCache,
    /// The ref matched a remote ref by name.
    FoundMatch,
    /// The snapshot is already on disk.
    FileExists,
    Downloading,
    Extracting,
    /// A `remove` directive deleted one or more paths.
    Removed,
    /// A `remove` directive named a path that does not exist.
    FileDoesNotExist,
    /// Terminal event of a successful clone.
    Success,
}

impl EventCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCode::DestIsEmpty => "DEST_IS_EMPTY",
            EventCode::DestNotEmpty => "DEST_NOT_EMPTY",
            EventCode::UsingCache => "USING_CACHE",
            EventCode::FoundMatch => "FOUND_MATCH",
            EventCode::FileExists => "FILE_EXISTS",
            EventCode::Downloading => "DOWNLOADING",
            EventCode::Extracting => "EXTRACTING",
            EventCode::Removed => "REMOVED",
            EventCode::FileDoesNotExist => "FILE_DOES_NOT_EXIST",
            EventCode::Success => "SUCCESS",
        }
    }
}

impl fmt::Display for EventCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single lifecycle event.
#[derive(Debug, Clone)]
pub struct Event {
    pub level: Level,
    pub code: EventCode,
    pub message: String,
    /// Repository being cloned, set on `SUCCESS`.
    pub repo: Option<RepoDescriptor>,
    /// Destination directory, set on `SUCCESS`.
    pub dest: Option<PathBuf>,
}

impl Event {
    pub fn info(code: EventCode, message: impl Into<String>) -> Self {
        Self {
            level: Level::Info,
            code,
            message: message.into(),
            repo: None,
            dest: None,
        }
    }

    pub fn warn(code: EventCode, message: impl Into<String>) -> Self {
        Self {
            level: Level::Warn,
            ..Self::info(code, message)
        }
    }

    /// Attach the `{repo, dest}` context.
    pub fn with_context(mut self, repo: &RepoDescriptor, dest: impl Into<PathBuf>) -> Self {
        self.repo = Some(repo.clone());
        self.dest = Some(dest.into());
        self
    }
}

/// Receives lifecycle events.
pub trait Listener: Send + Sync {
    fn on_event(&self, event: &Event);
}

impl<F> Listener for F
where
    F: Fn(&Event) + Send + Sync,
{
    fn on_event(&self, event: &Event) {
        self(event)
    }
}

/// Forwards events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogListener;

impl Listener for LogListener {
    fn on_event(&self, event: &Event) {
        match event.level {
            Level::Info => log::info!("[{}] {}", event.code, event.message),
            Level::Warn => log::warn!("[{}] {}", event.code, event.message),
        }
    }
}

/// Ordered set of listeners plus the verbosity gate.
///
/// Cloning an `Emitter` shares the listeners, which is how nested clones
/// report through the same observers as their parent.
#[derive(Clone, Default)]
pub struct Emitter {
    listeners: Vec<Arc<dyn Listener>>,
    verbose: bool,
}

impl Emitter {
    pub fn new(verbose: bool) -> Self {
        Self {
            listeners: Vec::new(),
            verbose,
        }
    }

    pub fn add(&mut self, listener: Arc<dyn Listener>) {
        self.listeners.push(listener);
    }

    /// Same listeners, different verbosity.
    pub fn with_verbose(&self, verbose: bool) -> Self {
        Self {
            listeners: self.listeners.clone(),
            verbose,
        }
    }

    pub fn emit(&self, event: Event) {
        for listener in &self.listeners {
            listener.on_event(&event);
        }
    }

    pub fn info(&self, code: EventCode, message: impl Into<String>) {
        self.emit(Event::info(code, message));
    }

    pub fn warn(&self, code: EventCode, message: impl Into<String>) {
        self.emit(Event::warn(code, message));
    }

    /// Info event that is only delivered in verbose mode.
    pub fn verbose(&self, code: EventCode, message: impl Into<String>) {
        if self.verbose {
            self.info(code, message);
        }
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("listeners", &self.listeners.len())
            .field("verbose", &self.verbose)
            .finish()
    }
}
