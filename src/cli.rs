//! CLI argument parsing and dispatch

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, ValueEnum};

use degit::output::{render_error, ConsoleListener, OutputConfig};
use degit::spec::TransferMode;
use degit::{CloneOptions, Config, Degit};

/// degit - Straightforward project scaffolding
#[derive(Parser, Debug)]
#[command(name = "degit")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Repository to copy: [host:]owner/name[/subdir][#ref]
    #[arg(value_name = "SRC")]
    src: String,

    /// Destination directory
    #[arg(value_name = "DEST", default_value = ".")]
    dest: PathBuf,

    /// Allow cloning into a non-empty directory
    #[arg(short, long)]
    force: bool,

    /// Only use the local cache, without listing remote refs
    #[arg(short, long)]
    cache: bool,

    /// Extra logging
    #[arg(short, long)]
    verbose: bool,

    /// Transfer mode (defaults to tar, or git for Sourcehut)
    #[arg(short, long, value_enum, value_name = "MODE")]
    mode: Option<ModeArg>,

    /// Cache root directory
    #[arg(long, value_name = "DIR", env = "DEGIT_CACHE")]
    cache_dir: Option<PathBuf>,

    /// Network timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Colorize output (always, never, auto)
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ModeArg {
    Tar,
    Git,
}

impl From<ModeArg> for TransferMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Tar => TransferMode::Archive,
            ModeArg::Git => TransferMode::Git,
        }
    }
}

impl Cli {
    /// Run the clone, printing progress and any error to stderr.
    pub fn run(self) -> ExitCode {
        init_logging(&self.log_level);
        let out = OutputConfig::from_env_and_flag(&self.color);

        match self.execute(&out) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("{}", render_error(&out, &format!("{:#}", e)));
                ExitCode::FAILURE
            }
        }
    }

    fn execute(self, out: &OutputConfig) -> Result<()> {
        let mut config = match self.cache_dir {
            Some(dir) => Config::new(dir),
            None => Config::default(),
        };
        if let Some(secs) = self.timeout {
            config = config.with_timeout(Duration::from_secs(secs));
        }

        let options = CloneOptions {
            force: self.force,
            cache: self.cache,
            verbose: self.verbose,
            mode: self.mode.map(TransferMode::from),
        };

        let mut degit = Degit::new(&self.src, options, config)?;
        degit.on(ConsoleListener::new(out.clone()));
        log::debug!("Cloning {} into {}", degit.repo(), self.dest.display());
        degit.clone(&self.dest)?;
        Ok(())
    }
}

fn init_logging(level: &str) {
    // RUST_LOG takes precedence over --log-level
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}
