//! # Repository Specifiers
//!
//! Parses the free-form repository string a user passes on the command line
//! (or a template passes in a `clone` directive) into a [`RepoDescriptor`].
//!
//! Accepted forms:
//!
//! - `owner/name`
//! - `owner/name#ref`
//! - `gitlab:owner/name/sub/dir#v1.2.0`
//! - `https://bitbucket.org/owner/name.git/subdir#main`
//! - `git@github.com:owner/name`
//! - `git.sr.ht/~owner/name`
//!
//! The host defaults to GitHub. When no ref is given the descriptor carries
//! the symbolic [`DEFAULT_REF`], which the resolver maps to whatever the
//! remote's default branch points at.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::{Error, Result};

/// Ref used when the specifier has no `#ref` suffix.
pub const DEFAULT_REF: &str = "HEAD";

static SPEC_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?:https://)?([^:/\s]+\.[^:/\s]+)/|git@([^:/\s]+)[:/]|([^/:\s]+):)?([^/\s#]+)/([^/\s#]+)((?:/[^/\s#]+)+)?/?(?:#(\S+))?$",
    )
    .expect("repository specifier pattern is valid")
});

/// A supported hosting service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Site {
    Github,
    Gitlab,
    Bitbucket,
    Sourcehut,
}

impl Site {
    /// Map a host or site shorthand to a site.
    ///
    /// Accepts both bare names (`gitlab`) and hostnames (`gitlab.com`).
    pub fn from_host(host: &str) -> Option<Self> {
        let lowered = host.to_ascii_lowercase();
        let trimmed = lowered
            .strip_suffix(".com")
            .or_else(|| lowered.strip_suffix(".org"))
            .unwrap_or(&lowered);

        match trimmed {
            "github" | "www.github" => Some(Site::Github),
            "gitlab" | "www.gitlab" => Some(Site::Gitlab),
            "bitbucket" | "www.bitbucket" => Some(Site::Bitbucket),
            "sourcehut" | "git.sr.ht" | "sr.ht" => Some(Site::Sourcehut),
            _ => None,
        }
    }

    /// Canonical public hostname.
    pub fn host(&self) -> &'static str {
        match self {
            Site::Github => "github.com",
            Site::Gitlab => "gitlab.com",
            Site::Bitbucket => "bitbucket.org",
            Site::Sourcehut => "git.sr.ht",
        }
    }

    /// Whether the host serves tarball snapshots of arbitrary commits.
    pub fn has_archive_api(&self) -> bool {
        !matches!(self, Site::Sourcehut)
    }

    /// Short name used for cache directories.
    pub fn as_str(&self) -> &'static str {
        match self {
            Site::Github => "github",
            Site::Gitlab => "gitlab",
            Site::Bitbucket => "bitbucket",
            Site::Sourcehut => "sourcehut",
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a snapshot is transferred from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    /// Download a host-generated `.tar.gz` of the commit.
    Archive,
    /// Clone with the git protocol and strip `.git` afterwards.
    Git,
}

/// Parsed, structured form of a repository specifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoDescriptor {
    pub site: Site,
    /// Account name, without Sourcehut's `~` prefix.
    pub owner: String,
    pub name: String,
    /// Subdirectory within the repository, without leading or trailing slashes.
    pub subdir: Option<String>,
    pub r#ref: String,
    /// HTTPS URL of the repository, also used for `git ls-remote`.
    pub url: String,
    pub ssh_url: String,
    pub mode: TransferMode,
}

impl RepoDescriptor {
    /// URL of the host's tarball for `hash`.
    ///
    /// Only meaningful for sites with an archive API; Sourcehut snapshots go
    /// through the git path instead.
    pub fn archive_url(&self, hash: &str) -> String {
        match self.site {
            Site::Gitlab => format!("{}/repository/archive.tar.gz?ref={}", self.url, hash),
            Site::Bitbucket => format!("{}/get/{}.tar.gz", self.url, hash),
            Site::Github | Site::Sourcehut => format!("{}/archive/{}.tar.gz", self.url, hash),
        }
    }

    /// `owner/name` without subdirectory or ref.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Returns a copy using `mode` instead of the host default.
    pub fn with_mode(mut self, mode: TransferMode) -> Self {
        self.mode = mode;
        self
    }
}

impl fmt::Display for RepoDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)?;
        if let Some(subdir) = &self.subdir {
            write!(f, "/{}", subdir)?;
        }
        write!(f, "#{}", self.r#ref)
    }
}

/// Parse a repository specifier.
///
/// # Errors
///
/// - [`Error::BadSrc`] if the string does not match the grammar.
/// - [`Error::UnsupportedHost`] if it names a host other than the four
///   supported ones.
pub fn parse(src: &str) -> Result<RepoDescriptor> {
    let captures = SPEC_PATTERN
        .captures(src.trim())
        .ok_or_else(|| Error::BadSrc {
            src: src.to_string(),
        })?;

    let host = captures
        .get(1)
        .or_else(|| captures.get(2))
        .or_else(|| captures.get(3))
        .map(|m| m.as_str())
        .unwrap_or("github");

    let site = Site::from_host(host).ok_or_else(|| Error::UnsupportedHost {
        host: host.to_string(),
    })?;

    // Sourcehut addresses users as ~name; the owner is stored without it so
    // both spellings share a cache directory.
    let owner = match site {
        Site::Sourcehut => captures[4].trim_start_matches('~').to_string(),
        _ => captures[4].to_string(),
    };
    if owner.is_empty() {
        return Err(Error::BadSrc {
            src: src.to_string(),
        });
    }
    let raw_name = &captures[5];
    let name = raw_name.strip_suffix(".git").unwrap_or(raw_name).to_string();
    if name.is_empty() {
        return Err(Error::BadSrc {
            src: src.to_string(),
        });
    }

    let subdir = captures
        .get(6)
        .map(|m| m.as_str().trim_matches('/').to_string())
        .filter(|s| !s.is_empty());
    let r#ref = captures
        .get(7)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| DEFAULT_REF.to_string());

    let url_owner = match site {
        Site::Sourcehut => format!("~{}", owner),
        _ => owner.clone(),
    };

    let url = format!("https://{}/{}/{}", site.host(), url_owner, name);
    let ssh_url = format!("git@{}:{}/{}", site.host(), url_owner, name);
    let mode = if site.has_archive_api() {
        TransferMode::Archive
    } else {
        TransferMode::Git
    };

    Ok(RepoDescriptor {
        site,
        owner,
        name,
        subdir,
        r#ref,
        url,
        ssh_url,
        mode,
    })
}
