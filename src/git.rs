//! Git subprocess primitives.
//!
//! Everything here shells out to the system `git`, which automatically picks
//! up SSH keys, credential helpers and anything configured in `~/.gitconfig`.

use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// List every ref the remote advertises, as raw `<hash>\t<ref>` lines.
pub fn ls_remote(url: &str, timeout: Option<Duration>) -> Result<String> {
    run_git(&["ls-remote", url], None, url, timeout)
}

/// Check out `hash` into `target_dir` and strip its `.git` directory.
///
/// The HTTPS URL is tried first and the SSH URL second. On any failure the
/// partially populated `target_dir` is removed so it is never mistaken for a
/// complete snapshot.
pub fn clone_at_commit(
    https_url: &str,
    ssh_url: &str,
    hash: &str,
    target_dir: &Path,
    timeout: Option<Duration>,
) -> Result<()> {
    let result = clone_into(https_url, ssh_url, hash, target_dir, timeout)
        .and_then(|()| checkout(https_url, hash, target_dir, timeout))
        .and_then(|()| strip_vcs_metadata(target_dir));

    if result.is_err() && target_dir.exists() {
        if let Err(e) = fs::remove_dir_all(target_dir) {
            log::debug!(
                "Could not clean up partial clone {}: {}",
                target_dir.display(),
                e
            );
        }
    }
    result
}

fn clone_into(
    https_url: &str,
    ssh_url: &str,
    hash: &str,
    target_dir: &Path,
    timeout: Option<Duration>,
) -> Result<()> {
    // git won't clone into an existing non-empty directory
    if target_dir.exists() {
        fs::remove_dir_all(target_dir)?;
    }
    if let Some(parent) = target_dir.parent() {
        fs::create_dir_all(parent)?;
    }

    let target = target_dir.to_string_lossy().into_owned();
    let https_err = match run_git(
        &["clone", "--quiet", https_url, target.as_str()],
        None,
        https_url,
        timeout,
    ) {
        Ok(_) => return Ok(()),
        Err(e) => e,
    };
    log::debug!("HTTPS clone failed, retrying over SSH: {}", https_err);

    if target_dir.exists() {
        fs::remove_dir_all(target_dir)?;
    }
    match run_git(&["clone", "--quiet", ssh_url, target.as_str()], None, ssh_url, timeout) {
        Ok(_) => Ok(()),
        Err(ssh_err) => {
            let stderr = format!("{}\n{}", https_err, ssh_err);
            let hint = if stderr.contains("Authentication failed")
                || stderr.contains("Permission denied")
                || stderr.contains("Could not read from remote repository")
            {
                Some(
                    "For private repos, make sure an SSH key is loaded in ssh-agent \
                     or git credentials are configured"
                        .to_string(),
                )
            } else {
                None
            };

            Err(Error::GitClone {
                url: https_url.to_string(),
                r#ref: hash.to_string(),
                message: "could not clone over HTTPS or SSH".to_string(),
                hint,
            })
        }
    }
}

fn checkout(url: &str, hash: &str, repo_dir: &Path, timeout: Option<Duration>) -> Result<()> {
    // A full clone usually contains the commit already; only unadvertised
    // commits need an explicit fetch.
    let commit = format!("{}^{{commit}}", hash);
    if run_git(&["cat-file", "-e", commit.as_str()], Some(repo_dir), url, timeout).is_err() {
        run_git(&["fetch", "--quiet", "origin", hash], Some(repo_dir), url, timeout)?;
    }
    run_git(&["checkout", "--quiet", hash], Some(repo_dir), url, timeout)?;
    Ok(())
}

/// Remove the `.git` directory from a checkout.
pub fn strip_vcs_metadata(repo_dir: &Path) -> Result<()> {
    match fs::remove_dir_all(repo_dir.join(".git")) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Run `git <args>` and return its stdout.
///
/// With a timeout, the child is killed once the deadline passes and the
/// call fails with [`Error::GitCommand`].
fn run_git(
    args: &[&str],
    cwd: Option<&Path>,
    url: &str,
    timeout: Option<Duration>,
) -> Result<String> {
    let command_line = args.join(" ");
    let git_error = |stderr: String| Error::GitCommand {
        command: command_line.clone(),
        url: url.to_string(),
        stderr,
    };

    let mut command = Command::new("git");
    command
        .args(args)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    log::debug!("Running git {}", command_line);
    let mut child = command.spawn().map_err(|e| git_error(e.to_string()))?;
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let status =
        wait_with_deadline(&mut child, timeout).map_err(|e| git_error(e.to_string()))?;
    let Some(status) = status else {
        // Grandchildren may still hold the pipes, so the readers are not joined.
        return Err(git_error(format!(
            "timed out after {}s",
            timeout.unwrap_or_default().as_secs()
        )));
    };

    let stdout = stdout.map(collect).unwrap_or_default();
    let stderr = stderr.map(collect).unwrap_or_default();
    if !status.success() {
        return Err(git_error(stderr.trim().to_string()));
    }
    Ok(stdout)
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn collect(handle: JoinHandle<String>) -> String {
    handle.join().unwrap_or_default()
}

/// Wait for `child`; `Ok(None)` means it was killed at the deadline.
fn wait_with_deadline(
    child: &mut Child,
    timeout: Option<Duration>,
) -> io::Result<Option<ExitStatus>> {
    let Some(timeout) = timeout else {
        return child.wait().map(Some);
    };

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            child.kill()?;
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}
