//! Git helpers.
//!
//! All functions shell out to `git` via `std::process::Command`.

use anyhow::{Context, Result};
use std::path::Path;
use std::process::Command;

/// Run `git describe --exact-match HEAD` and return the trimmed output.
///
/// Returns `Ok(None)` when git exits non-zero (HEAD is not exactly on a tag,
/// or the directory is not a repository). Failing to spawn git is an error.
fn describe_exact_match(cmd: &mut Command) -> Result<Option<String>> {
    let output = cmd
        .args(["describe", "--exact-match", "HEAD"])
        .output()
        .context("failed to execute git describe")?;

    if !output.status.success() {
        return Ok(None);
    }

    let stdout =
        String::from_utf8(output.stdout).context("git describe output was not valid UTF-8")?;
    let tag = stdout.trim();
    if tag.is_empty() {
        return Ok(None);
    }
    Ok(Some(tag.to_string()))
}

/// The tag HEAD points at in the current directory, if any.
pub fn current_tag() -> Result<Option<String>> {
    current_tag_in(Path::new("."))
}

/// The tag HEAD points at in the repository at `dir`, if any.
pub fn current_tag_in(dir: &Path) -> Result<Option<String>> {
    let mut cmd = Command::new("git");
    cmd.arg("-C").arg(dir);
    describe_exact_match(&mut cmd)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
