//! Locating build artifacts on disk.
//!
//! Paths are returned relative to the working directory so that the packaged
//! zip entry keeps the layout the build produced (e.g. `dist/LBRY-1.2.3.exe`).

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

use crate::platform::Platform;

/// Fixed location of the daemon binary, without platform suffix.
const DAEMON_BINARY: &str = "app/dist/lbrynet-daemon";

/// Find the app installer for `platform` under `workdir`.
///
/// Candidates are matched against the platform's glob pattern and sorted by
/// name; the first one wins. Unknown platforms and empty matches are errors.
pub fn locate_artifact(workdir: &Path, platform: &Platform) -> Result<PathBuf> {
    let Some(pattern) = platform.artifact_pattern() else {
        bail!("I don't know about any artifact on {platform}");
    };

    let matches = glob_relative(workdir, pattern)?;
    matches.into_iter().next().ok_or_else(|| {
        anyhow::anyhow!(
            "No artifact matching '{pattern}' found in {}",
            workdir.display()
        )
    })
}

/// Relative path of the daemon binary for `platform`.
pub fn daemon_binary(platform: &Platform) -> PathBuf {
    PathBuf::from(format!("{DAEMON_BINARY}{}", platform.exe_suffix()))
}

/// Expand a pattern whose wildcards are confined to the final path segment.
///
/// Returns matching regular files, relative to `root`, sorted by name. A
/// missing parent directory yields an empty list.
pub fn glob_relative(root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let (dir, file_pattern) = match pattern.rsplit_once('/') {
        Some((dir, file)) => (dir, file),
        None => ("", pattern),
    };
    if dir.contains(['*', '?']) {
        bail!("Wildcards are only supported in the file name: '{pattern}'");
    }

    let rel_dir = PathBuf::from(dir);
    let abs_dir = root.join(&rel_dir);
    let entries = match std::fs::read_dir(&abs_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read {}", abs_dir.display()));
        }
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read {}", abs_dir.display()))?;
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if wildcard_match(file_pattern, name) {
            names.push(name.to_string());
        }
    }

    names.sort();
    Ok(names.into_iter().map(|n| rel_dir.join(n)).collect())
}

/// Shell-style match supporting `*` (any run) and `?` (any one char).
pub fn wildcard_match(pattern: &str, name: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let n: Vec<char> = name.chars().collect();
    let (mut pi, mut ni) = (0, 0);
    // Position of the last `*` seen and the name index it was tried against.
    let mut backtrack: Option<(usize, usize)> = None;

    while ni < n.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == n[ni]) {
            pi += 1;
            ni += 1;
        } else if pi < p.len() && p[pi] == '*' {
            backtrack = Some((pi, ni));
            pi += 1;
        } else if let Some((star, matched)) = backtrack {
            pi = star + 1;
            ni = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }

    p[pi..].iter().all(|&c| c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"artifact").unwrap();
    }

    // -- wildcard_match ------------------------------------------------------

    #[test]
    fn star_matches_any_run() {
        assert!(wildcard_match("LBRY*.dmg", "LBRY_0.20.0.dmg"));
        assert!(wildcard_match("LBRY*.dmg", "LBRY.dmg"));
        assert!(!wildcard_match("LBRY*.dmg", "LBRY_0.20.0.dmg.blockmap"));
        assert!(!wildcard_match("LBRY*.dmg", "lbry.dmg"));
    }

    #[test]
    fn question_mark_matches_one_char() {
        assert!(wildcard_match("v?.zip", "v1.zip"));
        assert!(!wildcard_match("v?.zip", "v10.zip"));
    }

    #[test]
    fn star_backtracks() {
        assert!(wildcard_match("*a*b", "xxaxxab"));
        assert!(!wildcard_match("*a*b", "xxaxxa"));
    }

    // -- locate_artifact -----------------------------------------------------

    #[test]
    fn darwin_returns_first_dmg_when_several_exist() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "dist/mac/LBRY-0.2.0.dmg");
        touch(dir.path(), "dist/mac/LBRY-0.1.0.dmg");
        touch(dir.path(), "dist/mac/other.dmg");

        let found = locate_artifact(dir.path(), &Platform::MacOs).unwrap();
        assert_eq!(found, PathBuf::from("dist/mac/LBRY-0.1.0.dmg"));
    }

    #[test]
    fn linux_finds_deb() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "dist/LBRY_1.2.3_amd64.deb");
        touch(dir.path(), "dist/LBRY-1.2.3.exe");

        let found = locate_artifact(dir.path(), &Platform::Linux).unwrap();
        assert_eq!(found, PathBuf::from("dist/LBRY_1.2.3_amd64.deb"));
    }

    #[test]
    fn windows_finds_exe() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "dist/LBRY-1.2.3.exe");

        let found = locate_artifact(dir.path(), &Platform::Windows).unwrap();
        assert_eq!(found, PathBuf::from("dist/LBRY-1.2.3.exe"));
    }

    #[test]
    fn unknown_platform_is_an_error() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "dist/LBRY-1.2.3.exe");

        let err = locate_artifact(dir.path(), &Platform::from_system_name("SunOS")).unwrap_err();
        assert!(err.to_string().contains("SunOS"), "got: {err}");
    }

    #[test]
    fn no_match_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = locate_artifact(dir.path(), &Platform::Linux).unwrap_err();
        assert!(err.to_string().contains("dist/LBRY*.deb"), "got: {err}");
    }

    #[test]
    fn directories_are_not_matched() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("dist/LBRY-dir.exe")).unwrap();
        assert!(locate_artifact(dir.path(), &Platform::Windows).is_err());
    }

    // -- daemon_binary -------------------------------------------------------

    #[test]
    fn daemon_binary_is_suffixed_on_windows_only() {
        assert_eq!(
            daemon_binary(&Platform::Windows),
            PathBuf::from("app/dist/lbrynet-daemon.exe")
        );
        assert_eq!(
            daemon_binary(&Platform::Linux),
            PathBuf::from("app/dist/lbrynet-daemon")
        );
    }
}
