use anyhow::{Context, Result};
use clap::Parser;
use console::Term;
use std::io;
use std::path::PathBuf;
use std::process;

use release_on_tag::config::{self, Overrides, ReleaseConfig};
use release_on_tag::github::GitHubClient;
use release_on_tag::platform::Platform;
use release_on_tag::release::{ReleaseRun, RunReport};
use release_on_tag::upload::{self, TransportKind};
use release_on_tag::git;
use release_on_tag::output::Reporter;

/// Upload platform build artifacts to the GitHub release matching the tag
/// HEAD is on.
///
/// Does nothing when HEAD is not exactly on a tag. Requires GH_TOKEN.
#[derive(Parser, Debug)]
#[command(
    name = "release-on-tag",
    version,
    about,
    after_help = "Examples:\n  GH_TOKEN=... release-on-tag\n  GH_TOKEN=... release-on-tag --transport http -v\n  GH_TOKEN=... release-on-tag --workdir ../lbry-app --app-repo me/lbry-app"
)]
struct Cli {
    /// Directory holding the checkout and its build output.
    #[arg(long, default_value = ".")]
    workdir: PathBuf,

    /// Config file (default: release-on-tag.toml in the workdir, if present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// GitHub API base URL.
    #[arg(long)]
    api_url: Option<String>,

    /// Repository receiving the installer, as owner/name.
    #[arg(long)]
    app_repo: Option<String>,

    /// Repository receiving the daemon binary, as owner/name.
    #[arg(long)]
    daemon_repo: Option<String>,

    /// How assets are uploaded.
    #[arg(long, value_enum)]
    transport: Option<TransportKind>,

    /// curl executable used by the curl transport.
    #[arg(long = "curl")]
    curl_program: Option<String>,

    /// Print debug detail (URLs, paths, digests).
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            api_url: self.api_url.clone(),
            app_repo: self.app_repo.clone(),
            daemon_repo: self.daemon_repo.clone(),
            transport: self.transport,
            curl_program: self.curl_program.clone(),
        }
    }
}

fn run(cli: Cli, log: &mut Reporter<'_>) -> Result<()> {
    let token = config::github_token()?;
    let settings = ReleaseConfig::load(&cli.workdir, cli.config.as_deref())?
        .resolve(&cli.overrides())?;
    if settings.is_non_https() {
        log.warning(&format!(
            "API URL {} is not HTTPS; the token will be sent unencrypted",
            settings.api_url
        ));
    }

    // Artifact globs and git both work relative to the checkout.
    std::env::set_current_dir(&cli.workdir)
        .with_context(|| format!("Failed to enter {}", cli.workdir.display()))?;
    let tag = git::current_tag().context("Failed to detect the current tag")?;

    let host = GitHubClient::new(&settings.api_url, &token)?;
    let transport = upload::transport_for(settings.transport, &settings.curl_program)?;
    let platform = Platform::current();
    log.debug(&format!(
        "platform {platform} ({}), transport {:?}",
        platform.label(),
        settings.transport
    ));

    let pipeline = ReleaseRun {
        host: &host,
        transport: transport.as_ref(),
        platform,
        workdir: PathBuf::from("."),
        token,
        app_repo: settings.app_repo,
        daemon_repo: settings.daemon_repo,
    };

    match pipeline.run(tag, log)? {
        RunReport::Published { tag, app, daemon } => {
            log.published(&tag, &[app.name(), daemon.name()])
        }
        RunReport::NotOnTag | RunReport::TagNotInAppRepo { .. } => {}
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    let colored = Term::stderr().is_term();
    let mut stderr = io::stderr();
    let mut log = Reporter::new(&mut stderr, colored, cli.verbose);

    if let Err(e) = run(cli, &mut log) {
        log.failure(&e);
        process::exit(1);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_without_arguments() {
        let cli = Cli::parse_from(["release-on-tag"]);
        assert_eq!(cli.workdir, PathBuf::from("."));
        assert!(cli.config.is_none());
        assert!(!cli.verbose);
        assert_eq!(cli.overrides(), Overrides::default());
    }

    #[test]
    fn cli_parses_overrides() {
        let cli = Cli::parse_from([
            "release-on-tag",
            "--workdir",
            "/src/lbry-app",
            "--api-url",
            "https://ghe.example/api/v3",
            "--app-repo",
            "me/app",
            "--daemon-repo",
            "me/daemon",
            "--transport",
            "http",
            "--curl",
            "/opt/curl",
            "-v",
        ]);
        assert_eq!(cli.workdir, PathBuf::from("/src/lbry-app"));
        assert!(cli.verbose);
        assert_eq!(
            cli.overrides(),
            Overrides {
                api_url: Some("https://ghe.example/api/v3".into()),
                app_repo: Some("me/app".into()),
                daemon_repo: Some("me/daemon".into()),
                transport: Some(TransportKind::Http),
                curl_program: Some("/opt/curl".into()),
            }
        );
    }

    #[test]
    fn cli_rejects_unknown_transport() {
        assert!(Cli::try_parse_from(["release-on-tag", "--transport", "ftp"]).is_err());
    }
}
