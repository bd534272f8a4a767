//! The release run: detect tag, confirm it upstream, package and upload the
//! app installer and the daemon binary.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::artifact;
use crate::github::{self, ReleaseHost};
use crate::output::Reporter;
use crate::package;
use crate::platform::Platform;
use crate::upload::{self, AssetTransport, UploadOutcome};

/// How a run ended without error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunReport {
    /// HEAD is not exactly on a tag; nothing was contacted.
    NotOnTag,
    /// The tag is not on the app repository's first tag page.
    TagNotInAppRepo { tag: String },
    /// Both assets were uploaded or already present.
    Published {
        tag: String,
        app: UploadOutcome,
        daemon: UploadOutcome,
    },
}

/// Everything a run needs besides the tag.
pub struct ReleaseRun<'a> {
    pub host: &'a dyn ReleaseHost,
    pub transport: &'a dyn AssetTransport,
    pub platform: Platform,
    pub workdir: PathBuf,
    pub token: String,
    pub app_repo: String,
    pub daemon_repo: String,
}

impl ReleaseRun<'_> {
    /// Run the pipeline for `tag` (the output of tag detection), logging
    /// each step to `log`.
    pub fn run(&self, tag: Option<String>, log: &mut Reporter<'_>) -> Result<RunReport> {
        let Some(tag) = tag else {
            log.stopping("as we are not currently on a tag");
            return Ok(RunReport::NotOnTag);
        };
        log.tag_detected(&tag);

        let app = self.host.repository(&self.app_repo)?;
        let daemon = self.host.repository(&self.daemon_repo)?;

        if !github::has_tag(self.host, &app.full_name, &tag)? {
            log.stopping(&format!("tag {tag} is not in repo {}", app.full_name));
            return Ok(RunReport::TagNotInAppRepo { tag });
        }

        let installer = artifact::locate_artifact(&self.workdir, &self.platform)?;
        let app_outcome = self.publish(&app.full_name, &tag, &installer, log)?;

        let daemon_binary = artifact::daemon_binary(&self.platform);
        let daemon_outcome = self.publish(&daemon.full_name, &tag, &daemon_binary, log)?;

        Ok(RunReport::Published {
            tag,
            app: app_outcome,
            daemon: daemon_outcome,
        })
    }

    /// Package `artifact` (relative to the workdir) and upload it to the
    /// `tag` release of `repo`.
    fn publish(
        &self,
        repo: &str,
        tag: &str,
        artifact: &Path,
        log: &mut Reporter<'_>,
    ) -> Result<UploadOutcome> {
        let release = github::get_release(self.host, repo, tag)?;

        log.debug(&format!("Packaging {}", artifact.display()));
        let asset = package::package(&self.workdir, artifact, self.platform.label())
            .with_context(|| format!("Failed to package {}", artifact.display()))?;
        log.debug(&format!("{} sha256 {}", asset.file_name(), asset.sha256));

        upload::upload_asset(
            &release,
            &self.workdir.join(&asset.path),
            &self.token,
            self.transport,
            log,
        )
    }
}
