//! Release asset upload.
//!
//! The binary POST goes through an `AssetTransport`. The default transport
//! shells out to `curl`, which has proven more reliable than in-process HTTPS
//! for large installers; `HttpTransport` performs the same request with
//! `reqwest::blocking` and can be selected in config.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Command;
use url::form_urlencoded;

use crate::github::Release;
use crate::output::Reporter;

/// Content type sent with every asset upload.
const ASSET_CONTENT_TYPE: &str = "application/zip";

/// Result of an upload attempt that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// An asset with the same name is already attached to the release.
    Skipped { name: String },
    /// GitHub accepted the asset.
    Uploaded { name: String, download_url: String },
}

impl UploadOutcome {
    pub fn name(&self) -> &str {
        match self {
            UploadOutcome::Skipped { name } | UploadOutcome::Uploaded { name, .. } => name,
        }
    }
}

// ---------------------------------------------------------------------------
// Transports
// ---------------------------------------------------------------------------

/// Which transport performs the binary POST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// External `curl` process.
    #[default]
    Curl,
    /// In-process `reqwest` client.
    Http,
}

/// Performs an authenticated binary POST of `file` to `url` and returns the
/// raw response text.
pub trait AssetTransport {
    fn post(&self, url: &str, file: &Path, token: &str) -> Result<String>;
}

/// Uploads by running `curl` as a subprocess.
#[derive(Debug, Clone)]
pub struct CurlTransport {
    program: String,
}

impl CurlTransport {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Arguments passed to curl, token included.
    pub fn args(url: &str, file: &Path, token: &str) -> Vec<String> {
        vec![
            "-sS".to_string(),
            "-X".to_string(),
            "POST".to_string(),
            "-u".to_string(),
            format!(":{token}"),
            "--header".to_string(),
            format!("Content-Type:{ASSET_CONTENT_TYPE}"),
            "--data-binary".to_string(),
            format!("@{}", file.display()),
            url.to_string(),
        ]
    }
}

impl AssetTransport for CurlTransport {
    fn post(&self, url: &str, file: &Path, token: &str) -> Result<String> {
        let output = Command::new(&self.program)
            .args(Self::args(url, file, token))
            .output()
            .with_context(|| format!("failed to execute {}", self.program))?;

        // stderr is folded in so a curl failure message reaches the error.
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            bail!(
                "{} upload of {} failed (exit {}): {}",
                self.program,
                file.display(),
                output.status,
                text.trim()
            );
        }
        Ok(text)
    }
}

/// Uploads with an in-process blocking HTTP client.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        // Large installers can take minutes; no overall timeout.
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("release-on-tag/", env!("CARGO_PKG_VERSION")))
            .timeout(None)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

impl AssetTransport for HttpTransport {
    fn post(&self, url: &str, file: &Path, token: &str) -> Result<String> {
        let body = std::fs::File::open(file)
            .with_context(|| format!("Failed to open asset: {}", file.display()))?;
        let resp = self
            .client
            .post(url)
            .basic_auth("", Some(token))
            .header(reqwest::header::CONTENT_TYPE, ASSET_CONTENT_TYPE)
            .body(reqwest::blocking::Body::from(body))
            .send()
            .with_context(|| format!("failed to upload {} to {url}", file.display()))?;

        // Error payloads are JSON too; the caller decides what they mean.
        resp.text().context("Failed to read upload response body")
    }
}

/// Build the transport selected in config.
pub fn transport_for(kind: TransportKind, curl_program: &str) -> Result<Box<dyn AssetTransport>> {
    Ok(match kind {
        TransportKind::Curl => Box::new(CurlTransport::new(curl_program)),
        TransportKind::Http => Box::new(HttpTransport::new()?),
    })
}

// ---------------------------------------------------------------------------
// Upload flow
// ---------------------------------------------------------------------------

/// Whether `release` already carries an asset named exactly `basename`.
pub fn already_uploaded(release: &Release, basename: &str) -> bool {
    release.assets.iter().any(|a| a.name == basename)
}

/// Expand a GitHub `upload_url` template for the asset `name`.
///
/// `https://uploads.github.com/repos/o/r/releases/1/assets{?name,label}`
/// becomes `.../assets?name=<name>`; `label` is left out. Spaces in the name
/// are sent as `%20`, not the form-encoded `+`.
pub fn expand_upload_url(template: &str, name: &str) -> Result<String> {
    let base = template.split('{').next().unwrap_or(template);
    let mut url = reqwest::Url::parse(base)
        .with_context(|| format!("Invalid upload URL template: {template}"))?;
    let encoded = form_urlencoded::byte_serialize(name.as_bytes())
        .collect::<String>()
        .replace('+', "%20");
    url.set_query(Some(&format!("name={encoded}")));
    Ok(url.to_string())
}

/// Interpret the JSON returned by an upload.
///
/// An `errors` key is a failure carrying the raw response. Otherwise the
/// response must name the asset's `browser_download_url`.
pub fn interpret_response(raw: &str) -> Result<String> {
    let value: serde_json::Value = serde_json::from_str(raw.trim())
        .with_context(|| format!("Upload response is not JSON: {}", raw.trim()))?;

    if value.get("errors").is_some() {
        bail!("Upload rejected: {}", raw.trim());
    }

    value
        .get("browser_download_url")
        .and_then(|u| u.as_str())
        .map(ToString::to_string)
        .ok_or_else(|| anyhow::anyhow!("Upload response has no browser_download_url: {}", raw.trim()))
}

/// Upload `asset_path` to `release` unless an asset of that name exists.
pub fn upload_asset(
    release: &Release,
    asset_path: &Path,
    token: &str,
    transport: &dyn AssetTransport,
    log: &mut Reporter<'_>,
) -> Result<UploadOutcome> {
    let name = asset_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Asset path has no file name: {}", asset_path.display()))?
        .to_string();

    if already_uploaded(release, &name) {
        log.skipped(&name, &release.tag_name);
        return Ok(UploadOutcome::Skipped { name });
    }

    let url = expand_upload_url(&release.upload_url, &name)?;
    log.uploading(&name, &release.tag_name);
    log.debug(&format!("POST {url}"));

    let raw = transport.post(&url, asset_path, token)?;
    let download_url = interpret_response(&raw)
        .with_context(|| format!("Failed to upload {name} to {}", release.tag_name))?;

    log.uploaded(&download_url);
    Ok(UploadOutcome::Uploaded { name, download_url })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
