//! GitHub release host client.
//!
//! `ReleaseHost` is the seam the release pipeline talks to; `GitHubClient`
//! implements it against the GitHub REST API with `reqwest::blocking`.
//! Tests substitute an in-memory host.

use anyhow::{Context, Result};
use reqwest::Url;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Production GitHub API base URL.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// User-Agent header sent with GitHub API requests. GitHub rejects requests
/// without one.
const USER_AGENT: &str = concat!("release-on-tag/", env!("CARGO_PKG_VERSION"));

/// Request timeout for metadata calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Data model
// ---------------------------------------------------------------------------

/// Repository metadata returned by `GET /repos/{owner}/{repo}`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Repository {
    /// `owner/name`.
    pub full_name: String,
}

/// A tag from `GET /repos/{owner}/{repo}/tags`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
}

/// A release as returned by `GET /repos/{owner}/{repo}/releases/tags/{tag}`.
///
/// Uses `#[serde(default)]` on fields the pipeline can live without so schema
/// additions or sparse test payloads do not fail deserialization.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Release {
    #[serde(default)]
    pub id: u64,

    /// The git tag for this release (e.g., "v0.20.0").
    pub tag_name: String,

    /// RFC 6570 template, e.g.
    /// `https://uploads.github.com/repos/o/r/releases/1/assets{?name,label}`.
    pub upload_url: String,

    /// Assets already attached to the release.
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// A single downloadable asset attached to a GitHub release.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ReleaseAsset {
    /// Filename of the asset (e.g., "LBRY-0.20.0-Windows.zip").
    pub name: String,

    /// Public download URL for the asset.
    #[serde(default)]
    pub browser_download_url: String,
}

// ---------------------------------------------------------------------------
// ReleaseHost
// ---------------------------------------------------------------------------

/// The operations the release pipeline needs from a source-forge host.
pub trait ReleaseHost {
    /// Resolve a repository by `owner/name`.
    fn repository(&self, name: &str) -> Result<Repository>;

    /// The first page of tags for `repo`. Later pages are never fetched.
    fn first_tag_page(&self, repo: &str) -> Result<Vec<Tag>>;

    /// The release for `tag` in `repo`. An error if there is none.
    fn release_by_tag(&self, repo: &str, tag: &str) -> Result<Release>;
}

/// Whether `tag` is on the first page of `repo`'s tags.
///
/// Tags beyond the first page are invisible to this check.
pub fn has_tag(host: &dyn ReleaseHost, repo: &str, tag: &str) -> Result<bool> {
    let tags = host.first_tag_page(repo)?;
    Ok(tags.iter().any(|t| t.name == tag))
}

/// Fetch the release for `tag` in `repo`.
pub fn get_release(host: &dyn ReleaseHost, repo: &str, tag: &str) -> Result<Release> {
    host.release_by_tag(repo, tag)
        .with_context(|| format!("Failed to fetch release {tag} of {repo}"))
}

// ---------------------------------------------------------------------------
// GitHubClient
// ---------------------------------------------------------------------------

/// Blocking GitHub REST client authenticated with a personal access token.
pub struct GitHubClient {
    client: reqwest::blocking::Client,
    base_url: String,
    token: String,
}

impl GitHubClient {
    /// Create a new client.
    ///
    /// `base_url` is trimmed and stripped of trailing slashes; endpoint
    /// segments are appended to its path.
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// Append `segments` to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .with_context(|| format!("Invalid GitHub API URL: {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|()| anyhow::anyhow!("GitHub API URL has no path: {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `/repos/{owner}/{name}` followed by `rest`.
    fn repo_endpoint(&self, repo: &str, rest: &[&str]) -> Result<Url> {
        let mut segments = vec!["repos"];
        segments.extend(repo.split('/'));
        segments.extend_from_slice(rest);
        self.endpoint(&segments)
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url, what: &str) -> Result<T> {
        let resp = self
            .client
            .get(url.clone())
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .send()
            .with_context(|| format!("failed to connect to GitHub API at {url}"))?;

        let body = map_http_error(resp, what)?;
        serde_json::from_str(&body).with_context(|| format!("failed to parse {what} response"))
    }
}

impl ReleaseHost for GitHubClient {
    fn repository(&self, name: &str) -> Result<Repository> {
        self.get_json(self.repo_endpoint(name, &[])?, &format!("repository {name}"))
    }

    fn first_tag_page(&self, repo: &str) -> Result<Vec<Tag>> {
        self.get_json(self.repo_endpoint(repo, &["tags"])?, &format!("tags of {repo}"))
    }

    fn release_by_tag(&self, repo: &str, tag: &str) -> Result<Release> {
        self.get_json(
            self.repo_endpoint(repo, &["releases", "tags", tag])?,
            &format!("release {tag} of {repo}"),
        )
    }
}

// ---------------------------------------------------------------------------
// HTTP error mapping
// ---------------------------------------------------------------------------

/// Read a response body, or map non-success statuses to readable errors.
fn map_http_error(resp: reqwest::blocking::Response, what: &str) -> Result<String> {
    let status = resp.status();
    let body = resp.text().unwrap_or_default();
    if status.is_success() {
        return Ok(body);
    }

    let detail = extract_error_message(&body);
    match status.as_u16() {
        401 => anyhow::bail!("GitHub rejected the token (HTTP 401) for {what}: {detail}"),
        403 => anyhow::bail!("GitHub denied access (HTTP 403) to {what}: {detail}"),
        404 => anyhow::bail!("Not found on GitHub: {what}: {detail}"),
        500..=599 => anyhow::bail!("GitHub server error (HTTP {status}) for {what}: {detail}"),
        _ => anyhow::bail!("Unexpected response (HTTP {status}) for {what}: {detail}"),
    }
}

/// Extract GitHub's `message` field from a JSON error body, falling back to
/// the raw body (truncated).
fn extract_error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body)
        && let Some(msg) = value.get("message").and_then(|m| m.as_str())
    {
        return msg.to_string();
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "no details provided".to_string();
    }
    if trimmed.chars().count() > 200 {
        let head: String = trimmed.chars().take(200).collect();
        format!("{head}...")
    } else {
        trimmed.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
