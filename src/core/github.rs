//! CI artifact retrieval from GitHub Actions.
//!
//! The pipeline only sees [`ArtifactSource`]; [`GitHubClient`] is the
//! production implementation over the REST API.

use std::fs::File;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_TOKEN_ENV: &str = "GITHUB_TOKEN";
pub const DEFAULT_ARTIFACT_NAME: &str = "tt_submission";

/// Owner and repository parsed from a configured locator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoLocator {
    pub owner: String,
    pub repo: String,
}

impl RepoLocator {
    /// Accepts `https://github.com/<owner>/<repo>[.git][/...]` or `<owner>/<repo>`.
    pub fn parse(locator: &str) -> Result<Self> {
        static URL: OnceLock<Regex> = OnceLock::new();
        static SHORT: OnceLock<Regex> = OnceLock::new();
        let url = URL.get_or_init(|| {
            Regex::new(r"^https?://(?:www\.)?github\.com/([^/\s]+)/([^/\s]+)")
                .expect("GitHub URL pattern is valid")
        });
        let short = SHORT.get_or_init(|| {
            Regex::new(r"^([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+)$")
                .expect("owner/repo pattern is valid")
        });

        let trimmed = locator.trim();
        let caps = url
            .captures(trimmed)
            .or_else(|| short.captures(trimmed))
            .ok_or_else(|| {
                Error::config_invalid_value(
                    "project.micro_tiles",
                    Some(locator.to_string()),
                    "not a GitHub repository URL",
                )
                .with_hint("Use https://github.com/<owner>/<repo> or <owner>/<repo>")
            })?;

        let owner = caps[1].to_string();
        let repo = caps[2].trim_end_matches(".git").to_string();
        if repo.is_empty() {
            return Err(Error::config_invalid_value(
                "project.micro_tiles",
                Some(locator.to_string()),
                "repository name is empty",
            ));
        }

        Ok(Self { owner, repo })
    }

    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// A downloaded artifact archive.
#[derive(Debug, Clone, Serialize)]
pub struct FetchedArtifact {
    pub id: u64,
    pub name: String,
    pub run_id: u64,
    pub bytes: u64,
}

/// Anything that can place a repository's submission archive at a local path.
pub trait ArtifactSource {
    fn fetch(
        &self,
        locator: &RepoLocator,
        artifact_name: &str,
        dest: &Path,
    ) -> Result<FetchedArtifact>;
}

#[derive(Debug, Deserialize)]
struct WorkflowRuns {
    #[serde(default)]
    workflow_runs: Vec<WorkflowRun>,
}

#[derive(Debug, Deserialize)]
struct WorkflowRun {
    id: u64,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Artifacts {
    #[serde(default)]
    artifacts: Vec<Artifact>,
}

#[derive(Debug, Deserialize)]
struct Artifact {
    id: u64,
    name: String,
    archive_download_url: String,
    #[serde(default)]
    expired: bool,
}

/// Blocking GitHub REST client.
pub struct GitHubClient {
    client: Client,
    api_url: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(api_url: &str, token: Option<String>) -> Result<Self> {
        // API calls set their own timeout; downloads run unbounded.
        let client = Client::builder()
            .user_agent(format!("microtiles/{}", VERSION))
            .timeout(None::<Duration>)
            .build()
            .map_err(|e| Error::internal_io(e.to_string(), Some("create HTTP client".to_string())))?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Build a client with the token read from `token_env`.
    pub fn from_env(api_url: &str, token_env: &str) -> Result<Self> {
        let token = std::env::var(token_env).ok().filter(|t| !t.trim().is_empty());
        if token.is_none() {
            log_status!(
                "fetch",
                "Warning: {} is not set; artifact downloads require authentication",
                token_env
            );
        }
        Self::new(api_url, token)
    }

    fn get(&self, url: &str) -> RequestBuilder {
        let request = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn send(&self, url: &str, locator: &RepoLocator, step: &str) -> Result<Response> {
        let response = self
            .get(url)
            .timeout(Duration::from_secs(30))
            .send()
            .map_err(|e| {
                Error::retrieval_failed(locator.slug(), step, None, Some(e.to_string()))
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            return Err(Error::retrieval_failed(
                locator.slug(),
                step,
                Some(status),
                Some(body.chars().take(500).collect()),
            ));
        }

        Ok(response)
    }

    fn list_runs(&self, locator: &RepoLocator) -> Result<Vec<WorkflowRun>> {
        let url = format!(
            "{}/repos/{}/{}/actions/runs",
            self.api_url, locator.owner, locator.repo
        );
        let runs: WorkflowRuns = self
            .send(&url, locator, "list workflow runs")?
            .json()
            .map_err(|e| {
                Error::internal_json(e.to_string(), Some("parse workflow runs".to_string()))
            })?;
        Ok(runs.workflow_runs)
    }

    fn list_artifacts(&self, locator: &RepoLocator, run_id: u64) -> Result<Vec<Artifact>> {
        let url = format!(
            "{}/repos/{}/{}/actions/runs/{}/artifacts",
            self.api_url, locator.owner, locator.repo, run_id
        );
        let artifacts: Artifacts = self
            .send(&url, locator, "list run artifacts")?
            .json()
            .map_err(|e| {
                Error::internal_json(e.to_string(), Some("parse run artifacts".to_string()))
            })?;
        Ok(artifacts.artifacts)
    }

    fn download(&self, locator: &RepoLocator, artifact: &Artifact, dest: &Path) -> Result<u64> {
        let mut response = self
            .get(&artifact.archive_download_url)
            .send()
            .map_err(|e| {
                Error::retrieval_failed(locator.slug(), "download artifact", None, Some(e.to_string()))
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            return Err(Error::retrieval_failed(
                locator.slug(),
                "download artifact",
                Some(status),
                Some(body.chars().take(500).collect()),
            ));
        }

        let mut file = File::create(dest).map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("create {}", dest.display())))
        })?;
        response.copy_to(&mut file).map_err(|e| {
            Error::retrieval_failed(locator.slug(), "download artifact", None, Some(e.to_string()))
        })
    }
}

impl ArtifactSource for GitHubClient {
    fn fetch(
        &self,
        locator: &RepoLocator,
        artifact_name: &str,
        dest: &Path,
    ) -> Result<FetchedArtifact> {
        let runs = self.list_runs(locator)?;
        if runs.is_empty() {
            return Err(Error::retrieval_not_found(locator.slug(), "workflow runs"));
        }

        // Runs come back newest first.
        for run in runs
            .iter()
            .filter(|r| r.status.as_deref().map_or(true, |s| s == "completed"))
        {
            let artifacts = match self.list_artifacts(locator, run.id) {
                Ok(artifacts) => artifacts,
                Err(err) => {
                    log_status!("fetch", "Skipping run {}: {}", run.id, err);
                    continue;
                }
            };

            let Some(artifact) = artifacts
                .iter()
                .find(|a| a.name == artifact_name && !a.expired)
            else {
                continue;
            };

            log_status!(
                "fetch",
                "Found artifact: {} (ID: {}) in run {}",
                artifact.name,
                artifact.id,
                run.id
            );
            let bytes = self.download(locator, artifact, dest)?;
            log_status!("fetch", "Downloaded artifact to {}", dest.display());

            return Ok(FetchedArtifact {
                id: artifact.id,
                name: artifact.name.clone(),
                run_id: run.id,
                bytes,
            });
        }

        Err(Error::retrieval_not_found(
            locator.slug(),
            format!("'{}' artifact", artifact_name),
        ))
    }
}
