// src/context.rs

//! Facts about the triggering event and the repository
//!
//! The pipeline never looks at the environment directly. Everything it needs
//! about the current run is captured once in a [`Context`] and a [`RepoInfo`],
//! both built here from the CI event (ref, sha, event name) and, when one is
//! available, the JSON event payload written by the CI runner.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// How the current ref classifies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind<'a> {
    /// `refs/heads/<name>`
    Branch(&'a str),
    /// `refs/tags/<name>`
    Tag(&'a str),
    /// `refs/pull/<number>/merge` or `refs/pull/<number>/head`
    PullRequest(&'a str),
    Other,
}

impl<'a> RefKind<'a> {
    /// Classify a fully qualified git ref
    pub fn classify(git_ref: &'a str) -> Self {
        if let Some(branch) = git_ref.strip_prefix("refs/heads/") {
            Self::Branch(branch)
        } else if let Some(tag) = git_ref.strip_prefix("refs/tags/") {
            Self::Tag(tag)
        } else if let Some(pr) = git_ref.strip_prefix("refs/pull/") {
            let number = pr
                .strip_suffix("/merge")
                .or_else(|| pr.strip_suffix("/head"))
                .unwrap_or(pr);
            Self::PullRequest(number)
        } else {
            Self::Other
        }
    }
}

/// The triggering event, as seen by the resolver
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    /// Fully qualified ref, e.g. `refs/heads/main`
    pub git_ref: String,
    /// Full commit SHA
    pub sha: String,
    pub commit_date: DateTime<Utc>,
    /// Event name as reported by the CI, e.g. `push`, `schedule`, `pull_request`
    pub event_name: String,
    /// Base branch of a pull request or of a pushed tag, if known
    pub base_ref: String,
    pub default_branch: String,
}

impl Context {
    pub fn ref_kind(&self) -> RefKind<'_> {
        RefKind::classify(&self.git_ref)
    }

    /// Branch name when the event is a branch push
    pub fn branch(&self) -> Option<&str> {
        match self.ref_kind() {
            RefKind::Branch(name) => Some(name),
            _ => None,
        }
    }

    /// Tag name when the event is a tag push
    pub fn tag(&self) -> Option<&str> {
        match self.ref_kind() {
            RefKind::Tag(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_schedule(&self) -> bool {
        self.event_name.contains("schedule")
    }

    /// First seven characters of the commit SHA
    pub fn short_sha(&self) -> &str {
        match self.sha.char_indices().nth(7) {
            Some((idx, _)) => &self.sha[..idx],
            None => &self.sha,
        }
    }

    /// Whether the event runs against the repository's default branch
    ///
    /// Some events (`schedule`, `create`, `issues`, `discussion`) always run
    /// on the last commit of the default branch.
    pub fn is_default_branch(&self) -> bool {
        let branch = self
            .git_ref
            .strip_prefix("refs/heads/")
            .unwrap_or(&self.git_ref);
        if branch.is_empty() {
            return false;
        }
        if !self.default_branch.is_empty() && branch == self.default_branch {
            return true;
        }
        ["create", "discussion", "issues", "schedule"]
            .iter()
            .any(|event| self.event_name.contains(event))
    }
}

/// Repository metadata used for the OCI labels
///
/// Missing fields are empty strings rather than errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoInfo {
    pub name: String,
    pub description: String,
    pub html_url: String,
    pub default_branch: String,
    pub license_spdx_id: String,
}

impl RepoInfo {
    /// Parse a repository object as returned by the hosting API
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawRepository = serde_json::from_str(json)?;
        Ok(raw.into())
    }

    /// Minimal repository info derived from an `owner/name` slug
    pub fn from_slug(slug: &str, server_url: &str) -> Self {
        let name = slug.rsplit('/').next().unwrap_or(slug).to_string();
        let html_url = if slug.is_empty() {
            String::new()
        } else {
            format!("{}/{}", server_url.trim_end_matches('/'), slug)
        };
        Self {
            name,
            html_url,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawLicense {
    spdx_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawRepository {
    name: Option<String>,
    description: Option<String>,
    html_url: Option<String>,
    default_branch: Option<String>,
    license: Option<RawLicense>,
}

impl From<RawRepository> for RepoInfo {
    fn from(raw: RawRepository) -> Self {
        Self {
            name: raw.name.unwrap_or_default(),
            description: raw.description.unwrap_or_default(),
            html_url: raw.html_url.unwrap_or_default(),
            default_branch: raw.default_branch.unwrap_or_default(),
            license_spdx_id: raw.license.and_then(|l| l.spdx_id).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct HeadCommit {
    timestamp: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct BranchRef {
    #[serde(rename = "ref")]
    git_ref: Option<String>,
    sha: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PullRequest {
    base: Option<BranchRef>,
    head: Option<BranchRef>,
}

/// The subset of the CI event payload the pipeline cares about
#[derive(Debug, Default, Deserialize)]
pub struct EventPayload {
    repository: Option<RawRepository>,
    head_commit: Option<HeadCommit>,
    base_ref: Option<String>,
    pull_request: Option<PullRequest>,
}

impl EventPayload {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load the payload file written by the CI runner
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading event payload from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Repository metadata embedded in the payload, if any
    pub fn repo_info(&self) -> Option<RepoInfo> {
        self.repository.clone().map(RepoInfo::from)
    }

    fn pr_head_sha(&self) -> Option<&str> {
        self.pull_request
            .as_ref()?
            .head
            .as_ref()?
            .sha
            .as_deref()
            .filter(|sha| !sha.is_empty())
    }
}

/// Raw event facts before the payload is folded in
#[derive(Debug, Clone, Default)]
pub struct EventInputs {
    pub git_ref: String,
    pub sha: String,
    pub event_name: String,
    /// Use the pull request head commit instead of the merge commit
    pub use_pr_head_sha: bool,
}

impl Context {
    /// Build the context for a run from the event facts and its payload
    ///
    /// `now` stands in for the commit date when the payload has none.
    pub fn from_event(
        inputs: &EventInputs,
        payload: &EventPayload,
        repo: &RepoInfo,
        now: DateTime<Utc>,
    ) -> Self {
        let mut sha = inputs.sha.clone();
        let is_pr = matches!(
            RefKind::classify(&inputs.git_ref),
            RefKind::PullRequest(_)
        );
        if inputs.use_pr_head_sha
            && is_pr
            && let Some(head) = payload.pr_head_sha()
        {
            debug!("Using pull request head sha {}", head);
            sha = head.to_string();
        }

        let base_ref = match RefKind::classify(&inputs.git_ref) {
            RefKind::Tag(_) => payload
                .base_ref
                .as_deref()
                .map(|r| r.strip_prefix("refs/heads/").unwrap_or(r).to_string()),
            RefKind::PullRequest(_) => payload
                .pull_request
                .as_ref()
                .and_then(|pr| pr.base.as_ref())
                .and_then(|base| base.git_ref.clone()),
            _ => None,
        }
        .unwrap_or_default();

        let commit_date = payload
            .head_commit
            .as_ref()
            .and_then(|c| c.timestamp.as_deref())
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&Utc))
            .unwrap_or(now);

        let default_branch = payload
            .repository
            .as_ref()
            .and_then(|r| r.default_branch.clone())
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| repo.default_branch.clone());

        Self {
            git_ref: inputs.git_ref.clone(),
            sha,
            commit_date,
            event_name: inputs.event_name.clone(),
            base_ref,
            default_branch,
        }
    }
}
