// src/version/mod.rs

//! Version values produced by the resolver and the numbering dialects used to
//! read them from git tags
//!
//! Two dialects are supported:
//! - [`VersionScheme::Semver`]: semantic versions (`v1.2.3`, `1.0.0-rc.1`)
//! - [`VersionScheme::Pep440`]: Python-style versions (`1.0rc1`, `2!1.0.post2`)
//!
//! Both produce a [`ParsedVersion`], which exposes the `{{version}}`,
//! `{{major}}`, `{{minor}}`, `{{patch}}` and `{{raw}}` pattern fields.

pub mod pep440;

use crate::error::Result;
use crate::template::{Expression, Scope};

/// Final version after flavor application
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Version {
    /// Highest-priority value; `None` when no rule applied
    pub main: Option<String>,
    pub partial: Vec<String>,
    pub latest: bool,
}

/// A value emitted by one rule, before flavor affixes are applied
///
/// `prefix`/`suffix` are set when the rule carries its own affix, which then
/// takes the place of the flavor's.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Candidate {
    pub value: String,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
}

impl Candidate {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }
}

/// Resolver output: candidates in evaluation order plus the latest signal
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawVersion {
    pub main: Option<Candidate>,
    pub partial: Vec<Candidate>,
    /// Latest decision of the first candidate that made one; `None` if no
    /// candidate had an opinion
    pub latest: Option<bool>,
}

impl RawVersion {
    /// Record a candidate; the first one becomes `main`
    ///
    /// `latest` is `Some` when the rule decides whether this is the latest
    /// release. The first decision sticks, so an unstable version read by a
    /// higher-priority rule is not turned into `latest` by a later one.
    /// Empty values are ignored and carry no latest signal.
    pub fn push(&mut self, candidate: Candidate, latest: Option<bool>) {
        if candidate.value.is_empty() {
            return;
        }
        match &self.main {
            None => self.main = Some(candidate),
            Some(main) if *main == candidate => {}
            Some(_) => self.partial.push(candidate),
        }
        if self.latest.is_none() {
            self.latest = latest;
        }
    }

    /// Whether the resolved rules mark this as the latest release
    pub fn is_latest(&self) -> bool {
        self.latest == Some(true)
    }

    pub fn is_empty(&self) -> bool {
        self.main.is_none()
    }
}

/// Version numbering dialect of a `semver` or `pep440` rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionScheme {
    Semver,
    Pep440,
}

impl VersionScheme {
    /// Parse `raw` in this dialect, `None` if it is not a valid version
    pub fn parse(&self, raw: &str) -> Option<ParsedVersion> {
        match self {
            Self::Semver => parse_semver(raw),
            Self::Pep440 => pep440::Pep440Version::parse(raw).map(|v| v.into_parsed(raw)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Semver => "semver",
            Self::Pep440 => "pep440",
        }
    }
}

/// A version read from a git tag or an explicit value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedVersion {
    /// The input exactly as given
    pub raw: String,
    /// Normalized version string
    pub version: String,
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    /// Pre-release (and for PEP 440, post- or dev-release)
    pub unstable: bool,
}

impl Scope for ParsedVersion {
    fn resolve(&self, expr: &Expression, _template: &str) -> Result<String> {
        let value = match expr.name.as_str() {
            "raw" => self.raw.clone(),
            "version" => self.version.clone(),
            "major" => self.major.to_string(),
            "minor" => self.minor.to_string(),
            "patch" => self.patch.to_string(),
            _ => String::new(),
        };
        Ok(value)
    }
}

/// Parse a semantic version, tolerating a leading `v` or `=`
///
/// Examples:
/// - "v1.2.3" → 1.2.3
/// - "1.0.0-rc.1" → 1.0.0-rc.1 (unstable)
/// - "1.2.3+build.5" → 1.2.3 (build metadata dropped)
/// - "1.2" → None
fn parse_semver(raw: &str) -> Option<ParsedVersion> {
    let trimmed = raw.trim();
    let cleaned = trimmed.strip_prefix('=').unwrap_or(trimmed).trim_start();
    let cleaned = cleaned
        .strip_prefix(['v', 'V'])
        .unwrap_or(cleaned)
        .trim_start();
    let parsed = semver::Version::parse(cleaned).ok()?;

    let mut version = format!("{}.{}.{}", parsed.major, parsed.minor, parsed.patch);
    if !parsed.pre.is_empty() {
        version.push('-');
        version.push_str(parsed.pre.as_str());
    }

    Some(ParsedVersion {
        raw: raw.to_string(),
        version,
        major: parsed.major,
        minor: parsed.minor,
        patch: parsed.patch,
        unstable: !parsed.pre.is_empty(),
    })
}
