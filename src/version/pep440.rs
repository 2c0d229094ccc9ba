// src/version/pep440.rs

//! PEP 440 version parsing and normalization
//!
//! Accepts the permissive spellings allowed by PEP 440 and produces the
//! normalized public form:
//!
//! - "v1.0" → "1.0"
//! - "1.0RC1" → "1.0rc1"
//! - "1.0-post-2" → "1.0.post2"
//! - "1.0.0-dev" → "1.0.0.dev0"
//! - "1!2.0+Ubuntu-1" → "1!2.0+ubuntu.1"

use super::ParsedVersion;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static PEP440_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)
        ^\s*v?
        (?:(?P<epoch>[0-9]+)!)?
        (?P<release>[0-9]+(?:\.[0-9]+)*)
        (?P<pre>
            [-_.]?
            (?P<pre_l>alpha|a|beta|b|preview|pre|c|rc)
            [-_.]?
            (?P<pre_n>[0-9]+)?
        )?
        (?P<post>
            (?:-(?P<post_n1>[0-9]+))
            |
            (?:[-_.]?(?P<post_l>post|rev|r)[-_.]?(?P<post_n2>[0-9]+)?)
        )?
        (?P<dev>
            [-_.]?
            (?P<dev_l>dev)
            [-_.]?
            (?P<dev_n>[0-9]+)?
        )?
        (?:\+(?P<local>[a-z0-9]+(?:[-_.][a-z0-9]+)*))?
        \s*$",
    )
    .expect("PEP 440 pattern is valid")
});

/// Pre-release phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreRelease {
    Alpha,
    Beta,
    Rc,
}

impl PreRelease {
    fn from_label(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "a" | "alpha" => Self::Alpha,
            "b" | "beta" => Self::Beta,
            _ => Self::Rc,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Alpha => "a",
            Self::Beta => "b",
            Self::Rc => "rc",
        }
    }
}

/// A parsed PEP 440 version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pep440Version {
    pub epoch: u64,
    pub release: Vec<u64>,
    pub pre: Option<(PreRelease, u64)>,
    pub post: Option<u64>,
    pub dev: Option<u64>,
    pub local: Option<String>,
}

fn number(caps: &regex::Captures<'_>, name: &str) -> Option<u64> {
    caps.name(name).and_then(|m| m.as_str().parse::<u64>().ok())
}

impl Pep440Version {
    /// Parse a version string, `None` if it is not valid PEP 440
    pub fn parse(s: &str) -> Option<Self> {
        let caps = PEP440_RE.captures(s)?;

        let release = caps
            .name("release")?
            .as_str()
            .split('.')
            .map(|part| part.parse::<u64>().ok())
            .collect::<Option<Vec<_>>>()?;

        let pre = caps.name("pre_l").map(|label| {
            (
                PreRelease::from_label(label.as_str()),
                number(&caps, "pre_n").unwrap_or(0),
            )
        });

        let post = if caps.name("post").is_some() {
            Some(
                number(&caps, "post_n1")
                    .or_else(|| number(&caps, "post_n2"))
                    .unwrap_or(0),
            )
        } else {
            None
        };

        let dev = caps
            .name("dev_l")
            .map(|_| number(&caps, "dev_n").unwrap_or(0));

        let local = caps
            .name("local")
            .map(|m| m.as_str().to_ascii_lowercase().replace(['-', '_'], "."));

        Some(Self {
            epoch: number(&caps, "epoch").unwrap_or(0),
            release,
            pre,
            post,
            dev,
            local,
        })
    }

    pub fn major(&self) -> u64 {
        self.release.first().copied().unwrap_or(0)
    }

    pub fn minor(&self) -> u64 {
        self.release.get(1).copied().unwrap_or(0)
    }

    pub fn patch(&self) -> u64 {
        self.release.get(2).copied().unwrap_or(0)
    }

    /// Pre-, post- or dev-release; these never move the stable tags
    pub fn is_unstable(&self) -> bool {
        self.pre.is_some() || self.post.is_some() || self.dev.is_some()
    }

    pub(super) fn into_parsed(self, raw: &str) -> ParsedVersion {
        ParsedVersion {
            raw: raw.to_string(),
            version: self.to_string(),
            major: self.major(),
            minor: self.minor(),
            patch: self.patch(),
            unstable: self.is_unstable(),
        }
    }
}

impl fmt::Display for Pep440Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch > 0 {
            write!(f, "{}!", self.epoch)?;
        }
        let release: Vec<String> = self.release.iter().map(u64::to_string).collect();
        write!(f, "{}", release.join("."))?;
        if let Some((phase, n)) = self.pre {
            write!(f, "{}{}", phase.as_str(), n)?;
        }
        if let Some(n) = self.post {
            write!(f, ".post{}", n)?;
        }
        if let Some(n) = self.dev {
            write!(f, ".dev{}", n)?;
        }
        if let Some(ref local) = self.local {
            write!(f, "+{}", local)?;
        }
        Ok(())
    }
}
