// src/flavor/mod.rs
//! Flavor policy parsing and application
//!
//! A flavor decides how resolved versions are dressed before they become
//! image tags: a common prefix and suffix, whether a `latest` tag is emitted,
//! and whether the affixes also apply to that `latest` tag.
//!
//! Syntax is a list of comma-delimited directives:
//!
//! ```text
//! latest=auto
//! prefix=dev-,onlatest=true
//! suffix=-alpine
//! labelprefix=com.example.
//! ```
//!
//! `onlatest` binds to whichever of `prefix`/`suffix` was set most recently
//! in the same directive string. It never reaches into an earlier line.

use crate::directive::{parse_record, split_field};
use crate::error::{Error, Result};
use crate::template::{self, Scope};
use crate::version::{Candidate, RawVersion, Version};
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Policy for the `latest` tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LatestMode {
    /// Follow what the tag rules decided
    #[default]
    Auto,
    /// Always emit `latest`
    True,
    /// Never emit `latest`
    False,
}

impl LatestMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::True => "true",
            Self::False => "false",
        }
    }
}

impl fmt::Display for LatestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LatestMode {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "true" => Ok(Self::True),
            "false" => Ok(Self::False),
            _ => Err(()),
        }
    }
}

/// Which affix a subsequent `onlatest` applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Affix {
    Prefix,
    Suffix,
}

/// Prefix/suffix/latest policy for one run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Flavor {
    pub latest: LatestMode,
    pub prefix: String,
    pub suffix: String,
    /// Apply `prefix` to the `latest` tag too
    pub prefix_latest: bool,
    /// Apply `suffix` to the `latest` tag too
    pub suffix_latest: bool,
    /// Prepended to every generated OCI label key
    pub label_prefix: Option<String>,
}

impl Flavor {
    /// Fold an ordered list of directives into a policy
    ///
    /// Later directives overwrite earlier values of the same key.
    pub fn transform<S: AsRef<str>>(inputs: &[S]) -> Result<Self> {
        let mut flavor = Self::default();
        for input in inputs {
            flavor.apply_directive(input.as_ref())?;
        }

        info!("Processing flavor input");
        info!("  latest={}", flavor.latest);
        info!("  prefix={}", flavor.prefix);
        info!("  prefixLatest={}", flavor.prefix_latest);
        info!("  suffix={}", flavor.suffix);
        info!("  suffixLatest={}", flavor.suffix_latest);
        if let Some(ref label_prefix) = flavor.label_prefix {
            info!("  labelPrefix={}", label_prefix);
        }
        Ok(flavor)
    }

    fn apply_directive(&mut self, directive: &str) -> Result<()> {
        let invalid = |reason: String| Error::Flavor {
            directive: directive.to_string(),
            reason,
        };

        // `onlatest` scope is this directive only
        let mut last_affix = None;

        for field in parse_record(directive)? {
            let Some((key, value)) = split_field(&field) else {
                return Err(invalid(format!("'{}' is not a key=value pair", field.trim())));
            };
            match key.as_str() {
                "latest" => {
                    self.latest = value
                        .parse()
                        .map_err(|_| invalid(format!("invalid latest value '{}'", value)))?;
                }
                "prefix" => {
                    self.prefix = value;
                    last_affix = Some(Affix::Prefix);
                }
                "suffix" => {
                    self.suffix = value;
                    last_affix = Some(Affix::Suffix);
                }
                "onlatest" => {
                    let on = match value.as_str() {
                        "true" => true,
                        "false" => false,
                        _ => {
                            return Err(invalid(format!("invalid onlatest value '{}'", value)));
                        }
                    };
                    match last_affix {
                        Some(Affix::Prefix) => self.prefix_latest = on,
                        Some(Affix::Suffix) => self.suffix_latest = on,
                        None => {}
                    }
                }
                "labelprefix" => self.label_prefix = Some(value),
                _ => return Err(invalid(format!("unknown key '{}'", key))),
            }
        }
        Ok(())
    }

    /// Render templates inside the prefix and suffix
    pub fn render(&self, scope: &dyn Scope) -> Result<Self> {
        Ok(Self {
            prefix: template::render(&self.prefix, scope)?,
            suffix: template::render(&self.suffix, scope)?,
            ..self.clone()
        })
    }

    /// The synthesized `latest` tag with the affixes that apply to it
    pub fn latest_tag(&self) -> String {
        let prefix = if self.prefix_latest { self.prefix.as_str() } else { "" };
        let suffix = if self.suffix_latest { self.suffix.as_str() } else { "" };
        format!("{}latest{}", prefix, suffix)
    }

    /// Dress one candidate; its own affixes win over the flavor's
    fn compose(&self, candidate: &Candidate) -> String {
        format!(
            "{}{}{}",
            candidate.prefix.as_deref().unwrap_or(&self.prefix),
            candidate.value,
            candidate.suffix.as_deref().unwrap_or(&self.suffix)
        )
    }
}

/// Apply a flavor to a resolved version
///
/// An empty version stays empty regardless of the `latest` policy.
pub fn apply(raw: RawVersion, flavor: &Flavor) -> Version {
    let Some(ref main) = raw.main else {
        return Version::default();
    };

    let latest = match flavor.latest {
        LatestMode::Auto => raw.is_latest(),
        LatestMode::True => true,
        LatestMode::False => false,
    };

    let main = flavor.compose(main);
    let mut partial: Vec<String> = Vec::with_capacity(raw.partial.len() + 1);
    let mut push = |value: String| {
        if value != main && !partial.contains(&value) {
            partial.push(value);
        }
    };

    for candidate in &raw.partial {
        push(flavor.compose(candidate));
    }
    if latest {
        push(flavor.latest_tag());
    }

    Version {
        main: Some(main),
        partial,
        latest,
    }
}
