// src/tag/mod.rs
//! Tag rule parsing
//!
//! A tag rule is one directive describing how to derive an image tag from the
//! triggering event:
//!
//! ```text
//! type=semver,pattern={{major}}.{{minor}}
//! type=ref,event=pr
//! type=sha,format=long,priority=150
//! edge,branch=develop
//! my-static-tag
//! ```
//!
//! Every rule gets an `enable` and a numeric `priority` attribute. Rules are
//! evaluated from the highest priority down; rules with equal priority keep
//! the order in which they were written.

use crate::directive::{parse_record, quote_field, split_field};
use crate::error::{Error, Result};
use crate::resolver::compile_pattern;
use indexmap::IndexMap;
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Rules used when no tag rule is configured at all
pub const DEFAULT_RULES: [&str; 4] = [
    "type=schedule",
    "type=ref,event=branch",
    "type=ref,event=tag",
    "type=ref,event=pr",
];

/// The kind of a tag rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagType {
    Schedule,
    Semver,
    Pep440,
    Match,
    Edge,
    Ref,
    Raw,
    Sha,
}

impl TagType {
    pub const ALL: [TagType; 8] = [
        Self::Schedule,
        Self::Semver,
        Self::Pep440,
        Self::Match,
        Self::Edge,
        Self::Ref,
        Self::Raw,
        Self::Sha,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Schedule => "schedule",
            Self::Semver => "semver",
            Self::Pep440 => "pep440",
            Self::Match => "match",
            Self::Edge => "edge",
            Self::Ref => "ref",
            Self::Raw => "raw",
            Self::Sha => "sha",
        }
    }

    /// Priority applied when a rule does not set one (higher runs first)
    pub fn default_priority(&self) -> i64 {
        match self {
            Self::Schedule => 1000,
            Self::Semver | Self::Pep440 => 900,
            Self::Match => 800,
            Self::Edge => 700,
            Self::Ref => 600,
            Self::Raw => 200,
            Self::Sha => 100,
        }
    }
}

impl fmt::Display for TagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TagType {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|t| t.as_str() == s).ok_or(())
    }
}

/// Event category a `ref` rule reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefEvent {
    Branch,
    Tag,
    Pr,
}

impl FromStr for RefEvent {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "branch" => Ok(Self::Branch),
            "tag" => Ok(Self::Tag),
            "pr" => Ok(Self::Pr),
            _ => Err(()),
        }
    }
}

/// Output length of a `sha` rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaFormat {
    Short,
    Long,
}

impl FromStr for ShaFormat {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "short" => Ok(Self::Short),
            "long" => Ok(Self::Long),
            _ => Err(()),
        }
    }
}

/// Typed view of a validated rule, one variant per [`TagType`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Schedule { pattern: String },
    Semver { pattern: String, value: String },
    Pep440 { pattern: String, value: String },
    Match { pattern: String, group: usize, value: String },
    Edge { branch: String },
    Ref { event: RefEvent },
    Raw { value: String },
    Sha { format: ShaFormat },
}

impl Rule {
    pub fn tag_type(&self) -> TagType {
        match self {
            Self::Schedule { .. } => TagType::Schedule,
            Self::Semver { .. } => TagType::Semver,
            Self::Pep440 { .. } => TagType::Pep440,
            Self::Match { .. } => TagType::Match,
            Self::Edge { .. } => TagType::Edge,
            Self::Ref { .. } => TagType::Ref,
            Self::Raw { .. } => TagType::Raw,
            Self::Sha { .. } => TagType::Sha,
        }
    }
}

/// A parsed tag rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub rule: Rule,
    pub priority: i64,
    attrs: IndexMap<String, String>,
}

impl Tag {
    /// Parse a single rule directive, applying per-type defaults
    pub fn parse(s: &str) -> Result<Self> {
        let fields = parse_record(s)?;
        let mut kind = None;
        let mut attrs: IndexMap<String, String> = IndexMap::new();

        for (idx, field) in fields.iter().enumerate() {
            match split_field(field) {
                None => {
                    let token = field.trim();
                    // A leading bare type name is shorthand for type=<name>
                    if idx == 0
                        && fields.len() > 1
                        && let Ok(t) = token.parse::<TagType>()
                    {
                        kind = Some(t);
                    } else {
                        attrs.insert("value".to_string(), token.to_string());
                    }
                }
                Some((key, value)) if key == "type" => {
                    let parsed = value.parse::<TagType>().map_err(|_| Error::UnknownTagType {
                        value: value.clone(),
                        directive: s.to_string(),
                    })?;
                    kind = Some(parsed);
                }
                Some((key, value)) => {
                    attrs.insert(key, value);
                }
            }
        }

        let kind = kind.unwrap_or(TagType::Raw);
        let rule = Self::build_rule(kind, &mut attrs, s)?;

        attrs
            .entry("enable".to_string())
            .or_insert_with(|| "true".to_string());
        let priority = match attrs.get("priority") {
            Some(p) => p.trim().parse::<i64>().map_err(|_| Error::InvalidAttribute {
                attr: "priority",
                directive: s.to_string(),
            })?,
            None => {
                let p = kind.default_priority();
                attrs.insert("priority".to_string(), p.to_string());
                p
            }
        };

        Ok(Self {
            rule,
            priority,
            attrs,
        })
    }

    /// Validate and default the attributes of one rule type
    fn build_rule(
        kind: TagType,
        attrs: &mut IndexMap<String, String>,
        directive: &str,
    ) -> Result<Rule> {
        let missing = |attr| Error::MissingAttribute {
            attr,
            directive: directive.to_string(),
        };
        let invalid = |attr| Error::InvalidAttribute {
            attr,
            directive: directive.to_string(),
        };
        let default = |attrs: &mut IndexMap<String, String>, key: &str, value: &str| {
            attrs
                .entry(key.to_string())
                .or_insert_with(|| value.to_string())
                .clone()
        };

        let rule = match kind {
            TagType::Schedule => Rule::Schedule {
                pattern: default(attrs, "pattern", "nightly"),
            },
            TagType::Semver | TagType::Pep440 => {
                let pattern = attrs.get("pattern").cloned().ok_or_else(|| missing("pattern"))?;
                let value = default(attrs, "value", "");
                if kind == TagType::Semver {
                    Rule::Semver { pattern, value }
                } else {
                    Rule::Pep440 { pattern, value }
                }
            }
            TagType::Match => {
                let pattern = attrs.get("pattern").cloned().ok_or_else(|| missing("pattern"))?;
                compile_pattern(&pattern).map_err(|e| match e {
                    Error::InvalidAttribute { attr, .. } => invalid(attr),
                    other => other,
                })?;
                let group = default(attrs, "group", "0")
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| invalid("group"))?;
                let value = default(attrs, "value", "");
                Rule::Match {
                    pattern,
                    group,
                    value,
                }
            }
            TagType::Edge => Rule::Edge {
                branch: default(attrs, "branch", ""),
            },
            TagType::Ref => {
                let event = attrs
                    .get("event")
                    .ok_or_else(|| missing("event"))?
                    .parse::<RefEvent>()
                    .map_err(|_| invalid("event"))?;
                if event == RefEvent::Pr {
                    default(attrs, "prefix", "pr-");
                }
                Rule::Ref { event }
            }
            TagType::Raw => Rule::Raw {
                value: attrs.get("value").cloned().ok_or_else(|| missing("value"))?,
            },
            TagType::Sha => {
                default(attrs, "prefix", "sha-");
                let format = default(attrs, "format", "short")
                    .parse::<ShaFormat>()
                    .map_err(|_| invalid("format"))?;
                Rule::Sha { format }
            }
        };
        Ok(rule)
    }

    pub fn tag_type(&self) -> TagType {
        self.rule.tag_type()
    }

    /// Look up an attribute by its (lower-case) name
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    pub fn attrs(&self) -> &IndexMap<String, String> {
        &self.attrs
    }

    /// The raw `enable` attribute, possibly still a template
    pub fn enable(&self) -> &str {
        self.attr("enable").unwrap_or("true")
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type={}", self.tag_type())?;
        for (key, value) in &self.attrs {
            write!(f, ",{}", quote_field(&format!("{}={}", key, value)))?;
        }
        Ok(())
    }
}

impl FromStr for Tag {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Tag::parse(s)
    }
}

/// Parse every rule directive and order them by descending priority
///
/// An empty input falls back to [`DEFAULT_RULES`]. The sort is stable, so
/// rules with the same priority keep their input order.
pub fn transform<S: AsRef<str>>(inputs: &[S]) -> Result<Vec<Tag>> {
    let mut tags = if inputs.is_empty() {
        DEFAULT_RULES
            .iter()
            .map(|rule| Tag::parse(rule))
            .collect::<Result<Vec<_>>>()?
    } else {
        inputs
            .iter()
            .map(|rule| Tag::parse(rule.as_ref()))
            .collect::<Result<Vec<_>>>()?
    };

    tags.sort_by(|a, b| b.priority.cmp(&a.priority));

    info!("Processing tags input");
    for tag in &tags {
        info!("  {}", tag);
    }
    Ok(tags)
}
