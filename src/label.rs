// src/label.rs

//! OCI image labels
//!
//! Every run emits the eight standard `org.opencontainers.image.*` labels,
//! filled from repository metadata, the resolved version and the run clock:
//!
//! - `title`, `description`, `url`, `source`, `licenses` from the repository
//! - `version` from the main version
//! - `created` from the run clock
//! - `revision` from the commit SHA
//!
//! User labels (`key=value`) are laid over them. A user label with the same
//! key replaces the value but keeps the original position.

use crate::context::RepoInfo;
use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use std::fmt;
use std::str::FromStr;

pub const OCI_TITLE: &str = "org.opencontainers.image.title";
pub const OCI_DESCRIPTION: &str = "org.opencontainers.image.description";
pub const OCI_URL: &str = "org.opencontainers.image.url";
pub const OCI_SOURCE: &str = "org.opencontainers.image.source";
pub const OCI_VERSION: &str = "org.opencontainers.image.version";
pub const OCI_CREATED: &str = "org.opencontainers.image.created";
pub const OCI_REVISION: &str = "org.opencontainers.image.revision";
pub const OCI_LICENSES: &str = "org.opencontainers.image.licenses";

/// A single `key=value` label
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label {
    pub key: String,
    pub value: String,
}

impl Label {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Parse `key=value`; a missing `=` means an empty value
    ///
    /// Only the first `=` separates; `a=b=c` has the value `b=c`.
    pub fn parse(s: &str) -> Result<Self, LabelParseError> {
        let (key, value) = s.split_once('=').unwrap_or((s, ""));
        if key.is_empty() {
            return Err(LabelParseError::EmptyKey(s.to_string()));
        }
        Ok(Self::new(key, value))
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

impl FromStr for Label {
    type Err = LabelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Label::parse(s)
    }
}

/// Errors that can occur when parsing a label
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelParseError {
    /// Nothing before the `=` separator
    EmptyKey(String),
}

impl fmt::Display for LabelParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelParseError::EmptyKey(s) => write!(f, "Empty key in label: {}", s),
        }
    }
}

impl std::error::Error for LabelParseError {}

/// Ordered label map
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSet {
    labels: IndexMap<String, String>,
}

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The eight standard OCI labels, keys prefixed with `prefix`
    pub fn oci(
        repo: &RepoInfo,
        version: Option<&str>,
        revision: &str,
        created: DateTime<Utc>,
        prefix: Option<&str>,
    ) -> Self {
        let prefix = prefix.unwrap_or("");
        let created = created.to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut set = Self::new();
        for (key, value) in [
            (OCI_TITLE, repo.name.as_str()),
            (OCI_DESCRIPTION, repo.description.as_str()),
            (OCI_URL, repo.html_url.as_str()),
            (OCI_SOURCE, repo.html_url.as_str()),
            (OCI_VERSION, version.unwrap_or("")),
            (OCI_CREATED, created.as_str()),
            (OCI_REVISION, revision),
            (OCI_LICENSES, repo.license_spdx_id.as_str()),
        ] {
            set.insert(format!("{}{}", prefix, key), value);
        }
        set
    }

    /// Set a label; an existing key keeps its position
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.labels.insert(key.into(), value.into());
    }

    /// Lay user label entries over this set
    ///
    /// Entries with an empty key are dropped.
    pub fn overlay<S: AsRef<str>>(&mut self, entries: &[S]) {
        for label in entries
            .iter()
            .filter_map(|entry| Label::parse(entry.as_ref()).ok())
        {
            self.insert(label.key, label.value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Label> + '_ {
        self.labels.iter().map(|(k, v)| Label::new(k, v))
    }

    /// Labels as `key=value` strings, in order
    pub fn to_lines(&self) -> Vec<String> {
        self.iter().map(|label| label.to_string()).collect()
    }

    pub fn as_map(&self) -> &IndexMap<String, String> {
        &self.labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn repo() -> RepoInfo {
        RepoInfo {
            name: "Hello-World".to_string(),
            description: "This your first repo!".to_string(),
            html_url: "https://github.com/octocat/Hello-World".to_string(),
            default_branch: "master".to_string(),
            license_spdx_id: "MIT".to_string(),
        }
    }

    fn created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 10, 0, 30, 0).unwrap()
    }

    #[test]
    fn test_label_parse() {
        assert_eq!(Label::parse("a=b").unwrap(), Label::new("a", "b"));
        assert_eq!(Label::parse("a=b=c").unwrap(), Label::new("a", "b=c"));
        assert_eq!(Label::parse("flag").unwrap(), Label::new("flag", ""));
        assert_eq!(
            Label::parse("=value"),
            Err(LabelParseError::EmptyKey("=value".to_string()))
        );
    }

    #[test]
    fn test_label_display() {
        assert_eq!(Label::new("maintainer", "CrazyMax").to_string(), "maintainer=CrazyMax");
    }

    #[test]
    fn test_oci_labels() {
        let set = LabelSet::oci(&repo(), Some("1.2.3"), "860c190", created(), None);
        assert_eq!(
            set.to_lines(),
            vec![
                "org.opencontainers.image.title=Hello-World",
                "org.opencontainers.image.description=This your first repo!",
                "org.opencontainers.image.url=https://github.com/octocat/Hello-World",
                "org.opencontainers.image.source=https://github.com/octocat/Hello-World",
                "org.opencontainers.image.version=1.2.3",
                "org.opencontainers.image.created=2020-01-10T00:30:00.000Z",
                "org.opencontainers.image.revision=860c190",
                "org.opencontainers.image.licenses=MIT",
            ]
        );
    }

    #[test]
    fn test_overlay_skips_empty_keys() {
        let mut set = LabelSet::default();
        assert!(set.is_empty());
        set.overlay(&["=orphan", "=", ""]);
        assert!(set.is_empty());
        set.overlay(&["maintainer=CrazyMax"]);
        assert!(!set.is_empty());
        assert_eq!(set.get("maintainer"), Some("CrazyMax"));
    }

    #[test]
    fn test_oci_labels_empty_fields_kept() {
        let set = LabelSet::oci(&RepoInfo::default(), None, "", created(), None);
        assert_eq!(set.len(), 8);
        assert_eq!(set.get(OCI_VERSION), Some(""));
        assert_eq!(set.get(OCI_TITLE), Some(""));
    }

    #[test]
    fn test_oci_labels_prefix() {
        let set = LabelSet::oci(&repo(), None, "", created(), Some("com.example."));
        assert_eq!(
            set.get("com.example.org.opencontainers.image.title"),
            Some("Hello-World")
        );
        assert_eq!(set.get(OCI_TITLE), None);
    }

    #[test]
    fn test_overlay_replaces_in_place() {
        let mut set = LabelSet::oci(&repo(), Some("1.0"), "abc", created(), None);
        set.overlay(&[
            "maintainer=CrazyMax",
            "org.opencontainers.image.title=MyCustomTitle",
            "=dropped",
            "vendor",
        ]);
        let keys: Vec<&String> = set.as_map().keys().collect();
        assert_eq!(keys[0], OCI_TITLE);
        assert_eq!(set.get(OCI_TITLE), Some("MyCustomTitle"));
        assert_eq!(set.get("maintainer"), Some("CrazyMax"));
        assert_eq!(set.get("vendor"), Some(""));
        assert_eq!(set.len(), 10);
    }

    #[test]
    fn test_overlay_last_write_wins() {
        let mut set = LabelSet::new();
        set.overlay(&["a=1", "b=2", "a=3"]);
        assert_eq!(set.to_lines(), vec!["a=3", "b=2"]);
    }
}
