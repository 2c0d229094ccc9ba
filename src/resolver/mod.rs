// src/resolver/mod.rs

//! Version resolution: evaluates tag rules against the triggering event
//!
//! Rules are walked in the order produced by [`crate::tag::transform`]
//! (priority, then input order); the resolver never re-sorts them. Each
//! enabled rule yields at most one [`Candidate`]:
//!
//! - the first candidate becomes the main version
//! - later candidates become partial tags
//! - the first candidate that decides whether this is the latest release
//!   fixes that decision
//!
//! A rule that does not apply to the event (wrong event type, no regex match,
//! unparsable version) simply yields nothing. Only malformed rules are errors.

mod pattern;

pub use pattern::compile_pattern;

use crate::context::{Context, RefKind};
use crate::error::{Error, Result};
use crate::tag::{RefEvent, Rule, ShaFormat, Tag};
use crate::template::{self, EventScope, is_raw_statement};
use crate::version::{Candidate, RawVersion, VersionScheme};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

static UNSAFE_TAG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9._-]+").unwrap());

/// Replace characters that are not allowed in an image tag
pub fn sanitize_tag(value: &str) -> String {
    UNSAFE_TAG_CHARS.replace_all(value, "-").into_owned()
}

/// Evaluates tag rules for one run
pub struct Resolver<'a> {
    context: &'a Context,
    scope: EventScope<'a>,
}

impl<'a> Resolver<'a> {
    /// `now` is the run timestamp used by `{{date}}` expressions
    pub fn new(context: &'a Context, now: DateTime<Utc>) -> Self {
        Self {
            context,
            scope: EventScope::new(context, now),
        }
    }

    /// Evaluate every enabled rule in order and assemble the raw version
    pub fn resolve(&self, tags: &[Tag]) -> Result<RawVersion> {
        let mut version = RawVersion::default();

        for tag in tags {
            if !self.is_enabled(tag)? {
                debug!("Skipping disabled rule {}", tag);
                continue;
            }
            match self.evaluate(tag)? {
                Some((candidate, latest)) => {
                    debug!("Rule {} produced '{}'", tag, candidate.value);
                    version.push(candidate, latest);
                }
                None => debug!("Rule {} does not apply to {}", tag, self.context.git_ref),
            }
        }

        Ok(version)
    }

    /// Render the `enable` attribute and interpret it as a boolean
    fn is_enabled(&self, tag: &Tag) -> Result<bool> {
        let rendered = template::render(tag.enable(), &self.scope)?;
        match rendered.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(Error::Enable(rendered)),
        }
    }

    /// Evaluate one rule; `None` when it does not apply to this event
    ///
    /// The second element is the rule's latest decision, `None` for rules
    /// that have no opinion.
    fn evaluate(&self, tag: &Tag) -> Result<Option<(Candidate, Option<bool>)>> {
        let ctx = self.context;

        let (value, latest) = match &tag.rule {
            Rule::Schedule { pattern } => {
                if !ctx.is_schedule() {
                    return Ok(None);
                }
                (template::render(pattern, &self.scope)?, None)
            }
            Rule::Semver { pattern, value } => {
                match self.version_rule(VersionScheme::Semver, pattern, value)? {
                    Some(found) => found,
                    None => return Ok(None),
                }
            }
            Rule::Pep440 { pattern, value } => {
                match self.version_rule(VersionScheme::Pep440, pattern, value)? {
                    Some(found) => found,
                    None => return Ok(None),
                }
            }
            Rule::Match {
                pattern,
                group,
                value,
            } => {
                let Some(source) = self.version_source(value)? else {
                    return Ok(None);
                };
                let re = compile_pattern(pattern)?;
                let Some(found) = re
                    .captures(&source)
                    .and_then(|caps| caps.get(*group))
                    .map(|m| m.as_str().to_string())
                else {
                    debug!("Pattern {} does not match {}", pattern, source);
                    return Ok(None);
                };
                (found, Some(true))
            }
            Rule::Edge { branch } => {
                let Some(current) = ctx.branch() else {
                    return Ok(None);
                };
                let target = if branch.is_empty() {
                    ctx.default_branch.as_str()
                } else {
                    branch.as_str()
                };
                if current != target {
                    return Ok(None);
                }
                ("edge".to_string(), None)
            }
            Rule::Ref { event } => match (event, ctx.ref_kind()) {
                (RefEvent::Branch, RefKind::Branch(name)) => (sanitize_tag(name), None),
                (RefEvent::Tag, RefKind::Tag(name)) => (sanitize_tag(name), Some(true)),
                (RefEvent::Pr, RefKind::PullRequest(number)) => (number.to_string(), None),
                _ => return Ok(None),
            },
            Rule::Raw { value } => (template::render(value, &self.scope)?, None),
            Rule::Sha { format } => {
                if ctx.sha.is_empty() {
                    return Ok(None);
                }
                let sha = match format {
                    ShaFormat::Short => ctx.short_sha(),
                    ShaFormat::Long => ctx.sha.as_str(),
                };
                (sha.to_string(), None)
            }
        };

        Ok(Some((self.candidate(tag, value)?, latest)))
    }

    /// Input for version-reading rules: an explicit `value`, else the pushed tag
    fn version_source(&self, value: &str) -> Result<Option<String>> {
        if !value.is_empty() {
            return Ok(Some(template::render(value, &self.scope)?));
        }
        Ok(self.context.tag().map(|tag| tag.replace('/', "-")))
    }

    fn version_rule(
        &self,
        scheme: VersionScheme,
        pattern: &str,
        value: &str,
    ) -> Result<Option<(String, Option<bool>)>> {
        let Some(source) = self.version_source(value)? else {
            return Ok(None);
        };
        let Some(parsed) = scheme.parse(&source) else {
            warn!("{} is not a valid {} version", source, scheme.name());
            return Ok(None);
        };

        // Unstable releases only ever get their full version
        if parsed.unstable {
            let pattern = if is_raw_statement(pattern) {
                pattern
            } else {
                "{{version}}"
            };
            Ok(Some((template::render(pattern, &parsed)?, Some(false))))
        } else {
            Ok(Some((template::render(pattern, &parsed)?, Some(true))))
        }
    }

    /// Attach the rule's own prefix/suffix overrides, rendered
    fn candidate(&self, tag: &Tag, value: String) -> Result<Candidate> {
        let affix = |key| {
            tag.attr(key)
                .map(|a| template::render(a, &self.scope))
                .transpose()
        };
        Ok(Candidate {
            value,
            prefix: affix("prefix")?,
            suffix: affix("suffix")?,
        })
    }
}

/// Resolve `tags` for the event described by `context`
pub fn resolve(tags: &[Tag], context: &Context, now: DateTime<Utc>) -> Result<RawVersion> {
    Resolver::new(context, now).resolve(tags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::transform;
    use chrono::TimeZone;

    const SHA: &str = "860c1904a1ce19322e91ac35af1ab07466440c37";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 10, 0, 30, 0).unwrap()
    }

    fn ctx(git_ref: &str, event_name: &str) -> Context {
        Context {
            git_ref: git_ref.to_string(),
            sha: SHA.to_string(),
            commit_date: now(),
            event_name: event_name.to_string(),
            base_ref: String::new(),
            default_branch: "master".to_string(),
        }
    }

    fn run(rules: &[&str], context: &Context) -> RawVersion {
        let tags = transform(rules).unwrap();
        resolve(&tags, context, now()).unwrap()
    }

    fn values(version: &RawVersion) -> (Option<String>, Vec<String>) {
        (
            version.main.as_ref().map(|c| c.value.clone()),
            version.partial.iter().map(|c| c.value.clone()).collect(),
        )
    }

    // === Schedule ===

    #[test]
    fn test_schedule_default_pattern() {
        let v = run(&["type=schedule"], &ctx("refs/heads/master", "schedule"));
        assert_eq!(values(&v), (Some("nightly".to_string()), vec![]));
        assert_eq!(v.latest, None);
    }

    #[test]
    fn test_schedule_date_pattern() {
        let v = run(
            &["type=schedule,pattern={{date 'YYYYMMDD'}}"],
            &ctx("refs/heads/master", "schedule"),
        );
        assert_eq!(v.main.unwrap().value, "20200110");
    }

    #[test]
    fn test_schedule_ignored_on_push() {
        let v = run(&["type=schedule"], &ctx("refs/heads/master", "push"));
        assert!(v.is_empty());
    }

    // === Semver / PEP 440 ===

    #[test]
    fn test_semver_strips_v() {
        let v = run(
            &["type=semver,pattern={{major}}.{{minor}}.{{patch}}"],
            &ctx("refs/tags/v1.1.1", "push"),
        );
        assert_eq!(v.main.unwrap().value, "1.1.1");
        assert_eq!(v.latest, Some(true));
    }

    #[test]
    fn test_semver_partials() {
        let v = run(
            &[
                "type=semver,pattern={{version}}",
                "type=semver,pattern={{major}}.{{minor}}",
                "type=semver,pattern={{major}}",
            ],
            &ctx("refs/tags/v1.2.3", "push"),
        );
        assert_eq!(
            values(&v),
            (
                Some("1.2.3".to_string()),
                vec!["1.2".to_string(), "1".to_string()]
            )
        );
        assert_eq!(v.latest, Some(true));
    }

    #[test]
    fn test_semver_prerelease_only_full_version() {
        let v = run(
            &[
                "type=semver,pattern={{version}}",
                "type=semver,pattern={{major}}.{{minor}}",
            ],
            &ctx("refs/tags/v2.0.8-beta.67", "push"),
        );
        assert_eq!(values(&v), (Some("2.0.8-beta.67".to_string()), vec![]));
        assert_eq!(v.latest, Some(false));
    }

    #[test]
    fn test_semver_prerelease_raw_pattern() {
        let v = run(
            &["type=semver,pattern={{raw}}"],
            &ctx("refs/tags/v2.0.8-beta.67", "push"),
        );
        assert_eq!(v.main.unwrap().value, "v2.0.8-beta.67");
    }

    #[test]
    fn test_semver_invalid_is_skipped() {
        let v = run(
            &["type=semver,pattern={{version}}"],
            &ctx("refs/tags/release1", "push"),
        );
        assert!(v.is_empty());
    }

    #[test]
    fn test_semver_needs_tag_event() {
        let v = run(
            &["type=semver,pattern={{version}}"],
            &ctx("refs/heads/master", "push"),
        );
        assert!(v.is_empty());
    }

    #[test]
    fn test_semver_value_override() {
        let v = run(
            &["type=semver,pattern={{version}},value=v3.1.0"],
            &ctx("refs/heads/master", "push"),
        );
        assert_eq!(v.main.unwrap().value, "3.1.0");
    }

    #[test]
    fn test_pep440_prerelease() {
        let v = run(
            &[
                "type=pep440,pattern={{version}}",
                "type=pep440,pattern={{major}}.{{minor}}",
            ],
            &ctx("refs/tags/1.2.3rc2", "push"),
        );
        assert_eq!(values(&v), (Some("1.2.3rc2".to_string()), vec![]));
        assert_eq!(v.latest, Some(false));
    }

    #[test]
    fn test_pep440_final() {
        let v = run(
            &[
                "type=pep440,pattern={{version}}",
                "type=pep440,pattern={{major}}.{{minor}}",
            ],
            &ctx("refs/tags/v1.2", "push"),
        );
        assert_eq!(
            values(&v),
            (Some("1.2".to_string()), vec![])
        );
        assert_eq!(v.latest, Some(true));
    }

    // === Match ===

    #[test]
    fn test_match_date_in_tag() {
        let v = run(
            &[r"type=match,pattern=\d{8}"],
            &ctx("refs/tags/20200110-RC2", "push"),
        );
        assert_eq!(v.main.unwrap().value, "20200110");
        assert_eq!(v.latest, Some(true));
    }

    #[test]
    fn test_match_group() {
        let v = run(
            &[r"type=match,pattern=v(\d.\d),group=1"],
            &ctx("refs/tags/v1.2.3", "push"),
        );
        assert_eq!(v.main.unwrap().value, "1.2");
    }

    #[test]
    fn test_match_regex_literal_flags() {
        let v = run(
            &[r"type=match,pattern=/^RELEASE-(\w+)$/i,group=1"],
            &ctx("refs/tags/release-abc", "push"),
        );
        assert_eq!(v.main.unwrap().value, "abc");
    }

    #[test]
    fn test_match_no_match() {
        let v = run(
            &[r"type=match,pattern=\d{8}"],
            &ctx("refs/tags/v1.0", "push"),
        );
        assert!(v.is_empty());
    }

    #[test]
    fn test_match_missing_group_is_skipped() {
        let v = run(
            &[r"type=match,pattern=v(\d)(-rc)?,group=2"],
            &ctx("refs/tags/v1", "push"),
        );
        assert!(v.is_empty());
    }

    // === Edge / ref ===

    #[test]
    fn test_edge_default_branch() {
        let v = run(&["type=edge"], &ctx("refs/heads/master", "push"));
        assert_eq!(v.main.unwrap().value, "edge");
        assert_eq!(v.latest, None);

        let v = run(&["type=edge"], &ctx("refs/heads/dev", "push"));
        assert!(v.is_empty());
    }

    #[test]
    fn test_edge_explicit_branch() {
        let v = run(&["type=edge,branch=dev"], &ctx("refs/heads/dev", "push"));
        assert_eq!(v.main.unwrap().value, "edge");
    }

    #[test]
    fn test_ref_branch_sanitized() {
        let v = run(
            &["type=ref,event=branch"],
            &ctx("refs/heads/feature/new#thing", "push"),
        );
        assert_eq!(v.main.unwrap().value, "feature-new-thing");
    }

    #[test]
    fn test_ref_tag_signals_latest() {
        let v = run(&["type=ref,event=tag"], &ctx("refs/tags/v1.0", "push"));
        assert_eq!(v.main.unwrap().value, "v1.0");
        assert_eq!(v.latest, Some(true));
    }

    #[test]
    fn test_prerelease_not_latest_with_ref_tag() {
        let v = run(
            &["type=semver,pattern={{version}}", "type=ref,event=tag"],
            &ctx("refs/tags/v2.0.0-beta.1", "push"),
        );
        assert_eq!(
            values(&v),
            (
                Some("2.0.0-beta.1".to_string()),
                vec!["v2.0.0-beta.1".to_string()]
            )
        );
        assert_eq!(v.latest, Some(false));
    }

    #[test]
    fn test_ref_pr_prefix_override() {
        let v = run(
            &["type=ref,event=pr"],
            &ctx("refs/pull/15/merge", "pull_request"),
        );
        let main = v.main.unwrap();
        assert_eq!(main.value, "15");
        assert_eq!(main.prefix.as_deref(), Some("pr-"));
    }

    #[test]
    fn test_default_rules_on_branch() {
        let v = run(&[], &ctx("refs/heads/dev", "push"));
        assert_eq!(values(&v), (Some("dev".to_string()), vec![]));
    }

    // === Raw / sha ===

    #[test]
    fn test_raw_template() {
        let v = run(
            &["type=raw,value={{branch}}-{{sha}}"],
            &ctx("refs/heads/master", "push"),
        );
        assert_eq!(v.main.unwrap().value, "master-860c190");
    }

    #[test]
    fn test_sha_short_and_long() {
        let v = run(&["type=sha"], &ctx("refs/heads/master", "push"));
        let main = v.main.unwrap();
        assert_eq!(main.value, "860c190");
        assert_eq!(main.prefix.as_deref(), Some("sha-"));

        let v = run(&["type=sha,format=long"], &ctx("refs/heads/master", "push"));
        assert_eq!(v.main.unwrap().value, SHA);
    }

    #[test]
    fn test_sha_without_commit() {
        let mut context = ctx("refs/heads/master", "push");
        context.sha = String::new();
        let v = run(&["type=sha"], &context);
        assert!(v.is_empty());
    }

    // === Enable ===

    #[test]
    fn test_enable_false_skips() {
        let v = run(
            &["type=raw,value=foo,enable=false", "type=raw,value=bar"],
            &ctx("refs/heads/master", "push"),
        );
        assert_eq!(values(&v), (Some("bar".to_string()), vec![]));
    }

    #[test]
    fn test_enable_template() {
        let rules = ["type=raw,value=latest,enable={{is_default_branch}}"];
        let v = run(&rules, &ctx("refs/heads/master", "push"));
        assert_eq!(v.main.unwrap().value, "latest");

        let v = run(&rules, &ctx("refs/heads/dev", "push"));
        assert!(v.is_empty());
    }

    #[test]
    fn test_enable_invalid_value() {
        let tags = transform(&["type=raw,value=foo,enable=maybe"]).unwrap();
        let err = resolve(&tags, &ctx("refs/heads/master", "push"), now()).unwrap_err();
        assert!(matches!(err, Error::Enable(ref v) if v == "maybe"));
    }

    // === Ordering ===

    #[test]
    fn test_priority_order_drives_main() {
        let v = run(
            &[
                "type=sha",
                "type=ref,event=branch",
                "type=raw,value=custom",
            ],
            &ctx("refs/heads/dev", "push"),
        );
        assert_eq!(
            values(&v),
            (
                Some("dev".to_string()),
                vec!["custom".to_string(), "860c190".to_string()]
            )
        );
    }

    #[test]
    fn test_sanitize_tag() {
        assert_eq!(sanitize_tag("feature/a b"), "feature-a-b");
        assert_eq!(sanitize_tag("v1.0_rc-1"), "v1.0_rc-1");
    }
}
