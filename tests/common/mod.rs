// tests/common/mod.rs

//! Shared fixtures for integration tests: a frozen clock, a sample
//! repository and event contexts for the common trigger kinds.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use tagsmith::{Context, Meta, MetaInputs, RepoInfo};

pub const SHA: &str = "860c1904a1ce19322e91ac35af1ab07466440c37";

/// 2020-01-10T00:30:00Z
pub fn frozen_clock() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 10, 0, 30, 0).unwrap()
}

pub fn repo() -> RepoInfo {
    RepoInfo {
        name: "Hello-World".to_string(),
        description: "This your first repo!".to_string(),
        html_url: "https://github.com/octocat/Hello-World".to_string(),
        default_branch: "master".to_string(),
        license_spdx_id: "MIT".to_string(),
    }
}

/// Context for a push of `git_ref` (branch or tag)
pub fn push(git_ref: &str) -> Context {
    event(git_ref, "push")
}

pub fn event(git_ref: &str, event_name: &str) -> Context {
    Context {
        git_ref: git_ref.to_string(),
        sha: SHA.to_string(),
        commit_date: frozen_clock(),
        event_name: event_name.to_string(),
        base_ref: String::new(),
        default_branch: "master".to_string(),
    }
}

/// Directive lists from string slices
pub fn inputs(images: &[&str], tags: &[&str], flavor: &[&str], labels: &[&str]) -> MetaInputs {
    let owned = |list: &[&str]| -> Vec<String> { list.iter().map(|s| s.to_string()).collect() };
    MetaInputs {
        images: owned(images),
        tags: owned(tags),
        flavor: owned(flavor),
        labels: owned(labels),
        ..MetaInputs::default()
    }
}

/// Run the whole pipeline with the frozen clock
pub fn generate(inputs: &MetaInputs, context: &Context) -> Meta {
    Meta::new(inputs, context, &repo(), frozen_clock()).unwrap()
}
