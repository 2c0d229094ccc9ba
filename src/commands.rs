// src/commands.rs
//! Command handlers for the tagsmith CLI

use crate::cli::GenerateArgs;
use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use std::path::Path;
use tagsmith::context::{Context, EventInputs, EventPayload, RepoInfo};
use tagsmith::directive::input_list;
use tagsmith::meta::{Meta, MetaInputs};
use tagsmith::output::{self, Outputs};
use tagsmith::tag;
use tracing::info;

/// Resolve the run clock: a fixed epoch if given, otherwise `now`
pub fn run_clock(timestamp: Option<i64>, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    match timestamp {
        Some(secs) => DateTime::from_timestamp(secs, 0)
            .with_context(|| format!("Timestamp {} is out of range", secs)),
        None => Ok(now),
    }
}

/// Load repository metadata from an explicit file, the payload or the slug
fn load_repo_info(args: &GenerateArgs, payload: &EventPayload) -> Result<RepoInfo> {
    if let Some(ref path) = args.repo_json {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read repository file {}", path.display()))?;
        return RepoInfo::from_json(&json)
            .with_context(|| format!("Invalid repository file {}", path.display()));
    }
    Ok(payload
        .repo_info()
        .unwrap_or_else(|| RepoInfo::from_slug(&args.repository, &args.server_url)))
}

fn load_payload(path: Option<&Path>) -> Result<EventPayload> {
    match path {
        Some(path) if path.exists() => EventPayload::load(path)
            .with_context(|| format!("Failed to load event payload {}", path.display())),
        _ => Ok(EventPayload::default()),
    }
}

/// Compute and emit all outputs for the current event
pub fn cmd_generate(args: &GenerateArgs, now: DateTime<Utc>) -> Result<()> {
    let now = run_clock(args.timestamp, now)?;

    let payload = load_payload(args.event_path.as_deref())?;
    let repo = load_repo_info(args, &payload)?;
    let inputs = EventInputs {
        git_ref: args.git_ref.clone(),
        sha: args.sha.clone(),
        event_name: args.event_name.clone(),
        use_pr_head_sha: args.pr_head_sha,
    };
    let context = Context::from_event(&inputs, &payload, &repo, now);
    info!("Context: ref={} sha={} event={}", context.git_ref, context.sha, context.event_name);

    let meta_inputs = MetaInputs {
        images: input_list(&args.images),
        tags: input_list(&args.tags),
        flavor: input_list(&args.flavor),
        labels: input_list(&args.labels),
        bake_target: args.bake_target.clone(),
    };
    let meta = Meta::new(&meta_inputs, &context, &repo, now)?;

    match meta.version().main {
        Some(ref main) => info!("Docker image version: {}", main),
        None => info!("No Docker image version generated for {}", context.git_ref),
    }

    let outputs = Outputs::render(&meta, &args.sep_tags, &args.sep_labels)?;
    for (name, value) in outputs.entries() {
        print!("{}", output::step_output(name, value));
    }

    if let Some(ref path) = args.output_json {
        output::write_file(path, &outputs.json)
            .with_context(|| format!("Failed to write JSON output {}", path.display()))?;
        info!("JSON output written to {}", path.display());
    }
    if let Some(ref path) = args.bake_file {
        output::write_file(path, &outputs.bake_file)
            .with_context(|| format!("Failed to write bake file {}", path.display()))?;
        info!("Bake file definition written to {}", path.display());
    }
    if let Some(ref path) = args.github_output {
        output::append_step_outputs(path, &outputs)
            .with_context(|| format!("Failed to append step outputs to {}", path.display()))?;
    }

    Ok(())
}

/// Print tag rules normalized and sorted
pub fn cmd_rules(tags: &str) -> Result<()> {
    let rules = tag::transform(&input_list(tags))?;
    for rule in rules {
        println!("{}", rule);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn generate_args(dir: &Path) -> GenerateArgs {
        GenerateArgs {
            images: "user/app".to_string(),
            tags: "type=ref,event=branch\ntype=sha".to_string(),
            flavor: String::new(),
            labels: String::new(),
            sep_tags: "\n".to_string(),
            sep_labels: "\n".to_string(),
            bake_target: tagsmith::meta::DEFAULT_BAKE_TARGET.to_string(),
            output_json: Some(dir.join("meta.json")),
            bake_file: Some(dir.join("bake/docker-bake.json")),
            github_output: Some(dir.join("github_output")),
            git_ref: "refs/heads/dev".to_string(),
            sha: "860c1904a1ce19322e91ac35af1ab07466440c37".to_string(),
            event_name: "push".to_string(),
            event_path: None,
            pr_head_sha: false,
            repo_json: None,
            repository: "octocat/Hello-World".to_string(),
            server_url: "https://github.com/".to_string(),
            timestamp: Some(1578616200),
        }
    }

    #[test]
    fn test_run_clock_frozen() {
        let now = Utc::now();
        let frozen = run_clock(Some(1578616200), now).unwrap();
        assert_eq!(frozen.to_rfc3339(), "2020-01-10T00:30:00+00:00");
        assert_eq!(run_clock(None, now).unwrap(), now);
    }

    #[test]
    fn test_load_payload_missing_file() {
        let payload = load_payload(Some(Path::new("/nonexistent/event.json"))).unwrap();
        assert!(payload.repo_info().is_none());
    }

    #[test]
    fn test_repo_info_from_slug() {
        let temp_dir = TempDir::new().unwrap();
        let args = generate_args(temp_dir.path());
        let repo = load_repo_info(&args, &EventPayload::default()).unwrap();
        assert_eq!(repo.name, "Hello-World");
        assert_eq!(repo.html_url, "https://github.com/octocat/Hello-World");
    }

    #[test]
    fn test_repo_info_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("repo.json");
        std::fs::write(&path, r#"{"name": "Other", "default_branch": "main"}"#).unwrap();
        let mut args = generate_args(temp_dir.path());
        args.repo_json = Some(path);
        let repo = load_repo_info(&args, &EventPayload::default()).unwrap();
        assert_eq!(repo.name, "Other");
        assert_eq!(repo.default_branch, "main");
    }

    #[test]
    fn test_generate_writes_files() {
        let temp_dir = TempDir::new().unwrap();
        let args = generate_args(temp_dir.path());
        cmd_generate(&args, Utc::now()).unwrap();

        let json = std::fs::read_to_string(temp_dir.path().join("meta.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value["tags"],
            serde_json::json!(["user/app:dev", "user/app:sha-860c190"])
        );
        assert_eq!(
            value["labels"]["org.opencontainers.image.created"],
            "2020-01-10T00:30:00.000Z"
        );

        assert!(temp_dir.path().join("bake/docker-bake.json").exists());
        let steps = std::fs::read_to_string(temp_dir.path().join("github_output")).unwrap();
        assert!(steps.contains("version<<ghadelimiter_0\ndev\nghadelimiter_0\n"));
    }

    #[test]
    fn test_generate_invalid_rule() {
        let temp_dir = TempDir::new().unwrap();
        let mut args = generate_args(temp_dir.path());
        args.tags = "type=bogus".to_string();
        assert!(cmd_generate(&args, Utc::now()).is_err());
        assert!(!temp_dir.path().join("meta.json").exists());
    }

    #[test]
    fn test_rules_command() {
        assert!(cmd_rules("type=semver,pattern={{version}}\ntype=sha").is_ok());
        assert!(cmd_rules("type=semver").is_err());
    }
}
