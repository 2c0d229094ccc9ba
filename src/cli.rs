// src/cli.rs
//! CLI definitions for tagsmith
//!
//! Every `generate` option falls back to the environment variable a CI runner
//! sets for it, so the binary can run as a workflow step without arguments.
//! The command implementations are in the `commands` module.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tagsmith")]
#[command(author = "Tagsmith Contributors")]
#[command(version)]
#[command(about = "Derive container image tags and OCI labels from CI events", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute tags, labels and build definitions for the current event
    Generate(Box<GenerateArgs>),

    /// Parse tag rules and print them normalized, in evaluation order
    Rules {
        /// Tag rules, one per line
        #[arg(long, env = "INPUT_TAGS", default_value = "")]
        tags: String,
    },
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Image names, one per line or comma-separated on a single line
    #[arg(long, env = "INPUT_IMAGES", default_value = "")]
    pub images: String,

    /// Tag rules, one per line
    #[arg(long, env = "INPUT_TAGS", default_value = "")]
    pub tags: String,

    /// Flavor directives, one per line
    #[arg(long, env = "INPUT_FLAVOR", default_value = "")]
    pub flavor: String,

    /// Extra labels (key=value), one per line
    #[arg(long, env = "INPUT_LABELS", default_value = "")]
    pub labels: String,

    /// Separator for the tags output
    #[arg(long, env = "INPUT_SEP_TAGS", default_value = "\n")]
    pub sep_tags: String,

    /// Separator for the labels output
    #[arg(long, env = "INPUT_SEP_LABELS", default_value = "\n")]
    pub sep_labels: String,

    /// Target name in the generated bake file
    #[arg(long, env = "INPUT_BAKE_TARGET", default_value = tagsmith::meta::DEFAULT_BAKE_TARGET)]
    pub bake_target: String,

    /// Write the JSON output to this file
    #[arg(long, env = "INPUT_OUTPUT_JSON")]
    pub output_json: Option<PathBuf>,

    /// Write the bake definition to this file
    #[arg(long, env = "INPUT_BAKE_FILE")]
    pub bake_file: Option<PathBuf>,

    /// Step-output file to append results to
    #[arg(long, env = "GITHUB_OUTPUT")]
    pub github_output: Option<PathBuf>,

    /// Git ref that triggered the run (refs/heads/..., refs/tags/..., refs/pull/...)
    #[arg(long = "ref", env = "GITHUB_REF", default_value = "")]
    pub git_ref: String,

    /// Commit SHA that triggered the run
    #[arg(long, env = "GITHUB_SHA", default_value = "")]
    pub sha: String,

    /// Name of the triggering event (push, pull_request, schedule, ...)
    #[arg(long, env = "GITHUB_EVENT_NAME", default_value = "")]
    pub event_name: String,

    /// Path to the JSON event payload
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    pub event_path: Option<PathBuf>,

    /// Use the pull request head commit instead of the merge commit
    #[arg(long, env = "DOCKER_METADATA_PR_HEAD_SHA")]
    pub pr_head_sha: bool,

    /// JSON repository object overriding the one in the event payload
    #[arg(long)]
    pub repo_json: Option<PathBuf>,

    /// Repository slug (owner/name) used when no repository object is available
    #[arg(long, env = "GITHUB_REPOSITORY", default_value = "")]
    pub repository: String,

    /// Base URL of the hosting server
    #[arg(long, env = "GITHUB_SERVER_URL", default_value = "https://github.com")]
    pub server_url: String,

    /// Freeze the clock at this Unix timestamp (seconds)
    #[arg(long, env = "SOURCE_DATE_EPOCH")]
    pub timestamp: Option<i64>,
}
