// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Argument with an environment fallback
fn env_arg(name: &'static str, env: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).env(env).help(help)
}

fn build_cli() -> Command {
    Command::new("tagsmith")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Tagsmith Contributors")
        .about("Derive container image tags and OCI labels from CI events")
        .subcommand_required(true)
        .subcommand(
            Command::new("generate")
                .about("Compute tags, labels and build definitions for the current event")
                .arg(env_arg("images", "INPUT_IMAGES", "Image names"))
                .arg(env_arg("tags", "INPUT_TAGS", "Tag rules, one per line"))
                .arg(env_arg("flavor", "INPUT_FLAVOR", "Flavor directives, one per line"))
                .arg(env_arg("labels", "INPUT_LABELS", "Extra labels (key=value)"))
                .arg(env_arg("sep-tags", "INPUT_SEP_TAGS", "Separator for the tags output"))
                .arg(env_arg("sep-labels", "INPUT_SEP_LABELS", "Separator for the labels output"))
                .arg(
                    env_arg("bake-target", "INPUT_BAKE_TARGET", "Target name in the bake file")
                        .default_value("docker-metadata-action"),
                )
                .arg(env_arg("output-json", "INPUT_OUTPUT_JSON", "Write the JSON output to this file"))
                .arg(env_arg("bake-file", "INPUT_BAKE_FILE", "Write the bake definition to this file"))
                .arg(env_arg("github-output", "GITHUB_OUTPUT", "Step-output file to append results to"))
                .arg(env_arg("ref", "GITHUB_REF", "Git ref that triggered the run"))
                .arg(env_arg("sha", "GITHUB_SHA", "Commit SHA that triggered the run"))
                .arg(env_arg("event-name", "GITHUB_EVENT_NAME", "Name of the triggering event"))
                .arg(env_arg("event-path", "GITHUB_EVENT_PATH", "Path to the JSON event payload"))
                .arg(
                    env_arg(
                        "pr-head-sha",
                        "DOCKER_METADATA_PR_HEAD_SHA",
                        "Use the pull request head commit instead of the merge commit",
                    )
                    .action(ArgAction::SetTrue),
                )
                .arg(Arg::new("repo-json").long("repo-json").help("JSON repository object"))
                .arg(env_arg("repository", "GITHUB_REPOSITORY", "Repository slug (owner/name)"))
                .arg(
                    env_arg("server-url", "GITHUB_SERVER_URL", "Base URL of the hosting server")
                        .default_value("https://github.com"),
                )
                .arg(env_arg("timestamp", "SOURCE_DATE_EPOCH", "Freeze the clock at this Unix timestamp")),
        )
        .subcommand(
            Command::new("rules")
                .about("Parse tag rules and print them normalized, in evaluation order")
                .arg(env_arg("tags", "INPUT_TAGS", "Tag rules, one per line")),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("tagsmith.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
