// src/output.rs

//! Output rendering and step-output files
//!
//! Outputs are plain strings keyed by name. They are written either as files
//! (JSON and bake definitions) or appended to the CI step-output file using
//! the multi-line form:
//!
//! ```text
//! tags<<ghadelimiter_0
//! user/app:1.2.3
//! user/app:latest
//! ghadelimiter_0
//! ```

use crate::error::Result;
use crate::meta::Meta;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Every named output of a run, already rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outputs {
    pub version: String,
    pub tags: String,
    pub tag_names: String,
    pub labels: String,
    pub json: String,
    pub bake_file: String,
}

impl Outputs {
    /// Render the outputs of `meta`, joining lists with the given separators
    pub fn render(meta: &Meta, sep_tags: &str, sep_labels: &str) -> Result<Self> {
        Ok(Self {
            version: meta.version().main.clone().unwrap_or_default(),
            tags: meta.tags().join(sep_tags),
            tag_names: meta.tag_names().join(sep_tags),
            labels: meta.labels().to_lines().join(sep_labels),
            json: serde_json::to_string_pretty(&meta.json())?,
            bake_file: serde_json::to_string_pretty(&meta.bake())?,
        })
    }

    /// `(name, value)` pairs in output order
    pub fn entries(&self) -> [(&'static str, &str); 6] {
        [
            ("version", self.version.as_str()),
            ("tags", self.tags.as_str()),
            ("tag-names", self.tag_names.as_str()),
            ("labels", self.labels.as_str()),
            ("json", self.json.as_str()),
            ("bake-file", self.bake_file.as_str()),
        ]
    }
}

/// Write `contents` to `path`, creating parent directories
pub fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    debug!("Wrote {}", path.display());
    Ok(())
}

/// Append every output to a step-output file
pub fn append_step_outputs(path: &Path, outputs: &Outputs) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    for (name, value) in outputs.entries() {
        file.write_all(step_output(name, value).as_bytes())?;
    }
    debug!("Appended outputs to {}", path.display());
    Ok(())
}

/// One `name<<DELIM` block; the delimiter never occurs as a line of `value`
pub fn step_output(name: &str, value: &str) -> String {
    let mut n = 0;
    let delimiter = loop {
        let candidate = format!("ghadelimiter_{}", n);
        if !value.lines().any(|line| line == candidate) {
            break candidate;
        }
        n += 1;
    };
    format!("{name}<<{delimiter}\n{value}\n{delimiter}\n")
}
