// src/meta/projection.rs

//! Serialized views of the metadata consumed by downstream build tools
//!
//! Key names and nesting are fixed: `docker buildx bake` reads the bake file
//! as-is.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// `{"tags": [...], "labels": {...}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaJson {
    pub tags: Vec<String>,
    pub labels: IndexMap<String, String>,
}

/// `{"target": {"<name>": {...}}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BakeFile {
    pub target: IndexMap<String, BakeTarget>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BakeTarget {
    pub tags: Vec<String>,
    pub labels: IndexMap<String, String>,
    pub args: BakeArgs,
}

/// Build arguments passed to the bake target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BakeArgs {
    /// Comma-joined enabled image names
    #[serde(rename = "IMAGES")]
    pub images: String,
    #[serde(rename = "VERSION", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}
