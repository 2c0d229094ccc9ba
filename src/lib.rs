// src/lib.rs

//! Tagsmith
//!
//! Derives container image tags and OCI labels from a CI event and a small
//! set of declarative inputs.
//!
//! # Architecture
//!
//! - Tag rules: `type=semver,pattern={{version}}` style directives, sorted by priority
//! - Resolver: evaluates each rule against the event, producing a main version and partials
//! - Flavor: prefix/suffix/latest policy applied after resolution
//! - Meta: image tags, OCI labels and the JSON/bake projections
//!
//! The run clock is always passed in, so identical inputs give identical output.

pub mod context;
pub mod directive;
mod error;
pub mod flavor;
pub mod image;
pub mod label;
pub mod meta;
pub mod output;
pub mod resolver;
pub mod tag;
pub mod template;
pub mod version;

pub use context::{Context, EventInputs, EventPayload, RefKind, RepoInfo};
pub use error::{Error, Result};
pub use flavor::{Flavor, LatestMode};
pub use image::Image;
pub use label::{Label, LabelParseError, LabelSet};
pub use meta::{BakeFile, Meta, MetaInputs, MetaJson};
pub use output::Outputs;
pub use resolver::Resolver;
pub use tag::{Rule, Tag, TagType};
pub use version::{Candidate, RawVersion, Version, VersionScheme};
