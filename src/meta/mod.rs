// src/meta/mod.rs

//! Metadata assembly
//!
//! Runs the whole pipeline for one event and holds the result:
//!
//! ```text
//! tag rules ──► resolver ──► flavor ──► version ──┬─► image tags
//!                                                 ├─► OCI labels
//!                                                 └─► JSON / bake projections
//! ```
//!
//! Everything here is deterministic for a given [`Context`], [`RepoInfo`] and
//! clock value.

mod projection;

pub use projection::{BakeArgs, BakeFile, BakeTarget, MetaJson};

use crate::context::{Context, RepoInfo};
use crate::error::Result;
use crate::flavor::{self, Flavor};
use crate::image::{self, Image};
use crate::label::LabelSet;
use crate::resolver;
use crate::tag;
use crate::template::EventScope;
use crate::version::Version;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;

/// Bake target used when none is configured
pub const DEFAULT_BAKE_TARGET: &str = "docker-metadata-action";

/// Raw directive lists for one run
#[derive(Debug, Clone)]
pub struct MetaInputs {
    pub images: Vec<String>,
    pub tags: Vec<String>,
    pub flavor: Vec<String>,
    pub labels: Vec<String>,
    pub bake_target: String,
}

impl Default for MetaInputs {
    fn default() -> Self {
        Self {
            images: Vec::new(),
            tags: Vec::new(),
            flavor: Vec::new(),
            labels: Vec::new(),
            bake_target: DEFAULT_BAKE_TARGET.to_string(),
        }
    }
}

/// Resolved metadata for one run
#[derive(Debug, Clone)]
pub struct Meta {
    version: Version,
    images: Vec<Image>,
    labels: LabelSet,
    bake_target: String,
}

impl Meta {
    /// Parse every directive, resolve the version and build the labels
    ///
    /// `now` is the single clock reading for the run. It feeds `{{date}}`
    /// templates and the `created` label.
    pub fn new(
        inputs: &MetaInputs,
        context: &Context,
        repo: &RepoInfo,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let tags = tag::transform(&inputs.tags)?;
        let flavor = Flavor::transform(&inputs.flavor)?.render(&EventScope::new(context, now))?;
        let images = image::transform(&inputs.images)?;

        let raw = resolver::resolve(&tags, context, now)?;
        let version = flavor::apply(raw, &flavor);

        let mut labels = LabelSet::oci(
            repo,
            version.main.as_deref(),
            &context.sha,
            now,
            flavor.label_prefix.as_deref(),
        );
        labels.overlay(&inputs.labels);

        Ok(Self {
            version,
            images,
            labels,
            bake_target: inputs.bake_target.clone(),
        })
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Version values without an image name: main first, then partials
    pub fn tag_names(&self) -> Vec<String> {
        tag_names(&self.version)
    }

    /// Fully qualified image tags
    pub fn tags(&self) -> Vec<String> {
        image_tags(&self.version, &self.images)
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    /// The `{tags, labels}` projection
    pub fn json(&self) -> MetaJson {
        MetaJson {
            tags: self.tags(),
            labels: self.labels.as_map().clone(),
        }
    }

    /// The build-file projection for the configured bake target
    pub fn bake(&self) -> BakeFile {
        let target = BakeTarget {
            tags: self.tags(),
            labels: self.labels.as_map().clone(),
            args: BakeArgs {
                images: image::enabled_names(&self.images).join(","),
                version: self.version.main.clone(),
            },
        };
        let mut targets = IndexMap::new();
        targets.insert(self.bake_target.clone(), target);
        BakeFile { target: targets }
    }
}

/// Version values in output order
pub fn tag_names(version: &Version) -> Vec<String> {
    let Some(ref main) = version.main else {
        return Vec::new();
    };
    std::iter::once(main)
        .chain(&version.partial)
        .cloned()
        .collect()
}

/// Image-major tag list: every version value for the first image, then the next
///
/// With no enabled image the bare version values are returned.
pub fn image_tags(version: &Version, images: &[Image]) -> Vec<String> {
    let names = tag_names(version);
    let enabled = image::enabled_names(images);
    if enabled.is_empty() {
        return names;
    }

    let mut tags = Vec::with_capacity(enabled.len() * names.len());
    for image in enabled {
        let image = image.to_lowercase();
        for name in &names {
            tags.push(format!("{}:{}", image, name));
        }
    }
    tags
}
