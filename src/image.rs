// src/image.rs

//! Image list parsing
//!
//! Two input forms are accepted. The compact form is a single line of plain
//! names:
//!
//! ```text
//! ghcr.io/acme/app,docker.io/acme/app
//! ```
//!
//! The full form has one image per line, each a directive with `name` and
//! `enable` attributes (a bare token is the name):
//!
//! ```text
//! name=ghcr.io/acme/app
//! docker.io/acme/app,enable=false
//! ```

use crate::directive::{parse_record, split_field};
use crate::error::{Error, Result};
use tracing::info;

/// One target image repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub name: String,
    /// Disabled images are validated but produce no tags
    pub enable: bool,
}

impl Image {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enable: true,
        }
    }

    /// Parse one full-form image directive
    pub fn parse(directive: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::Image {
            directive: directive.to_string(),
            reason: reason.to_string(),
        };

        let mut image = Self::new("");
        for field in parse_record(directive)? {
            match split_field(&field) {
                None => image.name = field.trim().to_string(),
                Some((key, value)) => match key.as_str() {
                    "name" => image.name = value,
                    "enable" => {
                        image.enable = match value.as_str() {
                            "true" => true,
                            "false" => false,
                            _ => return Err(invalid("invalid enable attribute value")),
                        };
                    }
                    _ => return Err(invalid("unknown image attribute")),
                },
            }
        }

        if image.name.is_empty() {
            return Err(invalid("image name attribute empty"));
        }
        Ok(image)
    }
}

/// Parse the image list
pub fn transform<S: AsRef<str>>(inputs: &[S]) -> Result<Vec<Image>> {
    let images = match compact_list(inputs)? {
        Some(images) => images,
        None => inputs
            .iter()
            .map(|input| Image::parse(input.as_ref()))
            .collect::<Result<Vec<_>>>()?,
    };

    info!("Processing images input");
    for image in &images {
        info!("  name={},enable={}", image.name, image.enable);
    }
    Ok(images)
}

/// A single line made only of bare names is the compact form
fn compact_list<S: AsRef<str>>(inputs: &[S]) -> Result<Option<Vec<Image>>> {
    let [input] = inputs else {
        return Ok(None);
    };
    let fields = parse_record(input.as_ref())?;
    if fields.iter().any(|field| field.contains('=')) {
        return Ok(None);
    }
    Ok(Some(
        fields
            .iter()
            .map(|field| Image::new(field.trim()))
            .collect(),
    ))
}

/// Names of the enabled images, in input order
pub fn enabled_names(images: &[Image]) -> Vec<&str> {
    images
        .iter()
        .filter(|image| image.enable)
        .map(|image| image.name.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_single_line() {
        let images = transform(&["ghcr.io/acme/app, docker.io/acme/app"]).unwrap();
        assert_eq!(
            images,
            vec![
                Image::new("ghcr.io/acme/app"),
                Image::new("docker.io/acme/app")
            ]
        );
    }

    #[test]
    fn test_full_form() {
        let images = transform(&[
            "name=ghcr.io/acme/app",
            "docker.io/acme/app,enable=false",
        ])
        .unwrap();
        assert_eq!(images[0], Image::new("ghcr.io/acme/app"));
        assert_eq!(images[1].name, "docker.io/acme/app");
        assert!(!images[1].enable);
        assert_eq!(enabled_names(&images), vec!["ghcr.io/acme/app"]);
    }

    #[test]
    fn test_single_line_with_attributes_is_full_form() {
        let images = transform(&["name=acme/app,enable=true"]).unwrap();
        assert_eq!(images, vec![Image::new("acme/app")]);
    }

    #[test]
    fn test_empty_input() {
        assert!(transform::<&str>(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_enable() {
        let err = transform(&["name=acme/app,enable=yes"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid image entry 'name=acme/app,enable=yes': invalid enable attribute value"
        );
    }

    #[test]
    fn test_unknown_attribute() {
        assert!(matches!(
            transform(&["name=acme/app,tag=1"]),
            Err(Error::Image { .. })
        ));
    }

    #[test]
    fn test_empty_name() {
        assert!(matches!(
            transform(&["name=,enable=true"]),
            Err(Error::Image { .. })
        ));
    }

    #[test]
    fn test_disabled_image_still_validated() {
        assert!(transform(&["name=a/b", "name=c/d,enable=bogus"]).is_err());
    }
}
