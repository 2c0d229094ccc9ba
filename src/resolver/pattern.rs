// src/resolver/pattern.rs
//! Match-rule patterns: plain regular expressions or `/expr/flags` literals

use crate::error::{Error, Result};
use regex::{Regex, RegexBuilder};

/// Compile a `match` rule pattern
///
/// `/expr/flags` understands `i`, `m` and `s`; `g`, `u` and `y` are
/// meaningless for a single match and are accepted as no-ops.
pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    let regex_err = |source| Error::Regex {
        pattern: pattern.to_string(),
        source,
    };

    let Some((expr, flags)) = split_literal(pattern) else {
        return Regex::new(pattern).map_err(regex_err);
    };

    let mut builder = RegexBuilder::new(expr);
    for flag in flags.chars() {
        match flag {
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            'g' | 'u' | 'y' => {}
            _ => {
                return Err(Error::InvalidAttribute {
                    attr: "pattern",
                    directive: pattern.to_string(),
                });
            }
        }
    }
    builder.build().map_err(regex_err)
}

/// Split `/expr/flags` at its last slash; `None` for a plain pattern
fn split_literal(pattern: &str) -> Option<(&str, &str)> {
    let body = pattern.strip_prefix('/')?;
    let end = body.rfind('/')?;
    if end == 0 {
        return None;
    }
    Some((&body[..end], &body[end + 1..]))
}
