// src/template/mod.rs

//! Template expressions used inside tag rule attributes
//!
//! Only a fixed set of expressions is understood; there is no general
//! templating engine behind this module.
//!
//! ```text
//! {{branch}}  {{tag}}  {{sha}}  {{base_ref}}  {{is_default_branch}}
//! {{date 'YYYYMMDD'}}  {{date 'YYYYMMDD-HHmm' tz='Asia/Tokyo'}}
//! {{commit_date 'YYYY-MM-DD'}}
//! ```
//!
//! Version patterns reuse the same scanner with their own fields
//! (`{{version}}`, `{{major}}`, ...), see [`Scope`].
//!
//! Unknown field names render as an empty string.

mod date;

pub use date::format_date;

use crate::context::Context;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// One `{{ ... }}` expression: a name, positional arguments and `key=value` options
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Expression {
    pub name: String,
    pub args: Vec<String>,
    pub options: Vec<(String, String)>,
}

impl Expression {
    /// Parse the inside of a `{{ ... }}` block
    fn parse(source: &str, template: &str) -> Result<Self> {
        let mut tokens = Vec::new();
        let mut chars = source.trim().chars().peekable();

        while let Some(&c) = chars.peek() {
            if c.is_whitespace() {
                chars.next();
                continue;
            }
            let literal = c == '\'' || c == '"';
            let mut token = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                chars.next();
                if c == '\'' || c == '"' {
                    let mut closed = false;
                    for q in chars.by_ref() {
                        if q == c {
                            closed = true;
                            break;
                        }
                        token.push(q);
                    }
                    if !closed {
                        return Err(Error::template(template, "unterminated string literal"));
                    }
                } else {
                    token.push(c);
                }
            }
            tokens.push((token, literal));
        }

        let mut tokens = tokens.into_iter();
        let (name, _) = tokens
            .next()
            .ok_or_else(|| Error::template(template, "empty expression"))?;

        let mut expr = Self {
            name,
            ..Self::default()
        };
        for (token, literal) in tokens {
            match token.split_once('=') {
                Some((key, value)) if !literal && !key.is_empty() => {
                    expr.options.push((key.to_string(), value.to_string()))
                }
                _ => expr.args.push(token),
            }
        }
        Ok(expr)
    }
}

/// Resolves expressions to their rendered text
pub trait Scope {
    fn resolve(&self, expr: &Expression, template: &str) -> Result<String>;
}

/// Render `template`, resolving every expression through `scope`
pub fn render(template: &str, scope: &dyn Scope) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or_else(|| Error::template(template, "unterminated expression"))?;
        let expr = Expression::parse(&after[..end], template)?;
        out.push_str(&scope.resolve(&expr, template)?);
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Check whether a pattern is nothing but a single `{{raw}}` expression
pub fn is_raw_statement(pattern: &str) -> bool {
    let trimmed = pattern.trim();
    let Some(inner) = trimmed
        .strip_prefix("{{")
        .and_then(|s| s.strip_suffix("}}"))
    else {
        return false;
    };
    !inner.contains("{{") && inner.trim() == "raw"
}

/// Scope for rule attributes: fields describing the triggering event plus date helpers
pub struct EventScope<'a> {
    context: &'a Context,
    now: DateTime<Utc>,
}

impl<'a> EventScope<'a> {
    pub fn new(context: &'a Context, now: DateTime<Utc>) -> Self {
        Self { context, now }
    }

    fn date(&self, at: DateTime<Utc>, expr: &Expression, template: &str) -> Result<String> {
        let mut tz = Tz::UTC;
        for (key, value) in &expr.options {
            match key.as_str() {
                "tz" => {
                    tz = value.parse::<Tz>().map_err(|_| {
                        Error::template(template, format!("unknown time zone '{}'", value))
                    })?;
                }
                other => {
                    return Err(Error::template(
                        template,
                        format!("Unknown {} attribute", other),
                    ));
                }
            }
        }
        let format = expr
            .args
            .first()
            .map(String::as_str)
            .unwrap_or(date::DEFAULT_FORMAT);
        Ok(format_date(&at.with_timezone(&tz), format))
    }
}

impl Scope for EventScope<'_> {
    fn resolve(&self, expr: &Expression, template: &str) -> Result<String> {
        let ctx = self.context;
        let value = match expr.name.as_str() {
            "branch" => ctx.branch().unwrap_or_default().to_string(),
            "tag" => ctx.tag().unwrap_or_default().to_string(),
            "sha" => ctx.short_sha().to_string(),
            "base_ref" => ctx.base_ref.clone(),
            "is_default_branch" => ctx.is_default_branch().to_string(),
            "date" => self.date(self.now, expr, template)?,
            "commit_date" => self.date(ctx.commit_date, expr, template)?,
            _ => String::new(),
        };
        Ok(value)
    }
}
