// src/directive.rs

//! Directive records shared by tag rules, flavors, images and labels
//!
//! A directive is one line of configuration made of comma-delimited fields:
//!
//! ```text
//! type=semver,pattern={{version}}
//! type=match,"pattern=\d+,\d+",group=0
//! ```
//!
//! A field that starts with a double quote runs until the matching closing
//! quote, so it may contain commas. Inside a quoted field `""` is a literal
//! quote.

use crate::error::{Error, Result};

/// Split multi-line input into directives
///
/// Blank lines and `#` comments are dropped, surrounding whitespace trimmed.
pub fn input_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Split one directive into its fields
///
/// Fields are returned as written; callers trim keys and values themselves.
pub fn parse_record(directive: &str) -> Result<Vec<String>> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut chars = directive.chars().peekable();
    let mut at_field_start = true;

    while let Some(c) = chars.next() {
        match c {
            '"' if at_field_start => {
                at_field_start = false;
                let mut closed = false;
                while let Some(q) = chars.next() {
                    if q == '"' {
                        if chars.peek() == Some(&'"') {
                            chars.next();
                            field.push('"');
                        } else {
                            closed = true;
                            break;
                        }
                    } else {
                        field.push(q);
                    }
                }
                if !closed {
                    return Err(Error::Directive {
                        directive: directive.to_string(),
                        reason: "unterminated quoted field".to_string(),
                    });
                }
            }
            ',' => {
                fields.push(std::mem::take(&mut field));
                at_field_start = true;
            }
            // Leading blanks do not prevent a quoted field from opening
            ' ' | '\t' if at_field_start && field.trim().is_empty() => field.push(c),
            _ => {
                at_field_start = false;
                field.push(c);
            }
        }
    }
    fields.push(field);

    // A trailing comma or an all-blank directive leaves empty fields behind
    fields.retain(|f| !f.trim().is_empty());
    Ok(fields)
}

/// Split a field into a lower-cased key and its value at the first `=`
///
/// Returns `None` when the field has no `=` at all.
pub fn split_field(field: &str) -> Option<(String, String)> {
    let (key, value) = field.split_once('=')?;
    Some((key.trim().to_lowercase(), value.trim().to_string()))
}

/// Quote a value for re-emission inside a directive if it needs it
pub(crate) fn quote_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_list_skips_comments_and_blanks() {
        let text = "type=schedule\n\n  # a comment\n type=ref,event=branch \n";
        assert_eq!(
            input_list(text),
            vec!["type=schedule".to_string(), "type=ref,event=branch".to_string()]
        );
    }

    #[test]
    fn test_parse_record_simple() {
        let fields = parse_record("type=ref,event=branch").unwrap();
        assert_eq!(fields, vec!["type=ref", "event=branch"]);
    }

    #[test]
    fn test_parse_record_quoted_comma() {
        let fields = parse_record(r#"type=match,"pattern=\d{1,3}",group=0"#).unwrap();
        assert_eq!(fields, vec!["type=match", r"pattern=\d{1,3}", "group=0"]);
    }

    #[test]
    fn test_parse_record_escaped_quote() {
        let fields = parse_record(r#""value=say ""hi""""#).unwrap();
        assert_eq!(fields, vec![r#"value=say "hi""#]);
    }

    #[test]
    fn test_parse_record_quote_inside_field_is_literal() {
        let fields = parse_record(r#"value=a"b"#).unwrap();
        assert_eq!(fields, vec![r#"value=a"b"#]);
    }

    #[test]
    fn test_parse_record_unterminated_quote() {
        assert!(parse_record(r#""pattern=abc"#).is_err());
    }

    #[test]
    fn test_parse_record_drops_empty_fields() {
        let fields = parse_record("type=sha,,").unwrap();
        assert_eq!(fields, vec!["type=sha"]);
    }

    #[test]
    fn test_split_field_keeps_later_equals() {
        let (key, value) = split_field(" Value = a=b ").unwrap();
        assert_eq!(key, "value");
        assert_eq!(value, "a=b");
        assert!(split_field("bare").is_none());
    }

    #[test]
    fn test_quote_field() {
        assert_eq!(quote_field("plain"), "plain");
        assert_eq!(quote_field("a,b"), "\"a,b\"");
        assert_eq!(quote_field("a\"b"), "\"a\"\"b\"");
    }
}
