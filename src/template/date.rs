// src/template/date.rs

//! Moment-style date formatting for `{{date}}` expressions
//!
//! Supported tokens: `YYYY YY Q MMMM MMM MM M DDDD DDD DD D Do dddd ddd d
//! HH H hh h mm m ss s SSS SS S A a ZZ Z X x`. Text inside `[...]` is copied
//! verbatim; anything else is copied as-is.

use chrono::{DateTime, Datelike, Offset, TimeZone, Timelike};

/// Format used when `{{date}}` is given no format argument
pub(super) const DEFAULT_FORMAT: &str = "YYYY-MM-DDTHH:mm:ssZ";

/// Tokens ordered so that longer ones are tried first
const TOKENS: &[&str] = &[
    "YYYY", "MMMM", "DDDD", "dddd", "SSS", "MMM", "DDD", "ddd", "YY", "MM", "DD", "Do", "HH",
    "hh", "mm", "ss", "SS", "ZZ", "Q", "M", "D", "d", "H", "h", "m", "s", "S", "A", "a", "Z",
    "X", "x",
];

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Format a date using moment.js-style tokens
pub fn format_date<Tz: TimeZone>(date: &DateTime<Tz>, format: &str) -> String {
    let mut out = String::with_capacity(format.len() * 2);
    let mut rest = format;

    while !rest.is_empty() {
        if let Some(literal) = rest.strip_prefix('[') {
            match literal.find(']') {
                Some(end) => {
                    out.push_str(&literal[..end]);
                    rest = &literal[end + 1..];
                }
                None => {
                    out.push_str(rest);
                    break;
                }
            }
            continue;
        }

        if let Some(token) = TOKENS.iter().find(|t| rest.starts_with(**t)) {
            out.push_str(&render_token(date, token));
            rest = &rest[token.len()..];
            continue;
        }

        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }
    out
}

fn render_token<Tz: TimeZone>(date: &DateTime<Tz>, token: &str) -> String {
    let hour12 = match date.hour() % 12 {
        0 => 12,
        h => h,
    };
    let millis = date.timestamp_subsec_millis();
    let weekday = date.weekday().num_days_from_sunday() as usize;

    match token {
        "YYYY" => format!("{:04}", date.year()),
        "YY" => format!("{:02}", date.year().rem_euclid(100)),
        "Q" => ((date.month0() / 3) + 1).to_string(),
        "MMMM" => MONTHS[date.month0() as usize].to_string(),
        "MMM" => MONTHS[date.month0() as usize][..3].to_string(),
        "MM" => format!("{:02}", date.month()),
        "M" => date.month().to_string(),
        "DDDD" => format!("{:03}", date.ordinal()),
        "DDD" => date.ordinal().to_string(),
        "DD" => format!("{:02}", date.day()),
        "D" => date.day().to_string(),
        "Do" => ordinal(date.day()),
        "dddd" => WEEKDAYS[weekday].to_string(),
        "ddd" => WEEKDAYS[weekday][..3].to_string(),
        "d" => weekday.to_string(),
        "HH" => format!("{:02}", date.hour()),
        "H" => date.hour().to_string(),
        "hh" => format!("{:02}", hour12),
        "h" => hour12.to_string(),
        "mm" => format!("{:02}", date.minute()),
        "m" => date.minute().to_string(),
        "ss" => format!("{:02}", date.second()),
        "s" => date.second().to_string(),
        "SSS" => format!("{:03}", millis),
        "SS" => format!("{:02}", millis / 10),
        "S" => (millis / 100).to_string(),
        "A" => (if date.hour() < 12 { "AM" } else { "PM" }).to_string(),
        "a" => (if date.hour() < 12 { "am" } else { "pm" }).to_string(),
        "Z" => offset(date, ":"),
        "ZZ" => offset(date, ""),
        "X" => date.timestamp().to_string(),
        "x" => date.timestamp_millis().to_string(),
        _ => token.to_string(),
    }
}

fn ordinal(day: u32) -> String {
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", day, suffix)
}

fn offset<Tz: TimeZone>(date: &DateTime<Tz>, separator: &str) -> String {
    let seconds = date.offset().fix().local_minus_utc();
    let sign = if seconds < 0 { '-' } else { '+' };
    let minutes = seconds.abs() / 60;
    format!("{}{:02}{}{:02}", sign, minutes / 60, separator, minutes % 60)
}
