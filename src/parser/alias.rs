//! `@alias` blocks enumerating string values:
//!
//! ```text
//! ---@alias my.Kind
//! ---| 'first' # description
//! ---| 'second'
//! ```

use super::{strip_marker, tag_word};
use crate::model::{Alias, AliasValue};
use regex::Regex;
use std::sync::LazyLock;

static RE_ALIAS_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\| '([^']+)'(?: # (.+))?$").unwrap());

/// Parse an alias chunk. Returns None unless the `@alias` line is followed
/// exclusively by value lines (blank comment lines aside) and there is at
/// least one value.
pub fn parse_alias(lines: &[String]) -> Option<Alias> {
    let body: Vec<&str> = lines.iter().map(|l| strip_marker(l)).collect();
    let start = body.iter().position(|l| tag_word(l) == Some("@alias"))?;
    let name = body[start].split_whitespace().nth(1)?.to_string();

    let mut values = Vec::new();
    for line in &body[start + 1..] {
        if line.trim().is_empty() {
            continue;
        }
        let caps = RE_ALIAS_VALUE.captures(line.trim_end())?;
        values.push(AliasValue {
            value: caps[1].to_string(),
            desc: caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default(),
        });
    }

    if values.is_empty() {
        return None;
    }
    Some(Alias { name, values })
}
