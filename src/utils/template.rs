use regex::{Captures, Regex};
use lazy_static::lazy_static;
use std::collections::HashMap;

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").unwrap();
}

/// Replaces `{{name}}` placeholders with their values in a single pass.
///
/// Values are inserted verbatim: nothing is escaped and placeholders that
/// appear inside a value are left as they are. Unknown names render empty.
pub fn render(template: &str, values: &HashMap<&str, String>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            values.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned()
}
