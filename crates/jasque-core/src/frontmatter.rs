//! YAML frontmatter splitting, parsing and writing.
//!
//! Handles the `---` delimited YAML block at the top of a note:
//! ```markdown
//! ---
//! title: "Weekly Review"
//! tags: [review, weekly]
//! ---
//!
//! ## Body content here
//! ```
//!
//! Unlike a typed document, a note's header is optional and open-ended. Only
//! `title` and `tags` mean anything to the vault; every other key is carried
//! through untouched. Writers keep the raw YAML text so that comments, key
//! order and quoting survive a body update.

use serde_yaml::{Mapping, Value};

use crate::error::FrontmatterError;

/// Dynamically typed header metadata, as exposed on read.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A header block that parsed as YAML.
#[derive(Debug, Clone)]
pub struct Frontmatter<'a> {
    /// The YAML text between the delimiters, without the trailing newline.
    pub raw: &'a str,
    /// Parsed key/value pairs. Empty when the block is empty or not a mapping.
    pub mapping: Mapping,
    /// Everything after the closing delimiter, leading blank lines removed.
    pub body: &'a str,
}

/// Split a note into `(raw_yaml, body)`.
///
/// Returns `None` when the content does not open with a `---` line or the
/// block is never closed; such content is all body.
#[must_use]
pub fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let (first, rest) = content.split_once('\n')?;
    if first.trim_end() != "---" {
        return None;
    }

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = rest[..offset].trim_end_matches(['\r', '\n']);
            let body = rest[offset + line.len()..].trim_start_matches(['\r', '\n']);
            return Some((yaml, body));
        }
        offset += line.len();
    }

    None
}

/// Parse a note's header block.
///
/// `Ok(None)` means the note has no header. A block whose YAML is empty or
/// is not a mapping parses with an empty mapping.
///
/// # Errors
///
/// Returns [`FrontmatterError::Yaml`] if the block is not valid YAML.
pub fn parse_frontmatter(content: &str) -> Result<Option<Frontmatter<'_>>, FrontmatterError> {
    let Some((raw, body)) = split_frontmatter(content) else {
        return Ok(None);
    };

    let mapping = if raw.trim().is_empty() {
        Mapping::new()
    } else {
        match serde_yaml::from_str::<Value>(raw)? {
            Value::Mapping(mapping) => mapping,
            _ => Mapping::new(),
        }
    };

    Ok(Some(Frontmatter { raw, mapping, body }))
}

/// Write a raw header block followed by a body.
#[must_use]
pub fn render_frontmatter(raw_yaml: &str, body: &str) -> String {
    let mut output = String::with_capacity(raw_yaml.len() + body.len() + 10);
    output.push_str("---\n");
    if !raw_yaml.is_empty() {
        output.push_str(raw_yaml);
        output.push('\n');
    }
    output.push_str("---\n");
    if !body.is_empty() {
        output.push('\n');
        output.push_str(body);
    }
    output
}

/// Render a scalar YAML value as plain text. Collections and nulls yield `None`.
#[must_use]
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Convert a parsed header into string-keyed JSON metadata.
///
/// Non-string scalar keys are rendered as text; keys that are collections
/// are dropped. Values that have no JSON form become `null`.
#[must_use]
pub fn to_metadata(mapping: &Mapping) -> Metadata {
    let mut metadata = Metadata::new();
    for (key, value) in mapping {
        let Some(key) = scalar_text(key) else {
            continue;
        };
        let value = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
        metadata.insert(key, value);
    }
    metadata
}
