//! Note metadata extraction: titles, tags and wikilinks.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde_yaml::Value;

use crate::frontmatter::{parse_frontmatter, scalar_text};

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#([a-zA-Z][a-zA-Z0-9_/-]*)").expect("tag regex"));
static WIKILINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\]|]+)(?:\|[^\]]+)?\]\]").expect("wikilink regex"));

/// Longest snippet or context line returned by queries, in characters.
pub const SNIPPET_MAX_CHARS: usize = 200;

/// Title and tags derived from a note's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteMetadata {
    pub title: String,
    pub tags: Vec<String>,
}

impl NoteMetadata {
    /// Derive title and tags from a note, parsing its header once.
    ///
    /// The title comes from the header's `title` field, falling back to
    /// `stem`. Tags are the union of the header's `tags` field and inline
    /// `#tag` tokens, sorted and deduplicated. A malformed header is treated
    /// as absent.
    #[must_use]
    pub fn extract(stem: &str, content: &str) -> Self {
        let mut tags = BTreeSet::new();
        let mut title = None;

        if let Ok(Some(fm)) = parse_frontmatter(content) {
            title = fm.mapping.get("title").and_then(scalar_text);
            match fm.mapping.get("tags") {
                Some(Value::Sequence(items)) => {
                    tags.extend(items.iter().filter_map(scalar_text));
                }
                Some(value) => tags.extend(scalar_text(value)),
                None => {}
            }
        }

        tags.extend(inline_tags(content).map(str::to_string));

        Self {
            title: title.unwrap_or_else(|| stem.to_string()),
            tags: tags.into_iter().collect(),
        }
    }
}

/// Title of a note: header `title` if present, otherwise `stem`.
#[must_use]
pub fn note_title(stem: &str, content: &str) -> String {
    NoteMetadata::extract(stem, content).title
}

/// Sorted, unique tags of a note.
#[must_use]
pub fn note_tags(content: &str) -> Vec<String> {
    NoteMetadata::extract("", content).tags
}

/// Inline `#tag` tokens, without the leading `#`, in order of appearance.
pub fn inline_tags(content: &str) -> impl Iterator<Item = &str> {
    TAG_RE
        .captures_iter(content)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str())
}

/// Normalize a tag for comparison: lowercase, leading `#` removed.
#[must_use]
pub fn normalize_tag(tag: &str) -> String {
    tag.to_lowercase().trim_start_matches('#').to_string()
}

/// Normalize a note name for fuzzy comparison.
///
/// Case is folded and `-`, `_` and spaces are treated as equivalent.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase().replace(['-', '_'], " ")
}

/// Targets of every `[[name]]` / `[[name|alias]]` link in the content.
pub fn wikilink_targets(content: &str) -> impl Iterator<Item = &str> {
    WIKILINK_RE
        .captures_iter(content)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str())
}

/// Whether the content links to the note named `name`.
#[must_use]
pub fn links_to(content: &str, name: &str) -> bool {
    wikilink_targets(content).any(|target| target == name)
}

/// First line linking to `name`, trimmed and shortened to a snippet.
#[must_use]
pub fn link_context(content: &str, name: &str) -> Option<String> {
    let plain = format!("[[{name}]]");
    let aliased = format!("[[{name}|");
    content
        .split('\n')
        .find(|line| line.contains(&plain) || line.contains(&aliased))
        .map(snippet)
}

/// Trim a line and cut it to [`SNIPPET_MAX_CHARS`] characters.
#[must_use]
pub fn snippet(line: &str) -> String {
    line.trim().chars().take(SNIPPET_MAX_CHARS).collect()
}
