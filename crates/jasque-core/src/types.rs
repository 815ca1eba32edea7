//! Values returned by vault operations.
//!
//! Every value is built fresh per call from what is on disk. Paths are
//! relative to the vault root and always use `/` separators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::frontmatter::Metadata;

/// Summary of a note, as listed by queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteInfo {
    pub path: String,
    pub title: String,
    pub tags: Vec<String>,
    pub modified: Option<DateTime<Utc>>,
}

/// A note's body together with its parsed header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteContent {
    pub path: String,
    pub title: String,
    /// Body with the header block removed.
    pub content: String,
    pub tags: Vec<String>,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderInfo {
    pub path: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Folder,
    Note,
}

/// One entry of the vault tree.
///
/// Folders always carry `children` (possibly empty); notes never do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderNode {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FolderNode>>,
}

impl FolderNode {
    #[must_use]
    pub fn folder(name: String, path: String, children: Vec<FolderNode>) -> Self {
        Self {
            name,
            path,
            kind: NodeKind::Folder,
            children: Some(children),
        }
    }

    #[must_use]
    pub fn note(name: String, path: String) -> Self {
        Self {
            name,
            path,
            kind: NodeKind::Note,
            children: None,
        }
    }

    /// Number of nodes in this subtree, excluding `self`.
    #[must_use]
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .flatten()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }
}

/// First matching line of a note for a text search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub path: String,
    pub title: String,
    pub snippet: String,
    /// 1-based.
    pub line_number: usize,
}

/// A note that links to another note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacklinkResult {
    pub path: String,
    pub title: String,
    /// The linking line, trimmed and shortened.
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInfo {
    pub path: String,
    pub task_text: String,
    pub completed: bool,
    pub line_number: usize,
}

/// What ended up at the destination of a rename or move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MovedEntry {
    Note(NoteContent),
    Folder(FolderInfo),
}

impl MovedEntry {
    /// Destination path, relative to the vault root.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Note(note) => &note.path,
            Self::Folder(folder) => &folder.path,
        }
    }
}
