//! # jasque-core
//!
//! Core types and text parsing for Jasque vaults.
//!
//! This crate defines everything that can be decided from a note's text
//! alone, without touching the filesystem:
//! - Result types ([`NoteInfo`], [`NoteContent`], [`FolderNode`], [`TaskInfo`], ...)
//! - Error hierarchy ([`VaultError`], [`FrontmatterError`])
//! - Frontmatter splitting and rendering ([`frontmatter`])
//! - Titles, tags and wikilinks ([`note`])
//! - Checkbox tasks ([`task`])
//! - User preferences and their agent-facing rendering ([`preferences`])

pub mod error;
pub mod frontmatter;
pub mod note;
pub mod preferences;
pub mod task;
pub mod types;

pub use error::{FrontmatterError, Result, VaultError};
pub use frontmatter::Metadata;
pub use note::NoteMetadata;
pub use preferences::{
    format_preferences_for_agent, DefaultFolders, PreferenceWarning, ResponseStyle,
    UserPreferences, VaultPreferences,
};
pub use task::Checkbox;
pub use types::{
    BacklinkResult, FolderInfo, FolderNode, MovedEntry, NodeKind, NoteContent, NoteInfo,
    SearchResult, TaskInfo,
};
