//! Error types for Jasque.

use thiserror::Error;

/// Top-level result type for vault operations.
pub type Result<T> = std::result::Result<T, VaultError>;

/// Every failure a vault operation can report.
///
/// Callers that only care about "something went wrong" match on the enum as a
/// whole; callers that recover from specific conditions match on the variant.
/// Messages are written for the calling agent and point at the query that
/// would reveal valid inputs.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Access denied: {0}")]
    PathTraversal(String),

    #[error(
        "Note not found: {0}. Use query_vault with operation='list_notes' to see available notes."
    )]
    NoteNotFound(String),

    #[error("Note already exists: {0}. Use operation='update' to modify existing notes.")]
    NoteAlreadyExists(String),

    #[error(
        "Folder not found: {0}. Use query_vault with operation='list_folders' to see available paths."
    )]
    FolderNotFound(String),

    #[error(
        "Folder already exists: {0}. Use a different path or delete the existing folder first."
    )]
    FolderAlreadyExists(String),

    #[error("Folder not empty: {0}. Use force=true or empty the folder first.")]
    FolderNotEmpty(String),

    #[error("{0}")]
    TaskNotFound(String),

    #[error(
        "Invalid YAML in {path}: {message}. Check the file for syntax errors (missing colons, incorrect indentation)."
    )]
    PreferencesParse { path: String, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl VaultError {
    /// Stable snake_case label for logs and tool envelopes.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PathTraversal(_) => "path_traversal",
            Self::NoteNotFound(_) => "note_not_found",
            Self::NoteAlreadyExists(_) => "note_already_exists",
            Self::FolderNotFound(_) => "folder_not_found",
            Self::FolderAlreadyExists(_) => "folder_already_exists",
            Self::FolderNotEmpty(_) => "folder_not_empty",
            Self::TaskNotFound(_) => "task_not_found",
            Self::PreferencesParse { .. } => "preferences_parse",
            Self::Io(_) => "io",
        }
    }
}

/// Errors raised while parsing a note's frontmatter block.
#[derive(Debug, Error)]
pub enum FrontmatterError {
    #[error("invalid YAML frontmatter: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
