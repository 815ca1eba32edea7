//! # jasque-mcp
//!
//! MCP (Model Context Protocol) server for Jasque vaults.
//!
//! Exposes vault operations as MCP tools:
//! - `manage_notes`: read, create, update, append, delete notes; complete tasks
//! - `query_vault`: text, tag and name search, listings, backlinks, tags, tasks
//! - `manage_structure`: create/rename/move/delete folders, vault tree
//! - `get_preferences`: the user's preferences note, rendered for the agent
//!
//! Every tool answers with a JSON envelope carrying `success` and a
//! `message`. Vault errors are reported there, never as protocol errors.

mod bulk;
pub mod notes;
pub mod query;
pub mod structure;
pub mod tools;

pub use bulk::BulkError;
pub use notes::{manage_notes, ManageNotesRequest, NoteOperation, NoteOperationResult};
pub use query::{query_vault, QueryOperation, QueryResult, QueryVaultRequest, ResponseFormat};
pub use structure::{
    manage_structure, ManageStructureRequest, StructureOperation, StructureOperationResult,
};
pub use tools::{JasqueMcpService, DEFAULT_QUERY_LIMIT};
