//! # jasque-vault
//!
//! Async file system operations for a Jasque vault.
//!
//! The vault is a plain directory of markdown notes and is the only source
//! of truth: every call reads what is on disk and nothing is cached.
//! [`VaultManager`] is the single entry point:
//! - path containment ([`VaultManager::validate_path`])
//! - note CRUD and task completion
//! - listings, text/tag/name search, backlinks and task queries
//! - folder management and the vault tree
//! - the user preferences note
//!
//! Writes go through a temp file and a rename, so readers never observe a
//! half-written note.

pub mod manager;
mod notes;
mod preferences;
mod query;
mod structure;
pub mod walk;

pub use manager::VaultManager;
pub use walk::NoteWalker;
