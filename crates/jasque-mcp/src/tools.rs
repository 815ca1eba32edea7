//! MCP tool definitions for Jasque vault operations.

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ServerHandler,
};
use serde::Serialize;

use jasque_core::format_preferences_for_agent;
use jasque_vault::VaultManager;

use crate::notes::{self, ManageNotesRequest};
use crate::query::{self, QueryVaultRequest};
use crate::structure::{self, ManageStructureRequest};

/// Limit applied to `query_vault` when the caller sends none.
pub const DEFAULT_QUERY_LIMIT: usize = 50;

/// Jasque MCP server exposing the vault tools.
#[derive(Debug, Clone)]
pub struct JasqueMcpService {
    vault: VaultManager,
    default_limit: usize,
    tool_router: ToolRouter<Self>,
}

impl JasqueMcpService {
    pub fn new(vault: VaultManager) -> Self {
        Self::with_default_limit(vault, DEFAULT_QUERY_LIMIT)
    }

    /// Like [`JasqueMcpService::new`] with a custom `query_vault` limit.
    /// Zero is raised to one.
    pub fn with_default_limit(vault: VaultManager, default_limit: usize) -> Self {
        Self {
            vault,
            default_limit: default_limit.max(1),
            tool_router: Self::tool_router(),
        }
    }

    pub fn vault(&self) -> &VaultManager {
        &self.vault
    }
}

#[derive(Debug, Serialize)]
struct PreferencesResult {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    preferences: Option<String>,
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| {
            format!("{{\"success\": false, \"message\": \"Serialization failed: {e}\"}}")
        })
}

#[tool_router]
impl JasqueMcpService {
    /// Create, read, update, append, delete notes and complete tasks.
    #[tool(
        description = "Manage notes in the vault: read, create, update, append, delete, and complete_task \
                       (marks a '- [ ]' checkbox as '- [x]' by line number or task text). \
                       Update keeps the note's existing frontmatter. Set bulk=true with items to apply \
                       one operation to many notes. Do not use this to find notes; use query_vault."
    )]
    async fn manage_notes(&self, Parameters(req): Parameters<ManageNotesRequest>) -> String {
        to_json(&notes::manage_notes(&self.vault, req).await)
    }

    /// Search and browse the vault.
    #[tool(
        description = "Search and query the vault: search_text (requires query), find_by_tag (requires tags, \
                       matches any), find_by_name (requires query), list_notes, list_folders, get_backlinks \
                       (requires path), get_tags, list_tasks. Start with response_format='concise' and a \
                       small limit; use 'detailed' only when snippets, tags or timestamps are needed."
    )]
    async fn query_vault(&self, Parameters(req): Parameters<QueryVaultRequest>) -> String {
        to_json(&query::query_vault(&self.vault, req, self.default_limit).await)
    }

    /// Folder operations and the vault tree.
    #[tool(
        description = "Manage vault structure: create_folder, rename, move (creates destination folders), \
                       delete_folder (force=true for non-empty folders), list_structure. Bulk mode \
                       (bulk=true with items) supports move and rename only."
    )]
    async fn manage_structure(
        &self,
        Parameters(req): Parameters<ManageStructureRequest>,
    ) -> String {
        to_json(&structure::manage_structure(&self.vault, req).await)
    }

    /// The user's preferences note, rendered for the agent.
    #[tool(
        description = "Read the user's preferences (date and time formats, default folders, response style) \
                       and any additional context they wrote in _jasque/preferences.md"
    )]
    async fn get_preferences(&self) -> String {
        let result = match self.vault.load_preferences().await {
            Ok(Some(prefs)) => PreferencesResult {
                success: true,
                message: "Loaded user preferences".to_string(),
                preferences: Some(format_preferences_for_agent(&prefs)),
            },
            Ok(None) => PreferencesResult {
                success: true,
                message: "No preferences set. Create _jasque/preferences.md to add some.".to_string(),
                preferences: None,
            },
            Err(err) => {
                tracing::error!(
                    kind = err.kind(),
                    error = %err,
                    "vault.tool.get_preferences_failed"
                );
                PreferencesResult {
                    success: false,
                    message: err.to_string(),
                    preferences: None,
                }
            }
        };
        to_json(&result)
    }
}

#[tool_handler]
impl ServerHandler for JasqueMcpService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Jasque vault server. Manage Markdown notes and folders, search by text, tag or name, \
                 follow backlinks, track checkbox tasks, and read the user's preferences."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
