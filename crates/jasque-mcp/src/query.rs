//! `query_vault`: search and browse the vault.

use std::fmt;

use chrono::{DateTime, Utc};
use jasque_core::{NoteInfo, VaultError};
use jasque_vault::VaultManager;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QueryOperation {
    SearchText,
    FindByTag,
    FindByName,
    ListNotes,
    ListFolders,
    GetBacklinks,
    GetTags,
    ListTasks,
}

impl QueryOperation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SearchText => "search_text",
            Self::FindByTag => "find_by_tag",
            Self::FindByName => "find_by_name",
            Self::ListNotes => "list_notes",
            Self::ListFolders => "list_folders",
            Self::GetBacklinks => "get_backlinks",
            Self::GetTags => "get_tags",
            Self::ListTasks => "list_tasks",
        }
    }
}

impl fmt::Display for QueryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much of each hit to return.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// Paths and titles only
    #[default]
    Concise,
    /// Adds snippets, tags and timestamps
    Detailed,
}

/// Request for the `query_vault` tool.
#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
pub struct QueryVaultRequest {
    /// One of: search_text, find_by_tag, find_by_name, list_notes, list_folders,
    /// get_backlinks, get_tags, list_tasks
    pub operation: QueryOperation,
    /// Search string for search_text and find_by_name (case-insensitive)
    pub query: Option<String>,
    /// Folder or note path to scope the operation; omit for the whole vault
    pub path: Option<String>,
    /// Tags for find_by_tag; a note matches if it has any of them
    pub tags: Option<Vec<String>>,
    /// For list_tasks, include completed tasks
    #[serde(default)]
    pub include_completed: bool,
    /// "concise" (default) or "detailed"
    #[serde(default)]
    pub response_format: ResponseFormat,
    /// Maximum results to return (default 50)
    pub limit: Option<usize>,
}

/// One hit. Which fields are set depends on the operation and format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResultItem {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    pub success: bool,
    pub operation: QueryOperation,
    pub total_count: usize,
    pub results: Vec<QueryResultItem>,
    pub truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl QueryResult {
    fn failed(operation: QueryOperation, message: impl Into<String>) -> Self {
        Self {
            success: false,
            operation,
            total_count: 0,
            results: Vec::new(),
            truncated: false,
            message: Some(message.into()),
        }
    }
}

/// Run a `query_vault` request. `default_limit` applies when the request
/// carries no limit.
pub async fn query_vault(
    vault: &VaultManager,
    request: QueryVaultRequest,
    default_limit: usize,
) -> QueryResult {
    let operation = request.operation;
    let limit = request.limit.unwrap_or(default_limit).max(1);
    tracing::info!(
        %operation,
        path = ?request.path,
        query = ?request.query,
        tags = ?request.tags,
        "vault.tool.query_started"
    );

    if let Some(message) = missing_parameter(&request) {
        return QueryResult::failed(operation, message);
    }

    let items = match collect(vault, &request, limit).await {
        Ok(items) => items,
        Err(err) => {
            tracing::error!(%operation, kind = err.kind(), error = %err, "vault.tool.query_failed");
            return QueryResult::failed(operation, err.to_string());
        }
    };

    let truncated = items.len() >= limit;
    tracing::info!(%operation, count = items.len(), truncated, "vault.tool.query_completed");
    QueryResult {
        success: true,
        operation,
        total_count: items.len(),
        message: items.is_empty().then(|| {
            "No results found. Try broadening your search or checking the path.".to_string()
        }),
        results: items,
        truncated,
    }
}

fn missing_parameter(request: &QueryVaultRequest) -> Option<&'static str> {
    let has_query = request.query.as_deref().is_some_and(|q| !q.is_empty());
    match request.operation {
        QueryOperation::SearchText if !has_query => Some(
            "Query parameter is required for search_text operation. Example: query='meeting notes'",
        ),
        QueryOperation::FindByName if !has_query => Some(
            "Query parameter is required for find_by_name operation. Example: query='roadmap'",
        ),
        QueryOperation::FindByTag if request.tags.as_ref().is_none_or(Vec::is_empty) => Some(
            "Tags parameter is required for find_by_tag operation. Example: tags=['project', 'urgent']",
        ),
        QueryOperation::GetBacklinks if request.path.as_deref().is_none_or(str::is_empty) => Some(
            "Path parameter is required for get_backlinks operation. Example: path='concepts/zettelkasten.md'",
        ),
        _ => None,
    }
}

async fn collect(
    vault: &VaultManager,
    request: &QueryVaultRequest,
    limit: usize,
) -> Result<Vec<QueryResultItem>, VaultError> {
    let detailed = request.response_format == ResponseFormat::Detailed;
    let path = request.path.as_deref();
    let query = request.query.as_deref().unwrap_or_default();

    let items = match request.operation {
        QueryOperation::SearchText => vault
            .search_text(query, path, limit)
            .await?
            .into_iter()
            .map(|hit| QueryResultItem {
                path: hit.path,
                title: Some(hit.title),
                snippet: detailed.then_some(hit.snippet),
                line_number: Some(hit.line_number),
                ..QueryResultItem::default()
            })
            .collect(),
        QueryOperation::FindByTag => {
            let tags = request.tags.as_deref().unwrap_or_default();
            note_items(vault.find_by_tag(tags, path, limit).await?, detailed)
        }
        QueryOperation::FindByName => {
            note_items(vault.find_by_name(query, path, limit).await?, detailed)
        }
        QueryOperation::ListNotes => {
            let mut notes = vault.list_notes(path).await?;
            notes.truncate(limit);
            note_items(notes, detailed)
        }
        QueryOperation::ListFolders => vault
            .list_folders(path)
            .await?
            .into_iter()
            .take(limit)
            .map(|folder| QueryResultItem {
                path: folder.path,
                title: Some(folder.name),
                ..QueryResultItem::default()
            })
            .collect(),
        QueryOperation::GetBacklinks => vault
            .get_backlinks(path.unwrap_or_default(), limit)
            .await?
            .into_iter()
            .map(|link| QueryResultItem {
                path: link.path,
                title: Some(link.title),
                snippet: detailed.then_some(link.context),
                ..QueryResultItem::default()
            })
            .collect(),
        QueryOperation::GetTags => vault
            .get_tags()
            .await?
            .into_iter()
            .take(limit)
            .map(|tag| QueryResultItem {
                title: Some(tag),
                ..QueryResultItem::default()
            })
            .collect(),
        QueryOperation::ListTasks => vault
            .list_tasks(path, request.include_completed, limit)
            .await?
            .into_iter()
            .map(|task| QueryResultItem {
                path: task.path,
                task_text: Some(task.task_text),
                task_completed: Some(task.completed),
                line_number: Some(task.line_number),
                ..QueryResultItem::default()
            })
            .collect(),
    };
    Ok(items)
}

fn note_items(notes: Vec<NoteInfo>, detailed: bool) -> Vec<QueryResultItem> {
    notes
        .into_iter()
        .map(|note| QueryResultItem {
            path: note.path,
            title: Some(note.title),
            tags: detailed.then_some(note.tags),
            modified: if detailed { note.modified } else { None },
            ..QueryResultItem::default()
        })
        .collect()
}
