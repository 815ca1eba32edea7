//! `manage_notes`: create, read, update, append, delete notes and complete tasks.

use std::fmt;

use jasque_core::VaultError;
use jasque_vault::VaultManager;
use serde::{Deserialize, Serialize};

use crate::bulk::{bulk_message, BulkError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NoteOperation {
    Read,
    Create,
    Update,
    Append,
    Delete,
    CompleteTask,
}

impl NoteOperation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Create => "create",
            Self::Update => "update",
            Self::Append => "append",
            Self::Delete => "delete",
            Self::CompleteTask => "complete_task",
        }
    }
}

impl fmt::Display for NoteOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One item of a bulk `manage_notes` call.
#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
pub struct BulkNoteItem {
    /// Note path relative to the vault root
    pub path: String,
    /// Content for create/update/append
    pub content: Option<String>,
    /// Target folder for create (prepended to path)
    pub folder: Option<String>,
    /// Line number or task text for complete_task
    pub task_identifier: Option<String>,
}

/// Request for the `manage_notes` tool.
#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
pub struct ManageNotesRequest {
    /// One of: read, create, update, append, delete, complete_task
    pub operation: NoteOperation,
    /// Note path relative to the vault root (e.g. "projects/roadmap.md")
    #[serde(default)]
    pub path: String,
    /// Note content for create/update/append
    pub content: Option<String>,
    /// Target folder for create (prepended to path)
    pub folder: Option<String>,
    /// Line number or task text for complete_task
    pub task_identifier: Option<String>,
    /// Apply the operation to every entry of `items` instead of `path`
    #[serde(default)]
    pub bulk: bool,
    /// Items for bulk mode
    pub items: Option<Vec<BulkNoteItem>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteOperationResult {
    pub success: bool,
    pub operation: NoteOperation,
    pub path: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affected_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<BulkError>>,
}

impl NoteOperationResult {
    fn ok(operation: NoteOperation, path: impl Into<String>, message: String) -> Self {
        Self {
            success: true,
            operation,
            path: path.into(),
            message,
            content: None,
            affected_count: None,
            errors: None,
        }
    }

    fn failed(
        operation: NoteOperation,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            ..Self::ok(operation, path, message.into())
        }
    }
}

/// Run a `manage_notes` request against the vault.
///
/// Vault errors never escape: they come back as a failed result carrying
/// the error message.
pub async fn manage_notes(
    vault: &VaultManager,
    request: ManageNotesRequest,
) -> NoteOperationResult {
    let operation = request.operation;
    tracing::info!(
        %operation,
        path = %request.path,
        bulk = request.bulk,
        "vault.tool.manage_notes_started"
    );

    if request.bulk {
        return match request.items.filter(|items| !items.is_empty()) {
            Some(items) => run_bulk(vault, operation, &items).await,
            None => {
                NoteOperationResult::failed(operation, "", "Bulk mode requires items parameter.")
            }
        };
    }

    match run_single(vault, &request).await {
        Ok(result) => result,
        Err(err) => {
            tracing::error!(
                %operation,
                path = %request.path,
                kind = err.kind(),
                error = %err,
                "vault.tool.manage_notes_failed"
            );
            NoteOperationResult::failed(operation, request.path, err.to_string())
        }
    }
}

async fn run_single(
    vault: &VaultManager,
    request: &ManageNotesRequest,
) -> Result<NoteOperationResult, VaultError> {
    let operation = request.operation;
    let path = request.path.as_str();
    let content = request.content.as_deref().filter(|c| !c.is_empty());

    let result = match operation {
        NoteOperation::Read => {
            let note = vault.read_note(path).await?;
            NoteOperationResult {
                content: Some(note.content),
                ..NoteOperationResult::ok(
                    operation,
                    path,
                    format!("Successfully read note: {path}"),
                )
            }
        }
        NoteOperation::Create => {
            let Some(content) = content else {
                return Ok(content_required(operation, path));
            };
            let note = vault
                .create_note(path, content, request.folder.as_deref())
                .await?;
            let message = format!("Successfully created note: {}", note.path);
            NoteOperationResult::ok(operation, note.path, message)
        }
        NoteOperation::Update => {
            let Some(content) = content else {
                return Ok(content_required(operation, path));
            };
            vault.update_note(path, content, true).await?;
            NoteOperationResult::ok(operation, path, format!("Successfully updated note: {path}"))
        }
        NoteOperation::Append => {
            let Some(content) = content else {
                return Ok(content_required(operation, path));
            };
            vault.append_note(path, content).await?;
            NoteOperationResult::ok(
                operation,
                path,
                format!("Successfully appended to note: {path}"),
            )
        }
        NoteOperation::Delete => {
            vault.delete_note(path).await?;
            NoteOperationResult::ok(operation, path, format!("Successfully deleted note: {path}"))
        }
        NoteOperation::CompleteTask => {
            let identifier = request.task_identifier.as_deref().filter(|i| !i.is_empty());
            let Some(identifier) = identifier else {
                return Ok(NoteOperationResult::failed(
                    operation,
                    path,
                    "Task identifier is required for complete_task operation.",
                ));
            };
            let task = vault.complete_task(path, identifier).await?;
            NoteOperationResult::ok(
                operation,
                path,
                format!("Successfully completed task: '{}'", task.task_text),
            )
        }
    };
    Ok(result)
}

fn content_required(operation: NoteOperation, path: &str) -> NoteOperationResult {
    NoteOperationResult::failed(
        operation,
        path,
        format!("Content is required for {operation} operation."),
    )
}

async fn run_bulk(
    vault: &VaultManager,
    operation: NoteOperation,
    items: &[BulkNoteItem],
) -> NoteOperationResult {
    let mut affected = 0;
    let mut errors = Vec::new();

    for item in items {
        match apply_item(vault, operation, item).await {
            Ok(()) => affected += 1,
            Err(error) => errors.push(BulkError {
                path: item.path.clone(),
                error,
            }),
        }
    }

    tracing::info!(
        %operation,
        affected,
        failed = errors.len(),
        "vault.tool.manage_notes_bulk_completed"
    );
    NoteOperationResult {
        success: errors.is_empty(),
        affected_count: Some(affected),
        message: bulk_message(operation.as_str(), affected, errors.len()),
        errors: (!errors.is_empty()).then_some(errors),
        ..NoteOperationResult::ok(operation, "", String::new())
    }
}

async fn apply_item(
    vault: &VaultManager,
    operation: NoteOperation,
    item: &BulkNoteItem,
) -> Result<(), String> {
    let path = item.path.as_str();
    let content = item.content.as_deref().filter(|c| !c.is_empty());
    let needs_content = || "Content required".to_string();

    let outcome = match operation {
        NoteOperation::Read => vault.read_note(path).await.map(drop),
        NoteOperation::Create => {
            let content = content.ok_or_else(needs_content)?;
            vault
                .create_note(path, content, item.folder.as_deref())
                .await
                .map(drop)
        }
        NoteOperation::Update => {
            let content = content.ok_or_else(needs_content)?;
            vault.update_note(path, content, true).await.map(drop)
        }
        NoteOperation::Append => {
            let content = content.ok_or_else(needs_content)?;
            vault.append_note(path, content).await.map(drop)
        }
        NoteOperation::Delete => vault.delete_note(path).await,
        NoteOperation::CompleteTask => {
            let identifier = item
                .task_identifier
                .as_deref()
                .filter(|i| !i.is_empty())
                .ok_or_else(|| "Task identifier required".to_string())?;
            vault.complete_task(path, identifier).await.map(drop)
        }
    };
    outcome.map_err(|err| err.to_string())
}
