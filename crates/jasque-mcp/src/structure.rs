//! `manage_structure`: folders, moves and the vault tree.

use std::fmt;

use jasque_core::{FolderNode, VaultError};
use jasque_vault::VaultManager;
use serde::{Deserialize, Serialize};

use crate::bulk::{bulk_message, BulkError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StructureOperation {
    CreateFolder,
    Rename,
    DeleteFolder,
    Move,
    ListStructure,
}

impl StructureOperation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateFolder => "create_folder",
            Self::Rename => "rename",
            Self::DeleteFolder => "delete_folder",
            Self::Move => "move",
            Self::ListStructure => "list_structure",
        }
    }
}

impl fmt::Display for StructureOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
pub struct BulkStructureItem {
    /// Current path of the note or folder
    pub path: String,
    /// Destination path
    pub new_path: String,
}

/// Request for the `manage_structure` tool.
#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
pub struct ManageStructureRequest {
    /// One of: create_folder, rename, delete_folder, move, list_structure
    pub operation: StructureOperation,
    /// Folder or note path relative to the vault root
    #[serde(default)]
    pub path: String,
    /// Destination for rename and move
    pub new_path: Option<String>,
    /// Delete a folder even if it has contents
    #[serde(default)]
    pub force: bool,
    /// Apply a move or rename to every entry of `items`
    #[serde(default)]
    pub bulk: bool,
    /// Items for bulk mode
    pub items: Option<Vec<BulkStructureItem>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureOperationResult {
    pub success: bool,
    pub operation: StructureOperation,
    pub path: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affected_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<BulkError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structure: Option<Vec<FolderNode>>,
}

impl StructureOperationResult {
    fn ok(operation: StructureOperation, path: impl Into<String>, message: String) -> Self {
        Self {
            success: true,
            operation,
            path: path.into(),
            message,
            new_path: None,
            affected_count: None,
            errors: None,
            structure: None,
        }
    }

    fn failed(
        operation: StructureOperation,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            ..Self::ok(operation, path, message.into())
        }
    }
}

/// Run a `manage_structure` request against the vault.
pub async fn manage_structure(
    vault: &VaultManager,
    request: ManageStructureRequest,
) -> StructureOperationResult {
    let operation = request.operation;
    tracing::info!(
        %operation,
        path = %request.path,
        bulk = request.bulk,
        "vault.tool.manage_structure_started"
    );

    if request.bulk {
        if !matches!(operation, StructureOperation::Move | StructureOperation::Rename) {
            return StructureOperationResult::failed(
                operation,
                "",
                format!("Bulk mode only supports move and rename operations, not {operation}."),
            );
        }
        return match request.items.filter(|items| !items.is_empty()) {
            Some(items) => run_bulk(vault, operation, &items).await,
            None => StructureOperationResult::failed(
                operation,
                "",
                "Bulk mode requires items parameter.",
            ),
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
                "vault.tool.manage_structure_failed"
            );
            StructureOperationResult::failed(operation, request.path, err.to_string())
        }
    }
}

async fn run_single(
    vault: &VaultManager,
    request: &ManageStructureRequest,
) -> Result<StructureOperationResult, VaultError> {
    let operation = request.operation;
    let path = request.path.as_str();

    if path.is_empty() && operation != StructureOperation::ListStructure {
        return Ok(StructureOperationResult::failed(
            operation,
            "",
            format!("Path is required for {operation} operation."),
        ));
    }

    let result = match operation {
        StructureOperation::CreateFolder => {
            let folder = vault.create_folder(path).await?;
            let message = format!("Successfully created folder: {}", folder.path);
            StructureOperationResult::ok(operation, folder.path, message)
        }
        StructureOperation::Rename | StructureOperation::Move => {
            let Some(new_path) = request.new_path.as_deref().filter(|p| !p.is_empty()) else {
                return Ok(StructureOperationResult::failed(
                    operation,
                    path,
                    format!("new_path is required for {operation} operation."),
                ));
            };
            let (moved, verb) = if operation == StructureOperation::Rename {
                (vault.rename(path, new_path).await?, "renamed")
            } else {
                (vault.move_entry(path, new_path).await?, "moved")
            };
            let destination = moved.path().to_string();
            StructureOperationResult {
                new_path: Some(destination.clone()),
                ..StructureOperationResult::ok(
                    operation,
                    path,
                    format!("Successfully {verb} {path} to {destination}"),
                )
            }
        }
        StructureOperation::DeleteFolder => {
            vault.delete_folder(path, request.force).await?;
            StructureOperationResult::ok(
                operation,
                path,
                format!("Successfully deleted folder: {path}"),
            )
        }
        StructureOperation::ListStructure => {
            let scope = (!path.is_empty()).then_some(path);
            let structure = vault.list_structure(scope).await?;
            let count: usize = structure.iter().map(|node| 1 + node.descendant_count()).sum();
            StructureOperationResult {
                structure: Some(structure),
                ..StructureOperationResult::ok(
                    operation,
                    path,
                    format!("Found {count} items in structure"),
                )
            }
        }
    };
    Ok(result)
}

async fn run_bulk(
    vault: &VaultManager,
    operation: StructureOperation,
    items: &[BulkStructureItem],
) -> StructureOperationResult {
    let mut affected = 0;
    let mut errors = Vec::new();

    for item in items {
        let outcome = if operation == StructureOperation::Rename {
            vault.rename(&item.path, &item.new_path).await
        } else {
            vault.move_entry(&item.path, &item.new_path).await
        };
        match outcome {
            Ok(_) => affected += 1,
            Err(err) => errors.push(BulkError {
                path: item.path.clone(),
                error: err.to_string(),
            }),
        }
    }

    tracing::info!(
        %operation,
        affected,
        failed = errors.len(),
        "vault.tool.manage_structure_bulk_completed"
    );
    StructureOperationResult {
        success: errors.is_empty(),
        affected_count: Some(affected),
        message: bulk_message(operation.as_str(), affected, errors.len()),
        errors: (!errors.is_empty()).then_some(errors),
        ..StructureOperationResult::ok(operation, "", String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn setup_vault() -> (TempDir, VaultManager) {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("inbox")).unwrap();
        std::fs::write(root.join("inbox/a.md"), "A").unwrap();
        std::fs::write(root.join("inbox/b.md"), "B").unwrap();
        let vault = VaultManager::new(root).unwrap();
        (dir, vault)
    }

    fn request(value: serde_json::Value) -> ManageStructureRequest {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn create_folder_reports_path() {
        let (dir, vault) = setup_vault();
        let result = manage_structure(
            &vault,
            request(json!({"operation": "create_folder", "path": "archive/2024"})),
        )
        .await;
        assert!(result.success, "{}", result.message);
        assert_eq!(result.message, "Successfully created folder: archive/2024");
        assert!(dir.path().join("archive/2024").is_dir());
    }

    #[tokio::test]
    async fn path_is_required() {
        let (_dir, vault) = setup_vault();
        let result = manage_structure(&vault, request(json!({"operation": "delete_folder"}))).await;
        assert!(!result.success);
        assert_eq!(result.message, "Path is required for delete_folder operation.");
    }

    #[tokio::test]
    async fn move_requires_new_path() {
        let (_dir, vault) = setup_vault();
        let result = manage_structure(
            &vault,
            request(json!({"operation": "move", "path": "inbox/a.md"})),
        )
        .await;
        assert!(!result.success);
        assert_eq!(result.message, "new_path is required for move operation.");
    }

    #[tokio::test]
    async fn move_creates_parents_and_reports_destination() {
        let (dir, vault) = setup_vault();
        let result = manage_structure(
            &vault,
            request(json!({
                "operation": "move",
                "path": "inbox/a.md",
                "new_path": "done/2025/a.md"
            })),
        )
        .await;
        assert!(result.success, "{}", result.message);
        assert_eq!(result.new_path.as_deref(), Some("done/2025/a.md"));
        assert_eq!(result.message, "Successfully moved inbox/a.md to done/2025/a.md");
        assert!(dir.path().join("done/2025/a.md").is_file());
    }

    #[tokio::test]
    async fn non_empty_folder_needs_force() {
        let (dir, vault) = setup_vault();
        let result = manage_structure(
            &vault,
            request(json!({"operation": "delete_folder", "path": "inbox"})),
        )
        .await;
        assert!(!result.success);
        assert!(result.message.starts_with("Folder not empty: inbox"));

        let result = manage_structure(
            &vault,
            request(json!({"operation": "delete_folder", "path": "inbox", "force": true})),
        )
        .await;
        assert!(result.success);
        assert!(!dir.path().join("inbox").exists());
    }

    #[tokio::test]
    async fn vault_root_is_never_deleted_or_moved() {
        let (dir, vault) = setup_vault();
        let result = manage_structure(
            &vault,
            request(json!({"operation": "delete_folder", "path": ".", "force": true})),
        )
        .await;
        assert!(!result.success);
        assert!(result.message.starts_with("Access denied"));

        let result = manage_structure(
            &vault,
            request(json!({"operation": "move", "path": "inbox/..", "new_path": "elsewhere"})),
        )
        .await;
        assert!(!result.success);
        assert!(result.message.starts_with("Access denied"));
        assert!(dir.path().join("inbox/a.md").is_file());
    }

    #[tokio::test]
    async fn list_structure_counts_every_node() {
        let (_dir, vault) = setup_vault();
        let result =
            manage_structure(&vault, request(json!({"operation": "list_structure"}))).await;
        assert!(result.success);
        assert_eq!(result.message, "Found 3 items in structure");
        assert_eq!(result.structure.unwrap()[0].name, "inbox");
    }

    #[tokio::test]
    async fn bulk_rejects_other_operations() {
        let (_dir, vault) = setup_vault();
        let result = manage_structure(
            &vault,
            request(json!({"operation": "delete_folder", "bulk": true, "items": []})),
        )
        .await;
        assert!(!result.success);
        assert_eq!(
            result.message,
            "Bulk mode only supports move and rename operations, not delete_folder."
        );
    }

    #[tokio::test]
    async fn bulk_move_collects_failures() {
        let (_dir, vault) = setup_vault();
        let result = manage_structure(
            &vault,
            request(json!({
                "operation": "move",
                "bulk": true,
                "items": [
                    {"path": "inbox/a.md", "new_path": "done/a.md"},
                    {"path": "inbox/missing.md", "new_path": "done/missing.md"},
                    {"path": "inbox/b.md", "new_path": "done/b.md"}
                ]
            })),
        )
        .await;
        assert!(!result.success);
        assert_eq!(result.affected_count, Some(2));
        let errors = result.errors.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "inbox/missing.md");
        assert!(errors[0].error.starts_with("Note not found"));
    }
}
