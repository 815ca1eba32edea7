//! Folder management and the vault tree.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use jasque_core::error::{Result, VaultError};
use jasque_core::types::{FolderInfo, FolderNode, MovedEntry};
use tokio::fs;

use crate::manager::{is_hidden, VaultManager};

type TreeFuture<'a> = Pin<Box<dyn Future<Output = Vec<FolderNode>> + Send + 'a>>;

impl VaultManager {
    /// Create a folder and any missing parents.
    ///
    /// # Errors
    ///
    /// [`VaultError::FolderAlreadyExists`] if anything already exists at `path`.
    pub async fn create_folder(&self, path: &str) -> Result<FolderInfo> {
        let abs = self.validate_path(path).await?;
        if self.exists(&abs).await {
            return Err(VaultError::FolderAlreadyExists(path.to_string()));
        }
        fs::create_dir_all(&abs).await?;
        tracing::info!(path, "vault.structure.folder_created");
        Ok(self.folder_info(&abs))
    }

    /// Rename a note or folder. The destination's parent must already exist.
    ///
    /// # Errors
    ///
    /// See [`VaultManager::move_entry`].
    pub async fn rename(&self, path: &str, new_path: &str) -> Result<MovedEntry> {
        self.relocate(path, new_path, false).await
    }

    /// Move a note or folder, creating the destination's parents as needed.
    ///
    /// # Errors
    ///
    /// A missing source is [`VaultError::NoteNotFound`] when `path` ends in
    /// `.md` and [`VaultError::FolderNotFound`] otherwise. An occupied
    /// destination is [`VaultError::NoteAlreadyExists`] or
    /// [`VaultError::FolderAlreadyExists`] by the same rule on `new_path`.
    /// Either side naming the vault root is [`VaultError::PathTraversal`].
    pub async fn move_entry(&self, path: &str, new_path: &str) -> Result<MovedEntry> {
        self.relocate(path, new_path, true).await
    }

    async fn relocate(
        &self,
        path: &str,
        new_path: &str,
        create_parents: bool,
    ) -> Result<MovedEntry> {
        let from = self.validate_path(path).await?;
        let to = self.validate_path(new_path).await?;
        self.ensure_not_root(&from, path)?;
        self.ensure_not_root(&to, new_path)?;

        if !self.exists(&from).await {
            return Err(if path.ends_with(".md") {
                VaultError::NoteNotFound(path.to_string())
            } else {
                VaultError::FolderNotFound(path.to_string())
            });
        }
        if self.exists(&to).await {
            return Err(if new_path.ends_with(".md") {
                VaultError::NoteAlreadyExists(new_path.to_string())
            } else {
                VaultError::FolderAlreadyExists(new_path.to_string())
            });
        }

        let created = match to.parent() {
            Some(parent) if create_parents => {
                self.create_missing_dirs(parent).await?.map(|top| (parent, top))
            }
            _ => None,
        };
        if let Err(err) = fs::rename(&from, &to).await {
            if let Some((parent, top)) = created {
                remove_created_dirs(parent, &top).await;
            }
            return Err(err.into());
        }

        if create_parents {
            tracing::info!(old_path = path, new_path, "vault.structure.moved");
        } else {
            tracing::info!(old_path = path, new_path, "vault.structure.renamed");
        }

        if self.is_file(&to).await {
            Ok(MovedEntry::Note(self.load_note(&to, new_path).await?))
        } else {
            Ok(MovedEntry::Folder(self.folder_info(&to)))
        }
    }

    /// Delete a folder. Non-empty folders need `force`, which removes
    /// everything inside, hidden files included.
    ///
    /// # Errors
    ///
    /// [`VaultError::FolderNotFound`] if `path` is missing or is a file,
    /// [`VaultError::FolderNotEmpty`] if it has contents and `force` is off,
    /// [`VaultError::PathTraversal`] if `path` names the vault root.
    pub async fn delete_folder(&self, path: &str, force: bool) -> Result<()> {
        let abs = self.validate_path(path).await?;
        self.ensure_not_root(&abs, path)?;
        if !self.is_dir(&abs).await {
            return Err(VaultError::FolderNotFound(path.to_string()));
        }

        let has_entries = fs::read_dir(&abs).await?.next_entry().await?.is_some();
        if has_entries && !force {
            return Err(VaultError::FolderNotEmpty(path.to_string()));
        }

        if has_entries {
            fs::remove_dir_all(&abs).await?;
        } else {
            fs::remove_dir(&abs).await?;
        }
        tracing::info!(path, force, "vault.structure.folder_deleted");
        Ok(())
    }

    /// The folder and note tree below `path` (or the root), sorted by name
    /// at every level.
    ///
    /// # Errors
    ///
    /// [`VaultError::FolderNotFound`] if `path` is given and does not exist.
    pub async fn list_structure(&self, path: Option<&str>) -> Result<Vec<FolderNode>> {
        let scope = path.unwrap_or_default();
        let base = self.validate_path(scope).await?;
        if !scope.is_empty() && !self.exists(&base).await {
            return Err(VaultError::FolderNotFound(scope.to_string()));
        }
        let tree = self.build_tree(&base).await;
        tracing::debug!(path = scope, entries = tree.len(), "vault.structure.listed");
        Ok(tree)
    }

    fn build_tree<'a>(&'a self, dir: &'a Path) -> TreeFuture<'a> {
        Box::pin(async move {
            let mut listed = Vec::new();
            if let Ok(mut entries) = fs::read_dir(dir).await {
                while let Ok(Some(entry)) = entries.next_entry().await {
                    let name = entry.file_name().to_string_lossy().into_owned();
                    // Symlinks are never followed, same as the note walker.
                    match entry.file_type().await {
                        Ok(kind) if !is_hidden(&name) && !kind.is_symlink() => {
                            listed.push((name, kind.is_dir()));
                        }
                        _ => {}
                    }
                }
            }
            listed.sort();

            let mut nodes = Vec::new();
            for (name, is_dir) in listed {
                let child = dir.join(&name);
                if is_dir {
                    let children = self.build_tree(&child).await;
                    nodes.push(FolderNode::folder(name, self.rel_path(&child), children));
                } else if name.ends_with(".md") {
                    nodes.push(FolderNode::note(name, self.rel_path(&child)));
                }
            }
            nodes
        })
    }

    /// Create `dir` and its missing ancestors. Returns the topmost directory
    /// that had to be created, if any.
    async fn create_missing_dirs(&self, dir: &Path) -> Result<Option<PathBuf>> {
        let mut top = None;
        let mut cursor = dir;
        while !self.exists(cursor).await {
            top = Some(cursor.to_path_buf());
            match cursor.parent() {
                Some(parent) => cursor = parent,
                None => break,
            }
        }
        fs::create_dir_all(dir).await?;
        Ok(top)
    }

    fn folder_info(&self, abs: &Path) -> FolderInfo {
        FolderInfo {
            path: self.rel_path(abs),
            name: abs
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }
}

/// Undo [`VaultManager::create_missing_dirs`]: remove `dir` and its parents
/// up to and including `top`, stopping at the first one that is not empty.
async fn remove_created_dirs(dir: &Path, top: &Path) {
    let mut cursor = dir;
    while fs::remove_dir(cursor).await.is_ok() && cursor != top {
        match cursor.parent() {
            Some(parent) => cursor = parent,
            None => break,
        }
    }
}
