//! Note CRUD and task completion.

use std::path::Path;

use jasque_core::error::{Result, VaultError};
use jasque_core::frontmatter::{parse_frontmatter, render_frontmatter, to_metadata, Metadata};
use jasque_core::note::NoteMetadata;
use jasque_core::task::{mark_complete, resolve_checkbox, scan_checkboxes};
use jasque_core::types::{NoteContent, TaskInfo};
use tokio::fs;

use crate::manager::{stem_of, VaultManager};

impl VaultManager {
    /// Create a note at `folder/path`, appending `.md` if missing.
    ///
    /// Missing parent folders are created.
    ///
    /// # Errors
    ///
    /// [`VaultError::NoteAlreadyExists`] if something is already at that
    /// path, [`VaultError::PathTraversal`] if it leaves the vault.
    pub async fn create_note(
        &self,
        path: &str,
        content: &str,
        folder: Option<&str>,
    ) -> Result<NoteContent> {
        let mut relative = match folder.filter(|f| !f.is_empty()) {
            Some(folder) => format!(
                "{}/{}",
                folder.trim_end_matches('/'),
                path.trim_start_matches('/')
            ),
            None => path.to_string(),
        };
        if !relative.ends_with(".md") {
            relative.push_str(".md");
        }

        let abs = self.validate_path(&relative).await?;
        if self.exists(&abs).await {
            return Err(VaultError::NoteAlreadyExists(relative));
        }
        if let Some(parent) = abs.parent() {
            fs::create_dir_all(parent).await?;
        }

        self.atomic_write(&abs, content).await?;
        tracing::info!(path = %relative, "vault.notes.create_completed");
        self.load_note(&abs, &relative).await
    }

    /// Read a note's body and header metadata.
    ///
    /// # Errors
    ///
    /// [`VaultError::NoteNotFound`] if the note is missing or unreadable.
    pub async fn read_note(&self, path: &str) -> Result<NoteContent> {
        let abs = self.validate_path(path).await?;
        if !self.is_file(&abs).await {
            return Err(VaultError::NoteNotFound(path.to_string()));
        }
        self.load_note(&abs, path).await
    }

    /// Replace a note's body.
    ///
    /// With `preserve_header`, an existing well-formed header is kept byte
    /// for byte and only the body changes. Otherwise `content` is written as
    /// the whole file.
    ///
    /// # Errors
    ///
    /// [`VaultError::NoteNotFound`] if the note does not exist.
    pub async fn update_note(
        &self,
        path: &str,
        content: &str,
        preserve_header: bool,
    ) -> Result<NoteContent> {
        let abs = self.validate_path(path).await?;
        if !self.is_file(&abs).await {
            return Err(VaultError::NoteNotFound(path.to_string()));
        }

        let existing = if preserve_header {
            self.read_content(&abs).await
        } else {
            None
        };
        let header = existing
            .as_deref()
            .and_then(|text| parse_frontmatter(text).ok().flatten())
            .map(|fm| fm.raw);
        let final_content = match header {
            Some(raw) => render_frontmatter(raw, content),
            None => content.to_string(),
        };

        self.atomic_write(&abs, &final_content).await?;
        tracing::info!(path, preserve_header, "vault.notes.update_completed");
        self.load_note(&abs, path).await
    }

    /// Append text to the end of a note, on a new line.
    ///
    /// # Errors
    ///
    /// [`VaultError::NoteNotFound`] if the note is missing or unreadable.
    pub async fn append_note(&self, path: &str, content: &str) -> Result<NoteContent> {
        let abs = self.validate_path(path).await?;
        if !self.is_file(&abs).await {
            return Err(VaultError::NoteNotFound(path.to_string()));
        }
        let mut existing = self
            .read_content(&abs)
            .await
            .ok_or_else(|| VaultError::NoteNotFound(path.to_string()))?;

        if !existing.is_empty() && !existing.ends_with('\n') {
            existing.push('\n');
        }
        existing.push_str(content);

        self.atomic_write(&abs, &existing).await?;
        tracing::info!(path, "vault.notes.append_completed");
        self.load_note(&abs, path).await
    }

    /// # Errors
    ///
    /// [`VaultError::NoteNotFound`] if the note does not exist.
    pub async fn delete_note(&self, path: &str) -> Result<()> {
        let abs = self.validate_path(path).await?;
        if !self.is_file(&abs).await {
            return Err(VaultError::NoteNotFound(path.to_string()));
        }
        fs::remove_file(&abs).await?;
        tracing::info!(path, "vault.notes.delete_completed");
        Ok(())
    }

    /// Check off one task in a note.
    ///
    /// `identifier` is a line number, the task's exact text, or a fragment
    /// matching exactly one open task. Only the matched checkbox changes.
    ///
    /// # Errors
    ///
    /// [`VaultError::NoteNotFound`] if the note is missing or unreadable,
    /// [`VaultError::TaskNotFound`] if the identifier does not pick exactly
    /// one open task.
    pub async fn complete_task(&self, path: &str, identifier: &str) -> Result<TaskInfo> {
        let abs = self.validate_path(path).await?;
        if !self.is_file(&abs).await {
            return Err(VaultError::NoteNotFound(path.to_string()));
        }
        let content = self
            .read_content(&abs)
            .await
            .ok_or_else(|| VaultError::NoteNotFound(path.to_string()))?;

        let tasks = scan_checkboxes(&content);
        let task = resolve_checkbox(&tasks, identifier, path)?;
        let updated = mark_complete(&content, task);

        self.atomic_write(&abs, &updated).await?;
        tracing::info!(
            path,
            task = %task.text,
            line = task.line_number,
            "vault.notes.complete_task_completed"
        );

        Ok(TaskInfo {
            path: self.rel_path(&abs),
            task_text: task.text.clone(),
            completed: true,
            line_number: task.line_number,
        })
    }

    /// Read and split a note that is known to exist.
    pub(crate) async fn load_note(&self, abs: &Path, requested: &str) -> Result<NoteContent> {
        let content = self
            .read_content(abs)
            .await
            .ok_or_else(|| VaultError::NoteNotFound(requested.to_string()))?;
        let meta = NoteMetadata::extract(&stem_of(abs), &content);

        let (body, metadata) = match parse_frontmatter(&content) {
            Ok(Some(fm)) => (fm.body.to_string(), to_metadata(&fm.mapping)),
            Ok(None) => (content.clone(), Metadata::new()),
            Err(err) => {
                tracing::debug!(path = requested, error = %err, "vault.notes.malformed_header");
                (content.clone(), Metadata::new())
            }
        };

        Ok(NoteContent {
            path: self.rel_path(abs),
            title: meta.title,
            content: body,
            tags: meta.tags,
            metadata,
        })
    }
}
