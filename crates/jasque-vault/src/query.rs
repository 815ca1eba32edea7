//! Read-only queries over the vault: listings, search, tags, backlinks and tasks.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use jasque_core::error::{Result, VaultError};
use jasque_core::note::{
    link_context, links_to, normalize_name, normalize_tag, snippet, NoteMetadata,
};
use jasque_core::task::scan_checkboxes;
use jasque_core::types::{BacklinkResult, FolderInfo, NoteInfo, SearchResult, TaskInfo};
use tokio::fs;

use crate::manager::{is_hidden, stem_of, VaultManager};
use crate::walk::NoteWalker;

impl VaultManager {
    /// Every note below `folder` (or the whole vault), depth-first.
    ///
    /// Notes that cannot be read are still listed, titled by their file
    /// stem and without tags.
    ///
    /// # Errors
    ///
    /// [`VaultError::FolderNotFound`] if the folder does not exist.
    pub async fn list_notes(&self, folder: Option<&str>) -> Result<Vec<NoteInfo>> {
        let scope = folder.unwrap_or_default();
        let base = self.validate_path(scope).await?;
        if !self.is_dir(&base).await {
            return Err(VaultError::FolderNotFound(scope.to_string()));
        }

        let mut notes = Vec::new();
        let mut walker = NoteWalker::new(base);
        while let Some(path) = walker.next().await {
            let meta = match self.read_content(&path).await {
                Some(content) => NoteMetadata::extract(&stem_of(&path), &content),
                None => NoteMetadata {
                    title: stem_of(&path),
                    tags: Vec::new(),
                },
            };
            notes.push(self.note_info(&path, meta).await);
        }

        tracing::info!(folder = scope, count = notes.len(), "vault.query.list_notes_completed");
        Ok(notes)
    }

    /// Direct sub-folders of `path` (or of the root), sorted by name.
    ///
    /// # Errors
    ///
    /// [`VaultError::FolderNotFound`] if the folder does not exist.
    pub async fn list_folders(&self, path: Option<&str>) -> Result<Vec<FolderInfo>> {
        let scope = path.unwrap_or_default();
        let base = self.validate_path(scope).await?;
        if !self.is_dir(&base).await {
            return Err(VaultError::FolderNotFound(scope.to_string()));
        }

        let mut folders = Vec::new();
        let mut entries = fs::read_dir(&base).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let real_dir = entry.file_type().await.is_ok_and(|kind| kind.is_dir());
            if is_hidden(&name) || !real_dir {
                continue;
            }
            folders.push(FolderInfo {
                path: self.rel_path(&entry.path()),
                name,
            });
        }
        folders.sort_by(|a, b| a.name.cmp(&b.name));

        tracing::info!(path = scope, count = folders.len(), "vault.query.list_folders_completed");
        Ok(folders)
    }

    /// Case-insensitive substring search, one hit per note.
    ///
    /// The hit is the first matching line, trimmed and shortened.
    pub async fn search_text(
        &self,
        query: &str,
        path: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let base = self.validate_path(path.unwrap_or_default()).await?;
        let needle = query.to_lowercase();

        let mut results = Vec::new();
        let mut walker = NoteWalker::new(base);
        while results.len() < limit {
            let Some(file) = walker.next().await else {
                break;
            };
            let Some(content) = self.read_content(&file).await else {
                continue;
            };
            let hit = content
                .split('\n')
                .enumerate()
                .find(|(_, line)| line.to_lowercase().contains(&needle));
            if let Some((index, line)) = hit {
                results.push(SearchResult {
                    path: self.rel_path(&file),
                    title: NoteMetadata::extract(&stem_of(&file), &content).title,
                    snippet: snippet(line),
                    line_number: index + 1,
                });
            }
        }

        tracing::info!(query, count = results.len(), "vault.query.search_text_completed");
        Ok(results)
    }

    /// Notes carrying any of `tags`. Matching ignores case and a leading `#`.
    pub async fn find_by_tag(
        &self,
        tags: &[String],
        path: Option<&str>,
        limit: usize,
    ) -> Result<Vec<NoteInfo>> {
        let base = self.validate_path(path.unwrap_or_default()).await?;
        let wanted: HashSet<String> = tags.iter().map(|t| normalize_tag(t)).collect();

        let mut results = Vec::new();
        let mut walker = NoteWalker::new(base);
        while results.len() < limit {
            let Some(file) = walker.next().await else {
                break;
            };
            let Some(content) = self.read_content(&file).await else {
                continue;
            };
            let meta = NoteMetadata::extract(&stem_of(&file), &content);
            if meta.tags.iter().any(|t| wanted.contains(&t.to_lowercase())) {
                results.push(self.note_info(&file, meta).await);
            }
        }

        tracing::info!(tags = ?tags, count = results.len(), "vault.query.find_by_tag_completed");
        Ok(results)
    }

    /// Notes whose file name or title matches `query`.
    ///
    /// Exact file-name matches come first, then file names containing the
    /// query, then titles equal to or containing it. Within each group the
    /// shortest paths come first.
    pub async fn find_by_name(
        &self,
        query: &str,
        path: Option<&str>,
        limit: usize,
    ) -> Result<Vec<NoteInfo>> {
        let base = self.validate_path(path.unwrap_or_default()).await?;
        let wanted = normalize_name(query.strip_suffix(".md").unwrap_or(query));

        let mut exact = Vec::new();
        let mut contains = Vec::new();
        let mut by_title = Vec::new();

        let mut walker = NoteWalker::new(base);
        while let Some(file) = walker.next().await {
            let Some(content) = self.read_content(&file).await else {
                continue;
            };
            let stem = normalize_name(&stem_of(&file));
            let meta = NoteMetadata::extract(&stem_of(&file), &content);

            let bucket = if stem == wanted {
                &mut exact
            } else if stem.contains(&wanted) {
                &mut contains
            } else if normalize_name(&meta.title).contains(&wanted) {
                &mut by_title
            } else {
                continue;
            };
            bucket.push(self.note_info(&file, meta).await);
        }

        for group in [&mut exact, &mut contains, &mut by_title] {
            group.sort_by_key(|note: &NoteInfo| note.path.chars().count());
        }
        let results: Vec<NoteInfo> = exact
            .into_iter()
            .chain(contains)
            .chain(by_title)
            .take(limit)
            .collect();

        tracing::info!(query, count = results.len(), "vault.query.find_by_name_completed");
        Ok(results)
    }

    /// Notes linking to `note_path` with a `[[name]]` or `[[name|alias]]`
    /// wikilink, where `name` is the target's file stem.
    ///
    /// # Errors
    ///
    /// [`VaultError::NoteNotFound`] if the target note does not exist.
    pub async fn get_backlinks(
        &self,
        note_path: &str,
        limit: usize,
    ) -> Result<Vec<BacklinkResult>> {
        let target = self.validate_path(note_path).await?;
        if !self.exists(&target).await {
            return Err(VaultError::NoteNotFound(note_path.to_string()));
        }
        let name = stem_of(&target);

        let mut results = Vec::new();
        let mut walker = NoteWalker::new(self.root());
        while results.len() < limit {
            let Some(file) = walker.next().await else {
                break;
            };
            if file == target {
                continue;
            }
            let Some(content) = self.read_content(&file).await else {
                continue;
            };
            if !links_to(&content, &name) {
                continue;
            }
            results.push(BacklinkResult {
                path: self.rel_path(&file),
                title: NoteMetadata::extract(&stem_of(&file), &content).title,
                context: link_context(&content, &name).unwrap_or_default(),
            });
        }

        tracing::info!(note_path, count = results.len(), "vault.query.get_backlinks_completed");
        Ok(results)
    }

    /// Every tag used anywhere in the vault, sorted.
    pub async fn get_tags(&self) -> Result<Vec<String>> {
        let mut tags = BTreeSet::new();
        let mut walker = NoteWalker::new(self.root());
        while let Some(file) = walker.next().await {
            if let Some(content) = self.read_content(&file).await {
                tags.extend(NoteMetadata::extract("", &content).tags);
            }
        }

        tracing::info!(count = tags.len(), "vault.query.get_tags_completed");
        Ok(tags.into_iter().collect())
    }

    /// Checkbox tasks across notes below `path`. Completed tasks are only
    /// included when asked for.
    pub async fn list_tasks(
        &self,
        path: Option<&str>,
        include_completed: bool,
        limit: usize,
    ) -> Result<Vec<TaskInfo>> {
        let base = self.validate_path(path.unwrap_or_default()).await?;

        let mut results = Vec::new();
        let mut walker = NoteWalker::new(base);
        'walk: while results.len() < limit {
            let Some(file) = walker.next().await else {
                break;
            };
            let Some(content) = self.read_content(&file).await else {
                continue;
            };
            let rel = self.rel_path(&file);
            for task in scan_checkboxes(&content) {
                if results.len() >= limit {
                    break 'walk;
                }
                if task.completed && !include_completed {
                    continue;
                }
                results.push(TaskInfo {
                    path: rel.clone(),
                    task_text: task.text,
                    completed: task.completed,
                    line_number: task.line_number,
                });
            }
        }

        tracing::info!(
            include_completed,
            count = results.len(),
            "vault.query.list_tasks_completed"
        );
        Ok(results)
    }

    async fn note_info(&self, path: &Path, meta: NoteMetadata) -> NoteInfo {
        NoteInfo {
            path: self.rel_path(path),
            title: meta.title,
            tags: meta.tags,
            modified: self.modified(path).await,
        }
    }
}
