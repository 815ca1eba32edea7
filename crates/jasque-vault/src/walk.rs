//! Depth-first traversal over the notes of a folder.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::manager::is_hidden;

/// Yields `.md` files below a folder, depth-first, in name order.
///
/// Hidden entries are never entered or yielded. Directories that cannot be
/// listed are skipped silently. The walk is lazy, so a caller that stops
/// early never lists the rest of the tree.
pub struct NoteWalker {
    /// Pending entries, last element visited next.
    stack: Vec<(PathBuf, bool)>,
}

impl NoteWalker {
    pub fn new(start: impl Into<PathBuf>) -> Self {
        Self {
            stack: vec![(start.into(), true)],
        }
    }

    /// Next note path, or `None` when the walk is exhausted.
    pub async fn next(&mut self) -> Option<PathBuf> {
        while let Some((path, is_dir)) = self.stack.pop() {
            if !is_dir {
                return Some(path);
            }
            let mut children = list_children(&path).await;
            children.reverse();
            self.stack.extend(children);
        }
        None
    }
}

/// Visible children of a directory worth walking: sub-directories and `.md`
/// files, sorted by name.
async fn list_children(dir: &Path) -> Vec<(PathBuf, bool)> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) => {
            tracing::debug!(path = %dir.display(), error = %err, "vault.walk.list_failed");
            return Vec::new();
        }
    };

    let mut children = Vec::new();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(err) => {
                tracing::debug!(path = %dir.display(), error = %err, "vault.walk.entry_failed");
                break;
            }
        };

        let name = entry.file_name();
        let name = name.to_string_lossy();
        if is_hidden(&name) {
            continue;
        }
        let Ok(file_type) = entry.file_type().await else {
            continue;
        };
        if file_type.is_dir() {
            children.push((entry.path(), true));
        } else if file_type.is_file() && name.ends_with(".md") {
            children.push((entry.path(), false));
        }
    }

    children.sort_by(|a, b| a.0.file_name().cmp(&b.0.file_name()));
    children
}
