//! Loading the preferences note.

use std::path::PathBuf;

use jasque_core::error::{Result, VaultError};
use jasque_core::frontmatter::parse_frontmatter;
use jasque_core::preferences::{
    UserPreferences, VaultPreferences, PREFERENCES_DIR, PREFERENCES_PATH, PREFERENCES_TEMPLATE,
};

use crate::manager::VaultManager;

impl VaultManager {
    /// Load user preferences from the vault.
    ///
    /// Returns `None` when there is nothing to load yet. If the preferences
    /// folder exists without a preferences note, a commented template is
    /// written so the user has something to edit. Header fields with the
    /// wrong shape fall back to their defaults.
    ///
    /// # Errors
    ///
    /// [`VaultError::PreferencesParse`] if the note's header is not valid
    /// YAML, [`VaultError::Io`] if the template cannot be written.
    pub async fn load_preferences(&self) -> Result<Option<VaultPreferences>> {
        let (dir, file) = match self.preferences_paths().await {
            Ok(paths) => paths,
            Err(VaultError::PathTraversal(_)) => {
                tracing::warn!(path = PREFERENCES_PATH, "vault.preferences.outside_vault");
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        if !self.exists(&file).await {
            if self.is_dir(&dir).await {
                self.atomic_write(&file, PREFERENCES_TEMPLATE).await?;
                tracing::info!(path = PREFERENCES_PATH, "vault.preferences.template_created");
            } else {
                tracing::warn!(path = PREFERENCES_PATH, "vault.preferences.not_found");
            }
            return Ok(None);
        }

        let Some(content) = self.read_content(&file).await else {
            tracing::warn!(path = PREFERENCES_PATH, "vault.preferences.read_failed");
            return Ok(None);
        };

        let parsed = parse_frontmatter(&content).map_err(|err| VaultError::PreferencesParse {
            path: PREFERENCES_PATH.to_string(),
            message: err.to_string(),
        })?;

        let (structured, additional_context, has_structured) = match parsed {
            Some(fm) => {
                let (prefs, warnings) = UserPreferences::from_mapping(&fm.mapping);
                for warning in &warnings {
                    tracing::warn!(
                        field = warning.field,
                        error = %warning.message,
                        "vault.preferences.validation_warning"
                    );
                }
                (prefs, fm.body.to_string(), !fm.mapping.is_empty())
            }
            None => (UserPreferences::default(), content.clone(), false),
        };

        tracing::info!(has_structured, "vault.preferences.loaded");
        Ok(Some(VaultPreferences {
            structured,
            additional_context,
        }))
    }

    /// The preferences folder and note, both resolved through the path guard
    /// so a symlinked `_jasque` cannot point reads or the template write
    /// outside the vault.
    async fn preferences_paths(&self) -> Result<(PathBuf, PathBuf)> {
        let dir = self.validate_path(PREFERENCES_DIR).await?;
        let file = self.validate_path(PREFERENCES_PATH).await?;
        Ok((dir, file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn vault() -> (TempDir, VaultManager) {
        let dir = TempDir::new().unwrap();
        let vm = VaultManager::new(dir.path()).unwrap();
        (dir, vm)
    }

    #[tokio::test]
    async fn missing_folder_creates_nothing() {
        let (dir, vm) = vault();
        assert!(vm.load_preferences().await.unwrap().is_none());
        assert!(!dir.path().join(PREFERENCES_DIR).exists());
    }

    #[tokio::test]
    async fn missing_file_writes_template() {
        let (dir, vm) = vault();
        std::fs::create_dir(dir.path().join(PREFERENCES_DIR)).unwrap();

        assert!(vm.load_preferences().await.unwrap().is_none());
        let written = std::fs::read_to_string(dir.path().join(PREFERENCES_PATH)).unwrap();
        assert_eq!(written, PREFERENCES_TEMPLATE);

        let prefs = vm.load_preferences().await.unwrap().unwrap();
        assert_eq!(
            prefs.structured.default_folders.meeting_notes.as_deref(),
            Some("Meetings/")
        );
        assert!(prefs.additional_context.starts_with("## Additional Context"));
    }

    #[tokio::test]
    async fn invalid_yaml_is_an_error() {
        let (dir, vm) = vault();
        std::fs::create_dir(dir.path().join(PREFERENCES_DIR)).unwrap();
        std::fs::write(
            dir.path().join(PREFERENCES_PATH),
            "---\ndate_format: [unclosed\n---\nBody",
        )
        .unwrap();

        let err = vm.load_preferences().await.unwrap_err();
        assert!(
            matches!(err, VaultError::PreferencesParse { ref path, .. } if path == PREFERENCES_PATH)
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlinked_folder_outside_vault_is_ignored() {
        let (dir, vm) = vault();
        let outside = TempDir::new().unwrap();
        std::fs::write(outside.path().join("preferences.md"), "---
date_format: X
---
")
            .unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join(PREFERENCES_DIR)).unwrap();

        assert!(vm.load_preferences().await.unwrap().is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlinked_empty_folder_gets_no_template() {
        let (dir, vm) = vault();
        let outside = TempDir::new().unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join(PREFERENCES_DIR)).unwrap();

        assert!(vm.load_preferences().await.unwrap().is_none());
        assert!(!outside.path().join("preferences.md").exists());
    }

    #[tokio::test]
    async fn wrong_shape_falls_back_per_field() {
        let (dir, vm) = vault();
        std::fs::create_dir(dir.path().join(PREFERENCES_DIR)).unwrap();
        std::fs::write(
            dir.path().join(PREFERENCES_PATH),
            "---\ndate_format: DD.MM.YYYY\nresponse_style: loud\n---\n\nI like short answers.\n",
        )
        .unwrap();

        let prefs = vm.load_preferences().await.unwrap().unwrap();
        assert_eq!(prefs.structured.date_format, "DD.MM.YYYY");
        assert_eq!(prefs.structured.response_style.verbosity, "concise");
        assert_eq!(prefs.additional_context, "I like short answers.\n");
    }

    #[tokio::test]
    async fn headerless_note_is_all_context() {
        let (dir, vm) = vault();
        std::fs::create_dir(dir.path().join(PREFERENCES_DIR)).unwrap();
        std::fs::write(dir.path().join(PREFERENCES_PATH), "Just notes.").unwrap();

        let prefs = vm.load_preferences().await.unwrap().unwrap();
        assert_eq!(prefs.structured, UserPreferences::default());
        assert_eq!(prefs.additional_context, "Just notes.");
    }
}
