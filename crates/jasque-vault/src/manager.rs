//! The vault handle: path containment and the read/write primitives every
//! operation is built on.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use jasque_core::error::{Result, VaultError};
use tokio::fs;

/// Async handle on a vault directory.
///
/// Holds only the canonical root path, so it is cheap to clone and can be
/// shared freely across tasks. Nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct VaultManager {
    root: PathBuf,
}

impl VaultManager {
    /// Open the vault rooted at `root`.
    ///
    /// The root is canonicalized once here; every later path check is made
    /// against that canonical form.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::FolderNotFound`] if `root` does not exist or is
    /// not a directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let not_found = || VaultError::FolderNotFound(root.display().to_string());
        let canonical = root.canonicalize().map_err(|_| not_found())?;
        if !canonical.is_dir() {
            return Err(not_found());
        }
        Ok(Self { root: canonical })
    }

    /// Canonical vault root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a vault-relative path to an absolute path inside the vault.
    ///
    /// An empty path is the root itself. The input is normalized lexically,
    /// then its longest existing prefix is canonicalized so that symlinks are
    /// followed; the part that does not exist yet is appended unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::PathTraversal`] for absolute paths, paths that
    /// climb above the root, and paths whose resolved form leaves the vault.
    pub async fn validate_path(&self, relative: &str) -> Result<PathBuf> {
        if relative.is_empty() {
            return Ok(self.root.clone());
        }

        let denied = || VaultError::PathTraversal(relative.to_string());
        let normalized = normalize_relative(relative).ok_or_else(denied)?;
        let resolved = resolve_existing_prefix(&self.root.join(normalized))
            .await
            .ok_or_else(denied)?;

        if !resolved.starts_with(&self.root) {
            tracing::warn!(path = relative, "vault.path.traversal_denied");
            return Err(denied());
        }
        Ok(resolved)
    }

    /// Vault-relative form of an absolute path, with `/` separators.
    #[must_use]
    pub fn rel_path(&self, abs: &Path) -> String {
        let relative = abs.strip_prefix(&self.root).unwrap_or(abs);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Read a file as UTF-8. Missing, unreadable and non-UTF-8 files all
    /// yield `None`.
    pub async fn read_content(&self, path: &Path) -> Option<String> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "vault.read.failed");
                return None;
            }
        };
        match String::from_utf8(bytes) {
            Ok(content) => Some(content),
            Err(_) => {
                tracing::debug!(path = %path.display(), "vault.read.not_utf8");
                None
            }
        }
    }

    /// Replace a file's content without ever exposing a partial write.
    ///
    /// Content goes to a hidden sibling `.jasque-<id>.tmp` first and is then
    /// renamed over the target. The temp name has a fixed length, so any name
    /// the target can have still fits. The temp file is removed if either
    /// step fails.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Io`] if the write or the rename fails.
    pub async fn atomic_write(&self, path: &Path, content: &str) -> Result<()> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let temp_path = path.with_file_name(format!(".jasque-{}.tmp", &id[..12]));

        let written = match fs::write(&temp_path, content).await {
            Ok(()) => fs::rename(&temp_path, path).await,
            Err(err) => Err(err),
        };

        if let Err(err) = written {
            if let Err(cleanup) = fs::remove_file(&temp_path).await {
                tracing::debug!(
                    path = %temp_path.display(),
                    error = %cleanup,
                    "vault.write.temp_cleanup_failed"
                );
            }
            return Err(err.into());
        }
        Ok(())
    }

    pub(crate) async fn exists(&self, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    pub(crate) async fn is_dir(&self, path: &Path) -> bool {
        fs::metadata(path).await.is_ok_and(|m| m.is_dir())
    }

    /// Reject operations that would act on the vault root itself.
    pub(crate) fn ensure_not_root(&self, abs: &Path, relative: &str) -> Result<()> {
        if abs == self.root {
            tracing::warn!(path = relative, "vault.path.root_denied");
            return Err(VaultError::PathTraversal(relative.to_string()));
        }
        Ok(())
    }

    pub(crate) async fn is_file(&self, path: &Path) -> bool {
        fs::metadata(path).await.is_ok_and(|m| m.is_file())
    }

    pub(crate) async fn modified(&self, path: &Path) -> Option<DateTime<Utc>> {
        let metadata = fs::metadata(path).await.ok()?;
        metadata.modified().ok().map(DateTime::<Utc>::from)
    }
}

/// Whether a directory entry name is hidden.
pub(crate) fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// File stem of a note path, e.g. `plan` for `projects/plan.md`.
pub(crate) fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Normalize a relative path without touching the filesystem.
///
/// Returns `None` for absolute paths and for `..` that would climb above the
/// starting point.
fn normalize_relative(relative: &str) -> Option<PathBuf> {
    let mut parts = Vec::new();
    for component in Path::new(relative).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::Normal(part) => parts.push(part),
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(parts.iter().collect())
}

/// Canonicalize the longest prefix of `path` that exists and re-append the
/// rest. `None` if the existing prefix cannot be canonicalized, e.g. a
/// dangling symlink.
async fn resolve_existing_prefix(path: &Path) -> Option<PathBuf> {
    let mut existing = path.to_path_buf();
    let mut missing: Vec<OsString> = Vec::new();

    while fs::symlink_metadata(&existing).await.is_err() {
        missing.push(existing.file_name()?.to_os_string());
        if !existing.pop() {
            return None;
        }
    }

    let mut resolved = fs::canonicalize(&existing).await.ok()?;
    resolved.extend(missing.iter().rev());
    Some(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, VaultManager) {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("notes/deep")).unwrap();
        std::fs::write(dir.path().join("notes/a.md"), "# A\n").unwrap();
        let vm = VaultManager::new(dir.path()).unwrap();
        (dir, vm)
    }

    #[test]
    fn new_rejects_missing_root() {
        let dir = TempDir::new().unwrap();
        let err = VaultManager::new(dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, VaultError::FolderNotFound(_)));
    }

    #[test]
    fn new_rejects_file_root() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file.md");
        std::fs::write(&file, "x").unwrap();
        assert!(matches!(
            VaultManager::new(&file),
            Err(VaultError::FolderNotFound(_))
        ));
    }

    #[tokio::test]
    async fn validate_empty_is_root() {
        let (_dir, vm) = setup();
        assert_eq!(vm.validate_path("").await.unwrap(), vm.root());
    }

    #[tokio::test]
    async fn validate_existing_and_new_paths() {
        let (_dir, vm) = setup();
        assert_eq!(
            vm.validate_path("notes/a.md").await.unwrap(),
            vm.root().join("notes/a.md")
        );
        assert_eq!(
            vm.validate_path("notes/new/dir/b.md").await.unwrap(),
            vm.root().join("notes/new/dir/b.md")
        );
        assert_eq!(
            vm.validate_path("./notes/deep/../a.md").await.unwrap(),
            vm.root().join("notes/a.md")
        );
    }

    #[tokio::test]
    async fn validate_rejects_escapes() {
        let (_dir, vm) = setup();
        for bad in ["../etc/passwd", "notes/../../x", "/etc/passwd", ".."] {
            let err = vm.validate_path(bad).await.unwrap_err();
            assert!(matches!(err, VaultError::PathTraversal(_)), "{bad}");
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn validate_rejects_symlink_out_of_vault() {
        let (_dir, vm) = setup();
        let outside = TempDir::new().unwrap();
        std::os::unix::fs::symlink(outside.path(), vm.root().join("escape")).unwrap();

        let err = vm.validate_path("escape/secret.md").await.unwrap_err();
        assert!(matches!(err, VaultError::PathTraversal(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn validate_follows_symlink_inside_vault() {
        let (_dir, vm) = setup();
        std::os::unix::fs::symlink(vm.root().join("notes"), vm.root().join("alias")).unwrap();
        assert_eq!(
            vm.validate_path("alias/a.md").await.unwrap(),
            vm.root().join("notes/a.md")
        );
    }

    #[tokio::test]
    async fn rel_path_uses_forward_slashes() {
        let (_dir, vm) = setup();
        let abs = vm.root().join("notes").join("deep").join("x.md");
        assert_eq!(vm.rel_path(&abs), "notes/deep/x.md");
    }

    #[tokio::test]
    async fn read_content_handles_missing_and_binary() {
        let (_dir, vm) = setup();
        assert_eq!(
            vm.read_content(&vm.root().join("notes/a.md")).await.as_deref(),
            Some("# A\n")
        );
        assert!(vm.read_content(&vm.root().join("missing.md")).await.is_none());

        let binary = vm.root().join("notes/binary.md");
        std::fs::write(&binary, [0xff, 0xfe, 0x00, 0x81]).unwrap();
        assert!(vm.read_content(&binary).await.is_none());
    }

    #[tokio::test]
    async fn atomic_write_replaces_and_leaves_no_temp() {
        let (_dir, vm) = setup();
        let target = vm.root().join("notes/a.md");
        vm.atomic_write(&target, "replaced").await.unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "replaced");

        let leftovers: Vec<_> = std::fs::read_dir(vm.root().join("notes"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn atomic_write_handles_names_at_the_length_limit() {
        let (_dir, vm) = setup();
        let name = format!("{}.md", "n".repeat(252));
        let target = vm.root().join("notes").join(&name);
        vm.atomic_write(&target, "long").await.unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "long");
    }

    #[tokio::test]
    async fn root_aliases_are_refused() {
        let (_dir, vm) = setup();
        for alias in ["", ".", "notes/..", "./notes/deep/../.."] {
            let abs = vm.validate_path(alias).await.unwrap();
            let err = vm.ensure_not_root(&abs, alias).unwrap_err();
            assert!(matches!(err, VaultError::PathTraversal(_)), "{alias:?}");
        }
        let notes = vm.validate_path("notes").await.unwrap();
        assert!(vm.ensure_not_root(&notes, "notes").is_ok());
    }

    #[tokio::test]
    async fn atomic_write_into_missing_dir_fails_with_io() {
        let (_dir, vm) = setup();
        let err = vm
            .atomic_write(&vm.root().join("nowhere/x.md"), "x")
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::Io(_)));
    }

    #[test]
    fn hidden_names() {
        assert!(is_hidden(".obsidian"));
        assert!(!is_hidden("notes"));
    }

    proptest! {
        #[test]
        fn validated_paths_stay_inside_root(
            segments in proptest::collection::vec(
                prop_oneof![
                    Just("..".to_string()),
                    Just(".".to_string()),
                    "[a-z]{1,6}",
                ],
                1..6,
            )
        ) {
            let (_dir, vm) = setup();
            let relative = segments.join("/");
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            if let Ok(resolved) = runtime.block_on(vm.validate_path(&relative)) {
                prop_assert!(resolved.starts_with(vm.root()));
            }
        }
    }
}
