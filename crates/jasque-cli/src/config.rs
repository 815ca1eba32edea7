use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Config file looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "jasque.toml";

/// Settings for the `jasque` binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Vault root directory.
    pub vault_path: Option<PathBuf>,
    /// `query_vault` limit when a request sends none.
    pub default_limit: usize,
    /// Tracing filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            vault_path: None,
            default_limit: 50,
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing config: {}", path.display()))
    }

    /// Build the effective config: the explicit file, else `jasque.toml` if
    /// present, else defaults. `vault` overrides the file's `vault_path`.
    pub fn resolve(explicit: Option<&Path>, vault: Option<PathBuf>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load(path)?,
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::load(fallback)?
                } else {
                    Self::default()
                }
            }
        };
        if vault.is_some() {
            config.vault_path = vault;
        }
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.vault_path.is_some(),
            "vault_path is required (set it in {DEFAULT_CONFIG_FILE} or pass --vault)"
        );
        anyhow::ensure!(self.default_limit >= 1, "default_limit must be >= 1");
        Ok(())
    }

    /// The validated vault path.
    pub fn vault_path(&self) -> Result<&Path> {
        self.vault_path
            .as_deref()
            .context("vault_path is required")
    }
}
