// Workspace Gate - Configuration
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Loads the sandbox root, write/row limits and audit log location.
// Precedence: CLI flag > WORKSPACE_GATE_ROOT > JSON config file > defaults.

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment override for the sandbox root
pub const ROOT_ENV: &str = "WORKSPACE_GATE_ROOT";

/// Master gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GateConfig {
    /// Directory every tool call is confined to
    pub root: PathBuf,
    /// Largest content accepted by one write_to_file call, in bytes
    pub max_write_size: usize,
    /// Rows rendered per query result; extra rows are fetched but summarized
    pub max_rows: usize,
    /// Append-only CALL/FAIL log. Must live outside the root.
    pub audit_log: Option<PathBuf>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./workspace"),
            max_write_size: 10 * 1024 * 1024,
            max_rows: 10_000,
            audit_log: None,
        }
    }
}

impl GateConfig {
    /// Load config from JSON file, falling back to defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {:?}", path))?;
            let config: Self = serde_json::from_str(&content)
                .with_context(|| format!("Invalid JSON in config {:?}", path))?;
            Ok(config)
        } else {
            log::warn!("Config not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save config to JSON file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply environment and CLI overrides, CLI last.
    pub fn with_overrides(mut self, env_root: Option<String>, cli_root: Option<PathBuf>) -> Self {
        if let Some(root) = env_root.filter(|r| !r.is_empty()) {
            self.root = PathBuf::from(root);
        }
        if let Some(root) = cli_root {
            self.root = root;
        }
        self
    }

    /// Reject limits of zero and an audit log placed inside the sandbox,
    /// where the agent could read or delete it.
    pub fn validate(&self, canonical_root: &Path) -> anyhow::Result<()> {
        if self.max_write_size == 0 {
            bail!("max_write_size must be greater than zero");
        }
        if self.max_rows == 0 {
            bail!("max_rows must be greater than zero");
        }
        if let Some(log_path) = &self.audit_log {
            let parent = log_path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let parent = std::fs::canonicalize(parent)
                .with_context(|| format!("Audit log directory {:?} does not exist", parent))?;
            if parent.starts_with(canonical_root) {
                bail!("audit_log {:?} must not be inside the sandbox root", log_path);
            }
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
