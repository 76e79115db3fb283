//! Engine configuration.
//!
//! Loaded from TOML; every key is optional.
//!
//! # Example
//!
//! ```toml
//! [engine]
//! audit_executions = true
//! max_rules_per_table = 500
//! strict_string_domains = false
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ── Types ─────────────────────────────────────────────────────────────────────

/// `[engine]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Append an audit record for every successful Execute.
    pub audit_executions: bool,
    /// Upper bound on rules per table. 0 = no limit.
    pub max_rules_per_table: usize,
    /// Require a non-empty domain on STRING columns.
    pub strict_string_domains: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            audit_executions: false,
            max_rules_per_table: 0,
            strict_string_domains: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    engine: EngineConfig,
}

/// Errors loading an [`EngineConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not parse '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("could not parse engine config: {0}")]
    Inline(#[from] toml::de::Error),
}

// ── Functions ─────────────────────────────────────────────────────────────────

impl EngineConfig {
    /// Parse a config document.
    pub fn from_toml_str(content: &str) -> Result<EngineConfig, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        Ok(file.engine)
    }

    /// Read and parse a config file from `path`.
    pub fn load(path: &Path) -> Result<EngineConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ConfigFile = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), config = ?file.engine, "loaded engine config");
        Ok(file.engine)
    }

    /// True when a table holding `current` rules may take one more.
    pub fn allows_another_rule(&self, current: u64) -> bool {
        self.max_rules_per_table == 0 || current < self.max_rules_per_table as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_gives_defaults() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = EngineConfig::from_toml_str("[engine]\naudit_executions = true\n").unwrap();
        assert!(config.audit_executions);
        assert_eq!(config.max_rules_per_table, 0);
        assert!(!config.strict_string_domains);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(EngineConfig::from_toml_str("[engine]\naudit = true\n").is_err());
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[engine]\nmax_rules_per_table = 2").unwrap();
        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.max_rules_per_table, 2);
        assert!(config.allows_another_rule(1));
        assert!(!config.allows_another_rule(2));
    }

    #[test]
    fn missing_file_names_path() {
        let err = EngineConfig::load(Path::new("/nonexistent/ledgerdmn.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/ledgerdmn.toml"));
    }

    #[test]
    fn unlimited_by_default() {
        assert!(EngineConfig::default().allows_another_rule(u64::MAX - 1));
    }
}
