//! Configuration for the callback node
//!
//! The original host plugin read its entry-point override from a process-wide
//! environment variable at every dispatch. Here the configuration is resolved
//! once (optionally from the environment or a TOML file) and passed explicitly
//! into the node and script engine at construction time.

use crate::error::{CallbackError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Environment variable that overrides the callback entry-point name
pub const ENTRY_POINT_ENV: &str = "CALLBACK_NODE_FUNC";

/// Default entry-point symbol looked up on every resolved script module
pub const DEFAULT_ENTRY_POINT: &str = "__callback__";

/// Configuration for script resolution and callback dispatch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackConfig {
    /// Name of the function invoked on resolved script modules
    pub entry_point: String,

    /// Substitution variables available to `${name}` tokens in script text
    /// when it is interpreted as a file-path template
    pub script_vars: HashMap<String, String>,

    /// Maximum number of Rhai operations per callback invocation
    pub max_operations: u64,

    /// Maximum expression nesting depth for compiled scripts
    pub max_expr_depth: usize,

    /// Maximum function call nesting depth inside scripts
    pub max_call_levels: usize,
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
            script_vars: HashMap::new(),
            max_operations: 100_000,
            max_expr_depth: 64,
            max_call_levels: 32,
        }
    }
}

impl CallbackConfig {
    /// Create a config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config, honoring the entry-point environment override
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(name) = std::env::var(ENTRY_POINT_ENV) {
            if !name.is_empty() {
                config.entry_point = name;
            }
        }
        config
    }

    /// Add a substitution variable for file-path templates
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.script_vars.insert(name.into(), value.into());
        self
    }

    /// Override the entry-point name
    pub fn with_entry_point(mut self, name: impl Into<String>) -> Self {
        self.entry_point = name.into();
        self
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| CallbackError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| CallbackError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_entry_point() {
        let config = CallbackConfig::default();
        assert_eq!(config.entry_point, "__callback__");
        assert!(config.script_vars.is_empty());
    }

    #[test]
    fn test_builder_style() {
        let config = CallbackConfig::new()
            .with_entry_point("on_change")
            .with_var("__dir__", "/tmp/scripts");
        assert_eq!(config.entry_point, "on_change");
        assert_eq!(
            config.script_vars.get("__dir__").map(String::as_str),
            Some("/tmp/scripts")
        );
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = CallbackConfig::new().with_var("__file__", "/opt/plug.rhai");
        config.save(&path).unwrap();

        let loaded = CallbackConfig::load(&path).unwrap();
        assert_eq!(loaded.entry_point, config.entry_point);
        assert_eq!(loaded.script_vars, config.script_vars);
    }
}
