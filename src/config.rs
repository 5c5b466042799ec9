//! Runtime settings.
//!
//! Layered with the `config` crate, later layers winning:
//!
//! 1. built-in defaults
//! 2. an optional config file (`--config nodewatch.toml`)
//! 3. `NODEWATCH_*` environment variables
//! 4. command line flags
//!
//! ```toml
//! status_file = "node_status.json"
//! worker_binary = "./client"
//! nodes = 10
//! process_control = true
//! log_file = "nodewatch.log"
//! ```

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::node::{NodeRoster, DEFAULT_NODE_COUNT};

/// Prefix for environment overrides, e.g. `NODEWATCH_STATUS_FILE`.
pub const ENV_PREFIX: &str = "NODEWATCH";

/// Settings for a dashboard run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Status record written by the cluster agent.
    pub status_file: PathBuf,
    /// Worker executable, invoked with the node index as its only argument.
    pub worker_binary: PathBuf,
    /// Number of nodes in the roster.
    pub nodes: u16,
    /// Whether operator toggles spawn and kill workers. Off gives a
    /// display-only dashboard.
    pub process_control: bool,
    /// Log file (the TUI owns the terminal).
    pub log_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            status_file: PathBuf::from("node_status.json"),
            worker_binary: PathBuf::from("./client"),
            nodes: DEFAULT_NODE_COUNT,
            process_control: true,
            log_file: PathBuf::from("nodewatch.log"),
        }
    }
}

/// Values given on the command line. `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub status_file: Option<PathBuf>,
    pub worker_binary: Option<PathBuf>,
    pub nodes: Option<u16>,
    pub process_control: Option<bool>,
    pub log_file: Option<PathBuf>,
}

impl Settings {
    /// Load settings from all layers.
    pub fn load(
        config_path: Option<&Path>,
        overrides: &SettingsOverrides,
    ) -> Result<Self, ConfigError> {
        Self::load_with_env(config_path, Environment::with_prefix(ENV_PREFIX), overrides)
    }

    pub(crate) fn load_with_env(
        config_path: Option<&Path>,
        env: Environment,
        overrides: &SettingsOverrides,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings: Settings = builder
            .add_source(env)
            .set_override_option("status_file", path_value(&overrides.status_file))?
            .set_override_option("worker_binary", path_value(&overrides.worker_binary))?
            .set_override_option("nodes", overrides.nodes.map(i64::from))?
            .set_override_option("process_control", overrides.process_control)?
            .set_override_option("log_file", path_value(&overrides.log_file))?
            .build()?
            .try_deserialize()?;

        if settings.nodes == 0 {
            return Err(ConfigError::Message("nodes must be at least 1".to_string()));
        }
        Ok(settings)
    }

    /// The node roster described by these settings.
    pub fn roster(&self) -> NodeRoster {
        NodeRoster::new(self.nodes)
    }
}

fn path_value(path: &Option<PathBuf>) -> Option<String> {
    path.as_ref().map(|p| p.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(map))
    }

    #[test]
    fn test_defaults() {
        let settings =
            Settings::load_with_env(None, env(&[]), &SettingsOverrides::default()).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.roster().len(), 10);
    }

    #[test]
    fn test_layers_in_order() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "status_file = \"/var/run/status.json\"\nnodes = 4\nprocess_control = false"
        )
        .unwrap();

        let overrides = SettingsOverrides {
            nodes: Some(6),
            ..Default::default()
        };
        let settings = Settings::load_with_env(
            Some(file.path()),
            env(&[("NODEWATCH_WORKER_BINARY", "/opt/worker"), ("NODEWATCH_NODES", "5")]),
            &overrides,
        )
        .unwrap();

        assert_eq!(settings.status_file, PathBuf::from("/var/run/status.json"));
        assert_eq!(settings.worker_binary, PathBuf::from("/opt/worker"));
        assert_eq!(settings.nodes, 6);
        assert!(!settings.process_control);
        assert_eq!(settings.log_file, PathBuf::from("nodewatch.log"));
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let result = Settings::load_with_env(
            Some(Path::new("/nonexistent/nodewatch.toml")),
            env(&[]),
            &SettingsOverrides::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_nodes_rejected() {
        let overrides = SettingsOverrides {
            nodes: Some(0),
            ..Default::default()
        };
        assert!(Settings::load_with_env(None, env(&[]), &overrides).is_err());
    }
}
