use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use esync_diff::describe::DEFAULT_MAX_VALUE_LEN;
use esync_diff::DescribeOptions;
use esync_store::etcd::DEFAULT_PORT;
use esync_store::EtcdOptions;
use serde::{Deserialize, Serialize};

/// Settings read from an optional TOML file. Command-line flags override
/// them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Value characters shown per `SET` in previews.
    pub max_value_len: usize,
    pub etcd: EtcdConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EtcdConfig {
    /// Port used when the etcd URL has none.
    pub default_port: u16,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_value_len: DEFAULT_MAX_VALUE_LEN,
            etcd: EtcdConfig::default(),
        }
    }
}

impl Default for EtcdConfig {
    fn default() -> Self {
        Self {
            default_port: DEFAULT_PORT,
            timeout_secs: 30,
        }
    }
}

impl SyncConfig {
    /// Load from `path`, or return the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn etcd_options(&self) -> EtcdOptions {
        EtcdOptions {
            default_port: self.etcd.default_port,
            timeout: Duration::from_secs(self.etcd.timeout_secs),
        }
    }

    pub fn describe_options(&self) -> DescribeOptions {
        DescribeOptions {
            max_value_len: self.max_value_len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = SyncConfig::default();
        assert_eq!(c.max_value_len, 80);
        assert_eq!(c.etcd.default_port, 2379);
        assert_eq!(c.etcd_options().timeout, Duration::from_secs(30));
    }

    #[test]
    fn missing_path_gives_defaults() {
        assert_eq!(SyncConfig::load(None).unwrap(), SyncConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let c: SyncConfig = toml::from_str("max_value_len = 20\n[etcd]\ntimeout_secs = 5\n").unwrap();
        assert_eq!(c.max_value_len, 20);
        assert_eq!(c.etcd.timeout_secs, 5);
        assert_eq!(c.etcd.default_port, 2379);
        assert_eq!(c.describe_options().max_value_len, 20);
    }

    #[test]
    fn load_reads_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sync.toml");
        std::fs::write(&path, "[etcd]\ndefault_port = 4001\n").unwrap();
        let c = SyncConfig::load(Some(path.as_path())).unwrap();
        assert_eq!(c.etcd_options().default_port, 4001);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SyncConfig::load(Some(dir.path().join("absent.toml").as_path())).unwrap_err();
        assert!(err.to_string().contains("reading config file"));
    }
}
