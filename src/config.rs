use crate::DEFAULT_PORT;

use serde::Deserialize;
use std::path::Path;

/// Server configuration, deserialized from a TOML document.
///
/// Every section and field is optional; defaults give a server bound to all
/// interfaces on the default port with persistence disabled. The value is
/// built once in `main` and threaded into the components that need it.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub aof: AofConfig,
    #[serde(default)]
    pub cluster: ClusterConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ServerConfig {
    /// TCP bind address, `host:port`.
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AofConfig {
    /// Toggles the append-only file; when off the persister is a no-op.
    #[serde(default)]
    pub is_enable: bool,

    /// Path of the append-only file.
    #[serde(default = "default_aof_filename")]
    pub filename: String,

    /// When to fsync appended records.
    #[serde(default)]
    pub append_fsync: AppendFsync,

    /// Toggles log compaction.
    #[serde(default)]
    pub is_rewrite: bool,

    /// Compact after this many persisted commands. Values below 2 disable
    /// compaction.
    #[serde(default)]
    pub aof_rewrite_interval: i64,
}

impl Default for AofConfig {
    fn default() -> AofConfig {
        AofConfig {
            is_enable: false,
            filename: default_aof_filename(),
            append_fsync: AppendFsync::default(),
            is_rewrite: false,
            aof_rewrite_interval: 0,
        }
    }
}

/// Fsync policy for the append-only file. Unrecognised values fall back to
/// `no`.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AppendFsync {
    Always,
    Everysec,
    #[default]
    #[serde(other)]
    No,
}

/// Reserved for the clustering entry points; parsed but not consumed by the
/// core.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ClusterConfig {
    #[serde(default)]
    pub is_enabled: bool,
}

impl Config {
    pub async fn from_path(path: impl AsRef<Path>) -> crate::Result<Config> {
        let content = tokio::fs::read_to_string(path).await?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn address_or_default(&self) -> String {
        self.server
            .address
            .clone()
            .unwrap_or_else(|| format!("0.0.0.0:{}", DEFAULT_PORT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(!config.aof.is_enable);
        assert_eq!(config.aof.append_fsync, AppendFsync::No);
        assert_eq!(config.address_or_default(), format!("0.0.0.0:{DEFAULT_PORT}"));
    }

    #[test]
    fn unknown_fsync_policy_falls_back_to_no() {
        let config: Config = toml::from_str(
            "[aof]\nis_enable = true\nappend_fsync = \"sometimes\"\n",
        )
        .unwrap();
        assert_eq!(config.aof.append_fsync, AppendFsync::No);
    }

    #[test]
    fn full_document() {
        let doc = r#"
            [server]
            address = "127.0.0.1:7000"

            [aof]
            is_enable = true
            filename = "/tmp/x.aof"
            append_fsync = "everysec"
            is_rewrite = true
            aof_rewrite_interval = 10000

            [cluster]
            is_enabled = false
        "#;
        let config: Config = toml::from_str(doc).unwrap();
        assert_eq!(config.address_or_default(), "127.0.0.1:7000");
        assert_eq!(config.aof.append_fsync, AppendFsync::Everysec);
        assert_eq!(config.aof.aof_rewrite_interval, 10000);
    }
}

fn default_aof_filename() -> String {
    "carmine.aof".to_string()
}
