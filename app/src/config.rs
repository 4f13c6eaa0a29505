//! Node configuration: listen address, data directory, liveness interval,
//! socket timeouts, default upload privacy, and logging (spec.md §6, §9
//! "Global module state" — explicit configuration passed into the driver
//! instead of module-level state).

use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    pub node: ListenConfig,
    pub storage: StorageConfig,
    pub protocol: ProtocolTiming,
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub default_private: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProtocolTiming {
    pub read_timeout_secs: u64,
    pub reply_timeout_secs: u64,
    pub liveness_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: String, // "json" or "pretty"
}

impl NodeConfig {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = ConfigBuilder::builder()
            .set_default("node.host", "0.0.0.0")?
            .set_default("node.port", 50666)?
            .set_default("storage.data_dir", ".")?
            .set_default("storage.default_private", false)?
            .set_default("protocol.read_timeout_secs", 4)?
            .set_default("protocol.reply_timeout_secs", 10)?
            .set_default("protocol.liveness_interval_secs", 60)?
            .set_default("telemetry.log_level", "info")?
            .set_default("telemetry.log_format", "pretty")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(Environment::with_prefix("CIRROLUS").separator("__").try_parsing(true))
            .build()
            .context("failed to build configuration")?;

        let config: NodeConfig = config
            .try_deserialize()
            .context("failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.node.port == 0 {
            anyhow::bail!("node.port must be greater than 0");
        }
        if self.protocol.liveness_interval_secs == 0 {
            anyhow::bail!("protocol.liveness_interval_secs must be greater than 0");
        }
        std::fs::create_dir_all(&self.storage.data_dir)
            .with_context(|| format!("cannot create data directory {:?}", self.storage.data_dir))?;
        if !["trace", "debug", "info", "warn", "error"].contains(&self.telemetry.log_level.as_str()) {
            anyhow::bail!(
                "invalid log level: {}. must be one of: trace, debug, info, warn, error",
                self.telemetry.log_level
            );
        }
        if !["json", "pretty"].contains(&self.telemetry.log_format.as_str()) {
            anyhow::bail!("invalid log format: {}. must be one of: json, pretty", self.telemetry.log_format);
        }
        Ok(())
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.protocol.read_timeout_secs)
    }

    pub fn reply_timeout(&self) -> Duration {
        Duration::from_secs(self.protocol.reply_timeout_secs)
    }

    pub fn liveness_interval(&self) -> Duration {
        Duration::from_secs(self.protocol.liveness_interval_secs)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            node: ListenConfig {
                host: "0.0.0.0".to_string(),
                port: 50666,
            },
            storage: StorageConfig {
                data_dir: PathBuf::from("."),
                default_private: false,
            },
            protocol: ProtocolTiming {
                read_timeout_secs: 4,
                reply_timeout_secs: 10,
                liveness_interval_secs: 60,
            },
            telemetry: TelemetryConfig {
                log_level: "info".to_string(),
                log_format: "pretty".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_runnable() {
        let config = NodeConfig::default();
        assert_eq!(config.node.port, 50666);
        assert_eq!(config.liveness_interval(), Duration::from_secs(60));
    }
}
