use std::fs;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Result, TelemetryError};
use crate::simulation::SIMULATION_PERIOD_MS;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    pub session_name: String,
    /// Controller WebSocket endpoint.
    pub endpoint: String,
    pub simulation_period_ms: u64,
    pub event_queue_capacity: usize,
    pub reconnect_initial_ms: u64,
    pub reconnect_max_ms: u64,
    pub log_level: String,
    pub bridge: BridgeConfig,
}

/// Settings for the local controller bridge.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct BridgeConfig {
    pub listen_addr: String,
    pub stream_period_ms: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            session_name: "finger".to_string(),
            endpoint: "ws://localhost:8765".to_string(),
            simulation_period_ms: SIMULATION_PERIOD_MS,
            event_queue_capacity: 256,
            reconnect_initial_ms: 1_000,
            reconnect_max_ms: 10_000,
            log_level: "info".to_string(),
            bridge: BridgeConfig::default(),
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8765".to_string(),
            stream_period_ms: 20,
        }
    }
}

pub fn load_config(path: &str) -> Result<DashboardConfig> {
    let content = fs::read_to_string(path).map_err(|source| TelemetryError::Config {
        path: path.to_string(),
        source,
    })?;
    DashboardConfig::from_toml_str(&content)
}

impl DashboardConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        load_config(path)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: DashboardConfig = toml::from_str(contents)?;
        Ok(config)
    }

    pub fn simulation_period(&self) -> Duration {
        Duration::from_millis(self.simulation_period_ms.max(1))
    }

    pub fn reconnect_initial(&self) -> Duration {
        Duration::from_millis(self.reconnect_initial_ms.max(1))
    }

    pub fn reconnect_max(&self) -> Duration {
        Duration::from_millis(self.reconnect_max_ms.max(self.reconnect_initial_ms).max(1))
    }
}

impl BridgeConfig {
    pub fn stream_period(&self) -> Duration {
        Duration::from_millis(self.stream_period_ms.max(1))
    }
}
