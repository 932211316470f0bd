//! Configuration loading for AkashMover

use crate::error::{MoverError, Result};
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Clone, Debug, Deserialize)]
pub struct MoverConfig {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub avoidance: AvoidanceConfig,
}

/// Message bus connection settings
#[derive(Clone, Debug, Deserialize)]
pub struct ConnectionConfig {
    /// Bus IP address (default: 127.0.0.1 for local testing)
    #[serde(default = "default_bus_ip")]
    pub bus_ip: String,

    /// TCP port number (default: 14550)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Connection timeout in milliseconds (default: 5000)
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

/// Control loop settings
#[derive(Clone, Debug, Deserialize)]
pub struct ControlConfig {
    /// Control tick duration in milliseconds (default: 250, i.e. 4Hz —
    /// the autopilot link is a delicate thing, don't swamp it)
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

/// Avoidance settings
#[derive(Clone, Debug, Deserialize)]
pub struct AvoidanceConfig {
    /// Diagnostic mode: use the goal waypoint as the avoidance candidate
    /// instead of asking the planner (default: false)
    #[serde(default = "default_bypass")]
    pub bypass_to_goal: bool,
}

// Default value functions
fn default_bus_ip() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    14550
}
fn default_timeout() -> u64 {
    5000
}
fn default_tick_ms() -> u64 {
    250
}
fn default_bypass() -> bool {
    false
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            bus_ip: default_bus_ip(),
            port: default_port(),
            timeout_ms: default_timeout(),
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
        }
    }
}

impl Default for AvoidanceConfig {
    fn default() -> Self {
        Self {
            bypass_to_goal: default_bypass(),
        }
    }
}

impl Default for MoverConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            control: ControlConfig::default(),
            avoidance: AvoidanceConfig::default(),
        }
    }
}

impl MoverConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| MoverError::Config(format!("Failed to read config file: {}", e)))?;
        let config: MoverConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Get the full address string for connection
    pub fn address(&self) -> String {
        format!("{}:{}", self.connection.bus_ip, self.connection.port)
    }
}
