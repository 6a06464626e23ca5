//! Health endpoint configuration

use serde::{Deserialize, Serialize};

/// Bind address of the health endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthServerConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

impl HealthServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for HealthServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}
