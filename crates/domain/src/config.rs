//! Configuration management

use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub calendar: CalendarConfig,
    pub webhooks: WebhookConfig,
    pub server: ServerConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

/// External calendar collaborator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Base URL of the busy-time endpoint. When absent, hosts are treated
    /// as having no external calendar.
    pub base_url: Option<String>,
    pub timeout_seconds: u64,
}

/// Webhook delivery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub poll_interval_seconds: u64,
    pub batch_size: usize,
    pub delivery_timeout_seconds: u64,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig { path: "slotwise.db".to_string(), pool_size: 8 },
            calendar: CalendarConfig { base_url: None, timeout_seconds: 5 },
            webhooks: WebhookConfig {
                poll_interval_seconds: 15,
                batch_size: 50,
                delivery_timeout_seconds: 30,
            },
            server: ServerConfig { bind_addr: "127.0.0.1:8080".to_string() },
        }
    }
}
