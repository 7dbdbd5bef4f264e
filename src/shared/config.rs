use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const ENV_PREFIX: &str = "CATCH_SYNC_";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub busy_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub catch_path: String,
    pub waypoint_path: String,
    /// Only bounds connection setup. Requests themselves are left to the platform default.
    pub connect_timeout: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub auto_sync: bool,
    pub sync_interval: u64,
    pub claim_lease_seconds: u64,
    #[serde(default)]
    pub max_entry_age_hours: Option<u64>,
    pub wake_buffer: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            api: ApiConfig {
                base_url: "http://localhost:3000".to_string(),
                catch_path: "/api/catch".to_string(),
                waypoint_path: "/api/waypoints".to_string(),
                connect_timeout: None,
            },
            sync: SyncConfig {
                auto_sync: true,
                sync_interval: 300, // 5 minutes
                claim_lease_seconds: 600,
                max_entry_age_hours: None,
                wake_buffer: 32,
            },
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: 5,
            connection_timeout: 30,
            busy_timeout: 5,
        }
    }
}

fn default_database_url() -> String {
    let dir = dirs::data_local_dir()
        .map(|dir| dir.join("catch-sync"))
        .unwrap_or_else(|| PathBuf::from("./data"));
    format!("sqlite://{}", dir.join("offline.db").display())
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup, keeping the defaults for
    /// anything missing or unparsable.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(v) = var("DATABASE_URL")
            && !v.trim().is_empty()
        {
            cfg.database.url = v.trim().to_string();
        }
        if let Some(value) = var("DATABASE_MAX_CONNECTIONS").and_then(|v| parse_u64(&v)) {
            cfg.database.max_connections = value as u32;
        }
        if let Some(value) = var("DATABASE_BUSY_TIMEOUT").and_then(|v| parse_u64(&v)) {
            cfg.database.busy_timeout = value;
        }

        if let Some(v) = var("API_BASE_URL")
            && !v.trim().is_empty()
        {
            cfg.api.base_url = v.trim().trim_end_matches('/').to_string();
        }
        if let Some(v) = var("API_CATCH_PATH") {
            cfg.api.catch_path = v.trim().to_string();
        }
        if let Some(v) = var("API_WAYPOINT_PATH") {
            cfg.api.waypoint_path = v.trim().to_string();
        }
        if let Some(value) = var("API_CONNECT_TIMEOUT").and_then(|v| parse_u64(&v)) {
            cfg.api.connect_timeout = if value == 0 { None } else { Some(value) };
        }

        if let Some(v) = var("AUTO_SYNC") {
            cfg.sync.auto_sync = parse_bool(&v, cfg.sync.auto_sync);
        }
        if let Some(value) = var("SYNC_INTERVAL").and_then(|v| parse_u64(&v)) {
            cfg.sync.sync_interval = value.max(1);
        }
        if let Some(value) = var("CLAIM_LEASE_SECONDS").and_then(|v| parse_u64(&v)) {
            cfg.sync.claim_lease_seconds = value;
        }
        if let Some(value) = var("MAX_ENTRY_AGE_HOURS").and_then(|v| parse_u64(&v)) {
            cfg.sync.max_entry_age_hours = if value == 0 { None } else { Some(value) };
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }
        if self.database.url.trim().is_empty() {
            return Err("Database url is required".to_string());
        }
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://")
        {
            return Err("API base_url must be an http(s) URL".to_string());
        }
        if !self.api.catch_path.starts_with('/') || !self.api.waypoint_path.starts_with('/') {
            return Err("API paths must start with '/'".to_string());
        }
        if self.sync.sync_interval == 0 {
            return Err("Sync sync_interval must be greater than 0".to_string());
        }
        if self.sync.claim_lease_seconds == 0 {
            return Err("Sync claim_lease_seconds must be greater than 0".to_string());
        }
        if self.sync.wake_buffer == 0 {
            return Err("Sync wake_buffer must be greater than 0".to_string());
        }
        Ok(())
    }
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}
