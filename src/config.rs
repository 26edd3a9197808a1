use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::constants::{
    DEFAULT_CACHE_DIR, DEFAULT_DATA_DIR, DEFAULT_FRANCHISE_INPUT, DEFAULT_LISTEN_ADDR,
    DEFAULT_PLANT_INPUT, DEFAULT_REGISTRY_URL, DEFAULT_REQUEST_TIMEOUT_SECONDS,
    DEFAULT_SESSION_TTL_SECONDS, REGISTRY_SQL,
};
use crate::types::QueryDescriptor;

#[derive(Clone)]
pub struct Config {
    pub listen_addr: String,
    pub cache_dir: PathBuf,
    pub data_dir: PathBuf,
    pub franchise_input: PathBuf,
    pub plant_input: PathBuf,
    pub registry_url: String,
    pub request_timeout: Duration,
    pub session_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let listen_addr = env_string("SOLARMAP_LISTEN_ADDR", DEFAULT_LISTEN_ADDR);
        let cache_dir = PathBuf::from(env_string("SOLARMAP_CACHE_DIR", DEFAULT_CACHE_DIR));
        let data_dir = PathBuf::from(env_string("SOLARMAP_DATA_DIR", DEFAULT_DATA_DIR));
        let franchise_input =
            PathBuf::from(env_string("SOLARMAP_FRANCHISE_CSV", DEFAULT_FRANCHISE_INPUT));
        let plant_input = PathBuf::from(env_string("SOLARMAP_PLANT_CSV", DEFAULT_PLANT_INPUT));
        let registry_url = env_string("SOLARMAP_REGISTRY_URL", DEFAULT_REGISTRY_URL);
        let request_timeout = Duration::from_secs(env_u64(
            "SOLARMAP_REQUEST_TIMEOUT_SECONDS",
            DEFAULT_REQUEST_TIMEOUT_SECONDS,
        )?);
        let session_ttl = Duration::from_secs(env_u64(
            "SOLARMAP_SESSION_TTL_SECONDS",
            DEFAULT_SESSION_TTL_SECONDS,
        )?);

        Ok(Self {
            listen_addr,
            cache_dir,
            data_dir,
            franchise_input,
            plant_input,
            registry_url,
            request_timeout,
            session_ttl,
        })
    }

    pub fn registry_query(&self) -> QueryDescriptor {
        QueryDescriptor {
            url: self.registry_url.clone(),
            sql: REGISTRY_SQL.to_string(),
        }
    }
}

fn env_string(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_u64(name: &str, default: u64) -> Result<u64> {
    match std::env::var(name) {
        Ok(value) => value
            .parse::<u64>()
            .with_context(|| format!("Failed to parse {}={} as u64", name, value)),
        Err(_) => Ok(default),
    }
}
