// src/state.rs
use std::sync::Arc;

use crate::{
    errors::{RadarError, RadarResult},
    services::{
        credential_service::{CredentialService, HashingConfig},
        driver_service::DriverService,
        location_service::LocationService,
        store_service::{DriverStore, MemoryDriverStore, RedisDriverStore},
    },
};

pub struct AppState {
    pub driver_service: Arc<DriverService>,
    pub location_service: Arc<LocationService>,
    pub config: AppConfig,
}

#[derive(Clone)]
pub struct AppConfig {
    pub admin_pin: String,
    pub redis_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub hashing: HashingConfig,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("admin_pin", &"<redacted>")
            .field("redis_url", &self.redis_url)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("hashing", &self.hashing)
            .finish()
    }
}

impl AppConfig {
    /// Reads configuration from the process environment, after loading `.env`.
    pub fn from_env() -> RadarResult<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> RadarResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let admin_pin = lookup("ADMIN_PIN")
            .filter(|pin| !pin.is_empty())
            .ok_or_else(|| RadarError::MissingEnvironmentVariable("ADMIN_PIN".to_string()))?;

        let port = match lookup("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| {
                RadarError::InvalidConfiguration(format!("PORT must be a valid port number, got '{}'", raw))
            })?,
            None => 5000,
        };

        let mut hashing = HashingConfig::default();
        if let Some(raw) = lookup("ARGON2_MEMORY_KIB") {
            hashing.memory_kib = raw.parse().map_err(|_| {
                RadarError::InvalidConfiguration(format!("ARGON2_MEMORY_KIB must be a number, got '{}'", raw))
            })?;
        }
        if let Some(raw) = lookup("ARGON2_ITERATIONS") {
            hashing.iterations = raw.parse().map_err(|_| {
                RadarError::InvalidConfiguration(format!("ARGON2_ITERATIONS must be a number, got '{}'", raw))
            })?;
        }

        Ok(Self {
            admin_pin,
            redis_url: lookup("REDIS_URL").filter(|url| !url.is_empty()),
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            hashing,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl AppState {
    pub async fn new(config: AppConfig) -> RadarResult<Self> {
        let store: Arc<dyn DriverStore> = match &config.redis_url {
            Some(url) => Arc::new(RedisDriverStore::connect(url).await?),
            None => {
                tracing::warn!("REDIS_URL not set, using in-memory driver store");
                Arc::new(MemoryDriverStore::new())
            }
        };
        Self::with_store(config, store)
    }

    /// Wires the services on top of an already constructed store.
    pub fn with_store(config: AppConfig, store: Arc<dyn DriverStore>) -> RadarResult<Self> {
        let credentials = Arc::new(CredentialService::new(config.hashing)?);
        let driver_service = Arc::new(DriverService::new(store.clone(), credentials));
        let location_service = Arc::new(LocationService::new(store));

        Ok(Self {
            driver_service,
            location_service,
            config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[("ADMIN_PIN", "1234")])).unwrap();
        assert_eq!(config.admin_pin, "1234");
        assert_eq!(config.port, 5000);
        assert_eq!(config.bind_address(), "0.0.0.0:5000");
        assert!(config.redis_url.is_none());
    }

    #[test]
    fn test_admin_pin_is_required() {
        let err = AppConfig::from_lookup(lookup(&[("PORT", "8080")])).unwrap_err();
        assert!(matches!(err, RadarError::MissingEnvironmentVariable(var) if var == "ADMIN_PIN"));

        let err = AppConfig::from_lookup(lookup(&[("ADMIN_PIN", "")])).unwrap_err();
        assert!(matches!(err, RadarError::MissingEnvironmentVariable(_)));
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("ADMIN_PIN", "1234"),
            ("PORT", "8080"),
            ("HOST", "127.0.0.1"),
            ("REDIS_URL", "redis://cache:6379/"),
            ("ARGON2_ITERATIONS", "3"),
        ]))
        .unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.redis_url.as_deref(), Some("redis://cache:6379/"));
        assert_eq!(config.hashing.iterations, 3);
    }

    #[test]
    fn test_invalid_port() {
        let err = AppConfig::from_lookup(lookup(&[("ADMIN_PIN", "1234"), ("PORT", "http")])).unwrap_err();
        assert!(matches!(err, RadarError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_debug_hides_admin_pin() {
        let config = AppConfig::from_lookup(lookup(&[("ADMIN_PIN", "987654")])).unwrap();
        assert!(!format!("{:?}", config).contains("987654"));
    }
}
