//! Process configuration, read once from the environment at start-up.

use std::path::PathBuf;

use crate::db::DbConfig;
use crate::generator::GeneratorConfig;
use crate::storage::BlobConfig;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("environment variable {name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub enum StoreBackend {
    Postgres(DbConfig),
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: String,
    pub host: String,
    pub port: u16,
    pub store: StoreBackend,
    pub blob: BlobConfig,
    pub generator: GeneratorConfig,
    pub session_cookie: String,
    pub allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        fn parse<T: std::str::FromStr>(
            name: &'static str,
            value: Option<String>,
            default: T,
        ) -> Result<T, ConfigError> {
            match value {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::Invalid { name, value: raw }),
                None => Ok(default),
            }
        }

        let environment = get("ENVIRONMENT").unwrap_or_else(|| "development".to_string());
        let host = get("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port: u16 = parse("PORT", get("PORT"), 3001)?;

        let store = match get("DOCUMENT_STORE").as_deref() {
            None | Some("postgres") => StoreBackend::Postgres(DbConfig {
                url: require("DATABASE_URL")?,
                max_connections: parse("DB_POOL_MAX", get("DB_POOL_MAX"), 10)?,
                min_connections: parse("DB_POOL_MIN", get("DB_POOL_MIN"), 2)?,
                connect_timeout_secs: parse("DB_CONNECT_TIMEOUT", get("DB_CONNECT_TIMEOUT"), 10)?,
                idle_timeout_secs: parse("DB_IDLE_TIMEOUT", get("DB_IDLE_TIMEOUT"), 300)?,
            }),
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "DOCUMENT_STORE",
                    value: other.to_string(),
                })
            }
        };

        let blob = BlobConfig {
            root: PathBuf::from(get("STORAGE_ROOT").unwrap_or_else(|| "uploads".to_string())),
            public_base_url: get("PUBLIC_BASE_URL")
                .unwrap_or_else(|| format!("http://{}:{}", host, port)),
            signing_secret: require("STORAGE_SIGNING_SECRET")?,
        };

        let generator = GeneratorConfig {
            api_key: require("AI_API_KEY")?,
            api_base: get("AI_API_BASE").unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            model: get("AI_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
        };

        let allowed_origins = get("ALLOWED_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty())
            .or_else(|| get("FRONTEND_ORIGIN").map(|o| vec![o]))
            .unwrap_or_else(|| {
                vec![
                    "http://localhost:3000".to_string(),
                    "http://127.0.0.1:3000".to_string(),
                ]
            });

        Ok(Self {
            environment,
            host,
            port,
            store,
            blob,
            generator,
            session_cookie: get("SESSION_COOKIE").unwrap_or_else(|| "session".to_string()),
            allowed_origins,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("DATABASE_URL", "postgresql://localhost/landing"),
        ("STORAGE_SIGNING_SECRET", "s3cret"),
        ("AI_API_KEY", "sk-test"),
    ];

    #[test]
    fn test_defaults_with_required_vars() {
        let config = AppConfig::from_lookup(lookup(REQUIRED)).unwrap();
        assert_eq!(config.port, 3001);
        assert_eq!(config.session_cookie, "session");
        assert_eq!(config.blob.public_base_url, "http://127.0.0.1:3001");
        assert_eq!(config.generator.model, "gpt-4o-mini");
        assert!(matches!(config.store, StoreBackend::Postgres(ref db) if db.max_connections == 10));
        assert_eq!(config.allowed_origins.len(), 2);
        assert!(!config.is_production());
    }

    #[test]
    fn test_missing_database_url_fails() {
        let err = AppConfig::from_lookup(lookup(&[
            ("STORAGE_SIGNING_SECRET", "s3cret"),
            ("AI_API_KEY", "sk-test"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATABASE_URL"));
    }

    #[test]
    fn test_memory_store_needs_no_database_url() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DOCUMENT_STORE", "memory"),
            ("STORAGE_SIGNING_SECRET", "s3cret"),
            ("AI_API_KEY", "sk-test"),
        ]))
        .unwrap();
        assert!(matches!(config.store, StoreBackend::Memory));
    }

    #[test]
    fn test_missing_api_key_fails() {
        let err = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgresql://localhost/landing"),
            ("STORAGE_SIGNING_SECRET", "s3cret"),
            ("AI_API_KEY", "   "),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing("AI_API_KEY"));
    }

    #[test]
    fn test_invalid_port() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PORT", "eighty"));
        let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));
    }

    #[test]
    fn test_allowed_origins_split() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("ALLOWED_ORIGINS", "https://a.example, https://b.example,"));
        let config = AppConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(
            config.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
    }
}
