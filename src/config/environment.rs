//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.
//! Todas las variables tienen un valor por defecto salvo `DATABASE_URL`, cuya
//! ausencia arranca el servidor sobre el store en memoria.

use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};

pub const DEFAULT_RATING_BASE_URL: &str = "http://localhost:5173";
pub const DEFAULT_RATING_LINK_TTL_HOURS: i64 = 168;

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub cors_origins: Vec<String>,
    pub rating_base_url: String,
    pub rating_link_ttl_hours: i64,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 3000,
            host: "0.0.0.0".to_string(),
            database_url: None,
            database_max_connections: 10,
            cors_origins: Vec::new(),
            rating_base_url: DEFAULT_RATING_BASE_URL.to_string(),
            rating_link_ttl_hours: DEFAULT_RATING_LINK_TTL_HOURS,
        }
    }
}

fn parse_or<T: FromStr>(value: Option<String>, name: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid number, got '{}'", name, raw)),
        None => Ok(default),
    }
}

impl EnvironmentConfig {
    /// Lee la configuración de las variables de entorno del proceso
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Construye la configuración desde una fuente arbitraria de variables
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let rating_link_ttl_hours = parse_or(
            non_empty("RATING_LINK_TTL_HOURS"),
            "RATING_LINK_TTL_HOURS",
            defaults.rating_link_ttl_hours,
        )?;
        if rating_link_ttl_hours <= 0 {
            anyhow::bail!("RATING_LINK_TTL_HOURS must be positive");
        }

        Ok(Self {
            environment: non_empty("ENVIRONMENT").unwrap_or(defaults.environment),
            port: parse_or(non_empty("PORT"), "PORT", defaults.port)?,
            host: non_empty("HOST").unwrap_or(defaults.host),
            database_url: non_empty("DATABASE_URL"),
            database_max_connections: parse_or(
                non_empty("DATABASE_MAX_CONNECTIONS"),
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            )?,
            cors_origins: non_empty("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            rating_base_url: non_empty("RATING_BASE_URL").unwrap_or(defaults.rating_base_url),
            rating_link_ttl_hours,
        })
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<EnvironmentConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EnvironmentConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_without_variables() {
        let config = config_from(&[]).unwrap();
        assert!(config.is_development());
        assert_eq!(config.server_url(), "0.0.0.0:3000");
        assert!(config.database_url.is_none());
        assert_eq!(config.rating_base_url, DEFAULT_RATING_BASE_URL);
        assert_eq!(config.rating_link_ttl_hours, 168);
    }

    #[test]
    fn test_reads_overrides() {
        let config = config_from(&[
            ("ENVIRONMENT", "production"),
            ("PORT", "8080"),
            ("DATABASE_URL", "postgres://localhost/carwash"),
            ("CORS_ORIGINS", "https://a.mx, https://b.mx,"),
            ("RATING_LINK_TTL_HOURS", "24"),
        ])
        .unwrap();
        assert!(config.is_production());
        assert_eq!(config.port, 8080);
        assert_eq!(config.cors_origins, vec!["https://a.mx", "https://b.mx"]);
        assert_eq!(config.rating_link_ttl_hours, 24);
    }

    #[test]
    fn test_invalid_numbers_are_errors() {
        assert!(config_from(&[("PORT", "abc")]).is_err());
        assert!(config_from(&[("RATING_LINK_TTL_HOURS", "0")]).is_err());
    }
}
