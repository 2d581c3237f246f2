use crate::error::DiagError;
use figment::{Figment, providers::Env};
use serde::Deserialize;
use std::sync::LazyLock;
use url::Url;

/// Base URL of the deployed backend, used when `BACKEND_URL` is unset.
pub const DEFAULT_BACKEND_URL: &str =
    "https://registro-valorizaciones-backend-503600768755.southamerica-west1.run.app";

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_loglevel() -> String {
    "info".to_string()
}

fn default_backend_url() -> Url {
    Url::parse(DEFAULT_BACKEND_URL).expect("default backend URL is valid")
}

/// Process configuration, resolved once from the environment.
///
/// Database settings are optional on purpose: only the commands that touch
/// a given service require them, and those fail with `MissingEnv` naming
/// the variable.
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub turso_database_url: Option<Url>,
    #[serde(default)]
    pub turso_auth_token: Option<String>,
    #[serde(default)]
    pub neon_database_url: Option<String>,
    #[serde(default)]
    pub neon_connection_string: Option<String>,
    #[serde(default = "default_backend_url")]
    pub backend_url: Url,
    #[serde(default = "default_loglevel")]
    pub loglevel: String,
    #[serde(default)]
    pub production: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, figment::Error> {
        Figment::new().merge(Env::raw()).extract()
    }

    /// Neon connection string; `NEON_CONNECTION_STRING` is accepted as a
    /// legacy alias for `NEON_DATABASE_URL`.
    pub fn neon_url(&self) -> Result<&str, DiagError> {
        self.neon_database_url
            .as_deref()
            .or(self.neon_connection_string.as_deref())
            .ok_or(DiagError::MissingEnv("NEON_DATABASE_URL"))
    }

    pub fn turso(&self) -> Result<(&Url, &str), DiagError> {
        let url = self
            .turso_database_url
            .as_ref()
            .ok_or(DiagError::MissingEnv("TURSO_DATABASE_URL"))?;
        let token = self
            .turso_auth_token
            .as_deref()
            .ok_or(DiagError::MissingEnv("TURSO_AUTH_TOKEN"))?;
        Ok((url, token))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            turso_database_url: None,
            turso_auth_token: None,
            neon_database_url: None,
            neon_connection_string: None,
            backend_url: default_backend_url(),
            loglevel: default_loglevel(),
            production: false,
        }
    }
}

pub static CONFIG: LazyLock<Config> = LazyLock::new(|| match Config::from_env() {
    Ok(cfg) => cfg,
    Err(e) => {
        tracing::warn!(error = %e, "failed to read environment, falling back to defaults");
        Config::default()
    }
});
