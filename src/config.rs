use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Server configuration.
///
/// Loaded from an optional TOML file, then overridden by the deployment
/// environment (`PORT`, `DATABASE_PATH`, `FRONTEND_URL`, `APP_ENV`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    /// Origins allowed by CORS.
    #[serde(default = "default_frontend_origins")]
    pub frontend_origins: Vec<String>,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    /// Exposes `/api/debug/*`.
    #[serde(default = "default_debug_routes")]
    pub debug_routes: bool,
    /// Wall-clock guard around a single graph execution.
    #[serde(default = "default_execution_timeout_ms")]
    pub execution_timeout_ms: u64,
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_database_path() -> PathBuf {
    PathBuf::from("webreal.db")
}

fn default_frontend_origins() -> Vec<String> {
    vec!["http://localhost:8080".to_string()]
}

fn default_token_ttl_hours() -> i64 {
    24 * 7
}

fn default_debug_routes() -> bool {
    true
}

fn default_execution_timeout_ms() -> u64 {
    5_000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            database_path: default_database_path(),
            frontend_origins: default_frontend_origins(),
            token_ttl_hours: default_token_ttl_hours(),
            debug_routes: default_debug_routes(),
            execution_timeout_ms: default_execution_timeout_ms(),
        }
    }
}

impl ServerConfig {
    /// Load config from a TOML file, with `${ENV_VAR}` expansion.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml(&expand_env_vars(&content, |name| std::env::var(name).ok()))
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Loads `path` when it exists and falls back to defaults otherwise, then
    /// applies the process environment.
    pub fn resolve(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            Self::load(path)?
        } else {
            warn!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Applies environment overrides through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT").filter(|p| !p.trim().is_empty()) {
            let host = self
                .bind
                .rsplit_once(':')
                .map(|(host, _)| host.to_string())
                .unwrap_or_else(|| "0.0.0.0".to_string());
            self.bind = format!("{}:{}", host, port.trim());
        }
        if let Some(path) = lookup("DATABASE_PATH").filter(|p| !p.is_empty()) {
            self.database_path = PathBuf::from(path);
        }
        if let Some(origins) = lookup("FRONTEND_URL") {
            let origins: Vec<String> = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
            if !origins.is_empty() {
                self.frontend_origins = origins;
            }
        }
        if lookup("APP_ENV").as_deref() == Some("production") {
            self.debug_routes = false;
        }
    }
}

/// Expand `${ENV_VAR}` patterns in a string. Unknown variables are kept as written.
fn expand_env_vars<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next();
            let mut var_name = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_name.push(c);
            }
            match lookup(&var_name) {
                Some(val) => result.push_str(&val),
                None => result.push_str(&format!("${{{}}}", var_name)),
            }
        } else {
            result.push(c);
        }
    }
    result
}
