use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use ocd_query::QuerySettings;
use serde::{Deserialize, Deserializer, Serialize};
use serde_aux::prelude::deserialize_vec_from_string_or_vec;

/// Application configuration loaded from multiple sources.
///
/// Configuration is loaded in priority order (lowest to highest):
/// 1. Struct defaults
/// 2. config.yaml file (if exists)
/// 3. Environment variables with OCD_ prefix (always wins)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub swagger: SwaggerConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_host")]
    pub host: String,

    #[serde(default = "default_db_port")]
    pub port: u16,

    #[serde(default = "default_db_name")]
    pub name: String,

    /// Database user (required, no compiled-in default).
    #[serde(default)]
    pub user: String,

    /// Database password (required, no compiled-in default).
    #[serde(default)]
    pub password: String,

    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Seconds a request waits for a pooled connection.
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

impl DatabaseConfig {
    /// Assemble a `PostgreSQL` connection URL from individual fields.
    #[must_use]
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.name
        )
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// HTTP server bind address.
    #[serde(default = "default_host")]
    pub host: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error) or a full
    /// `EnvFilter` directive such as `ocd_api=debug,tower_http=info`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsConfig {
    /// Allowed origins for CORS requests.
    /// Use `"*"` to allow any origin.
    /// Accepts either an array or comma-separated string.
    /// Example: `["http://localhost:5173"]` or `"http://localhost:5173,https://app.example.com"`
    #[serde(
        default = "default_allowed_origins",
        deserialize_with = "deserialize_origins"
    )]
    pub allowed_origins: Vec<String>,
}

/// Deserialize origins from comma-separated string or array, filtering empty values.
fn deserialize_origins<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let origins: Vec<String> = deserialize_vec_from_string_or_vec(deserializer)?;
    Ok(origins
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

/// Query behaviour of the list and detail endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Page size when the request has no `per_page`.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Upper bound `per_page` is clamped to.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,

    /// Radius around a `lat`/`lon` point that still matches a geometry.
    #[serde(default = "default_geo_radius_meters")]
    pub geo_radius_meters: f64,

    /// Full-text rank a record must exceed to match `q`.
    #[serde(default)]
    pub search_min_rank: f32,

    /// Attach a `debug` object to every response.
    /// Enable in development via `OCD_API__DEBUG=true`
    #[serde(default)]
    pub debug: bool,
}

impl ApiConfig {
    #[must_use]
    pub fn query_settings(&self) -> QuerySettings {
        QuerySettings {
            default_page_size: self.default_page_size,
            max_page_size: self.max_page_size,
            geo_radius_meters: self.geo_radius_meters,
            search_min_rank: self.search_min_rank,
            debug: self.debug,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            geo_radius_meters: default_geo_radius_meters(),
            search_min_rank: 0.0,
            debug: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SwaggerConfig {
    /// Enable Swagger UI at /swagger-ui.
    /// Default: false. Enable in development via `OCD_SWAGGER__ENABLED=true`
    #[serde(default)]
    pub enabled: bool,
}

// These functions cannot be const because serde uses function pointers for defaults
#[allow(clippy::missing_const_for_fn)]
fn default_max_connections() -> u32 {
    10
}

#[allow(clippy::missing_const_for_fn)]
fn default_acquire_timeout_secs() -> u64 {
    5
}

#[allow(clippy::missing_const_for_fn)]
fn default_port() -> u16 {
    8000
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_db_host() -> String {
    "localhost".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_db_port() -> u16 {
    5432
}

fn default_db_name() -> String {
    "opencivicdata".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_allowed_origins() -> Vec<String> {
    vec![]
}

#[allow(clippy::missing_const_for_fn)]
fn default_page_size() -> u32 {
    10
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_page_size() -> u32 {
    100
}

#[allow(clippy::missing_const_for_fn)]
fn default_geo_radius_meters() -> f64 {
    100.0
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                host: default_db_host(),
                port: default_db_port(),
                name: default_db_name(),
                user: String::new(),
                password: String::new(),
                max_connections: default_max_connections(),
                acquire_timeout_secs: default_acquire_timeout_secs(),
            },
            server: ServerConfig {
                port: default_port(),
                host: default_host(),
            },
            logging: LoggingConfig {
                level: default_log_level(),
            },
            cors: CorsConfig::default(),
            api: ApiConfig::default(),
            swagger: SwaggerConfig::default(),
        }
    }
}

/// Configuration loading and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

const ENV_PREFIX: &str = "OCD_";

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    /// Returns an error if configuration cannot be loaded or is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config.yaml")
    }

    /// Load configuration with a custom YAML file path.
    ///
    /// # Errors
    /// Returns an error if configuration cannot be loaded or is invalid.
    pub fn load_from(yaml_path: &str) -> Result<Self, ConfigError> {
        let config: Self = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Yaml::file(yaml_path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.user.is_empty() {
            return Err(ConfigError::Validation(
                "database.user is required. Set OCD_DATABASE__USER environment variable or configure in config.yaml.".into(),
            ));
        }

        if self.database.password.is_empty() {
            return Err(ConfigError::Validation(
                "database.password is required. Set OCD_DATABASE__PASSWORD environment variable or configure in config.yaml.".into(),
            ));
        }

        if self.database.port == 0 {
            return Err(ConfigError::Validation("database.port cannot be 0".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Validation(
                "database.max_connections cannot be 0".into(),
            ));
        }

        if self.database.acquire_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "database.acquire_timeout_secs cannot be 0".into(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigError::Validation("server.port cannot be 0".into()));
        }

        for origin in &self.cors.allowed_origins {
            if origin != "*" && !origin.starts_with("http://") && !origin.starts_with("https://") {
                return Err(ConfigError::Validation(format!(
                    "cors.allowed_origins contains invalid origin '{origin}'. Must be '*' or start with http:// or https://"
                )));
            }
        }

        self.api.validate()
    }
}

impl ApiConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_page_size == 0 {
            return Err(ConfigError::Validation(
                "api.default_page_size cannot be 0".into(),
            ));
        }

        if self.max_page_size < self.default_page_size {
            return Err(ConfigError::Validation(format!(
                "api.max_page_size ({}) must be at least api.default_page_size ({})",
                self.max_page_size, self.default_page_size
            )));
        }

        if !self.geo_radius_meters.is_finite() || self.geo_radius_meters < 0.0 {
            return Err(ConfigError::Validation(format!(
                "api.geo_radius_meters must be a non-negative number, got {}",
                self.geo_radius_meters
            )));
        }

        if !self.search_min_rank.is_finite() || self.search_min_rank < 0.0 {
            return Err(ConfigError::Validation(format!(
                "api.search_min_rank must be a non-negative number, got {}",
                self.search_min_rank
            )));
        }

        Ok(())
    }
}
