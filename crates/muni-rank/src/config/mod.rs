use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_ROUTING_BASE_URL: &str = "https://maps.googleapis.com/maps/api/distancematrix/json";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub dataset: DatasetConfig,
    pub routing: RoutingConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let candidates_csv = env::var("APP_CANDIDATES_CSV")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            dataset: DatasetConfig { candidates_csv },
            routing: RoutingConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where the candidate table comes from. `None` means the bundled sample.
#[derive(Debug, Clone, Default)]
pub struct DatasetConfig {
    pub candidates_csv: Option<PathBuf>,
}

/// External routing service settings. Routing is disabled without an API key.
#[derive(Debug, Clone)]
pub struct RoutingConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
    pub calls_per_search: u32,
    pub call_delay: Duration,
    pub place_suffix: Option<String>,
}

impl RoutingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_key = env::var("ROUTING_API_KEY")
            .ok()
            .filter(|value| !value.trim().is_empty());
        let base_url =
            env::var("ROUTING_BASE_URL").unwrap_or_else(|_| DEFAULT_ROUTING_BASE_URL.to_string());
        let timeout_ms = parse_env_u64("ROUTING_TIMEOUT_MS", 5_000)?;
        let calls_per_search = parse_env_u64("ROUTING_CALLS_PER_SEARCH", 10)?;
        let call_delay_ms = parse_env_u64("ROUTING_CALL_DELAY_MS", 100)?;
        let place_suffix = match env::var("ROUTING_PLACE_SUFFIX") {
            Ok(value) if value.trim().is_empty() => None,
            Ok(value) => Some(value.trim().to_string()),
            Err(_) => Some("Slovenia".to_string()),
        };

        Ok(Self {
            api_key,
            base_url,
            timeout: Duration::from_millis(timeout_ms),
            calls_per_search: u32::try_from(calls_per_search).map_err(|_| {
                ConfigError::InvalidNumber {
                    variable: "ROUTING_CALLS_PER_SEARCH",
                }
            })?,
            call_delay: Duration::from_millis(call_delay_ms),
            place_suffix,
        })
    }

    pub fn enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_ROUTING_BASE_URL.to_string(),
            timeout: Duration::from_secs(5),
            calls_per_search: 10,
            call_delay: Duration::from_millis(100),
            place_suffix: Some("Slovenia".to_string()),
        }
    }
}

fn parse_env_u64(variable: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(variable) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber { variable }),
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { variable: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { variable } => {
                write!(f, "{variable} must be a non-negative integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
