use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub store_backend: StoreBackend,
    pub mongo_uri: String,
    pub mongo_database: String,
    pub redis_uri: String,
    pub contest_token_secret: String,
    pub contest_token_ttl_seconds: i64,
    pub problem_set_ttl_seconds: u64,
    pub bind_addr: String,
    pub metrics_basic_auth: String,
    pub otlp_endpoint: Option<String>,
    pub log_format: LogFormat,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // config/{env}.toml first, APP_* environment variables on top
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let lookup = |key: &str, legacy: &str| -> Option<String> {
            settings.get_string(key).ok().or_else(|| env::var(legacy).ok())
        };

        let store_backend = match lookup("database.backend", "STORE_BACKEND").as_deref() {
            None | Some("mongo") => StoreBackend::Mongo,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(config::ConfigError::Message(format!(
                    "unknown database.backend '{}', expected 'mongo' or 'memory'",
                    other
                )))
            }
        };

        let mongo_uri = lookup("database.mongo_uri", "MONGO_URI")
            .unwrap_or_else(|| "mongodb://localhost:27017".to_string());

        let mongo_database = lookup("database.mongo_database", "MONGO_DATABASE")
            .unwrap_or_else(|| "test_portal_db".to_string());

        let redis_uri = lookup("redis.uri", "REDIS_URI").unwrap_or_else(|| {
            let host = env::var("REDIS_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
            let port = env::var("REDIS_PORT").unwrap_or_else(|_| "6379".to_string());
            format!("redis://{}:{}/0", host, port)
        });

        let contest_token_secret =
            match lookup("auth.contest_token_secret", "CONTEST_TOKEN_SECRET") {
                Some(secret) => secret,
                None if env == "prod" => {
                    return Err(config::ConfigError::Message(
                        "auth.contest_token_secret must be set in production".to_string(),
                    ))
                }
                None => {
                    eprintln!("WARNING: Using default contest token secret (dev mode only!)");
                    "dev-secret-only-for-local-testing".to_string()
                }
            };

        let contest_token_ttl_seconds = parse_ttl(
            lookup("auth.contest_token_ttl_seconds", "CONTEST_TOKEN_TTL_SECONDS"),
            "auth.contest_token_ttl_seconds",
            3600,
        )?;

        let problem_set_ttl_seconds = parse_ttl(
            lookup("delivery.problem_set_ttl_seconds", "PROBLEM_SET_TTL_SECONDS"),
            "delivery.problem_set_ttl_seconds",
            86_400,
        )?;

        let bind_addr =
            lookup("server.bind_addr", "BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8081".to_string());

        let metrics_basic_auth = lookup("metrics.basic_auth", "METRICS_AUTH")
            .unwrap_or_else(|| "admin:changeme".to_string());

        let otlp_endpoint = lookup("telemetry.otlp_endpoint", "OTEL_EXPORTER_OTLP_ENDPOINT");

        let log_format = match lookup("logging.format", "LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Config {
            store_backend,
            mongo_uri,
            mongo_database,
            redis_uri,
            contest_token_secret,
            contest_token_ttl_seconds,
            problem_set_ttl_seconds,
            bind_addr,
            metrics_basic_auth,
            otlp_endpoint,
            log_format,
        })
    }

    /// Settings for tests and local experiments: in-memory store, fixed secret.
    pub fn for_memory(secret: &str) -> Self {
        Config {
            store_backend: StoreBackend::Memory,
            mongo_uri: String::new(),
            mongo_database: "test_portal_db".to_string(),
            redis_uri: String::new(),
            contest_token_secret: secret.to_string(),
            contest_token_ttl_seconds: 3600,
            problem_set_ttl_seconds: 86_400,
            bind_addr: "127.0.0.1:0".to_string(),
            metrics_basic_auth: "admin:changeme".to_string(),
            otlp_endpoint: None,
            log_format: LogFormat::Pretty,
        }
    }
}

fn parse_number<T: std::str::FromStr>(
    raw: Option<String>,
    key: &str,
    default: T,
) -> Result<T, config::ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse::<T>().map_err(|_| {
            config::ConfigError::Message(format!("{} must be a number, got '{}'", key, value))
        }),
    }
}

/// Like `parse_number`, but zero and negative TTLs are errors (`SET .. EX 0` fails).
fn parse_ttl<T>(raw: Option<String>, key: &str, default: T) -> Result<T, config::ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    let value = parse_number(raw, key, default)?;
    if value <= T::default() {
        return Err(config::ConfigError::Message(format!(
            "{} must be greater than zero",
            key
        )));
    }
    Ok(value)
}
