use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use sqlx::postgres::PgConnectOptions;

use crate::utils::ChartError;

/// Connection settings for the price store.
///
/// `DATABASE_URL` wins when set; otherwise the `PG_*` variables are used,
/// falling back to a local development database.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

/// Rendering settings
#[derive(Debug, Clone, PartialEq)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
    pub output_dir: PathBuf,
}

fn env_str(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_num<T: FromStr>(name: &str, raw: Option<String>, default: T) -> Result<T, ChartError> {
    match raw {
        Some(value) => value
            .parse()
            .map_err(|_| ChartError::Config(format!("{} must be a number, got '{}'", name, value))),
        None => Ok(default),
    }
}

impl StoreConfig {
    pub fn from_env() -> Result<Self, ChartError> {
        Ok(Self {
            url: env_opt("DATABASE_URL"),
            host: env_str("PG_HOST", "localhost"),
            port: parse_num("PG_PORT", env_opt("PG_PORT"), 5432)?,
            user: env_str("PG_USER", "postgres"),
            password: env_str("PG_PASSWORD", "postgres"),
            database: env_str("PG_DATABASE", "spikeshield"),
        })
    }

    pub fn connect_options(&self) -> Result<PgConnectOptions, ChartError> {
        if let Some(url) = &self.url {
            return PgConnectOptions::from_str(url)
                .map_err(|e| ChartError::Config(format!("Invalid DATABASE_URL: {}", e)));
        }

        Ok(PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database))
    }

    /// Connection target without credentials, for logs
    pub fn describe(&self) -> String {
        match &self.url {
            Some(_) => "DATABASE_URL".to_string(),
            None => format!("{}:{}/{}", self.host, self.port, self.database),
        }
    }
}

impl ChartConfig {
    pub fn from_env() -> Result<Self, ChartError> {
        let width = parse_num("CHART_WIDTH", env_opt("CHART_WIDTH"), 1200u32)?;
        let height = parse_num("CHART_HEIGHT", env_opt("CHART_HEIGHT"), 800u32)?;
        if width == 0 || height == 0 {
            return Err(ChartError::Config("chart dimensions must be non-zero".to_string()));
        }

        Ok(Self {
            width,
            height,
            output_dir: PathBuf::from(env_str("CHART_OUTPUT_DIR", ".")),
        })
    }

    /// `<output_dir>/<symbol>_kline.png`
    pub fn output_path(&self, symbol: &str) -> PathBuf {
        self.output_dir.join(format!("{}_kline.png", symbol))
    }
}
