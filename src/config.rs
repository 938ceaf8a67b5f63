//! Environment configuration

use di::{inject, injectable};
use log::warn;
use sqlx::sqlite::SqliteConnectOptions;
use std::env;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_DATABASE_URL: &str = "sqlite://remi.db?mode=rwc";
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_ASSISTANT_URL: &str = "http://127.0.0.1:8000/ask";
const DEFAULT_ASSISTANT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_REVEAL_TICK_MS: u64 = 20;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

/// Runtime settings, read once per process.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub listen_addr: String,
    pub assistant_url: String,
    pub assistant_timeout: Duration,
    /// Delay between two reveal frames. Zero reveals the reply at once.
    pub reveal_tick: Duration,
    pub cors_origins: Vec<String>,
}

#[injectable]
impl Settings {
    #[inject]
    pub fn from_env() -> Settings {
        dotenvy::dotenv().ok();

        Settings {
            database_url: var_or("DATABASE_URL", DEFAULT_DATABASE_URL),
            listen_addr: var_or("LISTEN_ADDR", DEFAULT_LISTEN_ADDR),
            assistant_url: var_or("ASSISTANT_URL", DEFAULT_ASSISTANT_URL),
            assistant_timeout: Duration::from_secs(parsed_var_or(
                "ASSISTANT_TIMEOUT_SECS",
                DEFAULT_ASSISTANT_TIMEOUT_SECS,
            )),
            reveal_tick: Duration::from_millis(parsed_var_or(
                "REVEAL_TICK_MS",
                DEFAULT_REVEAL_TICK_MS,
            )),
            cors_origins: split_origins(&var_or("CORS_ORIGINS", DEFAULT_CORS_ORIGINS)),
        }
    }
}

impl Settings {
    /// Parses `database_url` into SQLite connect options.
    pub fn database_options(&self) -> Result<SqliteConnectOptions, sqlx::Error> {
        SqliteConnectOptions::from_str(&self.database_url)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_url: DEFAULT_DATABASE_URL.to_owned(),
            listen_addr: DEFAULT_LISTEN_ADDR.to_owned(),
            assistant_url: DEFAULT_ASSISTANT_URL.to_owned(),
            assistant_timeout: Duration::from_secs(DEFAULT_ASSISTANT_TIMEOUT_SECS),
            reveal_tick: Duration::from_millis(DEFAULT_REVEAL_TICK_MS),
            cors_origins: split_origins(DEFAULT_CORS_ORIGINS),
        }
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or(default.to_owned())
}

fn parsed_var_or<T: FromStr + Copy>(name: &str, default: T) -> T {
    match env::var(name) {
        Err(_) => default,
        Ok(raw) => T::from_str(raw.trim()).unwrap_or_else(|_| {
            warn!("ignoring unparseable {name}={raw:?}, using the default");
            default
        }),
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_owned)
        .collect()
}
