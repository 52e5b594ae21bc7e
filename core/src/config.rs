//! Settings for both programs, read from environment variables.
//!
//! A `.env` file in the working directory is loaded first. Every reader also has a
//! `from_lookup` variant taking the variable source as a function, which is what tests use.

use std::{
    env,
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use chrono::NaiveDate;
use dotenv::dotenv;
use url::Url;

use crate::database::postgres::batch_operations::DEFAULT_CHUNK_SIZE;

pub const DATABASE_URL: &str = "DATABASE_URL";
pub const DB_USER: &str = "TL_DB_USER";
pub const DB_PASS: &str = "TL_DB_PASS";
pub const DB_HOST: &str = "TL_DB_HOST";
pub const DB_PORT: &str = "TL_DB_PORT";
pub const DB_NAME: &str = "TL_DB_NAME";
pub const INIT_SQL: &str = "TL_INIT_SQL";
pub const CHUNK_SIZE: &str = "TL_CHUNK_SIZE";
pub const API_TOKEN: &str = "API_TOKEN";
pub const API_URL: &str = "TL_API_URL";
pub const DATE_FROM: &str = "TL_DATE_FROM";
pub const DATE_TO: &str = "TL_DATE_TO";
pub const BASE_CURRENCY: &str = "TL_BASE_CURRENCY";
pub const HTTP_TIMEOUT_SECS: &str = "TL_HTTP_TIMEOUT_SECS";
pub const DATA_DIR: &str = "TL_DATA_DIR";

const DEFAULT_INIT_SQL: &str = "./init.sql";
const DEFAULT_API_URL: &str = "https://freecurrencyapi.net";
const DEFAULT_DATE_FROM: &str = "2020-01-02";
const DEFAULT_DATE_TO: &str = "2020-12-30";
const DEFAULT_BASE_CURRENCY: &str = "EUR";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DATA_DIR: &str = ".";

pub const INSTRUMENTS_FILE: &str = "instruments.csv";
pub const PRICES_FILE: &str = "prices.csv";
pub const TRADES_FILE: &str = "trades.csv";

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Environment variable {0} is not set")]
    MissingVariable(&'static str),

    #[error("Environment variable {name} has an invalid value \"{value}\": {reason}")]
    InvalidValue { name: &'static str, value: String, reason: String },
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).filter(|value| !value.is_empty()).ok_or(ConfigError::MissingVariable(name))
}

fn parse_value<T>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
        name,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn optional<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name).filter(|value| !value.is_empty()) {
        Some(value) => parse_value(name, &value),
        None => Ok(default),
    }
}

fn env_lookup(name: &str) -> Option<String> {
    env::var(name).ok()
}

/// Where and how records are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub connection_string: String,
    pub init_sql: PathBuf,
    pub chunk_size: usize,
}

impl DatabaseSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(env_lookup)
    }

    /// `DATABASE_URL` wins when set, otherwise the url is composed from the `TL_DB_*` parts.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let connection_string = match lookup(DATABASE_URL).filter(|value| !value.is_empty()) {
            Some(url) => url,
            None => compose_connection_string(&lookup)?,
        };

        let chunk_size = optional(&lookup, CHUNK_SIZE, DEFAULT_CHUNK_SIZE)?;
        if chunk_size == 0 {
            return Err(ConfigError::InvalidValue {
                name: CHUNK_SIZE,
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(DatabaseSettings {
            connection_string,
            init_sql: optional(&lookup, INIT_SQL, PathBuf::from(DEFAULT_INIT_SQL))?,
            chunk_size,
        })
    }
}

fn compose_connection_string<F>(lookup: &F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let user = required(lookup, DB_USER)?;
    let password = required(lookup, DB_PASS)?;
    let host = required(lookup, DB_HOST)?;
    let port: u16 = parse_value(DB_PORT, &required(lookup, DB_PORT)?)?;
    let name = required(lookup, DB_NAME)?;

    let invalid_host = |reason: String| ConfigError::InvalidValue {
        name: DB_HOST,
        value: host.clone(),
        reason,
    };

    let mut url = Url::parse(&format!("postgres://{}:{}", host, port))
        .map_err(|e| invalid_host(e.to_string()))?;
    url.set_username(&user).map_err(|_| invalid_host("can not hold a user name".to_string()))?;
    url.set_password(Some(&password))
        .map_err(|_| invalid_host("can not hold a password".to_string()))?;
    url.path_segments_mut()
        .map_err(|_| invalid_host("can not hold a database name".to_string()))?
        .push(&name);

    Ok(url.to_string())
}

/// The exchange rate api and the range to import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeRateSettings {
    pub api_key: String,
    pub base_url: String,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub base_currency: String,
    pub timeout: Duration,
}

impl ExchangeRateSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default_from: NaiveDate = parse_value(DATE_FROM, DEFAULT_DATE_FROM)?;
        let default_to: NaiveDate = parse_value(DATE_TO, DEFAULT_DATE_TO)?;
        let date_from: NaiveDate = optional(&lookup, DATE_FROM, default_from)?;
        let date_to: NaiveDate = optional(&lookup, DATE_TO, default_to)?;

        if date_from > date_to {
            return Err(ConfigError::InvalidValue {
                name: DATE_TO,
                value: date_to.to_string(),
                reason: format!("must not be before {} ({})", DATE_FROM, date_from),
            });
        }

        Ok(ExchangeRateSettings {
            api_key: required(&lookup, API_TOKEN)?,
            base_url: optional(&lookup, API_URL, DEFAULT_API_URL.to_string())?,
            date_from,
            date_to,
            base_currency: optional(&lookup, BASE_CURRENCY, DEFAULT_BASE_CURRENCY.to_string())?,
            timeout: Duration::from_secs(optional(
                &lookup,
                HTTP_TIMEOUT_SECS,
                DEFAULT_HTTP_TIMEOUT_SECS,
            )?),
        })
    }
}

/// Location of the csv files to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSettings {
    pub data_dir: PathBuf,
}

impl LoadSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(LoadSettings { data_dir: optional(&lookup, DATA_DIR, PathBuf::from(DEFAULT_DATA_DIR))? })
    }

    pub fn file_path(&self, file_name: &str) -> PathBuf {
        self.data_dir.join(file_name)
    }
}
