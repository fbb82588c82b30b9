use std::path::PathBuf;

use crate::dotenv;
use crate::error::Error;

pub static DATABASE_URL: &str = "DATABASE_URL";
pub static JWT_SECRET: &str = "JWT_SECRET";
pub static PUBLIC_PATH: &str = "PUBLIC_PATH";
pub static PUBLIC_URL: &str = "PUBLIC_URL";
pub static BIND_ADDRESS: &str = "BIND_ADDRESS";
pub static PORT: &str = "PORT";
pub static DB_MAX_CONNECTIONS: &str = "DB_MAX_CONNECTIONS";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Root directory stored images are written under and served from.
    pub public_path: PathBuf,
    pub public_url: String,
    pub bind_address: String,
    pub port: u16,
    pub max_connections: u32,
}

fn var_or(key: &str, default: &str) -> String {
    dotenv::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> Result<T, Error> {
    match dotenv::var(key) {
        Ok(v) => v.parse().map_err(|_| Error::ServerError(format!("invalid value for {}: {}", key, v))),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        dotenv::dotenv().ok();
        Ok(Self {
            database_url: dotenv::var(DATABASE_URL)?,
            jwt_secret: dotenv::var(JWT_SECRET)?,
            public_path: PathBuf::from(var_or(PUBLIC_PATH, "public")),
            public_url: var_or(PUBLIC_URL, "http://localhost:8000"),
            bind_address: var_or(BIND_ADDRESS, "0.0.0.0"),
            port: parse_var(PORT, 8000)?,
            max_connections: parse_var(DB_MAX_CONNECTIONS, 5)?,
        })
    }
}
