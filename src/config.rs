use std::net::SocketAddr;

use anyhow::{Context, Result};

const DEFAULT_DATABASE_URL: &str = "sqlite://todos.db";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
}

impl Config {
    /// Reads `DATABASE_URL` and `BIND_ADDR`, after loading `.env` if one exists.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_vars(std::env::var("DATABASE_URL").ok(), std::env::var("BIND_ADDR").ok())
    }

    fn from_vars(database_url: Option<String>, bind_addr: Option<String>) -> Result<Self> {
        let database_url = database_url.unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let bind_addr = bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        let bind_addr = bind_addr
            .parse::<SocketAddr>()
            .with_context(|| format!("invalid BIND_ADDR {bind_addr:?}"))?;
        Ok(Self { database_url, bind_addr })
    }
}
