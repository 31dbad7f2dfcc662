use dotenv::dotenv;
use std::env;

use crate::error::{Error, Result};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub mongodb_uri: String,
    pub database_name: String,
    pub jwt_secret: String,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        dotenv().ok(); // Load .env file if present
        Ok(Self {
            mongodb_uri: require("MONGODB_URI")?,
            database_name: env::var("DATABASE_NAME").unwrap_or_else(|_| "okinawanow".to_string()),
            jwt_secret: require("JWT_SECRET")?,
        })
    }
}

fn require(name: &'static str) -> Result<String> {
    env::var(name).map_err(|source| Error::Config { name, source })
}
