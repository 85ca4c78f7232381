use std::env;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub riot_api_key: String,
    pub database_url: String,
    pub rate_limit_per_second: usize,
    pub rate_limit_per_two_minutes: usize,
    pub session_ttl_secs: u64,
    pub subscribe_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        const DEFAULT_RATE_LIMIT_PER_SECOND: usize = 20;
        const DEFAULT_RATE_LIMIT_PER_TWO_MINUTES: usize = 100;
        const DEFAULT_SESSION_TTL_SECS: u64 = 300;
        const DEFAULT_SUBSCRIBE_TIMEOUT_SECS: u64 = 10;

        let riot_api_key = env::var("RIOT_API_KEY")
            .map_err(|_| AppError::Config("RIOT_API_KEY must be set".into()))?;

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:zhonyas.db".into());

        let rate_limit_per_second = env::var("RIOT_RATE_LIMIT_PER_SECOND")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_RATE_LIMIT_PER_SECOND);

        let rate_limit_per_two_minutes = env::var("RIOT_RATE_LIMIT_PER_TWO_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_RATE_LIMIT_PER_TWO_MINUTES);

        let session_ttl_secs = env::var("SESSION_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_SESSION_TTL_SECS);

        let subscribe_timeout_secs = env::var("SUBSCRIBE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_SUBSCRIBE_TIMEOUT_SECS);

        Ok(Self {
            riot_api_key,
            database_url,
            rate_limit_per_second,
            rate_limit_per_two_minutes,
            session_ttl_secs,
            subscribe_timeout_secs,
        })
    }
}
