use thiserror::Error;

use crate::riot::types::RiotApiError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Riot API error: {0}")]
    RiotApi(#[from] RiotApiError),

    #[error("Configuration error: {0}")]
    Config(String),
}
