//! SQLite persistence gateway for players, champions and games.

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::error::AppError;

mod migrations;
mod models;
mod repository;

pub use migrations::run_migrations;
pub use models::{Game, Player, RankInfo};
pub use repository::{GameFilter, Repository};

/// Open (and create if missing) the database behind `database_url`.
///
/// The pool is capped at one connection: SQLite has a single writer anyway,
/// and `sqlite::memory:` databases in tests must not be split across
/// connections.
pub async fn connect(database_url: &str) -> Result<SqlitePool, AppError> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    Ok(pool)
}
