use std::env;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use zhonyas::config::Config;
use zhonyas::db::{self, Repository};
use zhonyas::error::AppError;
use zhonyas::ingest::{IngestService, JobRegistry, JobRequest, ProgressEvent};
use zhonyas::logging;
use zhonyas::riot::{RateLimits, RiotClient};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    logging::init();

    let Some((game_name, tag_line, count)) = parse_args() else {
        eprintln!("usage: zhonyas <gameName#tagLine> [count]");
        std::process::exit(2);
    };

    let config = Config::from_env()?;

    info!("🐍 Starting ZhonyaS ingestion service...");

    let pool = db::connect(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    let repository = Repository::new(pool);

    let riot = Arc::new(RiotClient::new(
        config.riot_api_key.clone(),
        RateLimits {
            per_second: config.rate_limit_per_second,
            per_two_minutes: config.rate_limit_per_two_minutes,
        },
    ));
    riot.start_metrics_logging();

    let registry = Arc::new(JobRegistry::new(
        Duration::from_secs(config.session_ttl_secs),
        Duration::from_secs(config.subscribe_timeout_secs),
    ));
    let service = IngestService::new(riot, repository, registry);

    let session_id = service.start_job(JobRequest {
        game_name: game_name.clone(),
        tag_line,
        count,
        window: None,
    });
    info!(%session_id, "ingestion job dispatched for {game_name}");

    let mut events = service.subscribe(&session_id).await;
    let mut failed = false;
    while let Some(event) = events.recv().await {
        match event {
            ProgressEvent::Progress { progress } => info!("⏳ progress: {progress}%"),
            ProgressEvent::Completed { .. } => info!("✅ ingestion complete"),
            ProgressEvent::Error { error } => {
                error!("❌ ingestion failed: {error}");
                failed = true;
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
    Ok(())
}

fn parse_args() -> Option<(String, String, usize)> {
    let mut args = env::args().skip(1);
    let riot_id = args.next()?;
    let (game_name, tag_line) = riot_id.split_once('#')?;
    if game_name.is_empty() || tag_line.is_empty() {
        return None;
    }

    let count = match args.next() {
        Some(raw) => raw.parse().ok().filter(|c| *c > 0)?,
        None => 20,
    };

    Some((game_name.to_string(), tag_line.to_string(), count))
}
