//! Ingestion job coordinator.
//!
//! One job covers one player: resolve the identity, list match ids per
//! category, drive every match through fetch → normalize → persist, and
//! publish progress along the way. Jobs run as detached tasks; the caller
//! gets a session id synchronously and observes the rest through the
//! registry.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::db::{RankInfo, Repository};
use crate::error::AppError;
use crate::riot::RiotClient;
use crate::riot::types::{LeagueEntryDto, MatchCategory, RiotApiError, TimeWindow};

pub mod normalize;
mod session;

pub use session::{JobRegistry, JobState, JobStatus, ProgressEvent};

use normalize::{NormalizedMatch, Rejection, normalize};

/// What a caller asks to be ingested.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub game_name: String,
    pub tag_line: String,
    /// Per-category cap on discovered match ids.
    pub count: usize,
    pub window: Option<TimeWindow>,
}

/// Failures that end a job. Everything else is absorbed per match.
#[derive(Debug, Error)]
enum JobError {
    #[error("player {game_name}#{tag_line} could not be resolved: {source}")]
    Resolution {
        game_name: String,
        tag_line: String,
        source: RiotApiError,
    },

    #[error("match history is unavailable: {0}")]
    HistoryUnavailable(RiotApiError),

    #[error("database error: {0}")]
    Database(#[from] AppError),
}

/// Why one match produced no persisted row. Never fatal.
#[derive(Debug, Error)]
enum MatchSkip {
    #[error("fetch failed: {0}")]
    Fetch(#[from] RiotApiError),

    #[error("{0}")]
    Rejected(#[from] Rejection),

    #[error("persistence failed: {0}")]
    Persistence(#[from] AppError),
}

pub struct IngestService {
    riot: Arc<RiotClient>,
    db: Repository,
    registry: Arc<JobRegistry>,
}

impl IngestService {
    pub fn new(riot: Arc<RiotClient>, db: Repository, registry: Arc<JobRegistry>) -> Self {
        Self { riot, db, registry }
    }

    /// Start one ingestion job and return its session id immediately. The
    /// work itself runs as an independent background task.
    pub fn start_job(&self, request: JobRequest) -> String {
        let session_id = self.registry.create();

        let riot = self.riot.clone();
        let db = self.db.clone();
        let registry = self.registry.clone();
        let task_session_id = session_id.clone();
        tokio::spawn(async move {
            run_job(riot, db, registry, task_session_id, request).await;
        });

        session_id
    }

    pub fn job_state(&self, session_id: &str) -> Option<JobState> {
        self.registry.state(session_id)
    }

    pub fn cancel_job(&self, session_id: &str) -> bool {
        self.registry.cancel(session_id)
    }

    pub async fn subscribe(&self, session_id: &str) -> mpsc::Receiver<ProgressEvent> {
        self.registry.clone().subscribe(session_id).await
    }
}

async fn run_job(
    riot: Arc<RiotClient>,
    db: Repository,
    registry: Arc<JobRegistry>,
    session_id: String,
    request: JobRequest,
) {
    registry.set_running(&session_id);

    if let Err(e) = execute(&riot, &db, &registry, &session_id, &request).await {
        error!(%session_id, "ingestion job failed: {e}");
        registry.publish(
            &session_id,
            ProgressEvent::Error {
                error: e.to_string(),
            },
        );
    }
}

async fn execute(
    riot: &RiotClient,
    db: &Repository,
    registry: &JobRegistry,
    session_id: &str,
    request: &JobRequest,
) -> Result<(), JobError> {
    // Resolve the identity against the external source. This is the only
    // per-player step whose failure is fatal.
    let account = riot
        .get_account_by_riot_id(&request.game_name, &request.tag_line)
        .await
        .map_err(|source| JobError::Resolution {
            game_name: request.game_name.clone(),
            tag_line: request.tag_line.clone(),
            source,
        })?;

    // Re-resolving by the stable puuid keeps one row per identity across
    // renames.
    let game_name = account
        .game_name
        .clone()
        .unwrap_or_else(|| request.game_name.clone());
    let tag_line = account
        .tag_line
        .clone()
        .unwrap_or_else(|| request.tag_line.clone());
    let player = db
        .get_or_create_player(&account.puuid, &game_name, &tag_line)
        .await?;
    info!(%session_id, riot_id = %player.riot_id(), "🗃️ ingestion job started");

    // Ranked summaries and profile icon are refreshed best-effort.
    match riot.get_league_entries_by_puuid(&account.puuid).await {
        Ok(entries) => {
            let (solo, flex) = split_rank_entries(&entries);
            db.update_player_rank(player.id, solo.as_ref(), flex.as_ref())
                .await?;
        }
        Err(e) => warn!(%session_id, "could not refresh ranked summaries: {e}"),
    }
    if let Ok(summoner) = riot.get_summoner_by_puuid(&account.puuid).await {
        db.update_player_profile_icon(player.id, summoner.profile_icon_id)
            .await?;
    }

    // Discover match ids, independently per category. A failed category
    // degrades to an empty list; only all four failing is fatal.
    let mut batches: Vec<(MatchCategory, Vec<String>)> = Vec::new();
    let mut failures = 0;
    let mut last_error = None;
    for category in MatchCategory::ALL {
        match riot
            .get_match_ids(&account.puuid, category, request.window, request.count)
            .await
        {
            Ok(ids) => {
                debug!(%session_id, %category, found = ids.len(), "listed match ids");
                batches.push((category, ids));
            }
            Err(e) => {
                warn!(%session_id, %category, "listing match ids failed: {e}");
                batches.push((category, Vec::new()));
                failures += 1;
                last_error = Some(e);
            }
        }
    }
    if failures == MatchCategory::ALL.len() {
        if let Some(source) = last_error {
            return Err(JobError::HistoryUnavailable(source));
        }
    }

    let total: usize = batches.iter().map(|(_, ids)| ids.len()).sum();
    if total == 0 {
        info!(%session_id, "no new matches found");
        registry.publish(session_id, ProgressEvent::Completed { progress: 100 });
        return Ok(());
    }
    let mut processed = 0usize;

    for (category, ids) in batches {
        for match_id in ids {
            // Cancellation is only honored between matches, never mid-fetch.
            if registry.is_cancelled(session_id) {
                info!(%session_id, "job cancelled");
                registry.publish(
                    session_id,
                    ProgressEvent::Error {
                        error: "job cancelled".to_string(),
                    },
                );
                return Ok(());
            }

            match ingest_one(riot, db, player.id, &account.puuid, category, &match_id).await {
                Ok(true) => debug!(%session_id, %match_id, "match stored"),
                Ok(false) => debug!(%session_id, %match_id, "match already stored"),
                Err(MatchSkip::Rejected(reason)) => {
                    debug!(%session_id, %match_id, "match filtered out: {reason}")
                }
                // A single bad match must never abort the job.
                Err(e) => warn!(%session_id, %match_id, "match skipped: {e}"),
            }

            processed += 1;
            registry.publish(
                session_id,
                ProgressEvent::Progress {
                    progress: percent(processed, total),
                },
            );
        }
    }

    info!(%session_id, processed, "✅ ingestion job finished");
    registry.publish(session_id, ProgressEvent::Completed { progress: 100 });
    Ok(())
}

async fn ingest_one(
    riot: &RiotClient,
    db: &Repository,
    player_id: i64,
    puuid: &str,
    category: MatchCategory,
    match_id: &str,
) -> Result<bool, MatchSkip> {
    let match_data = riot.get_match(match_id).await?;
    let normalized: NormalizedMatch = normalize(&match_data, puuid)?;
    let champion_id = db.get_or_create_champion(&normalized.champion).await?;
    let inserted = db
        .insert_game_if_absent(player_id, champion_id, category, &normalized)
        .await?;
    Ok(inserted)
}

fn split_rank_entries(entries: &[LeagueEntryDto]) -> (Option<RankInfo>, Option<RankInfo>) {
    let mut solo = None;
    let mut flex = None;

    for entry in entries {
        let rank_info = RankInfo {
            tier: entry.tier.clone(),
            rank: entry.rank.clone(),
            lp: entry.league_points,
        };

        if entry.is_solo_queue() {
            solo = Some(rank_info);
        } else if entry.is_flex_queue() {
            flex = Some(rank_info);
        }
    }

    (solo, flex)
}

fn percent(processed: usize, total: usize) -> u8 {
    ((processed as f64 / total as f64) * 100.0).round() as u8
}
