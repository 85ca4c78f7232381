use std::fmt;

use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Classified outcome of a single Riot API call. The retry policy keys off
/// the variant: `RateLimited` and `Transient` are retried, everything else
/// propagates.
#[derive(Debug, Error)]
pub enum RiotApiError {
    #[error("request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited (retry after: {retry_after:?}, scope: {scope:?})")]
    RateLimited {
        /// Seconds taken from the `Retry-After` header, when the server sent one.
        retry_after: Option<u64>,
        /// Lowercased `X-Rate-Limit-Type` header, when present.
        scope: Option<String>,
    },

    #[error("transient upstream error: HTTP {status}")]
    Transient { status: u16 },

    #[error("resource not found")]
    NotFound,

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("gave up after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },
}

/// A call to the Riot API either yields the success type or a [`RiotApiError`].
pub type RiotApiResponse<T> = Result<T, RiotApiError>;

// ============================================================================
// Domain selectors
// ============================================================================

/// The fixed set of match categories the pipeline ingests. Each category is
/// listed independently; the four id lists are never merged before counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchCategory {
    RankedSolo,
    RankedFlex,
    Normal,
    Tournament,
}

impl MatchCategory {
    pub const ALL: [MatchCategory; 4] = [
        MatchCategory::RankedSolo,
        MatchCategory::RankedFlex,
        MatchCategory::Normal,
        MatchCategory::Tournament,
    ];

    /// Stable string stored in the `games.category` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchCategory::RankedSolo => "soloq",
            MatchCategory::RankedFlex => "flex",
            MatchCategory::Normal => "normal",
            MatchCategory::Tournament => "tourney",
        }
    }

    /// Query parameter selecting this category on the match-history endpoint.
    /// Ranked queues filter by queue id, the rest by match type.
    pub(crate) fn history_filter(&self) -> (&'static str, &'static str) {
        match self {
            MatchCategory::RankedSolo => ("queue", "420"),
            MatchCategory::RankedFlex => ("queue", "440"),
            MatchCategory::Normal => ("type", "normal"),
            MatchCategory::Tournament => ("type", "tourney"),
        }
    }
}

impl fmt::Display for MatchCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Optional epoch-second bounds forwarded to the match-history endpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeWindow {
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
}

// ============================================================================
// Account-v1
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDto {
    pub puuid: String,
    pub game_name: Option<String>,
    pub tag_line: Option<String>,
}

// ============================================================================
// Summoner-v4
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummonerDto {
    pub profile_icon_id: i32,
}

// ============================================================================
// League-v4
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueEntryDto {
    pub queue_type: String,
    pub tier: String,
    pub rank: String,
    pub league_points: i32,
}

impl LeagueEntryDto {
    pub fn is_solo_queue(&self) -> bool {
        self.queue_type == "RANKED_SOLO_5x5"
    }

    pub fn is_flex_queue(&self) -> bool {
        self.queue_type == "RANKED_FLEX_SR"
    }
}

// ============================================================================
// Match-v5
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDto {
    pub metadata: MetadataDto,
    pub info: InfoDto,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataDto {
    pub match_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoDto {
    pub game_mode: String,
    /// Epoch milliseconds the match was created at, server-supplied.
    pub game_creation: i64,
    pub game_duration: i64,
    pub queue_id: i32,
    pub participants: Vec<ParticipantDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDto {
    pub puuid: String,
    pub champion_name: String,
    pub team_position: String,
    pub team_id: i32,
    pub win: bool,
    pub kills: i32,
    pub deaths: i32,
    pub assists: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_strings_and_filters() {
        assert_eq!(MatchCategory::RankedSolo.as_str(), "soloq");
        assert_eq!(MatchCategory::RankedSolo.history_filter(), ("queue", "420"));
        assert_eq!(MatchCategory::RankedFlex.history_filter(), ("queue", "440"));
        assert_eq!(MatchCategory::Normal.history_filter(), ("type", "normal"));
        assert_eq!(
            MatchCategory::Tournament.history_filter(),
            ("type", "tourney")
        );
    }

    #[test]
    fn match_dto_deserializes_from_camel_case() {
        let raw = serde_json::json!({
            "metadata": { "matchId": "EUW1_123" },
            "info": {
                "gameMode": "CLASSIC",
                "gameCreation": 1700000000000i64,
                "gameDuration": 1800,
                "queueId": 420,
                "participants": [{
                    "puuid": "p1",
                    "championName": "Jax",
                    "teamPosition": "JUNGLE",
                    "teamId": 100,
                    "win": true,
                    "kills": 3,
                    "deaths": 1,
                    "assists": 7
                }]
            }
        });

        let parsed: MatchDto = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.metadata.match_id, "EUW1_123");
        assert_eq!(parsed.info.participants[0].champion_name, "Jax");
        assert_eq!(parsed.info.participants[0].team_id, 100);
    }
}
