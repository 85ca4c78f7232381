//! Validation and reshaping of raw match payloads into the persisted record
//! shape. Pure: no I/O, same input always yields the same output.

use chrono::{DateTime, NaiveDate};
use thiserror::Error;

use crate::riot::types::MatchDto;

/// Only the standard 5v5 mode is ingested.
pub const STANDARD_GAME_MODE: &str = "CLASSIC";
pub const REQUIRED_PARTICIPANTS: usize = 10;
/// Remakes and dodged games end well before the 5 minute mark.
pub const MIN_GAME_DURATION_SECS: i64 = 300;

/// Why a fetched match was not kept. Rejections count as processed matches,
/// they are not errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("unsupported game mode: {0}")]
    UnsupportedMode(String),

    #[error("expected {REQUIRED_PARTICIPANTS} participants, got {0}")]
    ParticipantCount(usize),

    #[error("game shorter than {MIN_GAME_DURATION_SECS}s ({0}s)")]
    TooShort(i64),

    #[error("player is not part of the match")]
    PlayerNotInMatch,
}

/// A match reduced to what the persistence gateway stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedMatch {
    pub match_id: String,
    pub date: NaiveDate,
    pub win: bool,
    pub role: String,
    pub kills: i32,
    pub deaths: i32,
    pub assists: i32,
    /// Sum of kills across the player's team, for kill-participation stats.
    pub team_kills: i32,
    pub champion: String,
}

pub fn normalize(match_data: &MatchDto, puuid: &str) -> Result<NormalizedMatch, Rejection> {
    let info = &match_data.info;

    if info.game_mode != STANDARD_GAME_MODE {
        return Err(Rejection::UnsupportedMode(info.game_mode.clone()));
    }
    if info.participants.len() != REQUIRED_PARTICIPANTS {
        return Err(Rejection::ParticipantCount(info.participants.len()));
    }
    if info.game_duration < MIN_GAME_DURATION_SECS {
        return Err(Rejection::TooShort(info.game_duration));
    }

    let player = info
        .participants
        .iter()
        .find(|p| p.puuid == puuid)
        .ok_or(Rejection::PlayerNotInMatch)?;

    let team_kills = info
        .participants
        .iter()
        .filter(|p| p.team_id == player.team_id)
        .map(|p| p.kills)
        .sum();

    let date = DateTime::from_timestamp_millis(info.game_creation)
        .unwrap_or(DateTime::UNIX_EPOCH)
        .date_naive();

    Ok(NormalizedMatch {
        match_id: match_data.metadata.match_id.clone(),
        date,
        win: player.win,
        role: player.team_position.clone(),
        kills: player.kills,
        deaths: player.deaths,
        assists: player.assists,
        team_kills,
        champion: player.champion_name.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::riot::types::{InfoDto, MatchDto, MetadataDto, ParticipantDto};

    const PUUID: &str = "player-puuid";

    fn participant(puuid: &str, team_id: i32, kills: i32) -> ParticipantDto {
        ParticipantDto {
            puuid: puuid.to_string(),
            champion_name: "Jax".to_string(),
            team_position: "JUNGLE".to_string(),
            team_id,
            win: team_id == 100,
            kills,
            deaths: 2,
            assists: 4,
        }
    }

    fn classic_match() -> MatchDto {
        let mut participants = vec![participant(PUUID, 100, 3)];
        for i in 1..5 {
            participants.push(participant(&format!("ally-{i}"), 100, i));
        }
        for i in 0..5 {
            participants.push(participant(&format!("enemy-{i}"), 200, 1));
        }

        MatchDto {
            metadata: MetadataDto {
                match_id: "EUW1_42".to_string(),
            },
            info: InfoDto {
                game_mode: "CLASSIC".to_string(),
                game_creation: 1_741_000_000_000, // 2025-03-03
                game_duration: 1800,
                queue_id: 420,
                participants,
            },
        }
    }

    #[test]
    fn accepts_a_standard_match_and_derives_fields() {
        let normalized = normalize(&classic_match(), PUUID).unwrap();

        assert_eq!(normalized.match_id, "EUW1_42");
        assert_eq!(normalized.date, "2025-03-03".parse().unwrap());
        assert!(normalized.win);
        assert_eq!(normalized.role, "JUNGLE");
        assert_eq!(normalized.kills, 3);
        // 3 + 1 + 2 + 3 + 4 from the player's team only.
        assert_eq!(normalized.team_kills, 13);
        assert_eq!(normalized.champion, "Jax");
    }

    #[test]
    fn rejects_non_classic_mode() {
        let mut m = classic_match();
        m.info.game_mode = "ARAM".to_string();

        assert_eq!(
            normalize(&m, PUUID),
            Err(Rejection::UnsupportedMode("ARAM".to_string()))
        );
    }

    #[test]
    fn rejects_wrong_participant_count() {
        let mut m = classic_match();
        m.info.participants.pop();

        assert_eq!(normalize(&m, PUUID), Err(Rejection::ParticipantCount(9)));
    }

    #[test]
    fn rejects_short_games() {
        let mut m = classic_match();
        m.info.game_duration = 299;

        assert_eq!(normalize(&m, PUUID), Err(Rejection::TooShort(299)));
    }

    #[test]
    fn rejects_when_player_is_missing() {
        let m = classic_match();

        assert_eq!(
            normalize(&m, "someone-else"),
            Err(Rejection::PlayerNotInMatch)
        );
    }

    #[test]
    fn mode_check_wins_over_participant_count() {
        let mut m = classic_match();
        m.info.game_mode = "URF".to_string();
        m.info.participants.pop();

        assert!(matches!(
            normalize(&m, PUUID),
            Err(Rejection::UnsupportedMode(_))
        ));
    }
}
