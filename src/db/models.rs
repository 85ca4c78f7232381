use chrono::NaiveDate;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct Player {
    pub id: i64,
    pub puuid: String,
    pub game_name: String,
    pub tag_line: String,
    pub profile_icon_id: Option<i32>,
    pub last_rank_solo_tier: Option<String>,
    pub last_rank_solo_rank: Option<String>,
    pub last_rank_solo_lp: Option<i32>,
    pub last_rank_flex_tier: Option<String>,
    pub last_rank_flex_rank: Option<String>,
    pub last_rank_flex_lp: Option<i32>,
}

impl Player {
    pub fn riot_id(&self) -> String {
        format!("{}#{}", self.game_name, self.tag_line)
    }

    pub fn solo_rank_info(&self) -> Option<RankInfo> {
        match (
            &self.last_rank_solo_tier,
            &self.last_rank_solo_rank,
            self.last_rank_solo_lp,
        ) {
            (Some(tier), Some(rank), Some(lp)) => Some(RankInfo {
                tier: tier.clone(),
                rank: rank.clone(),
                lp,
            }),
            _ => None,
        }
    }

    pub fn flex_rank_info(&self) -> Option<RankInfo> {
        match (
            &self.last_rank_flex_tier,
            &self.last_rank_flex_rank,
            self.last_rank_flex_lp,
        ) {
            (Some(tier), Some(rank), Some(lp)) => Some(RankInfo {
                tier: tier.clone(),
                rank: rank.clone(),
                lp,
            }),
            _ => None,
        }
    }
}

/// Cached ranked summary for one queue.
#[derive(Debug, Clone)]
pub struct RankInfo {
    pub tier: String,
    pub rank: String,
    pub lp: i32,
}

/// One persisted match record. At most one row exists per
/// `(player_id, match_id)` pair; that uniqueness is the idempotence boundary
/// of the whole pipeline.
#[derive(Debug, Clone, FromRow)]
pub struct Game {
    pub id: i64,
    pub player_id: i64,
    pub champion_id: i64,
    /// Champion name joined in from the reference table.
    pub champion: String,
    pub match_id: String,
    pub category: String,
    pub date: NaiveDate,
    pub win: bool,
    pub role: String,
    pub kills: i32,
    pub deaths: i32,
    pub assists: i32,
    pub team_kills: i32,
}
