use chrono::NaiveDate;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::models::{Game, Player, RankInfo};
use crate::error::AppError;
use crate::ingest::normalize::NormalizedMatch;
use crate::riot::types::MatchCategory;

/// Season numbers map onto calendar years as `year = season + 2010`.
const SEASON_YEAR_OFFSET: i32 = 2010;

const PLAYER_COLUMN_NAMES: [&str; 11] = [
    "id",
    "puuid",
    "game_name",
    "tag_line",
    "profile_icon_id",
    "last_rank_solo_tier",
    "last_rank_solo_rank",
    "last_rank_solo_lp",
    "last_rank_flex_tier",
    "last_rank_flex_rank",
    "last_rank_flex_lp",
];

fn player_columns() -> String {
    PLAYER_COLUMN_NAMES.join(", ")
}

/// Typed filter for game queries. Every present field narrows the result;
/// values are always bound, never interpolated into the SQL text.
#[derive(Debug, Clone, Default)]
pub struct GameFilter {
    pub categories: Option<Vec<MatchCategory>>,
    pub champions: Option<Vec<String>>,
    pub roles: Option<Vec<String>>,
    pub seasons: Option<Vec<i32>>,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
}

#[derive(Clone, Debug)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // === Player operations ===

    /// Idempotent upsert keyed by puuid. A player whose riot-id changed since
    /// the last ingestion keeps their row (and their games); only the
    /// display name and tag are rewritten.
    pub async fn get_or_create_player(
        &self,
        puuid: &str,
        game_name: &str,
        tag_line: &str,
    ) -> Result<Player, AppError> {
        let columns = player_columns();
        let query = format!(
            r#"
            INSERT INTO players (puuid, game_name, tag_line)
            VALUES (?, ?, ?)
            ON CONFLICT(puuid) DO UPDATE SET
                game_name = excluded.game_name,
                tag_line = excluded.tag_line
            RETURNING {columns}
            "#
        );

        let player = sqlx::query_as::<_, Player>(&query)
            .bind(puuid)
            .bind(game_name)
            .bind(tag_line)
            .fetch_one(&self.pool)
            .await?;
        Ok(player)
    }

    pub async fn get_player_by_puuid(&self, puuid: &str) -> Result<Option<Player>, AppError> {
        let columns = player_columns();
        let player = sqlx::query_as::<_, Player>(&format!(
            "SELECT {columns} FROM players WHERE puuid = ?"
        ))
        .bind(puuid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(player)
    }

    pub async fn get_player_by_riot_id(
        &self,
        game_name: &str,
        tag_line: &str,
    ) -> Result<Option<Player>, AppError> {
        let columns = player_columns();
        let player = sqlx::query_as::<_, Player>(&format!(
            "SELECT {columns} FROM players WHERE LOWER(game_name) = LOWER(?) AND LOWER(tag_line) = LOWER(?)"
        ))
        .bind(game_name)
        .bind(tag_line)
        .fetch_optional(&self.pool)
        .await?;
        Ok(player)
    }

    pub async fn update_player_rank(
        &self,
        player_id: i64,
        solo: Option<&RankInfo>,
        flex: Option<&RankInfo>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE players SET
                last_rank_solo_tier = ?,
                last_rank_solo_rank = ?,
                last_rank_solo_lp = ?,
                last_rank_flex_tier = ?,
                last_rank_flex_rank = ?,
                last_rank_flex_lp = ?
            WHERE id = ?
            "#,
        )
        .bind(solo.map(|r| &r.tier))
        .bind(solo.map(|r| &r.rank))
        .bind(solo.map(|r| r.lp))
        .bind(flex.map(|r| &r.tier))
        .bind(flex.map(|r| &r.rank))
        .bind(flex.map(|r| r.lp))
        .bind(player_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn update_player_profile_icon(
        &self,
        player_id: i64,
        profile_icon_id: i32,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE players SET profile_icon_id = ? WHERE id = ?")
            .bind(profile_icon_id)
            .bind(player_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // === Champion operations ===

    pub async fn get_or_create_champion(&self, name: &str) -> Result<i64, AppError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO champions (name)
            VALUES (?)
            ON CONFLICT(name) DO UPDATE SET name = excluded.name
            RETURNING id
            "#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    // === Game operations ===

    /// Insert one match record unless it already exists for this player.
    /// Returns whether a row actually landed; re-ingesting a stored match is
    /// a no-op, never an overwrite.
    pub async fn insert_game_if_absent(
        &self,
        player_id: i64,
        champion_id: i64,
        category: MatchCategory,
        game: &NormalizedMatch,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO games
                (player_id, champion_id, match_id, category, date, win, role,
                 kills, deaths, assists, team_kills)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(player_id)
        .bind(champion_id)
        .bind(&game.match_id)
        .bind(category.as_str())
        .bind(game.date)
        .bind(game.win)
        .bind(&game.role)
        .bind(game.kills)
        .bind(game.deaths)
        .bind(game.assists)
        .bind(game.team_kills)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Fetch a player's games, newest first, narrowed by `filter`.
    pub async fn get_games(
        &self,
        player_id: i64,
        filter: &GameFilter,
    ) -> Result<Vec<Game>, AppError> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT g.id, g.player_id, g.champion_id, c.name AS champion, g.match_id, \
             g.category, g.date, g.win, g.role, g.kills, g.deaths, g.assists, g.team_kills \
             FROM games g INNER JOIN champions c ON c.id = g.champion_id \
             WHERE g.player_id = ",
        );
        qb.push_bind(player_id);

        if let Some(categories) = &filter.categories {
            qb.push(" AND g.category IN (");
            let mut sep = qb.separated(", ");
            for category in categories {
                sep.push_bind(category.as_str());
            }
            sep.push_unseparated(")");
        }

        if let Some(champions) = &filter.champions {
            qb.push(" AND c.name IN (");
            let mut sep = qb.separated(", ");
            for champion in champions {
                sep.push_bind(champion.as_str());
            }
            sep.push_unseparated(")");
        }

        if let Some(roles) = &filter.roles {
            qb.push(" AND g.role IN (");
            let mut sep = qb.separated(", ");
            for role in roles {
                sep.push_bind(role.as_str());
            }
            sep.push_unseparated(")");
        }

        if let Some(seasons) = &filter.seasons {
            qb.push(" AND CAST(strftime('%Y', g.date) AS INTEGER) IN (");
            let mut sep = qb.separated(", ");
            for season in seasons {
                sep.push_bind(season + SEASON_YEAR_OFFSET);
            }
            sep.push_unseparated(")");
        }

        if let Some((from, to)) = &filter.date_range {
            qb.push(" AND g.date BETWEEN ");
            qb.push_bind(*from);
            qb.push(" AND ");
            qb.push_bind(*to);
        }

        qb.push(" ORDER BY g.date DESC, g.id DESC");

        let games = qb
            .build_query_as::<Game>()
            .fetch_all(&self.pool)
            .await?;
        Ok(games)
    }

    pub async fn count_games(&self, player_id: i64) -> Result<i64, AppError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM games WHERE player_id = ?")
                .bind(player_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn repository() -> Repository {
        let pool = db::connect("sqlite::memory:").await.unwrap();
        db::run_migrations(&pool).await.unwrap();
        Repository::new(pool)
    }

    fn game(match_id: &str, date: &str, role: &str) -> NormalizedMatch {
        NormalizedMatch {
            match_id: match_id.to_string(),
            date: date.parse().unwrap(),
            win: true,
            role: role.to_string(),
            kills: 5,
            deaths: 2,
            assists: 9,
            team_kills: 20,
            champion: "Jax".to_string(),
        }
    }

    #[tokio::test]
    async fn upsert_player_is_idempotent_and_tracks_renames() {
        let repo = repository().await;

        let first = repo
            .get_or_create_player("puuid-1", "OldName", "EUW")
            .await
            .unwrap();
        let second = repo
            .get_or_create_player("puuid-1", "NewName", "123")
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.game_name, "NewName");
        assert_eq!(second.tag_line, "123");

        let by_id = repo
            .get_player_by_riot_id("newname", "123")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_id.id, first.id);
    }

    #[tokio::test]
    async fn rank_update_round_trips() {
        let repo = repository().await;
        let player = repo
            .get_or_create_player("puuid-1", "Name", "TAG")
            .await
            .unwrap();

        let solo = RankInfo {
            tier: "GOLD".into(),
            rank: "II".into(),
            lp: 54,
        };
        repo.update_player_rank(player.id, Some(&solo), None)
            .await
            .unwrap();

        let player = repo.get_player_by_puuid("puuid-1").await.unwrap().unwrap();
        let cached = player.solo_rank_info().unwrap();
        assert_eq!(cached.tier, "GOLD");
        assert_eq!(cached.lp, 54);
        assert!(player.flex_rank_info().is_none());
    }

    #[tokio::test]
    async fn insert_game_if_absent_inserts_exactly_once() {
        let repo = repository().await;
        let player = repo
            .get_or_create_player("puuid-1", "Name", "TAG")
            .await
            .unwrap();
        let champion_id = repo.get_or_create_champion("Jax").await.unwrap();

        let record = game("EUW1_1", "2025-03-03", "JUNGLE");
        let first = repo
            .insert_game_if_absent(player.id, champion_id, MatchCategory::RankedSolo, &record)
            .await
            .unwrap();
        let second = repo
            .insert_game_if_absent(player.id, champion_id, MatchCategory::RankedSolo, &record)
            .await
            .unwrap();

        assert!(first);
        assert!(!second);
        assert_eq!(repo.count_games(player.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn get_or_create_champion_reuses_rows() {
        let repo = repository().await;
        let a = repo.get_or_create_champion("Jax").await.unwrap();
        let b = repo.get_or_create_champion("Jax").await.unwrap();
        let c = repo.get_or_create_champion("Ahri").await.unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn game_filters_compose() {
        let repo = repository().await;
        let player = repo
            .get_or_create_player("puuid-1", "Name", "TAG")
            .await
            .unwrap();
        let jax = repo.get_or_create_champion("Jax").await.unwrap();
        let ahri = repo.get_or_create_champion("Ahri").await.unwrap();

        repo.insert_game_if_absent(
            player.id,
            jax,
            MatchCategory::RankedSolo,
            &game("EUW1_1", "2025-03-03", "JUNGLE"),
        )
        .await
        .unwrap();
        repo.insert_game_if_absent(
            player.id,
            ahri,
            MatchCategory::RankedFlex,
            &game("EUW1_2", "2025-03-04", "MIDDLE"),
        )
        .await
        .unwrap();
        repo.insert_game_if_absent(
            player.id,
            jax,
            MatchCategory::RankedSolo,
            &game("EUW1_3", "2024-11-20", "JUNGLE"),
        )
        .await
        .unwrap();

        let all = repo.get_games(player.id, &GameFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);
        // newest first
        assert_eq!(all[0].match_id, "EUW1_2");
        assert_eq!(all[0].champion, "Ahri");

        let soloq_only = repo
            .get_games(
                player.id,
                &GameFilter {
                    categories: Some(vec![MatchCategory::RankedSolo]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(soloq_only.len(), 2);

        // Season 15 maps onto calendar year 2025.
        let season_15_jungle = repo
            .get_games(
                player.id,
                &GameFilter {
                    seasons: Some(vec![15]),
                    roles: Some(vec!["JUNGLE".into()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(season_15_jungle.len(), 1);
        assert_eq!(season_15_jungle[0].match_id, "EUW1_1");

        let march = repo
            .get_games(
                player.id,
                &GameFilter {
                    date_range: Some(("2025-03-01".parse().unwrap(), "2025-03-31".parse().unwrap())),
                    champions: Some(vec!["Jax".into()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(march.len(), 1);
        assert_eq!(march[0].match_id, "EUW1_1");
    }
}
