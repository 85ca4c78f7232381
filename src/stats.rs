//! Pure aggregation of persisted games into per-champion and global
//! statistics. No I/O; callers feed in whatever `get_games` returned.

use std::collections::HashMap;

use crate::db::Game;

/// Champions need this many games before they count toward the average score.
const MIN_GAMES_FOR_SCORE: u32 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct ChampionStats {
    pub name: String,
    pub games: u32,
    pub wins: u32,
    pub losses: u32,
    pub kills: i64,
    pub deaths: i64,
    pub assists: i64,
    pub team_kills: i64,
}

impl ChampionStats {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            games: 0,
            wins: 0,
            losses: 0,
            kills: 0,
            deaths: 0,
            assists: 0,
            team_kills: 0,
        }
    }

    fn add(&mut self, game: &Game) {
        self.games += 1;
        if game.win {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
        self.kills += i64::from(game.kills);
        self.deaths += i64::from(game.deaths);
        self.assists += i64::from(game.assists);
        self.team_kills += i64::from(game.team_kills);
    }

    pub fn winrate(&self) -> f64 {
        if self.games == 0 {
            return 0.0;
        }
        round2(100.0 * f64::from(self.wins) / f64::from(self.games))
    }

    pub fn kda(&self) -> f64 {
        round2((self.kills + self.assists) as f64 / self.deaths.max(1) as f64)
    }

    pub fn kill_participation(&self) -> f64 {
        round2((self.kills + self.assists) as f64 / self.team_kills.max(1) as f64 * 100.0)
    }

    /// Composite threat score. Weights scale with sample size; reliably
    /// winning champions (>= 15 games, >= 52% winrate) get their winrate
    /// added on top.
    pub fn dangerousness(&self) -> f64 {
        let sample = f64::from(self.games) / 20.0;
        let winrate_weight = 4.0 + sample;
        let kda_weight = 4.0 + sample;
        let games_weight = 3.0;
        let kp_weight = 2.5 + sample;

        let mut score = winrate_weight * self.winrate()
            + games_weight * f64::from(self.games)
            + kda_weight * self.kda()
            + kp_weight * self.kill_participation();

        if self.games >= 15 && self.winrate() >= 52.0 {
            score += self.winrate();
        }

        round2(score)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerStats {
    pub champions: Vec<ChampionStats>,
    pub games: u32,
    pub wins: u32,
    pub losses: u32,
    pub kills: i64,
    pub deaths: i64,
    pub assists: i64,
    pub team_kills: i64,
}

impl PlayerStats {
    pub fn kda(&self) -> f64 {
        round2((self.kills + self.assists) as f64 / self.deaths.max(1) as f64)
    }

    pub fn kill_participation(&self) -> f64 {
        round2((self.kills + self.assists) as f64 / self.team_kills.max(1) as f64 * 100.0)
    }

    pub fn winrate(&self) -> f64 {
        if self.games == 0 {
            return 0.0;
        }
        round2(100.0 * f64::from(self.wins) / f64::from(self.games))
    }

    /// Mean dangerousness over champions with enough games to be meaningful.
    pub fn average_score(&self) -> f64 {
        let scored: Vec<f64> = self
            .champions
            .iter()
            .filter(|c| c.games >= MIN_GAMES_FOR_SCORE)
            .map(|c| c.dangerousness())
            .collect();

        if scored.is_empty() {
            return 0.0;
        }
        round2(scored.iter().sum::<f64>() / scored.len() as f64)
    }
}

/// Fold game rows into player-wide and per-champion stats. Champions come
/// back sorted by dangerousness, most threatening first.
pub fn aggregate(games: &[Game]) -> PlayerStats {
    let mut by_champion: HashMap<&str, ChampionStats> = HashMap::new();
    for game in games {
        by_champion
            .entry(game.champion.as_str())
            .or_insert_with(|| ChampionStats::new(&game.champion))
            .add(game);
    }

    let mut stats = PlayerStats::default();
    for champion in by_champion.values() {
        stats.games += champion.games;
        stats.wins += champion.wins;
        stats.losses += champion.losses;
        stats.kills += champion.kills;
        stats.deaths += champion.deaths;
        stats.assists += champion.assists;
        stats.team_kills += champion.team_kills;
    }

    let mut champions: Vec<ChampionStats> = by_champion.into_values().collect();
    champions.sort_by(|a, b| {
        b.dangerousness()
            .partial_cmp(&a.dangerousness())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    stats.champions = champions;

    stats
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(champion: &str, win: bool, kills: i32, deaths: i32, assists: i32) -> Game {
        Game {
            id: 0,
            player_id: 1,
            champion_id: 1,
            champion: champion.to_string(),
            match_id: String::new(),
            category: "soloq".to_string(),
            date: "2025-03-03".parse().unwrap(),
            win,
            role: "JUNGLE".to_string(),
            kills,
            deaths,
            assists,
            team_kills: 20,
        }
    }

    #[test]
    fn aggregates_per_champion_and_globally() {
        let games = vec![
            game("Jax", true, 5, 2, 5),
            game("Jax", false, 1, 4, 3),
            game("Ahri", true, 10, 0, 10),
        ];

        let stats = aggregate(&games);

        assert_eq!(stats.games, 3);
        assert_eq!(stats.wins, 2);
        assert_eq!(stats.losses, 1);
        // (16 + 18) / 6
        assert_eq!(stats.kda(), 5.67);
        // (16 + 18) / 60 * 100
        assert_eq!(stats.kill_participation(), 56.67);
        assert_eq!(stats.winrate(), 66.67);

        let jax = stats.champions.iter().find(|c| c.name == "Jax").unwrap();
        assert_eq!(jax.games, 2);
        assert_eq!(jax.winrate(), 50.0);
        assert_eq!(jax.kda(), 2.33);

        let ahri = stats.champions.iter().find(|c| c.name == "Ahri").unwrap();
        // Zero deaths counts as one for the ratio.
        assert_eq!(ahri.kda(), 20.0);
    }

    #[test]
    fn average_score_ignores_small_samples() {
        let mut games = Vec::new();
        for _ in 0..12 {
            games.push(game("Jax", true, 4, 2, 6));
        }
        games.push(game("Ahri", true, 10, 0, 10));

        let stats = aggregate(&games);

        let jax = stats.champions.iter().find(|c| c.name == "Jax").unwrap();
        assert_eq!(stats.average_score(), jax.dangerousness());
    }

    #[test]
    fn winning_veterans_get_the_winrate_bonus() {
        let mut wins = Vec::new();
        for _ in 0..15 {
            wins.push(game("Jax", true, 4, 2, 6));
        }
        let with_bonus = aggregate(&wins);
        let champion = &with_bonus.champions[0];

        let sample = 15.0 / 20.0;
        let expected_base = (4.0 + sample) * champion.winrate()
            + 3.0 * 15.0
            + (4.0 + sample) * champion.kda()
            + (2.5 + sample) * champion.kill_participation();
        assert_eq!(
            champion.dangerousness(),
            ((expected_base + champion.winrate()) * 100.0).round() / 100.0
        );
    }

    #[test]
    fn empty_input_is_all_zeroes() {
        let stats = aggregate(&[]);
        assert_eq!(stats.games, 0);
        assert_eq!(stats.winrate(), 0.0);
        assert_eq!(stats.average_score(), 0.0);
        assert!(stats.champions.is_empty());
    }
}
