use crate::riot::client::RiotClient;
use crate::riot::types::{LeagueEntryDto, RiotApiResponse};

impl RiotClient {
    /// Get league entries (ranked info) for a player by PUUID.
    /// Uses platform routing.
    pub async fn get_league_entries_by_puuid(
        &self,
        puuid: &str,
    ) -> RiotApiResponse<Vec<LeagueEntryDto>> {
        let url = format!(
            "{}/lol/league/v4/entries/by-puuid/{}",
            self.platform_base(),
            puuid
        );

        self.get(&url).await
    }
}
