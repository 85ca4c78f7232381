use crate::riot::client::RiotClient;
use crate::riot::types::{RiotApiResponse, SummonerDto};

impl RiotClient {
    /// Get summoner data (profile icon) for a player by PUUID.
    /// Uses platform routing.
    pub async fn get_summoner_by_puuid(&self, puuid: &str) -> RiotApiResponse<SummonerDto> {
        let url = format!(
            "{}/lol/summoner/v4/summoners/by-puuid/{}",
            self.platform_base(),
            puuid
        );

        self.get(&url).await
    }
}
