use crate::riot::client::RiotClient;
use crate::riot::types::{AccountDto, RiotApiResponse};

impl RiotClient {
    /// Get account by Riot ID (game name + tag line).
    /// Uses regional routing.
    pub async fn get_account_by_riot_id(
        &self,
        game_name: &str,
        tag_line: &str,
    ) -> RiotApiResponse<AccountDto> {
        let url = format!(
            "{}/riot/account/v1/accounts/by-riot-id/{}/{}",
            self.regional_base(),
            urlencoding::encode(game_name),
            urlencoding::encode(tag_line)
        );

        self.get(&url).await
    }
}
