use tracing::trace;

use crate::riot::client::RiotClient;
use crate::riot::types::{MatchCategory, MatchDto, RiotApiResponse, TimeWindow};

/// Hard cap imposed by the match-history endpoint.
pub const MAX_IDS_PER_PAGE: usize = 100;

impl RiotClient {
    /// List up to `count` match ids for a player in one category, newest
    /// first. Uses regional routing.
    ///
    /// Pages are fetched with an offset equal to the number of ids already
    /// collected, so a failed page leaves earlier pages valid and the listing
    /// can be re-issued from scratch without inconsistency. The loop stops on
    /// an empty page or once `count` ids are gathered.
    pub async fn get_match_ids(
        &self,
        puuid: &str,
        category: MatchCategory,
        window: Option<TimeWindow>,
        count: usize,
    ) -> RiotApiResponse<Vec<String>> {
        let mut ids: Vec<String> = Vec::with_capacity(count);

        while ids.len() < count {
            let page_size = (count - ids.len()).min(MAX_IDS_PER_PAGE);
            let mut url = format!(
                "{}/lol/match/v5/matches/by-puuid/{}/ids?start={}&count={}",
                self.regional_base(),
                puuid,
                ids.len(),
                page_size
            );

            let (param, value) = category.history_filter();
            url.push_str(&format!("&{param}={value}"));

            if let Some(window) = &window {
                if let Some(start_time) = window.start_time {
                    url.push_str(&format!("&startTime={start_time}"));
                }
                if let Some(end_time) = window.end_time {
                    url.push_str(&format!("&endTime={end_time}"));
                }
            }

            let page: Vec<String> = self.get(&url).await?;
            trace!(%category, offset = ids.len(), page_len = page.len(), "fetched id page");
            if page.is_empty() {
                break;
            }
            ids.extend(page);
        }

        ids.truncate(count);
        Ok(ids)
    }

    /// Get match details by match ID. Uses regional routing.
    pub async fn get_match(&self, match_id: &str) -> RiotApiResponse<MatchDto> {
        let url = format!(
            "{}/lol/match/v5/matches/{}",
            self.regional_base(),
            match_id
        );

        self.get(&url).await
    }
}
