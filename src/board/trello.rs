use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

use super::{Board, BoardSource, FetchOptions};
use crate::errors::RemoteError;
use crate::util::decode_response;

pub const TRELLO_API_URL: &str = "https://api.trello.com";
const SERVICE: &str = "Trello";

/// Trello REST client holding an API key / user token pair.
pub struct TrelloClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    token: String,
}

impl TrelloClient {
    pub fn new(
        api_url: &str,
        api_key: &str,
        token: &str,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("board-sync/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|source| RemoteError::Transport {
                url: api_url.to_string(),
                source,
            })?;
        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            token: token.to_string(),
        })
    }

    fn board_url(&self, board_id: &str) -> String {
        format!(
            "{}/1/boards/{}",
            self.api_url,
            urlencoding::encode(board_id)
        )
    }
}

#[async_trait]
impl BoardSource for TrelloClient {
    async fn fetch_board(
        &self,
        board_id: &str,
        options: &FetchOptions,
    ) -> Result<Board, RemoteError> {
        let url = self.board_url(board_id);
        debug!(%url, "fetching board");

        let mut query = vec![("key", self.api_key.clone()), ("token", self.token.clone())];
        query.extend(options.query_pairs());

        let resp = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .query(&query)
            .send()
            .await
            .map_err(|source| RemoteError::Transport {
                url: url.clone(),
                source: source.without_url(),
            })?;

        let board: Board = decode_response(SERVICE, &url, resp).await?;
        info!(
            board = %board.id,
            lists = board.lists.len(),
            cards = board.cards.len(),
            "fetched board"
        );
        Ok(board)
    }
}
