//! Board snapshot model and the kanban service client.
//!
//! Only the fields the content transformer consumes are typed. Anything else
//! the service returns is kept in `extra` so `_data/all.json` carries the
//! card objects as fetched.

pub mod trello;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::BTreeMap;

use crate::errors::RemoteError;

pub use trello::TrelloClient;

/// A read-only board snapshot, fetched once per run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Board {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub lists: Vec<List>,
    #[serde(default)]
    pub cards: Vec<Card>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct List {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub desc: String,
    /// Kept as the number the service sent so `all.json` reproduces it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<Number>,
    #[serde(default)]
    pub id_list: String,
    #[serde(default)]
    pub labels: Vec<Label>,
    /// Due date in the service's own RFC 3339 spelling; see [`Card::due_at`].
    #[serde(default)]
    pub due: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Card {
    /// Parsed due date. `None` when unset or not valid RFC 3339.
    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        let due = self.due.as_deref()?;
        DateTime::parse_from_rfc3339(due)
            .ok()
            .map(|at| at.with_timezone(&Utc))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Label {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Field selection for a board fetch. Keeps the payload bounded to what the
/// transformer and `all.json` need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    pub board_fields: Vec<String>,
    /// Visibility filter for lists (`open`, `closed`, `all`).
    pub lists: String,
    /// Visibility filter for cards.
    pub cards: String,
    pub card_fields: Vec<String>,
    pub card_attachments: bool,
    pub card_attachment_fields: Vec<String>,
}

pub const DEFAULT_CARD_FIELDS: &[&str] = &["name", "desc", "pos", "idList", "labels", "due"];

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            board_fields: vec!["name".into(), "pos".into(), "desc".into()],
            lists: "open".to_string(),
            cards: "open".to_string(),
            card_fields: DEFAULT_CARD_FIELDS.iter().map(|f| f.to_string()).collect(),
            card_attachments: true,
            card_attachment_fields: vec!["name".into(), "url".into()],
        }
    }
}

impl FetchOptions {
    /// Query parameters for the board endpoint, credentials excluded.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("fields", self.board_fields.join(",")),
            ("lists", self.lists.clone()),
            ("cards", self.cards.clone()),
            ("card_fields", self.card_fields.join(",")),
            ("card_attachments", self.card_attachments.to_string()),
            ("card_attachment_fields", self.card_attachment_fields.join(",")),
        ]
    }
}

/// Read access to a kanban board.
/// Real implementation: `TrelloClient`.
#[async_trait]
pub trait BoardSource: Send + Sync {
    async fn fetch_board(&self, board_id: &str, options: &FetchOptions)
    -> Result<Board, RemoteError>;
}
