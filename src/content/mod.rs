//! Content transformer: board snapshot → outgoing tree delta.
//!
//! Everything here is pure. The delta produced by [`render`] is handed to the
//! publisher as a value; nothing is written locally.
//!
//! Output layout:
//!
//! | Path                               | Content                                   |
//! |------------------------------------|-------------------------------------------|
//! | `_data/lists.json`                 | list id → name for every public list      |
//! | `_<item_path>/<slug>/index.<ext>`  | front-matter stub per included card       |
//! | `_data/all.json`                   | array of included cards, as fetched       |

pub mod slug;

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::board::{Board, Card};
use crate::errors::RenderError;
use crate::util::to_tab_indented_json;

pub use slug::slugify;

pub const LISTS_PATH: &str = "_data/lists.json";
pub const CARDS_PATH: &str = "_data/all.json";
/// Regular, non-executable file.
pub const BLOB_MODE: &str = "100644";
pub const BLOB_TYPE: &str = "blob";

pub const DEFAULT_PRIVATE_PREFIX: &str = "PRIVATE";
pub const DEFAULT_EXTENSION: &str = "html";
pub const DEFAULT_LAYOUT: &str = "card";

/// One file in the outgoing tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: String,
    pub content: String,
}

impl TreeEntry {
    pub fn mode(&self) -> &'static str {
        BLOB_MODE
    }
}

/// Ordered set of tree entries with unique paths, layered onto the branch
/// tree by the repository host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeDelta {
    entries: Vec<TreeEntry>,
}

impl TreeDelta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry. A path already present keeps its position but takes the
    /// new content; the old content is returned.
    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) -> Option<String> {
        let path = path.into();
        let content = content.into();
        if let Some(existing) = self.entries.iter_mut().find(|e| e.path == path) {
            return Some(std::mem::replace(&mut existing.content, content));
        }
        self.entries.push(TreeEntry { path, content });
        None
    }

    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    pub fn get(&self, path: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<TreeEntry> {
        self.entries
    }
}

/// How cards are laid out in the site repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSettings {
    /// Collection segment; cards land under `_<item_path>/`.
    pub item_path: String,
    /// Lists whose name starts with this are private.
    pub private_prefix: String,
    pub extension: String,
    pub layout: String,
}

impl ContentSettings {
    pub fn new(item_path: impl Into<String>) -> Self {
        Self {
            item_path: item_path.into(),
            private_prefix: DEFAULT_PRIVATE_PREFIX.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
            layout: DEFAULT_LAYOUT.to_string(),
        }
    }

    /// Path of the stub for a card slug. An empty slug collapses onto the
    /// collection root.
    pub fn card_path(&self, slug: &str) -> String {
        let collection = format!("_{}", self.item_path);
        let index = format!("index.{}", self.extension);
        [collection.as_str(), slug, index.as_str()]
            .into_iter()
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("/")
    }
}

#[derive(Serialize)]
struct FrontMatter<'a> {
    name: &'a str,
    layout: &'a str,
}

/// Map of list id → name for every list not marked private.
pub fn public_lists(board: &Board, private_prefix: &str) -> BTreeMap<String, String> {
    board
        .lists
        .iter()
        .filter(|list| !list.name.starts_with(private_prefix))
        .map(|list| (list.id.clone(), list.name.clone()))
        .collect()
}

/// Cards whose list is in `lists`, in board order.
pub fn public_cards<'a>(board: &'a Board, lists: &BTreeMap<String, String>) -> Vec<&'a Card> {
    board
        .cards
        .iter()
        .filter(|card| lists.contains_key(&card.id_list))
        .collect()
}

/// Render the front-matter stub for one card.
pub fn card_stub(card: &Card, layout: &str) -> Result<String, RenderError> {
    let yaml = serde_yaml::to_string(&FrontMatter {
        name: &card.name,
        layout,
    })
    .map_err(|source| RenderError::FrontMatter {
        card_id: card.id.clone(),
        source,
    })?;
    Ok(format!("---\n{}---", yaml))
}

/// Build the outgoing tree delta for a board.
pub fn render(board: &Board, settings: &ContentSettings) -> Result<TreeDelta, RenderError> {
    let mut delta = TreeDelta::new();

    let lists = public_lists(board, &settings.private_prefix);
    let lists_json = to_tab_indented_json(&lists).map_err(|source| RenderError::Json {
        what: "list map",
        source,
    })?;
    delta.insert(LISTS_PATH, lists_json);

    let cards = public_cards(board, &lists);
    for card in &cards {
        let path = settings.card_path(&slugify(&card.name));
        debug!(card = %card.id, %path, due = ?card.due_at(), "card stub");
        if delta.insert(path.clone(), card_stub(card, &settings.layout)?).is_some() {
            warn!(card = %card.id, %path, "slug collision, last card wins");
        }
    }

    let cards_json = to_tab_indented_json(&cards).map_err(|source| RenderError::Json {
        what: "cards",
        source,
    })?;
    delta.insert(CARDS_PATH, cards_json);

    Ok(delta)
}
