//! Configuration for board-sync.
//!
//! Settings are read from a TOML file (default `config/board-sync.toml`):
//!
//! ```toml
//! [board]
//! id = "58d796b8474f66719c5156fa"
//! api_key = "..."
//! token = "..."
//!
//! [repository]
//! owner = "reliefweb"
//! name = "podcast-site"
//! branch = "gh-pages"
//! token = "..."
//!
//! [content]
//! item_path = "episodes"
//! ```
//!
//! Layering is file → environment → CLI. Secrets are usually left out of the
//! file and supplied through `BOARD_SYNC_TRELLO_KEY`, `BOARD_SYNC_TRELLO_TOKEN`
//! and `BOARD_SYNC_GITHUB_TOKEN` (a `.env` file works too).
//!
//! A path ending in `.json` is read in the older flat JSON layout
//! (`TrelloApiKey`, `GithubRepo`, `ItemPath`, ...).

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::board::FetchOptions;
use crate::board::trello::TRELLO_API_URL;
use crate::content::{ContentSettings, DEFAULT_EXTENSION, DEFAULT_LAYOUT, DEFAULT_PRIVATE_PREFIX};
use crate::publish::github::GITHUB_API_URL;

pub const DEFAULT_CONFIG_PATH: &str = "config/board-sync.toml";

pub const ENV_TRELLO_KEY: &str = "BOARD_SYNC_TRELLO_KEY";
pub const ENV_TRELLO_TOKEN: &str = "BOARD_SYNC_TRELLO_TOKEN";
pub const ENV_GITHUB_TOKEN: &str = "BOARD_SYNC_GITHUB_TOKEN";
pub const ENV_BRANCH: &str = "BOARD_SYNC_BRANCH";

/// Kanban board settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardSection {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    /// Trello API base URL (default: https://api.trello.com)
    #[serde(default)]
    pub api_url: Option<String>,
    /// Card fields to request; defaults to what the site uses
    #[serde(default)]
    pub card_fields: Option<Vec<String>>,
}

/// Target repository settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositorySection {
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    /// GitHub API base URL (default: https://api.github.com)
    #[serde(default)]
    pub api_url: Option<String>,
}

/// Output layout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentSection {
    #[serde(default)]
    pub item_path: Option<String>,
    #[serde(default = "default_private_prefix")]
    pub private_prefix: String,
    #[serde(default = "default_extension")]
    pub extension: String,
    #[serde(default = "default_layout")]
    pub layout: String,
}

fn default_private_prefix() -> String {
    DEFAULT_PRIVATE_PREFIX.to_string()
}

fn default_extension() -> String {
    DEFAULT_EXTENSION.to_string()
}

fn default_layout() -> String {
    DEFAULT_LAYOUT.to_string()
}

impl Default for ContentSection {
    fn default() -> Self {
        Self {
            item_path: None,
            private_prefix: default_private_prefix(),
            extension: default_extension(),
            layout: default_layout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSection {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// The complete configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncToml {
    #[serde(default)]
    pub board: BoardSection,
    #[serde(default)]
    pub repository: RepositorySection,
    #[serde(default)]
    pub content: ContentSection,
    #[serde(default)]
    pub http: HttpSection,
}

/// Flat JSON layout used by older deployments.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LegacyJsonConfig {
    #[serde(default)]
    trello_api_key: Option<String>,
    #[serde(default)]
    trello_user_token: Option<String>,
    #[serde(default)]
    trello_board_id: Option<String>,
    #[serde(default)]
    github_token: Option<String>,
    #[serde(default)]
    github_user: Option<String>,
    #[serde(default)]
    github_repo: Option<String>,
    #[serde(default)]
    github_branch: Option<String>,
    #[serde(default)]
    item_path: Option<String>,
}

impl From<LegacyJsonConfig> for SyncToml {
    fn from(legacy: LegacyJsonConfig) -> Self {
        Self {
            board: BoardSection {
                id: legacy.trello_board_id,
                api_key: legacy.trello_api_key,
                token: legacy.trello_user_token,
                ..Default::default()
            },
            repository: RepositorySection {
                owner: legacy.github_user,
                name: legacy.github_repo,
                branch: legacy.github_branch,
                token: legacy.github_token,
                api_url: None,
            },
            content: ContentSection {
                item_path: legacy.item_path,
                ..Default::default()
            },
            http: HttpSection::default(),
        }
    }
}

const TEMPLATE: &str = r#"# board-sync configuration

[board]
# Trello board id (the short id from the board URL works too)
id = ""
# Leave credentials empty and set BOARD_SYNC_TRELLO_KEY / BOARD_SYNC_TRELLO_TOKEN instead
api_key = ""
token = ""
# card_fields = ["name", "desc", "pos", "idList", "labels", "due"]

[repository]
owner = ""
name = ""
branch = "gh-pages"
# Or set BOARD_SYNC_GITHUB_TOKEN
token = ""
# api_url = "https://api.github.com"

[content]
# Cards are written to _<item_path>/<slug>/index.<extension>
item_path = "items"
private_prefix = "PRIVATE"
extension = "html"
layout = "card"

[http]
timeout_secs = 30
"#;

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl SyncToml {
    /// Load configuration from a file, TOML or legacy JSON by extension.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read configuration file: {}", path.display()))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::parse_legacy_json(&content)
                .with_context(|| format!("Invalid configuration file: {}", path.display()))
        } else {
            Self::parse(&content)
                .with_context(|| format!("Invalid configuration file: {}", path.display()))
        }
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Parse the flat JSON layout.
    pub fn parse_legacy_json(content: &str) -> Result<Self> {
        let legacy: LegacyJsonConfig =
            serde_json::from_str(content).context("Failed to parse JSON configuration")?;
        Ok(legacy.into())
    }

    /// Commented starter file for `config init`.
    pub fn template() -> &'static str {
        TEMPLATE
    }

    /// Apply environment overrides. Environment wins over the file.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| non_empty(lookup(key));
        if let Some(key) = get(ENV_TRELLO_KEY) {
            self.board.api_key = Some(key);
        }
        if let Some(token) = get(ENV_TRELLO_TOKEN) {
            self.board.token = Some(token);
        }
        if let Some(token) = get(ENV_GITHUB_TOKEN) {
            self.repository.token = Some(token);
        }
        if let Some(branch) = get(ENV_BRANCH) {
            self.repository.branch = Some(branch);
        }
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if let Some(item_path) = &self.content.item_path {
            if item_path.starts_with('_') {
                warnings.push(format!(
                    "content.item_path '{}' starts with '_'; the collection will be '_{}'",
                    item_path, item_path
                ));
            }
            if item_path.contains('/') {
                warnings.push(format!(
                    "content.item_path '{}' contains '/'; cards will be nested below the collection",
                    item_path
                ));
            }
        }
        if self.content.private_prefix.is_empty() {
            warnings.push(
                "content.private_prefix is empty; every list will be treated as private"
                    .to_string(),
            );
        }
        if self.content.extension.is_empty() {
            warnings.push("content.extension is empty".to_string());
        }
        if self.http.timeout_secs == 0 {
            warnings.push("http.timeout_secs is 0; requests will time out immediately".to_string());
        }
        if let Some(fields) = &self.board.card_fields
            && !fields.iter().any(|f| f == "idList")
        {
            warnings.push(
                "board.card_fields does not include 'idList'; no card will match a list"
                    .to_string(),
            );
        }

        warnings
    }

    /// Names of required settings that are missing or empty.
    pub fn missing(&self) -> Vec<&'static str> {
        let checks: [(&'static str, &Option<String>); 8] = [
            ("board.id", &self.board.id),
            ("board.api_key", &self.board.api_key),
            ("board.token", &self.board.token),
            ("repository.owner", &self.repository.owner),
            ("repository.name", &self.repository.name),
            ("repository.branch", &self.repository.branch),
            ("repository.token", &self.repository.token),
            ("content.item_path", &self.content.item_path),
        ];
        checks
            .into_iter()
            .filter(|(_, value)| non_empty((*value).clone()).is_none())
            .map(|(name, _)| name)
            .collect()
    }
}

/// Resolved runtime configuration. Every required setting is present.
#[derive(Debug, Clone)]
pub struct Config {
    pub board_id: String,
    pub trello_api_key: String,
    pub trello_token: String,
    pub trello_api_url: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub github_token: String,
    pub github_api_url: String,
    pub content: ContentSettings,
    pub fetch: FetchOptions,
    pub timeout: Duration,
}

impl Config {
    /// Load the file at `path`, apply process environment and CLI overrides,
    /// then resolve.
    pub fn load(path: &Path, branch_override: Option<&str>) -> Result<Self> {
        let mut toml = SyncToml::load(path)?;
        toml.apply_env(|key| std::env::var(key).ok());
        if let Some(branch) = branch_override {
            toml.repository.branch = Some(branch.to_string());
        }
        Self::resolve(toml)
    }

    /// Resolve a parsed file into runtime settings, failing on anything missing.
    pub fn resolve(toml: SyncToml) -> Result<Self> {
        let missing = toml.missing();
        if !missing.is_empty() {
            bail!("Missing required setting(s): {}", missing.join(", "));
        }

        let mut fetch = FetchOptions::default();
        if let Some(fields) = toml.board.card_fields {
            fetch.card_fields = fields;
        }

        // `missing()` guarantees these are present
        let required = |value: Option<String>| value.unwrap_or_default();

        Ok(Self {
            board_id: required(toml.board.id),
            trello_api_key: required(toml.board.api_key),
            trello_token: required(toml.board.token),
            trello_api_url: non_empty(toml.board.api_url)
                .unwrap_or_else(|| TRELLO_API_URL.to_string()),
            owner: required(toml.repository.owner),
            repo: required(toml.repository.name),
            branch: required(toml.repository.branch),
            github_token: required(toml.repository.token),
            github_api_url: non_empty(toml.repository.api_url)
                .unwrap_or_else(|| GITHUB_API_URL.to_string()),
            content: ContentSettings {
                item_path: required(toml.content.item_path),
                private_prefix: toml.content.private_prefix,
                extension: toml.content.extension,
                layout: toml.content.layout,
            },
            fetch,
            timeout: Duration::from_secs(toml.http.timeout_secs),
        })
    }
}
