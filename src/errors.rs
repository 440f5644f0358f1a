//! Typed error hierarchy for board-sync.
//!
//! Two layers cover the pipeline:
//! - `RemoteError`: a single call to the kanban service or the repository host
//! - `SyncError`: which pipeline step failed, wrapping the remote cause
//!
//! `RenderError` covers the (pure) content transformer.
//!
//! Messages name only their own layer; print with `{:#}` (anyhow) to get the
//! whole chain, e.g. `error creating tree: GitHub returned 422: ...`.

use thiserror::Error;

/// Exit code for a ref update rejected because the branch moved (EX_TEMPFAIL).
pub const EXIT_CONCURRENT_UPDATE: u8 = 75;
/// Exit code for unreadable or incomplete configuration (EX_CONFIG).
pub const EXIT_CONFIG: u8 = 78;

/// Errors from one request to a remote service.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned {status}: {message}")]
    Status {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("failed to decode response from {url}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The host refused a non-forced ref update because the branch moved.
    #[error("update rejected: {message}")]
    Rejected { message: String },
}

impl RemoteError {
    /// True when the host rejected a non-fast-forward ref update.
    pub fn is_rejection(&self) -> bool {
        matches!(self, RemoteError::Rejected { .. })
    }
}

/// Errors from the content transformer.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("error marshaling {what}")]
    Json {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("error rendering front matter for card {card_id}")]
    FrontMatter {
        card_id: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Errors from a sync run, one variant per pipeline step.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("configuration error")]
    Config(#[source] anyhow::Error),

    #[error("error getting ref")]
    ReadTip(#[source] RemoteError),

    #[error("error getting commit")]
    ReadCommit(#[source] RemoteError),

    #[error("unable to retrieve board")]
    Fetch(#[source] RemoteError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("error creating tree")]
    CreateTree(#[source] RemoteError),

    #[error("error creating commit")]
    CreateCommit(#[source] RemoteError),

    #[error("error updating ref")]
    UpdateRef(#[source] RemoteError),
}

impl SyncError {
    /// True when the branch changed after the tip was read and the ref
    /// update was refused. A later run starts from the new tip.
    pub fn is_concurrent_update(&self) -> bool {
        matches!(self, SyncError::UpdateRef(e) if e.is_rejection())
    }

    /// Process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            SyncError::Config(_) => EXIT_CONFIG,
            e if e.is_concurrent_update() => EXIT_CONCURRENT_UPDATE,
            _ => 1,
        }
    }
}
