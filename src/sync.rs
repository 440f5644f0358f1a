//! One sync run: read tip → fetch board → render → publish.

use tracing::info;

use crate::board::BoardSource;
use crate::config::Config;
use crate::content::{self, TreeDelta};
use crate::errors::SyncError;
use crate::publish::{PublishReceipt, Publisher, RepositoryHost};

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Render the delta but do not touch the repository.
    pub dry_run: bool,
}

/// What a run saw and did.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub board_id: String,
    pub lists_total: usize,
    pub lists_public: usize,
    pub cards_total: usize,
    pub cards_public: usize,
    pub delta: TreeDelta,
    /// `None` for dry runs.
    pub receipt: Option<PublishReceipt>,
}

/// Run the pipeline once.
///
/// The branch tip is read before the board is fetched so the final non-forced
/// ref update rejects any push that lands while the run is in progress.
pub async fn run(
    config: &Config,
    source: &dyn BoardSource,
    host: &dyn RepositoryHost,
    options: RunOptions,
) -> Result<RunReport, SyncError> {
    let publisher = Publisher::new(host, config.branch.clone());

    let tip = if options.dry_run {
        None
    } else {
        Some(publisher.read_tip().await?)
    };

    let board = source
        .fetch_board(&config.board_id, &config.fetch)
        .await
        .map_err(SyncError::Fetch)?;

    let lists = content::public_lists(&board, &config.content.private_prefix);
    let cards_public = content::public_cards(&board, &lists).len();
    let delta = content::render(&board, &config.content)?;
    info!(
        lists = board.lists.len(),
        public_lists = lists.len(),
        cards = board.cards.len(),
        public_cards = cards_public,
        entries = delta.len(),
        "rendered board"
    );

    let receipt = match tip {
        Some(tip) => Some(publisher.publish(&tip, &delta).await?),
        None => {
            info!("dry run, repository untouched");
            None
        }
    };

    Ok(RunReport {
        board_id: config.board_id.clone(),
        lists_total: board.lists.len(),
        lists_public: lists.len(),
        cards_total: board.cards.len(),
        cards_public,
        delta,
        receipt,
    })
}
