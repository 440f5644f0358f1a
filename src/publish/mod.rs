//! Commit publisher: lands a tree delta on a branch as one commit.
//!
//! The mutation runs as a strictly ordered chain:
//!
//! ```text
//! Start → TreeCreated → CommitCreated → RefUpdated
//! ```
//!
//! Any failure stops the chain. Trees and commits created before the failure
//! stay behind as unreferenced objects; the branch ref only moves in the last
//! step, and only as a fast-forward.

pub mod github;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::content::TreeDelta;
use crate::content::TreeEntry;
use crate::errors::{RemoteError, SyncError};

pub use github::GitHubClient;

pub const COMMIT_MESSAGE: &str = "updating cards";

/// Git object primitives of the repository host.
/// Real implementation: `GitHubClient`.
#[async_trait]
pub trait RepositoryHost: Send + Sync {
    /// Resolve a ref such as `heads/main` to its commit SHA.
    async fn get_ref(&self, reference: &str) -> Result<String, RemoteError>;

    /// Tree SHA of a commit.
    async fn get_commit_tree(&self, commit_sha: &str) -> Result<String, RemoteError>;

    async fn create_tree(&self, base_tree: &str, entries: &[TreeEntry])
    -> Result<String, RemoteError>;

    async fn create_commit(
        &self,
        message: &str,
        tree_sha: &str,
        parents: &[String],
    ) -> Result<String, RemoteError>;

    /// Point `reference` at `sha`. With `force == false` the host must refuse
    /// anything but a fast-forward.
    async fn update_ref(&self, reference: &str, sha: &str, force: bool) -> Result<(), RemoteError>;
}

/// The branch head as read at the start of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchTip {
    pub commit_sha: String,
    pub tree_sha: String,
}

/// Where the publish chain stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStage {
    Start,
    TreeCreated,
    CommitCreated,
    RefUpdated,
}

impl std::fmt::Display for PublishStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublishStage::Start => write!(f, "start"),
            PublishStage::TreeCreated => write!(f, "tree-created"),
            PublishStage::CommitCreated => write!(f, "commit-created"),
            PublishStage::RefUpdated => write!(f, "ref-updated"),
        }
    }
}

fn aborted(stage: PublishStage, err: SyncError) -> SyncError {
    warn!(%stage, error = %err, "publish aborted");
    err
}

/// Result of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    pub reference: String,
    pub parent_sha: String,
    pub tree_sha: String,
    pub commit_sha: String,
}

/// Publishes tree deltas to one branch of one repository.
pub struct Publisher<'a> {
    host: &'a dyn RepositoryHost,
    branch: String,
}

impl<'a> Publisher<'a> {
    pub fn new(host: &'a dyn RepositoryHost, branch: impl Into<String>) -> Self {
        Self {
            host,
            branch: branch.into(),
        }
    }

    /// `heads/<branch>`, as the git-data API names it.
    pub fn reference(&self) -> String {
        format!("heads/{}", self.branch)
    }

    /// Read the current branch head and its tree.
    pub async fn read_tip(&self) -> Result<BranchTip, SyncError> {
        let reference = self.reference();
        let commit_sha = self
            .host
            .get_ref(&reference)
            .await
            .map_err(SyncError::ReadTip)?;
        let tree_sha = self
            .host
            .get_commit_tree(&commit_sha)
            .await
            .map_err(SyncError::ReadCommit)?;
        info!(%reference, commit = %commit_sha, tree = %tree_sha, "read branch tip");
        Ok(BranchTip {
            commit_sha,
            tree_sha,
        })
    }

    /// Layer `delta` onto the tip's tree, commit it on top of the tip and
    /// fast-forward the branch.
    pub async fn publish(
        &self,
        tip: &BranchTip,
        delta: &TreeDelta,
    ) -> Result<PublishReceipt, SyncError> {
        let mut stage = PublishStage::Start;
        info!(%stage, entries = delta.len(), base_tree = %tip.tree_sha, "publishing");

        let tree_sha = self
            .host
            .create_tree(&tip.tree_sha, delta.entries())
            .await
            .map_err(|e| aborted(stage, SyncError::CreateTree(e)))?;
        stage = PublishStage::TreeCreated;
        info!(%stage, tree = %tree_sha);

        let parents = vec![tip.commit_sha.clone()];
        let commit_sha = self
            .host
            .create_commit(COMMIT_MESSAGE, &tree_sha, &parents)
            .await
            .map_err(|e| aborted(stage, SyncError::CreateCommit(e)))?;
        stage = PublishStage::CommitCreated;
        info!(%stage, commit = %commit_sha, parent = %tip.commit_sha);

        let reference = self.reference();
        self.host
            .update_ref(&reference, &commit_sha, false)
            .await
            .map_err(|e| aborted(stage, SyncError::UpdateRef(e)))?;
        stage = PublishStage::RefUpdated;
        info!(%stage, %reference, commit = %commit_sha);

        Ok(PublishReceipt {
            reference: format!("refs/{}", reference),
            parent_sha: tip.commit_sha.clone(),
            tree_sha,
            commit_sha,
        })
    }
}
