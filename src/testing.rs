//! In-memory test doubles for the remote services.
//!
//! `RecordingHost` behaves like a git host with one branch map: it records
//! every call, hands out sequential object ids and enforces fast-forward-only
//! ref updates against the parents of the commits it created.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::board::{Board, BoardSource, FetchOptions};
use crate::content::TreeEntry;
use crate::errors::RemoteError;
use crate::publish::RepositoryHost;

/// Which host call should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fail {
    GetRef,
    GetCommit,
    CreateTree,
    CreateCommit,
    UpdateRef,
}

#[derive(Default)]
struct HostState {
    calls: Vec<String>,
    heads: HashMap<String, String>,
    /// commit → tree
    trees: HashMap<String, String>,
    /// commit → parents
    parents: HashMap<String, Vec<String>>,
    /// tree → entries submitted for it
    submitted: HashMap<String, Vec<TreeEntry>>,
    counters: HashMap<String, usize>,
}

pub struct RecordingHost {
    state: Mutex<HostState>,
    fail: Option<Fail>,
}

fn service_error() -> RemoteError {
    RemoteError::Status {
        service: "GitHub",
        status: 500,
        message: "injected failure".to_string(),
    }
}

impl RecordingHost {
    pub fn new(branch: &str, commit: &str, tree: &str) -> Self {
        let mut state = HostState::default();
        state.heads.insert(branch.to_string(), commit.to_string());
        state.trees.insert(commit.to_string(), tree.to_string());
        Self {
            state: Mutex::new(state),
            fail: None,
        }
    }

    pub fn failing(mut self, fail: Fail) -> Self {
        self.fail = Some(fail);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn head(&self, branch: &str) -> Option<String> {
        self.state.lock().unwrap().heads.get(branch).cloned()
    }

    /// Entries submitted when `tree` was created.
    pub fn submitted(&self, tree: &str) -> Vec<TreeEntry> {
        self.state
            .lock()
            .unwrap()
            .submitted
            .get(tree)
            .cloned()
            .unwrap_or_default()
    }

    /// Simulate an external push moving `branch`.
    pub fn advance(&self, branch: &str, commit: &str) {
        let mut state = self.state.lock().unwrap();
        let previous = state.heads.insert(branch.to_string(), commit.to_string());
        state
            .parents
            .insert(commit.to_string(), previous.into_iter().collect());
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn next_id(&self, kind: &str) -> String {
        let mut state = self.state.lock().unwrap();
        let counter = state.counters.entry(kind.to_string()).or_default();
        *counter += 1;
        format!("{}-{}", kind, counter)
    }
}

#[async_trait]
impl RepositoryHost for RecordingHost {
    async fn get_ref(&self, reference: &str) -> Result<String, RemoteError> {
        self.record(format!("get_ref {}", reference));
        if self.fail == Some(Fail::GetRef) {
            return Err(service_error());
        }
        let branch = reference.trim_start_matches("heads/");
        self.head(branch).ok_or_else(|| RemoteError::Status {
            service: "GitHub",
            status: 404,
            message: "Not Found".to_string(),
        })
    }

    async fn get_commit_tree(&self, commit_sha: &str) -> Result<String, RemoteError> {
        self.record(format!("get_commit_tree {}", commit_sha));
        if self.fail == Some(Fail::GetCommit) {
            return Err(service_error());
        }
        let state = self.state.lock().unwrap();
        state
            .trees
            .get(commit_sha)
            .cloned()
            .ok_or_else(service_error)
    }

    async fn create_tree(
        &self,
        base_tree: &str,
        entries: &[TreeEntry],
    ) -> Result<String, RemoteError> {
        self.record(format!(
            "create_tree base={} entries={}",
            base_tree,
            entries.len()
        ));
        if self.fail == Some(Fail::CreateTree) {
            return Err(service_error());
        }
        let tree = self.next_id("tree");
        self.state
            .lock()
            .unwrap()
            .submitted
            .insert(tree.clone(), entries.to_vec());
        Ok(tree)
    }

    async fn create_commit(
        &self,
        message: &str,
        tree_sha: &str,
        parents: &[String],
    ) -> Result<String, RemoteError> {
        self.record(format!(
            "create_commit tree={} parents={} message={}",
            tree_sha,
            parents.join(","),
            message
        ));
        if self.fail == Some(Fail::CreateCommit) {
            return Err(service_error());
        }
        let commit = self.next_id("commit");
        let mut state = self.state.lock().unwrap();
        state.trees.insert(commit.clone(), tree_sha.to_string());
        state.parents.insert(commit.clone(), parents.to_vec());
        Ok(commit)
    }

    async fn update_ref(&self, reference: &str, sha: &str, force: bool) -> Result<(), RemoteError> {
        self.record(format!("update_ref {} -> {} force={}", reference, sha, force));
        if self.fail == Some(Fail::UpdateRef) {
            return Err(service_error());
        }
        let branch = reference.trim_start_matches("heads/").to_string();
        let mut state = self.state.lock().unwrap();
        let current = state.heads.get(&branch).cloned();
        let fast_forward = match &current {
            Some(head) => state
                .parents
                .get(sha)
                .is_some_and(|parents| parents.contains(head)),
            None => true,
        };
        if !force && !fast_forward {
            return Err(RemoteError::Rejected {
                message: "Update is not a fast forward".to_string(),
            });
        }
        state.heads.insert(branch, sha.to_string());
        Ok(())
    }
}

/// Board source returning a fixed snapshot, or failing.
pub struct StaticBoard {
    board: Option<Board>,
    fetches: Mutex<Vec<String>>,
}

impl StaticBoard {
    pub fn new(board: Board) -> Self {
        Self {
            board: Some(board),
            fetches: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            board: None,
            fetches: Mutex::new(Vec::new()),
        }
    }

    pub fn fetches(&self) -> Vec<String> {
        self.fetches.lock().unwrap().clone()
    }
}

#[async_trait]
impl BoardSource for StaticBoard {
    async fn fetch_board(
        &self,
        board_id: &str,
        _options: &FetchOptions,
    ) -> Result<Board, RemoteError> {
        self.fetches.lock().unwrap().push(board_id.to_string());
        self.board.clone().ok_or_else(|| RemoteError::Status {
            service: "Trello",
            status: 401,
            message: "invalid token".to_string(),
        })
    }
}
