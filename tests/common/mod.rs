//! In-process fake of the Trello board endpoint and the GitHub git-data API.

#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{Method, StatusCode, Uri},
    routing::{get, patch, post},
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

pub const BASE_COMMIT: &str = "c0";
pub const BASE_TREE: &str = "t0";

/// One request the fake received.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub body: Value,
}

#[derive(Debug, Default)]
struct FakeState {
    board: Value,
    requests: Vec<Recorded>,
    head: String,
    parents: HashMap<String, String>,
    next_id: usize,
    /// Simulates someone pushing to the branch while the board is fetched.
    move_head_on_fetch: bool,
    board_status: Option<(StatusCode, Value)>,
}

type Shared = Arc<Mutex<FakeState>>;

pub struct FakeServer {
    pub url: String,
    state: Shared,
}

impl FakeServer {
    pub async fn start(board: Value) -> Self {
        let state = Arc::new(Mutex::new(FakeState {
            board,
            head: BASE_COMMIT.to_string(),
            ..Default::default()
        }));

        let app = Router::new()
            .route("/1/boards/{id}", get(board_handler))
            .route("/repos/{owner}/{repo}/git/ref/{*reference}", get(ref_handler))
            .route(
                "/repos/{owner}/{repo}/git/commits/{sha}",
                get(commit_handler),
            )
            .route("/repos/{owner}/{repo}/git/trees", post(create_tree_handler))
            .route(
                "/repos/{owner}/{repo}/git/commits",
                post(create_commit_handler),
            )
            .route(
                "/repos/{owner}/{repo}/git/refs/{*reference}",
                patch(update_ref_handler),
            )
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{}", addr),
            state,
        }
    }

    pub fn move_head_on_fetch(&self) {
        self.state.lock().unwrap().move_head_on_fetch = true;
    }

    pub fn fail_board(&self, status: StatusCode, body: Value) {
        self.state.lock().unwrap().board_status = Some((status, body));
    }

    pub fn head(&self) -> String {
        self.state.lock().unwrap().head.clone()
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.lock().unwrap().requests.clone()
    }

    /// `METHOD /path` for every request, in arrival order.
    pub fn request_lines(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect()
    }

    pub fn find(&self, method: Method, path_suffix: &str) -> Option<Recorded> {
        self.requests()
            .into_iter()
            .find(|r| r.method == method && r.path.ends_with(path_suffix))
    }

    /// Config file pointing both clients at this server.
    pub fn config_toml(&self, branch: &str) -> String {
        format!(
            r#"
[board]
id = "b1"
api_key = "trello-key"
token = "trello-token"
api_url = "{url}"

[repository]
owner = "reliefweb"
name = "podcast-site"
branch = "{branch}"
token = "ghp_test"
api_url = "{url}"

[content]
item_path = "items"

[http]
timeout_secs = 5
"#,
            url = self.url,
            branch = branch,
        )
    }
}

fn record(state: &mut FakeState, method: Method, uri: &Uri, query: HashMap<String, String>, body: Value) {
    state.requests.push(Recorded {
        method,
        path: uri.path().to_string(),
        query,
        body,
    });
}

fn next_sha(state: &mut FakeState, kind: &str) -> String {
    state.next_id += 1;
    format!("{}-{}", kind, state.next_id)
}

async fn board_handler(
    State(state): State<Shared>,
    uri: Uri,
    Query(query): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    let mut state = state.lock().unwrap();
    record(&mut state, Method::GET, &uri, query, Value::Null);
    if state.move_head_on_fetch {
        state.head = "pushed-elsewhere".to_string();
    }
    match state.board_status.clone() {
        Some((status, body)) => (status, Json(body)),
        None => (StatusCode::OK, Json(state.board.clone())),
    }
}

async fn ref_handler(State(state): State<Shared>, uri: Uri) -> (StatusCode, Json<Value>) {
    let mut state = state.lock().unwrap();
    record(&mut state, Method::GET, &uri, HashMap::new(), Value::Null);
    let head = state.head.clone();
    (
        StatusCode::OK,
        Json(json!({
            "ref": "refs/heads/main",
            "object": { "sha": head, "type": "commit" }
        })),
    )
}

async fn commit_handler(State(state): State<Shared>, uri: Uri) -> (StatusCode, Json<Value>) {
    let mut state = state.lock().unwrap();
    record(&mut state, Method::GET, &uri, HashMap::new(), Value::Null);
    (
        StatusCode::OK,
        Json(json!({
            "sha": BASE_COMMIT,
            "tree": { "sha": BASE_TREE },
            "message": "previous"
        })),
    )
}

async fn create_tree_handler(
    State(state): State<Shared>,
    uri: Uri,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut state = state.lock().unwrap();
    record(&mut state, Method::POST, &uri, HashMap::new(), body);
    let sha = next_sha(&mut state, "tree");
    (StatusCode::CREATED, Json(json!({ "sha": sha })))
}

async fn create_commit_handler(
    State(state): State<Shared>,
    uri: Uri,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut state = state.lock().unwrap();
    let parent = body["parents"][0].as_str().unwrap_or_default().to_string();
    record(&mut state, Method::POST, &uri, HashMap::new(), body);
    let sha = next_sha(&mut state, "commit");
    state.parents.insert(sha.clone(), parent);
    (StatusCode::CREATED, Json(json!({ "sha": sha })))
}

async fn update_ref_handler(
    State(state): State<Shared>,
    uri: Uri,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut state = state.lock().unwrap();
    let sha = body["sha"].as_str().unwrap_or_default().to_string();
    let force = body["force"].as_bool().unwrap_or(false);
    record(&mut state, Method::PATCH, &uri, HashMap::new(), body);

    let fast_forward = state.parents.get(&sha) == Some(&state.head);
    if !force && !fast_forward {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "message": "Update is not a fast forward",
                "documentation_url": "https://docs.github.com/rest/git/refs#update-a-reference"
            })),
        );
    }
    state.head = sha.clone();
    (
        StatusCode::OK,
        Json(json!({ "ref": uri.path(), "object": { "sha": sha, "type": "commit" } })),
    )
}

/// The board from the README walkthrough: one private list, one public list.
pub fn example_board() -> Value {
    json!({
        "id": "b1",
        "name": "Podcast",
        "desc": "",
        "lists": [
            { "id": "id1", "name": "PRIVATE-notes", "closed": false, "pos": 1 },
            { "id": "id2", "name": "Tasks", "closed": false, "pos": 2 }
        ],
        "cards": [
            {
                "id": "c1",
                "name": "Fix bug",
                "desc": "Crash on start",
                "pos": 16384,
                "idList": "id2",
                "labels": [{ "id": "l1", "name": "urgent", "color": "red" }],
                "due": "2017-04-12T10:00:00.000Z",
                "attachments": [],
                "idShort": 7,
                "badges": { "comments": 2 }
            },
            {
                "id": "c2",
                "name": "Secret plan",
                "desc": "",
                "pos": 32768,
                "idList": "id1",
                "labels": [],
                "due": null,
                "attachments": []
            }
        ]
    })
}
