//! In-memory backend for the todo collection.
//!
//! Serves the same routes and status codes as the production service:
//! sequential integer ids, 201 on create, 204 on delete, 404 for unknown
//! ids, and 400 when a title falls outside 5..=255 characters. State lives
//! in a `BTreeMap`, so listings come back ordered by id.

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};

pub const TITLE_MIN_CHARS: usize = 5;
pub const TITLE_MAX_CHARS: usize = 255;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub completed: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateTodo {
    pub title: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTodo {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: Option<String>,
}

#[derive(Default)]
pub struct Store {
    todos: BTreeMap<i64, Todo>,
    last_id: i64,
}

pub type Db = Arc<RwLock<Store>>;

type Rejection = (StatusCode, String);

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/{id}", get(get_todo).put(update_todo).delete(delete_todo))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock server listening");
    }
    axum::serve(listener, app()).await
}

fn check_title(title: &str) -> Result<(), Rejection> {
    let chars = title.chars().count();
    if (TITLE_MIN_CHARS..=TITLE_MAX_CHARS).contains(&chars) {
        Ok(())
    } else {
        Err((
            StatusCode::BAD_REQUEST,
            format!("title: must be between {TITLE_MIN_CHARS} and {TITLE_MAX_CHARS} characters"),
        ))
    }
}

/// Decode a JSON body the same way the service does: shape errors and rule
/// violations are both reported as 400.
fn decode<T: serde::de::DeserializeOwned>(payload: Value) -> Result<T, Rejection> {
    serde_json::from_value(payload).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))
}

fn not_found() -> Rejection {
    (StatusCode::NOT_FOUND, "Todo not found".to_string())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    })
}

async fn list_todos(State(db): State<Db>) -> Json<Vec<Todo>> {
    let store = db.read().await;
    Json(store.todos.values().cloned().collect())
}

async fn create_todo(
    State(db): State<Db>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Todo>), Rejection> {
    let input: CreateTodo = decode(payload)?;
    check_title(&input.title)?;

    let mut store = db.write().await;
    store.last_id += 1;
    let todo = Todo {
        id: store.last_id,
        title: input.title,
        completed: false,
    };
    store.todos.insert(todo.id, todo.clone());
    debug!(id = todo.id, "created todo");
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn get_todo(State(db): State<Db>, Path(id): Path<i64>) -> Result<Json<Todo>, Rejection> {
    let store = db.read().await;
    store.todos.get(&id).cloned().map(Json).ok_or_else(not_found)
}

async fn update_todo(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(payload): Json<Value>,
) -> Result<Json<Todo>, Rejection> {
    let input: UpdateTodo = decode(payload)?;
    if let Some(title) = &input.title {
        check_title(title)?;
    }

    let mut store = db.write().await;
    let todo = store.todos.get_mut(&id).ok_or_else(not_found)?;
    if let Some(title) = input.title {
        todo.title = title;
    }
    if let Some(completed) = input.completed {
        todo.completed = completed;
    }
    debug!(id, completed = todo.completed, "updated todo");
    Ok(Json(todo.clone()))
}

async fn delete_todo(State(db): State<Db>, Path(id): Path<i64>) -> Result<StatusCode, Rejection> {
    let mut store = db.write().await;
    store
        .todos
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(not_found)
}
