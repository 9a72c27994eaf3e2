//! Server-rendered front end for the todo service.
//!
//! One `TodoApp` holds the page state for every visitor. Each handler applies
//! an intent, then drives the app until it has nothing left to send, so the
//! page a browser receives always reflects settled state. Every page view
//! reads the list again, so changes made by other clients show up on reload.
//! Mutating routes answer `303 See Other` back to `/`; refused intents are
//! reported to the visitor as toasts by the app itself.

pub mod config;
pub mod render;

use std::{sync::Arc, time::Instant};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, Redirect},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use tokio::sync::Mutex;
use todo_client::{IntentError, TodoApp, TodoId, Transport, TransportError};
use tracing::{debug, error, info};

#[derive(Clone)]
pub struct AppState {
    app: Arc<Mutex<TodoApp>>,
    transport: Arc<dyn Transport + Send + Sync>,
}

impl AppState {
    pub fn new(app: TodoApp, transport: impl Transport + Send + Sync + 'static) -> Self {
        Self {
            app: Arc::new(Mutex::new(app)),
            transport: Arc::new(transport),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NewTodo {
    #[serde(default)]
    pub title: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/todos", post(create_todo))
        .route("/todos/{id}/toggle", post(toggle_todo))
        .route("/todos/{id}/delete", post(delete_todo))
        .route("/toasts/{id}/retry", post(retry_toast))
        .route("/toasts/{id}/dismiss", post(dismiss_toast))
        .with_state(state)
}

/// Execute queued requests until the app has nothing left to send.
///
/// The lock is released while a request is on the wire; blocking transports
/// run on the blocking pool.
pub async fn drive(state: &AppState) -> usize {
    let mut executed = 0;
    loop {
        let Some(pending) = state.app.lock().await.poll_request() else {
            break;
        };
        let transport = Arc::clone(&state.transport);
        let request = pending.request;
        debug!(ticket = pending.ticket, method = request.method.as_str(), path = %request.path, "sending");
        let outcome = tokio::task::spawn_blocking(move || transport.execute(request))
            .await
            .unwrap_or_else(|e| Err(TransportError::new(format!("request task failed: {e}"))));
        state.app.lock().await.complete(pending.ticket, outcome);
        executed += 1;
    }
    executed
}

fn log_refused(intent: &str, result: Result<(), IntentError>) {
    if let Err(error) = result {
        debug!(intent, %error, "intent refused");
    }
}

async fn index(State(state): State<AppState>) -> Result<Html<String>, StatusCode> {
    {
        let mut app = state.app.lock().await;
        app.prune_toasts(Instant::now());
        app.load();
    }
    drive(&state).await;
    let view = state.app.lock().await.view(Instant::now());
    render::page(&view).map(Html).map_err(|error| {
        error!(%error, "failed to render page");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

async fn create_todo(State(state): State<AppState>, Form(input): Form<NewTodo>) -> Redirect {
    let result = state.app.lock().await.submit_title(input.title);
    log_refused("create", result);
    drive(&state).await;
    Redirect::to("/")
}

async fn toggle_todo(State(state): State<AppState>, Path(id): Path<TodoId>) -> Redirect {
    let result = state.app.lock().await.toggle(id);
    match result {
        Ok(completed) => debug!(id, completed, "toggle sent"),
        Err(error) => debug!(intent = "toggle", %error, "intent refused"),
    }
    drive(&state).await;
    Redirect::to("/")
}

async fn delete_todo(State(state): State<AppState>, Path(id): Path<TodoId>) -> Redirect {
    let result = state.app.lock().await.destroy(id);
    log_refused("delete", result);
    drive(&state).await;
    Redirect::to("/")
}

async fn retry_toast(State(state): State<AppState>, Path(id): Path<u64>) -> Redirect {
    let result = state.app.lock().await.retry(id);
    if result.is_ok() {
        info!(toast = id, "retrying failed read");
    }
    log_refused("retry", result);
    drive(&state).await;
    Redirect::to("/")
}

async fn dismiss_toast(State(state): State<AppState>, Path(id): Path<u64>) -> Redirect {
    if !state.app.lock().await.dismiss(id) {
        debug!(toast = id, "dismiss ignored, toast already gone");
    }
    Redirect::to("/")
}
