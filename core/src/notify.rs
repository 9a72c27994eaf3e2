//! Transient user-visible notifications.
//!
//! # Design
//! Toasts are non-blocking: they expire after a fixed lifetime or when the
//! user dismisses them. An error toast raised by a failed read carries a
//! `retry` action bound to the query that failed. The toaster is also the
//! query cache's global error hook, so every read failure ends up here.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::ApiError;
use crate::query::{QueryErrorHook, QueryKey};

pub const DEFAULT_TOAST_LIFETIME: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Error,
}

/// Action button attached to a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastAction {
    /// Invalidate and refetch the query.
    Retry(QueryKey),
}

impl ToastAction {
    pub fn label(&self) -> &'static str {
        match self {
            ToastAction::Retry(_) => "retry",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub level: ToastLevel,
    pub message: String,
    pub action: Option<ToastAction>,
    pub created_at: Instant,
}

#[derive(Debug)]
pub struct Toaster {
    toasts: Vec<Toast>,
    next_id: u64,
    lifetime: Duration,
}

impl Default for Toaster {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_LIFETIME)
    }
}

impl Toaster {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            toasts: Vec::new(),
            next_id: 1,
            lifetime,
        }
    }

    pub fn success(&mut self, message: impl Into<String>) -> u64 {
        self.push(ToastLevel::Success, message.into(), None)
    }

    pub fn error(&mut self, message: impl Into<String>, action: Option<ToastAction>) -> u64 {
        self.push(ToastLevel::Error, message.into(), action)
    }

    fn push(&mut self, level: ToastLevel, message: String, action: Option<ToastAction>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        debug!(id, ?level, %message, "toast");
        self.toasts.push(Toast {
            id,
            level,
            message,
            action,
            created_at: Instant::now(),
        });
        id
    }

    pub fn get(&self, id: u64) -> Option<&Toast> {
        self.toasts.iter().find(|t| t.id == id)
    }

    /// Remove toast `id`, returning it if it was still showing.
    pub fn dismiss(&mut self, id: u64) -> Option<Toast> {
        let index = self.toasts.iter().position(|t| t.id == id)?;
        Some(self.toasts.remove(index))
    }

    /// Drop toasts older than the lifetime at `now`.
    pub fn prune(&mut self, now: Instant) {
        let lifetime = self.lifetime;
        self.toasts
            .retain(|t| now.saturating_duration_since(t.created_at) < lifetime);
    }

    /// Toasts still showing at `now`, oldest first.
    pub fn visible(&self, now: Instant) -> impl Iterator<Item = &Toast> {
        let lifetime = self.lifetime;
        self.toasts
            .iter()
            .filter(move |t| now.saturating_duration_since(t.created_at) < lifetime)
    }

    /// Every toast not yet pruned or dismissed.
    pub fn all(&self) -> &[Toast] {
        &self.toasts
    }
}

impl QueryErrorHook for Toaster {
    fn on_query_error(&mut self, key: QueryKey, error: &ApiError) {
        self.error(format!("Error: {error}"), Some(ToastAction::Retry(key)));
    }
}
