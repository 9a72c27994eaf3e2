//! Cache of fetched query results.
//!
//! # Design
//! The cache never performs I/O. Reading a missing or stale entry, or
//! invalidating one, *schedules* a fetch; the runtime drains scheduled keys
//! with `take_scheduled`, executes them, and reports the outcome through
//! `settle`. At most one fetch per key is in flight. Invalidating a key whose
//! fetch is already running queues exactly one follow-up fetch, because the
//! running one may have been answered before the change that caused the
//! invalidation.
//!
//! Data is fresh for `stale_time` after it arrives (zero by default). Reading
//! stale data returns it immediately and starts a background refetch, so
//! every read after the window picks up changes made by other clients.
//!
//! Read failures are reported through a single [`QueryErrorHook`]. Data from
//! an earlier successful fetch survives a failed refetch.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::ApiError;

/// Identity of a cached read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// Every todo in the collection.
    TodoList,
}

impl QueryKey {
    pub fn label(&self) -> &'static str {
        match self {
            QueryKey::TodoList => "Todo.getAll",
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What a reader sees for a key.
#[derive(Debug, PartialEq, Eq)]
pub enum QueryState<'a, T> {
    /// No data yet; a fetch is scheduled or running.
    Pending,
    /// Data is available. `fetching` is true while a refresh is running.
    Ready { data: &'a T, fetching: bool },
    /// The last fetch failed and there is no earlier data to show.
    Failed { error: &'a ApiError },
}

/// Receives every read failure. The only place read errors surface.
pub trait QueryErrorHook {
    fn on_query_error(&mut self, key: QueryKey, error: &ApiError);
}

#[derive(Debug)]
struct QueryEntry<T> {
    data: Option<T>,
    error: Option<ApiError>,
    stale: bool,
    fetching: bool,
    refetch_queued: bool,
    fetch_count: u64,
    fetched_at: Option<Instant>,
}

impl<T> QueryEntry<T> {
    fn new() -> Self {
        Self {
            data: None,
            error: None,
            stale: true,
            fetching: false,
            refetch_queued: false,
            fetch_count: 0,
            fetched_at: None,
        }
    }

    fn is_stale(&self, stale_time: Duration) -> bool {
        self.stale || self.fetched_at.map_or(true, |at| at.elapsed() >= stale_time)
    }

    fn state(&self) -> QueryState<'_, T> {
        match (&self.data, &self.error) {
            (Some(data), _) => QueryState::Ready {
                data,
                fetching: self.fetching,
            },
            (None, Some(error)) if !self.fetching => QueryState::Failed { error },
            _ => QueryState::Pending,
        }
    }
}

#[derive(Debug)]
pub struct QueryCache<T> {
    entries: HashMap<QueryKey, QueryEntry<T>>,
    scheduled: VecDeque<QueryKey>,
    stale_time: Duration,
}

impl<T> Default for QueryCache<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            scheduled: VecDeque::new(),
            stale_time: Duration::ZERO,
        }
    }
}

impl<T> QueryCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep fetched data fresh for `stale_time` before a read refetches it.
    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    /// Current state of `key`, scheduling a fetch when the entry is missing
    /// or stale. Stale data stays readable while the fetch runs. An entry
    /// whose last fetch failed is not refetched until it is invalidated.
    pub fn read_or_suspend(&mut self, key: QueryKey) -> QueryState<'_, T> {
        let stale_time = self.stale_time;
        let entry = self.entries.entry(key).or_insert_with(QueryEntry::new);
        if entry.is_stale(stale_time) && !entry.fetching && entry.error.is_none() {
            entry.fetching = true;
            self.scheduled.push_back(key);
            debug!(query = %key, "scheduled fetch on read");
        }
        self.peek(key)
    }

    /// Current state of `key` without scheduling anything.
    pub fn peek(&self, key: QueryKey) -> QueryState<'_, T> {
        self.entries
            .get(&key)
            .map(QueryEntry::state)
            .unwrap_or(QueryState::Pending)
    }

    pub fn data(&self, key: QueryKey) -> Option<&T> {
        self.entries.get(&key).and_then(|entry| entry.data.as_ref())
    }

    pub fn is_fetching(&self, key: QueryKey) -> bool {
        self.entries.get(&key).is_some_and(|entry| entry.fetching)
    }

    pub fn is_stale(&self, key: QueryKey) -> bool {
        self.entries
            .get(&key)
            .map_or(true, |entry| entry.is_stale(self.stale_time))
    }

    /// Number of fetches for `key` that have settled.
    pub fn fetch_count(&self, key: QueryKey) -> u64 {
        self.entries.get(&key).map_or(0, |entry| entry.fetch_count)
    }

    /// Mark `key` stale and schedule a fetch for it.
    pub fn invalidate_and_refetch(&mut self, key: QueryKey) {
        let entry = self.entries.entry(key).or_insert_with(QueryEntry::new);
        entry.stale = true;
        if entry.fetching {
            if !entry.refetch_queued {
                debug!(query = %key, "fetch in flight, queued follow-up");
            }
            entry.refetch_queued = true;
            return;
        }
        entry.fetching = true;
        self.scheduled.push_back(key);
        debug!(query = %key, "invalidated, scheduled refetch");
    }

    pub fn has_scheduled(&self) -> bool {
        !self.scheduled.is_empty()
    }

    /// Next key whose fetch should start, oldest first.
    pub fn take_scheduled(&mut self) -> Option<QueryKey> {
        self.scheduled.pop_front()
    }

    /// Record the outcome of a fetch for `key`.
    pub fn settle(&mut self, key: QueryKey, result: Result<T, ApiError>, hook: &mut impl QueryErrorHook) {
        let entry = self.entries.entry(key).or_insert_with(QueryEntry::new);
        entry.fetching = false;
        entry.fetch_count += 1;

        match result {
            Ok(data) => {
                debug!(query = %key, "fetch succeeded");
                entry.data = Some(data);
                entry.error = None;
                entry.stale = false;
                entry.fetched_at = Some(Instant::now());
            }
            Err(error) => {
                warn!(query = %key, %error, "fetch failed");
                hook.on_query_error(key, &error);
                entry.error = Some(error);
            }
        }

        if entry.refetch_queued {
            entry.refetch_queued = false;
            entry.stale = true;
            entry.fetching = true;
            self.scheduled.push_back(key);
            debug!(query = %key, "started queued follow-up fetch");
        }
    }
}
