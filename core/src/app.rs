//! The todo page runtime: one explicit owner for the cache, the form, the
//! three mutations and the toaster.
//!
//! # Design
//! User intents (`submit`, `toggle`, `destroy`, `retry`) only change state
//! and enqueue work. The host asks for the next request with
//! `poll_request`, performs the round-trip, and hands the outcome back with
//! `complete`. Mutation callbacks run inside `complete`, so they always run
//! after their request settles, and the refetch they trigger is queued
//! behind them. `run_until_idle` is the synchronous host loop.
//!
//! Nothing is cancelled: a request the host never completes simply stays in
//! flight, and the matching mutation stays pending.

use std::collections::{HashMap, VecDeque};
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, warn};

use crate::client::TodoClient;
use crate::error::{ApiError, TransportError};
use crate::form::CreateTodoForm;
use crate::http::{HttpRequest, HttpResponse};
use crate::mutation::{AlreadyPending, Mutation, MutationKind};
use crate::notify::{ToastAction, Toaster};
use crate::query::{QueryCache, QueryKey, QueryState};
use crate::transport::Transport;
use crate::types::{CreateTodo, Todo, TodoId, UpdateTodo};
use crate::validation::ValidationErrors;
use crate::view::TodoPageView;

/// Pairs a request handed to the host with its outcome.
pub type Ticket = u64;

/// A request the host must execute, then report through
/// [`TodoApp::complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub ticket: Ticket,
    pub request: HttpRequest,
}

/// Why an intent was not accepted. None of these are fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntentError {
    #[error("invalid input: {0}")]
    Invalid(#[from] ValidationErrors),
    #[error(transparent)]
    Busy(#[from] AlreadyPending),
    #[error("todo {0} is not in the current list")]
    UnknownTodo(TodoId),
    #[error("no toast with id {0}")]
    UnknownToast(u64),
    #[error("toast {0} has no action")]
    NoAction(u64),
}

#[derive(Debug, Clone)]
enum Task {
    Fetch(QueryKey),
    Create(CreateTodo),
    Toggle { id: TodoId, completed: bool },
    Destroy(TodoId),
}

#[derive(Debug)]
pub struct TodoApp {
    client: TodoClient,
    cache: QueryCache<Vec<Todo>>,
    toaster: Toaster,
    form: CreateTodoForm,
    create: Mutation<CreateTodo, Todo>,
    toggle: Mutation<(TodoId, bool), Todo>,
    destroy: Mutation<TodoId, ()>,
    queue: VecDeque<Task>,
    in_flight: HashMap<Ticket, (Task, HttpRequest)>,
    next_ticket: Ticket,
}

impl TodoApp {
    pub fn new(client: TodoClient) -> Self {
        Self::with_toaster(client, Toaster::default())
    }

    pub fn with_toaster(client: TodoClient, toaster: Toaster) -> Self {
        Self {
            client,
            cache: QueryCache::new(),
            toaster,
            form: CreateTodoForm::new(),
            create: Mutation::new(MutationKind::Create),
            toggle: Mutation::new(MutationKind::Toggle),
            destroy: Mutation::new(MutationKind::Destroy),
            queue: VecDeque::new(),
            in_flight: HashMap::new(),
            next_ticket: 1,
        }
    }

    pub fn client(&self) -> &TodoClient {
        &self.client
    }

    pub fn cache(&self) -> &QueryCache<Vec<Todo>> {
        &self.cache
    }

    pub fn toaster(&self) -> &Toaster {
        &self.toaster
    }

    pub fn form(&self) -> &CreateTodoForm {
        &self.form
    }

    pub fn create_mutation(&self) -> &Mutation<CreateTodo, Todo> {
        &self.create
    }

    pub fn toggle_mutation(&self) -> &Mutation<(TodoId, bool), Todo> {
        &self.toggle
    }

    pub fn destroy_mutation(&self) -> &Mutation<TodoId, ()> {
        &self.destroy
    }

    /// Snapshot for rendering at `now`.
    pub fn view(&self, now: Instant) -> TodoPageView {
        TodoPageView::new(self, now)
    }

    // -----------------------------------------------------------------------
    // Intents
    // -----------------------------------------------------------------------

    /// Read the todo list, scheduling a fetch when nothing fresh is cached.
    pub fn load(&mut self) -> QueryState<'_, Vec<Todo>> {
        self.cache.read_or_suspend(QueryKey::TodoList)
    }

    /// Fire-and-forget refresh of the todo list.
    pub fn refetch(&mut self) {
        self.cache.invalidate_and_refetch(QueryKey::TodoList);
    }

    pub fn change_title(&mut self, value: impl Into<String>) {
        self.form.change_title(value);
    }

    /// Validate the form and start a create mutation.
    pub fn submit(&mut self) -> Result<(), IntentError> {
        if self.create.is_pending() {
            return Err(self.reject(AlreadyPending(self.create.kind()).into()));
        }
        let payload = match self.form.submit() {
            Ok(payload) => payload,
            Err(errors) => return Err(self.reject(errors.into())),
        };
        let payload = self.create.begin(payload).map_err(|e| self.reject(e.into()))?;
        self.queue.push_back(Task::Create(payload));
        Ok(())
    }

    /// Set the title and submit in one step. While a create is pending the
    /// form is left untouched, so the title being sent is not replaced.
    pub fn submit_title(&mut self, title: impl Into<String>) -> Result<(), IntentError> {
        if self.create.is_pending() {
            return Err(self.reject(AlreadyPending(self.create.kind()).into()));
        }
        self.form.change_title(title);
        self.submit()
    }

    /// Flip `completed` for todo `id`, based on the cached snapshot.
    ///
    /// The new value is computed here, not by the backend, so a concurrent
    /// change made elsewhere can be overwritten. The refetch that follows
    /// makes the result visible either way. Returns the value sent.
    pub fn toggle(&mut self, id: TodoId) -> Result<bool, IntentError> {
        if self.toggle.is_pending() {
            return Err(self.reject(AlreadyPending(self.toggle.kind()).into()));
        }
        let current = self
            .cache
            .data(QueryKey::TodoList)
            .and_then(|todos| todos.iter().find(|todo| todo.id == id))
            .map(|todo| todo.completed);
        let Some(current) = current else {
            self.refetch();
            return Err(self.reject(IntentError::UnknownTodo(id)));
        };

        let completed = !current;
        self.toggle
            .begin((id, completed))
            .map_err(|e| self.reject(e.into()))?;
        self.queue.push_back(Task::Toggle { id, completed });
        Ok(completed)
    }

    pub fn destroy(&mut self, id: TodoId) -> Result<(), IntentError> {
        let id = self.destroy.begin(id).map_err(|e| self.reject(e.into()))?;
        self.queue.push_back(Task::Destroy(id));
        Ok(())
    }

    /// Run the action attached to toast `toast_id` and dismiss the toast.
    pub fn retry(&mut self, toast_id: u64) -> Result<(), IntentError> {
        let Some(toast) = self.toaster.get(toast_id) else {
            return Err(self.reject(IntentError::UnknownToast(toast_id)));
        };
        let Some(ToastAction::Retry(key)) = toast.action else {
            return Err(self.reject(IntentError::NoAction(toast_id)));
        };
        self.toaster.dismiss(toast_id);
        self.cache.invalidate_and_refetch(key);
        Ok(())
    }

    pub fn dismiss(&mut self, toast_id: u64) -> bool {
        self.toaster.dismiss(toast_id).is_some()
    }

    pub fn prune_toasts(&mut self, now: Instant) {
        self.toaster.prune(now);
    }

    // -----------------------------------------------------------------------
    // Host interface
    // -----------------------------------------------------------------------

    /// True while requests are queued or in flight.
    pub fn has_work(&self) -> bool {
        !self.queue.is_empty() || !self.in_flight.is_empty() || self.cache.has_scheduled()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Next request the host should execute, if any.
    pub fn poll_request(&mut self) -> Option<PendingRequest> {
        self.collect_scheduled();
        while let Some(task) = self.queue.pop_front() {
            match self.build(&task) {
                Ok(request) => {
                    let request = self.client.prepare(request);
                    let ticket = self.next_ticket;
                    self.next_ticket += 1;
                    debug!(ticket, method = request.method.as_str(), url = %request.path, "dispatching");
                    self.in_flight.insert(ticket, (task, request.clone()));
                    return Some(PendingRequest { ticket, request });
                }
                Err(error) => {
                    let error = self.client.intercept_error(error);
                    self.settle(task, None, Err(error));
                    self.collect_scheduled();
                }
            }
        }
        None
    }

    /// Report the outcome of the request issued under `ticket`. Returns
    /// `false` for a ticket that is unknown or already completed.
    pub fn complete(&mut self, ticket: Ticket, outcome: Result<HttpResponse, TransportError>) -> bool {
        let Some((task, request)) = self.in_flight.remove(&ticket) else {
            warn!(ticket, "completion for unknown ticket");
            return false;
        };
        self.settle(task, Some(&request), outcome.map_err(ApiError::from));
        self.collect_scheduled();
        true
    }

    /// Execute queued work through `transport` until nothing is left.
    /// Returns the number of requests performed.
    pub fn run_until_idle(&mut self, transport: &impl Transport) -> usize {
        let mut executed = 0;
        while let Some(PendingRequest { ticket, request }) = self.poll_request() {
            let outcome = transport.execute(request);
            self.complete(ticket, outcome);
            executed += 1;
        }
        executed
    }

    fn collect_scheduled(&mut self) {
        while let Some(key) = self.cache.take_scheduled() {
            self.queue.push_back(Task::Fetch(key));
        }
    }

    fn build(&self, task: &Task) -> Result<HttpRequest, ApiError> {
        match task {
            Task::Fetch(QueryKey::TodoList) => Ok(self.client.build_list_todos()),
            Task::Create(payload) => self.client.build_create_todo(payload),
            Task::Toggle { id, completed } => self
                .client
                .build_update_todo(*id, &UpdateTodo::completed(*completed)),
            Task::Destroy(id) => Ok(self.client.build_delete_todo(*id)),
        }
    }

    /// Parse the outcome of `task` and run its callbacks. `request` is
    /// `None` when the request could not even be built.
    fn settle(&mut self, task: Task, request: Option<&HttpRequest>, outcome: Result<HttpResponse, ApiError>) {
        match task {
            Task::Fetch(key @ QueryKey::TodoList) => {
                let result = self.parse(request, outcome, TodoClient::parse_list_todos);
                self.cache.settle(key, result, &mut self.toaster);
            }
            Task::Create(_) => match self.parse(request, outcome, TodoClient::parse_create_todo) {
                Ok(todo) => {
                    self.create.succeed(todo);
                    self.after_write(MutationKind::Create);
                    self.form.reset();
                }
                Err(error) => {
                    self.create.fail(error.clone());
                    self.write_failed(MutationKind::Create, &error);
                }
            },
            Task::Toggle { .. } => match self.parse(request, outcome, TodoClient::parse_update_todo) {
                Ok(todo) => {
                    self.toggle.succeed(todo);
                    self.after_write(MutationKind::Toggle);
                }
                Err(error) => {
                    self.toggle.fail(error.clone());
                    self.write_failed(MutationKind::Toggle, &error);
                }
            },
            Task::Destroy(_) => match self.parse(request, outcome, TodoClient::parse_delete_todo) {
                Ok(()) => {
                    self.destroy.succeed(());
                    self.after_write(MutationKind::Destroy);
                }
                Err(error) => {
                    self.destroy.fail(error.clone());
                    self.write_failed(MutationKind::Destroy, &error);
                }
            },
        }
    }

    fn parse<T>(
        &self,
        request: Option<&HttpRequest>,
        outcome: Result<HttpResponse, ApiError>,
        parse: fn(&TodoClient, HttpResponse) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        match request {
            Some(request) => self.client.receive(request, outcome, parse),
            None => outcome.and_then(|response| parse(&self.client, response)),
        }
    }

    /// Show a refused intent. Validation errors are already on the form;
    /// everything else becomes an error toast.
    fn reject(&mut self, error: IntentError) -> IntentError {
        if !matches!(error, IntentError::Invalid(_)) {
            warn!(%error, "intent refused");
            self.toaster.error(format!("Error: {error}"), None);
        }
        error
    }

    fn after_write(&mut self, kind: MutationKind) {
        self.cache.invalidate_and_refetch(QueryKey::TodoList);
        self.toaster.success(kind.success_message());
    }

    /// Write failures are shown once and never retried. A todo that vanished
    /// on the backend triggers a refetch so the list stops showing it.
    fn write_failed(&mut self, kind: MutationKind, error: &ApiError) {
        self.toaster.error(format!("Error: {error}"), None);
        if kind != MutationKind::Create && *error == ApiError::NotFound {
            self.cache.invalidate_and_refetch(QueryKey::TodoList);
        }
    }
}
