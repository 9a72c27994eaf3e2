//! Client core for the todo service.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern), and layers the page runtime
//! on top: a query cache for the todo list, a mutation controller per write,
//! live form validation, and transient notifications.
//!
//! # Design
//! - `TodoClient` is stateless apart from its configuration and interceptor
//!   chains. Each CRUD operation is split into `build_*` and `parse_*`, so the
//!   I/O boundary is explicit.
//! - `TodoApp` owns every piece of page state. The host pulls requests from
//!   it, executes them through a `Transport`, and pushes outcomes back.
//! - Every state change is a backend request followed by a full refetch of
//!   the list; cached todos are never edited in place.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod app;
pub mod client;
pub mod error;
pub mod form;
pub mod http;
pub mod interceptor;
pub mod mutation;
pub mod notify;
pub mod query;
pub mod transport;
pub mod types;
pub mod validation;
pub mod view;

pub use app::{IntentError, PendingRequest, Ticket, TodoApp};
pub use client::{ClientConfig, TodoClient};
pub use error::{ApiError, TransportError};
pub use form::CreateTodoForm;
pub use http::{CredentialsMode, HttpMethod, HttpRequest, HttpResponse};
pub use interceptor::Interceptors;
pub use mutation::{Mutation, MutationKind, MutationStatus};
pub use notify::{Toast, ToastAction, ToastLevel, Toaster};
pub use query::{QueryCache, QueryErrorHook, QueryKey, QueryState};
pub use transport::{Transport, UreqTransport};
pub use types::{CreateTodo, Todo, TodoId, UpdateTodo};
pub use validation::{validate_create_todo, FieldError, ValidationErrors};
pub use view::{FormView, ListView, TodoPageView, TodoRow, ToastView};
