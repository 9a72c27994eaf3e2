//! Render-ready snapshot of the todo page.
//!
//! Every control in the view maps to exactly one `TodoApp` intent. Rows are
//! keyed by todo id.

use std::time::Instant;

use crate::app::TodoApp;
use crate::notify::{ToastAction, ToastLevel};
use crate::query::{QueryKey, QueryState};
use crate::types::TodoId;

pub const PAGE_TITLE: &str = "Todo List";
pub const PAGE_DESCRIPTION: &str = "Manage your tasks efficiently";
pub const INPUT_PLACEHOLDER: &str = "Add a new task...";
pub const LOADING_TEXT: &str = "...loading";
pub const EMPTY_TEXT: &str = "No todos yet. Add one above!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoPageView {
    pub title: &'static str,
    pub description: &'static str,
    pub form: FormView,
    pub list: ListView,
    pub toasts: Vec<ToastView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormView {
    pub value: String,
    pub placeholder: &'static str,
    /// Field errors joined with `", "`; `None` when there are none.
    pub error_text: Option<String>,
    pub input_disabled: bool,
    pub submit_disabled: bool,
    pub submitting: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListView {
    Loading,
    /// The first fetch failed. The error is shown as a toast, not here.
    Unavailable,
    Empty,
    Rows(Vec<TodoRow>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoRow {
    pub key: TodoId,
    pub dom_id: String,
    pub title: String,
    pub checked: bool,
    pub struck_through: bool,
    pub toggle_disabled: bool,
    pub delete_disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastView {
    pub id: u64,
    pub level: ToastLevel,
    pub message: String,
    /// Label of the action button, if the toast has one.
    pub action_label: Option<&'static str>,
}

impl TodoPageView {
    pub fn new(app: &TodoApp, now: Instant) -> Self {
        let form = app.form();
        let create_pending = app.create_mutation().is_pending();
        let title_errors = form.title_errors();
        let form = FormView {
            value: form.title().to_string(),
            placeholder: INPUT_PLACEHOLDER,
            error_text: (!title_errors.is_empty()).then(|| title_errors.join(", ")),
            input_disabled: create_pending,
            submit_disabled: !form.can_submit() || create_pending,
            submitting: create_pending,
        };

        let toggle_disabled = app.toggle_mutation().is_pending();
        let delete_disabled = app.destroy_mutation().is_pending();
        let list = match app.cache().peek(QueryKey::TodoList) {
            QueryState::Pending => ListView::Loading,
            QueryState::Failed { .. } => ListView::Unavailable,
            QueryState::Ready { data, .. } if data.is_empty() => ListView::Empty,
            QueryState::Ready { data, .. } => ListView::Rows(
                data.iter()
                    .map(|todo| TodoRow {
                        key: todo.id,
                        dom_id: format!("todo-{}", todo.id),
                        title: todo.title.clone(),
                        checked: todo.completed,
                        struck_through: todo.completed,
                        toggle_disabled,
                        delete_disabled,
                    })
                    .collect(),
            ),
        };

        let toasts = app
            .toaster()
            .visible(now)
            .map(|toast| ToastView {
                id: toast.id,
                level: toast.level,
                message: toast.message.clone(),
                action_label: toast.action.as_ref().map(ToastAction::label),
            })
            .collect();

        Self {
            title: PAGE_TITLE,
            description: PAGE_DESCRIPTION,
            form,
            list,
            toasts,
        }
    }
}
