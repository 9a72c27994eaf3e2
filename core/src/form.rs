//! State of the "new todo" form.
//!
//! Validation runs on every change so errors are live, and again on submit.
//! A failed submit only records errors; the user edits and tries again.

use serde_json::json;

use crate::types::CreateTodo;
use crate::validation::{validate_create_todo, ValidationErrors};

#[derive(Debug, Clone, Default)]
pub struct CreateTodoForm {
    title: String,
    errors: Option<ValidationErrors>,
}

impl CreateTodoForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn errors(&self) -> Option<&ValidationErrors> {
        self.errors.as_ref()
    }

    /// Error messages for the title field, in order.
    pub fn title_errors(&self) -> Vec<&str> {
        self.errors
            .as_ref()
            .map(|errors| errors.for_field("title").collect())
            .unwrap_or_default()
    }

    pub fn can_submit(&self) -> bool {
        self.errors.is_none()
    }

    pub fn change_title(&mut self, value: impl Into<String>) {
        self.title = value.into();
        self.errors = self.validate().err();
    }

    /// Validate the current values and hand back the payload to send.
    pub fn submit(&mut self) -> Result<CreateTodo, ValidationErrors> {
        let result = self.validate();
        self.errors = result.as_ref().err().cloned();
        result
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn validate(&self) -> Result<CreateTodo, ValidationErrors> {
        validate_create_todo(&json!({ "title": self.title }))
    }
}
