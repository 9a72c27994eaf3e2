//! Shape validation for the create payload.
//!
//! # Design
//! The backend publishes the create schema as `title: string, 5..=255
//! characters`. `validate_create_todo` checks free-form JSON input against
//! those rules before anything is sent, so a rejected payload never costs a
//! request. Errors are collected in order, one entry per violated rule.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::types::CreateTodo;

pub const TITLE_MIN_CHARS: usize = 5;
pub const TITLE_MAX_CHARS: usize = 255;

/// One rule violation on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Ordered, never-empty list of field errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Returns `None` when `errors` is empty.
    pub fn from_vec(errors: Vec<FieldError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self { errors })
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Messages for `field`, in order.
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.errors
            .iter()
            .filter(move |e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn into_vec(self) -> Vec<FieldError> {
        self.errors
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        write!(f, "{}", joined.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Validate a candidate create payload.
pub fn validate_create_todo(input: &Value) -> Result<CreateTodo, ValidationErrors> {
    let Some(object) = input.as_object() else {
        return Err(ValidationErrors {
            errors: vec![FieldError::new("", "expected an object")],
        });
    };

    let mut errors = Vec::new();
    let title = match object.get("title") {
        None | Some(Value::Null) => {
            errors.push(FieldError::new("title", "is required"));
            None
        }
        Some(Value::String(title)) => {
            errors.extend(check_title(title));
            Some(title.clone())
        }
        Some(_) => {
            errors.push(FieldError::new("title", "expected a string"));
            None
        }
    };

    match (ValidationErrors::from_vec(errors), title) {
        (Some(errors), _) => Err(errors),
        (None, Some(title)) => Ok(CreateTodo { title }),
        (None, None) => Err(ValidationErrors {
            errors: vec![FieldError::new("title", "is required")],
        }),
    }
}

fn check_title(title: &str) -> Vec<FieldError> {
    let chars = title.chars().count();
    let mut errors = Vec::new();
    if chars < TITLE_MIN_CHARS {
        errors.push(FieldError::new(
            "title",
            format!("must be at least {TITLE_MIN_CHARS} characters"),
        ));
    }
    if chars > TITLE_MAX_CHARS {
        errors.push(FieldError::new(
            "title",
            format!("must be at most {TITLE_MAX_CHARS} characters"),
        ));
    }
    errors
}
