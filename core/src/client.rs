//! HTTP request builder and response parser for the todo API.
//!
//! # Design
//! `TodoClient` holds its configuration and interceptor chains and carries
//! no mutable state between calls. Each CRUD operation is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method
//! that consumes an `HttpResponse`. The convenience operations (`list`,
//! `create`, `update`, `destroy`) run the whole round-trip through a
//! `Transport`; the app runtime uses the split methods so the host can
//! perform the I/O itself.

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ApiError;
use crate::http::{CredentialsMode, HttpMethod, HttpRequest, HttpResponse};
use crate::interceptor::Interceptors;
use crate::transport::Transport;
use crate::types::{CreateTodo, Todo, TodoId, UpdateTodo};

/// Where the backend lives and whether credentials travel with requests.
/// Fixed once at process start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub credentials: CredentialsMode,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            credentials: CredentialsMode::Include,
        }
    }
}

/// Typed client for the todo collection resource.
#[derive(Debug)]
pub struct TodoClient {
    base_url: String,
    credentials: CredentialsMode,
    interceptors: Interceptors,
}

impl TodoClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials: config.credentials,
            interceptors: Interceptors::new(),
        }
    }

    pub fn with_interceptors(mut self, interceptors: Interceptors) -> Self {
        self.interceptors = interceptors;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: HttpMethod, path: String, body: Option<String>) -> HttpRequest {
        let headers = if body.is_some() {
            vec![("content-type".to_string(), "application/json".to_string())]
        } else {
            Vec::new()
        };
        HttpRequest {
            method,
            path,
            headers,
            body,
            credentials: self.credentials,
        }
    }

    pub fn build_list_todos(&self) -> HttpRequest {
        self.request(HttpMethod::Get, format!("{}/todos", self.base_url), None)
    }

    pub fn build_get_todo(&self, id: TodoId) -> HttpRequest {
        self.request(HttpMethod::Get, format!("{}/todos/{id}", self.base_url), None)
    }

    pub fn build_create_todo(&self, input: &CreateTodo) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::Serialize(e.to_string()))?;
        Ok(self.request(HttpMethod::Post, format!("{}/todos", self.base_url), Some(body)))
    }

    pub fn build_update_todo(&self, id: TodoId, input: &UpdateTodo) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::Serialize(e.to_string()))?;
        Ok(self.request(
            HttpMethod::Put,
            format!("{}/todos/{id}", self.base_url),
            Some(body),
        ))
    }

    pub fn build_delete_todo(&self, id: TodoId) -> HttpRequest {
        self.request(HttpMethod::Delete, format!("{}/todos/{id}", self.base_url), None)
    }

    pub fn parse_list_todos(&self, response: HttpResponse) -> Result<Vec<Todo>, ApiError> {
        check_status(&response, 200)?;
        parse_body(&response)
    }

    pub fn parse_get_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        check_status(&response, 200)?;
        parse_body(&response)
    }

    pub fn parse_create_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        check_status(&response, 201)?;
        parse_body(&response)
    }

    pub fn parse_update_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        check_status(&response, 200)?;
        parse_body(&response)
    }

    pub fn parse_delete_todo(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 204)?;
        Ok(())
    }

    /// Run the request chain over a freshly built request.
    pub fn prepare(&self, request: HttpRequest) -> HttpRequest {
        self.interceptors.apply_request(request)
    }

    /// Run the response or error chain over the outcome of `request`, then
    /// parse it with `parse`. Every error leaving this method has passed
    /// through the error chain.
    pub fn receive<T>(
        &self,
        request: &HttpRequest,
        outcome: Result<HttpResponse, ApiError>,
        parse: impl FnOnce(&Self, HttpResponse) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let parsed = outcome.and_then(|response| {
            let response = self.interceptors.apply_response(response, request);
            debug!(status = response.status, url = %request.path, "received response");
            parse(self, response)
        });
        parsed.map_err(|e| self.intercept_error(e))
    }

    /// Run the error chain over a failure that happened before any request
    /// was sent.
    pub fn intercept_error(&self, error: ApiError) -> ApiError {
        self.interceptors.apply_error(error)
    }

    fn round_trip<T>(
        &self,
        transport: &impl Transport,
        built: Result<HttpRequest, ApiError>,
        parse: impl FnOnce(&Self, HttpResponse) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let request = self.prepare(built.map_err(|e| self.intercept_error(e))?);
        let outcome = transport.execute(request.clone()).map_err(ApiError::from);
        self.receive(&request, outcome, parse)
    }

    pub fn list(&self, transport: &impl Transport) -> Result<Vec<Todo>, ApiError> {
        self.round_trip(transport, Ok(self.build_list_todos()), Self::parse_list_todos)
    }

    pub fn get(&self, transport: &impl Transport, id: TodoId) -> Result<Todo, ApiError> {
        self.round_trip(transport, Ok(self.build_get_todo(id)), Self::parse_get_todo)
    }

    pub fn create(&self, transport: &impl Transport, title: &str) -> Result<Todo, ApiError> {
        let input = CreateTodo {
            title: title.to_string(),
        };
        self.round_trip(transport, self.build_create_todo(&input), Self::parse_create_todo)
    }

    /// Replace the `completed` field of todo `id`.
    pub fn update(&self, transport: &impl Transport, id: TodoId, completed: bool) -> Result<Todo, ApiError> {
        let input = UpdateTodo::completed(completed);
        self.round_trip(transport, self.build_update_todo(id, &input), Self::parse_update_todo)
    }

    pub fn destroy(&self, transport: &impl Transport, id: TodoId) -> Result<(), ApiError> {
        self.round_trip(transport, Ok(self.build_delete_todo(id)), Self::parse_delete_todo)
    }
}

fn parse_body<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialize(e.to_string()))
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}
