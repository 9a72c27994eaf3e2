//! Ordered request/response/error interceptor chains.
//!
//! # Design
//! Each chain is a list of boxed closures applied in registration order. An
//! empty chain is the identity, so a client with no interceptors behaves
//! exactly like one built before interceptors existed. Interceptors replace
//! the value they receive; they cannot change the shape of an operation.

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

type RequestFn = Box<dyn Fn(HttpRequest) -> HttpRequest + Send + Sync>;
type ResponseFn = Box<dyn Fn(HttpResponse, &HttpRequest) -> HttpResponse + Send + Sync>;
type ErrorFn = Box<dyn Fn(ApiError) -> ApiError + Send + Sync>;

/// The three interceptor chains attached to a `TodoClient`.
#[derive(Default)]
pub struct Interceptors {
    request: Vec<RequestFn>,
    response: Vec<ResponseFn>,
    error: Vec<ErrorFn>,
}

impl Interceptors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a request interceptor. Runs before the request reaches the host.
    pub fn on_request<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(HttpRequest) -> HttpRequest + Send + Sync + 'static,
    {
        self.request.push(Box::new(f));
        self
    }

    /// Register a response interceptor. Runs on every response before parsing.
    pub fn on_response<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(HttpResponse, &HttpRequest) -> HttpResponse + Send + Sync + 'static,
    {
        self.response.push(Box::new(f));
        self
    }

    /// Register an error interceptor. Runs on every failure before the caller sees it.
    pub fn on_error<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(ApiError) -> ApiError + Send + Sync + 'static,
    {
        self.error.push(Box::new(f));
        self
    }

    pub fn apply_request(&self, request: HttpRequest) -> HttpRequest {
        self.request.iter().fold(request, |req, f| f(req))
    }

    pub fn apply_response(&self, response: HttpResponse, request: &HttpRequest) -> HttpResponse {
        self.response.iter().fold(response, |resp, f| f(resp, request))
    }

    pub fn apply_error(&self, error: ApiError) -> ApiError {
        self.error.iter().fold(error, |err, f| f(err))
    }

    pub fn is_empty(&self) -> bool {
        self.request.is_empty() && self.response.is_empty() && self.error.is_empty()
    }
}

impl std::fmt::Debug for Interceptors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interceptors")
            .field("request", &self.request.len())
            .field("response", &self.response.len())
            .field("error", &self.error.len())
            .finish()
    }
}
