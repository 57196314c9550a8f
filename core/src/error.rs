//! Error type for request attempts.
//!
//! # Design
//! The controller treats every failure the same way: store it in `error` and
//! hand the same value back to the caller. That is why `RequestError` is
//! `Clone` and keeps external errors as strings. The variants exist for the
//! transports and for callers that want to render failures differently.

use thiserror::Error;

use crate::http::HttpResponse;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    /// The configured method is not one a transport can send.
    #[error("invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// Neither `url` nor `baseURL` was set.
    #[error("request has no url")]
    MissingUrl,

    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The request never produced a response (connection refused, DNS, TLS...).
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    /// The server answered with a non-2xx status.
    #[error("request failed with status code {}", .response.status)]
    Status { response: HttpResponse },

    #[error("failed to read response body: {0}")]
    ResponseBody(String),

    /// The payload or a configuration value could not be encoded.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The request needs a tokio runtime and none was running.
    #[error("no tokio runtime is running")]
    NoRuntime,

    /// The task carrying the request panicked or was shut down.
    #[error("request task failed: {0}")]
    Task(String),
}

impl RequestError {
    /// Status code of the response that caused this error, if there was one.
    pub fn status(&self) -> Option<u16> {
        self.response().map(|response| response.status)
    }

    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            RequestError::Status { response } => Some(response),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for RequestError {
    fn from(e: serde_json::Error) -> Self {
        RequestError::Serialization(e.to_string())
    }
}
