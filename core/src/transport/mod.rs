//! The outbound HTTP seam.
//!
//! # Design
//! The controller only needs "send this merged configuration and give me a
//! response or an error", so that is the whole trait. Any HTTP library can sit
//! behind it; two are shipped behind cargo features:
//!
//! - `ReqwestTransport` (`reqwest-transport`): fully async.
//! - `UreqTransport` (`ureq-transport`): blocking `ureq`, moved onto tokio's
//!   blocking pool so it never stalls the runtime.
//!
//! Both read the same keys from [`RequestConfig`] through [`PreparedRequest`]
//! and both reject non-2xx responses with [`RequestError::Status`].

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::RequestConfig;
use crate::error::RequestError;
use crate::http::{decode_body, HttpMethod, HttpResponse};

#[cfg(feature = "reqwest-transport")]
mod reqwest_impl;
#[cfg(feature = "ureq-transport")]
mod ureq_impl;

#[cfg(feature = "reqwest-transport")]
pub use reqwest_impl::ReqwestTransport;
#[cfg(feature = "ureq-transport")]
pub use ureq_impl::UreqTransport;

/// Executes one request described by a merged configuration.
///
/// Implementations should resolve the url with
/// [`RequestConfig::full_url`], honour `headers`, `params` and `timeout`, and
/// return `Err` for anything that is not a 2xx response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, config: &RequestConfig) -> Result<HttpResponse, RequestError>;
}

/// A request body ready for the wire.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PreparedBody {
    /// `None` when the caller already set a content-type header.
    pub content_type: Option<&'static str>,
    pub bytes: Vec<u8>,
}

/// The parts of a [`RequestConfig`] the shipped transports understand.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PreparedRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub params: Vec<(String, String)>,
    pub timeout: Option<Duration>,
    pub body: Option<PreparedBody>,
}

impl PreparedRequest {
    pub fn from_config(config: &RequestConfig) -> Result<Self, RequestError> {
        let method = match config.method() {
            Some(method) => method.parse()?,
            None => HttpMethod::Get,
        };
        let url = config.full_url().ok_or(RequestError::MissingUrl)?;
        let headers = config.headers();
        let has_content_type = headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case("content-type"));

        let body = match config.data() {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(PreparedBody {
                content_type: (!has_content_type).then_some("text/plain; charset=utf-8"),
                bytes: text.clone().into_bytes(),
            }),
            Some(value) => Some(PreparedBody {
                content_type: (!has_content_type).then_some("application/json"),
                bytes: serde_json::to_vec(value)?,
            }),
        };

        Ok(Self {
            method,
            url,
            headers,
            params: config.params(),
            timeout: config.timeout(),
            body,
        })
    }
}

/// Build the response and map non-success status codes to an error.
pub(crate) fn finish(
    status: u16,
    headers: Vec<(String, String)>,
    raw: &[u8],
) -> Result<HttpResponse, RequestError> {
    let response = HttpResponse {
        status,
        headers,
        body: decode_body(raw),
    };
    if response.is_success() {
        Ok(response)
    } else {
        Err(RequestError::Status { response })
    }
}
