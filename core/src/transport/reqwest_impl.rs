use async_trait::async_trait;
use log::debug;

use super::{finish, PreparedRequest, Transport};
use crate::config::RequestConfig;
use crate::error::RequestError;
use crate::http::{HttpMethod, HttpResponse};

/// Async transport built on reqwest.
///
/// Shares one connection pool across every controller that holds it, so
/// create one and hand out clones.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use request_core::{ConfigScope, RequestController, RequestDescriptor, ReqwestTransport};
///
/// let transport = Arc::new(ReqwestTransport::new());
/// let scope = ConfigScope::new();
/// let users = RequestController::create(RequestDescriptor::get("/users"), &scope, transport);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client (proxies, TLS roots, default timeout...).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Options => reqwest::Method::OPTIONS,
    }
}

fn map_send_error(url: &str, e: reqwest::Error) -> RequestError {
    if e.is_timeout() {
        RequestError::Timeout
    } else if e.is_builder() {
        RequestError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        }
    } else {
        RequestError::Network(e.to_string())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, config: &RequestConfig) -> Result<HttpResponse, RequestError> {
        let request = PreparedRequest::from_config(config)?;
        debug!("reqwest {} {}", request.method, request.url);

        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = request.body {
            if let Some(content_type) = body.content_type {
                builder = builder.header(reqwest::header::CONTENT_TYPE, content_type);
            }
            builder = builder.body(body.bytes);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| map_send_error(&request.url, e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let raw = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                RequestError::Timeout
            } else {
                RequestError::ResponseBody(e.to_string())
            }
        })?;

        finish(status, headers, &raw)
    }
}
