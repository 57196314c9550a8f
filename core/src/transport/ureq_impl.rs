use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use ureq::typestate::WithBody;
use ureq::RequestBuilder;

use super::{finish, PreparedBody, PreparedRequest, Transport};
use crate::config::RequestConfig;
use crate::error::RequestError;
use crate::http::{HttpMethod, HttpResponse};

/// Blocking transport built on ureq.
///
/// Each request runs on tokio's blocking pool. One agent, and so one
/// connection pool, is shared by every clone. Status codes are returned as
/// data by the agent and interpreted here, so 4xx/5xx carry their response.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Timeout applied when the request configuration sets none.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::build(Some(timeout))
    }

    fn build(default_timeout: Option<Duration>) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(default_timeout)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply headers, query parameters and the per-request timeout, whatever
/// the body typestate.
fn decorate<B>(mut builder: RequestBuilder<B>, request: &PreparedRequest) -> RequestBuilder<B> {
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    for (name, value) in &request.params {
        builder = builder.query(name, value);
    }
    if let Some(timeout) = request.timeout {
        builder = builder.config().timeout_global(Some(timeout)).build();
    }
    builder
}

fn send(
    builder: RequestBuilder<WithBody>,
    body: Option<&PreparedBody>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(body) => {
            let builder = match body.content_type {
                Some(content_type) => builder.content_type(content_type),
                None => builder,
            };
            builder.send(&body.bytes[..])
        }
        None => builder.send_empty(),
    }
}

fn execute_blocking(
    agent: &ureq::Agent,
    request: PreparedRequest,
) -> Result<HttpResponse, RequestError> {
    let url = request.url.as_str();
    let body = request.body.as_ref();
    // Bodiless methods still carry an explicit payload.
    let result = match request.method {
        HttpMethod::Get => match body {
            Some(_) => send(decorate(agent.get(url), &request).force_send_body(), body),
            None => decorate(agent.get(url), &request).call(),
        },
        HttpMethod::Options => match body {
            Some(_) => send(decorate(agent.options(url), &request).force_send_body(), body),
            None => decorate(agent.options(url), &request).call(),
        },
        HttpMethod::Delete => match body {
            Some(_) => send(decorate(agent.delete(url), &request).force_send_body(), body),
            None => decorate(agent.delete(url), &request).call(),
        },
        HttpMethod::Post => send(decorate(agent.post(url), &request), body),
        HttpMethod::Patch => send(decorate(agent.patch(url), &request), body),
        HttpMethod::Put => send(decorate(agent.put(url), &request), body),
    };

    let mut response = result.map_err(|e| match e {
        ureq::Error::Timeout(_) => RequestError::Timeout,
        ureq::Error::BadUri(reason) => RequestError::InvalidUrl {
            url: request.url.clone(),
            reason,
        },
        other => RequestError::Network(other.to_string()),
    })?;

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
    let raw = response
        .body_mut()
        .read_to_vec()
        .map_err(|e| RequestError::ResponseBody(e.to_string()))?;

    finish(status, headers, &raw)
}

#[async_trait]
impl Transport for UreqTransport {
    async fn execute(&self, config: &RequestConfig) -> Result<HttpResponse, RequestError> {
        let request = PreparedRequest::from_config(config)?;
        debug!("ureq {} {}", request.method, request.url);

        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || execute_blocking(&agent, request))
            .await
            .map_err(|e| RequestError::Task(e.to_string()))?
    }
}
