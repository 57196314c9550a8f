//! Read-only snapshot of a controller's request lifecycle.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::RequestError;
use crate::http::HttpResponse;

/// State published by a [`RequestController`](crate::RequestController).
///
/// `data`, `status` and `response` change together on success only; `error`
/// changes on failure only. Neither outcome clears the other side.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestState {
    /// True until the first trigger settles, then false for good.
    pub initial_load: bool,
    /// True between a trigger call and its settlement.
    pub loading: bool,
    pub data: Option<Value>,
    pub error: Option<RequestError>,
    pub status: Option<u16>,
    pub response: Option<HttpResponse>,
}

impl RequestState {
    pub fn seeded(default_data: Option<Value>) -> Self {
        Self {
            initial_load: true,
            loading: false,
            data: default_data,
            error: None,
            status: None,
            response: None,
        }
    }

    pub fn pending_or_loading(&self) -> bool {
        self.initial_load || self.loading
    }

    /// Decode `data` into `T`. `None` while there is no data.
    pub fn data_as<T: DeserializeOwned>(&self) -> Option<Result<T, RequestError>> {
        self.data
            .clone()
            .map(|data| serde_json::from_value(data).map_err(RequestError::from))
    }
}

impl Default for RequestState {
    fn default() -> Self {
        Self::seeded(None)
    }
}
