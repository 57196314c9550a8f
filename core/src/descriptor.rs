//! Declarative description of the one request a controller manages.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{self, RequestConfig};
use crate::http::HttpMethod;

/// What to send, and whether to send it once on mount.
///
/// Nothing is validated here: an empty `url` fails when the request is
/// attempted, as any other transport failure would.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDescriptor {
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub url: String,
    /// Seed for `data` before any response arrives.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_data: Option<Value>,
    /// Payload for body-carrying methods when the trigger gets none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_data: Option<Value>,
    #[serde(default = "default_auto_trigger", alias = "asEffect")]
    pub auto_trigger: bool,
}

fn default_auto_trigger() -> bool {
    true
}

impl RequestDescriptor {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            default_data: None,
            body_data: None,
            auto_trigger: default_auto_trigger(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn with_default_data(mut self, data: Value) -> Self {
        self.default_data = Some(data);
        self
    }

    pub fn with_body_data(mut self, data: Value) -> Self {
        self.body_data = Some(data);
        self
    }

    pub fn with_auto_trigger(mut self, auto_trigger: bool) -> Self {
        self.auto_trigger = auto_trigger;
        self
    }

    /// The payload actually sent: an explicit one always wins, otherwise
    /// `body_data` for methods that carry a body, otherwise nothing.
    pub fn outbound_payload(&self, explicit: Option<Value>) -> Option<Value> {
        match explicit {
            Some(payload) => Some(payload),
            None if self.method.permits_body() => self.body_data.clone(),
            None => None,
        }
    }

    /// The per-call `{method, url, data}` layer merged over ambient config.
    ///
    /// `data` is always present so an ambient `data` key never leaks into a
    /// call that has no payload.
    pub fn request_config(&self, payload: Option<Value>) -> RequestConfig {
        let mut config = RequestConfig::new();
        config
            .insert(config::METHOD, Value::String(self.method.as_str().to_string()))
            .insert(config::URL, Value::String(self.url.clone()))
            .insert(config::DATA, payload.unwrap_or(Value::Null));
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_with_defaults() {
        let d: RequestDescriptor = serde_json::from_value(json!({"url": "/users"})).unwrap();
        assert_eq!(d.method, HttpMethod::Get);
        assert!(d.auto_trigger);
        assert!(d.default_data.is_none());
        assert!(d.body_data.is_none());
    }

    #[test]
    fn as_effect_is_an_alias_for_auto_trigger() {
        let d: RequestDescriptor = serde_json::from_value(json!({
            "method": "post",
            "url": "/users",
            "asEffect": false,
            "bodyData": {"name": "n"}
        }))
        .unwrap();
        assert_eq!(d.method, HttpMethod::Post);
        assert!(!d.auto_trigger);
        assert_eq!(d.body_data, Some(json!({"name": "n"})));
    }

    #[test]
    fn missing_url_is_not_rejected() {
        let d: RequestDescriptor = serde_json::from_value(json!({"method": "GET"})).unwrap();
        assert!(d.url.is_empty());
    }

    #[test]
    fn body_data_is_fallback_only_for_body_methods() {
        let post = RequestDescriptor::post("/users").with_body_data(json!({"name": "n"}));
        assert_eq!(post.outbound_payload(None), Some(json!({"name": "n"})));
        assert_eq!(
            post.outbound_payload(Some(json!({"name": "x"}))),
            Some(json!({"name": "x"}))
        );

        let get = RequestDescriptor::get("/users").with_body_data(json!({"ignored": true}));
        assert_eq!(get.outbound_payload(None), None);
        assert_eq!(get.outbound_payload(Some(json!(1))), Some(json!(1)));
    }

    #[test]
    fn request_config_carries_method_url_and_data() {
        let d = RequestDescriptor::new(HttpMethod::Patch, "/users/1");
        let config = d.request_config(Some(json!({"name": "p"})));
        assert_eq!(config.method(), Some("PATCH"));
        assert_eq!(config.url(), Some("/users/1"));
        assert_eq!(config.data(), Some(&json!({"name": "p"})));

        let empty = d.request_config(None);
        assert_eq!(empty.data(), Some(&Value::Null));
    }
}
