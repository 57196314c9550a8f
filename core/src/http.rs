//! HTTP vocabulary shared by the controller and its transports.
//!
//! # Design
//! Requests are not modelled as a struct here: the controller hands the
//! transport a merged [`RequestConfig`](crate::config::RequestConfig) map and
//! the transport reads what it understands from it. Responses come back as
//! plain data so the controller can store them in its state snapshot.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RequestError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    #[serde(alias = "get")]
    Get,
    #[serde(alias = "post")]
    Post,
    #[serde(alias = "patch")]
    Patch,
    #[serde(alias = "put")]
    Put,
    #[serde(alias = "delete")]
    Delete,
    #[serde(alias = "options")]
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
        }
    }

    /// Whether a descriptor's `body_data` is sent when the trigger is called
    /// without an explicit payload.
    pub fn permits_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Patch | HttpMethod::Put)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PATCH" => Ok(HttpMethod::Patch),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "OPTIONS" => Ok(HttpMethod::Options),
            _ => Err(RequestError::InvalidMethod(s.to_string())),
        }
    }
}

/// An HTTP response described as plain data.
///
/// Built by a [`Transport`](crate::transport::Transport) after the round-trip
/// completes. `body` is already decoded, see [`decode_body`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header value matching `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Decode a raw response body.
///
/// Empty bodies become `null`, valid JSON is parsed, and anything else is
/// kept as a JSON string holding the raw text.
pub fn decode_body(raw: &[u8]) -> Value {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    match serde_json::from_slice(raw) {
        Ok(value) => value,
        Err(_) => Value::String(String::from_utf8_lossy(raw).into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn only_post_patch_put_permit_a_body() {
        assert!(HttpMethod::Post.permits_body());
        assert!(HttpMethod::Patch.permits_body());
        assert!(HttpMethod::Put.permits_body());
        assert!(!HttpMethod::Get.permits_body());
        assert!(!HttpMethod::Delete.permits_body());
        assert!(!HttpMethod::Options.permits_body());
    }

    #[test]
    fn method_parses_case_insensitively() {
        assert_eq!("patch".parse::<HttpMethod>().unwrap(), HttpMethod::Patch);
        assert_eq!("Options".parse::<HttpMethod>().unwrap(), HttpMethod::Options);
        let err = "FETCH".parse::<HttpMethod>().unwrap_err();
        assert_eq!(err, RequestError::InvalidMethod("FETCH".to_string()));
    }

    #[test]
    fn method_serde_uses_uppercase_and_accepts_lowercase() {
        assert_eq!(serde_json::to_value(HttpMethod::Delete).unwrap(), json!("DELETE"));
        let method: HttpMethod = serde_json::from_value(json!("put")).unwrap();
        assert_eq!(method, HttpMethod::Put);
    }

    #[test]
    fn default_method_is_get() {
        assert_eq!(HttpMethod::default(), HttpMethod::Get);
    }

    #[test]
    fn decode_body_handles_json_text_and_empty() {
        assert_eq!(decode_body(b""), Value::Null);
        assert_eq!(decode_body(b"  \n"), Value::Null);
        assert_eq!(decode_body(br#"{"ok":true}"#), json!({"ok": true}));
        assert_eq!(decode_body(b"plain text"), json!("plain text"));
    }

    #[test]
    fn header_lookup_ignores_case() {
        let response = HttpResponse {
            status: 200,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Value::Null,
        };
        assert_eq!(response.header("Content-Type"), Some("application/json"));
        assert!(response.header("x-missing").is_none());
        assert!(response.is_success());
    }
}
