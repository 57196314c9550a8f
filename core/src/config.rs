//! Transport configuration and the ambient scope it is inherited from.
//!
//! # Design
//! `RequestConfig` is an open JSON object rather than a struct. Ambient
//! configuration may carry options only a particular transport understands,
//! and merging must be a plain shallow key overwrite. Typed accessors cover
//! the keys the shipped transports read.
//!
//! `ConfigScope` replaces an inherited UI context. A scope is a node in a
//! stack: `provide` pushes a child, and `current` folds the stack from the
//! root down so the nearest scope wins on key collision. Each node keeps its
//! own value in an `ArcSwap` so `set` is visible to every controller holding
//! the scope on its next trigger without taking a lock.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const METHOD: &str = "method";
pub const URL: &str = "url";
pub const DATA: &str = "data";
pub const BASE_URL: &str = "baseURL";
pub const HEADERS: &str = "headers";
pub const PARAMS: &str = "params";
/// Milliseconds; `0` disables the timeout.
pub const TIMEOUT: &str = "timeout";

/// A shallow-mergeable map of transport options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestConfig(Map<String, Value>);

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.0.insert(BASE_URL.to_string(), Value::String(base_url.into()));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        object_entry(&mut self.0, HEADERS).insert(name.into(), Value::String(value.into()));
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        object_entry(&mut self.0, PARAMS).insert(name.into(), Value::String(value.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self.0.insert(TIMEOUT.to_string(), Value::from(millis));
        self
    }

    /// Shallow merge: every key of `overrides` replaces the same key here.
    pub fn merged(&self, overrides: &RequestConfig) -> RequestConfig {
        let mut out = self.0.clone();
        for (key, value) in &overrides.0 {
            out.insert(key.clone(), value.clone());
        }
        RequestConfig(out)
    }

    pub fn method(&self) -> Option<&str> {
        self.0.get(METHOD).and_then(Value::as_str)
    }

    pub fn url(&self) -> Option<&str> {
        self.0.get(URL).and_then(Value::as_str)
    }

    pub fn data(&self) -> Option<&Value> {
        self.0.get(DATA)
    }

    pub fn base_url(&self) -> Option<&str> {
        self.0.get(BASE_URL).and_then(Value::as_str)
    }

    /// Header pairs; non-string values are rendered as JSON, `null` is skipped.
    pub fn headers(&self) -> Vec<(String, String)> {
        string_pairs(self.0.get(HEADERS))
    }

    pub fn params(&self) -> Vec<(String, String)> {
        string_pairs(self.0.get(PARAMS))
    }

    pub fn timeout(&self) -> Option<Duration> {
        match self.0.get(TIMEOUT).and_then(Value::as_u64) {
            Some(0) | None => None,
            Some(millis) => Some(Duration::from_millis(millis)),
        }
    }

    /// Resolve `url` against `baseURL`.
    ///
    /// Returns `None` when neither is set.
    pub fn full_url(&self) -> Option<String> {
        let url = self.url().unwrap_or("");
        let base = self.base_url().unwrap_or("");
        if is_absolute_url(url) || base.is_empty() {
            return (!url.is_empty()).then(|| url.to_string());
        }
        if url.is_empty() {
            return Some(base.to_string());
        }
        Some(format!(
            "{}/{}",
            base.trim_end_matches('/'),
            url.trim_start_matches('/')
        ))
    }
}

impl From<Map<String, Value>> for RequestConfig {
    fn from(map: Map<String, Value>) -> Self {
        RequestConfig(map)
    }
}

impl From<RequestConfig> for Value {
    fn from(config: RequestConfig) -> Self {
        Value::Object(config.0)
    }
}

/// Scheme-qualified (`http://...`) or protocol-relative (`//host/...`).
fn is_absolute_url(url: &str) -> bool {
    if url.starts_with("//") {
        return true;
    }
    let Some((scheme, _)) = url.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn object_entry<'a>(map: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    let slot = map
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    match slot {
        Value::Object(inner) => inner,
        _ => unreachable!("slot was just replaced with an object"),
    }
}

fn string_pairs(value: Option<&Value>) -> Vec<(String, String)> {
    let Some(Value::Object(map)) = value else {
        return Vec::new();
    };
    map.iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect()
}

/// Ambient configuration for a subtree of controllers.
///
/// Cloning a scope yields another handle to the same node.
#[derive(Debug, Clone)]
pub struct ConfigScope {
    node: Arc<ScopeNode>,
}

#[derive(Debug)]
struct ScopeNode {
    parent: Option<Arc<ScopeNode>>,
    config: ArcSwap<RequestConfig>,
}

impl ConfigScope {
    /// A root scope with nothing established.
    pub fn new() -> Self {
        Self::with_config(RequestConfig::new())
    }

    pub fn with_config(config: RequestConfig) -> Self {
        Self {
            node: Arc::new(ScopeNode {
                parent: None,
                config: ArcSwap::from_pointee(config),
            }),
        }
    }

    /// Establish `config` for a child scope. Any subset of options may be
    /// given; the rest is inherited from this scope.
    pub fn provide(&self, config: RequestConfig) -> ConfigScope {
        ConfigScope {
            node: Arc::new(ScopeNode {
                parent: Some(Arc::clone(&self.node)),
                config: ArcSwap::from_pointee(config),
            }),
        }
    }

    /// Replace this scope's own value.
    pub fn set(&self, config: RequestConfig) {
        self.node.config.store(Arc::new(config));
    }

    /// The value this scope established, without its ancestors.
    pub fn own(&self) -> Arc<RequestConfig> {
        self.node.config.load_full()
    }

    /// The effective inherited value. Empty when no scope established anything.
    pub fn current(&self) -> RequestConfig {
        let mut chain = Vec::new();
        let mut node = Some(&self.node);
        while let Some(current) = node {
            chain.push(current.config.load_full());
            node = current.parent.as_ref();
        }
        chain
            .iter()
            .rev()
            .fold(RequestConfig::new(), |acc, config| acc.merged(config))
    }
}

impl Default for ConfigScope {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(value: Value) -> RequestConfig {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn merge_is_shallow_and_override_wins() {
        let base = config(json!({
            "baseURL": "http://api",
            "headers": {"authorization": "Bearer a", "x-tenant": "t1"},
            "timeout": 1000
        }));
        let overrides = config(json!({"headers": {"x-trace": "1"}, "timeout": 5}));
        let merged = base.merged(&overrides);

        assert_eq!(merged.base_url(), Some("http://api"));
        assert_eq!(merged.headers(), vec![("x-trace".to_string(), "1".to_string())]);
        assert_eq!(merged.timeout(), Some(Duration::from_millis(5)));
    }

    #[test]
    fn full_url_joins_relative_url_to_base() {
        let c = RequestConfig::new().with_base_url("http://localhost:3000/");
        let mut with_url = c.clone();
        with_url.insert(URL, json!("/users"));
        assert_eq!(with_url.full_url().as_deref(), Some("http://localhost:3000/users"));

        let mut bare = c.clone();
        bare.insert(URL, json!("users"));
        assert_eq!(bare.full_url().as_deref(), Some("http://localhost:3000/users"));
    }

    #[test]
    fn full_url_keeps_absolute_url() {
        let mut c = RequestConfig::new().with_base_url("http://ignored");
        c.insert(URL, json!("https://example.com/x"));
        assert_eq!(c.full_url().as_deref(), Some("https://example.com/x"));

        c.insert(URL, json!("//cdn.example.com/y"));
        assert_eq!(c.full_url().as_deref(), Some("//cdn.example.com/y"));
    }

    #[test]
    fn full_url_without_url_or_base_is_none() {
        let mut c = RequestConfig::new();
        assert_eq!(c.full_url(), None);
        c.insert(URL, json!(""));
        assert_eq!(c.full_url(), None);
        let c = c.with_base_url("http://base");
        assert_eq!(c.full_url().as_deref(), Some("http://base"));
    }

    #[test]
    fn headers_render_non_string_values_and_skip_null() {
        let c = config(json!({"headers": {"x-num": 7, "x-null": null, "x-str": "s"}}));
        let mut headers = c.headers();
        headers.sort();
        assert_eq!(
            headers,
            vec![
                ("x-num".to_string(), "7".to_string()),
                ("x-str".to_string(), "s".to_string()),
            ]
        );
    }

    #[test]
    fn builders_accumulate_headers_and_params() {
        let c = RequestConfig::new()
            .with_header("a", "1")
            .with_header("b", "2")
            .with_param("page", "3")
            .with_timeout(Duration::ZERO);
        assert_eq!(c.headers().len(), 2);
        assert_eq!(c.params(), vec![("page".to_string(), "3".to_string())]);
        assert_eq!(c.timeout(), None);
    }

    #[test]
    fn empty_scope_yields_empty_config() {
        assert!(ConfigScope::new().current().is_empty());
    }

    #[test]
    fn nearest_scope_wins_and_inherits_the_rest() {
        let root = ConfigScope::with_config(
            RequestConfig::new()
                .with_base_url("http://root")
                .with_header("authorization", "root"),
        );
        let child = root.provide(RequestConfig::new().with_header("x-child", "yes"));

        let current = child.current();
        assert_eq!(current.base_url(), Some("http://root"));
        assert_eq!(current.headers(), vec![("x-child".to_string(), "yes".to_string())]);
        assert_eq!(root.current().headers()[0].1, "root");
    }

    #[test]
    fn set_is_visible_through_children_and_clones() {
        let root = ConfigScope::new();
        let child = root.provide(RequestConfig::new());
        let handle = root.clone();

        handle.set(RequestConfig::new().with_base_url("http://later"));

        assert_eq!(child.current().base_url(), Some("http://later"));
        assert_eq!(root.own().base_url(), Some("http://later"));
    }
}
