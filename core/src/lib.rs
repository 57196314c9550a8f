//! Request lifecycle state for UI bindings.
//!
//! # Overview
//! A [`RequestController`] wraps one outbound HTTP call described by a
//! [`RequestDescriptor`]. It tracks the call's lifecycle (not yet triggered,
//! loading, success or error) in a [`RequestState`] snapshot and exposes a
//! `trigger` method to issue the call, optionally firing once on mount.
//!
//! # Design
//! - Ambient defaults (base URL, headers, timeout...) come from a
//!   [`ConfigScope`] passed in at construction and read on every trigger.
//!   They are shallow-merged under the per-call `{method, url, data}`.
//! - The HTTP round-trip is delegated to a [`Transport`]; reqwest and ureq
//!   implementations ship behind cargo features.
//! - There is no retry, cancellation, caching or deduplication. Every failure
//!   is local to one trigger and recoverable by triggering again.

pub mod config;
pub mod controller;
pub mod descriptor;
pub mod error;
pub mod http;
pub mod state;
pub mod transport;

pub use config::{ConfigScope, RequestConfig};
pub use controller::RequestController;
pub use descriptor::RequestDescriptor;
pub use error::RequestError;
pub use http::{HttpMethod, HttpResponse};
pub use state::RequestState;
pub use transport::Transport;

#[cfg(feature = "reqwest-transport")]
pub use transport::ReqwestTransport;
#[cfg(feature = "ureq-transport")]
pub use transport::UreqTransport;
