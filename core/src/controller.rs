//! Lifecycle of one logical request.
//!
//! # Design
//! A controller owns a [`RequestState`] behind a `tokio::sync::watch`
//! channel: `state()` reads the latest snapshot and `subscribe()` observes
//! every change. All mutation goes through `send_modify`, so the channel
//! works whether or not anyone is subscribed.
//!
//! `trigger` is deliberately not an `async fn`. Building the configuration,
//! raising `loading` and spawning the request onto the current tokio runtime
//! all happen when it is called. The spawned task settles the state whether
//! or not the returned future is awaited; dropping that future only stops
//! the caller from seeing the result. An issued request cannot be aborted.
//!
//! Overlapping triggers are not sequenced: each settlement lowers `loading`
//! and the last one to settle decides `data`, `status`, `response`, `error`.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, warn};
use serde_json::Value;
use tokio::sync::watch;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::config::{ConfigScope, RequestConfig};
use crate::descriptor::RequestDescriptor;
use crate::error::RequestError;
use crate::http::HttpResponse;
use crate::state::RequestState;
use crate::transport::Transport;

/// Manages one request described by a [`RequestDescriptor`].
///
/// Cloning yields another handle to the same instance.
#[derive(Clone)]
pub struct RequestController {
    inner: Arc<Inner>,
}

struct Inner {
    descriptor: RequestDescriptor,
    scope: ConfigScope,
    transport: Arc<dyn Transport>,
    state: watch::Sender<RequestState>,
    mounted: AtomicBool,
    disposed: AtomicBool,
}

impl RequestController {
    /// Build a controller without issuing anything.
    pub fn new(
        descriptor: RequestDescriptor,
        scope: &ConfigScope,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let (state, _) = watch::channel(RequestState::seeded(descriptor.default_data.clone()));
        Self {
            inner: Arc::new(Inner {
                descriptor,
                scope: scope.clone(),
                transport,
                state,
                mounted: AtomicBool::new(false),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    /// Build and mount a controller.
    ///
    /// Fails with [`RequestError::NoRuntime`] when the descriptor asks for an
    /// automatic trigger and no tokio runtime is running.
    pub fn create(
        descriptor: RequestDescriptor,
        scope: &ConfigScope,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, RequestError> {
        let controller = Self::new(descriptor, scope, transport);
        controller.mount()?;
        Ok(controller)
    }

    /// Run the one-shot automatic trigger.
    ///
    /// Returns the spawned task the first time it is called on a controller
    /// whose descriptor has `auto_trigger` set, and `None` on every other
    /// call. `loading` is already true when this returns `Some`. Without a
    /// running runtime nothing is issued and a later call may still mount.
    pub fn mount(&self) -> Result<Option<JoinHandle<()>>, RequestError> {
        if !self.inner.descriptor.auto_trigger {
            return Ok(None);
        }
        let handle = Handle::try_current().map_err(|_| RequestError::NoRuntime)?;
        if self.inner.mounted.swap(true, Ordering::SeqCst) {
            return Ok(None);
        }

        let pending = self.trigger(None);
        let url = self.inner.descriptor.url.clone();
        Ok(Some(handle.spawn(async move {
            if let Err(e) = pending.await {
                warn!("automatic request to {url} failed: {e}");
            }
        })))
    }

    /// Issue one request attempt.
    ///
    /// `payload` overrides the descriptor's `body_data`. The configuration is
    /// read from the scope, `loading` is raised and the request is spawned
    /// before this returns. The returned future resolves with the response
    /// body or the error recorded in the state.
    ///
    /// Outside a tokio runtime the attempt settles at once with
    /// [`RequestError::NoRuntime`].
    pub fn trigger(
        &self,
        payload: Option<Value>,
    ) -> impl Future<Output = Result<Value, RequestError>> + Send + 'static {
        let config = self.effective_config(payload);
        debug!(
            "issuing {} {}",
            self.inner.descriptor.method, self.inner.descriptor.url
        );
        self.inner.update(|state| state.loading = true);

        let task = match Handle::try_current() {
            Ok(handle) => {
                let inner = Arc::clone(&self.inner);
                Ok(handle.spawn(async move {
                    let result = inner.transport.execute(&config).await;
                    inner.settle(result)
                }))
            }
            Err(_) => Err(self.inner.settle(Err(RequestError::NoRuntime))),
        };

        let inner = Arc::clone(&self.inner);
        async move {
            match task {
                Ok(task) => match task.await {
                    Ok(result) => result,
                    // The task never reached settlement, so settle here.
                    Err(e) => inner.settle(Err(RequestError::Task(e.to_string()))),
                },
                Err(result) => result,
            }
        }
    }

    /// The merged configuration a trigger with `payload` would send.
    pub fn effective_config(&self, payload: Option<Value>) -> RequestConfig {
        let descriptor = &self.inner.descriptor;
        let overrides = descriptor.request_config(descriptor.outbound_payload(payload));
        self.inner.scope.current().merged(&overrides)
    }

    pub fn state(&self) -> RequestState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState> {
        self.inner.state.subscribe()
    }

    pub fn descriptor(&self) -> &RequestDescriptor {
        &self.inner.descriptor
    }

    /// Make the instance inert. Settlements arriving afterwards still
    /// resolve their futures but leave the state untouched.
    pub fn dispose(&self) {
        self.inner.disposed.store(true, Ordering::SeqCst);
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }
}

impl Inner {
    fn update(&self, apply: impl FnOnce(&mut RequestState)) {
        if self.disposed.load(Ordering::SeqCst) {
            debug!("ignoring state change on disposed controller for {}", self.descriptor.url);
            return;
        }
        self.state.send_modify(apply);
    }

    fn settle(&self, result: Result<HttpResponse, RequestError>) -> Result<Value, RequestError> {
        let (method, url) = (self.descriptor.method, &self.descriptor.url);
        match &result {
            Ok(response) => debug!("{method} {url} settled with {}", response.status),
            Err(e) => debug!("{method} {url} failed: {e}"),
        }
        self.update(|state| {
            match &result {
                Ok(response) => {
                    state.data = Some(response.body.clone());
                    state.status = Some(response.status);
                    state.response = Some(response.clone());
                }
                Err(e) => state.error = Some(e.clone()),
            }
            state.loading = false;
            state.initial_load = false;
        });
        result.map(|response| response.body)
    }
}
