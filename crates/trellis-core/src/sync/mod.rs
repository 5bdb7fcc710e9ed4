//! Best-effort mirroring of plan mutations to a remote service.
//!
//! [`ExternalSync::notify`] never blocks and never fails. Events go into a
//! bounded queue drained by one background worker that runs at most
//! `max_in_flight` HTTP calls at a time. A full queue drops the event. There is
//! no retry, no ordering token and no delivery confirmation: the remote side
//! may see fast sequential mutations out of order. Short-lived processes call
//! [`ExternalSync::shutdown`] to give queued events a bounded grace period;
//! anything still pending after that is lost.
//!
//! | operation | request |
//! |---|---|
//! | create | `POST {server_url}/plans/{id}` with the plan as JSON body |
//! | update | `PUT {server_url}/plans/{id}` with the plan as JSON body |
//! | delete | `DELETE {server_url}/plans/{id}` |

use std::{fmt, time::Duration};

use log::debug;
use reqwest::{Method, Url};
use tokio::{runtime::Handle, sync::mpsc, task::JoinHandle};

use crate::{
    error::{PlanError, Result},
    models::Plan,
};

mod worker;

use worker::SyncWorker;

/// Remote endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Base URL; requests go to `{server_url}/plans/{plan_id}`
    pub server_url: String,
    /// Sent as `Authorization: Bearer <token>` when set
    pub api_token: Option<String>,
    /// Events buffered before new ones are dropped
    pub queue_capacity: usize,
    /// Concurrent HTTP calls
    pub max_in_flight: usize,
    pub request_timeout: Duration,
}

impl SyncConfig {
    pub const DEFAULT_QUEUE_CAPACITY: usize = 64;
    pub const DEFAULT_MAX_IN_FLIGHT: usize = 4;
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            api_token: None,
            queue_capacity: Self::DEFAULT_QUEUE_CAPACITY,
            max_in_flight: Self::DEFAULT_MAX_IN_FLIGHT,
            request_timeout: Self::DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_token(mut self, token: Option<impl Into<String>>) -> Self {
        self.api_token = token.map(Into::into).filter(|t: &String| !t.is_empty());
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    pub fn with_max_in_flight(mut self, max: usize) -> Self {
        self.max_in_flight = max.max(1);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Registry mutation mirrored to the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOperation {
    Create,
    Update,
    Delete,
}

impl SyncOperation {
    pub fn method(&self) -> Method {
        match self {
            SyncOperation::Create => Method::POST,
            SyncOperation::Update => Method::PUT,
            SyncOperation::Delete => Method::DELETE,
        }
    }
}

impl fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SyncOperation::Create => "create",
            SyncOperation::Update => "update",
            SyncOperation::Delete => "delete",
        })
    }
}

/// One queued notification.
#[derive(Debug)]
pub(crate) struct SyncJob {
    pub(crate) operation: SyncOperation,
    pub(crate) plan_id: String,
    pub(crate) payload: Option<serde_json::Value>,
}

/// Handle to the background notifier. Disabled handles drop every event.
#[derive(Debug, Default)]
pub struct ExternalSync {
    sender: Option<mpsc::Sender<SyncJob>>,
    worker: Option<JoinHandle<()>>,
}

impl ExternalSync {
    /// A notifier with no remote endpoint.
    pub fn disabled() -> Self {
        Self {
            sender: None,
            worker: None,
        }
    }

    /// Starts the worker on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `PlanError::Configuration` if the URL does not parse or no
    /// runtime is running, and `PlanError::Sync` if the HTTP client cannot be
    /// built.
    pub fn spawn(config: SyncConfig) -> Result<Self> {
        let base = Url::parse(&config.server_url).map_err(|e| PlanError::Configuration {
            message: format!("invalid sync server URL '{}': {e}", config.server_url),
        })?;
        if base.cannot_be_a_base() {
            return Err(PlanError::Configuration {
                message: format!("sync server URL '{}' cannot carry a path", config.server_url),
            });
        }

        let handle = Handle::try_current().map_err(|e| PlanError::Configuration {
            message: format!("remote sync needs a running tokio runtime: {e}"),
        })?;

        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let worker = SyncWorker::new(&config, base)?;
        let worker = handle.spawn(worker.run(receiver));

        debug!(
            "Remote sync enabled for {} (queue {}, in flight {})",
            config.server_url, config.queue_capacity, config.max_in_flight
        );
        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    /// Schedules a notification and returns immediately.
    pub fn notify(&self, operation: SyncOperation, plan_id: &str, payload: Option<&Plan>) {
        let Some(sender) = &self.sender else {
            return;
        };

        let payload = match payload.map(serde_json::to_value).transpose() {
            Ok(payload) => payload,
            Err(e) => {
                debug!("Dropping {operation} sync for '{plan_id}': cannot encode plan: {e}");
                return;
            }
        };

        let job = SyncJob {
            operation,
            plan_id: plan_id.to_string(),
            payload,
        };
        if let Err(e) = sender.try_send(job) {
            debug!("Dropping {operation} sync for '{plan_id}': {e}");
        }
    }

    /// Closes the queue and waits up to `grace` for queued and in-flight
    /// requests to finish.
    pub async fn shutdown(mut self, grace: Duration) {
        self.sender = None;
        let Some(worker) = self.worker.take() else {
            return;
        };
        match tokio::time::timeout(grace, worker).await {
            Ok(_) => debug!("Sync queue drained"),
            Err(_) => debug!("Sync queue not drained after {grace:?}; dropping the rest"),
        }
    }
}

/// Builds `{base}/plans/{plan_id}` with the id as a single encoded segment.
pub(crate) fn endpoint_url(base: &Url, plan_id: &str) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| PlanError::Sync {
            message: format!("base URL '{base}' cannot carry a path"),
        })?
        .pop_if_empty()
        .push("plans")
        .push(plan_id);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url() {
        let base = Url::parse("http://localhost:8080").unwrap();
        assert_eq!(
            endpoint_url(&base, "p1").unwrap().as_str(),
            "http://localhost:8080/plans/p1"
        );

        let nested = Url::parse("http://localhost:8080/api/").unwrap();
        assert_eq!(
            endpoint_url(&nested, "p1").unwrap().as_str(),
            "http://localhost:8080/api/plans/p1"
        );

        assert_eq!(
            endpoint_url(&base, "a b/c").unwrap().as_str(),
            "http://localhost:8080/plans/a%20b%2Fc"
        );
    }

    #[test]
    fn test_operation_methods() {
        assert_eq!(SyncOperation::Create.method(), Method::POST);
        assert_eq!(SyncOperation::Update.method(), Method::PUT);
        assert_eq!(SyncOperation::Delete.method(), Method::DELETE);
    }

    #[test]
    fn test_disabled_notify_is_noop() {
        let sync = ExternalSync::disabled();
        assert!(!sync.is_enabled());
        let plan = Plan::new("p1", "t", vec!["s".into()]).unwrap();
        sync.notify(SyncOperation::Create, "p1", Some(&plan));
    }

    #[test]
    fn test_spawn_outside_runtime_fails() {
        let result = ExternalSync::spawn(SyncConfig::new("http://localhost:1"));
        assert!(matches!(result, Err(PlanError::Configuration { .. })));
    }

    #[test]
    fn test_spawn_rejects_bad_url() {
        let result = ExternalSync::spawn(SyncConfig::new("not a url"));
        assert!(matches!(result, Err(PlanError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_notify_never_blocks_when_queue_full() {
        let config = SyncConfig::new("http://127.0.0.1:9")
            .with_queue_capacity(1)
            .with_max_in_flight(1)
            .with_request_timeout(Duration::from_millis(200));
        let sync = ExternalSync::spawn(config).unwrap();
        let plan = Plan::new("p1", "t", vec!["s".into()]).unwrap();

        for _ in 0..100 {
            sync.notify(SyncOperation::Update, "p1", Some(&plan));
        }
        assert!(sync.is_enabled());
        sync.shutdown(Duration::from_secs(2)).await;
    }

    #[test]
    fn test_token_filtering() {
        let config = SyncConfig::new("http://x").with_token(Some(""));
        assert_eq!(config.api_token, None);
        let config = SyncConfig::new("http://x").with_token(Some("secret"));
        assert_eq!(config.api_token.as_deref(), Some("secret"));
    }
}
