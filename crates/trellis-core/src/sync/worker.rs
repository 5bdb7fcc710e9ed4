//! Background delivery of queued sync events.

use std::sync::Arc;

use log::debug;
use reqwest::{Client, Url};
use tokio::sync::{mpsc, Semaphore};

use super::{endpoint_url, SyncConfig, SyncJob};
use crate::error::{PlanError, Result};

/// Upper bound on concurrent requests, whatever the configuration says.
const MAX_IN_FLIGHT: usize = 1024;

pub(super) struct SyncWorker {
    client: Client,
    base: Url,
    api_token: Option<String>,
    permits: Arc<Semaphore>,
    max_in_flight: u32,
}

impl SyncWorker {
    pub(super) fn new(config: &SyncConfig, base: Url) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("trellis/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| PlanError::Sync {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        let max_in_flight = config.max_in_flight.clamp(1, MAX_IN_FLIGHT);
        Ok(Self {
            client,
            base,
            api_token: config.api_token.clone(),
            permits: Arc::new(Semaphore::new(max_in_flight)),
            max_in_flight: max_in_flight as u32,
        })
    }

    /// Drains the queue until every sender is gone, then waits for the
    /// requests still in flight.
    pub(super) async fn run(self, mut receiver: mpsc::Receiver<SyncJob>) {
        while let Some(job) = receiver.recv().await {
            let Ok(permit) = self.permits.clone().acquire_owned().await else {
                break;
            };

            let request = match self.build_request(&job) {
                Ok(request) => request,
                Err(e) => {
                    debug!("Dropping {} sync for '{}': {e}", job.operation, job.plan_id);
                    continue;
                }
            };

            tokio::spawn(async move {
                let _permit = permit;
                match request.send().await {
                    Ok(response) if response.status().is_success() => {
                        debug!("Synced {} of '{}'", job.operation, job.plan_id);
                    }
                    Ok(response) => {
                        debug!(
                            "Remote rejected {} of '{}': {}",
                            job.operation,
                            job.plan_id,
                            response.status()
                        );
                    }
                    Err(e) => {
                        debug!("Sync {} of '{}' failed: {e}", job.operation, job.plan_id);
                    }
                }
            });
        }
        let _ = self.permits.acquire_many(self.max_in_flight).await;
        debug!("Sync worker stopped");
    }

    fn build_request(&self, job: &SyncJob) -> Result<reqwest::RequestBuilder> {
        let url = endpoint_url(&self.base, &job.plan_id)?;
        let mut request = self.client.request(job.operation.method(), url);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }
        if let Some(payload) = &job.payload {
            request = request.json(payload);
        }
        Ok(request)
    }
}
