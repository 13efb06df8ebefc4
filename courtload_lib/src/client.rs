//! Paced, retrying wrapper around the stats API client.

use async_trait::async_trait;
use serde_json::Value;
use statsnba_api::types::ResultSet;
use statsnba_api::{Client, Params, Query};

use crate::orchestrator::{FetchTask, TableSource};
use crate::retry::{with_retry, RetryPolicy};
use crate::table::RawTable;
use crate::tracker::RequestTracker;

/// Terminal error of one logical call.
pub use statsnba_api::Error as ClientError;

/// The single choke point for stats API calls.
///
/// Every physical request waits the policy's pacing delay first. Timeouts,
/// connection failures and throttling/outage statuses are retried with
/// exponential backoff that honours `Retry-After`; once the retries are spent
/// the last error is returned. One `reqwest` session is shared by all calls.
pub struct RateLimitedClient {
    inner: Client,
    policy: RetryPolicy,
    tracker: RequestTracker,
}

impl RateLimitedClient {
    /// Creates a client for the production API.
    pub fn new(policy: RetryPolicy) -> Result<Self, ClientError> {
        Ok(Self {
            inner: Client::new(policy.timeout)?,
            policy,
            tracker: RequestTracker::new(),
        })
    }

    /// Creates a client with a custom base URL. Used for testing.
    pub fn with_base_url(base_url: &str, policy: RetryPolicy) -> Result<Self, ClientError> {
        Ok(Self {
            inner: Client::with_base_url(base_url, policy.timeout)?,
            policy,
            tracker: RequestTracker::new(),
        })
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn tracker(&self) -> &RequestTracker {
        &self.tracker
    }

    /// Calls one endpoint and returns the decoded body.
    pub async fn call(&self, params: &Params) -> Result<Value, ClientError> {
        let label = params.endpoint().as_str();
        with_retry(&self.policy, &self.tracker, label, || {
            self.inner.get_json(params)
        })
        .await
    }
}

#[async_trait]
impl TableSource for RateLimitedClient {
    async fn fetch(&self, task: &FetchTask) -> Result<RawTable, ClientError> {
        let payload = self.call(&task.params).await?;
        let rs = ResultSet::select(&payload, &task.selector)?;
        Ok(RawTable::from_result_set(task.dataset.clone(), rs))
    }

    fn request_tracker(&self) -> Option<&RequestTracker> {
        Some(&self.tracker)
    }
}
