//! Where the processing driver gets its status observations from.

use std::future::Future;
use std::time::Duration;

use finsight_core::{simulated_update, StatusUpdate};

use crate::api::ApiClient;
use crate::error::FetchError;

/// One status check per poll. `elapsed` is measured from the start of the
/// processing phase.
pub trait StatusSource: Send + 'static {
    fn check(
        &mut self,
        statement_id: &str,
        elapsed: Duration,
    ) -> impl Future<Output = Result<StatusUpdate, FetchError>> + Send;
}

/// Elapsed-time simulation; completes after `max_duration`.
#[derive(Debug, Clone)]
pub struct SimulatedStatus {
    pub max_duration: Duration,
}

impl SimulatedStatus {
    pub fn new(max_duration: Duration) -> Self {
        Self { max_duration }
    }
}

impl StatusSource for SimulatedStatus {
    fn check(
        &mut self,
        _statement_id: &str,
        elapsed: Duration,
    ) -> impl Future<Output = Result<StatusUpdate, FetchError>> + Send {
        let update = simulated_update(elapsed, self.max_duration);
        async move { Ok(update) }
    }
}

/// Polls `GET /v1/statements/{id}/status` on the backend.
#[derive(Debug, Clone)]
pub struct RemoteStatus {
    client: ApiClient,
}

impl RemoteStatus {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

impl StatusSource for RemoteStatus {
    fn check(
        &mut self,
        statement_id: &str,
        _elapsed: Duration,
    ) -> impl Future<Output = Result<StatusUpdate, FetchError>> + Send {
        let client = self.client.clone();
        let id = statement_id.to_string();
        async move { client.fetch_status(&id).await }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simulated_source_completes_at_max() {
        let mut s = SimulatedStatus::new(Duration::from_secs(10));
        let early = s.check("stmt", Duration::from_secs(5)).await.unwrap();
        assert!(matches!(early, StatusUpdate::InProgress { progress, .. } if progress == 50.0));
        let done = s.check("stmt", Duration::from_secs(10)).await.unwrap();
        assert_eq!(done, StatusUpdate::Completed);
    }
}
