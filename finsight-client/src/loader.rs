//! One outstanding analysis request per results view.
//!
//! Disposing the view cancels the handle; a response that arrives after
//! that is dropped instead of being applied.

use std::future::Future;

use finsight_core::AnalysisRecord;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::api::ApiClient;
use crate::cancel::CancelFlag;
use crate::error::FetchError;

pub struct LoadHandle<T> {
    cancel: CancelFlag,
    join: JoinHandle<T>,
}

impl<T: Send + 'static> LoadHandle<T> {
    pub fn spawn<F>(fut: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self {
            cancel: CancelFlag::new(),
            join: tokio::spawn(fut),
        }
    }

    /// The view went away.
    pub fn cancel(&self) {
        self.cancel.cancel();
        self.join.abort();
    }

    /// Lets another task dispose the view while `finish` is pending.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// The response, unless the handle was cancelled first.
    pub async fn finish(self) -> Option<T> {
        let out = self.join.await.ok();
        if self.cancel.is_cancelled() {
            debug!("discarding response for disposed view");
            return None;
        }
        out
    }
}

pub fn spawn_analysis_load(
    client: ApiClient,
    statement_id: impl Into<String>,
) -> LoadHandle<Result<AnalysisRecord, FetchError>> {
    let statement_id = statement_id.into();
    LoadHandle::spawn(async move { client.fetch_analysis(&statement_id).await })
}
