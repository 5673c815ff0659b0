//! finsight-client: the analysis backend API, payload normalization, and the
//! cancellable tasks that drive processing and analysis loading.

pub mod api;
pub mod cancel;
pub mod driver;
pub mod error;
pub mod loader;
pub mod normalize;
pub mod status;

pub use api::ApiClient;
pub use cancel::CancelFlag;
pub use driver::{new_statement_id, spawn_processing, ProcessingHandle};
pub use error::{DeleteError, FetchError};
pub use loader::{spawn_analysis_load, LoadHandle};
pub use normalize::{normalize_analysis, normalize_status, normalize_transactions};
pub use status::{RemoteStatus, SimulatedStatus, StatusSource};
