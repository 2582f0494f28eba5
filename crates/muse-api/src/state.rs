use std::sync::Arc;

use tracing::error;

use muse_chat::identity::TokenKeys;
use muse_chat::service::MessagingService;
use muse_db::Database;
use muse_gateway::Dispatcher;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub keys: TokenKeys,
    pub messaging: MessagingService,
    pub dispatcher: Dispatcher,
}

impl AppStateInner {
    /// Wire the messaging service to `db`, publishing events through
    /// `dispatcher`.
    pub fn new(db: Arc<Database>, keys: TokenKeys, dispatcher: Dispatcher) -> Self {
        let messaging = MessagingService::new(db.clone(), db.clone(), Arc::new(dispatcher.clone()));
        Self {
            db,
            keys,
            messaging,
            dispatcher,
        }
    }
}

/// Run blocking work (SQLite, password hashing) off the async runtime.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(e.into())
    })?
}
