use crate::config::Config;
use crate::store::KvStore;
use std::sync::Arc;

/// Shared application state
///
/// Handlers receive the store through this state on every request; there is
/// no process-wide store handle.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn KvStore>,
    pub config: Arc<Config>,
}
