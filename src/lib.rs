pub mod aliases;
pub mod api;
pub mod bridge;
pub mod config;
pub mod error;
pub mod format;
pub mod models;
pub mod query;
pub mod rpc;
pub mod store;
pub mod time_format;

use std::sync::Arc;

use config::Config;
use store::MatchStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn MatchStore>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn MatchStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }
}
