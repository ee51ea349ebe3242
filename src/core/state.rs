// Application state (AppState)

use crate::admin::service::AdminService;
use crate::core::config::Config;
use crate::stores::{peer_store::PeerStore, stats_batch::StatsBatch, store::Store};
use std::sync::Arc;

/// Shared application state
///
/// Built once at startup and handed to every handler and background task.
#[derive(Clone)]
pub struct AppState {
    /// Persistent backend selected through the store registry
    pub store: Arc<dyn Store>,

    /// Live swarms
    pub peer_store: Arc<PeerStore>,

    /// Counter deltas awaiting the next flush
    pub stats: Arc<StatsBatch>,

    pub admin: AdminService,

    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn Store>) -> Self {
        Self {
            admin: AdminService::new(Arc::clone(&store)),
            store,
            peer_store: Arc::new(PeerStore::new()),
            stats: Arc::new(StatsBatch::new()),
            config: Arc::new(config),
        }
    }
}
