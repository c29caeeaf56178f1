use std::net::TcpStream;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use dashmap::DashMap;
use vex_core::Store;

use crate::config::AppConfig;
use crate::stats::ServerStats;

pub(crate) struct AppState {
    pub(crate) config: Arc<AppConfig>,
    pub(crate) store: Arc<Store>,
    pub(crate) stats: Arc<ServerStats>,
    /// Socket handles of live clients, used to unblock their workers on shutdown.
    pub(crate) clients: Arc<DashMap<u64, TcpStream>>,
    next_connection_id: Arc<AtomicU64>,
}

impl Clone for AppState {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            store: Arc::clone(&self.store),
            stats: Arc::clone(&self.stats),
            clients: Arc::clone(&self.clients),
            next_connection_id: Arc::clone(&self.next_connection_id),
        }
    }
}

impl AppState {
    pub(crate) fn new(config: AppConfig) -> Result<Self> {
        let store = Store::with_config(config.store_config()?);
        Ok(Self {
            config: Arc::new(config),
            store: Arc::new(store),
            stats: Arc::new(ServerStats::new()),
            clients: Arc::new(DashMap::new()),
            next_connection_id: Arc::new(AtomicU64::new(1)),
        })
    }

    pub(crate) fn next_connection_id(&self) -> u64 {
        self.next_connection_id.fetch_add(1, Ordering::Relaxed)
    }
}
