//! Application state management

use crate::config::ServerConfig;
use crate::error::Result;
use crate::providers::{MarketDataProvider, YahooFinance};
use std::sync::Arc;

/// State shared by all request handlers. Immutable after startup.
#[derive(Clone)]
pub struct AppState {
    /// Upstream option chain source
    pub provider: Arc<dyn MarketDataProvider>,
}

impl AppState {
    /// Build state around an arbitrary provider
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { provider }
    }

    /// Build state backed by Yahoo Finance
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let yahoo = YahooFinance::new(config.yahoo.clone())?;
        Ok(Self::new(Arc::new(yahoo)))
    }
}
