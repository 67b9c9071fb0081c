//! Market data provider adapters

pub mod types;
pub mod yahoo;

use crate::error::Result;
use async_trait::async_trait;
use types::*;

pub use yahoo::YahooFinance;

/// Market data provider trait that all upstream adapters must implement
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Provider ID (e.g., "yahoo")
    fn id(&self) -> &'static str;

    /// Prepare upstream credentials for one fetch. Called once per request;
    /// providers without a handshake keep the default.
    async fn open_session(&self) -> Session {
        Session::default()
    }

    /// Available option expirations for a ticker, soonest first.
    /// An empty list means the ticker has no listed options.
    async fn expiration_dates(&self, session: &Session, ticker: &str) -> Result<Vec<Expiration>>;

    /// Calls and puts for a ticker at one expiration
    async fn option_chain(
        &self,
        session: &Session,
        ticker: &str,
        expiration: Expiration,
    ) -> Result<OptionChain>;
}
