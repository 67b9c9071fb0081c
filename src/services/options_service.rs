//! Options Service
//!
//! Fetches the nearest-expiration option chain for a ticker and flattens it
//! into one typed row per contract, calls first then puts.

use crate::error::Result;
use crate::providers::types::{ContractQuote, OptionChain};
use crate::providers::MarketDataProvider;
use tracing::info;

/// Contract side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionType::Call => "call",
            OptionType::Put => "put",
        }
    }
}

impl std::fmt::Display for OptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One contract of the chain, projected to the served columns
#[derive(Debug, Clone, PartialEq)]
pub struct OptionRow {
    pub strike: Option<f64>,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub volume: Option<i64>,
    pub open_interest: Option<i64>,
    pub implied_volatility: Option<f64>,
    pub in_the_money: bool,
    pub option_type: OptionType,
}

impl OptionRow {
    pub fn from_quote(quote: ContractQuote, option_type: OptionType) -> Self {
        Self {
            strike: quote.strike,
            bid: quote.bid,
            ask: quote.ask,
            volume: quote.volume,
            open_interest: quote.open_interest,
            implied_volatility: quote.implied_volatility,
            in_the_money: quote.in_the_money,
            option_type,
        }
    }
}

/// Options service for business logic
pub struct OptionsService;

impl OptionsService {
    /// Fetch the soonest-expiring chain for `ticker`.
    ///
    /// Returns an empty list when the provider lists no expirations. One
    /// provider session covers both upstream calls.
    pub async fn fetch_options(
        provider: &dyn MarketDataProvider,
        ticker: &str,
    ) -> Result<Vec<OptionRow>> {
        info!("OptionsService::fetch_options - {} via {}", ticker, provider.id());

        let session = provider.open_session().await;
        let expirations = provider.expiration_dates(&session, ticker).await?;
        let Some(&expiration) = expirations.first() else {
            info!("No option expirations listed for {}", ticker);
            return Ok(Vec::new());
        };

        let chain = provider.option_chain(&session, ticker, expiration).await?;
        info!(
            "Fetched {} calls and {} puts for {} expiring {}",
            chain.calls.len(),
            chain.puts.len(),
            ticker,
            expiration
        );

        Ok(Self::flatten_chain(chain))
    }

    /// Tag and concatenate both sides, preserving upstream order within each
    pub fn flatten_chain(chain: OptionChain) -> Vec<OptionRow> {
        let calls = chain
            .calls
            .into_iter()
            .map(|q| OptionRow::from_quote(q, OptionType::Call));
        let puts = chain
            .puts
            .into_iter()
            .map(|q| OptionRow::from_quote(q, OptionType::Put));

        calls.chain(puts).collect()
    }
}
