//! Common market data types

use chrono::{DateTime, NaiveDate};

/// Upstream credentials shared by the calls of a single fetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub crumb: Option<String>,
}

/// Option expiration, as a unix timestamp (seconds, UTC)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Expiration(pub i64);

impl Expiration {
    pub fn timestamp(&self) -> i64 {
        self.0
    }

    /// Calendar date of the expiration (UTC)
    pub fn date(&self) -> Option<NaiveDate> {
        DateTime::from_timestamp(self.0, 0).map(|dt| dt.date_naive())
    }
}

impl std::fmt::Display for Expiration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.date() {
            Some(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            None => write!(f, "{}", self.0),
        }
    }
}

/// One contract row from an upstream chain table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContractQuote {
    pub strike: Option<f64>,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub volume: Option<i64>,
    pub open_interest: Option<i64>,
    pub implied_volatility: Option<f64>,
    pub in_the_money: bool,
}

/// Option chain at a single expiration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionChain {
    pub calls: Vec<ContractQuote>,
    pub puts: Vec<ContractQuote>,
}
