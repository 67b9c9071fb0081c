//! Yahoo Finance options adapter
//!
//! Talks to the public `v7/finance/options/{ticker}` endpoint. Yahoo requires
//! a session cookie plus a matching "crumb" token on that endpoint, so
//! `open_session` runs a short handshake once per fetch: hit the cookie URL
//! (the client's cookie jar keeps whatever it sets), then ask
//! `v1/test/getcrumb` for the token. The expirations and chain calls of that
//! fetch reuse the crumb. A failed handshake is not fatal; the requests are
//! attempted without a crumb and any rejection surfaces as an upstream error.

use crate::config::YahooConfig;
use crate::error::{AppError, Result};
use crate::providers::types::*;
use crate::providers::MarketDataProvider;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

// ============================================================================
// Flexible Deserialization Helpers
// ============================================================================

/// Deserialize an optional value that could be a float, an integer or a numeric string
fn deserialize_optional_float<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrFloat {
        String(String),
        Float(f64),
        Int(i64),
        Null,
    }

    match Option::<StringOrFloat>::deserialize(deserializer)? {
        Some(StringOrFloat::String(s)) if s.trim().is_empty() => Ok(None),
        Some(StringOrFloat::String(s)) => s.trim().parse().map(Some).map_err(serde::de::Error::custom),
        Some(StringOrFloat::Float(f)) => Ok(Some(f)),
        Some(StringOrFloat::Int(i)) => Ok(Some(i as f64)),
        Some(StringOrFloat::Null) | None => Ok(None),
    }
}

/// Deserialize an optional count that could be an integer, a whole float or a numeric string
fn deserialize_optional_int<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrInt {
        Int(i64),
        Float(f64),
        String(String),
        Null,
    }

    match Option::<StringOrInt>::deserialize(deserializer)? {
        Some(StringOrInt::Int(i)) => Ok(Some(i)),
        Some(StringOrInt::Float(f)) if f.is_finite() => Ok(Some(f as i64)),
        Some(StringOrInt::Float(_)) => Ok(None),
        Some(StringOrInt::String(s)) if s.trim().is_empty() => Ok(None),
        Some(StringOrInt::String(s)) => s.trim().parse().map(Some).map_err(serde::de::Error::custom),
        Some(StringOrInt::Null) | None => Ok(None),
    }
}

// ============================================================================
// Yahoo API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionsResponse {
    option_chain: ResultEnvelope<ChainResult>,
}

/// `{ "result": [...], "error": {...} }` wrapper used by every Yahoo finance endpoint
#[derive(Debug, Deserialize)]
struct ResultEnvelope<T> {
    result: Option<Vec<T>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl std::fmt::Display for YahooError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.code, &self.description) {
            (Some(code), Some(desc)) => write!(f, "{}: {}", code, desc),
            (Some(code), None) => write!(f, "{}", code),
            (None, Some(desc)) => write!(f, "{}", desc),
            (None, None) => write!(f, "unknown error"),
        }
    }
}

/// Error bodies arrive under either key depending on where Yahoo rejected the call
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    #[serde(default)]
    finance: Option<ResultEnvelope<serde_json::Value>>,
    #[serde(default)]
    option_chain: Option<ResultEnvelope<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChainResult {
    #[serde(default)]
    expiration_dates: Vec<i64>,
    #[serde(default)]
    options: Vec<ChainTables>,
}

#[derive(Debug, Deserialize)]
struct ChainTables {
    #[serde(default)]
    calls: Vec<YahooContract>,
    #[serde(default)]
    puts: Vec<YahooContract>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooContract {
    #[serde(default, deserialize_with = "deserialize_optional_float")]
    strike: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_float")]
    bid: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_float")]
    ask: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_int")]
    volume: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_int")]
    open_interest: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_float")]
    implied_volatility: Option<f64>,
    #[serde(default)]
    in_the_money: Option<bool>,
}

impl From<YahooContract> for ContractQuote {
    fn from(c: YahooContract) -> Self {
        ContractQuote {
            strike: c.strike,
            bid: c.bid,
            ask: c.ask,
            volume: c.volume,
            open_interest: c.open_interest,
            implied_volatility: c.implied_volatility,
            in_the_money: c.in_the_money.unwrap_or(false),
        }
    }
}

// ============================================================================
// Client
// ============================================================================

/// Yahoo Finance provider implementation
pub struct YahooFinance {
    client: Client,
    config: YahooConfig,
}

impl YahooFinance {
    pub fn new(config: YahooConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .cookie_store(true)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn options_url(&self, ticker: &str) -> String {
        format!(
            "{}/v7/finance/options/{}",
            self.config.base_url,
            urlencoding::encode(ticker)
        )
    }

    /// Establish the session cookie and fetch a crumb for it
    async fn crumb(&self) -> Option<String> {
        if let Err(e) = self.client.get(&self.config.cookie_url).send().await {
            warn!("Yahoo cookie request failed: {}", e);
        }

        let url = format!("{}/v1/test/getcrumb", self.config.base_url);
        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("Yahoo crumb request failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            warn!("Yahoo crumb request returned {}", response.status());
            return None;
        }

        match response.text().await {
            Ok(text) => {
                let crumb = text.trim();
                if crumb.is_empty() || crumb.contains('<') {
                    warn!("Yahoo returned an unusable crumb");
                    None
                } else {
                    Some(crumb.to_string())
                }
            }
            Err(e) => {
                warn!("Failed to read Yahoo crumb: {}", e);
                None
            }
        }
    }

    /// GET the options endpoint and return its single result entry, if any
    async fn fetch_chain_result(
        &self,
        session: &Session,
        ticker: &str,
        expiration: Option<Expiration>,
    ) -> Result<Option<ChainResult>> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(crumb) = &session.crumb {
            query.push(("crumb", crumb.clone()));
        }
        if let Some(exp) = expiration {
            query.push(("date", exp.timestamp().to_string()));
        }

        let url = self.options_url(ticker);
        debug!("GET {} (date={:?})", url, expiration.map(|e| e.timestamp()));

        let response = self.client.get(&url).query(&query).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(AppError::Upstream(describe_failure(status, &body)));
        }

        parse_options_body(&body)
    }
}

/// Build a message for a non-2xx upstream response
fn describe_failure(status: reqwest::StatusCode, body: &str) -> String {
    let reason = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| {
            b.finance
                .and_then(|e| e.error)
                .or_else(|| b.option_chain.and_then(|e| e.error))
        })
        .map(|e| e.to_string());

    match reason {
        Some(reason) => format!("Yahoo Finance returned {}: {}", status, reason),
        None => format!("Yahoo Finance returned {}", status),
    }
}

/// Parse a successful options response body
fn parse_options_body(body: &str) -> Result<Option<ChainResult>> {
    let parsed: OptionsResponse = serde_json::from_str(body)
        .map_err(|e| AppError::Upstream(format!("Malformed Yahoo Finance response: {}", e)))?;

    if let Some(err) = parsed.option_chain.error {
        return Err(AppError::Upstream(format!("Yahoo Finance error: {}", err)));
    }

    Ok(parsed.option_chain.result.unwrap_or_default().into_iter().next())
}

#[async_trait]
impl MarketDataProvider for YahooFinance {
    fn id(&self) -> &'static str {
        "yahoo"
    }

    async fn open_session(&self) -> Session {
        Session {
            crumb: self.crumb().await,
        }
    }

    async fn expiration_dates(&self, session: &Session, ticker: &str) -> Result<Vec<Expiration>> {
        let result = self.fetch_chain_result(session, ticker, None).await?;

        Ok(result
            .map(|r| r.expiration_dates.into_iter().map(Expiration).collect())
            .unwrap_or_default())
    }

    async fn option_chain(
        &self,
        session: &Session,
        ticker: &str,
        expiration: Expiration,
    ) -> Result<OptionChain> {
        let result = self.fetch_chain_result(session, ticker, Some(expiration)).await?;

        let tables = result.and_then(|r| r.options.into_iter().next());
        Ok(match tables {
            Some(t) => OptionChain {
                calls: t.calls.into_iter().map(ContractQuote::from).collect(),
                puts: t.puts.into_iter().map(ContractQuote::from).collect(),
            },
            None => OptionChain::default(),
        })
    }
}
