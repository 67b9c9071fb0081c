//! Transport sanitization
//!
//! JSON has no representation for NaN or infinity, and missing upstream
//! values must be sent as `null`. Every served field goes through
//! [`sanitize`] on its way into an [`OptionRecord`].

use crate::services::options_service::OptionType;
use crate::services::pricing_service::PricedOptionRow;
use serde::{Serialize, Serializer};

/// A single transport value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Absent,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl Serialize for Scalar {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Scalar::Absent => serializer.serialize_none(),
            Scalar::Int(i) => serializer.serialize_i64(*i),
            // serde_json writes non-finite floats as null; sanitize() has already
            // turned them into Absent for records built here
            Scalar::Float(f) => serializer.serialize_f64(*f),
            Scalar::Bool(b) => serializer.serialize_bool(*b),
            Scalar::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<OptionType> for Scalar {
    fn from(v: OptionType) -> Self {
        Scalar::Text(v.as_str().to_string())
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(v: Option<T>) -> Self {
        v.map_or(Scalar::Absent, Into::into)
    }
}

/// Map absent and non-finite values to `Absent`; pass everything else through
pub fn sanitize(value: impl Into<Scalar>) -> Scalar {
    match value.into() {
        Scalar::Float(f) if !f.is_finite() => Scalar::Absent,
        other => other,
    }
}

/// One served row, field order matching the JSON wire format
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionRecord {
    pub strike: Scalar,
    pub bid: Scalar,
    pub ask: Scalar,
    pub volume: Scalar,
    #[serde(rename = "openInterest")]
    pub open_interest: Scalar,
    #[serde(rename = "impliedVolatility")]
    pub implied_volatility: Scalar,
    #[serde(rename = "inTheMoney")]
    pub in_the_money: Scalar,
    pub option_type: Scalar,
    pub margin_required: Scalar,
    pub premium_earned: Scalar,
    pub return_on_margin: Scalar,
}

impl From<PricedOptionRow> for OptionRecord {
    fn from(p: PricedOptionRow) -> Self {
        let row = p.row;
        OptionRecord {
            strike: sanitize(row.strike),
            bid: sanitize(row.bid),
            ask: sanitize(row.ask),
            volume: sanitize(row.volume),
            open_interest: sanitize(row.open_interest),
            implied_volatility: sanitize(row.implied_volatility),
            in_the_money: sanitize(row.in_the_money),
            option_type: sanitize(row.option_type),
            margin_required: sanitize(p.margin_required),
            premium_earned: sanitize(p.premium_earned),
            return_on_margin: sanitize(p.return_on_margin),
        }
    }
}
