//! Pricing Service
//!
//! Derives the margin a short option ties up, the premium it pays and the
//! resulting return on margin.
//!
//! - margin: strike × 20% for calls, strike × 10% for puts
//! - premium: bid × 100 (one contract), absent when the bid is absent
//! - return on margin: premium / margin × 100, or 0 when margin is not positive
//!
//! A row without a usable strike fails the whole batch.

use crate::error::{AppError, Result};
use crate::services::options_service::{OptionRow, OptionType};

pub const CALL_MARGIN_RATE: f64 = 0.20;
pub const PUT_MARGIN_RATE: f64 = 0.10;
pub const CONTRACT_MULTIPLIER: f64 = 100.0;

/// Option row with derived pricing fields
#[derive(Debug, Clone, PartialEq)]
pub struct PricedOptionRow {
    pub row: OptionRow,
    pub margin_required: f64,
    pub premium_earned: Option<f64>,
    pub return_on_margin: Option<f64>,
}

/// Pricing service for margin/premium calculations
pub struct PricingService;

impl PricingService {
    /// Price every row, preserving order
    pub fn calculate(rows: Vec<OptionRow>) -> Result<Vec<PricedOptionRow>> {
        rows.into_iter()
            .enumerate()
            .map(|(index, row)| Self::price_row(index, row))
            .collect()
    }

    fn price_row(index: usize, row: OptionRow) -> Result<PricedOptionRow> {
        let strike = match row.strike {
            Some(s) if s.is_finite() => s,
            Some(s) => {
                return Err(AppError::Calculation(format!(
                    "row {} ({}) has a non-finite strike {}",
                    index, row.option_type, s
                )))
            }
            None => {
                return Err(AppError::Calculation(format!(
                    "row {} ({}) has no strike",
                    index, row.option_type
                )))
            }
        };

        let margin_required = Self::margin_required(strike, row.option_type);
        let premium_earned = row.bid.map(Self::premium_earned);
        let return_on_margin = Self::return_on_margin(premium_earned, margin_required);

        Ok(PricedOptionRow {
            row,
            margin_required,
            premium_earned,
            return_on_margin,
        })
    }

    pub fn margin_required(strike: f64, option_type: OptionType) -> f64 {
        let rate = match option_type {
            OptionType::Call => CALL_MARGIN_RATE,
            OptionType::Put => PUT_MARGIN_RATE,
        };
        strike * rate
    }

    pub fn premium_earned(bid: f64) -> f64 {
        bid * CONTRACT_MULTIPLIER
    }

    /// Percentage return; zero unless margin is positive
    pub fn return_on_margin(premium_earned: Option<f64>, margin_required: f64) -> Option<f64> {
        if margin_required > 0.0 {
            premium_earned.map(|p| p / margin_required * 100.0)
        } else {
            Some(0.0)
        }
    }
}
