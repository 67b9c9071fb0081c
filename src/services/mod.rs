//! Services Layer
//!
//! Business logic behind the REST API handlers.
//!
//! # Architecture
//!
//! ```text
//! GET /get_options/{ticker} --> OptionsService --> MarketDataProvider (Yahoo)
//!                                     |
//!                                     v
//!                               PricingService --> sanitize --> JSON
//! ```
//!
//! # Services
//!
//! - `OptionsService` - Nearest-expiration option chain, flattened to rows
//! - `PricingService` - Margin required, premium earned, return on margin
//! - `sanitize` - Transport-safe scalar values

pub mod options_service;
pub mod pricing_service;
pub mod sanitize;

// Re-export commonly used types and services
pub use options_service::{OptionRow, OptionType, OptionsService};
pub use pricing_service::{PricedOptionRow, PricingService};
pub use sanitize::{sanitize, OptionRecord, Scalar};
