//! Shorthand addressing for exchange REST APIs.
//!
//! A shorthand such as `kraken://btcusd/order/cancel` is resolved into a
//! concrete request (URL, method, query or body parameters), signed when the
//! endpoint is private, and the decoded response is normalized into flat
//! records and a single key-value summary.
//!
//! ```rust
//! use krakenshort::utils::ExchangeRegistry;
//!
//! let registry = ExchangeRegistry::with_defaults();
//! let request = registry.prepare("kraken://btcusd/ticker", &[], None).unwrap();
//! assert_eq!(request.full_url(), "https://api.kraken.com/0/public/Ticker?pair=XBTUSD");
//! ```
pub mod core;
pub mod exchanges;
pub mod utils;

pub use crate::core::{
    errors::ExchangeError,
    normalized::{NormalizedResponse, ResponseMetadata},
    shorthand::Shorthand,
    traits::{ExchangePlugin, SymbolTable},
    types::*,
};
pub use exchanges::kraken::KrakenConnector;
pub use utils::ExchangeRegistry;
