//! BTC to fiat conversion for balance display.
//!
//! Read side only: the transfer engine never consults rates.

pub mod converter;
pub mod source;

pub use converter::{Conversion, RateConverter, UNAVAILABLE};
pub use source::{RateError, RateSource};

#[cfg(test)]
pub use source::MockRateSource;
