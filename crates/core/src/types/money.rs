//! Money formatting and currency conversion.
//!
//! Catalog prices are quoted in USD. Shoppers may see totals converted to
//! Indian Rupees at a fixed exchange rate; whether that happens is decided by
//! whoever builds the cart engine, by passing a [`CurrencyConverter`] or not.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Default USD→INR exchange rate.
pub const DEFAULT_INR_RATE: Decimal = Decimal::from_parts(83, 0, 0, false, 0);

/// Format a USD amount as `$12.34`.
#[must_use]
pub fn format_usd(amount: Decimal) -> String {
    format!("${:.2}", amount.round_dp(2))
}

/// Format an INR amount as `₹1024.17`.
#[must_use]
pub fn format_inr(amount: Decimal) -> String {
    format!("₹{:.2}", amount.round_dp(2))
}

/// Converts USD amounts to INR for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyConverter {
    /// Rupees per US dollar.
    pub inr_per_usd: Decimal,
}

impl CurrencyConverter {
    /// Create a converter with the given exchange rate.
    #[must_use]
    pub const fn new(inr_per_usd: Decimal) -> Self {
        Self { inr_per_usd }
    }

    /// Convert a USD amount to INR, or `None` if the result overflows.
    #[must_use]
    pub fn usd_to_inr(&self, usd: Decimal) -> Option<Decimal> {
        usd.checked_mul(self.inr_per_usd)
    }

    /// Convert and format in one step.
    #[must_use]
    pub fn format_usd_as_inr(&self, usd: Decimal) -> Option<String> {
        self.usd_to_inr(usd).map(format_inr)
    }
}

impl Default for CurrencyConverter {
    fn default() -> Self {
        Self::new(DEFAULT_INR_RATE)
    }
}
