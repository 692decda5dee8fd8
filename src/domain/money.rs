use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

/// Money is an exact decimal, so sums of shares never drift the way binary
/// floats do. 1 unit = 1.00 of the group's currency.
pub type Amount = Decimal;

/// Threshold (0.01 currency units) under which a balance or a settlement
/// amount counts as zero.
pub const TOLERANCE: Amount = Decimal::from_parts(1, 0, 0, false, 2);

/// Round to whole cents, half away from zero.
/// Example: 12.345 -> 12.35, -0.005 -> -0.01
pub fn round_cents(amount: Amount) -> Amount {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Drop everything below a cent, towards zero.
/// Example: 33.3333 -> 33.33
pub fn floor_cents(amount: Amount) -> Amount {
    amount.round_dp_with_strategy(2, RoundingStrategy::ToZero)
}

/// Format an amount as a two-decimal currency string.
/// Example: 50 -> "50.00", -12.345 -> "-12.35"
pub fn format_amount(amount: Amount) -> String {
    let rounded = round_cents(amount);
    // Avoid printing "-0.00"
    let rounded = if rounded.is_zero() { Decimal::ZERO } else { rounded };
    format!("{:.2}", rounded)
}

/// Parse a decimal string into an amount. Precision is kept as written.
/// Example: "50.00" -> 50.00, "12.5" -> 12.5, "100" -> 100
pub fn parse_amount(input: &str) -> Result<Amount, ParseAmountError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ParseAmountError::Empty);
    }
    Decimal::from_str(input).map_err(|_| ParseAmountError::InvalidFormat)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseAmountError {
    Empty,
    InvalidFormat,
}

impl fmt::Display for ParseAmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseAmountError::Empty => write!(f, "empty money amount"),
            ParseAmountError::InvalidFormat => write!(f, "invalid money format"),
        }
    }
}

impl std::error::Error for ParseAmountError {}
