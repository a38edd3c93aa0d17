pub mod archive;
mod error;
pub mod ledger;
pub mod reconcile;
pub mod report;
pub mod statement;
mod utils;
pub mod xlsx;

pub use error::{Error, Result};

pub type Decimal = rust_decimal::Decimal;

/// A Tax deduction Account Number, as found in either the statement or the ledger.
pub type Tan = String;

/// Passphrase of the statement archives handed out by the tax portal.
pub const DEFAULT_ARCHIVE_PASSWORD: &str = "05092006";

/// Parse a numeric field the way the reports spell amounts (`1000.00`, ` 12 `, `1.5E3`).
///
/// Anything else, including the empty string, is a missing value.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_amount_accepts_plain_numbers() {
        assert_eq!(parse_amount("1000.00"), Some(Decimal::new(100000, 2)));
        assert_eq!(parse_amount("  -50 "), Some(Decimal::from(-50)));
        assert_eq!(parse_amount("1.5E3"), Some(Decimal::from(1500)));
    }

    #[test]
    fn parse_amount_rejects_garbage() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("   "), None);
        assert_eq!(parse_amount("n/a"), None);
        assert_eq!(parse_amount("1,000.00"), None);
    }
}
