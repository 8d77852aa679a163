//! Disclosure dollar ranges and share estimation.
//!
//! Periodic transaction reports disclose a bucket (`$15,001 - $50,000`)
//! rather than an amount. Every estimate in this crate starts from the
//! bucket midpoint.

use crate::error::LedgerError;

/// The ten dollar buckets used on periodic transaction reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountRange {
    From1Kto15K,
    From15Kto50K,
    From50Kto100K,
    From100Kto250K,
    From250Kto500K,
    From500Kto1M,
    From1Mto5M,
    From5Mto25M,
    From25Mto50M,
    Over50M,
}

impl AmountRange {
    pub const ALL: [AmountRange; 10] = [
        AmountRange::From1Kto15K,
        AmountRange::From15Kto50K,
        AmountRange::From50Kto100K,
        AmountRange::From100Kto250K,
        AmountRange::From250Kto500K,
        AmountRange::From500Kto1M,
        AmountRange::From1Mto5M,
        AmountRange::From5Mto25M,
        AmountRange::From25Mto50M,
        AmountRange::Over50M,
    ];

    /// The label exactly as it appears on the report.
    pub fn label(&self) -> &'static str {
        match self {
            AmountRange::From1Kto15K => "$1,001 - $15,000",
            AmountRange::From15Kto50K => "$15,001 - $50,000",
            AmountRange::From50Kto100K => "$50,001 - $100,000",
            AmountRange::From100Kto250K => "$100,001 - $250,000",
            AmountRange::From250Kto500K => "$250,001 - $500,000",
            AmountRange::From500Kto1M => "$500,001 - $1,000,000",
            AmountRange::From1Mto5M => "$1,000,001 - $5,000,000",
            AmountRange::From5Mto25M => "$5,000,001 - $25,000,000",
            AmountRange::From25Mto50M => "$25,000,001 - $50,000,000",
            AmountRange::Over50M => "Over $50,000,000",
        }
    }

    /// Inclusive dollar bounds. The open-ended top bucket is pinned at its floor.
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            AmountRange::From1Kto15K => (1_001.0, 15_000.0),
            AmountRange::From15Kto50K => (15_001.0, 50_000.0),
            AmountRange::From50Kto100K => (50_001.0, 100_000.0),
            AmountRange::From100Kto250K => (100_001.0, 250_000.0),
            AmountRange::From250Kto500K => (250_001.0, 500_000.0),
            AmountRange::From500Kto1M => (500_001.0, 1_000_000.0),
            AmountRange::From1Mto5M => (1_000_001.0, 5_000_000.0),
            AmountRange::From5Mto25M => (5_000_001.0, 25_000_000.0),
            AmountRange::From25Mto50M => (25_000_001.0, 50_000_000.0),
            AmountRange::Over50M => (50_000_000.0, 50_000_000.0),
        }
    }

    /// Calculate the midpoint of the range.
    pub fn midpoint(&self) -> f64 {
        let (low, high) = self.bounds();
        (low + high) / 2.0
    }

    /// Matches a label exactly, ignoring only surrounding whitespace.
    pub fn parse(label: &str) -> Result<Self, LedgerError> {
        let trimmed = label.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|range| range.label() == trimmed)
            .ok_or_else(|| LedgerError::UnknownRangeLabel(label.to_string()))
    }
}

/// Point estimate, in dollars, for a disclosed range label.
pub fn estimate_amount(label: &str) -> Result<f64, LedgerError> {
    AmountRange::parse(label).map(|range| range.midpoint())
}

/// Estimate shares from a dollar amount and the price on the trade date.
///
/// Returns None if the price is not a positive finite number.
pub fn estimate_shares(amount: f64, price: f64) -> Option<f64> {
    if !price.is_finite() || price <= 0.0 {
        return None;
    }
    let shares = amount / price;
    shares.is_finite().then_some(shares)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_label_estimates_its_midpoint() {
        let expected = [
            ("$1,001 - $15,000", 1001.0, 15000.0),
            ("$15,001 - $50,000", 15001.0, 50000.0),
            ("$50,001 - $100,000", 50001.0, 100000.0),
            ("$100,001 - $250,000", 100001.0, 250000.0),
            ("$250,001 - $500,000", 250001.0, 500000.0),
            ("$500,001 - $1,000,000", 500001.0, 1000000.0),
            ("$1,000,001 - $5,000,000", 1000001.0, 5000000.0),
            ("$5,000,001 - $25,000,000", 5000001.0, 25000000.0),
            ("$25,000,001 - $50,000,000", 25000001.0, 50000000.0),
            ("Over $50,000,000", 50000000.0, 50000000.0),
        ];
        for (label, low, high) in expected {
            assert_eq!(estimate_amount(label).unwrap(), (low + high) / 2.0, "{}", label);
        }
    }

    #[test]
    fn labels_are_distinct_and_parse_back() {
        for range in AmountRange::ALL {
            assert_eq!(AmountRange::parse(range.label()).unwrap(), range);
        }
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        assert_eq!(estimate_amount("  $1,001 - $15,000 ").unwrap(), 8000.5);
    }

    #[test]
    fn unknown_label_is_fatal() {
        let err = estimate_amount("$1,000 - $15,000").unwrap_err();
        assert_eq!(err, LedgerError::UnknownRangeLabel("$1,000 - $15,000".into()));
        assert!(estimate_amount("").is_err());
        assert!(estimate_amount("Unknown").is_err());
    }

    #[test]
    fn estimate_shares_normal() {
        let shares = estimate_shares(32500.5, 150.0).unwrap();
        assert!((shares - 216.67).abs() < 0.01);
    }

    #[test]
    fn estimate_shares_rejects_bad_prices() {
        assert!(estimate_shares(8000.0, 0.0).is_none());
        assert!(estimate_shares(8000.0, -10.0).is_none());
        assert!(estimate_shares(8000.0, f64::NAN).is_none());
    }
}
