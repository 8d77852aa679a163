//! Senator and transaction types from the aggregate disclosure feed.

use serde::{Deserialize, Serialize};

/// Sentinel the feed uses in the ticker column when no ticker was disclosed.
pub const NO_TICKER: &str = "--";

/// One senator and every periodic transaction report line attributed to them.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Senator {
    pub first_name: String,

    pub last_name: String,

    #[serde(default)]
    pub office: Option<String>,

    #[serde(default)]
    pub transactions: Vec<RawTransaction>,
}

impl Senator {
    /// Display name as "First Last".
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }
}

/// A single disclosed trade exactly as the feed reports it.
///
/// Every field is optional on the wire; records with gaps are kept and
/// classified downstream rather than rejected at deserialization.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct RawTransaction {
    /// `MM/DD/YYYY` in the aggregate feed.
    #[serde(default)]
    pub transaction_date: Option<String>,

    #[serde(default)]
    pub owner: Option<String>,

    /// May carry HTML markup or the [`NO_TICKER`] sentinel. Exchange rows list
    /// the acquired ticker first, then the disposed one.
    #[serde(default)]
    pub ticker: Option<String>,

    #[serde(default)]
    pub asset_description: Option<String>,

    #[serde(default)]
    pub asset_type: Option<String>,

    /// Kind label, e.g. `Purchase` or `Sale (Partial)`.
    #[serde(default, rename = "type")]
    pub tx_type: Option<String>,

    /// One of the disclosure-law dollar range labels.
    #[serde(default)]
    pub amount: Option<String>,

    #[serde(default)]
    pub comment: Option<String>,

    #[serde(default)]
    pub ptr_link: Option<String>,
}

/// The four transaction kinds a periodic transaction report can contain.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxKind {
    Purchase,
    #[serde(rename = "Sale (Full)")]
    SaleFull,
    #[serde(rename = "Sale (Partial)")]
    SalePartial,
    Exchange,
}

impl TxKind {
    /// Parses a feed label. Returns `None` for anything outside the four kinds.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim() {
            "Purchase" => Some(TxKind::Purchase),
            "Sale (Full)" => Some(TxKind::SaleFull),
            "Sale (Partial)" => Some(TxKind::SalePartial),
            "Exchange" => Some(TxKind::Exchange),
            _ => None,
        }
    }

    pub fn is_sale(&self) -> bool {
        matches!(self, TxKind::SaleFull | TxKind::SalePartial)
    }
}

impl std::fmt::Display for TxKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                TxKind::Purchase => "Purchase",
                TxKind::SaleFull => "Sale (Full)",
                TxKind::SalePartial => "Sale (Partial)",
                TxKind::Exchange => "Exchange",
            }
        )
    }
}
