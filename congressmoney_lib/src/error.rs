//! Error types for the library layer.

use std::fmt;

use crate::exclusions::ExclusionError;

/// Invariant violations that make every downstream estimate untrustworthy.
///
/// These abort the run: they mean the disclosure schema changed underneath us.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    /// A transaction kind outside Purchase / Sale (Full) / Sale (Partial) / Exchange.
    #[error("unknown transaction type: {0}")]
    UnknownTransactionKind(String),
    /// An amount that is not one of the ten disclosure range labels.
    #[error("unknown amount range label: {0}")]
    UnknownRangeLabel(String),
    /// The ticker markup pattern failed to compile.
    #[error("ticker markup pattern: {0}")]
    MarkupPattern(String),
}

/// Errors produced by the library layer, wrapping upstream feed errors
/// and adding ledger, configuration, and serialization failures.
#[derive(Debug)]
pub enum CongressMoneyError {
    /// An error from the underlying feed clients.
    Api(congressmoney_api::Error),
    /// A fatal ledger invariant violation.
    Ledger(LedgerError),
    /// Configuration could not be loaded or was invalid.
    Config(String),
    /// The exclusion set could not be loaded.
    Exclusion(ExclusionError),
    /// JSON serialization or deserialization failed.
    Serialization(serde_json::Error),
    /// Reading or writing a local file failed.
    Io(std::io::Error),
}

impl fmt::Display for CongressMoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api(e) => write!(f, "API error: {}", e),
            Self::Ledger(e) => write!(f, "Ledger error: {}", e),
            Self::Config(msg) => write!(f, "Config error: {}", msg),
            Self::Exclusion(e) => write!(f, "Exclusion error: {}", e),
            Self::Serialization(e) => write!(f, "Serialization error: {}", e),
            Self::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for CongressMoneyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Api(e) => Some(e),
            Self::Ledger(e) => Some(e),
            Self::Exclusion(e) => Some(e),
            Self::Serialization(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::Config(_) => None,
        }
    }
}

impl From<congressmoney_api::Error> for CongressMoneyError {
    fn from(e: congressmoney_api::Error) -> Self {
        Self::Api(e)
    }
}

impl From<LedgerError> for CongressMoneyError {
    fn from(e: LedgerError) -> Self {
        Self::Ledger(e)
    }
}

impl From<ExclusionError> for CongressMoneyError {
    fn from(e: ExclusionError) -> Self {
        Self::Exclusion(e)
    }
}

impl From<serde_json::Error> for CongressMoneyError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e)
    }
}

impl From<std::io::Error> for CongressMoneyError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
