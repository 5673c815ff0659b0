//! Transaction filter engine: compound predicates over a transaction list.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::analysis::{Transaction, TransactionType};

/// Category selector value meaning "no category restriction".
pub const ALL_CATEGORIES: &str = "all";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionTypeFilter {
    #[default]
    All,
    Debit,
    Credit,
}

impl TransactionTypeFilter {
    pub fn matches(&self, kind: TransactionType) -> bool {
        match self {
            TransactionTypeFilter::All => true,
            TransactionTypeFilter::Debit => kind == TransactionType::Debit,
            TransactionTypeFilter::Credit => kind == TransactionType::Credit,
        }
    }
}

impl FromStr for TransactionTypeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(TransactionTypeFilter::All),
            "debit" => Ok(TransactionTypeFilter::Debit),
            "credit" => Ok(TransactionTypeFilter::Credit),
            other => Err(format!("unknown transaction type '{other}' (expected all, debit or credit)")),
        }
    }
}

impl fmt::Display for TransactionTypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransactionTypeFilter::All => "all",
            TransactionTypeFilter::Debit => "debit",
            TransactionTypeFilter::Credit => "credit",
        })
    }
}

/// Inclusive bounds on the signed transaction amount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmountRange {
    pub min: f64,
    pub max: f64,
}

impl AmountRange {
    /// Unbounded on both sides; the cleared state.
    pub const FULL: AmountRange = AmountRange {
        min: f64::NEG_INFINITY,
        max: f64::INFINITY,
    };

    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, amount: f64) -> bool {
        self.min <= amount && amount <= self.max
    }

    pub fn is_full(&self) -> bool {
        *self == Self::FULL
    }
}

impl Default for AmountRange {
    fn default() -> Self {
        Self::FULL
    }
}

/// The non-text part of the transaction filter.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AdvancedFilters {
    pub transaction_type: TransactionTypeFilter,
    pub amount_range: AmountRange,
    pub show_recurring: bool,
    pub show_unusual: bool,
}

impl AdvancedFilters {
    /// True iff any field differs from the cleared defaults.
    pub fn is_active(&self) -> bool {
        *self != Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn matches(&self, t: &Transaction) -> bool {
        self.transaction_type.matches(t.kind)
            && self.amount_range.contains(t.amount)
            && (!self.show_recurring || t.is_recurring)
            && (!self.show_unusual || t.is_unusual)
    }
}

/// Case-insensitive substring match on the description; empty matches all.
pub fn matches_search(t: &Transaction, search: &str) -> bool {
    search.is_empty() || t.description.to_lowercase().contains(&search.to_lowercase())
}

pub fn matches_category(t: &Transaction, category: &str) -> bool {
    category == ALL_CATEGORIES || t.category == category
}

/// Keep the transactions that satisfy every predicate, in input order.
pub fn filter_transactions<'a>(
    transactions: &'a [Transaction],
    search: &str,
    category: &str,
    advanced: &AdvancedFilters,
) -> Vec<&'a Transaction> {
    transactions
        .iter()
        .filter(|t| {
            matches_search(t, search) && matches_category(t, category) && advanced.matches(t)
        })
        .collect()
}
