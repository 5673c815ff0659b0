//! Analysis record types: the normalized result of one statement's analysis.

use serde::{Deserialize, Serialize};

/// Derived analysis for a single uploaded statement.
///
/// Immutable once loaded into a dashboard session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub statement_id: String,
    pub file_name: String,
    /// ISO-8601 timestamp as reported by the backend
    pub upload_date: String,
    pub statement_period: StatementPeriod,
    pub processing_time_seconds: f64,
    pub summary: Summary,
    pub category_breakdown: Vec<CategorySpend>,
    pub monthly_trends: Vec<MonthlyTrend>,
    pub top_merchants: Vec<MerchantSummary>,
    pub insights: Vec<Insight>,
    pub recurring_transactions: Vec<RecurringTransaction>,
    pub unusual_transactions: Vec<UnusualTransaction>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementPeriod {
    pub start: String,
    pub end: String,
}

/// Headline totals. Currency fields are non-negative except `net_flow`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_income: f64,
    pub total_expenses: f64,
    pub net_flow: f64,
    pub transaction_count: u64,
    pub average_transaction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySpend {
    pub category: String,
    pub amount: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTrend {
    pub month: String,
    pub income: f64,
    pub expenses: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantSummary {
    pub merchant: String,
    pub amount: f64,
    pub transactions: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Positive,
    Negative,
    Neutral,
}

impl InsightKind {
    /// Lenient parse used for backend payloads; unknown tags are neutral.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "positive" => InsightKind::Positive,
            "negative" => InsightKind::Negative,
            _ => InsightKind::Neutral,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringTransaction {
    pub merchant: String,
    pub amount: f64,
    pub frequency: String,
    pub next_expected: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnusualTransaction {
    pub id: String,
    pub reason: String,
    pub amount: f64,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Credit,
    Debit,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Credit => "credit",
            TransactionType::Debit => "debit",
        }
    }
}

/// One itemized statement line. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub date: String,
    pub description: String,
    /// Signed: negative = debit, positive = credit
    pub amount: f64,
    pub category: String,
    pub merchant: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub is_unusual: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unusual_reason: Option<String>,
}

impl Transaction {
    pub fn is_debit(&self) -> bool {
        self.kind == TransactionType::Debit
    }

    pub fn abs_amount(&self) -> f64 {
        self.amount.abs()
    }
}

impl AnalysisRecord {
    /// Distinct transaction categories in first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for t in &self.transactions {
            if !out.contains(&t.category.as_str()) {
                out.push(&t.category);
            }
        }
        out
    }

    /// Sum of category percentages; ~100 for a well-formed breakdown.
    pub fn category_percentage_total(&self) -> f64 {
        self.category_breakdown.iter().map(|c| c.percentage).sum()
    }

    /// A copy of this record carrying a separately fetched transaction list.
    pub fn with_transactions(mut self, transactions: Vec<Transaction>) -> Self {
        self.transactions = transactions;
        self
    }
}
