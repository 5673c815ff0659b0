//! Map loosely-typed backend payloads onto the strict analysis types.
//!
//! Every function here is total and pure: missing or mistyped fields fall
//! back to the defaults below, nothing panics, and the same payload always
//! yields the same value.
//!
//! | field                 | default                 |
//! |-----------------------|-------------------------|
//! | statementId           | the requested id        |
//! | fileName              | `"statement"`           |
//! | uploadDate            | `1970-01-01T00:00:00Z`  |
//! | statementPeriod       | 2024-03-01 .. 2024-03-31|
//! | numbers               | 0                       |
//! | arrays                | empty                   |
//! | insight title / type  | "Financial Insight" / neutral |
//! | transactions          | always empty (separate listing call) |

use finsight_core::{
    AnalysisRecord, CategorySpend, Insight, InsightKind, MerchantSummary, MonthlyTrend,
    RecurringTransaction, StatementPeriod, StatusUpdate, Summary, Transaction, TransactionType,
    UnusualTransaction,
};
use serde_json::Value;

pub const DEFAULT_FILE_NAME: &str = "statement";
pub const DEFAULT_UPLOAD_DATE: &str = "1970-01-01T00:00:00Z";
pub const DEFAULT_PERIOD_START: &str = "2024-03-01";
pub const DEFAULT_PERIOD_END: &str = "2024-03-31";
pub const DEFAULT_INSIGHT_TITLE: &str = "Financial Insight";
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

static NULL: Value = Value::Null;

/// Walk nested object keys; `None` if any step is missing.
fn at<'a>(v: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(v, |cur, key| cur.get(key))
}

/// First of `keys` present on `v` with a non-null value.
fn first<'a>(v: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().filter_map(|k| v.get(k)).find(|x| !x.is_null())
}

/// JSON number or numeric string; non-finite values are rejected.
fn num(v: Option<&Value>) -> Option<f64> {
    let n = match v? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

fn count(v: Option<&Value>) -> Option<u64> {
    num(v).filter(|n| *n >= 0.0).map(|n| n.round() as u64)
}

fn text(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn flag(v: Option<&Value>) -> bool {
    matches!(v, Some(Value::Bool(true)))
}

fn items(v: Option<&Value>) -> &[Value] {
    v.and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[])
}

/// The `data` envelope, or the payload itself when it is not wrapped.
fn envelope(payload: &Value) -> &Value {
    match payload.get("data") {
        Some(d) if d.is_object() => d,
        Some(_) => &NULL,
        None => payload,
    }
}

/// Normalize a `GET /v1/statements/{id}/analysis` body.
pub fn normalize_analysis(statement_id: &str, payload: &Value) -> AnalysisRecord {
    let data = envelope(payload);
    let statement = data.get("statement").unwrap_or(&NULL);
    let summary = data.get("summary").unwrap_or(&NULL);
    let analysis = data.get("analysis").unwrap_or(&NULL);

    let period_start = text(first(statement, &["periodStart"]))
        .or_else(|| text(at(statement, &["statementPeriod", "start"])))
        .unwrap_or_else(|| DEFAULT_PERIOD_START.to_string());
    let period_end = text(first(statement, &["periodEnd"]))
        .or_else(|| text(at(statement, &["statementPeriod", "end"])))
        .unwrap_or_else(|| DEFAULT_PERIOD_END.to_string());

    AnalysisRecord {
        statement_id: text(statement.get("id")).unwrap_or_else(|| statement_id.to_string()),
        file_name: text(first(statement, &["fileName", "filename", "originalName"]))
            .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string()),
        upload_date: text(first(statement, &["uploadDate", "uploadedAt", "createdAt"]))
            .unwrap_or_else(|| DEFAULT_UPLOAD_DATE.to_string()),
        statement_period: StatementPeriod {
            start: period_start,
            end: period_end,
        },
        processing_time_seconds: num(statement.get("processingTime")).map(f64::abs).unwrap_or(0.0),
        summary: normalize_summary(summary),
        category_breakdown: items(analysis.get("categories"))
            .iter()
            .map(|c| CategorySpend {
                category: text(first(c, &["category", "name"])).unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
                amount: num(first(c, &["amount", "total"])).map(f64::abs).unwrap_or(0.0),
                percentage: num(c.get("percentage")).unwrap_or(0.0),
            })
            .collect(),
        monthly_trends: items(analysis.get("monthlyBreakdown"))
            .iter()
            .map(|m| MonthlyTrend {
                month: text(m.get("month")).unwrap_or_default(),
                income: num(m.get("income")).map(f64::abs).unwrap_or(0.0),
                expenses: num(m.get("expenses")).map(f64::abs).unwrap_or(0.0),
            })
            .collect(),
        top_merchants: items(analysis.get("topMerchants"))
            .iter()
            .map(|m| MerchantSummary {
                merchant: text(first(m, &["merchant", "name"])).unwrap_or_default(),
                amount: num(first(m, &["amount", "total"])).map(f64::abs).unwrap_or(0.0),
                transactions: count(first(m, &["transactions", "count"])).unwrap_or(0),
            })
            .collect(),
        insights: items(analysis.get("insights"))
            .iter()
            .filter_map(normalize_insight)
            .collect(),
        recurring_transactions: items(at(analysis, &["patterns", "recurringPayments"]))
            .iter()
            .map(|r| RecurringTransaction {
                merchant: text(first(r, &["merchant", "name"])).unwrap_or_default(),
                amount: num(r.get("amount")).map(f64::abs).unwrap_or(0.0),
                frequency: text(r.get("frequency")).unwrap_or_default(),
                next_expected: text(r.get("nextExpected")).unwrap_or_default(),
            })
            .collect(),
        unusual_transactions: items(at(analysis, &["patterns", "unusualTransactions"]))
            .iter()
            .enumerate()
            .map(|(i, u)| UnusualTransaction {
                id: text(u.get("id")).unwrap_or_else(|| format!("unusual_{}", i + 1)),
                reason: text(u.get("reason")).unwrap_or_default(),
                amount: num(u.get("amount")).unwrap_or(0.0),
                description: text(u.get("description")).unwrap_or_default(),
                date: text(u.get("date")),
            })
            .collect(),
        transactions: Vec::new(),
    }
}

fn normalize_summary(summary: &Value) -> Summary {
    let magnitude = |key: &str| num(summary.get(key)).map(f64::abs).unwrap_or(0.0);
    Summary {
        total_income: magnitude("totalIncome"),
        total_expenses: magnitude("totalExpenses"),
        net_flow: num(summary.get("netFlow")).unwrap_or(0.0),
        transaction_count: count(summary.get("transactionCount")).unwrap_or(0),
        average_transaction: magnitude("averageTransaction"),
    }
}

/// Bare strings become neutral insights with a generic title.
fn normalize_insight(v: &Value) -> Option<Insight> {
    match v {
        Value::String(s) => Some(Insight {
            kind: InsightKind::Neutral,
            title: DEFAULT_INSIGHT_TITLE.to_string(),
            description: s.clone(),
        }),
        Value::Object(_) => Some(Insight {
            kind: text(v.get("type"))
                .map(|t| InsightKind::from_tag(&t))
                .unwrap_or(InsightKind::Neutral),
            title: text(v.get("title")).unwrap_or_else(|| DEFAULT_INSIGHT_TITLE.to_string()),
            description: text(first(v, &["description", "text", "message"])).unwrap_or_default(),
        }),
        _ => None,
    }
}

/// Normalize a `GET /v1/statements/{id}/status` body.
pub fn normalize_status(payload: &Value) -> StatusUpdate {
    let data = envelope(payload);
    let status = text(data.get("status")).unwrap_or_default().to_ascii_lowercase();
    let message = text(data.get("message"));
    match status.as_str() {
        "completed" | "complete" | "done" => StatusUpdate::Completed,
        "failed" | "error" => StatusUpdate::Failed { message },
        _ => StatusUpdate::InProgress {
            progress: num(data.get("progress")).unwrap_or(0.0),
            estimated_time_seconds: count(first(data, &["estimatedTime", "estimatedTimeSeconds"])),
            message,
        },
    }
}

/// Normalize the itemized listing, `{data:{transactions:[..]}}` or a bare array.
///
/// Amounts are signed by type: debits negative, credits positive. Entries
/// without a type are typed by sign.
pub fn normalize_transactions(payload: &Value) -> Vec<Transaction> {
    let list = match payload {
        Value::Array(a) => a.as_slice(),
        _ => {
            let data = envelope(payload);
            match data {
                Value::Array(a) => a.as_slice(),
                _ => items(data.get("transactions")),
            }
        }
    };

    list.iter()
        .enumerate()
        .filter(|(_, t)| t.is_object())
        .map(|(i, t)| {
            let raw = num(t.get("amount")).unwrap_or(0.0);
            let kind = match text(t.get("type")).map(|s| s.to_ascii_lowercase()).as_deref() {
                Some("credit") => TransactionType::Credit,
                Some("debit") => TransactionType::Debit,
                _ if raw < 0.0 => TransactionType::Debit,
                _ => TransactionType::Credit,
            };
            let amount = match kind {
                TransactionType::Debit => -raw.abs(),
                TransactionType::Credit => raw.abs(),
            };
            let description = text(t.get("description")).unwrap_or_default();
            Transaction {
                id: text(t.get("id")).unwrap_or_else(|| format!("txn_{}", i + 1)),
                date: text(t.get("date")).unwrap_or_default(),
                merchant: text(t.get("merchant")).unwrap_or_else(|| description.clone()),
                description,
                amount,
                category: text(t.get("category")).unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
                kind,
                is_recurring: flag(t.get("isRecurring")),
                is_unusual: flag(t.get("isUnusual")),
                unusual_reason: text(t.get("unusualReason")),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use std::path::PathBuf;

    fn api_sample() -> Value {
        let p = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .unwrap()
            .join("sample_api_response.json");
        serde_json::from_str(&std::fs::read_to_string(p).unwrap()).unwrap()
    }

    #[test]
    fn test_empty_data_uses_defaults() {
        let a = normalize_analysis("stmt_x", &json!({ "data": {} }));
        assert_eq!(a.statement_id, "stmt_x");
        assert_eq!(a.file_name, DEFAULT_FILE_NAME);
        assert_eq!(a.summary.total_income, 0.0);
        assert_eq!(a.summary.transaction_count, 0);
        assert!(a.category_breakdown.is_empty());
        assert!(a.insights.is_empty());
        assert!(a.transactions.is_empty());
        assert_eq!(a.statement_period.start, DEFAULT_PERIOD_START);
        assert_eq!(a.statement_period.end, DEFAULT_PERIOD_END);
    }

    #[rstest]
    #[case(json!(null))]
    #[case(json!([]))]
    #[case(json!("oops"))]
    #[case(json!({ "data": null }))]
    #[case(json!({ "data": { "summary": "n/a", "analysis": [1, 2] } }))]
    #[case(json!({ "data": { "analysis": { "categories": [null, 3, {"amount": {}}], "insights": [7, null] } } }))]
    fn test_total_on_malformed_payloads(#[case] payload: Value) {
        let a = normalize_analysis("stmt_y", &payload);
        assert_eq!(a.statement_id, "stmt_y");
        assert_eq!(a.summary, Summary::default());
        assert!(a.insights.is_empty());
    }

    #[test]
    fn test_sample_payload_mapping() {
        let a = normalize_analysis("requested", &api_sample());
        assert_eq!(a.statement_id, "stmt_1711958400000");
        assert_eq!(a.file_name, "chase_march_2024.pdf");
        assert_eq!(a.statement_period.start, "2024-03-01");
        assert_eq!(a.processing_time_seconds, 38.0);
        // numeric string accepted
        assert_eq!(a.summary.total_expenses, 4875.35);
        assert_eq!(a.summary.transaction_count, 96);

        assert_eq!(a.category_breakdown.len(), 4);
        assert_eq!(a.category_breakdown[0].category, "Housing");
        assert_eq!(a.category_breakdown[0].amount, 1800.0);
        assert_eq!(a.category_breakdown[1].category, "Food, \"Fine\" Dining");

        assert_eq!(a.top_merchants[1].merchant, "Trader Joe's");
        assert_eq!(a.top_merchants[1].transactions, 9);
        assert_eq!(a.monthly_trends.len(), 2);
        assert_eq!(a.recurring_transactions[0].frequency, "Monthly");
        assert_eq!(a.unusual_transactions[0].date.as_deref(), Some("2024-03-17"));
        assert!(a.transactions.is_empty());
    }

    #[test]
    fn test_string_insights_are_synthesized() {
        let a = normalize_analysis("s", &api_sample());
        assert_eq!(a.insights.len(), 2);
        assert_eq!(a.insights[0].kind, InsightKind::Neutral);
        assert_eq!(a.insights[0].title, DEFAULT_INSIGHT_TITLE);
        assert_eq!(a.insights[0].description, "Housing costs are 36.9% of your expenses.");
        assert_eq!(a.insights[1].kind, InsightKind::Positive);
        assert_eq!(a.insights[1].title, "Savings");
    }

    #[test]
    fn test_normalization_is_deterministic() {
        let payload = api_sample();
        let first = normalize_analysis("s", &payload);
        for _ in 0..3 {
            assert_eq!(normalize_analysis("s", &payload), first);
        }
    }

    #[test]
    fn test_statement_period_object_form() {
        let payload = json!({ "data": { "statement": {
            "statementPeriod": { "start": "2023-12-01", "end": "2023-12-31" }
        }}});
        let a = normalize_analysis("s", &payload);
        assert_eq!(a.statement_period.start, "2023-12-01");
        assert_eq!(a.statement_period.end, "2023-12-31");
    }

    #[test]
    fn test_negative_net_flow_kept() {
        let payload = json!({ "data": { "summary": {
            "totalIncome": 100, "totalExpenses": -250, "netFlow": -150
        }}});
        let a = normalize_analysis("s", &payload);
        assert_eq!(a.summary.total_expenses, 250.0);
        assert_eq!(a.summary.net_flow, -150.0);
    }

    #[rstest]
    #[case(json!({"data": {"status": "completed"}}), StatusUpdate::Completed)]
    #[case(json!({"data": {"status": "FAILED", "message": "bad pdf"}}), StatusUpdate::Failed { message: Some("bad pdf".into()) })]
    #[case(
        json!({"data": {"status": "processing", "progress": 42.5, "estimatedTime": 60}}),
        StatusUpdate::InProgress { progress: 42.5, estimated_time_seconds: Some(60), message: None }
    )]
    #[case(json!({}), StatusUpdate::InProgress { progress: 0.0, estimated_time_seconds: None, message: None })]
    fn test_normalize_status(#[case] payload: Value, #[case] expected: StatusUpdate) {
        assert_eq!(normalize_status(&payload), expected);
    }

    #[test]
    fn test_transactions_signed_by_type() {
        let payload = json!({ "data": { "transactions": [
            { "id": "a", "description": "Rent", "amount": 1200, "type": "debit", "isRecurring": true },
            { "id": "b", "description": "Refund", "amount": "25.00", "type": "credit" },
            { "description": "ATM", "amount": -200 },
            "junk"
        ]}});
        let t = normalize_transactions(&payload);
        assert_eq!(t.len(), 3);
        assert_eq!(t[0].amount, -1200.0);
        assert!(t[0].is_recurring);
        assert_eq!(t[1].amount, 25.0);
        assert_eq!(t[1].kind, TransactionType::Credit);
        assert_eq!(t[2].kind, TransactionType::Debit);
        assert_eq!(t[2].id, "txn_3");
        assert_eq!(t[2].merchant, "ATM");
        assert_eq!(t[2].category, DEFAULT_CATEGORY);
    }

    #[test]
    fn test_transactions_bare_array() {
        let t = normalize_transactions(&json!([{ "id": "x", "amount": 5 }]));
        assert_eq!(t.len(), 1);
        assert_eq!(t[0].kind, TransactionType::Credit);
    }
}
