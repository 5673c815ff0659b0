//! Terminal rendering for the upload view and the results dashboard.

use finsight_core::fmt::{format_time, group_thousands, money, signed_money};
use finsight_core::{
    AnalysisRecord, DashboardSession, InsightKind, Notification, ProcessingState, Transaction,
    UploadCandidate,
};

pub fn candidate_line(c: &UploadCandidate) -> String {
    format!("{} ({:.2} MB)", c.name, c.size_mib())
}

pub fn progress_line(state: &ProcessingState) -> String {
    let mut line = format!(
        "[{:>3.0}%] {:<10} {}",
        state.overall_progress,
        state.status.as_str(),
        state.message
    );
    if let Some(eta) = state.visible_eta() {
        line.push_str(&format!(" ({} remaining)", format_time(eta)));
    }
    line
}

pub fn notification_line(n: &Notification) -> String {
    if n.is_error() {
        format!("✗ {n}")
    } else {
        format!("✓ {n}")
    }
}

fn insight_marker(kind: InsightKind) -> &'static str {
    match kind {
        InsightKind::Positive => "+",
        InsightKind::Negative => "!",
        InsightKind::Neutral => "-",
    }
}

pub fn print_analysis(a: &AnalysisRecord) {
    println!("# {}\n", a.file_name);
    println!(
        "Statement {} | period {} to {} | uploaded {} | processed in {:.0}s\n",
        a.statement_id,
        a.statement_period.start,
        a.statement_period.end,
        a.upload_date,
        a.processing_time_seconds
    );

    let s = &a.summary;
    println!("## Summary\n");
    println!("  Total income        {:>14}", money(s.total_income));
    println!("  Total expenses      {:>14}", money(s.total_expenses));
    println!("  Net flow            {:>14}", signed_money(s.net_flow));
    println!("  Transactions        {:>14}", group_thousands(s.transaction_count));
    println!("  Average transaction {:>14}", money(s.average_transaction));

    if !a.category_breakdown.is_empty() {
        println!("\n## Spending by category\n");
        for c in &a.category_breakdown {
            println!("  {:<24} {:>12} {:>6.1}%", c.category, money(c.amount), c.percentage);
        }
    }

    if !a.monthly_trends.is_empty() {
        println!("\n## Monthly trends\n");
        for m in &a.monthly_trends {
            println!("  {:<8} in {:>12}  out {:>12}", m.month, money(m.income), money(m.expenses));
        }
    }

    if !a.top_merchants.is_empty() {
        println!("\n## Top merchants\n");
        for m in &a.top_merchants {
            println!("  {:<24} {:>12} {:>4} txns", m.merchant, money(m.amount), m.transactions);
        }
    }

    if !a.insights.is_empty() {
        println!("\n## Insights\n");
        for i in &a.insights {
            println!("  [{}] {}: {}", insight_marker(i.kind), i.title, i.description);
        }
    }

    if !a.recurring_transactions.is_empty() {
        println!("\n## Recurring\n");
        for r in &a.recurring_transactions {
            println!(
                "  {:<24} {:>10} {:<10} next {}",
                r.merchant,
                money(r.amount),
                r.frequency,
                r.next_expected
            );
        }
    }

    if !a.unusual_transactions.is_empty() {
        println!("\n## Unusual\n");
        for u in &a.unusual_transactions {
            let date = u.date.as_deref().unwrap_or("-");
            println!("  {:<10} {:<28} {:>10}  {}", date, u.description, money(u.amount), u.reason);
        }
    }
}

pub fn transaction_row(t: &Transaction) -> String {
    let mut flags = String::new();
    if t.is_recurring {
        flags.push('R');
    }
    if t.is_unusual {
        flags.push('U');
    }
    let amount = if t.is_debit() {
        money(-t.abs_amount())
    } else {
        signed_money(t.abs_amount())
    };
    format!(
        "{:<10}  {:<30} {:<16} {:>12}  {}",
        t.date, t.description, t.category, amount, flags
    )
}

pub fn print_transactions(session: &DashboardSession) {
    let rows = session.filtered();
    let total = session.analysis().transactions.len();

    let mut header = format!("Showing {} of {} transactions", rows.len(), total);
    if session.has_active_filters() {
        header.push_str(" (filters active)");
    }
    println!("{header}\n");

    for t in &rows {
        println!("{}", transaction_row(t));
        if let Some(reason) = &t.unusual_reason {
            println!("{:12}↳ {}", "", reason);
        }
    }
}
