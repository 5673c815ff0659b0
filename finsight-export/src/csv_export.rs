//! Sectioned CSV export. Every field is quoted; rows in different sections
//! have different widths, so the writer runs in flexible mode.

use csv::{QuoteStyle, WriterBuilder};
use finsight_core::AnalysisRecord;

use crate::{safe_stem, ExportArtifact, ExportError};

pub const SECTION_SUMMARY: &str = "FINANCIAL SUMMARY";
pub const SECTION_CATEGORIES: &str = "SPENDING BY CATEGORY";
pub const SECTION_MERCHANTS: &str = "TOP MERCHANTS";

pub fn csv_file_name(analysis: &AnalysisRecord) -> String {
    format!("finsight-data-{}.csv", safe_stem(&analysis.file_name))
}

fn amount(v: f64) -> String {
    format!("{v:.2}")
}

pub fn render_csv(analysis: &AnalysisRecord) -> Result<ExportArtifact, ExportError> {
    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .flexible(true)
        .from_writer(Vec::new());

    let s = &analysis.summary;
    let period = format!(
        "{} to {}",
        analysis.statement_period.start, analysis.statement_period.end
    );

    wtr.write_record([SECTION_SUMMARY])?;
    wtr.write_record(["Metric", "Value"])?;
    wtr.write_record(["File Name", analysis.file_name.as_str()])?;
    wtr.write_record(["Statement Period", period.as_str()])?;
    wtr.write_record(["Total Income", &amount(s.total_income)])?;
    wtr.write_record(["Total Expenses", &amount(s.total_expenses)])?;
    wtr.write_record(["Net Flow", &amount(s.net_flow)])?;
    wtr.write_record(["Transaction Count", &s.transaction_count.to_string()])?;
    wtr.write_record(["Average Transaction", &amount(s.average_transaction)])?;
    wtr.write_record([""])?;

    wtr.write_record([SECTION_CATEGORIES])?;
    wtr.write_record(["Category", "Amount", "Percentage"])?;
    for c in &analysis.category_breakdown {
        wtr.write_record([
            c.category.as_str(),
            &amount(c.amount),
            &format!("{:.1}%", c.percentage),
        ])?;
    }
    wtr.write_record([""])?;

    wtr.write_record([SECTION_MERCHANTS])?;
    wtr.write_record(["Merchant", "Amount", "Transactions"])?;
    for m in &analysis.top_merchants {
        wtr.write_record([m.merchant.as_str(), &amount(m.amount), &m.transactions.to_string()])?;
    }

    let bytes = wtr.into_inner().map_err(|e| ExportError::Io(e.into_error()))?;
    tracing::debug!(
        categories = analysis.category_breakdown.len(),
        merchants = analysis.top_merchants.len(),
        "csv rendered"
    );
    Ok(ExportArtifact {
        file_name: csv_file_name(analysis),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample() -> AnalysisRecord {
        let p = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .unwrap()
            .join("sample_analysis.json");
        serde_json::from_str(&std::fs::read_to_string(p).unwrap()).unwrap()
    }

    #[test]
    fn test_file_name() {
        let a = sample();
        assert_eq!(csv_file_name(&a), "finsight-data-bank_statement_march_2024.pdf.csv");
    }

    #[test]
    fn test_every_field_quoted() {
        let out = render_csv(&sample()).unwrap();
        let text = String::from_utf8(out.bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("\"FINANCIAL SUMMARY\""));
        assert_eq!(lines.next(), Some("\"Metric\",\"Value\""));
        assert!(text.contains("\"Total Income\",\"5420.50\""));
        assert!(text.contains("\"Transaction Count\",\"127\""));
        for line in text.lines() {
            assert!(line.starts_with('"') && line.ends_with('"'), "unquoted: {line}");
        }
    }

    #[test]
    fn test_sections_in_order() {
        let text = String::from_utf8(render_csv(&sample()).unwrap().bytes).unwrap();
        let a = text.find(SECTION_SUMMARY).unwrap();
        let b = text.find(SECTION_CATEGORIES).unwrap();
        let c = text.find(SECTION_MERCHANTS).unwrap();
        assert!(a < b && b < c);
    }
}
