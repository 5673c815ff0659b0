use std::io::BufWriter;

use finsight_core::fmt::{group_thousands, money, signed_money};
use finsight_core::AnalysisRecord;
use printpdf::{
    BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerIndex,
    PdfPageIndex, Point,
};

use crate::{safe_stem, ExportArtifact, ExportError};

// US Letter dimensions (mm)
const PAGE_W: f32 = 215.9;
const PAGE_H: f32 = 279.4;
const MARGIN_TOP: f32 = 25.4;
const MARGIN_BOTTOM: f32 = 25.4;
const MARGIN_LEFT: f32 = 19.05;
const MARGIN_RIGHT: f32 = 19.05;
const ROW_H: f32 = 6.0;
const FONT_SIZE: f32 = 10.0;
const TITLE_SIZE: f32 = 20.0;
const HEADING_SIZE: f32 = 14.0;

pub const REPORT_TITLE: &str = "FinSight Financial Report";
pub const MAX_INSIGHTS: usize = 5;
pub const MAX_MERCHANTS: usize = 10;
pub const WRAP_COLUMNS: usize = 90;

fn approx_text_width(text: &str, size: f32) -> f32 {
    text.len() as f32 * size * 0.18
}

struct PdfWriter {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    current_page: PdfPageIndex,
    current_layer: PdfLayerIndex,
    y: f32,
    pages: usize,
}

fn pdf_err(e: impl std::fmt::Debug) -> ExportError {
    ExportError::Pdf(format!("{e:?}"))
}

impl PdfWriter {
    fn new(title: &str) -> Result<Self, ExportError> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
        let font = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_err)?;
        Ok(Self {
            doc,
            font,
            font_bold,
            current_page: page,
            current_layer: layer,
            y: MARGIN_TOP,
            pages: 1,
        })
    }

    fn pdf_y(&self) -> f32 {
        PAGE_H - self.y
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer");
        self.current_page = page;
        self.current_layer = layer;
        self.y = MARGIN_TOP;
        self.pages += 1;
    }

    fn ensure_space(&mut self, needed: f32) {
        if self.y + needed > PAGE_H - MARGIN_BOTTOM {
            self.new_page();
        }
    }

    fn text(&self, s: &str, x: f32, size: f32, bold: bool) {
        let font = if bold { &self.font_bold } else { &self.font };
        let layer = self
            .doc
            .get_page(self.current_page)
            .get_layer(self.current_layer);
        layer.use_text(s, size, Mm(x), Mm(self.pdf_y()), font);
    }

    fn text_right(&self, s: &str, right_edge: f32, size: f32) {
        self.text(s, right_edge - approx_text_width(s, size), size, false);
    }

    fn hline(&self) {
        let layer = self
            .doc
            .get_page(self.current_page)
            .get_layer(self.current_layer);
        layer.set_outline_thickness(0.5);
        layer.add_line(Line {
            points: vec![
                (Point::new(Mm(MARGIN_LEFT), Mm(self.pdf_y())), false),
                (Point::new(Mm(PAGE_W - MARGIN_RIGHT), Mm(self.pdf_y())), false),
            ],
            is_closed: false,
        });
    }

    fn heading(&mut self, s: &str) {
        // keep a heading together with its first row
        self.ensure_space(2.0 * ROW_H + 2.0);
        self.text(s, MARGIN_LEFT, HEADING_SIZE, true);
        self.y += ROW_H + 2.0;
    }

    fn line(&mut self, s: &str) {
        self.ensure_space(ROW_H);
        self.text(s, MARGIN_LEFT, FONT_SIZE, false);
        self.y += ROW_H;
    }

    fn gap(&mut self) {
        self.y += ROW_H;
    }

    fn to_bytes(self) -> Result<Vec<u8>, ExportError> {
        let mut buf = BufWriter::new(Vec::new());
        self.doc.save(&mut buf).map_err(pdf_err)?;
        buf.into_inner().map_err(|e| ExportError::Io(e.into_error()))
    }
}

pub fn pdf_file_name(analysis: &AnalysisRecord) -> String {
    format!("finsight-report-{}.pdf", safe_stem(&analysis.file_name))
}

/// Page 1: title, metadata, summary and key insights. Top merchants start a
/// new page, only when there are any. Empty sections are left out and any
/// section that outgrows its page continues on the next one.
pub fn render_pdf(analysis: &AnalysisRecord) -> Result<ExportArtifact, ExportError> {
    let bytes = layout(analysis)?.to_bytes()?;
    tracing::debug!(bytes = bytes.len(), "pdf rendered");
    Ok(ExportArtifact {
        file_name: pdf_file_name(analysis),
        bytes,
    })
}

fn layout(analysis: &AnalysisRecord) -> Result<PdfWriter, ExportError> {
    let mut pdf = PdfWriter::new(REPORT_TITLE)?;

    pdf.text(REPORT_TITLE, MARGIN_LEFT, TITLE_SIZE, true);
    pdf.y += 10.0;
    pdf.line(&format!("File: {}", analysis.file_name));
    pdf.line(&format!(
        "Period: {} to {}",
        analysis.statement_period.start, analysis.statement_period.end
    ));
    pdf.line(&format!("Uploaded: {}", analysis.upload_date));
    let generated = chrono::Local::now().format("Generated %Y-%m-%d %H:%M").to_string();
    pdf.text(&generated, MARGIN_LEFT, 8.0, false);
    pdf.y += 4.0;
    pdf.hline();
    pdf.gap();

    let s = &analysis.summary;
    pdf.heading("Financial Summary");
    pdf.line(&format!("Total Income: {}", money(s.total_income)));
    pdf.line(&format!("Total Expenses: {}", money(s.total_expenses)));
    pdf.line(&format!("Net Flow: {}", signed_money(s.net_flow)));
    pdf.line(&format!("Transactions: {}", group_thousands(s.transaction_count)));
    pdf.line(&format!("Average Transaction: {}", money(s.average_transaction)));

    if !analysis.insights.is_empty() {
        pdf.gap();
        pdf.heading("Key Insights");
        for (i, insight) in analysis.insights.iter().take(MAX_INSIGHTS).enumerate() {
            let numbered = format!("{}. {}", i + 1, insight.description);
            for wrapped in textwrap::wrap(&numbered, WRAP_COLUMNS) {
                pdf.line(&wrapped);
            }
        }
    }

    if !analysis.top_merchants.is_empty() {
        pdf.new_page();
        pdf.heading("Top Merchants");

        let amount_right = MARGIN_LEFT + 140.0;
        let count_right = PAGE_W - MARGIN_RIGHT;
        pdf.ensure_space(2.0 * ROW_H);
        pdf.text("Merchant", MARGIN_LEFT, FONT_SIZE, true);
        pdf.text("Amount", amount_right - approx_text_width("Amount", FONT_SIZE), FONT_SIZE, true);
        pdf.text(
            "Transactions",
            count_right - approx_text_width("Transactions", FONT_SIZE),
            FONT_SIZE,
            true,
        );
        pdf.y += ROW_H - 2.0;
        pdf.hline();
        pdf.y += 4.0;

        for m in analysis.top_merchants.iter().take(MAX_MERCHANTS) {
            pdf.ensure_space(ROW_H);
            pdf.text(&m.merchant, MARGIN_LEFT, FONT_SIZE, false);
            pdf.text_right(&money(m.amount), amount_right, FONT_SIZE);
            pdf.text_right(&m.transactions.to_string(), count_right, FONT_SIZE);
            pdf.y += ROW_H;
        }
    }

    Ok(pdf)
}
