use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use serde::Deserialize;

use super::aggregator::{BillRow, OccupancyRow, Report, ReportSummary, RevenueRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Excel,
    Pdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Excel => "xlsx",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Excel => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            ExportFormat::Pdf => "application/pdf",
        }
    }
}

/// A row type that knows how to lay itself out on a worksheet.
pub trait SheetRow {
    const SHEET_NAME: &'static str;
    const HEADERS: &'static [&'static str];

    fn write_row(&self, worksheet: &mut Worksheet, row: u32) -> Result<(), XlsxError>;

    /// The same row as display text, one entry per header.
    fn cells(&self) -> Vec<String>;
}

impl SheetRow for RevenueRow {
    const SHEET_NAME: &'static str = "Revenue";
    const HEADERS: &'static [&'static str] = &[
        "Period",
        "Paid revenue",
        "Pending revenue",
        "Total revenue",
        "Paid bills",
        "Unpaid bills",
        "Overdue bills",
        "Total bills",
    ];

    fn write_row(&self, worksheet: &mut Worksheet, row: u32) -> Result<(), XlsxError> {
        worksheet.write_string(row, 0, &self.period)?;
        worksheet.write_number(row, 1, self.paid_revenue as f64)?;
        worksheet.write_number(row, 2, self.pending_revenue as f64)?;
        worksheet.write_number(row, 3, self.total_revenue as f64)?;
        worksheet.write_number(row, 4, self.paid_bills as f64)?;
        worksheet.write_number(row, 5, self.unpaid_bills as f64)?;
        worksheet.write_number(row, 6, self.overdue_bills as f64)?;
        worksheet.write_number(row, 7, self.total_bills as f64)?;
        Ok(())
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.period.clone(),
            self.paid_revenue.to_string(),
            self.pending_revenue.to_string(),
            self.total_revenue.to_string(),
            self.paid_bills.to_string(),
            self.unpaid_bills.to_string(),
            self.overdue_bills.to_string(),
            self.total_bills.to_string(),
        ]
    }
}

impl SheetRow for OccupancyRow {
    const SHEET_NAME: &'static str = "Occupancy";
    const HEADERS: &'static [&'static str] = &["Period", "Total rooms", "Occupied rooms", "Occupancy rate (%)"];

    fn write_row(&self, worksheet: &mut Worksheet, row: u32) -> Result<(), XlsxError> {
        worksheet.write_string(row, 0, &self.period)?;
        worksheet.write_number(row, 1, self.total_rooms as f64)?;
        worksheet.write_number(row, 2, self.occupied_rooms as f64)?;
        worksheet.write_number(row, 3, self.occupancy_rate)?;
        Ok(())
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.period.clone(),
            self.total_rooms.to_string(),
            self.occupied_rooms.to_string(),
            format!("{:.2}", self.occupancy_rate),
        ]
    }
}

impl SheetRow for BillRow {
    const SHEET_NAME: &'static str = "Bills";
    const HEADERS: &'static [&'static str] = &[
        "Period",
        "Total bills",
        "Paid bills",
        "Unpaid bills",
        "Overdue bills",
        "Total amount",
        "Paid amount",
        "Unpaid amount",
    ];

    fn write_row(&self, worksheet: &mut Worksheet, row: u32) -> Result<(), XlsxError> {
        worksheet.write_string(row, 0, &self.period)?;
        worksheet.write_number(row, 1, self.total_bills as f64)?;
        worksheet.write_number(row, 2, self.paid_bills as f64)?;
        worksheet.write_number(row, 3, self.unpaid_bills as f64)?;
        worksheet.write_number(row, 4, self.overdue_bills as f64)?;
        worksheet.write_number(row, 5, self.total_amount as f64)?;
        worksheet.write_number(row, 6, self.paid_amount as f64)?;
        worksheet.write_number(row, 7, self.unpaid_amount as f64)?;
        Ok(())
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.period.clone(),
            self.total_bills.to_string(),
            self.paid_bills.to_string(),
            self.unpaid_bills.to_string(),
            self.overdue_bills.to_string(),
            self.total_amount.to_string(),
            self.paid_amount.to_string(),
            self.unpaid_amount.to_string(),
        ]
    }
}

fn summary_lines(summary: &ReportSummary) -> [(&'static str, String); 9] {
    [
        ("From", summary.period.from.to_string()),
        ("To", summary.period.to.to_string()),
        ("Months", summary.period.months.to_string()),
        ("Total revenue", summary.total_revenue.to_string()),
        ("Paid revenue", summary.paid_revenue.to_string()),
        ("Pending revenue", summary.pending_revenue.to_string()),
        ("Total bills", summary.total_bills.to_string()),
        ("Average occupancy (%)", format!("{:.2}", summary.average_occupancy)),
        ("Total tenants", summary.total_tenants.to_string()),
    ]
}

fn write_summary(worksheet: &mut Worksheet, summary: &ReportSummary, bold: &Format) -> Result<(), XlsxError> {
    worksheet.set_name("Summary")?;
    for (i, (label, value)) in summary_lines(summary).iter().enumerate() {
        worksheet.write_string_with_format(i as u32, 0, *label, bold)?;
        worksheet.write_string(i as u32, 1, value)?;
    }
    Ok(())
}

/// Renders a report as an xlsx workbook: the rows on the first sheet, the
/// summary on the second.
pub fn export_xlsx<T: SheetRow>(report: &Report<T>) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let data_sheet = workbook.add_worksheet();
    data_sheet.set_name(T::SHEET_NAME)?;
    for (col, header) in T::HEADERS.iter().enumerate() {
        data_sheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }
    for (i, row) in report.report_data.iter().enumerate() {
        row.write_row(data_sheet, (i + 1) as u32)?;
    }

    let summary_sheet = workbook.add_worksheet();
    write_summary(summary_sheet, &report.summary, &bold)?;

    workbook.save_to_buffer()
}

// A4 landscape, in millimetres.
const PAGE_WIDTH: f32 = 297.0;
const PAGE_HEIGHT: f32 = 210.0;
const MARGIN: f32 = 12.0;
const LINE_HEIGHT: f32 = 6.0;
const FONT_SIZE: f32 = 9.0;

/// Writes lines top to bottom, starting a new page when one fills up.
struct PdfCursor<'a> {
    doc: &'a printpdf::PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
}

impl PdfCursor<'_> {
    fn line(&mut self, cells: &[String], font: &IndirectFontRef) {
        if self.y < MARGIN {
            let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT - MARGIN;
        }
        let column_width = (PAGE_WIDTH - 2.0 * MARGIN) / cells.len().max(1) as f32;
        for (col, text) in cells.iter().enumerate() {
            let x = MARGIN + col as f32 * column_width;
            self.layer.use_text(text.as_str(), FONT_SIZE, Mm(x), Mm(self.y), font);
        }
        self.y -= LINE_HEIGHT;
    }
}

/// Renders a report as a PDF: the rows as a table, then the summary.
pub fn export_pdf<T: SheetRow>(report: &Report<T>) -> Result<Vec<u8>, printpdf::Error> {
    let title = format!("{} report", T::SHEET_NAME);
    let (doc, page, layer) = PdfDocument::new(title.as_str(), Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

    let mut cursor = PdfCursor {
        layer: doc.get_page(page).get_layer(layer),
        doc: &doc,
        y: PAGE_HEIGHT - MARGIN,
    };
    cursor.line(&[title.clone()], &bold);
    cursor.line(&[], &regular);

    let headers: Vec<String> = T::HEADERS.iter().map(|h| h.to_string()).collect();
    cursor.line(&headers, &bold);
    for row in &report.report_data {
        cursor.line(&row.cells(), &regular);
    }

    cursor.line(&[], &regular);
    cursor.line(&["Summary".to_string()], &bold);
    for (label, value) in summary_lines(&report.summary) {
        cursor.line(&[label.to_string(), value], &regular);
    }
    drop(cursor);

    doc.save_to_bytes()
}

pub fn export_file_name(kind: &str, summary: &ReportSummary, format: ExportFormat) -> String {
    format!(
        "{kind}_report_{}_{}.{}",
        summary.period.from.format("%Y%m%d"),
        summary.period.to.format("%Y%m%d"),
        format.extension()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::enums::BillStatus;
    use crate::reports::aggregator::fixtures::*;
    use crate::reports::aggregator::{bill_report, occupancy_report, revenue_report, ReportInput, ReportRange};

    #[test]
    fn revenue_workbook_is_a_zip_archive() {
        let bills = vec![bill(1, 1, 1, 2024, 1, 3_000_000, BillStatus::Paid)];
        let input = ReportInput {
            bills: &bills,
            rooms: &[],
            contracts: &[],
            contract_tenants: &[],
        };
        let range = ReportRange::new(d(2024, 1, 1), d(2024, 2, 29), vec![]).unwrap();
        let report = revenue_report(&range, input).unwrap();

        let bytes = export_xlsx(&report).unwrap();
        assert!(bytes.len() > 100);
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn pdf_starts_with_the_pdf_header() {
        let bills = vec![
            bill(1, 1, 1, 2024, 1, 3_000_000, BillStatus::Paid),
            bill(2, 2, 2, 2024, 2, 2_500_000, BillStatus::Overdue),
        ];
        let input = ReportInput {
            bills: &bills,
            rooms: &[],
            contracts: &[],
            contract_tenants: &[],
        };
        let range = ReportRange::new(d(2024, 1, 1), d(2024, 2, 29), vec![]).unwrap();
        let report = bill_report(&range, input).unwrap();

        let bytes = export_pdf(&report).unwrap();
        assert!(bytes.len() > 100);
        assert_eq!(&bytes[..4], b"%PDF");
    }

    #[test]
    fn long_reports_spill_onto_more_pages() {
        let range = ReportRange::new(d(2019, 1, 1), d(2024, 12, 31), vec![]).unwrap();
        let input = ReportInput {
            bills: &[],
            rooms: &[],
            contracts: &[],
            contract_tenants: &[],
        };
        let report = occupancy_report(&range, input).unwrap();
        assert_eq!(report.report_data.len(), 72);

        let bytes = export_pdf(&report).unwrap();
        assert_eq!(&bytes[..4], b"%PDF");
    }

    #[test]
    fn cells_line_up_with_headers() {
        let bills = vec![bill(1, 1, 1, 2024, 1, 3_000_000, BillStatus::Paid)];
        let input = ReportInput {
            bills: &bills,
            rooms: &[],
            contracts: &[],
            contract_tenants: &[],
        };
        let range = ReportRange::new(d(2024, 1, 1), d(2024, 1, 31), vec![]).unwrap();
        let revenue = revenue_report(&range, input).unwrap();
        assert_eq!(revenue.report_data[0].cells().len(), RevenueRow::HEADERS.len());
        assert_eq!(revenue.report_data[0].cells()[1], "3000000");
        let bills_report = bill_report(&range, input).unwrap();
        assert_eq!(bills_report.report_data[0].cells().len(), BillRow::HEADERS.len());
        let occupancy = occupancy_report(&range, input).unwrap();
        assert_eq!(occupancy.report_data[0].cells(), vec!["2024-01", "0", "0", "0.00"]);
    }

    #[test]
    fn file_name_includes_range() {
        let range = ReportRange::new(d(2024, 1, 1), d(2024, 3, 31), vec![]).unwrap();
        let input = ReportInput {
            bills: &[],
            rooms: &[],
            contracts: &[],
            contract_tenants: &[],
        };
        let report = revenue_report(&range, input).unwrap();
        assert_eq!(
            export_file_name("revenue", &report.summary, ExportFormat::Excel),
            "revenue_report_20240101_20240331.xlsx"
        );
        assert_eq!(
            export_file_name("revenue", &report.summary, ExportFormat::Pdf),
            "revenue_report_20240101_20240331.pdf"
        );
    }

    #[test]
    fn format_parses_from_query_value() {
        let format: ExportFormat = serde_json::from_str("\"excel\"").unwrap();
        assert_eq!(format, ExportFormat::Excel);
        let format: ExportFormat = serde_json::from_str("\"pdf\"").unwrap();
        assert_eq!(format, ExportFormat::Pdf);
    }
}
