mod csv_out;
mod dashboard;
mod error;
mod fields;
mod header;
mod html_out;
mod model;
mod numeric;
mod options;
mod table;
mod text_list;
mod warning;
mod workbook_reader;

use std::path::Path;

use tracing::debug;

use crate::csv_out::{write_csv, write_csv_to_string};
use crate::html_out::render_dashboard_html;
use crate::workbook_reader::{read_workbook, read_workbook_bytes};

pub use dashboard::{
    AMOUNT_UNIT, CashCard, CostRowKind, CostTreeRow, Dashboard, DashboardReport, ExpenseTab,
    KpiCard, PieSlice, QuarterSeries, ShareBand, Trend, build_dashboard,
};
pub use error::ReportError;
pub use fields::{ColumnRule, FieldKey, FieldResolver, MatchKind, Quarter, Resolved};
pub use header::{duplicate_columns, flatten_headers, flatten_label};
pub use model::{CellValue, RawHeader, SheetGrid};
pub use numeric::{
    FRACTION_LIMIT, MISSING_AMOUNT, PercentDisplay, amount_or_zero, format_amount_or_dash,
    format_percent, format_thousands, is_ambiguous_percentage, parse_amount, percent_points,
};
pub use options::{
    DEFAULT_IDENTIFIER_COLUMN, DEFAULT_PLOTLY_SRC, HeaderRows, RenderOptions, ReportOptions, Theme,
};
pub use table::{ColumnHit, FlatTable, RecordRow};
pub use text_list::{
    Annotation, EMPTY_PLACEHOLDER, Segment, format_text_list, parse_annotation, render_annotation,
};
pub use warning::{ReportWarning, WarningCode as ReportWarningCode};

#[derive(Debug, Clone, PartialEq)]
pub struct RenderReport {
    pub company: String,
    pub company_count: usize,
    pub warnings: Vec<ReportWarning>,
}

fn validate_options(options: &ReportOptions) -> Result<(), ReportError> {
    if options.identifier_column.trim().is_empty() {
        return Err(ReportError::InvalidOption(
            "identifier column must be non-empty".to_string(),
        ));
    }
    Ok(())
}

/// Reads an `.xlsx` file into a flattened table.
pub fn load_table(input: &Path, options: &ReportOptions) -> Result<FlatTable, ReportError> {
    validate_options(options)?;
    let grid = read_workbook(input)?;
    FlatTable::from_grid(&grid, options)
}

/// Reads `.xlsx` bytes (an upload body) into a flattened table.
pub fn load_table_from_bytes(
    input: &[u8],
    options: &ReportOptions,
) -> Result<FlatTable, ReportError> {
    validate_options(options)?;
    let grid = read_workbook_bytes(input)?;
    FlatTable::from_grid(&grid, options)
}

/// Renders the dashboard page for `company`, or for the first company.
pub fn render_table_to_html(
    table: &FlatTable,
    company: Option<&str>,
    options: &RenderOptions,
) -> Result<(String, RenderReport), ReportError> {
    let (name, record) = table.select(company)?;
    let report = build_dashboard(&name, record);
    let html = render_dashboard_html(&report.dashboard, options);
    debug!(company = %name, bytes = html.len(), "dashboard rendered");

    Ok((
        html,
        RenderReport {
            company: name,
            company_count: table.companies().len(),
            warnings: report.warnings,
        },
    ))
}

pub fn render_workbook_to_html(
    input: &Path,
    output: &Path,
    company: Option<&str>,
    report_options: &ReportOptions,
    render_options: &RenderOptions,
) -> Result<RenderReport, ReportError> {
    let table = load_table(input, report_options)?;
    let (html, report) = render_table_to_html(&table, company, render_options)?;
    std::fs::write(output, html)?;
    Ok(report)
}

pub fn render_workbook_bytes_to_html_string(
    input: &[u8],
    company: Option<&str>,
    report_options: &ReportOptions,
    render_options: &RenderOptions,
) -> Result<(String, RenderReport), ReportError> {
    let table = load_table_from_bytes(input, report_options)?;
    render_table_to_html(&table, company, render_options)
}

/// Writes the flattened table as CSV, to `output` or into the returned string.
pub fn export_flat_csv(
    table: &FlatTable,
    output: Option<&Path>,
    delimiter: u8,
) -> Result<Option<String>, ReportError> {
    match output {
        Some(path) => {
            write_csv(path, table, delimiter)?;
            Ok(None)
        }
        None => write_csv_to_string(table, delimiter).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::{ReportOptions, load_table_from_bytes};
    use crate::ReportError;

    #[test]
    fn rejects_blank_identifier_column() {
        let options = ReportOptions {
            identifier_column: "  ".to_string(),
            ..ReportOptions::default()
        };
        let err = load_table_from_bytes(b"", &options).expect_err("should fail");
        assert!(matches!(err, ReportError::InvalidOption(_)));
    }

    #[test]
    fn garbage_bytes_are_a_workbook_error() {
        let err = load_table_from_bytes(b"not a workbook", &ReportOptions::default())
            .expect_err("should fail");
        assert!(matches!(err, ReportError::Workbook(_)));
    }
}
