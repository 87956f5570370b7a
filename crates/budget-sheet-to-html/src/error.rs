use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to read workbook: {0}")]
    Workbook(#[from] calamine::XlsxError),

    #[error("workbook has no worksheet")]
    NoWorksheet,

    #[error("header rows {primary},{secondary} are outside the sheet ({row_count} rows)")]
    HeaderRowsOutOfRange {
        primary: usize,
        secondary: usize,
        row_count: usize,
    },

    #[error("未找到'{0}'列，请检查表头格式是否变动。")]
    MissingIdentifierColumn(String),

    #[error("company '{0}' not found in workbook")]
    CompanyNotFound(String),

    #[error("workbook contains no company rows")]
    NoCompanies,

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("invalid theme: {0}")]
    Theme(#[from] serde_json::Error),
}
