use tracing::debug;

use crate::error::ReportError;
use crate::header::{duplicate_columns, flatten_headers, raw_headers_from_rows};
use crate::model::{CellValue, SheetGrid};
use crate::options::ReportOptions;

/// Data rows of the sheet under single-level column names.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
    identifier_index: usize,
}

impl FlatTable {
    /// Flattens the configured header rows and keeps rows that name a company.
    pub fn from_grid(grid: &SheetGrid, options: &ReportOptions) -> Result<Self, ReportError> {
        let header_rows = options.header_rows;
        if header_rows.secondary <= header_rows.primary {
            return Err(ReportError::InvalidOption(
                "secondary header row must follow the primary row".to_string(),
            ));
        }
        if header_rows.secondary >= grid.rows.len() {
            return Err(ReportError::HeaderRowsOutOfRange {
                primary: header_rows.primary,
                secondary: header_rows.secondary,
                row_count: grid.rows.len(),
            });
        }

        let raw = raw_headers_from_rows(
            &grid.rows[header_rows.primary],
            &grid.rows[header_rows.secondary],
            grid.width,
        );
        let columns = flatten_headers(&raw);

        let identifier_index = columns
            .iter()
            .position(|column| *column == options.identifier_column)
            .ok_or_else(|| ReportError::MissingIdentifierColumn(options.identifier_column.clone()))?;

        let total = grid.rows.len() - header_rows.secondary - 1;
        let rows = grid.rows[header_rows.secondary + 1..]
            .iter()
            .filter(|row| row.get(identifier_index).is_some_and(has_identifier))
            .map(|row| {
                let mut cells = row.clone();
                cells.resize(columns.len(), CellValue::Empty);
                cells
            })
            .collect::<Vec<_>>();

        debug!(
            columns = columns.len(),
            data_rows = total,
            kept_rows = rows.len(),
            "flattened sheet"
        );

        Ok(Self {
            columns,
            rows,
            identifier_index,
        })
    }

    #[must_use]
    pub fn identifier_column(&self) -> &str {
        &self.columns[self.identifier_index]
    }

    #[must_use]
    pub fn duplicate_columns(&self) -> Vec<String> {
        duplicate_columns(&self.columns)
    }

    /// Distinct company names in sheet order.
    #[must_use]
    pub fn companies(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for row in &self.rows {
            let name = row[self.identifier_index].to_string();
            if !out.contains(&name) {
                out.push(name);
            }
        }
        out
    }

    /// First row whose identifier equals `company`.
    #[must_use]
    pub fn record(&self, company: &str) -> Option<RecordRow<'_>> {
        self.rows
            .iter()
            .find(|row| row[self.identifier_index].to_string() == company)
            .map(|cells| RecordRow {
                columns: &self.columns,
                cells,
            })
    }

    /// Selects `company`, or the first company when none is given.
    pub fn select(&self, company: Option<&str>) -> Result<(String, RecordRow<'_>), ReportError> {
        let name = match company {
            Some(name) => name.to_string(),
            None => self
                .companies()
                .into_iter()
                .next()
                .ok_or(ReportError::NoCompanies)?,
        };

        let record = self
            .record(&name)
            .ok_or_else(|| ReportError::CompanyNotFound(name.clone()))?;
        Ok((name, record))
    }
}

/// Blank strings (formula cells returning `""`) count as missing too.
fn has_identifier(cell: &CellValue) -> bool {
    match cell {
        CellValue::Text(text) => !text.trim().is_empty(),
        other => !other.is_missing(),
    }
}

/// One data row, addressed by flat column name.
#[derive(Debug, Clone, Copy)]
pub struct RecordRow<'a> {
    columns: &'a [String],
    cells: &'a [CellValue],
}

/// A column found by name together with how many columns share that name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnHit<'a> {
    pub column: &'a str,
    pub value: &'a CellValue,
    pub matches: usize,
}

impl<'a> RecordRow<'a> {
    #[must_use]
    pub fn new(columns: &'a [String], cells: &'a [CellValue]) -> Self {
        Self { columns, cells }
    }

    fn hits(self, predicate: impl Fn(&str) -> bool) -> Option<ColumnHit<'a>> {
        let mut found = self
            .columns
            .iter()
            .zip(self.cells)
            .filter(|(column, _)| predicate(column));
        let (column, value) = found.next()?;
        Some(ColumnHit {
            column,
            value,
            matches: 1 + found.count(),
        })
    }

    /// First column named exactly `name`.
    #[must_use]
    pub fn exact(self, name: &str) -> Option<ColumnHit<'a>> {
        self.hits(|column| column == name)
    }

    /// First column whose name contains `keyword`.
    #[must_use]
    pub fn containing(self, keyword: &str) -> Option<ColumnHit<'a>> {
        self.hits(|column| column.contains(keyword))
    }
}
