use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{Data, Range, Reader, Xlsx, open_workbook, open_workbook_from_rs};
use tracing::debug;

use crate::error::ReportError;
use crate::model::{CellValue, SheetGrid};

/// Lays a calamine range out by absolute sheet position.
///
/// calamine trims leading blank rows and columns; header rows are addressed
/// by their position in the sheet, so the offset is restored here.
fn grid_from_range(range: &Range<Data>) -> SheetGrid {
    let Some((start_row, start_col)) = range.start() else {
        return SheetGrid::default();
    };
    let start_row = start_row as usize;
    let start_col = start_col as usize;
    let width = start_col + range.width();

    let mut rows = vec![Vec::new(); start_row];
    for row in range.rows() {
        let mut cells = vec![CellValue::Empty; start_col];
        cells.extend(row.iter().map(CellValue::from));
        rows.push(cells);
    }

    SheetGrid { rows, width }
}

fn read_first_sheet<RS>(workbook: &mut Xlsx<RS>) -> Result<SheetGrid, ReportError>
where
    RS: Read + Seek,
{
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ReportError::NoWorksheet)??;
    let grid = grid_from_range(&range);
    debug!(rows = grid.rows.len(), width = grid.width, "worksheet loaded");
    Ok(grid)
}

/// Reads the first worksheet of an `.xlsx` file.
pub fn read_workbook(path: &Path) -> Result<SheetGrid, ReportError> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    read_first_sheet(&mut workbook)
}

/// Reads the first worksheet of an `.xlsx` held in memory (an upload body).
pub fn read_workbook_bytes(bytes: &[u8]) -> Result<SheetGrid, ReportError> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))?;
    read_first_sheet(&mut workbook)
}
