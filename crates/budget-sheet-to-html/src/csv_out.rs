use std::path::Path;

use csv::WriterBuilder;

use crate::error::ReportError;
use crate::table::FlatTable;

fn write_table<W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    table: &FlatTable,
) -> Result<(), ReportError> {
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(ToString::to_string))?;
    }
    writer.flush()?;
    Ok(())
}

pub(crate) fn write_csv(path: &Path, table: &FlatTable, delimiter: u8) -> Result<(), ReportError> {
    let mut writer = WriterBuilder::new().delimiter(delimiter).from_path(path)?;
    write_table(&mut writer, table)
}

pub(crate) fn write_csv_to_string(table: &FlatTable, delimiter: u8) -> Result<String, ReportError> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::<u8>::new());
    write_table(&mut writer, table)?;

    let bytes = writer
        .into_inner()
        .map_err(|error| ReportError::Csv(error.into_error().into()))?;
    String::from_utf8(bytes)
        .map_err(|error| ReportError::InvalidOption(format!("invalid utf-8 csv output: {error}")))
}

#[cfg(test)]
mod tests {
    use super::write_csv_to_string;
    use crate::model::{CellValue, SheetGrid};
    use crate::options::{HeaderRows, ReportOptions};
    use crate::table::FlatTable;

    #[test]
    fn writes_flat_header_and_rows() {
        let grid = SheetGrid {
            rows: vec![
                vec![CellValue::text("公司简称"), CellValue::text("2026年\n营业收入")],
                vec![CellValue::Empty, CellValue::text("Unnamed: 1_level_1")],
                vec![CellValue::text("甲公司"), CellValue::Number(1200.5)],
            ],
            width: 2,
        };
        let options = ReportOptions {
            header_rows: HeaderRows {
                primary: 0,
                secondary: 1,
            },
            ..ReportOptions::default()
        };
        let table = FlatTable::from_grid(&grid, &options).expect("table should build");

        let csv = write_csv_to_string(&table, b';').expect("csv should render");
        assert_eq!(csv, "公司简称;2026年营业收入\n甲公司;1200.5\n");
    }
}
