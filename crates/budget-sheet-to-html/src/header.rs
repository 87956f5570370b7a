use std::collections::HashMap;

use crate::model::{CellValue, RawHeader};

const UNNAMED_MARKER: &str = "Unnamed";
const MISSING_MARKER: &str = "nan";

fn is_absent_label(label: &str) -> bool {
    label.is_empty() || label.contains(UNNAMED_MARKER) || label == MISSING_MARKER
}

fn strip_layout_chars(label: &str) -> String {
    label
        .chars()
        .filter(|ch| !matches!(ch, '\n' | '\r' | ' '))
        .collect()
}

/// Collapses one two-level header into a single column name.
///
/// The secondary label wins unless it is blank, a placeholder, or `nan`.
/// Line breaks and spaces left over from merged cells are removed.
#[must_use]
pub fn flatten_label(header: &RawHeader) -> String {
    let primary = header.primary.trim();
    let secondary = header.secondary.trim();

    let chosen = if is_absent_label(secondary) {
        primary
    } else {
        secondary
    };
    strip_layout_chars(chosen)
}

#[must_use]
pub fn flatten_headers(headers: &[RawHeader]) -> Vec<String> {
    headers.iter().map(flatten_label).collect()
}

fn header_text(cell: Option<&CellValue>) -> String {
    cell.map(CellValue::to_string).unwrap_or_default()
}

/// Pairs the primary and secondary header rows column by column.
///
/// Merged cells only carry their label in the first column they span, so
/// blank primary cells inherit the label to their left.
pub(crate) fn raw_headers_from_rows(
    primary: &[CellValue],
    secondary: &[CellValue],
    width: usize,
) -> Vec<RawHeader> {
    let mut last_primary = String::new();
    (0..width)
        .map(|index| {
            let own = header_text(primary.get(index));
            if !own.trim().is_empty() {
                last_primary = own;
            }
            RawHeader::new(last_primary.clone(), header_text(secondary.get(index)))
        })
        .collect()
}

/// Names that occur more than once, in order of first appearance.
#[must_use]
pub fn duplicate_columns(columns: &[String]) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for column in columns {
        *counts.entry(column.as_str()).or_insert(0) += 1;
    }

    let mut out: Vec<String> = Vec::new();
    for column in columns {
        if counts.get(column.as_str()).is_some_and(|count| *count > 1)
            && !column.is_empty()
            && !out.contains(column)
        {
            out.push(column.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{duplicate_columns, flatten_headers, flatten_label, raw_headers_from_rows};
    use crate::model::{CellValue, RawHeader};

    #[test]
    fn placeholder_secondary_falls_back_to_primary() {
        let header = RawHeader::new(" 2026年\n营业收入 ", "Unnamed: 5_level_1");
        assert_eq!(flatten_label(&header), "2026年营业收入");
    }

    #[test]
    fn meaningful_secondary_wins() {
        let header = RawHeader::new("2025年度收入按季度分", " 1Q25 ");
        assert_eq!(flatten_label(&header), "1Q25");
    }

    #[test]
    fn blank_and_nan_secondary_fall_back() {
        assert_eq!(flatten_label(&RawHeader::new("公司简称", "")), "公司简称");
        assert_eq!(flatten_label(&RawHeader::new("公司简称", "nan")), "公司简称");
        assert_eq!(flatten_label(&RawHeader::new("小结", "  ")), "小结");
    }

    #[test]
    fn strips_carriage_returns_and_inner_spaces() {
        let header = RawHeader::new("x", "职工薪酬 -\r\n 销售");
        assert_eq!(flatten_label(&header), "职工薪酬-销售");
    }

    #[test]
    fn both_empty_yields_empty_name() {
        assert_eq!(flatten_label(&RawHeader::new("", "")), "");
    }

    #[test]
    fn flattening_is_idempotent_on_flat_names() {
        let once = flatten_label(&RawHeader::new("2026净利润", "Unnamed: 9_level_1"));
        let twice = flatten_label(&RawHeader::new(once.clone(), "Unnamed: 9_level_1"));
        assert_eq!(once, twice);
    }

    #[test]
    fn keeps_length_and_order() {
        let headers = vec![
            RawHeader::new("a", ""),
            RawHeader::new("b", "c"),
            RawHeader::new("", ""),
        ];
        assert_eq!(flatten_headers(&headers), vec!["a", "c", ""]);
    }

    #[test]
    fn forward_fills_merged_primary_cells() {
        let primary = vec![
            CellValue::text("公司简称"),
            CellValue::text("集团内外"),
            CellValue::Empty,
        ];
        let secondary = vec![
            CellValue::Empty,
            CellValue::text("集团内"),
            CellValue::text("集团外"),
        ];
        let headers = raw_headers_from_rows(&primary, &secondary, 4);
        assert_eq!(headers[2], RawHeader::new("集团内外", "集团外"));
        assert_eq!(headers[3], RawHeader::new("集团内外", ""));
    }

    #[test]
    fn reports_each_duplicate_once() {
        let columns = ["其他", "a", "其他", "其他", "", ""].map(str::to_string);
        assert_eq!(duplicate_columns(&columns), vec!["其他"]);
    }
}
