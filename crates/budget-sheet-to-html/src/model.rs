use std::fmt;

use calamine::Data;

/// One spreadsheet cell, reduced to what the dashboard cares about.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// True for blank cells and NaN, the two shapes a missing value takes.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Number(value) => value.is_nan(),
            Self::Text(_) => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<&Data> for CellValue {
    fn from(cell: &Data) -> Self {
        match cell {
            Data::Empty | Data::Error(_) => Self::Empty,
            #[allow(clippy::cast_precision_loss)]
            Data::Int(value) => Self::Number(*value as f64),
            Data::Float(value) => Self::Number(*value),
            Data::String(text) => Self::Text(text.clone()),
            other => Self::Text(other.to_string()),
        }
    }
}

/// A column's two header cells before flattening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawHeader {
    pub primary: String,
    pub secondary: String,
}

impl RawHeader {
    #[must_use]
    pub fn new(primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            secondary: secondary.into(),
        }
    }
}

/// Dense cell grid of one worksheet, indexed by absolute sheet row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SheetGrid {
    pub rows: Vec<Vec<CellValue>>,
    pub width: usize,
}

#[cfg(test)]
mod tests {
    use calamine::Data;

    use super::CellValue;

    #[test]
    fn converts_calamine_cells() {
        assert_eq!(CellValue::from(&Data::Empty), CellValue::Empty);
        assert_eq!(CellValue::from(&Data::Int(7)), CellValue::Number(7.0));
        assert_eq!(
            CellValue::from(&Data::String("集团内".to_string())),
            CellValue::text("集团内")
        );
        assert_eq!(CellValue::from(&Data::Bool(true)), CellValue::text("true"));
    }

    #[test]
    fn nan_counts_as_missing() {
        assert!(CellValue::Number(f64::NAN).is_missing());
        assert!(!CellValue::Number(0.0).is_missing());
        assert!(!CellValue::text("").is_missing());
    }
}
