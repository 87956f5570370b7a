use crate::model::CellValue;

/// Shown in KPI positions when a value is missing, to tell "no data" from zero.
pub const MISSING_AMOUNT: &str = "-";

/// Values below this magnitude are read as fractions and scaled to percent.
pub const FRACTION_LIMIT: f64 = 5.0;

fn parse_number_text(text: &str) -> Option<f64> {
    let cleaned = text.trim().replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|value| !value.is_nan())
}

/// Parses a cell as a number; blank, NaN and non-numeric text give `None`.
#[must_use]
pub fn parse_amount(cell: &CellValue) -> Option<f64> {
    match cell {
        CellValue::Empty => None,
        CellValue::Number(value) if value.is_nan() => None,
        CellValue::Number(value) => Some(*value),
        CellValue::Text(text) => parse_number_text(text),
    }
}

#[must_use]
pub fn amount_or_zero(cell: &CellValue) -> f64 {
    parse_amount(cell).unwrap_or(0.0)
}

/// Formats with thousands separators and no decimals, e.g. `-1,234,568`.
#[must_use]
pub fn format_thousands(value: f64) -> String {
    let rounded = format!("{:.0}", value.abs());
    let negative = value < 0.0 && rounded.bytes().any(|byte| byte != b'0');

    let digits = rounded.as_bytes();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if negative {
        out.push('-');
    }
    for (index, digit) in digits.iter().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(char::from(*digit));
    }
    out
}

#[must_use]
pub fn format_amount_or_dash(value: Option<f64>) -> String {
    value.map_or_else(|| MISSING_AMOUNT.to_string(), format_thousands)
}

/// Scales fractions (`|v| < 5`) to percent points.
///
/// Values between 1 and 5 are ambiguous: `4.9` becomes `490`, never `4.9`.
#[must_use]
pub fn percent_points(value: f64) -> f64 {
    if value.abs() < FRACTION_LIMIT {
        value * 100.0
    } else {
        value
    }
}

/// True when a raw value could have been meant either as a fraction or as
/// percent points.
#[must_use]
pub fn is_ambiguous_percentage(value: f64) -> bool {
    (1.0..FRACTION_LIMIT).contains(&value.abs())
}

#[derive(Debug, Clone, PartialEq)]
pub struct PercentDisplay {
    pub text: String,
    pub raw: Option<f64>,
}

/// Renders a percentage cell as whole percent, e.g. `0.23` → `23%`.
///
/// Unparseable text is shown unchanged; a blank cell shows `-`.
#[must_use]
pub fn format_percent(cell: &CellValue) -> PercentDisplay {
    match parse_amount(cell) {
        Some(value) => PercentDisplay {
            text: format!("{:.0}%", percent_points(value)),
            raw: Some(value),
        },
        None => PercentDisplay {
            text: match cell {
                CellValue::Text(text) if !text.trim().is_empty() => text.clone(),
                _ => MISSING_AMOUNT.to_string(),
            },
            raw: None,
        },
    }
}

#[must_use]
pub fn share_of(value: f64, total: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        value / total * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::{
        amount_or_zero, format_amount_or_dash, format_percent, format_thousands,
        is_ambiguous_percentage, parse_amount, share_of,
    };
    use crate::model::CellValue;

    #[test]
    fn percentage_heuristic_matches_documented_cases() {
        assert_eq!(format_percent(&CellValue::Number(0.23)).text, "23%");
        assert_eq!(format_percent(&CellValue::Number(23.0)).text, "23%");
        assert_eq!(format_percent(&CellValue::Number(4.9)).text, "490%");
        assert_eq!(format_percent(&CellValue::text("0.35")).text, "35%");
    }

    #[test]
    fn percentage_falls_back_to_raw_text() {
        assert_eq!(format_percent(&CellValue::text("约两成")).text, "约两成");
        assert_eq!(format_percent(&CellValue::Empty).text, "-");
    }

    #[test]
    fn negative_fractions_use_magnitude() {
        assert_eq!(format_percent(&CellValue::Number(-0.12)).text, "-12%");
        assert_eq!(format_percent(&CellValue::Number(-30.0)).text, "-30%");
    }

    #[test]
    fn flags_ambiguous_zone() {
        assert!(is_ambiguous_percentage(4.9));
        assert!(is_ambiguous_percentage(1.0));
        assert!(!is_ambiguous_percentage(0.23));
        assert!(!is_ambiguous_percentage(5.0));
    }

    #[test]
    fn parses_amount_text() {
        assert_eq!(parse_amount(&CellValue::text(" 1,234.5 ")), Some(1234.5));
        assert_eq!(parse_amount(&CellValue::text("n/a")), None);
        assert_eq!(parse_amount(&CellValue::text("nan")), None);
        assert_eq!(amount_or_zero(&CellValue::Empty), 0.0);
    }

    #[test]
    fn formats_thousands() {
        assert_eq!(format_thousands(0.0), "0");
        assert_eq!(format_thousands(999.4), "999");
        assert_eq!(format_thousands(1234.0), "1,234");
        assert_eq!(format_thousands(1_234_567.8), "1,234,568");
        assert_eq!(format_thousands(-9_876_543.0), "-9,876,543");
        assert_eq!(format_thousands(-0.2), "0");
    }

    #[test]
    fn dash_for_missing_amounts() {
        assert_eq!(format_amount_or_dash(None), "-");
        assert_eq!(format_amount_or_dash(Some(12_000.0)), "12,000");
    }

    #[test]
    fn share_is_zero_without_total() {
        assert_eq!(share_of(5.0, 0.0), 0.0);
        assert_eq!(share_of(25.0, 100.0), 25.0);
    }
}
