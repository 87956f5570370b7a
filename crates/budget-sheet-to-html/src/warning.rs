#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningCode {
    MissingColumn,
    AmbiguousColumn,
    SubstringFallback,
    AmbiguousPercentage,
    UnparseableNumber,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportWarning {
    pub code: WarningCode,
    pub message: String,
    pub field: Option<&'static str>,
    pub column: Option<String>,
}

impl ReportWarning {
    #[must_use]
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
            column: None,
        }
    }

    #[must_use]
    pub fn with_field(mut self, field: &'static str) -> Self {
        self.field = Some(field);
        self
    }

    #[must_use]
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }
}
