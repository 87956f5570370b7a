//! Logical dashboard fields and the sheet columns they are read from.
//!
//! Each field lists the exact flat column names it expects, in priority
//! order, and optionally keywords for a substring search. Annotation columns
//! carry long free-form titles, so for those the keyword search is the
//! primary strategy; everywhere else it is a fallback that gets reported.

use tracing::warn;

use crate::model::CellValue;
use crate::table::{ColumnHit, RecordRow};
use crate::warning::{ReportWarning, WarningCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    Revenue2026,
    Revenue2025,
    NetProfit2026,
    NetProfit2025,
    GrossMargin2026,
    GrossMargin2025,
    QuarterRevenue2025(Quarter),
    QuarterRevenue2026(Quarter),
    RevenueRemark,
    InGroupRevenue,
    OutGroupRevenue,
    SalesExpense,
    AdminExpense,
    RdExpense,
    SalesExpenseRate,
    AdminExpenseRate,
    RdExpenseRate,
    SalesNote,
    AdminNote,
    RdNote,
    GrossMarginNote,
    FixedCostTotal,
    SalaryTotal,
    SalarySales,
    SalaryAdmin,
    SalaryProduction,
    SalaryRd,
    Depreciation,
    Rent,
    OtherCost,
    LongTermDeferred,
    Amortization,
    OperatingCash,
    InvestingCash,
    FinancingCash,
    FundGap,
    FundGapNote,
    Summary,
    ManagementAttention,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub const ALL: [Self; 4] = [Self::Q1, Self::Q2, Self::Q3, Self::Q4];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Q1 => "1Q",
            Self::Q2 => "2Q",
            Self::Q3 => "3Q",
            Self::Q4 => "4Q",
        }
    }
}

/// Where a field is looked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRule {
    pub exact: &'static [&'static str],
    pub contains: &'static [&'static str],
}

const fn exact(names: &'static [&'static str]) -> ColumnRule {
    ColumnRule {
        exact: names,
        contains: &[],
    }
}

const fn containing(keywords: &'static [&'static str]) -> ColumnRule {
    ColumnRule {
        exact: &[],
        contains: keywords,
    }
}

impl FieldKey {
    #[must_use]
    pub const fn rule(self) -> ColumnRule {
        match self {
            Self::Revenue2026 => exact(&["2026年营业收入"]),
            Self::Revenue2025 => exact(&["2025年营业收入"]),
            Self::NetProfit2026 => exact(&["2026净利润", "2026年净利润"]),
            Self::NetProfit2025 => exact(&["2025净利润", "2025年净利润"]),
            Self::GrossMargin2026 => exact(&["2026毛利率", "2026年毛利率"]),
            Self::GrossMargin2025 => exact(&["2025毛利率", "2025年毛利率"]),
            Self::QuarterRevenue2025(quarter) => exact(match quarter {
                Quarter::Q1 => &["1Q25"],
                Quarter::Q2 => &["2Q25"],
                Quarter::Q3 => &["3Q25"],
                Quarter::Q4 => &["4Q25"],
            }),
            Self::QuarterRevenue2026(quarter) => exact(match quarter {
                Quarter::Q1 => &["1Q26"],
                Quarter::Q2 => &["2Q26"],
                Quarter::Q3 => &["3Q26"],
                Quarter::Q4 => &["4Q26"],
            }),
            Self::RevenueRemark => ColumnRule {
                exact: &["备注1：收入环比变动原因"],
                contains: &["备注1"],
            },
            Self::InGroupRevenue => exact(&["集团内"]),
            Self::OutGroupRevenue => exact(&["集团外"]),
            Self::SalesExpense => exact(&["2026销售费用", "2026年销售费用"]),
            Self::AdminExpense => exact(&["2026管理费用", "2026年管理费用"]),
            Self::RdExpense => exact(&["2026研发费用", "2026年研发费用"]),
            Self::SalesExpenseRate => exact(&["2026年销售费用率", "2026销售费用率"]),
            Self::AdminExpenseRate => exact(&["2026年管理费用率", "2026管理费用率"]),
            Self::RdExpenseRate => exact(&["2026年研发费用率", "2026研发费用率"]),
            Self::SalesNote => containing(&["备注3"]),
            Self::AdminNote => containing(&["备注4"]),
            Self::RdNote => containing(&["备注5（请填写"]),
            Self::GrossMarginNote => containing(&["备注2"]),
            Self::FixedCostTotal => exact(&["固定成本费用合计"]),
            Self::SalaryTotal => exact(&["职工薪酬-小计"]),
            Self::SalarySales => exact(&["职工薪酬-销售"]),
            Self::SalaryAdmin => exact(&["职工薪酬-管理"]),
            Self::SalaryProduction => exact(&["职工薪酬-生产"]),
            Self::SalaryRd => exact(&["职工薪酬-研发"]),
            Self::Depreciation => exact(&["折旧费"]),
            Self::Rent => exact(&["房租物业费"]),
            Self::OtherCost => exact(&["其他"]),
            Self::LongTermDeferred => exact(&["长期待摊费用"]),
            Self::Amortization => exact(&["无形资产摊销"]),
            Self::OperatingCash => exact(&["经营活动产生的现金流量净额"]),
            Self::InvestingCash => exact(&["投资活动产生的现金流量净额"]),
            Self::FinancingCash => exact(&["筹资活动产生的现金流量净额"]),
            Self::FundGap => exact(&["资金投入（缺口）", "资金投入(缺口)"]),
            Self::FundGapNote => containing(&["备注5：", "资金缺口"]),
            Self::Summary => exact(&["小结"]),
            Self::ManagementAttention => exact(&["提请管理层关注"]),
        }
    }

    /// Short identifier used in warnings.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Revenue2026 => "revenue_2026",
            Self::Revenue2025 => "revenue_2025",
            Self::NetProfit2026 => "net_profit_2026",
            Self::NetProfit2025 => "net_profit_2025",
            Self::GrossMargin2026 => "gross_margin_2026",
            Self::GrossMargin2025 => "gross_margin_2025",
            Self::QuarterRevenue2025(_) => "quarter_revenue_2025",
            Self::QuarterRevenue2026(_) => "quarter_revenue_2026",
            Self::RevenueRemark => "revenue_remark",
            Self::InGroupRevenue => "in_group_revenue",
            Self::OutGroupRevenue => "out_group_revenue",
            Self::SalesExpense => "sales_expense",
            Self::AdminExpense => "admin_expense",
            Self::RdExpense => "rd_expense",
            Self::SalesExpenseRate => "sales_expense_rate",
            Self::AdminExpenseRate => "admin_expense_rate",
            Self::RdExpenseRate => "rd_expense_rate",
            Self::SalesNote => "sales_note",
            Self::AdminNote => "admin_note",
            Self::RdNote => "rd_note",
            Self::GrossMarginNote => "gross_margin_note",
            Self::FixedCostTotal => "fixed_cost_total",
            Self::SalaryTotal => "salary_total",
            Self::SalarySales => "salary_sales",
            Self::SalaryAdmin => "salary_admin",
            Self::SalaryProduction => "salary_production",
            Self::SalaryRd => "salary_rd",
            Self::Depreciation => "depreciation",
            Self::Rent => "rent",
            Self::OtherCost => "other_cost",
            Self::LongTermDeferred => "long_term_deferred",
            Self::Amortization => "amortization",
            Self::OperatingCash => "operating_cash",
            Self::InvestingCash => "investing_cash",
            Self::FinancingCash => "financing_cash",
            Self::FundGap => "fund_gap",
            Self::FundGapNote => "fund_gap_note",
            Self::Summary => "summary",
            Self::ManagementAttention => "management_attention",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Substring,
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved<'a> {
    pub value: &'a CellValue,
    pub column: Option<&'a str>,
    pub kind: MatchKind,
}

impl Resolved<'_> {
    #[must_use]
    pub fn is_missing(&self) -> bool {
        self.kind == MatchKind::Missing
    }
}

static EMPTY_CELL: CellValue = CellValue::Empty;

/// Resolves fields against one row and records every lookup that was not a
/// clean, unique exact match.
#[derive(Debug)]
pub struct FieldResolver<'a> {
    record: RecordRow<'a>,
    warnings: Vec<ReportWarning>,
}

impl<'a> FieldResolver<'a> {
    #[must_use]
    pub fn new(record: RecordRow<'a>) -> Self {
        Self {
            record,
            warnings: Vec::new(),
        }
    }

    fn note_shared(&mut self, key: FieldKey, hit: &ColumnHit<'_>) {
        if hit.matches > 1 {
            self.warnings.push(
                ReportWarning::new(
                    WarningCode::AmbiguousColumn,
                    format!("{} columns match; using the first one", hit.matches),
                )
                .with_field(key.name())
                .with_column(hit.column),
            );
        }
    }

    pub fn resolve(&mut self, key: FieldKey) -> Resolved<'a> {
        let rule = key.rule();

        for name in rule.exact {
            if let Some(hit) = self.record.exact(name) {
                self.note_shared(key, &hit);
                return Resolved {
                    value: hit.value,
                    column: Some(hit.column),
                    kind: MatchKind::Exact,
                };
            }
        }

        for keyword in rule.contains {
            if let Some(hit) = self.record.containing(keyword) {
                self.note_shared(key, &hit);
                if !rule.exact.is_empty() {
                    warn!(field = key.name(), column = hit.column, "resolved by substring");
                    self.warnings.push(
                        ReportWarning::new(
                            WarningCode::SubstringFallback,
                            format!("no exact column; matched keyword '{keyword}'"),
                        )
                        .with_field(key.name())
                        .with_column(hit.column),
                    );
                }
                return Resolved {
                    value: hit.value,
                    column: Some(hit.column),
                    kind: MatchKind::Substring,
                };
            }
        }

        self.warnings.push(
            ReportWarning::new(WarningCode::MissingColumn, "column not found")
                .with_field(key.name()),
        );
        Resolved {
            value: &EMPTY_CELL,
            column: None,
            kind: MatchKind::Missing,
        }
    }

    /// Cell for `key`, blank when the column is absent.
    pub fn value(&mut self, key: FieldKey) -> &'a CellValue {
        self.resolve(key).value
    }

    pub fn push_warning(&mut self, warning: ReportWarning) {
        self.warnings.push(warning);
    }

    #[must_use]
    pub fn into_warnings(self) -> Vec<ReportWarning> {
        self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldKey, FieldResolver, MatchKind, Quarter};
    use crate::model::CellValue;
    use crate::table::RecordRow;
    use crate::warning::WarningCode;

    fn row() -> (Vec<String>, Vec<CellValue>) {
        let columns = [
            "2026年净利润",
            "1Q25",
            "备注1（收入环比变动原因）",
            "备注3：销售费用说明",
            "其他",
            "其他",
            "资金缺口说明",
        ]
        .map(str::to_string)
        .to_vec();
        let cells = vec![
            CellValue::Number(300.0),
            CellValue::Number(10.0),
            CellValue::text("价格上涨"),
            CellValue::text("1、渠道"),
            CellValue::Number(1.0),
            CellValue::Number(2.0),
            CellValue::text("需融资"),
        ];
        (columns, cells)
    }

    #[test]
    fn exact_names_are_tried_in_order() {
        let (columns, cells) = row();
        let mut resolver = FieldResolver::new(RecordRow::new(&columns, &cells));
        let profit = resolver.resolve(FieldKey::NetProfit2026);
        assert_eq!(profit.kind, MatchKind::Exact);
        assert_eq!(profit.column, Some("2026年净利润"));

        let q1 = resolver.value(FieldKey::QuarterRevenue2025(Quarter::Q1));
        assert_eq!(q1, &CellValue::Number(10.0));
        assert!(resolver.into_warnings().is_empty());
    }

    #[test]
    fn substring_fallback_is_reported() {
        let (columns, cells) = row();
        let mut resolver = FieldResolver::new(RecordRow::new(&columns, &cells));
        let remark = resolver.resolve(FieldKey::RevenueRemark);
        assert_eq!(remark.kind, MatchKind::Substring);
        assert_eq!(remark.value, &CellValue::text("价格上涨"));

        let warnings = resolver.into_warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, WarningCode::SubstringFallback);
        assert_eq!(warnings[0].field, Some("revenue_remark"));
    }

    #[test]
    fn keyword_fields_resolve_quietly() {
        let (columns, cells) = row();
        let mut resolver = FieldResolver::new(RecordRow::new(&columns, &cells));
        assert_eq!(resolver.value(FieldKey::SalesNote), &CellValue::text("1、渠道"));
        assert_eq!(resolver.value(FieldKey::FundGapNote), &CellValue::text("需融资"));
        assert!(resolver.into_warnings().is_empty());
    }

    #[test]
    fn shared_and_missing_columns_are_reported() {
        let (columns, cells) = row();
        let mut resolver = FieldResolver::new(RecordRow::new(&columns, &cells));
        assert_eq!(resolver.value(FieldKey::OtherCost), &CellValue::Number(1.0));
        let missing = resolver.resolve(FieldKey::Depreciation);
        assert!(missing.is_missing());
        assert_eq!(missing.value, &CellValue::Empty);

        let codes = resolver
            .into_warnings()
            .into_iter()
            .map(|warning| warning.code)
            .collect::<Vec<_>>();
        assert_eq!(
            codes,
            vec![WarningCode::AmbiguousColumn, WarningCode::MissingColumn]
        );
    }

    #[test]
    fn quarter_labels() {
        let labels = Quarter::ALL.map(Quarter::label);
        assert_eq!(labels, ["1Q", "2Q", "3Q", "4Q"]);
    }
}
