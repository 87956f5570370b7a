use tracing::debug;

use crate::fields::{FieldKey, FieldResolver, Quarter};
use crate::model::CellValue;
use crate::numeric::{
    amount_or_zero, format_amount_or_dash, format_percent, format_thousands,
    is_ambiguous_percentage, parse_amount, share_of,
};
use crate::table::RecordRow;
use crate::text_list::{Annotation, EMPTY_PLACEHOLDER, parse_annotation};
use crate::warning::{ReportWarning, WarningCode};

pub const AMOUNT_UNIT: &str = "万元";
const SUMMARY_DEFAULT: &str = "暂无小结";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Increase,
    Decrease,
    Flat,
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KpiCard {
    pub title: &'static str,
    pub current: String,
    pub previous: String,
    pub unit: Option<&'static str>,
    pub change: Option<String>,
    pub trend: Trend,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuarterSeries {
    pub name: &'static str,
    pub values: [f64; 4],
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: &'static str,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostRowKind {
    Root,
    Parent,
    Child,
    Normal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CostTreeRow {
    pub kind: CostRowKind,
    pub label: &'static str,
    pub amount: f64,
    pub share: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareBand {
    High,
    Medium,
    Low,
}

impl CostTreeRow {
    /// Blank for zero so empty lines read as "nothing budgeted".
    #[must_use]
    pub fn amount_text(&self) -> String {
        if self.amount == 0.0 {
            String::new()
        } else {
            format_thousands(self.amount)
        }
    }

    #[must_use]
    pub fn band(&self) -> ShareBand {
        if self.share >= 50.0 {
            ShareBand::High
        } else if self.share >= 20.0 {
            ShareBand::Medium
        } else {
            ShareBand::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CashCard {
    pub title: &'static str,
    pub amount: f64,
    /// Sign-colored cards go green at zero and above, red below.
    pub signed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseTab {
    pub title: &'static str,
    pub amount: Option<f64>,
    pub rate: Option<String>,
    pub note: Annotation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub company: String,
    pub kpis: Vec<KpiCard>,
    pub quarter_labels: [&'static str; 4],
    pub quarterly: [QuarterSeries; 2],
    pub revenue_remark: String,
    pub group_split: Option<Vec<PieSlice>>,
    pub expense_split: Option<Vec<PieSlice>>,
    pub expense_tabs: Vec<ExpenseTab>,
    pub cost_tree: Vec<CostTreeRow>,
    pub cash_cards: Vec<CashCard>,
    pub fund_gap_note: Annotation,
    pub summary: Annotation,
    pub attention: Annotation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardReport {
    pub dashboard: Dashboard,
    pub warnings: Vec<ReportWarning>,
}

fn year_over_year(current: Option<f64>, previous: Option<f64>) -> (Option<String>, Trend) {
    let (Some(current), Some(previous)) = (current, previous) else {
        return (None, Trend::Unknown);
    };

    let delta = current - previous;
    if delta > 0.0 {
        (
            Some(format!("同比增加 {} {AMOUNT_UNIT}", format_thousands(delta))),
            Trend::Increase,
        )
    } else if delta < 0.0 {
        (
            Some(format!("同比减少 {} {AMOUNT_UNIT}", format_thousands(delta.abs()))),
            Trend::Decrease,
        )
    } else {
        (Some("与去年持平".to_string()), Trend::Flat)
    }
}

fn amount_card(
    resolver: &mut FieldResolver<'_>,
    title: &'static str,
    current: FieldKey,
    previous: FieldKey,
) -> KpiCard {
    let current = parse_amount(resolver.value(current));
    let previous = parse_amount(resolver.value(previous));
    let (change, trend) = year_over_year(current, previous);
    KpiCard {
        title,
        current: format_amount_or_dash(current),
        previous: format_amount_or_dash(previous),
        unit: Some(AMOUNT_UNIT),
        change,
        trend,
    }
}

/// Percentage text for `key`; an absent column reads as zero.
fn percent_text(resolver: &mut FieldResolver<'_>, key: FieldKey) -> String {
    let resolved = resolver.resolve(key);
    let zero = CellValue::Number(0.0);
    let cell = if resolved.is_missing() {
        &zero
    } else {
        resolved.value
    };

    let display = format_percent(cell);
    if let Some(raw) = display.raw.filter(|raw| is_ambiguous_percentage(*raw)) {
        let mut warning = ReportWarning::new(
            WarningCode::AmbiguousPercentage,
            format!("{raw} read as a fraction and shown as {}", display.text),
        )
        .with_field(key.name());
        if let Some(column) = resolved.column {
            warning = warning.with_column(column);
        }
        resolver.push_warning(warning);
    }
    display.text
}

fn amount_or_zero_reported(resolver: &mut FieldResolver<'_>, key: FieldKey) -> f64 {
    let resolved = resolver.resolve(key);
    let value = resolved.value;
    if let CellValue::Text(text) = value
        && parse_amount(value).is_none()
        && !text.trim().is_empty()
    {
        let mut warning = ReportWarning::new(
            WarningCode::UnparseableNumber,
            format!("'{text}' is not a number; using 0"),
        )
        .with_field(key.name());
        if let Some(column) = resolved.column {
            warning = warning.with_column(column);
        }
        resolver.push_warning(warning);
    }
    amount_or_zero(value)
}

fn annotation_or(resolver: &mut FieldResolver<'_>, key: FieldKey, default: &str) -> Annotation {
    let resolved = resolver.resolve(key);
    if resolved.is_missing() {
        parse_annotation(&CellValue::text(default))
    } else {
        parse_annotation(resolved.value)
    }
}

fn pie_if_positive(slices: Vec<PieSlice>) -> Option<Vec<PieSlice>> {
    let total: f64 = slices.iter().map(|slice| slice.value).sum();
    (total > 0.0).then_some(slices)
}

fn group_split(resolver: &mut FieldResolver<'_>) -> Option<Vec<PieSlice>> {
    let in_group = parse_amount(resolver.value(FieldKey::InGroupRevenue))?;
    let out_group = parse_amount(resolver.value(FieldKey::OutGroupRevenue))?;
    pie_if_positive(vec![
        PieSlice {
            label: "集团内",
            value: in_group,
        },
        PieSlice {
            label: "集团外",
            value: out_group,
        },
    ])
}

fn cost_tree(resolver: &mut FieldResolver<'_>) -> Vec<CostTreeRow> {
    let total = amount_or_zero_reported(resolver, FieldKey::FixedCostTotal);
    let layout = [
        (CostRowKind::Parent, "职工薪酬-小计", FieldKey::SalaryTotal),
        (CostRowKind::Child, "├── 职工薪酬-销售", FieldKey::SalarySales),
        (CostRowKind::Child, "├── 职工薪酬-管理", FieldKey::SalaryAdmin),
        (CostRowKind::Child, "├── 职工薪酬-生产", FieldKey::SalaryProduction),
        (CostRowKind::Child, "└── 职工薪酬-研发", FieldKey::SalaryRd),
        (CostRowKind::Normal, "折旧费", FieldKey::Depreciation),
        (CostRowKind::Normal, "房租物业费", FieldKey::Rent),
        (CostRowKind::Normal, "其他", FieldKey::OtherCost),
        (CostRowKind::Normal, "长期待摊费用", FieldKey::LongTermDeferred),
        (CostRowKind::Normal, "无形资产摊销", FieldKey::Amortization),
    ];

    let mut rows = Vec::with_capacity(layout.len() + 1);
    rows.push(CostTreeRow {
        kind: CostRowKind::Root,
        label: "固定成本费用合计",
        amount: total,
        share: 100.0,
    });
    for (kind, label, key) in layout {
        let amount = amount_or_zero_reported(resolver, key);
        rows.push(CostTreeRow {
            kind,
            label,
            amount,
            share: share_of(amount, total),
        });
    }
    rows
}

fn expense_tab(
    resolver: &mut FieldResolver<'_>,
    title: &'static str,
    amount: f64,
    rate: FieldKey,
    note: FieldKey,
) -> ExpenseTab {
    ExpenseTab {
        title,
        amount: Some(amount),
        rate: Some(percent_text(resolver, rate)),
        note: annotation_or(resolver, note, EMPTY_PLACEHOLDER),
    }
}

/// Builds every dashboard section from the selected company's row.
///
/// Missing or unparseable fields degrade to `-`, `无` or zero; each such
/// case is listed in the returned warnings.
#[must_use]
pub fn build_dashboard(company: &str, record: RecordRow<'_>) -> DashboardReport {
    let mut resolver = FieldResolver::new(record);

    let revenue = amount_card(
        &mut resolver,
        "2026年营业收入",
        FieldKey::Revenue2026,
        FieldKey::Revenue2025,
    );
    let profit = amount_card(
        &mut resolver,
        "2026年净利润",
        FieldKey::NetProfit2026,
        FieldKey::NetProfit2025,
    );
    let margin = KpiCard {
        title: "2026年综合毛利率",
        current: percent_text(&mut resolver, FieldKey::GrossMargin2026),
        previous: percent_text(&mut resolver, FieldKey::GrossMargin2025),
        unit: None,
        change: None,
        trend: Trend::Unknown,
    };

    let quarterly = [
        QuarterSeries {
            name: "2025年 (预估)",
            values: Quarter::ALL.map(|quarter| {
                amount_or_zero_reported(&mut resolver, FieldKey::QuarterRevenue2025(quarter))
            }),
        },
        QuarterSeries {
            name: "2026年 (预算)",
            values: Quarter::ALL.map(|quarter| {
                amount_or_zero_reported(&mut resolver, FieldKey::QuarterRevenue2026(quarter))
            }),
        },
    ];

    let remark = resolver.resolve(FieldKey::RevenueRemark);
    let remark_text = remark.value.to_string();
    let revenue_remark = if remark.value.is_missing() || remark_text.trim().is_empty() {
        EMPTY_PLACEHOLDER.to_string()
    } else {
        remark_text
    };

    let group_split = group_split(&mut resolver);

    let sales = amount_or_zero_reported(&mut resolver, FieldKey::SalesExpense);
    let admin = amount_or_zero_reported(&mut resolver, FieldKey::AdminExpense);
    let rd = amount_or_zero_reported(&mut resolver, FieldKey::RdExpense);
    let expense_split = pie_if_positive(vec![
        PieSlice {
            label: "销售",
            value: sales,
        },
        PieSlice {
            label: "管理",
            value: admin,
        },
        PieSlice {
            label: "研发",
            value: rd,
        },
    ]);

    let expense_tabs = vec![
        expense_tab(
            &mut resolver,
            "销售",
            sales,
            FieldKey::SalesExpenseRate,
            FieldKey::SalesNote,
        ),
        expense_tab(
            &mut resolver,
            "管理",
            admin,
            FieldKey::AdminExpenseRate,
            FieldKey::AdminNote,
        ),
        expense_tab(
            &mut resolver,
            "研发",
            rd,
            FieldKey::RdExpenseRate,
            FieldKey::RdNote,
        ),
        ExpenseTab {
            title: "毛利备注",
            amount: None,
            rate: None,
            note: annotation_or(&mut resolver, FieldKey::GrossMarginNote, EMPTY_PLACEHOLDER),
        },
    ];

    let cost_tree = cost_tree(&mut resolver);

    let cash_cards = vec![
        CashCard {
            title: "经营活动现金流",
            amount: amount_or_zero_reported(&mut resolver, FieldKey::OperatingCash),
            signed: true,
        },
        CashCard {
            title: "投资活动现金流",
            amount: amount_or_zero_reported(&mut resolver, FieldKey::InvestingCash),
            signed: true,
        },
        CashCard {
            title: "筹资活动现金流",
            amount: amount_or_zero_reported(&mut resolver, FieldKey::FinancingCash),
            signed: true,
        },
        CashCard {
            title: "资金缺口/投入",
            amount: amount_or_zero_reported(&mut resolver, FieldKey::FundGap),
            signed: false,
        },
    ];

    let fund_gap_note = annotation_or(&mut resolver, FieldKey::FundGapNote, EMPTY_PLACEHOLDER);
    let summary = annotation_or(&mut resolver, FieldKey::Summary, SUMMARY_DEFAULT);
    let attention = annotation_or(
        &mut resolver,
        FieldKey::ManagementAttention,
        EMPTY_PLACEHOLDER,
    );

    let warnings = resolver.into_warnings();
    debug!(company, warnings = warnings.len(), "dashboard built");

    DashboardReport {
        dashboard: Dashboard {
            company: company.to_string(),
            kpis: vec![revenue, profit, margin],
            quarter_labels: Quarter::ALL.map(Quarter::label),
            quarterly,
            revenue_remark,
            group_split,
            expense_split,
            expense_tabs,
            cost_tree,
            cash_cards,
            fund_gap_note,
            summary,
            attention,
        },
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::{CostRowKind, ShareBand, Trend, build_dashboard, year_over_year};
    use crate::model::CellValue;
    use crate::table::RecordRow;
    use crate::text_list::{Annotation, Segment};
    use crate::warning::WarningCode;

    fn record_parts() -> (Vec<String>, Vec<CellValue>) {
        let pairs: Vec<(&str, CellValue)> = vec![
            ("公司简称", CellValue::text("甲公司")),
            ("2026年营业收入", CellValue::Number(12_000.0)),
            ("2025年营业收入", CellValue::Number(10_500.0)),
            ("2026净利润", CellValue::Number(900.0)),
            ("2025净利润", CellValue::Empty),
            ("2026毛利率", CellValue::Number(0.23)),
            ("2025毛利率", CellValue::Number(4.9)),
            ("1Q25", CellValue::Number(2000.0)),
            ("2Q25", CellValue::text("n/a")),
            ("1Q26", CellValue::Number(3000.0)),
            ("集团内", CellValue::Number(400.0)),
            ("集团外", CellValue::Number(600.0)),
            ("2026销售费用", CellValue::Number(100.0)),
            ("2026管理费用", CellValue::Number(50.0)),
            ("2026年销售费用率", CellValue::Number(0.08)),
            ("备注3：销售费用变动说明", CellValue::text("1、渠道拓展 2、人员增加")),
            ("固定成本费用合计", CellValue::Number(1000.0)),
            ("职工薪酬-小计", CellValue::Number(600.0)),
            ("职工薪酬-销售", CellValue::Number(250.0)),
            ("折旧费", CellValue::Number(0.0)),
            ("经营活动产生的现金流量净额", CellValue::Number(-80.0)),
            ("资金投入（缺口）", CellValue::Empty),
            ("小结", CellValue::text("总体稳健 1、收入增长")),
        ];
        pairs
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .unzip()
    }

    #[test]
    fn kpis_show_values_dashes_and_changes() {
        let (columns, cells) = record_parts();
        let report = build_dashboard("甲公司", RecordRow::new(&columns, &cells));
        let kpis = &report.dashboard.kpis;

        assert_eq!(kpis[0].current, "12,000");
        assert_eq!(kpis[0].previous, "10,500");
        assert_eq!(kpis[0].change.as_deref(), Some("同比增加 1,500 万元"));
        assert_eq!(kpis[0].trend, Trend::Increase);

        assert_eq!(kpis[1].current, "900");
        assert_eq!(kpis[1].previous, "-");
        assert_eq!(kpis[1].change, None);

        assert_eq!(kpis[2].current, "23%");
        assert_eq!(kpis[2].previous, "490%");
        assert!(
            report
                .warnings
                .iter()
                .any(|warning| warning.code == WarningCode::AmbiguousPercentage)
        );
    }

    #[test]
    fn year_over_year_wording() {
        assert_eq!(
            year_over_year(Some(80.0), Some(100.0)).0.as_deref(),
            Some("同比减少 20 万元")
        );
        assert_eq!(
            year_over_year(Some(5.0), Some(5.0)),
            (Some("与去年持平".to_string()), Trend::Flat)
        );
    }

    #[test]
    fn quarters_zero_fill_and_pies_follow_totals() {
        let (columns, cells) = record_parts();
        let report = build_dashboard("甲公司", RecordRow::new(&columns, &cells));
        let dashboard = &report.dashboard;

        assert_eq!(dashboard.quarter_labels, ["1Q", "2Q", "3Q", "4Q"]);
        assert_eq!(dashboard.quarterly[0].values, [2000.0, 0.0, 0.0, 0.0]);
        assert_eq!(dashboard.quarterly[1].values, [3000.0, 0.0, 0.0, 0.0]);
        assert!(
            report
                .warnings
                .iter()
                .any(|warning| warning.code == WarningCode::UnparseableNumber)
        );

        let group = dashboard.group_split.as_ref().expect("group split present");
        assert_eq!(group[1].value, 600.0);
        let expenses = dashboard.expense_split.as_ref().expect("expense split present");
        assert_eq!(expenses.iter().map(|slice| slice.value).sum::<f64>(), 150.0);
    }

    #[test]
    fn expense_tabs_carry_rates_and_notes() {
        let (columns, cells) = record_parts();
        let report = build_dashboard("甲公司", RecordRow::new(&columns, &cells));
        let tabs = &report.dashboard.expense_tabs;

        assert_eq!(tabs[0].rate.as_deref(), Some("8%"));
        assert_eq!(tabs[0].note.segments().len(), 2);
        assert_eq!(tabs[2].rate.as_deref(), Some("0%"));
        assert_eq!(tabs[2].note, Annotation::Plain("无".to_string()));
        assert_eq!(tabs[3].amount, None);
    }

    #[test]
    fn cost_tree_shares_and_bands() {
        let (columns, cells) = record_parts();
        let report = build_dashboard("甲公司", RecordRow::new(&columns, &cells));
        let tree = &report.dashboard.cost_tree;

        assert_eq!(tree.len(), 11);
        assert_eq!(tree[0].kind, CostRowKind::Root);
        assert_eq!(tree[0].band(), ShareBand::High);
        assert_eq!(tree[1].share, 60.0);
        assert_eq!(tree[2].share, 25.0);
        assert_eq!(tree[2].band(), ShareBand::Medium);
        assert_eq!(tree[3].band(), ShareBand::Low);
        assert_eq!(tree[6].label, "折旧费");
        assert_eq!(tree[6].amount_text(), "");
        assert_eq!(tree[1].amount_text(), "600");
    }

    #[test]
    fn cash_and_annotations_degrade_gracefully() {
        let (columns, cells) = record_parts();
        let report = build_dashboard("甲公司", RecordRow::new(&columns, &cells));
        let dashboard = &report.dashboard;

        assert_eq!(dashboard.cash_cards[0].amount, -80.0);
        assert_eq!(dashboard.cash_cards[3].amount, 0.0);
        assert_eq!(dashboard.revenue_remark, "无");
        assert_eq!(dashboard.fund_gap_note, Annotation::Plain("无".to_string()));
        assert_eq!(
            dashboard.summary.segments(),
            vec![
                Segment::Prose("总体稳健".to_string()),
                Segment::Numbered {
                    label: "1、".to_string(),
                    body: "收入增长".to_string(),
                },
            ]
        );
        assert_eq!(dashboard.attention, Annotation::Plain("无".to_string()));
    }

    #[test]
    fn blank_revenue_remark_reads_as_placeholder() {
        let columns = vec!["公司简称".to_string(), "备注1：收入环比变动原因".to_string()];
        for blank in [CellValue::Empty, CellValue::text(""), CellValue::text("  ")] {
            let cells = vec![CellValue::text("甲公司"), blank];
            let report = build_dashboard("甲公司", RecordRow::new(&columns, &cells));
            assert_eq!(report.dashboard.revenue_remark, "无");
        }

        let cells = vec![CellValue::text("甲公司"), CellValue::text("新品上市")];
        let report = build_dashboard("甲公司", RecordRow::new(&columns, &cells));
        assert_eq!(report.dashboard.revenue_remark, "新品上市");
    }

    #[test]
    fn empty_pies_are_omitted() {
        let columns = vec!["公司简称".to_string(), "集团内".to_string()];
        let cells = vec![CellValue::text("乙公司"), CellValue::Number(0.0)];
        let report = build_dashboard("乙公司", RecordRow::new(&columns, &cells));
        assert!(report.dashboard.group_split.is_none());
        assert!(report.dashboard.expense_split.is_none());
        assert_eq!(report.dashboard.summary, Annotation::Plain("暂无小结".to_string()));
    }
}
