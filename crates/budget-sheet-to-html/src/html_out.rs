use std::fmt::Write as _;

use serde_json::{Value, json};

use crate::dashboard::{
    AMOUNT_UNIT, CashCard, CostRowKind, CostTreeRow, Dashboard, ExpenseTab, KpiCard, PieSlice,
    ShareBand, Trend,
};
use crate::numeric::{MISSING_AMOUNT, format_thousands};
use crate::options::{RenderOptions, Theme};
use crate::text_list::render_annotation;

pub(crate) fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// JSON for an inline `<script>`; `</` must not close the tag early.
fn script_json(value: &Value) -> String {
    value.to_string().replace("</", "<\\/")
}

fn style_sheet(theme: &Theme) -> String {
    let Theme {
        primary_blue,
        secondary_blue,
        light_blue,
        light_blue_bg,
        rise_red,
        fall_green,
        neutral_gray,
        text_dark,
        text_gray,
        border_light,
        attention_orange,
    } = theme;

    format!(
        r"
:root {{
    --primary-blue: {primary_blue};
    --secondary-blue: {secondary_blue};
    --light-blue: {light_blue};
    --light-blue-bg: {light_blue_bg};
    --rise-red: {rise_red};
    --fall-green: {fall_green};
    --neutral-gray: {neutral_gray};
    --text-dark: {text_dark};
    --text-gray: {text_gray};
    --border-light: {border_light};
    --attention-orange: {attention_orange};
}}
body {{ font-family: 'PingFang SC', 'Microsoft YaHei', sans-serif; color: var(--text-dark); margin: 0 auto; max-width: 1280px; padding: 24px; }}
.subtitle {{ color: var(--text-gray); margin-top: -8px; }}
.kpi-row, .cash-row, .split-row {{ display: flex; gap: 24px; }}
.kpi-row > *, .cash-row > *, .split-row > * {{ flex: 1; }}
.kpi-card {{ background: linear-gradient(135deg, #ffffff 0%, #f8f9fa 100%); padding: 24px; border-radius: 12px; border: 1px solid var(--border-light); box-shadow: 0 4px 12px rgba(0, 82, 204, 0.08); margin-bottom: 16px; }}
.kpi-title {{ font-size: 0.95rem; color: var(--text-gray); font-weight: 500; margin-bottom: 12px; }}
.kpi-value-2026 {{ font-size: 1.8rem; font-weight: 700; color: var(--primary-blue); margin: 10px 0; }}
.kpi-value-2025 {{ font-size: 1.1rem; color: var(--text-gray); margin-bottom: 5px; }}
.kpi-change {{ font-size: 1.1rem; font-weight: 600; margin-top: 8px; padding: 6px 12px; border-radius: 6px; display: inline-block; }}
.kpi-change.rise {{ color: var(--rise-red); background-color: rgba(255, 77, 79, 0.1); }}
.kpi-change.fall {{ color: var(--fall-green); background-color: rgba(82, 196, 26, 0.1); }}
.section-title {{ font-size: 1.4rem; font-weight: 700; color: var(--primary-blue); margin: 32px 0 20px 0; padding-bottom: 12px; border-bottom: 3px solid var(--primary-blue); }}
.info-box {{ background: var(--light-blue-bg); padding: 16px 20px; border-radius: 8px; white-space: pre-wrap; }}
.tabs {{ display: flex; gap: 8px; margin-bottom: 12px; }}
.tabs input {{ display: none; }}
.tabs label {{ padding: 6px 14px; border-radius: 6px; cursor: pointer; border: 1px solid var(--border-light); }}
.tab-panel {{ display: none; }}
.tab-panel.active {{ display: block; }}
.attention-box {{ background: linear-gradient(135deg, #fff9e6 0%, #fffbf0 100%); padding: 24px; border-radius: 12px; border-left: 4px solid #faad14; }}
.note-box {{ color: var(--text-dark); font-size: 1rem; background: #f0f5ff; padding: 20px; border-radius: 8px; }}
.summary-content {{ font-size: 1.1rem; line-height: 1.8; color: var(--text-dark); }}
.cash-value {{ font-size: 1.6rem; font-weight: bold; }}
.tree-table {{ width: 100%; border-collapse: collapse; font-size: 1.1rem; background: white; box-shadow: 0 2px 8px rgba(0,0,0,0.08); border-radius: 8px; overflow: hidden; }}
.tree-table th {{ background: linear-gradient(135deg, var(--primary-blue) 0%, #0066ff 100%); color: white; padding: 16px 12px; text-align: left; font-weight: 600; }}
.tree-table td {{ padding: 14px 12px; border-bottom: 1px solid #e8e8e8; }}
.tree-row-root {{ background: #f0f5ff; font-weight: 700; font-size: 1.2rem; color: var(--primary-blue); }}
.tree-row-parent {{ background: #fff9e6; font-weight: 600; color: var(--attention-orange); }}
.tree-row-child, .tree-row-normal {{ background: white; color: #333; }}
.tree-indent-0 {{ padding-left: 12px; }}
.tree-indent-1 {{ padding-left: 32px; }}
.tree-indent-2 {{ padding-left: 52px; }}
.tree-icon {{ display: inline-block; width: 16px; margin-right: 8px; font-weight: bold; }}
.progress-bar-container {{ width: 100%; background: #e8e8e8; border-radius: 4px; height: 24px; overflow: hidden; }}
.progress-bar {{ height: 100%; border-radius: 4px; display: flex; align-items: center; justify-content: flex-end; padding-right: 8px; color: white; font-weight: 600; font-size: 0.95rem; box-sizing: border-box; }}
.progress-bar-high {{ background: linear-gradient(90deg, var(--primary-blue) 0%, #0066ff 100%); }}
.progress-bar-medium {{ background: linear-gradient(90deg, var(--secondary-blue) 0%, var(--light-blue) 100%); }}
.progress-bar-low {{ background: linear-gradient(90deg, var(--neutral-gray) 0%, #b0bec5 100%); }}
.amount-cell {{ font-family: 'Consolas', 'Monaco', monospace; font-weight: 600; text-align: right; }}
footer {{ color: var(--text-gray); font-size: 0.85rem; margin-top: 40px; }}
"
    )
}

fn with_unit(value: &str, unit: Option<&str>) -> String {
    match unit {
        Some(unit) if value != MISSING_AMOUNT => format!("{} {unit}", escape_html(value)),
        _ => escape_html(value),
    }
}

fn render_kpi(out: &mut String, card: &KpiCard) {
    let _ = write!(
        out,
        r#"<div class="kpi-card"><div class="kpi-title">{}</div><div class="kpi-value-2026">{}</div><div class="kpi-value-2025">2025年：{}</div>"#,
        escape_html(card.title),
        with_unit(&card.current, card.unit),
        with_unit(&card.previous, card.unit)
    );

    match (&card.change, card.trend) {
        (Some(change), Trend::Increase) => {
            let _ = write!(out, r#"<span class="kpi-change rise">{}</span>"#, escape_html(change));
        }
        (Some(change), Trend::Decrease) => {
            let _ = write!(out, r#"<span class="kpi-change fall">{}</span>"#, escape_html(change));
        }
        (Some(change), _) => {
            let _ = write!(out, r#"<span class="kpi-change">{}</span>"#, escape_html(change));
        }
        (None, _) if card.unit.is_some() => {
            let _ = write!(out, r#"<span class="kpi-change">{MISSING_AMOUNT}</span>"#);
        }
        (None, _) => {}
    }
    out.push_str("</div>");
}

fn quarter_figure(dashboard: &Dashboard, theme: &Theme) -> Value {
    let styles = [
        (&theme.neutral_gray, 14, &theme.text_gray),
        (&theme.primary_blue, 16, &theme.primary_blue),
    ];
    let traces = dashboard
        .quarterly
        .iter()
        .zip(styles)
        .map(|(series, (color, font_size, font_color))| {
            json!({
                "type": "scatter",
                "x": dashboard.quarter_labels,
                "y": series.values,
                "name": series.name,
                "mode": "lines+markers+text",
                "line": { "color": color, "width": 4 },
                "marker": { "size": 12, "color": color },
                "text": series
                    .values
                    .iter()
                    .map(|value| format!("{} {AMOUNT_UNIT}", format_thousands(*value)))
                    .collect::<Vec<_>>(),
                "textposition": "top center",
                "textfont": { "size": font_size, "color": font_color },
            })
        })
        .collect::<Vec<_>>();

    json!({
        "data": traces,
        "layout": {
            "height": 400,
            "margin": { "l": 60, "r": 60, "t": 60, "b": 60 },
            "legend": { "orientation": "h", "yanchor": "bottom", "y": 1.02, "xanchor": "center", "x": 0.5 },
            "xaxis": { "title": { "text": "季度" } },
            "yaxis": { "title": { "text": format!("收入 ({AMOUNT_UNIT})") } },
            "plot_bgcolor": "rgba(0,0,0,0)",
            "paper_bgcolor": "rgba(0,0,0,0)",
        },
    })
}

fn pie_figure(slices: &[PieSlice], colors: &[&String], title: Option<&str>, height: u32) -> Value {
    let top_margin = if title.is_some() { 50 } else { 10 };
    let mut layout = json!({
        "height": height,
        "margin": { "l": 20, "r": 20, "t": top_margin, "b": 20 },
        "showlegend": title.is_some(),
    });
    if let Some(title) = title {
        layout["title"] = json!({ "text": title, "font": { "size": 16 } });
    }

    json!({
        "data": [{
            "type": "pie",
            "labels": slices.iter().map(|slice| slice.label).collect::<Vec<_>>(),
            "values": slices.iter().map(|slice| slice.value).collect::<Vec<_>>(),
            "marker": { "colors": colors },
            "textposition": "inside",
            "texttemplate": format!("<b>%{{label}}</b><br>%{{value:,.0f}} {AMOUNT_UNIT}<br>(%{{percent}})"),
            "textfont": { "size": 14 },
        }],
        "layout": layout,
    })
}

fn render_chart(out: &mut String, id: &str, figure: &Value) {
    let _ = write!(
        out,
        r#"<div id="{id}"></div><script>Plotly.newPlot("{id}", ...(f => [f.data, f.layout, {{responsive: true}}])({}));</script>"#,
        script_json(figure)
    );
}

fn render_expense_tab(out: &mut String, index: usize, tab: &ExpenseTab) {
    let active = if index == 0 { " active" } else { "" };
    let _ = write!(out, r#"<div class="tab-panel{active}" id="tab-{index}">"#);
    if let (Some(amount), Some(rate)) = (tab.amount, &tab.rate) {
        let _ = write!(
            out,
            "<p><b>金额:</b> {} {AMOUNT_UNIT} | <b>费率:</b> {}</p>",
            format_thousands(amount),
            escape_html(rate)
        );
    }
    out.push_str(&render_annotation(&tab.note, "inherit"));
    out.push_str("</div>");
}

fn render_progress_bar(share: f64, band: ShareBand) -> String {
    let class = match band {
        ShareBand::High => "progress-bar-high",
        ShareBand::Medium => "progress-bar-medium",
        ShareBand::Low => "progress-bar-low",
    };
    let width = share.clamp(0.0, 100.0);
    format!(
        r#"<div class="progress-bar-container"><div class="progress-bar {class}" style="width: {width:.2}%;">{share:.0}%</div></div>"#
    )
}

fn render_cost_row(out: &mut String, row: &CostTreeRow) {
    let (class, indent, icon) = match row.kind {
        CostRowKind::Root => ("tree-row-root", 0, r#"<span class="tree-icon">▼</span>"#),
        CostRowKind::Parent => ("tree-row-parent", 1, r#"<span class="tree-icon">▶</span>"#),
        CostRowKind::Child => ("tree-row-child", 2, ""),
        CostRowKind::Normal => ("tree-row-normal", 1, ""),
    };
    let _ = write!(
        out,
        r#"<tr class="tree-row {class}"><td class="tree-indent-{indent}">{icon}{}</td><td class="amount-cell">{}</td><td>{}</td></tr>"#,
        escape_html(row.label),
        row.amount_text(),
        render_progress_bar(row.share, row.band())
    );
}

fn render_cash_card(out: &mut String, card: &CashCard, theme: &Theme) {
    let color = if !card.signed {
        &theme.primary_blue
    } else if card.amount >= 0.0 {
        &theme.fall_green
    } else {
        &theme.rise_red
    };
    let _ = write!(
        out,
        r#"<div><h5>{}</h5><div class="cash-value" style="color:{};">{} {AMOUNT_UNIT}</div></div>"#,
        escape_html(card.title),
        escape_html(color),
        format_thousands(card.amount)
    );
}

const TAB_SCRIPT: &str = r"<script>
document.querySelectorAll('.tabs label').forEach(label => label.addEventListener('click', () => {
    document.querySelectorAll('.tab-panel').forEach(panel => panel.classList.remove('active'));
    document.getElementById(label.dataset.tab).classList.add('active');
}));
</script>";

/// Renders the whole dashboard page.
#[must_use]
pub fn render_dashboard_html(dashboard: &Dashboard, options: &RenderOptions) -> String {
    let theme = &options.theme;
    let company = escape_html(&dashboard.company);
    let mut out = String::with_capacity(32 * 1024);

    let _ = write!(
        out,
        r#"<!DOCTYPE html><html lang="zh-CN"><head><meta charset="utf-8"><title>{company} · 2026预算可视化看板</title><script src="{}"></script><style>{}</style></head><body>"#,
        escape_html(&options.plotly_src),
        style_sheet(theme)
    );
    let _ = write!(
        out,
        r#"<h1>{company}</h1><p class="subtitle">2026年全面预算概览</p>"#
    );

    out.push_str(r#"<div class="kpi-row">"#);
    for card in &dashboard.kpis {
        render_kpi(&mut out, card);
    }
    out.push_str("</div><hr>");

    out.push_str(r#"<div class="section-title">收入分析</div><h5>季度收入趋势对比</h5>"#);
    render_chart(&mut out, "quarterly-revenue", &quarter_figure(dashboard, theme));
    out.push_str(r#"<div class="split-row"><div><h5>收入变动备注</h5>"#);
    let _ = write!(
        out,
        r#"<div class="info-box"><b>环比变动原因：</b>
{}</div></div><div><h5>集团内外收入分布</h5>"#,
        escape_html(&dashboard.revenue_remark)
    );
    match &dashboard.group_split {
        Some(slices) => render_chart(
            &mut out,
            "group-split",
            &pie_figure(slices, &[&theme.primary_blue, &theme.neutral_gray], None, 320),
        ),
        None => out.push_str(r#"<div class="info-box">暂无集团内外数据</div>"#),
    }
    out.push_str("</div></div><hr>");

    out.push_str(r#"<div class="section-title">费用与成本</div><div class="split-row"><div>"#);
    match &dashboard.expense_split {
        Some(slices) => render_chart(
            &mut out,
            "expense-split",
            &pie_figure(
                slices,
                &[&theme.primary_blue, &theme.secondary_blue, &theme.light_blue],
                Some("2026年期间费用结构"),
                380,
            ),
        ),
        None => out.push_str("<p>暂无费用数据</p>"),
    }
    out.push_str(r#"</div><div><h5>费用明细说明</h5><div class="tabs">"#);
    for (index, tab) in dashboard.expense_tabs.iter().enumerate() {
        let _ = write!(
            out,
            r#"<label data-tab="tab-{index}">{}</label>"#,
            escape_html(tab.title)
        );
    }
    out.push_str("</div>");
    for (index, tab) in dashboard.expense_tabs.iter().enumerate() {
        render_expense_tab(&mut out, index, tab);
    }
    out.push_str("</div></div><hr>");

    out.push_str(
        r#"<div class="section-title">固定成本费用</div><table class="tree-table"><thead><tr><th style="width: 45%;">成本项目</th><th style="width: 25%; text-align: right;">金额(万元)</th><th style="width: 30%;">占比结构</th></tr></thead><tbody>"#,
    );
    for row in &dashboard.cost_tree {
        render_cost_row(&mut out, row);
    }
    out.push_str("</tbody></table><hr>");

    out.push_str(r#"<div class="section-title">资金投入与现金流量情况</div><div class="cash-row">"#);
    for card in &dashboard.cash_cards {
        render_cash_card(&mut out, card, theme);
    }
    let _ = write!(
        out,
        r#"</div><h5>资金缺口说明</h5><div class="note-box">{}</div><hr>"#,
        render_annotation(&dashboard.fund_gap_note, &theme.text_dark)
    );

    let _ = write!(
        out,
        r#"<h3>2026年预算执行小结</h3><div class="summary-content">{}</div><hr>"#,
        render_annotation(&dashboard.summary, &theme.text_dark)
    );
    let _ = write!(
        out,
        r#"<h3>提请管理层关注</h3><div class="attention-box">{}</div>"#,
        render_annotation(&dashboard.attention, &theme.attention_orange)
    );

    if let Some(footer) = &options.footer {
        let _ = write!(out, "<footer>{}</footer>", escape_html(footer));
    }
    out.push_str(TAB_SCRIPT);
    out.push_str("</body></html>");
    out
}
