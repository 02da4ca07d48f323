//! Plain-terminal renderings used by the one-shot commands.

use crate::format::{format_currency, format_percent};
use crate::fund::{Fund, FundDetail, Health, MarketSummary};
use crate::history::chart_series;
use crate::listing::SortState;
use crate::portfolio::PortfolioTotals;
use colored::Colorize;
use comfy_table::{
    presets::UTF8_FULL, Attribute, Cell, CellAlignment, ContentArrangement, Table,
};

fn table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
    table
}

fn signed(value: f64, text: String) -> String {
    if value >= 0.0 {
        text.green().to_string()
    } else {
        text.red().to_string()
    }
}

pub fn funds_table(funds: &[&Fund], total: usize, sort: SortState) -> String {
    let mut table = table();
    let header = ["Name", "Code", "Category", "NAV", "NAV Date"];
    table.set_header(header.iter().map(|h| {
        let title = if h.eq_ignore_ascii_case(sort.key.as_str()) {
            format!("{h} {}", sort.direction.arrow())
        } else {
            h.to_string()
        };
        Cell::new(title).add_attribute(Attribute::Bold)
    }));

    for fund in funds {
        table.add_row(vec![
            Cell::new(&fund.name),
            Cell::new(&fund.code),
            Cell::new(&fund.category),
            Cell::new(format!("{:.4}", fund.nav)).set_alignment(CellAlignment::Right),
            Cell::new(&fund.nav_date),
        ]);
    }

    format!("{table}\nShowing {} of {} funds", funds.len(), total)
}

pub fn fund_detail(detail: &FundDetail) -> String {
    let fund = &detail.fund;
    let mut out = format!(
        "{} ({})\nNAV {:.4} as of {}\n",
        fund.name.bold(),
        fund.code,
        fund.nav,
        fund.nav_date
    );

    let mut metadata = table();
    for (label, value) in fund.metadata() {
        metadata.add_row(vec![Cell::new(label).add_attribute(Attribute::Bold), Cell::new(value)]);
    }
    out.push_str(&format!("{metadata}\n"));

    let series = chart_series(Some(detail.nav_history.as_slice()));
    if series.is_empty() {
        out.push_str("No NAV history available\n");
    } else {
        let mut history = table();
        history.set_header(vec![
            Cell::new("Date").add_attribute(Attribute::Bold),
            Cell::new("NAV").add_attribute(Attribute::Bold),
        ]);
        for sample in &series {
            history.add_row(vec![
                Cell::new(&sample.date),
                Cell::new(format!("{:.4}", sample.nav)).set_alignment(CellAlignment::Right),
            ]);
        }
        out.push_str(&format!("NAV history (last {} samples)\n{history}\n", series.len()));
    }

    if !detail.scheme_info.is_empty() {
        out.push_str(&format!("{}\n", "Scheme information".bold()));
        for (key, value) in &detail.scheme_info {
            out.push_str(&format!("  {key}: {value}\n"));
        }
    }
    out
}

pub fn summary(
    summary: &MarketSummary,
    totals: &PortfolioTotals,
    currency: &str,
    health: Option<&Health>,
) -> String {
    let mut out = String::new();

    out.push_str(&format!("{}\n", "Portfolio".bold()));
    out.push_str(&format!(
        "  Value     {}\n  Invested  {}\n  Gain/Loss {}\n",
        format_currency(totals.current_value, currency),
        format_currency(totals.invested, currency),
        signed(
            totals.gain_loss,
            format!(
                "{} ({})",
                format_currency(totals.gain_loss, currency),
                format_percent(totals.gain_loss_percent)
            )
        ),
    ));

    let status = if summary.market_status == "Open" {
        summary.market_status.green()
    } else {
        summary.market_status.yellow()
    };
    out.push_str(&format!("{}\n", "Market".bold()));
    out.push_str(&format!(
        "  Status    {status}\n  Funds     {}\n  Updated   {}\n",
        summary.total_funds,
        summary.last_updated_display()
    ));
    if let Some(health) = health {
        out.push_str(&format!("  API       {} ({})\n", health.status, health.mftool_status));
    }

    if !summary.top_performing.is_empty() {
        let mut top = table();
        top.set_header(
            ["Top Performing", "Code", "Category", "NAV"]
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold)),
        );
        for fund in &summary.top_performing {
            top.add_row(vec![
                Cell::new(&fund.name),
                Cell::new(&fund.code),
                Cell::new(&fund.category),
                Cell::new(format!("{:.2}", fund.nav)).set_alignment(CellAlignment::Right),
            ]);
        }
        out.push_str(&format!("{top}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::{SortDirection, SortKey};
    use crate::testing::fund;
    use serde_json::json;

    #[test]
    fn test_funds_table_counts_and_arrow() {
        let funds = [fund("Alpha", "A1", 12.5, "Equity"), fund("Beta", "B2", 7.0, "Debt")];
        let refs: Vec<&Fund> = funds.iter().take(1).collect();
        let sort = SortState {
            key: SortKey::Nav,
            direction: SortDirection::Desc,
        };
        let out = funds_table(&refs, funds.len(), sort);
        assert!(out.contains("Alpha"));
        assert!(!out.contains("Beta"));
        assert!(out.contains("NAV ↓"));
        assert!(out.ends_with("Showing 1 of 2 funds"));
    }

    #[test]
    fn test_fund_detail_report() {
        let detail: FundDetail = serde_json::from_value(json!({
            "code": "A1", "name": "Alpha", "nav": "12.5",
            "nav_history": [{"Date": "2024-01-01", "NAV": "12.1"}, {"date": "2024-01-02", "nav": 12.5}],
            "scheme_info": {"scheme_type": "Open Ended"}
        }))
        .unwrap();
        let out = fund_detail(&detail);
        assert!(out.contains("NAV history (last 2 samples)"));
        assert!(out.contains("12.1000"));
        assert!(out.contains("scheme_type: Open Ended"));
        assert!(out.contains("N/A"));
    }

    #[test]
    fn test_fund_detail_without_history() {
        let detail: FundDetail = serde_json::from_value(json!({"code": "A1"})).unwrap();
        assert!(fund_detail(&detail).contains("No NAV history available"));
    }

    #[test]
    fn test_summary_report() {
        let market: MarketSummary = serde_json::from_value(json!({
            "total_funds": 42,
            "top_performing": [{"code": "G3", "name": "Gamma", "nav": 20.0, "category": "Equity"}],
            "last_updated": "not a timestamp",
            "market_status": "Closed"
        }))
        .unwrap();
        let totals = PortfolioTotals {
            current_value: 83450.0,
            invested: 79615.0,
            gain_loss: 3835.0,
            gain_loss_percent: 4.82,
        };
        let out = summary(&market, &totals, "INR", None);
        assert!(out.contains("₹83,450.00"));
        assert!(out.contains("4.82%"));
        assert!(out.contains("Closed"));
        assert!(out.contains("42"));
        assert!(out.contains("not a timestamp"));
        assert!(out.contains("Gamma"));
        assert!(!out.contains("API"));
    }
}
