//! Extractor for the HTML backtest report: a key/value scan over every
//! two-cell table row plus the trade log table. Extraction is best-effort
//! and never fails; unreadable numbers degrade to zero.

use std::collections::HashMap;

use scraper::{ElementRef, Html, Selector};
use tracing::info;

use crate::models::report::{BacktestReport, TradeRecord};
use crate::services::numeric::normalize_number;

pub fn parse_backtest_report(content: &str) -> BacktestReport {
    let doc = Html::parse_document(content);
    let row_sel = Selector::parse("tr").unwrap();
    let cell_sel = Selector::parse("th, td").unwrap();

    // Label -> value text, scanned in document order. A repeated label keeps
    // its last occurrence.
    let mut metrics: HashMap<String, String> = HashMap::new();
    for row in doc.select(&row_sel) {
        let cells: Vec<String> = row.select(&cell_sel).map(cell_text).collect();
        if cells.len() >= 2 {
            metrics.insert(cells[0].clone(), cells[1].clone());
        }
    }

    let metric = |label: &str| -> f64 {
        normalize_number(metrics.get(label).map(String::as_str).unwrap_or_default())
    };
    // Labels like "Short positions (won %)" carry a trailing qualifier in the
    // value cell as well ("120 (55.83%)"); only the first token is the count.
    let first_token = |label: &str| -> f64 {
        let raw = metrics.get(label).map(String::as_str).unwrap_or_default();
        normalize_number(raw.split_whitespace().next().unwrap_or_default())
    };

    let initial_deposit = metric("Initial deposit");
    let total_net_profit = metric("Total net profit");
    let gross_profit = metric("Gross profit");
    let gross_loss = metric("Gross loss");
    let profit_factor = metric("Profit factor");
    let expected_payoff = metric("Expected payoff");
    let absolute_drawdown = metric("Absolute drawdown");
    let maximal_drawdown = metric("Maximal drawdown");

    // "12.45% (3 456.00)": everything from the parenthesis on is noise.
    let relative_raw = metrics
        .get("Relative drawdown")
        .map(String::as_str)
        .unwrap_or_default();
    let relative_drawdown_percent =
        normalize_number(relative_raw.split('(').next().unwrap_or_default());

    let total_trades = metric("Total trades") as u32;
    let short_positions = first_token("Short positions (won %)") as u32;
    let long_positions = first_token("Long positions (won %)") as u32;
    let profit_trades = first_token("Profit trades (% of total)") as u32;
    let loss_trades = first_token("Loss trades (% of total)") as u32;

    let sharpe_ratio = metrics
        .get("Sharpe Ratio")
        .map(|v| normalize_number(v));
    let recovery_factor = if maximal_drawdown > 0.0 {
        Some(total_net_profit / maximal_drawdown)
    } else {
        None
    };
    let win_rate = if total_trades > 0 {
        profit_trades as f64 / total_trades as f64 * 100.0
    } else {
        0.0
    };

    let trades = extract_trades(&doc, &row_sel);

    info!("Parsed backtest report with {} trades", trades.len());

    BacktestReport {
        initial_deposit,
        total_net_profit,
        gross_profit,
        gross_loss,
        profit_factor,
        expected_payoff,
        absolute_drawdown,
        maximal_drawdown,
        relative_drawdown_percent,
        total_trades,
        short_positions,
        long_positions,
        profit_trades,
        loss_trades,
        sharpe_ratio,
        recovery_factor,
        win_rate,
        trades,
    }
}

/// The trade log lives in the table tagged `id="trades"` when the export
/// provides one, otherwise in the last table of the document. The first row
/// is a header; rows with at least 7 cells become trade records.
fn extract_trades(doc: &Html, row_sel: &Selector) -> Vec<TradeRecord> {
    let tagged = Selector::parse("table#trades").unwrap();
    let any_table = Selector::parse("table").unwrap();
    let td_sel = Selector::parse("td").unwrap();

    let Some(table) = doc
        .select(&tagged)
        .next()
        .or_else(|| doc.select(&any_table).last())
    else {
        return Vec::new();
    };

    let mut trades = Vec::new();
    for row in table.select(row_sel).skip(1) {
        let cells: Vec<String> = row.select(&td_sel).map(cell_text).collect();
        if cells.len() >= 7 {
            trades.push(TradeRecord {
                ticket: cells[0].clone(),
                time: cells[1].clone(),
                trade_type: cells[2].clone(),
                size: normalize_number(&cells[3]),
                symbol: cells[4].clone(),
                price: normalize_number(&cells[5]),
                profit: normalize_number(&cells[6]),
            });
        }
    }
    trades
}

fn cell_text(cell: ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BACKTEST_HTML: &str = r#"<html><body>
        <table>
            <tr><td>Initial deposit</td><td>10 000.00</td></tr>
            <tr><td>Total net profit</td><td>2 345.67</td></tr>
            <tr><td>Gross profit</td><td>5 500.00</td></tr>
            <tr><td>Gross loss</td><td>-3 154.33</td></tr>
            <tr><td>Profit factor</td><td>1.74</td></tr>
            <tr><td>Expected payoff</td><td>23.46</td></tr>
            <tr><td>Absolute drawdown</td><td>450.00</td></tr>
            <tr><td>Maximal drawdown</td><td>1 172.84</td></tr>
            <tr><td>Relative drawdown</td><td>11.73% (1 172.84)</td></tr>
            <tr><td>Total trades</td><td>100</td></tr>
            <tr><td>Short positions (won %)</td><td>48 (52.08%)</td></tr>
            <tr><td>Long positions (won %)</td><td>52 (57.69%)</td></tr>
            <tr><td>Profit trades (% of total)</td><td>55 (55.00%)</td></tr>
            <tr><td>Loss trades (% of total)</td><td>45 (45.00%)</td></tr>
        </table>
        <table id="trades">
            <tr><th>#</th><th>Time</th><th>Type</th><th>Size</th><th>Symbol</th><th>Price</th><th>Profit</th></tr>
            <tr><td>1</td><td>2024.01.02 10:15</td><td>buy</td><td>0.10</td><td>EURUSD</td><td>1.10450</td><td>25.50</td></tr>
            <tr><td>2</td><td>2024.01.03 14:30</td><td>sell</td><td>0.10</td><td>EURUSD</td><td>1.09880</td><td>-12.30</td></tr>
        </table>
    </body></html>"#;

    #[test]
    fn extracts_aggregate_metrics() {
        let report = parse_backtest_report(BACKTEST_HTML);
        assert_eq!(report.initial_deposit, 10000.00);
        assert_eq!(report.total_net_profit, 2345.67);
        assert_eq!(report.gross_profit, 5500.00);
        assert_eq!(report.gross_loss, -3154.33);
        assert_eq!(report.profit_factor, 1.74);
        assert_eq!(report.expected_payoff, 23.46);
        assert_eq!(report.absolute_drawdown, 450.00);
        assert_eq!(report.maximal_drawdown, 1172.84);
        assert_eq!(report.relative_drawdown_percent, 11.73);
    }

    #[test]
    fn qualifier_labels_take_the_leading_count() {
        let report = parse_backtest_report(BACKTEST_HTML);
        assert_eq!(report.total_trades, 100);
        assert_eq!(report.short_positions, 48);
        assert_eq!(report.long_positions, 52);
        assert_eq!(report.profit_trades, 55);
        assert_eq!(report.loss_trades, 45);
    }

    #[test]
    fn derives_recovery_factor_and_win_rate() {
        let report = parse_backtest_report(BACKTEST_HTML);
        let recovery = report.recovery_factor.unwrap();
        assert!((recovery - 2345.67 / 1172.84).abs() < 1e-9);
        assert!((report.win_rate - 55.0).abs() < 1e-9);
        // not present in this export
        assert!(report.sharpe_ratio.is_none());
    }

    #[test]
    fn parses_trade_log_from_tagged_table() {
        let report = parse_backtest_report(BACKTEST_HTML);
        assert_eq!(report.trades.len(), 2);
        assert_eq!(report.trades[0].ticket, "1");
        assert_eq!(report.trades[0].trade_type, "buy");
        assert_eq!(report.trades[0].size, 0.10);
        assert_eq!(report.trades[0].symbol, "EURUSD");
        assert_eq!(report.trades[0].price, 1.10450);
        assert_eq!(report.trades[1].profit, -12.30);
    }

    #[test]
    fn falls_back_to_last_table_for_trades() {
        let html = r#"<html><body>
            <table><tr><td>Total trades</td><td>1</td></tr></table>
            <table>
                <tr><th>#</th><th>Time</th><th>Type</th><th>Size</th><th>Symbol</th><th>Price</th><th>Profit</th></tr>
                <tr><td>7</td><td>2024.02.01 09:00</td><td>buy</td><td>0.20</td><td>GBPUSD</td><td>1.26500</td><td>40.00</td></tr>
            </table>
        </body></html>"#;
        let report = parse_backtest_report(html);
        assert_eq!(report.trades.len(), 1);
        assert_eq!(report.trades[0].ticket, "7");
    }

    #[test]
    fn empty_report_never_fails() {
        let report = parse_backtest_report("<html><body><p>nothing here</p></body></html>");
        assert_eq!(report.initial_deposit, 0.0);
        assert_eq!(report.total_trades, 0);
        assert_eq!(report.win_rate, 0.0);
        assert!(report.recovery_factor.is_none());
        assert!(report.trades.is_empty());
    }

    #[test]
    fn repeated_label_keeps_last_occurrence() {
        let html = r#"<html><body>
            <table><tr><td>Total net profit</td><td>100.00</td></tr></table>
            <table><tr><td>Total net profit</td><td>250.00</td></tr></table>
        </body></html>"#;
        let report = parse_backtest_report(html);
        assert_eq!(report.total_net_profit, 250.00);
    }

    #[test]
    fn sharpe_label_populates_optional_field() {
        let html = r#"<table>
            <tr><td>Sharpe Ratio</td><td>1.42</td></tr>
            <tr><td>Total trades</td><td>10</td></tr>
        </table>"#;
        let report = parse_backtest_report(html);
        assert_eq!(report.sharpe_ratio, Some(1.42));
    }

    #[test]
    fn garbage_numbers_degrade_to_zero() {
        let html = r#"<table>
            <tr><td>Initial deposit</td><td>n/a</td></tr>
            <tr><td>Total trades</td><td>unknown</td></tr>
        </table>"#;
        let report = parse_backtest_report(html);
        assert_eq!(report.initial_deposit, 0.0);
        assert_eq!(report.total_trades, 0);
    }
}
