//! Decoders for the two optimization report exports (tabular XML and
//! schemaless HTML). Both produce the same canonical record sequence.

use std::collections::BTreeMap;
use std::str::FromStr;

use roxmltree::Document;
use scraper::{ElementRef, Html, Selector};
use tracing::info;

use crate::error::AppError;
use crate::models::report::OptimizationRecord;
use crate::services::numeric::{infer_scalar, normalize_number};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Xml,
    Html,
}

impl ReportFormat {
    /// Discriminate by file extension: `.xml` means the XML export,
    /// everything else is treated as HTML.
    pub fn from_filename(filename: &str) -> Self {
        if filename.to_ascii_lowercase().ends_with(".xml") {
            ReportFormat::Xml
        } else {
            ReportFormat::Html
        }
    }
}

impl FromStr for ReportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xml" => Ok(ReportFormat::Xml),
            "html" => Ok(ReportFormat::Html),
            other => Err(AppError::Format(format!(
                "unsupported report format: {other}"
            ))),
        }
    }
}

pub fn parse_optimization_report(
    content: &str,
    format: ReportFormat,
) -> Result<Vec<OptimizationRecord>, AppError> {
    match format {
        ReportFormat::Xml => parse_xml(content),
        ReportFormat::Html => parse_html(content),
    }
}

/// XML export: one record per `Row` element. The `Pass` attribute becomes
/// the pass number (0 when absent), `Parameter` children become inferred
/// parameter entries, and the fixed metric elements fill the record fields.
/// Optional metrics stay absent when their element is missing.
fn parse_xml(content: &str) -> Result<Vec<OptimizationRecord>, AppError> {
    let doc = Document::parse(content)
        .map_err(|e| AppError::Format(format!("malformed XML report: {e}")))?;

    let mut records = Vec::new();

    for row in doc.descendants().filter(|n| n.has_tag_name("Row")) {
        let pass_number = row
            .attribute("Pass")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0);

        let mut parameters = BTreeMap::new();
        let mut profit = 0.0;
        let mut total_trades = 0;
        let mut profit_factor = None;
        let mut expected_payoff = None;
        let mut drawdown = None;
        let mut sharpe_ratio = None;
        let mut recovery_factor = None;

        for child in row.children().filter(|n| n.is_element()) {
            let text = child.text().unwrap_or("").trim();
            match child.tag_name().name() {
                "Parameter" => {
                    let name = child.attribute("name").unwrap_or("").to_string();
                    parameters.insert(name, infer_scalar(text));
                }
                "Result" => profit = text.parse().unwrap_or(0.0),
                "Trades" => total_trades = text.parse().unwrap_or(0),
                "ProfitFactor" => profit_factor = text.parse().ok(),
                "ExpectedPayoff" => expected_payoff = text.parse().ok(),
                "Drawdown" => drawdown = text.parse().ok(),
                "Sharpe" => sharpe_ratio = text.parse().ok(),
                "Recovery" => recovery_factor = text.parse().ok(),
                _ => {}
            }
        }

        records.push(OptimizationRecord {
            pass_number,
            parameters,
            profit,
            total_trades,
            profit_factor,
            expected_payoff,
            drawdown,
            drawdown_percent: None,
            sharpe_ratio,
            recovery_factor,
            win_rate: None,
        });
    }

    info!("Parsed {} optimization results from XML", records.len());
    Ok(records)
}

/// HTML export: the first table (preferring one with an `optimization`
/// class) supplies a header row and data rows. Columns are classified by
/// header substring; anything unrecognized is a user parameter.
fn parse_html(content: &str) -> Result<Vec<OptimizationRecord>, AppError> {
    let doc = Html::parse_document(content);
    let preferred = Selector::parse("table.optimization").unwrap();
    let any_table = Selector::parse("table").unwrap();
    let row_sel = Selector::parse("tr").unwrap();
    let cell_sel = Selector::parse("th, td").unwrap();

    let table = doc
        .select(&preferred)
        .next()
        .or_else(|| doc.select(&any_table).next())
        .ok_or_else(|| AppError::Format("no optimization table found in HTML report".to_string()))?;

    let rows: Vec<ElementRef> = table.select(&row_sel).collect();
    let headers: Vec<String> = rows
        .first()
        .map(|r| r.select(&cell_sel).map(cell_text).collect())
        .unwrap_or_default();

    let mut records = Vec::new();

    for (index, row) in rows.iter().enumerate().skip(1) {
        let values: Vec<String> = row.select(&cell_sel).map(cell_text).collect();
        if values.len() < 2 {
            continue;
        }

        // Pure-digit first cell is the pass number, else the row index.
        let pass_number = if !values[0].is_empty() && values[0].chars().all(|c| c.is_ascii_digit())
        {
            values[0].parse().unwrap_or(index as u32)
        } else {
            index as u32
        };

        let mut parameters = BTreeMap::new();
        let mut profit = 0.0;
        let mut total_trades = 0;
        let mut profit_factor = None;
        let mut expected_payoff = None;
        let mut drawdown = None;

        for (header, value) in headers.iter().zip(values.iter()) {
            let key = header.to_ascii_lowercase();
            if key.contains("profit") && !key.contains("factor") {
                profit = normalize_number(value);
            } else if key.contains("trades") {
                if let Ok(v) = value.parse() {
                    total_trades = v;
                }
            } else if key.contains("profit factor") {
                if let Ok(v) = value.parse() {
                    profit_factor = Some(v);
                }
            } else if key.contains("payoff") {
                expected_payoff = Some(normalize_number(value));
            } else if key.contains("drawdown") {
                drawdown = Some(normalize_number(value));
            } else {
                parameters.insert(header.clone(), infer_scalar(value));
            }
        }

        records.push(OptimizationRecord {
            pass_number,
            parameters,
            profit,
            total_trades,
            profit_factor,
            expected_payoff,
            drawdown,
            drawdown_percent: None,
            sharpe_ratio: None,
            recovery_factor: None,
            win_rate: None,
        });
    }

    info!("Parsed {} optimization results from HTML", records.len());
    Ok(records)
}

fn cell_text(cell: ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::ParamValue;

    const XML_REPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<OptimizationReport>
    <Row Pass="1">
        <Parameter name="StopLoss">50</Parameter>
        <Parameter name="TakeProfit">100</Parameter>
        <Result>1250.50</Result>
        <Trades>45</Trades>
        <ProfitFactor>1.85</ProfitFactor>
        <ExpectedPayoff>27.79</ExpectedPayoff>
        <Drawdown>-250.00</Drawdown>
        <Sharpe>1.45</Sharpe>
    </Row>
    <Row Pass="2">
        <Parameter name="StopLoss">60</Parameter>
        <Parameter name="TakeProfit">120</Parameter>
        <Result>1450.75</Result>
        <Trades>52</Trades>
        <ProfitFactor>2.15</ProfitFactor>
        <ExpectedPayoff>27.90</ExpectedPayoff>
        <Drawdown>-180.00</Drawdown>
        <Sharpe>1.75</Sharpe>
    </Row>
</OptimizationReport>"#;

    #[test]
    fn xml_rows_become_records_in_document_order() {
        let records = parse_optimization_report(XML_REPORT, ReportFormat::Xml).unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].pass_number, 1);
        assert_eq!(records[0].profit, 1250.50);
        assert_eq!(records[0].total_trades, 45);
        assert_eq!(records[0].profit_factor, Some(1.85));
        assert_eq!(records[0].expected_payoff, Some(27.79));
        assert_eq!(records[0].drawdown, Some(-250.00));
        assert_eq!(records[0].sharpe_ratio, Some(1.45));
        assert_eq!(records[0].recovery_factor, None);
        assert_eq!(records[0].parameters["StopLoss"], ParamValue::Int(50));
        assert_eq!(records[0].parameters["TakeProfit"], ParamValue::Int(100));

        assert_eq!(records[1].pass_number, 2);
        assert_eq!(records[1].profit, 1450.75);
        assert_eq!(records[1].total_trades, 52);
        assert_eq!(records[1].profit_factor, Some(2.15));
    }

    #[test]
    fn xml_parameter_type_inference() {
        let xml = r#"<Report><Row Pass="3">
            <Parameter name="LotSize">0.1</Parameter>
            <Parameter name="Mode">aggressive</Parameter>
            <Result>10.0</Result>
            <Trades>12</Trades>
        </Row></Report>"#;
        let records = parse_optimization_report(xml, ReportFormat::Xml).unwrap();
        assert_eq!(records[0].parameters["LotSize"], ParamValue::Float(0.1));
        assert_eq!(
            records[0].parameters["Mode"],
            ParamValue::Text("aggressive".to_string())
        );
    }

    #[test]
    fn xml_missing_pass_defaults_to_zero() {
        let xml = "<Report><Row><Result>5.0</Result><Trades>1</Trades></Row></Report>";
        let records = parse_optimization_report(xml, ReportFormat::Xml).unwrap();
        assert_eq!(records[0].pass_number, 0);
        assert!(records[0].profit_factor.is_none());
    }

    #[test]
    fn malformed_xml_is_a_format_error() {
        let err = parse_optimization_report("<Report><Row>", ReportFormat::Xml).unwrap_err();
        assert!(matches!(err, AppError::Format(_)));
    }

    #[test]
    fn html_table_headers_classify_columns() {
        let html = r#"<html><body>
            <table class="optimization">
                <tr><th>Pass</th><th>StopLoss</th><th>TakeProfit</th><th>Profit</th><th>Trades</th><th>Profit Factor</th><th>Expected Payoff</th><th>Drawdown %</th></tr>
                <tr><td>1</td><td>50</td><td>100</td><td>$1,250.50</td><td>45</td><td>1.85</td><td>27.79</td><td>12.5%</td></tr>
                <tr><td>2</td><td>60</td><td>120</td><td>$1,450.75</td><td>52</td><td>2.15</td><td>27.90</td><td>9.8%</td></tr>
            </table>
        </body></html>"#;

        let records = parse_optimization_report(html, ReportFormat::Html).unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].pass_number, 1);
        assert_eq!(records[0].profit, 1250.50);
        assert_eq!(records[0].total_trades, 45);
        assert_eq!(records[0].profit_factor, Some(1.85));
        assert_eq!(records[0].expected_payoff, Some(27.79));
        assert_eq!(records[0].drawdown, Some(12.5));
        // "Pass" matches no metric keyword, so it lands in parameters too
        assert_eq!(records[0].parameters["Pass"], ParamValue::Int(1));
        assert_eq!(records[0].parameters["StopLoss"], ParamValue::Int(50));
        assert_eq!(records[0].parameters["TakeProfit"], ParamValue::Int(100));
    }

    #[test]
    fn html_prefers_optimization_class_table() {
        let html = r#"<html><body>
            <table><tr><th>Noise</th><th>More</th></tr><tr><td>a</td><td>b</td></tr></table>
            <table class="optimization">
                <tr><th>Pass</th><th>Profit</th><th>Trades</th></tr>
                <tr><td>7</td><td>99.0</td><td>20</td></tr>
            </table>
        </body></html>"#;
        let records = parse_optimization_report(html, ReportFormat::Html).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].pass_number, 7);
        assert_eq!(records[0].profit, 99.0);
    }

    #[test]
    fn html_row_index_fallback_and_short_row_skip() {
        let html = r#"<table>
            <tr><th>Name</th><th>Profit</th><th>Trades</th></tr>
            <tr><td>alpha</td><td>10.0</td><td>15</td></tr>
            <tr><td>lonely</td></tr>
            <tr><td>beta</td><td>20.0</td><td>25</td></tr>
        </table>"#;
        let records = parse_optimization_report(html, ReportFormat::Html).unwrap();
        assert_eq!(records.len(), 2);
        // non-digit first cells fall back to the 1-based row index
        assert_eq!(records[0].pass_number, 1);
        assert_eq!(records[1].pass_number, 3);
        assert_eq!(
            records[0].parameters["Name"],
            ParamValue::Text("alpha".to_string())
        );
    }

    #[test]
    fn html_without_table_is_a_format_error() {
        let err =
            parse_optimization_report("<html><body><p>empty</p></body></html>", ReportFormat::Html)
                .unwrap_err();
        assert!(matches!(err, AppError::Format(_)));
    }

    #[test]
    fn format_from_str_and_filename() {
        assert_eq!("xml".parse::<ReportFormat>().unwrap(), ReportFormat::Xml);
        assert_eq!("HTML".parse::<ReportFormat>().unwrap(), ReportFormat::Html);
        assert!("csv".parse::<ReportFormat>().is_err());

        assert_eq!(ReportFormat::from_filename("report.XML"), ReportFormat::Xml);
        assert_eq!(ReportFormat::from_filename("report.htm"), ReportFormat::Html);
        assert_eq!(ReportFormat::from_filename("report"), ReportFormat::Html);
    }
}
