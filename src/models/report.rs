use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Scalar value of a single strategy input parameter.
///
/// Report cells and `.set` value segments are untyped text; the variant is
/// chosen by inference (decimal point present => float attempt, else integer
/// attempt, else raw text) or by an explicit `.set` type tag. Two parameter
/// maps compare equal only when every key carries the same variant and value,
/// which is what forward-test matching relies on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

pub type ParamMap = BTreeMap<String, ParamValue>;

/// One evaluated parameter combination from an optimization report.
///
/// Optional metrics stay `None` when the source report omits the column or
/// element; absence is not the same as zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationRecord {
    pub pass_number: u32,
    pub parameters: ParamMap,
    pub profit: f64,
    pub total_trades: u32,
    #[serde(default)]
    pub profit_factor: Option<f64>,
    #[serde(default)]
    pub expected_payoff: Option<f64>,
    #[serde(default)]
    pub drawdown: Option<f64>,
    #[serde(default)]
    pub drawdown_percent: Option<f64>,
    #[serde(default)]
    pub sharpe_ratio: Option<f64>,
    #[serde(default)]
    pub recovery_factor: Option<f64>,
    #[serde(default)]
    pub win_rate: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub ticket: String,
    pub time: String,
    #[serde(rename = "type")]
    pub trade_type: String,
    pub size: f64,
    pub symbol: String,
    pub price: f64,
    pub profit: f64,
}

/// Aggregate result of one backtest run plus its trade log.
///
/// All aggregates default to zero when the report text cannot be read as a
/// number. `recovery_factor` and `win_rate` are derived at extraction time;
/// `win_rate` is 0 when the run produced no trades.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub initial_deposit: f64,
    pub total_net_profit: f64,
    pub gross_profit: f64,
    pub gross_loss: f64,
    pub profit_factor: f64,
    pub expected_payoff: f64,
    pub absolute_drawdown: f64,
    pub maximal_drawdown: f64,
    pub relative_drawdown_percent: f64,
    pub total_trades: u32,
    pub short_positions: u32,
    pub long_positions: u32,
    pub profit_trades: u32,
    pub loss_trades: u32,
    pub sharpe_ratio: Option<f64>,
    pub recovery_factor: Option<f64>,
    pub win_rate: f64,
    pub trades: Vec<TradeRecord>,
}

/// Filter configuration for parameter selection. Any option left out of a
/// request keeps its default; supplied options override individually.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectionCriteria {
    pub min_profit: f64,
    pub min_profit_factor: f64,
    pub min_trades: u32,
    pub max_drawdown: Option<f64>,
    pub min_sharpe: Option<f64>,
    pub min_recovery: Option<f64>,
    pub top_n: usize,
}

impl Default for SelectionCriteria {
    fn default() -> Self {
        Self {
            min_profit: 0.0,
            min_profit_factor: 1.0,
            min_trades: 10,
            max_drawdown: None,
            min_sharpe: None,
            min_recovery: None,
            top_n: 10,
        }
    }
}
