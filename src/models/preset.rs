use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::report::{BacktestReport, ParamMap};

/// A named, reusable parameter set plus its known performance metrics.
/// Owned by the in-memory store; lives for the process lifetime only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preset {
    pub id: String,
    pub name: String,
    pub parameters: ParamMap,
    pub optimization_metrics: serde_json::Map<String, Value>,
    pub backtest_report: Option<BacktestReport>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatePresetRequest {
    pub name: String,
    pub parameters: ParamMap,
    #[serde(default)]
    pub optimization_metrics: serde_json::Map<String, Value>,
    pub id: Option<String>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Deserialize)]
pub struct ComparePresetsRequest {
    pub preset_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PresetComparison {
    pub presets: Vec<PresetSummary>,
    pub metrics_comparison: MetricsComparison,
    pub chart_data: ChartData,
}

#[derive(Debug, Serialize)]
pub struct PresetSummary {
    pub id: String,
    pub name: String,
    pub parameters: ParamMap,
    pub optimization_metrics: serde_json::Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backtest_metrics: Option<BacktestReport>,
}

/// Parallel arrays for the comparison chart, one slot per preset that
/// carries a backtest report, in request order.
#[derive(Debug, Default, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub profit: Vec<f64>,
    pub drawdown: Vec<f64>,
    pub profit_factor: Vec<f64>,
    pub sharpe_ratio: Vec<f64>,
    pub recovery_factor: Vec<f64>,
}

#[derive(Debug, Default, Serialize)]
pub struct MetricsComparison {
    pub best_profit: Option<BestMetric>,
    pub best_sharpe: Option<BestMetric>,
    pub best_recovery: Option<BestMetric>,
    pub lowest_drawdown: Option<BestMetric>,
    pub best_profit_factor: Option<BestMetric>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BestMetric {
    pub preset_id: String,
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PresetExport {
    pub exported_at: DateTime<Utc>,
    pub presets: Vec<Preset>,
}
