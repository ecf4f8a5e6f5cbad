//! In-memory preset store. One store instance is shared through app data;
//! mutations take the write lock, reads hold the read lock for their whole
//! computation so a comparison always sees a consistent snapshot.

use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::preset::{
    BestMetric, ChartData, MetricsComparison, Preset, PresetComparison, PresetExport,
    PresetSummary,
};
use crate::models::report::{BacktestReport, ParamMap};

pub struct PresetStore {
    presets: RwLock<HashMap<String, Preset>>,
}

impl PresetStore {
    pub fn new() -> Self {
        Self {
            presets: RwLock::new(HashMap::new()),
        }
    }

    pub async fn add_preset(
        &self,
        name: String,
        parameters: ParamMap,
        optimization_metrics: serde_json::Map<String, Value>,
        id: Option<String>,
        notes: String,
    ) -> Preset {
        let id = id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let preset = Preset {
            id: id.clone(),
            name,
            parameters,
            optimization_metrics,
            backtest_report: None,
            created_at: Utc::now(),
            notes,
        };
        self.presets.write().await.insert(id, preset.clone());
        info!("Added preset {} ({})", preset.name, preset.id);
        preset
    }

    pub async fn attach_backtest(
        &self,
        preset_id: &str,
        report: BacktestReport,
    ) -> Result<Preset, AppError> {
        let mut presets = self.presets.write().await;
        let preset = presets
            .get_mut(preset_id)
            .ok_or_else(|| AppError::NotFound(format!("preset {preset_id}")))?;
        preset.backtest_report = Some(report);
        info!("Attached backtest report to preset {preset_id}");
        Ok(preset.clone())
    }

    pub async fn get_preset(&self, preset_id: &str) -> Option<Preset> {
        self.presets.read().await.get(preset_id).cloned()
    }

    pub async fn list_presets(&self) -> Vec<Preset> {
        let mut all: Vec<Preset> = self.presets.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        all
    }

    pub async fn delete_preset(&self, preset_id: &str) -> Result<(), AppError> {
        match self.presets.write().await.remove(preset_id) {
            Some(_) => {
                info!("Deleted preset {preset_id}");
                Ok(())
            }
            None => Err(AppError::NotFound(format!("preset {preset_id}"))),
        }
    }

    /// Compare several presets by id. Unknown ids are skipped with a
    /// warning; zero resolved presets is a not-found result, not an empty
    /// success. Chart arrays and best-of selections only consider presets
    /// that carry a backtest report.
    pub async fn compare_presets(
        &self,
        preset_ids: &[String],
    ) -> Result<PresetComparison, AppError> {
        let presets = self.presets.read().await;

        let mut resolved: Vec<&Preset> = Vec::new();
        for id in preset_ids {
            match presets.get(id) {
                Some(preset) => resolved.push(preset),
                None => warn!("Preset not found, skipped in comparison: {id}"),
            }
        }
        if resolved.is_empty() {
            return Err(AppError::NotFound("no valid presets to compare".to_string()));
        }

        let mut summaries = Vec::with_capacity(resolved.len());
        let mut chart_data = ChartData::default();

        for preset in &resolved {
            if let Some(report) = &preset.backtest_report {
                chart_data.labels.push(preset.name.clone());
                chart_data.profit.push(report.total_net_profit);
                chart_data.drawdown.push(report.maximal_drawdown);
                chart_data.profit_factor.push(report.profit_factor);
                chart_data
                    .sharpe_ratio
                    .push(report.sharpe_ratio.unwrap_or_default());
                chart_data
                    .recovery_factor
                    .push(report.recovery_factor.unwrap_or_default());
            }

            summaries.push(PresetSummary {
                id: preset.id.clone(),
                name: preset.name.clone(),
                parameters: preset.parameters.clone(),
                optimization_metrics: preset.optimization_metrics.clone(),
                backtest_metrics: preset.backtest_report.clone(),
            });
        }

        let metrics_comparison = best_metrics(&resolved);

        info!("Compared {} presets", resolved.len());
        Ok(PresetComparison {
            presets: summaries,
            metrics_comparison,
            chart_data,
        })
    }

    pub async fn export_presets(&self) -> Result<String> {
        let export = PresetExport {
            exported_at: Utc::now(),
            presets: self.list_presets().await,
        };
        serde_json::to_string_pretty(&export).context("failed to serialize preset export")
    }

    pub async fn import_presets(&self, json_data: &str) -> Result<usize> {
        let export: PresetExport =
            serde_json::from_str(json_data).context("failed to parse preset export")?;
        let count = export.presets.len();
        let mut presets = self.presets.write().await;
        for preset in export.presets {
            presets.insert(preset.id.clone(), preset);
        }
        info!("Imported {count} presets");
        Ok(count)
    }
}

/// Best-in-class selections, each computed independently over the presets
/// with a backtest report. Strict comparisons, so the first preset
/// encountered wins ties.
fn best_metrics(resolved: &[&Preset]) -> MetricsComparison {
    let mut comparison = MetricsComparison::default();

    for preset in resolved {
        let Some(report) = &preset.backtest_report else {
            continue;
        };
        update_best(
            &mut comparison.best_profit,
            preset,
            report.total_net_profit,
            |value, best| value > best,
        );
        if let Some(sharpe) = report.sharpe_ratio {
            update_best(&mut comparison.best_sharpe, preset, sharpe, |value, best| {
                value > best
            });
        }
        if let Some(recovery) = report.recovery_factor {
            update_best(
                &mut comparison.best_recovery,
                preset,
                recovery,
                |value, best| value > best,
            );
        }
        update_best(
            &mut comparison.lowest_drawdown,
            preset,
            report.maximal_drawdown,
            |value, best| value < best,
        );
        update_best(
            &mut comparison.best_profit_factor,
            preset,
            report.profit_factor,
            |value, best| value > best,
        );
    }

    comparison
}

fn update_best(
    slot: &mut Option<BestMetric>,
    preset: &Preset,
    value: f64,
    beats: fn(f64, f64) -> bool,
) {
    if slot.as_ref().map_or(true, |best| beats(value, best.value)) {
        *slot = Some(BestMetric {
            preset_id: preset.id.clone(),
            name: preset.name.clone(),
            value,
        });
    }
}
