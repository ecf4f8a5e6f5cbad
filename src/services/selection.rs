//! Filters and ranks optimization records against configurable thresholds,
//! with optional cross-validation against a forward-test record set.

use std::cmp::Ordering;

use tracing::info;

use crate::models::report::{OptimizationRecord, SelectionCriteria};

/// Filter by criteria, rank by profit descending (stable, so ties keep
/// input order), truncate to top-N, then optionally keep only records whose
/// exact parameter set was also profitable in the forward test.
pub fn find_best_parameters(
    records: &[OptimizationRecord],
    criteria: &SelectionCriteria,
    forward_records: Option<&[OptimizationRecord]>,
) -> Vec<OptimizationRecord> {
    if records.is_empty() {
        return Vec::new();
    }

    let mut filtered: Vec<OptimizationRecord> = records
        .iter()
        .filter(|r| passes(r, criteria))
        .cloned()
        .collect();

    filtered.sort_by(|a, b| b.profit.partial_cmp(&a.profit).unwrap_or(Ordering::Equal));
    filtered.truncate(criteria.top_n);

    let Some(forward) = forward_records else {
        info!("Found {} best parameter sets", filtered.len());
        return filtered;
    };

    let validated: Vec<OptimizationRecord> = filtered
        .into_iter()
        .filter(|record| {
            forward
                .iter()
                .find(|f| f.parameters == record.parameters)
                .is_some_and(|f| f.profit > 0.0)
        })
        .collect();

    info!("Found {} forward-validated parameter sets", validated.len());
    validated
}

/// A record is excluded as soon as one threshold fails. Absent optional
/// metrics never exclude on their criterion.
fn passes(record: &OptimizationRecord, criteria: &SelectionCriteria) -> bool {
    if record.profit < criteria.min_profit {
        return false;
    }
    if record
        .profit_factor
        .is_some_and(|pf| pf < criteria.min_profit_factor)
    {
        return false;
    }
    if record.total_trades < criteria.min_trades {
        return false;
    }
    if let (Some(dd), Some(max_dd)) = (record.drawdown_percent, criteria.max_drawdown) {
        if dd > max_dd {
            return false;
        }
    }
    if let (Some(sharpe), Some(min_sharpe)) = (record.sharpe_ratio, criteria.min_sharpe) {
        if sharpe < min_sharpe {
            return false;
        }
    }
    if let (Some(recovery), Some(min_recovery)) = (record.recovery_factor, criteria.min_recovery) {
        if recovery < min_recovery {
            return false;
        }
    }
    true
}
