//! Metric aggregation
//!
//! Reduces a campaign's recent daily snapshots to the figures the budget
//! rules look at. No smoothing: a single bad day moves the average.

use mkat_common::db::CampaignMetric;
use serde::Serialize;

/// Number of most recent daily snapshots considered per campaign
pub const METRIC_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricSummary {
    /// Snapshots actually aggregated (1..=7)
    pub days: usize,
    /// Mean of the daily conversion rates, in percent
    pub avg_conversion_rate: f64,
    pub total_spend: f64,
    pub total_conversions: i64,
}

/// Summarize snapshots; `None` when there are none
pub fn summarize(metrics: &[CampaignMetric]) -> Option<MetricSummary> {
    if metrics.is_empty() {
        return None;
    }

    let days = metrics.len();
    let rate_sum: f64 = metrics.iter().map(|m| m.conversion_rate).sum();

    Some(MetricSummary {
        days,
        avg_conversion_rate: rate_sum / days as f64,
        total_spend: metrics.iter().map(|m| m.spend).sum(),
        total_conversions: metrics.iter().map(|m| m.conversions).sum(),
    })
}
