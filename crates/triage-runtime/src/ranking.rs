//! Batch-relative priority assignment.
//!
//! Priority depends on where an item's score sits among the *distinct*
//! scores of its batch: with `n` distinct scores sorted descending, the
//! `i`-th gets `ratio = i / max(1, n - 1)` and the band
//! `≤ 0.33 High`, `≤ 0.66 Medium`, else `Low`. Items sharing a score always
//! share a band.

use tracing::debug;
use triage_core::{ComplaintResult, Priority, ScoredComplaint};

/// Rank a scored batch: attach priorities and order by descending score.
/// Equal scores keep their submission order.
pub fn assign_priority(items: Vec<ScoredComplaint>) -> Vec<ComplaintResult> {
    let mut distinct: Vec<f64> = items.iter().map(|i| i.assessment.risk_score).collect();
    distinct.sort_by(|a, b| b.total_cmp(a));
    distinct.dedup_by(|a, b| a.total_cmp(b).is_eq());

    let denominator = distinct.len().saturating_sub(1).max(1) as f64;
    let band = |score: f64| {
        let rank = distinct
            .iter()
            .position(|s| s.total_cmp(&score).is_eq())
            .unwrap_or(0);
        Priority::from_ratio(rank as f64 / denominator)
    };

    let mut items = items;
    // Vec::sort_by is stable.
    items.sort_by(|a, b| b.assessment.risk_score.total_cmp(&a.assessment.risk_score));

    debug!(
        "Ranking {} item(s) over {} distinct score(s)",
        items.len(),
        distinct.len()
    );
    items
        .into_iter()
        .map(|item| {
            let priority = band(item.assessment.risk_score);
            item.into_result(priority)
        })
        .collect()
}
