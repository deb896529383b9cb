//! Program-level executive summary.
//!
//! Aggregates the per-control rows into the portfolio view: compliance
//! percentage, total remediation cost, program ROI and payback, and a
//! per-regulation rollup. Pure presentation data for downstream report
//! consumers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::Criticality;
use crate::engine::ControlRow;
use crate::financial::{PaybackPeriod, Roi};

/// Compliance posture for one regulatory regime, computed over the controls
/// tagged with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegulatoryRollup {
    pub regulation: String,
    pub controls_in_scope: u32,
    pub controls_with_gaps: u32,
    /// Sum of current maturity over sum of target maturity, as a percentage.
    pub compliance_score_pct: f64,
    /// Implementation cost still outstanding across gapped controls.
    pub outstanding_cost: f64,
}

/// Portfolio-level KPIs over one engine run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub total_controls: u32,
    pub controls_with_gaps: u32,
    /// Gapped controls whose catalog entry is rated critical.
    pub critical_gaps: u32,
    /// Sum of current maturity over sum of target maturity, as a percentage.
    pub compliance_pct: f64,
    pub mean_current_maturity: f64,
    /// Implementation cost summed over gapped controls only.
    pub total_implementation_cost: f64,
    pub total_annual_risk_reduction: f64,
    pub program_roi: Roi,
    pub program_payback: PaybackPeriod,
    pub total_effort_days: u32,
    pub regulatory: Vec<RegulatoryRollup>,
}

/// Fold the joined rows into the executive summary.
pub(crate) fn summarize(rows: &[ControlRow]) -> ExecutiveSummary {
    let total_controls = rows.len() as u32;
    let mut controls_with_gaps = 0u32;
    let mut critical_gaps = 0u32;
    let mut current_sum = 0u32;
    let mut target_sum = 0u32;
    let mut total_cost = 0.0f64;
    let mut total_reduction = 0.0f64;
    let mut total_effort = 0u32;

    for row in rows {
        let gapped = row.target_maturity > row.current_maturity;
        current_sum += u32::from(row.current_maturity);
        target_sum += u32::from(row.target_maturity);
        total_reduction += row.financial.annual_risk_reduction;
        if gapped {
            controls_with_gaps += 1;
            total_cost += row.financial.implementation_cost;
            total_effort += row.control.effort_days;
            if row.control.criticality == Criticality::Critical {
                critical_gaps += 1;
            }
        }
    }

    let compliance_pct = if target_sum > 0 {
        f64::from(current_sum) / f64::from(target_sum) * 100.0
    } else {
        100.0
    };
    let mean_current_maturity = if total_controls > 0 {
        f64::from(current_sum) / f64::from(total_controls)
    } else {
        0.0
    };

    let program_roi = if total_cost > 0.0 {
        Roi::Computed((total_reduction - total_cost) / total_cost)
    } else {
        Roi::CostPending
    };
    let program_payback = if total_reduction > 0.0 && total_cost > 0.0 {
        PaybackPeriod::Months(total_cost / (total_reduction / 12.0))
    } else {
        PaybackPeriod::NotRecoverable
    };

    ExecutiveSummary {
        total_controls,
        controls_with_gaps,
        critical_gaps,
        compliance_pct,
        mean_current_maturity,
        total_implementation_cost: total_cost,
        total_annual_risk_reduction: total_reduction,
        program_roi,
        program_payback,
        total_effort_days: total_effort,
        regulatory: regulatory_rollup(rows),
    }
}

fn regulatory_rollup(rows: &[ControlRow]) -> Vec<RegulatoryRollup> {
    struct Acc {
        in_scope: u32,
        with_gaps: u32,
        current_sum: u32,
        target_sum: u32,
        outstanding_cost: f64,
    }

    let mut by_regulation: BTreeMap<&str, Acc> = BTreeMap::new();
    for row in rows {
        let gapped = row.target_maturity > row.current_maturity;
        for tag in &row.control.regulatory_tags {
            let acc = by_regulation.entry(tag.as_str()).or_insert(Acc {
                in_scope: 0,
                with_gaps: 0,
                current_sum: 0,
                target_sum: 0,
                outstanding_cost: 0.0,
            });
            acc.in_scope += 1;
            acc.current_sum += u32::from(row.current_maturity);
            acc.target_sum += u32::from(row.target_maturity);
            if gapped {
                acc.with_gaps += 1;
                acc.outstanding_cost += row.financial.implementation_cost;
            }
        }
    }

    by_regulation
        .into_iter()
        .map(|(regulation, acc)| RegulatoryRollup {
            regulation: regulation.to_string(),
            controls_in_scope: acc.in_scope,
            controls_with_gaps: acc.with_gaps,
            compliance_score_pct: if acc.target_sum > 0 {
                f64::from(acc.current_sum) / f64::from(acc.target_sum) * 100.0
            } else {
                100.0
            },
            outstanding_cost: acc.outstanding_cost,
        })
        .collect()
}
