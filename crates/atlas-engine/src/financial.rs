//! Financial analyzer: cost-benefit figures per control.
//!
//! ROI and payback are derived from the quantifier's ALE delta and the
//! estimated implementation cost. Undefined quantities are explicit
//! sentinels, never silently zero: a non-positive cost yields
//! [`Roi::CostPending`] (the batch keeps going), and a non-positive annual
//! reduction yields [`PaybackPeriod::NotRecoverable`].
//!
//! Presentation ranking is a deterministic total order so reports are
//! reproducible: descending ROI, then descending annual risk reduction,
//! then ascending control id. Cost-pending records cannot participate in
//! ROI ordering; they follow the ranked prefix, ascending by control id.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::{Control, ControlId};
use crate::config::EngineConfig;
use crate::risk::RiskRecord;

/// Return on investment for a remediation, or an explicit sentinel when the
/// cost estimate is not yet usable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Roi {
    /// `(annual risk reduction - cost) / cost`.
    Computed(f64),
    /// Cost estimate was <= 0; ROI is undefined until a cost is supplied.
    CostPending,
}

impl Roi {
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Computed(v) => Some(*v),
            Self::CostPending => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::CostPending)
    }
}

/// Time to recover the implementation cost from annual risk reduction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PaybackPeriod {
    Months(f64),
    /// Annual risk reduction is <= 0; the cost is never recovered.
    NotRecoverable,
}

/// Cost-benefit figures for one control. Derived from the control's
/// [`RiskRecord`] plus the cost estimate; replaced, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialRecord {
    pub control: ControlId,
    pub implementation_cost: f64,
    /// Monetary ALE decrease per year: `ale_before - ale_after`.
    pub annual_risk_reduction: f64,
    pub roi: Roi,
    pub payback: PaybackPeriod,
}

/// Estimated implementation cost: catalog cost-band midpoint scaled by the
/// organization-specific multiplier.
pub fn estimate_cost(control: &Control, config: &EngineConfig) -> f64 {
    control.cost_range.midpoint() * config.cost_multiplier
}

/// Produce the [`FinancialRecord`] for one control.
///
/// A cost <= 0 is recovered locally: the record carries the
/// [`Roi::CostPending`] sentinel instead of aborting the batch.
pub fn analyze(risk: &RiskRecord, implementation_cost: f64) -> FinancialRecord {
    let annual_risk_reduction = risk.ale_before - risk.ale_after;

    let roi = if implementation_cost > 0.0 {
        Roi::Computed((annual_risk_reduction - implementation_cost) / implementation_cost)
    } else {
        warn!(control = %risk.control, cost = implementation_cost, "cost-pending: ROI undefined");
        Roi::CostPending
    };

    let payback = if annual_risk_reduction > 0.0 && implementation_cost > 0.0 {
        PaybackPeriod::Months(implementation_cost / (annual_risk_reduction / 12.0))
    } else {
        PaybackPeriod::NotRecoverable
    };

    FinancialRecord {
        control: risk.control.clone(),
        implementation_cost,
        annual_risk_reduction,
        roi,
        payback,
    }
}

/// Presentation order over a batch of financial records.
///
/// Records with a computed ROI come first, descending ROI, ties broken by
/// descending annual risk reduction then ascending control id. Cost-pending
/// records trail in ascending id order: present, but outside the ROI
/// ranking.
pub fn rank(records: &[FinancialRecord]) -> Vec<ControlId> {
    let mut ranked: Vec<&FinancialRecord> = Vec::new();
    let mut pending: Vec<&FinancialRecord> = Vec::new();
    for record in records {
        match record.roi {
            Roi::Computed(_) => ranked.push(record),
            Roi::CostPending => pending.push(record),
        }
    }

    ranked.sort_by(|a, b| {
        let roi_a = a.roi.value().unwrap_or(f64::NEG_INFINITY);
        let roi_b = b.roi.value().unwrap_or(f64::NEG_INFINITY);
        roi_b
            .total_cmp(&roi_a)
            .then_with(|| b.annual_risk_reduction.total_cmp(&a.annual_risk_reduction))
            .then_with(|| a.control.cmp(&b.control))
    });
    pending.sort_by(|a, b| a.control.cmp(&b.control));

    ranked
        .into_iter()
        .chain(pending)
        .map(|r| r.control.clone())
        .collect()
}

/// Deterministic comparison helper shared with the roadmap's within-phase
/// ordering: higher risk reduction first, then lower cost, then id.
pub(crate) fn value_order(
    reduction_a: f64,
    cost_a: f64,
    id_a: &ControlId,
    reduction_b: f64,
    cost_b: f64,
    id_b: &ControlId,
) -> Ordering {
    reduction_b
        .total_cmp(&reduction_a)
        .then_with(|| cost_a.total_cmp(&cost_b))
        .then_with(|| id_a.cmp(id_b))
}
