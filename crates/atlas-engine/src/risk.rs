//! Risk quantifier: turns a control plus its assessment into monetary risk.
//!
//! Likelihood model: the baseline likelihood is scaled down as maturity
//! increases through `baseline * (1 - m/max)^k`, with `k` the configured
//! decay exponent (>= 1.0). The curve is monotonic decreasing in `m`, stays
//! inside `[0, baseline]`, and reaches zero exactly at full maturity.
//!
//! Impact model: monetary impact is `impact_factor * asset_value_scale` and
//! does not move with maturity; controls change the likelihood of loss
//! events, not the value at stake. ALE-before uses the current maturity's
//! likelihood, ALE-after the target's, both against the same impact.
//!
//! # Invariants
//!
//! - `ale_before >= ale_after` for every record.
//! - `risk_reduction` is clamped to `[0, 1]` and is exactly 0 when no
//!   improvement is planned or when `ale_before` is 0.

use serde::{Deserialize, Serialize};

use crate::assessment::{Assessment, MaturityLevel};
use crate::catalog::{Control, ControlId};
use crate::config::EngineConfig;

/// Quantified risk for one control. Derived data: recomputed whenever the
/// assessment changes, always replaced rather than mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRecord {
    pub control: ControlId,
    /// Annual loss-event likelihood at current maturity, in `[0, baseline]`.
    pub likelihood: f64,
    /// Monetary impact of one loss event.
    pub impact: f64,
    /// Annualized loss expectancy at current maturity.
    pub ale_before: f64,
    /// Annual loss-event likelihood at target maturity.
    pub residual_likelihood: f64,
    /// Annualized loss expectancy at target maturity.
    pub ale_after: f64,
    /// Fractional ALE decrease attributable to the planned improvement,
    /// in `[0, 1]`.
    pub risk_reduction: f64,
}

/// Likelihood at a given maturity level under the configured decay curve.
pub fn likelihood_at(baseline: f64, maturity: MaturityLevel, decay_exponent: f64) -> f64 {
    let remaining = 1.0 - maturity.fraction();
    baseline * remaining.powf(decay_exponent)
}

/// Produce the [`RiskRecord`] for one control.
///
/// When the assessment plans no improvement (target <= current), ALE-after
/// equals ALE-before and the reduction is exactly zero; a missing plan must
/// not surface as a negative reduction.
pub fn quantify(control: &Control, assessment: &Assessment, config: &EngineConfig) -> RiskRecord {
    let k = config.maturity_decay_exponent;
    let impact = control.impact_factor * config.asset_value_scale;

    let likelihood = likelihood_at(control.baseline_likelihood, assessment.current, k);
    let ale_before = likelihood * impact;

    let (residual_likelihood, ale_after) = if assessment.has_planned_improvement() {
        let residual = likelihood_at(control.baseline_likelihood, assessment.target, k);
        (residual, residual * impact)
    } else {
        (likelihood, ale_before)
    };

    let risk_reduction = if ale_before > 0.0 {
        ((ale_before - ale_after) / ale_before).clamp(0.0, 1.0)
    } else {
        0.0
    };

    RiskRecord {
        control: control.id.clone(),
        likelihood,
        impact,
        ale_before,
        residual_likelihood,
        ale_after,
        risk_reduction,
    }
}
