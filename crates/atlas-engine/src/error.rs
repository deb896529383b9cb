//! Error taxonomy for the engine.
//!
//! Three failure classes with different blast radii:
//!
//! - [`ValidationError`]: malformed input; fails fast and aborts the whole
//!   batch, since every downstream stage assumes well-formed assessments.
//! - cost <= 0 during financial analysis: recovered locally by emitting
//!   [`crate::financial::Roi::CostPending`] on the affected record; never an
//!   error type at all.
//! - [`CyclicDependencyError`]: aborts roadmap construction only; risk and
//!   financial records already computed stay on the report.
//!
//! Every error names the offending control identifier(s).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::ControlId;

/// A malformed assessment batch. Aborts the run before any record is
/// produced.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ValidationError {
    /// An assessment references a control id absent from the catalog.
    #[error("assessment references unknown control `{control}`")]
    UnknownControl { control: ControlId },

    /// A maturity level falls outside the configured ordinal scale.
    #[error("maturity level {level} for control `{control}` outside range 0..={max}")]
    MaturityOutOfRange {
        control: ControlId,
        level: u8,
        max: u8,
    },

    /// Current and target maturity for one assessment use different scales.
    #[error("current and target maturity for control `{control}` use different scales")]
    ScaleMismatch { control: ControlId },

    /// Two assessments in one batch claim the same control.
    #[error("duplicate assessment for control `{control}`")]
    DuplicateAssessment { control: ControlId },
}

/// The remediation dependency graph contains at least one cycle.
///
/// `members` holds the control ids on cyclic paths, sorted ascending.
/// Roadmap construction aborts as a whole; no partial phase assignment is
/// ever observable.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("cyclic control dependencies among: {}", members_csv(.members))]
pub struct CyclicDependencyError {
    pub members: Vec<ControlId>,
}

fn members_csv(members: &[ControlId]) -> String {
    members
        .iter()
        .map(ControlId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Reference-data construction failure. Raised while building a
/// [`crate::catalog::ControlCatalog`], before any engine run.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum CatalogError {
    #[error("duplicate control id `{control}` in catalog")]
    DuplicateControl { control: ControlId },

    #[error("control `{control}` depends on `{dependency}` which is not in the catalog")]
    DanglingDependency {
        control: ControlId,
        dependency: ControlId,
    },

    #[error("control `{control}` has baseline likelihood {value} outside [0, 1]")]
    LikelihoodOutOfRange { control: ControlId, value: f64 },

    #[error("control `{control}` has negative impact factor {value}")]
    NegativeImpact { control: ControlId, value: f64 },

    #[error("control `{control}` has invalid cost range [{min}, {max}]")]
    InvalidCostRange {
        control: ControlId,
        min: f64,
        max: f64,
    },
}

/// Rejected engine configuration. Raised at [`crate::engine::Engine::new`].
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum ConfigError {
    #[error("asset value scale {0} must be finite and > 0")]
    InvalidAssetValueScale(f64),

    #[error("cost multiplier {0} must be finite and > 0")]
    InvalidCostMultiplier(f64),

    #[error("maturity decay exponent {0} must be finite and >= 1.0")]
    InvalidDecayExponent(f64),

    #[error("per-phase budget cap {0} must be finite and > 0")]
    InvalidBudgetCap(f64),

    #[error("maximum maturity level must be >= 1")]
    InvalidMaxMaturity,
}

/// Top-level engine failure. Only fail-fast classes appear here; recoverable
/// conditions surface as sentinels or as fields on the report.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
