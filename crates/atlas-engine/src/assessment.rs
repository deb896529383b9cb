//! Per-control assessment state entered by an assessor.
//!
//! [`MaturityLevel`] is a validated value object: an ordinal score on a
//! configured scale, rejected at construction when out of range. An
//! [`Assessment`] pairs the observed (current) and planned (target) levels
//! for one control. Assessments are mutated only during data entry; once an
//! engine run starts they are treated as immutable.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{ControlCatalog, ControlId};
use crate::config::EngineConfig;
use crate::error::ValidationError;

/// An ordinal maturity level out of range for its scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("maturity level {level} outside allowed range 0..={max}")]
pub struct MaturityError {
    pub level: u8,
    pub max: u8,
}

/// Ordinal maturity score on a `0..=max` scale.
///
/// Only constructible through [`MaturityLevel::new`], which rejects
/// out-of-range values, so a held `MaturityLevel` is always well-formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMaturityLevel")]
pub struct MaturityLevel {
    level: u8,
    max: u8,
}

/// Deserialization goes through [`MaturityLevel::new`] so stored or wire
/// data cannot smuggle in an out-of-range level.
#[derive(Deserialize)]
struct RawMaturityLevel {
    level: u8,
    max: u8,
}

impl TryFrom<RawMaturityLevel> for MaturityLevel {
    type Error = MaturityError;

    fn try_from(raw: RawMaturityLevel) -> Result<Self, MaturityError> {
        Self::new(raw.level, raw.max)
    }
}

impl MaturityLevel {
    pub fn new(level: u8, max: u8) -> Result<Self, MaturityError> {
        if max == 0 || level > max {
            return Err(MaturityError { level, max });
        }
        Ok(Self { level, max })
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn max(&self) -> u8 {
        self.max
    }

    /// Fraction of the scale achieved, in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        f64::from(self.level) / f64::from(self.max)
    }

    pub fn is_max(&self) -> bool {
        self.level == self.max
    }
}

/// Assessor-entered state for one control in one engagement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub control: ControlId,
    pub current: MaturityLevel,
    pub target: MaturityLevel,
    pub notes: Option<String>,
    pub assessed_at: DateTime<Utc>,
}

impl Assessment {
    pub fn new(
        control: ControlId,
        current: MaturityLevel,
        target: MaturityLevel,
    ) -> Self {
        Self {
            control,
            current,
            target,
            notes: None,
            assessed_at: Utc::now(),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Planned maturity improvement; zero when target <= current.
    pub fn planned_gap(&self) -> u8 {
        self.target.level().saturating_sub(self.current.level())
    }

    pub fn has_planned_improvement(&self) -> bool {
        self.planned_gap() > 0
    }
}

/// Validate a full batch against the catalog and configured scale.
///
/// Fails fast on the first malformed assessment: unknown control id,
/// maturity outside the configured scale, mismatched current/target scales,
/// or two assessments for the same control. Downstream stages assume a
/// batch that passed here.
pub fn validate_batch(
    catalog: &ControlCatalog,
    assessments: &[Assessment],
    config: &EngineConfig,
) -> Result<(), ValidationError> {
    let mut seen: BTreeSet<&ControlId> = BTreeSet::new();
    for assessment in assessments {
        let control = &assessment.control;
        if !catalog.contains(control) {
            return Err(ValidationError::UnknownControl {
                control: control.clone(),
            });
        }
        if !seen.insert(control) {
            return Err(ValidationError::DuplicateAssessment {
                control: control.clone(),
            });
        }
        if assessment.current.max() != assessment.target.max() {
            return Err(ValidationError::ScaleMismatch {
                control: control.clone(),
            });
        }
        for level in [assessment.current, assessment.target] {
            if level.max() != config.max_maturity || level.level() > config.max_maturity {
                return Err(ValidationError::MaturityOutOfRange {
                    control: control.clone(),
                    level: level.level(),
                    max: config.max_maturity,
                });
            }
        }
    }
    Ok(())
}
