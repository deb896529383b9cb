//! Engine configuration.
//!
//! All knobs recognized by the engine boundary: the organization-wide
//! asset-value scaling that turns impact factors into monetary impact, the
//! cost multiplier applied to catalog cost bands, the maturity decay
//! exponent `k` of the likelihood curve, and the optional per-phase budget
//! cap for the roadmap builder.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Multiplier applied to every control's impact factor to obtain the
    /// monetary impact for this organization.
    pub asset_value_scale: f64,

    /// Organization-specific multiplier applied to the catalog's cost-band
    /// midpoint to estimate implementation cost.
    pub cost_multiplier: f64,

    /// Exponent `k` of the likelihood decay curve
    /// `baseline * (1 - maturity/max)^k`. Must be >= 1.0; higher values
    /// credit early maturity gains more aggressively.
    pub maturity_decay_exponent: f64,

    /// Optional monetary cap per roadmap phase. Items that would overflow
    /// the cap are deferred to the next phase, never dropped.
    pub per_phase_budget_cap: Option<f64>,

    /// Top of the ordinal maturity scale (levels run `0..=max_maturity`).
    pub max_maturity: u8,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            asset_value_scale: 1.0,
            cost_multiplier: 1.0,
            maturity_decay_exponent: 1.0,
            per_phase_budget_cap: None,
            max_maturity: 5,
        }
    }
}

impl EngineConfig {
    /// Reject configurations the quantifier cannot give meaning to.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.asset_value_scale.is_finite() || self.asset_value_scale <= 0.0 {
            return Err(ConfigError::InvalidAssetValueScale(self.asset_value_scale));
        }
        if !self.cost_multiplier.is_finite() || self.cost_multiplier <= 0.0 {
            return Err(ConfigError::InvalidCostMultiplier(self.cost_multiplier));
        }
        if !self.maturity_decay_exponent.is_finite() || self.maturity_decay_exponent < 1.0 {
            return Err(ConfigError::InvalidDecayExponent(self.maturity_decay_exponent));
        }
        if let Some(cap) = self.per_phase_budget_cap {
            if !cap.is_finite() || cap <= 0.0 {
                return Err(ConfigError::InvalidBudgetCap(cap));
            }
        }
        if self.max_maturity == 0 {
            return Err(ConfigError::InvalidMaxMaturity);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_decay_exponent_below_one() {
        let config = EngineConfig {
            maturity_decay_exponent: 0.5,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDecayExponent(_))
        ));
    }

    #[test]
    fn rejects_non_positive_budget_cap() {
        let config = EngineConfig {
            per_phase_budget_cap: Some(0.0),
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBudgetCap(_))
        ));
    }

    #[test]
    fn rejects_zero_maturity_scale() {
        let config = EngineConfig {
            max_maturity: 0,
            ..EngineConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidMaxMaturity));
    }
}
