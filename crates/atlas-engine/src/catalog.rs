//! Static control reference data.
//!
//! A [`ControlCatalog`] is built once at process start and passed by
//! reference to every computation. There is no run-time mutation path:
//! the builder validates the whole set (unique ids, resolvable
//! dependencies, factor ranges) and the resulting catalog is read-only.
//!
//! [`ControlCatalog::builtin`] ships a representative subset of the ISO
//! 27001:2022 Annex A controls with realistic cost, effort and dependency
//! wiring, sufficient for assessments that do not bring their own catalog.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::CatalogError;

/// Identifier of an Annex A control, e.g. `A.5.1`.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ControlId(pub String);

impl ControlId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Annex A control grouping (the original catalog's category axis).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Organizational,
    People,
    Technology,
    Physical,
    Operational,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Organizational => "organizational",
            Self::People => "people",
            Self::Technology => "technology",
            Self::Physical => "physical",
            Self::Operational => "operational",
        };
        f.write_str(s)
    }
}

/// How severe the consequences of leaving this control unimplemented are.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Criticality {
    Low,
    Medium,
    High,
    Critical,
}

/// Typical remediation cost band for a control, in monetary units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostRange {
    pub min: f64,
    pub max: f64,
}

impl CostRange {
    /// Midpoint of the band; the financial analyzer's base cost estimate.
    #[must_use]
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

/// One entry of the control catalog. Immutable reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Control {
    pub id: ControlId,
    pub name: String,
    pub domain: Domain,
    pub criticality: Criticality,
    /// Annual probability of a loss event with the control fully absent,
    /// in `[0, 1]`.
    pub baseline_likelihood: f64,
    /// Monetary magnitude of a loss event, before the organization-wide
    /// asset-value scaling from the configuration is applied.
    pub impact_factor: f64,
    pub cost_range: CostRange,
    /// Implementation effort in person-days; carried onto roadmap items.
    pub effort_days: u32,
    /// Regulatory regimes this control contributes to (e.g. `GDPR`).
    pub regulatory_tags: BTreeSet<String>,
    /// Controls that must be remediated in an earlier roadmap phase.
    pub dependencies: BTreeSet<ControlId>,
}

/// Immutable, process-wide control lookup table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlCatalog {
    controls: BTreeMap<ControlId, Control>,
}

impl ControlCatalog {
    /// Validate and freeze a set of controls into a catalog.
    pub fn from_controls(
        controls: impl IntoIterator<Item = Control>,
    ) -> Result<Self, CatalogError> {
        let mut map: BTreeMap<ControlId, Control> = BTreeMap::new();
        for control in controls {
            if !(0.0..=1.0).contains(&control.baseline_likelihood) {
                return Err(CatalogError::LikelihoodOutOfRange {
                    control: control.id.clone(),
                    value: control.baseline_likelihood,
                });
            }
            if !control.impact_factor.is_finite() || control.impact_factor < 0.0 {
                return Err(CatalogError::NegativeImpact {
                    control: control.id.clone(),
                    value: control.impact_factor,
                });
            }
            let CostRange { min, max } = control.cost_range;
            if !min.is_finite() || !max.is_finite() || min < 0.0 || max < min {
                return Err(CatalogError::InvalidCostRange {
                    control: control.id.clone(),
                    min,
                    max,
                });
            }
            if map.insert(control.id.clone(), control.clone()).is_some() {
                return Err(CatalogError::DuplicateControl {
                    control: control.id,
                });
            }
        }
        for control in map.values() {
            for dep in &control.dependencies {
                if !map.contains_key(dep) {
                    return Err(CatalogError::DanglingDependency {
                        control: control.id.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }
        Ok(Self { controls: map })
    }

    pub fn get(&self, id: &ControlId) -> Option<&Control> {
        self.controls.get(id)
    }

    pub fn contains(&self, id: &ControlId) -> bool {
        self.controls.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    /// Controls in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Control> {
        self.controls.values()
    }

    /// SHA-256 over the canonical JSON encoding of the catalog. Reports
    /// carry this so consumers can tell which reference data produced them.
    #[must_use]
    pub fn revision(&self) -> String {
        let encoded = serde_json::to_vec(&self.controls)
            .expect("catalog serialization cannot fail: string keys only");
        let digest = Sha256::digest(&encoded);
        hex_encode(&digest)
    }

    /// Built-in ISO 27001:2022 Annex A subset.
    #[must_use]
    pub fn builtin() -> Self {
        let controls = BUILTIN_CONTROLS.iter().map(|c| Control {
            id: ControlId::new(c.id),
            name: c.name.to_string(),
            domain: c.domain,
            criticality: c.criticality,
            baseline_likelihood: c.baseline_likelihood,
            impact_factor: c.impact_factor,
            cost_range: CostRange {
                min: c.cost_min,
                max: c.cost_max,
            },
            effort_days: c.effort_days,
            regulatory_tags: c.regulatory.iter().map(|t| t.to_string()).collect(),
            dependencies: c.dependencies.iter().copied().map(ControlId::new).collect(),
        });
        Self::from_controls(controls).expect("builtin Annex A catalog is internally consistent")
    }
}

pub(crate) fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

// ---------------------------------------------------------------------------
// Builtin Annex A subset
// ---------------------------------------------------------------------------

struct BuiltinControl {
    id: &'static str,
    name: &'static str,
    domain: Domain,
    criticality: Criticality,
    baseline_likelihood: f64,
    impact_factor: f64,
    cost_min: f64,
    cost_max: f64,
    effort_days: u32,
    regulatory: &'static [&'static str],
    dependencies: &'static [&'static str],
}

const BUILTIN_CONTROLS: &[BuiltinControl] = &[
    BuiltinControl {
        id: "A.5.1",
        name: "Information security policies",
        domain: Domain::Organizational,
        criticality: Criticality::Critical,
        baseline_likelihood: 0.50,
        impact_factor: 250_000.0,
        cost_min: 10_000.0,
        cost_max: 20_000.0,
        effort_days: 30,
        regulatory: &["GDPR", "NIS2"],
        dependencies: &[],
    },
    BuiltinControl {
        id: "A.6.1",
        name: "Information security roles and responsibilities",
        domain: Domain::Organizational,
        criticality: Criticality::High,
        baseline_likelihood: 0.40,
        impact_factor: 120_000.0,
        cost_min: 6_000.0,
        cost_max: 10_000.0,
        effort_days: 20,
        regulatory: &["GDPR"],
        dependencies: &["A.5.1"],
    },
    BuiltinControl {
        id: "A.6.2",
        name: "Segregation of duties",
        domain: Domain::Organizational,
        criticality: Criticality::High,
        baseline_likelihood: 0.40,
        impact_factor: 180_000.0,
        cost_min: 9_000.0,
        cost_max: 15_000.0,
        effort_days: 25,
        regulatory: &["SOX"],
        dependencies: &["A.6.1"],
    },
    BuiltinControl {
        id: "A.6.8",
        name: "Information security event reporting",
        domain: Domain::Organizational,
        criticality: Criticality::Critical,
        baseline_likelihood: 0.50,
        impact_factor: 300_000.0,
        cost_min: 15_000.0,
        cost_max: 25_000.0,
        effort_days: 40,
        regulatory: &["GDPR", "NIS2"],
        dependencies: &["A.16.1"],
    },
    BuiltinControl {
        id: "A.7.4",
        name: "Information security awareness, education and training",
        domain: Domain::People,
        criticality: Criticality::High,
        baseline_likelihood: 0.45,
        impact_factor: 200_000.0,
        cost_min: 25_000.0,
        cost_max: 45_000.0,
        effort_days: 60,
        regulatory: &["GDPR", "NIS2"],
        dependencies: &["A.5.1"],
    },
    BuiltinControl {
        id: "A.7.5",
        name: "Termination or change of employment",
        domain: Domain::People,
        criticality: Criticality::High,
        baseline_likelihood: 0.35,
        impact_factor: 90_000.0,
        cost_min: 4_000.0,
        cost_max: 8_000.0,
        effort_days: 15,
        regulatory: &["GDPR"],
        dependencies: &["A.9.2"],
    },
    BuiltinControl {
        id: "A.8.1",
        name: "Inventory of information and other associated assets",
        domain: Domain::Technology,
        criticality: Criticality::Critical,
        baseline_likelihood: 0.55,
        impact_factor: 350_000.0,
        cost_min: 35_000.0,
        cost_max: 55_000.0,
        effort_days: 80,
        regulatory: &["GDPR"],
        dependencies: &[],
    },
    BuiltinControl {
        id: "A.8.2",
        name: "Information classification",
        domain: Domain::Technology,
        criticality: Criticality::High,
        baseline_likelihood: 0.40,
        impact_factor: 220_000.0,
        cost_min: 18_000.0,
        cost_max: 32_000.0,
        effort_days: 50,
        regulatory: &["GDPR"],
        dependencies: &["A.8.1"],
    },
    BuiltinControl {
        id: "A.8.3",
        name: "Information handling",
        domain: Domain::Technology,
        criticality: Criticality::High,
        baseline_likelihood: 0.35,
        impact_factor: 150_000.0,
        cost_min: 15_000.0,
        cost_max: 25_000.0,
        effort_days: 40,
        regulatory: &["GDPR"],
        dependencies: &["A.8.2"],
    },
    BuiltinControl {
        id: "A.9.1",
        name: "Access control policy",
        domain: Domain::Technology,
        criticality: Criticality::Critical,
        baseline_likelihood: 0.50,
        impact_factor: 320_000.0,
        cost_min: 14_000.0,
        cost_max: 22_000.0,
        effort_days: 35,
        regulatory: &["GDPR", "PCI-DSS"],
        dependencies: &["A.5.1"],
    },
    BuiltinControl {
        id: "A.9.2",
        name: "Access to networks and network services",
        domain: Domain::Technology,
        criticality: Criticality::Critical,
        baseline_likelihood: 0.50,
        impact_factor: 400_000.0,
        cost_min: 30_000.0,
        cost_max: 50_000.0,
        effort_days: 70,
        regulatory: &[],
        dependencies: &["A.9.1", "A.13.1"],
    },
    BuiltinControl {
        id: "A.9.3",
        name: "User access management",
        domain: Domain::Technology,
        criticality: Criticality::Critical,
        baseline_likelihood: 0.45,
        impact_factor: 380_000.0,
        cost_min: 22_000.0,
        cost_max: 38_000.0,
        effort_days: 50,
        regulatory: &["GDPR", "SOX", "PCI-DSS"],
        dependencies: &["A.9.1"],
    },
    BuiltinControl {
        id: "A.9.4",
        name: "System and application access control",
        domain: Domain::Technology,
        criticality: Criticality::Critical,
        baseline_likelihood: 0.45,
        impact_factor: 350_000.0,
        cost_min: 28_000.0,
        cost_max: 42_000.0,
        effort_days: 60,
        regulatory: &["PCI-DSS"],
        dependencies: &["A.9.3"],
    },
    BuiltinControl {
        id: "A.10.1",
        name: "Cryptographic controls",
        domain: Domain::Technology,
        criticality: Criticality::High,
        baseline_likelihood: 0.40,
        impact_factor: 300_000.0,
        cost_min: 40_000.0,
        cost_max: 60_000.0,
        effort_days: 90,
        regulatory: &["GDPR", "PCI-DSS"],
        dependencies: &["A.5.1"],
    },
    BuiltinControl {
        id: "A.11.1",
        name: "Physical security perimeters",
        domain: Domain::Physical,
        criticality: Criticality::High,
        baseline_likelihood: 0.30,
        impact_factor: 140_000.0,
        cost_min: 18_000.0,
        cost_max: 32_000.0,
        effort_days: 30,
        regulatory: &[],
        dependencies: &[],
    },
    BuiltinControl {
        id: "A.12.1",
        name: "Operational procedures and responsibilities",
        domain: Domain::Operational,
        criticality: Criticality::Medium,
        baseline_likelihood: 0.25,
        impact_factor: 80_000.0,
        cost_min: 8_000.0,
        cost_max: 16_000.0,
        effort_days: 25,
        regulatory: &[],
        dependencies: &[],
    },
    BuiltinControl {
        id: "A.12.2",
        name: "Change management",
        domain: Domain::Operational,
        criticality: Criticality::High,
        baseline_likelihood: 0.40,
        impact_factor: 200_000.0,
        cost_min: 28_000.0,
        cost_max: 42_000.0,
        effort_days: 65,
        regulatory: &["SOX"],
        dependencies: &["A.12.1"],
    },
    BuiltinControl {
        id: "A.12.3",
        name: "Information backup",
        domain: Domain::Operational,
        criticality: Criticality::Critical,
        baseline_likelihood: 0.50,
        impact_factor: 450_000.0,
        cost_min: 32_000.0,
        cost_max: 48_000.0,
        effort_days: 50,
        regulatory: &[],
        dependencies: &[],
    },
    BuiltinControl {
        id: "A.12.4",
        name: "Event logging",
        domain: Domain::Operational,
        criticality: Criticality::Critical,
        baseline_likelihood: 0.55,
        impact_factor: 500_000.0,
        cost_min: 45_000.0,
        cost_max: 75_000.0,
        effort_days: 100,
        regulatory: &["GDPR", "NIS2", "SOX", "PCI-DSS"],
        dependencies: &[],
    },
    BuiltinControl {
        id: "A.13.1",
        name: "Network controls",
        domain: Domain::Technology,
        criticality: Criticality::High,
        baseline_likelihood: 0.45,
        impact_factor: 280_000.0,
        cost_min: 36_000.0,
        cost_max: 54_000.0,
        effort_days: 75,
        regulatory: &["PCI-DSS"],
        dependencies: &[],
    },
    BuiltinControl {
        id: "A.16.1",
        name: "Management of information security incidents",
        domain: Domain::Operational,
        criticality: Criticality::Critical,
        baseline_likelihood: 0.50,
        impact_factor: 420_000.0,
        cost_min: 26_000.0,
        cost_max: 44_000.0,
        effort_days: 55,
        regulatory: &["GDPR", "NIS2"],
        dependencies: &["A.12.4"],
    },
    BuiltinControl {
        id: "A.17.1",
        name: "Planning information security continuity",
        domain: Domain::Operational,
        criticality: Criticality::High,
        baseline_likelihood: 0.35,
        impact_factor: 320_000.0,
        cost_min: 20_000.0,
        cost_max: 36_000.0,
        effort_days: 45,
        regulatory: &["NIS2"],
        dependencies: &["A.12.3"],
    },
    BuiltinControl {
        id: "A.18.1",
        name: "Compliance with legal and contractual requirements",
        domain: Domain::Organizational,
        criticality: Criticality::High,
        baseline_likelihood: 0.35,
        impact_factor: 260_000.0,
        cost_min: 12_000.0,
        cost_max: 20_000.0,
        effort_days: 30,
        regulatory: &["GDPR", "NIS2"],
        dependencies: &["A.5.1"],
    },
];
