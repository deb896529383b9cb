#![forbid(unsafe_code)]

//! Risk quantification and remediation-roadmap engine for ISO 27001:2022
//! gap assessments.
//!
//! The engine is a pure, synchronous computation: the caller supplies an
//! immutable [`catalog::ControlCatalog`], a batch of per-control
//! [`assessment::Assessment`]s and an [`config::EngineConfig`], and receives
//! an [`engine::EngineReport`] containing one fully-joined row per control:
//! annualized loss expectancy before and after remediation, ROI and payback
//! figures, and a dependency-ordered implementation roadmap. Rendering,
//! export and argument parsing live with downstream consumers of the report.
//!
//! Every stage consumes immutable inputs and produces a new immutable
//! collection, and all orderings are deterministic, so two runs over the
//! same inputs produce identical rows.

pub mod assessment;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod financial;
pub mod risk;
pub mod roadmap;
pub mod summary;

pub use assessment::{Assessment, MaturityLevel};
pub use catalog::{Control, ControlCatalog, ControlId, CostRange, Criticality, Domain};
pub use config::EngineConfig;
pub use engine::{ControlRow, Engine, EngineReport};
pub use error::{CyclicDependencyError, EngineError, ValidationError};
pub use financial::{FinancialRecord, PaybackPeriod, Roi};
pub use risk::RiskRecord;
pub use roadmap::RoadmapItem;
pub use summary::ExecutiveSummary;
