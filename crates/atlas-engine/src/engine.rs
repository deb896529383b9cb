//! Pipeline orchestration.
//!
//! One-way data flow: catalog + assessments are validated, each control is
//! quantified and costed, then the complete set feeds the roadmap builder.
//! Every stage consumes immutable inputs and produces a new collection; the
//! whole run is a single blocking call.
//!
//! A cyclic dependency graph aborts roadmap construction only: the report
//! still carries every risk and financial record, with the cycle surfaced
//! on [`EngineReport::roadmap_error`] rather than discarded.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::assessment::{self, Assessment};
use crate::catalog::{hex_encode, Control, ControlCatalog, ControlId};
use crate::config::EngineConfig;
use crate::error::{CyclicDependencyError, EngineError};
use crate::financial::{self, FinancialRecord};
use crate::risk::{self, RiskRecord};
use crate::roadmap::{self, RoadmapInput, RoadmapItem};
use crate::summary::{self, ExecutiveSummary};

/// Fully-joined result row for one control: the single artifact that
/// charting and export collaborators render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlRow {
    pub control: Control,
    pub current_maturity: u8,
    pub target_maturity: u8,
    pub risk: RiskRecord,
    pub financial: FinancialRecord,
    /// `None` when the control has no planned improvement, or when roadmap
    /// construction failed for the batch.
    pub roadmap: Option<RoadmapItem>,
}

/// Output of one engine run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// Revision hash of the catalog the run was computed against.
    pub catalog_revision: String,
    /// SHA-256 over the canonical JSON of (assessments, config). Two runs
    /// with the same fingerprint produce identical rows.
    pub input_fingerprint: String,
    /// One row per assessed control, ascending control id.
    pub rows: Vec<ControlRow>,
    /// Presentation order for cost-benefit reporting (see
    /// [`crate::financial::rank`]).
    pub financial_ranking: Vec<ControlId>,
    pub summary: ExecutiveSummary,
    /// Set when the dependency graph was cyclic; rows are still complete
    /// but carry no roadmap assignments.
    pub roadmap_error: Option<CyclicDependencyError>,
}

/// The risk quantification engine: an immutable catalog plus a validated
/// configuration.
#[derive(Debug, Clone)]
pub struct Engine {
    catalog: ControlCatalog,
    config: EngineConfig,
}

impl Engine {
    /// Validates the configuration up front; a constructed engine can only
    /// fail on malformed assessment batches.
    pub fn new(catalog: ControlCatalog, config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self { catalog, config })
    }

    pub fn catalog(&self) -> &ControlCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the full pipeline over one assessment batch.
    ///
    /// Fails fast on validation errors; recoverable conditions (pending
    /// costs, cyclic roadmap) surface inside the report.
    pub fn run(&self, assessments: &[Assessment]) -> Result<EngineReport, EngineError> {
        assessment::validate_batch(&self.catalog, assessments, &self.config)?;

        // Deterministic processing order regardless of caller ordering.
        let mut batch: Vec<&Assessment> = assessments.iter().collect();
        batch.sort_by(|a, b| a.control.cmp(&b.control));

        debug!(controls = batch.len(), "assessment batch validated");

        let mut quantified: Vec<(&Assessment, &Control, RiskRecord, FinancialRecord)> =
            Vec::with_capacity(batch.len());
        for &a in &batch {
            let control = self
                .catalog
                .get(&a.control)
                .expect("validated batch references catalog controls only");
            let risk_record = risk::quantify(control, a, &self.config);
            let cost = financial::estimate_cost(control, &self.config);
            let financial_record = financial::analyze(&risk_record, cost);
            quantified.push((a, control, risk_record, financial_record));
        }

        let roadmap_inputs: Vec<RoadmapInput> = quantified
            .iter()
            .filter(|(a, ..)| a.has_planned_improvement())
            .map(|(_, control, risk_record, financial_record)| RoadmapInput {
                control: control.id.clone(),
                dependencies: control.dependencies.clone(),
                effort_days: control.effort_days,
                risk_reduction: risk_record.risk_reduction,
                cost: financial_record.implementation_cost,
            })
            .collect();

        let (mut scheduled, roadmap_error) =
            match roadmap::build(&roadmap_inputs, self.config.per_phase_budget_cap) {
                Ok(items) => {
                    let by_id: BTreeMap<ControlId, RoadmapItem> = items
                        .into_iter()
                        .map(|item| (item.control.clone(), item))
                        .collect();
                    (by_id, None)
                }
                Err(cycle) => {
                    warn!(%cycle, "roadmap aborted; returning risk/financial records only");
                    (BTreeMap::new(), Some(cycle))
                }
            };

        let rows: Vec<ControlRow> = quantified
            .into_iter()
            .map(|(a, control, risk_record, financial_record)| ControlRow {
                control: control.clone(),
                current_maturity: a.current.level(),
                target_maturity: a.target.level(),
                roadmap: scheduled.remove(&control.id),
                risk: risk_record,
                financial: financial_record,
            })
            .collect();

        let financial_ranking = financial::rank(
            &rows.iter().map(|r| r.financial.clone()).collect::<Vec<_>>(),
        );
        let report_summary = summary::summarize(&rows);

        Ok(EngineReport {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            catalog_revision: self.catalog.revision(),
            input_fingerprint: fingerprint(&batch, &self.config),
            rows,
            financial_ranking,
            summary: report_summary,
            roadmap_error,
        })
    }
}

/// SHA-256 over the canonical JSON of the sorted batch and configuration.
///
/// Keys row-identity: only the fields that feed computation are encoded.
/// Timestamps and free-text notes are excluded, so two batches that produce
/// identical rows share a fingerprint.
fn fingerprint(batch: &[&Assessment], config: &EngineConfig) -> String {
    #[derive(Serialize)]
    struct Entry<'a> {
        control: &'a ControlId,
        current: u8,
        target: u8,
        scale: u8,
    }
    #[derive(Serialize)]
    struct Input<'a> {
        assessments: Vec<Entry<'a>>,
        config: &'a EngineConfig,
    }
    let assessments = batch
        .iter()
        .map(|a| Entry {
            control: &a.control,
            current: a.current.level(),
            target: a.target.level(),
            scale: a.current.max(),
        })
        .collect();
    let encoded = serde_json::to_vec(&Input {
        assessments,
        config,
    })
    .expect("engine input serialization cannot fail: string keys only");
    hex_encode(&Sha256::digest(&encoded))
}
