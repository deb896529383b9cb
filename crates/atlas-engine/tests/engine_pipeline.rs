//! End-to-end pipeline runs over custom and builtin catalogs.

use std::collections::BTreeSet;

use atlas_engine::{
    Assessment, Control, ControlCatalog, ControlId, CostRange, Criticality, Domain, Engine,
    EngineConfig, MaturityLevel, PaybackPeriod, Roi,
};

fn level(n: u8) -> MaturityLevel {
    MaturityLevel::new(n, 5).unwrap()
}

fn assessment(id: &str, current: u8, target: u8) -> Assessment {
    Assessment::new(ControlId::new(id), level(current), level(target))
}

fn control(id: &str, deps: &[&str], cost_min: f64, cost_max: f64) -> Control {
    Control {
        id: ControlId::new(id),
        name: format!("control {id}"),
        domain: Domain::Technology,
        criticality: Criticality::High,
        baseline_likelihood: 0.4,
        impact_factor: 100_000.0,
        cost_range: CostRange {
            min: cost_min,
            max: cost_max,
        },
        effort_days: 20,
        regulatory_tags: BTreeSet::new(),
        dependencies: deps.iter().copied().map(ControlId::new).collect(),
    }
}

#[test]
fn worked_example_flows_through_whole_pipeline() {
    let catalog = ControlCatalog::from_controls([control("C-1", &[], 10_000.0, 10_000.0)]).unwrap();
    let engine = Engine::new(catalog, EngineConfig::default()).unwrap();
    let report = engine.run(&[assessment("C-1", 1, 5)]).unwrap();

    assert_eq!(report.rows.len(), 1);
    let row = &report.rows[0];
    assert!((row.risk.likelihood - 0.32).abs() < 1e-9);
    assert!((row.risk.ale_before - 32_000.0).abs() < 1e-6);
    assert_eq!(row.risk.ale_after, 0.0);
    assert!((row.risk.risk_reduction - 1.0).abs() < 1e-9);

    // cost 10k, reduction 32k: ROI 2.2, payback 3.75 months
    assert!((row.financial.annual_risk_reduction - 32_000.0).abs() < 1e-6);
    match row.financial.roi {
        Roi::Computed(v) => assert!((v - 2.2).abs() < 1e-9),
        Roi::CostPending => panic!("cost was positive"),
    }
    match row.financial.payback {
        PaybackPeriod::Months(m) => assert!((m - 3.75).abs() < 1e-9),
        PaybackPeriod::NotRecoverable => panic!("reduction was positive"),
    }

    let item = row.roadmap.as_ref().expect("planned improvement scheduled");
    assert_eq!(item.phase, 1);
    assert_eq!(report.financial_ranking, vec![ControlId::new("C-1")]);
    assert!(report.roadmap_error.is_none());
}

#[test]
fn zero_cost_controls_keep_their_rows_but_leave_the_ranking() {
    let catalog = ControlCatalog::from_controls([
        control("C-1", &[], 0.0, 0.0),
        control("C-2", &[], 0.0, 0.0),
        control("C-3", &[], 8_000.0, 12_000.0),
    ])
    .unwrap();
    let engine = Engine::new(catalog, EngineConfig::default()).unwrap();
    let report = engine
        .run(&[
            assessment("C-1", 1, 4),
            assessment("C-2", 2, 5),
            assessment("C-3", 1, 3),
        ])
        .unwrap();

    assert_eq!(report.rows.len(), 3);
    for id in ["C-1", "C-2"] {
        let row = report
            .rows
            .iter()
            .find(|r| r.risk.control.as_str() == id)
            .unwrap();
        assert_eq!(row.financial.roi, Roi::CostPending);
        assert_eq!(row.financial.roi.value(), None);
    }
    // Ranked prefix holds only the costed control; pending ones trail by id.
    let ranking: Vec<&str> = report.financial_ranking.iter().map(|c| c.as_str()).collect();
    assert_eq!(ranking, ["C-3", "C-1", "C-2"]);
}

#[test]
fn cyclic_dependencies_keep_partial_results() {
    let catalog = ControlCatalog::from_controls([
        control("C-1", &["C-2"], 5_000.0, 5_000.0),
        control("C-2", &["C-1"], 5_000.0, 5_000.0),
        control("C-3", &[], 5_000.0, 5_000.0),
    ])
    .unwrap();
    let engine = Engine::new(catalog, EngineConfig::default()).unwrap();
    let report = engine
        .run(&[
            assessment("C-1", 1, 4),
            assessment("C-2", 1, 4),
            assessment("C-3", 1, 4),
        ])
        .unwrap();

    let cycle = report.roadmap_error.as_ref().expect("cycle detected");
    let members: Vec<&str> = cycle.members.iter().map(|c| c.as_str()).collect();
    assert_eq!(members, ["C-1", "C-2"]);

    // Risk and financial records survive; no partial phase assignment leaks.
    assert_eq!(report.rows.len(), 3);
    assert!(report.rows.iter().all(|r| r.roadmap.is_none()));
    assert!(report.rows.iter().all(|r| r.risk.ale_before > 0.0));
    assert_eq!(report.summary.total_controls, 3);
}

#[test]
fn budget_cap_spreads_phases_without_dropping_items() {
    let catalog = ControlCatalog::from_controls([
        control("C-1", &[], 9_000.0, 9_000.0),
        control("C-2", &[], 9_000.0, 9_000.0),
        control("C-3", &[], 9_000.0, 9_000.0),
    ])
    .unwrap();
    let config = EngineConfig {
        per_phase_budget_cap: Some(10_000.0),
        ..EngineConfig::default()
    };
    let engine = Engine::new(catalog, config).unwrap();
    let report = engine
        .run(&[
            assessment("C-1", 1, 4),
            assessment("C-2", 1, 4),
            assessment("C-3", 1, 4),
        ])
        .unwrap();

    let mut phases: Vec<u32> = report
        .rows
        .iter()
        .map(|r| r.roadmap.as_ref().unwrap().phase)
        .collect();
    phases.sort_unstable();
    assert_eq!(phases, [1, 2, 3]);
}

#[test]
fn builtin_catalog_supports_a_realistic_engagement() {
    let catalog = ControlCatalog::builtin();
    let batch: Vec<Assessment> = catalog
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let current = (i % 3) as u8; // 0..=2
            assessment(c.id.as_str(), current, 4)
        })
        .collect();

    let engine = Engine::new(catalog, EngineConfig::default()).unwrap();
    let report = engine.run(&batch).unwrap();

    assert_eq!(report.rows.len(), batch.len());
    assert!(report.roadmap_error.is_none());
    assert_eq!(report.catalog_revision.len(), 64);

    for row in &report.rows {
        assert!(row.risk.ale_before >= row.risk.ale_after);
        assert!((0.0..=1.0).contains(&row.risk.risk_reduction));
        let item = row.roadmap.as_ref().expect("every control has a gap");
        assert!(item.phase >= 1);
    }

    // Dependency invariant holds across the whole roadmap.
    let phase_of = |id: &ControlId| {
        report
            .rows
            .iter()
            .find(|r| &r.risk.control == id)
            .and_then(|r| r.roadmap.as_ref())
            .map(|item| item.phase)
    };
    for row in &report.rows {
        if let Some(item) = &row.roadmap {
            for dep in &item.dependencies {
                let dep_phase = phase_of(dep).expect("scheduled dependency has a phase");
                assert!(item.phase > dep_phase, "{} not after {dep}", item.control);
            }
        }
    }

    assert!(report.summary.controls_with_gaps == report.summary.total_controls);
    assert!(report.summary.total_implementation_cost > 0.0);
    assert!(!report.summary.regulatory.is_empty());
}
