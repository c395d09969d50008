//! Interactive session state.
//!
//! A session owns a handle to the table loaded once at startup, the
//! current assumptions, and the last successfully computed result.
//! Every assumption change triggers a full recompute from the immutable
//! table; a failed recompute leaves the previous result in place.

use crate::analysis::compute_aggregates;
use crate::data::{DataPaths, PlanTable};
use crate::error::EngineResult;
use crate::models::{AggregateResult, Assumptions};
use anyhow::Result;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

pub struct Session {
    table: Arc<PlanTable>,
    assumptions: Assumptions,
    current: Option<AggregateResult>,
}

impl Session {
    /// Load the table once and start a session on it.
    pub fn open(paths: &DataPaths) -> Result<Self> {
        let table = PlanTable::load(paths)?;
        Ok(Self::with_table(table))
    }

    /// Start a session on an already-loaded table.
    pub fn with_table(table: Arc<PlanTable>) -> Self {
        Self {
            table,
            assumptions: Assumptions::default(),
            current: None,
        }
    }

    pub fn table(&self) -> &Arc<PlanTable> {
        &self.table
    }

    /// Assumptions behind the current result.
    pub fn assumptions(&self) -> &Assumptions {
        &self.assumptions
    }

    /// Last successfully computed result, if any.
    pub fn current(&self) -> Option<&AggregateResult> {
        self.current.as_ref()
    }

    /// Validate and apply new assumptions, recomputing everything.
    ///
    /// On error the previous assumptions and result are kept.
    pub fn apply(&mut self, assumptions: Assumptions) -> EngineResult<&AggregateResult> {
        let started = Instant::now();

        let computed = assumptions
            .validate()
            .and_then(|_| compute_aggregates(&self.table.records, &assumptions));

        match computed {
            Ok(result) => {
                debug!(
                    "Recomputed {} rows in {:.1}ms",
                    result.rows.len(),
                    started.elapsed().as_secs_f64() * 1000.0
                );
                self.assumptions = assumptions;
                Ok(&*self.current.insert(result))
            }
            Err(e) => {
                warn!("Recompute failed, keeping previous result: {}", e);
                Err(e)
            }
        }
    }

    /// Restore the default assumptions.
    pub fn reset(&mut self) -> EngineResult<&AggregateResult> {
        self.apply(Assumptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::load_recommendations;
    use crate::error::EngineError;

    const PLAN_CSV: &str = include_str!("../fixtures/plan_table.csv");

    fn fixture_table() -> Arc<PlanTable> {
        let records = load_recommendations(PLAN_CSV.as_bytes()).unwrap();
        Arc::new(PlanTable::from_records("fixtures/plan_table.csv", records))
    }

    #[test]
    fn test_apply_and_reset() {
        let mut session = Session::with_table(fixture_table());
        assert!(session.current().is_none());

        let base_ev = session.reset().unwrap().portfolio.total_ev_annual;
        assert!((base_ev - 29254.95).abs() < 1e-6);

        let harsh = Assumptions {
            amber_penalty_pct: 50.0,
            ..Assumptions::default()
        };
        let harsh_ev = session.apply(harsh).unwrap().portfolio.total_ev_annual;
        assert!(harsh_ev < base_ev);
        assert_eq!(session.assumptions().amber_penalty_pct, 50.0);

        let reset_ev = session.reset().unwrap().portfolio.total_ev_annual;
        assert_eq!(reset_ev, base_ev);
    }

    #[test]
    fn test_invalid_assumptions_keep_previous_result() {
        let mut session = Session::with_table(fixture_table());
        let before = session.reset().unwrap().clone();

        let bad = Assumptions {
            cost_per_switch: 100.0,
            ..Assumptions::default()
        };
        let err = session.apply(bad).unwrap_err();
        assert!(matches!(err, EngineError::AssumptionOutOfRange { .. }));

        assert_eq!(session.current(), Some(&before));
        assert_eq!(session.assumptions(), &Assumptions::default());
    }

    #[test]
    fn test_contract_violation_keeps_previous_result() {
        let mut records = load_recommendations(PLAN_CSV.as_bytes()).unwrap();
        records[4].risk_label = "Blue".to_string();
        let mut session = Session::with_table(Arc::new(PlanTable::from_records("bad.csv", records)));

        assert!(session.reset().is_err());
        assert!(session.current().is_none());
        assert_eq!(session.table().records[4].risk_label, "Blue");
    }

    #[test]
    fn test_open_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("plan_table.csv"), PLAN_CSV).unwrap();

        let paths = DataPaths {
            search_dirs: vec![dir.path().to_path_buf()],
            ..DataPaths::default()
        };
        let mut session = Session::open(&paths).unwrap();
        assert_eq!(session.table().records.len(), 12);
        assert_eq!(session.reset().unwrap().pods.len(), 3);
    }
}
