//! Engine error types.
//!
//! Every data-contract violation the aggregation engine can hit has a
//! named variant. Loading and orchestration use `anyhow` on top of these.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("Unknown risk label '{label}' for site {site_id} / vendor {vendor_id} (expected Green, Amber or Red)")]
    UnknownRiskLabel {
        site_id: String,
        vendor_id: String,
        label: String,
    },

    #[error("Invalid integration quality {value} for site {site_id} / vendor {vendor_id} (expected 0, 1 or 2)")]
    InvalidIntegrationQuality {
        site_id: String,
        vendor_id: String,
        value: i64,
    },

    #[error("Adoption probability {value} for site {site_id} / vendor {vendor_id} is outside [0, 1]")]
    InvalidAdoptionProbability {
        site_id: String,
        vendor_id: String,
        value: f64,
    },

    #[error("Non-finite {field} for site {site_id} / vendor {vendor_id}")]
    NonFiniteValue {
        site_id: String,
        vendor_id: String,
        field: &'static str,
    },

    #[error("Assumption {name} = {value} is outside the allowed range [{min}, {max}]")]
    AssumptionOutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
