//! Row-level derivation.
//!
//! Turns one upstream recommendation plus the current assumptions into
//! its financial fields. Pure and deterministic: the same record and
//! assumptions always yield the same row.

use crate::error::{EngineError, EngineResult};
use crate::models::{
    Assumptions, DerivedRow, IntegrationLevel, Recommendation, RiskLabel, ANNUITY_FACTOR_3Y,
};

/// Derive the financial fields of a single recommendation.
pub fn derive_row(record: &Recommendation, assumptions: &Assumptions) -> EngineResult<DerivedRow> {
    let risk_label =
        RiskLabel::parse(&record.risk_label).ok_or_else(|| EngineError::UnknownRiskLabel {
            site_id: record.site_id.clone(),
            vendor_id: record.vendor_id.clone(),
            label: record.risk_label.clone(),
        })?;

    let integration = IntegrationLevel::from_ordinal(record.integration_quality).ok_or_else(|| {
        EngineError::InvalidIntegrationQuality {
            site_id: record.site_id.clone(),
            vendor_id: record.vendor_id.clone(),
            value: record.integration_quality,
        }
    })?;

    if !(0.0..=1.0).contains(&record.p_adoption) {
        return Err(EngineError::InvalidAdoptionProbability {
            site_id: record.site_id.clone(),
            vendor_id: record.vendor_id.clone(),
            value: record.p_adoption,
        });
    }

    for (field, value) in [
        ("price_delta", record.price_delta),
        ("days_ar_delta", record.days_ar_delta),
        ("fit_score", record.fit_score),
    ] {
        if !value.is_finite() {
            return Err(EngineError::NonFiniteValue {
                site_id: record.site_id.clone(),
                vendor_id: record.vendor_id.clone(),
                field,
            });
        }
    }

    let annual_cost_savings = record.price_delta;
    // Fewer days in A/R is a negative delta, so flip the sign.
    let annual_ar_value = -record.days_ar_delta * assumptions.ar_day_value;
    let gross_annual_value = annual_cost_savings + annual_ar_value;

    let risk_factor = assumptions.risk_factor(risk_label);
    let ev_risk_adj = record.p_adoption * gross_annual_value * risk_factor;

    let impl_cost = assumptions.cost_per_switch;
    let npv_3y = ev_risk_adj * ANNUITY_FACTOR_3Y - impl_cost;

    Ok(DerivedRow {
        record: record.clone(),
        risk_label,
        integration,
        annual_cost_savings,
        annual_ar_value,
        gross_annual_value,
        risk_factor,
        ev_risk_adj,
        impl_cost,
        npv_3y,
        payback_years: payback_years(impl_cost, ev_risk_adj),
    })
}

/// Derive every row of a table, failing on the first contract violation.
pub fn derive_rows(
    records: &[Recommendation],
    assumptions: &Assumptions,
) -> EngineResult<Vec<DerivedRow>> {
    records
        .iter()
        .map(|record| derive_row(record, assumptions))
        .collect()
}

/// Years to recover `cost` from `annual_value`; `+inf` when value is zero.
pub fn payback_years(cost: f64, annual_value: f64) -> f64 {
    if annual_value == 0.0 {
        f64::INFINITY
    } else {
        cost / annual_value
    }
}
