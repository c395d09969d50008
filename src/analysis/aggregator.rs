//! Portfolio and quarterly aggregation.
//!
//! This module rolls derived rows up into portfolio totals, per-quarter
//! totals and the cumulative cash-flow series, and exposes the single
//! `compute_aggregates` entry point the presentation layer calls on every
//! assumption change.

use super::derive::derive_rows;
use super::filter::natural_cmp;
use super::pods::pod_rollups;
use crate::error::EngineResult;
use crate::models::{
    AggregateResult, Assumptions, CashFlowPoint, ConfidenceLevel, DerivedRow, PortfolioRiskLevel,
    PortfolioSummary, QuarterSummary, Recommendation, RiskLabel, RiskMix, ANNUITY_FACTOR_3Y,
    EBITDA_MULTIPLE, JCURVE_PERIODS,
};
use std::collections::{BTreeMap, HashSet};

/// Payback beyond this many years is reported without a month count.
const PAYBACK_DISPLAY_LIMIT_YEARS: f64 = 10.0;

/// Recompute every derived view from the immutable record set.
pub fn compute_aggregates(
    records: &[Recommendation],
    assumptions: &Assumptions,
) -> EngineResult<AggregateResult> {
    let rows = derive_rows(records, assumptions)?;
    let portfolio = portfolio_summary(&rows, assumptions);
    let pods = pod_rollups(&rows);
    let quarters = quarterly_rollups(&rows, assumptions);
    let jcurve = cash_flow_curve(&quarters, &portfolio);

    Ok(AggregateResult {
        assumptions: *assumptions,
        rows,
        portfolio,
        pods,
        quarters,
        jcurve,
    })
}

/// Portfolio-level totals and KPIs.
pub fn portfolio_summary(rows: &[DerivedRow], assumptions: &Assumptions) -> PortfolioSummary {
    let total_switches = rows.len();
    let total_impl_cost = total_switches as f64 * assumptions.cost_per_switch;
    let total_ev_annual: f64 = rows.iter().map(|r| r.ev_risk_adj).sum();

    let portfolio_npv_3y = total_ev_annual * ANNUITY_FACTOR_3Y - total_impl_cost;
    let portfolio_roi_pct = if total_impl_cost > 0.0 {
        portfolio_npv_3y / total_impl_cost * 100.0
    } else {
        0.0
    };
    let portfolio_payback_years = if total_ev_annual > 0.0 {
        total_impl_cost / total_ev_annual
    } else {
        f64::INFINITY
    };
    let payback_months = if portfolio_payback_years < PAYBACK_DISPLAY_LIMIT_YEARS {
        Some((portfolio_payback_years * 12.0).floor() as u32)
    } else {
        None
    };

    let risk_mix = RiskMix::from_labels(rows.iter().map(|r| r.risk_label));
    let (low_risk_pct, mean_adoption) = if total_switches > 0 {
        (
            (risk_mix.green + risk_mix.amber) as f64 / total_switches as f64 * 100.0,
            rows.iter().map(|r| r.record.p_adoption).sum::<f64>() / total_switches as f64,
        )
    } else {
        (0.0, 0.0)
    };

    PortfolioSummary {
        total_switches,
        distinct_sites: count_distinct(rows.iter().map(|r| r.record.site_id.as_str())),
        distinct_vendors: count_distinct(rows.iter().map(|r| r.record.vendor_id.as_str())),
        total_impl_cost,
        total_ev_annual,
        portfolio_npv_3y,
        portfolio_roi_pct,
        portfolio_payback_years,
        payback_months,
        enterprise_value: total_ev_annual * EBITDA_MULTIPLE,
        gross_value_3y: total_ev_annual * ANNUITY_FACTOR_3Y,
        expected_price_savings: rows
            .iter()
            .map(|r| r.record.p_adoption * r.record.price_delta)
            .sum(),
        risk_mix,
        low_risk_pct,
        mean_adoption,
        confidence: ConfidenceLevel::from_mean_adoption(mean_adoption),
        risk_level: PortfolioRiskLevel::from_low_risk_pct(low_risk_pct),
    }
}

/// Per-quarter totals in natural quarter order, with running sums.
pub fn quarterly_rollups(rows: &[DerivedRow], assumptions: &Assumptions) -> Vec<QuarterSummary> {
    let mut grouped: BTreeMap<&str, Vec<&DerivedRow>> = BTreeMap::new();
    for row in rows {
        grouped
            .entry(row.record.quarter.as_str())
            .or_default()
            .push(row);
    }

    let mut quarters: Vec<QuarterSummary> = grouped
        .into_iter()
        .map(|(quarter, q_rows)| {
            let n_switches = q_rows.len();
            QuarterSummary {
                quarter: quarter.to_string(),
                ev_annual: q_rows.iter().map(|r| r.ev_risk_adj).sum(),
                npv_3y: q_rows.iter().map(|r| r.npv_3y).sum(),
                n_switches,
                impl_cost: n_switches as f64 * assumptions.cost_per_switch,
                risk_mix: RiskMix::from_labels(q_rows.iter().map(|r| r.risk_label)),
                cumulative_ev: 0.0,
                cumulative_impl: 0.0,
            }
        })
        .collect();
    quarters.sort_by(|a, b| natural_cmp(&a.quarter, &b.quarter));

    let mut cumulative_ev = 0.0;
    let mut cumulative_impl = 0.0;
    for q in &mut quarters {
        cumulative_ev += q.ev_annual;
        cumulative_impl += q.impl_cost;
        q.cumulative_ev = cumulative_ev;
        q.cumulative_impl = cumulative_impl;
    }

    quarters
}

/// Cumulative cash position over Start, Q1-Q4, Y2, Y3.
///
/// Q4 closes year one at the full run-rate; years two and three repeat
/// the year-one run-rate.
pub fn cash_flow_curve(quarters: &[QuarterSummary], portfolio: &PortfolioSummary) -> Vec<CashFlowPoint> {
    let ev_in = |label: &str| {
        quarters
            .iter()
            .find(|q| q.quarter == label)
            .map(|q| q.ev_annual)
            .unwrap_or(0.0)
    };

    let start = -portfolio.total_impl_cost;
    let q1 = start + ev_in("Q1");
    let q2 = q1 + ev_in("Q2");
    let q3 = q2 + ev_in("Q3");
    let q4 = start + portfolio.total_ev_annual;
    let y2 = start + 2.0 * portfolio.total_ev_annual;
    let y3 = start + 3.0 * portfolio.total_ev_annual;

    JCURVE_PERIODS
        .iter()
        .zip([start, q1, q2, q3, q4, y2, y3])
        .map(|(period, cumulative_cash)| CashFlowPoint {
            period: period.to_string(),
            cumulative_cash,
        })
        .collect()
}

/// First period at which the cumulative cash position is non-negative.
pub fn break_even_period(curve: &[CashFlowPoint]) -> Option<&str> {
    curve
        .iter()
        .find(|p| p.cumulative_cash >= 0.0)
        .map(|p| p.period.as_str())
}

/// Generate a text summary of the portfolio KPIs.
pub fn generate_summary_text(summary: &PortfolioSummary) -> String {
    let mut lines = Vec::new();

    lines.push(format!(
        "Standardize {} vendors across {} sites ({} switches)",
        summary.distinct_vendors, summary.distinct_sites, summary.total_switches
    ));
    lines.push(format!(
        "- Enterprise value: ${}",
        format_dollars(summary.enterprise_value)
    ));
    lines.push(format!(
        "- Run-rate EBITDA: ${}/yr",
        format_dollars(summary.total_ev_annual)
    ));
    lines.push(format!(
        "- 3-year NPV: ${} (ROI {:+.0}%)",
        format_dollars(summary.portfolio_npv_3y),
        summary.portfolio_roi_pct
    ));
    lines.push(match summary.payback_months {
        Some(months) => format!("- Payback: {} months", months),
        None => "- Payback: N/A".to_string(),
    });
    lines.push(format!(
        "- Risk: {} {} | {} {} | {} {}",
        RiskLabel::Green.emoji(),
        summary.risk_mix.green,
        RiskLabel::Amber.emoji(),
        summary.risk_mix.amber,
        RiskLabel::Red.emoji(),
        summary.risk_mix.red
    ));
    lines.push(format!(
        "- Confidence: {} ({:.0}% low risk)",
        summary.confidence, summary.low_risk_pct
    ));

    lines.join("\n")
}

/// Whole dollars with thousands separators; non-finite values print as-is.
pub fn format_dollars(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if rounded < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

fn count_distinct<'a, I>(values: I) -> usize
where
    I: IntoIterator<Item = &'a str>,
{
    values.into_iter().collect::<HashSet<_>>().len()
}
