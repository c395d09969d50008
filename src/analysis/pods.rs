//! Pod rollups and category standardization.
//!
//! A pod is a cluster of sites standardized together. Each pod gets
//! value totals, a risk mix, one standardization badge per category,
//! and an overall action.

use super::derive::payback_years;
use super::filter::natural_cmp;
use crate::models::{
    Badge, CategoryStandardization, DerivedRow, PodAction, PodSummary, RiskMix,
    StandardizationStatus, ANNUITY_FACTOR_3Y,
};
use std::collections::{BTreeMap, HashSet};

/// Coverage at or above which a category is considered standardized.
const GREEN_COVERAGE_PCT: f64 = 80.0;
const AMBER_COVERAGE_PCT: f64 = 50.0;
/// Mean adoption required to execute a fully covered category.
const EXECUTE_ADOPTION: f64 = 0.85;

/// Roll up every pod, ordered by pod id.
pub fn pod_rollups(rows: &[DerivedRow]) -> Vec<PodSummary> {
    let mut grouped: BTreeMap<&str, Vec<&DerivedRow>> = BTreeMap::new();
    for row in rows {
        grouped
            .entry(row.record.pod_id.as_str())
            .or_default()
            .push(row);
    }

    let mut pods: Vec<PodSummary> = grouped
        .into_iter()
        .map(|(pod_id, pod_rows)| pod_summary(pod_id, &pod_rows))
        .collect();
    pods.sort_by(|a, b| natural_cmp(&a.pod_id, &b.pod_id));
    pods
}

/// Roll up the rows of a single pod.
pub fn pod_summary(pod_id: &str, rows: &[&DerivedRow]) -> PodSummary {
    let n_sites = distinct(rows.iter().map(|r| r.record.site_id.as_str())).len();
    let total_ev_annual: f64 = rows.iter().map(|r| r.ev_risk_adj).sum();
    let total_npv_3y: f64 = rows.iter().map(|r| r.npv_3y).sum();
    let total_impl_cost: f64 = rows.iter().map(|r| r.impl_cost).sum();

    let pod_roi_pct = if total_impl_cost == 0.0 {
        0.0
    } else {
        (total_ev_annual * ANNUITY_FACTOR_3Y - total_impl_cost) / total_impl_cost * 100.0
    };

    let risk_mix = RiskMix::from_labels(rows.iter().map(|r| r.risk_label));

    PodSummary {
        pod_id: pod_id.to_string(),
        n_sites,
        n_switches: rows.len(),
        total_ev_annual,
        total_npv_3y,
        total_impl_cost,
        pod_roi_pct,
        pod_payback_years: payback_years(total_impl_cost, total_ev_annual),
        risk_mix,
        regions: distinct(rows.iter().map(|r| r.record.region.as_str())),
        ehr_systems: distinct(rows.iter().map(|r| r.record.ehr_system.as_str())),
        top_category: most_frequent(rows.iter().map(|r| r.record.category.as_str()))
            .unwrap_or_default(),
        categories: category_standardization(rows, n_sites),
        action: pod_action(pod_roi_pct, risk_mix.green),
    }
}

/// Standardization entry for each category present in `rows`.
///
/// `n_sites_in_pod` is the pod's full site count, so a filtered subset
/// of the pod still reports coverage against the whole pod.
pub fn category_standardization(
    rows: &[&DerivedRow],
    n_sites_in_pod: usize,
) -> Vec<CategoryStandardization> {
    let categories = distinct(rows.iter().map(|r| r.record.category.as_str()));

    categories
        .into_iter()
        .map(|category| {
            let cat_rows: Vec<&DerivedRow> = rows
                .iter()
                .copied()
                .filter(|r| r.record.category == category)
                .collect();

            let top_vendor = most_frequent(cat_rows.iter().map(|r| r.record.vendor_name.as_str()))
                .unwrap_or_else(|| "Unknown".to_string());

            let sites_on_top = distinct(
                cat_rows
                    .iter()
                    .filter(|r| r.record.vendor_name == top_vendor)
                    .map(|r| r.record.site_id.as_str()),
            )
            .len();

            let coverage_pct = if n_sites_in_pod > 0 {
                sites_on_top as f64 / n_sites_in_pod as f64 * 100.0
            } else {
                0.0
            };

            let avg_adoption =
                cat_rows.iter().map(|r| r.record.p_adoption).sum::<f64>() / cat_rows.len() as f64;
            let total_npv = cat_rows.iter().map(|r| r.npv_3y).sum();
            let (badge, status) = classify_coverage(coverage_pct, avg_adoption);

            CategoryStandardization {
                category,
                top_vendor,
                coverage_pct,
                avg_adoption,
                total_npv,
                badge,
                status,
            }
        })
        .collect()
}

/// Badge and status for a category; first matching tier wins.
pub fn classify_coverage(coverage_pct: f64, avg_adoption: f64) -> (Badge, StandardizationStatus) {
    if coverage_pct >= GREEN_COVERAGE_PCT {
        let status = if avg_adoption >= EXECUTE_ADOPTION {
            StandardizationStatus::Execute
        } else {
            StandardizationStatus::Review
        };
        (Badge::Green, status)
    } else if coverage_pct >= AMBER_COVERAGE_PCT {
        (Badge::Amber, StandardizationStatus::Review)
    } else {
        (Badge::Red, StandardizationStatus::Hold)
    }
}

/// Overall action for a pod; first matching rule wins.
pub fn pod_action(pod_roi_pct: f64, green_count: usize) -> PodAction {
    if pod_roi_pct > 500.0 && green_count >= 4 {
        PodAction::Greenlight
    } else if pod_roi_pct > 100.0 {
        PodAction::Approve
    } else if pod_roi_pct > 50.0 {
        PodAction::ReviewStaged
    } else if pod_roi_pct > 0.0 {
        PodAction::ReviewLater
    } else {
        PodAction::Hold
    }
}

/// Most frequent value. Ties go to the lexically smallest value.
pub fn most_frequent<'a, I>(values: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for (value, count) in counts {
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((value, count)),
        }
    }
    best.map(|(value, _)| value.to_string())
}

/// Distinct values in first-appearance order.
fn distinct<'a, I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for value in values {
        if seen.insert(value) {
            out.push(value.to_string());
        }
    }
    out
}
