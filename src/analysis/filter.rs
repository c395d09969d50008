//! Filtering and sorting of derived rows.
//!
//! These operate on an already-derived row set and never touch the
//! derived fields themselves.

use crate::models::{DerivedRow, RiskLabel};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Ordering applied to the recommendation list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    /// Pod ascending, then NPV descending within each pod
    #[default]
    PodPriority,
    /// Fit score, high to low
    FitScore,
    /// 3-year NPV, high to low
    Npv,
    /// Green, then Amber, then Red
    Risk,
}

/// Row selection criteria. `None` means "no restriction"; an empty list
/// in a multi-select matches nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowFilter {
    pub pod: Option<String>,
    pub risk_labels: Option<Vec<RiskLabel>>,
    pub categories: Option<Vec<String>>,
    pub region: Option<String>,
    pub quarter: Option<String>,
}

impl RowFilter {
    /// Check whether a row passes every criterion.
    pub fn matches(&self, row: &DerivedRow) -> bool {
        if let Some(ref pod) = self.pod {
            if &row.record.pod_id != pod {
                return false;
            }
        }

        if let Some(ref labels) = self.risk_labels {
            if !labels.contains(&row.risk_label) {
                return false;
            }
        }

        if let Some(ref categories) = self.categories {
            if !categories.iter().any(|c| c == &row.record.category) {
                return false;
            }
        }

        if let Some(ref region) = self.region {
            if &row.record.region != region {
                return false;
            }
        }

        if let Some(ref quarter) = self.quarter {
            if &row.record.quarter != quarter {
                return false;
            }
        }

        true
    }
}

/// Select the rows matching a filter, keeping input order.
pub fn filter_rows<'a>(rows: &'a [DerivedRow], filter: &RowFilter) -> Vec<&'a DerivedRow> {
    rows.iter().filter(|row| filter.matches(row)).collect()
}

/// Stable sort of a row selection.
pub fn sort_rows(rows: &mut [&DerivedRow], order: SortOrder) {
    match order {
        SortOrder::PodPriority => rows.sort_by(|a, b| {
            natural_cmp(&a.record.pod_id, &b.record.pod_id).then_with(|| b.npv_3y.total_cmp(&a.npv_3y))
        }),
        SortOrder::FitScore => rows.sort_by(|a, b| b.record.fit_score.total_cmp(&a.record.fit_score)),
        SortOrder::Npv => rows.sort_by(|a, b| b.npv_3y.total_cmp(&a.npv_3y)),
        SortOrder::Risk => rows.sort_by_key(|row| row.risk_label),
    }
}

/// Pod with the largest NPV sum within a selection.
///
/// Ties go to the pod that sorts first.
pub fn highest_value_pod(rows: &[&DerivedRow]) -> Option<String> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for row in rows {
        *totals.entry(row.record.pod_id.as_str()).or_default() += row.npv_3y;
    }

    let mut pods: Vec<(&str, f64)> = totals.into_iter().collect();
    pods.sort_by(|a, b| natural_cmp(a.0, b.0));

    let mut best: Option<(&str, f64)> = None;
    for (pod, total) in pods {
        match best {
            Some((_, best_total)) if total <= best_total => {}
            _ => best = Some((pod, total)),
        }
    }
    best.map(|(pod, _)| pod.to_string())
}

/// Distinct values of a row field in natural order.
pub fn distinct_sorted<F>(rows: &[DerivedRow], field: F) -> Vec<String>
where
    F: Fn(&DerivedRow) -> &str,
{
    let mut values: Vec<String> = Vec::new();
    for row in rows {
        let value = field(row);
        if !values.iter().any(|v| v == value) {
            values.push(value.to_string());
        }
    }
    values.sort_by(|a, b| natural_cmp(a, b));
    values
}

/// Compare keys so that embedded numbers order numerically
/// ("Pod 2" < "Pod 10", "Q1" < "Q4").
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = chunks(a).into_iter();
    let mut right = chunks(b).into_iter();

    loop {
        match (left.next(), right.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ord = match (is_number(l), is_number(r)) {
                    (true, true) => {
                        let l = l.trim_start_matches('0');
                        let r = r.trim_start_matches('0');
                        l.len().cmp(&r.len()).then_with(|| l.cmp(r))
                    }
                    _ => l.cmp(r),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

fn is_number(chunk: &str) -> bool {
    chunk.bytes().all(|b| b.is_ascii_digit())
}

/// Split into alternating runs of ASCII digits and everything else.
fn chunks(s: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut prev_digit: Option<bool> = None;

    for (i, c) in s.char_indices() {
        let digit = c.is_ascii_digit();
        if let Some(prev) = prev_digit {
            if prev != digit {
                out.push(&s[start..i]);
                start = i;
            }
        }
        prev_digit = Some(digit);
    }
    if start < s.len() {
        out.push(&s[start..]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::derive::derive_rows;
    use crate::models::{Assumptions, Recommendation};

    fn record(pod: &str, category: &str, risk: &str, fit: f64, price_delta: f64) -> Recommendation {
        Recommendation {
            site_id: format!("S-{}-{}", pod, fit),
            vendor_id: "V1".to_string(),
            pod_id: pod.to_string(),
            site_name: "Site".to_string(),
            vendor_name: "Vendor".to_string(),
            region: "West".to_string(),
            category: category.to_string(),
            ehr_system: "Dentrix".to_string(),
            quarter: "Q1".to_string(),
            p_adoption: 0.8,
            risk_label: risk.to_string(),
            fit_score: fit,
            fit_label: "Good Fit".to_string(),
            integration_quality: 1,
            price_delta,
            days_ar_delta: 0.0,
        }
    }

    fn rows() -> Vec<DerivedRow> {
        let records = vec![
            record("10", "Lab", "Red", 50.0, 4000.0),
            record("2", "RCM", "Green", 90.0, 1000.0),
            record("2", "Lab", "Amber", 70.0, 6000.0),
            record("1", "Telephony", "Green", 60.0, 3000.0),
        ];
        derive_rows(&records, &Assumptions::default()).unwrap()
    }

    #[test]
    fn test_natural_cmp() {
        assert_eq!(natural_cmp("2", "10"), Ordering::Less);
        assert_eq!(natural_cmp("Q1", "Q4"), Ordering::Less);
        assert_eq!(natural_cmp("Pod 9", "Pod 10"), Ordering::Less);
        assert_eq!(natural_cmp("Q2", "Q2"), Ordering::Equal);
        assert_eq!(natural_cmp("Q", "Q1"), Ordering::Less);
        assert_eq!(natural_cmp("Lab", "RCM"), Ordering::Less);
    }

    #[test]
    fn test_default_filter_keeps_everything() {
        let rows = rows();
        assert_eq!(filter_rows(&rows, &RowFilter::default()).len(), 4);
    }

    #[test]
    fn test_filter_by_pod_and_risk() {
        let rows = rows();
        let filter = RowFilter {
            pod: Some("2".to_string()),
            risk_labels: Some(vec![RiskLabel::Green]),
            ..RowFilter::default()
        };

        let selected = filter_rows(&rows, &filter);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].record.category, "RCM");
    }

    #[test]
    fn test_empty_multiselect_matches_nothing() {
        let rows = rows();
        let filter = RowFilter {
            categories: Some(Vec::new()),
            ..RowFilter::default()
        };
        assert!(filter_rows(&rows, &filter).is_empty());
    }

    #[test]
    fn test_pod_priority_sort() {
        let rows = rows();
        let mut selected = filter_rows(&rows, &RowFilter::default());
        sort_rows(&mut selected, SortOrder::PodPriority);

        let order: Vec<(&str, &str)> = selected
            .iter()
            .map(|r| (r.record.pod_id.as_str(), r.record.category.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![("1", "Telephony"), ("2", "Lab"), ("2", "RCM"), ("10", "Lab")]
        );
    }

    #[test]
    fn test_fit_and_risk_sorts() {
        let rows = rows();
        let mut selected = filter_rows(&rows, &RowFilter::default());

        sort_rows(&mut selected, SortOrder::FitScore);
        assert_eq!(selected[0].record.fit_score, 90.0);
        assert_eq!(selected[3].record.fit_score, 50.0);

        sort_rows(&mut selected, SortOrder::Risk);
        assert_eq!(selected[0].risk_label, RiskLabel::Green);
        assert_eq!(selected[1].risk_label, RiskLabel::Green);
        assert_eq!(selected[3].risk_label, RiskLabel::Red);
        // stable: Green rows keep their fit-descending order
        assert_eq!(selected[0].record.fit_score, 90.0);
    }

    #[test]
    fn test_npv_sort_does_not_mutate_rows() {
        let rows = rows();
        let before = rows.clone();
        let mut selected = filter_rows(&rows, &RowFilter::default());
        sort_rows(&mut selected, SortOrder::Npv);

        assert!(selected.windows(2).all(|w| w[0].npv_3y >= w[1].npv_3y));
        assert_eq!(rows, before);
    }

    #[test]
    fn test_highest_value_pod() {
        let rows = rows();
        let selected = filter_rows(&rows, &RowFilter::default());
        // pod 2 sums the Amber Lab and Green RCM rows
        assert_eq!(highest_value_pod(&selected), Some("2".to_string()));
        assert_eq!(highest_value_pod(&[]), None);
    }

    #[test]
    fn test_distinct_sorted() {
        let rows = rows();
        let pods = distinct_sorted(&rows, |r| r.record.pod_id.as_str());
        assert_eq!(pods, vec!["1", "2", "10"]);
    }
}
