//! Dashboard report assembly and rendering.
//!
//! A [`DashboardReport`] collects the views selected on the command line
//! from one [`AggregateResult`]; the generator renders it as Markdown or
//! JSON.

pub mod generator;

pub use generator::*;

use crate::analysis::filter::natural_cmp;
use crate::analysis::pods::category_standardization;
use crate::analysis::{break_even_period, highest_value_pod, sort_rows, SortOrder};
use crate::graph::TopologyGraph;
use crate::models::{
    AggregateResult, Assumptions, CashFlowPoint, CategoryStandardization, DerivedRow,
    PodSummary, PortfolioSummary, QuarterSummary,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Metadata about a report run.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// Plan table the report was computed from.
    pub source: String,
    pub generated_at: DateTime<Utc>,
    pub rows_loaded: usize,
    /// Rows left after filtering.
    pub rows_shown: usize,
    pub duration_seconds: f64,
}

/// Which views a report contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sections {
    pub summary: bool,
    pub radar: bool,
    pub timeline: bool,
    pub graph: bool,
}

impl Sections {
    pub fn all() -> Self {
        Self {
            summary: true,
            radar: true,
            timeline: true,
            graph: true,
        }
    }
}

/// Value creation summary.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryView {
    pub portfolio: PortfolioSummary,
    pub jcurve: Vec<CashFlowPoint>,
    /// First period with a non-negative cash position.
    pub break_even: Option<String>,
    /// Pods with the highest 3-year NPV, best first.
    pub top_pods: Vec<PodSummary>,
}

/// One pod of the radar view.
#[derive(Debug, Clone, Serialize)]
pub struct RadarPod {
    /// Rollup over the whole pod, not just the filtered rows.
    pub pod: PodSummary,
    /// Standardization of the filtered rows against the pod's site count.
    pub categories: Vec<CategoryStandardization>,
    /// Filtered rows of the pod, best fit first.
    pub recommendations: Vec<DerivedRow>,
}

/// Filtered recommendations grouped by pod.
#[derive(Debug, Clone, Serialize)]
pub struct RadarView {
    pub n_shown: usize,
    pub highest_value_pod: Option<String>,
    pub pods: Vec<RadarPod>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimelineQuarter {
    pub summary: QuarterSummary,
    /// Rows of the quarter, best fit first.
    pub recommendations: Vec<DerivedRow>,
}

/// Quarter-by-quarter implementation plan.
#[derive(Debug, Clone, Serialize)]
pub struct TimelineView {
    pub total_switches: usize,
    pub quarters: Vec<TimelineQuarter>,
}

/// Complete dashboard report.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub metadata: ReportMetadata,
    pub assumptions: Assumptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<SummaryView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radar: Option<RadarView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<TimelineView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph: Option<TopologyGraph>,
}

impl DashboardReport {
    /// Assemble the selected views.
    ///
    /// `shown` is the filtered, sorted row selection; the summary and
    /// timeline always cover the full result.
    pub fn build(
        metadata: ReportMetadata,
        sections: Sections,
        result: &AggregateResult,
        shown: &[&DerivedRow],
        top_pods: usize,
        graph: Option<TopologyGraph>,
    ) -> Self {
        Self {
            metadata,
            assumptions: result.assumptions,
            summary: sections.summary.then(|| summary_view(result, top_pods)),
            radar: sections.radar.then(|| radar_view(result, shown)),
            timeline: sections.timeline.then(|| timeline_view(result)),
            graph: if sections.graph { graph } else { None },
        }
    }
}

fn summary_view(result: &AggregateResult, top_pods: usize) -> SummaryView {
    let mut pods = result.pods.clone();
    pods.sort_by(|a, b| b.total_npv_3y.total_cmp(&a.total_npv_3y));
    pods.truncate(top_pods);

    SummaryView {
        portfolio: result.portfolio.clone(),
        jcurve: result.jcurve.clone(),
        break_even: break_even_period(&result.jcurve).map(String::from),
        top_pods: pods,
    }
}

fn radar_view(result: &AggregateResult, shown: &[&DerivedRow]) -> RadarView {
    let mut pod_ids: Vec<&str> = Vec::new();
    for row in shown {
        if !pod_ids.contains(&row.record.pod_id.as_str()) {
            pod_ids.push(&row.record.pod_id);
        }
    }
    pod_ids.sort_by(|a, b| natural_cmp(a, b));

    let pods = pod_ids
        .into_iter()
        .filter_map(|pod_id| {
            let pod = result.pod(pod_id)?.clone();
            let mut rows: Vec<&DerivedRow> = shown
                .iter()
                .copied()
                .filter(|row| row.record.pod_id == pod_id)
                .collect();

            let categories = category_standardization(&rows, pod.n_sites);
            sort_rows(&mut rows, SortOrder::FitScore);

            Some(RadarPod {
                pod,
                categories,
                recommendations: rows.into_iter().cloned().collect(),
            })
        })
        .collect();

    RadarView {
        n_shown: shown.len(),
        highest_value_pod: highest_value_pod(shown),
        pods,
    }
}

/// Quarters with a detail block in the timeline view.
pub const TIMELINE_QUARTERS: [&str; 4] = ["Q1", "Q2", "Q3", "Q4"];

fn timeline_view(result: &AggregateResult) -> TimelineView {
    let quarters = result
        .quarters
        .iter()
        .filter(|quarter| TIMELINE_QUARTERS.contains(&quarter.quarter.as_str()))
        .map(|quarter| {
            let mut rows: Vec<&DerivedRow> = result
                .rows
                .iter()
                .filter(|row| row.record.quarter == quarter.quarter)
                .collect();
            sort_rows(&mut rows, SortOrder::FitScore);

            TimelineQuarter {
                summary: quarter.clone(),
                recommendations: rows.into_iter().cloned().collect(),
            }
        })
        .collect();

    TimelineView {
        total_switches: result.portfolio.total_switches,
        quarters,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{compute_aggregates, filter_rows, RowFilter};
    use crate::data::loader::load_recommendations;
    use crate::models::Badge;

    const PLAN_CSV: &str = include_str!("../../fixtures/plan_table.csv");

    fn fixture_result() -> AggregateResult {
        let records = load_recommendations(PLAN_CSV.as_bytes()).unwrap();
        compute_aggregates(&records, &Assumptions::default()).unwrap()
    }

    fn metadata(rows_shown: usize) -> ReportMetadata {
        ReportMetadata {
            source: "fixtures/plan_table.csv".to_string(),
            generated_at: Utc::now(),
            rows_loaded: 12,
            rows_shown,
            duration_seconds: 0.01,
        }
    }

    #[test]
    fn test_sections_select_views() {
        let result = fixture_result();
        let rows = filter_rows(&result.rows, &RowFilter::default());

        let only_summary = Sections {
            summary: true,
            ..Sections::default()
        };
        let report = DashboardReport::build(metadata(rows.len()), only_summary, &result, &rows, 5, None);
        assert!(report.summary.is_some());
        assert!(report.radar.is_none());
        assert!(report.timeline.is_none());
        assert!(report.graph.is_none());
    }

    #[test]
    fn test_summary_top_pods_by_npv() {
        let result = fixture_result();
        let report = DashboardReport::build(metadata(12), Sections::all(), &result, &[], 2, None);
        let summary = report.summary.unwrap();

        let ids: Vec<&str> = summary.top_pods.iter().map(|p| p.pod_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "10"]);
        assert_eq!(summary.break_even.as_deref(), Some("Q4"));
    }

    #[test]
    fn test_radar_groups_filtered_rows() {
        let result = fixture_result();
        let filter = RowFilter {
            categories: Some(vec!["Lab".to_string()]),
            ..RowFilter::default()
        };
        let rows = filter_rows(&result.rows, &filter);
        let report = DashboardReport::build(metadata(rows.len()), Sections::all(), &result, &rows, 5, None);
        let radar = report.radar.unwrap();

        assert_eq!(radar.n_shown, 4);
        let ids: Vec<&str> = radar.pods.iter().map(|p| p.pod.pod_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "10"]);
        assert_eq!(radar.highest_value_pod.as_deref(), Some("1"));

        // pod card still covers the whole pod
        let pod1 = &radar.pods[0];
        assert_eq!(pod1.pod.n_switches, 6);
        assert_eq!(pod1.recommendations.len(), 3);
        assert_eq!(pod1.categories.len(), 1);
        assert_eq!(pod1.categories[0].badge, Badge::Amber);

        let fits: Vec<f64> = pod1.recommendations.iter().map(|r| r.record.fit_score).collect();
        assert_eq!(fits, vec![91.0, 86.0, 68.0]);
    }

    #[test]
    fn test_timeline_covers_every_quarter() {
        let result = fixture_result();
        let report = DashboardReport::build(metadata(12), Sections::all(), &result, &[], 5, None);
        let timeline = report.timeline.unwrap();

        assert_eq!(timeline.total_switches, 12);
        let quarters: Vec<&str> = timeline
            .quarters
            .iter()
            .map(|q| q.summary.quarter.as_str())
            .collect();
        assert_eq!(quarters, vec!["Q1", "Q2", "Q3", "Q4"]);

        let total: usize = timeline.quarters.iter().map(|q| q.recommendations.len()).sum();
        assert_eq!(total, 12);
    }

    #[test]
    fn test_timeline_skips_quarters_outside_year_one() {
        let mut records = load_recommendations(PLAN_CSV.as_bytes()).unwrap();
        let mut late = records[0].clone();
        late.site_id = "S099".to_string();
        late.quarter = "Q10".to_string();
        records.push(late);

        let result = compute_aggregates(&records, &Assumptions::default()).unwrap();
        assert!(result.quarter("Q10").is_some());

        let report = DashboardReport::build(metadata(13), Sections::all(), &result, &[], 5, None);
        let timeline = report.timeline.unwrap();
        assert_eq!(timeline.total_switches, 13);
        let quarters: Vec<&str> = timeline
            .quarters
            .iter()
            .map(|q| q.summary.quarter.as_str())
            .collect();
        assert_eq!(quarters, vec!["Q1", "Q2", "Q3", "Q4"]);
    }
}
