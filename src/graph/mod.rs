//! Site/vendor topology view.
//!
//! Builds renderer-agnostic nodes and edges from a selection of derived
//! rows: one node per site, one per vendor, one edge per recommendation.
//! Edge width tracks adoption probability; vendor and edge colors track
//! the risk tier.

use crate::data::{SiteDirectory, VendorDirectory};
use crate::models::{DerivedRow, RiskLabel, RiskMix};
use serde::Serialize;
use std::collections::HashSet;

pub const DEFAULT_MAX_EDGES: usize = 25;
pub const MIN_MAX_EDGES: usize = 10;
pub const MAX_MAX_EDGES: usize = 50;

/// Fit buckets in display order.
pub const FIT_LABEL_ORDER: [&str; 5] = [
    "Excellent Fit",
    "Good Fit",
    "Moderate Fit",
    "Poor Fit",
    "Not Recommended",
];

const SITE_COLOR: &str = "#3498db";
const SITE_NODE_SIZE: u32 = 30;
const VENDOR_NODE_SIZE: u32 = 22;
const VENDOR_LABEL_CHARS: usize = 15;

/// Color for a vendor category, when the category is a known one.
pub fn category_color(category: &str) -> Option<&'static str> {
    match category {
        "Lab" => Some("#9b59b6"),
        "RCM" => Some("#3498db"),
        "Telephony" => Some("#1abc9c"),
        "Scheduling" => Some("#e67e22"),
        "Clearinghouse" => Some("#34495e"),
        "IT_MSP" => Some("#95a5a6"),
        "Supplies" => Some("#d35400"),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Site,
    Vendor,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub kind: NodeKind,
    pub label: String,
    pub size: u32,
    pub color: String,
    /// Category accent for vendor nodes of a known category.
    pub category_color: Option<String>,
    /// Hover text.
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub color: String,
    pub p_adoption: f64,
    pub width: f64,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskShare {
    pub label: RiskLabel,
    pub count: usize,
    pub pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphStats {
    pub n_sites: usize,
    pub n_vendors: usize,
    pub avg_adoption: f64,
    pub green_pct: f64,
    /// Only tiers present in the selection.
    pub risk_distribution: Vec<RiskShare>,
    pub fit_distribution: Vec<FitCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopologyGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub stats: GraphStats,
}

impl TopologyGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Build the topology for the first `max_edges` rows of a selection.
pub fn build_topology(
    rows: &[&DerivedRow],
    max_edges: usize,
    sites: Option<&SiteDirectory>,
    vendors: Option<&VendorDirectory>,
) -> TopologyGraph {
    let shown = &rows[..rows.len().min(max_edges)];

    let mut nodes = Vec::new();
    let mut edges = Vec::with_capacity(shown.len());
    let mut added_sites: HashSet<&str> = HashSet::new();
    let mut added_vendors: HashSet<&str> = HashSet::new();

    for row in shown {
        let rec = &row.record;

        if added_sites.insert(rec.site_id.as_str()) {
            nodes.push(site_node(row, sites));
        }

        if added_vendors.insert(rec.vendor_id.as_str()) {
            nodes.push(vendor_node(row, vendors));
        }

        edges.push(GraphEdge {
            source: rec.site_id.clone(),
            target: rec.vendor_id.clone(),
            color: row.risk_label.color().to_string(),
            p_adoption: rec.p_adoption,
            width: (rec.p_adoption * 5.0).max(1.0),
            title: format!(
                "p(adopt): {:.1}%\nFit: {}\nA/R Impact: {:+.1} days",
                rec.p_adoption * 100.0,
                rec.fit_score,
                rec.days_ar_delta
            ),
        });
    }

    let stats = graph_stats(shown, added_sites.len(), added_vendors.len());

    TopologyGraph {
        nodes,
        edges,
        stats,
    }
}

fn site_node(row: &DerivedRow, sites: Option<&SiteDirectory>) -> GraphNode {
    let rec = &row.record;

    let revenue = sites
        .and_then(|dir| dir.get(&rec.site_id))
        .and_then(|site| site.annual_revenue)
        .map(|revenue| format!("\nRevenue: ${:.1}M", revenue / 1_000_000.0))
        .unwrap_or_default();

    GraphNode {
        id: rec.site_id.clone(),
        kind: NodeKind::Site,
        label: format!("{}\n({})", rec.site_id, rec.region),
        size: SITE_NODE_SIZE,
        color: SITE_COLOR.to_string(),
        category_color: None,
        title: format!(
            "Site: {}\nRegion: {}\nEHR: {}{}",
            rec.site_name, rec.region, rec.ehr_system, revenue
        ),
    }
}

fn vendor_node(row: &DerivedRow, vendors: Option<&VendorDirectory>) -> GraphNode {
    let rec = &row.record;

    let tier = vendors
        .and_then(|dir| dir.get(&rec.vendor_id))
        .and_then(|vendor| vendor.tier.as_deref())
        .map(|tier| format!("\nTier: {}", tier))
        .unwrap_or_default();

    let short_name: String = rec.vendor_name.chars().take(VENDOR_LABEL_CHARS).collect();

    GraphNode {
        id: rec.vendor_id.clone(),
        kind: NodeKind::Vendor,
        label: format!("{}\n({})", short_name, rec.category),
        size: VENDOR_NODE_SIZE,
        color: row.risk_label.color().to_string(),
        category_color: category_color(&rec.category).map(String::from),
        title: format!(
            "Vendor: {}\nCategory: {}{}\n\nRisk: {}\nAdoption Prob: {:.1}%\nFit Score: {}",
            rec.vendor_name,
            rec.category,
            tier,
            row.risk_label,
            rec.p_adoption * 100.0,
            rec.fit_score
        ),
    }
}

fn graph_stats(rows: &[&DerivedRow], n_sites: usize, n_vendors: usize) -> GraphStats {
    let mix = RiskMix::from_labels(rows.iter().map(|r| r.risk_label));
    let n = mix.total();
    let share = |count: usize| {
        if n > 0 {
            count as f64 / n as f64 * 100.0
        } else {
            0.0
        }
    };

    let avg_adoption = if n > 0 {
        rows.iter().map(|r| r.record.p_adoption).sum::<f64>() / n as f64
    } else {
        0.0
    };

    let risk_distribution: Vec<RiskShare> = RiskLabel::ALL
        .iter()
        .map(|&label| RiskShare {
            label,
            count: mix.count(label),
            pct: share(mix.count(label)),
        })
        .filter(|s| s.count > 0)
        .collect();

    let fit_distribution = FIT_LABEL_ORDER
        .iter()
        .map(|&label| FitCount {
            label: label.to_string(),
            count: rows.iter().filter(|r| r.record.fit_label == label).count(),
        })
        .collect();

    GraphStats {
        n_sites,
        n_vendors,
        avg_adoption,
        green_pct: share(mix.green),
        risk_distribution,
        fit_distribution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{compute_aggregates, filter_rows, RowFilter};
    use crate::data::loader::{load_recommendations, load_sites, load_vendors};
    use crate::models::{AggregateResult, Assumptions};

    const PLAN_CSV: &str = include_str!("../../fixtures/plan_table.csv");
    const SITES_CSV: &str = include_str!("../../fixtures/sites.csv");
    const VENDORS_CSV: &str = include_str!("../../fixtures/vendors.csv");

    fn fixture_result() -> AggregateResult {
        let records = load_recommendations(PLAN_CSV.as_bytes()).unwrap();
        compute_aggregates(&records, &Assumptions::default()).unwrap()
    }

    #[test]
    fn test_full_topology() {
        let result = fixture_result();
        let rows = filter_rows(&result.rows, &RowFilter::default());
        let graph = build_topology(&rows, DEFAULT_MAX_EDGES, None, None);

        assert_eq!(graph.edges.len(), 12);
        assert_eq!(graph.stats.n_sites, 6);
        assert_eq!(graph.stats.n_vendors, 6);
        assert_eq!(graph.nodes.len(), 12);
        assert!((graph.stats.green_pct - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_edges_truncate_to_limit() {
        let result = fixture_result();
        let rows = filter_rows(&result.rows, &RowFilter::default());
        let graph = build_topology(&rows, 10, None, None);
        assert_eq!(graph.edges.len(), 10);
    }

    #[test]
    fn test_edge_width_and_color() {
        let result = fixture_result();
        let rows = filter_rows(&result.rows, &RowFilter::default());
        let graph = build_topology(&rows, DEFAULT_MAX_EDGES, None, None);

        let first = &graph.edges[0];
        assert_eq!(first.source, "S001");
        assert_eq!(first.target, "V100");
        assert!((first.width - 4.6).abs() < 1e-9);
        assert!((first.p_adoption - 0.92).abs() < 1e-9);
        assert_eq!(first.color, "#2ecc71");
        assert!(first.title.contains("p(adopt): 92.0%"));
        assert!(first.title.contains("A/R Impact: -4.0 days"));

        let slot = graph.edges.iter().find(|e| e.target == "V401").unwrap();
        assert!((slot.width - 2.05).abs() < 1e-9);
        assert_eq!(slot.color, "#e74c3c");
    }

    #[test]
    fn test_enrichment_from_directories() {
        let result = fixture_result();
        let rows = filter_rows(&result.rows, &RowFilter::default());
        let sites = SiteDirectory::new(load_sites(SITES_CSV.as_bytes()).unwrap());
        let vendors = VendorDirectory::new(load_vendors(VENDORS_CSV.as_bytes()).unwrap());

        let graph = build_topology(&rows, DEFAULT_MAX_EDGES, Some(&sites), Some(&vendors));

        let site = graph.nodes.iter().find(|n| n.id == "S001").unwrap();
        assert_eq!(site.kind, NodeKind::Site);
        assert!(site.title.contains("Revenue: $2.4M"));

        let vendor = graph.nodes.iter().find(|n| n.id == "V100").unwrap();
        assert_eq!(vendor.kind, NodeKind::Vendor);
        assert!(vendor.title.contains("Tier: Enterprise"));
        assert_eq!(vendor.label, "ClearPath Lab\n(Lab)");
        assert_eq!(vendor.category_color.as_deref(), Some("#9b59b6"));
        assert_eq!(site.category_color, None);
    }

    #[test]
    fn test_region_filter_and_stats() {
        let result = fixture_result();
        let filter = RowFilter {
            region: Some("Midwest".to_string()),
            ..RowFilter::default()
        };
        let rows = filter_rows(&result.rows, &filter);
        let graph = build_topology(&rows, DEFAULT_MAX_EDGES, None, None);

        assert_eq!(graph.stats.n_sites, 2);
        assert_eq!(graph.stats.n_vendors, 3);
        assert!((graph.stats.avg_adoption - 0.62).abs() < 1e-9);

        let labels: Vec<RiskLabel> = graph
            .stats
            .risk_distribution
            .iter()
            .map(|s| s.label)
            .collect();
        assert_eq!(labels, RiskLabel::ALL.to_vec());

        let fit: Vec<usize> = graph.stats.fit_distribution.iter().map(|f| f.count).collect();
        assert_eq!(fit, vec![0, 1, 1, 1, 1]);
    }

    #[test]
    fn test_empty_selection() {
        let graph = build_topology(&[], DEFAULT_MAX_EDGES, None, None);
        assert!(graph.is_empty());
        assert_eq!(graph.stats.avg_adoption, 0.0);
        assert!(graph.stats.risk_distribution.is_empty());
    }

    #[test]
    fn test_long_vendor_names_are_shortened() {
        let mut records = load_recommendations(PLAN_CSV.as_bytes()).unwrap();
        records.truncate(1);
        records[0].vendor_name = "Extraordinarily Long Lab Partners".to_string();
        records[0].p_adoption = 0.1;
        let result = compute_aggregates(&records, &Assumptions::default()).unwrap();
        let rows = filter_rows(&result.rows, &RowFilter::default());

        let graph = build_topology(&rows, DEFAULT_MAX_EDGES, None, None);
        let vendor = graph.nodes.iter().find(|n| n.kind == NodeKind::Vendor).unwrap();
        assert_eq!(vendor.label, "Extraordinarily\n(Lab)");
        assert_eq!(graph.edges[0].width, 1.0);
        assert_eq!(category_color("Lab"), Some("#9b59b6"));
        assert_eq!(category_color("Dental"), None);
    }
}
