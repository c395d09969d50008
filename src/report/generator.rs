//! Markdown and JSON report generation.
//!
//! This module renders a [`DashboardReport`] into a Markdown document
//! or pretty-printed JSON.

use super::{DashboardReport, RadarPod, RadarView, ReportMetadata, SummaryView, TimelineView};
use crate::analysis::format_dollars;
use crate::graph::TopologyGraph;
use crate::models::{
    Assumptions, DerivedRow, PortfolioSummary, RiskLabel, DISCOUNT_RATE, EBITDA_MULTIPLE,
};
use anyhow::Result;

/// Payback at or beyond this many years is shown as N/A.
const PAYBACK_DISPLAY_LIMIT_YEARS: f64 = 10.0;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &DashboardReport) -> String {
    let mut output = String::new();

    output.push_str("# Synergy Radar Report\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents(report));

    if let Some(ref summary) = report.summary {
        output.push_str(&generate_summary_section(summary, &report.assumptions));
    }

    if let Some(ref radar) = report.radar {
        output.push_str(&generate_radar_section(radar));
    }

    if let Some(ref timeline) = report.timeline {
        output.push_str(&generate_timeline_section(timeline));
    }

    if let Some(ref graph) = report.graph {
        output.push_str(&generate_graph_section(graph));
    }

    output.push_str(&generate_footer());

    output
}

/// Generate a JSON report.
pub fn generate_json_report(report: &DashboardReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Dollar amount with the sign in front of the currency symbol.
fn money(value: f64) -> String {
    let formatted = format_dollars(value);
    match formatted.strip_prefix('-') {
        Some(abs) => format!("-${}", abs),
        None => format!("${}", formatted),
    }
}

fn payback_display(years: f64) -> String {
    if years < PAYBACK_DISPLAY_LIMIT_YEARS {
        format!("{:.1} yrs", years)
    } else {
        "N/A".to_string()
    }
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** `{}`\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Recommendations Loaded:** {}\n",
        metadata.rows_loaded
    ));
    if metadata.rows_shown != metadata.rows_loaded {
        section.push_str(&format!(
            "- **Recommendations Shown:** {}\n",
            metadata.rows_shown
        ));
    }
    section.push_str(&format!(
        "- **Duration:** {:.2}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

fn generate_table_of_contents(report: &DashboardReport) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");

    if report.summary.is_some() {
        toc.push_str("- [Value Creation Summary](#value-creation-summary)\n");
    }
    if report.radar.is_some() {
        toc.push_str("- [Synergy Discovery Radar](#synergy-discovery-radar)\n");
    }
    if report.timeline.is_some() {
        toc.push_str("- [Implementation Timeline](#implementation-timeline)\n");
    }
    if report.graph.is_some() {
        toc.push_str("- [Graph Topology](#graph-topology)\n");
    }

    toc.push('\n');

    toc
}

fn generate_summary_section(summary: &SummaryView, assumptions: &Assumptions) -> String {
    let portfolio = &summary.portfolio;
    let mut section = String::new();

    section.push_str("## Value Creation Summary\n\n");

    section.push_str(&format!(
        "**Standardize {} vendors across {} sites** → **{} Enterprise Value Created**\n\n",
        portfolio.distinct_vendors,
        portfolio.distinct_sites,
        money(portfolio.enterprise_value)
    ));

    let payback = match portfolio.payback_months {
        Some(months) => format!("{} months", months),
        None => "N/A".to_string(),
    };

    section.push_str("| Enterprise Value | Run-Rate EBITDA | Payback | Confidence |\n");
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {}/yr | {} | {} |\n",
        money(portfolio.enterprise_value),
        money(portfolio.total_ev_annual),
        payback,
        portfolio.confidence
    ));
    section.push_str(&format!(
        "| {:.0}x run-rate EBITDA | recurring annual value | {} investment | {:.0}% low risk |\n\n",
        EBITDA_MULTIPLE,
        money(portfolio.total_impl_cost),
        portfolio.low_risk_pct
    ));

    // J-curve
    section.push_str("### Investment J-Curve\n\n");
    section.push_str("| Period | Cumulative Cash Position |\n");
    section.push_str("|:---|---:|\n");
    for point in &summary.jcurve {
        section.push_str(&format!(
            "| {} | {} |\n",
            point.period,
            money(point.cumulative_cash)
        ));
    }
    section.push('\n');
    match summary.break_even {
        Some(ref period) => {
            section.push_str(&format!("*Break-even reached by {}.*\n\n", period));
        }
        None => section.push_str("*No break-even within three years.*\n\n"),
    }

    section.push_str(&generate_value_breakdown(portfolio));

    // Risk distribution
    section.push_str("### Risk Distribution\n\n");
    section.push_str(&format!(
        "| {} Green | {} Amber | {} Red | Portfolio Risk |\n",
        RiskLabel::Green.emoji(),
        RiskLabel::Amber.emoji(),
        RiskLabel::Red.emoji()
    ));
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} |\n\n",
        portfolio.risk_mix.green, portfolio.risk_mix.amber, portfolio.risk_mix.red, portfolio.risk_level
    ));

    // Pod overview
    if !summary.top_pods.is_empty() {
        section.push_str("### Pod Strategy Overview\n\n");
        for pod in &summary.top_pods {
            section.push_str(&format!(
                "- {} **Pod {}**: {} sites | 3Y NPV: {} | Top: {}\n",
                pod.readiness().emoji(),
                pod.pod_id,
                pod.n_sites,
                money(pod.total_npv_3y),
                pod.top_category
            ));
        }
        section.push('\n');
    }

    section.push_str(&generate_assumptions_table(assumptions));

    section
}

fn generate_value_breakdown(portfolio: &PortfolioSummary) -> String {
    let mut section = String::new();

    section.push_str("### 3-Year Value Breakdown\n\n");
    section.push_str(&format!(
        "| Component | Annual | 3-Year (NPV @ {:.0}%) |\n",
        DISCOUNT_RATE * 100.0
    ));
    section.push_str("|:---|---:|---:|\n");
    section.push_str(&format!(
        "| Run-Rate Value | {} | {} |\n",
        money(portfolio.total_ev_annual),
        money(portfolio.gross_value_3y)
    ));
    section.push_str(&format!(
        "| Implementation Cost | | {} |\n",
        money(-portfolio.total_impl_cost)
    ));
    section.push_str(&format!(
        "| **Net Present Value** | | **{}** |\n\n",
        money(portfolio.portfolio_npv_3y)
    ));

    section.push_str(&format!(
        "- 3-Year ROI: **{:+.0}%**\n",
        portfolio.portfolio_roi_pct
    ));
    section.push_str(&format!(
        "- Payback: **{}**\n",
        payback_display(portfolio.portfolio_payback_years)
    ));
    section.push_str(&format!(
        "- Enterprise Value ({:.0}x): **{}**\n",
        EBITDA_MULTIPLE,
        money(portfolio.enterprise_value)
    ));
    section.push_str(&format!(
        "- Expected Price Savings: **{}/yr**\n\n",
        money(portfolio.expected_price_savings)
    ));

    section
}

fn generate_assumptions_table(assumptions: &Assumptions) -> String {
    let values = [
        assumptions.amber_penalty_pct,
        assumptions.red_penalty_pct,
        assumptions.cost_per_switch,
        assumptions.ar_day_value,
    ];

    let mut section = String::new();

    section.push_str("### Current Assumptions\n\n");
    section.push_str("| Assumption | Value | Default | Range |\n");
    section.push_str("|:---|---:|---:|:---:|\n");
    for (bounds, value) in Assumptions::bounds().iter().zip(values) {
        section.push_str(&format!(
            "| `{}` | {} | {} | {}-{} (step {}) |\n",
            bounds.name, value, bounds.default, bounds.min, bounds.max, bounds.step
        ));
    }
    section.push('\n');

    section
}

fn generate_radar_section(radar: &RadarView) -> String {
    let mut section = String::new();

    section.push_str("## Synergy Discovery Radar\n\n");

    if radar.pods.is_empty() {
        section.push_str("No recommendations match the current filters.\n\n");
        return section;
    }

    section.push_str(&format!(
        "Showing {} recommendations across {} pods.",
        radar.n_shown,
        radar.pods.len()
    ));
    if let Some(ref pod_id) = radar.highest_value_pod {
        section.push_str(&format!(" Highest-value pod: **Pod {}**.", pod_id));
    }
    section.push_str("\n\n");

    for pod in &radar.pods {
        section.push_str(&generate_pod_block(pod));
    }

    section
}

fn generate_pod_block(radar_pod: &RadarPod) -> String {
    let pod = &radar_pod.pod;
    let mut block = String::new();

    block.push_str(&format!(
        "### 📦 Pod {} ({}) | {} NPV | {} sites | {}\n\n",
        pod.pod_id,
        pod.region_summary(),
        money(pod.total_npv_3y),
        pod.n_sites,
        pod.risk_mix
    ));

    block.push_str("| Pod 3Y NPV | Annual EV | Sites | Pod ROI | Payback | Investment |\n");
    block.push_str("|:---:|:---:|:---:|:---:|:---:|:---:|\n");
    block.push_str(&format!(
        "| {} | {} | {} | {:.0}% | {} | {} |\n\n",
        money(pod.total_npv_3y),
        money(pod.total_ev_annual),
        pod.n_sites,
        pod.pod_roi_pct,
        payback_display(pod.pod_payback_years),
        money(pod.total_impl_cost)
    ));

    if !radar_pod.categories.is_empty() {
        block.push_str("**Vendor Standardization:**\n\n");
        block.push_str("| Category | Top Vendor | Coverage | Avg Adoption | 3Y NPV | Status |\n");
        block.push_str("|:---|:---|:---:|:---:|---:|:---:|\n");
        for cat in &radar_pod.categories {
            block.push_str(&format!(
                "| {} | {} | {} {:.0}% | {:.0}% | {} | {} {} |\n",
                cat.category,
                cat.top_vendor,
                cat.badge.emoji(),
                cat.coverage_pct,
                cat.avg_adoption * 100.0,
                money(cat.total_npv),
                cat.badge,
                cat.status
            ));
        }
        block.push('\n');
    }

    block.push_str(&format!(
        "> {} **Action:** {} (window: {})\n\n",
        pod.action.emoji(),
        pod.action,
        pod.action.window()
    ));

    block.push_str(&format!(
        "**Individual Recommendations ({}):**\n\n",
        radar_pod.recommendations.len()
    ));
    for row in &radar_pod.recommendations {
        block.push_str(&generate_recommendation_line(row));
    }
    block.push_str("\n---\n\n");

    block
}

fn generate_recommendation_line(row: &DerivedRow) -> String {
    let rec = &row.record;
    format!(
        "- {} **{}** → {} ({}) | {}\n  Fit: **{}** ({}) | NPV: **{}** | A/R: {:+.1} days | Integration: {}\n",
        row.risk_label.emoji(),
        rec.vendor_name,
        rec.site_name,
        rec.category,
        rec.quarter,
        rec.fit_score,
        rec.fit_label,
        money(row.npv_3y),
        rec.days_ar_delta,
        row.integration
    )
}

fn generate_timeline_section(timeline: &TimelineView) -> String {
    let mut section = String::new();

    section.push_str("## Implementation Timeline\n\n");

    let n_quarters = timeline.quarters.len();
    section.push_str(&format!(
        "Total: **{} switches** over **{} quarters**",
        timeline.total_switches, n_quarters
    ));
    if n_quarters > 0 {
        section.push_str(&format!(
            " = ~{} per quarter on average",
            timeline.total_switches / n_quarters
        ));
    }
    section.push_str(".\n\n");

    for quarter in &timeline.quarters {
        let q = &quarter.summary;
        section.push_str(&format!(
            "### {} | {} switches | 3Y NPV: {} | {}{} {}{} {}{}\n\n",
            q.quarter,
            q.n_switches,
            money(q.npv_3y),
            RiskLabel::Green.emoji(),
            q.risk_mix.green,
            RiskLabel::Amber.emoji(),
            q.risk_mix.amber,
            RiskLabel::Red.emoji(),
            q.risk_mix.red
        ));

        section.push_str("| Switches | Annual EV | Implementation Cost | 3-Year NPV |\n");
        section.push_str("|:---:|:---:|:---:|:---:|\n");
        section.push_str(&format!(
            "| {} | {} | {} | {} |\n\n",
            q.n_switches,
            money(q.ev_annual),
            money(q.impl_cost),
            money(q.npv_3y)
        ));

        section.push_str("**Vendors in this quarter:**\n\n");
        for row in &quarter.recommendations {
            section.push_str(&format!(
                "- {} **{}** → {} (Pod {}) | Fit: {} | NPV: {}\n",
                row.risk_label.emoji(),
                row.record.vendor_name,
                row.record.site_name,
                row.record.pod_id,
                row.record.fit_score,
                money(row.npv_3y)
            ));
        }
        section.push('\n');
    }

    if n_quarters > 0 {
        section.push_str("### Quarterly Comparison\n\n");
        section.push_str(
            "| Quarter | Switches | Annual EV | 3-Year NPV | Implementation Cost | Cumulative EV |\n",
        );
        section.push_str("|:---|:---:|---:|---:|---:|---:|\n");
        for quarter in &timeline.quarters {
            let q = &quarter.summary;
            section.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} |\n",
                q.quarter,
                q.n_switches,
                money(q.ev_annual),
                money(q.npv_3y),
                money(q.impl_cost),
                money(q.cumulative_ev)
            ));
        }
        section.push('\n');
    }

    section
}

fn generate_graph_section(graph: &TopologyGraph) -> String {
    let stats = &graph.stats;
    let mut section = String::new();

    section.push_str("## Graph Topology\n\n");

    if graph.is_empty() {
        section.push_str("No connections to display for the current filters.\n\n");
        return section;
    }

    section.push_str("| Sites | Vendors | Connections | Avg Adoption | Green |\n");
    section.push_str("|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {:.1}% | {:.0}% |\n\n",
        stats.n_sites,
        stats.n_vendors,
        graph.edges.len(),
        stats.avg_adoption * 100.0,
        stats.green_pct
    ));

    section.push_str("### Risk Distribution\n\n");
    section.push_str("| Risk | Count | Share |\n");
    section.push_str("|:---|:---:|:---:|\n");
    for share in &stats.risk_distribution {
        section.push_str(&format!(
            "| {} {} | {} | {:.0}% |\n",
            share.label.emoji(),
            share.label,
            share.count,
            share.pct
        ));
    }
    section.push('\n');

    section.push_str("### Fit Distribution\n\n");
    section.push_str("| Fit | Count |\n");
    section.push_str("|:---|:---:|\n");
    for fit in &stats.fit_distribution {
        section.push_str(&format!("| {} | {} |\n", fit.label, fit.count));
    }
    section.push('\n');

    section.push_str("### Connections\n\n");
    section.push_str("| Site | Vendor | p(adopt) | Width |\n");
    section.push_str("|:---|:---|:---:|:---:|\n");
    for edge in &graph.edges {
        section.push_str(&format!(
            "| {} | {} | {:.1}% | {:.1} |\n",
            edge.source,
            edge.target,
            edge.p_adoption * 100.0,
            edge.width
        ));
    }
    section.push('\n');

    section
}

fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Report generated by synergy-radar*\n");

    footer
}
