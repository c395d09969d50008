//! Data models for the synergy radar.
//!
//! This module contains the input records supplied by the upstream model,
//! the user-adjustable assumptions, and every derived record the
//! aggregation engine hands to the presentation layer.

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discount rate behind the 3-year annuity factor.
pub const DISCOUNT_RATE: f64 = 0.10;

/// `(1 - (1 + r)^-3) / r` at r = 0.10 (2.48685), truncated to three places.
pub const ANNUITY_FACTOR_3Y: f64 = 2.486;

/// Valuation multiple applied to run-rate EBITDA.
pub const EBITDA_MULTIPLE: f64 = 10.0;

/// Period labels of the cumulative cash-flow series.
pub const JCURVE_PERIODS: [&str; 7] = ["Start", "Q1", "Q2", "Q3", "Q4", "Y2", "Y3"];

/// Externally computed risk tier of a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLabel {
    /// Low risk: strong fit, good integration
    Green,
    /// Medium risk: some integration challenges
    Amber,
    /// High risk: significant barriers to adoption
    Red,
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLabel::Green => write!(f, "Green"),
            RiskLabel::Amber => write!(f, "Amber"),
            RiskLabel::Red => write!(f, "Red"),
        }
    }
}

impl RiskLabel {
    pub const ALL: [RiskLabel; 3] = [RiskLabel::Green, RiskLabel::Amber, RiskLabel::Red];

    /// Parse an upstream label. Only the exact names are accepted.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Green" => Some(RiskLabel::Green),
            "Amber" => Some(RiskLabel::Amber),
            "Red" => Some(RiskLabel::Red),
            _ => None,
        }
    }

    /// Returns an emoji representation of the risk tier.
    pub fn emoji(&self) -> &'static str {
        match self {
            RiskLabel::Green => "🟢",
            RiskLabel::Amber => "🟡",
            RiskLabel::Red => "🔴",
        }
    }

    /// Display color used for graph nodes and edges.
    pub fn color(&self) -> &'static str {
        match self {
            RiskLabel::Green => "#2ecc71",
            RiskLabel::Amber => "#f1c40f",
            RiskLabel::Red => "#e74c3c",
        }
    }
}

/// Ordinal integration quality between a vendor and a site's systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IntegrationLevel {
    None,
    Partial,
    Full,
}

impl IntegrationLevel {
    pub fn from_ordinal(value: i64) -> Option<Self> {
        match value {
            0 => Some(IntegrationLevel::None),
            1 => Some(IntegrationLevel::Partial),
            2 => Some(IntegrationLevel::Full),
            _ => None,
        }
    }
}

impl fmt::Display for IntegrationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrationLevel::None => write!(f, "None"),
            IntegrationLevel::Partial => write!(f, "Partial"),
            IntegrationLevel::Full => write!(f, "Full"),
        }
    }
}

/// One proposed vendor switch at one site, as scored upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub site_id: String,
    pub vendor_id: String,
    pub pod_id: String,
    pub site_name: String,
    pub vendor_name: String,
    pub region: String,
    pub category: String,
    pub ehr_system: String,
    pub quarter: String,
    /// Probability that the switch is adopted.
    pub p_adoption: f64,
    /// Raw risk tier; validated during derivation.
    pub risk_label: String,
    pub fit_score: f64,
    /// Opaque bucket of `fit_score`, passed through verbatim.
    pub fit_label: String,
    /// Ordinal 0/1/2; validated during derivation.
    pub integration_quality: i64,
    /// Annual price change. Positive = savings.
    pub price_delta: f64,
    /// Change in days of accounts receivable. Negative = improvement.
    pub days_ar_delta: f64,
}

/// Descriptive site attributes from `sites.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub site_id: String,
    #[serde(default)]
    pub site_name: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub ehr_system: Option<String>,
    #[serde(default)]
    pub annual_revenue: Option<f64>,
}

/// Descriptive vendor attributes from `vendors.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    pub vendor_id: String,
    #[serde(default)]
    pub vendor_name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tier: Option<String>,
}

/// Range and granularity of one adjustable assumption.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AssumptionBounds {
    pub name: &'static str,
    pub default: f64,
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl AssumptionBounds {
    fn check(&self, value: f64) -> EngineResult<()> {
        if value.is_finite() && (self.min..=self.max).contains(&value) {
            Ok(())
        } else {
            Err(EngineError::AssumptionOutOfRange {
                name: self.name,
                value,
                min: self.min,
                max: self.max,
            })
        }
    }
}

pub const AMBER_PENALTY_BOUNDS: AssumptionBounds = AssumptionBounds {
    name: "amber_penalty_pct",
    default: 10.0,
    min: 0.0,
    max: 50.0,
    step: 5.0,
};

pub const RED_PENALTY_BOUNDS: AssumptionBounds = AssumptionBounds {
    name: "red_penalty_pct",
    default: 25.0,
    min: 0.0,
    max: 75.0,
    step: 5.0,
};

pub const COST_PER_SWITCH_BOUNDS: AssumptionBounds = AssumptionBounds {
    name: "cost_per_switch",
    default: 2000.0,
    min: 500.0,
    max: 5000.0,
    step: 250.0,
};

pub const AR_DAY_VALUE_BOUNDS: AssumptionBounds = AssumptionBounds {
    name: "ar_day_value",
    default: 500.0,
    min: 100.0,
    max: 1000.0,
    step: 50.0,
};

/// User-adjustable what-if assumptions, re-applied on every recompute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Assumptions {
    /// Discount on expected value for Amber recommendations, in percent.
    #[serde(default = "default_amber_penalty")]
    pub amber_penalty_pct: f64,

    /// Discount on expected value for Red recommendations, in percent.
    #[serde(default = "default_red_penalty")]
    pub red_penalty_pct: f64,

    /// One-off implementation cost of a single switch, in dollars.
    #[serde(default = "default_cost_per_switch")]
    pub cost_per_switch: f64,

    /// Cash-flow value of one day of A/R saved, in dollars.
    #[serde(default = "default_ar_day_value")]
    pub ar_day_value: f64,
}

impl Default for Assumptions {
    fn default() -> Self {
        Self {
            amber_penalty_pct: default_amber_penalty(),
            red_penalty_pct: default_red_penalty(),
            cost_per_switch: default_cost_per_switch(),
            ar_day_value: default_ar_day_value(),
        }
    }
}

fn default_amber_penalty() -> f64 {
    AMBER_PENALTY_BOUNDS.default
}

fn default_red_penalty() -> f64 {
    RED_PENALTY_BOUNDS.default
}

fn default_cost_per_switch() -> f64 {
    COST_PER_SWITCH_BOUNDS.default
}

fn default_ar_day_value() -> f64 {
    AR_DAY_VALUE_BOUNDS.default
}

impl Assumptions {
    /// Bounds of all four assumptions, in display order.
    pub fn bounds() -> [AssumptionBounds; 4] {
        [
            AMBER_PENALTY_BOUNDS,
            RED_PENALTY_BOUNDS,
            COST_PER_SWITCH_BOUNDS,
            AR_DAY_VALUE_BOUNDS,
        ]
    }

    /// Check every assumption against its bounds.
    pub fn validate(&self) -> EngineResult<()> {
        AMBER_PENALTY_BOUNDS.check(self.amber_penalty_pct)?;
        RED_PENALTY_BOUNDS.check(self.red_penalty_pct)?;
        COST_PER_SWITCH_BOUNDS.check(self.cost_per_switch)?;
        AR_DAY_VALUE_BOUNDS.check(self.ar_day_value)?;
        Ok(())
    }

    /// Multiplier applied to a recommendation's expected value.
    pub fn risk_factor(&self, label: RiskLabel) -> f64 {
        match label {
            RiskLabel::Green => 1.0,
            RiskLabel::Amber => 1.0 - self.amber_penalty_pct / 100.0,
            RiskLabel::Red => 1.0 - self.red_penalty_pct / 100.0,
        }
    }
}

/// A recommendation with its financial fields derived under some assumptions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedRow {
    #[serde(flatten)]
    pub record: Recommendation,
    #[serde(rename = "risk")]
    pub risk_label: RiskLabel,
    pub integration: IntegrationLevel,
    pub annual_cost_savings: f64,
    pub annual_ar_value: f64,
    pub gross_annual_value: f64,
    pub risk_factor: f64,
    /// Expected, risk-adjusted annual value.
    pub ev_risk_adj: f64,
    pub impl_cost: f64,
    pub npv_3y: f64,
    /// `+inf` when `ev_risk_adj` is zero.
    pub payback_years: f64,
}

/// Counts of recommendations per risk tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskMix {
    pub green: usize,
    pub amber: usize,
    pub red: usize,
}

impl RiskMix {
    /// Creates a mix from a sequence of labels.
    pub fn from_labels<I: IntoIterator<Item = RiskLabel>>(labels: I) -> Self {
        let mut mix = Self::default();
        for label in labels {
            mix.add(label);
        }
        mix
    }

    pub fn add(&mut self, label: RiskLabel) {
        match label {
            RiskLabel::Green => self.green += 1,
            RiskLabel::Amber => self.amber += 1,
            RiskLabel::Red => self.red += 1,
        }
    }

    pub fn count(&self, label: RiskLabel) -> usize {
        match label {
            RiskLabel::Green => self.green,
            RiskLabel::Amber => self.amber,
            RiskLabel::Red => self.red,
        }
    }

    pub fn total(&self) -> usize {
        self.green + self.amber + self.red
    }
}

impl fmt::Display for RiskMix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}G/{}A/{}R", self.green, self.amber, self.red)
    }
}

/// Confidence in the portfolio estimate, from mean adoption probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    pub fn from_mean_adoption(mean: f64) -> Self {
        if mean > 0.8 {
            ConfidenceLevel::High
        } else if mean >= 0.5 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceLevel::Low => write!(f, "Low"),
            ConfidenceLevel::Medium => write!(f, "Medium"),
            ConfidenceLevel::High => write!(f, "High"),
        }
    }
}

/// Overall portfolio risk, from the share of Green and Amber recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortfolioRiskLevel {
    Low,
    Medium,
    High,
}

impl PortfolioRiskLevel {
    pub fn from_low_risk_pct(pct: f64) -> Self {
        if pct >= 80.0 {
            PortfolioRiskLevel::Low
        } else if pct >= 60.0 {
            PortfolioRiskLevel::Medium
        } else {
            PortfolioRiskLevel::High
        }
    }
}

impl fmt::Display for PortfolioRiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortfolioRiskLevel::Low => write!(f, "Low"),
            PortfolioRiskLevel::Medium => write!(f, "Medium"),
            PortfolioRiskLevel::High => write!(f, "High"),
        }
    }
}

/// Portfolio-level totals and KPIs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub total_switches: usize,
    pub distinct_sites: usize,
    pub distinct_vendors: usize,
    pub total_impl_cost: f64,
    /// Run-rate EBITDA: sum of risk-adjusted annual value.
    pub total_ev_annual: f64,
    pub portfolio_npv_3y: f64,
    pub portfolio_roi_pct: f64,
    /// `+inf` when the portfolio never pays back.
    pub portfolio_payback_years: f64,
    /// Absent when payback takes 10 years or more.
    pub payback_months: Option<u32>,
    pub enterprise_value: f64,
    pub gross_value_3y: f64,
    pub expected_price_savings: f64,
    pub risk_mix: RiskMix,
    pub low_risk_pct: f64,
    pub mean_adoption: f64,
    pub confidence: ConfidenceLevel,
    pub risk_level: PortfolioRiskLevel,
}

/// Totals for one implementation quarter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuarterSummary {
    pub quarter: String,
    pub ev_annual: f64,
    pub npv_3y: f64,
    pub n_switches: usize,
    pub impl_cost: f64,
    pub risk_mix: RiskMix,
    /// Running sum of `ev_annual` up to and including this quarter.
    pub cumulative_ev: f64,
    /// Running sum of `impl_cost` up to and including this quarter.
    pub cumulative_impl: f64,
}

/// One point of the cumulative cash position series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashFlowPoint {
    pub period: String,
    pub cumulative_cash: f64,
}

/// Coverage badge of a category within a pod.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Badge {
    Green,
    Amber,
    Red,
}

impl Badge {
    pub fn emoji(&self) -> &'static str {
        match self {
            Badge::Green => "🟢",
            Badge::Amber => "🟡",
            Badge::Red => "🔴",
        }
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Badge::Green => write!(f, "GREEN"),
            Badge::Amber => write!(f, "AMBER"),
            Badge::Red => write!(f, "RED"),
        }
    }
}

/// Execution status of a category standardization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StandardizationStatus {
    Execute,
    Review,
    Hold,
}

impl fmt::Display for StandardizationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StandardizationStatus::Execute => write!(f, "EXECUTE"),
            StandardizationStatus::Review => write!(f, "REVIEW"),
            StandardizationStatus::Hold => write!(f, "HOLD"),
        }
    }
}

/// Standardization opportunity for one category within one pod.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStandardization {
    pub category: String,
    /// Most frequent vendor name in the category.
    pub top_vendor: String,
    /// Share of the pod's sites already on the top vendor.
    pub coverage_pct: f64,
    pub avg_adoption: f64,
    pub total_npv: f64,
    pub badge: Badge,
    pub status: StandardizationStatus,
}

/// Recommended action for a whole pod.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PodAction {
    Greenlight,
    Approve,
    ReviewStaged,
    ReviewLater,
    Hold,
}

impl PodAction {
    pub fn label(&self) -> &'static str {
        match self {
            PodAction::Greenlight => "GREENLIGHT (slam dunk)",
            PodAction::Approve => "APPROVE (high value)",
            PodAction::ReviewStaged => "REVIEW (staged)",
            PodAction::ReviewLater => "REVIEW (later phase)",
            PodAction::Hold => "HOLD (negative/fragmented)",
        }
    }

    /// Suggested execution window.
    pub fn window(&self) -> &'static str {
        match self {
            PodAction::Greenlight => "Q1",
            PodAction::Approve => "Q1-Q2",
            PodAction::ReviewStaged => "Q2-Q3",
            PodAction::ReviewLater => "later phases",
            PodAction::Hold => "none",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            PodAction::Greenlight | PodAction::Approve => "✅",
            PodAction::ReviewStaged | PodAction::ReviewLater => "⚠️",
            PodAction::Hold => "⛔",
        }
    }
}

impl fmt::Display for PodAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Pod overview readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PodReadiness {
    Ready,
    Review,
}

impl PodReadiness {
    pub fn emoji(&self) -> &'static str {
        match self {
            PodReadiness::Ready => "🟢",
            PodReadiness::Review => "🟡",
        }
    }
}

/// Rollup of one pod of sites.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PodSummary {
    pub pod_id: String,
    /// Distinct sites in the pod.
    pub n_sites: usize,
    /// Recommendations in the pod.
    pub n_switches: usize,
    pub total_ev_annual: f64,
    pub total_npv_3y: f64,
    pub total_impl_cost: f64,
    pub pod_roi_pct: f64,
    pub pod_payback_years: f64,
    pub risk_mix: RiskMix,
    /// Distinct regions in first-appearance order.
    pub regions: Vec<String>,
    /// Distinct EHR systems in first-appearance order.
    pub ehr_systems: Vec<String>,
    pub top_category: String,
    pub categories: Vec<CategoryStandardization>,
    pub action: PodAction,
}

impl PodSummary {
    /// First two regions, with an ellipsis when there are more.
    pub fn region_summary(&self) -> String {
        let shown: Vec<&str> = self.regions.iter().take(2).map(String::as_str).collect();
        let mut summary = shown.join(", ");
        if self.regions.len() > 2 {
            summary.push_str("...");
        }
        summary
    }

    /// Ready when more than half of the pod's sites carry Green recommendations.
    pub fn readiness(&self) -> PodReadiness {
        if self.risk_mix.green as f64 > self.n_sites as f64 * 0.5 {
            PodReadiness::Ready
        } else {
            PodReadiness::Review
        }
    }
}

/// Everything the presentation layer needs after one recompute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub assumptions: Assumptions,
    pub rows: Vec<DerivedRow>,
    pub portfolio: PortfolioSummary,
    pub pods: Vec<PodSummary>,
    pub quarters: Vec<QuarterSummary>,
    pub jcurve: Vec<CashFlowPoint>,
}

impl AggregateResult {
    pub fn pod(&self, pod_id: &str) -> Option<&PodSummary> {
        self.pods.iter().find(|p| p.pod_id == pod_id)
    }

    pub fn quarter(&self, quarter: &str) -> Option<&QuarterSummary> {
        self.quarters.iter().find(|q| q.quarter == quarter)
    }
}
