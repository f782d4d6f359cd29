//! Consolidated risk scoring over a profile's persisted findings.
//!
//! Pure and deterministic: the profile is a function of the finding set and
//! is recomputed from a snapshot, never stored or independently mutated.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::finding::{FindingCategory, Severity, ValidatedFinding};

/// Category weights for the consolidated score.
const BREACH_WEIGHT: f64 = 0.4;
const IMPERSONATION_WEIGHT: f64 = 0.35;
const EXPOSURE_WEIGHT: f64 = 0.25;
const MAX_SCORE: f64 = 100.0;

fn category_weight(category: FindingCategory) -> f64 {
    match category {
        FindingCategory::Breach => BREACH_WEIGHT,
        FindingCategory::Impersonation => IMPERSONATION_WEIGHT,
        FindingCategory::Exposure => EXPOSURE_WEIGHT,
        FindingCategory::Mention => 0.0,
    }
}

/// Band classification of the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Safe,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            0 => RiskLevel::Safe,
            1..=25 => RiskLevel::Low,
            26..=50 => RiskLevel::Medium,
            51..=75 => RiskLevel::High,
            _ => RiskLevel::Critical,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "SAFE",
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Weighted contribution of one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryScore {
    pub category: String,
    pub score: u32,
    pub findings_count: usize,
}

/// Consolidated risk for one profile. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskProfile {
    /// Overall risk score (0-100).
    pub overall: u8,
    pub level: RiskLevel,
    pub critical_count: usize,
    pub high_count: usize,
    pub total_findings: usize,
    /// Per-category contributions, highest first.
    pub by_category: Vec<CategoryScore>,
}

impl RiskProfile {
    /// Compute the consolidated score.
    ///
    /// `overall = round(min(100, sum(weight * mapped) / max(1, n)))` where
    /// `n` counts every finding across all categories, mentions included.
    pub fn from_findings(findings: &[ValidatedFinding]) -> Self {
        let mut category_scores: HashMap<FindingCategory, (f64, usize)> = HashMap::new();
        let mut critical_count = 0;
        let mut high_count = 0;
        let mut weighted_sum = 0.0;

        for finding in findings {
            let category = finding.category();
            let contribution = category_weight(category) * finding.severity_score();
            weighted_sum += contribution;

            match finding.resolved_severity() {
                Severity::Critical => critical_count += 1,
                Severity::High => high_count += 1,
                _ => {}
            }

            let entry = category_scores.entry(category).or_insert((0.0, 0));
            entry.0 += contribution;
            entry.1 += 1;
        }

        let divisor = findings.len().max(1) as f64;
        let overall = (weighted_sum / divisor).min(MAX_SCORE).round() as u8;

        let mut by_category: Vec<CategoryScore> = category_scores
            .into_iter()
            .map(|(category, (score, count))| CategoryScore {
                category: category.as_str().to_string(),
                score: (score.min(MAX_SCORE)).round() as u32,
                findings_count: count,
            })
            .collect();
        by_category.sort_by(|a, b| b.score.cmp(&a.score).then(a.category.cmp(&b.category)));

        RiskProfile {
            overall,
            level: RiskLevel::from_score(overall),
            critical_count,
            high_count,
            total_findings: findings.len(),
            by_category,
        }
    }
}

/// Breach severity under the legacy high cutoff (>= 70 instead of 60-79).
///
/// One downstream report consumer still classifies with this table; the
/// canonical path uses `FindingKind::resolved_severity`. Kept until that
/// consumer migrates.
pub fn legacy_breach_severity(risk_score: f64) -> Severity {
    let score = risk_score.clamp(0.0, 100.0);
    if score >= 80.0 {
        Severity::Critical
    } else if score >= 70.0 {
        Severity::High
    } else if score >= 40.0 {
        Severity::Medium
    } else {
        Severity::Low
    }
}
