//! Core finding types: categories, severity, and the persisted finding shape.
//!
//! `FindingKind` is a tagged union over the four monitored categories, so an
//! ill-shaped record (e.g. a breach without a numeric risk score) is
//! unrepresentable once constructed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::evidence::MatchedIdentifier;

/// Breach risk score cutoffs for resolved severity (canonical thresholds).
const BREACH_CRITICAL_CUTOFF: f64 = 80.0;
const BREACH_HIGH_CUTOFF: f64 = 60.0;
const BREACH_MEDIUM_CUTOFF: f64 = 40.0;

/// Identifier of a monitored profile.
///
/// Every engine operation takes the profile explicitly; there is no ambient
/// "active profile" state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(String);

impl ProfileId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for ProfileId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ProfileId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for ProfileId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Server-assigned identifier of a persisted finding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FindingId(String);

impl FindingId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<&str> for FindingId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for FindingId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for FindingId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingCategory {
    Breach,
    Exposure,
    Impersonation,
    Mention,
}

impl FindingCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingCategory::Breach => "breach",
            FindingCategory::Exposure => "exposure",
            FindingCategory::Impersonation => "impersonation",
            FindingCategory::Mention => "mention",
        }
    }

    /// Categories that walk the remediation state machine. The rest use the
    /// simpler review machine.
    pub fn is_remediable(&self) -> bool {
        matches!(self, FindingCategory::Breach | FindingCategory::Exposure)
    }
}

impl fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolved severity of a single finding. Ordered so `max()` picks the worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    /// Severities that trigger a notification alert at creation time.
    pub fn is_alerting(&self) -> bool {
        matches!(self, Severity::High | Severity::Critical)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

/// Severity label as supplied by an evidence source.
///
/// Sources are untrusted; anything outside the known labels deserializes to
/// `Unknown` and routes to the per-category default mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityLabel {
    Critical,
    High,
    Medium,
    Low,
    #[serde(other)]
    Unknown,
}

impl SeverityLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityLabel::Critical => "critical",
            SeverityLabel::High => "high",
            SeverityLabel::Medium => "medium",
            SeverityLabel::Low => "low",
            SeverityLabel::Unknown => "unknown",
        }
    }

    /// Parse a source-supplied label. Unrecognized input becomes `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "critical" => SeverityLabel::Critical,
            "high" => SeverityLabel::High,
            "medium" => SeverityLabel::Medium,
            "low" => SeverityLabel::Low,
            _ => SeverityLabel::Unknown,
        }
    }

    fn resolved(&self) -> Severity {
        match self {
            SeverityLabel::Critical => Severity::Critical,
            SeverityLabel::High => Severity::High,
            SeverityLabel::Medium => Severity::Medium,
            SeverityLabel::Low | SeverityLabel::Unknown => Severity::Low,
        }
    }
}

impl fmt::Display for SeverityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Category-specific payload of a finding.
///
/// Serialized with the category as the tag, so the wire shape stays flat:
/// `{"category": "breach", "riskScore": 80.0, ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "lowercase")]
pub enum FindingKind {
    #[serde(rename_all = "camelCase")]
    Breach { risk_score: f64 },
    #[serde(rename_all = "camelCase")]
    Exposure { risk_level: SeverityLabel },
    Impersonation { severity: SeverityLabel },
    Mention,
}

impl FindingKind {
    pub fn category(&self) -> FindingCategory {
        match self {
            FindingKind::Breach { .. } => FindingCategory::Breach,
            FindingKind::Exposure { .. } => FindingCategory::Exposure,
            FindingKind::Impersonation { .. } => FindingCategory::Impersonation,
            FindingKind::Mention => FindingCategory::Mention,
        }
    }

    /// Numeric 0-100 contribution of this finding to the risk aggregate,
    /// before category weighting.
    pub fn severity_score(&self) -> f64 {
        match self {
            FindingKind::Breach { risk_score } => risk_score.clamp(0.0, 100.0),
            FindingKind::Impersonation { severity } => match severity {
                SeverityLabel::Critical => 100.0,
                SeverityLabel::High => 80.0,
                SeverityLabel::Medium => 50.0,
                SeverityLabel::Low => 20.0,
                SeverityLabel::Unknown => 30.0,
            },
            FindingKind::Exposure { risk_level } => match risk_level {
                SeverityLabel::Critical => 90.0,
                SeverityLabel::High => 70.0,
                SeverityLabel::Medium => 40.0,
                SeverityLabel::Low => 15.0,
                SeverityLabel::Unknown => 25.0,
            },
            FindingKind::Mention => 0.0,
        }
    }

    /// Severity used for alert gating and the critical/high counters.
    pub fn resolved_severity(&self) -> Severity {
        match self {
            FindingKind::Breach { risk_score } => {
                let score = risk_score.clamp(0.0, 100.0);
                if score >= BREACH_CRITICAL_CUTOFF {
                    Severity::Critical
                } else if score >= BREACH_HIGH_CUTOFF {
                    Severity::High
                } else if score >= BREACH_MEDIUM_CUTOFF {
                    Severity::Medium
                } else {
                    Severity::Low
                }
            }
            FindingKind::Impersonation { severity } => severity.resolved(),
            FindingKind::Exposure { risk_level } => risk_level.resolved(),
            FindingKind::Mention => Severity::Low,
        }
    }
}

/// Lifecycle status of a persisted finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingStatus {
    New,
    Monitoring,
    Ignored,
    RemovalRequested,
    Completed,
    Failed,
    Reviewed,
    Dismissed,
}

impl FindingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingStatus::New => "new",
            FindingStatus::Monitoring => "monitoring",
            FindingStatus::Ignored => "ignored",
            FindingStatus::RemovalRequested => "removal_requested",
            FindingStatus::Completed => "completed",
            FindingStatus::Failed => "failed",
            FindingStatus::Reviewed => "reviewed",
            FindingStatus::Dismissed => "dismissed",
        }
    }
}

impl fmt::Display for FindingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An accepted candidate, ready to persist. Produced only by the validator.
#[derive(Debug, Clone, PartialEq)]
pub struct FindingDraft {
    pub kind: FindingKind,
    pub matched_identifiers: Vec<MatchedIdentifier>,
    pub source_name: String,
    pub source_url: Option<String>,
    pub content_verbatim: Option<String>,
}

/// A persisted finding.
///
/// `profile_id` and the category carried by `kind` are immutable after
/// creation; only `status` and `version` change, and only through the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedFinding {
    pub id: FindingId,
    pub profile_id: ProfileId,
    #[serde(flatten)]
    pub kind: FindingKind,
    pub matched_identifiers: Vec<MatchedIdentifier>,
    pub source_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_verbatim: Option<String>,
    pub status: FindingStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub version: u64,
}

impl ValidatedFinding {
    pub fn category(&self) -> FindingCategory {
        self.kind.category()
    }

    pub fn severity_score(&self) -> f64 {
        self.kind.severity_score()
    }

    pub fn resolved_severity(&self) -> Severity {
        self.kind.resolved_severity()
    }
}
