//! Match acceptance policy.
//!
//! Pure, deterministic, no I/O. Decides which candidate findings from an
//! untrusted evidence source are trustworthy enough to persist. Rejection is
//! a normal outcome carrying a structured reason, never an error.

use serde::Serialize;
use tracing::debug;

use crate::evidence::{CandidateFinding, MatchedIdentifier};
use crate::finding::{FindingCategory, FindingDraft, FindingKind, SeverityLabel};

/// Confidence floor applied when a source supplies a confidence score.
pub const MIN_CONFIDENCE_SCORE: f64 = 80.0;

/// Identifier types that count as a bare name. Common names over-match, so a
/// match built only from these needs corroboration.
const NAME_TYPES: [&str; 3] = ["full_name", "alias", "name"];

/// Minimum identifier count for a name-only match.
const NAME_ONLY_MIN_MATCHES: usize = 2;

pub fn is_name_type(id_type: &str) -> bool {
    NAME_TYPES.contains(&id_type)
}

/// Why a candidate was rejected. Logged for auditability of every drop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum RejectReason {
    NoIdentifiers,
    LowConfidence { score: f64 },
    NameOnlyInsufficient { count: usize },
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::NoIdentifiers => "no_identifiers",
            RejectReason::LowConfidence { .. } => "low_confidence",
            RejectReason::NameOnlyInsufficient { .. } => "name_only_insufficient",
        }
    }
}

/// Outcome of validating one candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    Accepted(FindingDraft),
    Rejected(RejectReason),
}

impl Validation {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Validation::Accepted(_))
    }
}

/// The acceptance policy. Stateless; safe to share across any number of
/// concurrent validations.
#[derive(Debug, Clone)]
pub struct MatchValidator {
    min_confidence: f64,
}

impl Default for MatchValidator {
    fn default() -> Self {
        Self {
            min_confidence: MIN_CONFIDENCE_SCORE,
        }
    }
}

impl MatchValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// Apply the policy rules in order:
    /// 1. normalize identifiers and reject if none survive
    /// 2. reject a present confidence score below the floor
    /// 3. a name-only match needs at least two identifiers
    /// 4. anything else with at least one identifier is accepted
    pub fn validate(&self, candidate: &CandidateFinding) -> Validation {
        let identifiers = normalize_identifiers(&candidate.matched_identifiers);

        if identifiers.is_empty() {
            return self.reject(candidate, RejectReason::NoIdentifiers);
        }

        if let Some(score) = candidate.confidence_score {
            if score < self.min_confidence {
                return self.reject(candidate, RejectReason::LowConfidence { score });
            }
        }

        let name_only = identifiers.iter().all(|id| is_name_type(&id.id_type));
        if name_only && identifiers.len() < NAME_ONLY_MIN_MATCHES {
            return self.reject(
                candidate,
                RejectReason::NameOnlyInsufficient {
                    count: identifiers.len(),
                },
            );
        }

        debug!(
            source = %candidate.source_name,
            category = %candidate.category,
            identifiers = identifiers.len(),
            "Candidate accepted"
        );
        Validation::Accepted(FindingDraft {
            kind: build_kind(candidate),
            matched_identifiers: identifiers,
            source_name: candidate.source_name.clone(),
            source_url: candidate.source_url.clone(),
            content_verbatim: candidate.content_verbatim.clone(),
        })
    }

    fn reject(&self, candidate: &CandidateFinding, reason: RejectReason) -> Validation {
        debug!(
            source = %candidate.source_name,
            category = %candidate.category,
            reason = reason.as_str(),
            "Candidate rejected"
        );
        Validation::Rejected(reason)
    }
}

/// Drop entries with an empty type or value. The surviving subset is what a
/// persisted finding carries.
fn normalize_identifiers(identifiers: &[MatchedIdentifier]) -> Vec<MatchedIdentifier> {
    identifiers
        .iter()
        .filter(|id| !id.id_type.is_empty() && !id.value.is_empty())
        .cloned()
        .collect()
}

/// Build the typed category payload from the candidate's loose fields.
/// Structure is enforced here; the source's judgment is taken as-is.
fn build_kind(candidate: &CandidateFinding) -> FindingKind {
    match candidate.category {
        FindingCategory::Breach => FindingKind::Breach {
            risk_score: candidate.risk_score.unwrap_or(0.0).clamp(0.0, 100.0),
        },
        FindingCategory::Exposure => FindingKind::Exposure {
            risk_level: candidate
                .risk_level
                .as_deref()
                .map(SeverityLabel::parse)
                .unwrap_or(SeverityLabel::Unknown),
        },
        FindingCategory::Impersonation => FindingKind::Impersonation {
            severity: candidate
                .severity
                .as_deref()
                .map(SeverityLabel::parse)
                .unwrap_or(SeverityLabel::Unknown),
        },
        FindingCategory::Mention => FindingKind::Mention,
    }
}
