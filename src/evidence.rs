//! Evidence source boundary.
//!
//! An evidence source is an untrusted external process that, given one
//! monitored identifier, returns candidate findings. Sources can hallucinate,
//! over-match, or misjudge severity; everything they return goes through the
//! acceptance policy before it is persisted.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

use crate::error::ErrorKind;
use crate::finding::{FindingCategory, ProfileId};
use crate::vault::VaultIdentifier;

/// Errors raised at the evidence source boundary. Caught per identifier; a
/// failed lookup never aborts the scan.
#[derive(Error, Debug)]
pub enum EvidenceError {
    #[error("Evidence lookup timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Evidence source not configured: {0}")]
    Unconfigured(String),

    #[error("Evidence source {source_name} failed: {message}")]
    Backend {
        source_name: String,
        message: String,
    },

    #[error("Malformed evidence payload: {0}")]
    Malformed(String),
}

impl EvidenceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EvidenceError::Timeout { .. } => ErrorKind::Timeout,
            EvidenceError::Unconfigured(_) => ErrorKind::Unconfigured,
            EvidenceError::Backend { .. } | EvidenceError::Malformed(_) => ErrorKind::Internal,
        }
    }
}

/// One identifier an evidence source claims to have matched.
///
/// The type is a free string on the wire; the acceptance policy compares it
/// against the known name types without trusting it further.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedIdentifier {
    #[serde(rename = "type")]
    pub id_type: String,
    pub value: String,
}

impl MatchedIdentifier {
    pub fn new(id_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id_type: id_type.into(),
            value: value.into(),
        }
    }
}

/// A candidate finding as returned by an evidence source. Ephemeral; never
/// persisted as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateFinding {
    pub source_name: String,
    pub category: FindingCategory,
    #[serde(default)]
    pub matched_identifiers: Vec<MatchedIdentifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_verbatim: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

/// A pluggable evidence backend. One call per identifier per scan.
#[async_trait]
pub trait EvidenceSource: Send + Sync {
    fn name(&self) -> &str;

    async fn lookup(
        &self,
        profile: &ProfileId,
        identifier: &VaultIdentifier,
    ) -> std::result::Result<Vec<CandidateFinding>, EvidenceError>;
}

/// Deterministic evidence source replaying captured candidates from a JSON
/// file, keyed by identifier value. Used by the CLI and the test suite to
/// drive the pipeline without the external reasoning process.
#[derive(Debug, Default)]
pub struct ReplayEvidenceSource {
    captures: HashMap<String, Vec<CandidateFinding>>,
}

impl ReplayEvidenceSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load captures from a JSON object mapping identifier value to an array
    /// of candidates. Malformed candidates are skipped with a warning, not
    /// fatal: sources are untrusted and one bad record must not poison the
    /// rest of the capture.
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| crate::error::WatchError::SnapshotRead {
                path: path.display().to_string(),
                source: e,
            })?;
        let raw: HashMap<String, Vec<serde_json::Value>> = serde_json::from_str(&content)?;

        let mut captures = HashMap::new();
        for (value, entries) in raw {
            let mut candidates = Vec::with_capacity(entries.len());
            for entry in entries {
                match serde_json::from_value::<CandidateFinding>(entry) {
                    Ok(candidate) => candidates.push(candidate),
                    Err(e) => {
                        warn!(identifier = %value, error = %e, "Skipping malformed candidate");
                    }
                }
            }
            captures.insert(value, candidates);
        }
        Ok(Self { captures })
    }

    pub fn with_capture(
        mut self,
        identifier_value: impl Into<String>,
        candidates: Vec<CandidateFinding>,
    ) -> Self {
        self.captures.insert(identifier_value.into(), candidates);
        self
    }
}

#[async_trait]
impl EvidenceSource for ReplayEvidenceSource {
    fn name(&self) -> &str {
        "replay"
    }

    async fn lookup(
        &self,
        _profile: &ProfileId,
        identifier: &VaultIdentifier,
    ) -> std::result::Result<Vec<CandidateFinding>, EvidenceError> {
        Ok(self
            .captures
            .get(&identifier.value)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::IdentifierType;

    fn make_identifier(value: &str) -> VaultIdentifier {
        VaultIdentifier {
            id: "v-1".to_string(),
            profile_id: ProfileId::new("p1"),
            data_type: IdentifierType::Email,
            value: value.to_string(),
            monitoring_enabled: true,
        }
    }

    #[test]
    fn test_candidate_wire_shape() {
        let json = r#"{
            "sourceName": "HaveIBeenPwned",
            "category": "breach",
            "matchedIdentifiers": [{"type": "email", "value": "a@example.com"}],
            "riskScore": 80
        }"#;
        let candidate: CandidateFinding = serde_json::from_str(json).unwrap();
        assert_eq!(candidate.category, FindingCategory::Breach);
        assert_eq!(candidate.risk_score, Some(80.0));
        assert_eq!(candidate.matched_identifiers[0].id_type, "email");
        assert!(candidate.confidence_score.is_none());
    }

    #[test]
    fn test_candidate_missing_identifiers_defaults_empty() {
        let json = r#"{"sourceName": "s", "category": "mention"}"#;
        let candidate: CandidateFinding = serde_json::from_str(json).unwrap();
        assert!(candidate.matched_identifiers.is_empty());
    }

    #[tokio::test]
    async fn test_replay_lookup_keyed_by_value() {
        let source = ReplayEvidenceSource::new().with_capture(
            "a@example.com",
            vec![CandidateFinding {
                source_name: "dump".to_string(),
                category: FindingCategory::Breach,
                matched_identifiers: vec![MatchedIdentifier::new("email", "a@example.com")],
                confidence_score: None,
                severity: None,
                risk_level: None,
                risk_score: Some(70.0),
                content_verbatim: None,
                source_url: None,
            }],
        );

        let profile = ProfileId::new("p1");
        let hit = source
            .lookup(&profile, &make_identifier("a@example.com"))
            .await
            .unwrap();
        assert_eq!(hit.len(), 1);

        let miss = source
            .lookup(&profile, &make_identifier("b@example.com"))
            .await
            .unwrap();
        assert!(miss.is_empty());
    }

    #[test]
    fn test_load_skips_malformed_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.json");
        std::fs::write(
            &path,
            r#"{
                "a@example.com": [
                    {"sourceName": "dump", "category": "breach", "riskScore": 50},
                    {"category": "not-a-category"}
                ]
            }"#,
        )
        .unwrap();

        let source = ReplayEvidenceSource::load(&path).unwrap();
        assert_eq!(source.captures["a@example.com"].len(), 1);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            EvidenceError::Timeout { seconds: 10 }.kind(),
            ErrorKind::Timeout
        );
        assert_eq!(
            EvidenceError::Unconfigured("no api key".to_string()).kind(),
            ErrorKind::Unconfigured
        );
    }
}
