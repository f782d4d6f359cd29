//! Scan pipeline: vault load, bounded-concurrency evidence lookups,
//! validation, and persistence.
//!
//! Per-identifier failures are isolated: a timeout or backend error costs
//! that identifier's results and nothing else. Only a vault load failure
//! aborts the scan.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{Result, WatchError};
use crate::evidence::{CandidateFinding, EvidenceError, EvidenceSource};
use crate::finding::{ProfileId, ValidatedFinding};
use crate::redact::mask_labeled;
use crate::scoring::RiskProfile;
use crate::store::FindingStore;
use crate::validator::{MatchValidator, RejectReason, Validation};
use crate::vault::{VaultIdentifier, VaultStore};

/// Summary of one scan run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub profile_id: ProfileId,
    pub identifiers_scanned: usize,
    pub candidates_seen: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub lookup_failures: usize,
    pub elapsed_ms: u64,
    /// Findings persisted by this run.
    pub findings: Vec<ValidatedFinding>,
    /// Consolidated risk over all of the profile's findings after this run.
    pub risk: RiskProfile,
}

impl ScanReport {
    pub fn has_alerting_findings(&self) -> bool {
        self.findings
            .iter()
            .any(|f| f.resolved_severity().is_alerting())
    }
}

/// Outcome of validating and persisting a candidate batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistOutcome {
    pub accepted: Vec<ValidatedFinding>,
    pub rejected: Vec<RejectReason>,
}

/// Drives the full pipeline for one profile at a time.
pub struct ScanRunner {
    vault: Arc<dyn VaultStore>,
    evidence: Arc<dyn EvidenceSource>,
    store: Arc<FindingStore>,
    validator: MatchValidator,
    config: EngineConfig,
    in_flight: Mutex<HashSet<ProfileId>>,
}

impl ScanRunner {
    pub fn new(
        vault: Arc<dyn VaultStore>,
        evidence: Arc<dyn EvidenceSource>,
        store: Arc<FindingStore>,
        config: EngineConfig,
    ) -> Self {
        let validator = MatchValidator::new().with_min_confidence(config.min_confidence);
        Self {
            vault,
            evidence,
            store,
            validator,
            config,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn store(&self) -> &FindingStore {
        &self.store
    }

    /// Run one scan. A second concurrent run for the same profile fails fast
    /// with a conflict instead of producing duplicate findings.
    pub async fn run(&self, profile: &ProfileId) -> Result<ScanReport> {
        let _guard = self.acquire_scan_slot(profile)?;
        let started = Instant::now();

        let identifiers: Vec<VaultIdentifier> = self
            .vault
            .list(profile)?
            .into_iter()
            .filter(|id| id.monitoring_enabled)
            .collect();

        info!(
            profile = %profile,
            identifiers = identifiers.len(),
            source = self.evidence.name(),
            "Starting scan"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_lookups));
        let timeout = Duration::from_secs(self.config.lookup_timeout_secs);

        let lookups = identifiers.iter().map(|identifier| {
            let semaphore = Arc::clone(&semaphore);
            let evidence = Arc::clone(&self.evidence);
            let profile = profile.clone();
            let identifier = identifier.clone();
            async move {
                let permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (
                            identifier,
                            Err(EvidenceError::Backend {
                                source_name: evidence.name().to_string(),
                                message: "lookup pool closed".to_string(),
                            }),
                        );
                    }
                };
                let outcome =
                    match tokio::time::timeout(timeout, evidence.lookup(&profile, &identifier))
                        .await
                    {
                        Ok(result) => result,
                        Err(_) => Err(EvidenceError::Timeout {
                            seconds: timeout.as_secs(),
                        }),
                    };
                drop(permit);
                (identifier, outcome)
            }
        });
        let outcomes = join_all(lookups).await;

        let mut report = ScanReport {
            profile_id: profile.clone(),
            identifiers_scanned: identifiers.len(),
            candidates_seen: 0,
            accepted: 0,
            rejected: 0,
            lookup_failures: 0,
            elapsed_ms: 0,
            findings: Vec::new(),
            risk: RiskProfile::from_findings(&[]),
        };

        for (identifier, outcome) in outcomes {
            let masked = mask_labeled(identifier.data_type.as_str(), &identifier.value);
            match outcome {
                Ok(candidates) => {
                    debug!(identifier = %masked, candidates = candidates.len(), "Lookup complete");
                    report.candidates_seen += candidates.len();
                    let persisted = self.validate_and_persist(profile, &candidates);
                    report.accepted += persisted.accepted.len();
                    report.rejected += persisted.rejected.len();
                    report.findings.extend(persisted.accepted);
                }
                Err(e) => {
                    warn!(identifier = %masked, error = %e, "Lookup failed, skipping identifier");
                    report.lookup_failures += 1;
                }
            }
        }

        report.risk = RiskProfile::from_findings(&self.store.list_by_profile(profile)?);
        report.elapsed_ms = started.elapsed().as_millis() as u64;

        info!(
            profile = %profile,
            accepted = report.accepted,
            rejected = report.rejected,
            failures = report.lookup_failures,
            overall_risk = report.risk.overall,
            elapsed_ms = report.elapsed_ms,
            "Scan complete"
        );
        Ok(report)
    }

    /// Validate a candidate batch and persist what passes. A write failure
    /// costs that finding only.
    pub fn validate_and_persist(
        &self,
        profile: &ProfileId,
        candidates: &[CandidateFinding],
    ) -> PersistOutcome {
        let mut outcome = PersistOutcome {
            accepted: Vec::new(),
            rejected: Vec::new(),
        };
        for candidate in candidates {
            match self.validator.validate(candidate) {
                Validation::Accepted(draft) => match self.store.create(profile, draft) {
                    Ok(finding) => outcome.accepted.push(finding),
                    Err(e) => {
                        warn!(
                            profile = %profile,
                            source = %candidate.source_name,
                            error = %e,
                            "Failed to persist finding, continuing"
                        );
                    }
                },
                Validation::Rejected(reason) => outcome.rejected.push(reason),
            }
        }
        outcome
    }

    fn acquire_scan_slot(&self, profile: &ProfileId) -> Result<ScanSlot<'_>> {
        let mut in_flight = self
            .in_flight
            .lock()
            .map_err(|_| WatchError::Internal("scan guard lock poisoned".to_string()))?;
        if !in_flight.insert(profile.clone()) {
            return Err(WatchError::ScanInFlight(profile.to_string()));
        }
        Ok(ScanSlot {
            runner: self,
            profile: profile.clone(),
        })
    }
}

/// Releases the per-profile scan slot on drop, error paths included.
struct ScanSlot<'a> {
    runner: &'a ScanRunner,
    profile: ProfileId,
}

impl Drop for ScanSlot<'_> {
    fn drop(&mut self) {
        if let Ok(mut in_flight) = self.runner.in_flight.lock() {
            in_flight.remove(&self.profile);
        }
    }
}
