//! Service entry points.
//!
//! Thin boundary in front of the engine: authenticates the caller, validates
//! parameters, dispatches to the runner and store, and keeps the
//! `{error, status}` failure contract via `ApiFailure`.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

use crate::error::{Result, WatchError};
use crate::evidence::CandidateFinding;
use crate::finding::{FindingId, FindingStatus, ProfileId, ValidatedFinding};
use crate::scan::{PersistOutcome, ScanReport, ScanRunner};
use crate::scoring::RiskProfile;
use crate::store::FindingStore;

/// Authenticated caller context. Every entry point takes one explicitly.
#[derive(Debug, Clone)]
pub enum Caller {
    Anonymous,
    /// End user limited to their own profiles.
    User {
        actor: String,
        profiles: HashSet<ProfileId>,
    },
    /// Backend jobs with access to every profile.
    System { actor: String },
}

impl Caller {
    pub fn user(actor: impl Into<String>, profiles: impl IntoIterator<Item = ProfileId>) -> Self {
        Caller::User {
            actor: actor.into(),
            profiles: profiles.into_iter().collect(),
        }
    }

    pub fn system(actor: impl Into<String>) -> Self {
        Caller::System {
            actor: actor.into(),
        }
    }

    pub fn actor(&self) -> &str {
        match self {
            Caller::Anonymous => "anonymous",
            Caller::User { actor, .. } | Caller::System { actor } => actor,
        }
    }

    fn require_authenticated(&self) -> Result<()> {
        match self {
            Caller::Anonymous => Err(WatchError::Unauthorized),
            _ => Ok(()),
        }
    }

    fn authorize(&self, profile: &ProfileId) -> Result<()> {
        match self {
            Caller::Anonymous => Err(WatchError::Unauthorized),
            Caller::System { .. } => Ok(()),
            Caller::User { profiles, .. } => {
                if profiles.contains(profile) {
                    Ok(())
                } else {
                    Err(WatchError::Forbidden(profile.to_string()))
                }
            }
        }
    }
}

/// The engine's RPC-style facade.
pub struct MonitorService {
    runner: Arc<ScanRunner>,
    store: Arc<FindingStore>,
}

impl MonitorService {
    pub fn new(runner: Arc<ScanRunner>, store: Arc<FindingStore>) -> Self {
        Self { runner, store }
    }

    pub async fn run_scan(&self, caller: &Caller, profile: &ProfileId) -> Result<ScanReport> {
        self.check_profile_access(caller, profile)?;
        info!(actor = caller.actor(), profile = %profile, "run_scan");
        self.runner.run(profile).await
    }

    pub fn validate_and_persist(
        &self,
        caller: &Caller,
        profile: &ProfileId,
        candidates: &[CandidateFinding],
    ) -> Result<PersistOutcome> {
        self.check_profile_access(caller, profile)?;
        info!(
            actor = caller.actor(),
            profile = %profile,
            candidates = candidates.len(),
            "validate_and_persist"
        );
        Ok(self.runner.validate_and_persist(profile, candidates))
    }

    pub fn get_risk(&self, caller: &Caller, profile: &ProfileId) -> Result<RiskProfile> {
        self.check_profile_access(caller, profile)?;
        let findings = self.store.list_by_profile(profile)?;
        Ok(RiskProfile::from_findings(&findings))
    }

    pub fn transition_status(
        &self,
        caller: &Caller,
        finding_id: &FindingId,
        new_status: FindingStatus,
        expected_version: Option<u64>,
    ) -> Result<ValidatedFinding> {
        caller.require_authenticated()?;
        let finding = self.store.get(finding_id)?;
        caller.authorize(&finding.profile_id)?;
        self.store
            .transition(finding_id, new_status, caller.actor(), expected_version)
    }

    /// Permanent removal, the user-facing "dismiss" / "clear failed" action.
    pub fn dismiss_finding(&self, caller: &Caller, finding_id: &FindingId) -> Result<()> {
        caller.require_authenticated()?;
        let finding = self.store.get(finding_id)?;
        caller.authorize(&finding.profile_id)?;
        info!(actor = caller.actor(), finding = %finding_id, "dismiss_finding");
        self.store.delete(finding_id)
    }

    fn check_profile_access(&self, caller: &Caller, profile: &ProfileId) -> Result<()> {
        caller.require_authenticated()?;
        if profile.is_empty() {
            return Err(WatchError::InvalidRequest(
                "profile_id must not be empty".to_string(),
            ));
        }
        caller.authorize(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::error::ErrorKind;
    use crate::evidence::{MatchedIdentifier, ReplayEvidenceSource};
    use crate::finding::FindingCategory;
    use crate::notify::MemoryEmitter;
    use crate::vault::{IdentifierType, MemoryVaultStore, VaultIdentifier};

    fn make_service() -> (MonitorService, Arc<MemoryEmitter>) {
        let vault = Arc::new(MemoryVaultStore::new());
        vault
            .insert(VaultIdentifier {
                id: "v-1".to_string(),
                profile_id: ProfileId::new("p1"),
                data_type: IdentifierType::Email,
                value: "a@example.com".to_string(),
                monitoring_enabled: true,
            })
            .unwrap();
        let evidence = Arc::new(ReplayEvidenceSource::new());
        let emitter = Arc::new(MemoryEmitter::new());
        let store = Arc::new(FindingStore::new(emitter.clone()));
        let runner = Arc::new(ScanRunner::new(
            vault,
            evidence,
            store.clone(),
            EngineConfig::default(),
        ));
        (MonitorService::new(runner, store), emitter)
    }

    fn breach_candidate(risk_score: f64) -> CandidateFinding {
        CandidateFinding {
            source_name: "dump".to_string(),
            category: FindingCategory::Breach,
            matched_identifiers: vec![MatchedIdentifier::new("email", "a@example.com")],
            confidence_score: None,
            severity: None,
            risk_level: None,
            risk_score: Some(risk_score),
            content_verbatim: None,
            source_url: None,
        }
    }

    fn owner() -> Caller {
        Caller::user("jane", [ProfileId::new("p1")])
    }

    #[tokio::test]
    async fn test_anonymous_is_unauthorized_everywhere() {
        let (service, _) = make_service();
        let caller = Caller::Anonymous;
        let profile = ProfileId::new("p1");

        let err = service.run_scan(&caller, &profile).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(err.status(), 401);

        let err = service.get_risk(&caller, &profile).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        let err = service
            .transition_status(
                &caller,
                &FindingId::new("f1"),
                FindingStatus::Monitoring,
                None,
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn test_user_cannot_touch_foreign_profile() {
        let (service, _) = make_service();
        let caller = Caller::user("mallory", [ProfileId::new("p2")]);
        let err = service.get_risk(&caller, &ProfileId::new("p1")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(err.status(), 403);
    }

    #[test]
    fn test_empty_profile_is_invalid_request() {
        let (service, _) = make_service();
        let err = service
            .get_risk(&Caller::system("job"), &ProfileId::new(""))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn test_validate_and_persist_partitions() {
        let (service, emitter) = make_service();
        let profile = ProfileId::new("p1");
        let name_only = CandidateFinding {
            source_name: "search-site".to_string(),
            category: FindingCategory::Exposure,
            matched_identifiers: vec![MatchedIdentifier::new("full_name", "Jane Doe")],
            confidence_score: None,
            severity: None,
            risk_level: None,
            risk_score: None,
            content_verbatim: None,
            source_url: None,
        };

        let outcome = service
            .validate_and_persist(&owner(), &profile, &[breach_candidate(90.0), name_only])
            .unwrap();
        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(emitter.count(), 1);
    }

    #[test]
    fn test_get_risk_reflects_persisted_findings() {
        let (service, _) = make_service();
        let profile = ProfileId::new("p1");
        service
            .validate_and_persist(&owner(), &profile, &[breach_candidate(80.0)])
            .unwrap();

        let risk = service.get_risk(&owner(), &profile).unwrap();
        assert_eq!(risk.overall, 32);
        assert_eq!(risk.critical_count, 1);
    }

    #[test]
    fn test_transition_authorized_through_finding_profile() {
        let (service, _) = make_service();
        let profile = ProfileId::new("p1");
        let outcome = service
            .validate_and_persist(&owner(), &profile, &[breach_candidate(50.0)])
            .unwrap();
        let id = outcome.accepted[0].id.clone();

        let stranger = Caller::user("mallory", [ProfileId::new("p2")]);
        let err = service
            .transition_status(&stranger, &id, FindingStatus::Monitoring, None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let updated = service
            .transition_status(&owner(), &id, FindingStatus::Monitoring, Some(0))
            .unwrap();
        assert_eq!(updated.status, FindingStatus::Monitoring);
        assert_eq!(updated.version, 1);
    }

    #[test]
    fn test_transition_failures_map_to_conflict() {
        let (service, _) = make_service();
        let profile = ProfileId::new("p1");
        let outcome = service
            .validate_and_persist(&owner(), &profile, &[breach_candidate(50.0)])
            .unwrap();
        let id = outcome.accepted[0].id.clone();

        let err = service
            .transition_status(&owner(), &id, FindingStatus::Completed, None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.status(), 409);

        let err = service
            .transition_status(&owner(), &id, FindingStatus::Monitoring, Some(7))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_unknown_finding_is_not_found() {
        let (service, _) = make_service();
        let err = service
            .transition_status(
                &Caller::system("job"),
                &FindingId::new("ghost"),
                FindingStatus::Monitoring,
                None,
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.status(), 404);
    }

    #[test]
    fn test_dismiss_removes_finding() {
        let (service, _) = make_service();
        let profile = ProfileId::new("p1");
        let outcome = service
            .validate_and_persist(&owner(), &profile, &[breach_candidate(50.0)])
            .unwrap();
        let id = outcome.accepted[0].id.clone();

        service.dismiss_finding(&owner(), &id).unwrap();
        let err = service
            .transition_status(&owner(), &id, FindingStatus::Monitoring, None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_system_caller_can_scan_any_profile() {
        let (service, _) = make_service();
        let report = service
            .run_scan(&Caller::system("scheduler"), &ProfileId::new("p1"))
            .await
            .unwrap();
        assert_eq!(report.identifiers_scanned, 1);
    }
}
