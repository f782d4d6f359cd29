//! Finding repository: persistence, lifecycle enforcement, and alert
//! emission.
//!
//! The store owns the canonical copy of every finding. Status and version are
//! the only mutable fields, and they change only through `transition`. The
//! companion deletion request for a `removal_requested` transition is written
//! in the same critical section as the status change.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Result, WatchError};
use crate::finding::{
    FindingDraft, FindingId, FindingStatus, ProfileId, ValidatedFinding,
};
use crate::lifecycle::{can_transition, DeletionRequest};
use crate::notify::{NotificationAlert, NotificationEmitter};

const SNAPSHOT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Default)]
struct StoreInner {
    findings: HashMap<FindingId, ValidatedFinding>,
    deletion_requests: Vec<DeletionRequest>,
}

/// Serialized form of the store state.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreSnapshot {
    version: String,
    saved_at: String,
    findings: Vec<ValidatedFinding>,
    deletion_requests: Vec<DeletionRequest>,
}

pub struct FindingStore {
    inner: RwLock<StoreInner>,
    emitter: Arc<dyn NotificationEmitter>,
}

impl FindingStore {
    pub fn new(emitter: Arc<dyn NotificationEmitter>) -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
            emitter,
        }
    }

    /// Persist an accepted draft with `status = new`, `version = 0`.
    ///
    /// If the finding's own severity resolves high or critical, exactly one
    /// alert is emitted synchronously before this returns. Emission happens
    /// outside the write lock so emitters may read the store.
    pub fn create(&self, profile: &ProfileId, draft: FindingDraft) -> Result<ValidatedFinding> {
        let finding = ValidatedFinding {
            id: FindingId::new(Uuid::new_v4().to_string()),
            profile_id: profile.clone(),
            kind: draft.kind,
            matched_identifiers: draft.matched_identifiers,
            source_name: draft.source_name,
            source_url: draft.source_url,
            content_verbatim: draft.content_verbatim,
            status: FindingStatus::New,
            created_at: Utc::now(),
            version: 0,
        };

        {
            let mut inner = self.write_inner()?;
            inner.findings.insert(finding.id.clone(), finding.clone());
        }
        debug!(
            profile = %profile,
            finding = %finding.id,
            category = %finding.category(),
            severity = %finding.resolved_severity(),
            "Finding created"
        );

        if finding.resolved_severity().is_alerting() {
            self.emitter.emit(NotificationAlert::for_finding(&finding));
        }
        Ok(finding)
    }

    pub fn get(&self, id: &FindingId) -> Result<ValidatedFinding> {
        let inner = self.read_inner()?;
        inner
            .findings
            .get(id)
            .cloned()
            .ok_or_else(|| WatchError::FindingNotFound(id.to_string()))
    }

    /// Point-in-time snapshot of a profile's findings, ordered by creation
    /// time.
    pub fn list_by_profile(&self, profile: &ProfileId) -> Result<Vec<ValidatedFinding>> {
        let inner = self.read_inner()?;
        let mut findings: Vec<ValidatedFinding> = inner
            .findings
            .values()
            .filter(|f| &f.profile_id == profile)
            .cloned()
            .collect();
        findings.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(findings)
    }

    /// Move a finding along the lifecycle table.
    ///
    /// `expected_version: None` preserves last-write-wins compatibility;
    /// `Some(v)` fails with a version conflict on mismatch. A transition into
    /// `removal_requested` appends the pending deletion request under the
    /// same write lock, so the pair is atomic to every reader.
    pub fn transition(
        &self,
        id: &FindingId,
        new_status: FindingStatus,
        actor: &str,
        expected_version: Option<u64>,
    ) -> Result<ValidatedFinding> {
        let updated = {
            let mut inner = self.write_inner()?;
            let finding = inner
                .findings
                .get_mut(id)
                .ok_or_else(|| WatchError::FindingNotFound(id.to_string()))?;

            if let Some(expected) = expected_version {
                if finding.version != expected {
                    return Err(WatchError::VersionConflict {
                        expected,
                        actual: finding.version,
                    });
                }
            }

            let category = finding.category();
            if !can_transition(category, finding.status, new_status) {
                return Err(WatchError::InvalidTransition {
                    category: category.as_str().to_string(),
                    from: finding.status.as_str().to_string(),
                    to: new_status.as_str().to_string(),
                });
            }

            finding.status = new_status;
            finding.version += 1;
            let updated = finding.clone();

            if new_status == FindingStatus::RemovalRequested {
                let request =
                    DeletionRequest::pending(updated.profile_id.clone(), updated.id.clone());
                inner.deletion_requests.push(request);
            }
            updated
        };

        info!(
            finding = %updated.id,
            status = %updated.status,
            version = updated.version,
            actor,
            "Finding transitioned"
        );
        Ok(updated)
    }

    /// Permanently remove a finding and any deletion requests tied to it.
    pub fn delete(&self, id: &FindingId) -> Result<()> {
        let mut inner = self.write_inner()?;
        if inner.findings.remove(id).is_none() {
            return Err(WatchError::FindingNotFound(id.to_string()));
        }
        inner.deletion_requests.retain(|r| &r.finding_id != id);
        Ok(())
    }

    pub fn deletion_requests_for(&self, profile: &ProfileId) -> Result<Vec<DeletionRequest>> {
        let inner = self.read_inner()?;
        Ok(inner
            .deletion_requests
            .iter()
            .filter(|r| &r.profile_id == profile)
            .cloned()
            .collect())
    }

    pub fn deletion_requests_for_finding(&self, id: &FindingId) -> Result<Vec<DeletionRequest>> {
        let inner = self.read_inner()?;
        Ok(inner
            .deletion_requests
            .iter()
            .filter(|r| &r.finding_id == id)
            .cloned()
            .collect())
    }

    pub fn len(&self) -> usize {
        self.read_inner().map(|i| i.findings.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write the full store state as a pretty JSON snapshot.
    pub fn save(&self, path: &Path) -> Result<()> {
        let snapshot = {
            let inner = self.read_inner()?;
            let mut findings: Vec<ValidatedFinding> = inner.findings.values().cloned().collect();
            findings.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            StoreSnapshot {
                version: SNAPSHOT_VERSION.to_string(),
                saved_at: Utc::now().to_rfc3339(),
                findings,
                deletion_requests: inner.deletion_requests.clone(),
            }
        };
        let json = serde_json::to_string_pretty(&snapshot)?;
        std::fs::write(path, json).map_err(|e| WatchError::SnapshotWrite {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(())
    }

    /// Rebuild a store from a snapshot file.
    pub fn load(path: &Path, emitter: Arc<dyn NotificationEmitter>) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| WatchError::SnapshotRead {
            path: path.display().to_string(),
            source: e,
        })?;
        let snapshot: StoreSnapshot = serde_json::from_str(&content)?;

        let store = Self::new(emitter);
        {
            let mut inner = store.write_inner()?;
            for finding in snapshot.findings {
                inner.findings.insert(finding.id.clone(), finding);
            }
            inner.deletion_requests = snapshot.deletion_requests;
        }
        info!(path = %path.display(), findings = store.len(), "Store snapshot loaded");
        Ok(store)
    }

    fn read_inner(&self) -> Result<std::sync::RwLockReadGuard<'_, StoreInner>> {
        self.inner
            .read()
            .map_err(|_| WatchError::Internal("finding store lock poisoned".to_string()))
    }

    fn write_inner(&self) -> Result<std::sync::RwLockWriteGuard<'_, StoreInner>> {
        self.inner
            .write()
            .map_err(|_| WatchError::Internal("finding store lock poisoned".to_string()))
    }
}
