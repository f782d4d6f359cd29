//! Finding lifecycle: the allowed-transition table and the deletion request
//! companion entity.
//!
//! Breach and exposure findings walk the remediation machine; impersonation
//! and mention findings walk the simpler review machine. Terminal statuses
//! are exactly those with no outgoing edges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::finding::{FindingCategory, FindingId, FindingStatus, ProfileId};

/// Statuses reachable in one step from `from`, for the given category.
pub fn allowed_transitions(
    category: FindingCategory,
    from: FindingStatus,
) -> &'static [FindingStatus] {
    use FindingStatus::*;

    if category.is_remediable() {
        match from {
            New => &[Monitoring, Ignored, RemovalRequested],
            Monitoring => &[RemovalRequested, Ignored],
            RemovalRequested => &[Completed, Failed],
            _ => &[],
        }
    } else {
        match from {
            New => &[Reviewed, Dismissed],
            _ => &[],
        }
    }
}

pub fn can_transition(category: FindingCategory, from: FindingStatus, to: FindingStatus) -> bool {
    allowed_transitions(category, from).contains(&to)
}

/// A status with no outgoing edges. Nothing ever leaves a terminal status.
pub fn is_terminal(category: FindingCategory, status: FindingStatus) -> bool {
    allowed_transitions(category, status).is_empty()
}

/// Remediation state of a deletion request. The engine only ever creates
/// `pending`; the remediation executor owns the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionStatus {
    Pending,
    Completed,
    Failed,
}

/// Companion entity created when a finding enters `removal_requested`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionRequest {
    pub profile_id: ProfileId,
    pub finding_id: FindingId,
    pub status: DeletionStatus,
    pub request_date: DateTime<Utc>,
}

impl DeletionRequest {
    pub fn pending(profile_id: ProfileId, finding_id: FindingId) -> Self {
        Self {
            profile_id,
            finding_id,
            status: DeletionStatus::Pending,
            request_date: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use FindingCategory::*;
    use FindingStatus::*;

    #[test]
    fn test_remediation_machine_edges() {
        assert!(can_transition(Breach, New, Monitoring));
        assert!(can_transition(Breach, New, Ignored));
        assert!(can_transition(Breach, New, RemovalRequested));
        assert!(can_transition(Breach, Monitoring, RemovalRequested));
        assert!(can_transition(Breach, Monitoring, Ignored));
        assert!(can_transition(Exposure, RemovalRequested, Completed));
        assert!(can_transition(Exposure, RemovalRequested, Failed));
    }

    #[test]
    fn test_remediation_machine_rejects_off_table_edges() {
        assert!(!can_transition(Breach, New, Completed));
        assert!(!can_transition(Breach, New, Failed));
        assert!(!can_transition(Breach, Monitoring, Completed));
        assert!(!can_transition(Breach, Completed, Monitoring));
        assert!(!can_transition(Breach, Ignored, New));
        assert!(!can_transition(Breach, Failed, RemovalRequested));
        assert!(!can_transition(Breach, New, Reviewed));
    }

    #[test]
    fn test_review_machine_edges() {
        assert!(can_transition(Impersonation, New, Reviewed));
        assert!(can_transition(Impersonation, New, Dismissed));
        assert!(can_transition(Mention, New, Reviewed));
        assert!(can_transition(Mention, New, Dismissed));
    }

    #[test]
    fn test_review_machine_rejects_remediation_edges() {
        assert!(!can_transition(Impersonation, New, Monitoring));
        assert!(!can_transition(Impersonation, New, RemovalRequested));
        assert!(!can_transition(Mention, Reviewed, Dismissed));
        assert!(!can_transition(Mention, Dismissed, New));
    }

    #[test]
    fn test_terminal_statuses() {
        for status in [Ignored, Completed, Failed, Dismissed] {
            assert!(is_terminal(Breach, status), "{status} should be terminal");
        }
        for status in [New, Monitoring, RemovalRequested] {
            assert!(!is_terminal(Breach, status), "{status} should not be terminal");
        }
        assert!(is_terminal(Impersonation, Reviewed));
        assert!(is_terminal(Impersonation, Dismissed));
        assert!(!is_terminal(Impersonation, New));
    }

    #[test]
    fn test_deletion_request_starts_pending() {
        let request = DeletionRequest::pending(ProfileId::new("p1"), FindingId::new("f1"));
        assert_eq!(request.status, DeletionStatus::Pending);
        assert_eq!(request.finding_id.as_str(), "f1");

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["profileId"], "p1");
        assert!(json["requestDate"].is_string());
    }
}
