//! Notification alerts and emitter sinks.
//!
//! Alerts are produced synchronously when a high or critical finding is
//! persisted. Messages carry masked identifier values only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::finding::{FindingCategory, ProfileId, Severity, ValidatedFinding};
use crate::redact::mask_labeled;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    BreachDetected,
    ExposureDetected,
    ImpersonationDetected,
    MentionDetected,
}

impl AlertType {
    pub fn for_category(category: FindingCategory) -> Self {
        match category {
            FindingCategory::Breach => AlertType::BreachDetected,
            FindingCategory::Exposure => AlertType::ExposureDetected,
            FindingCategory::Impersonation => AlertType::ImpersonationDetected,
            FindingCategory::Mention => AlertType::MentionDetected,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::BreachDetected => "breach_detected",
            AlertType::ExposureDetected => "exposure_detected",
            AlertType::ImpersonationDetected => "impersonation_detected",
            AlertType::MentionDetected => "mention_detected",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Wire shape of an alert. `is_read` is always false at emission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationAlert {
    pub id: String,
    pub profile_id: ProfileId,
    pub alert_type: AlertType,
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub is_read: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub threat_indicators: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl NotificationAlert {
    /// Build the alert for a newly persisted finding. Identifier values are
    /// masked before they enter the title, message, or indicators.
    pub fn for_finding(finding: &ValidatedFinding) -> Self {
        let category = finding.category();
        let indicators: Vec<String> = finding
            .matched_identifiers
            .iter()
            .map(|id| mask_labeled(&id.id_type, &id.value))
            .collect();
        let matched = if indicators.is_empty() {
            "your monitored information".to_string()
        } else {
            indicators.join(", ")
        };

        let (title, message) = match category {
            FindingCategory::Breach => (
                "Data breach detected".to_string(),
                format!(
                    "{} appeared in the {} breach.",
                    matched, finding.source_name
                ),
            ),
            FindingCategory::Exposure => (
                "Personal data exposed".to_string(),
                format!(
                    "A listing on {} matches {}.",
                    finding.source_name, matched
                ),
            ),
            FindingCategory::Impersonation => (
                "Possible impersonation detected".to_string(),
                format!(
                    "A profile on {} appears to impersonate you ({}).",
                    finding.source_name, matched
                ),
            ),
            FindingCategory::Mention => (
                "You were mentioned".to_string(),
                format!("{} was mentioned on {}.", matched, finding.source_name),
            ),
        };

        Self {
            id: Uuid::new_v4().to_string(),
            profile_id: finding.profile_id.clone(),
            alert_type: AlertType::for_category(category),
            title,
            message,
            severity: finding.resolved_severity(),
            is_read: false,
            action_url: finding.source_url.clone(),
            threat_indicators: indicators,
            created_at: Utc::now(),
        }
    }
}

/// Sink for alerts. Emission is synchronous and must not fail the caller.
pub trait NotificationEmitter: Send + Sync {
    fn emit(&self, alert: NotificationAlert);
}

/// Collects alerts in memory for inspection.
#[derive(Debug, Default)]
pub struct MemoryEmitter {
    alerts: Mutex<Vec<NotificationAlert>>,
}

impl MemoryEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emitted(&self) -> Vec<NotificationAlert> {
        self.alerts.lock().map(|a| a.clone()).unwrap_or_default()
    }

    pub fn count(&self) -> usize {
        self.alerts.lock().map(|a| a.len()).unwrap_or(0)
    }
}

impl NotificationEmitter for MemoryEmitter {
    fn emit(&self, alert: NotificationAlert) {
        if let Ok(mut alerts) = self.alerts.lock() {
            alerts.push(alert);
        }
    }
}

/// Writes alerts to the log stream.
#[derive(Debug, Default)]
pub struct LogEmitter;

impl NotificationEmitter for LogEmitter {
    fn emit(&self, alert: NotificationAlert) {
        info!(
            profile = %alert.profile_id,
            alert_type = %alert.alert_type,
            severity = %alert.severity,
            title = %alert.title,
            "Alert emitted"
        );
    }
}
