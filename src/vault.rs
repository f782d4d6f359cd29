//! Vault of monitored identifiers, keyed by profile.
//!
//! The vault holds no business logic: storage, per-profile listing, and the
//! `monitoring_enabled` flag the scan runner filters on.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::RwLock;

use crate::error::{Result, WatchError};
use crate::finding::ProfileId;

/// Kind of personal data a vault entry protects. Immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierType {
    Email,
    Phone,
    Ssn,
    Address,
    FullName,
    Alias,
    Username,
    Employer,
    DateOfBirth,
}

impl IdentifierType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierType::Email => "email",
            IdentifierType::Phone => "phone",
            IdentifierType::Ssn => "ssn",
            IdentifierType::Address => "address",
            IdentifierType::FullName => "full_name",
            IdentifierType::Alias => "alias",
            IdentifierType::Username => "username",
            IdentifierType::Employer => "employer",
            IdentifierType::DateOfBirth => "date_of_birth",
        }
    }
}

impl fmt::Display for IdentifierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One monitored identifier, belonging to exactly one profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultIdentifier {
    pub id: String,
    pub profile_id: ProfileId,
    pub data_type: IdentifierType,
    pub value: String,
    #[serde(default = "default_monitoring")]
    pub monitoring_enabled: bool,
}

fn default_monitoring() -> bool {
    true
}

/// Read access to the vault. The scan runner applies the monitoring filter.
pub trait VaultStore: Send + Sync {
    fn list(&self, profile: &ProfileId) -> Result<Vec<VaultIdentifier>>;
}

/// In-memory vault supporting concurrent readers; seeded in code or from a
/// JSON snapshot file.
#[derive(Debug, Default)]
pub struct MemoryVaultStore {
    entries: RwLock<HashMap<ProfileId, Vec<VaultIdentifier>>>,
}

impl MemoryVaultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a vault from a JSON snapshot (an array of identifiers).
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| WatchError::SnapshotRead {
            path: path.display().to_string(),
            source: e,
        })?;
        let identifiers: Vec<VaultIdentifier> = serde_json::from_str(&content)?;
        let store = Self::new();
        for identifier in identifiers {
            store.insert(identifier)?;
        }
        Ok(store)
    }

    pub fn insert(&self, identifier: VaultIdentifier) -> Result<()> {
        if identifier.value.is_empty() {
            return Err(WatchError::InvalidRequest(
                "identifier value must not be empty".to_string(),
            ));
        }
        let mut entries = self
            .entries
            .write()
            .map_err(|_| WatchError::Internal("vault lock poisoned".to_string()))?;
        entries
            .entry(identifier.profile_id.clone())
            .or_default()
            .push(identifier);
        Ok(())
    }

    pub fn profile_count(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }
}

impl VaultStore for MemoryVaultStore {
    fn list(&self, profile: &ProfileId) -> Result<Vec<VaultIdentifier>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| WatchError::VaultUnavailable {
                profile: profile.to_string(),
                message: "vault lock poisoned".to_string(),
            })?;
        Ok(entries.get(profile).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_identifier(profile: &str, data_type: IdentifierType, value: &str) -> VaultIdentifier {
        VaultIdentifier {
            id: format!("v-{value}"),
            profile_id: ProfileId::new(profile),
            data_type,
            value: value.to_string(),
            monitoring_enabled: true,
        }
    }

    #[test]
    fn test_insert_and_list_scoped_by_profile() {
        let store = MemoryVaultStore::new();
        store
            .insert(make_identifier("p1", IdentifierType::Email, "a@example.com"))
            .unwrap();
        store
            .insert(make_identifier("p1", IdentifierType::Phone, "5550100"))
            .unwrap();
        store
            .insert(make_identifier("p2", IdentifierType::Email, "b@example.com"))
            .unwrap();

        let p1 = store.list(&ProfileId::new("p1")).unwrap();
        assert_eq!(p1.len(), 2);
        let p2 = store.list(&ProfileId::new("p2")).unwrap();
        assert_eq!(p2.len(), 1);
        assert_eq!(p2[0].value, "b@example.com");
    }

    #[test]
    fn test_list_unknown_profile_is_empty() {
        let store = MemoryVaultStore::new();
        let listed = store.list(&ProfileId::new("nobody")).unwrap();
        assert!(listed.is_empty());
    }

    #[test]
    fn test_insert_rejects_empty_value() {
        let store = MemoryVaultStore::new();
        let result = store.insert(make_identifier("p1", IdentifierType::Email, ""));
        assert!(result.is_err());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault.json");
        let identifiers = vec![
            make_identifier("p1", IdentifierType::Email, "a@example.com"),
            make_identifier("p1", IdentifierType::FullName, "Jane Doe"),
        ];
        std::fs::write(&path, serde_json::to_string_pretty(&identifiers).unwrap()).unwrap();

        let store = MemoryVaultStore::load(&path).unwrap();
        let listed = store.list(&ProfileId::new("p1")).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[1].data_type, IdentifierType::FullName);
    }

    #[test]
    fn test_identifier_wire_shape() {
        let identifier = make_identifier("p1", IdentifierType::FullName, "Jane Doe");
        let json = serde_json::to_value(&identifier).unwrap();
        assert_eq!(json["dataType"], "full_name");
        assert_eq!(json["profileId"], "p1");
        assert_eq!(json["monitoringEnabled"], true);
    }

    #[test]
    fn test_monitoring_flag_defaults_on() {
        let json = r#"{"id": "v1", "profileId": "p1", "dataType": "email", "value": "a@b.c"}"#;
        let identifier: VaultIdentifier = serde_json::from_str(json).unwrap();
        assert!(identifier.monitoring_enabled);
    }
}
