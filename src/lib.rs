pub mod cli;
pub mod config;
pub mod error;
pub mod evidence;
pub mod finding;
pub mod lifecycle;
pub mod notify;
pub mod redact;
pub mod report;
pub mod scan;
pub mod scoring;
pub mod service;
pub mod store;
pub mod validator;
pub mod vault;

pub use cli::{Cli, OutputFormat};
pub use config::EngineConfig;
pub use error::{ApiFailure, ErrorKind, Result, WatchError};
pub use evidence::{
    CandidateFinding, EvidenceError, EvidenceSource, MatchedIdentifier, ReplayEvidenceSource,
};
pub use finding::{
    FindingCategory, FindingDraft, FindingId, FindingKind, FindingStatus, ProfileId, Severity,
    SeverityLabel, ValidatedFinding,
};
pub use lifecycle::{DeletionRequest, DeletionStatus, allowed_transitions, can_transition};
pub use notify::{AlertType, LogEmitter, MemoryEmitter, NotificationAlert, NotificationEmitter};
pub use report::{JsonReporter, Reporter, TerminalReporter};
pub use scan::{PersistOutcome, ScanReport, ScanRunner};
pub use scoring::{CategoryScore, RiskLevel, RiskProfile};
pub use service::{Caller, MonitorService};
pub use store::FindingStore;
pub use validator::{MatchValidator, RejectReason, Validation};
pub use vault::{IdentifierType, MemoryVaultStore, VaultIdentifier, VaultStore};
