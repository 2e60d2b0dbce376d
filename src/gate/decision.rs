//! Deploy decision records.
//!
//! Append-only audit log of gate checks. Each persisted decision carries a
//! content hash and may chain to the previous decision. The only permitted
//! mutation is the blocked-to-overridden transition.

use crate::budget::status::BudgetTier;
use crate::core::error::{Error, Result};
use crate::core::types::{now, ContentHash, Timestamp};
use crate::gate::policy::{DeployType, OverrideRole};
use serde::{Deserialize, Serialize};

/// Unique decision identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecisionId(pub String);

impl DecisionId {
    /// Wrap an existing ID.
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }

    /// Generate a unique ID.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get the ID string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DecisionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of a gate check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateStatus {
    /// Deploy may proceed.
    Allowed,
    /// Deploy may proceed but budget is degraded.
    AllowedWithWarning,
    /// Deploy is blocked.
    Blocked,
    /// A blocked decision was overridden; effectively allowed.
    Overridden,
}

impl GateStatus {
    /// Whether the deploy may proceed.
    pub fn allows(&self) -> bool {
        !matches!(self, GateStatus::Blocked)
    }

    /// Process exit code consumed by CI/CD.
    ///
    /// 0 = allowed (including overridden), 1 = blocked, 2 = allowed with
    /// warning.
    pub fn exit_code(&self) -> i32 {
        match self {
            GateStatus::Allowed | GateStatus::Overridden => 0,
            GateStatus::Blocked => 1,
            GateStatus::AllowedWithWarning => 2,
        }
    }
}

impl std::fmt::Display for GateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateStatus::Allowed => write!(f, "ALLOWED"),
            GateStatus::AllowedWithWarning => write!(f, "ALLOWED_WITH_WARNING"),
            GateStatus::Blocked => write!(f, "BLOCKED"),
            GateStatus::Overridden => write!(f, "OVERRIDDEN"),
        }
    }
}

/// Metadata attached when a blocked decision is overridden.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OverrideRecord {
    /// Who authorized the override
    pub overridden_by: String,
    /// Why
    pub reason: String,
    /// Authorizing role
    pub role: OverrideRole,
    /// When
    pub timestamp: Timestamp,
}

/// A persisted gate decision.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeployDecision {
    /// Generated decision ID
    pub id: DecisionId,
    /// Caller-supplied deploy identifier
    pub deploy_id: String,
    /// Deploy type
    pub deploy_type: DeployType,
    /// Human-readable deploy name
    pub deploy_name: String,
    /// Outcome at decision time
    pub status: GateStatus,
    /// Reason for the outcome
    pub reason: String,
    /// Worst budget tier observed, if evaluation ran
    pub worst_tier: Option<BudgetTier>,
    /// Whether the decision can be overridden
    pub can_override: bool,
    /// Minimum role an override requires
    pub required_role: Option<OverrideRole>,
    /// Override metadata, once applied
    pub override_record: Option<OverrideRecord>,
    /// Decision timestamp
    pub timestamp: Timestamp,
    /// Content hash for audit verification
    pub hash: Option<ContentHash>,
    /// Previous decision in the log
    pub parent_id: Option<DecisionId>,
}

impl DeployDecision {
    /// Create a decision record with a generated ID.
    pub fn new(deploy_id: &str, deploy_type: DeployType, deploy_name: &str) -> Self {
        Self {
            id: DecisionId::generate(),
            deploy_id: deploy_id.to_string(),
            deploy_type,
            deploy_name: deploy_name.to_string(),
            status: GateStatus::Allowed,
            reason: String::new(),
            worst_tier: None,
            can_override: false,
            required_role: None,
            override_record: None,
            timestamp: now(),
            hash: None,
            parent_id: None,
        }
    }

    /// Set the evaluated outcome.
    pub fn with_outcome(mut self, status: GateStatus, reason: &str) -> Self {
        self.status = status;
        self.reason = reason.to_string();
        self
    }

    /// Set the worst observed tier.
    pub fn with_worst_tier(mut self, tier: BudgetTier) -> Self {
        self.worst_tier = Some(tier);
        self
    }

    /// Set override availability.
    pub fn with_override_policy(mut self, can_override: bool, role: Option<OverrideRole>) -> Self {
        self.can_override = can_override;
        self.required_role = role;
        self
    }

    /// Chain to the previous decision.
    pub fn with_parent(mut self, parent_id: DecisionId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    fn hash_input(&self) -> String {
        let override_actor = self
            .override_record
            .as_ref()
            .map(|o| o.overridden_by.as_str())
            .unwrap_or("");
        format!(
            "{}:{}:{}:{}:{}:{}:{}",
            self.id, self.deploy_id, self.deploy_type, self.status, self.reason, self.timestamp,
            override_actor
        )
    }

    /// Compute and set the content hash.
    pub fn compute_hash(&mut self) -> ContentHash {
        let hash = ContentHash::of(&[self.hash_input().as_bytes()]);
        self.hash = Some(hash.clone());
        hash
    }

    /// Verify the stored content hash.
    pub fn verify_hash(&self) -> bool {
        match &self.hash {
            Some(stored) => &ContentHash::of(&[self.hash_input().as_bytes()]) == stored,
            None => false,
        }
    }

    /// Transition a blocked decision to overridden.
    ///
    /// Fails with [`Error::NotBlocked`] in any other state. Role
    /// authorization is the gate's responsibility; this only enforces the
    /// state machine.
    pub fn apply_override(&mut self, record: OverrideRecord) -> Result<()> {
        if self.status != GateStatus::Blocked {
            return Err(Error::NotBlocked(format!(
                "decision {} is {}",
                self.id, self.status
            )));
        }
        self.status = GateStatus::Overridden;
        self.override_record = Some(record);
        self.compute_hash();
        Ok(())
    }
}

/// Result returned to gate callers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GateOutcome {
    /// Whether the deploy may proceed
    pub allowed: bool,
    /// Outcome status
    pub status: GateStatus,
    /// Reason for the outcome
    pub reason: String,
    /// Whether a block can be overridden
    pub can_override: bool,
    /// Minimum role an override requires
    pub override_level: Option<OverrideRole>,
    /// Persisted decision ID, when the check was recorded
    pub decision_id: Option<DecisionId>,
}

impl GateOutcome {
    /// Process exit code consumed by CI/CD.
    pub fn exit_code(&self) -> i32 {
        self.status.exit_code()
    }
}
