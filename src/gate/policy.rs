//! Deploy gate policy.
//!
//! Maps deploy types to gating behavior and budget tiers to the role
//! required to override a block.

use crate::budget::status::BudgetTier;
use crate::core::error::Error;
use serde::{Deserialize, Serialize};

/// Kind of deployment being gated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeployType {
    /// Emergency fix; bypasses budget gating.
    Hotfix,
    /// Revert to a known-good state; bypasses budget gating.
    Rollback,
    /// Feature change; fully gated.
    Feature,
    /// Infrastructure change; fully gated.
    Infrastructure,
}

impl DeployType {
    /// Whether this deploy type bypasses budget gating entirely.
    pub fn bypasses_gating(&self) -> bool {
        matches!(self, DeployType::Hotfix | DeployType::Rollback)
    }
}

impl std::fmt::Display for DeployType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeployType::Hotfix => write!(f, "hotfix"),
            DeployType::Rollback => write!(f, "rollback"),
            DeployType::Feature => write!(f, "feature"),
            DeployType::Infrastructure => write!(f, "infrastructure"),
        }
    }
}

impl std::str::FromStr for DeployType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hotfix" => Ok(DeployType::Hotfix),
            "rollback" => Ok(DeployType::Rollback),
            "feature" => Ok(DeployType::Feature),
            "infrastructure" => Ok(DeployType::Infrastructure),
            other => Err(Error::Internal(format!("unknown deploy type: {}", other))),
        }
    }
}

/// Roles that may authorize an override, in ascending authority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OverrideRole {
    Engineer,
    TeamLead,
    Director,
    Executive,
}

impl std::fmt::Display for OverrideRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverrideRole::Engineer => write!(f, "engineer"),
            OverrideRole::TeamLead => write!(f, "team_lead"),
            OverrideRole::Director => write!(f, "director"),
            OverrideRole::Executive => write!(f, "executive"),
        }
    }
}

/// Gate policy: which role a blocking tier demands for an override.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatePolicy {
    /// Role required to override a block caused by a critical budget
    pub critical_override_role: OverrideRole,
    /// Role required to override a block caused by an exhausted budget
    pub exhausted_override_role: OverrideRole,
}

impl GatePolicy {
    /// Role required to override a block caused by `tier`.
    ///
    /// Returns `None` when the tier does not produce overridable blocks.
    pub fn required_role(&self, tier: BudgetTier) -> Option<OverrideRole> {
        match tier {
            BudgetTier::Critical => Some(self.critical_override_role),
            BudgetTier::Exhausted => Some(self.exhausted_override_role),
            _ => None,
        }
    }

    /// Whether `role` may override a block caused by `tier`.
    pub fn authorizes(&self, role: OverrideRole, tier: BudgetTier) -> bool {
        match self.required_role(tier) {
            Some(required) => role >= required,
            None => false,
        }
    }
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            critical_override_role: OverrideRole::TeamLead,
            exhausted_override_role: OverrideRole::Director,
        }
    }
}
