//! Deploy gating.
//!
//! Turns the worst-case budget tier into an allow/warn/block decision,
//! persists decisions for audit, and handles the override path. Evaluation
//! failures fail closed: the gate blocks rather than allowing a deploy it
//! cannot judge.

use crate::budget::calculator::BudgetCalculator;
use crate::budget::status::BudgetTier;
use crate::core::clock::Clock;
use crate::core::error::{Error, Result};
use crate::gate::decision::{
    DecisionId, DeployDecision, GateOutcome, GateStatus, OverrideRecord,
};
use crate::gate::policy::{DeployType, GatePolicy, OverrideRole};
use crate::store::backend::EvaluatorStore;
use std::sync::Arc;
use tracing::{info, warn};

struct Evaluation {
    status: GateStatus,
    reason: String,
    worst_tier: Option<BudgetTier>,
    can_override: bool,
    required_role: Option<OverrideRole>,
}

/// Gates deploys on error-budget status.
pub struct DeployGate {
    calculator: Arc<BudgetCalculator>,
    store: Arc<dyn EvaluatorStore>,
    policy: GatePolicy,
    clock: Arc<dyn Clock>,
}

impl DeployGate {
    /// Create a gate.
    pub fn new(
        calculator: Arc<BudgetCalculator>,
        store: Arc<dyn EvaluatorStore>,
        policy: GatePolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            calculator,
            store,
            policy,
            clock,
        }
    }

    async fn evaluate(&self, deploy_type: DeployType) -> Evaluation {
        if deploy_type.bypasses_gating() {
            return Evaluation {
                status: GateStatus::Allowed,
                reason: format!("{} deploys bypass error-budget gating", deploy_type),
                worst_tier: None,
                can_override: false,
                required_role: None,
            };
        }

        let report = match self.calculator.calculate_all().await {
            Ok(report) => report,
            Err(err) => {
                warn!(%deploy_type, error = %err, "gate failing closed");
                return Evaluation {
                    status: GateStatus::Blocked,
                    reason: format!("evaluation unavailable: {}", err),
                    worst_tier: None,
                    can_override: false,
                    required_role: None,
                };
            }
        };

        if !report.failures.is_empty() {
            let slugs: Vec<&str> = report.failures.iter().map(|f| f.slo_slug.as_str()).collect();
            warn!(%deploy_type, failed = ?slugs, "gate failing closed on partial evaluation");
            return Evaluation {
                status: GateStatus::Blocked,
                reason: format!("evaluation unavailable for: {}", slugs.join(", ")),
                worst_tier: None,
                can_override: false,
                required_role: None,
            };
        }

        let blocking: Vec<_> = report
            .statuses
            .iter()
            .filter(|s| s.tier.is_blocking())
            .collect();
        if !blocking.is_empty() {
            let worst = blocking.iter().map(|s| s.tier).max().unwrap_or(BudgetTier::Critical);
            let slugs: Vec<&str> = blocking.iter().map(|s| s.slo_slug.as_str()).collect();
            let required_role = self.policy.required_role(worst);
            return Evaluation {
                status: GateStatus::Blocked,
                reason: format!("error budget {} for: {}", worst, slugs.join(", ")),
                worst_tier: Some(worst),
                can_override: required_role.is_some(),
                required_role,
            };
        }

        let warnings: Vec<&str> = report
            .statuses
            .iter()
            .filter(|s| s.tier == BudgetTier::Warning)
            .map(|s| s.slo_slug.as_str())
            .collect();
        if !warnings.is_empty() {
            return Evaluation {
                status: GateStatus::AllowedWithWarning,
                reason: format!("error budget warning for: {}", warnings.join(", ")),
                worst_tier: report.worst_tier(),
                can_override: false,
                required_role: None,
            };
        }

        Evaluation {
            status: GateStatus::Allowed,
            reason: "all error budgets healthy".to_string(),
            worst_tier: report.worst_tier(),
            can_override: false,
            required_role: None,
        }
    }

    /// Check whether a deploy may proceed right now, without recording.
    pub async fn can_deploy(&self, deploy_type: DeployType) -> GateOutcome {
        let eval = self.evaluate(deploy_type).await;
        info!(%deploy_type, status = %eval.status, reason = %eval.reason, "gate check");
        GateOutcome {
            allowed: eval.status.allows(),
            status: eval.status,
            reason: eval.reason,
            can_override: eval.can_override,
            override_level: eval.required_role,
            decision_id: None,
        }
    }

    /// Run the gate check and persist the decision for audit.
    ///
    /// The persisted record is content-hashed and chained to the previous
    /// decision in the log.
    pub async fn record_decision(
        &self,
        deploy_id: &str,
        deploy_type: DeployType,
        deploy_name: &str,
    ) -> Result<DeployDecision> {
        let eval = self.evaluate(deploy_type).await;

        let mut decision = DeployDecision::new(deploy_id, deploy_type, deploy_name)
            .with_outcome(eval.status, &eval.reason)
            .with_override_policy(eval.can_override, eval.required_role);
        if let Some(tier) = eval.worst_tier {
            decision = decision.with_worst_tier(tier);
        }
        if let Some(parent) = self.store.last_decision_id().await? {
            decision = decision.with_parent(parent);
        }
        decision.timestamp = self.clock.now();
        decision.compute_hash();

        self.store.append_decision(decision.clone()).await?;
        info!(
            decision = %decision.id,
            %deploy_type,
            status = %decision.status,
            "recorded deploy decision"
        );
        Ok(decision)
    }

    /// Override a blocked decision.
    ///
    /// Fails with [`Error::NotBlocked`] unless the decision is in the
    /// blocked state, and with [`Error::UnauthorizedRole`] when the role is
    /// below what the blocking tier demands. Evaluation-unavailable blocks
    /// are never overridable.
    pub async fn record_override(
        &self,
        decision_id: &DecisionId,
        overridden_by: &str,
        reason: &str,
        role: OverrideRole,
    ) -> Result<DeployDecision> {
        let mut decision = self
            .store
            .get_decision(decision_id)
            .await?
            .ok_or_else(|| Error::UnknownDecision(decision_id.to_string()))?;

        if decision.status != GateStatus::Blocked {
            return Err(Error::NotBlocked(format!(
                "decision {} is {}",
                decision.id, decision.status
            )));
        }
        let required = match (decision.can_override, decision.required_role) {
            (true, Some(required)) => required,
            _ => {
                return Err(Error::UnauthorizedRole(format!(
                    "decision {} is not overridable",
                    decision.id
                )));
            }
        };
        if role < required {
            return Err(Error::UnauthorizedRole(format!(
                "{} requires {} or above, got {}",
                decision.id, required, role
            )));
        }

        decision.apply_override(OverrideRecord {
            overridden_by: overridden_by.to_string(),
            reason: reason.to_string(),
            role,
            timestamp: self.clock.now(),
        })?;
        self.store.update_decision(decision.clone()).await?;
        info!(decision = %decision.id, by = %overridden_by, %role, "decision overridden");
        Ok(decision)
    }

    /// Read a persisted decision.
    pub async fn decision(&self, id: &DecisionId) -> Result<Option<DeployDecision>> {
        self.store.get_decision(id).await
    }
}
