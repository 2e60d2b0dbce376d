//! Gate Module
//!
//! Deploy gating on error-budget status:
//! - Deploy types and override roles
//! - Persisted, content-hashed decision log
//! - Allow/warn/block evaluation with an override path

pub mod decision;
pub mod deploy_gate;
pub mod policy;

pub use decision::{DecisionId, DeployDecision, GateOutcome, GateStatus, OverrideRecord};
pub use deploy_gate::DeployGate;
pub use policy::{DeployType, GatePolicy, OverrideRole};
