//! The JSON result envelope returned to callers.
//!
//! Success is `{"status": "success", "plan": {...}}`; failure is
//! `{"error": "..."}`.

use serde::{Deserialize, Serialize};

use super::schedule::Plan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeStatus {
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlanEnvelope {
    Success { status: EnvelopeStatus, plan: Plan },
    Failure { error: String },
}

impl PlanEnvelope {
    pub fn success(plan: Plan) -> Self {
        Self::Success {
            status: EnvelopeStatus::Success,
            plan,
        }
    }

    pub fn failure(error: impl ToString) -> Self {
        Self::Failure {
            error: error.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Split into the plan or the reported error message.
    pub fn into_result(self) -> Result<Plan, String> {
        match self {
            Self::Success { plan, .. } => Ok(plan),
            Self::Failure { error } => Err(error),
        }
    }
}

impl<E: ToString> From<Result<Plan, E>> for PlanEnvelope {
    fn from(result: Result<Plan, E>) -> Self {
        match result {
            Ok(plan) => Self::success(plan),
            Err(e) => Self::failure(e),
        }
    }
}
