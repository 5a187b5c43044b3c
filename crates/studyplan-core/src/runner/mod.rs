//! Runners: the call boundary between a caller and plan generation.
//!
//! A [`PlanRunner`] takes a [`StudyRequest`] and a reference date and hands
//! back a [`Plan`] or a typed failure. Two implementations exist:
//!
//! ```text
//! caller --run(request, date)--> &dyn PlanRunner
//!                                    |
//!            +-----------------------+------------------------+
//!            |                                                |
//!     InProcessRunner                                 SubprocessRunner
//!     generate(request, date)            spawn `<program> [args] --date D`
//!                                        request JSON -> stdin
//!                                        stdout -> PlanEnvelope
//!                                        nonzero exit = failure
//! ```
//!
//! Either way, a rejected request comes back as [`RunError::Generation`]
//! and a broken boundary as [`RunError::Transport`]; the caller never sees a
//! panic or a partial plan.

pub mod in_process;
pub mod subprocess;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::plan::{GenerationError, Plan, StudyRequest};

pub use in_process::InProcessRunner;
pub use subprocess::SubprocessRunner;

/// Failures of the boundary itself, as opposed to a rejected request.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to start plan generator {program:?}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("I/O error talking to plan generator: {0}")]
    Io(#[source] std::io::Error),

    #[error("plan generator timed out after {after:?}")]
    TimedOut { after: std::time::Duration },

    #[error("plan generator exited with {status}: {stderr}")]
    Exited { status: String, stderr: String },

    #[error("invalid response from plan generator: {source}")]
    InvalidOutput {
        #[source]
        source: serde_json::Error,
        stdout: String,
    },
}

/// Why a run produced no plan.
#[derive(Debug, Error)]
pub enum RunError {
    /// Generation rejected the request; the message names the bad value.
    #[error("{0}")]
    Generation(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl From<GenerationError> for RunError {
    fn from(err: GenerationError) -> Self {
        Self::Generation(err.to_string())
    }
}

/// Executes plan generation on behalf of a caller.
#[async_trait]
pub trait PlanRunner: Send + Sync {
    /// Short name for logs (e.g. "in_process").
    fn name(&self) -> &str;

    /// Generate a plan for `request` as seen from `reference_date`.
    async fn run(&self, request: &StudyRequest, reference_date: NaiveDate)
    -> Result<Plan, RunError>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn PlanRunner) {}
};

/// Which runner a deployment uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunnerKind {
    #[default]
    InProcess,
    Subprocess,
}

impl fmt::Display for RunnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InProcess => "in_process",
            Self::Subprocess => "subprocess",
        };
        f.write_str(s)
    }
}

impl FromStr for RunnerKind {
    type Err = RunnerKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_process" => Ok(Self::InProcess),
            "subprocess" => Ok(Self::Subprocess),
            other => Err(RunnerKindParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`RunnerKind`] string.
#[derive(Debug, Clone)]
pub struct RunnerKindParseError(pub String);

impl fmt::Display for RunnerKindParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid runner kind: {:?} (expected in_process or subprocess)",
            self.0
        )
    }
}

impl std::error::Error for RunnerKindParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runner_kind_display_roundtrip() {
        for kind in [RunnerKind::InProcess, RunnerKind::Subprocess] {
            let parsed: RunnerKind = kind.to_string().parse().expect("should parse");
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn runner_kind_invalid() {
        let err = "docker".parse::<RunnerKind>().unwrap_err();
        assert!(err.to_string().contains("docker"));
    }

    #[test]
    fn generation_error_converts_to_message() {
        let err = GenerationError::InvalidExamDate {
            subject: "Math".into(),
            reason: "bad".into(),
        };
        let run_err = RunError::from(err.clone());
        assert_eq!(run_err.to_string(), err.to_string());
    }
}
