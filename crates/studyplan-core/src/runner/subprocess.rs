//! Runs generation in a short-lived child process.
//!
//! Contract with the child:
//! - argv: `<program> [args...] --date YYYY-MM-DD`
//! - stdin: the request as JSON, then EOF
//! - stdout: a [`PlanEnvelope`] as JSON
//! - exit status 0 on success, nonzero on failure
//!
//! `studyplan generate` honors this contract.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::plan::{Plan, PlanEnvelope, StudyRequest, date_key};

use super::{PlanRunner, RunError, TransportError};

/// Default wall-clock limit for one child run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct SubprocessRunner {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl SubprocessRunner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Arguments placed before `--date`.
    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl PlanRunner for SubprocessRunner {
    fn name(&self) -> &str {
        "subprocess"
    }

    async fn run(
        &self,
        request: &StudyRequest,
        reference_date: NaiveDate,
    ) -> Result<Plan, RunError> {
        let input = serde_json::to_vec(request).map_err(TransportError::Encode)?;

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg("--date")
            .arg(date_key(reference_date))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| TransportError::Spawn {
            program: self.program.display().to_string(),
            source,
        })?;
        debug!(program = %self.program.display(), pid = ?child.id(), "plan generator spawned");

        // The write runs alongside the wait so that a child that stops
        // reading stdin cannot stall the caller past the timeout. Dropping
        // the future on timeout drops the child, and kill_on_drop ends it.
        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                tolerate_closed_stdin(stdin.write_all(&input).await)?;
                tolerate_closed_stdin(stdin.shutdown().await)?;
            }
            Ok::<_, std::io::Error>(())
        };
        let exchange = async move { tokio::try_join!(feed, child.wait_with_output()) };
        let (_, output) = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| TransportError::TimedOut {
                after: self.timeout,
            })?
            .map_err(TransportError::Io)?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !stderr.trim().is_empty() {
            debug!(stderr = %stderr.trim(), "plan generator stderr");
        }

        match serde_json::from_str::<PlanEnvelope>(stdout.trim()) {
            Ok(PlanEnvelope::Success { plan, .. }) if output.status.success() => Ok(plan),
            Ok(PlanEnvelope::Failure { error }) => Err(RunError::Generation(error)),
            Ok(PlanEnvelope::Success { .. }) => {
                warn!(status = %output.status, "plan generator reported success but exited nonzero");
                Err(TransportError::Exited {
                    status: output.status.to_string(),
                    stderr,
                }
                .into())
            }
            Err(_) if !output.status.success() => Err(TransportError::Exited {
                status: output.status.to_string(),
                stderr,
            }
            .into()),
            Err(source) => Err(TransportError::InvalidOutput { source, stdout }.into()),
        }
    }
}

/// A child may exit, or close stdin, before taking the whole request. Its
/// exit status and stdout still decide the outcome.
fn tolerate_closed_stdin(result: std::io::Result<()>) -> std::io::Result<()> {
    match result {
        Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
            debug!("plan generator closed stdin before reading the whole request");
            Ok(())
        }
        other => other,
    }
}
