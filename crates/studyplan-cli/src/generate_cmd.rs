//! `studyplan generate`: the process-boundary entry point.
//!
//! Reads one request document from a file or stdin and writes exactly one
//! envelope to stdout. The exit status mirrors the envelope: 0 for
//! success, 1 for `{"error": ...}`.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use tracing::{debug, warn};

use studyplan_core::plan::{PlanEnvelope, generate, parse_submission};

/// Turn a raw request body into the envelope to report.
pub fn envelope_for(body: &str, reference_date: NaiveDate) -> PlanEnvelope {
    let submission = match parse_submission(body) {
        Ok(submission) => submission,
        Err(e) => return PlanEnvelope::failure(e),
    };
    debug!(
        subjects = submission.request.subjects.len(),
        %reference_date,
        "generating plan"
    );
    generate(&submission.request, reference_date).into()
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read request file {}", path.display())),
        _ => {
            let mut body = String::new();
            std::io::stdin()
                .read_to_string(&mut body)
                .context("failed to read request from stdin")?;
            Ok(body)
        }
    }
}

/// Run the command. Returns whether a plan was produced.
pub fn run_generate(file: Option<&Path>, date: Option<NaiveDate>) -> bool {
    let reference_date = date.unwrap_or_else(|| Local::now().date_naive());
    let envelope = match read_input(file) {
        Ok(body) => envelope_for(&body, reference_date),
        Err(e) => PlanEnvelope::failure(format!("{e:#}")),
    };

    if let PlanEnvelope::Failure { error } = &envelope {
        warn!("plan generation failed: {error}");
    }

    match serde_json::to_string(&envelope) {
        Ok(json) => {
            println!("{json}");
            envelope.is_success()
        }
        Err(e) => {
            println!("{}", serde_json::json!({ "error": e.to_string() }));
            false
        }
    }
}
