use async_trait::async_trait;
use chrono::NaiveDate;

use crate::plan::{Plan, StudyRequest, generate};

use super::{PlanRunner, RunError};

/// Calls the generator directly on the current task.
#[derive(Debug, Default, Clone, Copy)]
pub struct InProcessRunner;

impl InProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PlanRunner for InProcessRunner {
    fn name(&self) -> &str {
        "in_process"
    }

    async fn run(
        &self,
        request: &StudyRequest,
        reference_date: NaiveDate,
    ) -> Result<Plan, RunError> {
        Ok(generate(request, reference_date)?)
    }
}
