//! Study request types and decoding of submitted request bodies.
//!
//! Weakness levels and exam dates are kept as the raw JSON the caller sent.
//! They are only interpreted during generation, where a bad value fails the
//! whole request (see [`crate::plan::generate`]).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ordered::OrderedMap;
use super::schedule::DATE_FORMAT;

/// User identifier recorded when a submission does not name one.
pub const ANONYMOUS_USER: &str = "anonymous";

/// A weakness level as submitted. Expected to hold an integer 1-5, but any
/// JSON value is accepted here and coerced by [`WeaknessLevel::to_level`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeaknessLevel(pub serde_json::Value);

impl WeaknessLevel {
    /// Coerce to an integer level.
    ///
    /// Integers pass through, finite floats truncate toward zero, booleans
    /// become 0 or 1, and strings are trimmed and parsed as base-10
    /// integers. Anything else is rejected with a short reason.
    pub fn to_level(&self) -> Result<i64, String> {
        use serde_json::Value;

        match &self.0 {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(i)
                } else if n.is_u64() {
                    Err(format!("{n} is out of range"))
                } else {
                    let f = n.as_f64().unwrap_or(f64::NAN);
                    // `i64::MAX as f64` rounds up to 2^63, hence the half-open range.
                    if (i64::MIN as f64..i64::MAX as f64).contains(&f) {
                        Ok(f.trunc() as i64)
                    } else {
                        Err(format!("{n} cannot be converted to an integer"))
                    }
                }
            }
            Value::Bool(b) => Ok(i64::from(*b)),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|e| format!("invalid integer {s:?}: {e}")),
            Value::Null => Err("expected an integer, got null".to_owned()),
            Value::Array(_) => Err("expected an integer, got an array".to_owned()),
            Value::Object(_) => Err("expected an integer, got an object".to_owned()),
        }
    }
}

impl From<i64> for WeaknessLevel {
    fn from(level: i64) -> Self {
        Self(serde_json::Value::from(level))
    }
}

/// An exam date as submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExamDate(pub serde_json::Value);

impl ExamDate {
    /// Parse the date.
    ///
    /// Empty values mean "no exam": `null`, `""`, `0`, `false`, `[]` and
    /// `{}`. Other strings must be `YYYY-MM-DD`; any other value is an
    /// error.
    pub fn resolve(&self) -> Result<Option<NaiveDate>, String> {
        use serde_json::Value;

        match &self.0 {
            Value::String(s) if !s.is_empty() => NaiveDate::parse_from_str(s, DATE_FORMAT)
                .map(Some)
                .map_err(|e| format!("{s:?} does not match YYYY-MM-DD: {e}")),
            other if is_empty_value(other) => Ok(None),
            other => Err(format!("expected a YYYY-MM-DD string, got {other}")),
        }
    }
}

fn is_empty_value(value: &serde_json::Value) -> bool {
    use serde_json::Value;

    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

impl From<&str> for ExamDate {
    fn from(date: &str) -> Self {
        Self(serde_json::Value::from(date))
    }
}

/// Input to plan generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudyRequest {
    /// Subject names in the order they are processed.
    pub subjects: Vec<String>,
    /// Subject -> topic -> weakness level.
    #[serde(default)]
    pub weaknesses: OrderedMap<OrderedMap<WeaknessLevel>>,
    /// Subject -> exam date.
    #[serde(default)]
    pub exams: OrderedMap<ExamDate>,
}

impl StudyRequest {
    pub fn new(subjects: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            subjects: subjects.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Add (or replace) a weakness level for `subject`/`topic`.
    pub fn with_weakness(
        mut self,
        subject: &str,
        topic: &str,
        level: impl Into<WeaknessLevel>,
    ) -> Self {
        self.weaknesses
            .entry_or_default(subject)
            .insert(topic, level.into());
        self
    }

    pub fn with_exam(mut self, subject: &str, date: impl Into<ExamDate>) -> Self {
        self.exams.insert(subject, date.into());
        self
    }
}

/// Errors from decoding a submitted request body.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("No data received")]
    EmptyBody,

    #[error("Invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("Missing subjects")]
    MissingSubjects,

    #[error("Invalid request field: {0}")]
    InvalidField(#[source] serde_json::Error),
}

/// The wire shape of a plan submission. `exam_dates` is accepted as an
/// alternative to `exams`, and `cleanedWeaknesses` as an alternative to
/// `weaknesses`.
#[derive(Debug, Deserialize)]
struct SubmissionBody {
    subjects: Vec<String>,
    #[serde(default, alias = "cleanedWeaknesses")]
    weaknesses: Option<OrderedMap<OrderedMap<WeaknessLevel>>>,
    #[serde(default)]
    exams: Option<OrderedMap<ExamDate>>,
    #[serde(default)]
    exam_dates: Option<OrderedMap<ExamDate>>,
    #[serde(default)]
    user_id: Option<String>,
}

/// A decoded submission: who asked, and what to generate.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub user_id: String,
    pub request: StudyRequest,
}

/// Decode a raw request body.
///
/// Rejects an empty body, text that is not JSON, a document without a
/// `subjects` key, and fields of the wrong shape.
pub fn parse_submission(body: &str) -> Result<Submission, InputError> {
    if body.trim().is_empty() {
        return Err(InputError::EmptyBody);
    }

    let value: serde_json::Value = serde_json::from_str(body).map_err(InputError::InvalidJson)?;
    if value.get("subjects").is_none() {
        return Err(InputError::MissingSubjects);
    }

    let raw: SubmissionBody = serde_json::from_value(value).map_err(InputError::InvalidField)?;
    let exams = raw.exams.or(raw.exam_dates).unwrap_or_default();

    Ok(Submission {
        user_id: raw.user_id.unwrap_or_else(|| ANONYMOUS_USER.to_owned()),
        request: StudyRequest {
            subjects: raw.subjects,
            weaknesses: raw.weaknesses.unwrap_or_default(),
            exams,
        },
    })
}
