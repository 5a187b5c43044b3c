//! Plan generation: turns a [`StudyRequest`] into a dated [`Plan`].
//!
//! Pure logic; the reference date is passed in rather than read from the
//! clock, so the same inputs always give the same plan.
//!
//! For each subject, in the order supplied:
//! 1. Every weak topic gets a session on the reference date, two hours when
//!    its level is above 3 and one hour otherwise. A topic already planned
//!    for that subject has its duration overwritten.
//! 2. If the exam is at least one day away, a three-hour `Review` session
//!    goes two days before the exam, unless that subject already has one
//!    there.
//!
//! Any level that is not an integer or exam date that is not `YYYY-MM-DD`
//! fails the whole request.

use chrono::NaiveDate;
use thiserror::Error;
use tracing::debug;

use super::request::StudyRequest;
use super::schedule::{MergeOutcome, Plan, date_key};
use super::session::{Session, SessionDuration};

/// Days before the exam on which the review session is placed.
pub const REVIEW_LEAD_DAYS: i64 = 2;

/// Errors that abort plan generation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("Error processing weakness level for {subject:?}/{topic:?}: {reason}")]
    InvalidWeaknessLevel {
        subject: String,
        topic: String,
        reason: String,
    },

    #[error("Error parsing exam date for {subject:?}: {reason}")]
    InvalidExamDate { subject: String, reason: String },
}

/// Generate a study plan for `request` as seen from `reference_date`.
pub fn generate(request: &StudyRequest, reference_date: NaiveDate) -> Result<Plan, GenerationError> {
    let today = date_key(reference_date);
    let mut plan = Plan::new();

    for subject in &request.subjects {
        let exam_date = match request.exams.get(subject) {
            Some(raw) => raw
                .resolve()
                .map_err(|reason| GenerationError::InvalidExamDate {
                    subject: subject.clone(),
                    reason,
                })?,
            None => None,
        };

        let mut sessions = Vec::new();
        if let Some(topics) = request.weaknesses.get(subject) {
            for (topic, level) in topics.iter() {
                let level =
                    level
                        .to_level()
                        .map_err(|reason| GenerationError::InvalidWeaknessLevel {
                            subject: subject.clone(),
                            topic: topic.to_owned(),
                            reason,
                        })?;
                sessions.push(Session::new(
                    subject.as_str(),
                    topic,
                    SessionDuration::for_level(level),
                ));
            }
        }

        plan.ensure_day(&today);
        for session in sessions {
            let topic = session.topic.clone();
            if plan.merge_session(&today, session) == MergeOutcome::Updated {
                debug!(subject = %subject, topic = %topic, "session duration overwritten");
            }
        }

        if let Some(exam_date) = exam_date {
            let days_until_exam = (exam_date - reference_date).num_days();
            if days_until_exam > 0 {
                let review_date = date_key(exam_date - chrono::Duration::days(REVIEW_LEAD_DAYS));
                let inserted = plan.insert_review(&review_date, Session::review(subject.as_str()));
                debug!(
                    subject = %subject,
                    review_date = %review_date,
                    inserted,
                    "review session"
                );
            }
        }
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::request::WeaknessLevel;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn empty_subjects_give_empty_plan() {
        let plan = generate(&StudyRequest::default(), date("2024-01-01")).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn subject_without_weaknesses_still_opens_the_day() {
        let req = StudyRequest::new(["Math"]);
        let plan = generate(&req, date("2024-01-01")).unwrap();
        assert_eq!(plan.sessions_on("2024-01-01"), Some(&[][..]));
    }

    #[test]
    fn weaknesses_for_unlisted_subjects_are_ignored() {
        let req = StudyRequest::new(["Math"]).with_weakness("History", "Dates", 5);
        let plan = generate(&req, date("2024-01-01")).unwrap();
        assert_eq!(plan.session_count(), 0);
    }

    #[test]
    fn exam_today_or_past_adds_no_review() {
        let req = StudyRequest::new(["Math", "Bio"])
            .with_exam("Math", "2024-01-01")
            .with_exam("Bio", "2023-12-01");
        let plan = generate(&req, date("2024-01-01")).unwrap();
        assert_eq!(plan.session_count(), 0);
        assert_eq!(plan.dates().count(), 1);
    }

    #[test]
    fn review_lands_two_days_before_exam() {
        let req = StudyRequest::new(["Math"]).with_exam("Math", "2024-01-20");
        let plan = generate(&req, date("2024-01-01")).unwrap();
        let review = plan.sessions_on("2024-01-18").expect("review day");
        assert_eq!(review, &[Session::review("Math")]);
    }

    #[test]
    fn bad_level_reports_subject_and_topic() {
        let req = StudyRequest::new(["Math"]).with_weakness(
            "Math",
            "Algebra",
            WeaknessLevel(serde_json::json!("lots")),
        );
        let err = generate(&req, date("2024-01-01")).unwrap_err();
        match err {
            GenerationError::InvalidWeaknessLevel { subject, topic, .. } => {
                assert_eq!(subject, "Math");
                assert_eq!(topic, "Algebra");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn error_message_names_the_value() {
        let req = StudyRequest::new(["Math"]).with_exam("Math", "next week");
        let err = generate(&req, date("2024-01-01")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Error parsing exam date"), "got: {msg}");
        assert!(msg.contains("next week"), "got: {msg}");
    }
}
