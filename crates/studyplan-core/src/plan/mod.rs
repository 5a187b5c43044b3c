//! Study plans: request types, session merge rules, generation, envelope.

pub mod envelope;
pub mod generate;
pub mod ordered;
pub mod request;
pub mod schedule;
pub mod session;

pub use envelope::PlanEnvelope;
pub use generate::{GenerationError, REVIEW_LEAD_DAYS, generate};
pub use ordered::OrderedMap;
pub use request::{
    ANONYMOUS_USER, ExamDate, InputError, StudyRequest, Submission, WeaknessLevel,
    parse_submission,
};
pub use schedule::{DATE_FORMAT, MergeOutcome, Plan, date_key};
pub use session::{REVIEW_TOPIC, Session, SessionDuration};
