//! A single study session and its duration category.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Topic name used for the auto-inserted pre-exam review session.
pub const REVIEW_TOPIC: &str = "Review";

/// Weakness levels strictly above this get the longer session.
pub const LONG_SESSION_THRESHOLD: i64 = 3;

/// Length of a study session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionDuration {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "2h")]
    TwoHours,
    #[serde(rename = "3h")]
    ThreeHours,
}

impl SessionDuration {
    /// Duration for a regular topic session at the given weakness level.
    pub fn for_level(level: i64) -> Self {
        if level > LONG_SESSION_THRESHOLD {
            Self::TwoHours
        } else {
            Self::OneHour
        }
    }
}

impl fmt::Display for SessionDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::OneHour => "1h",
            Self::TwoHours => "2h",
            Self::ThreeHours => "3h",
        };
        f.write_str(s)
    }
}

impl FromStr for SessionDuration {
    type Err = SessionDurationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1h" => Ok(Self::OneHour),
            "2h" => Ok(Self::TwoHours),
            "3h" => Ok(Self::ThreeHours),
            other => Err(SessionDurationParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`SessionDuration`] string.
#[derive(Debug, Clone)]
pub struct SessionDurationParseError(pub String);

impl fmt::Display for SessionDurationParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid session duration: {:?}", self.0)
    }
}

impl std::error::Error for SessionDurationParseError {}

/// One block of study on a topic.
///
/// Two sessions with the same subject and topic are the same logical session
/// regardless of duration; see [`Session::same_slot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub subject: String,
    pub topic: String,
    pub duration: SessionDuration,
}

impl Session {
    pub fn new(
        subject: impl Into<String>,
        topic: impl Into<String>,
        duration: SessionDuration,
    ) -> Self {
        Self {
            subject: subject.into(),
            topic: topic.into(),
            duration,
        }
    }

    /// The fixed three-hour review session for `subject`.
    pub fn review(subject: impl Into<String>) -> Self {
        Self::new(subject, REVIEW_TOPIC, SessionDuration::ThreeHours)
    }

    /// Whether `self` occupies the same `(subject, topic)` slot as the given key.
    pub fn same_slot(&self, subject: &str, topic: &str) -> bool {
        self.subject == subject && self.topic == topic
    }
}
