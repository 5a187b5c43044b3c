//! The date-keyed study plan and its merge rules.
//!
//! Two insertion paths exist and they deliberately differ on duplicates:
//! - [`Plan::merge_session`] overwrites the duration of an existing
//!   `(subject, topic)` session in place.
//! - [`Plan::insert_review`] leaves an existing `(subject, "Review")`
//!   session untouched.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::ordered::OrderedMap;
use super::session::Session;

/// Calendar date format used for plan keys and exam dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Format a date as a plan key.
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// What [`Plan::merge_session`] did with a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// No session with the same key existed; the candidate was appended.
    Appended,
    /// An existing session's duration was overwritten.
    Updated,
}

/// Date string to ordered sessions. Dates appear in the order they were
/// first touched, and no date holds two sessions with the same
/// `(subject, topic)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    days: OrderedMap<Vec<Session>>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure `date` has an entry, possibly empty.
    pub fn ensure_day(&mut self, date: &str) -> &mut Vec<Session> {
        self.days.entry_or_default(date)
    }

    /// Merge a regular session: overwrite the duration of a same-key session
    /// (position unchanged), else append.
    pub fn merge_session(&mut self, date: &str, session: Session) -> MergeOutcome {
        let day = self.ensure_day(date);
        match day
            .iter_mut()
            .find(|s| s.same_slot(&session.subject, &session.topic))
        {
            Some(existing) => {
                existing.duration = session.duration;
                MergeOutcome::Updated
            }
            None => {
                day.push(session);
                MergeOutcome::Appended
            }
        }
    }

    /// Insert a review session unless one with the same key is already
    /// there. Returns `true` if it was inserted.
    pub fn insert_review(&mut self, date: &str, session: Session) -> bool {
        let day = self.ensure_day(date);
        if day
            .iter()
            .any(|s| s.same_slot(&session.subject, &session.topic))
        {
            return false;
        }
        day.push(session);
        true
    }

    pub fn sessions_on(&self, date: &str) -> Option<&[Session]> {
        self.days.get(date).map(Vec::as_slice)
    }

    pub fn dates(&self) -> impl Iterator<Item = &str> {
        self.days.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Session])> {
        self.days.iter().map(|(d, s)| (d, s.as_slice()))
    }

    /// True when the plan has no dates at all.
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn session_count(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }
}

impl Serialize for Plan {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.days.serialize(serializer)
    }
}

/// Reading a plan back (e.g. from a child process) drops any later
/// duplicate of a `(subject, topic)` under the same date, keeping the first.
impl<'de> Deserialize<'de> for Plan {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = OrderedMap::<Vec<Session>>::deserialize(deserializer)?;
        let mut plan = Plan::new();
        for (date, sessions) in raw.iter() {
            let day = plan.ensure_day(date);
            for session in sessions {
                if !day
                    .iter()
                    .any(|s| s.same_slot(&session.subject, &session.topic))
                {
                    day.push(session.clone());
                }
            }
        }
        Ok(plan)
    }
}
