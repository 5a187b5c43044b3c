use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A stored study plan: the inputs a caller submitted and the envelope
/// that generation returned for them.
///
/// JSON columns hold the documents exactly as serialized at insert time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StudyPlanRecord {
    pub id: i64,
    pub user_id: String,
    pub subjects: serde_json::Value,
    pub weaknesses: serde_json::Value,
    pub exam_dates: serde_json::Value,
    pub generated_plan: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl StudyPlanRecord {
    /// Number of sessions across all dates of the stored plan.
    ///
    /// Reads `generated_plan.plan`; returns 0 if the document has another
    /// shape.
    pub fn session_count(&self) -> usize {
        self.generated_plan
            .get("plan")
            .and_then(|p| p.as_object())
            .map(|days| {
                days.values()
                    .filter_map(|d| d.as_array())
                    .map(Vec::len)
                    .sum()
            })
            .unwrap_or(0)
    }

    /// Subject names, if `subjects` is an array of strings.
    pub fn subject_names(&self) -> Vec<&str> {
        self.subjects
            .as_array()
            .map(|a| a.iter().filter_map(|s| s.as_str()).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(plan: serde_json::Value) -> StudyPlanRecord {
        StudyPlanRecord {
            id: 1,
            user_id: "anonymous".into(),
            subjects: json!(["Math", "Bio"]),
            weaknesses: json!({}),
            exam_dates: json!({}),
            generated_plan: plan,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn session_count_sums_all_days() {
        let rec = record(json!({
            "status": "success",
            "plan": {
                "2024-01-01": [{"subject": "Math", "topic": "A", "duration": "1h"},
                               {"subject": "Bio", "topic": "B", "duration": "2h"}],
                "2024-01-05": [{"subject": "Math", "topic": "Review", "duration": "3h"}]
            }
        }));
        assert_eq!(rec.session_count(), 3);
    }

    #[test]
    fn session_count_tolerates_other_shapes() {
        assert_eq!(record(json!({"error": "x"})).session_count(), 0);
        assert_eq!(record(json!(null)).session_count(), 0);
    }

    #[test]
    fn subject_names() {
        assert_eq!(record(json!({})).subject_names(), ["Math", "Bio"]);
    }
}
