//! Assignment and Grade Services records

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A gradable activity shared between tool and platform.
///
/// `tag` is the reconciliation key used by find-or-create; `id` is assigned
/// by the platform and absent on a candidate that has not been created yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Platform URL of the line item
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Maximum score
    #[serde(default)]
    pub score_maximum: f64,
    /// Label shown in the gradebook
    #[serde(default)]
    pub label: String,
    /// Resource link the item is bound to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_link_id: Option<String>,
    /// Tool-side resource id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    /// Tool-defined tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// When submissions open (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date_time: Option<String>,
    /// When submissions close (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date_time: Option<String>,
    /// Whether grades are visible to learners
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grades_released: Option<bool>,
}

impl LineItem {
    /// Candidate line item identified by `tag`
    #[must_use]
    pub fn new(label: impl Into<String>, score_maximum: f64, tag: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            score_maximum,
            tag: Some(tag.into()),
            ..Self::default()
        }
    }

    /// Bind the item to a resource link
    #[must_use]
    pub fn with_resource_link(mut self, resource_link_id: impl Into<String>) -> Self {
        self.resource_link_id = Some(resource_link_id.into());
        self
    }
}

/// Learner's progress on the activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum ActivityProgress {
    Initialized,
    Started,
    InProgress,
    Submitted,
    Completed,
}

/// Grading status of the score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum GradingProgress {
    FullyGraded,
    Pending,
    PendingManual,
    Failed,
    NotReady,
}

/// A score published to a line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    /// Platform user id the score is for
    pub user_id: String,
    /// Points awarded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_given: Option<f64>,
    /// Points possible
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_maximum: Option<f64>,
    /// Comment shown to the learner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// When the score was produced (RFC 3339)
    pub timestamp: String,
    /// Learner progress
    pub activity_progress: ActivityProgress,
    /// Grading status
    pub grading_progress: GradingProgress,
}

impl Grade {
    /// Completed, fully graded score stamped with the current time
    #[must_use]
    pub fn new(user_id: impl Into<String>, score_given: f64, score_maximum: f64) -> Self {
        Self {
            user_id: user_id.into(),
            score_given: Some(score_given),
            score_maximum: Some(score_maximum),
            comment: None,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            activity_progress: ActivityProgress::Completed,
            grading_progress: GradingProgress::FullyGraded,
        }
    }

    /// Attach a comment
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// A result as reported back by the platform
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GradeResult {
    /// Result URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Line item the result belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_of: Option<String>,
    /// Platform user id
    pub user_id: String,
    /// Current score
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_score: Option<f64>,
    /// Maximum for `result_score`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_maximum: Option<f64>,
    /// Comment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn candidate_line_item_omits_platform_fields() {
        let item = LineItem::new("Quiz 1", 10.0, "quiz-1").with_resource_link("link-1");
        let value = serde_json::to_value(&item).unwrap();

        assert_eq!(
            value,
            json!({
                "scoreMaximum": 10.0,
                "label": "Quiz 1",
                "resourceLinkId": "link-1",
                "tag": "quiz-1"
            })
        );
    }

    #[test]
    fn line_item_from_platform_parses_id() {
        let item: LineItem = serde_json::from_value(json!({
            "id": "https://lms.example.edu/lineitems/9",
            "scoreMaximum": 100,
            "label": "Essay",
            "tag": "essay"
        }))
        .unwrap();

        assert_eq!(item.id.as_deref(), Some("https://lms.example.edu/lineitems/9"));
        assert!((item.score_maximum - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn grade_serializes_progress_in_pascal_case() {
        let grade = Grade::new("user-42", 7.5, 10.0).with_comment("good");
        let value = serde_json::to_value(&grade).unwrap();

        assert_eq!(value["userId"], "user-42");
        assert_eq!(value["activityProgress"], "Completed");
        assert_eq!(value["gradingProgress"], "FullyGraded");
        assert_eq!(value["comment"], "good");
        assert!(value["timestamp"].as_str().unwrap().ends_with('Z'));
    }
}
