//! Learner history shared by the recommendations and analytics endpoints.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningActivity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(rename = "activityType")]
    pub activity_type: String,
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtopic: Option<String>,
    /// Seconds.
    pub duration: u64,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// ISO date.
    pub date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuizRecord {
    pub topic: String,
    pub subtopic: String,
    /// 0-100.
    pub score: f64,
    pub total_questions: u32,
    pub correct_answers: u32,
    pub time_spent: u64,
    pub timestamp: i64,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningData {
    #[serde(default)]
    pub learning_activities: Vec<LearningActivity>,
    #[serde(default)]
    pub quiz_results: Vec<QuizRecord>,
    /// Topic to seconds spent.
    #[serde(default)]
    pub time_spent: HashMap<String, u64>,
    #[serde(default)]
    pub current_topics: Vec<String>,
}

impl LearningData {
    pub fn is_empty(&self) -> bool {
        self.learning_activities.is_empty() && self.quiz_results.is_empty() && self.current_topics.is_empty()
    }

    /// Every topic mentioned anywhere in the history, sorted.
    pub fn topics(&self) -> BTreeSet<&str> {
        self.current_topics
            .iter()
            .map(String::as_str)
            .chain(self.quiz_results.iter().map(|q| q.topic.as_str()))
            .chain(self.learning_activities.iter().map(|a| a.topic.as_str()))
            .collect()
    }
}

/// Request body of every endpoint that takes learner history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningDataRequest {
    pub learning_data: LearningData,
}

impl From<LearningData> for LearningDataRequest {
    fn from(learning_data: LearningData) -> Self {
        Self { learning_data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_partial_history() {
        let data: LearningData = serde_json::from_value(json!({
            "quiz_results": [{
                "topic": "Rust",
                "subtopic": "Traits",
                "score": 80,
                "total_questions": 5,
                "correct_answers": 4,
                "time_spent": 300,
                "timestamp": 1700000000000i64,
                "passed": true
            }],
            "current_topics": ["Python"]
        }))
        .unwrap();

        assert!(!data.is_empty());
        assert!(data.learning_activities.is_empty());
        assert_eq!(data.topics().into_iter().collect::<Vec<_>>(), vec!["Python", "Rust"]);
    }

    #[test]
    fn test_request_wraps_learning_data() {
        let body = serde_json::to_value(LearningDataRequest::from(LearningData::default())).unwrap();
        assert_eq!(
            body,
            json!({"learning_data": {
                "learning_activities": [],
                "quiz_results": [],
                "time_spent": {},
                "current_topics": []
            }})
        );
    }
}
