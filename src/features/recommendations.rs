use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::learning::{LearningData, LearningDataRequest};
use crate::http::{ApiClient, RequestOptions};
use crate::jobs::{JobApi, JobEndpoint, PollPolicy};
use crate::types::{ApiResult, Envelope, Job};

pub const RECOMMENDATIONS_PATH: &str = "/api/recommendations/personalized";
pub const NEXT_TOPICS_PATH: &str = "/api/recommendations/next-topics";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextTopic {
    pub topic: String,
    #[serde(default)]
    pub reason: String,
    pub priority: Priority,
    #[serde(default)]
    pub relevance_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<String>,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub benefits: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub title: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub goals: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningPath {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub total_duration: String,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DifficultyAdjustment {
    #[serde(default)]
    pub current_level: String,
    #[serde(default)]
    pub recommended_difficulty: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub adjustment_tips: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicScore {
    pub topic: String,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    #[serde(default)]
    pub avg_score: f64,
    #[serde(default)]
    pub total_quizzes: u32,
    #[serde(default)]
    pub topics_studied: u32,
    #[serde(default)]
    pub strong_topics: Vec<TopicScore>,
    #[serde(default)]
    pub weak_topics: Vec<TopicScore>,
    #[serde(default)]
    pub total_time_hours: f64,
    #[serde(default)]
    pub topic_performance: HashMap<String, Value>,
    #[serde(default)]
    pub recent_trend: String,
    #[serde(default)]
    pub recent_scores: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSummary {
    #[serde(default)]
    pub performance_summary: String,
    #[serde(default)]
    pub general_tips: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationsData {
    #[serde(default)]
    pub recommendations: RecommendationSummary,
    #[serde(default)]
    pub next_topics: Vec<NextTopic>,
    #[serde(default)]
    pub learning_path: LearningPath,
    #[serde(default)]
    pub difficulty_adjustment: DifficultyAdjustment,
    #[serde(default)]
    pub performance: PerformanceMetrics,
    #[serde(default)]
    pub processing_time: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct NextTopicsData {
    next_topics: Vec<NextTopic>,
}

pub struct RecommendationsApi {
    client: ApiClient,
    jobs: JobApi<LearningDataRequest, RecommendationsData>,
}

impl RecommendationsApi {
    pub fn new(client: ApiClient, policy: PollPolicy) -> Self {
        let endpoint = JobEndpoint::new(RECOMMENDATIONS_PATH)
            .create_timeout(Duration::from_secs(30))
            .status_timeout(Duration::from_secs(10));
        Self {
            jobs: JobApi::json(client.clone(), endpoint, policy),
            client,
        }
    }

    pub fn jobs(&self) -> &JobApi<LearningDataRequest, RecommendationsData> {
        &self.jobs
    }

    /// Full recommendation bundle for the learner's history.
    pub async fn personalized<F>(
        &self,
        learning_data: LearningData,
        cancel: &CancellationToken,
        on_progress: F,
    ) -> ApiResult<RecommendationsData>
    where
        F: FnMut(&Job<RecommendationsData>),
    {
        info!(
            activities = learning_data.learning_activities.len(),
            quizzes = learning_data.quiz_results.len(),
            topics = learning_data.current_topics.len(),
            "Requesting personalized recommendations"
        );
        self.jobs
            .create_and_wait(&learning_data.into(), cancel, on_progress)
            .await
    }

    /// Next-topic suggestions only, answered synchronously.
    pub async fn next_topics(&self, learning_data: LearningData) -> ApiResult<Vec<NextTopic>> {
        let envelope: Envelope<NextTopicsData> = self
            .client
            .post(
                NEXT_TOPICS_PATH,
                &LearningDataRequest::from(learning_data),
                &RequestOptions::default(),
            )
            .await?;
        Ok(envelope.into_data("next topics")?.next_topics)
    }
}
