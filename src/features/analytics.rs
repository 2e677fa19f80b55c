use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::learning::{LearningData, LearningDataRequest};
use super::recommendations::Priority;
use crate::http::{ApiClient, RequestOptions};
use crate::jobs::{JobApi, JobEndpoint, PollPolicy};
use crate::types::{ApiResult, Envelope, Job};

pub const OVERVIEW_PATH: &str = "/api/analytics/overview";
pub const INSIGHTS_PATH: &str = "/api/analytics/insights";
pub const TOPIC_PATH: &str = "/api/analytics/topic";
pub const STUDY_PLAN_PATH: &str = "/api/analytics/study-plan";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicBreakdown {
    #[serde(default)]
    pub time_spent: u64,
    #[serde(default)]
    pub quizzes_taken: u32,
    #[serde(default)]
    pub avg_score: f64,
    #[serde(default)]
    pub passed: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressMetrics {
    #[serde(default)]
    pub total_time_seconds: u64,
    #[serde(default)]
    pub total_time_hours: f64,
    #[serde(default)]
    pub avg_quiz_score: f64,
    #[serde(default)]
    pub total_quizzes: u32,
    #[serde(default)]
    pub passed_quizzes: u32,
    #[serde(default)]
    pub topics_studied: u32,
    #[serde(default)]
    pub topic_breakdown: HashMap<String, TopicBreakdown>,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub total_activities: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Strength {
    pub area: String,
    /// 1-10.
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Weakness {
    pub area: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub improvement_tips: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub priority: Priority,
    #[serde(default)]
    pub action_items: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiInsights {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub strengths: Vec<Strength>,
    #[serde(default)]
    pub weaknesses: Vec<Weakness>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    #[serde(default)]
    pub next_focus: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicStats {
    #[serde(default)]
    pub total_time_minutes: f64,
    #[serde(default)]
    pub quizzes_taken: u32,
    #[serde(default)]
    pub avg_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicInsights {
    #[serde(default)]
    pub mastery_level: String,
    /// 0-100.
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub key_concepts_mastered: Vec<String>,
    #[serde(default)]
    pub areas_to_improve: Vec<String>,
    #[serde(default)]
    pub next_steps: Vec<String>,
    #[serde(default)]
    pub stats: TopicStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyPlan {
    pub day: String,
    #[serde(default)]
    pub focus: String,
    #[serde(default)]
    pub activities: Vec<String>,
    #[serde(default)]
    pub estimated_time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudyPlan {
    #[serde(default)]
    pub daily_plan: Vec<DailyPlan>,
    #[serde(default)]
    pub weekly_goals: Vec<String>,
    #[serde(default)]
    pub priority_topics: Vec<String>,
    #[serde(default)]
    pub tips: Vec<String>,
}

pub struct AnalyticsApi {
    client: ApiClient,
    policy: PollPolicy,
    insights: JobApi<LearningDataRequest, AiInsights>,
    study_plan: JobApi<LearningDataRequest, StudyPlan>,
}

impl AnalyticsApi {
    pub fn new(client: ApiClient, policy: PollPolicy) -> Self {
        Self {
            insights: JobApi::json(client.clone(), JobEndpoint::new(INSIGHTS_PATH), policy.clone()),
            study_plan: JobApi::json(client.clone(), JobEndpoint::new(STUDY_PLAN_PATH), policy.clone()),
            client,
            policy,
        }
    }

    pub fn insights_jobs(&self) -> &JobApi<LearningDataRequest, AiInsights> {
        &self.insights
    }

    /// Progress metrics, computed synchronously by the backend.
    pub async fn overview(&self, learning_data: LearningData) -> ApiResult<ProgressMetrics> {
        let envelope: Envelope<ProgressMetrics> = self
            .client
            .post(OVERVIEW_PATH, &LearningDataRequest::from(learning_data), &RequestOptions::default())
            .await?;
        envelope.into_data("analytics overview")
    }

    pub async fn insights<F>(
        &self,
        learning_data: LearningData,
        cancel: &CancellationToken,
        on_progress: F,
    ) -> ApiResult<AiInsights>
    where
        F: FnMut(&Job<AiInsights>),
    {
        info!(topics = learning_data.current_topics.len(), "Requesting AI insights");
        self.insights
            .create_and_wait(&learning_data.into(), cancel, on_progress)
            .await
    }

    /// Insights for one topic. The topic is part of the creation path.
    pub async fn topic_insights<F>(
        &self,
        topic: &str,
        learning_data: LearningData,
        cancel: &CancellationToken,
        on_progress: F,
    ) -> ApiResult<TopicInsights>
    where
        F: FnMut(&Job<TopicInsights>),
    {
        info!(topic, "Requesting topic insights");
        let jobs: JobApi<LearningDataRequest, TopicInsights> = JobApi::json(
            self.client.clone(),
            topic_endpoint(topic),
            self.policy.clone(),
        );
        jobs.create_and_wait(&learning_data.into(), cancel, on_progress)
            .await
    }

    pub async fn study_plan<F>(
        &self,
        learning_data: LearningData,
        cancel: &CancellationToken,
        on_progress: F,
    ) -> ApiResult<StudyPlan>
    where
        F: FnMut(&Job<StudyPlan>),
    {
        info!("Requesting study plan");
        self.study_plan
            .create_and_wait(&learning_data.into(), cancel, on_progress)
            .await
    }
}

fn topic_endpoint(topic: &str) -> JobEndpoint {
    JobEndpoint::with_status_base(
        format!("{}/{}", TOPIC_PATH, urlencoding::encode(topic)),
        format!("{}/status", TOPIC_PATH),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::types::ApiError;
    use serde_json::json;
    use std::time::Duration;

    fn api_for(url: String) -> AnalyticsApi {
        let client = ApiClient::new(&ApiConfig::new(url)).unwrap();
        AnalyticsApi::new(client, PollPolicy::default().with_interval(Duration::from_millis(5)))
    }

    #[test]
    fn test_topic_endpoint_encodes_topic() {
        let endpoint = topic_endpoint("Học máy");
        assert_eq!(endpoint.create_path(), "/api/analytics/topic/H%E1%BB%8Dc%20m%C3%A1y");
        assert_eq!(endpoint.status_path("t-1"), "/api/analytics/topic/status/t-1");
    }

    #[tokio::test]
    async fn test_overview() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", OVERVIEW_PATH)
            .with_status(200)
            .with_body(
                json!({
                    "status": "success",
                    "data": {
                        "total_time_seconds": 7200,
                        "total_time_hours": 2.0,
                        "avg_quiz_score": 85.0,
                        "total_quizzes": 3,
                        "topic_breakdown": {"Rust": {"time_spent": 7200, "quizzes_taken": 3, "avg_score": 85.0, "passed": 3}}
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let metrics = api_for(server.url()).overview(LearningData::default()).await.unwrap();
        assert_eq!(metrics.total_quizzes, 3);
        assert_eq!(metrics.topic_breakdown["Rust"].passed, 3);
    }

    #[tokio::test]
    async fn test_insights_job() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", INSIGHTS_PATH)
            .with_status(202)
            .with_body(r#"{"job_id": "ins-1", "status": "pending"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/api/analytics/insights/status/ins-1")
            .with_status(200)
            .with_body(
                json!({
                    "job_id": "ins-1",
                    "status": "completed",
                    "result": {
                        "summary": "Good pace",
                        "recommendations": [{"title": "Practice", "priority": "medium", "action_items": ["Daily kata"]}],
                        "next_focus": "Lifetimes"
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let insights = api_for(server.url())
            .insights(LearningData::default(), &CancellationToken::new(), |_| {})
            .await
            .unwrap();

        assert_eq!(insights.next_focus, "Lifetimes");
        assert_eq!(insights.recommendations[0].priority, Priority::Medium);
    }

    #[tokio::test]
    async fn test_topic_insights_and_study_plan_jobs() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/analytics/topic/Rust")
            .with_status(202)
            .with_body(r#"{"job_id": "t-1"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/api/analytics/topic/status/t-1")
            .with_status(200)
            .with_body(r#"{"status": "completed", "result": {"mastery_level": "Intermediate", "progress": 60, "stats": {"quizzes_taken": 2}}}"#)
            .create_async()
            .await;
        server
            .mock("POST", STUDY_PLAN_PATH)
            .with_status(202)
            .with_body(r#"{"job_id": "sp-1"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/api/analytics/study-plan/status/sp-1")
            .with_status(200)
            .with_body(r#"{"status": "failed", "error": "Không đủ dữ liệu"}"#)
            .create_async()
            .await;

        let api = api_for(server.url());
        let cancel = CancellationToken::new();

        let topic = api
            .topic_insights("Rust", LearningData::default(), &cancel, |_| {})
            .await
            .unwrap();
        assert_eq!(topic.mastery_level, "Intermediate");
        assert_eq!(topic.stats.quizzes_taken, 2);

        let err = api
            .study_plan(LearningData::default(), &cancel, |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::JobFailed(ref message) if message == "Không đủ dữ liệu"));
    }
}
