use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::http::ApiClient;
use crate::jobs::{JobApi, JobEndpoint, PollPolicy};

pub const ROADMAP_PATH: &str = "/api/roadmap";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KnowledgeLevel {
    #[serde(rename = "Absolute Beginner")]
    AbsoluteBeginner,
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl FromStr for KnowledgeLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], " ").as_str() {
            "absolute beginner" => Ok(KnowledgeLevel::AbsoluteBeginner),
            "beginner" => Ok(KnowledgeLevel::Beginner),
            "intermediate" => Ok(KnowledgeLevel::Intermediate),
            "advanced" => Ok(KnowledgeLevel::Advanced),
            "expert" => Ok(KnowledgeLevel::Expert),
            other => Err(format!("unknown knowledge level: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadmapRequest {
    pub topic: String,
    /// Total study time, e.g. "4 weeks".
    pub time: String,
    pub knowledge_level: KnowledgeLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTopic {
    #[serde(rename = "chủ đề con")]
    pub name: String,
    #[serde(rename = "thời gian", default)]
    pub duration: String,
    #[serde(rename = "mô tả", default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekTopic {
    #[serde(rename = "chủ đề")]
    pub topic: String,
    #[serde(rename = "các chủ đề con", default)]
    pub subtopics: Vec<SubTopic>,
}

/// Week label ("tuần 1", ...) to that week's plan.
pub type RoadmapResult = BTreeMap<String, WeekTopic>;

pub type RoadmapApi = JobApi<RoadmapRequest, RoadmapResult>;

pub fn roadmap_api(client: ApiClient, policy: PollPolicy) -> RoadmapApi {
    JobApi::json(client, JobEndpoint::new(ROADMAP_PATH), policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use mockito::Matcher;
    use serde_json::json;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    #[test]
    fn test_knowledge_level_parsing_and_wire_name() {
        assert_eq!("absolute-beginner".parse::<KnowledgeLevel>().unwrap(), KnowledgeLevel::AbsoluteBeginner);
        assert_eq!("Expert".parse::<KnowledgeLevel>().unwrap(), KnowledgeLevel::Expert);
        assert!("guru".parse::<KnowledgeLevel>().is_err());
        assert_eq!(
            serde_json::to_value(KnowledgeLevel::AbsoluteBeginner).unwrap(),
            json!("Absolute Beginner")
        );
    }

    #[tokio::test]
    async fn test_roadmap_resolves_after_cold_start_404s() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", ROADMAP_PATH)
            .match_body(Matcher::Json(json!({
                "topic": "Python",
                "time": "4 weeks",
                "knowledge_level": "Beginner"
            })))
            .with_status(202)
            .with_body(r#"{"job_id": "rm-1", "status": "pending", "message": "Đang xử lý"}"#)
            .create_async()
            .await;
        let not_ready = server
            .mock("GET", "/api/roadmap/status/rm-1")
            .with_status(404)
            .with_body(r#"{"error": "Không tìm thấy job"}"#)
            .expect(3)
            .create_async()
            .await;
        server
            .mock("GET", "/api/roadmap/status/rm-1")
            .with_status(200)
            .with_body(
                json!({
                    "job_id": "rm-1",
                    "status": "completed",
                    "result": {
                        "tuần 1": {
                            "chủ đề": "Giới thiệu về Python",
                            "các chủ đề con": [
                                {"chủ đề con": "Bắt đầu với Python", "thời gian": "10 phút", "mô tả": "Hello world"}
                            ]
                        }
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = ApiClient::new(&ApiConfig::new(server.url())).unwrap();
        let policy = PollPolicy {
            cold_start_backoff: Duration::from_millis(5),
            not_found_backoff: Duration::from_millis(5),
            ..PollPolicy::default().with_interval(Duration::from_millis(5))
        };
        let request = RoadmapRequest {
            topic: "Python".into(),
            time: "4 weeks".into(),
            knowledge_level: KnowledgeLevel::Beginner,
        };

        let roadmap = roadmap_api(client, policy)
            .create_and_wait(&request, &CancellationToken::new(), |_| {})
            .await
            .unwrap();

        not_ready.assert_async().await;
        let week = &roadmap["tuần 1"];
        assert_eq!(week.topic, "Giới thiệu về Python");
        assert_eq!(week.subtopics[0].duration, "10 phút");
    }
}
