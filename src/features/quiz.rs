use serde::{Deserialize, Serialize};

use crate::http::ApiClient;
use crate::jobs::{JobApi, JobEndpoint, PollPolicy};

pub const QUIZ_PATH: &str = "/api/quiz";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizRequest {
    pub course: String,
    pub topic: String,
    pub subtopic: String,
    pub description: String,
    /// Backend default is 5.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_questions: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    #[serde(rename = "answerIndex")]
    pub answer_index: usize,
    #[serde(default)]
    pub reason: String,
}

impl QuizQuestion {
    pub fn answer(&self) -> Option<&str> {
        self.options.get(self.answer_index).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizResult {
    pub questions: Vec<QuizQuestion>,
}

pub type QuizApi = JobApi<QuizRequest, QuizResult>;

pub fn quiz_api(client: ApiClient, policy: PollPolicy) -> QuizApi {
    JobApi::json(client, JobEndpoint::new(QUIZ_PATH), policy)
}
