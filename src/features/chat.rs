use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::roadmap::RoadmapResult;
use crate::http::ApiClient;
use crate::jobs::{JobApi, JobEndpoint, PollPolicy};
use crate::types::{ApiError, ApiResult, Job};

pub const CHAT_PATH: &str = "/api/chat";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }
}

/// What the assistant may know about the learner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContextData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roadmaps: Option<HashMap<String, RoadmapResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiz_stats: Option<HashMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_count: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(rename = "userData", skip_serializing_if = "Option::is_none")]
    pub user_data: Option<UserContextData>,
}

/// Chat jobs are slow to appear on a cold host: wait before the first
/// lookup and allow up to four minutes.
pub fn chat_policy(base: &PollPolicy) -> PollPolicy {
    base.clone()
        .with_max_attempts(120)
        .with_initial_delay(Duration::from_millis(1500))
}

pub struct ChatApi {
    jobs: JobApi<ChatRequest, String>,
}

impl ChatApi {
    pub fn new(client: ApiClient, base_policy: &PollPolicy) -> Self {
        Self {
            jobs: JobApi::json(client, JobEndpoint::new(CHAT_PATH), chat_policy(base_policy)),
        }
    }

    pub fn jobs(&self) -> &JobApi<ChatRequest, String> {
        &self.jobs
    }

    /// Send the conversation and wait for the assistant's reply text.
    pub async fn send_message<F>(
        &self,
        messages: Vec<ChatMessage>,
        user_data: Option<UserContextData>,
        cancel: &CancellationToken,
        on_progress: F,
    ) -> ApiResult<String>
    where
        F: FnMut(&Job<String>),
    {
        info!(messages = messages.len(), has_user_data = user_data.is_some(), "Sending chat message");
        let request = ChatRequest { messages, user_data };
        let reply = self.jobs.create_and_wait(&request, cancel, on_progress).await?;
        if reply.trim().is_empty() {
            return Err(ApiError::MissingResult);
        }
        Ok(reply)
    }
}
