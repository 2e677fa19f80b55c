//! One entry point bundling every feature against a single backend.

use crate::config::{ApiConfig, Config};
use crate::features::analytics::AnalyticsApi;
use crate::features::chat::ChatApi;
use crate::features::pdf::PdfAnalysisApi;
use crate::features::quiz::{quiz_api, QuizApi};
use crate::features::recommendations::RecommendationsApi;
use crate::features::resource::{resource_api, ResourceApi};
use crate::features::roadmap::{roadmap_api, RoadmapApi};
use crate::http::{ApiClient, RequestOptions};
use crate::jobs::PollPolicy;
use crate::types::{ApiResult, HealthStatus};

pub const HEALTH_PATH: &str = "/";

pub struct LearningClient {
    api: ApiClient,
    pub roadmap: RoadmapApi,
    pub quiz: QuizApi,
    pub resource: ResourceApi,
    pub chat: ChatApi,
    pub recommendations: RecommendationsApi,
    pub pdf: PdfAnalysisApi,
    pub analytics: AnalyticsApi,
}

impl LearningClient {
    pub fn new(api_config: &ApiConfig, policy: PollPolicy) -> ApiResult<Self> {
        let api = ApiClient::new(api_config)?;
        Ok(Self {
            roadmap: roadmap_api(api.clone(), policy.clone()),
            quiz: quiz_api(api.clone(), policy.clone()),
            resource: resource_api(api.clone(), policy.clone()),
            chat: ChatApi::new(api.clone(), &policy),
            recommendations: RecommendationsApi::new(api.clone(), policy.clone()),
            pdf: PdfAnalysisApi::new(api.clone(), &policy),
            analytics: AnalyticsApi::new(api.clone(), policy),
            api,
        })
    }

    pub fn from_config(config: &Config) -> ApiResult<Self> {
        Self::new(&config.api, config.polling.clone())
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Whether the backend is up; useful to wake a sleeping host before submitting.
    pub async fn health(&self) -> ApiResult<HealthStatus> {
        self.api.get(HEALTH_PATH, &RequestOptions::default()).await
    }
}
