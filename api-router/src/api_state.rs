use std::{collections::HashMap, sync::Arc};

use axum::http::HeaderMap;
use common::{
    cache::QueryCache, eyelevel::EyeLevelClient, session::SharedSession, utils::config::AppConfig,
};
use query_pipeline::QueryPipeline;
use tokio::sync::RwLock;

/// Header clients send to keep their documents apart from other clients
/// on the same deployment.
pub const SESSION_HEADER: &str = "x-session-id";

const DEFAULT_SESSION: &str = "default";

#[derive(Clone)]
pub struct ApiState {
    pub config: AppConfig,
    pub eyelevel: Arc<EyeLevelClient>,
    pub cache: Arc<QueryCache>,
    pub query_pipeline: Arc<QueryPipeline>,
    pub sessions: SessionRegistry,
}

impl ApiState {
    pub async fn new(config: &AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let eyelevel = Arc::new(EyeLevelClient::new(
            &config.eye_level_base_url,
            &config.eye_level_api_key,
        )?);

        let openai_client = Arc::new(async_openai::Client::with_config(
            async_openai::config::OpenAIConfig::new()
                .with_api_key(&config.openai_api_key)
                .with_api_base(&config.openai_base_url),
        ));

        // A failed connection leaves the cache degraded rather than
        // blocking startup; queries then always regenerate.
        let cache = Arc::new(QueryCache::connect(config).await);

        let query_pipeline = Arc::new(QueryPipeline::new(
            eyelevel.clone(),
            openai_client,
            cache.clone(),
            config.cache_expiration,
        ));

        Ok(Self {
            config: config.clone(),
            eyelevel,
            cache,
            query_pipeline,
            sessions: SessionRegistry::default(),
        })
    }
}

/// Per-client document sessions, keyed by the `x-session-id` header and
/// created on first use. Requests without the header share one default
/// session.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, SharedSession>>>,
}

impl SessionRegistry {
    pub async fn session(&self, headers: &HeaderMap) -> SharedSession {
        let id = headers
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or(DEFAULT_SESSION);

        if let Some(session) = self.sessions.read().await.get(id) {
            return session.clone();
        }

        self.sessions
            .write()
            .await
            .entry(id.to_owned())
            .or_default()
            .clone()
    }
}
