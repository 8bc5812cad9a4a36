use std::sync::Arc;

use async_trait::async_trait;
use common::{cache::QueryCache, error::AppError, eyelevel::EyeLevelClient};
use serde::{Deserialize, Serialize};

use super::prompt::build_completion_request;

/// Cached answer together with the context it was generated from and the
/// container it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CachedAnswer {
    pub response: String,
    pub context: String,
    pub container_id: String,
}

#[async_trait]
pub trait QueryServices: Send + Sync {
    async fn fetch_context(&self, container_id: &str, query: &str) -> Result<String, AppError>;

    async fn generate_answer(&self, context: &str, query: &str) -> Result<String, AppError>;

    async fn cached_answer(&self, key: &str) -> Option<CachedAnswer>;

    /// Returns whether the entry was actually written; a degraded cache
    /// reports `false`.
    async fn store_answer(&self, key: &str, answer: &CachedAnswer) -> bool;
}

pub struct DefaultQueryServices {
    eyelevel: Arc<EyeLevelClient>,
    openai_client: Arc<async_openai::Client<async_openai::config::OpenAIConfig>>,
    cache: Arc<QueryCache>,
    cache_ttl_secs: u64,
}

impl DefaultQueryServices {
    pub fn new(
        eyelevel: Arc<EyeLevelClient>,
        openai_client: Arc<async_openai::Client<async_openai::config::OpenAIConfig>>,
        cache: Arc<QueryCache>,
        cache_ttl_secs: u64,
    ) -> Self {
        Self {
            eyelevel,
            openai_client,
            cache,
            cache_ttl_secs,
        }
    }
}

#[async_trait]
impl QueryServices for DefaultQueryServices {
    async fn fetch_context(&self, container_id: &str, query: &str) -> Result<String, AppError> {
        Ok(self.eyelevel.search_content(container_id, query).await?)
    }

    async fn generate_answer(&self, context: &str, query: &str) -> Result<String, AppError> {
        let request = build_completion_request(context, query)?;
        let response = self.openai_client.chat().create(request).await?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_ref())
            .map(|content| content.to_owned())
            .ok_or(AppError::CompletionParsing(
                "No content found in completion response".into(),
            ))
    }

    async fn cached_answer(&self, key: &str) -> Option<CachedAnswer> {
        self.cache.get_json(key).await
    }

    async fn store_answer(&self, key: &str, answer: &CachedAnswer) -> bool {
        self.cache.set_json(key, answer, self.cache_ttl_secs).await
    }
}
