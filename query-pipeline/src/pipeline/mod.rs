mod prompt;
mod services;
#[cfg(test)]
mod tests;

pub use prompt::{
    truncate_context, COMPLETION_MODEL, MAX_CONTEXT_CHARS, NO_RELEVANT_CONTENT, SYSTEM_PROMPT,
};
#[allow(clippy::module_name_repetitions)]
pub use services::{CachedAnswer, DefaultQueryServices, QueryServices};

use std::sync::Arc;

use common::{
    cache::{cache_key, QueryCache},
    error::AppError,
    eyelevel::EyeLevelClient,
};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Which collaborator sank the query.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Context retrieval failed: {0}")]
    Retrieval(#[source] AppError),
    #[error("Answer generation failed: {0}")]
    Completion(#[source] AppError),
}

/// Where an answer came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOrigin {
    Cache,
    Generated { cache_written: bool },
    NoContext,
}

impl AnswerOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerOrigin::Cache => "cache",
            AnswerOrigin::Generated { .. } => "generated",
            AnswerOrigin::NoContext => "no_content",
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueryAnswer {
    pub text: String,
    pub origin: AnswerOrigin,
}

/// Answers natural-language queries against an ingested document container:
/// cache lookup, context retrieval, prompt assembly, completion, cache write.
#[allow(clippy::module_name_repetitions)]
pub struct QueryPipeline {
    services: Arc<dyn QueryServices>,
}

impl QueryPipeline {
    pub fn new(
        eyelevel: Arc<EyeLevelClient>,
        openai_client: Arc<async_openai::Client<async_openai::config::OpenAIConfig>>,
        cache: Arc<QueryCache>,
        cache_ttl_secs: u64,
    ) -> Self {
        let services = DefaultQueryServices::new(eyelevel, openai_client, cache, cache_ttl_secs);
        Self::with_services(Arc::new(services))
    }

    pub fn with_services(services: Arc<dyn QueryServices>) -> Self {
        Self { services }
    }

    /// Cache hits are returned verbatim. Otherwise context is retrieved, cut
    /// to the model allowance, and completed; the generated answer is cached
    /// under the container+query key. A query that retrieves nothing gets
    /// the fixed no-content answer, which is never cached so a later upload
    /// can produce a real one.
    #[tracing::instrument(skip_all, fields(container_id = %container_id))]
    pub async fn answer(&self, container_id: &str, query: &str) -> Result<QueryAnswer, QueryError> {
        let key = cache_key(&format!("{container_id}:{query}"));

        if let Some(entry) = self.services.cached_answer(&key).await {
            debug!("answer served from cache");
            return Ok(QueryAnswer {
                text: entry.response,
                origin: AnswerOrigin::Cache,
            });
        }

        let context = self
            .services
            .fetch_context(container_id, query)
            .await
            .map_err(QueryError::Retrieval)?;

        if context.is_empty() {
            info!("no relevant content for query");
            return Ok(QueryAnswer {
                text: NO_RELEVANT_CONTENT.to_string(),
                origin: AnswerOrigin::NoContext,
            });
        }

        let context = truncate_context(&context, MAX_CONTEXT_CHARS);
        let response = self
            .services
            .generate_answer(&context, query)
            .await
            .map_err(QueryError::Completion)?;

        let entry = CachedAnswer {
            response,
            context,
            container_id: container_id.to_owned(),
        };
        let cache_written = self.services.store_answer(&key, &entry).await;
        if !cache_written {
            warn!("generated answer was not cached");
        }

        Ok(QueryAnswer {
            text: entry.response,
            origin: AnswerOrigin::Generated { cache_written },
        })
    }
}
