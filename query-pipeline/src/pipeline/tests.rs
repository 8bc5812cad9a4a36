use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use common::{cache::cache_key, error::AppError, eyelevel::EyeLevelError};
use tokio::sync::Mutex;

use super::{
    prompt::{MAX_CONTEXT_CHARS, NO_RELEVANT_CONTENT},
    services::{CachedAnswer, QueryServices},
    AnswerOrigin, QueryError, QueryPipeline,
};

struct MockServices {
    context: Result<String, ()>,
    completion: Result<String, ()>,
    cache_writable: bool,
    entries: Mutex<HashMap<String, CachedAnswer>>,
    calls: Mutex<Vec<&'static str>>,
    prompts: Mutex<Vec<(String, String)>>,
}

impl MockServices {
    fn new(context: &str, completion: &str) -> Self {
        Self {
            context: Ok(context.to_string()),
            completion: Ok(completion.to_string()),
            cache_writable: true,
            entries: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn with_failing_retrieval() -> Self {
        Self {
            context: Err(()),
            ..Self::new("", "unused")
        }
    }

    fn with_failing_completion(context: &str) -> Self {
        Self {
            completion: Err(()),
            ..Self::new(context, "unused")
        }
    }

    fn with_unwritable_cache(context: &str, completion: &str) -> Self {
        Self {
            cache_writable: false,
            ..Self::new(context, completion)
        }
    }

    async fn record(&self, call: &'static str) {
        self.calls.lock().await.push(call);
    }
}

fn retrieval_error() -> AppError {
    AppError::EyeLevel(EyeLevelError::Api {
        status: 502,
        message: "mock retrieval failure".to_string(),
    })
}

#[async_trait]
impl QueryServices for MockServices {
    async fn fetch_context(&self, _container_id: &str, _query: &str) -> Result<String, AppError> {
        self.record("fetch_context").await;
        self.context.clone().map_err(|()| retrieval_error())
    }

    async fn generate_answer(&self, context: &str, query: &str) -> Result<String, AppError> {
        self.record("generate_answer").await;
        self.prompts
            .lock()
            .await
            .push((context.to_string(), query.to_string()));
        self.completion
            .clone()
            .map_err(|()| AppError::CompletionParsing("mock completion failure".to_string()))
    }

    async fn cached_answer(&self, key: &str) -> Option<CachedAnswer> {
        self.record("cached_answer").await;
        self.entries.lock().await.get(key).cloned()
    }

    async fn store_answer(&self, key: &str, answer: &CachedAnswer) -> bool {
        self.record("store_answer").await;
        if !self.cache_writable {
            return false;
        }
        self.entries
            .lock()
            .await
            .insert(key.to_string(), answer.clone());
        true
    }
}

#[tokio::test]
async fn second_identical_query_is_served_from_cache() {
    let services = Arc::new(MockServices::new(
        "Report summary text describing the findings.",
        "This report summarizes the findings.",
    ));
    let pipeline = QueryPipeline::with_services(services.clone());

    let first = pipeline.answer("bkt_1", "What is the summary?").await.unwrap();
    assert_eq!(first.text, "This report summarizes the findings.");
    assert_eq!(first.origin, AnswerOrigin::Generated { cache_written: true });

    let second = pipeline.answer("bkt_1", "What is the summary?").await.unwrap();
    assert_eq!(second.text, first.text);
    assert_eq!(second.origin, AnswerOrigin::Cache);

    let calls = services.calls.lock().await;
    assert_eq!(
        *calls,
        vec![
            "cached_answer",
            "fetch_context",
            "generate_answer",
            "store_answer",
            "cached_answer"
        ]
    );
}

#[tokio::test]
async fn cache_entries_are_keyed_by_container_and_query() {
    let services = Arc::new(MockServices::new("context passage", "an answer"));
    let pipeline = QueryPipeline::with_services(services.clone());

    pipeline.answer("bkt_1", "What is the summary?").await.unwrap();

    let entries = services.entries.lock().await;
    let entry = entries
        .get(&cache_key("bkt_1:What is the summary?"))
        .expect("entry stored under the composite key");
    assert_eq!(entry.response, "an answer");
    assert_eq!(entry.context, "context passage");
    assert_eq!(entry.container_id, "bkt_1");
    drop(entries);

    // The same question against another container is a different key.
    let answer = pipeline.answer("bkt_2", "What is the summary?").await.unwrap();
    assert_eq!(answer.origin, AnswerOrigin::Generated { cache_written: true });
    assert_eq!(services.entries.lock().await.len(), 2);
}

#[tokio::test]
async fn empty_context_returns_the_fixed_answer_without_caching() {
    let services = Arc::new(MockServices::new("", "unused"));
    let pipeline = QueryPipeline::with_services(services.clone());

    let answer = pipeline.answer("bkt_1", "Anything here?").await.unwrap();

    assert_eq!(answer.text, NO_RELEVANT_CONTENT);
    assert_eq!(answer.origin, AnswerOrigin::NoContext);
    assert!(services.entries.lock().await.is_empty());
    assert_eq!(
        *services.calls.lock().await,
        vec!["cached_answer", "fetch_context"]
    );
}

#[tokio::test]
async fn oversized_context_is_cut_before_prompting_and_caching() {
    let long_context = "x".repeat(MAX_CONTEXT_CHARS + 250);
    let services = Arc::new(MockServices::new(&long_context, "an answer"));
    let pipeline = QueryPipeline::with_services(services.clone());

    pipeline.answer("bkt_1", "What is the summary?").await.unwrap();

    let prompts = services.prompts.lock().await;
    let (prompted_context, _) = prompts.first().expect("one generation");
    assert_eq!(prompted_context.chars().count(), MAX_CONTEXT_CHARS);
    assert!(long_context.starts_with(prompted_context));

    let entries = services.entries.lock().await;
    let entry = entries
        .get(&cache_key("bkt_1:What is the summary?"))
        .expect("entry stored");
    assert_eq!(&entry.context, prompted_context);
}

#[tokio::test]
async fn retrieval_failure_is_tagged_and_nothing_is_cached() {
    let services = Arc::new(MockServices::with_failing_retrieval());
    let pipeline = QueryPipeline::with_services(services.clone());

    let error = pipeline.answer("bkt_1", "What?").await.unwrap_err();

    assert!(matches!(error, QueryError::Retrieval(_)));
    assert!(services.entries.lock().await.is_empty());
    assert_eq!(
        *services.calls.lock().await,
        vec!["cached_answer", "fetch_context"]
    );
}

#[tokio::test]
async fn completion_failure_is_tagged_and_nothing_is_cached() {
    let services = Arc::new(MockServices::with_failing_completion("context passage"));
    let pipeline = QueryPipeline::with_services(services.clone());

    let error = pipeline.answer("bkt_1", "What?").await.unwrap_err();

    assert!(matches!(error, QueryError::Completion(_)));
    assert!(services.entries.lock().await.is_empty());
    assert_eq!(
        *services.calls.lock().await,
        vec!["cached_answer", "fetch_context", "generate_answer"]
    );
}

#[tokio::test]
async fn degraded_cache_still_generates_an_answer_every_time() {
    let services = Arc::new(MockServices::with_unwritable_cache(
        "context passage",
        "an answer",
    ));
    let pipeline = QueryPipeline::with_services(services.clone());

    let first = pipeline.answer("bkt_1", "What?").await.unwrap();
    let second = pipeline.answer("bkt_1", "What?").await.unwrap();

    assert_eq!(first.origin, AnswerOrigin::Generated { cache_written: false });
    assert_eq!(second.origin, AnswerOrigin::Generated { cache_written: false });
    assert_eq!(first.text, "an answer");
    assert_eq!(second.text, "an answer");

    let fetches = services
        .calls
        .lock()
        .await
        .iter()
        .filter(|call| **call == "fetch_context")
        .count();
    assert_eq!(fetches, 2);
}
