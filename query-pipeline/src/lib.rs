#![allow(clippy::missing_docs_in_private_items)]

pub mod pipeline;

pub use pipeline::{
    AnswerOrigin, CachedAnswer, DefaultQueryServices, QueryAnswer, QueryError, QueryPipeline,
    QueryServices, NO_RELEVANT_CONTENT,
};
