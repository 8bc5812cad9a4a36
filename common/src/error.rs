use async_openai::error::OpenAIError;
use thiserror::Error;

use crate::eyelevel::EyeLevelError;

// Core internal errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("EyeLevel error: {0}")]
    EyeLevel(#[from] EyeLevelError),
    #[error("OpenAI error: {0}")]
    OpenAI(#[from] OpenAIError),
    #[error("Completion parsing error: {0}")]
    CompletionParsing(String),
}
