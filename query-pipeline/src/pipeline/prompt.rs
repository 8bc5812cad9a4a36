use async_openai::{
    error::OpenAIError,
    types::{
        ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
    },
};

/// Completion model answering queries, with default sampling parameters.
pub const COMPLETION_MODEL: &str = "gpt-3.5-turbo-0125";

/// Upper bound on context characters forwarded to the completion model:
/// a 4000-token allowance at roughly three characters per token. The cut is
/// a plain prefix; the retrieval service front-loads the relevant passages.
pub const MAX_CONTEXT_CHARS: usize = 4000 * 3;

/// Answer returned when retrieval produced nothing. Never cached.
pub const NO_RELEVANT_CONTENT: &str = "No relevant content found for your query.";

pub const SYSTEM_PROMPT: &str =
    "You are a helpful AI agent tasked with helping users extract information from the context below";

/// Keeps the first `max_chars` characters. Counted in characters so a
/// multi-byte code point is never split.
pub fn truncate_context(context: &str, max_chars: usize) -> String {
    if context.chars().count() <= max_chars {
        return context.to_string();
    }

    context.chars().take(max_chars).collect()
}

/// Exactly two messages: the instructions with the fenced context, then the
/// query verbatim.
pub fn build_completion_request(
    context: &str,
    query: &str,
) -> Result<CreateChatCompletionRequest, OpenAIError> {
    let system_message = format!("{SYSTEM_PROMPT}\n\n===\n{context}\n===");

    CreateChatCompletionRequestArgs::default()
        .model(COMPLETION_MODEL)
        .messages([
            ChatCompletionRequestSystemMessage::from(system_message).into(),
            ChatCompletionRequestUserMessage::from(query).into(),
        ])
        .build()
}
