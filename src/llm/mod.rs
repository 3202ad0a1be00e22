//! Generative backend integration.
//!
//! - [`client`]: chat-completions wire types, the [`LlmProvider`] trait and
//!   the HTTP [`ChatClient`]
//! - [`retry`]: [`RemoteInvoker`], the single retry policy wrapping every
//!   remote call
//! - [`schema`]: strict output schemas for structured stages
//! - [`tools`]: tool capabilities the model may call during generation
//!
//! ```ignore
//! use std::sync::Arc;
//! use study_streamliner::llm::{ChatClient, GenerationRequest, Message, RemoteInvoker, RetryPolicy};
//!
//! let client = ChatClient::new(DEFAULT_API_BASE, api_key, DEFAULT_MODEL)?;
//! let invoker = RemoteInvoker::new(Arc::new(client), RetryPolicy::default());
//! let response = invoker
//!     .invoke(GenerationRequest::new("", vec![Message::user("Hello")]))
//!     .await?;
//! ```

pub mod client;
pub mod retry;
pub mod schema;
pub mod tools;

pub use client::{
    ChatClient, Choice, FunctionCall, GenerationRequest, GenerationResponse, LlmProvider, Message,
    ResponseFormat, ToolCallInfo, ToolChoice, ToolDefinition, Usage, DEFAULT_API_BASE,
    DEFAULT_MODEL,
};
pub use retry::{
    AttemptOutcome, CancellationToken, JitterSource, RemoteCallError, RemoteInvoker, RetryPolicy,
    SeededJitter, Sleeper, ThreadRngJitter, TokioSleeper, DEFAULT_ATTEMPTS,
    DEFAULT_BACKOFF_FACTOR, DEFAULT_MAX_JITTER,
};
pub use schema::{OutputSchema, SchemaField, SchemaType};
pub use tools::{SearchTool, Tool, ToolError, ToolRegistry, SEARCH_TOOL_NAME};
