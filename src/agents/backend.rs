//! Content backends shared by the three stages.
//!
//! A stage holds one [`ContentBackend`], picked once when the pipeline is
//! built: either the remote model behind a [`RemoteInvoker`] or the
//! deterministic [`OfflineContentProvider`].

use serde::de::DeserializeOwned;
use std::sync::Arc;

use super::error::{StageError, StageName, StageResult};
use super::offline::OfflineContentProvider;
use super::types::{ArtifactError, Quiz, StudyPlan};
use crate::llm::{
    GenerationRequest, GenerationResponse, Message, OutputSchema, RemoteInvoker, ToolRegistry,
};
use crate::prompts::StagePrompt;
use crate::utils::extract_json_object;

/// Temperature for structured stages.
const STRUCTURED_TEMPERATURE: f64 = 0.3;

/// Temperature for the free-form lesson.
const LESSON_TEMPERATURE: f64 = 0.7;

/// Token ceiling per generation request.
const MAX_TOKENS: u32 = 8192;

/// A structured artifact that can check its own invariants after parsing.
pub trait Artifact: DeserializeOwned {
    fn validate(&self) -> Result<(), ArtifactError>;
}

impl Artifact for StudyPlan {
    fn validate(&self) -> Result<(), ArtifactError> {
        StudyPlan::validate(self)
    }
}

impl Artifact for Quiz {
    fn validate(&self) -> Result<(), ArtifactError> {
        Quiz::validate(self)
    }
}

/// Where a stage gets its content from.
#[derive(Debug, Clone)]
pub enum ContentBackend {
    Remote(RemoteBackend),
    Offline(OfflineContentProvider),
}

impl ContentBackend {
    pub fn is_offline(&self) -> bool {
        matches!(self, ContentBackend::Offline(_))
    }
}

/// Remote model access for the online path.
#[derive(Debug, Clone)]
pub struct RemoteBackend {
    invoker: Arc<RemoteInvoker>,
    model: String,
}

impl RemoteBackend {
    pub fn new(invoker: Arc<RemoteInvoker>, model: impl Into<String>) -> Self {
        Self {
            invoker,
            model: model.into(),
        }
    }

    fn request(&self, messages: Vec<Message>, temperature: f64) -> GenerationRequest {
        GenerationRequest::new(self.model.clone(), messages)
            .with_temperature(temperature)
            .with_max_tokens(MAX_TOKENS)
    }

    async fn invoke(
        &self,
        stage: StageName,
        request: GenerationRequest,
    ) -> StageResult<GenerationResponse> {
        self.invoker
            .invoke(request)
            .await
            .map_err(|source| StageError::RemoteCall { stage, source })
    }

    /// Generate a structured artifact conforming to `schema`.
    ///
    /// # Errors
    ///
    /// `RemoteCall` when the invoker gives up, `SchemaParse` when the text is
    /// not a valid artifact. Parse failures are never retried.
    pub async fn generate_structured<T: Artifact>(
        &self,
        stage: StageName,
        prompt: &StagePrompt,
        schema: &OutputSchema,
    ) -> StageResult<T> {
        let request = self
            .request(
                vec![
                    Message::system(prompt.system.clone()),
                    Message::user(prompt.user.clone()),
                ],
                STRUCTURED_TEMPERATURE,
            )
            .with_response_format(schema.response_format());

        let response = self.invoke(stage, request).await?;
        let raw = response.first_content().unwrap_or_default();
        parse_structured(stage, raw)
    }

    /// Generate free text, letting the model call tools from `tools`.
    ///
    /// Every round trip goes through the invoker. Tool failures are sent back
    /// to the model as tool results. At most `max_turns` requests are made.
    ///
    /// # Errors
    ///
    /// `RemoteCall` when a round trip fails, `ToolLoopExhausted` when the
    /// last allowed response still asks for tools.
    pub async fn generate_with_tools(
        &self,
        stage: StageName,
        prompt: &StagePrompt,
        tools: &ToolRegistry,
        max_turns: usize,
    ) -> StageResult<String> {
        let definitions = tools.definitions();
        let mut messages = vec![
            Message::system(prompt.system.clone()),
            Message::user(prompt.user.clone()),
        ];

        for turn in 0..max_turns {
            let request = self
                .request(messages.clone(), LESSON_TEMPERATURE)
                .with_tools(definitions.clone());
            let response = self.invoke(stage, request).await?;

            let Some(tool_calls) = response.first_tool_calls() else {
                return Ok(response.first_content().unwrap_or_default().to_string());
            };

            tracing::debug!(
                stage = %stage,
                turn = turn + 1,
                calls = tool_calls.len(),
                "Model requested tool calls"
            );
            messages.push(Message::assistant_with_tool_calls(
                response.first_content().unwrap_or_default(),
                tool_calls.to_vec(),
            ));

            for call in tool_calls {
                let output = tools.dispatch(call).unwrap_or_else(|e| {
                    tracing::warn!(stage = %stage, tool = %call.function.name, error = %e, "Tool call failed");
                    format!("Error: {}", e)
                });
                messages.push(Message::tool_result(&call.id, output));
            }
        }

        tracing::error!(stage = %stage, turns = max_turns, "Tool loop exhausted");
        Err(StageError::ToolLoopExhausted {
            stage,
            turns: max_turns,
        })
    }
}

/// Parse and validate a structured artifact from raw model text.
pub fn parse_structured<T: Artifact>(stage: StageName, raw: &str) -> StageResult<T> {
    let json = extract_json_object(raw).map_err(|e| StageError::schema_parse(stage, e, raw))?;
    let artifact: T =
        serde_json::from_str(&json).map_err(|e| StageError::schema_parse(stage, e, raw))?;
    artifact
        .validate()
        .map_err(|e| StageError::schema_parse(stage, e, raw))?;
    Ok(artifact)
}
