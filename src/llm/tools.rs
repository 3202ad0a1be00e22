//! Tool capabilities offered to the backend during generation.
//!
//! A tool is a named callable taking one query string and returning one
//! string. Tools are registered in a [`ToolRegistry`] that is passed
//! explicitly into the online lesson request; the registry both advertises
//! the tool definitions and dispatches the model's tool calls.

use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use super::client::{ToolCallInfo, ToolDefinition};

/// Name of the search capability advertised to the lesson stage.
pub const SEARCH_TOOL_NAME: &str = "google_search";

/// Errors that can occur while dispatching a tool call.
#[derive(Debug, Error, PartialEq)]
pub enum ToolError {
    /// The model asked for a tool that was never registered.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// The call arguments were not a `{"query": "..."}` object.
    #[error("Invalid arguments for tool '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },
}

/// A callable the model may invoke with a single query string.
pub trait Tool: Send + Sync {
    /// Returns the unique name of the tool.
    fn name(&self) -> &str;

    /// Returns a description of what the tool does.
    fn description(&self) -> &str;

    /// Run the tool.
    fn call(&self, query: &str) -> String;

    /// Definition advertised to the model: one required `query` string.
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            self.name(),
            self.description(),
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search query"
                    }
                },
                "required": ["query"]
            }),
        )
    }
}

#[derive(Debug, Deserialize)]
struct QueryArgs {
    query: String,
}

/// Search stub. Performs no network access.
#[derive(Debug, Default, Clone)]
pub struct SearchTool;

impl SearchTool {
    pub fn new() -> Self {
        Self
    }
}

impl Tool for SearchTool {
    fn name(&self) -> &str {
        SEARCH_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Search the web for current information about a topic and return the top results."
    }

    fn call(&self, query: &str) -> String {
        tracing::info!(tool = SEARCH_TOOL_NAME, query, "Lesson stage is searching");
        format!("Top search results for '{}' (simulated).", query)
    }
}

/// Lookup table of tools by name.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty tool registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Registry with the search stub registered.
    pub fn with_search() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(SearchTool::new()));
        registry
    }

    /// Register a tool, replacing any tool of the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Definitions of every registered tool, sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut names: Vec<&String> = self.tools.keys().collect();
        names.sort();
        names
            .into_iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.definition())
            .collect()
    }

    /// Run the tool named by `call` with its decoded query argument.
    pub fn dispatch(&self, call: &ToolCallInfo) -> Result<String, ToolError> {
        let name = call.function.name.as_str();
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        let args: QueryArgs = serde_json::from_str(&call.function.arguments).map_err(|e| {
            ToolError::InvalidArguments {
                tool: name.to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(tool.call(&args.query))
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.tools.keys().collect();
        names.sort();
        f.debug_struct("ToolRegistry").field("tools", &names).finish()
    }
}
