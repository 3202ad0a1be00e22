//! JSON extraction for structured stage output.
//!
//! Even with a strict response schema, models occasionally wrap the object
//! in a markdown fence or add a sentence before it. Extraction locates the
//! JSON object inside the raw text without repairing it: a missing or cut
//! off object is reported, never guessed.
//!
//! # Extraction Strategies
//!
//! 1. JSON in a fenced code block (```json ... ``` or ``` ... ```)
//! 2. Content that is itself a JSON object
//! 3. The first balanced JSON object anywhere in the content

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Error type for JSON extraction failures
#[derive(Debug, Clone, Error, PartialEq)]
pub enum JsonExtractionError {
    #[error("JSON appears truncated: {unclosed_braces} unclosed braces, {unclosed_brackets} unclosed brackets")]
    Truncated {
        unclosed_braces: usize,
        unclosed_brackets: usize,
    },
    #[error("No JSON object found in response. Content starts with: '{content_preview}'")]
    NotFound { content_preview: String },
}

/// Brace/bracket balance of a piece of text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JsonStructureAnalysis {
    pub unclosed_braces: usize,
    pub unclosed_brackets: usize,
    pub in_string: bool,
    /// Byte offset of the first '{'.
    pub object_start: Option<usize>,
}

impl JsonStructureAnalysis {
    fn is_truncated(&self) -> bool {
        self.object_start.is_some()
            && (self.unclosed_braces > 0 || self.unclosed_brackets > 0 || self.in_string)
    }
}

/// Scan `s` tracking string literals and nesting depth.
pub fn analyze_json_structure(s: &str) -> JsonStructureAnalysis {
    let mut brace_depth: isize = 0;
    let mut bracket_depth: isize = 0;
    let mut in_string = false;
    let mut escape_next = false;
    let mut object_start = None;

    for (i, c) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => {
                object_start.get_or_insert(i);
                brace_depth += 1;
            }
            '}' if !in_string => brace_depth -= 1,
            '[' if !in_string => bracket_depth += 1,
            ']' if !in_string => bracket_depth -= 1,
            _ => {}
        }
    }

    JsonStructureAnalysis {
        unclosed_braces: brace_depth.max(0) as usize,
        unclosed_brackets: bracket_depth.max(0) as usize,
        in_string,
        object_start,
    }
}

/// Index of the '}' closing the object that opens at the start of `s`.
///
/// Braces inside string literals, including escaped quotes, are ignored.
pub fn find_matching_brace(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, c) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }

    None
}

fn code_block_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```(?:json|JSON)?[ \t]*\r?\n?(.*?)```").ok())
        .as_ref()
}

/// Contents of the first fenced code block holding a JSON object.
pub fn extract_from_code_block(content: &str) -> Option<String> {
    code_block_regex()?
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .find(|body| body.starts_with('{') && is_json(body))
        .map(str::to_string)
}

fn is_json(candidate: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(candidate).is_ok()
}

/// Locate the JSON object in a model response.
///
/// # Errors
///
/// `Truncated` when an object starts but never closes, `NotFound` when the
/// text holds no object at all.
pub fn extract_json_object(content: &str) -> Result<String, JsonExtractionError> {
    let trimmed = content.trim();

    if let Some(json) = extract_from_code_block(trimmed) {
        return Ok(json);
    }

    let mut offset = 0;
    while let Some(pos) = trimmed[offset..].find('{') {
        let start = offset + pos;
        if let Some(end) = find_matching_brace(&trimmed[start..]) {
            let candidate = &trimmed[start..=start + end];
            if is_json(candidate) {
                return Ok(candidate.to_string());
            }
        }
        offset = start + 1;
    }

    let analysis = analyze_json_structure(trimmed);
    if analysis.is_truncated() {
        return Err(JsonExtractionError::Truncated {
            unclosed_braces: analysis.unclosed_braces,
            unclosed_brackets: analysis.unclosed_brackets,
        });
    }

    Err(JsonExtractionError::NotFound {
        content_preview: trimmed.chars().take(50).collect(),
    })
}
