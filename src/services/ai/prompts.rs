use tracing::error;

use super::{AiError, AiResult};
use crate::models::analysis::DocumentAnalysis;

/// Section order every generated SRS must follow.
pub const SRS_SECTIONS: [&str; 7] = [
    "Introduction",
    "Overall Description",
    "Functional Requirements",
    "Non-Functional Requirements",
    "System Features",
    "External Interface Requirements",
    "Other Requirements",
];

pub const SYSTEM_ANALYST_ROLE: &str = "You are a Senior System Analyst who writes precise, \
complete Software Requirements Specifications from business requirement documents.";

pub fn srs_prompt(source_text: &str) -> String {
    let outline = SRS_SECTIONS
        .iter()
        .enumerate()
        .map(|(i, title)| format!("{}. {}", i + 1, title))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Write a comprehensive Software Requirements Specification (SRS) in Markdown \
based on the business requirements below.

Notes:
- The input is text extracted from a document. Images and diagrams are not included.
- If the text refers to a missing diagram (e.g. \"see Figure 1\"), infer its logic from the surrounding context where possible.
- Output ONLY the SRS body. Do not add greetings, explanations or closing remarks.

Use exactly these top-level sections, in this order:
{outline}

Input:
{source_text}"
    )
}

pub fn extract_prompt(type_hint: &str, content: &str) -> String {
    format!(
        "Extract and summarize the key information from this {} document:\n\n{}",
        type_hint, content
    )
}

pub fn analysis_prompt(content: &str) -> String {
    format!(
        "Analyze this document and extract key information in JSON format:

{content}

Return a JSON object with: title, summary, key_points (array), requirements (array), stakeholders (array)"
    )
}

/// Strips a wrapping Markdown code fence (```json ... ```), if present.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }

    let start = trimmed.find('\n').map(|i| i + 1).unwrap_or(trimmed.len());
    let end = trimmed[start..]
        .rfind("```")
        .map(|i| i + start)
        .unwrap_or(trimmed.len());
    trimmed[start..end].trim()
}

/// Removes the chat scaffolding some models wrap around a document.
pub fn clean_generated_document(raw: &str) -> String {
    let body = strip_code_fence(raw);

    let mut lines = body.lines();
    let first = lines.clone().next().unwrap_or_default().trim();
    let lowered = first.to_ascii_lowercase();
    let is_preamble = first.ends_with(':')
        && ["here is", "here's", "sure", "certainly", "below is"]
            .iter()
            .any(|p| lowered.starts_with(p));

    if is_preamble {
        lines.next();
        lines.collect::<Vec<_>>().join("\n").trim().to_string()
    } else {
        body.to_string()
    }
}

pub fn parse_analysis(raw: &str) -> AiResult<DocumentAnalysis> {
    let json_text = strip_code_fence(raw);
    serde_json::from_str(json_text).map_err(|e| {
        error!(
            "Analysis JSON parsing failed: {}. Snippet: {}",
            e,
            json_text.chars().take(500).collect::<String>()
        );
        AiError::MalformedResponse(format!("Failed to parse analysis JSON: {}", e))
    })
}
