use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SrsSection {
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[schema(value_type = Vec<Object>)]
    pub subsections: Vec<SrsSection>,
}

impl SrsSection {
    pub fn new(title: &str, content: &str) -> Self {
        Self {
            title: title.to_string(),
            content: content.to_string(),
            subsections: Vec::new(),
        }
    }
}

/// Fixed outline stored alongside every generated SRS.
///
/// Placeholder metadata: it is not parsed from the generated text, so it does
/// not reflect the headings the provider actually produced.
pub fn placeholder_outline() -> Vec<SrsSection> {
    vec![
        SrsSection::new("Introduction", "Generated introduction"),
        SrsSection::new("Functional Requirements", "Generated requirements"),
        SrsSection::new(
            "Non-Functional Requirements",
            "Generated non-functional requirements",
        ),
    ]
}
