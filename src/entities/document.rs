use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub filename: String,
    pub doc_type: DocumentType,
    pub file_path: String,
    pub status: DocumentStatus,
    /// Generated SRS text, set only once the document is COMPLETED.
    pub extracted_data: Option<Vec<u8>>,
    /// Location of the rendered artifact, set only once the document is COMPLETED.
    pub result_link: Option<String>,
    /// Generated text kept after a failed render so a retry can skip the AI call.
    #[sea_orm(column_type = "Text", nullable)]
    pub draft_content: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub error_message: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(EnumIter, DeriveActiveEnum, Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, utoipa::ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "UPPERCASE")]
pub enum DocumentType {
    #[sea_orm(string_value = "BRD")]
    Brd,
    #[sea_orm(string_value = "SRS")]
    Srs,
    #[sea_orm(string_value = "OTHER")]
    Other,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Brd => "BRD",
            DocumentType::Srs => "SRS",
            DocumentType::Other => "OTHER",
        }
    }
}

impl std::str::FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BRD" => Ok(DocumentType::Brd),
            "SRS" => Ok(DocumentType::Srs),
            "OTHER" => Ok(DocumentType::Other),
            other => Err(format!("Unknown document type '{}'", other)),
        }
    }
}

#[derive(EnumIter, DeriveActiveEnum, Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, utoipa::ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "UPPERCASE")]
pub enum DocumentStatus {
    #[sea_orm(string_value = "UPLOADED")]
    Uploaded,
    #[sea_orm(string_value = "PROCESSING")]
    Processing,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "FAILED")]
    Failed,
}

impl DocumentStatus {
    /// States from which a processing run may start.
    pub fn can_start_processing(&self) -> bool {
        matches!(self, DocumentStatus::Uploaded | DocumentStatus::Failed)
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DocumentStatus::Uploaded => "UPLOADED",
            DocumentStatus::Processing => "PROCESSING",
            DocumentStatus::Completed => "COMPLETED",
            DocumentStatus::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
