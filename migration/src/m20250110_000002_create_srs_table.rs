use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // source_document_id is a weak reference: SRS rows outlive their document.
        manager
            .create_table(
                Table::create()
                    .table(Srs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Srs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Srs::SourceDocumentId).integer().not_null())
                    .col(ColumnDef::new(Srs::Title).string().not_null())
                    .col(
                        ColumnDef::new(Srs::Version)
                            .string()
                            .not_null()
                            .default("1.0"),
                    )
                    .col(ColumnDef::new(Srs::Content).text().not_null())
                    .col(ColumnDef::new(Srs::Sections).json().not_null())
                    .col(
                        ColumnDef::new(Srs::Status)
                            .string()
                            .not_null()
                            .default("DRAFT"),
                    )
                    .col(ColumnDef::new(Srs::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Srs::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_srs_source_document_id")
                    .table(Srs::Table)
                    .col(Srs::SourceDocumentId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Srs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Srs {
    Table,
    Id,
    SourceDocumentId,
    Title,
    Version,
    Content,
    Sections,
    Status,
    CreatedAt,
    UpdatedAt,
}
