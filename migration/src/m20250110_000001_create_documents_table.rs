use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Documents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Documents::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Documents::Filename).string().not_null())
                    .col(ColumnDef::new(Documents::DocType).string().not_null())
                    .col(ColumnDef::new(Documents::FilePath).string().not_null())
                    .col(
                        ColumnDef::new(Documents::Status)
                            .string()
                            .not_null()
                            .default("UPLOADED"),
                    )
                    .col(ColumnDef::new(Documents::ExtractedData).binary())
                    .col(ColumnDef::new(Documents::ResultLink).string())
                    .col(ColumnDef::new(Documents::DraftContent).text())
                    .col(ColumnDef::new(Documents::ErrorMessage).text())
                    .col(ColumnDef::new(Documents::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Documents::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_documents_status")
                    .table(Documents::Table)
                    .col(Documents::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Documents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Documents {
    Table,
    Id,
    Filename,
    DocType,
    FilePath,
    Status,
    ExtractedData,
    ResultLink,
    DraftContent,
    ErrorMessage,
    CreatedAt,
    UpdatedAt,
}
