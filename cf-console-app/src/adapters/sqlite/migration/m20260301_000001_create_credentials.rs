use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Credential::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Credential::Name)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Credential::Salt).string().not_null())
                    .col(ColumnDef::new(Credential::Nonce).string().not_null())
                    .col(ColumnDef::new(Credential::Ciphertext).string().not_null())
                    .col(ColumnDef::new(Credential::AccountId).string().null())
                    .col(ColumnDef::new(Credential::Email).string().null())
                    .col(
                        ColumnDef::new(Credential::IsCurrent)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Credential::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Credential {
    #[sea_orm(iden = "credentials")]
    Table,
    Name,
    Salt,
    Nonce,
    Ciphertext,
    AccountId,
    Email,
    IsCurrent,
}
