use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MailerEmails::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MailerEmails::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MailerEmails::Uuid)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MailerEmails::MessageClass)
                            .string_len(255)
                            .null(),
                    )
                    .col(ColumnDef::new(MailerEmails::RequestPayload).blob().not_null())
                    .col(ColumnDef::new(MailerEmails::ResponsePayload).blob().null())
                    .col(
                        ColumnDef::new(MailerEmails::Status)
                            .string_len(20)
                            .not_null()
                            .default("sent"),
                    )
                    .col(
                        ColumnDef::new(MailerEmails::DeliveredAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(MailerEmails::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Lookup index for delivery confirmations. Not unique: retried sends
        // share a batch token.
        manager
            .create_index(
                Index::create()
                    .name("idx_mailer_emails_uuid")
                    .table(MailerEmails::Table)
                    .col(MailerEmails::Uuid)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_mailer_emails_status")
                    .table(MailerEmails::Table)
                    .col(MailerEmails::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MailerEmails::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum MailerEmails {
    Table,
    Id,
    Uuid,
    MessageClass,
    RequestPayload,
    ResponsePayload,
    Status,
    DeliveredAt,
    CreatedAt,
}
