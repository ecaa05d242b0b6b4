//! Migration: Create invites table

use sea_orm_migration::prelude::*;

use super::m20260214_000001_create_users::Users;
use super::m20260214_000002_create_students::Students;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Invites::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Invites::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Invites::SecretToken)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Invites::SenderId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Invites::RecipientId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Invites::Message).text().not_null())
                    .col(ColumnDef::new(Invites::WhyYou).text().not_null())
                    .col(ColumnDef::new(Invites::GreenFlag).text().not_null())
                    .col(ColumnDef::new(Invites::Passion).text().not_null())
                    .col(ColumnDef::new(Invites::Trait).text().not_null())
                    .col(
                        ColumnDef::new(Invites::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Invites::Response).json().null())
                    .col(ColumnDef::new(Invites::Followups).json().not_null())
                    .col(
                        ColumnDef::new(Invites::Revision)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Invites::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Invites::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Invites::Table, Invites::SenderId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Invites::Table, Invites::RecipientId)
                            .to(Students::Table, Students::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_invites_secret_token")
                    .table(Invites::Table)
                    .col(Invites::SecretToken)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Cooldown lookup: latest invite for a (sender, recipient) pair.
        manager
            .create_index(
                Index::create()
                    .name("idx_invites_pair_created")
                    .table(Invites::Table)
                    .col(Invites::SenderId)
                    .col(Invites::RecipientId)
                    .col(Invites::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Invites::Table).if_exists().to_owned())
            .await
    }
}

#[derive(Iden)]
enum Invites {
    Table,
    Id,
    #[iden = "secret_token"]
    SecretToken,
    #[iden = "sender_id"]
    SenderId,
    #[iden = "recipient_id"]
    RecipientId,
    Message,
    #[iden = "why_you"]
    WhyYou,
    #[iden = "green_flag"]
    GreenFlag,
    Passion,
    Trait,
    Status,
    Response,
    Followups,
    Revision,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
}
