use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OtpChallenges::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OtpChallenges::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OtpChallenges::Phone).string().not_null())
                    .col(ColumnDef::new(OtpChallenges::Purpose).string().not_null())
                    .col(ColumnDef::new(OtpChallenges::Code).string().not_null())
                    .col(ColumnDef::new(OtpChallenges::DisplayName).string())
                    .col(
                        ColumnDef::new(OtpChallenges::Attempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(OtpChallenges::Used)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(OtpChallenges::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OtpChallenges::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Serves both "latest per (phone, purpose)" and the hourly count per phone.
        manager
            .create_index(
                Index::create()
                    .table(OtpChallenges::Table)
                    .col(OtpChallenges::Phone)
                    .col(OtpChallenges::Purpose)
                    .col(OtpChallenges::CreatedAt)
                    .name("idx_otp_challenges_phone_purpose_created_at")
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(OtpChallenges::Table)
                    .col(OtpChallenges::ExpiresAt)
                    .name("idx_otp_challenges_expires_at")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OtpChallenges::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum OtpChallenges {
    Table,
    Id,
    Phone,
    Purpose,
    Code,
    DisplayName,
    Attempts,
    Used,
    CreatedAt,
    ExpiresAt,
}
