use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum CastProfiles {
    Table,
    Id,
    UserId,
    Bio,
    HourlyRate,
    Rank,
    ServiceAreas,
    ApprovalStatus,
    ApprovedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CastProfiles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CastProfiles::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CastProfiles::UserId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(CastProfiles::Bio).text().null())
                    .col(ColumnDef::new(CastProfiles::HourlyRate).double().not_null())
                    .col(ColumnDef::new(CastProfiles::Rank).string().not_null())
                    .col(
                        ColumnDef::new(CastProfiles::ServiceAreas)
                            .array(ColumnType::String(StringLen::None))
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CastProfiles::ApprovalStatus)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CastProfiles::ApprovedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CastProfiles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CastProfiles::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cast_profiles_user_id")
                            .from(CastProfiles::Table, CastProfiles::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CastProfiles::Table).to_owned())
            .await
    }
}
