use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Identifiers for the `bookings` table and its columns.
#[derive(DeriveIden)]
enum Bookings {
    Table,
    Id,
    GuestId,
    CastId,
    BookingDate,
    StartTime,
    DurationHours,
    Location,
    Amount,
    Status,
    PaymentIntentId,
    AcceptedAt,
    DeclinedAt,
    CompletedAt,
    CancelledAt,
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
                    .table(Bookings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Bookings::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Bookings::GuestId).uuid().not_null())
                    .col(ColumnDef::new(Bookings::CastId).uuid().not_null())
                    .col(ColumnDef::new(Bookings::BookingDate).date().not_null())
                    .col(ColumnDef::new(Bookings::StartTime).time().not_null())
                    .col(
                        ColumnDef::new(Bookings::DurationHours)
                            .integer()
                            .not_null()
                            .check(Expr::col(Bookings::DurationHours).gte(1)),
                    )
                    .col(ColumnDef::new(Bookings::Location).string().not_null())
                    .col(ColumnDef::new(Bookings::Amount).double().not_null())
                    .col(
                        ColumnDef::new(Bookings::Status)
                            .string()
                            .not_null()
                            .check(Expr::col(Bookings::Status).is_in([
                                "pending",
                                "accepted",
                                "declined",
                                "completed",
                                "cancelled",
                            ])),
                    )
                    .col(ColumnDef::new(Bookings::PaymentIntentId).string().null())
                    .col(
                        ColumnDef::new(Bookings::AcceptedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Bookings::DeclinedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Bookings::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Bookings::CancelledAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Bookings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Bookings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookings_guest_id")
                            .from(Bookings::Table, Bookings::GuestId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookings_cast_id")
                            .from(Bookings::Table, Bookings::CastId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bookings::Table).to_owned())
            .await
    }
}
