use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Bookings {
    Table,
    GuestId,
    CastId,
    BookingDate,
    PaymentIntentId,
}

#[derive(DeriveIden)]
enum Reviews {
    Table,
    ReviewedId,
}

#[derive(DeriveIden)]
enum CastProfiles {
    Table,
    ApprovalStatus,
}

#[derive(DeriveIden)]
enum Reports {
    Table,
    Status,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Conflict checks and availability filtering read a cast's day.
        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_cast_date")
                    .table(Bookings::Table)
                    .col(Bookings::CastId)
                    .col(Bookings::BookingDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_guest_id")
                    .table(Bookings::Table)
                    .col(Bookings::GuestId)
                    .to_owned(),
            )
            .await?;

        // Webhook deliveries look bookings up by payment intent.
        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_payment_intent_id")
                    .table(Bookings::Table)
                    .col(Bookings::PaymentIntentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reviews_reviewed_id")
                    .table(Reviews::Table)
                    .col(Reviews::ReviewedId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_cast_profiles_approval_status")
                    .table(CastProfiles::Table)
                    .col(CastProfiles::ApprovalStatus)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reports_status")
                    .table(Reports::Table)
                    .col(Reports::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in [
            "idx_bookings_cast_date",
            "idx_bookings_guest_id",
            "idx_bookings_payment_intent_id",
            "idx_reviews_reviewed_id",
            "idx_cast_profiles_approval_status",
            "idx_reports_status",
        ] {
            manager
                .drop_index(Index::drop().name(name).to_owned())
                .await?;
        }

        Ok(())
    }
}
