use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sea_orm::prelude::Expr;
use sea_orm::*;
use uuid::Uuid;

use crate::models::bookings::{self, Status, Transition};

/// Fields of a new pending booking.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub id: Uuid,
    pub guest_id: Uuid,
    pub cast_id: Uuid,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_hours: i32,
    pub location: String,
    pub amount: f64,
    pub payment_intent_id: String,
}

/// Insert a new booking (always pending).
pub async fn insert_booking<C: ConnectionTrait>(
    db: &C,
    input: NewBooking,
) -> Result<bookings::Model, DbErr> {
    let now = Utc::now();
    bookings::ActiveModel {
        id: Set(input.id),
        guest_id: Set(input.guest_id),
        cast_id: Set(input.cast_id),
        booking_date: Set(input.booking_date),
        start_time: Set(input.start_time),
        duration_hours: Set(input.duration_hours),
        location: Set(input.location),
        amount: Set(input.amount),
        status: Set(Status::Pending),
        payment_intent_id: Set(Some(input.payment_intent_id)),
        accepted_at: Set(None),
        declined_at: Set(None),
        completed_at: Set(None),
        cancelled_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
}

/// Fetch a single booking by ID.
pub async fn get_booking_by_id<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<Option<bookings::Model>, DbErr> {
    bookings::Entity::find_by_id(id).one(db).await
}

/// Pending or accepted bookings of one cast on one date.
pub async fn get_active_bookings_for_cast<C: ConnectionTrait>(
    db: &C,
    cast_id: Uuid,
    date: NaiveDate,
) -> Result<Vec<bookings::Model>, DbErr> {
    bookings::Entity::find()
        .filter(bookings::Column::CastId.eq(cast_id))
        .filter(bookings::Column::BookingDate.eq(date))
        .filter(bookings::Column::Status.is_in(Status::ACTIVE))
        .all(db)
        .await
}

/// Pending or accepted bookings of every cast on one date.
pub async fn get_active_bookings_on(
    db: &DatabaseConnection,
    date: NaiveDate,
) -> Result<Vec<bookings::Model>, DbErr> {
    bookings::Entity::find()
        .filter(bookings::Column::BookingDate.eq(date))
        .filter(bookings::Column::Status.is_in(Status::ACTIVE))
        .all(db)
        .await
}

/// Apply `transition` as a single conditional update keyed on the booking's
/// current status. Returns `None` when another request changed it first.
pub async fn apply_transition(
    db: &DatabaseConnection,
    booking: &bookings::Model,
    transition: Transition,
    now: DateTime<Utc>,
) -> Result<Option<bookings::Model>, DbErr> {
    let target = match booking.status.apply(transition) {
        Ok(target) => target,
        Err(_) => return Ok(None),
    };
    let stamp = match transition {
        Transition::Accept => bookings::Column::AcceptedAt,
        Transition::Decline => bookings::Column::DeclinedAt,
        Transition::Cancel => bookings::Column::CancelledAt,
        Transition::Complete => bookings::Column::CompletedAt,
    };

    let result = bookings::Entity::update_many()
        .col_expr(bookings::Column::Status, Expr::value(target))
        .col_expr(stamp, Expr::value(now))
        .col_expr(bookings::Column::UpdatedAt, Expr::value(now))
        .filter(bookings::Column::Id.eq(booking.id))
        .filter(bookings::Column::Status.eq(booking.status))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Ok(None);
    }
    get_booking_by_id(db, booking.id).await
}

/// Bookings received by a cast, latest slot first.
pub async fn get_bookings_for_cast(
    db: &DatabaseConnection,
    cast_id: Uuid,
    status: Option<Status>,
) -> Result<Vec<bookings::Model>, DbErr> {
    let mut query = bookings::Entity::find().filter(bookings::Column::CastId.eq(cast_id));
    if let Some(status) = status {
        query = query.filter(bookings::Column::Status.eq(status));
    }
    query
        .order_by_desc(bookings::Column::BookingDate)
        .order_by_desc(bookings::Column::StartTime)
        .all(db)
        .await
}

/// Bookings made by a guest, latest slot first.
pub async fn get_bookings_for_guest(
    db: &DatabaseConnection,
    guest_id: Uuid,
    status: Option<Status>,
) -> Result<Vec<bookings::Model>, DbErr> {
    let mut query = bookings::Entity::find().filter(bookings::Column::GuestId.eq(guest_id));
    if let Some(status) = status {
        query = query.filter(bookings::Column::Status.eq(status));
    }
    query
        .order_by_desc(bookings::Column::BookingDate)
        .order_by_desc(bookings::Column::StartTime)
        .all(db)
        .await
}

pub async fn get_booking_by_payment_intent(
    db: &DatabaseConnection,
    payment_intent_id: &str,
) -> Result<Option<bookings::Model>, DbErr> {
    bookings::Entity::find()
        .filter(bookings::Column::PaymentIntentId.eq(payment_intent_id))
        .one(db)
        .await
}

// ── Admin queries ──

pub async fn count_bookings(db: &DatabaseConnection) -> Result<u64, DbErr> {
    bookings::Entity::find().count(db).await
}

/// Sum of completed booking amounts.
pub async fn completed_revenue(db: &DatabaseConnection) -> Result<f64, DbErr> {
    let total: Option<Option<f64>> = bookings::Entity::find()
        .select_only()
        .column_as(bookings::Column::Amount.sum(), "total")
        .filter(bookings::Column::Status.eq(Status::Completed))
        .into_tuple()
        .one(db)
        .await?;

    Ok(total.flatten().unwrap_or(0.0))
}

/// One page of bookings, newest first, plus the total matching count.
pub async fn get_bookings_page(
    db: &DatabaseConnection,
    status: Option<Status>,
    page: u64,
    limit: u64,
) -> Result<(Vec<bookings::Model>, u64), DbErr> {
    let mut query = bookings::Entity::find();
    if let Some(status) = status {
        query = query.filter(bookings::Column::Status.eq(status));
    }

    let paginator = query
        .order_by_desc(bookings::Column::CreatedAt)
        .paginate(db, limit);
    let total = paginator.num_items().await?;
    let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

    Ok((rows, total))
}

/// `(date, status, amount)` for bookings dated on or after `since`.
pub async fn get_trend_rows(
    db: &DatabaseConnection,
    since: NaiveDate,
) -> Result<Vec<(NaiveDate, Status, f64)>, DbErr> {
    bookings::Entity::find()
        .select_only()
        .column(bookings::Column::BookingDate)
        .column(bookings::Column::Status)
        .column(bookings::Column::Amount)
        .filter(bookings::Column::BookingDate.gte(since))
        .into_tuple()
        .all(db)
        .await
}

/// `(cast_id, amount)` of every completed booking.
pub async fn get_completed_amounts(db: &DatabaseConnection) -> Result<Vec<(Uuid, f64)>, DbErr> {
    bookings::Entity::find()
        .select_only()
        .column(bookings::Column::CastId)
        .column(bookings::Column::Amount)
        .filter(bookings::Column::Status.eq(Status::Completed))
        .into_tuple()
        .all(db)
        .await
}
