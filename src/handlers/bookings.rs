use std::collections::HashSet;

use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};
use uuid::Uuid;
use validator::Validate;

use crate::auth::authorization;
use crate::auth::middleware::{AuthenticatedUser, CastUser, GuestUser};
use crate::config::AppConfig;
use crate::db::blocks as block_db;
use crate::db::bookings::{self as booking_db, NewBooking};
use crate::db::cast_profiles as cast_db;
use crate::db::users as user_db;
use crate::error::{AppError, AppResult};
use crate::models::bookings::{
    self, BookingCreated, BookingView, CreateBookingRequest, Party, StatusFilter, Transition,
    booking_amount,
};
use crate::models::cast_profiles::ApprovalStatus;
use crate::models::users;
use crate::services::email::Notifier;
use crate::services::payments::{AuthorizationRequest, PaymentGateway};

/// Attach guest and cast summaries to a list of bookings.
pub(crate) async fn booking_views(
    db: &DatabaseConnection,
    bookings: Vec<bookings::Model>,
    now: DateTime<Utc>,
) -> AppResult<Vec<BookingView>> {
    let ids: HashSet<Uuid> = bookings
        .iter()
        .flat_map(|b| [b.guest_id, b.cast_id])
        .collect();
    let summaries = user_db::get_summaries_by_ids(db, ids.into_iter().collect()).await?;

    Ok(bookings
        .into_iter()
        .map(|b| {
            let guest = summaries.get(&b.guest_id).cloned();
            let cast = summaries.get(&b.cast_id).cloned();
            BookingView::new(b, now).with_guest(guest).with_cast(cast)
        })
        .collect())
}

/// Guest and cast accounts of a booking, for notifications. Lookup failures
/// are logged and skip the email.
pub(crate) async fn booking_parties(
    db: &DatabaseConnection,
    booking: &bookings::Model,
) -> Option<(users::Model, users::Model)> {
    match user_db::get_users_by_ids(db, vec![booking.guest_id, booking.cast_id]).await {
        Ok(mut found) => {
            let guest = found.remove(&booking.guest_id)?;
            let cast = found.remove(&booking.cast_id)?;
            Some((guest, cast))
        }
        Err(e) => {
            tracing::warn!(error = %e, booking_id = %booking.id, "failed to load booking parties");
            None
        }
    }
}

/// Release a card hold; failures are logged and never surface to the caller.
pub(crate) async fn release_hold(payments: &dyn PaymentGateway, booking: Uuid, intent_id: &str) {
    if let Err(e) = payments.cancel(intent_id, booking).await {
        tracing::warn!(error = %e, booking_id = %booking, intent_id, "failed to release payment hold");
    }
}

/// Refund a capture whose status update then lost a race. Failures are logged
/// at error level with the intent id.
pub(crate) async fn refund_capture(payments: &dyn PaymentGateway, booking: Uuid, intent_id: &str) {
    match payments.refund(intent_id, booking).await {
        Ok(refund) => {
            tracing::warn!(booking_id = %booking, intent_id, refund_id = %refund.id, "refunded capture for lost response");
        }
        Err(e) => {
            tracing::error!(error = %e, booking_id = %booking, intent_id, "failed to refund captured payment");
        }
    }
}

async fn persist_booking(
    txn: DatabaseTransaction,
    booking: NewBooking,
) -> Result<bookings::Model, DbErr> {
    let created = booking_db::insert_booking(&txn, booking).await?;
    txn.commit().await?;
    Ok(created)
}

/// POST /api/guest/bookings
///
/// Request a cast for a time slot. The guest's card is authorized for the full
/// amount; it is captured only when the cast accepts. The cast's profile row
/// stays locked from the conflict check until the insert commits, so two
/// requests for the same cast cannot both pass the overlap check. The lock
/// spans the authorization call, bounded by `payments::worst_case_call_time`.
pub async fn create_booking(
    GuestUser(user): GuestUser,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    payments: web::Data<dyn PaymentGateway>,
    notifier: web::Data<Notifier>,
    body: web::Json<CreateBookingRequest>,
) -> AppResult<HttpResponse> {
    let input = body.into_inner();
    input.validate()?;
    let slot = input.slot();

    let txn = db.begin().await?;

    // 1. The cast must exist and be approved.
    let profile = cast_db::lock_profile_by_user_id(&txn, input.cast_id)
        .await?
        .ok_or_else(|| AppError::not_found("Cast not found"))?;
    if profile.approval_status != ApprovalStatus::Approved {
        return Err(AppError::validation("Cast is not available for booking"));
    }

    // 2. No pending or accepted booking of this cast may overlap the slot.
    let active = booking_db::get_active_bookings_for_cast(&txn, input.cast_id, slot.date).await?;
    if active.iter().any(|b| b.slot().overlaps(&slot)) {
        return Err(AppError::conflict("Time slot is already booked"));
    }

    // 3. Casts can refuse guests they blocked.
    if block_db::has_blocked(&txn, input.cast_id, user.id).await? {
        return Err(AppError::forbidden("This cast is not accepting your bookings"));
    }

    // 4. Hold the amount on the guest's card.
    let booking_id = Uuid::new_v4();
    let amount = booking_amount(profile.hourly_rate, input.duration_hours);
    let intent = payments
        .authorize(AuthorizationRequest {
            booking_id,
            guest_id: user.id,
            cast_id: input.cast_id,
            amount,
            currency: config.payments.currency.clone(),
        })
        .await?;

    // 5. Persist; if that fails, give the hold back.
    let new_booking = NewBooking {
        id: booking_id,
        guest_id: user.id,
        cast_id: input.cast_id,
        booking_date: input.booking_date,
        start_time: input.start_time,
        duration_hours: input.duration_hours,
        location: input.location.trim().to_string(),
        amount,
        payment_intent_id: intent.id.clone(),
    };
    let booking = match persist_booking(txn, new_booking).await {
        Ok(booking) => booking,
        Err(e) => {
            release_hold(&**payments, booking_id, &intent.id).await;
            return Err(e.into());
        }
    };

    tracing::info!(
        booking_id = %booking.id,
        guest_id = %user.id,
        cast_id = %booking.cast_id,
        amount,
        "booking requested"
    );

    if let Some((guest, cast)) = booking_parties(db.get_ref(), &booking).await {
        notifier.dispatch(notifier.booking_requested(&cast.email, &cast.name, &guest.name, &booking));
    }

    Ok(HttpResponse::Created().json(BookingCreated {
        booking_id: booking.id,
        amount: booking.amount,
        status: booking.status,
        client_secret: intent.client_secret,
        payment_intent: intent.id,
    }))
}

/// GET /api/guest/bookings
pub async fn get_guest_bookings(
    GuestUser(user): GuestUser,
    db: web::Data<DatabaseConnection>,
    query: web::Query<StatusFilter>,
) -> AppResult<HttpResponse> {
    let list = booking_db::get_bookings_for_guest(db.get_ref(), user.id, query.status).await?;
    Ok(HttpResponse::Ok().json(booking_views(db.get_ref(), list, Utc::now()).await?))
}

/// POST /api/guest/bookings/{id}/cancel
///
/// A guest withdraws a pending request. The hold is released only after this
/// request's status change wins; a request that loses to a concurrent accept
/// leaves the payment alone. Release failures are logged, not returned.
pub async fn cancel_booking(
    GuestUser(user): GuestUser,
    db: web::Data<DatabaseConnection>,
    payments: web::Data<dyn PaymentGateway>,
    notifier: web::Data<Notifier>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let booking =
        authorization::booking_as_party(db.get_ref(), path.into_inner(), user.id, Party::Guest)
            .await?;
    booking.check_cancel()?;

    let now = Utc::now();
    let cancelled = booking_db::apply_transition(db.get_ref(), &booking, Transition::Cancel, now)
        .await?
        .ok_or_else(|| AppError::conflict("Booking is no longer pending"))?;

    if let Some(intent_id) = cancelled.payment_intent_id.as_deref() {
        release_hold(&**payments, cancelled.id, intent_id).await;
    }

    tracing::info!(booking_id = %cancelled.id, "booking cancelled");

    if let Some((_, cast)) = booking_parties(db.get_ref(), &cancelled).await {
        notifier.dispatch(notifier.booking_cancelled(&cast.email, &cast.name, &cancelled));
    }

    Ok(HttpResponse::Ok().json(BookingView::new(cancelled, now)))
}

/// GET /api/bookings/{id}
pub async fn get_booking(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let (booking, _) =
        authorization::visible_booking(db.get_ref(), path.into_inner(), user.id).await?;
    let mut views = booking_views(db.get_ref(), vec![booking], Utc::now()).await?;

    match views.pop() {
        Some(view) => Ok(HttpResponse::Ok().json(view)),
        None => Err(AppError::not_found("Booking not found")),
    }
}

/// POST /api/bookings/{id}/complete
///
/// The cast marks an accepted booking done once its scheduled end has passed.
pub async fn complete_booking(
    CastUser(user): CastUser,
    db: web::Data<DatabaseConnection>,
    notifier: web::Data<Notifier>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let booking =
        authorization::booking_as_party(db.get_ref(), path.into_inner(), user.id, Party::Cast)
            .await?;

    let now = Utc::now();
    booking.check_complete(now)?;

    let completed = booking_db::apply_transition(db.get_ref(), &booking, Transition::Complete, now)
        .await?
        .ok_or_else(|| AppError::conflict("Booking is no longer accepted"))?;

    tracing::info!(booking_id = %completed.id, "booking completed");

    if let Some((guest, cast)) = booking_parties(db.get_ref(), &completed).await {
        notifier.dispatch(notifier.review_request(&guest.email, &guest.name, &cast.name, &completed));
        notifier.dispatch(notifier.review_request(&cast.email, &cast.name, &guest.name, &completed));
    }

    Ok(HttpResponse::Ok().json(BookingView::new(completed, now)))
}
