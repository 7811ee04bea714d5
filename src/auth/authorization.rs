use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::db::bookings as booking_db;
use crate::error::{AppError, AppResult};
use crate::models::bookings::{Model, Party};

async fn fetch_booking(db: &DatabaseConnection, booking_id: Uuid) -> AppResult<Model> {
    booking_db::get_booking_by_id(db, booking_id)
        .await?
        .ok_or_else(|| AppError::not_found("Booking not found"))
}

/// A booking visible to `user_id`. Bookings the caller is not party to are
/// reported as not found.
pub async fn visible_booking(
    db: &DatabaseConnection,
    booking_id: Uuid,
    user_id: Uuid,
) -> AppResult<(Model, Party)> {
    let booking = fetch_booking(db, booking_id).await?;
    match booking.party_of(user_id) {
        Some(party) => Ok((booking, party)),
        None => Err(AppError::not_found("Booking not found")),
    }
}

/// A booking `user_id` must act on as `party`: 404 if absent, 403 otherwise.
pub async fn booking_as_party(
    db: &DatabaseConnection,
    booking_id: Uuid,
    user_id: Uuid,
    party: Party,
) -> AppResult<Model> {
    let booking = fetch_booking(db, booking_id).await?;
    if booking.party_of(user_id) != Some(party) {
        return Err(AppError::forbidden("Not authorized for this booking"));
    }
    Ok(booking)
}

/// A booking whose chat `user_id` may use: a party, and the booking is
/// accepted or completed.
pub async fn booking_for_chat(
    db: &DatabaseConnection,
    booking_id: Uuid,
    user_id: Uuid,
) -> AppResult<(Model, Party)> {
    let booking = fetch_booking(db, booking_id).await?;
    let party = booking
        .party_of(user_id)
        .ok_or_else(|| AppError::forbidden("Not authorized for this booking"))?;

    if !booking.status.allows_messaging() {
        return Err(AppError::forbidden(
            "Messaging is only available for accepted or completed bookings",
        ));
    }
    Ok((booking, party))
}
