use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;

use crate::models::messages;

/// Insert a new message.
pub async fn insert_message(
    db: &DatabaseConnection,
    booking_id: Uuid,
    sender_id: Uuid,
    body: String,
) -> Result<messages::Model, DbErr> {
    messages::ActiveModel {
        id: Set(Uuid::new_v4()),
        booking_id: Set(booking_id),
        sender_id: Set(sender_id),
        body: Set(body),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
}

/// Messages of a booking, oldest first.
pub async fn get_messages_by_booking(
    db: &DatabaseConnection,
    booking_id: Uuid,
) -> Result<Vec<messages::Model>, DbErr> {
    messages::Entity::find()
        .filter(messages::Column::BookingId.eq(booking_id))
        .order_by_asc(messages::Column::CreatedAt)
        .order_by_asc(messages::Column::Id)
        .all(db)
        .await
}
