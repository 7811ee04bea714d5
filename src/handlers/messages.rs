use actix_web::{HttpResponse, web};
use sea_orm::DatabaseConnection;
use uuid::Uuid;
use validator::Validate;

use crate::auth::authorization;
use crate::auth::middleware::AuthenticatedUser;
use crate::db::messages as message_db;
use crate::db::users as user_db;
use crate::error::{AppError, AppResult};
use crate::models::messages::{MessageView, SendMessageRequest};

/// GET /api/bookings/{id}/messages
///
/// The chat thread of an accepted or completed booking, oldest first.
pub async fn get_messages(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let (booking, _) =
        authorization::booking_for_chat(db.get_ref(), path.into_inner(), user.id).await?;

    let thread = message_db::get_messages_by_booking(db.get_ref(), booking.id).await?;
    let names =
        user_db::get_summaries_by_ids(db.get_ref(), vec![booking.guest_id, booking.cast_id])
            .await?;

    let views: Vec<MessageView> = thread
        .into_iter()
        .map(|m| {
            let name = names.get(&m.sender_id).map(|u| u.name.clone());
            MessageView::new(m, user.id, name)
        })
        .collect();

    Ok(HttpResponse::Ok().json(views))
}

/// POST /api/bookings/{id}/messages
pub async fn send_message(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
    body: web::Json<SendMessageRequest>,
) -> AppResult<HttpResponse> {
    let input = body.into_inner();
    input.validate()?;

    let text = input.body.trim();
    if text.is_empty() {
        return Err(AppError::validation("Message cannot be empty"));
    }

    let (booking, _) =
        authorization::booking_for_chat(db.get_ref(), path.into_inner(), user.id).await?;

    let message =
        message_db::insert_message(db.get_ref(), booking.id, user.id, text.to_string()).await?;
    let sender_name = user_db::get_user_by_id(db.get_ref(), user.id)
        .await?
        .map(|u| u.name);

    Ok(HttpResponse::Created().json(MessageView::new(message, user.id, sender_name)))
}
