use actix_web::{HttpResponse, web};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use uuid::Uuid;
use validator::Validate;

use crate::auth::authorization;
use crate::auth::middleware::CastUser;
use crate::db::bookings as booking_db;
use crate::db::cast_profiles as cast_db;
use crate::db::service_areas as area_db;
use crate::error::{AppError, AppResult};
use crate::handlers::bookings::{booking_parties, booking_views, refund_capture, release_hold};
use crate::models::analytics::Earnings;
use crate::models::bookings::{
    BookingView, Party, RespondRequest, ResponseAction, StatusFilter, Transition,
};
use crate::models::cast_profiles::{
    self, CastProfileResponse, UpdateCastProfileRequest, normalize_areas,
};
use crate::models::gallery::{GalleryImageResponse, MAX_GALLERY_IMAGES};
use crate::models::users::ImageRequest;
use crate::services::email::Notifier;
use crate::services::payments::PaymentGateway;

async fn own_profile(db: &DatabaseConnection, user_id: Uuid) -> AppResult<cast_profiles::Model> {
    cast_db::get_profile_by_user_id(db, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Cast profile not found"))
}

/// PUT /api/cast/profile
///
/// Changing rank also resets the hourly rate to the rank's price. Every
/// service area must be a known one; an empty list leaves the areas as they were.
pub async fn update_cast_profile(
    CastUser(user): CastUser,
    db: web::Data<DatabaseConnection>,
    body: web::Json<UpdateCastProfileRequest>,
) -> AppResult<HttpResponse> {
    let input = body.into_inner();
    input.validate()?;

    let areas = input
        .service_areas
        .map(normalize_areas)
        .filter(|areas| !areas.is_empty());
    if let Some(areas) = &areas {
        let unknown = area_db::find_unknown_areas(db.get_ref(), areas).await?;
        if !unknown.is_empty() {
            return Err(AppError::validation(format!(
                "Unknown service areas: {}",
                unknown.join(", ")
            )));
        }
    }

    let profile = own_profile(db.get_ref(), user.id).await?;
    let bio = input.bio.map(|b| b.trim().to_string());
    let updated = cast_db::update_profile(db.get_ref(), profile, bio, input.rank, areas).await?;
    let gallery = cast_db::get_gallery(db.get_ref(), updated.id).await?;

    Ok(HttpResponse::Ok().json(CastProfileResponse::new(
        updated,
        gallery.into_iter().map(Into::into).collect(),
    )))
}

/// POST /api/cast/gallery
pub async fn add_gallery_image(
    CastUser(user): CastUser,
    db: web::Data<DatabaseConnection>,
    body: web::Json<ImageRequest>,
) -> AppResult<HttpResponse> {
    let input = body.into_inner();
    input.validate()?;

    let profile = own_profile(db.get_ref(), user.id).await?;
    let count = cast_db::count_gallery(db.get_ref(), profile.id).await?;
    if count >= MAX_GALLERY_IMAGES {
        return Err(AppError::validation(format!(
            "Gallery is limited to {MAX_GALLERY_IMAGES} images"
        )));
    }

    let image =
        cast_db::insert_gallery_image(db.get_ref(), profile.id, input.image_url, count as i32)
            .await?;

    Ok(HttpResponse::Created().json(GalleryImageResponse::from(image)))
}

/// DELETE /api/cast/gallery/{id}
pub async fn delete_gallery_image(
    CastUser(user): CastUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let profile = own_profile(db.get_ref(), user.id).await?;
    let removed = cast_db::delete_gallery_image(db.get_ref(), profile.id, path.into_inner()).await?;
    if removed == 0 {
        return Err(AppError::not_found("Image not found"));
    }

    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/cast/bookings
pub async fn get_cast_bookings(
    CastUser(user): CastUser,
    db: web::Data<DatabaseConnection>,
    query: web::Query<StatusFilter>,
) -> AppResult<HttpResponse> {
    let list = booking_db::get_bookings_for_cast(db.get_ref(), user.id, query.status).await?;
    Ok(HttpResponse::Ok().json(booking_views(db.get_ref(), list, Utc::now()).await?))
}

/// POST /api/cast/bookings/{id}/respond
///
/// Accept or decline a pending request within 24 hours of its creation.
/// Accepting captures the guest's authorized payment first; if the capture
/// fails the booking stays pending and the cast may try again. A capture whose
/// status update then loses to a concurrent cancel is refunded. Declining
/// releases the hold once the status change is recorded.
pub async fn respond_to_booking(
    CastUser(user): CastUser,
    db: web::Data<DatabaseConnection>,
    payments: web::Data<dyn PaymentGateway>,
    notifier: web::Data<Notifier>,
    path: web::Path<Uuid>,
    body: web::Json<RespondRequest>,
) -> AppResult<HttpResponse> {
    let booking =
        authorization::booking_as_party(db.get_ref(), path.into_inner(), user.id, Party::Cast)
            .await?;

    let now = Utc::now();
    booking.check_response(now)?;

    let transition = match body.action {
        ResponseAction::Accept => Transition::Accept,
        ResponseAction::Decline => Transition::Decline,
    };

    let mut captured = None;
    if transition == Transition::Accept {
        if let Some(intent_id) = booking.payment_intent_id.as_deref() {
            payments.capture(intent_id, booking.id).await?;
            captured = Some(intent_id);
        }
    }

    let updated = match booking_db::apply_transition(db.get_ref(), &booking, transition, now).await {
        Ok(Some(updated)) => updated,
        Ok(None) => {
            if let Some(intent_id) = captured {
                refund_capture(&**payments, booking.id, intent_id).await;
            }
            return Err(AppError::conflict("Booking already responded"));
        }
        Err(e) => {
            if let Some(intent_id) = captured {
                tracing::error!(
                    error = %e,
                    booking_id = %booking.id,
                    intent_id,
                    "payment captured but booking status update failed"
                );
            }
            return Err(e.into());
        }
    };

    if transition == Transition::Decline {
        if let Some(intent_id) = updated.payment_intent_id.as_deref() {
            release_hold(&**payments, updated.id, intent_id).await;
        }
    }

    tracing::info!(booking_id = %updated.id, status = ?updated.status, "booking responded");

    if let Some((guest, cast)) = booking_parties(db.get_ref(), &updated).await {
        notifier.dispatch(notifier.booking_responded(&guest.email, &guest.name, &cast.name, &updated));
    }

    Ok(HttpResponse::Ok().json(BookingView::new(updated, now)))
}

/// GET /api/cast/earnings
pub async fn get_earnings(
    CastUser(user): CastUser,
    db: web::Data<DatabaseConnection>,
) -> AppResult<HttpResponse> {
    let all = booking_db::get_bookings_for_cast(db.get_ref(), user.id, None).await?;
    Ok(HttpResponse::Ok().json(Earnings::from_bookings(all, Utc::now())))
}
