use actix_web::{HttpResponse, web};
use sea_orm::DatabaseConnection;
use uuid::Uuid;
use validator::Validate;

use crate::auth::authorization;
use crate::auth::middleware::AuthenticatedUser;
use crate::db::reviews as review_db;
use crate::db::users as user_db;
use crate::error::{AppError, AppResult};
use crate::models::bookings::Status;
use crate::models::reviews::{self, CreateReviewRequest, ReviewView, UserReviewsResponse};

/// Attach reviewer names and images to a list of reviews.
pub(crate) async fn review_views(
    db: &DatabaseConnection,
    reviews: Vec<reviews::Model>,
) -> AppResult<Vec<ReviewView>> {
    let reviewer_ids = reviews.iter().map(|r| r.reviewer_id).collect();
    let reviewers = user_db::get_summaries_by_ids(db, reviewer_ids).await?;

    Ok(reviews
        .into_iter()
        .map(|r| {
            let reviewer = reviewers.get(&r.reviewer_id);
            ReviewView {
                id: r.id,
                booking_id: r.booking_id,
                rating: r.rating,
                comment: r.comment,
                created_at: r.created_at,
                reviewer_name: reviewer.map(|u| u.name.clone()),
                reviewer_image: reviewer.and_then(|u| u.profile_image.clone()),
            }
        })
        .collect())
}

/// POST /api/reviews
///
/// Either party of a completed booking reviews the other, once.
pub async fn create_review(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    body: web::Json<CreateReviewRequest>,
) -> AppResult<HttpResponse> {
    let input = body.into_inner();
    input.validate()?;

    // 1. Only the two parties may review.
    let (booking, party) =
        authorization::visible_booking(db.get_ref(), input.booking_id, user.id).await?;

    // 2. Reviews open once the booking is completed.
    if booking.status != Status::Completed {
        return Err(AppError::validation("Can only review completed bookings"));
    }

    // 3. One review per reviewer per booking; the unique index settles races.
    if review_db::review_exists(db.get_ref(), booking.id, user.id).await? {
        return Err(AppError::conflict("Already reviewed this booking"));
    }

    let comment = input
        .comment
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    let review = review_db::insert_review(
        db.get_ref(),
        booking.id,
        user.id,
        booking.counterpart(party),
        input.rating,
        comment,
    )
    .await
    .map_err(|e| AppError::from_insert(e, "Already reviewed this booking"))?;

    tracing::info!(review_id = %review.id, booking_id = %booking.id, "review created");

    Ok(HttpResponse::Created().json(review))
}

/// GET /api/users/{id}/reviews
pub async fn get_user_reviews(
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let user_id = path.into_inner();
    if user_db::get_user_by_id(db.get_ref(), user_id).await?.is_none() {
        return Err(AppError::not_found("User not found"));
    }

    let received = review_db::get_reviews_for_user(db.get_ref(), user_id, None).await?;
    let ratings: Vec<i32> = received.iter().map(|r| r.rating).collect();

    Ok(HttpResponse::Ok().json(UserReviewsResponse {
        reviews: review_views(db.get_ref(), received).await?,
        summary: reviews::RatingSummary::from_ratings(&ratings),
    }))
}
