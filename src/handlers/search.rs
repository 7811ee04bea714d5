use actix_web::{HttpResponse, web};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::db::cast_profiles as cast_db;
use crate::db::reviews as review_db;
use crate::db::search as search_db;
use crate::db::service_areas as area_db;
use crate::db::users as user_db;
use crate::error::{AppError, AppResult};
use crate::handlers::reviews::review_views;
use crate::models::cast_profiles::{ApprovalStatus, CastProfileResponse};
use crate::models::search::{CastDetailResponse, CastSearchParams};
use crate::models::users::UserSummary;

const DETAIL_REVIEWS: u64 = 10;

/// GET /api/casts/search
///
/// Approved casts matching every supplied filter. When both `date` and
/// `start_time` are given, casts with an overlapping pending or accepted
/// booking are left out.
pub async fn search_casts(
    db: web::Data<DatabaseConnection>,
    query: web::Query<CastSearchParams>,
) -> AppResult<HttpResponse> {
    let params = query.into_inner();
    if let (Some(min), Some(max)) = (params.min_price, params.max_price) {
        if min > max {
            return Err(AppError::validation("min_price must not exceed max_price"));
        }
    }

    let results = search_db::search_casts(db.get_ref(), &params).await?;
    Ok(HttpResponse::Ok().json(results))
}

/// GET /api/casts/{id}
pub async fn get_cast(
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let user_id = path.into_inner();
    let not_found = || AppError::not_found("Cast not found");

    let profile = cast_db::get_profile_by_user_id(db.get_ref(), user_id)
        .await?
        .filter(|p| p.approval_status == ApprovalStatus::Approved)
        .ok_or_else(not_found)?;
    let user = user_db::get_user_by_id(db.get_ref(), user_id)
        .await?
        .ok_or_else(not_found)?;

    let gallery = cast_db::get_gallery(db.get_ref(), profile.id).await?;
    let rating = review_db::get_rating_summary(db.get_ref(), user_id).await?;
    let reviews =
        review_db::get_reviews_for_user(db.get_ref(), user_id, Some(DETAIL_REVIEWS)).await?;

    Ok(HttpResponse::Ok().json(CastDetailResponse {
        user: UserSummary::from(&user),
        profile: CastProfileResponse::new(profile, gallery.into_iter().map(Into::into).collect()),
        rating,
        reviews: review_views(db.get_ref(), reviews).await?,
    }))
}

/// GET /api/service-areas
pub async fn list_service_areas(db: web::Data<DatabaseConnection>) -> AppResult<HttpResponse> {
    let areas = area_db::get_service_areas(db.get_ref()).await?;
    Ok(HttpResponse::Ok().json(areas))
}
