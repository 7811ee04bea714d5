use actix_web::{HttpResponse, web};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use validator::Validate;

use crate::auth::middleware::AuthenticatedUser;
use crate::db::cast_profiles as cast_db;
use crate::db::reviews as review_db;
use crate::db::users as user_db;
use crate::error::{AppError, AppResult};
use crate::models::cast_profiles::CastProfileResponse;
use crate::models::users::{
    self, ImageRequest, ProfileResponse, Roles, UpdateProfileRequest, UserResponse, is_adult,
    plausible_birth_date,
};

async fn current_user(db: &DatabaseConnection, user: &AuthenticatedUser) -> AppResult<users::Model> {
    user_db::get_user_by_id(db, user.id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

/// The cast profile with its gallery, for cast accounts.
pub(crate) async fn cast_profile_with_gallery(
    db: &DatabaseConnection,
    user_id: uuid::Uuid,
) -> AppResult<Option<CastProfileResponse>> {
    let Some(profile) = cast_db::get_profile_by_user_id(db, user_id).await? else {
        return Ok(None);
    };
    let gallery = cast_db::get_gallery(db, profile.id).await?;
    Ok(Some(CastProfileResponse::new(
        profile,
        gallery.into_iter().map(Into::into).collect(),
    )))
}

/// GET /api/profile
pub async fn get_profile(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
) -> AppResult<HttpResponse> {
    let model = current_user(db.get_ref(), &user).await?;
    let rating = review_db::get_rating_summary(db.get_ref(), model.id).await?;

    let cast_profile = if model.role == Roles::Cast {
        cast_profile_with_gallery(db.get_ref(), model.id).await?
    } else {
        None
    };

    Ok(HttpResponse::Ok().json(ProfileResponse {
        user: model.into(),
        rating,
        cast_profile,
    }))
}

/// PUT /api/profile
///
/// Partial update of name, phone and birth date. A new birth date must still
/// satisfy the age requirement.
pub async fn update_profile(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    body: web::Json<UpdateProfileRequest>,
) -> AppResult<HttpResponse> {
    let input = body.into_inner();
    input.validate()?;

    if let Some(birth_date) = input.birth_date {
        let today = Utc::now().date_naive();
        if !plausible_birth_date(birth_date, today) {
            return Err(AppError::validation("Invalid birth date"));
        }
        if !is_adult(birth_date, today) {
            return Err(AppError::validation("You must be at least 18 years old"));
        }
    }

    let model = current_user(db.get_ref(), &user).await?;
    let name = input.name.map(|n| n.trim().to_string());
    let updated =
        user_db::update_profile(db.get_ref(), model, name, input.phone, input.birth_date).await?;

    Ok(HttpResponse::Ok().json(UserResponse::from(updated)))
}

/// POST /api/profile/image
pub async fn upload_profile_image(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    body: web::Json<ImageRequest>,
) -> AppResult<HttpResponse> {
    let input = body.into_inner();
    input.validate()?;

    let model = current_user(db.get_ref(), &user).await?;
    let updated = user_db::set_profile_image(db.get_ref(), model, input.image_url).await?;

    Ok(HttpResponse::Ok().json(UserResponse::from(updated)))
}
