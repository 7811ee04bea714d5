use actix_web::{HttpResponse, web};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use validator::Validate;

use crate::auth::jwt::{self, Claims};
use crate::auth::password;
use crate::config::AppConfig;
use crate::db::users::{self as user_db, NewUser};
use crate::error::{AppError, AppResult};
use crate::models::users::{
    self, AuthResponse, LoginRequest, RegisterRequest, Roles, is_adult, plausible_birth_date,
};
use crate::services::email::Notifier;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub(crate) fn issue_session(config: &AppConfig, user: &users::Model) -> AppResult<String> {
    let claims = Claims::new(user.id, &user.email, user.role, config.jwt_ttl_hours);
    jwt::issue_token(&claims, &config.jwt_secret)
        .map_err(|e| AppError::upstream("Failed to issue token", e))
}

/// POST /api/register
///
/// Creates a guest or cast account and returns a session token. Cast accounts
/// start with a pending standard-rank profile that an admin must approve.
pub async fn register(
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    notifier: web::Data<Notifier>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let input = body.into_inner();
    input.validate()?;

    // 1. Only guests and casts may sign up.
    if input.role == Roles::Admin {
        return Err(AppError::validation("Role must be guest or cast"));
    }

    // 2. Age gate on calendar date.
    let birth_date = input
        .birth_date
        .ok_or_else(|| AppError::validation("Birth date is required"))?;
    let today = Utc::now().date_naive();
    if !plausible_birth_date(birth_date, today) {
        return Err(AppError::validation("Invalid birth date"));
    }
    if !is_adult(birth_date, today) {
        return Err(AppError::validation("You must be at least 18 years old"));
    }

    // 3. Reject duplicate emails up front; the unique index catches races.
    let email = input.email.trim().to_lowercase();
    if user_db::get_user_by_email(db.get_ref(), &email).await?.is_some() {
        return Err(AppError::conflict("Email already registered"));
    }

    // 4. Hash off the async workers.
    let plain = input.password;
    let password_hash = web::block(move || password::hash_password(&plain))
        .await
        .map_err(|e| AppError::upstream("Failed to hash password", e))??;

    let user = user_db::create_user(
        db.get_ref(),
        NewUser {
            email,
            password_hash,
            role: input.role,
            name: input.name.trim().to_string(),
            phone: input.phone,
            birth_date,
        },
    )
    .await
    .map_err(|e| AppError::from_insert(e, "Email already registered"))?;

    tracing::info!(user_id = %user.id, role = ?user.role, "user registered");

    let token = issue_session(&config, &user)?;
    notifier.dispatch(notifier.welcome(&user.email, &user.name));

    Ok(HttpResponse::Created().json(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// POST /api/login
pub async fn login(
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let input = body.into_inner();
    input.validate()?;

    let user = user_db::get_user_by_email(db.get_ref(), &input.email)
        .await?
        .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.into()))?;

    let hash = user.password_hash.clone();
    let plain = input.password;
    let valid = web::block(move || password::verify_password(&plain, &hash))
        .await
        .map_err(|e| AppError::upstream("Failed to verify password", e))??;

    if !valid {
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    let token = issue_session(&config, &user)?;
    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        user: user.into(),
    }))
}
