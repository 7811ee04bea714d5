use actix_web::http::header::Header;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use actix_web_httpauth::headers::authorization::{Authorization, Bearer};
use futures_util::future::{Ready, ready};
use uuid::Uuid;

use crate::auth::jwt;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::models::users::Roles;

pub const ADMIN_PASSWORD_HEADER: &str = "X-Admin-Password";

/// Caller identity decoded from a valid bearer token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub email: String,
    pub role: Roles,
}

fn app_config(req: &HttpRequest) -> Result<&web::Data<AppConfig>, AppError> {
    req.app_data::<web::Data<AppConfig>>()
        .ok_or_else(|| AppError::upstream("Server misconfigured", "AppConfig missing from app data"))
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, AppError> {
    // 1. Extract the Bearer token from the Authorization header.
    let auth = Authorization::<Bearer>::parse(req)
        .map_err(|_| AppError::Unauthorized("Missing or malformed bearer token".into()))?;
    let token = auth.as_ref().token();

    // 2. Validate signature and expiry.
    let config = app_config(req)?;
    let claims = jwt::validate_token(token, &config.jwt_secret).map_err(|e| {
        tracing::debug!(error = %e, "rejected bearer token");
        AppError::Unauthorized("Invalid or expired token".into())
    })?;

    // 3. Extract user info from claims.
    let id = claims.user_id().map_err(AppError::Unauthorized)?;

    Ok(AuthenticatedUser {
        id,
        email: claims.email,
        role: claims.role,
    })
}

fn require_role(
    req: &HttpRequest,
    role: Roles,
    message: &'static str,
) -> Result<AuthenticatedUser, AppError> {
    let user = authenticate(req)?;
    if user.role != role {
        return Err(AppError::forbidden(message));
    }
    Ok(user)
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

/// An authenticated user with the guest role.
#[derive(Debug, Clone)]
pub struct GuestUser(pub AuthenticatedUser);

impl FromRequest for GuestUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(require_role(req, Roles::Guest, "Guest access only").map(GuestUser))
    }
}

/// An authenticated user with the cast role.
#[derive(Debug, Clone)]
pub struct CastUser(pub AuthenticatedUser);

impl FromRequest for CastUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(require_role(req, Roles::Cast, "Cast access only").map(CastUser))
    }
}

/// Passes only when the `X-Admin-Password` header matches the configured secret.
#[derive(Debug, Clone, Copy)]
pub struct AdminGuard;

impl FromRequest for AdminGuard {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let check = || {
            let config = app_config(req)?;
            let supplied = req
                .headers()
                .get(ADMIN_PASSWORD_HEADER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();

            if supplied.is_empty() || supplied != config.admin_password {
                return Err(AppError::forbidden("Admin access required"));
            }
            Ok(AdminGuard)
        };
        ready(check())
    }
}
