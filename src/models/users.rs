use chrono::{Datelike, NaiveDate};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::cast_profiles::CastProfileResponse;
use crate::models::reviews::RatingSummary;

pub const MINIMUM_AGE: u32 = 18;

/// The `Roles` enum maps to a Postgres TEXT column stored as lowercase strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum Roles {
    #[sea_orm(string_value = "guest")]
    Guest,
    #[sea_orm(string_value = "cast")]
    Cast,
    #[sea_orm(string_value = "admin")]
    Admin,
}

/// SeaORM entity for the `users` table.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Roles,
    pub name: String,
    pub phone: Option<String>,
    pub birth_date: Date,
    pub profile_image: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::cast_profiles::Entity")]
    CastProfile,
}

impl Related<super::cast_profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CastProfile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Whole years between `birth_date` and `today`.
pub fn age_on(birth_date: NaiveDate, today: NaiveDate) -> Option<u32> {
    today.years_since(birth_date)
}

pub fn is_adult(birth_date: NaiveDate, today: NaiveDate) -> bool {
    age_on(birth_date, today).is_some_and(|years| years >= MINIMUM_AGE)
}

/// Birth dates in the future or before 1900 are rejected outright.
pub fn plausible_birth_date(birth_date: NaiveDate, today: NaiveDate) -> bool {
    birth_date.year() >= 1900 && birth_date <= today
}

// ── DTOs (not stored in DB, used for request bodies) ──

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,
    pub role: Roles,
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[validate(required(message = "Birth date is required"))]
    pub birth_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ImageRequest {
    #[validate(url(message = "Invalid image URL"), length(max = 2048))]
    pub image_url: String,
}

/// A safe user representation for API responses (never leaks the password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub role: Roles,
    pub name: String,
    pub phone: Option<String>,
    pub birth_date: Date,
    pub profile_image: Option<String>,
    pub created_at: DateTimeUtc,
}

impl From<Model> for UserResponse {
    fn from(m: Model) -> Self {
        Self {
            id: m.id,
            email: m.email,
            role: m.role,
            name: m.name,
            phone: m.phone,
            birth_date: m.birth_date,
            profile_image: m.profile_image,
            created_at: m.created_at,
        }
    }
}

/// Public name and picture of another party.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub profile_image: Option<String>,
}

impl From<&Model> for UserSummary {
    fn from(m: &Model) -> Self {
        Self {
            id: m.id,
            name: m.name.clone(),
            profile_image: m.profile_image.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub rating: RatingSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cast_profile: Option<CastProfileResponse>,
}
