use chrono::{NaiveDate, Utc};
use sea_orm::*;
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::cast_profiles::{self, ApprovalStatus, Rank};
use crate::models::users::{self, Roles, UserSummary};

/// Fields needed to create an account; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub role: Roles,
    pub name: String,
    pub phone: Option<String>,
    pub birth_date: NaiveDate,
}

/// Insert a user. Casts also get a pending standard profile in the same transaction.
pub async fn create_user(db: &DatabaseConnection, input: NewUser) -> Result<users::Model, DbErr> {
    let now = Utc::now();
    let txn = db.begin().await?;

    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(input.email),
        password_hash: Set(input.password_hash),
        role: Set(input.role),
        name: Set(input.name),
        phone: Set(input.phone),
        birth_date: Set(input.birth_date),
        profile_image: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;

    if user.role == Roles::Cast {
        cast_profiles::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user.id),
            bio: Set(None),
            hourly_rate: Set(Rank::Standard.hourly_rate()),
            rank: Set(Rank::Standard),
            service_areas: Set(Vec::new()),
            approval_status: Set(ApprovalStatus::Pending),
            approved_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;
    Ok(user)
}

/// Fetch a single user by ID.
pub async fn get_user_by_id<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<Option<users::Model>, DbErr> {
    users::Entity::find_by_id(id).one(db).await
}

/// Fetch a single user by email (case-insensitive match on the stored lowercase form).
pub async fn get_user_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<users::Model>, DbErr> {
    users::Entity::find()
        .filter(users::Column::Email.eq(email.trim().to_lowercase()))
        .one(db)
        .await
}

/// Load many users at once and return an id -> user map.
pub async fn get_users_by_ids(
    db: &DatabaseConnection,
    ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, users::Model>, DbErr> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = users::Entity::find()
        .filter(users::Column::Id.is_in(ids))
        .all(db)
        .await?;

    Ok(rows.into_iter().map(|u| (u.id, u)).collect())
}

/// Same as [`get_users_by_ids`] but only the public summary.
pub async fn get_summaries_by_ids(
    db: &DatabaseConnection,
    ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, UserSummary>, DbErr> {
    let users = get_users_by_ids(db, ids).await?;
    Ok(users
        .iter()
        .map(|(id, user)| (*id, UserSummary::from(user)))
        .collect())
}

/// Apply a partial profile update. `None` leaves a field unchanged.
pub async fn update_profile(
    db: &DatabaseConnection,
    user: users::Model,
    name: Option<String>,
    phone: Option<String>,
    birth_date: Option<NaiveDate>,
) -> Result<users::Model, DbErr> {
    let mut active: users::ActiveModel = user.into();
    if let Some(name) = name {
        active.name = Set(name);
    }
    if let Some(phone) = phone {
        active.phone = Set(Some(phone));
    }
    if let Some(birth_date) = birth_date {
        active.birth_date = Set(birth_date);
    }
    active.updated_at = Set(Utc::now());

    active.update(db).await
}

pub async fn set_profile_image(
    db: &DatabaseConnection,
    user: users::Model,
    image_url: String,
) -> Result<users::Model, DbErr> {
    let mut active: users::ActiveModel = user.into();
    active.profile_image = Set(Some(image_url));
    active.updated_at = Set(Utc::now());

    active.update(db).await
}

/// Count users, optionally restricted to one role.
pub async fn count_users(db: &DatabaseConnection, role: Option<Roles>) -> Result<u64, DbErr> {
    let mut query = users::Entity::find();
    if let Some(role) = role {
        query = query.filter(users::Column::Role.eq(role));
    }
    query.count(db).await
}
