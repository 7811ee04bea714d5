use chrono::Utc;
use sea_orm::prelude::Expr;
use sea_orm::*;
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::cast_profiles::{self, ApprovalStatus, Rank};
use crate::models::gallery;

/// Fetch the profile owned by a cast user.
pub async fn get_profile_by_user_id<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
) -> Result<Option<cast_profiles::Model>, DbErr> {
    cast_profiles::Entity::find()
        .filter(cast_profiles::Column::UserId.eq(user_id))
        .one(db)
        .await
}

/// Same as [`get_profile_by_user_id`] but takes a `FOR UPDATE` row lock.
/// Only meaningful inside a transaction.
pub async fn lock_profile_by_user_id(
    txn: &DatabaseTransaction,
    user_id: Uuid,
) -> Result<Option<cast_profiles::Model>, DbErr> {
    cast_profiles::Entity::find()
        .filter(cast_profiles::Column::UserId.eq(user_id))
        .lock_exclusive()
        .one(txn)
        .await
}

/// Update bio, rank and areas. A new rank also resets the hourly rate.
pub async fn update_profile(
    db: &DatabaseConnection,
    profile: cast_profiles::Model,
    bio: Option<String>,
    rank: Option<Rank>,
    service_areas: Option<Vec<String>>,
) -> Result<cast_profiles::Model, DbErr> {
    let mut active: cast_profiles::ActiveModel = profile.into();
    if let Some(bio) = bio {
        active.bio = Set(Some(bio));
    }
    if let Some(rank) = rank {
        active.rank = Set(rank);
        active.hourly_rate = Set(rank.hourly_rate());
    }
    if let Some(areas) = service_areas {
        active.service_areas = Set(areas);
    }
    active.updated_at = Set(Utc::now());

    active.update(db).await
}

/// Profiles awaiting review, oldest first.
pub async fn get_pending_profiles(
    db: &DatabaseConnection,
) -> Result<Vec<cast_profiles::Model>, DbErr> {
    cast_profiles::Entity::find()
        .filter(cast_profiles::Column::ApprovalStatus.eq(ApprovalStatus::Pending))
        .order_by_asc(cast_profiles::Column::CreatedAt)
        .all(db)
        .await
}

/// Move a pending profile to `decision`. Returns `None` if the cast has no
/// pending profile.
pub async fn decide_approval(
    db: &DatabaseConnection,
    user_id: Uuid,
    decision: ApprovalStatus,
) -> Result<Option<cast_profiles::Model>, DbErr> {
    let now = Utc::now();
    let approved_at = (decision == ApprovalStatus::Approved).then_some(now);

    let result = cast_profiles::Entity::update_many()
        .col_expr(cast_profiles::Column::ApprovalStatus, Expr::value(decision))
        .col_expr(cast_profiles::Column::ApprovedAt, Expr::value(approved_at))
        .col_expr(cast_profiles::Column::UpdatedAt, Expr::value(now))
        .filter(cast_profiles::Column::UserId.eq(user_id))
        .filter(cast_profiles::Column::ApprovalStatus.eq(ApprovalStatus::Pending))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Ok(None);
    }
    get_profile_by_user_id(db, user_id).await
}

/// Service areas of every approved cast.
pub async fn get_approved_service_areas(db: &DatabaseConnection) -> Result<Vec<Vec<String>>, DbErr> {
    cast_profiles::Entity::find()
        .select_only()
        .column(cast_profiles::Column::ServiceAreas)
        .filter(cast_profiles::Column::ApprovalStatus.eq(ApprovalStatus::Approved))
        .into_tuple::<Vec<String>>()
        .all(db)
        .await
}

// ── Gallery ──

/// Gallery images of a profile in display order.
pub async fn get_gallery(
    db: &DatabaseConnection,
    cast_profile_id: Uuid,
) -> Result<Vec<gallery::Model>, DbErr> {
    gallery::Entity::find()
        .filter(gallery::Column::CastProfileId.eq(cast_profile_id))
        .order_by_asc(gallery::Column::DisplayOrder)
        .order_by_asc(gallery::Column::CreatedAt)
        .all(db)
        .await
}

pub async fn count_gallery(db: &DatabaseConnection, cast_profile_id: Uuid) -> Result<u64, DbErr> {
    gallery::Entity::find()
        .filter(gallery::Column::CastProfileId.eq(cast_profile_id))
        .count(db)
        .await
}

pub async fn insert_gallery_image(
    db: &DatabaseConnection,
    cast_profile_id: Uuid,
    image_url: String,
    display_order: i32,
) -> Result<gallery::Model, DbErr> {
    gallery::ActiveModel {
        id: Set(Uuid::new_v4()),
        cast_profile_id: Set(cast_profile_id),
        image_url: Set(image_url),
        display_order: Set(display_order),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
}

/// Delete an image only if it belongs to `cast_profile_id`. Returns rows removed.
pub async fn delete_gallery_image(
    db: &DatabaseConnection,
    cast_profile_id: Uuid,
    image_id: Uuid,
) -> Result<u64, DbErr> {
    let result = gallery::Entity::delete_many()
        .filter(gallery::Column::Id.eq(image_id))
        .filter(gallery::Column::CastProfileId.eq(cast_profile_id))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

/// First gallery image for many profiles in one query: profile id -> image URL.
pub async fn get_first_images(
    db: &DatabaseConnection,
    cast_profile_ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, String>, DbErr> {
    if cast_profile_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = gallery::Entity::find()
        .filter(gallery::Column::CastProfileId.is_in(cast_profile_ids))
        .order_by_asc(gallery::Column::CastProfileId)
        .order_by_asc(gallery::Column::DisplayOrder)
        .order_by_asc(gallery::Column::CreatedAt)
        .all(db)
        .await?;

    let mut first: HashMap<Uuid, String> = HashMap::new();
    for row in rows {
        first.entry(row.cast_profile_id).or_insert(row.image_url);
    }

    Ok(first)
}
