use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;

use crate::models::blocks;

pub async fn insert_block(
    db: &DatabaseConnection,
    user_id: Uuid,
    blocked_user_id: Uuid,
) -> Result<blocks::Model, DbErr> {
    blocks::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        blocked_user_id: Set(blocked_user_id),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
}

/// Remove a block. Returns rows removed.
pub async fn delete_block(
    db: &DatabaseConnection,
    user_id: Uuid,
    blocked_user_id: Uuid,
) -> Result<u64, DbErr> {
    let result = blocks::Entity::delete_many()
        .filter(blocks::Column::UserId.eq(user_id))
        .filter(blocks::Column::BlockedUserId.eq(blocked_user_id))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

/// Blocks created by a user, newest first.
pub async fn get_blocks_by_user(
    db: &DatabaseConnection,
    user_id: Uuid,
) -> Result<Vec<blocks::Model>, DbErr> {
    blocks::Entity::find()
        .filter(blocks::Column::UserId.eq(user_id))
        .order_by_desc(blocks::Column::CreatedAt)
        .all(db)
        .await
}

/// Whether `user_id` has blocked `other_id`.
pub async fn has_blocked<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    other_id: Uuid,
) -> Result<bool, DbErr> {
    let count = blocks::Entity::find()
        .filter(blocks::Column::UserId.eq(user_id))
        .filter(blocks::Column::BlockedUserId.eq(other_id))
        .count(db)
        .await?;
    Ok(count > 0)
}
