use chrono::Utc;
use sea_orm::*;
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::reviews::{self, RatingSummary};

/// Insert a review. The unique index on (booking_id, reviewer_id) rejects duplicates.
pub async fn insert_review(
    db: &DatabaseConnection,
    booking_id: Uuid,
    reviewer_id: Uuid,
    reviewed_id: Uuid,
    rating: i32,
    comment: Option<String>,
) -> Result<reviews::Model, DbErr> {
    reviews::ActiveModel {
        id: Set(Uuid::new_v4()),
        booking_id: Set(booking_id),
        reviewer_id: Set(reviewer_id),
        reviewed_id: Set(reviewed_id),
        rating: Set(rating),
        comment: Set(comment),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
}

pub async fn review_exists(
    db: &DatabaseConnection,
    booking_id: Uuid,
    reviewer_id: Uuid,
) -> Result<bool, DbErr> {
    let count = reviews::Entity::find()
        .filter(reviews::Column::BookingId.eq(booking_id))
        .filter(reviews::Column::ReviewerId.eq(reviewer_id))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Reviews received by a user, newest first.
pub async fn get_reviews_for_user(
    db: &DatabaseConnection,
    reviewed_id: Uuid,
    limit: Option<u64>,
) -> Result<Vec<reviews::Model>, DbErr> {
    reviews::Entity::find()
        .filter(reviews::Column::ReviewedId.eq(reviewed_id))
        .order_by_desc(reviews::Column::CreatedAt)
        .limit(limit)
        .all(db)
        .await
}

pub async fn get_rating_summary(
    db: &DatabaseConnection,
    reviewed_id: Uuid,
) -> Result<RatingSummary, DbErr> {
    let mut summaries = get_rating_summaries(db, vec![reviewed_id]).await?;
    Ok(summaries.remove(&reviewed_id).unwrap_or_default())
}

/// Rating summaries for many users in one query: user id -> summary.
/// Users without reviews are absent from the map.
pub async fn get_rating_summaries(
    db: &DatabaseConnection,
    reviewed_ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, RatingSummary>, DbErr> {
    if reviewed_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(Uuid, i32)> = reviews::Entity::find()
        .select_only()
        .column(reviews::Column::ReviewedId)
        .column(reviews::Column::Rating)
        .filter(reviews::Column::ReviewedId.is_in(reviewed_ids))
        .into_tuple()
        .all(db)
        .await?;

    let mut ratings: HashMap<Uuid, Vec<i32>> = HashMap::new();
    for (user_id, rating) in rows {
        ratings.entry(user_id).or_default().push(rating);
    }

    Ok(ratings
        .into_iter()
        .map(|(id, r)| (id, RatingSummary::from_ratings(&r)))
        .collect())
}
