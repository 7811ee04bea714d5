use sea_orm::sea_query::{Expr, JoinType, Order};
use sea_orm::*;
use std::collections::HashSet;
use uuid::Uuid;

use crate::db::bookings as booking_db;
use crate::db::cast_profiles as cast_db;
use crate::db::reviews as review_db;
use crate::db::users as user_db;
use crate::models::Page;
use crate::models::bookings::Slot;
use crate::models::search::{CastCard, CastSearchParams, SearchResponse};
use crate::models::{cast_profiles, reviews};

/// Casts with a pending or accepted booking overlapping `slot`.
pub async fn get_busy_cast_ids(db: &DatabaseConnection, slot: &Slot) -> Result<Vec<Uuid>, DbErr> {
    let bookings = booking_db::get_active_bookings_on(db, slot.date).await?;

    let busy: HashSet<Uuid> = bookings
        .iter()
        .filter(|b| b.slot().overlaps(slot))
        .map(|b| b.cast_id)
        .collect();

    Ok(busy.into_iter().collect())
}

/// Matching profiles joined to the reviews their cast received, best rated
/// first, then most reviewed. Casts without reviews rate as zero.
pub fn search_query(params: &CastSearchParams, busy: &[Uuid]) -> Select<cast_profiles::Entity> {
    cast_profiles::Entity::find()
        .join(JoinType::LeftJoin, received_reviews())
        .filter(params.condition(busy))
        .group_by(cast_profiles::Column::Id)
        .order_by(
            Expr::cust("COALESCE(AVG(\"reviews\".\"rating\"), 0)"),
            Order::Desc,
        )
        .order_by(Expr::cust("COUNT(\"reviews\".\"id\")"), Order::Desc)
        .order_by_asc(cast_profiles::Column::Id)
}

fn received_reviews() -> RelationDef {
    cast_profiles::Entity::belongs_to(reviews::Entity)
        .from(cast_profiles::Column::UserId)
        .to(reviews::Column::ReviewedId)
        .into()
}

/// Run a cast search: filter, rank and paginate in SQL, then decorate the
/// returned page with names, ratings and a cover image.
pub async fn search_casts(
    db: &DatabaseConnection,
    params: &CastSearchParams,
) -> Result<SearchResponse, DbErr> {
    let busy = match params.availability_slot() {
        Some(slot) => get_busy_cast_ids(db, &slot).await?,
        None => Vec::new(),
    };

    let (page, limit) = (params.page(), params.limit());
    let paginator = search_query(params, &busy).paginate(db, limit);
    let total = paginator.num_items().await?;
    let profiles = paginator.fetch_page(page - 1).await?;

    let user_ids: Vec<Uuid> = profiles.iter().map(|p| p.user_id).collect();
    let profile_ids: Vec<Uuid> = profiles.iter().map(|p| p.id).collect();

    let users = user_db::get_users_by_ids(db, user_ids.clone()).await?;
    let ratings = review_db::get_rating_summaries(db, user_ids).await?;
    let mut images = cast_db::get_first_images(db, profile_ids).await?;

    let cards: Vec<CastCard> = profiles
        .into_iter()
        .filter_map(|p| {
            let user = users.get(&p.user_id)?;
            let rating = ratings.get(&p.user_id).copied().unwrap_or_default();
            Some(CastCard {
                user_id: p.user_id,
                name: user.name.clone(),
                profile_image: user.profile_image.clone(),
                bio: p.bio,
                hourly_rate: p.hourly_rate,
                rank: p.rank,
                service_areas: p.service_areas,
                gallery_image: images.remove(&p.id),
                average_rating: rating.average_rating,
                total_reviews: rating.total_reviews,
            })
        })
        .collect();

    Ok(Page::new(cards, total, page, limit).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sql(params: &CastSearchParams) -> String {
        search_query(params, &[])
            .build(DbBackend::Postgres)
            .to_string()
    }

    #[test]
    fn ranking_happens_in_the_query() {
        let q = sql(&CastSearchParams::default());
        assert!(q.contains("LEFT JOIN \"reviews\""), "{q}");
        assert!(q.contains("\"cast_profiles\".\"user_id\" = \"reviews\".\"reviewed_id\""), "{q}");
        assert!(q.contains("GROUP BY \"cast_profiles\".\"id\""), "{q}");

        let by_rating = q.find("ORDER BY COALESCE(AVG(\"reviews\".\"rating\"), 0) DESC");
        let by_count = q.find("COUNT(\"reviews\".\"id\") DESC");
        assert!(by_rating.is_some(), "{q}");
        assert!(by_rating < by_count, "{q}");
    }

    #[test]
    fn filters_apply_before_grouping() {
        let params = CastSearchParams {
            location: Some("Shibuya".into()),
            ..Default::default()
        };
        let q = sql(&params);
        let filter = q.find("'Shibuya' = ANY");
        assert!(filter.is_some(), "{q}");
        assert!(filter < q.find("GROUP BY"), "{q}");
    }
}
