use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// SeaORM entity for the `reviews` table.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reviews")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub booking_id: Uuid,
    pub reviewer_id: Uuid,
    pub reviewed_id: Uuid,
    pub rating: i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub comment: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bookings::Entity",
        from = "Column::BookingId",
        to = "super::bookings::Column::Id",
        on_delete = "Cascade"
    )]
    Booking,
}

impl Related<super::bookings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Booking.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// ── DTOs ──

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateReviewRequest {
    pub booking_id: Uuid,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,
    #[validate(length(max = 500, message = "Comment must be at most 500 characters"))]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewView {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTimeUtc,
    pub reviewer_name: Option<String>,
    pub reviewer_image: Option<String>,
}

/// Average rating and number of reviews a user has received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RatingSummary {
    pub average_rating: f64,
    pub total_reviews: u64,
}

impl RatingSummary {
    /// Average rounded to one decimal place; zero when there are no ratings.
    pub fn from_ratings(ratings: &[i32]) -> Self {
        if ratings.is_empty() {
            return Self::default();
        }
        let sum: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
        let avg = sum as f64 / ratings.len() as f64;
        Self {
            average_rating: (avg * 10.0).round() / 10.0,
            total_reviews: ratings.len() as u64,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserReviewsResponse {
    pub reviews: Vec<ReviewView>,
    #[serde(flatten)]
    pub summary: RatingSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_of_no_ratings_is_zero() {
        assert_eq!(RatingSummary::from_ratings(&[]), RatingSummary::default());
    }

    #[test]
    fn summary_rounds_to_one_decimal() {
        let s = RatingSummary::from_ratings(&[5, 4, 4]);
        assert_eq!(s.total_reviews, 3);
        assert_eq!(s.average_rating, 4.3);
    }

    #[test]
    fn rating_must_be_one_to_five() {
        let mut req = CreateReviewRequest {
            booking_id: Uuid::new_v4(),
            rating: 0,
            comment: None,
        };
        assert!(req.validate().is_err());
        req.rating = 6;
        assert!(req.validate().is_err());
        req.rating = 5;
        assert!(req.validate().is_ok());
        req.comment = Some("x".repeat(501));
        assert!(req.validate().is_err());
    }
}
