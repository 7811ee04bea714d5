use chrono::{NaiveDate, NaiveTime};
use sea_orm::prelude::Expr;
use sea_orm::{ColumnTrait, Condition};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Page;
use crate::models::bookings::Slot;
use crate::models::cast_profiles::{self, ApprovalStatus, CastProfileResponse, Rank};
use crate::models::reviews::{RatingSummary, ReviewView};
use crate::models::time_of_day;
use crate::models::users::UserSummary;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 50;

/// Query string for `GET /api/casts/search`. Every filter is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CastSearchParams {
    pub location: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub rank: Option<Rank>,
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "time_of_day::option::deserialize")]
    pub start_time: Option<NaiveTime>,
    pub duration_hours: Option<i32>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl CastSearchParams {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    fn location(&self) -> Option<&str> {
        self.location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
    }

    /// The window a cast must be free for; needs both date and start time.
    pub fn availability_slot(&self) -> Option<Slot> {
        Some(Slot {
            date: self.date?,
            start: self.start_time?,
            duration_hours: self.duration_hours.unwrap_or(1).clamp(1, 24),
        })
    }

    /// Filter over `cast_profiles`, excluding casts in `busy`.
    pub fn condition(&self, busy: &[Uuid]) -> Condition {
        let mut cond = Condition::all()
            .add(cast_profiles::Column::ApprovalStatus.eq(ApprovalStatus::Approved));

        if let Some(location) = self.location() {
            cond = cond.add(Expr::cust_with_values(
                "? = ANY(\"cast_profiles\".\"service_areas\")",
                [location.to_string()],
            ));
        }
        if let Some(min) = self.min_price {
            cond = cond.add(cast_profiles::Column::HourlyRate.gte(min));
        }
        if let Some(max) = self.max_price {
            cond = cond.add(cast_profiles::Column::HourlyRate.lte(max));
        }
        if let Some(rank) = self.rank {
            cond = cond.add(cast_profiles::Column::Rank.eq(rank));
        }
        if !busy.is_empty() {
            cond = cond.add(cast_profiles::Column::UserId.is_not_in(busy.iter().copied()));
        }
        cond
    }
}

/// One search hit.
#[derive(Debug, Clone, Serialize)]
pub struct CastCard {
    pub user_id: Uuid,
    pub name: String,
    pub profile_image: Option<String>,
    pub bio: Option<String>,
    pub hourly_rate: f64,
    pub rank: Rank,
    pub service_areas: Vec<String>,
    pub gallery_image: Option<String>,
    pub average_rating: f64,
    pub total_reviews: u64,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub casts: Vec<CastCard>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl From<Page<CastCard>> for SearchResponse {
    fn from(p: Page<CastCard>) -> Self {
        Self {
            casts: p.items,
            total: p.total,
            page: p.page,
            limit: p.limit,
            total_pages: p.total_pages,
        }
    }
}

/// Public view of a single approved cast.
#[derive(Debug, Serialize)]
pub struct CastDetailResponse {
    pub user: UserSummary,
    pub profile: CastProfileResponse,
    pub rating: RatingSummary,
    pub reviews: Vec<ReviewView>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, EntityTrait, QueryFilter, QueryTrait};

    fn sql(params: &CastSearchParams, busy: &[Uuid]) -> String {
        cast_profiles::Entity::find()
            .filter(params.condition(busy))
            .build(DbBackend::Postgres)
            .to_string()
    }

    #[test]
    fn page_size_is_clamped() {
        let mut p = CastSearchParams::default();
        assert_eq!((p.page(), p.limit()), (1, 20));
        p.limit = Some(500);
        p.page = Some(0);
        assert_eq!((p.page(), p.limit()), (1, 50));
        p.limit = Some(0);
        assert_eq!(p.limit(), 1);
    }

    #[test]
    fn availability_needs_date_and_time() {
        let mut p = CastSearchParams {
            date: NaiveDate::from_ymd_opt(2025, 3, 10),
            ..Default::default()
        };
        assert!(p.availability_slot().is_none());

        p.start_time = time_of_day::parse("10:00");
        let slot = p.availability_slot().unwrap();
        assert_eq!(slot.duration_hours, 1);

        p.duration_hours = Some(3);
        assert_eq!(p.availability_slot().unwrap().duration_hours, 3);
    }

    #[test]
    fn no_filters_means_only_approved() {
        let q = sql(&CastSearchParams::default(), &[]);
        assert!(q.contains("approval_status"));
        assert!(q.contains("'approved'"));
        assert!(!q.contains("ANY"));
        assert!(!q.contains("NOT IN"));
    }

    #[test]
    fn filters_compose_into_one_condition() {
        let params = CastSearchParams {
            location: Some("Shibuya".into()),
            min_price: Some(80.0),
            rank: Some(Rank::Premium),
            ..Default::default()
        };
        let q = sql(&params, &[Uuid::nil()]);
        assert!(q.contains("'Shibuya' = ANY"));
        assert!(q.contains("'premium'"));
        assert!(q.contains(">= 80"));
        assert!(q.contains("NOT IN"));
    }

    #[test]
    fn blank_location_is_ignored() {
        let params = CastSearchParams {
            location: Some("  ".into()),
            ..Default::default()
        };
        assert!(!sql(&params, &[]).contains("ANY"));
    }

    #[test]
    fn query_string_parses() {
        let params: CastSearchParams = serde_urlencoded_like(
            "location=Ginza&rank=vip&date=2025-03-10&start_time=19:30&page=2",
        );
        assert_eq!(params.rank, Some(Rank::Vip));
        assert_eq!(params.start_time, time_of_day::parse("19:30"));
        assert_eq!(params.page(), 2);
    }

    fn serde_urlencoded_like(qs: &str) -> CastSearchParams {
        actix_web::web::Query::<CastSearchParams>::from_query(qs)
            .unwrap()
            .into_inner()
    }
}
