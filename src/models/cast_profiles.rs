use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::gallery::GalleryImageResponse;
use crate::models::users::UserResponse;

/// Pricing tier. Each rank carries a fixed hourly rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum Rank {
    #[sea_orm(string_value = "standard")]
    Standard,
    #[sea_orm(string_value = "premium")]
    Premium,
    #[sea_orm(string_value = "vip")]
    Vip,
}

impl Rank {
    pub fn hourly_rate(self) -> f64 {
        match self {
            Rank::Standard => 60.0,
            Rank::Premium => 100.0,
            Rank::Vip => 150.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

/// SeaORM entity for the `cast_profiles` table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cast_profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub user_id: Uuid,
    #[sea_orm(column_type = "Text", nullable)]
    pub bio: Option<String>,
    pub hourly_rate: f64,
    pub rank: Rank,
    pub service_areas: Vec<String>,
    pub approval_status: ApprovalStatus,
    pub approved_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(has_many = "super::gallery::Entity")]
    Gallery,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::gallery::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Gallery.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// ── DTOs ──

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateCastProfileRequest {
    #[validate(length(max = 2000, message = "Bio must be at most 2000 characters"))]
    pub bio: Option<String>,
    pub rank: Option<Rank>,
    #[validate(length(max = 20, message = "At most 20 service areas"))]
    pub service_areas: Option<Vec<String>>,
}

/// Rejection reason supplied by an admin.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RejectCastRequest {
    #[validate(length(max = 1000))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CastProfileResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub bio: Option<String>,
    pub hourly_rate: f64,
    pub rank: Rank,
    pub service_areas: Vec<String>,
    pub approval_status: ApprovalStatus,
    pub approved_at: Option<DateTimeUtc>,
    pub gallery: Vec<GalleryImageResponse>,
}

impl CastProfileResponse {
    pub fn new(m: Model, gallery: Vec<GalleryImageResponse>) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            bio: m.bio,
            hourly_rate: m.hourly_rate,
            rank: m.rank,
            service_areas: m.service_areas,
            approval_status: m.approval_status,
            approved_at: m.approved_at,
            gallery,
        }
    }
}

/// A cast awaiting approval, as listed for admins.
#[derive(Debug, Serialize)]
pub struct PendingCast {
    pub user: UserResponse,
    pub profile: CastProfileResponse,
}

/// Trim, drop blanks and de-duplicate area names while keeping their order.
pub fn normalize_areas(areas: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(areas.len());
    for area in areas {
        let area = area.trim();
        if !area.is_empty() && !out.iter().any(|a| a == area) {
            out.push(area.to_string());
        }
    }
    out
}
