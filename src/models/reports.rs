use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "reviewed")]
    Reviewed,
    #[sea_orm(string_value = "resolved")]
    Resolved,
}

/// SeaORM entity for the `reports` table.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reports")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub reporter_id: Uuid,
    pub reported_user_id: Uuid,
    pub reason: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub status: ReportStatus,
    #[sea_orm(column_type = "Text", nullable)]
    pub admin_notes: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ReporterId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    Reporter,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ReportedUserId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    ReportedUser,
}

impl ActiveModelBehavior for ActiveModel {}

// ── DTOs ──

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateReportRequest {
    pub reported_user_id: Uuid,
    #[validate(length(min = 1, max = 100, message = "Reason is required"))]
    pub reason: String,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateReportRequest {
    pub status: ReportStatus,
    #[validate(length(max = 2000))]
    pub admin_notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportFilter {
    pub status: Option<ReportStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportView {
    #[serde(flatten)]
    pub report: Model,
    pub reporter_name: Option<String>,
    pub reported_user_name: Option<String>,
}
