use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;

use crate::models::reports::{self, ReportStatus};

pub async fn insert_report(
    db: &DatabaseConnection,
    reporter_id: Uuid,
    reported_user_id: Uuid,
    reason: String,
    description: String,
) -> Result<reports::Model, DbErr> {
    let now = Utc::now();
    reports::ActiveModel {
        id: Set(Uuid::new_v4()),
        reporter_id: Set(reporter_id),
        reported_user_id: Set(reported_user_id),
        reason: Set(reason),
        description: Set(description),
        status: Set(ReportStatus::Pending),
        admin_notes: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
}

/// Reports, newest first, optionally filtered by status.
pub async fn get_reports(
    db: &DatabaseConnection,
    status: Option<ReportStatus>,
) -> Result<Vec<reports::Model>, DbErr> {
    let mut query = reports::Entity::find();
    if let Some(status) = status {
        query = query.filter(reports::Column::Status.eq(status));
    }
    query
        .order_by_desc(reports::Column::CreatedAt)
        .all(db)
        .await
}

/// Set status and notes on a report. Returns `None` if it does not exist.
pub async fn update_report(
    db: &DatabaseConnection,
    id: Uuid,
    status: ReportStatus,
    admin_notes: Option<String>,
) -> Result<Option<reports::Model>, DbErr> {
    let Some(report) = reports::Entity::find_by_id(id).one(db).await? else {
        return Ok(None);
    };

    let mut active: reports::ActiveModel = report.into();
    active.status = Set(status);
    if admin_notes.is_some() {
        active.admin_notes = Set(admin_notes);
    }
    active.updated_at = Set(Utc::now());

    active.update(db).await.map(Some)
}
