use actix_web::{HttpResponse, web};
use sea_orm::DatabaseConnection;
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthenticatedUser;
use crate::db::blocks as block_db;
use crate::db::reports as report_db;
use crate::db::users as user_db;
use crate::error::{AppError, AppResult};
use crate::models::blocks::{BlockView, CreateBlockRequest};
use crate::models::reports::CreateReportRequest;

async fn ensure_user_exists(db: &DatabaseConnection, id: Uuid) -> AppResult<()> {
    match user_db::get_user_by_id(db, id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::not_found("User not found")),
    }
}

/// POST /api/reports
pub async fn create_report(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    body: web::Json<CreateReportRequest>,
) -> AppResult<HttpResponse> {
    let input = body.into_inner();
    input.validate()?;

    if input.reported_user_id == user.id {
        return Err(AppError::validation("You cannot report yourself"));
    }
    let reason = input.reason.trim().to_string();
    if reason.is_empty() {
        return Err(AppError::validation("Reason is required"));
    }
    ensure_user_exists(db.get_ref(), input.reported_user_id).await?;

    let report = report_db::insert_report(
        db.get_ref(),
        user.id,
        input.reported_user_id,
        reason,
        input.description.trim().to_string(),
    )
    .await?;

    tracing::info!(report_id = %report.id, reported_user_id = %report.reported_user_id, "report filed");

    Ok(HttpResponse::Created().json(report))
}

/// POST /api/blocks
pub async fn create_block(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    body: web::Json<CreateBlockRequest>,
) -> AppResult<HttpResponse> {
    let target = body.blocked_user_id;
    if target == user.id {
        return Err(AppError::validation("You cannot block yourself"));
    }
    ensure_user_exists(db.get_ref(), target).await?;

    let block = block_db::insert_block(db.get_ref(), user.id, target)
        .await
        .map_err(|e| AppError::from_insert(e, "User already blocked"))?;

    Ok(HttpResponse::Created().json(block))
}

/// DELETE /api/blocks/{user_id}
pub async fn delete_block(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let removed = block_db::delete_block(db.get_ref(), user.id, path.into_inner()).await?;
    if removed == 0 {
        return Err(AppError::not_found("Block not found"));
    }
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/blocks
pub async fn get_blocks(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
) -> AppResult<HttpResponse> {
    let blocks = block_db::get_blocks_by_user(db.get_ref(), user.id).await?;
    let ids = blocks.iter().map(|b| b.blocked_user_id).collect();
    let summaries = user_db::get_summaries_by_ids(db.get_ref(), ids).await?;

    let views: Vec<BlockView> = blocks
        .into_iter()
        .map(|b| BlockView {
            id: b.id,
            blocked_user: summaries.get(&b.blocked_user_id).cloned(),
            created_at: b.created_at,
        })
        .collect();

    Ok(HttpResponse::Ok().json(views))
}
