use actix_web::{HttpResponse, web};
use chrono::{Duration, Utc};
use sea_orm::DatabaseConnection;
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AdminGuard;
use crate::db::bookings as booking_db;
use crate::db::cast_profiles as cast_db;
use crate::db::reports as report_db;
use crate::db::reviews as review_db;
use crate::db::service_areas as area_db;
use crate::db::users as user_db;
use crate::error::{AppError, AppResult};
use crate::handlers::bookings::booking_views;
use crate::models::analytics::{
    AnalyticsResponse, DashboardStats, TopCast, booking_trend, casts_per_area, top_earners,
};
use crate::models::bookings::StatusFilter;
use crate::models::cast_profiles::{
    ApprovalStatus, CastProfileResponse, PendingCast, RejectCastRequest,
};
use crate::models::reports::{ReportFilter, ReportStatus, ReportView, UpdateReportRequest};
use crate::models::users::{Roles, UserResponse};
use crate::models::{Page, PaginationQuery};
use crate::services::email::Notifier;

const RECENT_BOOKINGS: u64 = 10;
const TREND_DAYS: i64 = 30;
const TOP_CASTS: usize = 10;
const BOOKINGS_PAGE_DEFAULT: u64 = 50;
const BOOKINGS_PAGE_MAX: u64 = 100;

/// GET /api/admin/dashboard
pub async fn dashboard(
    _admin: AdminGuard,
    db: web::Data<DatabaseConnection>,
) -> AppResult<HttpResponse> {
    let db = db.get_ref();
    let (recent, _) = booking_db::get_bookings_page(db, None, 1, RECENT_BOOKINGS).await?;

    Ok(HttpResponse::Ok().json(DashboardStats {
        total_users: user_db::count_users(db, None).await?,
        total_guests: user_db::count_users(db, Some(Roles::Guest)).await?,
        total_casts: user_db::count_users(db, Some(Roles::Cast)).await?,
        total_bookings: booking_db::count_bookings(db).await?,
        total_revenue: booking_db::completed_revenue(db).await?,
        recent_bookings: booking_views(db, recent, Utc::now()).await?,
    }))
}

/// GET /api/admin/casts/pending
pub async fn pending_casts(
    _admin: AdminGuard,
    db: web::Data<DatabaseConnection>,
) -> AppResult<HttpResponse> {
    let profiles = cast_db::get_pending_profiles(db.get_ref()).await?;
    let mut users =
        user_db::get_users_by_ids(db.get_ref(), profiles.iter().map(|p| p.user_id).collect())
            .await?;

    let pending: Vec<PendingCast> = profiles
        .into_iter()
        .filter_map(|profile| {
            let user = users.remove(&profile.user_id)?;
            Some(PendingCast {
                user: UserResponse::from(user),
                profile: CastProfileResponse::new(profile, Vec::new()),
            })
        })
        .collect();

    Ok(HttpResponse::Ok().json(pending))
}

/// POST /api/admin/casts/{id}/approve
///
/// `id` is the cast's user id. Only pending profiles can be decided.
pub async fn approve_cast(
    _admin: AdminGuard,
    db: web::Data<DatabaseConnection>,
    notifier: web::Data<Notifier>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let user_id = path.into_inner();
    let profile = cast_db::decide_approval(db.get_ref(), user_id, ApprovalStatus::Approved)
        .await?
        .ok_or_else(|| AppError::not_found("Pending cast not found"))?;

    tracing::info!(cast_id = %user_id, "cast approved");

    if let Some(user) = user_db::get_user_by_id(db.get_ref(), user_id).await? {
        notifier.dispatch(notifier.cast_approved(&user.email, &user.name));
    }

    Ok(HttpResponse::Ok().json(CastProfileResponse::new(profile, Vec::new())))
}

/// POST /api/admin/casts/{id}/reject
pub async fn reject_cast(
    _admin: AdminGuard,
    db: web::Data<DatabaseConnection>,
    notifier: web::Data<Notifier>,
    path: web::Path<Uuid>,
    body: Option<web::Json<RejectCastRequest>>,
) -> AppResult<HttpResponse> {
    let input = body.map(web::Json::into_inner).unwrap_or_default();
    input.validate()?;

    let user_id = path.into_inner();
    let profile = cast_db::decide_approval(db.get_ref(), user_id, ApprovalStatus::Rejected)
        .await?
        .ok_or_else(|| AppError::not_found("Pending cast not found"))?;

    tracing::info!(cast_id = %user_id, "cast rejected");

    if let Some(user) = user_db::get_user_by_id(db.get_ref(), user_id).await? {
        notifier.dispatch(notifier.cast_rejected(&user.email, &user.name, input.reason.as_deref()));
    }

    Ok(HttpResponse::Ok().json(CastProfileResponse::new(profile, Vec::new())))
}

/// GET /api/admin/bookings
pub async fn list_bookings(
    _admin: AdminGuard,
    db: web::Data<DatabaseConnection>,
    filter: web::Query<StatusFilter>,
    paging: web::Query<PaginationQuery>,
) -> AppResult<HttpResponse> {
    let page = paging.page();
    let limit = paging.limit_within(BOOKINGS_PAGE_DEFAULT, BOOKINGS_PAGE_MAX);

    let (rows, total) = booking_db::get_bookings_page(db.get_ref(), filter.status, page, limit).await?;
    let views = booking_views(db.get_ref(), rows, Utc::now()).await?;

    Ok(HttpResponse::Ok().json(Page::new(views, total, page, limit)))
}

/// GET /api/admin/analytics
///
/// Daily bookings and revenue for the last 30 days, the ten casts with the
/// most completed revenue and the approved-cast count per service area.
pub async fn analytics(
    _admin: AdminGuard,
    db: web::Data<DatabaseConnection>,
) -> AppResult<HttpResponse> {
    let db = db.get_ref();

    let since = Utc::now().date_naive() - Duration::days(TREND_DAYS - 1);
    let trend_rows = booking_db::get_trend_rows(db, since).await?;

    let earners = top_earners(&booking_db::get_completed_amounts(db).await?, TOP_CASTS);
    let ids: Vec<Uuid> = earners.iter().map(|(id, _, _)| *id).collect();
    let names = user_db::get_users_by_ids(db, ids.clone()).await?;
    let ratings = review_db::get_rating_summaries(db, ids).await?;

    let top_casts = earners
        .into_iter()
        .map(|(cast_id, completed_bookings, revenue)| TopCast {
            cast_id,
            name: names.get(&cast_id).map(|u| u.name.clone()),
            completed_bookings,
            revenue,
            average_rating: ratings
                .get(&cast_id)
                .map(|r| r.average_rating)
                .unwrap_or_default(),
        })
        .collect();

    let areas = area_db::get_service_areas(db).await?;
    let served = cast_db::get_approved_service_areas(db).await?;

    Ok(HttpResponse::Ok().json(AnalyticsResponse {
        booking_trend: booking_trend(&trend_rows),
        top_casts,
        area_stats: casts_per_area(&areas, &served),
    }))
}

/// GET /api/admin/reports
pub async fn list_reports(
    _admin: AdminGuard,
    db: web::Data<DatabaseConnection>,
    query: web::Query<ReportFilter>,
) -> AppResult<HttpResponse> {
    let reports = report_db::get_reports(db.get_ref(), query.status).await?;
    let ids = reports
        .iter()
        .flat_map(|r| [r.reporter_id, r.reported_user_id])
        .collect();
    let names = user_db::get_summaries_by_ids(db.get_ref(), ids).await?;

    let views: Vec<ReportView> = reports
        .into_iter()
        .map(|report| ReportView {
            reporter_name: names.get(&report.reporter_id).map(|u| u.name.clone()),
            reported_user_name: names.get(&report.reported_user_id).map(|u| u.name.clone()),
            report,
        })
        .collect();

    Ok(HttpResponse::Ok().json(views))
}

/// PUT /api/admin/reports/{id}
pub async fn update_report(
    _admin: AdminGuard,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateReportRequest>,
) -> AppResult<HttpResponse> {
    let input = body.into_inner();
    input.validate()?;

    if input.status == ReportStatus::Pending {
        return Err(AppError::validation("Status must be reviewed or resolved"));
    }

    let report = report_db::update_report(db.get_ref(), path.into_inner(), input.status, input.admin_notes)
        .await?
        .ok_or_else(|| AppError::not_found("Report not found"))?;

    Ok(HttpResponse::Ok().json(report))
}
