pub mod admin;
pub mod auth;
pub mod bookings;
pub mod cast;
pub mod messages;
pub mod profile;
pub mod reports;
pub mod reviews;
pub mod search;
pub mod webhook;

use actix_web::web;

use crate::error::AppError;
use crate::services::webhook::MAX_PAYLOAD_BYTES;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    // Malformed bodies, queries and paths answer with the usual error shape.
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _| AppError::validation(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _| AppError::validation(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _| AppError::validation(err.to_string()).into()),
    );

    // ── Account routes ──
    cfg.route("/register", web::post().to(auth::register))
        .route("/login", web::post().to(auth::login));

    cfg.service(
        web::resource("/profile")
            .route(web::get().to(profile::get_profile))
            .route(web::put().to(profile::update_profile)),
    );
    cfg.route("/profile/image", web::post().to(profile::upload_profile_image));

    // ── Public catalog (registered before the /cast scope) ──
    cfg.route("/casts/search", web::get().to(search::search_casts))
        .route("/casts/{id}", web::get().to(search::get_cast))
        .route("/service-areas", web::get().to(search::list_service_areas));

    // ── Cast self-service (cast role) ──
    cfg.service(
        web::scope("/cast")
            .route("/profile", web::put().to(cast::update_cast_profile))
            .route("/gallery", web::post().to(cast::add_gallery_image))
            .route("/gallery/{id}", web::delete().to(cast::delete_gallery_image))
            .route("/bookings", web::get().to(cast::get_cast_bookings))
            .route("/bookings/{id}/respond", web::post().to(cast::respond_to_booking))
            .route("/earnings", web::get().to(cast::get_earnings)),
    );

    // ── Guest bookings (guest role) ──
    cfg.service(
        web::scope("/guest")
            .route("/bookings", web::get().to(bookings::get_guest_bookings))
            .route("/bookings", web::post().to(bookings::create_booking))
            .route("/bookings/{id}/cancel", web::post().to(bookings::cancel_booking)),
    );

    // ── Shared booking routes (either party) ──
    cfg.service(
        web::scope("/bookings")
            .route("/{id}", web::get().to(bookings::get_booking))
            .route("/{id}/cancel", web::post().to(bookings::cancel_booking))
            .route("/{id}/complete", web::post().to(bookings::complete_booking))
            .route("/{id}/messages", web::get().to(messages::get_messages))
            .route("/{id}/messages", web::post().to(messages::send_message)),
    );

    // ── Reviews, reports, blocks ──
    cfg.route("/reviews", web::post().to(reviews::create_review))
        .route("/users/{id}/reviews", web::get().to(reviews::get_user_reviews))
        .route("/reports", web::post().to(reports::create_report));
    cfg.service(
        web::resource("/blocks")
            .route(web::get().to(reports::get_blocks))
            .route(web::post().to(reports::create_block)),
    );
    cfg.route("/blocks/{user_id}", web::delete().to(reports::delete_block));

    // ── Admin (X-Admin-Password) ──
    cfg.service(
        web::scope("/admin")
            .route("/dashboard", web::get().to(admin::dashboard))
            .route("/casts/pending", web::get().to(admin::pending_casts))
            .route("/casts/{id}/approve", web::post().to(admin::approve_cast))
            .route("/casts/{id}/reject", web::post().to(admin::reject_cast))
            .route("/bookings", web::get().to(admin::list_bookings))
            .route("/analytics", web::get().to(admin::analytics))
            .route("/reports", web::get().to(admin::list_reports))
            .route("/reports/{id}", web::put().to(admin::update_report)),
    );

    // ── Payment webhook ──
    cfg.service(
        web::resource("/stripe/webhook")
            .app_data(web::PayloadConfig::new(MAX_PAYLOAD_BYTES))
            .route(web::post().to(webhook::stripe_webhook)),
    );
}
