use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};
use dotenv::dotenv;
use migration::{Migrator, MigratorTrait};
use tracing_subscriber::EnvFilter;
use uso_backend::config::AppConfig;
use uso_backend::create_pool;
use uso_backend::handlers;
use uso_backend::services::email::{LogMailer, Mailer, Notifier, ResendMailer};
use uso_backend::services::payments::{PaymentGateway, StripeGateway, worst_case_call_time};
use uso_backend::services::webhook::WebhookDeduper;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = AppConfig::from_env().map_err(io::Error::other)?;

    let db = create_pool(&config.database_url)
        .await
        .map_err(io::Error::other)?;
    Migrator::up(&db, None).await.map_err(io::Error::other)?;
    tracing::info!("Database migrations applied");

    let gateway: Arc<dyn PaymentGateway> =
        Arc::new(StripeGateway::new(&config.payments).map_err(io::Error::other)?);
    tracing::info!(
        worst_case_ms = worst_case_call_time(&config.payments).as_millis() as u64,
        "Payment gateway configured"
    );

    let mailer: Arc<dyn Mailer> = match config.email.resend_api_key.as_deref() {
        Some(key) => Arc::new(ResendMailer::new(key, &config.email.from).map_err(io::Error::other)?),
        None => {
            tracing::warn!("RESEND_API_KEY not set; emails will only be logged");
            Arc::new(LogMailer)
        }
    };
    let notifier = web::Data::new(Notifier::new(mailer, config.base_url.clone()));

    let bind_addr = format!("0.0.0.0:{}", config.port);

    let db_data = web::Data::new(db);
    let config_data = web::Data::new(config);
    let payments_data: web::Data<dyn PaymentGateway> = web::Data::from(gateway);
    let deduper_data = web::Data::new(WebhookDeduper::default());

    tracing::info!("Server running at http://{bind_addr}");

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
                actix_web::http::header::HeaderName::from_static("x-admin-password"),
            ])
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(db_data.clone())
            .app_data(config_data.clone())
            .app_data(payments_data.clone())
            .app_data(notifier.clone())
            .app_data(deduper_data.clone())
            .service(web::scope("/api").configure(handlers::init_routes))
    })
    .bind(&bind_addr)?
    .run()
    .await
}
