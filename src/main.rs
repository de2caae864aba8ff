/// Geopost Service - HTTP server
///
/// Wires the object store, search index, classifier, and credential
/// subsystem behind a versioned HTTP API. Protected routes sit behind the
/// JWT gate; signup and login are open.
use actix_cors::Cors;
use actix_web::{middleware as actix_middleware, web, App, HttpResponse, HttpServer};
use std::io;
use std::sync::Arc;

use geopost_service::handlers;
use geopost_service::middleware::JwtAuth;
use geopost_service::security::jwt::TokenIssuer;
use geopost_service::services::audit_log::AuditLog;
use geopost_service::services::classifier::FaceClassifier;
use geopost_service::services::media_store::MediaStore;
use geopost_service::services::post_index::PostIndex;
use geopost_service::services::user_store::UserStore;
use geopost_service::Config;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("configuration: {e}")))?;

    // Idempotent schema setup happens inside the store constructors.
    let post_index = PostIndex::new(&config.elasticsearch)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("post index: {e}")))?;
    let user_store = UserStore::new(&config.elasticsearch)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("user store: {e}")))?;

    let media_store = MediaStore::new(&config.s3).await;
    let classifier = FaceClassifier::new(&config.vision);
    let issuer = TokenIssuer::new(&config.auth);
    let issuer_gate = Arc::new(issuer.clone());

    let audit = match &config.audit.clickhouse_url {
        Some(url) => Some(
            AuditLog::new(url, &config.audit.table)
                .await
                .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("audit store: {e}")))?,
        ),
        None => None,
    };

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!(%bind_address, "starting geopost-service");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(post_index.clone()))
            .app_data(web::Data::new(user_store.clone()))
            .app_data(web::Data::new(media_store.clone()))
            .app_data(web::Data::new(classifier.clone()))
            .app_data(web::Data::new(issuer.clone()))
            .app_data(web::Data::new(audit.clone()))
            .wrap(actix_middleware::Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header(),
            )
            .route(
                "/api/v1/health",
                web::get()
                    .to(|| async { HttpResponse::Ok().json(serde_json::json!({"status": "ok"})) }),
            )
            .route("/api/v1/signup", web::post().to(handlers::signup))
            .route("/api/v1/login", web::post().to(handlers::login))
            .service(
                web::scope("/api/v1")
                    .wrap(JwtAuth::new(issuer_gate.clone()))
                    .route("/post", web::post().to(handlers::create_post))
                    .route("/search", web::get().to(handlers::search))
                    .route("/cluster", web::get().to(handlers::cluster)),
            )
    })
    .bind(bind_address)?
    .run()
    .await
}
