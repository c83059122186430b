use axum::Router;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use maxikiosco::api_docs::ApiDoc;
use maxikiosco::{afip, api, config, db, seed};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "maxikiosco=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize database
    let database = db::init_db(&config.database_url)
        .await
        .expect("Failed to initialize database");

    // Check for seed flag
    if std::env::var("SEED_DEMO").is_ok() {
        tracing::info!("Seeding demo data...");
        if let Err(e) = seed::seed_demo_data(&database).await {
            tracing::error!("Failed to seed data: {}", e);
        } else {
            tracing::info!("Demo data seeded successfully.");
        }
    }

    if config.afip.habilitado() {
        tracing::info!(
            punto_venta = config.afip.punto_venta,
            tipo_comprobante = config.afip.tipo_comprobante,
            "Facturación electrónica habilitada"
        );
    } else {
        tracing::warn!("AFIP_CUIT sin configurar: las ventas con factura van a fallar");
    }

    let afip_client = afip::AfipClient::new(config.afip.clone());
    let state = db::AppState {
        db: database,
        afip: afip_client,
        config: config.clone(),
    };

    // Build API router
    let api_router = api::api_router(state);

    let cors = if config.cors_allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let mut origins = Vec::new();
        for origin in &config.cors_allowed_origins {
            match origin.parse::<axum::http::HeaderValue>() {
                Ok(v) => origins.push(v),
                Err(e) => tracing::error!("Failed to parse CORS origin '{}': {}", origin, e),
            }
        }
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let app = Router::new()
        .merge(SwaggerUi::new("/api/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api_router)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Maxikiosco server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
