mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod schema;
mod services;
mod storage;


use axum::{
    extract::DefaultBodyLimit,
    handler::Handler,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};
use mime_guess::mime;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Database;
use crate::middleware::media::{accept, require};
use crate::storage::Uploads;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
    pub uploads: Arc<Uploads>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tuneful=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Tuneful...");

    let config = Arc::new(Config::load()?);
    tracing::info!("Configuration loaded");

    let db = Database::new(&config.database.path).await?;
    db.run_migrations().await?;
    tracing::info!("Database initialized");

    let uploads = Arc::new(Uploads::new(&config.storage.upload_path));
    tracing::info!("Serving uploads from {:?}", uploads.resolve(None));

    let state = AppState {
        db,
        config: config.clone(),
        uploads,
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Guards run in the order listed, each before the handler sees the body
    let accept_json = from_fn_with_state(mime::APPLICATION_JSON, accept);
    let require_json = from_fn_with_state(mime::APPLICATION_JSON, require);
    let require_multipart = from_fn_with_state(mime::MULTIPART_FORM_DATA, require);

    let json_in_json_out = ServiceBuilder::new()
        .layer(accept_json.clone())
        .layer(require_json);
    let multipart_in_json_out = ServiceBuilder::new()
        .layer(require_multipart)
        .layer(accept_json.clone());

    let api_routes = Router::new()
        .route(
            "/songs",
            get(handlers::song::list_songs.layer(accept_json))
                .post(handlers::song::create_song.layer(json_in_json_out.clone())),
        )
        .route(
            "/songs/upload",
            post(handlers::song::upload_song.layer(multipart_in_json_out.clone())),
        )
        .route(
            "/files",
            post(handlers::file::upload_file.layer(multipart_in_json_out)),
        )
        .route(
            "/files/:id",
            delete(handlers::song::delete_song.layer(json_in_json_out)),
        );

    let max_upload_size = state.config.storage.max_upload_size;

    Router::new()
        .nest("/api", api_routes)
        .route("/uploads/:filename", get(handlers::file::uploaded_file))
        .layer(DefaultBodyLimit::max(max_upload_size))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
