use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use crate::config::ServeSettings;
use crate::storage::Database;

pub mod routes;

/// Server state
///
/// The single database handle. Every request holds the lock for the duration
/// of its one repository call, so writes never interleave.
pub struct AppState {
    pub db: Mutex<Database>,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }
}

/// Build the application router. API routes live under `/api`; anything else
/// is served from `static_dir`.
pub fn router(state: Arc<AppState>, static_dir: &Path) -> Router {
    let api = Router::new()
        .route("/people", get(routes::list_people).post(routes::create_person))
        .route(
            "/people/{id}",
            get(routes::get_person)
                .put(routes::update_person)
                .delete(routes::delete_person),
        )
        .route("/roles", get(routes::list_roles).post(routes::create_role))
        .route(
            "/roles/{id}",
            get(routes::get_role)
                .put(routes::update_role)
                .delete(routes::delete_role),
        )
        .route("/user_roles", post(routes::create_user_role))
        .route(
            "/user_roles/{id}/roles",
            get(routes::get_user_roles).put(routes::set_user_roles),
        )
        .route("/stats", get(routes::get_stats));

    Router::new()
        .nest("/api", api)
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(settings: ServeSettings, db: Database) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(db));
    let app = router(state.clone(), &settings.static_dir);

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    tracing::info!("Starting server on {}", addr);
    println!("🌍 Server running at http://{}", addr);
    println!("   API available at http://{}/api/people", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped, closing database");
    match Arc::try_unwrap(state) {
        Ok(state) => state.db.into_inner().close()?,
        Err(state) => state.db.lock().await.flush()?,
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
