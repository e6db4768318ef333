use anyhow::Context;
use axum::{routing::get, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use report_portal_api::auth::ClaimedIdentityGuard;
use report_portal_api::config;
use report_portal_api::handlers::{self, AppState};
use report_portal_api::services::account::AccountService;
use report_portal_api::services::catalog::CatalogService;
use report_portal_api::store::reports::ReportStore;
use report_portal_api::store::users::UserStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up PORTAL_DATA_DIR, PORT, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = config::config();
    tracing::info!("Starting report portal API in {:?} mode", config.environment);

    // Opening the user store runs the one-shot plaintext-to-hash migration.
    // A failed migration write is fatal: booting anyway would re-hash the
    // same records on every start.
    let users = Arc::new(
        UserStore::open(config.users_path(), config.security.bcrypt_cost)
            .context("user store startup failed")?,
    );
    let catalog = Arc::new(ReportStore::open(config.reports_path()));
    let guard = Arc::new(ClaimedIdentityGuard::new(users.clone()));

    let state = AppState {
        account: AccountService::new(users, catalog.clone(), guard.clone()),
        catalog: CatalogService::new(catalog, guard),
    };

    let app = app(state);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    println!("🚀 Report portal API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server")?;
    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Session (no token issued; identity is held client-side)
        .merge(session_routes())
        // User and catalog management
        .merge(user_routes())
        .merge(report_routes())
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn session_routes() -> Router<AppState> {
    use axum::routing::post;
    use handlers::session;

    Router::new()
        .route("/login", post(session::login))
        .route("/change-password", post(session::change_password))
}

fn user_routes() -> Router<AppState> {
    use axum::routing::put;
    use handlers::users;

    Router::new()
        .route("/users", get(users::list).post(users::create))
        .route("/users/:username", put(users::update).delete(users::remove))
}

fn report_routes() -> Router<AppState> {
    use axum::routing::delete;
    use handlers::reports;

    Router::new()
        .route("/reports", get(reports::list).post(reports::upsert))
        .route("/reports/:id", delete(reports::remove))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "name": "Report Portal API",
        "version": version,
        "description": "Per-user embedded report links with admin-managed accounts and catalog",
        "endpoints": {
            "login": "POST /login (public)",
            "change_password": "POST /change-password (public)",
            "users": "GET /users (public), POST /users, PUT/DELETE /users/:username (admin)",
            "reports": "GET /reports (public), POST /reports, DELETE /reports/:id (admin)",
        }
    }))
}

async fn health() -> axum::response::Json<Value> {
    axum::response::Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now()
        }
    }))
}
