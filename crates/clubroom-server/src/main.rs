use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, patch, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use clubroom_api::auth::{self, AppState, AppStateInner};
use clubroom_api::middleware::require_auth;
use clubroom_api::portal::HttpPortal;
use clubroom_api::{club_info, files, magazines, members, posts};

/// Leaves headroom over the 50 MB per-file cap for multipart framing.
const BODY_LIMIT: usize = 52 * 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clubroom=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("CLUBROOM_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("CLUBROOM_DB_PATH").unwrap_or_else(|_| "clubroom.db".into());
    let portal_url = std::env::var("CLUBROOM_PORTAL_URL")
        .unwrap_or_else(|_| "https://portal.example.ac.kr".into());
    let host = std::env::var("CLUBROOM_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("CLUBROOM_PORT")
        .unwrap_or_else(|_| "8000".into())
        .parse()?;

    // Init database
    let db = clubroom_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret,
        portal: Arc::new(HttpPortal::new(portal_url)),
    });

    // Routes. Public reads and token endpoints carry no layer; mutating and
    // member-facing method routers are gated per route so that a public GET
    // and a gated PUT can share a path.
    let auth_layer = middleware::from_fn_with_state(state.clone(), require_auth);

    let app = Router::new()
        .route("/register", post(auth::register))
        .route("/token", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/club-information", get(club_info::get_club_information))
        .route(
            "/club-information",
            put(club_info::update_club_information).route_layer(auth_layer.clone()),
        )
        .route("/about", get(posts::get_about))
        .route("/about", put(posts::put_about).route_layer(auth_layer.clone()))
        .route("/rules", get(posts::get_rules))
        .route("/rules", put(posts::put_rules).route_layer(auth_layer.clone()))
        .route("/notices", get(posts::list_notices))
        .route(
            "/notices",
            post(posts::create_notice).route_layer(auth_layer.clone()),
        )
        .route("/notices/{no}", get(posts::get_notice))
        .route(
            "/notices/{no}",
            patch(posts::update_notice)
                .delete(posts::delete_notice)
                .route_layer(auth_layer.clone()),
        )
        .route("/recent-notices", get(posts::recent_notices))
        .route("/magazines", get(magazines::list_magazines))
        .route(
            "/magazines",
            post(magazines::create_magazine).route_layer(auth_layer.clone()),
        )
        .route("/magazines/{published}", get(magazines::get_magazine))
        .route(
            "/magazines/{published}",
            patch(magazines::update_magazine)
                .delete(magazines::delete_magazine)
                .route_layer(auth_layer.clone()),
        )
        .route("/recent-magazines", get(magazines::recent_magazines))
        .route("/uploaded/{id}", get(files::download_file))
        .route(
            "/uploaded/{id}",
            delete(files::delete_file).route_layer(auth_layer.clone()),
        )
        .route(
            "/uploaded",
            post(files::upload_file).route_layer(auth_layer.clone()),
        )
        .route("/uploaded-info/{id}", get(files::file_info))
        .route("/me", get(members::get_myself).route_layer(auth_layer.clone()))
        .route(
            "/members",
            get(members::list_members).route_layer(auth_layer.clone()),
        )
        .route(
            "/members/{student_id}",
            get(members::get_member)
                .patch(members::update_member)
                .delete(members::delete_member)
                .route_layer(auth_layer),
        )
        .with_state(state)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Clubroom server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
