use sea_orm::Database;
use tracing::info;

use keel_core::tracing::init_tracing;
use keel_users::config::UsersConfig;
use keel_users::infra::password::Argon2Hasher;
use keel_users::router::build_router;
use keel_users::state::AppState;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = UsersConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let state = AppState {
        db,
        hasher: Argon2Hasher::default(),
        default_role_id: config.default_role_id,
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.users_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("users service listening on {addr}");
    axum::serve(listener, router).await.expect("server error");
}
