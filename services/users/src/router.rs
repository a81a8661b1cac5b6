use axum::{
    Router,
    routing::{get, patch, post},
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use keel_core::health::healthz;
use keel_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::handlers::{
    account::update_account,
    health::readyz,
    user::{
        create_user, delete_user, get_user, get_user_profile, get_user_resources, list_users,
        update_user, verify_email,
    },
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Users
        .route("/users", post(create_user).get(list_users))
        .route("/users/verify-email", post(verify_email))
        .route("/users/resources", get(get_user_resources))
        .route(
            "/users/{id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route("/users/{id}/profile", get(get_user_profile))
        // Accounts
        .route(
            "/accounts/{provider}/{provider_account_id}",
            patch(update_account),
        )
        .layer(
            ServiceBuilder::new()
                .layer(request_id_layer())
                .layer(TraceLayer::new_for_http())
                .layer(propagate_request_id_layer()),
        )
        .with_state(state)
}
