//! HTTP surface of the messaging backend.

pub mod auth;
pub mod conversations;
pub mod error;
pub mod middleware;
pub mod state;

use axum::{
    Router, middleware as axum_mw,
    routing::{get, post},
};

pub use error::ApiError;
pub use state::{AppState, AppStateInner};

/// Conversation routes for one participant kind. The caller comes from the
/// scope's middleware, never from the request body.
fn conversation_routes() -> Router<AppState> {
    Router::new()
        .route("/conversations", get(conversations::list))
        .route("/conversations/{kind}/{id}", get(conversations::open))
        .route("/conversations/{kind}/{id}/messages", post(conversations::send))
        .route("/conversations/{kind}/{id}/read", post(conversations::mark_read))
        .route("/conversations/{kind}/{id}/unread", get(conversations::unread))
}

/// Auth and conversation routes, with state applied.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/artist/register", post(auth::register_artist))
        .route("/auth/artist/login", post(auth::login_artist));

    let user_routes = conversation_routes().layer(axum_mw::from_fn_with_state(
        state.clone(),
        middleware::require_user,
    ));

    let artist_routes = conversation_routes().layer(axum_mw::from_fn_with_state(
        state.clone(),
        middleware::require_artist,
    ));

    Router::new()
        .merge(public_routes)
        .nest("/user", user_routes)
        .nest("/artist", artist_routes)
        .with_state(state)
}
