//! HTTP layer for myblog.
//!
//! - **Endpoints**: posts, comments, profiles, follow, chat, notifications, accounts
//! - **Extractors**: session user, required or optional
//! - **Middleware**: session authentication
//!
//! Built on Axum 0.8. Successful form posts answer with `303 See Other`;
//! read views return `{ "data": ... }` JSON.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;

use axum::{Router, middleware::from_fn_with_state};

/// Router with session authentication applied, ready to serve.
pub fn app(state: middleware::AppState) -> Router {
    router()
        .layer(from_fn_with_state(state.clone(), middleware::auth_middleware))
        .with_state(state)
}
