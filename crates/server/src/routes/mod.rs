//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                  - Liveness check
//! GET  /health/ready            - Readiness check (database ping)
//!
//! # Auth
//! POST /signup                  - Register and start a session
//! POST /signin                  - Authenticate and start a session
//! POST /signout                 - Clear the session cookie
//! POST /request-reset           - Mail a password reset link
//! POST /reset-password          - Redeem a reset token, start a session
//!
//! # Account
//! GET  /me                      - Current user, or null when anonymous
//! POST /users/{id}/permissions  - Replace a user's permission set
//!
//! # Items
//! GET  /items                   - Paged item listing (?skip=&first=)
//! GET  /items/count             - Total item count
//! GET  /items/{id}              - Item detail
//! POST /items                   - Create an item
//! PATCH  /items/{id}            - Partial update
//! DELETE /items/{id}            - Delete an item
//!
//! # Cart (requires auth)
//! GET    /cart                  - The caller's cart
//! POST   /cart                  - Add one unit of an item
//! DELETE /cart/{id}             - Remove a cart row
//!
//! # Orders (requires auth)
//! POST /orders                  - Charge the cart and place an order
//! GET  /orders                  - The caller's order history
//! GET  /orders/{id}             - Order detail (owner or admin)
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod items;
pub mod orders;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/signin", post(auth::signin))
        .route("/signout", post(auth::signout))
        .route("/request-reset", post(auth::request_reset))
        .route("/reset-password", post(auth::reset_password))
}

/// Create the item routes router.
pub fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(items::index).post(items::create))
        .route("/count", get(items::count))
        .route(
            "/{id}",
            get(items::show).patch(items::update).delete(items::remove),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).post(cart::add))
        .route("/{id}", delete(cart::remove))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(orders::create).get(orders::index))
        .route("/{id}", get(orders::show))
}

/// Create all routes for the server.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth_routes())
        .route("/me", get(account::me))
        .route("/users/{id}/permissions", post(account::update_permissions))
        .nest("/items", item_routes())
        .nest("/cart", cart_routes())
        .nest("/orders", order_routes())
}
