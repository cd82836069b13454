//! HTTP route handlers for the storefront.
//!
//! Every handler answers JSON; errors are `{"error": "<message>"}`.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Home feed (featured + newest, with artists)
//! GET  /health                    - Liveness
//! GET  /health/ready              - Readiness (platform reachable)
//!
//! # Catalog
//! GET  /products/{id}             - Product detail
//! POST /products/{id}/edit        - Edit own product, multipart (artist)
//! GET  /colonies                  - Colony listing
//! GET  /colonies/{slug}           - Colony detail with products
//! GET  /artists/{username}        - Artist page
//!
//! # Cart (session-backed)
//! GET  /cart                      - Cart lines, count and total
//! POST /cart/add                  - Add a product snapshot
//! POST /cart/update               - Set quantity (0 removes)
//! POST /cart/remove               - Remove a product
//! POST /cart/clear                - Empty the cart
//! GET  /cart/count                - Badge count
//!
//! # Auth
//! POST /auth/signup               - Create account
//! POST /auth/login                - Sign in
//! POST /auth/logout               - Sign out
//!
//! # Profile (requires auth)
//! GET  /profile                   - Own profile
//! POST /profile                   - Update username/bio
//! POST /profile/avatar            - Upload avatar (multipart)
//! POST /profile/artist-request    - Request the artist role
//!
//! # Artist (requires artist role)
//! GET  /artist/products           - Own products, any status
//! POST /artist/products           - Submit product (multipart)
//!
//! # Admin (requires admin role)
//! GET  /admin/users               - Users (?role=&q=)
//! POST /admin/users/{id}/role     - Change role
//! GET  /admin/products            - Products (?status=&q=)
//! POST /admin/products/{id}/status - Approve/reject
//! POST /admin/products/{id}/delete - Delete
//! ```

pub mod admin;
pub mod artist;
pub mod artists;
pub mod auth;
pub mod cart;
pub mod colonies;
pub mod home;
pub mod products;
pub mod profile;
pub mod upload;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::state::AppState;

/// Request body limit for routes that accept an image, with room for the
/// other multipart fields.
const UPLOAD_BODY_LIMIT: usize = upload::MAX_IMAGE_BYTES + 64 * 1024;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(products::show))
        .route(
            "/{id}/edit",
            post(products::edit).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
}

/// Create the colony routes router.
pub fn colony_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(colonies::index))
        .route("/{slug}", get(colonies::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the profile routes router.
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(profile::show).post(profile::update))
        .route(
            "/avatar",
            post(profile::upload_avatar).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/artist-request", post(profile::request_artist))
}

/// Create the artist routes router.
pub fn artist_routes() -> Router<AppState> {
    Router::new().route(
        "/products",
        get(artist::my_products)
            .post(artist::submit_product)
            .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
    )
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(admin::users))
        .route("/users/{id}/role", post(admin::set_role))
        .route("/products", get(admin::products))
        .route("/products/{id}/status", post(admin::set_status))
        .route("/products/{id}/delete", post(admin::delete_product))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/products", product_routes())
        .nest("/colonies", colony_routes())
        .route("/artists/{username}", get(artists::show))
        .nest("/cart", cart_routes())
        .nest("/auth", auth_routes())
        .nest("/profile", profile_routes())
        .nest("/artist", artist_routes())
        .nest("/admin", admin_routes())
}
