//! abase-api library - application API
//!
//! Discovery proxy, artist tipping, the owned catalog (uploads, albums,
//! events, merch, NFT collections and tokens) and social features.

use abase_common::api::{require_signature, SigningSecret};
use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;
pub mod pagination;
pub mod services;

use services::{DiscoveryClient, TipService};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub signing: SigningSecret,
    pub discovery: Arc<DiscoveryClient>,
    pub tips: Arc<TipService>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        signing: SigningSecret,
        discovery: Arc<DiscoveryClient>,
        tips: Arc<TipService>,
    ) -> Self {
        Self {
            db,
            signing,
            discovery,
            tips,
        }
    }
}

/// Build application router
///
/// Every mutating route is signed; reads are public. CORS is open to every
/// origin.
pub fn build_router(state: AppState) -> Router {
    use api::{catalog, discovery, social, tips};
    use axum::middleware;
    use axum::routing::{delete, get, post, put};

    let protected = Router::new()
        // Tips
        .route("/api/tips", post(tips::create_tip))
        .route("/api/tips/:id/confirm", post(tips::confirm_tip))
        .route("/api/tips/:id/fail", post(tips::fail_tip))
        // Catalog
        .route("/api/catalog/:kind", post(catalog::create_record))
        .route(
            "/api/catalog/:kind/:id",
            put(catalog::update_record).delete(catalog::delete_record),
        )
        .route("/api/catalog/:kind/:id/publish", post(catalog::publish_record))
        // Social
        .route(
            "/api/artists/:id/follow",
            post(social::follow_artist).delete(social::unfollow_artist),
        )
        .route("/api/tracks/:id/comments", post(social::add_comment))
        .route("/api/comments/:id", delete(social::delete_comment))
        .route("/api/tracks/:id/rating", put(social::rate_track))
        .route("/api/playlists", post(social::create_playlist))
        .route("/api/playlists/:id/tracks", post(social::add_playlist_track))
        .route(
            "/api/playlists/:id/tracks/:track_id",
            delete(social::remove_playlist_track),
        )
        .layer(middleware::from_fn_with_state(
            state.signing.clone(),
            require_signature,
        ));

    let public = Router::new()
        // Discovery proxy
        .route("/api/tracks/trending", get(discovery::trending_tracks))
        .route("/api/tracks/search", get(discovery::search_tracks))
        .route("/api/tracks/:id", get(discovery::get_track))
        .route("/api/tracks/:id/stream", get(discovery::stream_track))
        .route("/api/users/:id", get(discovery::get_user))
        .route("/api/users/:id/tracks", get(discovery::user_tracks))
        // Tips
        .route("/api/tips/sent", get(tips::sent_tips))
        .route("/api/artists/:id/tips", get(tips::artist_tips))
        .route("/api/artists/:id/earnings", get(tips::artist_earnings))
        // Catalog
        .route("/api/catalog/:kind", get(catalog::list_live))
        .route("/api/catalog/:kind/mine", get(catalog::list_mine))
        .route("/api/catalog/:kind/:id", get(catalog::get_record))
        // Social
        .route("/api/artists/:id/followers", get(social::list_followers))
        .route("/api/tracks/:id/comments", get(social::list_comments))
        .route("/api/tracks/:id/rating", get(social::get_rating))
        .route("/api/playlists/mine", get(social::my_playlists))
        .route("/api/playlists/:id", get(social::get_playlist))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
