// Admin back-office JSON surface, session-authenticated

pub mod access_keys;
pub mod ads;
pub mod auth;
pub mod content;
pub mod maintenance;
pub mod packages;
pub mod vendors;
pub mod withdrawals;

use axum::Router;

use crate::api::middleware::session::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(ads::router())
        .merge(packages::router())
        .merge(access_keys::router())
        .merge(vendors::router())
        .merge(withdrawals::router())
        .merge(content::router())
        .merge(maintenance::router())
}
