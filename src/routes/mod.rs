//! This module defines the REST API's routes and their handlers.

use axum::{
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{auth::auth_guard, AppState};

mod advisor;
mod auth;
pub mod endpoints;
mod notifications;
mod profile;
mod reports;
mod summary;
mod transactions;
mod wallet;

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::HEALTH, get(get_health))
        .route(endpoints::REGISTER, post(auth::register))
        .route(endpoints::LOG_IN, post(auth::log_in))
        .route(endpoints::PROFILES, post(profile::create_profile))
        .route(endpoints::PROFILE, get(profile::get_profile))
        .route(endpoints::MONTHLY_REPORT, get(reports::get_monthly_report));

    let protected_routes = Router::new()
        .route(
            endpoints::ME,
            get(auth::get_me).put(auth::update_me).delete(auth::delete_me),
        )
        .route(
            endpoints::TRANSACTIONS,
            get(transactions::get_transactions).post(transactions::create_transaction),
        )
        .route(
            endpoints::TRANSACTION,
            put(transactions::update_transaction).delete(transactions::delete_transaction),
        )
        .route(endpoints::CATEGORIES, get(transactions::get_categories))
        .route(endpoints::SUMMARY, get(summary::get_summary))
        .route(
            endpoints::NOTIFICATIONS,
            get(notifications::get_notifications),
        )
        .route(
            endpoints::NOTIFICATION_READ,
            put(notifications::mark_as_read),
        )
        .route(
            endpoints::NOTIFICATIONS_READ_ALL,
            put(notifications::mark_all_as_read),
        )
        .route(endpoints::TELEBIRR_PAY, post(wallet::initiate_payment))
        .route(
            endpoints::TELEBIRR_AI_PAY,
            post(wallet::pay_for_premium_insights),
        )
        .route(endpoints::AI_TIPS, post(advisor::get_tips))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .layer(TraceLayer::new_for_http())
        // The API serves a browser SPA from another origin.
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// The health probe handler.
async fn get_health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Santim Sentry API is running",
    }))
}
