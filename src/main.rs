use std::sync::Arc;

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use shuttle_secrets::SecretStore;
use tower_http::cors::CorsLayer;

mod auth;
mod config;
mod controllers;
mod error;
mod extract;
pub mod models;
mod repositories;
mod routes;
mod services;
mod state;
mod utils;

use crate::auth::token::TokenIssuer;
use crate::config::AppConfig;
use crate::repositories::mongo::MongoStore;
use crate::state::AppState;

#[shuttle_runtime::main]
async fn main(#[shuttle_secrets::Secrets] secret_store: SecretStore) -> shuttle_axum::ShuttleAxum {
    // Secrets come from `Secrets.toml` locally and from the Shuttle console when deployed.
    let config = AppConfig::from_lookup(|key| secret_store.get(key))?;

    let store = MongoStore::connect(&config.mongodb_uri, &config.database_name).await?;
    store.ensure_indexes().await?;

    let tokens = TokenIssuer::new(&config.jwt_secret, config.jwt_ttl_secs);
    let state = AppState::new(Arc::new(store), tokens);

    let origin = config
        .app_url
        .parse::<HeaderValue>()
        .with_context(|| format!("APP_URL is not a valid origin: {}", config.app_url))?;

    let app = routes::app(state).layer(
        CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_origin(origin)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
    );

    tracing::info!(database = %config.database_name, "cinema booking api ready");

    Ok(app.into())
}
