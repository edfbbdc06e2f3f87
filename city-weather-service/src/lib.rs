pub mod api_client;
pub mod cache;
pub mod config;
pub mod handlers;
pub mod openapi;
pub mod store;
pub mod updater;

use axum::{
    Router,
    routing::{delete, get},
};
use common::errors::AppError;
use common::http_client::HttpClient;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api_client::OpenMeteoClient;
use crate::cache::WeatherCache;
use crate::config::Config;
use crate::handlers::AppState;
use crate::store::CityStore;
use crate::updater::WeatherUpdater;

/// Wire the store, cache, fetcher and updater together from configuration
pub async fn build_state(
    config: &Config,
    cancellation_token: CancellationToken,
) -> Result<AppState, AppError> {
    let store = Arc::new(CityStore::open(config.cities_file.clone()).await);
    let cache = Arc::new(WeatherCache::with_ttl(config.cache_capacity, config.cache_ttl));
    let http_client = HttpClient::new(config.upstream_timeout, config.upstream_max_retries)?;
    let weather_client = Arc::new(OpenMeteoClient::new(
        http_client,
        cache,
        config.open_meteo_url.clone(),
    ));
    let updater = Arc::new(WeatherUpdater::new(
        store.clone(),
        weather_client,
        config.update_concurrency,
        cancellation_token,
    ));

    Ok(AppState { store, updater })
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route(
            "/cities",
            get(handlers::list_cities).post(handlers::add_city),
        )
        .route("/cities/{country}", delete(handlers::delete_city))
        .route("/update", get(handlers::update_weather))
        .merge(openapi::swagger_ui())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
