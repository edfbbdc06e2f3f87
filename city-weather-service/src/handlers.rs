use axum::{
    extract::{Path, State, rejection::JsonRejection},
    response::{Html, Json},
};
use common::errors::AppError;
use common::models::{City, MessageResponse};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::info;

use crate::store::CityStore;
use crate::updater::WeatherUpdater;

const INDEX_HTML: &str = include_str!("../templates/index.html");

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<CityStore>,
    pub updater: Arc<WeatherUpdater>,
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Dashboard page")
    )
)]
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service health check")
    )
)]
pub async fn health() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok", "service": "city-weather-service" }))
}

#[utoipa::path(
    get,
    path = "/cities",
    responses(
        (status = 200, description = "All stored cities in insertion order", body = [City])
    ),
    tag = "cities"
)]
pub async fn list_cities(State(state): State<AppState>) -> Json<Vec<City>> {
    Json(state.store.list().await)
}

#[utoipa::path(
    post,
    path = "/cities",
    request_body = City,
    responses(
        (status = 200, description = "City stored", body = MessageResponse),
        (status = 400, description = "Malformed or invalid city payload"),
        (status = 500, description = "City file could not be written")
    ),
    tag = "cities"
)]
pub async fn add_city(
    State(state): State<AppState>,
    payload: Result<Json<City>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(city) = payload.map_err(|rejection| AppError::validation(rejection.body_text()))?;
    city.validate().map_err(AppError::validation)?;

    info!(country = %city.country, capital = %city.capital, "Add city request received");
    state.store.add(city).await?;

    Ok(Json(MessageResponse::new("City added successfully!")))
}

#[utoipa::path(
    delete,
    path = "/cities/{country}",
    params(
        ("country" = String, Path, description = "Country name, matched case-insensitively")
    ),
    responses(
        (status = 200, description = "Every city of the country removed", body = MessageResponse),
        (status = 404, description = "No city stored for the country")
    ),
    tag = "cities"
)]
pub async fn delete_city(
    State(state): State<AppState>,
    Path(country): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    info!(country = %country, "Delete city request received");

    state.store.delete(&country).await?;

    Ok(Json(MessageResponse::new(format!(
        "City from {} deleted successfully!",
        country
    ))))
}

#[utoipa::path(
    get,
    path = "/update",
    responses(
        (status = 200, description = "Country to temperature (Celsius, 2 dp) or a per-city status string")
    ),
    tag = "weather"
)]
pub async fn update_weather(State(state): State<AppState>) -> Json<Map<String, Value>> {
    info!("Weather update request received");

    Json(state.updater.update_all().await)
}
