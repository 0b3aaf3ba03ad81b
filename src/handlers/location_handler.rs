// src/handlers/location_handler.rs
use axum::{extract::State, Json};
use std::sync::Arc;

use crate::{errors::RadarResult, models::location::PublicLocation, state::AppState};

pub async fn list_locations(State(state): State<Arc<AppState>>) -> RadarResult<Json<Vec<PublicLocation>>> {
    let locations = state.location_service.list_visible().await?;
    Ok(Json(locations))
}
