// src/handlers/driver_handler.rs
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::ValidJson;
use crate::{
    errors::RadarResult,
    models::{
        driver::{
            DriverProfile, LocationUpdateRequest, LoginRequest, ProfileUpdateRequest, RegisterRequest,
            StatusUpdateRequest,
        },
        messages::{ActivityResponse, DriverSummaryResponse, MessageResponse, RegisterResponse},
    },
    services::driver_service::DriverOperations,
    state::AppState,
};

pub async fn register_driver(
    State(state): State<Arc<AppState>>,
    ValidJson(request): ValidJson<RegisterRequest>,
) -> RadarResult<(StatusCode, Json<RegisterResponse>)> {
    let registration = request.validate()?;
    let driver_id = state.driver_service.register_driver(registration).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Driver registered successfully! Waiting for admin approval".to_string(),
            driver_id,
        }),
    ))
}

pub async fn login_driver(
    State(state): State<Arc<AppState>>,
    ValidJson(request): ValidJson<LoginRequest>,
) -> RadarResult<Json<DriverSummaryResponse>> {
    let login = request.validate()?;
    let driver = state.driver_service.login_driver(login).await?;

    Ok(Json(DriverSummaryResponse {
        message: "Login successful".to_string(),
        driver,
    }))
}

pub async fn update_location(
    State(state): State<Arc<AppState>>,
    ValidJson(request): ValidJson<LocationUpdateRequest>,
) -> RadarResult<Json<MessageResponse>> {
    let update = request.validate()?;
    state.driver_service.update_driver_location(update).await?;

    Ok(Json(MessageResponse::new("Location updated successfully")))
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    ValidJson(request): ValidJson<StatusUpdateRequest>,
) -> RadarResult<Json<ActivityResponse>> {
    let update = request.validate()?;
    let is_active = state.driver_service.set_driver_activity(update).await?;

    let label = if is_active { "active" } else { "inactive" };
    Ok(Json(ActivityResponse {
        message: format!("Driver status set to {}", label),
        is_active,
    }))
}

pub async fn get_driver(
    State(state): State<Arc<AppState>>,
    Path(driver_id): Path<String>,
) -> RadarResult<Json<DriverProfile>> {
    let profile = state.driver_service.get_driver(&driver_id).await?;
    Ok(Json(profile))
}

pub async fn update_driver(
    State(state): State<Arc<AppState>>,
    Path(driver_id): Path<String>,
    ValidJson(request): ValidJson<ProfileUpdateRequest>,
) -> RadarResult<Json<DriverSummaryResponse>> {
    let update = request.validate()?;
    let driver = state.driver_service.update_driver_profile(&driver_id, update).await?;

    Ok(Json(DriverSummaryResponse {
        message: "Profile updated successfully".to_string(),
        driver,
    }))
}
