// src/handlers/admin_handler.rs
use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::{
    errors::RadarResult,
    models::{
        driver::DriverResponse,
        messages::{ApprovalResponse, MessageResponse, RejectionResponse},
    },
    services::{driver_service::DriverOperations, store_service::DriverFilter},
    state::AppState,
};

pub async fn list_drivers(State(state): State<Arc<AppState>>) -> RadarResult<Json<Vec<DriverResponse>>> {
    Ok(Json(state.driver_service.list_drivers(DriverFilter::all()).await?))
}

pub async fn list_pending(State(state): State<Arc<AppState>>) -> RadarResult<Json<Vec<DriverResponse>>> {
    Ok(Json(state.driver_service.list_drivers(DriverFilter::pending()).await?))
}

pub async fn list_active(State(state): State<Arc<AppState>>) -> RadarResult<Json<Vec<DriverResponse>>> {
    Ok(Json(state.driver_service.list_drivers(DriverFilter::active()).await?))
}

pub async fn approve_driver(
    State(state): State<Arc<AppState>>,
    Path(driver_id): Path<String>,
) -> RadarResult<Json<ApprovalResponse>> {
    let driver = state.driver_service.approve_driver(&driver_id).await?;
    Ok(Json(ApprovalResponse {
        message: "Driver approved successfully".to_string(),
        driver,
    }))
}

pub async fn reject_driver(
    State(state): State<Arc<AppState>>,
    Path(driver_id): Path<String>,
) -> RadarResult<Json<RejectionResponse>> {
    state.driver_service.reject_driver(&driver_id).await?;
    Ok(Json(RejectionResponse {
        message: "Driver rejected and deleted".to_string(),
        success: true,
    }))
}

pub async fn delete_driver(
    State(state): State<Arc<AppState>>,
    Path(driver_id): Path<String>,
) -> RadarResult<Json<MessageResponse>> {
    state.driver_service.delete_driver(&driver_id).await?;
    Ok(Json(MessageResponse::new("Driver deleted successfully")))
}
