// src/models/messages.rs
use serde::{Deserialize, Serialize};

use super::driver::{DriverResponse, DriverSummary};

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub message: String,
    pub driver_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DriverSummaryResponse {
    pub message: String,
    pub driver: DriverSummary,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResponse {
    pub message: String,
    pub is_active: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApprovalResponse {
    pub message: String,
    pub driver: DriverResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RejectionResponse {
    pub message: String,
    pub success: bool,
}
