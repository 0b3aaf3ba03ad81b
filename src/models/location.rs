// src/models/location.rs
use serde::{Deserialize, Serialize};

use super::driver::{Driver, VehicleType};

/// A map marker for one visible driver.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicLocation {
    pub id: String,
    pub name: String,
    pub vehicle_number: String,
    pub vehicle_type: VehicleType,
    pub longitude: f64,
    pub latitude: f64,
}

impl PublicLocation {
    /// `None` when the driver has no position to show.
    pub fn from_driver(driver: Driver) -> Option<Self> {
        let location = driver.location?;
        Some(Self {
            id: driver.id,
            name: driver.name,
            vehicle_number: driver.vehicle_number,
            vehicle_type: driver.vehicle_type,
            longitude: location.longitude,
            latitude: location.latitude,
        })
    }
}
