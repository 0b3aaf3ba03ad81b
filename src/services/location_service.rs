// src/services/location_service.rs
use std::sync::Arc;
use tracing;

use crate::{
    errors::RadarResult,
    models::location::PublicLocation,
    services::store_service::{DriverFilter, DriverStore},
};

/// Builds the public map feed from the driver store.
pub struct LocationService {
    store: Arc<dyn DriverStore>,
}

impl LocationService {
    pub fn new(store: Arc<dyn DriverStore>) -> Self {
        Self { store }
    }

    /// Snapshot of every approved, active driver with a known position.
    pub async fn list_visible(&self) -> RadarResult<Vec<PublicLocation>> {
        let drivers = self.store.find(DriverFilter::visible()).await?;
        let locations: Vec<PublicLocation> = drivers
            .into_iter()
            .filter(|d| d.is_visible())
            .filter_map(PublicLocation::from_driver)
            .collect();

        tracing::debug!("Publishing {} driver locations", locations.len());
        Ok(locations)
    }
}
