// src/services/driver_service.rs
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing;

use crate::{
    errors::{RadarError as AppError, RadarResult},
    models::driver::{
        Driver, DriverActivityUpdate, DriverLocationUpdate, DriverLogin, DriverProfile,
        DriverRegistration, DriverResponse, DriverSummary, Location, ProfileUpdate,
    },
    services::credential_service::CredentialService,
    services::store_service::{DriverFilter, DriverStore, StoreError},
    utils::id_generator::IdGenerator,
};

/// Driver lifecycle: registration, login, activity, location, admin decisions.
#[async_trait]
pub trait DriverOperations: Send + Sync {
    async fn register_driver(&self, registration: DriverRegistration) -> RadarResult<String>;
    async fn login_driver(&self, login: DriverLogin) -> RadarResult<DriverSummary>;
    async fn update_driver_location(&self, update: DriverLocationUpdate) -> RadarResult<()>;
    async fn set_driver_activity(&self, update: DriverActivityUpdate) -> RadarResult<bool>;
    async fn get_driver(&self, driver_id: &str) -> RadarResult<DriverProfile>;
    async fn update_driver_profile(&self, driver_id: &str, update: ProfileUpdate) -> RadarResult<DriverSummary>;
    async fn list_drivers(&self, filter: DriverFilter) -> RadarResult<Vec<DriverResponse>>;
    async fn approve_driver(&self, driver_id: &str) -> RadarResult<DriverResponse>;
    async fn reject_driver(&self, driver_id: &str) -> RadarResult<()>;
    async fn delete_driver(&self, driver_id: &str) -> RadarResult<()>;
}

/// Attempts at a fresh id before a registration gives up.
const ID_ATTEMPTS: usize = 3;

type IdSource = Box<dyn Fn() -> String + Send + Sync>;

pub struct DriverService {
    store: Arc<dyn DriverStore>,
    credentials: Arc<CredentialService>,
    next_id: IdSource,
}

impl DriverService {
    pub fn new(store: Arc<dyn DriverStore>, credentials: Arc<CredentialService>) -> Self {
        Self::with_id_source(store, credentials, IdGenerator::generate)
    }

    pub fn with_id_source<F>(store: Arc<dyn DriverStore>, credentials: Arc<CredentialService>, next_id: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self {
            store,
            credentials,
            next_id: Box::new(next_id),
        }
    }

    async fn load(&self, driver_id: &str) -> RadarResult<Driver> {
        if !IdGenerator::validate_id(driver_id) {
            tracing::warn!("Invalid driver ID format: {}", driver_id);
            return Err(AppError::driver_not_found(driver_id));
        }
        self.store
            .find_by_id(driver_id)
            .await?
            .ok_or_else(|| AppError::driver_not_found(driver_id))
    }

    /// Existence check shared by reject and delete; both remove the record outright.
    async fn remove(&self, driver_id: &str) -> RadarResult<Driver> {
        let driver = self.load(driver_id).await?;
        if !self.store.delete(driver_id).await? {
            return Err(AppError::driver_not_found(driver_id));
        }
        Ok(driver)
    }
}

#[async_trait]
impl DriverOperations for DriverService {
    async fn register_driver(&self, registration: DriverRegistration) -> RadarResult<String> {
        tracing::info!("Registering driver with mobile number: {}", registration.mobile_number);

        // Either number already on file rejects the whole registration.
        let mobile_taken = self.store.find_by_mobile_number(&registration.mobile_number).await?;
        let vehicle_taken = self.store.find_by_vehicle_number(&registration.vehicle_number).await?;
        if mobile_taken.is_some() || vehicle_taken.is_some() {
            tracing::warn!("Duplicate registration for {}", registration.mobile_number);
            return Err(AppError::DuplicateDriver);
        }

        let credential_hash = self.credentials.hash(&registration.password).await?;
        let mut driver = Driver::new((self.next_id)(), registration, credential_hash, Utc::now());

        for attempt in 1..=ID_ATTEMPTS {
            match self.store.insert(&driver).await {
                Ok(()) => {
                    tracing::info!("Driver registered successfully: {}", driver.id);
                    return Ok(driver.id);
                }
                Err(StoreError::IdTaken(id)) if attempt < ID_ATTEMPTS => {
                    tracing::warn!("Generated driver id {} already taken, retrying", id);
                    driver.id = (self.next_id)();
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(AppError::internal_error("Could not allocate a driver id"))
    }

    async fn login_driver(&self, login: DriverLogin) -> RadarResult<DriverSummary> {
        tracing::info!("Driver login attempt");

        let mut driver = self
            .store
            .find_by_mobile_number(&login.mobile_number)
            .await?
            .ok_or_else(|| AppError::driver_not_found(login.mobile_number.as_str()))?;

        // Credential first, then status.
        if !self.credentials.verify(&login.password, &driver.credential_hash).await? {
            tracing::warn!("Invalid credentials for driver: {}", driver.id);
            return Err(AppError::InvalidCredentials);
        }

        if !driver.status.can_login() {
            tracing::warn!("Login refused for driver {} with status {}", driver.id, driver.status);
            return Err(AppError::PendingApproval(driver.status));
        }

        driver.record_login(Utc::now());
        self.store.update(&driver).await?;

        tracing::info!("Driver logged in successfully: {}", driver.id);
        Ok(driver.into())
    }

    async fn update_driver_location(&self, update: DriverLocationUpdate) -> RadarResult<()> {
        tracing::debug!("Updating driver location: {}", update.driver_id);

        let location = Location::new(update.longitude, update.latitude, Utc::now())?;
        let mut driver = self.load(&update.driver_id).await?;

        // Accepted regardless of approval or activity.
        driver.set_location(location);
        self.store.update(&driver).await?;
        Ok(())
    }

    async fn set_driver_activity(&self, update: DriverActivityUpdate) -> RadarResult<bool> {
        tracing::info!("Setting driver {} active={}", update.driver_id, update.is_active);

        let mut driver = self.load(&update.driver_id).await?;
        driver.set_active(update.is_active);
        self.store.update(&driver).await?;
        Ok(driver.is_active)
    }

    async fn get_driver(&self, driver_id: &str) -> RadarResult<DriverProfile> {
        tracing::debug!("Getting driver: {}", driver_id);
        Ok(self.load(driver_id).await?.into())
    }

    async fn update_driver_profile(&self, driver_id: &str, update: ProfileUpdate) -> RadarResult<DriverSummary> {
        tracing::info!("Updating driver profile: {}", driver_id);

        let mut driver = self.load(driver_id).await?;

        if let Some(vehicle_number) = update.vehicle_number.as_deref() {
            if vehicle_number != driver.vehicle_number {
                let holder = self.store.find_by_vehicle_number(vehicle_number).await?;
                if holder.is_some_and(|other| other.id != driver.id) {
                    return Err(AppError::conflict("Vehicle number already in use"));
                }
            }
        }

        driver.apply_profile_update(update);
        self.store.update(&driver).await.map_err(|e| match AppError::from(e) {
            AppError::DuplicateDriver => AppError::conflict("Vehicle number already in use"),
            other => other,
        })?;

        tracing::debug!("Driver profile updated successfully: {}", driver_id);
        Ok(driver.into())
    }

    async fn list_drivers(&self, filter: DriverFilter) -> RadarResult<Vec<DriverResponse>> {
        tracing::debug!("Listing drivers with filter: {:?}", filter);
        let drivers = self.store.find(filter).await?;
        Ok(drivers.into_iter().map(DriverResponse::from).collect())
    }

    async fn approve_driver(&self, driver_id: &str) -> RadarResult<DriverResponse> {
        let mut driver = self.load(driver_id).await?;

        if driver.approve() {
            self.store.update(&driver).await?;
            tracing::info!("Driver approved: {}", driver_id);
        } else {
            tracing::debug!("Driver already approved: {}", driver_id);
        }
        Ok(driver.into())
    }

    async fn reject_driver(&self, driver_id: &str) -> RadarResult<()> {
        let driver = self.remove(driver_id).await?;
        tracing::info!(
            driver_id = %driver.id,
            mobile_number = %driver.mobile_number,
            vehicle_number = %driver.vehicle_number,
            status = %driver.status,
            "Driver rejected and deleted"
        );
        Ok(())
    }

    async fn delete_driver(&self, driver_id: &str) -> RadarResult<()> {
        let driver = self.remove(driver_id).await?;
        tracing::info!(driver_id = %driver.id, "Driver deleted");
        Ok(())
    }
}
