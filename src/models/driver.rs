// src/models/driver.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{RadarError, RadarResult, ValidationError};
use crate::services::credential_service::CredentialHash;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DriverStatus {
    #[default]
    Pending,   // Registered, waiting for an admin decision
    Approved,  // Allowed to log in and appear on the map
}

impl DriverStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverStatus::Pending => "pending",
            DriverStatus::Approved => "approved",
        }
    }

    pub fn can_login(&self) -> bool {
        !matches!(self, DriverStatus::Pending)
    }
}

impl fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    Auto,   // Auto-rickshaw
    Toto,   // Battery e-rickshaw
    #[default]
    Car,
    Bus,
}

impl VehicleType {
    pub const ALL: [VehicleType; 4] = [
        VehicleType::Auto,
        VehicleType::Toto,
        VehicleType::Car,
        VehicleType::Bus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Auto => "auto",
            VehicleType::Toto => "toto",
            VehicleType::Car => "car",
            VehicleType::Bus => "bus",
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleType {
    type Err = RadarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VehicleType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| RadarError::InvalidFieldValue {
                field: "vehicleType".to_string(),
                value: s.to_string(),
                reason: "must be one of auto, toto, car, bus".to_string(),
            })
    }
}

/// Last reported position of a driver.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub longitude: f64,
    pub latitude: f64,
    pub updated_at: DateTime<Utc>,
}

impl Location {
    /// Builds a location, rejecting coordinates outside the WGS84 ranges.
    pub fn new(longitude: f64, latitude: f64, updated_at: DateTime<Utc>) -> RadarResult<Self> {
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(RadarError::InvalidFieldValue {
                field: "longitude".to_string(),
                value: longitude.to_string(),
                reason: "must be between -180 and 180".to_string(),
            });
        }
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(RadarError::InvalidFieldValue {
                field: "latitude".to_string(),
                value: latitude.to_string(),
                reason: "must be between -90 and 90".to_string(),
            });
        }
        Ok(Self { longitude, latitude, updated_at })
    }
}

/// A driver record as persisted in the store.
///
/// Lifecycle mutations go through the methods below so the activity/location
/// coupling holds after every write.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub id: String,
    pub name: String,
    pub mobile_number: String,
    pub vehicle_number: String,
    pub vehicle_type: VehicleType,
    pub credential_hash: CredentialHash,
    pub status: DriverStatus,
    pub is_active: bool,
    pub location: Option<Location>,
    pub registered_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl Driver {
    /// A freshly registered driver: pending, inactive, no location.
    pub fn new(
        id: String,
        registration: DriverRegistration,
        credential_hash: CredentialHash,
        registered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: registration.name,
            mobile_number: registration.mobile_number,
            vehicle_number: registration.vehicle_number,
            vehicle_type: registration.vehicle_type,
            credential_hash,
            status: DriverStatus::Pending,
            is_active: false,
            location: None,
            registered_at,
            last_login: None,
        }
    }

    /// Returns false when the driver was already approved.
    pub fn approve(&mut self) -> bool {
        let changed = self.status == DriverStatus::Pending;
        self.status = DriverStatus::Approved;
        changed
    }

    /// Going inactive always drops the last known location.
    pub fn set_active(&mut self, is_active: bool) {
        self.is_active = is_active;
        if !is_active {
            self.location = None;
        }
    }

    pub fn set_location(&mut self, location: Location) {
        self.location = Some(location);
    }

    pub fn record_login(&mut self, at: DateTime<Utc>) {
        self.last_login = Some(at);
    }

    pub fn apply_profile_update(&mut self, update: ProfileUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(vehicle_number) = update.vehicle_number {
            self.vehicle_number = vehicle_number;
        }
        if let Some(vehicle_type) = update.vehicle_type {
            self.vehicle_type = vehicle_type;
        }
    }

    /// Whether this driver belongs on the public map.
    pub fn is_visible(&self) -> bool {
        self.is_active && self.location.is_some() && self.status == DriverStatus::Approved
    }
}

// ------------------------------
// Inbound payloads
// ------------------------------

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub mobile_number: Option<String>,
    pub vehicle_number: Option<String>,
    pub vehicle_type: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DriverRegistration {
    pub name: String,
    pub mobile_number: String,
    pub vehicle_number: String,
    pub vehicle_type: VehicleType,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(self) -> RadarResult<DriverRegistration> {
        let mut errors = Vec::new();
        let name = required("name", self.name, &mut errors);
        let mobile_number = required("mobileNumber", self.mobile_number, &mut errors);
        let vehicle_number = required("vehicleNumber", self.vehicle_number, &mut errors);
        let password = required("password", self.password, &mut errors);
        let vehicle_type = match non_empty(self.vehicle_type) {
            Some(raw) => match raw.parse::<VehicleType>() {
                Ok(t) => t,
                Err(_) => {
                    errors.push(ValidationError {
                        field: "vehicleType".to_string(),
                        message: "must be one of auto, toto, car, bus".to_string(),
                    });
                    VehicleType::default()
                }
            },
            None => VehicleType::default(),
        };

        if !errors.is_empty() {
            return Err(RadarError::ValidationFailed(errors));
        }

        Ok(DriverRegistration {
            name,
            mobile_number,
            vehicle_number,
            vehicle_type,
            password,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub mobile_number: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DriverLogin {
    pub mobile_number: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(self) -> RadarResult<DriverLogin> {
        let mut errors = Vec::new();
        let mobile_number = required("mobileNumber", self.mobile_number, &mut errors);
        let password = required("password", self.password, &mut errors);
        if !errors.is_empty() {
            return Err(RadarError::ValidationFailed(errors));
        }
        Ok(DriverLogin { mobile_number, password })
    }
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LocationUpdateRequest {
    pub driver_id: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct DriverLocationUpdate {
    pub driver_id: String,
    pub longitude: f64,
    pub latitude: f64,
}

impl LocationUpdateRequest {
    pub fn validate(self) -> RadarResult<DriverLocationUpdate> {
        let mut errors = Vec::new();
        let driver_id = required("driverId", self.driver_id, &mut errors);
        if self.longitude.is_none() {
            errors.push(missing("longitude"));
        }
        if self.latitude.is_none() {
            errors.push(missing("latitude"));
        }
        match (self.longitude, self.latitude) {
            (Some(longitude), Some(latitude)) if errors.is_empty() => Ok(DriverLocationUpdate {
                driver_id,
                longitude,
                latitude,
            }),
            _ => Err(RadarError::ValidationFailed(errors)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    pub driver_id: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct DriverActivityUpdate {
    pub driver_id: String,
    pub is_active: bool,
}

impl StatusUpdateRequest {
    pub fn validate(self) -> RadarResult<DriverActivityUpdate> {
        let mut errors = Vec::new();
        let driver_id = required("driverId", self.driver_id, &mut errors);
        match self.is_active {
            Some(is_active) if errors.is_empty() => Ok(DriverActivityUpdate { driver_id, is_active }),
            is_active => {
                if is_active.is_none() {
                    errors.push(missing("isActive"));
                }
                Err(RadarError::ValidationFailed(errors))
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    pub name: Option<String>,
    pub vehicle_number: Option<String>,
    pub vehicle_type: Option<String>,
}

/// Partial profile edit; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub vehicle_number: Option<String>,
    pub vehicle_type: Option<VehicleType>,
}

impl ProfileUpdateRequest {
    pub fn validate(self) -> RadarResult<ProfileUpdate> {
        let vehicle_type = non_empty(self.vehicle_type)
            .map(|raw| raw.parse::<VehicleType>())
            .transpose()?;
        Ok(ProfileUpdate {
            name: non_empty(self.name),
            vehicle_number: non_empty(self.vehicle_number),
            vehicle_type,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn missing(field: &str) -> ValidationError {
    ValidationError {
        field: field.to_string(),
        message: "is required".to_string(),
    }
}

fn required(field: &str, value: Option<String>, errors: &mut Vec<ValidationError>) -> String {
    match non_empty(value) {
        Some(v) => v,
        None => {
            errors.push(missing(field));
            String::new()
        }
    }
}

// ------------------------------
// Outbound projections
// ------------------------------

/// Everything but the credential hash; used by the admin listings.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DriverResponse {
    pub id: String,
    pub name: String,
    pub mobile_number: String,
    pub vehicle_number: String,
    pub vehicle_type: VehicleType,
    pub status: DriverStatus,
    pub is_active: bool,
    pub location: Option<Location>,
    pub registered_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<Driver> for DriverResponse {
    fn from(driver: Driver) -> Self {
        Self {
            id: driver.id,
            name: driver.name,
            mobile_number: driver.mobile_number,
            vehicle_number: driver.vehicle_number,
            vehicle_type: driver.vehicle_type,
            status: driver.status,
            is_active: driver.is_active,
            location: driver.location,
            registered_at: driver.registered_at,
            last_login: driver.last_login,
        }
    }
}

/// Profile view served by `GET /drivers/:id`.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DriverProfile {
    pub id: String,
    pub name: String,
    pub mobile_number: String,
    pub vehicle_number: String,
    pub vehicle_type: VehicleType,
    pub status: DriverStatus,
    pub is_active: bool,
    pub registered_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<Driver> for DriverProfile {
    fn from(driver: Driver) -> Self {
        Self {
            id: driver.id,
            name: driver.name,
            mobile_number: driver.mobile_number,
            vehicle_number: driver.vehicle_number,
            vehicle_type: driver.vehicle_type,
            status: driver.status,
            is_active: driver.is_active,
            registered_at: driver.registered_at,
            last_login: driver.last_login,
        }
    }
}

/// Sanitized projection returned after login and profile edits.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DriverSummary {
    pub id: String,
    pub name: String,
    pub mobile_number: String,
    pub vehicle_number: String,
    pub vehicle_type: VehicleType,
    pub is_active: bool,
    pub status: DriverStatus,
}

impl From<Driver> for DriverSummary {
    fn from(driver: Driver) -> Self {
        Self {
            id: driver.id,
            name: driver.name,
            mobile_number: driver.mobile_number,
            vehicle_number: driver.vehicle_number,
            vehicle_type: driver.vehicle_type,
            is_active: driver.is_active,
            status: driver.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_driver() -> Driver {
        let registration = DriverRegistration {
            name: "Ravi".to_string(),
            mobile_number: "9000000001".to_string(),
            vehicle_number: "WB01AB1234".to_string(),
            vehicle_type: VehicleType::Auto,
            password: "secret".to_string(),
        };
        Driver::new(
            "drv-250101-abc12".to_string(),
            registration,
            CredentialHash::from_stored("$argon2id$stub"),
            Utc::now(),
        )
    }

    #[test]
    fn test_new_driver_starts_pending_and_inactive() {
        let driver = sample_driver();
        assert_eq!(driver.status, DriverStatus::Pending);
        assert!(!driver.is_active);
        assert!(driver.location.is_none());
        assert!(driver.last_login.is_none());
        assert!(!driver.status.can_login());
    }

    #[test]
    fn test_approve_is_idempotent() {
        let mut driver = sample_driver();
        assert!(driver.approve());
        assert_eq!(driver.status, DriverStatus::Approved);
        assert!(!driver.approve());
        assert_eq!(driver.status, DriverStatus::Approved);
    }

    #[test]
    fn test_deactivation_clears_location() {
        let mut driver = sample_driver();
        driver.set_active(true);
        driver.set_location(Location::new(88.3639, 22.5726, Utc::now()).unwrap());
        assert!(driver.location.is_some());

        driver.set_active(false);
        assert!(!driver.is_active);
        assert!(driver.location.is_none());
    }

    #[test]
    fn test_deactivation_without_location() {
        let mut driver = sample_driver();
        driver.set_active(false);
        assert!(driver.location.is_none());
    }

    #[test]
    fn test_visibility_needs_all_three_conditions() {
        let mut driver = sample_driver();
        driver.set_active(true);
        driver.set_location(Location::new(10.0, 10.0, Utc::now()).unwrap());
        assert!(!driver.is_visible(), "pending drivers stay hidden");

        driver.approve();
        assert!(driver.is_visible());

        driver.location = None;
        assert!(!driver.is_visible());

        driver.set_location(Location::new(10.0, 10.0, Utc::now()).unwrap());
        driver.is_active = false;
        assert!(!driver.is_visible());
    }

    #[test]
    fn test_location_range_checks() {
        let now = Utc::now();
        assert!(Location::new(180.0, -90.0, now).is_ok());
        assert!(Location::new(0.0, 0.0, now).is_ok());
        assert!(Location::new(180.5, 0.0, now).is_err());
        assert!(Location::new(0.0, 91.0, now).is_err());
        assert!(Location::new(f64::NAN, 0.0, now).is_err());
    }

    #[test]
    fn test_vehicle_type_parsing() {
        assert_eq!("toto".parse::<VehicleType>().unwrap(), VehicleType::Toto);
        assert!("truck".parse::<VehicleType>().is_err());
        assert_eq!(VehicleType::default(), VehicleType::Car);
    }

    #[test]
    fn test_register_request_defaults_vehicle_type() {
        let request = RegisterRequest {
            name: Some("Ravi".into()),
            mobile_number: Some("9000000001".into()),
            vehicle_number: Some("WB01AB1234".into()),
            vehicle_type: None,
            password: Some("secret".into()),
        };
        let registration = request.validate().unwrap();
        assert_eq!(registration.vehicle_type, VehicleType::Car);
    }

    #[test]
    fn test_register_request_reports_every_missing_field() {
        let request = RegisterRequest {
            name: Some("  ".into()),
            vehicle_type: Some("plane".into()),
            ..Default::default()
        };
        match request.validate() {
            Err(RadarError::ValidationFailed(errors)) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(
                    fields,
                    vec!["name", "mobileNumber", "vehicleNumber", "password", "vehicleType"]
                );
            }
            other => panic!("Expected ValidationFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_location_request_accepts_zero_coordinates() {
        let request = LocationUpdateRequest {
            driver_id: Some("drv-250101-abc12".into()),
            longitude: Some(0.0),
            latitude: Some(0.0),
        };
        let update = request.validate().unwrap();
        assert_eq!(update.longitude, 0.0);
    }

    #[test]
    fn test_location_request_missing_fields() {
        let request = LocationUpdateRequest {
            driver_id: Some("drv-250101-abc12".into()),
            longitude: Some(1.0),
            latitude: None,
        };
        assert!(matches!(request.validate(), Err(RadarError::ValidationFailed(_))));
    }

    #[test]
    fn test_status_request_requires_flag() {
        let request = StatusUpdateRequest {
            driver_id: Some("drv-250101-abc12".into()),
            is_active: None,
        };
        match request.validate() {
            Err(RadarError::ValidationFailed(errors)) => assert_eq!(errors[0].field, "isActive"),
            other => panic!("Expected ValidationFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_profile_update_ignores_empty_strings() {
        let request = ProfileUpdateRequest {
            name: Some(String::new()),
            vehicle_number: Some("WB02CD5678".into()),
            vehicle_type: None,
        };
        let update = request.validate().unwrap();
        assert!(update.name.is_none());
        assert_eq!(update.vehicle_number.as_deref(), Some("WB02CD5678"));
    }

    #[test]
    fn test_projections_never_carry_the_hash() {
        let driver = sample_driver();
        for value in [
            serde_json::to_value(DriverResponse::from(driver.clone())).unwrap(),
            serde_json::to_value(DriverProfile::from(driver.clone())).unwrap(),
            serde_json::to_value(DriverSummary::from(driver)).unwrap(),
        ] {
            assert!(value.get("credentialHash").is_none());
            assert!(value.get("password").is_none());
            assert_eq!(value["mobileNumber"], "9000000001");
        }
    }

    #[test]
    fn test_wire_format_uses_lowercase_enums() {
        let value = serde_json::to_value(DriverSummary::from(sample_driver())).unwrap();
        assert_eq!(value["status"], "pending");
        assert_eq!(value["vehicleType"], "auto");
        assert_eq!(value["isActive"], false);
    }
}
