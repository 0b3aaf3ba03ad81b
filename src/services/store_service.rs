// src/services/store_service.rs
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::Client;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing;

use crate::models::driver::{Driver, DriverStatus};

// Error types
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Duplicate value for unique field {field}")]
    Duplicate { field: &'static str },

    #[error("No driver with id {0}")]
    Missing(String),

    #[error("Driver id {0} is already taken")]
    IdTaken(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        match err.kind() {
            redis::ErrorKind::IoError => StoreError::Connection(err.to_string()),
            redis::ErrorKind::AuthenticationFailed => {
                StoreError::Connection("Authentication failed".to_string())
            }
            _ => StoreError::Query(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Conjunction of optional conditions over a driver record.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DriverFilter {
    pub status: Option<DriverStatus>,
    pub is_active: Option<bool>,
    pub has_location: Option<bool>,
}

impl DriverFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn pending() -> Self {
        Self {
            status: Some(DriverStatus::Pending),
            ..Self::default()
        }
    }

    pub fn active() -> Self {
        Self {
            is_active: Some(true),
            ..Self::default()
        }
    }

    /// Approved, active and carrying a location.
    pub fn visible() -> Self {
        Self {
            status: Some(DriverStatus::Approved),
            is_active: Some(true),
            has_location: Some(true),
        }
    }

    pub fn matches(&self, driver: &Driver) -> bool {
        self.status.is_none_or(|s| driver.status == s)
            && self.is_active.is_none_or(|a| driver.is_active == a)
            && self.has_location.is_none_or(|l| driver.location.is_some() == l)
    }
}

/// Record store for drivers.
///
/// `insert` and `update` enforce uniqueness of mobile and vehicle numbers and
/// report violations as [`StoreError::Duplicate`]. `insert` never replaces an
/// existing record; an id already on file is [`StoreError::IdTaken`].
#[async_trait]
pub trait DriverStore: Send + Sync {
    async fn insert(&self, driver: &Driver) -> Result<(), StoreError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Driver>, StoreError>;
    async fn find_by_mobile_number(&self, mobile_number: &str) -> Result<Option<Driver>, StoreError>;
    async fn find_by_vehicle_number(&self, vehicle_number: &str) -> Result<Option<Driver>, StoreError>;
    async fn find(&self, filter: DriverFilter) -> Result<Vec<Driver>, StoreError>;
    async fn update(&self, driver: &Driver) -> Result<(), StoreError>;
    /// Returns false when nothing was stored under `id`.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;
}

// Key layout
pub struct StoreKeys;

impl StoreKeys {
    pub fn driver_by_id(driver_id: &str) -> String {
        format!("driver:id:{}", driver_id)
    }

    pub fn driver_by_mobile(mobile_number: &str) -> String {
        format!("driver:mobile:{}", mobile_number)
    }

    pub fn driver_by_vehicle(vehicle_number: &str) -> String {
        format!("driver:vehicle:{}", vehicle_number)
    }

    pub fn all_drivers() -> &'static str {
        "drivers:all"
    }
}

/// Index keys to claim and release when a stored record is rewritten.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexChange {
    pub claim: Vec<(String, &'static str)>,
    pub release: Vec<String>,
}

impl IndexChange {
    pub fn between(previous: &Driver, next: &Driver) -> Self {
        let mut change = Self { claim: Vec::new(), release: Vec::new() };
        if previous.mobile_number != next.mobile_number {
            change.claim.push((StoreKeys::driver_by_mobile(&next.mobile_number), "mobileNumber"));
            change.release.push(StoreKeys::driver_by_mobile(&previous.mobile_number));
        }
        if previous.vehicle_number != next.vehicle_number {
            change.claim.push((StoreKeys::driver_by_vehicle(&next.vehicle_number), "vehicleNumber"));
            change.release.push(StoreKeys::driver_by_vehicle(&previous.vehicle_number));
        }
        change
    }

    pub fn is_empty(&self) -> bool {
        self.claim.is_empty() && self.release.is_empty()
    }
}

/// How a record write treats an existing value under the id key.
#[derive(Debug, Clone, Copy, PartialEq)]
enum WriteMode {
    /// `SET ... NX`: only when no record exists.
    Create,
    /// `SET ... XX`: only when the record still exists.
    Replace,
}

impl WriteMode {
    fn flag(self) -> &'static str {
        match self {
            WriteMode::Create => "NX",
            WriteMode::Replace => "XX",
        }
    }
}

// Redis-backed store
pub struct RedisDriverStore {
    connection: MultiplexedConnection,
}

impl RedisDriverStore {
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client = Client::open(redis_url).map_err(|e| StoreError::Connection(e.to_string()))?;
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        tracing::info!("Connected to Redis at {}", redis_url);
        Ok(Self { connection })
    }

    async fn get_json(&self, key: &str) -> Result<Option<Driver>, StoreError> {
        let mut conn = self.connection.clone();
        let data: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        data.map(|json| serde_json::from_str(&json).map_err(StoreError::from))
            .transpose()
    }

    async fn find_by_index(&self, index_key: &str) -> Result<Option<Driver>, StoreError> {
        let mut conn = self.connection.clone();
        let id: Option<String> = redis::cmd("GET").arg(index_key).query_async(&mut conn).await?;
        match id {
            Some(id) => self.get_json(&StoreKeys::driver_by_id(&id)).await,
            None => Ok(None),
        }
    }

    /// `SET key id NX`; true when the key was claimed.
    async fn claim(&self, key: &str, id: &str) -> Result<bool, StoreError> {
        let mut conn = self.connection.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(id)
            .arg("NX")
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn release(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        let _: () = redis::cmd("DEL").arg(key).query_async(&mut conn).await?;
        Ok(())
    }

    /// Cleanup after a failed write; the caller's error wins over a failed DEL.
    async fn release_quietly(&self, keys: &[String]) {
        for key in keys {
            if let Err(e) = self.release(key).await {
                tracing::warn!("Failed to release index key {}: {}", key, e);
            }
        }
    }

    /// Writes the record under its id key; false when `mode` did not hold.
    async fn write_record(&self, driver: &Driver, mode: WriteMode) -> Result<bool, StoreError> {
        let json = serde_json::to_string(driver)?;
        let mut conn = self.connection.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(StoreKeys::driver_by_id(&driver.id))
            .arg(json)
            .arg(mode.flag())
            .query_async(&mut conn)
            .await?;
        if reply.is_none() {
            return Ok(false);
        }

        if mode == WriteMode::Create {
            let _: () = redis::cmd("SADD")
                .arg(StoreKeys::all_drivers())
                .arg(&driver.id)
                .query_async(&mut conn)
                .await?;
        }
        Ok(true)
    }
}

#[async_trait]
impl DriverStore for RedisDriverStore {
    async fn insert(&self, driver: &Driver) -> Result<(), StoreError> {
        let mobile_key = StoreKeys::driver_by_mobile(&driver.mobile_number);
        let vehicle_key = StoreKeys::driver_by_vehicle(&driver.vehicle_number);

        if !self.claim(&mobile_key, &driver.id).await? {
            return Err(StoreError::Duplicate { field: "mobileNumber" });
        }
        if !self.claim(&vehicle_key, &driver.id).await? {
            self.release_quietly(&[mobile_key]).await;
            return Err(StoreError::Duplicate { field: "vehicleNumber" });
        }

        let claimed = [mobile_key, vehicle_key];
        match self.write_record(driver, WriteMode::Create).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                self.release_quietly(&claimed).await;
                Err(StoreError::IdTaken(driver.id.clone()))
            }
            Err(e) => {
                self.release_quietly(&claimed).await;
                Err(e)
            }
        }
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Driver>, StoreError> {
        tracing::debug!("Loading driver record: {}", id);
        self.get_json(&StoreKeys::driver_by_id(id)).await
    }

    async fn find_by_mobile_number(&self, mobile_number: &str) -> Result<Option<Driver>, StoreError> {
        self.find_by_index(&StoreKeys::driver_by_mobile(mobile_number)).await
    }

    async fn find_by_vehicle_number(&self, vehicle_number: &str) -> Result<Option<Driver>, StoreError> {
        self.find_by_index(&StoreKeys::driver_by_vehicle(vehicle_number)).await
    }

    async fn find(&self, filter: DriverFilter) -> Result<Vec<Driver>, StoreError> {
        let mut conn = self.connection.clone();
        let ids: Vec<String> = redis::cmd("SMEMBERS")
            .arg(StoreKeys::all_drivers())
            .query_async(&mut conn)
            .await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = ids.iter().map(|id| StoreKeys::driver_by_id(id)).collect();
        let records: Vec<Option<String>> = redis::cmd("MGET").arg(&keys).query_async(&mut conn).await?;

        let mut drivers = Vec::with_capacity(records.len());
        for json in records.into_iter().flatten() {
            let driver: Driver = serde_json::from_str(&json)?;
            if filter.matches(&driver) {
                drivers.push(driver);
            }
        }
        drivers.sort_by(|a, b| a.registered_at.cmp(&b.registered_at));
        Ok(drivers)
    }

    async fn update(&self, driver: &Driver) -> Result<(), StoreError> {
        let previous = self
            .find_by_id(&driver.id)
            .await?
            .ok_or_else(|| StoreError::Missing(driver.id.clone()))?;

        let change = IndexChange::between(&previous, driver);
        let mut claimed = Vec::with_capacity(change.claim.len());
        for (key, field) in &change.claim {
            match self.claim(key, &driver.id).await {
                Ok(true) => claimed.push(key.clone()),
                Ok(false) => {
                    self.release_quietly(&claimed).await;
                    return Err(StoreError::Duplicate { field: *field });
                }
                Err(e) => {
                    self.release_quietly(&claimed).await;
                    return Err(e);
                }
            }
        }

        // Old index keys go only once the record carries the new numbers.
        match self.write_record(driver, WriteMode::Replace).await {
            Ok(true) => {
                self.release_quietly(&change.release).await;
                Ok(())
            }
            Ok(false) => {
                self.release_quietly(&claimed).await;
                Err(StoreError::Missing(driver.id.clone()))
            }
            Err(e) => {
                self.release_quietly(&claimed).await;
                Err(e)
            }
        }
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let Some(driver) = self.find_by_id(id).await? else {
            return Ok(false);
        };

        let mut conn = self.connection.clone();
        let _: () = redis::pipe()
            .atomic()
            .cmd("DEL")
            .arg(StoreKeys::driver_by_id(id))
            .ignore()
            .cmd("DEL")
            .arg(StoreKeys::driver_by_mobile(&driver.mobile_number))
            .ignore()
            .cmd("DEL")
            .arg(StoreKeys::driver_by_vehicle(&driver.vehicle_number))
            .ignore()
            .cmd("SREM")
            .arg(StoreKeys::all_drivers())
            .arg(id)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(true)
    }
}

// Memory store for development/testing
#[derive(Default)]
pub struct MemoryDriverStore {
    records: RwLock<HashMap<String, Driver>>,
}

impl MemoryDriverStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn conflicting_field(records: &HashMap<String, Driver>, driver: &Driver) -> Option<&'static str> {
    records.values().filter(|other| other.id != driver.id).find_map(|other| {
        if other.mobile_number == driver.mobile_number {
            Some("mobileNumber")
        } else if other.vehicle_number == driver.vehicle_number {
            Some("vehicleNumber")
        } else {
            None
        }
    })
}

#[async_trait]
impl DriverStore for MemoryDriverStore {
    async fn insert(&self, driver: &Driver) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        if records.contains_key(&driver.id) {
            return Err(StoreError::IdTaken(driver.id.clone()));
        }
        if let Some(field) = conflicting_field(&records, driver) {
            return Err(StoreError::Duplicate { field });
        }
        records.insert(driver.id.clone(), driver.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Driver>, StoreError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn find_by_mobile_number(&self, mobile_number: &str) -> Result<Option<Driver>, StoreError> {
        let records = self.records.read().await;
        Ok(records.values().find(|d| d.mobile_number == mobile_number).cloned())
    }

    async fn find_by_vehicle_number(&self, vehicle_number: &str) -> Result<Option<Driver>, StoreError> {
        let records = self.records.read().await;
        Ok(records.values().find(|d| d.vehicle_number == vehicle_number).cloned())
    }

    async fn find(&self, filter: DriverFilter) -> Result<Vec<Driver>, StoreError> {
        let records = self.records.read().await;
        let mut drivers: Vec<Driver> = records.values().filter(|d| filter.matches(d)).cloned().collect();
        drivers.sort_by(|a, b| a.registered_at.cmp(&b.registered_at));
        Ok(drivers)
    }

    async fn update(&self, driver: &Driver) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        if !records.contains_key(&driver.id) {
            return Err(StoreError::Missing(driver.id.clone()));
        }
        if let Some(field) = conflicting_field(&records, driver) {
            return Err(StoreError::Duplicate { field });
        }
        records.insert(driver.id.clone(), driver.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.records.write().await.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::driver::{DriverRegistration, Location, VehicleType};
    use crate::services::credential_service::CredentialHash;
    use chrono::Utc;

    fn driver(id: &str, mobile: &str, vehicle: &str) -> Driver {
        Driver::new(
            id.to_string(),
            DriverRegistration {
                name: format!("Driver {id}"),
                mobile_number: mobile.to_string(),
                vehicle_number: vehicle.to_string(),
                vehicle_type: VehicleType::Car,
                password: String::new(),
            },
            CredentialHash::from_stored("$argon2id$stub"),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let store = MemoryDriverStore::new();
        store.insert(&driver("drv-1", "9000000001", "WB01")).await.unwrap();

        assert!(store.find_by_id("drv-1").await.unwrap().is_some());
        assert_eq!(
            store.find_by_mobile_number("9000000001").await.unwrap().map(|d| d.id),
            Some("drv-1".to_string())
        );
        assert_eq!(
            store.find_by_vehicle_number("WB01").await.unwrap().map(|d| d.id),
            Some("drv-1".to_string())
        );
        assert!(store.find_by_id("drv-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_enforces_uniqueness() {
        let store = MemoryDriverStore::new();
        store.insert(&driver("drv-1", "9000000001", "WB01")).await.unwrap();

        let err = store.insert(&driver("drv-2", "9000000001", "WB02")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { field: "mobileNumber" }));

        let err = store.insert(&driver("drv-3", "9000000003", "WB01")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { field: "vehicleNumber" }));

        assert_eq!(store.find(DriverFilter::all()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_insert_never_replaces_existing_id() {
        let store = MemoryDriverStore::new();
        store.insert(&driver("drv-250101-abc12", "9000000001", "WB01")).await.unwrap();

        let err = store.insert(&driver("drv-250101-abc12", "9000000002", "WB02")).await.unwrap_err();
        assert!(matches!(err, StoreError::IdTaken(id) if id == "drv-250101-abc12"));

        assert_eq!(store.find(DriverFilter::all()).await.unwrap().len(), 1);
        assert_eq!(
            store.find_by_mobile_number("9000000001").await.unwrap().map(|d| d.id),
            Some("drv-250101-abc12".to_string())
        );
        assert!(store.find_by_mobile_number("9000000002").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_checks_vehicle_number_against_others() {
        let store = MemoryDriverStore::new();
        store.insert(&driver("drv-1", "9000000001", "WB01")).await.unwrap();
        store.insert(&driver("drv-2", "9000000002", "WB02")).await.unwrap();

        let mut renamed = store.find_by_id("drv-2").await.unwrap().unwrap();
        renamed.vehicle_number = "WB01".to_string();
        assert!(matches!(
            store.update(&renamed).await,
            Err(StoreError::Duplicate { field: "vehicleNumber" })
        ));

        // Rewriting a record with its own numbers is not a conflict.
        let own = store.find_by_id("drv-1").await.unwrap().unwrap();
        store.update(&own).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_missing_record() {
        let store = MemoryDriverStore::new();
        let err = store.update(&driver("drv-9", "1", "2")).await.unwrap_err();
        assert!(matches!(err, StoreError::Missing(id) if id == "drv-9"));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryDriverStore::new();
        store.insert(&driver("drv-1", "9000000001", "WB01")).await.unwrap();
        assert!(store.delete("drv-1").await.unwrap());
        assert!(!store.delete("drv-1").await.unwrap());
        assert!(store.find_by_mobile_number("9000000001").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_filters() {
        let store = MemoryDriverStore::new();
        let pending = driver("drv-1", "1", "A");
        let mut active = driver("drv-2", "2", "B");
        active.approve();
        active.set_active(true);
        let mut visible = driver("drv-3", "3", "C");
        visible.approve();
        visible.set_active(true);
        visible.set_location(Location::new(88.3639, 22.5726, Utc::now()).unwrap());

        for d in [&pending, &active, &visible] {
            store.insert(d).await.unwrap();
        }

        let ids = |drivers: Vec<Driver>| drivers.into_iter().map(|d| d.id).collect::<Vec<_>>();
        assert_eq!(ids(store.find(DriverFilter::pending()).await.unwrap()), vec!["drv-1"]);
        let mut active_ids = ids(store.find(DriverFilter::active()).await.unwrap());
        active_ids.sort();
        assert_eq!(active_ids, vec!["drv-2", "drv-3"]);
        assert_eq!(ids(store.find(DriverFilter::visible()).await.unwrap()), vec!["drv-3"]);
        assert_eq!(store.find(DriverFilter::all()).await.unwrap().len(), 3);
    }

    #[test]
    fn test_visible_filter_agrees_with_driver_predicate() {
        let mut d = driver("drv-1", "1", "A");
        let states = [(false, false, false), (true, false, false), (true, true, false), (true, true, true)];
        for (approved, active, located) in states {
            d.status = if approved { DriverStatus::Approved } else { DriverStatus::Pending };
            d.is_active = active;
            d.location = located.then(|| Location::new(1.0, 1.0, Utc::now()).unwrap());
            assert_eq!(DriverFilter::visible().matches(&d), d.is_visible());
        }
    }

    #[test]
    fn test_index_change_for_vehicle_rename() {
        let previous = driver("drv-1", "9000000001", "WB01");
        let mut next = previous.clone();
        next.vehicle_number = "WB02".to_string();

        let change = IndexChange::between(&previous, &next);
        assert_eq!(change.claim, vec![("driver:vehicle:WB02".to_string(), "vehicleNumber")]);
        assert_eq!(change.release, vec!["driver:vehicle:WB01".to_string()]);
    }

    #[test]
    fn test_index_change_when_numbers_unchanged() {
        let previous = driver("drv-1", "9000000001", "WB01");
        let mut next = previous.clone();
        next.name = "Renamed".to_string();
        next.set_active(true);

        assert!(IndexChange::between(&previous, &next).is_empty());
    }

    #[test]
    fn test_index_change_for_both_numbers() {
        let previous = driver("drv-1", "9000000001", "WB01");
        let next = driver("drv-1", "9000000002", "WB02");

        let change = IndexChange::between(&previous, &next);
        let claimed: Vec<&str> = change.claim.iter().map(|(_, field)| *field).collect();
        assert_eq!(claimed, vec!["mobileNumber", "vehicleNumber"]);
        assert_eq!(
            change.release,
            vec!["driver:mobile:9000000001".to_string(), "driver:vehicle:WB01".to_string()]
        );
    }

    #[test]
    fn test_store_keys() {
        assert_eq!(StoreKeys::driver_by_id("drv-1"), "driver:id:drv-1");
        assert_eq!(StoreKeys::driver_by_mobile("900"), "driver:mobile:900");
        assert_eq!(StoreKeys::driver_by_vehicle("WB01"), "driver:vehicle:WB01");
    }

    /// Runs against a live server: `REDIS_URL=redis://127.0.0.1/ cargo test -- --ignored`.
    mod redis_store {
        use super::*;

        async fn connect() -> Option<RedisDriverStore> {
            let url = std::env::var("REDIS_URL").ok()?;
            Some(RedisDriverStore::connect(&url).await.unwrap())
        }

        /// Numbers unique to one test run so parallel runs do not collide.
        fn tag() -> String {
            use rand::Rng;
            format!("{:05}", rand::rng().random_range(0..100_000))
        }

        #[tokio::test]
        #[ignore = "needs REDIS_URL"]
        async fn test_insert_rejects_taken_id_and_releases_claims() {
            let Some(store) = connect().await else { return };
            let t = tag();
            let id = format!("drv-250101-r{}", &t[..4]);
            let first = driver(&id, &format!("91{t}001"), &format!("RT{t}A"));
            store.delete(&id).await.unwrap();
            store.insert(&first).await.unwrap();

            let second = driver(&id, &format!("91{t}002"), &format!("RT{t}B"));
            let err = store.insert(&second).await.unwrap_err();
            assert!(matches!(err, StoreError::IdTaken(_)));

            let kept = store.find_by_id(&id).await.unwrap().unwrap();
            assert_eq!(kept.mobile_number, first.mobile_number);
            // The losing insert must not leave its index keys behind.
            assert!(store.find_by_mobile_number(&second.mobile_number).await.unwrap().is_none());
            assert!(store.find_by_vehicle_number(&second.vehicle_number).await.unwrap().is_none());

            assert!(store.delete(&id).await.unwrap());
        }

        #[tokio::test]
        #[ignore = "needs REDIS_URL"]
        async fn test_vehicle_rename_moves_index_key() {
            let Some(store) = connect().await else { return };
            let t = tag();
            let id = format!("drv-250101-v{}", &t[..4]);
            let mut record = driver(&id, &format!("92{t}001"), &format!("RV{t}A"));
            store.delete(&id).await.unwrap();
            store.insert(&record).await.unwrap();

            let old_vehicle = record.vehicle_number.clone();
            record.vehicle_number = format!("RV{t}B");
            store.update(&record).await.unwrap();

            assert!(store.find_by_vehicle_number(&old_vehicle).await.unwrap().is_none());
            assert_eq!(
                store.find_by_vehicle_number(&record.vehicle_number).await.unwrap().map(|d| d.id),
                Some(id.clone())
            );

            assert!(store.delete(&id).await.unwrap());
        }

        #[tokio::test]
        #[ignore = "needs REDIS_URL"]
        async fn test_update_does_not_resurrect_deleted_record() {
            let Some(store) = connect().await else { return };
            let t = tag();
            let id = format!("drv-250101-d{}", &t[..4]);
            let mut record = driver(&id, &format!("93{t}001"), &format!("RD{t}A"));
            store.delete(&id).await.unwrap();
            store.insert(&record).await.unwrap();
            assert!(store.delete(&id).await.unwrap());

            record.vehicle_number = format!("RD{t}B");
            let err = store.update(&record).await.unwrap_err();
            assert!(matches!(err, StoreError::Missing(_)));

            // A rewrite racing the delete, after its own existence check.
            assert!(!store.write_record(&record, WriteMode::Replace).await.unwrap());

            assert!(store.find_by_id(&id).await.unwrap().is_none());
            assert!(store.find_by_vehicle_number(&record.vehicle_number).await.unwrap().is_none());
            assert!(!store.find(DriverFilter::all()).await.unwrap().iter().any(|d| d.id == id));
        }
    }
}
