// src/services/mod.rs
pub mod credential_service;
pub mod driver_service;
pub mod location_service;
pub mod store_service;
