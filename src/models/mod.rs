// src/models/mod.rs
pub mod driver;
pub mod location;
pub mod messages;

pub use driver::*;
pub use location::*;
pub use messages::*;
