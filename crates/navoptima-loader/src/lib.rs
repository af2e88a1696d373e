//! Incremental loader for the `gold_navoptima` star schema.
//!
//! Reads a bulk telemetry extract, reconciles the vessel-type, weather and
//! vessel dimensions (SCD2 on vessel length), then appends performance facts
//! in batches. Works against any [`navoptima_core::warehouse::Warehouse`].

pub mod clean;
pub mod config;
pub mod dimensions;
pub mod error;
pub mod extract;
pub mod facts;
pub mod pipeline;

pub use config::LoaderConfig;
pub use error::{Error, Result};
pub use pipeline::run;
