//! # ChargeSync - state mirror for cloud-polled EV chargers
//!
//! ChargeSync periodically reads an EV charger's telemetry from the vendor's
//! cloud API and keeps a set of named observables in sync with it, writing
//! only what changed and raising lifecycle events (charging started, car
//! unplugged, ...) as the charger moves between states.
//!
//! ## Architecture
//!
//! - `status`: fixed mapping from vendor status codes to charger states
//! - `session`: session cost and lifetime energy accounting
//! - `capabilities`: observables, the host sink and the change-only writer
//! - `events`: status transitions and the broadcast event bus
//! - `api`: charger API trait, wire model and reqwest client
//! - `driver`: poll cycle, scheduler, commands and the per-device facade
//! - `web`: HTTP status and control surface
//! - `config`: YAML configuration and validation
//! - `logging`: structured logging and tracing

pub mod api;
pub mod capabilities;
pub mod config;
pub mod driver;
pub mod error;
pub mod events;
pub mod logging;
pub mod session;
pub mod status;
#[cfg(feature = "web")]
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use driver::ChargerDriver;
pub use error::{ChargeSyncError, Result};
