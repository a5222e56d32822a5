//! Meltview Session Model
//!
//! Defines the core data contracts for a Meltview session:
//! - **Thermal:** The stack of raw temperature frames from the thermal camera
//! - **Sensor:** Timestamped meltpool readings and the camera timestamp stream
//! - **Record:** Per-frame matched records and reflection bounds
//! - **Source:** The capability that resolves named inputs to loaded data
//!
//! Both timestamp streams are expressed in seconds on a shared monotonic axis.

pub mod label;
pub mod loader;
pub mod record;
pub mod sensor;
pub mod session;
pub mod source;
pub mod thermal;

pub use label::*;
pub use record::*;
pub use sensor::*;
pub use session::*;
pub use source::*;
pub use thermal::*;
