//! Meltview Processing Core
//!
//! Turns raw session data into displayable frames:
//! - **Align:** Attach the current sensor reading to every thermal frame
//! - **Reflection:** Suppress optical reflections above and below the part
//! - **Colormap:** Per-frame normalization and inferno pseudo-color
//! - **Overlay:** Sensor values drawn as text
//! - **Pipeline:** The fixed-order chain of the steps above
//!
//! This crate is pure computation — no I/O, no platform dependencies.
//! All inputs are data; all outputs are data.

pub mod align;
pub mod colormap;
pub mod overlay;
pub mod pipeline;
pub mod reflection;

pub use align::{align, match_indices, AlignmentSummary};
pub use pipeline::{FrameTransformPipeline, PipelineConfig};
