//! traceplot: backend-agnostic 2D chart rendering core.
//!
//! Scales, hierarchical layout, axes, traces, and pointer interaction are
//! resolved here in pixel space; hosts supply a [`render::Surface`]
//! implementation to put the result on screen.

pub mod chart;
pub mod core;
pub mod error;
pub mod interaction;
pub mod layout;
pub mod render;
pub mod telemetry;

pub use chart::{Axis, AxisId, AxisPosition, Chart, ChartConfig, Trace, TraceId, TraceKind};
pub use error::{ChartError, ChartResult};
