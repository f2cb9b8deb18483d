pub mod axis;
pub mod graph;
pub mod trace;

pub use axis::{Axis, AxisPosition, AxisState, HighlightBand};
pub use graph::{Chart, ChartConfig, GraphState, LegendEntry};
pub use trace::{
    ColoredSegment, Compass, Mark, PlacedMark, Threshold, Trace, TraceKind, TracePoint,
};

use serde::{Deserialize, Serialize};

/// Handle to an axis owned by a [`Chart`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AxisId(pub(crate) usize);

impl AxisId {
    #[must_use]
    pub fn raw(self) -> usize {
        self.0
    }
}

/// Handle to a trace owned by a [`Chart`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraceId(pub(crate) usize);

impl TraceId {
    #[must_use]
    pub fn raw(self) -> usize {
        self.0
    }
}
