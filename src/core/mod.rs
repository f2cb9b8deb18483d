pub mod marker;
pub mod scale;
pub mod types;
pub mod value;

pub use marker::{MarkerGeometry, MarkerShape, marker_geometry};
pub use scale::{IntervalMode, Scale, ScaleConfig, ScaleLabel, normalize_bounds};
pub use types::{PixelPoint, Rect, Size, Viewport};
pub use value::{ScalarKind, ScalarSlot, ScalarValue};
