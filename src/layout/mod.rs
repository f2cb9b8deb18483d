mod nested_rect;

pub use nested_rect::{LayoutTree, NodeId};
