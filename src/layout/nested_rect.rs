use crate::core::types::{PixelPoint, Rect, Size};
use crate::error::{ChartError, ChartResult};

/// Handle to one node in a [`LayoutTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    #[must_use]
    pub fn raw(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Node {
    /// Rectangle in the parent's local frame.
    rect: Rect,
    children: Vec<NodeId>,
    /// Non-owning back-reference, used only for stale propagation.
    parent: Option<NodeId>,
    stale: bool,
}

/// Hierarchical rectangle layout with lazy, invalidation-propagating
/// size resolution.
///
/// Nodes are owned by the arena; parents hold ordered child ids and each
/// node keeps a parent id purely so mutations can mark every ancestor
/// stale. Mutation is cheap; geometry reads resolve staleness first, so
/// recomputation cost tracks reads rather than writes. Trees are cheap
/// to rebuild, and hosts typically construct a fresh one per layout pass.
#[derive(Debug, Clone)]
pub struct LayoutTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl LayoutTree {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                rect: Rect::default(),
                children: Vec::new(),
                parent: None,
                stale: false,
            }],
            root: NodeId(0),
        }
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Creates a node owned by `parent` and marks the ancestor chain stale.
    pub fn add_child(&mut self, parent: NodeId, rect: Rect) -> ChartResult<NodeId> {
        self.check(parent)?;
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            rect,
            children: Vec::new(),
            parent: Some(parent),
            stale: false,
        });
        self.nodes[parent.0].children.push(id);
        self.mark_stale(parent);
        Ok(id)
    }

    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    #[must_use]
    pub fn is_stale(&self, id: NodeId) -> bool {
        self.nodes[id.0].stale
    }

    /// Flags `id` and every ancestor as needing recomputation.
    pub fn mark_stale(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = &mut self.nodes[node_id.0];
            node.stale = true;
            current = node.parent;
        }
    }

    pub fn set_rect(&mut self, id: NodeId, rect: Rect) -> ChartResult<()> {
        self.check(id)?;
        rect.validate()?;
        self.nodes[id.0].rect = rect;
        self.mark_stale(id);
        Ok(())
    }

    pub fn set_origin(&mut self, id: NodeId, x: f64, y: f64) -> ChartResult<()> {
        self.check(id)?;
        let rect = self.nodes[id.0].rect;
        self.set_rect(id, Rect::new(x, y, rect.width, rect.height))
    }

    pub fn set_size(&mut self, id: NodeId, size: Size) -> ChartResult<()> {
        self.check(id)?;
        let rect = self.nodes[id.0].rect;
        self.set_rect(id, Rect::new(rect.x, rect.y, size.width, size.height))
    }

    /// Node rectangle in the parent's frame, resolving staleness first.
    pub fn rect(&mut self, id: NodeId) -> ChartResult<Rect> {
        self.check(id)?;
        self.layout(id);
        Ok(self.nodes[id.0].rect)
    }

    /// Node rectangle translated into the root frame.
    pub fn rect_in_root(&mut self, id: NodeId) -> ChartResult<Rect> {
        let local = self.rect(id)?;
        let offset = self.ancestor_offset(id);
        Ok(local.translated(offset.x, offset.y))
    }

    /// Recomputes the subtree bounding union if `id` is stale.
    fn layout(&mut self, id: NodeId) {
        if !self.nodes[id.0].stale {
            return;
        }

        let children = self.nodes[id.0].children.clone();
        let mut union = Rect::default();
        for child in &children {
            self.layout(*child);
            union = union.union(self.nodes[child.0].rect);
        }

        if !children.is_empty() {
            let rect = &mut self.nodes[id.0].rect;
            rect.width = union.right().max(0.0);
            rect.height = union.bottom().max(0.0);
        }
        self.nodes[id.0].stale = false;
    }

    /// Positions children top-to-bottom with `margin` pixels between them,
    /// then resolves the new extent.
    pub fn stack_vertical(&mut self, id: NodeId, margin: f64) -> ChartResult<Rect> {
        self.check(id)?;
        let children = self.nodes[id.0].children.clone();
        let mut offset = 0.0;
        for child in children {
            self.layout(child);
            let rect = self.nodes[child.0].rect;
            self.nodes[child.0].rect = Rect::new(0.0, offset, rect.width, rect.height);
            offset += rect.height + margin;
        }
        self.mark_stale(id);
        self.rect(id)
    }

    /// Positions children left-to-right with `margin` pixels between them,
    /// then resolves the new extent.
    pub fn stack_horizontal(&mut self, id: NodeId, margin: f64) -> ChartResult<Rect> {
        self.check(id)?;
        let children = self.nodes[id.0].children.clone();
        let mut offset = 0.0;
        for child in children {
            self.layout(child);
            let rect = self.nodes[child.0].rect;
            self.nodes[child.0].rect = Rect::new(offset, 0.0, rect.width, rect.height);
            offset += rect.width + margin;
        }
        self.mark_stale(id);
        self.rect(id)
    }

    /// Wraps children into a grid constrained to `fixed_dimension` pixels.
    ///
    /// Cell size is the maximum child extent. With `is_vertical` set the
    /// fixed dimension is the height and children fill columns downward;
    /// otherwise it is the width and children fill rows rightward.
    pub fn stack_grid(
        &mut self,
        id: NodeId,
        fixed_dimension: f64,
        is_vertical: bool,
    ) -> ChartResult<Rect> {
        self.check(id)?;
        if !fixed_dimension.is_finite() || fixed_dimension <= 0.0 {
            return Err(ChartError::InvalidData(
                "grid fixed dimension must be finite and > 0".to_owned(),
            ));
        }

        let children = self.nodes[id.0].children.clone();
        let mut cell = Size::default();
        for child in &children {
            self.layout(*child);
            let rect = self.nodes[child.0].rect;
            cell.width = cell.width.max(rect.width);
            cell.height = cell.height.max(rect.height);
        }

        let cell_extent = if is_vertical { cell.height } else { cell.width };
        let per_line = if cell_extent > 0.0 {
            ((fixed_dimension / cell_extent).floor() as usize).max(1)
        } else {
            1
        };

        for (index, child) in children.iter().enumerate() {
            let along = (index % per_line) as f64;
            let across = (index / per_line) as f64;
            let (x, y) = if is_vertical {
                (across * cell.width, along * cell.height)
            } else {
                (along * cell.width, across * cell.height)
            };
            let rect = self.nodes[child.0].rect;
            self.nodes[child.0].rect = Rect::new(x, y, rect.width, rect.height);
        }
        self.mark_stale(id);
        self.rect(id)
    }

    /// Converts a point in this node's local frame into the root frame.
    pub fn translate_to_root(&mut self, id: NodeId, point: PixelPoint) -> ChartResult<PixelPoint> {
        self.check(id)?;
        self.layout(self.root);
        let origin = self.rect_in_root(id)?.origin();
        Ok(PixelPoint::new(point.x + origin.x, point.y + origin.y))
    }

    /// Converts a point in the root frame into this node's local frame.
    pub fn translate_from_root(
        &mut self,
        id: NodeId,
        point: PixelPoint,
    ) -> ChartResult<PixelPoint> {
        self.check(id)?;
        self.layout(self.root);
        let origin = self.rect_in_root(id)?.origin();
        Ok(PixelPoint::new(point.x - origin.x, point.y - origin.y))
    }

    /// Whether a root-frame point falls inside this node's rectangle.
    pub fn within(&mut self, id: NodeId, point: PixelPoint) -> ChartResult<bool> {
        Ok(self.rect_in_root(id)?.contains(point))
    }

    /// Summed origins of all strict ancestors.
    fn ancestor_offset(&self, id: NodeId) -> PixelPoint {
        let mut offset = PixelPoint::default();
        let mut current = self.nodes[id.0].parent;
        while let Some(node_id) = current {
            let node = &self.nodes[node_id.0];
            offset.x += node.rect.x;
            offset.y += node.rect.y;
            current = node.parent;
        }
        offset
    }

    fn check(&self, id: NodeId) -> ChartResult<()> {
        if id.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(ChartError::InvalidData(format!(
                "layout node id {} out of bounds",
                id.0
            )))
        }
    }
}

impl Default for LayoutTree {
    fn default() -> Self {
        Self::new()
    }
}
