use traceplot::core::types::{PixelPoint, Rect};
use traceplot::layout::LayoutTree;

#[test]
fn parent_size_is_union_of_children() {
    let mut tree = LayoutTree::new();
    let root = tree.root();
    let parent = tree.add_child(root, Rect::default()).expect("add");
    tree.add_child(parent, Rect::new(0.0, 0.0, 30.0, 10.0))
        .expect("add");
    tree.add_child(parent, Rect::new(10.0, 5.0, 30.0, 10.0))
        .expect("add");

    let rect = tree.rect(parent).expect("rect");
    assert_eq!(rect.width, 40.0);
    assert_eq!(rect.height, 15.0);
}

#[test]
fn leaf_keeps_explicit_size() {
    let mut tree = LayoutTree::new();
    let root = tree.root();
    let leaf = tree
        .add_child(root, Rect::new(3.0, 4.0, 20.0, 10.0))
        .expect("add");
    assert_eq!(tree.rect(leaf).expect("rect"), Rect::new(3.0, 4.0, 20.0, 10.0));
}

#[test]
fn mutation_marks_ancestors_stale_and_read_resolves() {
    let mut tree = LayoutTree::new();
    let root = tree.root();
    let parent = tree.add_child(root, Rect::default()).expect("add");
    let child = tree
        .add_child(parent, Rect::new(0.0, 0.0, 10.0, 10.0))
        .expect("add");
    tree.rect(root).expect("resolve");
    assert!(!tree.is_stale(root));

    tree.set_size(child, traceplot::core::types::Size::new(50.0, 8.0))
        .expect("resize");
    assert!(tree.is_stale(parent));
    assert!(tree.is_stale(root));

    let rect = tree.rect(parent).expect("rect");
    assert_eq!(rect.width, 50.0);
    assert!(!tree.is_stale(parent));
}

#[test]
fn stack_vertical_places_children_with_margin() {
    let mut tree = LayoutTree::new();
    let root = tree.root();
    let container = tree.add_child(root, Rect::default()).expect("add");
    let a = tree
        .add_child(container, Rect::new(0.0, 0.0, 100.0, 20.0))
        .expect("add");
    let b = tree
        .add_child(container, Rect::new(0.0, 0.0, 60.0, 30.0))
        .expect("add");

    let extent = tree.stack_vertical(container, 5.0).expect("stack");
    assert_eq!(tree.rect(a).expect("rect").y, 0.0);
    assert_eq!(tree.rect(b).expect("rect").y, 25.0);
    assert_eq!(extent.width, 100.0);
    assert_eq!(extent.height, 55.0);
}

#[test]
fn stack_horizontal_places_children_with_margin() {
    let mut tree = LayoutTree::new();
    let root = tree.root();
    let container = tree.add_child(root, Rect::default()).expect("add");
    let a = tree
        .add_child(container, Rect::new(0.0, 0.0, 20.0, 40.0))
        .expect("add");
    let b = tree
        .add_child(container, Rect::new(0.0, 0.0, 30.0, 10.0))
        .expect("add");

    let extent = tree.stack_horizontal(container, 2.0).expect("stack");
    assert_eq!(tree.rect(a).expect("rect").x, 0.0);
    assert_eq!(tree.rect(b).expect("rect").x, 22.0);
    assert_eq!(extent.width, 52.0);
    assert_eq!(extent.height, 40.0);
}

#[test]
fn grid_wraps_at_fixed_dimension() {
    let mut tree = LayoutTree::new();
    let root = tree.root();
    let container = tree.add_child(root, Rect::default()).expect("add");
    let mut cells = Vec::new();
    for _ in 0..5 {
        cells.push(
            tree.add_child(container, Rect::new(0.0, 0.0, 40.0, 10.0))
                .expect("add"),
        );
    }

    // 100px of width fits two 40px cells per row.
    tree.stack_grid(container, 100.0, false).expect("grid");
    assert_eq!(tree.rect(cells[0]).expect("rect").origin(), PixelPoint::new(0.0, 0.0));
    assert_eq!(tree.rect(cells[1]).expect("rect").origin(), PixelPoint::new(40.0, 0.0));
    assert_eq!(tree.rect(cells[2]).expect("rect").origin(), PixelPoint::new(0.0, 10.0));
    assert_eq!(tree.rect(cells[4]).expect("rect").origin(), PixelPoint::new(0.0, 20.0));
}

#[test]
fn grid_rejects_non_positive_dimension() {
    let mut tree = LayoutTree::new();
    let root = tree.root();
    let container = tree.add_child(root, Rect::default()).expect("add");
    assert!(tree.stack_grid(container, 0.0, false).is_err());
}

#[test]
fn translations_compose_through_ancestors() {
    let mut tree = LayoutTree::new();
    let root = tree.root();
    let outer = tree
        .add_child(root, Rect::new(10.0, 20.0, 100.0, 100.0))
        .expect("add");
    let inner = tree
        .add_child(outer, Rect::new(5.0, 5.0, 50.0, 50.0))
        .expect("add");

    let to_root = tree
        .translate_to_root(inner, PixelPoint::new(1.0, 2.0))
        .expect("to root");
    assert_eq!(to_root, PixelPoint::new(16.0, 27.0));

    let back = tree.translate_from_root(inner, to_root).expect("from root");
    assert_eq!(back, PixelPoint::new(1.0, 2.0));
}

#[test]
fn within_checks_root_frame_containment() {
    let mut tree = LayoutTree::new();
    let root = tree.root();
    let outer = tree
        .add_child(root, Rect::new(10.0, 10.0, 100.0, 100.0))
        .expect("add");
    let inner = tree
        .add_child(outer, Rect::new(20.0, 20.0, 10.0, 10.0))
        .expect("add");

    assert!(tree.within(inner, PixelPoint::new(35.0, 35.0)).expect("within"));
    assert!(!tree.within(inner, PixelPoint::new(5.0, 5.0)).expect("within"));
}

#[test]
fn rect_in_root_offsets_by_ancestors() {
    let mut tree = LayoutTree::new();
    let root = tree.root();
    let outer = tree
        .add_child(root, Rect::new(100.0, 50.0, 200.0, 200.0))
        .expect("add");
    let inner = tree
        .add_child(outer, Rect::new(10.0, 10.0, 20.0, 20.0))
        .expect("add");
    let rect = tree.rect_in_root(inner).expect("rect");
    assert_eq!(rect, Rect::new(110.0, 60.0, 20.0, 20.0));
}

#[test]
fn parent_and_children_links_are_consistent() {
    let mut tree = LayoutTree::new();
    let root = tree.root();
    let a = tree.add_child(root, Rect::default()).expect("add");
    let b = tree.add_child(root, Rect::default()).expect("add");

    assert_eq!(tree.children(root), &[a, b]);
    assert_eq!(tree.parent(a), Some(root));
    assert_eq!(tree.parent(root), None);
    assert_eq!(tree.len(), 3);
}
