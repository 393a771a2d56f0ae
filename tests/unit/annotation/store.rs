use super::*;
use crate::annotation::model::{Bounds, MIN_AREA_EXTENT_PCT};
use crate::foundation::core::Point;

fn point(x: f64, y: f64) -> Draft {
    Draft::Point { x, y }
}

#[test]
fn add_preserves_insertion_order_and_unique_ids() {
    let mut store = AnnotationStore::new();
    let a = store.add(point(20.0, 30.0), "A").unwrap();
    let b = store
        .add(Draft::Area(Bounds::new(60.0, 10.0, 30.0, 30.0)), "B")
        .unwrap();
    let c = store.add(point(5.0, 5.0), "C").unwrap();

    assert_ne!(a, b);
    assert_ne!(b, c);
    let order: Vec<_> = store.list().iter().map(|x| x.description.as_str()).collect();
    assert_eq!(order, ["A", "B", "C"]);
    assert_eq!(store.label(1).as_deref(), Some("2"));
    assert_eq!(store.label(3), None);
}

#[test]
fn area_center_is_derived_from_bounds() {
    let mut store = AnnotationStore::new();
    let id = store
        .add(Draft::Area(Bounds::new(60.0, 10.0, 30.0, 30.0)), "B")
        .unwrap();
    let anchor = store.get(id).unwrap().shape.anchor();
    assert_eq!(anchor, Point::new(75.0, 25.0));
}

#[test]
fn undersized_area_is_rejected_without_mutation() {
    let mut store = AnnotationStore::new();
    let err = store
        .add(Draft::Area(Bounds::new(10.0, 10.0, 0.5, 40.0)), "thin")
        .unwrap_err();
    assert!(matches!(err, PinpointError::DegenerateGeometry { .. }));
    assert!(store.is_empty());

    let zero = Bounds::from_corners(Point::new(10.0, 10.0), Point::new(10.0, 50.0));
    assert!(store.add(Draft::Area(zero), "zero").is_err());
    assert!(store.is_empty());

    let ok = Bounds::new(10.0, 10.0, MIN_AREA_EXTENT_PCT, MIN_AREA_EXTENT_PCT);
    assert!(store.add(Draft::Area(ok), "tiny").is_ok());
}

#[test]
fn area_outside_image_is_clipped_before_the_size_check() {
    let mut store = AnnotationStore::new();
    let err = store.add(Draft::Area(Bounds::new(99.5, 0.0, 20.0, 20.0)), "edge");
    assert!(err.is_err());

    let id = store
        .add(Draft::Area(Bounds::new(90.0, -10.0, 20.0, 30.0)), "corner")
        .unwrap();
    let Shape::Area { bounds, .. } = store.get(id).unwrap().shape else {
        panic!("expected area");
    };
    assert_eq!(bounds, Bounds::new(90.0, 0.0, 10.0, 20.0));
}

#[test]
fn corners_normalize_in_any_drag_direction() {
    let b = Bounds::from_corners(Point::new(80.0, 60.0), Point::new(20.0, 10.0));
    assert_eq!(b, Bounds::new(20.0, 10.0, 60.0, 50.0));
}

#[test]
fn points_are_clamped_into_the_image() {
    let mut store = AnnotationStore::new();
    let id = store.add(point(-5.0, 140.0), "").unwrap();
    assert_eq!(store.get(id).unwrap().shape, Shape::Point { x: 0.0, y: 100.0 });
    assert!(store.add(point(f64::NAN, 1.0), "").is_err());
}

#[test]
fn remove_and_update_description() {
    let mut store = AnnotationStore::new();
    let a = store.add(point(1.0, 1.0), "one").unwrap();
    let b = store.add(point(2.0, 2.0), "two").unwrap();

    store.update_description(b, "deux").unwrap();
    assert_eq!(store.get(b).unwrap().description, "deux");

    let removed = store.remove(a).unwrap();
    assert_eq!(removed.description, "one");
    assert!(store.remove(a).is_none());
    assert!(store.update_description(a, "gone").is_err());

    // Ids are not reused after removal.
    let c = store.add(point(3.0, 3.0), "three").unwrap();
    assert_ne!(c, a);
}

#[test]
fn move_to_keeps_area_size_inside_image() {
    let mut store = AnnotationStore::new();
    let id = store
        .add(Draft::Area(Bounds::new(10.0, 10.0, 40.0, 20.0)), "")
        .unwrap();
    store.move_to(id, 95.0, 50.0).unwrap();
    let Shape::Area {
        bounds,
        center_x,
        center_y,
    } = store.get(id).unwrap().shape
    else {
        panic!("expected area");
    };
    assert_eq!(bounds, Bounds::new(60.0, 40.0, 40.0, 20.0));
    assert_eq!((center_x, center_y), (80.0, 50.0));

    let p = store.add(point(1.0, 1.0), "").unwrap();
    store.move_to(p, 120.0, 33.0).unwrap();
    assert_eq!(store.get(p).unwrap().shape, Shape::Point { x: 100.0, y: 33.0 });
}

#[test]
fn replace_image_clears_and_restores_markers() {
    let mut store = AnnotationStore::new();
    store.add(point(1.0, 1.0), "").unwrap();
    store.set_markers_visible(false);
    assert!(!store.markers_visible());

    store.replace_image();
    assert!(store.is_empty());
    assert!(store.markers_visible());
}

#[test]
fn snapshot_is_detached_from_later_edits() {
    let mut store = AnnotationStore::new();
    let id = store.add(point(1.0, 1.0), "before").unwrap();
    let snapshot = store.annotations();
    store.update_description(id, "after").unwrap();
    assert_eq!(snapshot[0].description, "before");
}

#[test]
fn shape_kind_names_each_variant() {
    let mut store = AnnotationStore::new();
    let p = store.add(point(5.0, 5.0), "p").unwrap();
    let a = store
        .add(Draft::Area(Bounds::new(10.0, 10.0, 20.0, 20.0)), "a")
        .unwrap();
    assert_eq!(store.get(p).map(|x| x.shape.kind()), Some("point"));
    assert_eq!(store.get(a).map(|x| x.shape.kind()), Some("area"));
}
