use super::*;
use crate::annotation::model::{AnnotationId, Bounds};

fn area(left: f64, top: f64, width: f64, height: f64) -> Annotation {
    Annotation {
        id: AnnotationId(1),
        shape: Shape::area(Bounds::new(left, top, width, height)),
        description: String::new(),
    }
}

fn assert_close(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-9, "{a} != {b}");
}

#[test]
fn point_uses_configured_zoom_scale() {
    let ann = Annotation {
        id: AnnotationId(1),
        shape: Shape::Point { x: 20.0, y: 30.0 },
        description: "A".to_owned(),
    };
    let focus = GeometryResolver::default().resolve_focus(&ann).unwrap();
    assert_eq!(
        focus,
        FocusTarget {
            origin_x: 20.0,
            origin_y: 30.0,
            target_scale: 2.0
        }
    );

    let wide = GeometryResolver::new(3.5, 0.9).unwrap();
    assert_eq!(wide.resolve_focus(&ann).unwrap().target_scale, 3.5);
}

#[test]
fn area_scale_uses_smaller_axis_magnification() {
    let focus = GeometryResolver::default()
        .resolve_focus(&area(10.0, 10.0, 40.0, 20.0))
        .unwrap();
    assert_close(focus.target_scale, 2.25);
    assert_close(focus.origin_x, 30.0);
    assert_close(focus.origin_y, 20.0);
}

#[test]
fn square_area_from_end_to_end_scenario() {
    let focus = GeometryResolver::default()
        .resolve_focus(&area(60.0, 10.0, 30.0, 30.0))
        .unwrap();
    assert_close(focus.origin_x, 75.0);
    assert_close(focus.origin_y, 25.0);
    assert_close(focus.target_scale, 3.0);
}

#[test]
fn zero_extent_area_is_degenerate() {
    let err = GeometryResolver::default()
        .resolve_focus(&area(10.0, 10.0, 0.0, 20.0))
        .unwrap_err();
    assert!(matches!(err, PinpointError::DegenerateGeometry { .. }));
}

#[test]
fn resolver_rejects_bad_knobs() {
    assert!(GeometryResolver::new(1.0, 0.9).is_err());
    assert!(GeometryResolver::new(2.0, 0.0).is_err());
    assert!(GeometryResolver::new(2.0, 1.5).is_err());
    assert!(GeometryResolver::new(f64::NAN, 0.9).is_err());
}

#[test]
fn toward_interpolates_scale_and_pins_origin() {
    let target = FocusTarget {
        origin_x: 20.0,
        origin_y: 30.0,
        target_scale: 3.0,
    };
    assert_eq!(FocalTransform::toward(target, 0.0).scale, 1.0);
    assert_eq!(FocalTransform::toward(target, 0.5).scale, 2.0);
    let framed = FocalTransform::framed(target);
    assert_eq!((framed.origin_x, framed.origin_y, framed.scale), (20.0, 30.0, 3.0));
    assert!(FocalTransform::default().is_identity());
}

#[test]
fn affine_keeps_focal_pixel_fixed() {
    let frame = Rect::new(100.0, 0.0, 300.0, 100.0);
    let focus = FocalTransform {
        scale: 2.0,
        origin_x: 25.0,
        origin_y: 50.0,
    };
    let a = focus.affine_in(frame);
    let origin = Point::new(150.0, 50.0);
    let mapped = a * origin;
    assert_close(mapped.x, origin.x);
    assert_close(mapped.y, origin.y);

    let right = a * Point::new(200.0, 50.0);
    assert_close(right.x, 250.0);

    assert_eq!(FocalTransform::IDENTITY.affine_in(frame), Affine::IDENTITY);
}
