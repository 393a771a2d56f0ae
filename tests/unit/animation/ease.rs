use super::*;

#[test]
fn in_out_cubic_matches_closed_form() {
    let e = Ease::InOutCubic;
    assert_eq!(e.apply(0.0), 0.0);
    assert_eq!(e.apply(1.0), 1.0);
    assert_eq!(e.apply(0.5), 0.5);
    assert!((e.apply(0.25) - 0.0625).abs() < 1e-12);
    assert!((e.apply(0.75) - 0.9375).abs() < 1e-12);
}

#[test]
fn in_out_cubic_is_monotonic() {
    let mut prev = 0.0;
    for i in 0..=100 {
        let v = Ease::InOutCubic.apply(f64::from(i) / 100.0);
        assert!(v >= prev);
        prev = v;
    }
}

#[test]
fn apply_clamps_out_of_range_progress() {
    assert_eq!(Ease::Linear.apply(-0.5), 0.0);
    assert_eq!(Ease::Linear.apply(1.5), 1.0);
    assert_eq!(Ease::InOutCubic.apply(2.0), 1.0);
}

#[test]
fn accelerated_saturates_before_the_end() {
    assert!((accelerated(0.4, 1.5) - 0.6).abs() < 1e-12);
    assert_eq!(accelerated(0.7, 1.5), 1.0);
    assert_eq!(accelerated(0.0, 1.5), 0.0);
}
