use super::*;

#[test]
fn fps_rejects_zero_parts() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
    assert_eq!(Fps::whole(24).unwrap().as_f64(), 24.0);
}

#[test]
fn frame_time_is_exact_at_whole_seconds() {
    let fps = Fps::whole(60).unwrap();
    assert_eq!(fps.frame_time(FrameIndex(0)), Duration::ZERO);
    assert_eq!(fps.frame_time(FrameIndex(60)), Duration::from_secs(1));
    assert_eq!(fps.frame_time(FrameIndex(6000)), Duration::from_secs(100));
    // 1/60 s floors to whole nanoseconds.
    assert_eq!(fps.frame_time(FrameIndex(1)), Duration::from_nanos(16_666_666));
}

#[test]
fn frame_time_handles_ntsc_rates() {
    let fps = Fps::new(30000, 1001).unwrap();
    assert_eq!(fps.frame_time(FrameIndex(30000)), Duration::from_millis(1_001_000));
}

#[test]
fn frames_covering_rounds_up() {
    let fps = Fps::whole(30).unwrap();
    assert_eq!(fps.frames_covering(Duration::ZERO), 0);
    assert_eq!(fps.frames_covering(Duration::from_millis(500)), 15);
    assert_eq!(fps.frames_covering(Duration::from_millis(501)), 16);
}
