use super::*;

#[test]
fn frame_ticks_are_exact() {
    let mut t = FrameTicks::new(Fps::whole(60).unwrap()).with_limit(61);
    let all: Vec<_> = std::iter::from_fn(|| t.next_tick()).collect();
    assert_eq!(all.len(), 61);
    assert_eq!(all[0], Duration::ZERO);
    assert_eq!(all[60], Duration::from_secs(1));
    assert_eq!(t.next_frame(), FrameIndex(61));
}

#[test]
fn realtime_ticks_advance_with_wall_clock() {
    let mut t = RealtimeTicks::new(Duration::from_millis(2));
    let a = t.next_tick().unwrap();
    let b = t.next_tick().unwrap();
    assert!(b > a);
    assert!(b >= Duration::from_millis(2));
}

#[test]
fn realtime_ticks_skip_missed_boundaries() {
    let mut t = RealtimeTicks::new(Duration::from_millis(1));
    let _ = t.next_tick();
    std::thread::sleep(Duration::from_millis(20));
    let _ = t.next_tick();
    assert!(t.skipped() > 0);
}

#[test]
fn cancel_token_is_shared_between_clones() {
    let a = CancelToken::new();
    let b = a.clone();
    assert!(!b.is_cancelled());
    a.cancel();
    a.cancel();
    assert!(b.is_cancelled());
}
