use super::*;
use crate::foundation::core::Fps;
use crate::timeline::clock::FrameTicks;

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

#[test]
fn progress_is_clamped_and_monotonic() {
    let mut r = TimelineRun::new(ms(1000), ms(1000), Ease::Linear);
    assert_eq!(r.tick(ms(500)).unwrap().raw, 0.0);
    assert_eq!(r.tick(ms(1500)).unwrap().raw, 0.5);
    // An earlier sample never moves progress backwards.
    assert_eq!(r.tick(ms(1200)).unwrap().raw, 0.5);
    assert_eq!(r.status(), RunStatus::Running);
    let last = r.tick(ms(9000)).unwrap();
    assert_eq!(last.raw, 1.0);
    assert_eq!(last.at, ms(2000));
    assert_eq!(r.status(), RunStatus::Completed);
    assert!(r.tick(ms(9001)).is_none());
}

#[test]
fn eased_progress_uses_the_run_curve() {
    let mut r = TimelineRun::new(Duration::ZERO, ms(1000), Ease::InOutCubic);
    let t = r.tick(ms(250)).unwrap();
    assert!((t.eased - 0.0625).abs() < 1e-12);
    assert_eq!(r.end(), ms(1000));
}

#[test]
fn zero_duration_completes_on_first_tick() {
    let mut r = TimelineRun::timer(ms(10), Duration::ZERO);
    let t = r.tick(ms(10)).unwrap();
    assert_eq!(t.raw, 1.0);
    assert_eq!(r.status(), RunStatus::Completed);
}

#[test]
fn cancel_is_idempotent_and_silences_ticks() {
    let mut r = TimelineRun::timer(Duration::ZERO, ms(100));
    assert!(r.tick(ms(10)).is_some());
    assert!(r.cancel());
    assert!(!r.cancel());
    assert_eq!(r.status(), RunStatus::Cancelled);
    assert!(r.tick(ms(50)).is_none());
}

#[test]
fn run_emits_ticks_until_completion() {
    let mut ticks = FrameTicks::new(Fps::whole(10).unwrap());
    let mut seen = Vec::new();
    let status = run(ms(500), Ease::Linear, &mut ticks, &CancelToken::new(), |t| {
        seen.push(t.raw)
    });
    assert_eq!(status, RunStatus::Completed);
    assert_eq!(seen.len(), 6);
    assert_eq!(seen.first().copied(), Some(0.0));
    assert_eq!(seen.last().copied(), Some(1.0));
}

#[test]
fn run_stops_after_cancel_without_more_ticks() {
    let cancel = CancelToken::new();
    let mut ticks = FrameTicks::new(Fps::whole(10).unwrap());
    let mut count = 0;
    let status = run(ms(1000), Ease::Linear, &mut ticks, &cancel, |_| {
        count += 1;
        if count == 3 {
            cancel.cancel();
        }
    });
    assert_eq!(status, RunStatus::Cancelled);
    assert_eq!(count, 3);
}

#[test]
fn run_reports_running_when_ticks_run_out() {
    let mut ticks = vec![ms(0), ms(100)].into_iter();
    let status = run(ms(1000), Ease::Linear, &mut ticks, &CancelToken::new(), |_| {});
    assert_eq!(status, RunStatus::Running);
}
