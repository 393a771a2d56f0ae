use super::*;

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

#[test]
fn coupled_len_runs_ahead_of_progress() {
    assert_eq!(coupled_len(10, 0.4, 1.5), 6);
    assert_eq!(coupled_len(7, 0.4, 1.5), 4);
    assert_eq!(coupled_len(10, 0.0, 1.5), 0);
    assert_eq!(coupled_len(10, 0.7, 1.5), 10);
    assert_eq!(coupled_len(0, 0.5, 1.5), 0);
}

#[test]
fn progress_coupled_shows_full_text_after_zoom_in() {
    let mut r = TextReveal::new(RevealMode::ProgressCoupled, 1.5, ms(50));
    r.begin("Hello world", ms(0));
    assert_eq!(r.advance(ms(400), Some(0.4)), 6);
    assert_eq!(r.visible(), "Hello ");
    assert_eq!(r.advance(ms(1500), None), 11);
    assert!(r.is_complete());
}

#[test]
fn typewriter_shows_first_char_immediately_then_one_per_interval() {
    let mut r = TextReveal::new(RevealMode::Typewriter, 1.5, ms(50));
    r.begin("abcdef", ms(1000));
    assert_eq!(r.advance(ms(1000), Some(0.0)), 1);
    assert_eq!(r.advance(ms(1049), Some(0.05)), 1);
    assert_eq!(r.advance(ms(1050), Some(0.05)), 2);
    assert_eq!(r.advance(ms(1120), None), 3);
    assert_eq!(r.advance(ms(9000), None), 6);
    assert_eq!(r.visible(), "abcdef");
}

#[test]
fn begin_restarts_from_empty() {
    let mut r = TextReveal::new(RevealMode::Typewriter, 1.5, ms(50));
    r.begin("first", ms(0));
    r.advance(ms(1000), None);
    r.begin("second", ms(2000));
    assert_eq!(r.cursor(), 0);
    assert_eq!(r.visible(), "");
}

#[test]
fn cursor_never_moves_backwards() {
    let mut r = TextReveal::new(RevealMode::ProgressCoupled, 1.5, ms(50));
    r.begin("0123456789", ms(0));
    r.advance(ms(0), Some(0.5));
    assert_eq!(r.advance(ms(0), Some(0.1)), 7);
}

#[test]
fn prefix_respects_char_boundaries() {
    assert_eq!(revealed_prefix("héllo", 2), "hé");
    assert_eq!(revealed_prefix("日本語", 1), "日");
    assert_eq!(revealed_prefix("abc", 10), "abc");
    assert_eq!(revealed_prefix("abc", 0), "");
}

#[test]
fn clear_and_complete() {
    let mut r = TextReveal::new(RevealMode::Typewriter, 1.5, ms(50));
    r.begin("abc", ms(0));
    r.complete();
    assert_eq!(r.visible(), "abc");
    r.clear();
    assert_eq!((r.cursor(), r.visible()), (0, ""));
}
