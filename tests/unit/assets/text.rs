use super::*;

const FONT_CANDIDATES: &[&str] = &[
    "assets/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
];

fn local_font() -> Option<Vec<u8>> {
    FONT_CANDIDATES.iter().find_map(|p| std::fs::read(p).ok())
}

#[test]
fn wrapped_layout_breaks_long_text() {
    let Some(bytes) = local_font() else {
        return;
    };
    let mut engine = TextLayoutEngine::new(Arc::new(bytes));
    let layout = engine
        .layout_wrapped(
            "a fairly long caption that cannot fit on one narrow line",
            20.0,
            TextBrushRgba8::WHITE,
            120.0,
        )
        .unwrap();
    let extents = line_extents(&layout);
    assert!(extents.len() > 1);
    assert!(extents.iter().all(|e| e.width <= 140.0));
}

#[test]
fn rejects_bad_size_and_bad_font() {
    let mut engine = TextLayoutEngine::new(Arc::new(vec![0u8; 16]));
    assert!(
        engine
            .layout_wrapped("x", 0.0, TextBrushRgba8::WHITE, 100.0)
            .is_err()
    );
    assert!(
        engine
            .layout_wrapped("x", 12.0, TextBrushRgba8::WHITE, 100.0)
            .is_err()
    );
}
