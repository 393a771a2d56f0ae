use super::*;

#[test]
fn numbers_are_trimmed() {
    assert_eq!(css_number(2.0), "2");
    assert_eq!(css_number(2.25), "2.25");
    assert_eq!(css_number(1.0 / 3.0), "0.3333");
    assert_eq!(css_number(-0.00001), "0");
    assert_eq!(css_number(0.0), "0");
}

#[test]
fn resting_styles() {
    let stage = CssStage::new();
    assert_eq!(stage.styles().transform, "scale(1)");
    assert_eq!(stage.styles().transform_origin, "50% 50%");
    assert_eq!(stage.styles().caption_display, "none");
}

#[test]
fn focus_and_caption_become_style_strings() {
    let mut stage = CssStage::new();
    stage.apply_focus(FocalTransform {
        scale: 2.25,
        origin_x: 30.0,
        origin_y: 20.5,
    });
    stage.show_caption(&Caption {
        text: "Hel".to_owned(),
        opacity: 0.5,
        visible: true,
    });
    let s = stage.styles();
    assert_eq!(s.transform, "scale(2.25)");
    assert_eq!(s.transform_origin, "30% 20.5%");
    assert_eq!(s.caption_opacity, "0.5");
    assert_eq!(s.caption_display, "block");
    assert_eq!(s.caption_text, "Hel");
    assert_eq!(stage.updates(), 2);

    stage.show_caption(&Caption::hidden());
    assert_eq!(stage.styles().caption_display, "none");
    assert!(stage.styles().caption_text.is_empty());
}

#[test]
fn unchanged_writes_are_not_counted() {
    let mut stage = CssStage::new();
    stage.apply_focus(FocalTransform::IDENTITY);
    stage.show_caption(&Caption::hidden());
    assert_eq!(stage.updates(), 0);
}
