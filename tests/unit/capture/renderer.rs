use super::*;
use crate::annotation::model::AnnotationId;
use crate::foundation::core::Fps;

const BG: [u8; 4] = [10, 20, 30, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];

fn scene(annotations: Vec<Annotation>) -> Arc<CaptureScene> {
    let target = RenderTarget::new(64, 36, Fps::whole(30).unwrap(), 1_000_000).unwrap();
    let mut config = CaptureConfig::with_target(target);
    config.background = BG;
    let image = SourceImage::solid(32, 32, BLUE).unwrap();
    CaptureScene::new(&config, image, annotations).unwrap()
}

fn near(a: [u8; 4], b: [u8; 4]) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| x.abs_diff(*y) <= 2)
}

#[test]
fn letterbox_centers_and_preserves_aspect() {
    let fit = letterbox(1920, 1080, 1000, 1000);
    assert_eq!(fit, Rect::new(420.0, 0.0, 1500.0, 1080.0));

    let fit = letterbox(100, 100, 200, 100);
    assert_eq!(fit, Rect::new(0.0, 25.0, 100.0, 75.0));
}

#[test]
fn resting_frame_shows_image_and_background_bars() {
    let mut r = CaptureRenderer::new(scene(Vec::new()));
    assert_eq!(r.scene().fit_rect(), Rect::new(14.0, 0.0, 50.0, 36.0));

    let frame = r.render(&FrameSnapshot::still()).unwrap();
    assert_eq!((frame.width, frame.height), (64, 36));
    assert_eq!(frame.data.len(), 64 * 36 * 4);
    assert!(frame.premultiplied);

    assert!(near(frame.pixel(32, 18).unwrap(), BLUE));
    assert!(near(frame.pixel(2, 18).unwrap(), BG));
    assert!(near(frame.pixel(61, 18).unwrap(), BG));
    assert!(frame.pixel(64, 0).is_none());
}

#[test]
fn zoomed_image_does_not_spill_into_bars() {
    let mut r = CaptureRenderer::new(scene(Vec::new()));
    let snap = FrameSnapshot {
        focus: FocalTransform {
            scale: 3.0,
            origin_x: 50.0,
            origin_y: 50.0,
        },
        ..FrameSnapshot::still()
    };
    let frame = r.render(&snap).unwrap();
    assert!(near(frame.pixel(32, 18).unwrap(), BLUE));
    assert!(near(frame.pixel(2, 18).unwrap(), BG));
    assert!(near(frame.pixel(61, 30).unwrap(), BG));
}

#[test]
fn current_point_marker_tints_the_image() {
    let annotations = vec![Annotation {
        id: AnnotationId(1),
        shape: Shape::Point { x: 50.0, y: 50.0 },
        description: "center".to_owned(),
    }];
    let mut r = CaptureRenderer::new(scene(annotations));
    let snap = FrameSnapshot {
        current: Some(0),
        ..FrameSnapshot::still()
    };
    let px = r.render(&snap).unwrap().pixel(32, 18).unwrap();
    assert!(px[0] > 100, "expected red tint, got {px:?}");
    assert!(px[2] < 200, "expected blue to be covered, got {px:?}");

    // Far from the marker the image is untouched.
    let px = r.render(&snap).unwrap().pixel(16, 2).unwrap();
    assert!(near(px, BLUE));
}

#[test]
fn caption_band_renders_without_font() {
    let mut r = CaptureRenderer::new(scene(Vec::new()));
    let snap = FrameSnapshot {
        caption: Caption {
            text: "hello".to_owned(),
            opacity: 1.0,
            visible: true,
        },
        ..FrameSnapshot::still()
    };
    let frame = r.render(&snap).unwrap();
    let band = frame.pixel(32, 35).unwrap();
    assert!(band[2] < 100, "expected darkened band, got {band:?}");
    assert!(near(frame.pixel(32, 10).unwrap(), BLUE));
}

#[test]
fn hidden_caption_draws_no_band() {
    let mut r = CaptureRenderer::new(scene(Vec::new()));
    let snap = FrameSnapshot {
        caption: Caption {
            text: "hello".to_owned(),
            opacity: 1.0,
            visible: false,
        },
        ..FrameSnapshot::still()
    };
    let frame = r.render(&snap).unwrap();
    assert!(near(frame.pixel(32, 35).unwrap(), BLUE));
}

#[test]
fn rendering_is_deterministic_across_calls() {
    let mut r = CaptureRenderer::new(scene(Vec::new()));
    let snap = FrameSnapshot {
        focus: FocalTransform {
            scale: 1.7,
            origin_x: 30.0,
            origin_y: 60.0,
        },
        ..FrameSnapshot::still()
    };
    let a = r.render(&snap).unwrap();
    let b = r.render(&snap).unwrap();
    assert_eq!(a, b);
}

#[test]
fn fingerprint_tracks_visual_state_only() {
    let base = FrameSnapshot {
        caption: Caption {
            text: "Hel".to_owned(),
            opacity: 1.0,
            visible: true,
        },
        current: Some(0),
        ..FrameSnapshot::still()
    };
    assert_eq!(base.fingerprint(), base.clone().fingerprint());

    let mut longer = base.clone();
    longer.caption.text.push('l');
    assert_ne!(base.fingerprint(), longer.fingerprint());

    let mut other = base.clone();
    other.current = Some(1);
    assert_ne!(base.fingerprint(), other.fingerprint());

    let hidden_a = FrameSnapshot {
        caption: Caption {
            text: "a".to_owned(),
            opacity: 0.0,
            visible: false,
        },
        ..FrameSnapshot::still()
    };
    let hidden_b = FrameSnapshot {
        caption: Caption {
            text: "b".to_owned(),
            opacity: 0.0,
            visible: false,
        },
        ..FrameSnapshot::still()
    };
    assert_eq!(hidden_a.fingerprint(), hidden_b.fingerprint());
}

#[test]
fn scene_rejects_invalid_config() {
    let target = RenderTarget {
        width: 64,
        height: 36,
        fps: Fps::whole(30).unwrap(),
        bitrate: 1_000_000,
    };
    let mut config = CaptureConfig::with_target(target);
    config.threading.threads = Some(0);
    let image = SourceImage::solid(4, 4, BLUE).unwrap();
    assert!(CaptureScene::new(&config, image, Vec::new()).is_err());
}

#[test]
fn scene_rejects_unusable_font_as_setup_error() {
    let target = RenderTarget::new(64, 36, Fps::whole(30).unwrap(), 1_000_000).unwrap();
    let mut config = CaptureConfig::with_target(target);
    config.font = Some(Arc::new(vec![0u8; 64]));
    let image = SourceImage::solid(4, 4, BLUE).unwrap();
    let err = CaptureScene::new(&config, image, Vec::new()).err().unwrap();
    assert!(matches!(err, PinpointError::CaptureSetup(_)), "{err}");
}

const FONT_CANDIDATES: &[&str] = &[
    "assets/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
];

fn font_scene() -> Option<Arc<CaptureScene>> {
    let bytes = FONT_CANDIDATES.iter().find_map(|p| std::fs::read(p).ok())?;
    let target = RenderTarget::new(640, 360, Fps::whole(30).unwrap(), 1_000_000).unwrap();
    let mut config = CaptureConfig::with_target(target);
    config.background = [0, 0, 0, 255];
    config.font = Some(Arc::new(bytes));
    let image = SourceImage::solid(32, 32, BLUE).unwrap();
    Some(CaptureScene::new(&config, image, Vec::new()).unwrap())
}

fn caption_frame(r: &mut CaptureRenderer, opacity: f64) -> FrameRGBA {
    let text = "The harbour crane in the lower left was rebuilt in 1962 after the storm, \
                and its original counterweight still sits on the quay beside the warehouse.";
    let snap = FrameSnapshot {
        caption: Caption {
            text: text.to_owned(),
            opacity,
            visible: true,
        },
        ..FrameSnapshot::still()
    };
    r.render(&snap).unwrap()
}

/// Pixels where both red and green exceed `min`; the image and background carry neither.
fn light_pixels(frame: &FrameRGBA, min: u8) -> Vec<(u32, u32)> {
    let mut out = Vec::new();
    for y in 0..frame.height {
        for x in 0..frame.width {
            let [r, g, _, _] = frame.pixel(x, y).unwrap();
            if r > min && g > min {
                out.push((x, y));
            }
        }
    }
    out
}

#[test]
fn caption_text_is_wrapped_centered_and_inside_the_band() {
    let Some(scene) = font_scene() else {
        return;
    };
    let mut r = CaptureRenderer::new(scene);
    let frame = caption_frame(&mut r, 1.0);
    let text = light_pixels(&frame, 200);
    assert!(!text.is_empty());

    let min_x = text.iter().map(|p| p.0).min().unwrap();
    let max_x = text.iter().map(|p| p.0).max().unwrap();
    let min_y = text.iter().map(|p| p.1).min().unwrap();
    let max_y = text.iter().map(|p| p.1).max().unwrap();

    // 80% of 640 px, centered: [64, 576], with a pixel of antialiasing slack.
    assert!(min_x >= 62 && max_x <= 578, "x range {min_x}..{max_x}");
    let center = f64::from(min_x + max_x) / 2.0;
    assert!((center - 320.0).abs() <= 16.0, "text center {center}");

    // Bottom band; the long caption wraps onto a second line.
    assert!(min_y >= 300, "text starts at y={min_y}");
    assert!(max_y < 360);
    assert!(max_y - min_y > 14, "single line: {min_y}..{max_y}");
}

#[test]
fn caption_opacity_dims_the_text() {
    let Some(scene) = font_scene() else {
        return;
    };
    let mut r = CaptureRenderer::new(scene);
    let half = caption_frame(&mut r, 0.5);
    assert!(light_pixels(&half, 200).is_empty());
    assert!(!light_pixels(&half, 90).is_empty());

    let full = caption_frame(&mut r, 1.0);
    assert!(!light_pixels(&full, 200).is_empty());
}
