use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use kurbo::Shape as _;

use crate::annotation::model::{Annotation, Shape};
use crate::assets::image::SourceImage;
use crate::assets::text::{TextBrushRgba8, TextLayoutEngine, line_extents};
use crate::capture::config::{CaptureConfig, RenderTarget};
use crate::foundation::core::{Affine, BezPath, Circle, Point, Rect, Vec2};
use crate::foundation::error::{PinpointError, PinpointResult};
use crate::foundation::math::{Fnv1a64, scale_alpha};
use crate::geometry::resolver::FocalTransform;
use crate::presentation::presenter::Caption;

const MARKER_RADIUS_1080: f64 = 15.0;
const MARKER_STROKE_1080: f64 = 3.0;
const CURRENT_FILL: [u8; 4] = [255, 0, 0, 128];
const OTHER_FILL: [u8; 4] = [200, 200, 200, 128];
const AREA_FILL_ALPHA: f64 = 0.4;
const BAND_RGBA: [u8; 4] = [0, 0, 0, 204];

/// A rendered frame in RGBA8.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Raw RGBA bytes at `(x, y)`, or `None` out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + x as usize) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// Everything needed to draw one output frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameSnapshot {
    /// Zoom applied to the image and markers.
    pub focus: FocalTransform,
    /// Description overlay.
    pub caption: Caption,
    /// Emphasized annotation, if any.
    pub current: Option<usize>,
}

impl FrameSnapshot {
    /// Resting frame used for lead-in and lead-out.
    pub fn still() -> Self {
        Self::default()
    }

    /// Hash of the visual state; equal fingerprints draw identical pixels.
    pub fn fingerprint(&self) -> u64 {
        let mut h = Fnv1a64::new_default();
        h.write_f64(self.focus.scale);
        h.write_f64(self.focus.origin_x);
        h.write_f64(self.focus.origin_y);
        h.write_u8(u8::from(self.caption.visible));
        if self.caption.visible {
            h.write_f64(self.caption.opacity);
            h.write_str(&self.caption.text);
        }
        match self.current {
            Some(i) => {
                h.write_u8(1);
                h.write_u64(i as u64);
            }
            None => h.write_u8(0),
        }
        h.finish()
    }
}

/// Read-only inputs shared by every renderer of one recording.
pub struct CaptureScene {
    target: RenderTarget,
    background: [u8; 4],
    image: SourceImage,
    pixmap: Arc<vello_cpu::Pixmap>,
    annotations: Vec<Annotation>,
    font: Option<Arc<Vec<u8>>>,
    warned_no_font: AtomicBool,
}

impl CaptureScene {
    /// Validate `config` and decode the shared inputs.
    ///
    /// An unusable caption font is a [`PinpointError::CaptureSetup`] error.
    pub fn new(
        config: &CaptureConfig,
        image: SourceImage,
        annotations: Vec<Annotation>,
    ) -> PinpointResult<Arc<Self>> {
        config.validate()?;
        if let Some(bytes) = &config.font {
            TextLayoutEngine::new(Arc::clone(bytes))
                .family()
                .map_err(|e| PinpointError::capture_setup(format!("caption font: {e}")))?;
        }
        let pixmap = pixmap_from_premul_bytes(&image.rgba8_premul, image.width, image.height)?;
        Ok(Arc::new(Self {
            target: config.target,
            background: config.background,
            image,
            pixmap: Arc::new(pixmap),
            annotations,
            font: config.font.clone(),
            warned_no_font: AtomicBool::new(false),
        }))
    }

    /// Output surface and rate.
    pub fn target(&self) -> &RenderTarget {
        &self.target
    }

    /// Where the image sits on the output surface at rest.
    pub fn fit_rect(&self) -> Rect {
        letterbox(
            self.target.width,
            self.target.height,
            self.image.width,
            self.image.height,
        )
    }
}

/// Aspect-preserving fit of an image into a surface, centered.
pub fn letterbox(surface_w: u32, surface_h: u32, image_w: u32, image_h: u32) -> Rect {
    let (sw, sh) = (f64::from(surface_w), f64::from(surface_h));
    let (iw, ih) = (f64::from(image_w.max(1)), f64::from(image_h.max(1)));
    let fit = (sw / iw).min(sh / ih);
    let (w, h) = (iw * fit, ih * fit);
    let x0 = (sw - w) / 2.0;
    let y0 = (sh - h) / 2.0;
    Rect::new(x0, y0, x0 + w, y0 + h)
}

/// Offscreen compositor for capture frames. One instance per worker thread.
pub struct CaptureRenderer {
    scene: Arc<CaptureScene>,
    ctx: Option<vello_cpu::RenderContext>,
    image_paint: vello_cpu::Image,
    text: Option<(TextLayoutEngine, vello_cpu::peniko::FontData)>,
}

impl CaptureRenderer {
    /// Renderer with its own drawing context.
    pub fn new(scene: Arc<CaptureScene>) -> Self {
        let image_paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::clone(&scene.pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        let text = scene.font.as_ref().map(|bytes| {
            let engine = TextLayoutEngine::new(Arc::clone(bytes));
            let font = vello_cpu::peniko::FontData::new(
                vello_cpu::peniko::Blob::from(engine.font_bytes().as_ref().clone()),
                0,
            );
            (engine, font)
        });
        Self {
            scene,
            ctx: None,
            image_paint,
            text,
        }
    }

    /// Shared scene inputs.
    pub fn scene(&self) -> &Arc<CaptureScene> {
        &self.scene
    }

    /// Draw one frame: letterboxed image under the focal transform, markers, caption band.
    pub fn render(&mut self, snap: &FrameSnapshot) -> PinpointResult<FrameRGBA> {
        let target = self.scene.target;
        let w: u16 = target
            .width
            .try_into()
            .map_err(|_| PinpointError::evaluation("target width exceeds u16"))?;
        let h: u16 = target
            .height
            .try_into()
            .map_err(|_| PinpointError::evaluation("target height exceeds u16"))?;

        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == w && ctx.height() == h => ctx,
            _ => vello_cpu::RenderContext::new(w, h),
        };
        ctx.reset();
        let out = self.draw(&mut ctx, snap, w, h);
        self.ctx = Some(ctx);
        out
    }

    fn draw(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        snap: &FrameSnapshot,
        w: u16,
        h: u16,
    ) -> PinpointResult<FrameRGBA> {
        let scene = Arc::clone(&self.scene);
        let surface = Rect::new(0.0, 0.0, f64::from(w), f64::from(h));
        let fit = scene.fit_rect();
        let focal = snap.focus.affine_in(fit);
        let fit_scale = fit.width() / f64::from(scene.image.width.max(1));

        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        fill_rect(ctx, Affine::IDENTITY, surface, scene.background);

        let image_tr = focal
            * Affine::translate(Vec2::new(fit.x0, fit.y0))
            * Affine::scale(fit_scale);
        ctx.set_transform(affine_to_cpu(image_tr));
        ctx.set_paint(self.image_paint.clone());
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(scene.image.width),
            f64::from(scene.image.height),
        ));

        self.draw_markers(ctx, &scene, snap, fit, focal, f64::from(h));

        // The zoomed image must not spill into the letterbox bars.
        for bar in letterbox_bars(surface, fit) {
            fill_rect(ctx, Affine::IDENTITY, bar, scene.background);
        }

        if snap.caption.visible && snap.caption.opacity > 0.0 {
            self.draw_caption(ctx, &scene, &snap.caption, surface)?;
        }

        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        ctx.render_to_pixmap(&mut pixmap);
        Ok(FrameRGBA {
            width: u32::from(w),
            height: u32::from(h),
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }

    fn draw_markers(
        &self,
        ctx: &mut vello_cpu::RenderContext,
        scene: &CaptureScene,
        snap: &FrameSnapshot,
        fit: Rect,
        focal: Affine,
        surface_h: f64,
    ) {
        let unit = surface_h / 1080.0;
        let radius = (MARKER_RADIUS_1080 * unit).max(4.0);
        let stroke_w = (MARKER_STROKE_1080 * unit).max(1.0);
        let to_px = |x: f64, y: f64| {
            focal
                * Point::new(
                    fit.x0 + x / 100.0 * fit.width(),
                    fit.y0 + y / 100.0 * fit.height(),
                )
        };

        for (i, a) in scene.annotations.iter().enumerate() {
            let current = snap.current == Some(i);
            let fill = if current { CURRENT_FILL } else { OTHER_FILL };
            let stroke = [255, 0, 0, if current { 255 } else { 128 }];
            let half = stroke_w / 2.0;
            match a.shape {
                Shape::Point { x, y } => {
                    let c = to_px(x, y);
                    fill_path(ctx, &Circle::new(c, radius).to_path(0.1), fill);
                    let ring = ring_path(
                        Circle::new(c, radius + half).to_path(0.1),
                        Circle::new(c, (radius - half).max(0.0)).to_path(0.1),
                        c,
                    );
                    fill_path(ctx, &ring, stroke);
                }
                Shape::Area { bounds, .. } => {
                    let rect = Rect::from_points(
                        to_px(bounds.left, bounds.top),
                        to_px(bounds.right(), bounds.bottom()),
                    );
                    let mut area_fill = fill;
                    area_fill[3] = scale_alpha(fill[3], AREA_FILL_ALPHA);
                    fill_rect(ctx, Affine::IDENTITY, rect, area_fill);
                    let inner = rect.inflate(-half, -half);
                    let inner = if inner.width() > 0.0 && inner.height() > 0.0 {
                        inner.to_path(0.1)
                    } else {
                        BezPath::new()
                    };
                    let outer = rect.inflate(half, half).to_path(0.1);
                    let ring = ring_path(outer, inner, rect.center());
                    fill_path(ctx, &ring, stroke);
                }
            }
        }
    }

    fn draw_caption(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        scene: &CaptureScene,
        caption: &Caption,
        surface: Rect,
    ) -> PinpointResult<()> {
        let font_px = (surface.height() / 30.0).floor().max(1.0);
        let max_w = surface.width() * 0.8;

        let layout = match self.text.as_mut() {
            Some((engine, _)) if !caption.text.is_empty() => Some(engine.layout_wrapped(
                &caption.text,
                font_px as f32,
                TextBrushRgba8::WHITE,
                max_w as f32,
            )?),
            Some(_) => None,
            None => {
                if !scene.warned_no_font.swap(true, Ordering::Relaxed) {
                    tracing::warn!("no caption font configured; captions render without text");
                }
                None
            }
        };

        let text_h = layout.as_ref().map_or(0.0, |l| f64::from(l.height()));
        let band_h = (3.0 * font_px).max(text_h + font_px);
        let band = Rect::new(0.0, surface.y1 - band_h, surface.x1, surface.y1);
        let mut band_rgba = BAND_RGBA;
        band_rgba[3] = scale_alpha(BAND_RGBA[3], caption.opacity);
        fill_rect(ctx, Affine::IDENTITY, band, band_rgba);

        let (Some(layout), Some((_, font))) = (layout, self.text.as_ref()) else {
            return Ok(());
        };
        let top = band.y0 + (band_h - text_h) / 2.0;
        let opacity = caption.opacity.clamp(0.0, 1.0) as f32;
        if opacity < 1.0 {
            ctx.push_opacity_layer(opacity);
        }
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(255, 255, 255, 255));
        for (line, extent) in layout.lines().zip(line_extents(&layout)) {
            let dx = (surface.width() - f64::from(extent.width)) / 2.0 - f64::from(extent.left);
            ctx.set_transform(affine_to_cpu(Affine::translate(Vec2::new(dx, top))));
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        if opacity < 1.0 {
            ctx.pop_layer();
        }
        Ok(())
    }
}

/// Outline band between `outer` and `inner`, both centered on `center`.
///
/// The inner contour is mirrored about the center so its winding opposes the outer one, which
/// leaves a hole under the non-zero fill rule.
fn ring_path(outer: BezPath, inner: BezPath, center: Point) -> BezPath {
    let c = center.to_vec2();
    let mirror =
        Affine::translate(c) * Affine::scale_non_uniform(-1.0, 1.0) * Affine::translate(-c);
    let mut path = outer;
    path.extend((mirror * inner).elements().iter().copied());
    path
}

/// Parts of `surface` not covered by `fit`.
fn letterbox_bars(surface: Rect, fit: Rect) -> Vec<Rect> {
    [
        Rect::new(surface.x0, surface.y0, surface.x1, fit.y0),
        Rect::new(surface.x0, fit.y1, surface.x1, surface.y1),
        Rect::new(surface.x0, fit.y0, fit.x0, fit.y1),
        Rect::new(fit.x1, fit.y0, surface.x1, fit.y1),
    ]
    .into_iter()
    .filter(|r| r.width() > 0.0 && r.height() > 0.0)
    .collect()
}

fn fill_rect(ctx: &mut vello_cpu::RenderContext, tr: Affine, rect: Rect, rgba: [u8; 4]) {
    let [r, g, b, a] = rgba;
    ctx.set_transform(affine_to_cpu(tr));
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(rect.x0, rect.y0, rect.x1, rect.y1));
}

fn fill_path(ctx: &mut vello_cpu::RenderContext, path: &BezPath, rgba: [u8; 4]) {
    let [r, g, b, a] = rgba;
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
    ctx.fill_path(&bezpath_to_cpu(path));
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let pt = |p: Point| vello_cpu::kurbo::Point::new(p.x, p.y);
    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(pt(p)),
            PathEl::LineTo(p) => out.line_to(pt(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(pt(p1), pt(p2)),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(pt(p1), pt(p2), pt(p3)),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> PinpointResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| PinpointError::validation("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| PinpointError::validation("image height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(PinpointError::evaluation("pixmap byte len mismatch"));
    }
    // Pixmap stores PremulRgba8; the source bytes are already premultiplied.
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| {
            vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]])
        })
        .collect::<Vec<_>>();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true))
}

#[cfg(test)]
#[path = "../../tests/unit/capture/renderer.rs"]
mod tests;
