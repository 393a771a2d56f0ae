use std::sync::Arc;

use crate::foundation::error::{PinpointError, PinpointResult};

/// RGBA8 brush color carried through Parley layouts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct TextBrushRgba8 {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl TextBrushRgba8 {
    pub(crate) const WHITE: Self = Self {
        r: 255,
        g: 255,
        b: 255,
        a: 255,
    };
}

/// Horizontal extent of one laid-out line, in layout pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct LineExtent {
    pub(crate) left: f32,
    pub(crate) width: f32,
}

/// Parley layout helper bound to one caption font.
///
/// The font is registered on first use and reused for every later layout.
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    font_bytes: Arc<Vec<u8>>,
    family: Option<String>,
}

impl TextLayoutEngine {
    pub(crate) fn new(font_bytes: Arc<Vec<u8>>) -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            font_bytes,
            family: None,
        }
    }

    /// Raw font bytes, shared with the glyph renderer.
    pub(crate) fn font_bytes(&self) -> &Arc<Vec<u8>> {
        &self.font_bytes
    }

    /// Shape `text` and wrap it at `max_width_px`.
    pub(crate) fn layout_wrapped(
        &mut self,
        text: &str,
        size_px: f32,
        brush: TextBrushRgba8,
        max_width_px: f32,
    ) -> PinpointResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(PinpointError::validation(
                "text size_px must be finite and > 0",
            ));
        }
        let family_name = self.family()?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(Some(max_width_px.max(1.0)));
        Ok(layout)
    }

    /// Register the font bytes (once) and return the family name layouts use.
    pub(crate) fn family(&mut self) -> PinpointResult<String> {
        if let Some(name) = &self.family {
            return Ok(name.clone());
        }
        let families = self.font_ctx.collection.register_fonts(
            parley::fontique::Blob::from(self.font_bytes.as_ref().clone()),
            None,
        );
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            PinpointError::validation("no font families registered from font bytes")
        })?;
        let name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| PinpointError::validation("registered font family has no name"))?
            .to_string();
        self.family = Some(name.clone());
        Ok(name)
    }
}

/// Extent of every line, used to center lines manually.
pub(crate) fn line_extents(layout: &parley::Layout<TextBrushRgba8>) -> Vec<LineExtent> {
    layout
        .lines()
        .map(|line| {
            let mut left = f32::INFINITY;
            let mut right = f32::NEG_INFINITY;
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                left = left.min(run.offset());
                right = right.max(run.offset() + run.advance());
            }
            if left.is_finite() && right.is_finite() {
                LineExtent {
                    left,
                    width: right - left,
                }
            } else {
                LineExtent {
                    left: 0.0,
                    width: 0.0,
                }
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/assets/text.rs"]
mod tests;
