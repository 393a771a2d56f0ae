use std::time::Duration;

use crate::geometry::resolver::FocalTransform;
use crate::presentation::presenter::{Caption, Stage};
use crate::presentation::state::PlaybackState;

/// Inline style values for the presented image and its description container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CssStyles {
    /// `transform` of the image element.
    pub transform: String,
    /// `transform-origin` of the image element.
    pub transform_origin: String,
    /// `opacity` of the description container.
    pub caption_opacity: String,
    /// `display` of the description container.
    pub caption_display: String,
    /// Text content of the description container.
    pub caption_text: String,
}

impl Default for CssStyles {
    fn default() -> Self {
        let mut styles = Self {
            transform: String::new(),
            transform_origin: String::new(),
            caption_opacity: "0".to_owned(),
            caption_display: "none".to_owned(),
            caption_text: String::new(),
        };
        styles.set_focus(FocalTransform::IDENTITY);
        styles
    }
}

impl CssStyles {
    fn set_focus(&mut self, focus: FocalTransform) {
        self.transform = format!("scale({})", css_number(focus.scale));
        self.transform_origin = format!(
            "{}% {}%",
            css_number(focus.origin_x),
            css_number(focus.origin_y)
        );
    }
}

/// [`Stage`] for a DOM-like view: keeps focal transforms and captions as CSS property values.
#[derive(Debug, Default)]
pub struct CssStage {
    styles: CssStyles,
    updates: u64,
}

impl CssStage {
    /// Stage at the resting view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current style values.
    pub fn styles(&self) -> &CssStyles {
        &self.styles
    }

    /// Number of style writes that changed a value.
    pub fn updates(&self) -> u64 {
        self.updates
    }

    fn commit(&mut self, next: CssStyles) {
        if next != self.styles {
            self.styles = next;
            self.updates += 1;
            tracing::trace!(
                transform = %self.styles.transform,
                origin = %self.styles.transform_origin,
                opacity = %self.styles.caption_opacity,
                "style update"
            );
        }
    }
}

impl Stage for CssStage {
    fn apply_focus(&mut self, focus: FocalTransform) {
        let mut next = self.styles.clone();
        next.set_focus(focus);
        self.commit(next);
    }

    fn show_caption(&mut self, caption: &Caption) {
        let mut next = self.styles.clone();
        if caption.visible {
            next.caption_display = "block".to_owned();
            next.caption_opacity = css_number(caption.opacity.clamp(0.0, 1.0));
            next.caption_text.clone_from(&caption.text);
        } else {
            next.caption_display = "none".to_owned();
            next.caption_opacity = "0".to_owned();
            next.caption_text.clear();
        }
        self.commit(next);
    }

    fn phase_changed(&mut self, at: Duration, state: &PlaybackState) {
        tracing::info!(
            at_ms = at.as_millis() as u64,
            phase = %state.phase,
            index = state.current_index,
            transform = %self.styles.transform,
            origin = %self.styles.transform_origin,
            "phase"
        );
    }
}

/// Format a CSS number with at most four decimals and no trailing zeros.
fn css_number(v: f64) -> String {
    let s = format!("{v:.4}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" || s.is_empty() {
        "0".to_owned()
    } else {
        s.to_owned()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/presentation/css.rs"]
mod tests;
