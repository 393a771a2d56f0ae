use crate::annotation::model::{Annotation, Shape};
use crate::foundation::core::{Affine, Point, Rect, Vec2};
use crate::foundation::error::{PinpointError, PinpointResult};
use crate::foundation::math::lerp;

/// Default magnification used for point annotations.
pub const DEFAULT_ZOOM_SCALE: f64 = 2.0;
/// Default fraction of the view an area fills once framed.
pub const DEFAULT_AREA_PADDING: f64 = 0.9;

/// Where and how far to zoom to frame one annotation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FocusTarget {
    /// Focal point, horizontal, in percent of the image.
    pub origin_x: f64,
    /// Focal point, vertical, in percent of the image.
    pub origin_y: f64,
    /// Scale at the end of the zoom-in.
    pub target_scale: f64,
}

/// Current zoom state: a uniform scale about a focal origin given in image percent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FocalTransform {
    /// Uniform scale factor; `1.0` is the resting view.
    pub scale: f64,
    /// Origin, horizontal, in percent of the image.
    pub origin_x: f64,
    /// Origin, vertical, in percent of the image.
    pub origin_y: f64,
}

impl Default for FocalTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl FocalTransform {
    /// Resting view: unscaled, origin at the image center.
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        origin_x: 50.0,
        origin_y: 50.0,
    };

    /// Interpolate from the resting scale towards `target` at eased progress `t`.
    ///
    /// The origin jumps to the focal point immediately; at scale 1 that is invisible.
    pub fn toward(target: FocusTarget, t: f64) -> Self {
        Self {
            scale: lerp(1.0, target.target_scale, t),
            origin_x: target.origin_x,
            origin_y: target.origin_y,
        }
    }

    /// Fully framed view of `target`.
    pub fn framed(target: FocusTarget) -> Self {
        Self::toward(target, 1.0)
    }

    /// `true` for the resting view.
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Pixel-space affine for an image drawn into `frame`.
    ///
    /// The percent origin is mapped into `frame`, and the transform scales about that pixel.
    pub fn affine_in(&self, frame: Rect) -> Affine {
        let origin = Point::new(
            frame.x0 + self.origin_x / 100.0 * frame.width(),
            frame.y0 + self.origin_y / 100.0 * frame.height(),
        );
        let o = origin.to_vec2();
        Affine::translate(o) * Affine::scale(self.scale) * Affine::translate(Vec2::ZERO - o)
    }
}

/// Derives focal targets for annotations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeometryResolver {
    zoom_scale: f64,
    area_padding: f64,
}

impl Default for GeometryResolver {
    fn default() -> Self {
        Self {
            zoom_scale: DEFAULT_ZOOM_SCALE,
            area_padding: DEFAULT_AREA_PADDING,
        }
    }
}

impl GeometryResolver {
    /// Create a resolver; `zoom_scale` must exceed 1 and `area_padding` lie in `(0, 1]`.
    pub fn new(zoom_scale: f64, area_padding: f64) -> PinpointResult<Self> {
        if !zoom_scale.is_finite() || zoom_scale <= 1.0 {
            return Err(PinpointError::validation("zoomScale must be finite and > 1"));
        }
        if !area_padding.is_finite() || area_padding <= 0.0 || area_padding > 1.0 {
            return Err(PinpointError::validation("areaPadding must be in (0, 1]"));
        }
        Ok(Self {
            zoom_scale,
            area_padding,
        })
    }

    /// Configured point magnification.
    pub fn zoom_scale(&self) -> f64 {
        self.zoom_scale
    }

    /// Configured area padding factor.
    pub fn area_padding(&self) -> f64 {
        self.area_padding
    }

    /// Compute the focal target for one annotation.
    ///
    /// Areas use the smaller of the two per-axis magnifications so the whole region stays
    /// visible. Zero-extent areas fail with [`PinpointError::DegenerateGeometry`].
    pub fn resolve_focus(&self, annotation: &Annotation) -> PinpointResult<FocusTarget> {
        match annotation.shape {
            Shape::Point { x, y } => Ok(FocusTarget {
                origin_x: x,
                origin_y: y,
                target_scale: self.zoom_scale,
            }),
            Shape::Area {
                center_x,
                center_y,
                bounds,
            } => {
                let (w, h) = (bounds.width, bounds.height);
                if !(w.is_finite() && h.is_finite()) || w <= 0.0 || h <= 0.0 {
                    return Err(PinpointError::DegenerateGeometry {
                        width: w,
                        height: h,
                    });
                }
                Ok(FocusTarget {
                    origin_x: center_x,
                    origin_y: center_y,
                    target_scale: (100.0 / w).min(100.0 / h) * self.area_padding,
                })
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/resolver.rs"]
mod tests;
