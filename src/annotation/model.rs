use crate::foundation::core::Point;

/// Smallest area extent (percent of the image, per axis) the store accepts.
pub const MIN_AREA_EXTENT_PCT: f64 = 1.0;

/// Opaque, stable identifier assigned by the [`AnnotationStore`](crate::AnnotationStore).
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct AnnotationId(pub u64);

/// Axis-aligned rectangle in percent of the displayed image (`0..=100` on both axes).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bounds {
    /// Left edge.
    pub left: f64,
    /// Top edge.
    pub top: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Bounds {
    /// Create bounds from a top-left corner and an extent.
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Normalize a rectangle dragged between two arbitrary corners.
    pub fn from_corners(a: Point, b: Point) -> Self {
        let left = a.x.min(b.x);
        let top = a.y.min(b.y);
        Self {
            left,
            top,
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Center point.
    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    /// Clip to the image (`0..=100`), keeping only the overlapping part.
    pub fn clipped(&self) -> Self {
        let left = self.left.clamp(0.0, 100.0);
        let top = self.top.clamp(0.0, 100.0);
        let right = self.right().clamp(0.0, 100.0);
        let bottom = self.bottom().clamp(0.0, 100.0);
        Self {
            left,
            top,
            width: (right - left).max(0.0),
            height: (bottom - top).max(0.0),
        }
    }

    /// `true` when both extents reach [`MIN_AREA_EXTENT_PCT`].
    pub fn meets_minimum(&self) -> bool {
        self.width.is_finite()
            && self.height.is_finite()
            && self.width >= MIN_AREA_EXTENT_PCT
            && self.height >= MIN_AREA_EXTENT_PCT
    }
}

/// Annotation geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    /// A single focal point.
    Point {
        /// Horizontal position in percent.
        x: f64,
        /// Vertical position in percent.
        y: f64,
    },
    /// A rectangular region, framed as a whole.
    Area {
        /// Horizontal center in percent.
        center_x: f64,
        /// Vertical center in percent.
        center_y: f64,
        /// Region bounds in percent.
        bounds: Bounds,
    },
}

impl Shape {
    /// Build an area shape with its center derived from `bounds`.
    pub fn area(bounds: Bounds) -> Self {
        let c = bounds.center();
        Self::Area {
            center_x: c.x,
            center_y: c.y,
            bounds,
        }
    }

    /// Focal anchor in percent: the point itself or the area center.
    pub fn anchor(&self) -> Point {
        match *self {
            Self::Point { x, y } => Point::new(x, y),
            Self::Area {
                center_x, center_y, ..
            } => Point::new(center_x, center_y),
        }
    }

    /// Short kind name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Point { .. } => "point",
            Self::Area { .. } => "area",
        }
    }
}

/// A point or area marker with an attached text description.
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    /// Stable identifier.
    pub id: AnnotationId,
    /// Geometry in percent of the image.
    pub shape: Shape,
    /// Caption revealed while this annotation is framed.
    pub description: String,
}

/// Geometry for a new annotation, before the store assigns an id.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Draft {
    /// New point at `(x, y)` percent; clamped into the image.
    Point {
        /// Horizontal position in percent.
        x: f64,
        /// Vertical position in percent.
        y: f64,
    },
    /// New area; clipped to the image and rejected below the minimum extent.
    Area(Bounds),
}
