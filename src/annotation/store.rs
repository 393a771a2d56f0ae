use crate::annotation::model::{Annotation, AnnotationId, Draft, Shape};
use crate::foundation::error::{PinpointError, PinpointResult};

/// Read side of the annotation layer consumed by presentations.
///
/// Presenters take one snapshot per run; later mutations do not affect that run.
pub trait AnnotationSource {
    /// Ordered snapshot of the current annotations.
    fn annotations(&self) -> Vec<Annotation>;
    /// Show or hide on-image markers.
    fn set_markers_visible(&mut self, visible: bool);
}

/// Ordered, mutable collection of annotations for the current image.
///
/// Insertion order is presentation order. Ids are never reused within one store.
#[derive(Debug)]
pub struct AnnotationStore {
    items: Vec<Annotation>,
    next_id: u64,
    markers_visible: bool,
}

impl Default for AnnotationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotationStore {
    /// Create an empty store with markers visible.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            next_id: 1,
            markers_visible: true,
        }
    }

    /// Append an annotation and return its id.
    ///
    /// Points are clamped into the image. Areas are clipped to the image and rejected with
    /// [`PinpointError::DegenerateGeometry`] when either extent is below 1%; a rejected area
    /// leaves the store unchanged.
    pub fn add(
        &mut self,
        draft: Draft,
        description: impl Into<String>,
    ) -> PinpointResult<AnnotationId> {
        let shape = match draft {
            Draft::Point { x, y } => {
                if !x.is_finite() || !y.is_finite() {
                    return Err(PinpointError::validation(
                        "point coordinates must be finite",
                    ));
                }
                Shape::Point {
                    x: x.clamp(0.0, 100.0),
                    y: y.clamp(0.0, 100.0),
                }
            }
            Draft::Area(bounds) => {
                let clipped = bounds.clipped();
                if !clipped.meets_minimum() {
                    tracing::debug!(
                        width = clipped.width,
                        height = clipped.height,
                        "discarding undersized area"
                    );
                    return Err(PinpointError::DegenerateGeometry {
                        width: clipped.width,
                        height: clipped.height,
                    });
                }
                Shape::area(clipped)
            }
        };

        let id = AnnotationId(self.next_id);
        self.next_id += 1;
        self.items.push(Annotation {
            id,
            shape,
            description: description.into(),
        });
        Ok(id)
    }

    /// Remove an annotation, returning it when present.
    pub fn remove(&mut self, id: AnnotationId) -> Option<Annotation> {
        let pos = self.position(id)?;
        Some(self.items.remove(pos))
    }

    /// Replace the description of an annotation.
    pub fn update_description(
        &mut self,
        id: AnnotationId,
        text: impl Into<String>,
    ) -> PinpointResult<()> {
        let pos = self.require(id)?;
        self.items[pos].description = text.into();
        Ok(())
    }

    /// Move an annotation's anchor to `(x, y)` percent, as when dragging its marker.
    ///
    /// Areas keep their size and are shifted so they stay inside the image.
    pub fn move_to(&mut self, id: AnnotationId, x: f64, y: f64) -> PinpointResult<()> {
        if !x.is_finite() || !y.is_finite() {
            return Err(PinpointError::validation("move target must be finite"));
        }
        let pos = self.require(id)?;
        let x = x.clamp(0.0, 100.0);
        let y = y.clamp(0.0, 100.0);
        let item = &mut self.items[pos];
        item.shape = match item.shape {
            Shape::Point { .. } => Shape::Point { x, y },
            Shape::Area { bounds, .. } => {
                let mut moved = bounds;
                moved.left = (x - bounds.width / 2.0).clamp(0.0, 100.0 - bounds.width);
                moved.top = (y - bounds.height / 2.0).clamp(0.0, 100.0 - bounds.height);
                Shape::area(moved)
            }
        };
        Ok(())
    }

    /// Ordered view of all annotations.
    pub fn list(&self) -> &[Annotation] {
        &self.items
    }

    /// Look up an annotation by id.
    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.items.iter().find(|a| a.id == id)
    }

    /// Number of annotations.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// `true` when there are no annotations.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 1-based ordinal label for the marker at `index`, as an editing surface shows it.
    pub fn label(&self, index: usize) -> Option<String> {
        (index < self.items.len()).then(|| (index + 1).to_string())
    }

    /// Remove every annotation.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Reset for a newly loaded image: no annotations carry over and markers are shown again.
    pub fn replace_image(&mut self) {
        self.clear();
        self.markers_visible = true;
    }

    /// Whether on-image markers are currently shown.
    pub fn markers_visible(&self) -> bool {
        self.markers_visible
    }

    fn position(&self, id: AnnotationId) -> Option<usize> {
        self.items.iter().position(|a| a.id == id)
    }

    fn require(&self, id: AnnotationId) -> PinpointResult<usize> {
        self.position(id)
            .ok_or_else(|| PinpointError::validation(format!("unknown annotation id {}", id.0)))
    }
}

impl AnnotationSource for AnnotationStore {
    fn annotations(&self) -> Vec<Annotation> {
        self.items.clone()
    }

    fn set_markers_visible(&mut self, visible: bool) {
        self.markers_visible = visible;
    }
}

/// Fixed annotation list, as used by offscreen capture where markers are drawn per frame.
impl AnnotationSource for Vec<Annotation> {
    fn annotations(&self) -> Vec<Annotation> {
        self.clone()
    }

    fn set_markers_visible(&mut self, _visible: bool) {}
}

#[cfg(test)]
#[path = "../../tests/unit/annotation/store.rs"]
mod tests;
