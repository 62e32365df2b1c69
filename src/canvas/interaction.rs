//! Pointer interaction state machine for the annotation canvas.
//!
//! Consumes pointer events, interprets them against the current
//! [`ViewTransform`], and emits high-level intents for the store. Pointer
//! moves only ever produce live previews; no store mutation happens before
//! pointer-up.

use crate::canvas::transform::{Point, ResizeHandle, ViewTransform};
use crate::model::{BoundingBox, BoxId, BoxPatch, MIN_BOX_SIZE};

/// A high-level mutation request produced by a completed gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Create a box with the given normalized geometry; the caller assigns
    /// the class.
    CreateBox {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    /// Commit new geometry for an existing box.
    UpdateBox { box_id: BoxId, patch: BoxPatch },
    /// Change the box selection.
    Select { box_id: Option<BoxId> },
}

/// Live feedback during a gesture, for rendering only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preview {
    /// `Some` when adjusting an existing box, `None` while drawing a new one.
    pub box_id: Option<BoxId>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq)]
enum Mode {
    Idle,
    Drawing {
        start: Point,
    },
    Dragging {
        box_id: BoxId,
        origin: BoundingBox,
        start: Point,
    },
    Resizing {
        box_id: BoxId,
        handle: ResizeHandle,
        origin: BoundingBox,
        start: Point,
    },
}

/// Tracks one in-flight pointer gesture: drawing a new box, or dragging or
/// resizing an existing one.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionController {
    mode: Mode,
}

impl InteractionController {
    pub fn new() -> Self {
        Self { mode: Mode::Idle }
    }

    pub fn is_active(&self) -> bool {
        self.mode != Mode::Idle
    }

    /// Begin a gesture. Priority: resize handle of the selected box, then
    /// dragging a hit box (topmost first), then drawing a new box on empty
    /// canvas. Returns a selection intent when the hit box changes selection.
    pub fn pointer_down(
        &mut self,
        point: Point,
        transform: &ViewTransform,
        boxes: &[BoundingBox],
        selected: Option<BoxId>,
    ) -> Option<Intent> {
        if let Some(id) = selected {
            if let Some(b) = boxes.iter().find(|b| b.id == id) {
                if let Some(handle) = transform.handle_at(point, b) {
                    self.mode = Mode::Resizing {
                        box_id: id,
                        handle,
                        origin: b.clone(),
                        start: point,
                    };
                    return None;
                }
            }
        }

        // Topmost box under the cursor; later boxes draw on top.
        if let Some(b) = boxes
            .iter()
            .rev()
            .find(|b| b.visible && transform.hit_test_box(point, b))
        {
            self.mode = Mode::Dragging {
                box_id: b.id,
                origin: b.clone(),
                start: point,
            };
            return (selected != Some(b.id)).then(|| Intent::Select {
                box_id: Some(b.id),
            });
        }

        self.mode = Mode::Drawing { start: point };
        selected.is_some().then_some(Intent::Select { box_id: None })
    }

    /// Track pointer movement, returning a live preview rectangle. Never
    /// mutates the store.
    pub fn pointer_move(&mut self, point: Point, transform: &ViewTransform) -> Option<Preview> {
        match &self.mode {
            Mode::Idle => None,
            Mode::Drawing { start } => {
                let (x, y, width, height) = drawn_rect(*start, point, transform);
                Some(Preview {
                    box_id: None,
                    x,
                    y,
                    width,
                    height,
                })
            }
            Mode::Dragging { box_id, origin, start } => {
                let b = dragged_box(origin, *start, point, transform);
                Some(Preview {
                    box_id: Some(*box_id),
                    x: b.0,
                    y: b.1,
                    width: b.2,
                    height: b.3,
                })
            }
            Mode::Resizing {
                box_id,
                handle,
                origin,
                start,
            } => {
                let b = resized_box(origin, *handle, *start, point, transform);
                Some(Preview {
                    box_id: Some(*box_id),
                    x: b.0,
                    y: b.1,
                    width: b.2,
                    height: b.3,
                })
            }
        }
    }

    /// Finish the gesture, producing the intent to commit (if any). Boxes
    /// drawn below the minimum size are discarded.
    pub fn pointer_up(&mut self, point: Point, transform: &ViewTransform) -> Option<Intent> {
        let mode = std::mem::replace(&mut self.mode, Mode::Idle);
        match mode {
            Mode::Idle => None,
            Mode::Drawing { start } => {
                let (x, y, width, height) = drawn_rect(start, point, transform);
                if width < MIN_BOX_SIZE || height < MIN_BOX_SIZE {
                    log::debug!("Discarding sub-minimum box {width}x{height}");
                    return None;
                }
                Some(Intent::CreateBox {
                    x,
                    y,
                    width,
                    height,
                })
            }
            Mode::Dragging { box_id, origin, start } => {
                let (x, y, width, height) = dragged_box(&origin, start, point, transform);
                geometry_intent(box_id, &origin, x, y, width, height)
            }
            Mode::Resizing {
                box_id,
                handle,
                origin,
                start,
            } => {
                let (x, y, width, height) = resized_box(&origin, handle, start, point, transform);
                geometry_intent(box_id, &origin, x, y, width, height)
            }
        }
    }

    /// Abandon the in-flight gesture without committing anything.
    pub fn cancel(&mut self) {
        self.mode = Mode::Idle;
    }
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalized rectangle between two viewport corners, in either drag
/// direction.
fn drawn_rect(start: Point, end: Point, transform: &ViewTransform) -> (f32, f32, f32, f32) {
    let (x0, y0) = transform.viewport_to_image(start);
    let (x1, y1) = transform.viewport_to_image(end);
    let x = x0.min(x1);
    let y = y0.min(y1);
    (x, y, (x1 - x0).abs(), (y1 - y0).abs())
}

/// Normalized delta between two viewport points.
fn norm_delta(start: Point, end: Point, transform: &ViewTransform) -> (f32, f32) {
    let (x0, y0) = transform.viewport_to_image(start);
    let (x1, y1) = transform.viewport_to_image(end);
    (x1 - x0, y1 - y0)
}

fn dragged_box(
    origin: &BoundingBox,
    start: Point,
    current: Point,
    transform: &ViewTransform,
) -> (f32, f32, f32, f32) {
    let (dx, dy) = norm_delta(start, current, transform);
    let x = (origin.x + dx).clamp(0.0, 1.0 - origin.width);
    let y = (origin.y + dy).clamp(0.0, 1.0 - origin.height);
    (x, y, origin.width, origin.height)
}

/// Resize by moving only the edges the handle implies; the opposite
/// corner/edge stays fixed and dimensions are floored at the minimum size.
fn resized_box(
    origin: &BoundingBox,
    handle: ResizeHandle,
    start: Point,
    current: Point,
    transform: &ViewTransform,
) -> (f32, f32, f32, f32) {
    let (dx, dy) = norm_delta(start, current, transform);

    let mut left = origin.x;
    let mut top = origin.y;
    let mut right = origin.x + origin.width;
    let mut bottom = origin.y + origin.height;

    let moves_left = matches!(
        handle,
        ResizeHandle::NorthWest | ResizeHandle::SouthWest | ResizeHandle::West
    );
    let moves_right = matches!(
        handle,
        ResizeHandle::NorthEast | ResizeHandle::SouthEast | ResizeHandle::East
    );
    let moves_top = matches!(
        handle,
        ResizeHandle::NorthWest | ResizeHandle::NorthEast | ResizeHandle::North
    );
    let moves_bottom = matches!(
        handle,
        ResizeHandle::SouthWest | ResizeHandle::SouthEast | ResizeHandle::South
    );

    if moves_left {
        left = (left + dx).clamp(0.0, right - MIN_BOX_SIZE);
    }
    if moves_right {
        right = (right + dx).clamp(left + MIN_BOX_SIZE, 1.0);
    }
    if moves_top {
        top = (top + dy).clamp(0.0, bottom - MIN_BOX_SIZE);
    }
    if moves_bottom {
        bottom = (bottom + dy).clamp(top + MIN_BOX_SIZE, 1.0);
    }

    (left, top, right - left, bottom - top)
}

fn geometry_intent(
    box_id: BoxId,
    origin: &BoundingBox,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
) -> Option<Intent> {
    let unchanged = x == origin.x && y == origin.y && width == origin.width && height == origin.height;
    (!unchanged).then(|| Intent::UpdateBox {
        box_id,
        patch: BoxPatch::geometry(x, y, width, height),
    })
}
