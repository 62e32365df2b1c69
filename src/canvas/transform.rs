//! Viewport coordinate mathematics.
//!
//! Maps between normalized image-space coordinates [0,1] and viewport pixel
//! coordinates given the fit-to-viewport scale, zoom and pan. Extracted as
//! pure functions for testability.

use thiserror::Error;

use crate::model::BoundingBox;

/// Size in viewport pixels of a resize handle; the hit radius is half this.
pub const HANDLE_SIZE: f32 = 8.0;

/// A 2D point in viewport pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Degenerate transform inputs. Rejected up front so no downstream geometry
/// ever sees NaN or infinity.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum GeometryError {
    #[error("image dimensions must be positive, got {width}x{height}")]
    InvalidImageSize { width: f32, height: f32 },

    #[error("viewport dimensions must be positive, got {width}x{height}")]
    InvalidViewportSize { width: f32, height: f32 },

    #[error("zoom must be positive and finite, got {zoom}")]
    InvalidZoom { zoom: f32 },
}

/// One of the 8 resize handles of a selected box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeHandle {
    NorthWest,
    NorthEast,
    SouthWest,
    SouthEast,
    North,
    South,
    East,
    West,
}

impl ResizeHandle {
    /// Corner handles, checked before edge handles during hit detection.
    pub const CORNERS: [ResizeHandle; 4] = [
        ResizeHandle::NorthWest,
        ResizeHandle::NorthEast,
        ResizeHandle::SouthWest,
        ResizeHandle::SouthEast,
    ];

    /// Edge-midpoint handles.
    pub const EDGES: [ResizeHandle; 4] = [
        ResizeHandle::North,
        ResizeHandle::South,
        ResizeHandle::East,
        ResizeHandle::West,
    ];
}

/// The canonical image-to-viewport transform.
///
/// Forward mapping: `scale = min(vw/iw, vh/ih)` (fit inside, centered),
/// `viewport = (norm * imageDim * scale + offset + pan) * zoom`. Zoom is
/// applied after pan; deviations from this order are bugs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    image_width: f32,
    image_height: f32,
    scale: f32,
    offset_x: f32,
    offset_y: f32,
    zoom: f32,
    pan_x: f32,
    pan_y: f32,
}

impl ViewTransform {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        image_width: f32,
        image_height: f32,
        viewport_width: f32,
        viewport_height: f32,
        zoom: f32,
        pan_x: f32,
        pan_y: f32,
    ) -> Result<Self, GeometryError> {
        if !(image_width > 0.0 && image_height > 0.0)
            || !image_width.is_finite()
            || !image_height.is_finite()
        {
            return Err(GeometryError::InvalidImageSize {
                width: image_width,
                height: image_height,
            });
        }
        if !(viewport_width > 0.0 && viewport_height > 0.0)
            || !viewport_width.is_finite()
            || !viewport_height.is_finite()
        {
            return Err(GeometryError::InvalidViewportSize {
                width: viewport_width,
                height: viewport_height,
            });
        }
        if !(zoom > 0.0) || !zoom.is_finite() {
            return Err(GeometryError::InvalidZoom { zoom });
        }

        let scale = (viewport_width / image_width).min(viewport_height / image_height);
        Ok(Self {
            image_width,
            image_height,
            scale,
            offset_x: (viewport_width - image_width * scale) / 2.0,
            offset_y: (viewport_height - image_height * scale) / 2.0,
            zoom,
            pan_x,
            pan_y,
        })
    }

    /// Transform with no zoom or pan.
    pub fn fit(
        image_width: f32,
        image_height: f32,
        viewport_width: f32,
        viewport_height: f32,
    ) -> Result<Self, GeometryError> {
        Self::new(image_width, image_height, viewport_width, viewport_height, 1.0, 0.0, 0.0)
    }

    /// Map a normalized image point to viewport pixels.
    pub fn image_to_viewport(&self, norm_x: f32, norm_y: f32) -> Point {
        Point::new(
            (norm_x * self.image_width * self.scale + self.offset_x + self.pan_x) * self.zoom,
            (norm_y * self.image_height * self.scale + self.offset_y + self.pan_y) * self.zoom,
        )
    }

    /// Map a viewport point back to normalized image coordinates. Points
    /// outside the image saturate to the [0,1] boundary.
    pub fn viewport_to_image(&self, point: Point) -> (f32, f32) {
        let image_x = (point.x / self.zoom - self.pan_x - self.offset_x) / self.scale;
        let image_y = (point.y / self.zoom - self.pan_y - self.offset_y) / self.scale;
        (
            (image_x / self.image_width).clamp(0.0, 1.0),
            (image_y / self.image_height).clamp(0.0, 1.0),
        )
    }

    /// Whether a viewport point lies within a box's rectangle, edges
    /// inclusive.
    pub fn hit_test_box(&self, point: Point, b: &BoundingBox) -> bool {
        let top_left = self.image_to_viewport(b.x, b.y);
        let bottom_right = self.image_to_viewport(b.x + b.width, b.y + b.height);
        point.x >= top_left.x
            && point.x <= bottom_right.x
            && point.y >= top_left.y
            && point.y <= bottom_right.y
    }

    /// The viewport position of a resize handle on a box.
    pub fn handle_position(&self, handle: ResizeHandle, b: &BoundingBox) -> Point {
        let tl = self.image_to_viewport(b.x, b.y);
        let br = self.image_to_viewport(b.x + b.width, b.y + b.height);
        let cx = (tl.x + br.x) / 2.0;
        let cy = (tl.y + br.y) / 2.0;
        match handle {
            ResizeHandle::NorthWest => Point::new(tl.x, tl.y),
            ResizeHandle::NorthEast => Point::new(br.x, tl.y),
            ResizeHandle::SouthWest => Point::new(tl.x, br.y),
            ResizeHandle::SouthEast => Point::new(br.x, br.y),
            ResizeHandle::North => Point::new(cx, tl.y),
            ResizeHandle::South => Point::new(cx, br.y),
            ResizeHandle::East => Point::new(br.x, cy),
            ResizeHandle::West => Point::new(tl.x, cy),
        }
    }

    /// Which resize handle, if any, contains the point within the handle hit
    /// radius. Corners are checked before edges so a corner wins when both
    /// are in tolerance.
    pub fn handle_at(&self, point: Point, b: &BoundingBox) -> Option<ResizeHandle> {
        let radius = HANDLE_SIZE / 2.0;
        for handle in ResizeHandle::CORNERS.into_iter().chain(ResizeHandle::EDGES) {
            let pos = self.handle_position(handle, b);
            if (point.x - pos.x).abs() <= radius && (point.y - pos.y).abs() <= radius {
                return Some(handle);
            }
        }
        None
    }
}

/// Pan/zoom viewport state with clamped adjustments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanZoom {
    pub zoom: f32,
    pub pan_x: f32,
    pub pan_y: f32,
}

impl PanZoom {
    pub const MIN_ZOOM: f32 = 0.25;
    pub const MAX_ZOOM: f32 = 5.0;

    pub fn identity() -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }

    pub fn pan_by(&self, dx: f32, dy: f32) -> Self {
        Self {
            pan_x: self.pan_x + dx,
            pan_y: self.pan_y + dy,
            ..*self
        }
    }

    pub fn zoom_in(&self, factor: f32) -> Self {
        Self {
            zoom: (self.zoom * factor).min(Self::MAX_ZOOM),
            ..*self
        }
    }

    pub fn zoom_out(&self, factor: f32) -> Self {
        Self {
            zoom: (self.zoom / factor).max(Self::MIN_ZOOM),
            ..*self
        }
    }

    /// Change zoom while keeping the image point under the cursor fixed.
    pub fn zoom_to_cursor(&self, new_zoom: f32, cursor: Point) -> Self {
        let new_zoom = new_zoom.clamp(Self::MIN_ZOOM, Self::MAX_ZOOM);
        // Pre-zoom position of the cursor in the panned plane.
        let plane_x = cursor.x / self.zoom - self.pan_x;
        let plane_y = cursor.y / self.zoom - self.pan_y;
        Self {
            zoom: new_zoom,
            pan_x: cursor.x / new_zoom - plane_x,
            pan_y: cursor.y / new_zoom - plane_y,
        }
    }
}

impl Default for PanZoom {
    fn default() -> Self {
        Self::identity()
    }
}
