//! Oriented bounding boxes and their wireframe corners

use crate::error::{Error, Result};
use crate::point::*;
use nalgebra::{Rotation3, Vector3};
use serde::{Deserialize, Serialize};

/// Corner index pairs forming the 12 wireframe edges of a box.
///
/// Indices refer to the winding produced by [`BoundingBox::corners`]:
/// 0..4 is the top face, 4..8 the bottom face, and `i`/`i + 4` share a
/// vertical edge.
#[rustfmt::skip]
pub const BOX_EDGES: [[usize; 2]; 12] = [
    [0, 1], [1, 2], [2, 3], [0, 3],
    [4, 5], [5, 6], [6, 7], [4, 7],
    [0, 4], [1, 5], [2, 6], [3, 7],
];

/// A box given by its center, size `(l, w, h)` and heading.
///
/// The center is stored in the depth frame the box was annotated in; corners
/// are produced in camera frame, where depth `(x, y, z)` becomes
/// `(x, -z, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub center: Point3f,
    pub size: Vector3f,
    /// Radians, about the camera-frame vertical axis.
    ///
    /// Applied to the corners. Boxes drawn by tools that ignore the heading
    /// are reproduced by setting it to zero, which keeps the box axis aligned.
    pub heading: f32,
}

impl BoundingBox {
    pub fn new(center: Point3f, size: Vector3f, heading: f32) -> Self {
        Self {
            center,
            size,
            heading,
        }
    }

    /// Build from `[cx, cy, cz, l, w, h, heading]`
    pub fn from_array(values: [f32; 7]) -> Self {
        Self::new(
            Point3f::new(values[0], values[1], values[2]),
            Vector3f::new(values[3], values[4], values[5]),
            values[6],
        )
    }

    /// Build from a slice that must hold exactly seven values
    pub fn from_slice(values: &[f32]) -> Result<Self> {
        let values: [f32; 7] = values.try_into().map_err(|_| {
            Error::InvalidData(format!(
                "bounding box needs 7 values, got {}",
                values.len()
            ))
        })?;
        Ok(Self::from_array(values))
    }

    /// The 8 corners in the winding [`BOX_EDGES`] expects
    pub fn corners(&self) -> [Point3f; 8] {
        let center = Vector3::new(self.center.x, -self.center.z, self.center.y);
        let (l, w, h) = (self.size.x / 2.0, self.size.y / 2.0, self.size.z / 2.0);

        let offsets = [
            Vector3::new(l, h, w),
            Vector3::new(l, h, -w),
            Vector3::new(-l, h, -w),
            Vector3::new(-l, h, w),
            Vector3::new(l, -h, w),
            Vector3::new(l, -h, -w),
            Vector3::new(-l, -h, -w),
            Vector3::new(-l, -h, w),
        ];

        let rotation = Rotation3::from_axis_angle(&Vector3::y_axis(), self.heading);
        offsets.map(|offset| Point3f::from(rotation * offset + center))
    }
}

/// Corners of a box given as `[cx, cy, cz, l, w, h, heading]`
pub fn box_center_to_corner(values: [f32; 7]) -> [Point3f; 8] {
    BoundingBox::from_array(values).corners()
}

/// Pair corners along [`BOX_EDGES`]
pub fn edge_segments(corners: &[Point3f; 8]) -> [(Point3f, Point3f); 12] {
    BOX_EDGES.map(|[a, b]| (corners[a], corners[b]))
}
