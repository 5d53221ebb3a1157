//! 3D transformation utilities
//!
//! Rotations are built from an axis and an angle through the matrix
//! exponential of the skew-symmetric cross-product matrix, i.e.
//! `R = exp(θ·[axis]×)`. Clouds are treated as rows of coordinates that are
//! multiplied on the right by `R`, so the homogeneous matrix stored in
//! [`Transform3D`] holds `Rᵀ`.

use crate::error::{Error, Result};
use crate::point::*;
use crate::point_cloud::PointCloud3f;
use crate::traits::Bounded;
use log::debug;
use nalgebra::{Matrix3, Matrix4};
use serde::{Deserialize, Serialize};

/// Lift applied to remapped points so the lowest spheres do not z-fight
/// with the ground plane
pub const GROUND_CLEARANCE: f32 = 0.0125;

/// A 3D transformation that can be applied to points and point clouds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform3D {
    pub matrix: Matrix4<f32>,
}

impl Transform3D {
    /// Rotation of row-vector points about `axis` by `degrees`
    pub fn axis_angle_degrees(axis: &Vector3f, degrees: f32) -> Result<Self> {
        let rotation = rotation_matrix(axis, degrees.to_radians())?;
        Ok(Self {
            matrix: rotation.transpose().to_homogeneous(),
        })
    }

    /// The fixed remap from the normalized frame into the renderer's world
    /// convention: `[x, y, z] -> [-z, x, y + GROUND_CLEARANCE]`
    pub fn world_remap() -> Self {
        #[rustfmt::skip]
        let matrix = Matrix4::new(
            0.0, 0.0, -1.0, 0.0,
            1.0, 0.0,  0.0, 0.0,
            0.0, 1.0,  0.0, GROUND_CLEARANCE,
            0.0, 0.0,  0.0, 1.0,
        );
        Self { matrix }
    }

    /// Apply the transformation to a point
    pub fn transform_point(&self, point: &Point3f) -> Point3f {
        let homogeneous = self.matrix * point.to_homogeneous();
        Point3f::from_homogeneous(homogeneous).unwrap_or(*point)
    }
}

/// Rotation matrix `exp(radians·[axis/|axis|]×)`
pub fn rotation_matrix(axis: &Vector3f, radians: f32) -> Result<Matrix3<f32>> {
    let norm = axis.norm();
    if !norm.is_finite() || norm == 0.0 {
        return Err(Error::InvalidConfig(format!(
            "rotation axis [{}, {}, {}] has no direction",
            axis.x, axis.y, axis.z
        )));
    }

    Ok((axis / norm * radians).cross_matrix().exp())
}

/// One step of a rotation sequence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRotation {
    pub axis: Vector3f,
    pub degrees: f32,
}

impl AxisRotation {
    pub fn new(axis: Vector3f, degrees: f32) -> Self {
        Self { axis, degrees }
    }

    pub fn to_transform(&self) -> Result<Transform3D> {
        Transform3D::axis_angle_degrees(&self.axis, self.degrees)
    }
}

/// Rotate a point cloud about `axis` by `degrees`
pub fn rotate(cloud: &PointCloud3f, axis: &Vector3f, degrees: f32) -> Result<PointCloud3f> {
    let transform = Transform3D::axis_angle_degrees(axis, degrees)?;
    Ok(cloud.transformed(&transform))
}

/// Apply a sequence of rotations in order
pub fn rotate_sequence(cloud: &PointCloud3f, rotations: &[AxisRotation]) -> Result<PointCloud3f> {
    let mut rotated = cloud.clone();
    for rotation in rotations {
        rotated = rotate(&rotated, &rotation.axis, rotation.degrees)?;
    }
    Ok(rotated)
}

/// Per-axis extents of a cloud and the uniform scale derived from them.
///
/// The same normalization is reused for anything that must stay aligned with
/// the cloud, such as bounding box corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Normalization {
    pub mins: Point3f,
    pub maxs: Point3f,
}

impl Normalization {
    /// Build from explicit extents; a zero or non-finite largest extent is rejected
    pub fn from_extents(mins: Point3f, maxs: Point3f) -> Result<Self> {
        let normalization = Self { mins, maxs };
        let scale = normalization.scale();
        if !scale.is_finite() || scale <= 0.0 {
            return Err(Error::DegenerateGeometry(format!(
                "largest extent is {} (mins {:?}, maxs {:?})",
                scale,
                mins.coords.as_slice(),
                maxs.coords.as_slice()
            )));
        }
        Ok(normalization)
    }

    /// Extents of a cloud
    pub fn from_cloud<B: Bounded>(cloud: &B) -> Result<Self> {
        let (mins, maxs) = cloud.bounding_box();
        debug!("cloud extents: mins {:?}, maxs {:?}", mins.coords.as_slice(), maxs.coords.as_slice());
        Self::from_extents(mins, maxs)
    }

    /// Midpoint of the extents
    pub fn center(&self) -> Point3f {
        nalgebra::center(&self.mins, &self.maxs)
    }

    /// Largest extent across the three axes
    pub fn scale(&self) -> f32 {
        (self.maxs - self.mins).max()
    }

    /// `(p - center) / scale`
    pub fn apply(&self, point: &Point3f) -> Point3f {
        let center = self.center();
        let scale = self.scale();
        Point3f::from((point - center) / scale)
    }

    pub fn apply_all(&self, points: &[Point3f]) -> Vec<Point3f> {
        points.iter().map(|p| self.apply(p)).collect()
    }
}

/// Center a cloud on its extents and divide by its largest extent.
///
/// Empty clouds, clouds holding NaN or infinite coordinates and clouds
/// without extent fail with [`Error::DegenerateGeometry`].
pub fn standardize_point_cloud(cloud: &PointCloud3f) -> Result<(PointCloud3f, Normalization)> {
    if cloud.is_empty() {
        return Err(Error::DegenerateGeometry("point cloud is empty".to_string()));
    }
    // min/max skip NaN, so extents alone cannot catch it
    if let Some(index) = cloud.iter().position(|p| !p.coords.iter().all(|c| c.is_finite())) {
        return Err(Error::DegenerateGeometry(format!(
            "point {} has a non-finite coordinate {:?}",
            index,
            cloud[index].coords.as_slice()
        )));
    }
    let normalization = Normalization::from_cloud(cloud)?;
    let standardized = normalization.apply_all(&cloud.points);
    Ok((PointCloud3f::from_points(standardized), normalization))
}

/// Standardize a cloud and box corners together, both with the cloud's extents
pub fn standardize_pcl_bbox(
    cloud: &PointCloud3f,
    corners: &[Point3f],
) -> Result<(PointCloud3f, Vec<Point3f>, Normalization)> {
    let (standardized, normalization) = standardize_point_cloud(cloud)?;
    let corners = normalization.apply_all(corners);
    Ok((standardized, corners, normalization))
}

/// Remap a normalized cloud into the renderer's world convention
pub fn to_world(cloud: &PointCloud3f) -> PointCloud3f {
    cloud.transformed(&Transform3D::world_remap())
}
