//! Core data structures for pcrender
//!
//! This crate provides the point and point cloud types used across the
//! workspace, together with the geometric pipeline that brings a raw cloud
//! into the renderer's canonical frame: axis-angle rotation, uniform
//! normalization, the fixed world remap, bounding box corners and the
//! per-point color selector.

pub mod point;
pub mod point_cloud;
pub mod traits;
pub mod transform;
pub mod bbox;
pub mod color;
pub mod error;

pub use point::*;
pub use point_cloud::*;
pub use traits::*;
pub use transform::*;
pub use bbox::*;
pub use color::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3, Matrix3, Matrix4};
