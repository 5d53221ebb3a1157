//! Scene description generation
//!
//! This crate turns a normalized, colored point cloud into the textual scene
//! description consumed by the Mitsuba renderer:
//! - Look-at camera, sampler and film configuration
//! - One sphere per point
//! - One cylinder per bounding box edge
//! - Fixed ground plane and area light

pub mod camera;
pub mod document;
pub mod templates;

pub use camera::*;
pub use document::*;
