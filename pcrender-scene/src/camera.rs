//! Camera configuration for generated scenes

use crate::templates::{FilmArgs, LookAtArgs, SensorArgs};
use pcrender_core::{Error, Point3f, Result, Vector3f};
use serde::{Deserialize, Serialize};

/// Samples per pixel used by the scene sampler unless overridden
pub const DEFAULT_SAMPLE_COUNT: u32 = 256;

/// A look-at perspective camera and its film.
///
/// Fully determines the viewing transform of one render; built once and not
/// modified afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    origin: Point3f,
    target: Point3f,
    up: Vector3f,
    fov: f32,
    width: u32,
    height: u32,
}

impl CameraConfig {
    /// Create a new camera.
    ///
    /// Rejects a target equal to the origin, an up vector parallel to the
    /// viewing direction, a field of view outside `(0, 180)` degrees and an
    /// empty film.
    pub fn new(
        origin: Point3f,
        target: Point3f,
        up: Vector3f,
        fov: f32,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let direction = target - origin;
        if direction.norm() == 0.0 {
            return Err(Error::InvalidConfig(
                "camera origin and target coincide".to_string(),
            ));
        }
        if up.cross(&direction).norm() <= f32::EPSILON * direction.norm() * up.norm() {
            return Err(Error::InvalidConfig(
                "camera up vector is parallel to the viewing direction".to_string(),
            ));
        }
        if !fov.is_finite() || fov <= 0.0 || fov >= 180.0 {
            return Err(Error::InvalidConfig(format!(
                "field of view must be between 0 and 180 degrees, got {}",
                fov
            )));
        }
        if width == 0 || height == 0 {
            return Err(Error::InvalidConfig(format!(
                "image size must be positive, got {}x{}",
                width, height
            )));
        }

        Ok(Self {
            origin,
            target,
            up,
            fov,
            width,
            height,
        })
    }

    pub fn origin(&self) -> Point3f {
        self.origin
    }

    pub fn target(&self) -> Point3f {
        self.target
    }

    pub fn up(&self) -> Vector3f {
        self.up
    }

    /// Field of view in degrees
    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub(crate) fn look_at_args(&self) -> LookAtArgs {
        LookAtArgs {
            origin: self.origin,
            target: self.target,
            up: self.up,
        }
    }

    pub(crate) fn sensor_args(&self, sample_count: u32) -> SensorArgs {
        SensorArgs {
            fov: self.fov,
            sample_count,
        }
    }

    pub(crate) fn film_args(&self) -> FilmArgs {
        FilmArgs {
            width: self.width,
            height: self.height,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            origin: Point3f::new(2.0, 2.0, 2.0),
            target: Point3f::origin(),
            up: Vector3f::z(),
            fov: 25.0,
            width: 1000,
            height: 1000,
        }
    }
}
