//! Per-point color selection

use crate::point::*;
use crate::transform::GROUND_CLEARANCE;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

const GRAY: Color3f = [0.5, 0.5, 0.5];
const RED: Color3f = [1.0, 0.0, 0.0];

/// Lower clamp for gradient components, keeps the norm away from zero
const GRADIENT_FLOOR: f32 = 0.001;

/// Map optional coordinates to an RGB triple according to `mode`.
///
/// - `"gradient"`: the supplied components are clamped to `[0.001, 1.0]` and
///   divided by the L2 norm taken over all of them together. Missing
///   components come out as zero.
/// - `"gray"`: constant `(0.5, 0.5, 0.5)`.
/// - anything else: constant red.
pub fn colormap(x: Option<f32>, y: Option<f32>, z: Option<f32>, mode: &str) -> Color3f {
    match mode {
        "gradient" => gradient([x, y, z]),
        "gray" => GRAY,
        _ => RED,
    }
}

fn gradient(components: [Option<f32>; 3]) -> Color3f {
    let clamped = components.map(|c| c.map(|v| v.clamp(GRADIENT_FLOOR, 1.0)));
    let norm = clamped.iter().flatten().map(|v| v * v).sum::<f32>().sqrt();
    clamped.map(|c| c.map_or(0.0, |v| v / norm))
}

/// How point colors are chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorMode {
    /// Colors come from the colors array stored next to the points
    #[default]
    File,
    /// Color by position in the normalized world frame
    Gradient,
    Gray,
    Red,
}

impl ColorMode {
    /// Whether this mode needs a colors array
    pub fn uses_file(&self) -> bool {
        matches!(self, ColorMode::File)
    }

    /// Color for a point already remapped into world coordinates.
    ///
    /// Returns `None` for [`ColorMode::File`], which has no computed color.
    pub fn color_for(&self, world: &Point3f) -> Option<Color3f> {
        match self {
            ColorMode::File => None,
            ColorMode::Gradient => Some(colormap(
                Some(world.x + 0.5),
                Some(world.y + 0.5),
                Some(world.z + 0.5 - GROUND_CLEARANCE),
                "gradient",
            )),
            ColorMode::Gray => Some(colormap(None, None, None, "gray")),
            ColorMode::Red => Some(colormap(None, None, None, "")),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorMode::File => "file",
            ColorMode::Gradient => "gradient",
            ColorMode::Gray => "gray",
            ColorMode::Red => "red",
        }
    }
}

impl FromStr for ColorMode {
    type Err = Infallible;

    /// Unknown names fall back to red, mirroring [`colormap`]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "file" => ColorMode::File,
            "gradient" => ColorMode::Gradient,
            "gray" | "grey" => ColorMode::Gray,
            _ => ColorMode::Red,
        })
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
