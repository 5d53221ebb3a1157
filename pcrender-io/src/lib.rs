//! I/O operations for pcrender datasets
//!
//! A dataset is a pair of `.npy` arrays sharing a path prefix:
//! `<prefix>points.npy` holds `[n, 3]` positions and `<prefix>colors.npy`
//! holds `[n, 3]` RGB values. Bounding boxes, when present, are stored as a
//! `[k, 7]` array.

pub mod npy;

pub use npy::*;

use log::{debug, info};
use pcrender_core::{BoundingBox, Color3f, Error, Point3f, PointCloud, PointCloud3f, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// File name suffix of the positions array
pub const POINTS_SUFFIX: &str = "points.npy";

/// File name suffix of the colors array
pub const COLORS_SUFFIX: &str = "colors.npy";

/// Trait for reading point clouds from files
pub trait PointCloudReader {
    fn read_point_cloud<P: AsRef<Path>>(path: P) -> Result<PointCloud<Point3f>>;
}

/// Trait for writing point clouds to files
pub trait PointCloudWriter {
    fn write_point_cloud<P: AsRef<Path>>(cloud: &PointCloud<Point3f>, path: P) -> Result<()>;
}

/// Positions and, when loaded, their colors
#[derive(Debug, Clone)]
pub struct Dataset {
    pub points: PointCloud3f,
    pub colors: Option<Vec<Color3f>>,
}

/// Append `suffix` to the final component of `prefix` (no separator)
pub fn prefixed_path<P: AsRef<Path>>(prefix: P, suffix: &str) -> PathBuf {
    let mut path = OsString::from(prefix.as_ref().as_os_str());
    path.push(suffix);
    PathBuf::from(path)
}

/// Read an `[n, 3]` colors array
pub fn read_colors<P: AsRef<Path>>(path: P) -> Result<Vec<Color3f>> {
    NpyReader::read_npy_file(path)?.to_triples()
}

/// Read a `[k, 7]` (or single `[7]`) array of boxes
pub fn read_boxes<P: AsRef<Path>>(path: P) -> Result<Vec<BoundingBox>> {
    let array = NpyReader::read_npy_file(path)?;
    array.rows(7)?.map(BoundingBox::from_slice).collect()
}

/// Load `<prefix>points.npy` and, if `with_colors`, `<prefix>colors.npy`
pub fn load_dataset<P: AsRef<Path>>(prefix: P, with_colors: bool) -> Result<Dataset> {
    let points_path = prefixed_path(&prefix, POINTS_SUFFIX);
    info!("loading points from {}", points_path.display());
    let points = NpyReader::read_point_cloud(&points_path)?;

    let colors = if with_colors {
        let colors_path = prefixed_path(&prefix, COLORS_SUFFIX);
        info!("loading colors from {}", colors_path.display());
        let colors = read_colors(&colors_path)?;
        if colors.len() != points.len() {
            return Err(Error::InvalidData(format!(
                "{} holds {} colors for {} points",
                colors_path.display(),
                colors.len(),
                points.len()
            )));
        }
        Some(colors)
    } else {
        None
    };

    debug!("dataset holds {} points", points.len());
    Ok(Dataset { points, colors })
}

/// Write a dataset under `prefix`, the inverse of [`load_dataset`]
pub fn save_dataset<P: AsRef<Path>>(prefix: P, points: &PointCloud3f, colors: &[Color3f]) -> Result<()> {
    NpyWriter::write_point_cloud(points, prefixed_path(&prefix, POINTS_SUFFIX))?;
    NpyWriter::write_triples(prefixed_path(&prefix, COLORS_SUFFIX), colors)
}
