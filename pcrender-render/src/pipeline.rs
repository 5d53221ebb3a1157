//! End-to-end rendering pipeline
//!
//! load -> rotate -> normalize -> world remap -> colors -> scene document
//! -> scene file -> renderer -> image, scene file removed.

use crate::config::RenderConfig;
use crate::renderer::{render_scene_file, Renderer};
use log::{debug, info};
use pcrender_core::{
    rotate_sequence, standardize_pcl_bbox, to_world, Bounded, BoundingBox, Color3f,
    ColoredPointCloud3f, Error, Normalization, Point3f, PointCloud3f, Result,
};
use pcrender_io::{load_dataset, read_boxes, Dataset};
use pcrender_scene::{FragmentKind, SceneBuilder, SceneDocument};
use std::fs;
use std::path::PathBuf;

/// What a finished run produced
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutcome {
    pub image: PathBuf,
    pub points: usize,
    pub box_edges: usize,
    pub fragments: usize,
}

/// A cloud and its boxes in the renderer's world frame, ready to serialize
#[derive(Debug, Clone)]
pub struct PreparedCloud {
    pub cloud: ColoredPointCloud3f,
    /// Corners of each box, in the winding `BOX_EDGES` expects
    pub boxes: Vec<[Point3f; 8]>,
    pub normalization: Normalization,
    /// Lowest world z of any point
    pub min_z: f32,
}

/// Rotate, normalize and remap the dataset and its boxes, then attach colors.
///
/// Box corners follow the cloud through every stage and are normalized with
/// the cloud's extents, so a corner that coincides with a point stays on it.
pub fn prepare_point_cloud(
    config: &RenderConfig,
    dataset: &Dataset,
    boxes: &[BoundingBox],
) -> Result<PreparedCloud> {
    let corners: PointCloud3f = boxes.iter().flat_map(|bbox| bbox.corners()).collect();

    let rotated = rotate_sequence(&dataset.points, config.rotations())?;
    let rotated_corners = rotate_sequence(&corners, config.rotations())?;
    let (normalized, normalized_corners, normalization) =
        standardize_pcl_bbox(&rotated, &rotated_corners.points)?;

    let world = to_world(&normalized);
    let world_corners = to_world(&PointCloud3f::from_points(normalized_corners));

    let colors = select_colors(config, dataset, &world)?;
    let cloud = ColoredPointCloud3f::from_parts(&world, &colors)?;
    let min_z = cloud.bounding_box().0.z;

    let boxes = world_corners
        .points
        .chunks_exact(8)
        .map(|chunk| {
            let mut box_corners = [Point3f::origin(); 8];
            box_corners.copy_from_slice(chunk);
            box_corners
        })
        .collect();

    debug!(
        "normalized {} points, scale {}, lowest z {}",
        cloud.len(),
        normalization.scale(),
        min_z
    );

    Ok(PreparedCloud {
        cloud,
        boxes,
        normalization,
        min_z,
    })
}

fn select_colors(config: &RenderConfig, dataset: &Dataset, world: &PointCloud3f) -> Result<Vec<Color3f>> {
    let mode = config.color_mode();
    if mode.uses_file() {
        return dataset.colors.clone().ok_or_else(|| {
            Error::InvalidData(format!("color mode '{}' needs a colors array", mode))
        });
    }

    world
        .iter()
        .map(|p| mode.color_for(p))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| Error::InvalidData(format!("color mode '{}' computes no colors", mode)))
}

/// Build the full scene document for a dataset and optional boxes
pub fn build_scene(config: &RenderConfig, dataset: &Dataset, boxes: &[BoundingBox]) -> Result<SceneDocument> {
    let prepared = prepare_point_cloud(config, dataset, boxes)?;

    let mut builder = SceneBuilder::new(config.camera(), config.sample_count());
    builder.add_point_cloud(&prepared.cloud, config.radius());
    for corners in &prepared.boxes {
        builder.add_bbox(corners, config.bar_color(), config.bar_radius());
    }

    Ok(builder.finish(config.radius(), prepared.min_z))
}

/// Run the whole pipeline for `config` and render with `renderer`
pub fn paint_point_cloud<R: Renderer + ?Sized>(config: &RenderConfig, renderer: &R) -> Result<RenderOutcome> {
    let dataset = load_dataset(config.input_prefix(), config.color_mode().uses_file())?;
    let boxes = match config.boxes() {
        Some(path) => {
            info!("loading boxes from {}", path.display());
            read_boxes(path)?
        }
        None => Vec::new(),
    };

    let document = build_scene(config, &dataset, &boxes)?;
    let points = document.count(FragmentKind::Point);
    let box_edges = document.count(FragmentKind::BoxEdge);
    let fragments = document.len();

    fs::create_dir_all(config.workdir())?;
    let scene = config.scene_path();
    document.write_to(&scene)?;
    info!("wrote scene with {} points to {}", points, scene.display());

    let image = render_scene_file(renderer, &scene, config.cleanup())?;
    info!("rendered {}", image.display());

    Ok(RenderOutcome {
        image,
        points,
        box_edges,
        fragments,
    })
}
