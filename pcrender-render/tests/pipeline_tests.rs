//! Integration tests for pcrender-render
//!
//! These tests run the whole pipeline on small synthetic datasets with an
//! in-process renderer standing in for Mitsuba.

use approx::assert_relative_eq;
use clap::Parser;
use pcrender_core::{BoundingBox, Error, Point3f, PointCloud, Result};
use pcrender_io::{save_dataset, Dataset, NpyWriter};
use pcrender_render::*;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

/// Keeps the scene text it was given and writes a placeholder image
#[derive(Default)]
struct CapturingRenderer {
    fail: bool,
    scenes: RefCell<Vec<String>>,
}

impl Renderer for CapturingRenderer {
    fn render(&self, scene: &Path, image: &Path) -> Result<()> {
        self.scenes.borrow_mut().push(fs::read_to_string(scene)?);
        if self.fail {
            return Err(Error::Renderer("unsupported plugin".to_string()));
        }
        fs::write(image, b"\x89PNG")?;
        Ok(())
    }
}

fn four_points() -> Vec<Point3f> {
    vec![
        Point3f::new(0.0, 0.0, 0.0),
        Point3f::new(2.0, 0.0, 0.0),
        Point3f::new(0.0, 1.0, 0.0),
        Point3f::new(0.0, 0.0, 0.5),
    ]
}

fn four_colors() -> Vec<[f32; 3]> {
    vec![
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [0.5, 0.5, 0.5],
    ]
}

/// Write the dataset under `<dir>/data` and return a config rendering into `<dir>/out`
fn setup(dir: &Path, points: &[Point3f], extra: &[&str]) -> RenderConfig {
    let root = dir.join("data");
    fs::create_dir_all(&root).unwrap();
    let colors: Vec<[f32; 3]> = four_colors().into_iter().cycle().take(points.len()).collect();
    save_dataset(
        root.join("cloud_"),
        &PointCloud::from_points(points.to_vec()),
        &colors,
    )
    .unwrap();

    let root = root.to_string_lossy().into_owned();
    let workdir = dir.join("out").to_string_lossy().into_owned();
    let mut argv = vec![
        "render-points",
        "--root",
        root.as_str(),
        "--workdir",
        workdir.as_str(),
        "--name",
        "cloud",
    ];
    argv.extend_from_slice(extra);
    RenderConfig::try_from(RenderArgs::try_parse_from(argv).unwrap()).unwrap()
}

#[test]
fn test_four_points_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path(), &four_points(), &[]);
    let renderer = CapturingRenderer::default();

    let outcome = paint_point_cloud(&config, &renderer).unwrap();

    assert_eq!(outcome.points, 4);
    assert_eq!(outcome.box_edges, 0);
    assert_eq!(outcome.fragments, 3 + 4 + 2);
    assert_eq!(outcome.image, dir.path().join("out").join("cloud.png"));
    assert!(outcome.image.exists());
    assert!(!config.scene_path().exists());

    let scenes = renderer.scenes.borrow();
    assert_eq!(scenes.len(), 1);
    let scene = &scenes[0];
    assert_eq!(scene.matches(r#"<shape type="sphere">"#).count(), 4);
    assert_eq!(scene.matches(r#"<shape type="rectangle">"#).count(), 2);
    assert!(scene.contains(r#"value="0,1,0""#));
    assert!(scene.trim_end().ends_with("</scene>"));
}

#[test]
fn test_normalized_points_in_scene() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path(), &four_points(), &[]);
    let dataset = Dataset {
        points: PointCloud::from_points(four_points()),
        colors: Some(four_colors()),
    };

    let prepared = prepare_point_cloud(&config, &dataset, &[]).unwrap();
    assert!(prepared.boxes.is_empty());
    // extents are 2 x 1 x 0.5, scale 2, center (1, 0.5, 0.25)
    // [x, y, z] -> [-z, x, y + 0.0125]
    assert_relative_eq!(
        prepared.cloud[0].position,
        Point3f::new(0.125, -0.5, -0.25 + 0.0125),
        epsilon = 1e-6
    );
    assert_relative_eq!(
        prepared.cloud[1].position,
        Point3f::new(0.125, 0.5, -0.25 + 0.0125),
        epsilon = 1e-6
    );
    assert_relative_eq!(prepared.min_z, -0.25 + 0.0125, epsilon = 1e-6);
    assert_eq!(prepared.cloud[2].color, [0.0, 0.0, 1.0]);

    let document = build_scene(&config, &dataset, &[]).unwrap();
    let text = document.into_string();
    // ground sits one radius below the lowest point
    let ground_z = prepared.min_z - config.radius();
    assert!(text.contains(&format!(r#"<translate x="0" y="0" z="{}"/>"#, ground_z)));
}

#[test]
fn test_gradient_mode_needs_no_colors_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path(), &four_points(), &["--color-mode", "gradient"]);
    fs::remove_file(dir.path().join("data").join("cloud_colors.npy")).unwrap();

    let renderer = CapturingRenderer::default();
    let outcome = paint_point_cloud(&config, &renderer).unwrap();
    assert_eq!(outcome.points, 4);

    let scenes = renderer.scenes.borrow();
    assert!(!scenes[0].contains(r#"value="1,0,0""#));
}

#[test]
fn test_missing_colors_file_in_file_mode() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path(), &four_points(), &[]);
    fs::remove_file(dir.path().join("data").join("cloud_colors.npy")).unwrap();

    let result = paint_point_cloud(&config, &CapturingRenderer::default());
    assert!(matches!(result, Err(Error::FileNotFound { .. })));
}

#[test]
fn test_boxes_follow_the_cloud() {
    let dir = tempfile::tempdir().unwrap();
    let bbox = BoundingBox::from_array([0.5, 0.0, 0.25, 1.0, 0.5, 2.0, 0.3]);
    let mut points: Vec<Point3f> = bbox.corners().to_vec();
    points.push(Point3f::new(3.0, -1.0, 0.5));

    let boxes_path = dir.path().join("boxes.npy");
    NpyWriter::write_npy_file(&boxes_path, &[1, 7], &[0.5, 0.0, 0.25, 1.0, 0.5, 2.0, 0.3]).unwrap();
    let boxes_arg = boxes_path.to_string_lossy().into_owned();

    let config = setup(
        dir.path(),
        &points,
        &[
            "--boxes", boxes_arg.as_str(),
            "--axis", "0,0,1", "--angle", "30",
            "--axis", "1,1,0", "--angle", "-60",
        ],
    );

    let dataset = Dataset {
        points: PointCloud::from_points(points.clone()),
        colors: Some(vec![[0.5, 0.5, 0.5]; points.len()]),
    };
    let prepared = prepare_point_cloud(&config, &dataset, &[bbox]).unwrap();
    assert_eq!(prepared.boxes.len(), 1);
    for (corner, point) in prepared.boxes[0].iter().zip(prepared.cloud.iter()) {
        assert_relative_eq!(*corner, point.position, epsilon = 1e-4);
    }

    let renderer = CapturingRenderer::default();
    let outcome = paint_point_cloud(&config, &renderer).unwrap();
    assert_eq!(outcome.points, 9);
    assert_eq!(outcome.box_edges, 12);
    assert_eq!(outcome.fragments, 3 + 9 + 12 + 2);
    assert_eq!(
        renderer.scenes.borrow()[0].matches(r#"<shape type="cylinder">"#).count(),
        12
    );
}

#[test]
fn test_degenerate_cloud_writes_no_scene() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path(), &[Point3f::new(1.0, 1.0, 1.0); 4], &[]);
    let renderer = CapturingRenderer::default();

    let result = paint_point_cloud(&config, &renderer);
    assert!(matches!(result, Err(Error::DegenerateGeometry(_))));
    assert!(!config.scene_path().exists());
    assert!(renderer.scenes.borrow().is_empty());
}

#[test]
fn test_non_finite_coordinates_write_no_scene() {
    let dir = tempfile::tempdir().unwrap();
    let mut points = four_points();
    points[2].y = f32::NAN;
    let config = setup(dir.path(), &points, &[]);
    let renderer = CapturingRenderer::default();

    let result = paint_point_cloud(&config, &renderer);
    assert!(matches!(result, Err(Error::DegenerateGeometry(_))));
    assert!(!config.scene_path().exists());
    assert!(renderer.scenes.borrow().is_empty());
}

/// Reports success like a renderer whose film wrote another format
struct NoImageRenderer;

impl Renderer for NoImageRenderer {
    fn render(&self, _scene: &Path, image: &Path) -> Result<()> {
        fs::write(image.with_extension("exr"), b"exr")?;
        Ok(())
    }
}

#[test]
fn test_success_without_image_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path(), &four_points(), &[]);

    let result = paint_point_cloud(&config, &NoImageRenderer);
    assert!(matches!(result, Err(Error::Renderer(_))));
    assert!(!dir.path().join("out").join("cloud.png").exists());
    assert!(config.scene_path().exists());
}

#[test]
fn test_render_failure_cleanup_policies() {
    let dir = tempfile::tempdir().unwrap();
    let failing = CapturingRenderer {
        fail: true,
        ..Default::default()
    };

    let config = setup(dir.path(), &four_points(), &[]);
    let result = paint_point_cloud(&config, &failing);
    assert!(matches!(result, Err(Error::Renderer(_))));
    let kept: PathBuf = config.scene_path();
    assert!(kept.exists());

    let config = setup(dir.path(), &four_points(), &["--cleanup", "always"]);
    let result = paint_point_cloud(&config, &failing);
    assert!(matches!(result, Err(Error::Renderer(_))));
    assert!(!config.scene_path().exists());
}
