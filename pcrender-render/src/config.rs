//! Command line arguments and the validated run configuration

use crate::renderer::{CleanupPolicy, DEFAULT_MITSUBA, DEFAULT_VARIANT};
use clap::Parser;
use pcrender_core::{AxisRotation, Color3f, ColorMode, Error, Point3f, Result, Vector3f};
use pcrender_scene::{CameraConfig, DEFAULT_SAMPLE_COUNT};
use std::path::{Path, PathBuf};

/// Render a point cloud to an image through a generated Mitsuba scene
#[derive(Parser, Debug, Clone)]
#[command(name = "render-points", version, about)]
pub struct RenderArgs {
    /// Root directory holding the input arrays
    #[arg(long, default_value = "data")]
    pub root: PathBuf,

    /// Working directory for the scene file and the rendered image
    #[arg(long, default_value = "outputs")]
    pub workdir: PathBuf,

    /// Dataset name; inputs are <root>/<name>_points.npy and <root>/<name>_colors.npy
    #[arg(long, default_value = "test")]
    pub name: String,

    /// Size of the rendered image, WIDTHxHEIGHT
    #[arg(long, default_value = "1000x1000", value_parser = parse_size)]
    pub size: (u32, u32),

    /// Camera position
    #[arg(long, default_value = "2,2,2", value_parser = parse_triple, allow_hyphen_values = true)]
    pub origin: [f32; 3],

    /// Point the camera looks at
    #[arg(long, default_value = "0,0,0", value_parser = parse_triple, allow_hyphen_values = true)]
    pub target: [f32; 3],

    /// Camera up direction
    #[arg(long, default_value = "0,0,1", value_parser = parse_triple, allow_hyphen_values = true)]
    pub up: [f32; 3],

    /// Field of view in degrees
    #[arg(long, default_value_t = 25.0)]
    pub fov: f32,

    /// Radius of the sphere drawn for each point
    #[arg(long, default_value_t = 0.018)]
    pub radius: f32,

    /// Radius of the bars drawn for bounding box edges
    #[arg(long, default_value_t = 0.005)]
    pub bar_radius: f32,

    /// Rotation axis, repeat for a sequence of rotations
    #[arg(
        long = "axis",
        value_parser = parse_triple,
        allow_hyphen_values = true,
        default_values = ["1,0,0", "0,1,0", "0,0,1"]
    )]
    pub axes: Vec<[f32; 3]>,

    /// Rotation angle in degrees, one per --axis
    #[arg(
        long = "angle",
        allow_negative_numbers = true,
        default_values_t = [0.0_f32, 0.0, 0.0]
    )]
    pub angles: Vec<f32>,

    /// RGB color of bounding box bars
    #[arg(long, default_value = "1,0,0", value_parser = parse_triple)]
    pub bar_color: [f32; 3],

    /// Point colors: file, gradient, gray or red
    #[arg(long, default_value = "file")]
    pub color_mode: String,

    /// Optional [k, 7] array of bounding boxes to draw
    #[arg(long)]
    pub boxes: Option<PathBuf>,

    /// Mitsuba executable
    #[arg(long, default_value = DEFAULT_MITSUBA)]
    pub renderer: PathBuf,

    /// Mitsuba variant
    #[arg(long, default_value = DEFAULT_VARIANT)]
    pub variant: String,

    /// Samples per pixel
    #[arg(long, default_value_t = DEFAULT_SAMPLE_COUNT)]
    pub sample_count: u32,

    /// When to delete the intermediate scene file
    #[arg(long, value_enum, default_value_t = CleanupPolicy::OnSuccess)]
    pub cleanup: CleanupPolicy,
}

/// Parse `WIDTHxHEIGHT`
pub fn parse_size(s: &str) -> std::result::Result<(u32, u32), String> {
    let (width, height) = s
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
    let width = width
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid width '{}': {}", width, e))?;
    let height = height
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid height '{}': {}", height, e))?;
    Ok((width, height))
}

/// Parse a comma separated triple such as `2,2,2`
pub fn parse_triple(s: &str) -> std::result::Result<[f32; 3], String> {
    let values = s
        .split(',')
        .map(|v| {
            v.trim()
                .parse::<f32>()
                .map_err(|e| format!("invalid number '{}': {}", v, e))
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    values
        .try_into()
        .map_err(|v: Vec<f32>| format!("expected 3 comma separated values, got {}", v.len()))
}

/// Everything one render needs, checked once and read-only afterwards
#[derive(Debug, Clone)]
pub struct RenderConfig {
    root: PathBuf,
    workdir: PathBuf,
    name: String,
    camera: CameraConfig,
    sample_count: u32,
    radius: f32,
    bar_radius: f32,
    bar_color: Color3f,
    rotations: Vec<AxisRotation>,
    color_mode: ColorMode,
    boxes: Option<PathBuf>,
    renderer: PathBuf,
    variant: String,
    cleanup: CleanupPolicy,
}

fn positive(name: &str, value: f32) -> Result<f32> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(Error::InvalidConfig(format!("{} must be positive, got {}", name, value)))
    }
}

impl TryFrom<RenderArgs> for RenderConfig {
    type Error = Error;

    fn try_from(args: RenderArgs) -> Result<Self> {
        if args.name.is_empty() || args.name.contains(['/', '\\']) {
            return Err(Error::InvalidConfig(format!(
                "dataset name '{}' must be a plain file name",
                args.name
            )));
        }

        let camera = CameraConfig::new(
            Point3f::from(args.origin),
            Point3f::from(args.target),
            Vector3f::from(args.up),
            args.fov,
            args.size.0,
            args.size.1,
        )?;

        if args.sample_count == 0 {
            return Err(Error::InvalidConfig("sample count must be positive".to_string()));
        }
        let radius = positive("point radius", args.radius)?;
        let bar_radius = positive("bar radius", args.bar_radius)?;
        if args.bar_color.iter().any(|c| !c.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "bar color {:?} is not finite",
                args.bar_color
            )));
        }

        if args.axes.len() != args.angles.len() {
            return Err(Error::InvalidConfig(format!(
                "{} rotation axes but {} angles",
                args.axes.len(),
                args.angles.len()
            )));
        }
        let rotations = args
            .axes
            .iter()
            .zip(&args.angles)
            .map(|(axis, &degrees)| {
                let axis = Vector3f::from(*axis);
                if !degrees.is_finite() {
                    return Err(Error::InvalidConfig(format!("rotation angle {} is not finite", degrees)));
                }
                let rotation = AxisRotation::new(axis, degrees);
                rotation.to_transform()?;
                Ok(rotation)
            })
            .collect::<Result<Vec<_>>>()?;

        // unknown names select red, as `colormap` does
        let color_mode = match args.color_mode.parse::<ColorMode>() {
            Ok(mode) => mode,
            Err(never) => match never {},
        };

        Ok(Self {
            root: args.root,
            workdir: args.workdir,
            name: args.name,
            camera,
            sample_count: args.sample_count,
            radius,
            bar_radius,
            bar_color: args.bar_color,
            rotations,
            color_mode,
            boxes: args.boxes,
            renderer: args.renderer,
            variant: args.variant,
            cleanup: args.cleanup,
        })
    }
}

impl RenderConfig {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// `<root>/<name>_`, completed by the array file suffixes
    pub fn input_prefix(&self) -> PathBuf {
        self.root.join(format!("{}_", self.name))
    }

    /// `<workdir>/<name>.xml`
    pub fn scene_path(&self) -> PathBuf {
        self.workdir.join(format!("{}.xml", self.name))
    }

    pub fn camera(&self) -> &CameraConfig {
        &self.camera
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn bar_radius(&self) -> f32 {
        self.bar_radius
    }

    pub fn bar_color(&self) -> Color3f {
        self.bar_color
    }

    pub fn rotations(&self) -> &[AxisRotation] {
        &self.rotations
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    pub fn boxes(&self) -> Option<&Path> {
        self.boxes.as_deref()
    }

    pub fn renderer(&self) -> &Path {
        &self.renderer
    }

    pub fn variant(&self) -> &str {
        &self.variant
    }

    pub fn cleanup(&self) -> CleanupPolicy {
        self.cleanup
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> RenderArgs {
        let mut argv = vec!["render-points"];
        argv.extend_from_slice(extra);
        RenderArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = RenderConfig::try_from(args(&[])).unwrap();

        assert_eq!(config.input_prefix(), Path::new("data").join("test_"));
        assert_eq!(config.scene_path(), Path::new("outputs").join("test.xml"));
        assert_eq!(config.camera().width(), 1000);
        assert_eq!(config.camera().origin(), Point3f::new(2.0, 2.0, 2.0));
        assert_eq!(config.rotations().len(), 3);
        assert!(config.rotations().iter().all(|r| r.degrees == 0.0));
        assert_eq!(config.color_mode(), ColorMode::File);
        assert_eq!(config.cleanup(), CleanupPolicy::OnSuccess);
        assert_eq!(config.sample_count(), 256);
        assert_eq!(config.bar_color(), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_parse_size_and_triple() {
        assert_eq!(parse_size("640x480"), Ok((640, 480)));
        assert!(parse_size("640*480").is_err());
        assert!(parse_size("ax480").is_err());

        assert_eq!(parse_triple("1, -2.5,3"), Ok([1.0, -2.5, 3.0]));
        assert!(parse_triple("1,2").is_err());
        assert!(parse_triple("1,2,x").is_err());
    }

    #[test]
    fn test_malformed_arguments_fail_at_parse_time() {
        assert!(RenderArgs::try_parse_from(["render-points", "--size", "big"]).is_err());
        assert!(RenderArgs::try_parse_from(["render-points", "--origin", "1,2"]).is_err());
    }

    #[test]
    fn test_rotation_sequence_from_flags() {
        let config = RenderConfig::try_from(args(&[
            "--axis", "0,0,1", "--angle", "-90", "--axis", "-1,0,0", "--angle", "45",
        ]))
        .unwrap();

        let rotations = config.rotations();
        assert_eq!(rotations.len(), 2);
        assert_eq!(rotations[0].axis, Vector3f::z());
        assert_eq!(rotations[0].degrees, -90.0);
        assert_eq!(rotations[1].axis, Vector3f::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_validation_errors() {
        let mismatched = args(&["--axis", "0,0,1", "--angle", "10", "--angle", "20"]);
        assert!(matches!(RenderConfig::try_from(mismatched), Err(Error::InvalidConfig(_))));

        let zero_axis = args(&["--axis", "0,0,0", "--angle", "10"]);
        assert!(matches!(RenderConfig::try_from(zero_axis), Err(Error::InvalidConfig(_))));

        let bad_radius = args(&["--radius", "0"]);
        assert!(matches!(RenderConfig::try_from(bad_radius), Err(Error::InvalidConfig(_))));

        let bad_name = args(&["--name", "../escape"]);
        assert!(matches!(RenderConfig::try_from(bad_name), Err(Error::InvalidConfig(_))));

        let bad_camera = args(&["--origin", "0,0,0"]);
        assert!(matches!(RenderConfig::try_from(bad_camera), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_color_mode_and_cleanup_flags() {
        let config = RenderConfig::try_from(args(&[
            "--color-mode", "gradient", "--cleanup", "always", "--boxes", "boxes.npy",
        ]))
        .unwrap();

        assert_eq!(config.color_mode(), ColorMode::Gradient);
        assert_eq!(config.cleanup(), CleanupPolicy::Always);
        assert_eq!(config.boxes(), Some(Path::new("boxes.npy")));
    }

    #[test]
    fn test_unknown_color_mode_selects_red() {
        let config = RenderConfig::try_from(args(&["--color-mode", "sepia"])).unwrap();
        assert_eq!(config.color_mode(), ColorMode::Red);
        assert!(!config.color_mode().uses_file());
    }
}
