//! Scene document assembly
//!
//! A scene is an append-only list of text fragments: three head fragments,
//! one fragment per point and per box edge, then two tail fragments. The
//! text is concatenated once, when the document is consumed.

use crate::camera::CameraConfig;
use crate::templates::{self, CylinderArgs, GroundArgs, NoArgs, SphereArgs};
use log::debug;
use pcrender_core::{edge_segments, Color3f, ColoredPoint3f, Point3f, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Number of fragments opening every document
pub const HEAD_FRAGMENTS: usize = 3;

/// Number of fragments closing every document
pub const TAIL_FRAGMENTS: usize = 2;

/// What a fragment describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentKind {
    Head,
    Point,
    BoxEdge,
    Tail,
}

/// One piece of scene markup
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub kind: FragmentKind,
    pub text: String,
}

/// Ordered fragments of one scene description
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneDocument {
    fragments: Vec<Fragment>,
}

impl SceneDocument {
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Number of fragments of a given kind
    pub fn count(&self, kind: FragmentKind) -> usize {
        self.fragments.iter().filter(|f| f.kind == kind).count()
    }

    fn push(&mut self, kind: FragmentKind, text: String) {
        self.fragments.push(Fragment { kind, text });
    }

    /// Concatenate all fragments into the final markup
    pub fn into_string(self) -> String {
        let total = self.fragments.iter().map(|f| f.text.len()).sum();
        let mut out = String::with_capacity(total);
        for fragment in &self.fragments {
            out.push_str(&fragment.text);
        }
        out
    }

    /// Write the markup to `path`, replacing any existing file
    pub fn write_to<P: AsRef<Path>>(self, path: P) -> Result<()> {
        let path = path.as_ref();
        debug!("writing {} scene fragments to {}", self.len(), path.display());
        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(self.into_string().as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

/// The three head fragments: camera transform, sensor, film and ground material
pub fn init_head(camera: &CameraConfig, sample_count: u32) -> [String; HEAD_FRAGMENTS] {
    [
        templates::fill(templates::HEAD_TRANSFORM, &camera.look_at_args()),
        templates::fill(templates::HEAD_SENSOR, &camera.sensor_args(sample_count)),
        templates::fill(templates::HEAD_FILM, &camera.film_args()),
    ]
}

/// The two tail fragments: ground rectangle at `min_z - radius` and the area light
pub fn init_tail(radius: f32, min_z: f32) -> [String; TAIL_FRAGMENTS] {
    [
        templates::fill(templates::GROUND, &GroundArgs { z: min_z - radius }),
        templates::fill(templates::AREA_LIGHT, &NoArgs),
    ]
}

/// Builds a [`SceneDocument`] head first, body in insertion order, tail last
#[derive(Debug)]
pub struct SceneBuilder {
    document: SceneDocument,
}

impl SceneBuilder {
    /// Start a document with the head fragments for `camera`
    pub fn new(camera: &CameraConfig, sample_count: u32) -> Self {
        let mut document = SceneDocument::default();
        for text in init_head(camera, sample_count) {
            document.push(FragmentKind::Head, text);
        }
        Self { document }
    }

    /// Add one sphere
    pub fn add_point(&mut self, point: &ColoredPoint3f, radius: f32) -> &mut Self {
        let args = SphereArgs {
            radius,
            center: point.position,
            color: point.color,
        };
        self.document
            .push(FragmentKind::Point, templates::fill(templates::SPHERE, &args));
        self
    }

    /// Add one sphere per point, in order
    pub fn add_point_cloud<'a, I>(&mut self, points: I, radius: f32) -> &mut Self
    where
        I: IntoIterator<Item = &'a ColoredPoint3f>,
    {
        for point in points {
            self.add_point(point, radius);
        }
        self
    }

    /// Add the 12 edges of a box as cylinders of one color
    pub fn add_bbox(&mut self, corners: &[Point3f; 8], color: Color3f, bar_radius: f32) -> &mut Self {
        for (start, end) in edge_segments(corners) {
            let args = CylinderArgs {
                radius: bar_radius,
                start,
                end,
                color,
            };
            self.document
                .push(FragmentKind::BoxEdge, templates::fill(templates::CYLINDER, &args));
        }
        self
    }

    /// Close the document with the ground and light fragments
    pub fn finish(mut self, radius: f32, min_z: f32) -> SceneDocument {
        for text in init_tail(radius, min_z) {
            self.document.push(FragmentKind::Tail, text);
        }
        debug!(
            "scene assembled: {} points, {} box edges",
            self.document.count(FragmentKind::Point),
            self.document.count(FragmentKind::BoxEdge)
        );
        self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcrender_core::box_center_to_corner;

    fn sample_points() -> Vec<ColoredPoint3f> {
        vec![
            ColoredPoint3f::new(Point3f::new(0.0, 0.0, 0.1), [1.0, 0.0, 0.0]),
            ColoredPoint3f::new(Point3f::new(0.5, 0.0, 0.2), [0.0, 1.0, 0.0]),
            ColoredPoint3f::new(Point3f::new(0.0, 0.5, 0.3), [0.0, 0.0, 1.0]),
        ]
    }

    #[test]
    fn test_fragment_order_and_counts() {
        let mut builder = SceneBuilder::new(&CameraConfig::default(), 64);
        builder.add_point_cloud(&sample_points(), 0.02);
        let document = builder.finish(0.02, 0.1);

        assert_eq!(document.len(), HEAD_FRAGMENTS + 3 + TAIL_FRAGMENTS);
        assert_eq!(document.count(FragmentKind::Head), 3);
        assert_eq!(document.count(FragmentKind::Point), 3);
        assert_eq!(document.count(FragmentKind::Tail), 2);

        let kinds: Vec<_> = document.fragments().iter().map(|f| f.kind).collect();
        assert_eq!(kinds.first(), Some(&FragmentKind::Head));
        assert_eq!(kinds.last(), Some(&FragmentKind::Tail));
        assert!(document.fragments()[4].text.contains(r#"<translate x="0.5" y="0" z="0.2"/>"#));
    }

    #[test]
    fn test_head_embeds_camera() {
        let camera = CameraConfig::new(
            Point3f::new(3.0, 1.0, 2.0),
            Point3f::new(0.0, 0.0, 0.5),
            pcrender_core::Vector3f::z(),
            30.0,
            640,
            480,
        )
        .unwrap();
        let text = init_head(&camera, 128).concat();

        assert!(text.starts_with("\n<scene version=\"0.5.0\">"));
        assert!(text.contains(r#"<lookat origin="3,1,2" target="0,0,0.5" up="0,0,1"/>"#));
        assert!(text.contains(r#"<float name="fov" value="30"/>"#));
        assert!(text.contains(r#"<integer name="sampleCount" value="128"/>"#));
        assert!(text.contains(r#"<integer name="width" value="640"/>"#));
        assert!(text.contains(r#"<integer name="height" value="480"/>"#));
    }

    #[test]
    fn test_tail_places_ground_below_lowest_sphere() {
        let [ground, light] = init_tail(0.25, 0.5);
        assert!(ground.contains(r#"<translate x="0" y="0" z="0.25"/>"#));
        assert!(light.trim_end().ends_with("</scene>"));
    }

    #[test]
    fn test_bbox_adds_twelve_cylinders() {
        let corners = box_center_to_corner([0.0, 0.0, 0.0, 2.0, 2.0, 2.0, 0.0]);
        let mut builder = SceneBuilder::new(&CameraConfig::default(), 64);
        builder.add_bbox(&corners, [0.0, 0.0, 1.0], 0.005);
        let document = builder.finish(0.02, 0.0);

        assert_eq!(document.count(FragmentKind::BoxEdge), 12);
        let text = document.into_string();
        assert_eq!(text.matches(r#"<shape type="cylinder">"#).count(), 12);
        assert_eq!(text.matches(r#"<bsdf type="twosided">"#).count(), 12);
    }

    #[test]
    fn test_document_writes_concatenation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.xml");

        let mut builder = SceneBuilder::new(&CameraConfig::default(), 64);
        builder.add_point_cloud(&sample_points(), 0.02);
        let document = builder.finish(0.02, 0.1);
        let expected = document.clone().into_string();

        document.write_to(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), expected);
        assert_eq!(expected.matches(r#"<shape type="sphere">"#).count(), 3);
    }
}
