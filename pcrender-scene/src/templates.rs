//! Scene description templates
//!
//! Each template is a fixed block of Mitsuba scene markup with `{name}`
//! placeholders. Placeholders are filled from an argument struct implementing
//! [`Bindings`]; values are inserted as plain decimal text without escaping.

use pcrender_core::{Color3f, Point3f, Vector3f};

/// Camera transform; opens the document
pub const HEAD_TRANSFORM: &str = r#"
<scene version="0.5.0">
    <integrator type="path">
        <integer name="maxDepth" value="-1"/>
    </integrator>
    <sensor type="perspective">
        <float name="farClip" value="100"/>
        <float name="nearClip" value="0.1"/>
        <transform name="toWorld">
            <lookat origin="{origin_x},{origin_y},{origin_z}" target="{target_x},{target_y},{target_z}" up="{up_x},{up_y},{up_z}"/>"#;

/// Field of view and sampler
pub const HEAD_SENSOR: &str = r#"
        </transform>
        <float name="fov" value="{fov}"/>

        <sampler type="ldsampler">
            <integer name="sampleCount" value="{sample_count}"/>
        </sampler>"#;

/// Film size, closes the sensor and defines the ground material
pub const HEAD_FILM: &str = r#"
        <film type="hdrfilm">
            <integer name="width" value="{width}"/>
            <integer name="height" value="{height}"/>
            <rfilter type="gaussian"/>
            <boolean name="banner" value="false"/>
        </film>
    </sensor>

    <bsdf type="roughplastic" id="surfaceMaterial">
        <string name="distribution" value="ggx"/>
        <float name="alpha" value="0.05"/>
        <float name="intIOR" value="1.46"/>
        <rgb name="diffuseReflectance" value="1,1,1"/>
    </bsdf>
"#;

/// One sphere per point
pub const SPHERE: &str = r#"
    <shape type="sphere">
        <float name="radius" value="{radius}"/>
        <transform name="toWorld">
            <translate x="{x}" y="{y}" z="{z}"/>
        </transform>
        <bsdf type="diffuse">
            <rgb name="reflectance" value="{r},{g},{b}"/>
        </bsdf>
    </shape>
"#;

/// One cylinder per bounding box edge
pub const CYLINDER: &str = r#"
    <shape type="cylinder">
        <float name="radius" value="{radius}"/>
        <point name="p0" x="{x0}" y="{y0}" z="{z0}"/>
        <point name="p1" x="{x1}" y="{y1}" z="{z1}"/>
        <bsdf type="twosided">
            <bsdf type="diffuse">
                <rgb name="reflectance" value="{r},{g},{b}"/>
            </bsdf>
        </bsdf>
    </shape>
"#;

/// Ground rectangle using the shared surface material
pub const GROUND: &str = r#"
    <shape type="rectangle">
        <ref name="bsdf" id="surfaceMaterial"/>
        <transform name="toWorld">
            <scale x="10" y="10" z="1"/>
            <translate x="0" y="0" z="{z}"/>
        </transform>
    </shape>
"#;

/// Area light above the scene; closes the document
pub const AREA_LIGHT: &str = r#"
    <shape type="rectangle">
        <transform name="toWorld">
            <scale x="10" y="10" z="1"/>
            <lookat origin="-4,4,20" target="0,0,0" up="0,0,1"/>
        </transform>
        <emitter type="area">
            <rgb name="radiance" value="6,6,6"/>
        </emitter>
    </shape>
</scene>
"#;

/// Named values substituted into a template
pub trait Bindings {
    fn bindings(&self) -> Vec<(&'static str, String)>;
}

/// Substitute every `{name}` in `template` from `args`.
///
/// Placeholders without a binding are copied through unchanged.
pub fn fill<B: Bindings>(template: &str, args: &B) -> String {
    let bindings = args.bindings();
    let mut out = String::with_capacity(template.len() + bindings.len() * 8);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                match bindings.iter().find(|(key, _)| *key == name) {
                    Some((_, value)) => out.push_str(value),
                    None => out.push_str(&rest[open..open + close + 2]),
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// No placeholders
pub struct NoArgs;

impl Bindings for NoArgs {
    fn bindings(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

/// [`HEAD_TRANSFORM`] arguments
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookAtArgs {
    pub origin: Point3f,
    pub target: Point3f,
    pub up: Vector3f,
}

impl Bindings for LookAtArgs {
    fn bindings(&self) -> Vec<(&'static str, String)> {
        vec![
            ("origin_x", self.origin.x.to_string()),
            ("origin_y", self.origin.y.to_string()),
            ("origin_z", self.origin.z.to_string()),
            ("target_x", self.target.x.to_string()),
            ("target_y", self.target.y.to_string()),
            ("target_z", self.target.z.to_string()),
            ("up_x", self.up.x.to_string()),
            ("up_y", self.up.y.to_string()),
            ("up_z", self.up.z.to_string()),
        ]
    }
}

/// [`HEAD_SENSOR`] arguments
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorArgs {
    pub fov: f32,
    pub sample_count: u32,
}

impl Bindings for SensorArgs {
    fn bindings(&self) -> Vec<(&'static str, String)> {
        vec![
            ("fov", self.fov.to_string()),
            ("sample_count", self.sample_count.to_string()),
        ]
    }
}

/// [`HEAD_FILM`] arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilmArgs {
    pub width: u32,
    pub height: u32,
}

impl Bindings for FilmArgs {
    fn bindings(&self) -> Vec<(&'static str, String)> {
        vec![
            ("width", self.width.to_string()),
            ("height", self.height.to_string()),
        ]
    }
}

fn color_bindings(color: &Color3f) -> [(&'static str, String); 3] {
    [
        ("r", color[0].to_string()),
        ("g", color[1].to_string()),
        ("b", color[2].to_string()),
    ]
}

/// [`SPHERE`] arguments
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereArgs {
    pub radius: f32,
    pub center: Point3f,
    pub color: Color3f,
}

impl Bindings for SphereArgs {
    fn bindings(&self) -> Vec<(&'static str, String)> {
        let mut bindings = vec![
            ("radius", self.radius.to_string()),
            ("x", self.center.x.to_string()),
            ("y", self.center.y.to_string()),
            ("z", self.center.z.to_string()),
        ];
        bindings.extend(color_bindings(&self.color));
        bindings
    }
}

/// [`CYLINDER`] arguments
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CylinderArgs {
    pub radius: f32,
    pub start: Point3f,
    pub end: Point3f,
    pub color: Color3f,
}

impl Bindings for CylinderArgs {
    fn bindings(&self) -> Vec<(&'static str, String)> {
        let mut bindings = vec![
            ("radius", self.radius.to_string()),
            ("x0", self.start.x.to_string()),
            ("y0", self.start.y.to_string()),
            ("z0", self.start.z.to_string()),
            ("x1", self.end.x.to_string()),
            ("y1", self.end.y.to_string()),
            ("z1", self.end.z.to_string()),
        ];
        bindings.extend(color_bindings(&self.color));
        bindings
    }
}

/// [`GROUND`] arguments
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundArgs {
    pub z: f32,
}

impl Bindings for GroundArgs {
    fn bindings(&self) -> Vec<(&'static str, String)> {
        vec![("z", self.z.to_string())]
    }
}
