//! Render invocation
//!
//! The renderer itself is an external program. This module hands it a scene
//! file, places the image next to it and removes the scene file afterwards.
//! Mitsuba's `hdrfilm` only writes high dynamic range formats, so its linear
//! OpenEXR output is converted to an 8-bit sRGB PNG.

use clap::ValueEnum;
use image::{ImageFormat, Rgb, RgbImage};
use log::{debug, info, warn};
use pcrender_core::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Executable looked up on `PATH` unless configured otherwise
pub const DEFAULT_MITSUBA: &str = "mitsuba";

/// Mitsuba variant used for rendering
pub const DEFAULT_VARIANT: &str = "scalar_rgb";

/// Extension of the rendered image
pub const IMAGE_EXTENSION: &str = "png";

/// Extension of the linear image Mitsuba writes before conversion
pub const HDR_EXTENSION: &str = "exr";

/// Turns a scene description file into an image file
pub trait Renderer {
    fn render(&self, scene: &Path, image: &Path) -> Result<()>;
}

/// The Mitsuba command line renderer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MitsubaRenderer {
    executable: PathBuf,
    variant: String,
}

impl MitsubaRenderer {
    pub fn new(executable: impl Into<PathBuf>, variant: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            variant: variant.into(),
        }
    }

    /// The command that renders `scene` into `image`
    pub fn command(&self, scene: &Path, image: &Path) -> Command {
        let mut command = Command::new(&self.executable);
        command
            .arg("-m")
            .arg(&self.variant)
            .arg("-o")
            .arg(image)
            .arg(scene);
        command
    }
}

impl Default for MitsubaRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_MITSUBA, DEFAULT_VARIANT)
    }
}

impl Renderer for MitsubaRenderer {
    fn render(&self, scene: &Path, image: &Path) -> Result<()> {
        info!(
            "rendering {} with {} ({})",
            scene.display(),
            self.executable.display(),
            self.variant
        );
        let hdr = image.with_extension(HDR_EXTENSION);
        let output = self
            .command(scene, &hdr)
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                Error::Renderer(format!(
                    "failed to launch {}: {}",
                    self.executable.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            return Err(Error::Renderer(format!(
                "{} exited with {}: {}",
                self.executable.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        tonemap_to_png(&hdr, image)?;
        if let Err(e) = fs::remove_file(&hdr) {
            warn!("could not remove {}: {}", hdr.display(), e);
        }
        Ok(())
    }
}

/// Linear channel value to an 8-bit sRGB value, clamped to `[0, 1]` first
pub fn linear_to_srgb8(value: f32) -> u8 {
    let v = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
    let encoded = if v <= 0.003_130_8 {
        12.92 * v
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    };
    (encoded * 255.0).round() as u8
}

/// Convert a linear high dynamic range image into an 8-bit sRGB PNG
pub fn tonemap_to_png(hdr: &Path, png: &Path) -> Result<()> {
    let linear = image::open(hdr)
        .map_err(|e| Error::Renderer(format!("cannot read {}: {}", hdr.display(), e)))?
        .to_rgb32f();

    let ldr = RgbImage::from_fn(linear.width(), linear.height(), |x, y| {
        Rgb(linear.get_pixel(x, y).0.map(linear_to_srgb8))
    });
    ldr.save_with_format(png, ImageFormat::Png)
        .map_err(|e| Error::Renderer(format!("cannot write {}: {}", png.display(), e)))?;

    debug!("converted {} to {}", hdr.display(), png.display());
    Ok(())
}

/// When the intermediate scene file is removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CleanupPolicy {
    /// Remove after a successful render; keep it for inspection otherwise
    #[default]
    OnSuccess,
    /// Remove whether or not the render succeeded
    Always,
}

/// Image path for a scene file: same location and stem, `.png` extension
pub fn image_path_for(scene: &Path) -> PathBuf {
    scene.with_extension(IMAGE_EXTENSION)
}

/// Render `scene` next to itself and remove it according to `cleanup`.
///
/// Fails with [`Error::FileNotFound`] if the scene file is missing, with
/// [`Error::Renderer`] if the renderer reports success without producing the
/// image, and propagates any other renderer failure unchanged.
pub fn render_scene_file<R: Renderer + ?Sized>(
    renderer: &R,
    scene: &Path,
    cleanup: CleanupPolicy,
) -> Result<PathBuf> {
    if !scene.is_file() {
        return Err(Error::FileNotFound {
            path: scene.display().to_string(),
        });
    }

    let image = image_path_for(scene);
    // a stale image from an earlier run must not pass for this one
    if image.exists() {
        fs::remove_file(&image)?;
    }

    let result = renderer.render(scene, &image).and_then(|()| {
        if image.is_file() {
            Ok(())
        } else {
            Err(Error::Renderer(format!(
                "renderer finished but wrote no image at {}",
                image.display()
            )))
        }
    });

    match (&result, cleanup) {
        (Ok(()), _) | (Err(_), CleanupPolicy::Always) => {
            if let Err(e) = fs::remove_file(scene) {
                if result.is_ok() {
                    return Err(e.into());
                }
                warn!("could not remove {}: {}", scene.display(), e);
            }
        }
        (Err(_), CleanupPolicy::OnSuccess) => {
            warn!("render failed, keeping {}", scene.display());
        }
    }

    result.map(|()| image)
}
