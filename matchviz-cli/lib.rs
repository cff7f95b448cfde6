//! High-level glue for the `matchviz` binary: image decoding, JSON feature
//! files, and the render calls. Feature files are plain JSON documents built
//! from the `matchviz-core` types.

use std::path::Path;

use matchviz_core::{Correspondence, Descriptor, Keypoint};
use matchviz_render::{draw_descriptors, draw_keypoints, draw_matches, RenderError};

pub use image::RgbaImage;
pub use matchviz_core::{self, Color, Point2};
pub use matchviz_render::{self, MatchStyle, OverlayStyle};

#[derive(Debug)]
pub enum VizError {
    Image(image::ImageError),
    Json(serde_json::Error),
    Io(std::io::Error),
    Render(RenderError),
}

impl std::fmt::Display for VizError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VizError::Image(e) => write!(f, "Image error: {}", e),
            VizError::Json(e) => write!(f, "Feature file error: {}", e),
            VizError::Io(e) => write!(f, "IO error: {}", e),
            VizError::Render(e) => write!(f, "Render error: {}", e),
        }
    }
}

impl std::error::Error for VizError {}

impl From<image::ImageError> for VizError {
    fn from(err: image::ImageError) -> Self {
        VizError::Image(err)
    }
}

impl From<serde_json::Error> for VizError {
    fn from(err: serde_json::Error) -> Self {
        VizError::Json(err)
    }
}

impl From<std::io::Error> for VizError {
    fn from(err: std::io::Error) -> Self {
        VizError::Io(err)
    }
}

impl From<RenderError> for VizError {
    fn from(err: RenderError) -> Self {
        VizError::Render(err)
    }
}

pub type VizResult<T> = Result<T, VizError>;

/// Keypoint overlay file: `{"reference": [...], "found": [...]}`, either set
/// optional
pub fn load_keypoint_sets<P: AsRef<Path>>(path: P) -> VizResult<(Vec<Keypoint>, Vec<Keypoint>)> {
    #[derive(serde::Deserialize)]
    struct Sets {
        #[serde(default)]
        reference: Vec<Keypoint>,
        #[serde(default)]
        found: Vec<Keypoint>,
    }
    let sets: Sets = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    Ok((sets.reference, sets.found))
}

/// Descriptor overlay file, same shape as the keypoint file
pub fn load_descriptor_sets<P: AsRef<Path>>(path: P) -> VizResult<(Vec<Descriptor>, Vec<Descriptor>)> {
    #[derive(serde::Deserialize)]
    struct Sets {
        #[serde(default)]
        reference: Vec<Descriptor>,
        #[serde(default)]
        found: Vec<Descriptor>,
    }
    let sets: Sets = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    Ok((sets.reference, sets.found))
}

/// Match files are a bare JSON array of correspondences
pub fn load_correspondences<P: AsRef<Path>>(path: P) -> VizResult<Vec<Correspondence>> {
    Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?)
}

/// Decode an image, overlay the keypoint sets from `features`, return the
/// composite
pub fn render_keypoint_overlay<P: AsRef<Path>>(image_path: P, features: P) -> VizResult<RgbaImage> {
    let image = image::open(image_path)?;
    let (reference, found) = load_keypoint_sets(features)?;
    Ok(draw_keypoints(&image, &OverlayStyle::default(), &reference, &found))
}

/// Decode an image, overlay the descriptor sets from `features`, return the
/// composite
pub fn render_descriptor_overlay<P: AsRef<Path>>(image_path: P, features: P) -> VizResult<RgbaImage> {
    let image = image::open(image_path)?;
    let (reference, found) = load_descriptor_sets(features)?;
    Ok(draw_descriptors(&image, &OverlayStyle::default(), &reference, &found)?)
}

/// Decode both images, draw the correspondences from `matches_path` as a
/// side-by-side composite
pub fn render_match_overlay<P: AsRef<Path>>(
    source_path: P,
    target_path: P,
    matches_path: P,
) -> VizResult<RgbaImage> {
    let source = image::open(source_path)?;
    let target = image::open(target_path)?;
    let matches = load_correspondences(matches_path)?;
    Ok(draw_matches(&source, &target, &MatchStyle::default(), &matches)?)
}
