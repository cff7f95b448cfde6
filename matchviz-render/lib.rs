//! Overlay compositing engine for feature-matching diagnostics.
//!
//! Composites keypoint markers, oriented descriptor glyphs, and cross-image
//! correspondence lines onto raster images for visual inspection. Three
//! entry operations share one pipeline: allocate a canvas, blit the source
//! image(s) under a vertical-flip transform, multiply a dimming tint over
//! the base, then stroke markers and lines with screen blending so overlaps
//! lighten instead of occluding.
//!
//! Every operation is a pure function from (images + feature lists + style)
//! to an output image; no state survives a call.
//!
//! ```no_run
//! use matchviz_core::{Keypoint, Point2};
//! use matchviz_render::{draw_keypoints, OverlayStyle};
//!
//! let image = image::open("frame.png").unwrap();
//! let found = vec![Keypoint::new(Point2::new(120.0, 80.0), 3.5)];
//! let overlay = draw_keypoints(&image, &OverlayStyle::default(), &[], &found);
//! overlay.save("frame_keypoints.png").unwrap();
//! ```

pub mod canvas;
pub mod error;
pub mod renderer;
pub mod style;

pub use canvas::{BlendMode, Canvas, StateScope, Transform};
pub use error::{RenderError, RenderResult};
pub use renderer::{draw_descriptors, draw_keypoints, draw_matches};
pub use style::{MatchStyle, OverlayStyle, MATCH_PALETTE};
