use matchviz_core::Color;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fixed 8-entry palette used for correspondence lines
/// (system red, orange, yellow, green, teal, blue, purple, indigo).
pub const MATCH_PALETTE: [Color; 8] = [
    Color::rgb(1.0, 0.231, 0.188),
    Color::rgb(1.0, 0.584, 0.0),
    Color::rgb(1.0, 0.8, 0.0),
    Color::rgb(0.204, 0.78, 0.349),
    Color::rgb(0.188, 0.69, 0.78),
    Color::rgb(0.0, 0.478, 1.0),
    Color::rgb(0.686, 0.322, 0.871),
    Color::rgb(0.345, 0.337, 0.839),
];

/// Styling for the single-image keypoint and descriptor overlays.
///
/// Defaults: black 80%-alpha tint, red reference strokes, green found
/// strokes, width 1 keypoint circles, width 0.5 descriptor glyphs.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OverlayStyle {
    /// Translucent tint multiplied over the base image
    pub overlay_color: Color,
    pub reference_color: Color,
    pub found_color: Color,
    pub keypoint_line_width: f32,
    pub descriptor_line_width: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            overlay_color: Color::BLACK.with_alpha(0.8),
            reference_color: Color::RED,
            found_color: Color::GREEN,
            keypoint_line_width: 1.0,
            descriptor_line_width: 0.5,
        }
    }
}

/// Styling for side-by-side correspondence rendering.
///
/// Defaults: black 80%-alpha tint, magenta source markers, yellow target
/// markers, [`MATCH_PALETTE`] line colors, every 10th line emphasized at
/// width 2 / alpha 0.5 with the rest at width 0.5 / alpha 0.3.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MatchStyle {
    pub overlay_color: Color,
    pub source_color: Color,
    pub target_color: Color,
    pub marker_line_width: f32,
    /// Line color cycle; must hold at least two entries
    pub palette: Vec<Color>,
    /// Every `emphasis_interval`-th line (0-based) is emphasized
    pub emphasis_interval: usize,
    pub emphasis_line_width: f32,
    pub emphasis_alpha: f32,
    pub line_width: f32,
    pub line_alpha: f32,
}

impl Default for MatchStyle {
    fn default() -> Self {
        Self {
            overlay_color: Color::BLACK.with_alpha(0.8),
            source_color: Color::MAGENTA,
            target_color: Color::YELLOW,
            marker_line_width: 0.5,
            palette: MATCH_PALETTE.to_vec(),
            emphasis_interval: 10,
            emphasis_line_width: 2.0,
            emphasis_alpha: 0.5,
            line_width: 0.5,
            line_alpha: 0.3,
        }
    }
}

impl MatchStyle {
    /// Line color for correspondence index `i`, in input order.
    ///
    /// The cycle is `i % (palette.len() - 1)`: one fewer color than the
    /// palette holds, so the last entry is never selected. This reproduces
    /// the observed behavior of the original renderer and keeps the cycle
    /// period at `palette.len() - 1`.
    pub fn line_color(&self, index: usize) -> Color {
        self.palette[index % (self.palette.len() - 1)]
    }

    /// Line width and stroke alpha for correspondence index `i`
    pub fn line_stroke(&self, index: usize) -> (f32, f32) {
        if index % self.emphasis_interval == 0 {
            (self.emphasis_line_width, self.emphasis_alpha)
        } else {
            (self.line_width, self.line_alpha)
        }
    }
}

#[cfg(feature = "serde")]
macro_rules! style_serialization {
    ($ty:ty) => {
        impl $ty {
            /// Serialize to a pretty JSON string
            pub fn to_json(&self) -> Result<String, serde_json::Error> {
                serde_json::to_string_pretty(self)
            }

            /// Deserialize from a JSON string
            pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
                serde_json::from_str(json)
            }

            /// Save to a JSON file
            pub fn save_json<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
                std::fs::write(path, self.to_json()?)?;
                Ok(())
            }

            /// Load from a JSON file
            pub fn load_json<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
                Ok(Self::from_json(&std::fs::read_to_string(path)?)?)
            }

            /// Serialize to a TOML string
            pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
                toml::to_string_pretty(self)
            }

            /// Deserialize from a TOML string
            pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
                toml::from_str(toml_str)
            }

            /// Save to a TOML file
            pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
                std::fs::write(path, self.to_toml()?)?;
                Ok(())
            }

            /// Load from a TOML file
            pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
                Ok(Self::from_toml(&std::fs::read_to_string(path)?)?)
            }
        }
    };
}

#[cfg(feature = "serde")]
style_serialization!(OverlayStyle);
#[cfg(feature = "serde")]
style_serialization!(MatchStyle);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_defaults() {
        let style = OverlayStyle::default();
        assert_eq!(style.overlay_color, Color::BLACK.with_alpha(0.8));
        assert_eq!(style.reference_color, Color::RED);
        assert_eq!(style.found_color, Color::GREEN);
        assert_eq!(style.keypoint_line_width, 1.0);
        assert_eq!(style.descriptor_line_width, 0.5);
    }

    #[test]
    fn test_match_defaults() {
        let style = MatchStyle::default();
        assert_eq!(style.source_color, Color::MAGENTA);
        assert_eq!(style.target_color, Color::YELLOW);
        assert_eq!(style.palette.len(), 8);
        assert_eq!(style.emphasis_interval, 10);
    }

    #[test]
    fn test_line_color_period_is_palette_minus_one() {
        let style = MatchStyle::default();
        for i in 0..50 {
            assert_eq!(style.line_color(i), style.line_color(i + 7));
        }
        // consecutive indices within one period differ
        assert_ne!(style.line_color(0), style.line_color(1));
    }

    #[test]
    fn test_line_color_never_uses_last_palette_entry() {
        let style = MatchStyle::default();
        let last = style.palette[7];
        for i in 0..100 {
            assert_ne!(style.line_color(i), last);
        }
    }

    #[test]
    fn test_line_stroke_emphasis_rule() {
        let style = MatchStyle::default();
        for i in [0, 10, 20, 130] {
            assert_eq!(style.line_stroke(i), (2.0, 0.5));
        }
        for i in [1, 5, 9, 11, 19, 21] {
            assert_eq!(style.line_stroke(i), (0.5, 0.3));
        }
    }
}
