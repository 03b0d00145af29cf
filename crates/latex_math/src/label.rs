//! Math Label - a LaTeX string laid out inside a box
//!
//! [`MathLabel`] owns the source string and a [`LabelConfig`]. It parses
//! eagerly, typesets on demand and places the display inside the bounds
//! it is given.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::display::{Display, Point, Size};
use crate::error::{MathResult, ParseError};
use crate::font::{FontMetrics, MathTable, ScaledFont};
use crate::model::{LineStyle, MathList};
use crate::parser::parse;
use crate::render::{Color, RenderOutput, Renderer};
use crate::typesetter::typeset;

// =============================================================================
// Configuration
// =============================================================================

/// Whether the label is typeset as a display or inline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelMode {
    #[default]
    Display,
    Text,
}

impl LabelMode {
    pub fn line_style(self) -> LineStyle {
        match self {
            LabelMode::Display => LineStyle::Display,
            LabelMode::Text => LineStyle::Text,
        }
    }
}

/// Horizontal placement of the display inside the label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Padding between the label bounds and its content
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeInsets {
    pub top: f32,
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
}

impl EdgeInsets {
    pub fn new(top: f32, left: f32, bottom: f32, right: f32) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    pub fn uniform(inset: f32) -> Self {
        Self::new(inset, inset, inset, inset)
    }
}

/// Label settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// Font size in points
    pub font_size: f32,
    pub mode: LabelMode,
    pub alignment: TextAlignment,
    pub content_insets: EdgeInsets,
    pub text_color: Color,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            font_size: 20.0,
            mode: LabelMode::default(),
            alignment: TextAlignment::default(),
            content_insets: EdgeInsets::default(),
            text_color: Color::BLACK,
        }
    }
}

impl LabelConfig {
    pub fn from_json(json: &str) -> MathResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a config file. A missing or malformed file gives the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Failed to read label config {:?}, using defaults: {}", path, e);
                return Self::default();
            }
        };
        match Self::from_json(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to parse label config, using defaults: {}", e);
                Self::default()
            }
        }
    }
}

// =============================================================================
// Label
// =============================================================================

pub struct MathLabel {
    latex: String,
    config: LabelConfig,
    metrics: Arc<dyn FontMetrics>,
    math_list: Option<MathList>,
    error: Option<ParseError>,
    display: Option<Display>,
}

impl std::fmt::Debug for MathLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MathLabel")
            .field("latex", &self.latex)
            .field("config", &self.config)
            .field("error", &self.error)
            .finish()
    }
}

impl MathLabel {
    /// A label using the built-in approximate math table
    pub fn new(latex: impl Into<String>, config: LabelConfig) -> Self {
        Self::with_metrics(latex, config, MathTable::shared_approximate())
    }

    pub fn with_metrics(
        latex: impl Into<String>,
        config: LabelConfig,
        metrics: Arc<dyn FontMetrics>,
    ) -> Self {
        let mut label = Self {
            latex: String::new(),
            config,
            metrics,
            math_list: None,
            error: None,
            display: None,
        };
        label.set_latex(latex);
        label
    }

    pub fn latex(&self) -> &str {
        &self.latex
    }

    /// Replace the source and reparse it
    pub fn set_latex(&mut self, latex: impl Into<String>) {
        self.latex = latex.into();
        self.display = None;
        match parse(&self.latex) {
            Ok(list) => {
                self.math_list = Some(list);
                self.error = None;
            }
            Err(error) => {
                self.math_list = None;
                self.error = Some(error);
            }
        }
    }

    pub fn config(&self) -> &LabelConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: LabelConfig) {
        self.config = config;
        self.display = None;
    }

    pub fn math_list(&self) -> Option<&MathList> {
        self.math_list.as_ref()
    }

    /// The error from the last parse, if it failed
    pub fn error(&self) -> Option<&ParseError> {
        self.error.as_ref()
    }

    /// The typeset display, `None` when the source did not parse
    pub fn display(&mut self) -> Option<&Display> {
        if self.display.is_none() {
            let list = self.math_list.as_ref()?;
            let font = ScaledFont::new(Arc::clone(&self.metrics), self.config.font_size);
            let mut display = typeset(list, &font, self.config.mode.line_style());
            let color = display.local_text_color.or(Some(self.config.text_color));
            display.set_text_color(color);
            self.display = Some(display);
        }
        self.display.as_ref()
    }

    /// Smallest size holding the display and the insets
    pub fn size_that_fits(&mut self) -> Size {
        let insets = self.config.content_insets;
        let (width, height) = self
            .display()
            .map_or((0.0, 0.0), |display| (display.width, display.ascent + display.descent));
        Size::new(
            width + insets.left + insets.right,
            height + insets.top + insets.bottom,
        )
    }

    /// The display positioned inside `bounds`. The baseline sits at the
    /// returned display's `position.y`, measured up from the bottom edge.
    pub fn layout(&mut self, bounds: Size) -> Option<&Display> {
        let insets = self.config.content_insets;
        let alignment = self.config.alignment;
        let half_font = self.config.font_size / 2.0;
        self.display()?;
        let display = self.display.as_mut()?;

        let x = match alignment {
            TextAlignment::Left => insets.left,
            TextAlignment::Center => {
                (bounds.width - insets.left - insets.right - display.width) / 2.0 + insets.left
            }
            TextAlignment::Right => bounds.width - display.width - insets.right,
        };
        let available = bounds.height - insets.top - insets.bottom;
        let height = (display.ascent + display.descent).max(half_font);
        let y = (available - height) / 2.0 + display.descent + insets.bottom;
        display.position = Point::new(x, y);
        Some(display)
    }

    /// Lay out inside `bounds` and record the drawing
    pub fn render(&mut self, bounds: Size) -> Option<RenderOutput> {
        self.layout(bounds).map(Renderer::render)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseErrorKind;

    #[test]
    fn test_config_defaults() {
        let config = LabelConfig::default();
        assert_eq!(config.font_size, 20.0);
        assert_eq!(config.mode, LabelMode::Display);
        assert_eq!(config.alignment, TextAlignment::Left);
        assert_eq!(config.text_color, Color::BLACK);
    }

    #[test]
    fn test_config_partial_json() {
        let config =
            LabelConfig::from_json(r#"{"font_size": 12, "alignment": "center", "mode": "text"}"#)
                .unwrap();
        assert_eq!(config.font_size, 12.0);
        assert_eq!(config.alignment, TextAlignment::Center);
        assert_eq!(config.mode, LabelMode::Text);
        assert_eq!(config.content_insets, EdgeInsets::default());
    }

    #[test]
    fn test_config_bad_file_falls_back() {
        let path = std::env::temp_dir().join("latex_math_label_bad_config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(LabelConfig::load_or_default(&path), LabelConfig::default());
        std::fs::remove_file(&path).ok();

        let missing = std::env::temp_dir().join("latex_math_label_missing.json");
        assert_eq!(LabelConfig::load_or_default(&missing), LabelConfig::default());
    }

    #[test]
    fn test_parse_error_reported() {
        let mut label = MathLabel::new("\\frac{a", LabelConfig::default());
        assert_eq!(
            label.error().map(|error| error.kind),
            Some(ParseErrorKind::MismatchBraces)
        );
        assert!(label.display().is_none());
        assert!(label.render(Size::new(100.0, 40.0)).is_none());

        label.set_latex("x");
        assert!(label.error().is_none());
        assert!(label.display().is_some());
    }

    #[test]
    fn test_size_that_fits() {
        let config = LabelConfig {
            content_insets: EdgeInsets::new(1.0, 2.0, 3.0, 4.0),
            ..LabelConfig::default()
        };
        let mut label = MathLabel::new("x^2", config);
        let (width, height) = {
            let display = label.display().unwrap();
            (display.width, display.ascent + display.descent)
        };
        let size = label.size_that_fits();
        assert!((size.width - (width + 6.0)).abs() < 1e-4);
        assert!((size.height - (height + 4.0)).abs() < 1e-4);

        let mut broken = MathLabel::new("}", LabelConfig::default());
        assert_eq!(broken.size_that_fits(), Size::new(0.0, 0.0));
    }

    #[test]
    fn test_alignment() {
        let bounds = Size::new(200.0, 60.0);
        let insets = EdgeInsets::uniform(5.0);

        let mut label = MathLabel::new(
            "a+b",
            LabelConfig {
                content_insets: insets,
                ..LabelConfig::default()
            },
        );
        let left = label.layout(bounds).unwrap().position.x;
        assert_eq!(left, 5.0);

        label.set_config(LabelConfig {
            content_insets: insets,
            alignment: TextAlignment::Right,
            ..LabelConfig::default()
        });
        let display = label.layout(bounds).unwrap();
        assert!((display.position.x + display.width - 195.0).abs() < 1e-4);

        label.set_config(LabelConfig {
            content_insets: insets,
            alignment: TextAlignment::Center,
            ..LabelConfig::default()
        });
        let display = label.layout(bounds).unwrap();
        let center = display.position.x + display.width / 2.0;
        assert!((center - 100.0).abs() < 1e-4);
    }

    #[test]
    fn test_vertical_position() {
        let mut label = MathLabel::new("x", LabelConfig::default());
        let display = label.layout(Size::new(100.0, 50.0)).unwrap();
        let height = (display.ascent + display.descent).max(10.0);
        let expected = (50.0 - height) / 2.0 + display.descent;
        assert!((display.position.y - expected).abs() < 1e-4);
    }

    #[test]
    fn test_vertical_position_with_insets() {
        let config = LabelConfig {
            content_insets: EdgeInsets::new(10.0, 0.0, 0.0, 0.0),
            ..LabelConfig::default()
        };
        let mut label = MathLabel::new("x", config);
        let display = label.layout(Size::new(100.0, 50.0)).unwrap();
        let height = (display.ascent + display.descent).max(10.0);
        let expected = (40.0 - height) / 2.0 + display.descent;
        assert!((display.position.y - expected).abs() < 1e-4);

        let config = LabelConfig {
            content_insets: EdgeInsets::new(4.0, 0.0, 12.0, 0.0),
            ..LabelConfig::default()
        };
        let mut label = MathLabel::new("x", config);
        let display = label.layout(Size::new(100.0, 50.0)).unwrap();
        let height = (display.ascent + display.descent).max(10.0);
        let expected = (34.0 - height) / 2.0 + display.descent + 12.0;
        assert!((display.position.y - expected).abs() < 1e-4);
    }

    #[test]
    fn test_text_color_applied() {
        let config = LabelConfig {
            text_color: Color::RED,
            ..LabelConfig::default()
        };
        let mut label = MathLabel::new("x", config);
        assert_eq!(label.display().unwrap().text_color, Some(Color::RED));
    }

    #[test]
    fn test_text_mode_is_smaller_for_large_ops() {
        let mut display_label = MathLabel::new("\\sum_{i}^{n} i", LabelConfig::default());
        let mut text_label = MathLabel::new(
            "\\sum_{i}^{n} i",
            LabelConfig {
                mode: LabelMode::Text,
                ..LabelConfig::default()
            },
        );
        let display_height = display_label.size_that_fits().height;
        let text_height = text_label.size_that_fits().height;
        assert!(text_height < display_height);
    }
}
