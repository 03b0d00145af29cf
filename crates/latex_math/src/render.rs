//! Math Rendering - paint a display tree onto a canvas
//!
//! [`Canvas`] is the drawing contract a backend implements. [`Renderer`]
//! is a canvas that records [`RenderPrimitive`]s, for tests and for
//! serializing a layout.

use crate::display::{Display, DisplayKind, Point, Rect};
use crate::font::GlyphId;
use serde::{Deserialize, Serialize};

// =============================================================================
// Color
// =============================================================================

/// A color in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);

    /// Parse `#rrggbb`. Anything else is `None`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if digits.len() != 6 || !digits.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return None;
        }
        let value = u32::from_str_radix(digits, 16).ok()?;
        Some(Self::rgb(
            ((value >> 16) & 0xFF) as u8,
            ((value >> 8) & 0xFF) as u8,
            (value & 0xFF) as u8,
        ))
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

// =============================================================================
// Canvas
// =============================================================================

/// A drawing surface. Coordinates are y-up, in points.
pub trait Canvas {
    /// Draw a run of text whose glyphs start at `positions`
    fn draw_text(
        &mut self,
        text: &str,
        glyphs: &[GlyphId],
        positions: &[Point],
        font_size: f32,
        color: Color,
    );

    fn draw_glyphs(&mut self, glyphs: &[GlyphId], positions: &[Point], font_size: f32, color: Color);

    fn stroke_line(&mut self, from: Point, to: Point, thickness: f32, color: Color);

    fn fill_rect(&mut self, rect: Rect, color: Color);
}

impl Display {
    /// Paint this display with its origin at the canvas origin
    pub fn draw(&self, canvas: &mut dyn Canvas) {
        self.draw_at(canvas, Point::origin());
    }

    /// Paint this display relative to a parent whose origin is at `origin`
    fn draw_at(&self, canvas: &mut dyn Canvas, origin: Point) {
        let here = origin.offset(self.position.x, self.position.y);
        let color = self.text_color.unwrap_or_default();

        if let Some(background) = self.local_background_color {
            let bounds = self.bounds();
            canvas.fill_rect(
                Rect::new(origin.x + bounds.x(), origin.y + bounds.y(), bounds.width(), bounds.height()),
                background,
            );
        }

        match &self.kind {
            DisplayKind::TextRun(run) => {
                let positions: Vec<Point> = run.offsets.iter().map(|&x| here.offset(x, 0.0)).collect();
                canvas.draw_text(&run.text, &run.glyphs, &positions, run.font_size, color);
            }
            DisplayKind::Glyph {
                glyph,
                font_size,
                shift_down,
            } => {
                canvas.draw_glyphs(&[*glyph], &[here.offset(0.0, -shift_down)], *font_size, color);
            }
            DisplayKind::GlyphConstruction {
                glyphs,
                offsets,
                font_size,
                shift_down,
            } => {
                let positions: Vec<Point> = offsets
                    .iter()
                    .map(|&y| here.offset(0.0, y - shift_down))
                    .collect();
                canvas.draw_glyphs(glyphs, &positions, *font_size, color);
            }
            DisplayKind::Fraction {
                rule_position,
                rule_thickness,
                ..
            } => {
                self.draw_children(canvas, here);
                if *rule_thickness > 0.0 {
                    canvas.stroke_line(
                        here.offset(0.0, *rule_position),
                        here.offset(self.width, *rule_position),
                        *rule_thickness,
                        color,
                    );
                }
            }
            DisplayKind::Radical {
                radicand,
                glyph,
                top_kern,
                rule_thickness,
                ..
            } => {
                self.draw_children(canvas, here);
                let y = self.ascent - top_kern - rule_thickness / 2.0;
                let start = glyph.position.x + glyph.width;
                canvas.stroke_line(
                    here.offset(start, y),
                    here.offset(start + radicand.width, y),
                    *rule_thickness,
                    color,
                );
            }
            DisplayKind::Line {
                inner,
                line_shift_up,
                line_thickness,
            } => {
                self.draw_children(canvas, here);
                canvas.stroke_line(
                    here.offset(0.0, *line_shift_up),
                    here.offset(inner.width, *line_shift_up),
                    *line_thickness,
                    color,
                );
            }
            DisplayKind::List { .. }
            | DisplayKind::Table { .. }
            | DisplayKind::LargeOpLimits { .. }
            | DisplayKind::Accent { .. }
            | DisplayKind::Inner { .. } => self.draw_children(canvas, here),
        }
    }

    fn draw_children(&self, canvas: &mut dyn Canvas, here: Point) {
        for child in self.children() {
            child.draw_at(canvas, here);
        }
    }
}

// =============================================================================
// Render Primitives
// =============================================================================

/// A recorded drawing operation, in absolute coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderPrimitive {
    Text {
        text: String,
        glyphs: Vec<GlyphId>,
        positions: Vec<Point>,
        font_size: f32,
        color: Color,
    },
    Glyphs {
        glyphs: Vec<GlyphId>,
        positions: Vec<Point>,
        font_size: f32,
        color: Color,
    },
    Line {
        start: Point,
        end: Point,
        thickness: f32,
        color: Color,
    },
    Rectangle {
        rect: Rect,
        fill: Color,
    },
}

/// Everything drawn for one display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderOutput {
    pub primitives: Vec<RenderPrimitive>,
    /// Bounds of the display, baseline at y = 0
    pub bounds: Rect,
    pub ascent: f32,
    pub descent: f32,
}

impl RenderOutput {
    pub fn lines(&self) -> impl Iterator<Item = &RenderPrimitive> {
        self.primitives
            .iter()
            .filter(|primitive| matches!(primitive, RenderPrimitive::Line { .. }))
    }
}

// =============================================================================
// Renderer
// =============================================================================

/// A canvas that records what is drawn on it
#[derive(Debug, Default)]
pub struct Renderer {
    primitives: Vec<RenderPrimitive>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the drawing of `display` placed at the origin
    pub fn render(display: &Display) -> RenderOutput {
        let mut renderer = Self::new();
        display.draw(&mut renderer);
        RenderOutput {
            primitives: renderer.primitives,
            bounds: display.bounds(),
            ascent: display.ascent,
            descent: display.descent,
        }
    }

    pub fn primitives(&self) -> &[RenderPrimitive] {
        &self.primitives
    }

    pub fn into_primitives(self) -> Vec<RenderPrimitive> {
        self.primitives
    }
}

impl Canvas for Renderer {
    fn draw_text(
        &mut self,
        text: &str,
        glyphs: &[GlyphId],
        positions: &[Point],
        font_size: f32,
        color: Color,
    ) {
        self.primitives.push(RenderPrimitive::Text {
            text: text.to_string(),
            glyphs: glyphs.to_vec(),
            positions: positions.to_vec(),
            font_size,
            color,
        });
    }

    fn draw_glyphs(&mut self, glyphs: &[GlyphId], positions: &[Point], font_size: f32, color: Color) {
        self.primitives.push(RenderPrimitive::Glyphs {
            glyphs: glyphs.to_vec(),
            positions: positions.to_vec(),
            font_size,
            color,
        });
    }

    fn stroke_line(&mut self, from: Point, to: Point, thickness: f32, color: Color) {
        self.primitives.push(RenderPrimitive::Line {
            start: from,
            end: to,
            thickness,
            color,
        });
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.primitives.push(RenderPrimitive::Rectangle { rect, fill: color });
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::TextRun;

    fn text(text: &str, width: f32) -> Display {
        Display::new(
            DisplayKind::TextRun(TextRun {
                text: text.to_string(),
                font_size: 10.0,
                glyphs: vec![1],
                offsets: vec![0.0],
            }),
            7.0,
            2.0,
            width,
        )
    }

    #[test]
    fn test_color_creation() {
        let c = Color::rgb(255, 128, 64);
        assert_eq!(c.r, 255);
        assert_eq!(c.g, 128);
        assert_eq!(c.b, 64);
        assert_eq!(c.a, 255);
    }

    #[test]
    fn test_color_from_hex() {
        assert_eq!(Color::from_hex("#ff0000"), Some(Color::RED));
        assert_eq!(Color::from_hex("#0000FF"), Some(Color::BLUE));
        assert_eq!(Color::from_hex("ff0000"), None);
        assert_eq!(Color::from_hex("#ff00"), None);
        assert_eq!(Color::from_hex("#gg0000"), None);
        assert_eq!(Color::rgb(1, 2, 255).to_hex(), "#0102ff");
    }

    #[test]
    fn test_render_text_at_offset() {
        let list = Display::list(vec![text("x", 5.0).with_position(Point::new(3.0, 1.0))], None)
            .with_position(Point::new(10.0, 0.0));
        let output = Renderer::render(&list);
        assert_eq!(output.primitives.len(), 1);
        let RenderPrimitive::Text { positions, color, .. } = &output.primitives[0] else {
            panic!("expected text");
        };
        assert_eq!(positions[0], Point::new(13.0, 1.0));
        assert_eq!(*color, Color::BLACK);
    }

    #[test]
    fn test_render_fraction_rule() {
        let fraction = Display::new(
            DisplayKind::Fraction {
                numerator: Box::new(text("a", 5.0).with_position(Point::new(0.0, 8.0))),
                denominator: Box::new(text("b", 5.0).with_position(Point::new(0.0, -8.0))),
                rule_position: 2.5,
                rule_thickness: 0.4,
            },
            15.0,
            10.0,
            5.0,
        );
        let output = Renderer::render(&fraction);
        assert_eq!(output.primitives.len(), 3);
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(
            lines,
            vec![&RenderPrimitive::Line {
                start: Point::new(0.0, 2.5),
                end: Point::new(5.0, 2.5),
                thickness: 0.4,
                color: Color::BLACK,
            }]
        );
    }

    #[test]
    fn test_ruleless_fraction_draws_no_line() {
        let fraction = Display::new(
            DisplayKind::Fraction {
                numerator: Box::new(text("a", 5.0)),
                denominator: Box::new(text("b", 5.0)),
                rule_position: 2.5,
                rule_thickness: 0.0,
            },
            15.0,
            10.0,
            5.0,
        );
        assert_eq!(Renderer::render(&fraction).lines().count(), 0);
    }

    #[test]
    fn test_background_drawn_first() {
        let mut boxed = text("x", 5.0);
        boxed.local_background_color = Some(Color::RED);
        let output = Renderer::render(&boxed);
        assert_eq!(
            output.primitives[0],
            RenderPrimitive::Rectangle {
                rect: Rect::new(0.0, -2.0, 5.0, 9.0),
                fill: Color::RED,
            }
        );
    }

    #[test]
    fn test_glyph_shift_applied() {
        let mut glyph = Display::glyph(3, 10.0, 8.0, 2.0, 4.0);
        glyph.shift_down(1.5);
        glyph.set_text_color(Some(Color::BLUE));
        let output = Renderer::render(&glyph);
        let RenderPrimitive::Glyphs { positions, color, .. } = &output.primitives[0] else {
            panic!("expected glyphs");
        };
        assert_eq!(positions[0], Point::new(0.0, -1.5));
        assert_eq!(*color, Color::BLUE);
    }
}
