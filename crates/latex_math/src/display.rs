//! Display Tree - positioned boxes produced by the typesetter
//!
//! Coordinates are y-up with the origin of every node on its baseline. A
//! child's `position` is relative to its parent's origin, so moving a node
//! never requires touching its children.

use crate::font::GlyphId;
use crate::render::Color;
use serde::{Deserialize, Serialize};
use std::ops::Range;

// =============================================================================
// Geometry
// =============================================================================

/// A position in 2D space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self::default()
    }

    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// A size with width and height
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn zero() -> Self {
        Self::default()
    }
}

/// A rectangle given by its bottom-left corner and size
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    pub fn x(&self) -> f32 {
        self.origin.x
    }

    pub fn y(&self) -> f32 {
        self.origin.y
    }

    pub fn width(&self) -> f32 {
        self.size.width
    }

    pub fn height(&self) -> f32 {
        self.size.height
    }

    pub fn right(&self) -> f32 {
        self.origin.x + self.size.width
    }

    pub fn top(&self) -> f32 {
        self.origin.y + self.size.height
    }

    pub fn center_x(&self) -> f32 {
        self.origin.x + self.size.width / 2.0
    }

    /// Smallest rectangle containing both
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x().min(other.x());
        let y = self.y().min(other.y());
        Rect::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.top().max(other.top()) - y,
        )
    }
}

// =============================================================================
// Display nodes
// =============================================================================

/// Where a list sits relative to its base
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinePosition {
    #[default]
    Regular,
    Superscript,
    Subscript,
}

/// A run of glyphs at one size, drawn left to right on the baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub font_size: f32,
    pub glyphs: Vec<GlyphId>,
    /// Horizontal offset of each glyph from the start of the run
    pub offsets: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DisplayKind {
    TextRun(TextRun),
    List {
        children: Vec<Display>,
        line_position: LinePosition,
        /// Index of the base atom in the parent list, for script lists
        index: Option<usize>,
    },
    Fraction {
        numerator: Box<Display>,
        denominator: Box<Display>,
        /// Height of the rule's center above the baseline
        rule_position: f32,
        /// Zero for fractions without a rule
        rule_thickness: f32,
    },
    Radical {
        radicand: Box<Display>,
        degree: Option<Box<Display>>,
        glyph: Box<Display>,
        /// Clearance between the top of the node and the rule
        top_kern: f32,
        rule_thickness: f32,
    },
    Glyph {
        glyph: GlyphId,
        font_size: f32,
        shift_down: f32,
    },
    GlyphConstruction {
        glyphs: Vec<GlyphId>,
        /// Vertical offset of each glyph from the bottom of the construction
        offsets: Vec<f32>,
        font_size: f32,
        shift_down: f32,
    },
    LargeOpLimits {
        nucleus: Box<Display>,
        upper_limit: Option<Box<Display>>,
        lower_limit: Option<Box<Display>>,
    },
    Line {
        inner: Box<Display>,
        line_shift_up: f32,
        line_thickness: f32,
    },
    Accent {
        accentee: Box<Display>,
        accent: Box<Display>,
    },
    Inner {
        inner: Box<Display>,
        left_delimiter: Option<Box<Display>>,
        right_delimiter: Option<Box<Display>>,
    },
    Table {
        rows: Vec<Display>,
    },
}

/// A positioned, sized box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Display {
    pub kind: DisplayKind,
    /// Distance from the baseline to the top
    pub ascent: f32,
    /// Distance from the baseline to the bottom
    pub descent: f32,
    pub width: f32,
    /// Origin relative to the parent's origin
    pub position: Point,
    /// Source characters covered by this node
    pub range: Option<Range<usize>>,
    /// Whether scripts follow this node
    pub has_script: bool,
    pub text_color: Option<Color>,
    /// Color set with `\color`, which overrides the inherited color
    pub local_text_color: Option<Color>,
    /// Background set with `\colorbox`
    pub local_background_color: Option<Color>,
}

impl Display {
    pub fn new(kind: DisplayKind, ascent: f32, descent: f32, width: f32) -> Self {
        Self {
            kind,
            ascent,
            descent,
            width,
            position: Point::origin(),
            range: None,
            has_script: false,
            text_color: None,
            local_text_color: None,
            local_background_color: None,
        }
    }

    /// A list of sub-displays sized to contain all of them
    pub fn list(children: Vec<Display>, range: Option<Range<usize>>) -> Self {
        let mut display = Self::new(
            DisplayKind::List {
                children,
                line_position: LinePosition::Regular,
                index: None,
            },
            0.0,
            0.0,
            0.0,
        );
        display.range = range;
        display.recompute_dimensions();
        display
    }

    /// Rows stacked by the typesetter, sized like a list
    pub fn table(rows: Vec<Display>, range: Option<Range<usize>>) -> Self {
        let mut display = Self::new(DisplayKind::Table { rows }, 0.0, 0.0, 0.0);
        display.range = range;
        display.recompute_dimensions();
        display
    }

    pub fn glyph(glyph: GlyphId, font_size: f32, ascent: f32, descent: f32, width: f32) -> Self {
        Self::new(
            DisplayKind::Glyph {
                glyph,
                font_size,
                shift_down: 0.0,
            },
            ascent,
            descent,
            width,
        )
    }

    pub fn with_range(mut self, range: Option<Range<usize>>) -> Self {
        self.range = range;
        self
    }

    pub fn with_position(mut self, position: Point) -> Self {
        self.position = position;
        self
    }

    /// Bounding rectangle in the parent's coordinates
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y - self.descent,
            self.width,
            self.ascent + self.descent,
        )
    }

    /// Sub-displays in drawing order
    pub fn children(&self) -> Vec<&Display> {
        match &self.kind {
            DisplayKind::TextRun(_) | DisplayKind::Glyph { .. } | DisplayKind::GlyphConstruction { .. } => {
                Vec::new()
            }
            DisplayKind::List { children, .. } => children.iter().collect(),
            DisplayKind::Table { rows } => rows.iter().collect(),
            DisplayKind::Fraction {
                numerator,
                denominator,
                ..
            } => vec![numerator.as_ref(), denominator.as_ref()],
            DisplayKind::Radical {
                radicand,
                degree,
                glyph,
                ..
            } => std::iter::once(radicand.as_ref())
                .chain(degree.as_deref())
                .chain(std::iter::once(glyph.as_ref()))
                .collect(),
            DisplayKind::LargeOpLimits {
                nucleus,
                upper_limit,
                lower_limit,
            } => upper_limit
                .as_deref()
                .into_iter()
                .chain(lower_limit.as_deref())
                .chain(std::iter::once(nucleus.as_ref()))
                .collect(),
            DisplayKind::Line { inner, .. } => vec![inner.as_ref()],
            DisplayKind::Accent { accentee, accent } => vec![accentee.as_ref(), accent.as_ref()],
            DisplayKind::Inner {
                inner,
                left_delimiter,
                right_delimiter,
            } => left_delimiter
                .as_deref()
                .into_iter()
                .chain(right_delimiter.as_deref())
                .chain(std::iter::once(inner.as_ref()))
                .collect(),
        }
    }

    fn children_mut(&mut self) -> Vec<&mut Display> {
        match &mut self.kind {
            DisplayKind::TextRun(_) | DisplayKind::Glyph { .. } | DisplayKind::GlyphConstruction { .. } => {
                Vec::new()
            }
            DisplayKind::List { children, .. } => children.iter_mut().collect(),
            DisplayKind::Table { rows } => rows.iter_mut().collect(),
            DisplayKind::Fraction {
                numerator,
                denominator,
                ..
            } => vec![numerator.as_mut(), denominator.as_mut()],
            DisplayKind::Radical {
                radicand,
                degree,
                glyph,
                ..
            } => std::iter::once(radicand.as_mut())
                .chain(degree.as_deref_mut())
                .chain(std::iter::once(glyph.as_mut()))
                .collect(),
            DisplayKind::LargeOpLimits {
                nucleus,
                upper_limit,
                lower_limit,
            } => upper_limit
                .as_deref_mut()
                .into_iter()
                .chain(lower_limit.as_deref_mut())
                .chain(std::iter::once(nucleus.as_mut()))
                .collect(),
            DisplayKind::Line { inner, .. } => vec![inner.as_mut()],
            DisplayKind::Accent { accentee, accent } => vec![accentee.as_mut(), accent.as_mut()],
            DisplayKind::Inner {
                inner,
                left_delimiter,
                right_delimiter,
            } => left_delimiter
                .as_deref_mut()
                .into_iter()
                .chain(right_delimiter.as_deref_mut())
                .chain(std::iter::once(inner.as_mut()))
                .collect(),
        }
    }

    /// Set the color of this node and everything below it. Children with a
    /// local color keep it.
    pub fn set_text_color(&mut self, color: Option<Color>) {
        self.text_color = color;
        for child in self.children_mut() {
            let color = child.local_text_color.or(color);
            child.set_text_color(color);
        }
    }

    /// Lower a glyph or glyph construction by `amount`
    pub fn shift_down(&mut self, amount: f32) {
        if let DisplayKind::Glyph { shift_down, .. } | DisplayKind::GlyphConstruction { shift_down, .. } =
            &mut self.kind
        {
            *shift_down += amount;
            self.ascent -= amount;
            self.descent += amount;
        }
    }

    /// Grow a list or table to contain all of its children
    pub fn recompute_dimensions(&mut self) {
        let children: &[Display] = match &self.kind {
            DisplayKind::List { children, .. } => children,
            DisplayKind::Table { rows } => rows,
            _ => return,
        };
        let mut ascent = 0.0_f32;
        let mut descent = 0.0_f32;
        let mut width = 0.0_f32;
        for child in children {
            ascent = ascent.max(child.position.y + child.ascent);
            descent = descent.max(child.descent - child.position.y);
            width = width.max(child.position.x + child.width);
        }
        self.ascent = ascent;
        self.descent = descent;
        self.width = width;
    }

    /// Mark a list as a script of the atom at `index`
    pub fn set_line_position(&mut self, position: LinePosition, atom_index: Option<usize>) {
        if let DisplayKind::List {
            line_position,
            index,
            ..
        } = &mut self.kind
        {
            *line_position = position;
            *index = atom_index;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph(ascent: f32, descent: f32, width: f32) -> Display {
        Display::glyph(1, 10.0, ascent, descent, width)
    }

    #[test]
    fn test_rect_edges() {
        let rect = Rect::new(1.0, -2.0, 4.0, 6.0);
        assert_eq!(rect.right(), 5.0);
        assert_eq!(rect.top(), 4.0);
        assert_eq!(rect.center_x(), 3.0);
        let other = Rect::new(4.0, 0.0, 3.0, 10.0);
        assert_eq!(rect.union(&other), Rect::new(1.0, -2.0, 6.0, 12.0));
    }

    #[test]
    fn test_bounds() {
        let display = glyph(7.0, 2.0, 5.0).with_position(Point::new(3.0, 1.0));
        assert_eq!(display.bounds(), Rect::new(3.0, -1.0, 5.0, 9.0));
    }

    #[test]
    fn test_list_dimensions() {
        let raised = glyph(5.0, 1.0, 4.0).with_position(Point::new(0.0, 3.0));
        let lowered = glyph(5.0, 1.0, 4.0).with_position(Point::new(6.0, -4.0));
        let list = Display::list(vec![raised, lowered], Some(0..2));
        assert_eq!(list.ascent, 8.0);
        assert_eq!(list.descent, 5.0);
        assert_eq!(list.width, 10.0);
        assert_eq!(list.range, Some(0..2));
    }

    #[test]
    fn test_empty_list_is_zero_sized() {
        let list = Display::list(Vec::new(), None);
        assert_eq!((list.ascent, list.descent, list.width), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_shift_down() {
        let mut display = glyph(7.0, 2.0, 5.0);
        display.shift_down(3.0);
        assert_eq!(display.ascent, 4.0);
        assert_eq!(display.descent, 5.0);
        let DisplayKind::Glyph { shift_down, .. } = display.kind else {
            panic!("expected glyph");
        };
        assert_eq!(shift_down, 3.0);
    }

    #[test]
    fn test_set_text_color_keeps_local_color() {
        let mut local = glyph(1.0, 0.0, 1.0);
        local.local_text_color = Some(Color::RED);
        let plain = glyph(1.0, 0.0, 1.0);
        let mut list = Display::list(vec![local, plain], None);

        list.set_text_color(Some(Color::BLUE));
        let children = list.children();
        assert_eq!(children[0].text_color, Some(Color::RED));
        assert_eq!(children[1].text_color, Some(Color::BLUE));
    }

    #[test]
    fn test_children_of_fraction() {
        let fraction = Display::new(
            DisplayKind::Fraction {
                numerator: Box::new(Display::list(vec![glyph(1.0, 0.0, 1.0)], None)),
                denominator: Box::new(Display::list(Vec::new(), None)),
                rule_position: 2.0,
                rule_thickness: 0.4,
            },
            3.0,
            3.0,
            1.0,
        );
        assert_eq!(fraction.children().len(), 2);
    }
}
