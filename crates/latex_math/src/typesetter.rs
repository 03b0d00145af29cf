//! Typesetter - turn a finalized math list into a display tree
//!
//! The layout rules follow Appendix G of The TeXbook, with the font
//! parameters taken from an OpenType MATH table through [`ScaledFont`].
//! Positions are y-up and every child is placed relative to its parent's
//! origin.

use std::ops::Range;

use crate::display::{Display, DisplayKind, LinePosition, Point, TextRun};
use crate::font::{GlyphId, GlyphPart, MathConstant, ScaledFont, NOTDEF};
use crate::model::{
    Atom, AtomKind, AtomType, ColumnAlignment, Fraction, Inner, LineStyle, MathList, Table,
};
use crate::render::Color;
use crate::unicode::change_font;

// =============================================================================
// Constants
// =============================================================================

/// Table row stacking, as multiples of the font size
const BASELINE_SKIP_MULTIPLIER: f32 = 1.2;
const LINE_SKIP_MULTIPLIER: f32 = 0.1;
const LINE_SKIP_LIMIT_MULTIPLIER: f32 = 0.0;
const JOT_MULTIPLIER: f32 = 0.3;

/// TeX's `\delimiterfactor` and `\delimitershortfall`
const DELIMITER_FACTOR: f32 = 901.0;
const DELIMITER_SHORTFALL_POINTS: f32 = 5.0;

/// Cap on extender repeats when assembling a glyph from parts
const MAX_EXTENDER_REPEATS: usize = 128;

// =============================================================================
// Inter-element spacing
// =============================================================================

/// Spacing class between two adjacent atoms. The `Ns` classes collapse to
/// zero in script and scriptscript style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Spacing {
    Zero,
    Thin,
    NsThin,
    NsMedium,
    NsThick,
    Invalid,
}

type S = Spacing;

/// Rows are the left atom, columns the right one: ordinary, large operator,
/// binary, relation, open, close, punctuation, fraction/inner. The last row
/// is the radical, which only has a class on the left.
const SPACING_TABLE: [[Spacing; 8]; 9] = [
    [S::Zero, S::Thin, S::NsMedium, S::NsThick, S::Zero, S::Zero, S::Zero, S::NsThin],
    [S::Thin, S::Thin, S::Invalid, S::NsThick, S::Zero, S::Zero, S::Zero, S::NsThin],
    [S::NsMedium, S::NsMedium, S::Invalid, S::Invalid, S::NsMedium, S::Invalid, S::Invalid, S::NsMedium],
    [S::NsThick, S::NsThick, S::Invalid, S::Zero, S::NsThick, S::Zero, S::Zero, S::NsThick],
    [S::Zero, S::Zero, S::Invalid, S::Zero, S::Zero, S::Zero, S::Zero, S::Zero],
    [S::Zero, S::Thin, S::NsMedium, S::NsThick, S::Zero, S::Zero, S::Zero, S::NsThin],
    [S::NsThin, S::NsThin, S::Invalid, S::NsThin, S::NsThin, S::NsThin, S::NsThin, S::NsThin],
    [S::NsThin, S::Thin, S::NsMedium, S::NsThick, S::NsThin, S::Zero, S::NsThin, S::NsThin],
    [S::NsMedium, S::NsThin, S::NsMedium, S::NsThick, S::Zero, S::Zero, S::Zero, S::NsThin],
];

impl Spacing {
    fn mu(self, style: LineStyle) -> f32 {
        let script = style >= LineStyle::Script;
        match self {
            Spacing::Zero | Spacing::Invalid => 0.0,
            Spacing::Thin => 3.0,
            Spacing::NsThin if !script => 3.0,
            Spacing::NsMedium if !script => 4.0,
            Spacing::NsThick if !script => 5.0,
            Spacing::NsThin | Spacing::NsMedium | Spacing::NsThick => 0.0,
        }
    }
}

fn spacing_index(atom_type: AtomType, left: bool) -> Option<usize> {
    match atom_type {
        AtomType::Color | AtomType::ColorBox | AtomType::Ordinary | AtomType::Placeholder => {
            Some(0)
        }
        AtomType::LargeOperator => Some(1),
        AtomType::BinaryOperator => Some(2),
        AtomType::Relation => Some(3),
        AtomType::Open => Some(4),
        AtomType::Close => Some(5),
        AtomType::Punctuation => Some(6),
        AtomType::Fraction | AtomType::Inner => Some(7),
        AtomType::Radical if left => Some(8),
        _ => None,
    }
}

fn spacing_between(left: AtomType, right: AtomType) -> Spacing {
    match (spacing_index(left, true), spacing_index(right, false)) {
        (Some(row), Some(column)) => SPACING_TABLE[row][column],
        _ => Spacing::Invalid,
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Point size of `font` in the given style
fn style_size(font: &ScaledFont, style: LineStyle) -> f32 {
    match style {
        LineStyle::Display | LineStyle::Text => font.size(),
        LineStyle::Script => font.size() * font.percent(MathConstant::ScriptPercentScaleDown),
        LineStyle::ScriptScript => {
            font.size() * font.percent(MathConstant::ScriptScriptPercentScaleDown)
        }
    }
}

fn atom_range(atom: &Atom) -> Range<usize> {
    atom.index_range.clone().unwrap_or(0..0)
}

fn union_ranges(a: Option<Range<usize>>, b: Option<Range<usize>>) -> Option<Range<usize>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.start.min(b.start)..a.end.max(b.end)),
        (a, b) => a.or(b),
    }
}

/// The text an atom is drawn with once its font style is applied
fn styled_nucleus(atom: &Atom) -> String {
    match atom.atom_type() {
        AtomType::Number | AtomType::Variable => change_font(&atom.nucleus, atom.font_style),
        _ => atom.nucleus.clone(),
    }
}

/// Accents whose accentee is one plain character get their skew from that
/// character's top accent attachment.
fn is_single_char_accentee(accentee: &MathList) -> bool {
    match accentee.atoms.as_slice() {
        [atom] => atom.nucleus.chars().count() == 1 && !atom.has_scripts(),
        _ => false,
    }
}

/// Reclassify number, variable and unary atoms as ordinary (applying their
/// font style) and merge runs of ordinary atoms.
fn preprocess(list: &MathList) -> Vec<Atom> {
    let mut preprocessed: Vec<Atom> = Vec::with_capacity(list.len());
    for atom in &list.atoms {
        let mut atom = atom.clone();
        match atom.atom_type() {
            AtomType::Number | AtomType::Variable => {
                atom.nucleus = change_font(&atom.nucleus, atom.font_style);
                atom.kind = AtomKind::Ordinary;
            }
            AtomType::UnaryOperator => atom.kind = AtomKind::Ordinary,
            _ => {}
        }

        if atom.atom_type() == AtomType::Ordinary {
            if let Some(prev) = preprocessed.last_mut() {
                if prev.atom_type() == AtomType::Ordinary && !prev.has_scripts() {
                    prev.fuse(atom);
                    continue;
                }
            }
        }
        preprocessed.push(atom);
    }
    preprocessed
}

/// Stack assembly parts until they reach `height`. Returns the glyphs, the
/// offset of each glyph from the bottom and the total height.
fn assemble_parts(parts: &[GlyphPart], min_overlap: f32, height: f32) -> (Vec<GlyphId>, Vec<f32>, f32) {
    let has_extenders = parts.iter().any(|part| part.is_extender);
    let mut num_extenders = 0;
    loop {
        let mut glyphs = Vec::new();
        let mut offsets = Vec::new();
        let mut prev: Option<&GlyphPart> = None;
        let mut offset = 0.0_f32;
        let mut max_delta = f32::MAX;

        for part in parts {
            let repeats = if part.is_extender { num_extenders } else { 1 };
            for _ in 0..repeats {
                if let Some(prev) = prev {
                    let max_overlap = prev.end_connector_length.min(part.start_connector_length);
                    let min_delta = prev.full_advance - max_overlap;
                    let max_delta_part = prev.full_advance - min_overlap;
                    max_delta = max_delta.min(max_delta_part - min_delta);
                    offset += min_delta;
                }
                glyphs.push(part.glyph);
                offsets.push(offset);
                prev = Some(part);
            }
        }

        let min_height = prev.map_or(0.0, |last| offset + last.full_advance);
        let gaps = glyphs.len().saturating_sub(1);
        let max_delta = if gaps == 0 { 0.0 } else { max_delta.max(0.0) };
        let max_height = min_height + max_delta * gaps as f32;

        if !glyphs.is_empty() && min_height >= height {
            return (glyphs, offsets, min_height);
        }
        if gaps > 0 && height <= max_height {
            let spread = (height - min_height) / gaps as f32;
            for (i, offset) in offsets.iter_mut().enumerate() {
                *offset += spread * i as f32;
            }
            return (glyphs, offsets, height);
        }
        if !has_extenders || num_extenders >= MAX_EXTENDER_REPEATS {
            for (i, offset) in offsets.iter_mut().enumerate() {
                *offset += max_delta * i as f32;
            }
            return (glyphs, offsets, max_height);
        }
        num_extenders += 1;
    }
}

// =============================================================================
// Public entry point
// =============================================================================

/// Finalize `list` and lay it out with `font` in `style`
pub fn typeset(list: &MathList, font: &ScaledFont, style: LineStyle) -> Display {
    let finalized = list.finalized();
    let mut display = Typesetter::create_line(&finalized, font, style, false, false);
    let color = display.local_text_color;
    display.set_text_color(color);
    display
}

// =============================================================================
// Typesetter
// =============================================================================

/// Glyphs accumulated for the next text run
#[derive(Debug, Default)]
struct PendingRun {
    text: String,
    glyphs: Vec<GlyphId>,
    /// Extra space after each glyph
    kerns: Vec<f32>,
    range: Option<Range<usize>>,
}

impl PendingRun {
    fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// Layout state for one horizontal list
struct Typesetter<'a> {
    /// Font at the size of the outermost style
    font: &'a ScaledFont,
    /// Font at the size of the current style
    style_font: ScaledFont,
    style: LineStyle,
    cramped: bool,
    /// Treat the list as if it sits between an open and a close atom
    spaced: bool,
    position: Point,
    displays: Vec<Display>,
    run: PendingRun,
}

impl<'a> Typesetter<'a> {
    fn new(font: &'a ScaledFont, style: LineStyle, cramped: bool, spaced: bool) -> Self {
        Self {
            font,
            style_font: font.with_size(style_size(font, style)),
            style,
            cramped,
            spaced,
            position: Point::origin(),
            displays: Vec::new(),
            run: PendingRun::default(),
        }
    }

    /// Lay out an already finalized list as one horizontal line
    fn create_line(
        list: &MathList,
        font: &ScaledFont,
        style: LineStyle,
        cramped: bool,
        spaced: bool,
    ) -> Display {
        let atoms = preprocess(list);
        let range = atoms
            .last()
            .and_then(|atom| atom.index_range.as_ref())
            .map(|range| 0..range.end);

        let mut typesetter = Typesetter::new(font, style, cramped, spaced);
        typesetter.create_displays(atoms);
        Display::list(typesetter.displays, range)
    }

    fn set_style(&mut self, style: LineStyle) {
        self.style = style;
        self.style_font = self.font.with_size(style_size(self.font, style));
    }

    fn constant(&self, constant: MathConstant) -> f32 {
        self.style_font.constant(constant)
    }

    fn is_display_style(&self) -> bool {
        self.style == LineStyle::Display
    }

    fn create_displays(&mut self, atoms: Vec<Atom>) {
        let mut prev_type: Option<AtomType> = None;

        for atom in atoms {
            let range = atom_range(&atom);
            let atom_type = match &atom.kind {
                AtomKind::Space { width } => {
                    self.flush_run();
                    self.position.x += width * self.style_font.mu();
                    continue;
                }
                AtomKind::Style(style) => {
                    self.flush_run();
                    self.set_style(*style);
                    continue;
                }
                AtomKind::Boundary => {
                    debug_assert!(false, "boundary atom inside a math list");
                    continue;
                }
                AtomKind::Color { color, inner } | AtomKind::ColorBox { color, inner } => {
                    self.flush_run();
                    let mut display = Typesetter::create_line(inner, self.font, self.style, false, false);
                    let parsed = Color::from_hex(color);
                    if parsed.is_none() {
                        tracing::warn!("Unknown color {:?}, keeping the inherited color", color);
                    }
                    if matches!(atom.kind, AtomKind::Color { .. }) {
                        display.local_text_color = parsed;
                    } else {
                        display.local_background_color = parsed;
                    }
                    display.range = Some(range);
                    self.push_display(display);
                    atom.atom_type()
                }
                AtomKind::Radical(radical) => {
                    self.flush_run();
                    self.add_inter_element_space(prev_type, AtomType::Ordinary);
                    let mut display = self.make_radical(&radical.radicand, range.clone());
                    if let Some(degree) = &radical.degree {
                        let degree = Typesetter::create_line(
                            degree,
                            self.font,
                            LineStyle::ScriptScript,
                            false,
                            false,
                        );
                        self.set_degree(&mut display, degree);
                    }
                    self.push_display(display);
                    if atom.has_scripts() {
                        self.make_scripts(&atom, range.start, 0.0);
                    }
                    AtomType::Radical
                }
                AtomKind::Fraction(fraction) => {
                    self.flush_run();
                    self.add_inter_element_space(prev_type, AtomType::Fraction);
                    let display = self.make_fraction(fraction, range.clone());
                    self.push_display(display);
                    if atom.has_scripts() {
                        self.make_scripts(&atom, range.start, 0.0);
                    }
                    AtomType::Fraction
                }
                AtomKind::LargeOperator { limits } => {
                    self.flush_run();
                    self.add_inter_element_space(prev_type, AtomType::LargeOperator);
                    self.make_large_op(&atom, *limits);
                    AtomType::LargeOperator
                }
                AtomKind::Inner(inner) => {
                    self.flush_run();
                    self.add_inter_element_space(prev_type, AtomType::Inner);
                    let display = self.make_inner(inner, range.clone());
                    self.push_display(display);
                    if atom.has_scripts() {
                        self.make_scripts(&atom, range.start, 0.0);
                    }
                    AtomType::Inner
                }
                AtomKind::Underline(inner) | AtomKind::Overline(inner) => {
                    self.flush_run();
                    self.add_inter_element_space(prev_type, AtomType::Ordinary);
                    let display = if matches!(atom.kind, AtomKind::Underline(_)) {
                        self.make_underline(inner, range.clone())
                    } else {
                        self.make_overline(inner, range.clone())
                    };
                    self.push_display(display);
                    if atom.has_scripts() {
                        self.make_scripts(&atom, range.start, 0.0);
                    }
                    AtomType::Ordinary
                }
                AtomKind::Accent(accentee) => {
                    self.flush_run();
                    self.add_inter_element_space(prev_type, AtomType::Ordinary);
                    let (display, scripts_moved) = self.make_accent(&atom, accentee, range.clone());
                    self.push_display(display);
                    if atom.has_scripts() && !scripts_moved {
                        self.make_scripts(&atom, range.start, 0.0);
                    }
                    AtomType::Ordinary
                }
                AtomKind::Table(table) => {
                    self.flush_run();
                    self.add_inter_element_space(prev_type, AtomType::Inner);
                    let display = self.make_table(table, range);
                    self.push_display(display);
                    AtomType::Inner
                }
                AtomKind::Ordinary
                | AtomKind::Number
                | AtomKind::Variable
                | AtomKind::UnaryOperator
                | AtomKind::BinaryOperator
                | AtomKind::Relation
                | AtomKind::Open
                | AtomKind::Close
                | AtomKind::Placeholder
                | AtomKind::Punctuation => {
                    let atom_type = match atom.atom_type() {
                        AtomType::Number | AtomType::Variable | AtomType::UnaryOperator => {
                            AtomType::Ordinary
                        }
                        other => other,
                    };
                    let space = self.inter_element_space(prev_type, atom_type);
                    match self.run.kerns.last_mut() {
                        Some(kern) => *kern += space,
                        None => self.position.x += space,
                    }

                    let placeholder = atom_type == AtomType::Placeholder;
                    if placeholder {
                        self.flush_run();
                    }
                    self.append_to_run(&atom);

                    if placeholder || atom.has_scripts() {
                        self.add_display_line();
                        if placeholder {
                            if let Some(line) = self.displays.last_mut() {
                                line.local_text_color = Some(Color::BLUE);
                            }
                        }
                    }

                    if atom.has_scripts() {
                        let nucleus = styled_nucleus(&atom);
                        let delta = nucleus
                            .chars()
                            .last()
                            .map_or(0.0, |ch| self.style_font.italic_correction(self.glyph_for_char(ch)));
                        if delta > 0.0 && atom.subscript().is_none() {
                            self.position.x += delta;
                        }
                        self.make_scripts(&atom, range.end.saturating_sub(1), delta);
                    }
                    atom_type
                }
            };
            prev_type = Some(atom_type);
        }

        self.flush_run();

        if self.spaced {
            if let Some(last_type) = prev_type {
                let space = self.spacing(last_type, AtomType::Close);
                if let Some(last) = self.displays.last_mut() {
                    last.width += space;
                }
            }
        }
    }

    /// Place `display` at the pen and advance past it
    fn push_display(&mut self, mut display: Display) {
        display.position = self.position;
        self.position.x += display.width;
        self.displays.push(display);
    }

    // -------------------------------------------------------------------------
    // Spacing
    // -------------------------------------------------------------------------

    fn spacing(&self, left: AtomType, right: AtomType) -> f32 {
        let spacing = spacing_between(left, right);
        if spacing == Spacing::Invalid {
            tracing::trace!("No inter-element space defined between {:?} and {:?}", left, right);
        }
        spacing.mu(self.style) * self.style_font.mu()
    }

    /// Space before an atom of type `right`. The first atom of a spaced list
    /// is spaced as if it followed an open delimiter.
    fn inter_element_space(&self, prev: Option<AtomType>, right: AtomType) -> f32 {
        match prev {
            Some(left) => self.spacing(left, right),
            None if self.spaced => self.spacing(AtomType::Open, right),
            None => 0.0,
        }
    }

    fn add_inter_element_space(&mut self, prev: Option<AtomType>, right: AtomType) {
        self.position.x += self.inter_element_space(prev, right);
    }

    // -------------------------------------------------------------------------
    // Text runs
    // -------------------------------------------------------------------------

    fn glyph_for_char(&self, ch: char) -> GlyphId {
        self.style_font.glyph_for_char(ch).unwrap_or_else(|| {
            tracing::warn!("No glyph for {:?}, falling back to .notdef", ch);
            NOTDEF
        })
    }

    fn append_to_run(&mut self, atom: &Atom) {
        let nucleus = styled_nucleus(atom);
        for ch in nucleus.chars() {
            let glyph = self.glyph_for_char(ch);
            self.run.glyphs.push(glyph);
            self.run.kerns.push(0.0);
        }
        self.run.text.push_str(&nucleus);
        self.run.range = union_ranges(self.run.range.take(), atom.index_range.clone());
    }

    /// Emit the pending run if it has any glyphs
    fn flush_run(&mut self) {
        if !self.run.is_empty() {
            self.add_display_line();
        }
    }

    /// Emit the pending run, even an empty one, and advance past it
    fn add_display_line(&mut self) {
        let run = std::mem::take(&mut self.run);
        let display = self.make_text_run(run.text, run.glyphs, &run.kerns).with_range(run.range);
        self.push_display(display);
    }

    fn make_text_run(&self, text: String, glyphs: Vec<GlyphId>, kerns: &[f32]) -> Display {
        let mut offsets = Vec::with_capacity(glyphs.len());
        let mut x = 0.0_f32;
        let mut ascent = 0.0_f32;
        let mut descent = 0.0_f32;
        for (&glyph, &kern) in glyphs.iter().zip(kerns) {
            let (glyph_ascent, glyph_descent) = self.style_font.glyph_ascent_descent(glyph);
            ascent = ascent.max(glyph_ascent);
            descent = descent.max(glyph_descent);
            offsets.push(x);
            x += self.style_font.advance(glyph) + kern;
        }
        Display::new(
            DisplayKind::TextRun(TextRun {
                text,
                font_size: self.style_font.size(),
                glyphs,
                offsets,
            }),
            ascent,
            descent,
            x,
        )
    }

    /// Lay out `text` as a run on its own
    fn make_text(&self, text: &str) -> Display {
        let glyphs: Vec<GlyphId> = text.chars().map(|ch| self.glyph_for_char(ch)).collect();
        let kerns = vec![0.0; glyphs.len()];
        self.make_text_run(text.to_string(), glyphs, &kerns)
    }

    // -------------------------------------------------------------------------
    // Scripts
    // -------------------------------------------------------------------------

    fn make_scripts(&mut self, atom: &Atom, index: usize, delta: f32) {
        debug_assert!(atom.has_scripts(), "make_scripts on an atom without scripts");

        let (base_ascent, base_descent, is_text_run) = match self.displays.last_mut() {
            Some(base) => {
                base.has_script = true;
                (base.ascent, base.descent, matches!(base.kind, DisplayKind::TextRun(_)))
            }
            None => (0.0, 0.0, true),
        };

        let script_style = self.style.script_style();
        let mut superscript_shift_up = 0.0_f32;
        let mut subscript_shift_down = 0.0_f32;
        if !is_text_run {
            let script_font = self.font.with_size(style_size(self.font, script_style));
            superscript_shift_up =
                base_ascent - script_font.constant(MathConstant::SuperscriptBaselineDropMax);
            subscript_shift_down =
                base_descent + script_font.constant(MathConstant::SubscriptBaselineDropMin);
        }
        let space_after_script = self.constant(MathConstant::SpaceAfterScript);

        let Some(superscript) = atom.superscript() else {
            let Some(subscript) = atom.subscript() else {
                return;
            };
            let mut subscript = Typesetter::create_line(subscript, self.font, script_style, true, false);
            subscript.set_line_position(LinePosition::Subscript, Some(index));
            subscript_shift_down = subscript_shift_down
                .max(self.constant(MathConstant::SubscriptShiftDown))
                .max(subscript.ascent - self.constant(MathConstant::SubscriptTopMax));
            subscript.position = self.position.offset(0.0, -subscript_shift_down);
            self.position.x += subscript.width + space_after_script;
            self.displays.push(subscript);
            return;
        };

        let mut superscript =
            Typesetter::create_line(superscript, self.font, script_style, self.cramped, false);
        superscript.set_line_position(LinePosition::Superscript, Some(index));
        let shift_up = if self.cramped {
            self.constant(MathConstant::SuperscriptShiftUpCramped)
        } else {
            self.constant(MathConstant::SuperscriptShiftUp)
        };
        superscript_shift_up = superscript_shift_up
            .max(shift_up)
            .max(superscript.descent + self.constant(MathConstant::SuperscriptBottomMin));

        let Some(subscript) = atom.subscript() else {
            superscript.position = self.position.offset(0.0, superscript_shift_up);
            self.position.x += superscript.width + space_after_script;
            self.displays.push(superscript);
            return;
        };

        let mut subscript = Typesetter::create_line(subscript, self.font, script_style, true, false);
        subscript.set_line_position(LinePosition::Subscript, Some(index));
        subscript_shift_down = subscript_shift_down.max(self.constant(MathConstant::SubscriptShiftDown));

        // Rule 18e
        let gap = (superscript_shift_up - superscript.descent) + (subscript_shift_down - subscript.ascent);
        let gap_min = self.constant(MathConstant::SubSuperscriptGapMin);
        if gap < gap_min {
            subscript_shift_down += gap_min - gap;
            let bottom_delta = self.constant(MathConstant::SuperscriptBottomMaxWithSubscript)
                - (superscript_shift_up - superscript.descent);
            if bottom_delta > 0.0 {
                superscript_shift_up += bottom_delta;
                subscript_shift_down -= bottom_delta;
            }
        }

        superscript.position = self.position.offset(delta, superscript_shift_up);
        subscript.position = self.position.offset(0.0, -subscript_shift_down);
        self.position.x +=
            (superscript.width + delta).max(subscript.width) + space_after_script;
        self.displays.push(superscript);
        self.displays.push(subscript);
    }

    // -------------------------------------------------------------------------
    // Fractions
    // -------------------------------------------------------------------------

    fn make_fraction(&self, fraction: &Fraction, range: Range<usize>) -> Display {
        let style = self.style.fraction_style();
        let mut numerator = Typesetter::create_line(&fraction.numerator, self.font, style, false, false);
        let mut denominator =
            Typesetter::create_line(&fraction.denominator, self.font, style, true, false);

        let display_style = self.is_display_style();
        let (mut shift_up, mut shift_down) = match (fraction.has_rule, display_style) {
            (true, true) => (
                self.constant(MathConstant::FractionNumeratorDisplayStyleShiftUp),
                self.constant(MathConstant::FractionDenominatorDisplayStyleShiftDown),
            ),
            (true, false) => (
                self.constant(MathConstant::FractionNumeratorShiftUp),
                self.constant(MathConstant::FractionDenominatorShiftDown),
            ),
            (false, true) => (
                self.constant(MathConstant::StackTopDisplayStyleShiftUp),
                self.constant(MathConstant::StackBottomDisplayStyleShiftDown),
            ),
            (false, false) => (
                self.constant(MathConstant::StackTopShiftUp),
                self.constant(MathConstant::StackBottomShiftDown),
            ),
        };

        let bar = self.style_font.axis_height();
        let thickness = if fraction.has_rule {
            self.constant(MathConstant::FractionRuleThickness)
        } else {
            0.0
        };

        if fraction.has_rule {
            let numerator_gap_min = if display_style {
                self.constant(MathConstant::FractionNumDisplayStyleGapMin)
            } else {
                self.constant(MathConstant::FractionNumeratorGapMin)
            };
            let distance = (shift_up - numerator.descent) - (bar + thickness / 2.0);
            if distance < numerator_gap_min {
                shift_up += numerator_gap_min - distance;
            }

            let denominator_gap_min = if display_style {
                self.constant(MathConstant::FractionDenomDisplayStyleGapMin)
            } else {
                self.constant(MathConstant::FractionDenominatorGapMin)
            };
            let distance = (bar - thickness / 2.0) - (denominator.ascent - shift_down);
            if distance < denominator_gap_min {
                shift_down += denominator_gap_min - distance;
            }
        } else {
            let clearance = (shift_up - numerator.descent) - (denominator.ascent - shift_down);
            let gap_min = if display_style {
                self.constant(MathConstant::StackDisplayStyleGapMin)
            } else {
                self.constant(MathConstant::StackGapMin)
            };
            if clearance < gap_min {
                let half = (gap_min - clearance) / 2.0;
                shift_up += half;
                shift_down += half;
            }
        }

        let width = numerator.width.max(denominator.width);
        numerator.position = Point::new((width - numerator.width) / 2.0, shift_up);
        denominator.position = Point::new((width - denominator.width) / 2.0, -shift_down);
        let ascent = numerator.ascent + shift_up;
        let descent = denominator.descent + shift_down;

        let display = Display::new(
            DisplayKind::Fraction {
                numerator: Box::new(numerator),
                denominator: Box::new(denominator),
                rule_position: bar,
                rule_thickness: thickness,
            },
            ascent,
            descent,
            width,
        )
        .with_range(Some(range.clone()));

        let left = fraction.left_delimiter.as_deref().filter(|d| !d.is_empty());
        let right = fraction.right_delimiter.as_deref().filter(|d| !d.is_empty());
        if left.is_none() && right.is_none() {
            return display;
        }

        let height = if display_style {
            self.style_font.fraction_delimiter_display_style_size()
        } else {
            self.style_font.fraction_delimiter_size()
        };
        let mut children = Vec::with_capacity(3);
        let mut x = 0.0_f32;
        let left = left.map(|delimiter| self.find_glyph_for_boundary(delimiter, height));
        let right = right.map(|delimiter| self.find_glyph_for_boundary(delimiter, height));
        for part in [left, Some(display), right].into_iter().flatten() {
            let width = part.width;
            children.push(part.with_position(Point::new(x, 0.0)));
            x += width;
        }
        Display::list(children, Some(range))
    }

    // -------------------------------------------------------------------------
    // Radicals
    // -------------------------------------------------------------------------

    fn make_radical(&self, radicand: &MathList, range: Range<usize>) -> Display {
        let mut inner = Typesetter::create_line(radicand, self.font, self.style, true, false);
        let mut clearance = if self.is_display_style() {
            self.constant(MathConstant::RadicalDisplayStyleVerticalGap)
        } else {
            self.constant(MathConstant::RadicalVerticalGap)
        };
        let rule_thickness = self.constant(MathConstant::RadicalRuleThickness);
        let radical_height = inner.ascent + inner.descent + clearance + rule_thickness;

        let mut glyph = self.stretched_glyph('\u{221A}', radical_height);

        // Center any extra height of the sign in the clearance
        let delta = (glyph.ascent + glyph.descent) - radical_height;
        if delta > 0.0 {
            clearance += delta / 2.0;
        }

        let radical_ascent = rule_thickness + clearance + inner.ascent;
        let shift_up = radical_ascent - glyph.ascent;
        glyph.shift_down(-shift_up);

        let extra_ascender = self.constant(MathConstant::RadicalExtraAscender);
        let ascent = radical_ascent + extra_ascender;
        let descent = (glyph.ascent + glyph.descent - radical_ascent).max(inner.descent);
        let width = glyph.width + inner.width;
        inner.position = Point::new(glyph.width, 0.0);

        Display::new(
            DisplayKind::Radical {
                radicand: Box::new(inner),
                degree: None,
                glyph: Box::new(glyph),
                top_kern: extra_ascender,
                rule_thickness,
            },
            ascent,
            descent,
            width,
        )
        .with_range(Some(range))
    }

    /// Attach a degree, kerned before the radical sign
    fn set_degree(&self, display: &mut Display, mut degree: Display) {
        let mut kern_before = self.constant(MathConstant::RadicalKernBeforeDegree);
        let kern_after = self.constant(MathConstant::RadicalKernAfterDegree);
        let raise = self.style_font.percent(MathConstant::RadicalDegreeBottomRaisePercent)
            * (display.ascent - display.descent);

        // The sign never moves left of the origin
        let mut shift = kern_before + degree.width + kern_after;
        if shift < 0.0 {
            kern_before -= shift;
            shift = 0.0;
        }
        degree.position = Point::new(kern_before, raise);

        if let DisplayKind::Radical {
            radicand,
            degree: slot,
            glyph,
            ..
        } = &mut display.kind
        {
            glyph.position.x = shift;
            radicand.position.x = shift + glyph.width;
            display.width = shift + glyph.width + radicand.width;
            display.ascent = display.ascent.max(raise + degree.ascent);
            *slot = Some(Box::new(degree));
        }
    }

    // -------------------------------------------------------------------------
    // Glyph variants and assemblies
    // -------------------------------------------------------------------------

    /// The first vertical variant at least `height` tall, or the largest one.
    /// Returns the glyph with its ascent, descent and advance.
    fn find_glyph(&self, glyph: GlyphId, height: f32) -> (GlyphId, f32, f32, f32) {
        let variants = self.style_font.vertical_variants(glyph);
        let mut found = (glyph, 0.0, 0.0, 0.0);
        for variant in variants {
            let (ascent, descent) = self.style_font.glyph_ascent_descent(variant);
            found = (variant, ascent, descent, self.style_font.advance(variant));
            if ascent + descent >= height {
                break;
            }
        }
        tracing::trace!(
            "Vertical variant {} chosen for glyph {} at height {:.2}",
            found.0,
            glyph,
            height
        );
        found
    }

    /// Build a glyph of at least `height` from its assembly parts. `None`
    /// when the font has no assembly for the glyph.
    fn construct_glyph(&self, glyph: GlyphId, height: f32) -> Option<Display> {
        let parts = self.style_font.vertical_assembly(glyph);
        if parts.is_empty() {
            return None;
        }
        let min_overlap = self.constant(MathConstant::MinConnectorOverlap);
        let (glyphs, offsets, total) = assemble_parts(&parts, min_overlap, height);
        let first = *glyphs.first()?;
        tracing::trace!(
            "Assembled glyph {} from {} parts, height {:.2}",
            glyph,
            glyphs.len(),
            total
        );
        Some(Display::new(
            DisplayKind::GlyphConstruction {
                glyphs,
                offsets,
                font_size: self.style_font.size(),
                shift_down: 0.0,
            },
            total,
            0.0,
            self.style_font.advance(first),
        ))
    }

    /// A glyph for `ch` at least `height` tall, assembled if no variant is
    /// large enough
    fn stretched_glyph(&self, ch: char, height: f32) -> Display {
        let glyph = self.glyph_for_char(ch);
        let (variant, ascent, descent, width) = self.find_glyph(glyph, height);
        if ascent + descent < height {
            if let Some(constructed) = self.construct_glyph(glyph, height) {
                return constructed;
            }
        }
        Display::glyph(variant, self.style_font.size(), ascent, descent, width)
    }

    /// A delimiter glyph of at least `height`, centered on the axis
    fn find_glyph_for_boundary(&self, delimiter: &str, height: f32) -> Display {
        let ch = delimiter.chars().last().unwrap_or(' ');
        let mut display = self.stretched_glyph(ch, height);
        let shift_down = 0.5 * (display.ascent - display.descent) - self.style_font.axis_height();
        display.shift_down(shift_down);
        display
    }

    // -------------------------------------------------------------------------
    // Large operators
    // -------------------------------------------------------------------------

    fn make_large_op(&mut self, atom: &Atom, limits: bool) {
        let stacked = limits && self.is_display_style();
        let range = atom_range(atom);
        let mut chars = atom.nucleus.chars();
        let mut delta = 0.0;

        let display = match (chars.next(), chars.next()) {
            (Some(ch), None) => {
                let mut glyph = self.glyph_for_char(ch);
                if self.is_display_style() && glyph != NOTDEF {
                    glyph = self.style_font.larger_glyph(glyph);
                }
                delta = self.style_font.italic_correction(glyph);
                let (ascent, descent) = self.style_font.glyph_ascent_descent(glyph);
                let mut width = self.style_font.advance(glyph);
                if atom.subscript().is_some() && !limits {
                    // The subscript tucks under the operator unless the
                    // operator asks for limits
                    width -= delta;
                }
                let mut display = Display::glyph(glyph, self.style_font.size(), ascent, descent, width);
                let shift_down = 0.5 * (ascent - descent) - self.style_font.axis_height();
                display.shift_down(shift_down);
                display
            }
            _ => self.make_text(&atom.nucleus),
        }
        .with_range(Some(range.clone()));

        if !atom.has_scripts() {
            self.push_display(display);
            return;
        }
        if stacked {
            let display = self.make_limits(atom, display, delta / 2.0, range);
            self.push_display(display);
            return;
        }
        self.push_display(display);
        self.make_scripts(atom, range.start, delta);
    }

    /// Stack the scripts of a large operator above and below it
    fn make_limits(&self, atom: &Atom, mut nucleus: Display, limit_shift: f32, range: Range<usize>) -> Display {
        let script_style = self.style.script_style();
        let mut upper = atom
            .superscript()
            .map(|list| Typesetter::create_line(list, self.font, script_style, self.cramped, false));
        let mut lower = atom
            .subscript()
            .map(|list| Typesetter::create_line(list, self.font, script_style, true, false));

        let width = [
            Some(nucleus.width),
            upper.as_ref().map(|d| d.width),
            lower.as_ref().map(|d| d.width),
        ]
        .into_iter()
        .flatten()
        .fold(0.0_f32, f32::max);

        let mut ascent = nucleus.ascent;
        let mut descent = nucleus.descent;

        if let Some(upper) = upper.as_mut() {
            let gap = self
                .constant(MathConstant::UpperLimitGapMin)
                .max(self.constant(MathConstant::UpperLimitBaselineRiseMin) - upper.descent);
            upper.position = Point::new(
                (width - upper.width) / 2.0 + limit_shift,
                nucleus.ascent + gap + upper.descent,
            );
            ascent += upper.ascent + gap + upper.descent;
        }
        if let Some(lower) = lower.as_mut() {
            let gap = self
                .constant(MathConstant::LowerLimitGapMin)
                .max(self.constant(MathConstant::LowerLimitBaselineDropMin) - lower.ascent);
            lower.position = Point::new(
                (width - lower.width) / 2.0 - limit_shift,
                -(nucleus.descent + gap + lower.ascent),
            );
            descent += lower.ascent + gap + lower.descent;
        }
        nucleus.position = Point::new((width - nucleus.width) / 2.0, 0.0);

        Display::new(
            DisplayKind::LargeOpLimits {
                nucleus: Box::new(nucleus),
                upper_limit: upper.map(Box::new),
                lower_limit: lower.map(Box::new),
            },
            ascent,
            descent,
            width,
        )
        .with_range(Some(range))
    }

    // -------------------------------------------------------------------------
    // Lines and accents
    // -------------------------------------------------------------------------

    fn make_underline(&self, list: &MathList, range: Range<usize>) -> Display {
        let inner = Typesetter::create_line(list, self.font, self.style, self.cramped, false);
        let gap = self.constant(MathConstant::UnderbarVerticalGap);
        let thickness = self.constant(MathConstant::UnderbarRuleThickness);
        let ascent = inner.ascent;
        let descent =
            inner.descent + gap + thickness + self.constant(MathConstant::UnderbarExtraDescender);
        let width = inner.width;
        let line_shift_up = -(inner.descent + gap);
        Display::new(
            DisplayKind::Line {
                inner: Box::new(inner),
                line_shift_up,
                line_thickness: thickness,
            },
            ascent,
            descent,
            width,
        )
        .with_range(Some(range))
    }

    fn make_overline(&self, list: &MathList, range: Range<usize>) -> Display {
        let inner = Typesetter::create_line(list, self.font, self.style, true, false);
        let gap = self.constant(MathConstant::OverbarVerticalGap);
        let thickness = self.constant(MathConstant::OverbarRuleThickness);
        let ascent =
            inner.ascent + gap + thickness + self.constant(MathConstant::OverbarExtraAscender);
        let descent = inner.descent;
        let width = inner.width;
        let line_shift_up = inner.ascent + gap;
        Display::new(
            DisplayKind::Line {
                inner: Box::new(inner),
                line_shift_up,
                line_thickness: thickness,
            },
            ascent,
            descent,
            width,
        )
        .with_range(Some(range))
    }

    /// The widest horizontal variant whose ink fits in `max_width`, or the
    /// first variant. Returns the glyph with its ascent, descent and advance.
    fn find_variant_glyph(&self, glyph: GlyphId, max_width: f32) -> (GlyphId, f32, f32, f32) {
        let variants = self.style_font.horizontal_variants(glyph);
        let mut found: Option<(GlyphId, f32, f32, f32)> = None;
        for variant in variants {
            let bbox = self.style_font.bounding_box(variant);
            let (ascent, descent) = self.style_font.glyph_ascent_descent(variant);
            let candidate = (variant, ascent, descent, self.style_font.advance(variant));
            if bbox.right() > max_width {
                return found.unwrap_or(candidate);
            }
            found = Some(candidate);
        }
        found.unwrap_or_else(|| {
            let (ascent, descent) = self.style_font.glyph_ascent_descent(glyph);
            (glyph, ascent, descent, self.style_font.advance(glyph))
        })
    }

    /// Lay out an accent. The flag is set when the atom's scripts were moved
    /// onto the accented character.
    fn make_accent(&self, atom: &Atom, accentee_list: &MathList, range: Range<usize>) -> (Display, bool) {
        let mut accentee = Typesetter::create_line(accentee_list, self.font, self.style, true, false);
        let Some(accent_char) = atom.nucleus.chars().last() else {
            return (accentee.with_range(Some(range)), false);
        };

        let accentee_width = accentee.width;
        let glyph = self.glyph_for_char(accent_char);
        let (glyph, glyph_ascent, glyph_descent, glyph_width) =
            self.find_variant_glyph(glyph, accentee_width);

        let delta = accentee
            .ascent
            .min(self.constant(MathConstant::AccentBaseHeight));
        let skew = self.skew(accentee_list, accentee_width, glyph);
        let height = accentee.ascent - delta;

        let mut accent = Display::glyph(
            glyph,
            self.style_font.size(),
            glyph_ascent,
            glyph_descent,
            glyph_width,
        )
        .with_range(Some(range.clone()));
        accent.position = Point::new(skew, height);

        let single_char = is_single_char_accentee(accentee_list);
        let scripts_moved = single_char && atom.has_scripts();
        if scripts_moved {
            let mut list = accentee_list.clone();
            if let Some(inner) = list.atoms.first_mut() {
                inner.set_superscript(atom.superscript().cloned());
                inner.set_subscript(atom.subscript().cloned());
            }
            accentee = Typesetter::create_line(&list, self.font, self.style, self.cramped, false);
        }

        let width = accentee.width;
        let descent = accentee.descent;
        let ascent = accentee.ascent.max(accentee.ascent - delta + glyph_ascent);
        let display = Display::new(
            DisplayKind::Accent {
                accentee: Box::new(accentee),
                accent: Box::new(accent),
            },
            ascent,
            descent,
            width,
        )
        .with_range(Some(range));
        (display, scripts_moved)
    }

    /// Horizontal offset that lines the accent's anchor up with the accentee's
    fn skew(&self, accentee: &MathList, accentee_width: f32, accent_glyph: GlyphId) -> f32 {
        let accent_anchor = self.style_font.top_accent_attachment(accent_glyph);
        let accentee_anchor = if is_single_char_accentee(accentee) {
            accentee
                .atoms
                .first()
                .and_then(|atom| styled_nucleus(atom).chars().last())
                .map_or(accentee_width / 2.0, |ch| {
                    self.style_font.top_accent_attachment(self.glyph_for_char(ch))
                })
        } else {
            accentee_width / 2.0
        };
        accentee_anchor - accent_anchor
    }

    // -------------------------------------------------------------------------
    // Inner
    // -------------------------------------------------------------------------

    fn make_inner(&self, inner: &Inner, range: Range<usize>) -> Display {
        debug_assert!(
            inner.left_boundary().is_some() || inner.right_boundary().is_some(),
            "inner without boundaries"
        );
        let mut content = Typesetter::create_line(&inner.inner_list, self.font, self.style, self.cramped, false);

        let axis_height = self.style_font.axis_height();
        // Largest distance from the axis
        let delta = (content.ascent - axis_height).max(content.descent + axis_height);
        let covered = (delta / 500.0) * DELIMITER_FACTOR;
        let shortfall = 2.0 * delta - DELIMITER_SHORTFALL_POINTS;
        let glyph_height = covered.max(shortfall);

        let delimiter = |boundary: Option<&Atom>| {
            boundary
                .filter(|atom| !atom.nucleus.is_empty())
                .map(|atom| self.find_glyph_for_boundary(&atom.nucleus, glyph_height))
        };
        let mut left = delimiter(inner.left_boundary());
        let mut right = delimiter(inner.right_boundary());

        let mut x = 0.0_f32;
        let mut ascent = content.ascent;
        let mut descent = content.descent;
        if let Some(left) = left.as_mut() {
            left.position = Point::origin();
            x += left.width;
            ascent = ascent.max(left.ascent);
            descent = descent.max(left.descent);
        }
        content.position = Point::new(x, 0.0);
        x += content.width;
        if let Some(right) = right.as_mut() {
            right.position = Point::new(x, 0.0);
            x += right.width;
            ascent = ascent.max(right.ascent);
            descent = descent.max(right.descent);
        }

        Display::new(
            DisplayKind::Inner {
                inner: Box::new(content),
                left_delimiter: left.map(Box::new),
                right_delimiter: right.map(Box::new),
            },
            ascent,
            descent,
            x,
        )
        .with_range(Some(range))
    }

    // -------------------------------------------------------------------------
    // Tables
    // -------------------------------------------------------------------------

    fn make_table(&self, table: &Table, range: Range<usize>) -> Display {
        let num_columns = table.num_columns();
        if num_columns == 0 || table.num_rows() == 0 {
            return Display::list(Vec::new(), Some(range));
        }

        let mut column_widths = vec![0.0_f32; num_columns];
        let cells: Vec<Vec<Display>> = table
            .cells
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .map(|(column, cell)| {
                        let display = Typesetter::create_line(cell, self.font, self.style, false, true);
                        column_widths[column] = column_widths[column].max(display.width);
                        display
                    })
                    .collect()
            })
            .collect();

        let column_spacing = table.inter_column_spacing * self.style_font.mu();
        let mut rows: Vec<Display> = cells
            .into_iter()
            .map(|row| {
                let mut column_start = 0.0_f32;
                let mut row_range = None;
                let mut columns = Vec::with_capacity(row.len());
                for (column, mut cell) in row.into_iter().enumerate() {
                    let column_width = column_widths[column];
                    let x = match table.alignment(column) {
                        ColumnAlignment::Left => column_start,
                        ColumnAlignment::Center => column_start + (column_width - cell.width) / 2.0,
                        ColumnAlignment::Right => column_start + column_width - cell.width,
                    };
                    cell.position = Point::new(x, 0.0);
                    row_range = union_ranges(row_range, cell.range.clone());
                    columns.push(cell);
                    column_start += column_width + column_spacing;
                }
                Display::list(columns, row_range)
            })
            .collect();

        self.position_rows(&mut rows, table);
        Display::table(rows, Some(range))
    }

    /// Stack rows downward from y = 0 using baselineskip and lineskip, then
    /// center the stack on the axis
    fn position_rows(&self, rows: &mut [Display], table: &Table) {
        let size = self.style_font.size();
        let openup = table.inter_row_additional_spacing * JOT_MULTIPLIER * size;
        let baseline_skip = openup + BASELINE_SKIP_MULTIPLIER * size;
        let line_skip = openup + LINE_SKIP_MULTIPLIER * size;
        let line_skip_limit = openup + LINE_SKIP_LIMIT_MULTIPLIER * size;

        let mut current = 0.0_f32;
        let mut prev_descent = 0.0_f32;
        let mut ascent = 0.0_f32;
        for (i, row) in rows.iter_mut().enumerate() {
            if i == 0 {
                row.position = Point::origin();
                ascent = row.ascent;
            } else {
                let mut skip = baseline_skip;
                if skip - (prev_descent + row.ascent) < line_skip_limit {
                    skip = prev_descent + row.ascent + line_skip;
                }
                current -= skip;
                row.position = Point::new(0.0, current);
            }
            prev_descent = row.descent;
        }

        let descent = -current + prev_descent;
        let shift_down = 0.5 * (ascent - descent) - self.style_font.axis_height();
        for row in rows.iter_mut() {
            row.position.y -= shift_down;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::MathTable;
    use crate::parser::parse;
    use std::sync::Arc;

    const SIZE: f32 = 20.0;
    const EPSILON: f32 = 1e-3;

    fn font() -> ScaledFont {
        ScaledFont::approximate(SIZE)
    }

    fn layout(latex: &str, style: LineStyle) -> Display {
        typeset(&parse(latex).unwrap(), &font(), style)
    }

    fn children(display: &Display) -> &[Display] {
        match &display.kind {
            DisplayKind::List { children, .. } => children,
            other => panic!("expected a list, got {other:?}"),
        }
    }

    /// The approximate table with the scripting constants pinned, in
    /// design units (1000 per em, so 1 unit is 0.02pt at 20pt)
    fn pinned_font(constants: &[(MathConstant, f32)]) -> ScaledFont {
        let mut table = MathTable::approximate();
        for (constant, value) in constants {
            table.constants.insert(constant.name().to_string(), *value);
        }
        ScaledFont::new(Arc::new(table), SIZE)
    }

    fn script_constants(gap_min: f32) -> ScaledFont {
        pinned_font(&[
            (MathConstant::AxisHeight, 250.0),
            (MathConstant::SuperscriptShiftUp, 400.0),
            (MathConstant::SuperscriptShiftUpCramped, 300.0),
            (MathConstant::SuperscriptBottomMin, 100.0),
            (MathConstant::SuperscriptBottomMaxWithSubscript, 400.0),
            (MathConstant::SubscriptShiftDown, 350.0),
            (MathConstant::SubscriptTopMax, 400.0),
            (MathConstant::SubSuperscriptGapMin, gap_min),
            (MathConstant::SpaceAfterScript, 0.0),
        ])
    }

    fn text_run(display: &Display) -> &TextRun {
        match &display.kind {
            DisplayKind::TextRun(run) => run,
            other => panic!("expected a text run, got {other:?}"),
        }
    }

    #[test]
    fn test_spacing_table() {
        assert_eq!(spacing_between(AtomType::Ordinary, AtomType::BinaryOperator), Spacing::NsMedium);
        assert_eq!(spacing_between(AtomType::Relation, AtomType::Ordinary), Spacing::NsThick);
        assert_eq!(spacing_between(AtomType::LargeOperator, AtomType::Ordinary), Spacing::Thin);
        assert_eq!(spacing_between(AtomType::Radical, AtomType::Ordinary), Spacing::NsMedium);
        assert_eq!(spacing_between(AtomType::Ordinary, AtomType::Radical), Spacing::Invalid);
        assert_eq!(spacing_between(AtomType::Open, AtomType::BinaryOperator), Spacing::Invalid);
        assert_eq!(Spacing::NsThick.mu(LineStyle::Text), 5.0);
        assert_eq!(Spacing::NsThick.mu(LineStyle::Script), 0.0);
        assert_eq!(Spacing::Thin.mu(LineStyle::ScriptScript), 3.0);
    }

    #[test]
    fn test_one_plus_one_spacing() {
        let display = layout("1+1", LineStyle::Text);
        let runs = children(&display);
        assert_eq!(runs.len(), 1);
        let run = text_run(&runs[0]);
        assert_eq!(run.glyphs.len(), 3);

        let font = font();
        let medium = 4.0 * font.mu();
        let one = font.advance(run.glyphs[0]);
        let plus = font.advance(run.glyphs[1]);
        assert!((run.offsets[1] - one - medium).abs() < EPSILON);
        assert!((run.offsets[2] - run.offsets[1] - plus - medium).abs() < EPSILON);
        assert!((display.width - (2.0 * one + plus + 2.0 * medium)).abs() < EPSILON);
    }

    #[test]
    fn test_scripts_straddle_axis() {
        let display = layout("a^b_c", LineStyle::Display);
        let parts = children(&display);
        assert_eq!(parts.len(), 3);
        assert!(parts[0].has_script);

        let superscript = &parts[1];
        let subscript = &parts[2];
        assert!(matches!(
            superscript.kind,
            DisplayKind::List { line_position: LinePosition::Superscript, index: Some(0), .. }
        ));
        assert!(matches!(
            subscript.kind,
            DisplayKind::List { line_position: LinePosition::Subscript, index: Some(0), .. }
        ));

        let axis = font().axis_height();
        assert!(superscript.position.y - superscript.descent > axis);
        assert!(subscript.position.y < axis);
        assert!(subscript.position.y + subscript.ascent < axis);
        let gap = (superscript.position.y - superscript.descent)
            - (subscript.position.y + subscript.ascent);
        assert!(gap + EPSILON >= font().constant(MathConstant::SubSuperscriptGapMin));
        // Superscript is kerned by the italic correction
        assert!(superscript.position.x > subscript.position.x);
    }

    #[test]
    fn test_scripts_with_pinned_constants() {
        let font = script_constants(200.0);
        let display = typeset(&parse("a^b_c").unwrap(), &font, LineStyle::Display);
        let parts = children(&display);
        let superscript = &parts[1];
        let subscript = &parts[2];

        // 5pt axis, 8pt shift up, 7pt shift down, 4pt minimum gap
        let axis = font.axis_height();
        assert!((axis - 5.0).abs() < EPSILON);
        assert!((superscript.position.y - 8.0).abs() < EPSILON);
        assert!((subscript.position.y + 7.0).abs() < EPSILON);
        assert!(superscript.position.y - superscript.descent > axis);
        assert!(subscript.position.y + subscript.ascent < axis);
        let gap = (superscript.position.y - superscript.descent)
            - (subscript.position.y + subscript.ascent);
        assert!(gap + EPSILON >= 4.0);
    }

    #[test]
    fn test_scripts_pushed_apart_by_gap_min() {
        // A 12pt minimum gap is more than the shifts leave
        let font = script_constants(600.0);
        let display = typeset(&parse("a^b_c").unwrap(), &font, LineStyle::Display);
        let parts = children(&display);
        let superscript = &parts[1];
        let subscript = &parts[2];

        let gap = (superscript.position.y - superscript.descent)
            - (subscript.position.y + subscript.ascent);
        assert!((gap - 12.0).abs() < EPSILON);
        assert!(subscript.position.y < -7.0);
        assert!(subscript.position.y + subscript.ascent < font.axis_height());
    }

    #[test]
    fn test_script_font_is_smaller() {
        let display = layout("x^2", LineStyle::Text);
        let superscript = &children(&display)[1];
        let run = text_run(&children(superscript)[0]);
        assert!((run.font_size - SIZE * 0.7).abs() < EPSILON);
    }

    #[test]
    fn test_fraction_layout() {
        let display = layout("\\frac{1}{2}", LineStyle::Display);
        let fraction = &children(&display)[0];
        let DisplayKind::Fraction {
            numerator,
            denominator,
            rule_position,
            rule_thickness,
        } = &fraction.kind
        else {
            panic!("expected a fraction");
        };
        assert_eq!(*rule_position, font().axis_height());
        assert!(*rule_thickness > 0.0);
        assert!(numerator.position.y - numerator.descent > rule_position + rule_thickness / 2.0);
        assert!(denominator.position.y + denominator.ascent < rule_position - rule_thickness / 2.0);
        assert_eq!(fraction.width, numerator.width.max(denominator.width));
        assert_eq!(fraction.range, Some(0..1));
    }

    #[test]
    fn test_binomial_has_delimiters() {
        let display = layout("\\binom{n}{k}", LineStyle::Text);
        let wrapper = &children(&display)[0];
        let parts = children(wrapper);
        assert_eq!(parts.len(), 3);
        assert!(matches!(parts[1].kind, DisplayKind::Fraction { rule_thickness, .. } if rule_thickness == 0.0));
        assert!(parts[1].position.x > 0.0);
        assert!(parts[2].position.x >= parts[1].position.x + parts[1].width - EPSILON);
    }

    #[test]
    fn test_radical_covers_radicand() {
        let display = layout("\\sqrt{x}", LineStyle::Text);
        let radical = &children(&display)[0];
        let DisplayKind::Radical {
            radicand,
            glyph,
            top_kern,
            rule_thickness,
            degree,
        } = &radical.kind
        else {
            panic!("expected a radical");
        };
        assert!(degree.is_none());
        assert_eq!(radicand.position.x, glyph.width);
        assert!((radical.width - glyph.width - radicand.width).abs() < EPSILON);
        let rule_bottom = radical.ascent - top_kern - rule_thickness;
        assert!(rule_bottom > radicand.ascent);
        assert!((glyph.ascent - (radical.ascent - top_kern)).abs() < EPSILON);
    }

    #[test]
    fn test_radical_degree_never_shifts_left() {
        let display = layout("\\sqrt[3]{x}", LineStyle::Text);
        let radical = &children(&display)[0];
        let DisplayKind::Radical { degree, glyph, radicand, .. } = &radical.kind else {
            panic!("expected a radical");
        };
        let degree = degree.as_ref().unwrap();
        assert!(glyph.position.x >= 0.0);
        assert!(degree.position.x >= font().constant(MathConstant::RadicalKernBeforeDegree) - EPSILON);
        assert!(degree.position.y > 0.0);
        assert!((radicand.position.x - glyph.position.x - glyph.width).abs() < EPSILON);
    }

    #[test]
    fn test_large_op_limits_in_display_style() {
        let display = layout("\\sum_{i=1}^{n} i", LineStyle::Display);
        let op = &children(&display)[0];
        let DisplayKind::LargeOpLimits {
            nucleus,
            upper_limit,
            lower_limit,
        } = &op.kind
        else {
            panic!("expected limits, got {:?}", op.kind);
        };
        let upper = upper_limit.as_ref().unwrap();
        let lower = lower_limit.as_ref().unwrap();
        assert!(upper.position.y - upper.descent > nucleus.ascent);
        assert!(lower.position.y + lower.ascent < -nucleus.descent);
        assert!(op.width >= nucleus.width);
    }

    #[test]
    fn test_large_op_scripts_in_text_style() {
        let display = layout("\\sum_{i}^{n}", LineStyle::Text);
        let parts = children(&display);
        assert_eq!(parts.len(), 3);
        assert!(matches!(parts[0].kind, DisplayKind::Glyph { .. }));
        assert!(parts[0].has_script);
        // Operator is centered on the axis
        let axis = font().axis_height();
        assert!(((parts[0].ascent - parts[0].descent) / 2.0 - axis).abs() < EPSILON);
    }

    #[test]
    fn test_integral_uses_display_variant() {
        let text = layout("\\int", LineStyle::Text);
        let display = layout("\\int", LineStyle::Display);
        let height = |d: &Display| d.ascent + d.descent;
        assert!(height(&display) > height(&text));
    }

    #[test]
    fn test_limits_flag_keeps_italic_width_in_text_style() {
        let font = font();
        let glyph = font.glyph_for_char('\u{222B}').unwrap();
        let advance = font.advance(glyph);
        let italic = font.italic_correction(glyph);
        assert!(italic > 0.0);

        let display = layout("\\int\\limits_0", LineStyle::Text);
        let op = &children(&display)[0];
        assert!(matches!(op.kind, DisplayKind::Glyph { .. }));
        assert!((op.width - advance).abs() < EPSILON);

        let display = layout("\\int\\nolimits_0", LineStyle::Text);
        let op = &children(&display)[0];
        assert!((op.width - (advance - italic)).abs() < EPSILON);
    }

    #[test]
    fn test_inner_delimiters_grow() {
        let display = layout("\\left( \\frac{\\frac{a}{b}}{\\frac{c}{d}} \\right)", LineStyle::Display);
        let inner = &children(&display)[0];
        let DisplayKind::Inner {
            inner: content,
            left_delimiter,
            right_delimiter,
        } = &inner.kind
        else {
            panic!("expected an inner");
        };
        let left = left_delimiter.as_ref().unwrap();
        let right = right_delimiter.as_ref().unwrap();
        assert_eq!(content.position.x, left.width);
        assert!((right.position.x - left.width - content.width).abs() < EPSILON);
        assert!(left.ascent + left.descent >= 0.9 * (content.ascent + content.descent) - 5.0);
        assert!((inner.width - left.width - content.width - right.width).abs() < EPSILON);
    }

    #[test]
    fn test_empty_boundary_has_no_glyph() {
        let display = layout("\\left. x \\right|", LineStyle::Text);
        let inner = &children(&display)[0];
        let DisplayKind::Inner { left_delimiter, right_delimiter, .. } = &inner.kind else {
            panic!("expected an inner");
        };
        assert!(left_delimiter.is_none());
        assert!(right_delimiter.is_some());
    }

    #[test]
    fn test_tall_delimiter_is_assembled() {
        let font = font();
        let typesetter = Typesetter::new(&font, LineStyle::Text, false, false);
        let display = typesetter.find_glyph_for_boundary("(", 10.0 * SIZE);
        let DisplayKind::GlyphConstruction { glyphs, offsets, .. } = &display.kind else {
            panic!("expected a construction, got {:?}", display.kind);
        };
        assert!(glyphs.len() >= 3);
        assert_eq!(glyphs.len(), offsets.len());
        assert!(display.ascent + display.descent >= 10.0 * SIZE - EPSILON);
        assert!(offsets.windows(2).all(|pair| pair[1] > pair[0]));
    }

    #[test]
    fn test_assembly_without_extenders_terminates() {
        let part = |glyph, is_extender| GlyphPart {
            glyph,
            full_advance: 10.0,
            start_connector_length: 2.0,
            end_connector_length: 2.0,
            is_extender,
        };
        let (glyphs, offsets, height) = assemble_parts(&[part(1, false), part(2, false)], 1.0, 100.0);
        assert_eq!(glyphs, vec![1, 2]);
        assert_eq!(offsets, vec![0.0, 9.0]);
        assert_eq!(height, 19.0);

        let (glyphs, _, height) = assemble_parts(&[part(1, false), part(3, true), part(2, false)], 1.0, 40.0);
        assert!(height >= 40.0);
        assert_eq!(glyphs.first(), Some(&1));
        assert_eq!(glyphs.last(), Some(&2));
        assert!(glyphs.len() > 3);
    }

    #[test]
    fn test_assembly_spreads_to_height() {
        let part = |glyph| GlyphPart {
            glyph,
            full_advance: 10.0,
            start_connector_length: 4.0,
            end_connector_length: 4.0,
            is_extender: false,
        };
        let (_, offsets, height) = assemble_parts(&[part(1), part(2), part(3)], 1.0, 20.0);
        assert_eq!(height, 22.0);
        assert_eq!(offsets, vec![0.0, 6.0, 12.0]);

        let (_, offsets, height) = assemble_parts(&[part(1), part(2), part(3)], 1.0, 26.0);
        assert_eq!(height, 26.0);
        assert_eq!(offsets, vec![0.0, 8.0, 16.0]);
    }

    #[test]
    fn test_accent_placement() {
        let display = layout("\\hat{x}", LineStyle::Text);
        let accent = &children(&display)[0];
        let DisplayKind::Accent { accentee, accent: glyph } = &accent.kind else {
            panic!("expected an accent");
        };
        let base_height = font().constant(MathConstant::AccentBaseHeight);
        let expected = accentee.ascent - accentee.ascent.min(base_height);
        assert!((glyph.position.y - expected).abs() < EPSILON);
        assert_eq!(accent.width, accentee.width);
        assert!(accent.ascent >= accentee.ascent);
    }

    #[test]
    fn test_accent_scripts_move_to_base() {
        let display = layout("\\hat{x}^2", LineStyle::Text);
        let parts = children(&display);
        assert_eq!(parts.len(), 1, "scripts should live inside the accentee");
        let DisplayKind::Accent { accentee, .. } = &parts[0].kind else {
            panic!("expected an accent");
        };
        assert_eq!(children(accentee).len(), 2);

        let display = layout("\\hat{xy}^2", LineStyle::Text);
        assert_eq!(children(&display).len(), 2);
    }

    #[test]
    fn test_overline_and_underline() {
        let plain = layout("x", LineStyle::Text);
        let over_layout = layout("\\overline{x}", LineStyle::Text);
        let under_layout = layout("\\underline{x}", LineStyle::Text);
        let over = &children(&over_layout)[0];
        let under = &children(&under_layout)[0];
        assert!(over.ascent > plain.ascent);
        assert_eq!(over.descent, plain.descent);
        assert!(under.descent > plain.descent);
        assert_eq!(under.ascent, plain.ascent);
        let DisplayKind::Line { line_shift_up, .. } = under.kind else {
            panic!("expected a line");
        };
        assert!(line_shift_up < 0.0);
    }

    #[test]
    fn test_space_advances_pen() {
        let display = layout("a\\quad b", LineStyle::Text);
        let parts = children(&display);
        assert_eq!(parts.len(), 2);
        let gap = parts[1].position.x - parts[0].width;
        assert!((gap - 18.0 * font().mu()).abs() < EPSILON);
    }

    #[test]
    fn test_style_change_shrinks_font() {
        let display = layout("a\\scriptstyle b", LineStyle::Text);
        let parts = children(&display);
        assert_eq!(text_run(&parts[0]).font_size, SIZE);
        assert!((text_run(&parts[1]).font_size - SIZE * 0.7).abs() < EPSILON);
    }

    #[test]
    fn test_color_propagates() {
        let display = layout("\\color{#ff0000}{x}y", LineStyle::Text);
        let parts = children(&display);
        assert_eq!(parts[0].local_text_color, Some(Color::RED));
        let inner = &children(&parts[0])[0];
        assert_eq!(inner.text_color, Some(Color::RED));
        assert_eq!(parts[1].text_color, None);
    }

    #[test]
    fn test_colorbox_sets_background() {
        let display = layout("\\colorbox{#00ff00}{x}", LineStyle::Text);
        let part = &children(&display)[0];
        assert_eq!(part.local_background_color, Some(Color::rgb(0, 255, 0)));
        assert_eq!(part.local_text_color, None);
    }

    #[test]
    fn test_placeholder_is_blue() {
        let display = layout("x+\\square", LineStyle::Text);
        let parts = children(&display);
        let last = parts.last().unwrap();
        assert_eq!(last.text_color, Some(Color::BLUE));
        assert_eq!(parts[0].text_color, None);
    }

    #[test]
    fn test_table_rows_centered_on_axis() {
        let display = layout("\\begin{matrix}1&2\\\\3&4\\end{matrix}", LineStyle::Text);
        let table = &children(&display)[0];
        let DisplayKind::Table { rows } = &table.kind else {
            panic!("expected a table, got {:?}", table.kind);
        };
        assert_eq!(rows.len(), 2);
        assert!(rows[0].position.y > rows[1].position.y);
        let axis = font().axis_height();
        assert!(((table.ascent - table.descent) / 2.0 - axis).abs() < 0.5);
        assert_eq!(children(&rows[0]).len(), 2);
        assert!(children(&rows[0])[1].position.x > children(&rows[0])[0].position.x);
    }

    #[test]
    fn test_ranges_cover_source() {
        let display = layout("x+y", LineStyle::Text);
        assert_eq!(display.range, Some(0..3));
        let display = layout("12+x", LineStyle::Text);
        assert_eq!(display.range, Some(0..4));
        assert_eq!(children(&display)[0].range, Some(0..4));
    }

    #[test]
    fn test_empty_list() {
        let display = layout("", LineStyle::Display);
        assert!(children(&display).is_empty());
        assert_eq!(display.width, 0.0);
        assert_eq!(display.range, None);
    }
}
