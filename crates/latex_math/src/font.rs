//! Font Metrics - the math table consumed by the typesetter
//!
//! [`FontMetrics`] is the provider interface: OpenType MATH constants, glyph
//! lookup, size variants, assemblies and per-glyph metrics, all in design
//! units. [`ScaledFont`] binds a provider to a point size and converts to
//! points. [`MathTable`] is the concrete provider, loaded from JSON or built
//! with [`MathTable::approximate`].

use crate::display::Rect;
use crate::error::{MathError, MathResult};
use crate::model::FontStyle;
use crate::symbols;
use crate::unicode;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::{Arc, OnceLock};

/// Index of a glyph in its font
pub type GlyphId = u16;

/// Glyph 0 is always `.notdef`. It stands in for characters the font lacks.
pub const NOTDEF: GlyphId = 0;

// =============================================================================
// Constants
// =============================================================================

macro_rules! math_constants {
    ($($name:ident),* $(,)?) => {
        /// Named constants of the OpenType MATH table
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum MathConstant {
            $($name),*
        }

        impl MathConstant {
            /// Every constant, in table order
            pub const ALL: &'static [MathConstant] = &[$(MathConstant::$name),*];

            /// The OpenType name, used as the key in math table documents
            pub fn name(self) -> &'static str {
                match self {
                    $(MathConstant::$name => stringify!($name)),*
                }
            }
        }
    };
}

math_constants! {
    ScriptPercentScaleDown,
    ScriptScriptPercentScaleDown,
    DelimitedSubFormulaMinHeight,
    DisplayOperatorMinHeight,
    MathLeading,
    AxisHeight,
    AccentBaseHeight,
    FlattenedAccentBaseHeight,
    SubscriptShiftDown,
    SubscriptTopMax,
    SubscriptBaselineDropMin,
    SuperscriptShiftUp,
    SuperscriptShiftUpCramped,
    SuperscriptBottomMin,
    SuperscriptBaselineDropMax,
    SubSuperscriptGapMin,
    SuperscriptBottomMaxWithSubscript,
    SpaceAfterScript,
    UpperLimitGapMin,
    UpperLimitBaselineRiseMin,
    LowerLimitGapMin,
    LowerLimitBaselineDropMin,
    StackTopShiftUp,
    StackTopDisplayStyleShiftUp,
    StackBottomShiftDown,
    StackBottomDisplayStyleShiftDown,
    StackGapMin,
    StackDisplayStyleGapMin,
    StretchStackTopShiftUp,
    StretchStackBottomShiftDown,
    StretchStackGapAboveMin,
    StretchStackGapBelowMin,
    FractionNumeratorShiftUp,
    FractionNumeratorDisplayStyleShiftUp,
    FractionDenominatorShiftDown,
    FractionDenominatorDisplayStyleShiftDown,
    FractionNumeratorGapMin,
    FractionNumDisplayStyleGapMin,
    FractionRuleThickness,
    FractionDenominatorGapMin,
    FractionDenomDisplayStyleGapMin,
    SkewedFractionHorizontalGap,
    SkewedFractionVerticalGap,
    OverbarVerticalGap,
    OverbarRuleThickness,
    OverbarExtraAscender,
    UnderbarVerticalGap,
    UnderbarRuleThickness,
    UnderbarExtraDescender,
    RadicalVerticalGap,
    RadicalDisplayStyleVerticalGap,
    RadicalRuleThickness,
    RadicalExtraAscender,
    RadicalKernBeforeDegree,
    RadicalKernAfterDegree,
    RadicalDegreeBottomRaisePercent,
    MinConnectorOverlap,
}

impl MathConstant {
    /// Look a constant up by its OpenType name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|constant| constant.name() == name)
    }

    /// Percent constants are stored as integer percentages rather than
    /// design units
    pub fn is_percent(self) -> bool {
        matches!(
            self,
            MathConstant::ScriptPercentScaleDown
                | MathConstant::ScriptScriptPercentScaleDown
                | MathConstant::RadicalDegreeBottomRaisePercent
        )
    }
}

// =============================================================================
// Provider interface
// =============================================================================

/// One piece of a vertical glyph assembly
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphPart {
    pub glyph: GlyphId,
    /// Advance of the part in the direction of growth
    pub full_advance: f32,
    /// Length of straight connector material at the start (bottom)
    pub start_connector_length: f32,
    /// Length of straight connector material at the end (top)
    pub end_connector_length: f32,
    /// Extenders may be skipped or repeated
    pub is_extender: bool,
}

/// Source of math layout information. All lengths are in design units.
pub trait FontMetrics: Send + Sync {
    fn units_per_em(&self) -> u16;

    /// Value of a MATH constant. Missing constants are 0.
    fn constant(&self, constant: MathConstant) -> f32;

    fn glyph_for_char(&self, ch: char) -> Option<GlyphId>;

    fn glyph_name(&self, glyph: GlyphId) -> Option<&str>;

    fn glyph_with_name(&self, name: &str) -> Option<GlyphId>;

    /// Vertical size variants, smallest first. A glyph without variants is
    /// its own only variant.
    fn vertical_variants(&self, glyph: GlyphId) -> Vec<GlyphId>;

    /// Horizontal size variants, narrowest first
    fn horizontal_variants(&self, glyph: GlyphId) -> Vec<GlyphId>;

    /// Parts for building an arbitrarily tall version of the glyph, bottom
    /// first. Empty when the glyph cannot be assembled.
    fn vertical_assembly(&self, glyph: GlyphId) -> Vec<GlyphPart>;

    fn italic_correction(&self, glyph: GlyphId) -> f32;

    /// Horizontal position of the top accent anchor
    fn top_accent_attachment(&self, glyph: GlyphId) -> f32;

    fn advance_width(&self, glyph: GlyphId) -> f32;

    /// Ink bounds with y pointing up from the baseline
    fn bounding_box(&self, glyph: GlyphId) -> Rect;

    /// The next larger vertical variant, or the glyph itself
    fn larger_glyph(&self, glyph: GlyphId) -> GlyphId {
        self.vertical_variants(glyph)
            .into_iter()
            .find(|&variant| variant != glyph)
            .unwrap_or(glyph)
    }
}

// =============================================================================
// Scaled font
// =============================================================================

/// A [`FontMetrics`] provider at a point size
#[derive(Clone)]
pub struct ScaledFont {
    metrics: Arc<dyn FontMetrics>,
    size: f32,
}

impl fmt::Debug for ScaledFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScaledFont")
            .field("size", &self.size)
            .field("units_per_em", &self.metrics.units_per_em())
            .finish()
    }
}

impl ScaledFont {
    pub fn new(metrics: Arc<dyn FontMetrics>, size: f32) -> Self {
        Self { metrics, size }
    }

    /// The built-in approximate math table at `size` points
    pub fn approximate(size: f32) -> Self {
        Self::new(MathTable::shared_approximate(), size)
    }

    /// The same font at another size
    pub fn with_size(&self, size: f32) -> Self {
        Self {
            metrics: Arc::clone(&self.metrics),
            size,
        }
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn metrics(&self) -> &dyn FontMetrics {
        self.metrics.as_ref()
    }

    /// One mu, 1/18 em
    pub fn mu(&self) -> f32 {
        self.size / 18.0
    }

    fn to_points(&self, units: f32) -> f32 {
        units * self.size / f32::from(self.metrics.units_per_em().max(1))
    }

    /// A length constant in points
    pub fn constant(&self, constant: MathConstant) -> f32 {
        self.to_points(self.metrics.constant(constant))
    }

    /// A percent constant as a fraction (70 -> 0.7)
    pub fn percent(&self, constant: MathConstant) -> f32 {
        self.metrics.constant(constant) / 100.0
    }

    pub fn axis_height(&self) -> f32 {
        self.constant(MathConstant::AxisHeight)
    }

    /// Delimiter size around generalized fractions in text style (sigma 21)
    pub fn fraction_delimiter_size(&self) -> f32 {
        1.01 * self.size
    }

    /// Delimiter size around generalized fractions in display style (sigma 20)
    pub fn fraction_delimiter_display_style_size(&self) -> f32 {
        2.39 * self.size
    }

    pub fn glyph_for_char(&self, ch: char) -> Option<GlyphId> {
        self.metrics.glyph_for_char(ch)
    }

    pub fn glyph_name(&self, glyph: GlyphId) -> Option<&str> {
        self.metrics.glyph_name(glyph)
    }

    pub fn glyph_with_name(&self, name: &str) -> Option<GlyphId> {
        self.metrics.glyph_with_name(name)
    }

    pub fn advance(&self, glyph: GlyphId) -> f32 {
        self.to_points(self.metrics.advance_width(glyph))
    }

    pub fn bounding_box(&self, glyph: GlyphId) -> Rect {
        let bbox = self.metrics.bounding_box(glyph);
        Rect::new(
            self.to_points(bbox.x()),
            self.to_points(bbox.y()),
            self.to_points(bbox.width()),
            self.to_points(bbox.height()),
        )
    }

    /// Ascent and descent of the glyph's ink, both clamped at zero
    pub fn glyph_ascent_descent(&self, glyph: GlyphId) -> (f32, f32) {
        let bbox = self.bounding_box(glyph);
        (bbox.top().max(0.0), (-bbox.y()).max(0.0))
    }

    pub fn italic_correction(&self, glyph: GlyphId) -> f32 {
        self.to_points(self.metrics.italic_correction(glyph))
    }

    pub fn top_accent_attachment(&self, glyph: GlyphId) -> f32 {
        self.to_points(self.metrics.top_accent_attachment(glyph))
    }

    pub fn vertical_variants(&self, glyph: GlyphId) -> Vec<GlyphId> {
        self.metrics.vertical_variants(glyph)
    }

    pub fn horizontal_variants(&self, glyph: GlyphId) -> Vec<GlyphId> {
        self.metrics.horizontal_variants(glyph)
    }

    pub fn larger_glyph(&self, glyph: GlyphId) -> GlyphId {
        self.metrics.larger_glyph(glyph)
    }

    /// Assembly parts with lengths in points
    pub fn vertical_assembly(&self, glyph: GlyphId) -> Vec<GlyphPart> {
        self.metrics
            .vertical_assembly(glyph)
            .into_iter()
            .map(|part| GlyphPart {
                full_advance: self.to_points(part.full_advance),
                start_connector_length: self.to_points(part.start_connector_length),
                end_connector_length: self.to_points(part.end_connector_length),
                ..part
            })
            .collect()
    }
}

// =============================================================================
// Math table document
// =============================================================================

/// A glyph entry of a math table document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphInfo {
    pub name: String,
    /// The character this glyph is the default rendering of
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codepoint: Option<char>,
    pub advance: f32,
    /// `[x_min, y_min, x_max, y_max]`
    pub bbox: [f32; 4],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssemblyPart {
    pub glyph: String,
    pub advance: f32,
    #[serde(default)]
    pub start_connector: f32,
    #[serde(default)]
    pub end_connector: f32,
    #[serde(default)]
    pub extender: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GlyphAssembly {
    #[serde(default)]
    pub italic: f32,
    pub parts: Vec<AssemblyPart>,
}

/// A math font described as data. The first glyph is the `.notdef` glyph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MathTable {
    pub units_per_em: u16,
    #[serde(default)]
    pub constants: BTreeMap<String, f32>,
    pub glyphs: Vec<GlyphInfo>,
    #[serde(default)]
    pub v_variants: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub h_variants: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub italic: BTreeMap<String, f32>,
    #[serde(default)]
    pub accents: BTreeMap<String, f32>,
    #[serde(default)]
    pub v_assembly: BTreeMap<String, GlyphAssembly>,
    #[serde(skip)]
    by_name: HashMap<String, GlyphId>,
    #[serde(skip)]
    by_char: HashMap<char, GlyphId>,
}

impl MathTable {
    /// Parse and validate a math table document
    pub fn from_json(json: &str) -> MathResult<Self> {
        let mut table: MathTable = serde_json::from_str(json)?;
        table.reindex()?;
        Ok(table)
    }

    /// Load a math table document from disk
    pub fn load(path: impl AsRef<Path>) -> MathResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> MathResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The approximate table, built once and shared
    pub fn shared_approximate() -> Arc<MathTable> {
        static APPROXIMATE: OnceLock<Arc<MathTable>> = OnceLock::new();
        Arc::clone(APPROXIMATE.get_or_init(|| Arc::new(MathTable::approximate())))
    }

    fn rebuild_maps(&mut self) {
        self.by_name.clear();
        self.by_char.clear();
        for (id, glyph) in self.glyphs.iter().enumerate() {
            let id = id as GlyphId;
            self.by_name.entry(glyph.name.clone()).or_insert(id);
            if let Some(ch) = glyph.codepoint {
                self.by_char.entry(ch).or_insert(id);
            }
        }
    }

    /// Rebuild the lookup maps and check that every referenced glyph exists
    fn reindex(&mut self) -> MathResult<()> {
        if self.units_per_em == 0 {
            return Err(MathError::MathTable("units_per_em must be positive".into()));
        }
        if self.glyphs.is_empty() {
            return Err(MathError::MathTable("a math table needs at least a .notdef glyph".into()));
        }
        if self.glyphs.len() > usize::from(GlyphId::MAX) {
            return Err(MathError::MathTable(format!(
                "too many glyphs: {}",
                self.glyphs.len()
            )));
        }

        self.rebuild_maps();
        if self.by_name.len() != self.glyphs.len() {
            return Err(MathError::MathTable("duplicate glyph names".into()));
        }

        let unknown = |name: &str, section: &str| {
            MathError::MathTable(format!("unknown glyph {name} in {section}"))
        };
        for (section, variants) in [("v_variants", &self.v_variants), ("h_variants", &self.h_variants)] {
            for (base, names) in variants {
                for name in std::iter::once(base).chain(names) {
                    if !self.by_name.contains_key(name) {
                        return Err(unknown(name, section));
                    }
                }
            }
        }
        for (base, assembly) in &self.v_assembly {
            for name in std::iter::once(base).chain(assembly.parts.iter().map(|part| &part.glyph)) {
                if !self.by_name.contains_key(name) {
                    return Err(unknown(name, "v_assembly"));
                }
            }
        }
        Ok(())
    }

    fn info(&self, glyph: GlyphId) -> Option<&GlyphInfo> {
        self.glyphs.get(usize::from(glyph))
    }

    fn name_of(&self, glyph: GlyphId) -> &str {
        self.info(glyph).map_or("", |info| info.name.as_str())
    }

    fn variants(&self, glyph: GlyphId, table: &BTreeMap<String, Vec<String>>) -> Vec<GlyphId> {
        match table.get(self.name_of(glyph)) {
            Some(names) if !names.is_empty() => names
                .iter()
                .filter_map(|name| self.by_name.get(name).copied())
                .collect(),
            _ => vec![glyph],
        }
    }
}

impl FontMetrics for MathTable {
    fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    fn constant(&self, constant: MathConstant) -> f32 {
        self.constants.get(constant.name()).copied().unwrap_or(0.0)
    }

    fn glyph_for_char(&self, ch: char) -> Option<GlyphId> {
        self.by_char.get(&ch).copied()
    }

    fn glyph_name(&self, glyph: GlyphId) -> Option<&str> {
        self.info(glyph).map(|info| info.name.as_str())
    }

    fn glyph_with_name(&self, name: &str) -> Option<GlyphId> {
        self.by_name.get(name).copied()
    }

    fn vertical_variants(&self, glyph: GlyphId) -> Vec<GlyphId> {
        self.variants(glyph, &self.v_variants)
    }

    fn horizontal_variants(&self, glyph: GlyphId) -> Vec<GlyphId> {
        self.variants(glyph, &self.h_variants)
    }

    fn vertical_assembly(&self, glyph: GlyphId) -> Vec<GlyphPart> {
        let Some(assembly) = self.v_assembly.get(self.name_of(glyph)) else {
            return Vec::new();
        };
        assembly
            .parts
            .iter()
            .filter_map(|part| {
                Some(GlyphPart {
                    glyph: self.by_name.get(&part.glyph).copied()?,
                    full_advance: part.advance,
                    start_connector_length: part.start_connector,
                    end_connector_length: part.end_connector,
                    is_extender: part.extender,
                })
            })
            .collect()
    }

    fn italic_correction(&self, glyph: GlyphId) -> f32 {
        self.italic.get(self.name_of(glyph)).copied().unwrap_or(0.0)
    }

    fn top_accent_attachment(&self, glyph: GlyphId) -> f32 {
        self.accents
            .get(self.name_of(glyph))
            .copied()
            .unwrap_or_else(|| self.advance_width(glyph) / 2.0)
    }

    fn advance_width(&self, glyph: GlyphId) -> f32 {
        self.info(glyph).map_or(0.0, |info| info.advance)
    }

    fn bounding_box(&self, glyph: GlyphId) -> Rect {
        self.info(glyph).map_or_else(Rect::default, |info| {
            let [x_min, y_min, x_max, y_max] = info.bbox;
            Rect::new(x_min, y_min, x_max - x_min, y_max - y_min)
        })
    }
}

// =============================================================================
// Approximate table
// =============================================================================

const UNITS_PER_EM: u16 = 1000;

/// Latin Modern-like proportions, in em
const APPROXIMATE_CONSTANTS: &[(MathConstant, f32)] = &[
    (MathConstant::ScriptPercentScaleDown, 70.0),
    (MathConstant::ScriptScriptPercentScaleDown, 50.0),
    (MathConstant::DelimitedSubFormulaMinHeight, 1.3),
    (MathConstant::DisplayOperatorMinHeight, 1.3),
    (MathConstant::MathLeading, 0.154),
    (MathConstant::AxisHeight, 0.25),
    (MathConstant::AccentBaseHeight, 0.45),
    (MathConstant::FlattenedAccentBaseHeight, 0.664),
    (MathConstant::SubscriptShiftDown, 0.247),
    (MathConstant::SubscriptTopMax, 0.344),
    (MathConstant::SubscriptBaselineDropMin, 0.2),
    (MathConstant::SuperscriptShiftUp, 0.363),
    (MathConstant::SuperscriptShiftUpCramped, 0.289),
    (MathConstant::SuperscriptBottomMin, 0.108),
    (MathConstant::SuperscriptBaselineDropMax, 0.25),
    (MathConstant::SubSuperscriptGapMin, 0.16),
    (MathConstant::SuperscriptBottomMaxWithSubscript, 0.344),
    (MathConstant::SpaceAfterScript, 0.056),
    (MathConstant::UpperLimitGapMin, 0.2),
    (MathConstant::UpperLimitBaselineRiseMin, 0.111),
    (MathConstant::LowerLimitGapMin, 0.167),
    (MathConstant::LowerLimitBaselineDropMin, 0.6),
    (MathConstant::StackTopShiftUp, 0.444),
    (MathConstant::StackTopDisplayStyleShiftUp, 0.677),
    (MathConstant::StackBottomShiftDown, 0.345),
    (MathConstant::StackBottomDisplayStyleShiftDown, 0.686),
    (MathConstant::StackGapMin, 0.12),
    (MathConstant::StackDisplayStyleGapMin, 0.28),
    (MathConstant::StretchStackTopShiftUp, 0.3),
    (MathConstant::StretchStackBottomShiftDown, 0.6),
    (MathConstant::StretchStackGapAboveMin, 0.2),
    (MathConstant::StretchStackGapBelowMin, 0.1),
    (MathConstant::FractionNumeratorShiftUp, 0.394),
    (MathConstant::FractionNumeratorDisplayStyleShiftUp, 0.677),
    (MathConstant::FractionDenominatorShiftDown, 0.345),
    (MathConstant::FractionDenominatorDisplayStyleShiftDown, 0.686),
    (MathConstant::FractionNumeratorGapMin, 0.04),
    (MathConstant::FractionNumDisplayStyleGapMin, 0.12),
    (MathConstant::FractionRuleThickness, 0.04),
    (MathConstant::FractionDenominatorGapMin, 0.04),
    (MathConstant::FractionDenomDisplayStyleGapMin, 0.12),
    (MathConstant::SkewedFractionHorizontalGap, 0.35),
    (MathConstant::SkewedFractionVerticalGap, 0.096),
    (MathConstant::OverbarVerticalGap, 0.12),
    (MathConstant::OverbarRuleThickness, 0.04),
    (MathConstant::OverbarExtraAscender, 0.04),
    (MathConstant::UnderbarVerticalGap, 0.12),
    (MathConstant::UnderbarRuleThickness, 0.04),
    (MathConstant::UnderbarExtraDescender, 0.04),
    (MathConstant::RadicalVerticalGap, 0.05),
    (MathConstant::RadicalDisplayStyleVerticalGap, 0.148),
    (MathConstant::RadicalRuleThickness, 0.04),
    (MathConstant::RadicalExtraAscender, 0.04),
    (MathConstant::RadicalKernBeforeDegree, 0.278),
    (MathConstant::RadicalKernAfterDegree, -0.556),
    (MathConstant::RadicalDegreeBottomRaisePercent, 60.0),
    (MathConstant::MinConnectorOverlap, 0.02),
];

/// Characters that grow vertically, with the parts of their assembly:
/// (bottom, middle) where a middle piece splits the extender in two
const STRETCHY_DELIMITERS: &[(char, bool)] = &[
    ('(', false),
    (')', false),
    ('[', false),
    (']', false),
    ('{', true),
    ('}', true),
    ('|', false),
    ('/', false),
    ('\\', false),
    ('\u{2016}', false),
    ('\u{2191}', false),
    ('\u{2193}', false),
    ('\u{2195}', false),
    ('\u{21D1}', false),
    ('\u{21D3}', false),
    ('\u{21D5}', false),
    ('\u{2308}', false),
    ('\u{2309}', false),
    ('\u{230A}', false),
    ('\u{230B}', false),
    ('\u{2329}', false),
    ('\u{232A}', false),
    ('\u{27E8}', false),
    ('\u{27E9}', false),
    ('\u{27EE}', false),
    ('\u{27EF}', false),
];

const RADICAL: char = '\u{221A}';
const INTEGRALS: &[char] = &['\u{222B}', '\u{222C}', '\u{222D}', '\u{222E}'];
const WIDE_ACCENTS: &[char] = &['\u{0302}', '\u{0303}', '\u{030C}'];

/// Heights of the vertical size variants, in em
const VARIANT_HEIGHTS: [f32; 4] = [1.2, 1.8, 2.4, 3.0];

const ALL_FONT_STYLES: [FontStyle; 10] = [
    FontStyle::Default,
    FontStyle::Roman,
    FontStyle::Bold,
    FontStyle::Caligraphic,
    FontStyle::Typewriter,
    FontStyle::Italic,
    FontStyle::SansSerif,
    FontStyle::Fraktur,
    FontStyle::Blackboard,
    FontStyle::BoldItalic,
];

/// Advance and `[x_min, y_min, x_max, y_max]`, in em
#[derive(Debug, Clone, Copy)]
struct Shape {
    advance: f32,
    bbox: [f32; 4],
}

impl Shape {
    const fn new(advance: f32, bbox: [f32; 4]) -> Self {
        Self { advance, bbox }
    }
}

fn is_large_operator(ch: char) -> bool {
    matches!(
        ch,
        '\u{220F}' | '\u{2210}' | '\u{2211}' | '\u{22C0}'..='\u{22C3}' | '\u{2A00}'..='\u{2A06}'
    ) || INTEGRALS.contains(&ch)
}

fn is_combining_accent(ch: char) -> bool {
    matches!(ch, '\u{0300}'..='\u{036F}' | '\u{20D0}'..='\u{20FF}')
}

/// Rough shape of a character by class
fn shape_for_char(ch: char) -> Shape {
    const CAPITAL: Shape = Shape::new(0.72, [0.03, 0.0, 0.69, 0.683]);
    const LOWER: Shape = Shape::new(0.5, [0.03, 0.0, 0.48, 0.431]);
    const ASCENDER: Shape = Shape::new(0.52, [0.03, 0.0, 0.5, 0.694]);
    const DESCENDER: Shape = Shape::new(0.5, [0.03, -0.205, 0.48, 0.431]);
    const DIGIT: Shape = Shape::new(0.5, [0.05, -0.022, 0.45, 0.665]);
    const GREEK: Shape = Shape::new(0.55, [0.03, -0.194, 0.52, 0.694]);
    const OPERATOR: Shape = Shape::new(0.778, [0.056, -0.083, 0.722, 0.583]);
    const ARROW: Shape = Shape::new(1.0, [0.056, -0.011, 0.944, 0.511]);
    const DELIMITER: Shape = Shape::new(0.389, [0.1, -0.25, 0.33, 0.75]);
    const PUNCTUATION: Shape = Shape::new(0.278, [0.08, -0.194, 0.2, 0.106]);

    if ch == ' ' {
        return Shape::new(0.333, [0.0; 4]);
    }
    if is_combining_accent(ch) {
        return Shape::new(0.5, [0.1, 0.5, 0.4, 0.7]);
    }
    if ch == RADICAL {
        return Shape::new(0.833, [0.07, -0.96, 0.853, 0.04]);
    }
    if INTEGRALS.contains(&ch) {
        return Shape::new(0.417, [0.05, -0.36, 0.55, 0.86]);
    }
    if is_large_operator(ch) {
        return Shape::new(1.056, [0.056, -0.25, 1.0, 0.75]);
    }
    if STRETCHY_DELIMITERS.iter().any(|&(delimiter, _)| delimiter == ch) {
        return match ch {
            '/' | '\\' => Shape::new(0.5, [0.05, -0.25, 0.45, 0.75]),
            '\u{2191}'..='\u{21FF}' => Shape::new(0.5, [0.06, -0.2, 0.44, 0.7]),
            _ => DELIMITER,
        };
    }
    match ch {
        '0'..='9' => DIGIT,
        'A'..='Z' | '\u{0391}'..='\u{03A9}' | '\u{0410}'..='\u{042F}' => CAPITAL,
        'b' | 'd' | 'f' | 'h' | 'i' | 'k' | 'l' | 't' => ASCENDER,
        'g' | 'j' | 'p' | 'q' | 'y' => DESCENDER,
        'a'..='z' | '\u{0430}'..='\u{044F}' => LOWER,
        '\u{03B1}'..='\u{03FF}' | '\u{2202}' | '\u{2207}' => GREEK,
        ',' | ';' | '.' | ':' | '!' | '?' => PUNCTUATION,
        '\u{2190}'..='\u{21FF}' | '\u{27F5}'..='\u{27FF}' => ARROW,
        '+' | '-' | '=' | '<' | '>' | '*' | '\u{2200}'..='\u{22FF}' | '\u{2A00}'..='\u{2AFF}' => {
            OPERATOR
        }
        _ => Shape::new(0.5, [0.05, 0.0, 0.45, 0.7]),
    }
}

/// `uniXXXX` for the BMP, `uXXXXX` beyond
fn glyph_name_for_char(ch: char) -> String {
    let code = u32::from(ch);
    if code <= 0xFFFF {
        format!("uni{code:04X}")
    } else {
        format!("u{code:05X}")
    }
}

fn em(value: f32) -> f32 {
    (value * f32::from(UNITS_PER_EM)).round()
}

struct TableBuilder {
    table: MathTable,
    seen: BTreeSet<String>,
}

impl TableBuilder {
    fn new() -> Self {
        let table = MathTable {
            units_per_em: UNITS_PER_EM,
            constants: APPROXIMATE_CONSTANTS
                .iter()
                .map(|&(constant, value)| {
                    let value = if constant.is_percent() { value } else { em(value) };
                    (constant.name().to_string(), value)
                })
                .collect(),
            glyphs: Vec::new(),
            v_variants: BTreeMap::new(),
            h_variants: BTreeMap::new(),
            italic: BTreeMap::new(),
            accents: BTreeMap::new(),
            v_assembly: BTreeMap::new(),
            by_name: HashMap::new(),
            by_char: HashMap::new(),
        };
        let mut builder = Self {
            table,
            seen: BTreeSet::new(),
        };
        builder.glyph(".notdef".into(), None, Shape::new(0.5, [0.05, 0.0, 0.45, 0.7]));
        builder
    }

    fn glyph(&mut self, name: String, codepoint: Option<char>, shape: Shape) {
        if !self.seen.insert(name.clone()) {
            return;
        }
        self.table.glyphs.push(GlyphInfo {
            name,
            codepoint,
            advance: em(shape.advance),
            bbox: shape.bbox.map(em),
        });
    }

    fn char_glyph(&mut self, ch: char, shape: Shape) {
        self.glyph(glyph_name_for_char(ch), Some(ch), shape);
    }

    fn italic(&mut self, name: String, value: f32) {
        self.table.italic.insert(name, em(value));
    }

    fn vertical_variants(&mut self, ch: char, shapes: impl IntoIterator<Item = Shape>) {
        let base = glyph_name_for_char(ch);
        let mut names = vec![base.clone()];
        for (i, shape) in shapes.into_iter().enumerate() {
            let name = format!("{base}.v{}", i + 1);
            self.glyph(name.clone(), None, shape);
            names.push(name);
        }
        self.table.v_variants.insert(base, names);
    }

    /// A three-piece assembly, or five pieces with a middle when `middle`
    fn assembly(&mut self, ch: char, width: f32, middle: bool) {
        let base = glyph_name_for_char(ch);
        let piece = |suffix: &str| format!("{base}.{suffix}");
        let (end, connector) = if middle { (0.45, 0.15) } else { (0.6, 0.2) };

        let mut parts = Vec::new();
        let mut add = |builder: &mut Self, suffix: &str, advance: f32, start: f32, stop: f32, extender: bool| {
            let name = piece(suffix);
            builder.glyph(name.clone(), None, Shape::new(width, [0.05, 0.0, width - 0.05, advance]));
            parts.push(AssemblyPart {
                glyph: name,
                advance: em(advance),
                start_connector: em(start),
                end_connector: em(stop),
                extender,
            });
        };
        add(self, "bot", end, 0.0, connector, false);
        add(self, "ext", 0.5, connector, connector, true);
        if middle {
            add(self, "mid", 0.6, connector, connector, false);
            add(self, "ext", 0.5, connector, connector, true);
        }
        add(self, "top", end, connector, 0.0, false);

        self.table.v_assembly.insert(base, GlyphAssembly { italic: 0.0, parts });
    }

    fn build(mut self) -> MathTable {
        // Text characters: ASCII, Greek, Cyrillic and everything the
        // symbol table can produce
        let mut chars: BTreeSet<char> = (' '..='~').collect();
        chars.extend('\u{0391}'..='\u{03A9}');
        chars.extend('\u{03B1}'..='\u{03C9}');
        chars.extend(['\u{03D1}', '\u{03D5}', '\u{03D6}', '\u{03F1}', '\u{03F5}']);
        chars.extend('\u{0410}'..='\u{044F}');
        chars.extend(STRETCHY_DELIMITERS.iter().map(|&(ch, _)| ch));
        chars.extend(INTEGRALS);
        chars.insert(RADICAL);
        for ch in ' '..='~' {
            if let Some(atom) = symbols::atom_for_char(ch) {
                chars.extend(atom.nucleus.chars());
            }
        }
        for command in symbols::supported_commands() {
            if let Some(atom) = symbols::atom_for_command(&command) {
                chars.extend(atom.nucleus.chars());
            }
        }
        for name in symbols::accent_names() {
            if let Some(accent) = symbols::accent_for_command(name) {
                chars.extend(accent.nucleus.chars());
            }
        }
        chars.remove(&'\u{03A2}');

        for &ch in &chars {
            self.char_glyph(ch, shape_for_char(ch));
        }

        // Styled alphanumerics share the shape of their base character
        let bases: Vec<char> = ('A'..='Z')
            .chain('a'..='z')
            .chain('0'..='9')
            .chain('\u{0391}'..='\u{03A9}')
            .chain('\u{03B1}'..='\u{03C9}')
            .collect();
        for style in ALL_FONT_STYLES {
            for &base in &bases {
                let styled = unicode::style_char(base, style);
                if styled == base {
                    continue;
                }
                self.char_glyph(styled, shape_for_char(base));
                if matches!(style, FontStyle::Default | FontStyle::Italic | FontStyle::BoldItalic)
                    && base.is_alphabetic()
                {
                    let correction = match base {
                        'f' => 0.1,
                        _ if base.is_uppercase() => 0.05,
                        _ => 0.02,
                    };
                    self.italic(glyph_name_for_char(styled), correction);
                }
            }
        }

        for &(ch, middle) in STRETCHY_DELIMITERS {
            let shapes = VARIANT_HEIGHTS.iter().enumerate().map(|(i, &height)| {
                let width = 0.389 + 0.07 * (i + 1) as f32;
                Shape::new(width, [0.1, 0.25 - height / 2.0, width - 0.06, 0.25 + height / 2.0])
            });
            self.vertical_variants(ch, shapes);
            if matches!(ch, '(' | ')' | '[' | ']' | '{' | '}' | '|' | '\u{2016}' | '\u{2308}'..='\u{230B}') {
                self.assembly(ch, 0.875, middle);
            }
        }

        let shapes = VARIANT_HEIGHTS
            .iter()
            .map(|&height| Shape::new(1.0, [0.07, 0.04 - height, 1.0, 0.04]));
        self.vertical_variants(RADICAL, shapes);
        self.assembly(RADICAL, 1.056, false);

        for &ch in &chars {
            if !is_large_operator(ch) {
                continue;
            }
            let base = glyph_name_for_char(ch);
            if INTEGRALS.contains(&ch) {
                self.vertical_variants(ch, [Shape::new(0.556, [0.05, -0.86, 1.0, 1.36])]);
                self.italic(base.clone(), 0.2);
                self.italic(format!("{base}.v1"), 0.44);
            } else {
                self.vertical_variants(ch, [Shape::new(1.444, [0.056, -0.45, 1.388, 0.95])]);
            }
        }

        for &ch in WIDE_ACCENTS {
            let base = glyph_name_for_char(ch);
            let mut names = vec![base.clone()];
            for (i, width) in [0.6, 1.0, 1.4].into_iter().enumerate() {
                let name = format!("{base}.h{}", i + 1);
                self.glyph(name.clone(), None, Shape::new(width, [0.0, 0.5, width, 0.72]));
                names.push(name);
            }
            self.table.h_variants.insert(base, names);
        }

        self.table
    }
}

impl MathTable {
    /// A self-contained table with Latin Modern-like proportions
    pub fn approximate() -> Self {
        let mut table = TableBuilder::new().build();
        table.rebuild_maps();
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Arc<MathTable> {
        MathTable::shared_approximate()
    }

    #[test]
    fn test_constant_names() {
        assert_eq!(MathConstant::AxisHeight.name(), "AxisHeight");
        assert_eq!(
            MathConstant::from_name("FractionNumDisplayStyleGapMin"),
            Some(MathConstant::FractionNumDisplayStyleGapMin)
        );
        assert_eq!(MathConstant::from_name("Nope"), None);
    }

    #[test]
    fn test_notdef_is_first() {
        let table = table();
        assert_eq!(table.glyph_name(NOTDEF), Some(".notdef"));
        assert!(table.glyph_for_char('\u{E000}').is_none());
    }

    #[test]
    fn test_glyph_lookup() {
        let table = table();
        let a = table.glyph_for_char('a').unwrap();
        assert_eq!(table.glyph_name(a), Some("uni0061"));
        assert_eq!(table.glyph_with_name("uni0061"), Some(a));
        // math italic a
        assert!(table.glyph_for_char('\u{1D44E}').is_some());
        // minus sign produced by '-'
        assert!(table.glyph_for_char('\u{2212}').is_some());
    }

    #[test]
    fn test_variants_include_self() {
        let table = table();
        let x = table.glyph_for_char('x').unwrap();
        assert_eq!(table.vertical_variants(x), vec![x]);
        assert_eq!(table.horizontal_variants(x), vec![x]);
        assert_eq!(table.larger_glyph(x), x);

        let paren = table.glyph_for_char('(').unwrap();
        let variants = table.vertical_variants(paren);
        assert_eq!(variants.len(), 5);
        assert_eq!(variants[0], paren);
    }

    #[test]
    fn test_larger_glyph_of_sum() {
        let table = table();
        let sum = table.glyph_for_char('\u{2211}').unwrap();
        let larger = table.larger_glyph(sum);
        assert_ne!(larger, sum);
        assert!(table.bounding_box(larger).height() > table.bounding_box(sum).height());
    }

    #[test]
    fn test_assembly_parts() {
        let table = table();
        let paren = table.glyph_for_char('(').unwrap();
        let parts = table.vertical_assembly(paren);
        assert_eq!(parts.len(), 3);
        assert!(parts[1].is_extender);
        assert!(!parts[0].is_extender);

        let brace = table.glyph_for_char('{').unwrap();
        assert_eq!(table.vertical_assembly(brace).len(), 5);

        let x = table.glyph_for_char('x').unwrap();
        assert!(table.vertical_assembly(x).is_empty());
    }

    #[test]
    fn test_top_accent_defaults_to_half_advance() {
        let table = table();
        let x = table.glyph_for_char('x').unwrap();
        assert_eq!(table.top_accent_attachment(x), table.advance_width(x) / 2.0);
    }

    #[test]
    fn test_scaled_font() {
        let font = ScaledFont::approximate(20.0);
        assert_eq!(font.mu(), 20.0 / 18.0);
        assert!((font.axis_height() - 5.0).abs() < 1e-4);
        assert!((font.percent(MathConstant::ScriptPercentScaleDown) - 0.7).abs() < 1e-6);

        let bigger = font.with_size(40.0);
        assert!((bigger.axis_height() - 10.0).abs() < 1e-4);
        assert_eq!(font.size(), 20.0);
    }

    #[test]
    fn test_scaled_assembly_in_points() {
        let font = ScaledFont::approximate(10.0);
        let paren = font.glyph_for_char('(').unwrap();
        let parts = font.vertical_assembly(paren);
        assert!((parts[0].full_advance - 6.0).abs() < 1e-4);
    }

    #[test]
    fn test_json_round_trip() {
        let json = table().to_json().unwrap();
        let loaded = MathTable::from_json(&json).unwrap();
        assert_eq!(loaded.glyphs.len(), table().glyphs.len());
        let a = loaded.glyph_for_char('a').unwrap();
        assert_eq!(loaded.glyph_name(a), Some("uni0061"));
    }

    #[test]
    fn test_missing_constant_is_zero() {
        let json = r#"{
            "units_per_em": 1000,
            "glyphs": [{"name": ".notdef", "advance": 500, "bbox": [0, 0, 500, 700]}]
        }"#;
        let table = MathTable::from_json(json).unwrap();
        assert_eq!(table.constant(MathConstant::AxisHeight), 0.0);
    }

    #[test]
    fn test_unknown_variant_rejected() {
        let json = r#"{
            "units_per_em": 1000,
            "glyphs": [{"name": ".notdef", "advance": 500, "bbox": [0, 0, 500, 700]}],
            "v_variants": {".notdef": ["missing"]}
        }"#;
        let err = MathTable::from_json(json).unwrap_err();
        assert!(matches!(err, MathError::MathTable(_)));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_empty_table_rejected() {
        let err = MathTable::from_json(r#"{"units_per_em": 1000, "glyphs": []}"#).unwrap_err();
        assert!(matches!(err, MathError::MathTable(_)));
    }
}
