//! LaTeX Math - parse and typeset LaTeX mathematics
//!
//! This crate turns a LaTeX math string into positioned glyphs:
//! - A math list model of atoms, scripts, fractions, radicals and tables
//! - A LaTeX parser and a serializer back to LaTeX
//! - Finalization (atom-type fixups, number fusing, source ranges)
//! - A typesetter following the TeX math layout rules, driven by
//!   OpenType MATH metrics
//! - A display tree with a canvas abstraction and a recording renderer
//! - Path addressing into nested lists and a label layout helper

pub mod display;
pub mod environments;
pub mod error;
pub mod finalize;
pub mod font;
pub mod index;
pub mod label;
pub mod model;
pub mod parser;
pub mod render;
pub mod serialize;
pub mod symbols;
pub mod typesetter;
pub mod unicode;

pub use display::{Display, DisplayKind, LinePosition, Point, Rect, Size, TextRun};
pub use error::*;
pub use finalize::finalize;
pub use font::{FontMetrics, GlyphId, GlyphPart, MathConstant, MathTable, ScaledFont};
pub use index::{MathListIndex, MathListRange, SubIndexType};
pub use label::{EdgeInsets, LabelConfig, LabelMode, MathLabel, TextAlignment};
pub use model::{
    Atom, AtomKind, AtomType, ColumnAlignment, FontStyle, Fraction, Inner, LineStyle, MathList,
    Radical, Table,
};
pub use parser::parse;
pub use render::{Canvas, Color, RenderOutput, RenderPrimitive, Renderer};
pub use serialize::to_latex;
pub use typesetter::typeset;
