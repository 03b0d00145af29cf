//! Math Model - atoms and math lists
//!
//! A parsed expression is a [`MathList`]: an ordered sequence of [`Atom`]s.
//! Compound atoms (fractions, radicals, `\left..\right` groups, tables, ...)
//! carry their sub-lists inside their [`AtomKind`] payload and own them
//! exclusively.

use serde::{Deserialize, Serialize};
use std::ops::Range;

// =============================================================================
// Styles
// =============================================================================

/// Font style applied to letters and digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontStyle {
    /// Italic letters and lowercase Greek, roman digits and capital Greek
    #[default]
    Default,
    Roman,
    Bold,
    Caligraphic,
    Typewriter,
    Italic,
    SansSerif,
    Fraktur,
    Blackboard,
    BoldItalic,
}

/// TeX line style. Ordered from largest to smallest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    #[default]
    Display,
    Text,
    Script,
    ScriptScript,
}

impl LineStyle {
    /// Style used for sub/superscripts and limits
    pub fn script_style(self) -> Self {
        match self {
            LineStyle::Display | LineStyle::Text => LineStyle::Script,
            LineStyle::Script | LineStyle::ScriptScript => LineStyle::ScriptScript,
        }
    }

    /// Style used for numerators and denominators (one level down, saturating)
    pub fn fraction_style(self) -> Self {
        match self {
            LineStyle::Display => LineStyle::Text,
            LineStyle::Text => LineStyle::Script,
            LineStyle::Script | LineStyle::ScriptScript => LineStyle::ScriptScript,
        }
    }
}

/// Horizontal alignment of a table column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnAlignment {
    Left,
    #[default]
    Center,
    Right,
}

// =============================================================================
// Atom kinds
// =============================================================================

/// The classification of an atom without its payload.
///
/// The order matters: every type before `Boundary` may carry scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AtomType {
    Ordinary,
    Number,
    Variable,
    LargeOperator,
    BinaryOperator,
    UnaryOperator,
    Relation,
    Open,
    Close,
    Fraction,
    Radical,
    Punctuation,
    Placeholder,
    Inner,
    Underline,
    Overline,
    Accent,
    Boundary,
    Space,
    Style,
    Color,
    ColorBox,
    Table,
}

impl AtomType {
    /// Whether atoms of this type may have a superscript or subscript
    pub fn allows_scripts(self) -> bool {
        self < AtomType::Boundary
    }
}

/// A fraction, `\binom`, `\atop` and friends
#[derive(Debug, Clone, PartialEq)]
pub struct Fraction {
    pub numerator: MathList,
    pub denominator: MathList,
    pub has_rule: bool,
    pub left_delimiter: Option<String>,
    pub right_delimiter: Option<String>,
}

/// A square root or n-th root
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Radical {
    pub radicand: MathList,
    pub degree: Option<MathList>,
}

/// A `\left..\right` group. Boundaries are always `AtomKind::Boundary` atoms.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Inner {
    pub inner_list: MathList,
    left_boundary: Option<Atom>,
    right_boundary: Option<Atom>,
}

impl Inner {
    pub fn new(inner_list: MathList) -> Self {
        Self {
            inner_list,
            left_boundary: None,
            right_boundary: None,
        }
    }

    pub fn left_boundary(&self) -> Option<&Atom> {
        self.left_boundary.as_ref()
    }

    pub fn right_boundary(&self) -> Option<&Atom> {
        self.right_boundary.as_ref()
    }

    /// Panics if the atom is not a boundary.
    pub fn set_left_boundary(&mut self, boundary: Option<Atom>) {
        assert_boundary(boundary.as_ref());
        self.left_boundary = boundary;
    }

    /// Panics if the atom is not a boundary.
    pub fn set_right_boundary(&mut self, boundary: Option<Atom>) {
        assert_boundary(boundary.as_ref());
        self.right_boundary = boundary;
    }
}

fn assert_boundary(atom: Option<&Atom>) {
    if let Some(atom) = atom {
        assert!(
            atom.atom_type() == AtomType::Boundary,
            "inner boundaries must be boundary atoms, got {:?}",
            atom.atom_type()
        );
    }
}

/// A grid of math lists laid out in rows and columns
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub cells: Vec<Vec<MathList>>,
    pub alignments: Vec<ColumnAlignment>,
    pub environment: Option<String>,
    /// In mu
    pub inter_column_spacing: f32,
    /// In jots
    pub inter_row_additional_spacing: f32,
}

impl Table {
    pub fn new(environment: Option<&str>) -> Self {
        Self {
            environment: environment.map(str::to_string),
            ..Self::default()
        }
    }

    /// Store a cell, growing the grid with empty lists as needed.
    pub fn set_cell(&mut self, list: MathList, row: usize, column: usize) {
        if self.cells.len() <= row {
            self.cells.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.cells[row];
        if cells.len() <= column {
            cells.resize_with(column + 1, MathList::new);
        }
        cells[column] = list;
    }

    pub fn set_alignment(&mut self, alignment: ColumnAlignment, column: usize) {
        if self.alignments.len() <= column {
            self.alignments.resize(column + 1, ColumnAlignment::Center);
        }
        self.alignments[column] = alignment;
    }

    pub fn alignment(&self, column: usize) -> ColumnAlignment {
        self.alignments.get(column).copied().unwrap_or_default()
    }

    pub fn num_rows(&self) -> usize {
        self.cells.len()
    }

    pub fn num_columns(&self) -> usize {
        self.cells.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// An atom's kind together with its kind-specific state
#[derive(Debug, Clone, PartialEq)]
pub enum AtomKind {
    Ordinary,
    Number,
    Variable,
    LargeOperator {
        limits: bool,
    },
    BinaryOperator,
    UnaryOperator,
    Relation,
    Open,
    Close,
    Fraction(Box<Fraction>),
    Radical(Box<Radical>),
    Punctuation,
    Placeholder,
    Inner(Box<Inner>),
    Underline(MathList),
    Overline(MathList),
    /// The accent character lives in the atom's nucleus
    Accent(MathList),
    Boundary,
    Space {
        /// In mu
        width: f32,
    },
    Style(LineStyle),
    Color {
        color: String,
        inner: MathList,
    },
    ColorBox {
        color: String,
        inner: MathList,
    },
    Table(Box<Table>),
}

impl AtomKind {
    pub fn atom_type(&self) -> AtomType {
        match self {
            AtomKind::Ordinary => AtomType::Ordinary,
            AtomKind::Number => AtomType::Number,
            AtomKind::Variable => AtomType::Variable,
            AtomKind::LargeOperator { .. } => AtomType::LargeOperator,
            AtomKind::BinaryOperator => AtomType::BinaryOperator,
            AtomKind::UnaryOperator => AtomType::UnaryOperator,
            AtomKind::Relation => AtomType::Relation,
            AtomKind::Open => AtomType::Open,
            AtomKind::Close => AtomType::Close,
            AtomKind::Fraction(_) => AtomType::Fraction,
            AtomKind::Radical(_) => AtomType::Radical,
            AtomKind::Punctuation => AtomType::Punctuation,
            AtomKind::Placeholder => AtomType::Placeholder,
            AtomKind::Inner(_) => AtomType::Inner,
            AtomKind::Underline(_) => AtomType::Underline,
            AtomKind::Overline(_) => AtomType::Overline,
            AtomKind::Accent(_) => AtomType::Accent,
            AtomKind::Boundary => AtomType::Boundary,
            AtomKind::Space { .. } => AtomType::Space,
            AtomKind::Style(_) => AtomType::Style,
            AtomKind::Color { .. } => AtomType::Color,
            AtomKind::ColorBox { .. } => AtomType::ColorBox,
            AtomKind::Table(_) => AtomType::Table,
        }
    }

    /// Payload-free kinds that may be converted into one another by the
    /// finalizer and the typesetter.
    pub fn from_simple_type(atom_type: AtomType) -> Option<Self> {
        Some(match atom_type {
            AtomType::Ordinary => AtomKind::Ordinary,
            AtomType::Number => AtomKind::Number,
            AtomType::Variable => AtomKind::Variable,
            AtomType::BinaryOperator => AtomKind::BinaryOperator,
            AtomType::UnaryOperator => AtomKind::UnaryOperator,
            AtomType::Relation => AtomKind::Relation,
            AtomType::Open => AtomKind::Open,
            AtomType::Close => AtomKind::Close,
            AtomType::Punctuation => AtomKind::Punctuation,
            AtomType::Placeholder => AtomKind::Placeholder,
            AtomType::Boundary => AtomKind::Boundary,
            _ => return None,
        })
    }
}

// =============================================================================
// Atom
// =============================================================================

/// The smallest unit of a math expression
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub kind: AtomKind,
    pub nucleus: String,
    superscript: Option<MathList>,
    subscript: Option<MathList>,
    pub font_style: FontStyle,
    /// Range of the atom in the finalized list, `None` until assigned
    pub index_range: Option<Range<usize>>,
    /// Atoms merged into this one, in order
    pub fused_atoms: Vec<Atom>,
}

impl Atom {
    pub fn new(kind: AtomKind, nucleus: impl Into<String>) -> Self {
        Self {
            kind,
            nucleus: nucleus.into(),
            superscript: None,
            subscript: None,
            font_style: FontStyle::Default,
            index_range: None,
            fused_atoms: Vec::new(),
        }
    }

    pub fn ordinary(nucleus: impl Into<String>) -> Self {
        Self::new(AtomKind::Ordinary, nucleus)
    }

    pub fn placeholder() -> Self {
        Self::new(AtomKind::Placeholder, "\u{25A1}")
    }

    pub fn boundary(delimiter: impl Into<String>) -> Self {
        Self::new(AtomKind::Boundary, delimiter)
    }

    pub fn fraction(numerator: MathList, denominator: MathList, has_rule: bool) -> Self {
        Self::new(
            AtomKind::Fraction(Box::new(Fraction {
                numerator,
                denominator,
                has_rule,
                left_delimiter: None,
                right_delimiter: None,
            })),
            "",
        )
    }

    pub fn radical(radicand: MathList, degree: Option<MathList>) -> Self {
        Self::new(
            AtomKind::Radical(Box::new(Radical { radicand, degree })),
            "",
        )
    }

    pub fn inner(inner: Inner) -> Self {
        Self::new(AtomKind::Inner(Box::new(inner)), "")
    }

    pub fn accent(accent: impl Into<String>, accentee: MathList) -> Self {
        Self::new(AtomKind::Accent(accentee), accent)
    }

    pub fn space(width: f32) -> Self {
        Self::new(AtomKind::Space { width }, "")
    }

    pub fn style(style: LineStyle) -> Self {
        Self::new(AtomKind::Style(style), "")
    }

    pub fn table(table: Table) -> Self {
        Self::new(AtomKind::Table(Box::new(table)), "")
    }

    pub fn atom_type(&self) -> AtomType {
        self.kind.atom_type()
    }

    pub fn superscript(&self) -> Option<&MathList> {
        self.superscript.as_ref()
    }

    pub fn subscript(&self) -> Option<&MathList> {
        self.subscript.as_ref()
    }

    pub fn superscript_mut(&mut self) -> Option<&mut MathList> {
        self.superscript.as_mut()
    }

    pub fn subscript_mut(&mut self) -> Option<&mut MathList> {
        self.subscript.as_mut()
    }

    pub fn has_scripts(&self) -> bool {
        self.superscript.is_some() || self.subscript.is_some()
    }

    /// Panics if this kind of atom cannot carry scripts.
    pub fn set_superscript(&mut self, superscript: Option<MathList>) {
        if superscript.is_some() {
            assert!(
                self.atom_type().allows_scripts(),
                "superscripts not allowed for {:?}",
                self.atom_type()
            );
        }
        self.superscript = superscript;
    }

    /// Panics if this kind of atom cannot carry scripts.
    pub fn set_subscript(&mut self, subscript: Option<MathList>) {
        if subscript.is_some() {
            assert!(
                self.atom_type().allows_scripts(),
                "subscripts not allowed for {:?}",
                self.atom_type()
            );
        }
        self.subscript = subscript;
    }

    pub fn take_superscript(&mut self) -> Option<MathList> {
        self.superscript.take()
    }

    pub fn take_subscript(&mut self) -> Option<MathList> {
        self.subscript.take()
    }

    /// Append `other` to this atom. Both must be of the same kind and this
    /// atom must not have scripts; the scripts of `other` are carried over.
    pub fn fuse(&mut self, other: Atom) {
        assert!(
            !self.has_scripts(),
            "cannot fuse into an atom that has scripts"
        );
        assert_eq!(
            self.atom_type(),
            other.atom_type(),
            "only atoms of the same type can be fused"
        );

        if self.fused_atoms.is_empty() {
            let mut original = self.clone();
            original.fused_atoms.clear();
            self.fused_atoms.push(original);
        }

        self.nucleus.push_str(&other.nucleus);
        if let (Some(range), Some(other_range)) = (&mut self.index_range, &other.index_range) {
            range.end += other_range.len();
        }
        self.superscript = other.superscript.clone();
        self.subscript = other.subscript.clone();

        if other.fused_atoms.is_empty() {
            self.fused_atoms.push(other);
        } else {
            self.fused_atoms.extend(other.fused_atoms);
        }
    }
}

// =============================================================================
// Math List
// =============================================================================

/// An ordered sequence of atoms
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MathList {
    pub atoms: Vec<Atom>,
}

fn assert_member(atom: &Atom) {
    assert!(
        atom.atom_type() != AtomType::Boundary,
        "boundary atoms cannot be added to a math list"
    );
}

impl MathList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_atoms(atoms: Vec<Atom>) -> Self {
        atoms.iter().for_each(assert_member);
        Self { atoms }
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn last(&self) -> Option<&Atom> {
        self.atoms.last()
    }

    pub fn last_mut(&mut self) -> Option<&mut Atom> {
        self.atoms.last_mut()
    }

    /// Panics if the atom is a boundary.
    pub fn add_atom(&mut self, atom: Atom) {
        assert_member(&atom);
        self.atoms.push(atom);
    }

    /// Panics if the atom is a boundary or `index > len`.
    pub fn insert_atom(&mut self, atom: Atom, index: usize) {
        assert_member(&atom);
        self.atoms.insert(index, atom);
    }

    pub fn append(&mut self, other: MathList) {
        self.atoms.extend(other.atoms);
    }

    pub fn remove_last_atom(&mut self) -> Option<Atom> {
        self.atoms.pop()
    }

    /// Panics if `index` is out of bounds.
    pub fn remove_atom_at(&mut self, index: usize) -> Atom {
        self.atoms.remove(index)
    }

    /// Panics if the range is out of bounds.
    pub fn remove_atoms_in_range(&mut self, range: Range<usize>) {
        self.atoms.drain(range);
    }
}

impl From<Vec<Atom>> for MathList {
    fn from(atoms: Vec<Atom>) -> Self {
        Self::from_atoms(atoms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_style_levels() {
        assert_eq!(LineStyle::Display.script_style(), LineStyle::Script);
        assert_eq!(LineStyle::Script.script_style(), LineStyle::ScriptScript);
        assert_eq!(LineStyle::Display.fraction_style(), LineStyle::Text);
        assert_eq!(
            LineStyle::ScriptScript.fraction_style(),
            LineStyle::ScriptScript
        );
        assert!(LineStyle::Text < LineStyle::Script);
    }

    #[test]
    fn test_scripts_allowed() {
        assert!(AtomType::Accent.allows_scripts());
        assert!(AtomType::Inner.allows_scripts());
        assert!(!AtomType::Boundary.allows_scripts());
        assert!(!AtomType::Table.allows_scripts());
    }

    #[test]
    fn test_set_scripts() {
        let mut atom = Atom::ordinary("x");
        atom.set_superscript(Some(MathList::from(vec![Atom::ordinary("2")])));
        assert!(atom.has_scripts());
        assert_eq!(atom.superscript().unwrap().atoms[0].nucleus, "2");
        assert!(atom.take_superscript().is_some());
        assert!(!atom.has_scripts());
    }

    #[test]
    #[should_panic(expected = "superscripts not allowed")]
    fn test_superscript_on_space_panics() {
        let mut atom = Atom::space(3.0);
        atom.set_superscript(Some(MathList::new()));
    }

    #[test]
    #[should_panic(expected = "boundary atoms")]
    fn test_boundary_in_list_panics() {
        let mut list = MathList::new();
        list.add_atom(Atom::boundary("("));
    }

    #[test]
    #[should_panic(expected = "inner boundaries")]
    fn test_non_boundary_on_inner_panics() {
        let mut inner = Inner::default();
        inner.set_left_boundary(Some(Atom::ordinary("(")));
    }

    #[test]
    fn test_fuse() {
        let mut first = Atom::new(AtomKind::Number, "1");
        first.index_range = Some(0..1);
        let mut second = Atom::new(AtomKind::Number, "2");
        second.index_range = Some(1..2);
        second.set_subscript(Some(MathList::from(vec![Atom::ordinary("i")])));

        first.fuse(second);
        assert_eq!(first.nucleus, "12");
        assert_eq!(first.index_range, Some(0..2));
        assert_eq!(first.fused_atoms.len(), 2);
        assert!(first.subscript().is_some());
    }

    #[test]
    #[should_panic(expected = "same type")]
    fn test_fuse_different_types_panics() {
        let mut first = Atom::new(AtomKind::Number, "1");
        first.fuse(Atom::ordinary("x"));
    }

    #[test]
    fn test_table_grows() {
        let mut table = Table::new(Some("matrix"));
        table.set_cell(MathList::from(vec![Atom::ordinary("a")]), 1, 2);
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.num_columns(), 3);
        assert!(table.cells[0].is_empty());
        assert_eq!(table.alignment(5), ColumnAlignment::Center);
        table.set_alignment(ColumnAlignment::Left, 1);
        assert_eq!(table.alignments, vec![ColumnAlignment::Center, ColumnAlignment::Left]);
    }

    #[test]
    fn test_list_editing() {
        let mut list = MathList::from(vec![Atom::ordinary("a"), Atom::ordinary("b")]);
        list.insert_atom(Atom::ordinary("c"), 1);
        assert_eq!(list.atoms[1].nucleus, "c");
        list.remove_atoms_in_range(0..2);
        assert_eq!(list.len(), 1);
        assert_eq!(list.remove_last_atom().map(|a| a.nucleus), Some("b".to_string()));
        assert!(list.is_empty());
    }
}
