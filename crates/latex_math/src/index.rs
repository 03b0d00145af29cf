//! Math list paths - address an atom anywhere in a nested math list
//!
//! A [`MathListIndex`] is a path from the top-level list down to one atom:
//! each level names an atom and, optionally, the branch of that atom the
//! path continues into. In `25^{2/4}` the `4` is at
//! `[1, superscript:[0, denominator:[0]]]`.

use std::fmt;
use std::ops::Range;

use crate::model::{Atom, AtomKind, MathList};

/// The branch of an atom a path descends into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubIndexType {
    /// The path ends at the atom
    None,
    /// A position inside the atom's nucleus
    Nucleus,
    Superscript,
    Subscript,
    Numerator,
    Denominator,
    Radicand,
    Degree,
    /// The inner list of `\left..\right` and single-list atoms
    Inner,
}

impl SubIndexType {
    fn name(self) -> &'static str {
        match self {
            SubIndexType::None => "none",
            SubIndexType::Nucleus => "nucleus",
            SubIndexType::Superscript => "superscript",
            SubIndexType::Subscript => "subscript",
            SubIndexType::Numerator => "numerator",
            SubIndexType::Denominator => "denominator",
            SubIndexType::Radicand => "radicand",
            SubIndexType::Degree => "degree",
            SubIndexType::Inner => "inner",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SubIndex {
    kind: SubIndexType,
    index: MathListIndex,
}

/// A path to an atom in a nested math list
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MathListIndex {
    atom_index: usize,
    sub: Option<Box<SubIndex>>,
}

impl MathListIndex {
    /// An index into the top-level list
    pub fn level0(index: usize) -> Self {
        Self {
            atom_index: index,
            sub: None,
        }
    }

    /// An index that continues into branch `kind` of the atom at `location`
    pub fn at_location(location: usize, sub_index: MathListIndex, kind: SubIndexType) -> Self {
        if kind == SubIndexType::None {
            return Self::level0(location);
        }
        Self {
            atom_index: location,
            sub: Some(Box::new(SubIndex {
                kind,
                index: sub_index,
            })),
        }
    }

    pub fn atom_index(&self) -> usize {
        self.atom_index
    }

    /// Type of the first branch, `None` for a level 0 index
    pub fn sub_index_type(&self) -> SubIndexType {
        self.sub.as_ref().map_or(SubIndexType::None, |sub| sub.kind)
    }

    pub fn sub_index(&self) -> Option<&MathListIndex> {
        self.sub.as_ref().map(|sub| &sub.index)
    }

    /// Number of branches on the path
    pub fn level(&self) -> usize {
        self.sub_index().map_or(0, |sub| 1 + sub.level())
    }

    /// Append `sub_index` to the end of this path
    pub fn level_up(&self, sub_index: MathListIndex, kind: SubIndexType) -> Self {
        match &self.sub {
            None => Self::at_location(self.atom_index, sub_index, kind),
            Some(sub) => Self::at_location(
                self.atom_index,
                sub.index.level_up(sub_index, kind),
                sub.kind,
            ),
        }
    }

    /// Remove the last level. `None` for a level 0 index.
    pub fn level_down(&self) -> Option<Self> {
        let sub = self.sub.as_ref()?;
        Some(match sub.index.level_down() {
            Some(down) => Self::at_location(self.atom_index, down, sub.kind),
            None => Self::level0(self.atom_index),
        })
    }

    /// The index one atom back at the final level, if any
    pub fn previous(&self) -> Option<Self> {
        match &self.sub {
            None => self.atom_index.checked_sub(1).map(Self::level0),
            Some(sub) => sub
                .index
                .previous()
                .map(|previous| Self::at_location(self.atom_index, previous, sub.kind)),
        }
    }

    /// The index one atom forward at the final level
    pub fn next(&self) -> Self {
        match &self.sub {
            None => Self::level0(self.atom_index + 1),
            Some(sub) if sub.kind == SubIndexType::Nucleus => {
                Self::at_location(self.atom_index + 1, sub.index.clone(), sub.kind)
            }
            Some(sub) => Self::at_location(self.atom_index, sub.index.next(), sub.kind),
        }
    }

    /// Whether any level of the path takes branch `kind`
    pub fn has_sub_index_of(&self, kind: SubIndexType) -> bool {
        match &self.sub {
            None => kind == SubIndexType::None,
            Some(sub) => sub.kind == kind || sub.index.has_sub_index_of(kind),
        }
    }

    pub fn is_at_beginning_of_line(&self) -> bool {
        self.final_index() == 0
    }

    /// Whether both paths take the same branches through the same atoms,
    /// differing at most in the final index
    pub fn is_at_same_level_with(&self, other: &MathListIndex) -> bool {
        match (&self.sub, &other.sub) {
            (None, None) => true,
            (Some(mine), Some(theirs)) => {
                mine.kind == theirs.kind
                    && self.atom_index == other.atom_index
                    && mine.index.is_at_same_level_with(&theirs.index)
            }
            _ => false,
        }
    }

    /// The atom index at the last level
    pub fn final_index(&self) -> usize {
        match &self.sub {
            None => self.atom_index,
            Some(sub) => sub.index.final_index(),
        }
    }

    /// The branch taken into the last level
    pub fn final_sub_index_type(&self) -> SubIndexType {
        match &self.sub {
            None => SubIndexType::None,
            Some(sub) if sub.index.sub.is_some() => sub.index.final_sub_index_type(),
            Some(sub) => sub.kind,
        }
    }
}

impl fmt::Display for MathListIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sub {
            None => write!(f, "[{}]", self.atom_index),
            Some(sub) => write!(f, "[{}, {}:{}]", self.atom_index, sub.kind.name(), sub.index),
        }
    }
}

// =============================================================================
// Ranges
// =============================================================================

/// A run of atoms starting at a path, all at the path's final level
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MathListRange {
    pub start: MathListIndex,
    pub length: usize,
}

impl MathListRange {
    pub fn new(start: MathListIndex, length: usize) -> Self {
        Self { start, length }
    }

    /// A range of one atom
    pub fn single(start: MathListIndex) -> Self {
        Self::new(start, 1)
    }

    /// A top-level range covering `range`
    pub fn from_range(range: Range<usize>) -> Self {
        Self::new(MathListIndex::level0(range.start), range.len())
    }

    /// The same range with the first level of the path removed
    pub fn sub_index_range(&self) -> Option<Self> {
        self.start
            .sub_index()
            .map(|sub| Self::new(sub.clone(), self.length))
    }

    /// The range at the final level
    pub fn final_range(&self) -> Range<usize> {
        let start = self.start.final_index();
        start..start + self.length
    }

    /// The smallest range covering both. `None` when the ranges are not at
    /// the same level.
    pub fn union(&self, other: &MathListRange) -> Option<Self> {
        if !self.start.is_at_same_level_with(&other.start) {
            return None;
        }
        let mine = self.final_range();
        let theirs = other.final_range();
        let start = if mine.start <= theirs.start {
            self.start.clone()
        } else {
            other.start.clone()
        };
        let length = mine.end.max(theirs.end) - mine.start.min(theirs.start);
        Some(Self::new(start, length))
    }

    /// Union of all `ranges`. `None` when empty or not all at one level.
    pub fn union_ranges(ranges: &[MathListRange]) -> Option<Self> {
        let (first, rest) = ranges.split_first()?;
        rest.iter()
            .try_fold(first.clone(), |unioned, next| unioned.union(next))
    }
}

impl fmt::Display for MathListRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.start, self.length)
    }
}

// =============================================================================
// Lookup
// =============================================================================

fn branch(atom: &Atom, kind: SubIndexType) -> Option<&MathList> {
    match (kind, &atom.kind) {
        (SubIndexType::Superscript, _) => atom.superscript(),
        (SubIndexType::Subscript, _) => atom.subscript(),
        (SubIndexType::Numerator, AtomKind::Fraction(fraction)) => Some(&fraction.numerator),
        (SubIndexType::Denominator, AtomKind::Fraction(fraction)) => Some(&fraction.denominator),
        (SubIndexType::Radicand, AtomKind::Radical(radical)) => Some(&radical.radicand),
        (SubIndexType::Degree, AtomKind::Radical(radical)) => radical.degree.as_ref(),
        (SubIndexType::Inner, AtomKind::Inner(inner)) => Some(&inner.inner_list),
        (
            SubIndexType::Inner,
            AtomKind::Underline(inner)
            | AtomKind::Overline(inner)
            | AtomKind::Accent(inner)
            | AtomKind::Color { inner, .. }
            | AtomKind::ColorBox { inner, .. },
        ) => Some(inner),
        _ => None,
    }
}

impl MathList {
    /// The atom a path points at. A nucleus path resolves to the atom that
    /// owns the nucleus.
    pub fn atom_at(&self, index: &MathListIndex) -> Option<&Atom> {
        let atom = self.atoms.get(index.atom_index)?;
        match &index.sub {
            None => Some(atom),
            Some(sub) if sub.kind == SubIndexType::Nucleus => Some(atom),
            Some(sub) => branch(atom, sub.kind)?.atom_at(&sub.index),
        }
    }
}
