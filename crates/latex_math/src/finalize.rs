//! Finalization - TeX's atom reclassification rules
//!
//! A parsed list is finalized once before typesetting. Finalizing assigns
//! source ranges, turns binary operators without a left operand into unary
//! ones and fuses runs of digits into a single number atom.

use crate::model::{Atom, AtomKind, AtomType, MathList};

/// Whether a binary operator following `prev` has no left operand
fn is_not_binary_operator(prev: Option<&Atom>) -> bool {
    match prev {
        None => true,
        Some(prev) => matches!(
            prev.atom_type(),
            AtomType::BinaryOperator
                | AtomType::Relation
                | AtomType::Open
                | AtomType::Punctuation
                | AtomType::LargeOperator
        ),
    }
}

impl MathList {
    /// A finalized copy of this list. The list itself is left untouched.
    pub fn finalized(&self) -> MathList {
        let mut finalized: Vec<Atom> = Vec::with_capacity(self.atoms.len());

        for atom in &self.atoms {
            let mut atom = atom.finalized();

            if atom.index_range.is_none() {
                let start = finalized
                    .last()
                    .and_then(|prev| prev.index_range.as_ref())
                    .map_or(0, |range| range.end);
                atom.index_range = Some(start..start + 1);
            }

            match atom.atom_type() {
                AtomType::BinaryOperator => {
                    if is_not_binary_operator(finalized.last()) {
                        atom.kind = AtomKind::UnaryOperator;
                    }
                }
                AtomType::Relation | AtomType::Punctuation | AtomType::Close => {
                    if let Some(prev) = finalized.last_mut() {
                        if prev.atom_type() == AtomType::BinaryOperator {
                            prev.kind = AtomKind::UnaryOperator;
                        }
                    }
                }
                AtomType::Number => {
                    if let Some(prev) = finalized.last_mut() {
                        if prev.atom_type() == AtomType::Number && !prev.has_scripts() {
                            prev.fuse(atom);
                            continue;
                        }
                    }
                }
                _ => {}
            }

            finalized.push(atom);
        }

        if let Some(last) = finalized.last_mut() {
            if last.atom_type() == AtomType::BinaryOperator {
                last.kind = AtomKind::UnaryOperator;
            }
        }

        MathList { atoms: finalized }
    }
}

impl Atom {
    /// A copy of this atom with its scripts and sub-lists finalized
    pub fn finalized(&self) -> Atom {
        let mut atom = self.clone();
        if let Some(superscript) = atom.superscript_mut() {
            *superscript = superscript.finalized();
        }
        if let Some(subscript) = atom.subscript_mut() {
            *subscript = subscript.finalized();
        }

        match &mut atom.kind {
            AtomKind::Fraction(fraction) => {
                fraction.numerator = fraction.numerator.finalized();
                fraction.denominator = fraction.denominator.finalized();
            }
            AtomKind::Radical(radical) => {
                radical.radicand = radical.radicand.finalized();
                if let Some(degree) = radical.degree.as_mut() {
                    *degree = degree.finalized();
                }
            }
            AtomKind::Inner(inner) => {
                inner.inner_list = inner.inner_list.finalized();
            }
            AtomKind::Underline(inner)
            | AtomKind::Overline(inner)
            | AtomKind::Accent(inner)
            | AtomKind::Color { inner, .. }
            | AtomKind::ColorBox { inner, .. } => {
                *inner = inner.finalized();
            }
            AtomKind::Table(table) => {
                for cell in table.cells.iter_mut().flatten() {
                    *cell = cell.finalized();
                }
            }
            _ => {}
        }
        atom
    }
}

/// Finalize a list. Equivalent to [`MathList::finalized`].
pub fn finalize(list: &MathList) -> MathList {
    list.finalized()
}
