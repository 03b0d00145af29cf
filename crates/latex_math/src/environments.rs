//! Table environments
//!
//! Turns the grid of cells collected by the parser into a table atom with the
//! delimiters, alignments and spacing of its environment.

use crate::error::{ParseError, ParseErrorKind};
use crate::model::{Atom, ColumnAlignment, Inner, LineStyle, MathList, Table};
use crate::symbols;

/// Bracket pairs of the matrix family. All of them become a `matrix` table.
fn matrix_delimiters(env: &str) -> Option<Option<(&'static str, &'static str)>> {
    Some(match env {
        "matrix" => None,
        "pmatrix" => Some(("(", ")")),
        "bmatrix" => Some(("[", "]")),
        "Bmatrix" => Some(("{", "}")),
        "vmatrix" => Some(("vert", "vert")),
        "Vmatrix" => Some(("Vert", "Vert")),
        _ => return None,
    })
}

/// The bracket pair for a matrix environment name, if it is one
pub fn matrix_environment_delimiters(env: &str) -> Option<(&'static str, &'static str)> {
    matrix_delimiters(env).flatten()
}

fn column_count_error(env: &str, expected: usize) -> ParseError {
    let columns = if expected == 1 { "column" } else { "columns" };
    ParseError::new(
        ParseErrorKind::InvalidNumColumns,
        format!("{env} environment can only have {expected} {columns}"),
        0,
    )
}

fn require_columns(table: &Table, env: &str, expected: usize) -> Result<(), ParseError> {
    if table.num_columns() == expected {
        Ok(())
    } else {
        Err(column_count_error(env, expected))
    }
}

fn set_cells_style(table: &mut Table, style: LineStyle) {
    for cell in table.cells.iter_mut().flatten() {
        cell.insert_atom(Atom::style(style), 0);
    }
}

fn delimited(table: Table, left: &str, right: &str) -> Atom {
    let mut inner = Inner::new(MathList::from(vec![Atom::table(table)]));
    inner.set_left_boundary(symbols::boundary_atom(left));
    inner.set_right_boundary(symbols::boundary_atom(right));
    Atom::inner(inner)
}

/// Build the atom for `env` from rows of cells. `None` is the implicit table
/// created by `&` or `\\` outside any environment.
///
/// The returned error has offset 0; the parser stamps its own position.
pub fn table_with_environment(
    env: Option<&str>,
    rows: Vec<Vec<MathList>>,
) -> Result<Atom, ParseError> {
    let mut table = Table::new(env);
    for (i, row) in rows.into_iter().enumerate() {
        for (j, cell) in row.into_iter().enumerate() {
            table.set_cell(cell, i, j);
        }
    }

    let Some(env) = env else {
        table.inter_row_additional_spacing = 1.0;
        table.inter_column_spacing = 0.0;
        for column in 0..table.num_columns() {
            table.set_alignment(ColumnAlignment::Left, column);
        }
        return Ok(Atom::table(table));
    };

    if let Some(delimiters) = matrix_delimiters(env) {
        table.environment = Some("matrix".to_string());
        table.inter_row_additional_spacing = 0.0;
        table.inter_column_spacing = 18.0;
        for column in 0..table.num_columns() {
            table.set_alignment(ColumnAlignment::Center, column);
        }
        set_cells_style(&mut table, LineStyle::Text);
        return Ok(match delimiters {
            Some((left, right)) => delimited(table, left, right),
            None => Atom::table(table),
        });
    }

    match env {
        "eqalign" | "split" | "aligned" => {
            require_columns(&table, env, 2)?;
            // Spacer so that a leading relation in the second column gets
            // its spacing
            for row in &mut table.cells {
                if let Some(cell) = row.get_mut(1) {
                    cell.insert_atom(Atom::ordinary(""), 0);
                }
            }
            table.inter_row_additional_spacing = 1.0;
            table.inter_column_spacing = 0.0;
            table.set_alignment(ColumnAlignment::Right, 0);
            table.set_alignment(ColumnAlignment::Left, 1);
            Ok(Atom::table(table))
        }
        "displaylines" | "gather" => {
            require_columns(&table, env, 1)?;
            table.inter_row_additional_spacing = 1.0;
            table.inter_column_spacing = 0.0;
            table.set_alignment(ColumnAlignment::Center, 0);
            Ok(Atom::table(table))
        }
        "eqnarray" => {
            require_columns(&table, env, 3)?;
            table.inter_row_additional_spacing = 1.0;
            table.inter_column_spacing = 18.0;
            table.set_alignment(ColumnAlignment::Right, 0);
            table.set_alignment(ColumnAlignment::Center, 1);
            table.set_alignment(ColumnAlignment::Left, 2);
            Ok(Atom::table(table))
        }
        "cases" => {
            require_columns(&table, env, 2)?;
            table.inter_row_additional_spacing = 0.0;
            table.inter_column_spacing = 18.0;
            table.set_alignment(ColumnAlignment::Left, 0);
            table.set_alignment(ColumnAlignment::Left, 1);
            set_cells_style(&mut table, LineStyle::Text);

            let mut inner = Inner::new(MathList::from(vec![
                Atom::space(3.0),
                Atom::table(table),
            ]));
            inner.set_left_boundary(symbols::boundary_atom("{"));
            inner.set_right_boundary(symbols::boundary_atom("."));
            Ok(Atom::inner(inner))
        }
        _ => Err(ParseError::new(
            ParseErrorKind::InvalidEnv,
            format!("Unknown environment: {env}"),
            0,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AtomKind, AtomType};

    fn cell(text: &str) -> MathList {
        symbols::math_list_for_chars(text)
    }

    fn grid(rows: &[&[&str]]) -> Vec<Vec<MathList>> {
        rows.iter()
            .map(|row| row.iter().map(|text| cell(text)).collect())
            .collect()
    }

    #[test]
    fn test_default_table_left_aligned() {
        let atom = table_with_environment(None, grid(&[&["a", "b"]])).unwrap();
        let AtomKind::Table(table) = atom.kind else {
            panic!("expected table");
        };
        assert_eq!(table.environment, None);
        assert_eq!(table.alignments, vec![ColumnAlignment::Left; 2]);
        assert_eq!(table.inter_row_additional_spacing, 1.0);
    }

    #[test]
    fn test_pmatrix_wrapped_in_inner() {
        let atom = table_with_environment(Some("pmatrix"), grid(&[&["1", "2"], &["3", "4"]]))
            .unwrap();
        let AtomKind::Inner(inner) = &atom.kind else {
            panic!("expected inner");
        };
        assert_eq!(inner.left_boundary().unwrap().nucleus, "(");
        assert_eq!(inner.right_boundary().unwrap().nucleus, ")");
        let AtomKind::Table(table) = &inner.inner_list.atoms[0].kind else {
            panic!("expected table");
        };
        assert_eq!(table.environment.as_deref(), Some("matrix"));
        assert_eq!(table.inter_column_spacing, 18.0);
        assert_eq!(table.cells[1][0].atoms[0].atom_type(), AtomType::Style);
    }

    #[test]
    fn test_aligned_inserts_spacer() {
        let atom = table_with_environment(Some("aligned"), grid(&[&["x", "=1"]])).unwrap();
        let AtomKind::Table(table) = atom.kind else {
            panic!("expected table");
        };
        assert_eq!(table.cells[0][1].atoms[0].nucleus, "");
        assert_eq!(table.alignment(0), ColumnAlignment::Right);
        assert_eq!(table.alignment(1), ColumnAlignment::Left);
    }

    #[test]
    fn test_column_count_errors() {
        let err = table_with_environment(Some("cases"), grid(&[&["a"]])).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidNumColumns);
        assert_eq!(err.message, "cases environment can only have 2 columns");

        let err = table_with_environment(Some("gather"), grid(&[&["a", "b"]])).unwrap_err();
        assert_eq!(err.message, "gather environment can only have 1 column");
    }

    #[test]
    fn test_unknown_environment() {
        let err = table_with_environment(Some("foo"), grid(&[&["a"]])).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidEnv);
        assert_eq!(err.message, "Unknown environment: foo");
    }

    #[test]
    fn test_cases_has_open_brace_only() {
        let atom = table_with_environment(Some("cases"), grid(&[&["a", "b"]])).unwrap();
        let AtomKind::Inner(inner) = &atom.kind else {
            panic!("expected inner");
        };
        assert_eq!(inner.left_boundary().unwrap().nucleus, "{");
        assert_eq!(inner.right_boundary().unwrap().nucleus, "");
        assert_eq!(inner.inner_list.atoms[0].kind, AtomKind::Space { width: 3.0 });
    }
}
