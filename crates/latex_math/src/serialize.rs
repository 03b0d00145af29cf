//! LaTeX serialization - the inverse of the parser
//!
//! Best effort: the output parses back to an equivalent list, but is not
//! guaranteed to match the original spelling.

use crate::model::{Atom, AtomKind, FontStyle, Fraction, Inner, LineStyle, MathList, Table};
use crate::symbols;
use std::fmt;

/// Serialize a math list to LaTeX
pub fn to_latex(list: &MathList) -> String {
    let mut out = String::new();
    write_list(&mut out, list);
    out
}

impl fmt::Display for MathList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_latex(self))
    }
}

fn space_command(width: f32) -> Option<&'static str> {
    const SPACES: [(f32, &str); 6] = [
        (3.0, ","),
        (4.0, ">"),
        (5.0, ";"),
        (-3.0, "!"),
        (18.0, "quad"),
        (36.0, "qquad"),
    ];
    SPACES
        .iter()
        .find(|(mu, _)| *mu == width)
        .map(|(_, command)| *command)
}

fn style_command(style: LineStyle) -> &'static str {
    match style {
        LineStyle::Display => "displaystyle",
        LineStyle::Text => "textstyle",
        LineStyle::Script => "scriptstyle",
        LineStyle::ScriptScript => "scriptscriptstyle",
    }
}

fn delimiter_to_string(boundary: &Atom) -> String {
    match symbols::delimiter_name(boundary) {
        Some(name @ ("(" | ")" | "[" | "]" | "<" | ">" | "|" | "." | "/")) => name.to_string(),
        Some("||") => "\\|".to_string(),
        Some(name) => format!("\\{name}"),
        None => String::new(),
    }
}

fn write_list(out: &mut String, list: &MathList) {
    let mut current_style = FontStyle::Default;

    for atom in &list.atoms {
        if current_style != atom.font_style {
            if current_style != FontStyle::Default {
                out.push('}');
            }
            if atom.font_style != FontStyle::Default {
                out.push('\\');
                out.push_str(symbols::font_style_name(atom.font_style));
                out.push('{');
            }
            current_style = atom.font_style;
        }

        write_atom(out, atom);

        if let Some(superscript) = atom.superscript() {
            out.push_str(&format!("^{{{}}}", to_latex(superscript)));
        }
        if let Some(subscript) = atom.subscript() {
            out.push_str(&format!("_{{{}}}", to_latex(subscript)));
        }
    }

    if current_style != FontStyle::Default {
        out.push('}');
    }
}

fn write_atom(out: &mut String, atom: &Atom) {
    match &atom.kind {
        AtomKind::Fraction(fraction) => write_fraction(out, fraction),
        AtomKind::Radical(radical) => {
            out.push_str("\\sqrt");
            if let Some(degree) = &radical.degree {
                out.push_str(&format!("[{}]", to_latex(degree)));
            }
            out.push_str(&format!("{{{}}}", to_latex(&radical.radicand)));
        }
        AtomKind::Inner(inner) => write_inner(out, inner),
        AtomKind::Table(table) => write_table(out, table, table.environment.as_deref()),
        AtomKind::Overline(inner) => out.push_str(&format!("\\overline{{{}}}", to_latex(inner))),
        AtomKind::Underline(inner) => {
            out.push_str(&format!("\\underline{{{}}}", to_latex(inner)))
        }
        AtomKind::Accent(inner) => {
            let name = symbols::accent_name(atom).unwrap_or("hat");
            out.push_str(&format!("\\{name}{{{}}}", to_latex(inner)));
        }
        AtomKind::Color { color, inner } => {
            out.push_str(&format!("\\color{{{color}}}{{{}}}", to_latex(inner)))
        }
        AtomKind::ColorBox { color, inner } => {
            out.push_str(&format!("\\colorbox{{{color}}}{{{}}}", to_latex(inner)))
        }
        AtomKind::LargeOperator { limits } => {
            let Some(command) = symbols::command_for_atom(atom) else {
                out.push_str(&atom.nucleus);
                return;
            };
            out.push_str(&format!("\\{command} "));
            let template = symbols::atom_for_command(&command);
            if let Some(AtomKind::LargeOperator { limits: default }) = template.map(|t| t.kind) {
                if default != *limits {
                    out.push_str(if *limits { "\\limits " } else { "\\nolimits " });
                }
            }
        }
        AtomKind::Space { width } => match space_command(*width) {
            Some(command) => out.push_str(&format!("\\{command} ")),
            None => out.push_str(&format!("\\mkern{width:.1}mu")),
        },
        AtomKind::Style(style) => out.push_str(&format!("\\{} ", style_command(*style))),
        _ if atom.nucleus.is_empty() => out.push_str("{}"),
        _ if atom.nucleus == "\u{2236}" => out.push(':'),
        _ if atom.nucleus == "\u{2212}" => out.push('-'),
        _ => match symbols::command_for_atom(atom) {
            Some(command) => out.push_str(&format!("\\{command} ")),
            None => out.push_str(&atom.nucleus),
        },
    }
}

fn write_fraction(out: &mut String, fraction: &Fraction) {
    let numerator = to_latex(&fraction.numerator);
    let denominator = to_latex(&fraction.denominator);
    if fraction.has_rule {
        out.push_str(&format!("\\frac{{{numerator}}}{{{denominator}}}"));
        return;
    }

    let command = match (
        fraction.left_delimiter.as_deref(),
        fraction.right_delimiter.as_deref(),
    ) {
        (None, None) => "atop".to_string(),
        (Some("("), Some(")")) => "choose".to_string(),
        (Some("{"), Some("}")) => "brace".to_string(),
        (Some("["), Some("]")) => "brack".to_string(),
        (left, right) => {
            let delimiter = |value: Option<&str>| {
                delimiter_to_string(&Atom::boundary(value.unwrap_or_default()))
            };
            format!("atopwithdelims{}{}", delimiter(left), delimiter(right))
        }
    };
    out.push_str(&format!("{{{numerator} \\{command} {denominator}}}"));
}

/// The matrix or cases environment an inner atom was built from, if any
fn environment_of(inner: &Inner) -> Option<(&'static str, &Table)> {
    let left = inner.left_boundary().map(|b| b.nucleus.as_str());
    let right = inner.right_boundary().map(|b| b.nucleus.as_str());
    let tables: Vec<&Table> = inner
        .inner_list
        .atoms
        .iter()
        .filter_map(|atom| match &atom.kind {
            AtomKind::Table(table) => Some(table.as_ref()),
            _ => None,
        })
        .collect();

    match (tables.as_slice(), inner.inner_list.len()) {
        ([table], 1) if table.environment.as_deref() == Some("matrix") => {
            let env = match (left?, right?) {
                ("(", ")") => "pmatrix",
                ("[", "]") => "bmatrix",
                ("{", "}") => "Bmatrix",
                ("|", "|") => "vmatrix",
                ("\u{2016}", "\u{2016}") => "Vmatrix",
                _ => return None,
            };
            Some((env, *table))
        }
        ([table], 2)
            if table.environment.as_deref() == Some("cases")
                && left == Some("{")
                && right == Some("") =>
        {
            Some(("cases", *table))
        }
        _ => None,
    }
}

fn write_inner(out: &mut String, inner: &Inner) {
    if let Some((env, table)) = environment_of(inner) {
        write_table(out, table, Some(env));
        return;
    }

    if inner.left_boundary().is_none() && inner.right_boundary().is_none() {
        out.push_str(&format!("{{{}}}", to_latex(&inner.inner_list)));
        return;
    }

    let left = inner
        .left_boundary()
        .map_or_else(|| ".".to_string(), delimiter_to_string);
    let right = inner
        .right_boundary()
        .map_or_else(|| ".".to_string(), delimiter_to_string);
    out.push_str(&format!(
        "\\left{left} {}\\right{right} ",
        to_latex(&inner.inner_list)
    ));
}

fn write_table(out: &mut String, table: &Table, env: Option<&str>) {
    if let Some(env) = env {
        out.push_str(&format!("\\begin{{{env}}}"));
    }

    let text_style_cells = matches!(table.environment.as_deref(), Some("matrix" | "cases"));
    let spaced_second_column = matches!(
        table.environment.as_deref(),
        Some("eqalign" | "aligned" | "split")
    );

    for (i, row) in table.cells.iter().enumerate() {
        for (j, cell) in row.iter().enumerate() {
            let mut atoms = cell.atoms.as_slice();
            if text_style_cells
                && matches!(atoms.first().map(|a| &a.kind), Some(AtomKind::Style(_)))
            {
                atoms = &atoms[1..];
            }
            if spaced_second_column
                && j == 1
                && matches!(atoms.first(), Some(a) if a.kind == AtomKind::Ordinary && a.nucleus.is_empty())
            {
                atoms = &atoms[1..];
            }
            out.push_str(&to_latex(&MathList {
                atoms: atoms.to_vec(),
            }));
            if j + 1 < row.len() {
                out.push('&');
            }
        }
        if i + 1 < table.num_rows() {
            out.push_str("\\\\ ");
        }
    }

    if let Some(env) = env {
        out.push_str(&format!("\\end{{{env}}}"));
    }
}
