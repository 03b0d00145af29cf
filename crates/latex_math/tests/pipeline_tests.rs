//! End-to-end tests: parse, finalize, typeset, render

use latex_math::{
    parse, typeset, AtomKind, AtomType, DisplayKind, LabelConfig, LineStyle, MathLabel,
    MathListIndex, MathTable, ParseErrorKind, RenderPrimitive, Renderer, ScaledFont, Size,
    SubIndexType,
};
use std::sync::Arc;

fn layout(latex: &str, style: LineStyle) -> latex_math::Display {
    let list = parse(latex).expect("expression should parse");
    typeset(&list, &ScaledFont::approximate(20.0), style)
}

fn text_of(primitives: &[RenderPrimitive]) -> String {
    primitives
        .iter()
        .filter_map(|primitive| match primitive {
            RenderPrimitive::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_pythagoras_renders_all_characters() {
    let display = layout("x^2+y^2=z^2", LineStyle::Display);
    assert!(display.width > 0.0);
    let output = Renderer::render(&display);
    let text = text_of(&output.primitives);
    for ch in ['2', '+', '='] {
        assert!(text.contains(ch), "missing {ch:?} in {text:?}");
    }
    assert_eq!(text.chars().filter(|&ch| ch == '2').count(), 3);
}

#[test]
fn test_fraction_draws_rule() {
    let display = layout("\\frac{1}{2}", LineStyle::Display);
    let output = Renderer::render(&display);
    assert_eq!(output.lines().count(), 1);

    let display = layout("\\binom{n}{k}", LineStyle::Display);
    let output = Renderer::render(&display);
    assert_eq!(output.lines().count(), 0);
}

#[test]
fn test_sqrt_draws_overbar() {
    let display = layout("\\sqrt{x}", LineStyle::Text);
    let output = Renderer::render(&display);
    assert_eq!(output.lines().count(), 1);
    assert!(display.ascent > 0.0);
}

#[test]
fn test_display_style_is_taller_than_text() {
    let display = layout("\\frac{a}{b}", LineStyle::Display);
    let text = layout("\\frac{a}{b}", LineStyle::Text);
    assert!(display.ascent + display.descent > text.ascent + text.descent);
}

#[test]
fn test_parse_errors_surface() {
    let error = parse("\\foo").unwrap_err();
    assert_eq!(error.kind, ParseErrorKind::InvalidCommand);
    let error = parse("\\left( x").unwrap_err();
    assert_eq!(error.kind, ParseErrorKind::MissingRight);
}

#[test]
fn test_path_into_finalized_list() {
    let list = parse("12+\\frac{a}{b}").unwrap().finalized();
    assert_eq!(list.atoms[0].nucleus, "12");
    assert_eq!(list.atoms[0].atom_type(), AtomType::Number);

    let index = MathListIndex::at_location(2, MathListIndex::level0(0), SubIndexType::Numerator);
    let atom = list.atom_at(&index).unwrap();
    assert_eq!(atom.nucleus, "a");
    assert!(matches!(list.atoms[2].kind, AtomKind::Fraction(_)));
}

#[test]
fn test_custom_math_table_matches_builtin() {
    let json = MathTable::approximate().to_json().unwrap();
    let table = MathTable::from_json(&json).unwrap();
    let list = parse("\\sum_{i=1}^{n} i^2").unwrap();

    let builtin = typeset(&list, &ScaledFont::approximate(16.0), LineStyle::Display);
    let loaded = typeset(&list, &ScaledFont::new(Arc::new(table), 16.0), LineStyle::Display);
    assert!((builtin.width - loaded.width).abs() < 1e-3);
    assert!((builtin.ascent - loaded.ascent).abs() < 1e-3);
}

#[test]
fn test_top_level_ranges_cover_source_atoms() {
    let display = layout("a+b", LineStyle::Text);
    assert_eq!(display.range, Some(0..3));
    let DisplayKind::List { children, .. } = &display.kind else {
        panic!("expected a list display");
    };
    assert!(!children.is_empty());
}

#[test]
fn test_matrix_layout() {
    let display = layout("\\begin{pmatrix}1&0\\\\0&1\\end{pmatrix}", LineStyle::Display);
    let output = Renderer::render(&display);
    let text = text_of(&output.primitives);
    assert_eq!(text.chars().filter(|&ch| ch == '1').count(), 2);
    assert_eq!(text.chars().filter(|&ch| ch == '0').count(), 2);
}

#[test]
fn test_label_layout_and_render() {
    let mut label = MathLabel::new("\\frac{1}{x}", LabelConfig::default());
    let size = label.size_that_fits();
    assert!(size.width > 0.0 && size.height > 0.0);
    let output = label.render(Size::new(size.width * 2.0, size.height * 2.0)).unwrap();
    assert_eq!(output.lines().count(), 1);
    assert!(output.bounds.x() >= 0.0);
}
