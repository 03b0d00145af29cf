//! Property tests over the parser, finalizer and serializer

use latex_math::{parse, to_latex};
use proptest::prelude::*;

const DELIMITERS: &[&str] = &[
    "(", ")", "[", "]", "|", "/", ".", "\\{", "\\}", "\\|", "\\langle", "\\rangle", "\\lfloor",
    "\\rfloor", "\\lceil", "\\rceil", "\\lgroup", "\\rgroup", "\\uparrow", "\\Downarrow",
];

const PIECES: &[&str] = &[
    "x", "2", "3", ".", "+", "-", "=", "(", ")", "\\alpha ", "^{2}", "_{i}", "\\frac{a}{b}",
    "\\sqrt{y}", "\\sum ", ",",
];

proptest! {
    #[test]
    fn test_parse_never_panics(input in "[ -~]{0,40}") {
        if let Ok(list) = parse(&input) {
            let _ = to_latex(&list);
            let _ = list.finalized();
        }
    }

    #[test]
    fn test_finalize_is_idempotent(pieces in proptest::collection::vec(0..PIECES.len(), 0..12)) {
        let latex: String = pieces.iter().map(|&i| PIECES[i]).collect();
        let list = parse(&latex).unwrap();
        let once = list.finalized();
        prop_assert_eq!(once.finalized(), once);
    }

    #[test]
    fn test_delimiters_survive_serialization(
        left in 0..DELIMITERS.len(),
        right in 0..DELIMITERS.len(),
    ) {
        let latex = format!("\\left{} x \\right{}", DELIMITERS[left], DELIMITERS[right]);
        let list = parse(&latex).unwrap();
        let reparsed = parse(&to_latex(&list)).unwrap();
        prop_assert_eq!(reparsed, list);
    }
}
