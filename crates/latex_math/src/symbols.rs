//! Symbol tables
//!
//! Maps LaTeX command names to atom templates, plus the accent, delimiter and
//! font-style tables and their reverse maps. Templates are never handed out by
//! reference: every lookup returns a fresh clone.
//!
//! When several names share a value, reverse lookups return the shortest
//! name, breaking ties alphabetically.

use crate::model::{Atom, AtomKind, FontStyle, LineStyle, MathList};
use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};

// =============================================================================
// Builtin data
// =============================================================================

const GREEK: &[(&str, &str)] = &[
    ("alpha", "\u{03B1}"),
    ("beta", "\u{03B2}"),
    ("gamma", "\u{03B3}"),
    ("delta", "\u{03B4}"),
    ("varepsilon", "\u{03B5}"),
    ("zeta", "\u{03B6}"),
    ("eta", "\u{03B7}"),
    ("theta", "\u{03B8}"),
    ("iota", "\u{03B9}"),
    ("kappa", "\u{03BA}"),
    ("lambda", "\u{03BB}"),
    ("mu", "\u{03BC}"),
    ("nu", "\u{03BD}"),
    ("xi", "\u{03BE}"),
    ("omicron", "\u{03BF}"),
    ("pi", "\u{03C0}"),
    ("rho", "\u{03C1}"),
    ("varsigma", "\u{03C2}"),
    ("sigma", "\u{03C3}"),
    ("tau", "\u{03C4}"),
    ("upsilon", "\u{03C5}"),
    ("varphi", "\u{03C6}"),
    ("chi", "\u{03C7}"),
    ("psi", "\u{03C8}"),
    ("omega", "\u{03C9}"),
    ("vartheta", "\u{03D1}"),
    ("phi", "\u{03D5}"),
    ("varpi", "\u{03D6}"),
    ("varkappa", "\u{03F0}"),
    ("varrho", "\u{03F1}"),
    ("epsilon", "\u{03F5}"),
    ("Gamma", "\u{0393}"),
    ("Delta", "\u{0394}"),
    ("Theta", "\u{0398}"),
    ("Lambda", "\u{039B}"),
    ("Xi", "\u{039E}"),
    ("Pi", "\u{03A0}"),
    ("Sigma", "\u{03A3}"),
    ("Upsilon", "\u{03A5}"),
    ("Phi", "\u{03A6}"),
    ("Psi", "\u{03A8}"),
    ("Omega", "\u{03A9}"),
];

const OPEN: &[(&str, &str)] = &[
    ("lceil", "\u{2308}"),
    ("lfloor", "\u{230A}"),
    ("langle", "\u{27E8}"),
    ("lgroup", "\u{27EE}"),
    ("{", "{"),
];

const CLOSE: &[(&str, &str)] = &[
    ("rceil", "\u{2309}"),
    ("rfloor", "\u{230B}"),
    ("rangle", "\u{27E9}"),
    ("rgroup", "\u{27EF}"),
    ("}", "}"),
];

const RELATIONS: &[(&str, &str)] = &[
    ("leftarrow", "\u{2190}"),
    ("uparrow", "\u{2191}"),
    ("rightarrow", "\u{2192}"),
    ("downarrow", "\u{2193}"),
    ("leftrightarrow", "\u{2194}"),
    ("updownarrow", "\u{2195}"),
    ("nwarrow", "\u{2196}"),
    ("nearrow", "\u{2197}"),
    ("searrow", "\u{2198}"),
    ("swarrow", "\u{2199}"),
    ("mapsto", "\u{21A6}"),
    ("Leftarrow", "\u{21D0}"),
    ("Uparrow", "\u{21D1}"),
    ("Rightarrow", "\u{21D2}"),
    ("Downarrow", "\u{21D3}"),
    ("Leftrightarrow", "\u{21D4}"),
    ("Updownarrow", "\u{21D5}"),
    ("longleftarrow", "\u{27F5}"),
    ("longrightarrow", "\u{27F6}"),
    ("longleftrightarrow", "\u{27F7}"),
    ("Longleftarrow", "\u{27F8}"),
    ("Longrightarrow", "\u{27F9}"),
    ("Longleftrightarrow", "\u{27FA}"),
    ("leq", "\u{2264}"),
    ("geq", "\u{2265}"),
    ("neq", "\u{2260}"),
    ("in", "\u{2208}"),
    ("notin", "\u{2209}"),
    ("ni", "\u{220B}"),
    ("propto", "\u{221D}"),
    ("mid", "\u{2223}"),
    ("parallel", "\u{2225}"),
    ("sim", "\u{223C}"),
    ("simeq", "\u{2243}"),
    ("cong", "\u{2245}"),
    ("approx", "\u{2248}"),
    ("asymp", "\u{224D}"),
    ("doteq", "\u{2250}"),
    ("equiv", "\u{2261}"),
    ("gg", "\u{226B}"),
    ("ll", "\u{226A}"),
    ("prec", "\u{227A}"),
    ("succ", "\u{227B}"),
    ("subset", "\u{2282}"),
    ("supset", "\u{2283}"),
    ("subseteq", "\u{2286}"),
    ("supseteq", "\u{2287}"),
    ("sqsubset", "\u{228F}"),
    ("sqsupset", "\u{2290}"),
    ("sqsubseteq", "\u{2291}"),
    ("sqsupseteq", "\u{2292}"),
    ("models", "\u{22A7}"),
    ("perp", "\u{27C2}"),
];

const BINARY_OPERATORS: &[(&str, &str)] = &[
    ("times", "\u{00D7}"),
    ("div", "\u{00F7}"),
    ("pm", "\u{00B1}"),
    ("dagger", "\u{2020}"),
    ("ddagger", "\u{2021}"),
    ("mp", "\u{2213}"),
    ("setminus", "\u{2216}"),
    ("ast", "\u{2217}"),
    ("circ", "\u{2218}"),
    ("bullet", "\u{2219}"),
    ("wedge", "\u{2227}"),
    ("vee", "\u{2228}"),
    ("cap", "\u{2229}"),
    ("cup", "\u{222A}"),
    ("wr", "\u{2240}"),
    ("uplus", "\u{228E}"),
    ("sqcap", "\u{2293}"),
    ("sqcup", "\u{2294}"),
    ("oplus", "\u{2295}"),
    ("ominus", "\u{2296}"),
    ("otimes", "\u{2297}"),
    ("oslash", "\u{2298}"),
    ("odot", "\u{2299}"),
    ("star", "\u{22C6}"),
    ("cdot", "\u{22C5}"),
    ("amalg", "\u{2A3F}"),
];

/// (name, nucleus, limits)
const LARGE_OPERATORS: &[(&str, &str, bool)] = &[
    ("log", "log", false),
    ("lg", "lg", false),
    ("ln", "ln", false),
    ("sin", "sin", false),
    ("arcsin", "arcsin", false),
    ("sinh", "sinh", false),
    ("cos", "cos", false),
    ("arccos", "arccos", false),
    ("cosh", "cosh", false),
    ("tan", "tan", false),
    ("arctan", "arctan", false),
    ("tanh", "tanh", false),
    ("cot", "cot", false),
    ("coth", "coth", false),
    ("sec", "sec", false),
    ("csc", "csc", false),
    ("arg", "arg", false),
    ("ker", "ker", false),
    ("dim", "dim", false),
    ("hom", "hom", false),
    ("exp", "exp", false),
    ("deg", "deg", false),
    ("lim", "lim", true),
    ("limsup", "lim sup", true),
    ("liminf", "lim inf", true),
    ("max", "max", true),
    ("min", "min", true),
    ("sup", "sup", true),
    ("inf", "inf", true),
    ("det", "det", true),
    ("Pr", "Pr", true),
    ("gcd", "gcd", true),
    ("prod", "\u{220F}", true),
    ("coprod", "\u{2210}", true),
    ("sum", "\u{2211}", true),
    ("int", "\u{222B}", false),
    ("oint", "\u{222E}", false),
    ("bigwedge", "\u{22C0}", true),
    ("bigvee", "\u{22C1}", true),
    ("bigcap", "\u{22C2}", true),
    ("bigcup", "\u{22C3}", true),
    ("bigodot", "\u{2A00}", true),
    ("bigoplus", "\u{2A01}", true),
    ("bigotimes", "\u{2A02}", true),
    ("biguplus", "\u{2A04}", true),
    ("bigsqcup", "\u{2A06}", true),
];

const ORDINARY: &[(&str, &str)] = &[
    ("$", "$"),
    ("&", "&"),
    ("#", "#"),
    ("%", "%"),
    ("_", "_"),
    (" ", " "),
    ("backslash", "\\"),
    ("degree", "\u{00B0}"),
    ("neg", "\u{00AC}"),
    ("angstrom", "\u{00C5}"),
    ("|", "\u{2016}"),
    ("vert", "|"),
    ("ldots", "\u{2026}"),
    ("prime", "\u{2032}"),
    ("hbar", "\u{210F}"),
    ("Im", "\u{2111}"),
    ("ell", "\u{2113}"),
    ("wp", "\u{2118}"),
    ("Re", "\u{211C}"),
    ("mho", "\u{2127}"),
    ("aleph", "\u{2135}"),
    ("forall", "\u{2200}"),
    ("exists", "\u{2203}"),
    ("emptyset", "\u{2205}"),
    ("nabla", "\u{2207}"),
    ("infty", "\u{221E}"),
    ("angle", "\u{2220}"),
    ("top", "\u{22A4}"),
    ("bot", "\u{22A5}"),
    ("vdots", "\u{22EE}"),
    ("cdots", "\u{22EF}"),
    ("ddots", "\u{22F1}"),
    ("triangle", "\u{25B3}"),
    ("imath", "\u{1D6A4}"),
    ("jmath", "\u{1D6A5}"),
    ("partial", "\u{1D715}"),
];

const PUNCTUATION: &[(&str, &str)] = &[("colon", ":"), ("cdotp", "\u{00B7}")];

/// Widths in mu
const SPACES: &[(&str, f32)] = &[
    (",", 3.0),
    (">", 4.0),
    (";", 5.0),
    ("!", -3.0),
    ("quad", 18.0),
    ("qquad", 36.0),
];

const STYLES: &[(&str, LineStyle)] = &[
    ("displaystyle", LineStyle::Display),
    ("textstyle", LineStyle::Text),
    ("scriptstyle", LineStyle::Script),
    ("scriptscriptstyle", LineStyle::ScriptScript),
];

const ALIASES: &[(&str, &str)] = &[
    ("lnot", "neg"),
    ("land", "wedge"),
    ("lor", "vee"),
    ("ne", "neq"),
    ("le", "leq"),
    ("ge", "geq"),
    ("lbrace", "{"),
    ("rbrace", "}"),
    ("Vert", "|"),
    ("gets", "leftarrow"),
    ("to", "rightarrow"),
    ("iff", "Longleftrightarrow"),
    ("AA", "angstrom"),
];

const ACCENTS: &[(&str, &str)] = &[
    ("grave", "\u{0300}"),
    ("acute", "\u{0301}"),
    ("hat", "\u{0302}"),
    ("tilde", "\u{0303}"),
    ("bar", "\u{0304}"),
    ("breve", "\u{0306}"),
    ("dot", "\u{0307}"),
    ("ddot", "\u{0308}"),
    ("check", "\u{030C}"),
    ("vec", "\u{20D7}"),
    ("widehat", "\u{0302}"),
    ("widetilde", "\u{0303}"),
];

const DELIMITERS: &[(&str, &str)] = &[
    (".", ""),
    ("(", "("),
    (")", ")"),
    ("[", "["),
    ("]", "]"),
    ("<", "\u{2329}"),
    (">", "\u{232A}"),
    ("/", "/"),
    ("\\", "\\"),
    ("|", "|"),
    ("lgroup", "\u{27EE}"),
    ("rgroup", "\u{27EF}"),
    ("||", "\u{2016}"),
    ("Vert", "\u{2016}"),
    ("vert", "|"),
    ("uparrow", "\u{2191}"),
    ("downarrow", "\u{2193}"),
    ("updownarrow", "\u{2195}"),
    ("Uparrow", "\u{21D1}"),
    ("Downarrow", "\u{21D3}"),
    ("Updownarrow", "\u{21D5}"),
    ("backslash", "\\"),
    ("rangle", "\u{232A}"),
    ("langle", "\u{2329}"),
    ("rbrace", "}"),
    ("}", "}"),
    ("{", "{"),
    ("lbrace", "{"),
    ("lceil", "\u{2308}"),
    ("rceil", "\u{2309}"),
    ("lfloor", "\u{230A}"),
    ("rfloor", "\u{230B}"),
];

const FONT_STYLES: &[(&str, FontStyle)] = &[
    ("mathnormal", FontStyle::Default),
    ("mathrm", FontStyle::Roman),
    ("textrm", FontStyle::Roman),
    ("rm", FontStyle::Roman),
    ("text", FontStyle::Roman),
    ("mathbf", FontStyle::Bold),
    ("bf", FontStyle::Bold),
    ("textbf", FontStyle::Bold),
    ("mathcal", FontStyle::Caligraphic),
    ("cal", FontStyle::Caligraphic),
    ("mathtt", FontStyle::Typewriter),
    ("texttt", FontStyle::Typewriter),
    ("mathit", FontStyle::Italic),
    ("textit", FontStyle::Italic),
    ("mit", FontStyle::Italic),
    ("mathsf", FontStyle::SansSerif),
    ("textsf", FontStyle::SansSerif),
    ("mathfrak", FontStyle::Fraktur),
    ("frak", FontStyle::Fraktur),
    ("mathbb", FontStyle::Blackboard),
    ("mathbfit", FontStyle::BoldItalic),
    ("bm", FontStyle::BoldItalic),
];

// =============================================================================
// Tables
// =============================================================================

/// `true` if `candidate` should replace `current` as the canonical name.
fn prefer_name(candidate: &str, current: &str) -> bool {
    candidate.len() < current.len() || (candidate.len() == current.len() && candidate < current)
}

fn insert_reverse(map: &mut HashMap<String, String>, value: &str, name: &str) {
    match map.get(value) {
        Some(current) if !prefer_name(name, current) => {}
        _ => {
            map.insert(value.to_string(), name.to_string());
        }
    }
}

#[derive(Debug)]
struct SymbolTable {
    commands: HashMap<String, Atom>,
    names_by_nucleus: HashMap<String, String>,
}

impl SymbolTable {
    fn builtin() -> Self {
        let mut table = Self {
            commands: HashMap::new(),
            names_by_nucleus: HashMap::new(),
        };

        let simple: [(&[(&str, &str)], AtomKind); 7] = [
            (GREEK, AtomKind::Variable),
            (OPEN, AtomKind::Open),
            (CLOSE, AtomKind::Close),
            (RELATIONS, AtomKind::Relation),
            (BINARY_OPERATORS, AtomKind::BinaryOperator),
            (ORDINARY, AtomKind::Ordinary),
            (PUNCTUATION, AtomKind::Punctuation),
        ];
        for (entries, kind) in simple {
            for (name, nucleus) in entries {
                table.define(name, Atom::new(kind.clone(), *nucleus));
            }
        }
        for (name, nucleus, limits) in LARGE_OPERATORS {
            table.define(
                name,
                Atom::new(AtomKind::LargeOperator { limits: *limits }, *nucleus),
            );
        }
        for (name, width) in SPACES {
            table.define(name, Atom::space(*width));
        }
        for (name, style) in STYLES {
            table.define(name, Atom::style(*style));
        }
        table.define("square", Atom::placeholder());
        table
    }

    fn define(&mut self, name: &str, atom: Atom) {
        // Overriding a name drops its old reverse entry
        if let Some(previous) = self.commands.get(name) {
            if self.names_by_nucleus.get(&previous.nucleus).map(String::as_str) == Some(name) {
                let nucleus = previous.nucleus.clone();
                self.names_by_nucleus.remove(&nucleus);
                for (other, atom) in &self.commands {
                    if other != name && atom.nucleus == nucleus {
                        insert_reverse(&mut self.names_by_nucleus, &nucleus, other);
                    }
                }
            }
        }
        if !atom.nucleus.is_empty() {
            insert_reverse(&mut self.names_by_nucleus, &atom.nucleus, name);
        }
        self.commands.insert(name.to_string(), atom);
    }
}

fn symbol_table() -> &'static RwLock<SymbolTable> {
    static TABLE: OnceLock<RwLock<SymbolTable>> = OnceLock::new();
    TABLE.get_or_init(|| {
        tracing::debug!("Building LaTeX symbol table");
        RwLock::new(SymbolTable::builtin())
    })
}

struct ReverseTable<T: 'static> {
    by_name: HashMap<&'static str, T>,
    names: HashMap<T, &'static str>,
}

impl<T: Copy + Eq + std::hash::Hash> ReverseTable<T> {
    fn new(entries: &'static [(&'static str, T)]) -> Self {
        let mut by_name = HashMap::new();
        let mut names: HashMap<T, &'static str> = HashMap::new();
        for &(name, value) in entries {
            by_name.insert(name, value);
            match names.get(&value) {
                Some(current) if !prefer_name(name, current) => {}
                _ => {
                    names.insert(value, name);
                }
            }
        }
        Self { by_name, names }
    }
}

fn accents() -> &'static ReverseTable<&'static str> {
    static TABLE: OnceLock<ReverseTable<&'static str>> = OnceLock::new();
    TABLE.get_or_init(|| ReverseTable::new(ACCENTS))
}

fn delimiters() -> &'static ReverseTable<&'static str> {
    static TABLE: OnceLock<ReverseTable<&'static str>> = OnceLock::new();
    TABLE.get_or_init(|| ReverseTable::new(DELIMITERS))
}

fn font_styles() -> &'static ReverseTable<FontStyle> {
    static TABLE: OnceLock<ReverseTable<FontStyle>> = OnceLock::new();
    TABLE.get_or_init(|| ReverseTable::new(FONT_STYLES))
}

fn aliases() -> &'static HashMap<&'static str, &'static str> {
    static TABLE: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    TABLE.get_or_init(|| ALIASES.iter().copied().collect())
}

// =============================================================================
// Public API
// =============================================================================

/// Build every table now. Call before sharing lookups across threads if the
/// first lookup must not race.
pub fn initialize() {
    symbol_table();
    accents();
    delimiters();
    font_styles();
    aliases();
}

/// The canonical name for an alias such as `ne` (`neq`)
pub fn resolve_alias(name: &str) -> Option<&'static str> {
    aliases().get(name).copied()
}

/// A fresh atom for a symbol command, resolving aliases first
pub fn atom_for_command(name: &str) -> Option<Atom> {
    let name = resolve_alias(name).unwrap_or(name);
    let table = symbol_table().read().unwrap_or_else(PoisonError::into_inner);
    table.commands.get(name).cloned()
}

/// The command that produces an atom with this nucleus
pub fn command_for_atom(atom: &Atom) -> Option<String> {
    if atom.nucleus.is_empty() {
        return None;
    }
    let table = symbol_table().read().unwrap_or_else(PoisonError::into_inner);
    table.names_by_nucleus.get(&atom.nucleus).cloned()
}

/// Add or replace a symbol command.
pub fn define_command(name: &str, atom: Atom) {
    let mut table = symbol_table()
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    table.define(name, atom);
}

/// All symbol command names and aliases, sorted
pub fn supported_commands() -> Vec<String> {
    let table = symbol_table().read().unwrap_or_else(PoisonError::into_inner);
    let mut names: Vec<String> = table
        .commands
        .keys()
        .cloned()
        .chain(aliases().keys().map(|alias| alias.to_string()))
        .collect();
    names.sort();
    names
}

/// An accent atom with an empty accentee
pub fn accent_for_command(name: &str) -> Option<Atom> {
    accents()
        .by_name
        .get(name)
        .map(|accent| Atom::accent(*accent, MathList::new()))
}

pub fn accent_names() -> impl Iterator<Item = &'static str> {
    ACCENTS.iter().map(|(name, _)| *name)
}

pub fn accent_name(accent: &Atom) -> Option<&'static str> {
    accents().names.get(accent.nucleus.as_str()).copied()
}

/// A boundary atom for a `\left`/`\right` delimiter name
pub fn boundary_atom(delimiter: &str) -> Option<Atom> {
    delimiters()
        .by_name
        .get(delimiter)
        .map(|nucleus| Atom::boundary(*nucleus))
}

pub fn delimiter_name(boundary: &Atom) -> Option<&'static str> {
    delimiters().names.get(boundary.nucleus.as_str()).copied()
}

pub fn font_style_for_name(name: &str) -> Option<FontStyle> {
    font_styles().by_name.get(name).copied()
}

pub fn font_style_name(style: FontStyle) -> &'static str {
    match style {
        FontStyle::Default => "mathnormal",
        FontStyle::Roman => "mathrm",
        FontStyle::Bold => "mathbf",
        FontStyle::Fraktur => "mathfrak",
        FontStyle::Caligraphic => "mathcal",
        FontStyle::Italic => "mathit",
        FontStyle::SansSerif => "mathsf",
        FontStyle::Blackboard => "mathbb",
        FontStyle::Typewriter => "mathtt",
        FontStyle::BoldItalic => "bm",
    }
}

/// Classify a plain input character. Returns `None` for characters that are
/// skipped or have a special meaning to the parser.
pub fn atom_for_char(ch: char) -> Option<Atom> {
    let nucleus = ch.to_string();
    let kind = match ch {
        '\u{0410}'..='\u{044F}' => AtomKind::Ordinary,
        _ if !('\u{21}'..='\u{7E}').contains(&ch) => return None,
        '$' | '%' | '#' | '&' | '~' | '\'' => return None,
        '^' | '_' | '{' | '}' | '\\' => return None,
        '(' | '[' => AtomKind::Open,
        ')' | ']' | '!' | '?' => AtomKind::Close,
        ',' | ';' => AtomKind::Punctuation,
        '=' | '>' | '<' => AtomKind::Relation,
        ':' => return Some(Atom::new(AtomKind::Relation, "\u{2236}")),
        '-' => return Some(Atom::new(AtomKind::BinaryOperator, "\u{2212}")),
        '+' | '*' => AtomKind::BinaryOperator,
        '.' | '0'..='9' => AtomKind::Number,
        'a'..='z' | 'A'..='Z' => AtomKind::Variable,
        _ => AtomKind::Ordinary,
    };
    Some(Atom::new(kind, nucleus))
}

/// A list of atoms for each recognized character of `text`
pub fn math_list_for_chars(text: &str) -> MathList {
    MathList::from_atoms(text.chars().filter_map(atom_for_char).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AtomType;

    #[test]
    fn test_lookup_returns_fresh_copy() {
        let mut first = atom_for_command("alpha").unwrap();
        first.nucleus.push('x');
        let second = atom_for_command("alpha").unwrap();
        assert_eq!(second.nucleus, "\u{03B1}");
        assert_eq!(second.atom_type(), AtomType::Variable);
    }

    #[test]
    fn test_alias_resolution() {
        assert_eq!(resolve_alias("ne"), Some("neq"));
        let atom = atom_for_command("ne").unwrap();
        assert_eq!(atom.nucleus, "\u{2260}");
        assert_eq!(atom.atom_type(), AtomType::Relation);
        assert!(atom_for_command("notacommand").is_none());
    }

    #[test]
    fn test_large_operator_limits() {
        let sum = atom_for_command("sum").unwrap();
        assert_eq!(sum.kind, AtomKind::LargeOperator { limits: true });
        let int = atom_for_command("int").unwrap();
        assert_eq!(int.kind, AtomKind::LargeOperator { limits: false });
        assert_eq!(atom_for_command("limsup").unwrap().nucleus, "lim sup");
    }

    #[test]
    fn test_reverse_lookup_prefers_shortest() {
        let atom = Atom::new(AtomKind::Relation, "\u{2260}");
        assert_eq!(command_for_atom(&atom).as_deref(), Some("neq"));
        assert_eq!(command_for_atom(&Atom::ordinary("")), None);
        assert_eq!(command_for_atom(&Atom::ordinary("x")), None);
    }

    #[test]
    fn test_define_command() {
        define_command("lollipop", Atom::ordinary("\u{1F36D}"));
        assert_eq!(atom_for_command("lollipop").unwrap().nucleus, "\u{1F36D}");
        assert_eq!(
            command_for_atom(&Atom::ordinary("\u{1F36D}")).as_deref(),
            Some("lollipop")
        );
        define_command("lollipop", Atom::ordinary("\u{1F36C}"));
        assert_eq!(command_for_atom(&Atom::ordinary("\u{1F36D}")), None);
        assert!(supported_commands().contains(&"lollipop".to_string()));
    }

    #[test]
    fn test_accents() {
        let hat = accent_for_command("widehat").unwrap();
        assert_eq!(hat.nucleus, "\u{0302}");
        assert_eq!(accent_name(&hat), Some("hat"));
        assert!(accent_for_command("alpha").is_none());
    }

    #[test]
    fn test_delimiters() {
        assert_eq!(boundary_atom("langle").unwrap().nucleus, "\u{2329}");
        assert_eq!(boundary_atom(".").unwrap().nucleus, "");
        assert!(boundary_atom("x").is_none());
        assert_eq!(delimiter_name(&Atom::boundary("\u{2329}")), Some("<"));
        assert_eq!(delimiter_name(&Atom::boundary("\u{2016}")), Some("||"));
        assert_eq!(delimiter_name(&Atom::boundary("\\")), Some("\\"));
        assert_eq!(delimiter_name(&Atom::boundary("")), Some("."));
    }

    #[test]
    fn test_font_styles() {
        assert_eq!(font_style_for_name("bf"), Some(FontStyle::Bold));
        assert_eq!(font_style_for_name("text"), Some(FontStyle::Roman));
        assert_eq!(font_style_for_name("frac"), None);
        assert_eq!(font_style_name(FontStyle::BoldItalic), "bm");
    }

    #[test]
    fn test_atom_for_char() {
        assert_eq!(atom_for_char('x').unwrap().atom_type(), AtomType::Variable);
        assert_eq!(atom_for_char('7').unwrap().atom_type(), AtomType::Number);
        assert_eq!(atom_for_char('-').unwrap().nucleus, "\u{2212}");
        assert_eq!(atom_for_char(':').unwrap().atom_type(), AtomType::Relation);
        assert_eq!(atom_for_char('?').unwrap().atom_type(), AtomType::Close);
        assert_eq!(atom_for_char('|').unwrap().atom_type(), AtomType::Ordinary);
        assert_eq!(
            atom_for_char('\u{0416}').unwrap().atom_type(),
            AtomType::Ordinary
        );
        assert!(atom_for_char('~').is_none());
        assert!(atom_for_char(' ').is_none());
        assert!(atom_for_char('\u{00E9}').is_none());
    }

    #[test]
    fn test_math_list_for_chars() {
        let list = math_list_for_chars("x+1 ");
        assert_eq!(list.len(), 3);
        assert_eq!(list.atoms[1].atom_type(), AtomType::BinaryOperator);
    }
}
