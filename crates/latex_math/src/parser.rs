//! LaTeX Parser - Build a math list from LaTeX source
//!
//! A recursive-descent parser over the characters of the input. A builder is
//! single-use: create one per string and call [`MathListBuilder::build`].

use crate::environments;
use crate::error::{ParseError, ParseErrorKind};
use crate::model::{Atom, AtomKind, FontStyle, Inner, MathList};
use crate::symbols;
use std::mem;

/// Characters that form a command on their own after `\`
const SINGLE_CHAR_COMMANDS: &[char] = &[
    '{', '}', '$', '#', '%', '_', '|', ' ', ',', '>', ';', '!', '\\',
];

/// State of the table environment currently being read
#[derive(Debug)]
struct EnvProperties {
    name: Option<String>,
    ended: bool,
    num_rows: usize,
}

impl EnvProperties {
    fn new(name: Option<String>) -> Self {
        Self {
            name,
            ended: false,
            num_rows: 0,
        }
    }
}

/// What a command did to the list being built
enum StopCommand {
    /// Not a stop command, keep going
    NotStop,
    /// The current list is complete
    Done(MathList),
    /// An error was recorded
    Failed,
}

/// Parses LaTeX source into a [`MathList`]
#[derive(Debug)]
pub struct MathListBuilder {
    chars: Vec<char>,
    pos: usize,
    current_font_style: FontStyle,
    spaces_allowed: bool,
    current_inner: Option<Inner>,
    current_env: Option<EnvProperties>,
    error: Option<ParseError>,
}

/// Parse LaTeX source into an unfinalized math list
pub fn parse(latex: &str) -> Result<MathList, ParseError> {
    MathListBuilder::new(latex).build()
}

impl MathListBuilder {
    pub fn new(latex: &str) -> Self {
        Self {
            chars: latex.chars().collect(),
            pos: 0,
            current_font_style: FontStyle::Default,
            spaces_allowed: false,
            current_inner: None,
            current_env: None,
            error: None,
        }
    }

    /// Parse the whole input. Fails with the first error recorded, or with a
    /// mismatched-braces error if input remains unconsumed.
    pub fn build(mut self) -> Result<MathList, ParseError> {
        let list = self.build_internal(false, None);

        if self.has_chars() && self.error.is_none() {
            let source: String = self.chars.iter().collect();
            self.set_error(
                ParseErrorKind::MismatchBraces,
                format!("Mismatched braces: {source}"),
            );
        }

        match (list, self.error) {
            (_, Some(error)) => {
                tracing::debug!(kind = ?error.kind, offset = error.offset, "LaTeX parse failed: {}", error.message);
                Err(error)
            }
            (Some(list), None) => Ok(list),
            (None, None) => Err(ParseError::new(
                ParseErrorKind::InternalError,
                "Internal error",
                self.pos,
            )),
        }
    }

    // =========================================================================
    // Character stream
    // =========================================================================

    fn has_chars(&self) -> bool {
        self.pos < self.chars.len()
    }

    fn next_char(&mut self) -> Option<char> {
        let ch = self.chars.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn unlook(&mut self) {
        debug_assert!(self.pos > 0, "unlook at start of input");
        self.pos = self.pos.saturating_sub(1);
    }

    /// Records an error unless one is already set.
    fn set_error(&mut self, kind: ParseErrorKind, message: impl Into<String>) {
        if self.error.is_none() {
            self.error = Some(ParseError::new(kind, message, self.pos));
        }
    }

    // =========================================================================
    // Lists
    // =========================================================================

    /// Build a list until the input ends, `stop` is read, or (with
    /// `one_char_only`) a single argument unit has been consumed.
    fn build_internal(&mut self, one_char_only: bool, stop: Option<char>) -> Option<MathList> {
        debug_assert!(
            !(one_char_only && stop.is_some()),
            "cannot set both one_char_only and stop"
        );
        let mut list = MathList::new();
        // Whether the last atom of `list` is the previous atom for scripts
        let mut has_prev = false;

        while let Some(ch) = self.next_char() {
            if self.error.is_some() {
                return None;
            }

            if one_char_only && matches!(ch, '^' | '}' | '_' | '&') {
                self.unlook();
                return Some(list);
            }

            if stop == Some(ch) {
                return Some(list);
            }

            let atom = match ch {
                '^' | '_' => {
                    let superscript = ch == '^';
                    let needs_base = match list.last() {
                        Some(prev) if has_prev => {
                            !prev.atom_type().allows_scripts()
                                || if superscript {
                                    prev.superscript().is_some()
                                } else {
                                    prev.subscript().is_some()
                                }
                        }
                        _ => true,
                    };
                    if needs_base {
                        list.add_atom(Atom::ordinary(""));
                        has_prev = true;
                    }
                    let script = self.build_internal(true, None)?;
                    if let Some(prev) = list.last_mut() {
                        if superscript {
                            prev.set_superscript(Some(script));
                        } else {
                            prev.set_subscript(Some(script));
                        }
                    }
                    continue;
                }
                '{' => {
                    let sublist = self.build_internal(false, Some('}'))?;
                    has_prev = !sublist.is_empty();
                    list.append(sublist);
                    if one_char_only {
                        return Some(list);
                    }
                    continue;
                }
                '}' => {
                    self.set_error(ParseErrorKind::MismatchBraces, "Mismatched braces.");
                    return None;
                }
                '\\' => {
                    let command = self.read_command();
                    match self.stop_command(&command, &mut list, stop) {
                        StopCommand::Done(done) => return Some(done),
                        StopCommand::Failed => return None,
                        StopCommand::NotStop => {}
                    }

                    let prev = if has_prev { list.last_mut() } else { None };
                    if self.apply_modifier(&command, prev) {
                        continue;
                    }

                    if let Some(font_style) = symbols::font_style_for_name(&command) {
                        let old_spaces_allowed =
                            mem::replace(&mut self.spaces_allowed, command == "text");
                        let old_font_style = mem::replace(&mut self.current_font_style, font_style);
                        let sublist = self.build_internal(true, None);
                        self.current_font_style = old_font_style;
                        self.spaces_allowed = old_spaces_allowed;

                        let sublist = sublist?;
                        has_prev = !sublist.is_empty();
                        list.append(sublist);
                        if one_char_only {
                            return Some(list);
                        }
                        continue;
                    }

                    match self.atom_for_command(&command) {
                        Some(atom) => atom,
                        None => {
                            self.set_error(ParseErrorKind::InternalError, "Internal error");
                            return None;
                        }
                    }
                }
                '&' => {
                    if self.current_env.is_some() {
                        return Some(list);
                    }
                    let table = self.build_table(None, Some(list), false)?;
                    return Some(MathList::from(vec![table]));
                }
                ' ' if self.spaces_allowed => symbols::atom_for_command(" ")?,
                _ => match symbols::atom_for_char(ch) {
                    Some(atom) => atom,
                    None => continue,
                },
            };

            let mut atom = atom;
            atom.font_style = self.current_font_style;
            list.add_atom(atom);
            has_prev = true;

            if one_char_only {
                return Some(list);
            }
        }

        if self.error.is_some() {
            return None;
        }

        match stop {
            Some('}') => {
                self.set_error(ParseErrorKind::MismatchBraces, "Missing closing brace");
                None
            }
            Some(stop) => {
                self.set_error(
                    ParseErrorKind::CharacterNotFound,
                    format!("Expected character not found: {stop}"),
                );
                None
            }
            None => Some(list),
        }
    }

    // =========================================================================
    // Commands
    // =========================================================================

    fn read_command(&mut self) -> String {
        if let Some(ch) = self.next_char() {
            if SINGLE_CHAR_COMMANDS.contains(&ch) {
                return ch.to_string();
            }
            self.unlook();
        }
        self.read_string()
    }

    /// A run of ASCII letters
    fn read_string(&mut self) -> String {
        let mut text = String::new();
        while let Some(ch) = self.peek() {
            if !ch.is_ascii_alphabetic() {
                break;
            }
            text.push(ch);
            self.pos += 1;
        }
        text
    }

    /// Skips whitespace and anything outside printable ASCII.
    fn skip_spaces(&mut self) {
        while let Some(ch) = self.peek() {
            if ('\u{21}'..='\u{7E}').contains(&ch) {
                return;
            }
            self.pos += 1;
        }
    }

    fn expect_character(&mut self, expected: char) -> bool {
        self.skip_spaces();
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn read_braced<F>(&mut self, mut accept: F) -> Option<String>
    where
        F: FnMut(char) -> bool,
    {
        if !self.expect_character('{') {
            self.set_error(ParseErrorKind::CharacterNotFound, "Missing {");
            return None;
        }
        self.skip_spaces();

        let mut text = String::new();
        while let Some(ch) = self.peek() {
            if !accept(ch) {
                break;
            }
            text.push(ch);
            self.pos += 1;
        }

        if !self.expect_character('}') {
            self.set_error(ParseErrorKind::CharacterNotFound, "Missing }");
            return None;
        }
        Some(text)
    }

    fn read_environment(&mut self) -> Option<String> {
        let env = self.read_braced(|ch| ch.is_ascii_alphabetic())?;
        if env.is_empty() {
            self.set_error(ParseErrorKind::MissingEnv, "Missing environment name");
            return None;
        }
        Some(env)
    }

    fn read_color(&mut self) -> Option<String> {
        self.read_braced(|ch| ch == '#' || ch.is_ascii_hexdigit())
    }

    fn read_delimiter(&mut self) -> Option<String> {
        self.skip_spaces();
        let ch = self.next_char()?;
        if ch == '\\' {
            let command = self.read_command();
            // `\|` is the double bar; a bare `|` is the single bar
            if command == "|" {
                return Some("||".to_string());
            }
            return Some(command);
        }
        Some(ch.to_string())
    }

    fn boundary_atom(&mut self, delimiter_type: &str) -> Option<Atom> {
        let Some(delimiter) = self.read_delimiter() else {
            self.set_error(
                ParseErrorKind::MissingDelimiter,
                format!("Missing delimiter for \\{delimiter_type}"),
            );
            return None;
        };

        let boundary = symbols::boundary_atom(&delimiter);
        if boundary.is_none() {
            self.set_error(
                ParseErrorKind::InvalidDelimiter,
                format!("Invalid delimiter for \\{delimiter_type}: {delimiter}"),
            );
        }
        boundary
    }

    fn atom_for_command(&mut self, command: &str) -> Option<Atom> {
        match command {
            "frac" | "binom" => {
                let numerator = self.build_internal(true, None)?;
                let denominator = self.build_internal(true, None)?;
                let mut atom = Atom::fraction(numerator, denominator, command == "frac");
                if command == "binom" {
                    if let AtomKind::Fraction(fraction) = &mut atom.kind {
                        fraction.left_delimiter = Some("(".to_string());
                        fraction.right_delimiter = Some(")".to_string());
                    }
                }
                Some(atom)
            }
            "sqrt" => {
                let degree = if self.peek() == Some('[') {
                    self.pos += 1;
                    Some(self.build_internal(false, Some(']'))?)
                } else {
                    None
                };
                let radicand = self.build_internal(true, None)?;
                Some(Atom::radical(radicand, degree))
            }
            "left" => {
                let outer = self.current_inner.take();
                let left = self.boundary_atom("left")?;
                let mut inner = Inner::default();
                inner.set_left_boundary(Some(left));
                self.current_inner = Some(inner);

                let inner_list = self.build_internal(false, None)?;

                let Some(mut inner) = self.current_inner.take() else {
                    self.set_error(ParseErrorKind::InternalError, "Internal error");
                    return None;
                };
                if inner.right_boundary().is_none() {
                    self.set_error(ParseErrorKind::MissingRight, "Missing \\right");
                    return None;
                }
                inner.inner_list = inner_list;
                self.current_inner = outer;
                Some(Atom::inner(inner))
            }
            "overline" => {
                let inner = self.build_internal(true, None)?;
                Some(Atom::new(AtomKind::Overline(inner), ""))
            }
            "underline" => {
                let inner = self.build_internal(true, None)?;
                Some(Atom::new(AtomKind::Underline(inner), ""))
            }
            "begin" => {
                let env = self.read_environment()?;
                self.build_table(Some(env), None, false)
            }
            "color" | "colorbox" => {
                let color = self.read_color()?;
                let inner = self.build_internal(true, None)?;
                let kind = if command == "color" {
                    AtomKind::Color { color, inner }
                } else {
                    AtomKind::ColorBox { color, inner }
                };
                Some(Atom::new(kind, ""))
            }
            _ => {
                if let Some(mut accent) = symbols::accent_for_command(command) {
                    let accentee = self.build_internal(true, None)?;
                    accent.kind = AtomKind::Accent(accentee);
                    return Some(accent);
                }
                if let Some(atom) = symbols::atom_for_command(command) {
                    return Some(atom);
                }
                self.set_error(
                    ParseErrorKind::InvalidCommand,
                    format!("Invalid command \\{command}"),
                );
                None
            }
        }
    }

    /// Commands that end the list being built: `\right`, the infix fraction
    /// commands, row breaks and `\end`.
    fn stop_command(
        &mut self,
        command: &str,
        list: &mut MathList,
        stop: Option<char>,
    ) -> StopCommand {
        match command {
            "right" => {
                if self.current_inner.is_none() {
                    self.set_error(ParseErrorKind::MissingLeft, "Missing \\left");
                    return StopCommand::Failed;
                }
                let Some(right) = self.boundary_atom("right") else {
                    return StopCommand::Failed;
                };
                if let Some(inner) = self.current_inner.as_mut() {
                    inner.set_right_boundary(Some(right));
                }
                StopCommand::Done(mem::take(list))
            }
            "over" | "atop" | "choose" | "brack" | "brace" | "atopwithdelims" => {
                let delimiters = match command {
                    "choose" => Some(("(".to_string(), ")".to_string())),
                    "brack" => Some(("[".to_string(), "]".to_string())),
                    "brace" => Some(("{".to_string(), "}".to_string())),
                    "atopwithdelims" => {
                        let Some(left) = self.boundary_atom(command) else {
                            return StopCommand::Failed;
                        };
                        let Some(right) = self.boundary_atom(command) else {
                            return StopCommand::Failed;
                        };
                        Some((left.nucleus, right.nucleus))
                    }
                    _ => None,
                };
                let numerator = mem::take(list);
                let Some(denominator) = self.build_internal(false, stop) else {
                    return StopCommand::Failed;
                };
                let mut atom = Atom::fraction(numerator, denominator, command == "over");
                if let (AtomKind::Fraction(fraction), Some((left, right))) =
                    (&mut atom.kind, delimiters)
                {
                    // `.` reads as an empty nucleus and means no delimiter
                    fraction.left_delimiter = Some(left).filter(|d| !d.is_empty());
                    fraction.right_delimiter = Some(right).filter(|d| !d.is_empty());
                }
                StopCommand::Done(MathList::from(vec![atom]))
            }
            "\\" | "cr" => {
                if let Some(env) = self.current_env.as_mut() {
                    env.num_rows += 1;
                    return StopCommand::Done(mem::take(list));
                }
                match self.build_table(None, Some(mem::take(list)), true) {
                    Some(table) => StopCommand::Done(MathList::from(vec![table])),
                    None => StopCommand::Failed,
                }
            }
            "end" => {
                if self.current_env.is_none() {
                    self.set_error(ParseErrorKind::MissingBegin, "Missing \\begin");
                    return StopCommand::Failed;
                }
                let Some(env) = self.read_environment() else {
                    return StopCommand::Failed;
                };
                let begin = self
                    .current_env
                    .as_ref()
                    .and_then(|current| current.name.clone())
                    .unwrap_or_default();
                if env != begin {
                    self.set_error(
                        ParseErrorKind::InvalidEnv,
                        format!("Begin environment name {begin} does not match end name: {env}"),
                    );
                    return StopCommand::Failed;
                }
                if let Some(current) = self.current_env.as_mut() {
                    current.ended = true;
                }
                StopCommand::Done(mem::take(list))
            }
            _ => StopCommand::NotStop,
        }
    }

    /// Apply `\limits` / `\nolimits` to the previous atom. Returns `true` if
    /// the command was a modifier.
    fn apply_modifier(&mut self, modifier: &str, prev: Option<&mut Atom>) -> bool {
        let limits = match modifier {
            "limits" => true,
            "nolimits" => false,
            _ => return false,
        };
        match prev.map(|atom| &mut atom.kind) {
            Some(AtomKind::LargeOperator { limits: current }) => *current = limits,
            _ => self.set_error(
                ParseErrorKind::InvalidLimits,
                format!("{modifier} can only be applied to an operator."),
            ),
        }
        true
    }

    // =========================================================================
    // Tables
    // =========================================================================

    fn build_table(
        &mut self,
        env: Option<String>,
        first_list: Option<MathList>,
        is_row: bool,
    ) -> Option<Atom> {
        let outer_env = self
            .current_env
            .replace(EnvProperties::new(env.clone()));

        let mut rows: Vec<Vec<MathList>> = vec![Vec::new()];
        let mut current_row = 0;
        if let Some(first_list) = first_list {
            rows[0].push(first_list);
            if is_row {
                if let Some(current) = self.current_env.as_mut() {
                    current.num_rows += 1;
                }
                current_row = 1;
                rows.push(Vec::new());
            }
        }

        while self.has_chars() && !self.env_ended() {
            let list = self.build_internal(false, None)?;
            rows[current_row].push(list);

            let num_rows = self.current_env.as_ref().map_or(0, |env| env.num_rows);
            if num_rows > current_row {
                current_row = num_rows;
                while rows.len() <= current_row {
                    rows.push(Vec::new());
                }
            }
        }

        if !self.env_ended() && env.is_some() {
            self.set_error(ParseErrorKind::MissingEnd, "Missing \\end");
            return None;
        }

        match environments::table_with_environment(env.as_deref(), rows) {
            Ok(table) => {
                self.current_env = outer_env;
                Some(table)
            }
            Err(error) => {
                self.set_error(error.kind, error.message);
                None
            }
        }
    }

    fn env_ended(&self) -> bool {
        self.current_env.as_ref().is_some_and(|env| env.ended)
    }
}
