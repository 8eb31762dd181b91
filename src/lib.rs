//! Exhaustive, lazy enumeration of the strings matched by a regular
//! expression.
//!
//! A compiled pattern is viewed as a *finite, indexed sequence* of all the
//! strings it fully matches: the sequence has an arbitrary-precision
//! `length`, random access by index, and a structural membership test.
//! Nothing is ever materialized — `get(i)` decodes the index directly into
//! the i-th string, so spaces with 10^400 members are as cheap to poke at
//! as spaces with ten.
//!
//! # Architecture
//!
//! The pipeline is:
//!
//! ```text
//! pattern text  ──parse──>  Ast  ──LanguageBuilder──>  Node tree  ──facade──>  AllStrings / AllMatches
//! ```
//!
//! Each node in the compiled tree represents the set of strings accepted
//! by one sub-pattern and caches its cardinality (a `BigUint`), its fixed
//! width (when every member has the same length), and min/max width bounds
//! used to prune membership splits.
//!
//! ## Enumeration order
//!
//! The order is canonical and depends only on the pattern structure:
//!
//! - **Concatenation** enumerates index tuples leftmost-major: the
//!   rightmost child varies fastest, so `[ab][cd]` yields
//!   `ac, ad, bc, bd`.
//! - **Alternation** enumerates all strings of the first arm, then the
//!   second, and so on. Duplicates across arms are preserved: `a|a` has
//!   length 2.
//! - **Repetition** enumerates shorter counts first, and within one count
//!   uses the concatenation order. Greediness has no effect: `a*?`
//!   enumerates exactly like `a*`.
//! - A **character class** written `[...]` enumerates its items in written
//!   order (ranges ascend); classes computed by negation (`[^...]`, `.`)
//!   enumerate in ascending code point order.
//!
//! Unbounded repetitions are substituted with a finite ceiling
//! ([`Options::max_count`], 65535 by default), so every space is finite
//! even when astronomically large.
//!
//! # Example
//!
//! ```
//! use regex_enumerate::{AllStrings, BigUint};
//!
//! let words = AllStrings::new("foo|ba[rz]")?;
//! assert_eq!(words.len(), &BigUint::from(3u32));
//! assert_eq!(words.iter().collect::<Vec<_>>(), ["foo", "bar", "baz"]);
//! assert!(words.contains("baz"));
//! assert_eq!(words.get(-1)?, "baz");
//! # Ok::<(), regex_enumerate::Error>(())
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;

use indexmap::IndexSet;
use num_traits::{One, Pow, Signed, ToPrimitive, Zero};

/// Re-export so users do not need a direct `num-bigint` dependency.
pub use num_bigint::{BigInt, BigUint};

/// Finite substitute for unbounded repetition: `*` compiles as
/// `{0, max_count}` and `+` as `{1, max_count}`.
pub const DEFAULT_MAX_COUNT: u32 = 65535;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// An error surfaced while compiling a pattern or indexing into its space.
#[derive(Debug)]
pub enum Error {
    /// The pattern text could not be parsed. `pos` is the character
    /// position the parser stopped at.
    Parse { pos: usize, message: String },
    /// The pattern parsed, but contains a construct the enumeration
    /// algebra cannot represent (a look-around, or a backreference whose
    /// capture is not single-valued per index).
    Unsupported(String),
    /// `get` was called with an index outside `[-length, length)`.
    IndexOutOfRange { index: BigInt, length: BigUint },
    /// A slice was requested with a step of zero.
    ZeroStep,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse { pos, message } => {
                write!(f, "parse error at position {}: {}", pos, message)
            }
            Self::Unsupported(message) => {
                write!(f, "unsupported construct: {}", message)
            }
            Self::IndexOutOfRange { index, length } => {
                write!(f, "index {} out of range for length {}", index, length)
            }
            Self::ZeroStep => write!(f, "slice step cannot be zero"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// How anchor atoms (`^`, `$`, `\A`, `\Z`, `\b`, `\B`) compile.
///
/// Enumeration is full-match end-to-end, so anchors can never *constrain*
/// anything; the only question is whether their presence empties the space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnchorPolicy {
    /// Any anchor becomes the empty language: `foo$` has length 0.
    MatchNothing,
    /// A leading `^`/`\A` and a trailing `$`/`\Z` of the whole pattern
    /// (looked for through the top-level alternation and the outermost
    /// concatenation) are dropped as no-ops, since full-match semantics
    /// make them redundant. Anchors anywhere else still empty the space.
    AbsorbOuter,
}

/// Configuration accepted by [`AllStrings::with_options`] and
/// [`AllMatches::with_options`].
#[derive(Clone, Debug)]
pub struct Options {
    /// The alphabet: the set of code points considered by `.`, negated
    /// classes and category escapes. Defaults to the 256 code points
    /// U+0000..=U+00FF.
    pub charset: String,
    /// Upper bound substituted for unbounded repetition operators.
    pub max_count: u32,
    /// When false (the default), `.` and negated classes exclude `'\n'`.
    pub dotall: bool,
    /// Anchor handling; see [`AnchorPolicy`].
    pub anchors: AnchorPolicy,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            charset: (0u32..=255).filter_map(char::from_u32).collect(),
            max_count: DEFAULT_MAX_COUNT,
            dotall: false,
            anchors: AnchorPolicy::MatchNothing,
        }
    }
}

// ---------------------------------------------------------------------------
// Pattern syntax tree
// ---------------------------------------------------------------------------

/// One node of the parsed pattern.
///
/// The parser resolves group numbering (opening-parenthesis order) and
/// named-group references, so the compiler only ever sees numeric group
/// indices.
#[derive(Clone, Debug)]
enum Ast {
    /// A single literal character (adjacent literals are merged later).
    Literal(char),
    /// The `.` metacharacter.
    Any,
    /// A bracket expression `[...]` / `[^...]`, items in written order.
    Class { negated: bool, items: Vec<ClassItem> },
    Concat(Vec<Ast>),
    Alternate(Vec<Ast>),
    /// `hi` is `None` for `*`, `+` and `{m,}`; the compiler substitutes
    /// the configured ceiling.
    Repeat {
        lo: u32,
        hi: Option<u32>,
        sub: Box<Ast>,
    },
    /// A capturing group. Non-capturing `(?:...)` groups are transparent
    /// and never produce a node.
    Group { index: u32, sub: Box<Ast> },
    Backref(u32),
    Assert(AssertKind),
    /// A look-around. Parsed so the cursor stays in sync, rejected by the
    /// compiler.
    Look(LookKind),
}

#[derive(Clone, Copy, Debug)]
enum ClassItem {
    Char(char),
    /// Inclusive range, `start <= end`.
    Range(char, char),
    Category(Category),
}

/// A category escape: `\d`, `\D`, `\w`, `\W`, `\s`, `\S`.
#[derive(Clone, Copy, Debug)]
enum Category {
    Digit,
    NotDigit,
    Word,
    NotWord,
    Space,
    NotSpace,
}

impl Category {
    fn matches(self, c: char) -> bool {
        match self {
            Category::Digit => c.is_ascii_digit(),
            Category::NotDigit => !c.is_ascii_digit(),
            Category::Word => is_word_char(c),
            Category::NotWord => !is_word_char(c),
            Category::Space => is_space_char(c),
            Category::NotSpace => !is_space_char(c),
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_space_char(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c')
}

#[derive(Clone, Copy, Debug)]
enum AssertKind {
    Start,
    End,
    TextStart,
    TextEnd,
    WordBoundary,
    NotWordBoundary,
}

#[derive(Clone, Copy, Debug)]
enum LookKind {
    Ahead,
    AheadNegative,
    Behind,
    BehindNegative,
}

impl LookKind {
    fn describe(self) -> &'static str {
        match self {
            LookKind::Ahead => "look-ahead assertion",
            LookKind::AheadNegative => "negative look-ahead assertion",
            LookKind::Behind => "look-behind assertion",
            LookKind::BehindNegative => "negative look-behind assertion",
        }
    }
}

/// Parser output: the tree plus the capture-group bookkeeping the facade
/// needs.
#[derive(Debug)]
struct Parsed {
    ast: Ast,
    group_count: u32,
    group_names: Vec<(String, u32)>,
}

// ---------------------------------------------------------------------------
// Pattern parser
// ---------------------------------------------------------------------------

/// Recursive-descent parser over the pattern text.
///
/// Group numbers are assigned in opening-parenthesis order, which is also
/// the pre-order the compiler later walks, so `\1` always refers to the
/// first `(` seen.
struct Parser {
    chars: Vec<char>,
    pos: usize,
    groups: u32,
    names: Vec<(String, u32)>,
}

fn parse(pattern: &str) -> Result<Parsed, Error> {
    let mut parser = Parser {
        chars: pattern.chars().collect(),
        pos: 0,
        groups: 0,
        names: Vec::new(),
    };
    let ast = parser.parse_alternation()?;
    if parser.pos != parser.chars.len() {
        return Err(parser.error("unbalanced parenthesis"));
    }
    Ok(Parsed {
        ast,
        group_count: parser.groups,
        group_names: parser.names,
    })
}

impl Parser {
    fn error(&self, message: &str) -> Error {
        Error::Parse {
            pos: self.pos,
            message: message.to_string(),
        }
    }

    #[inline]
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    #[inline]
    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    #[inline]
    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    #[inline]
    fn eat(&mut self, want: char) -> bool {
        if self.peek() == Some(want) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, want: char) -> Result<(), Error> {
        if self.eat(want) {
            Ok(())
        } else {
            Err(self.error(&format!("expected `{}`", want)))
        }
    }

    fn parse_alternation(&mut self) -> Result<Ast, Error> {
        let mut arms = vec![self.parse_concat()?];
        while self.eat('|') {
            arms.push(self.parse_concat()?);
        }
        Ok(if arms.len() == 1 {
            arms.remove(0)
        } else {
            Ast::Alternate(arms)
        })
    }

    fn parse_concat(&mut self) -> Result<Ast, Error> {
        let mut items = Vec::new();
        loop {
            match self.peek() {
                None | Some('|') | Some(')') => break,
                Some(_) => {}
            }
            let atom = self.parse_atom()?;
            items.push(self.parse_quantifier(atom)?);
        }
        Ok(if items.len() == 1 {
            items.remove(0)
        } else {
            Ast::Concat(items)
        })
    }

    /// Parse an optional quantifier following `atom`, consuming a lazy
    /// `?` marker (which has no effect on enumeration order).
    fn parse_quantifier(&mut self, atom: Ast) -> Result<Ast, Error> {
        let (lo, hi) = match self.peek() {
            Some('*') => {
                self.pos += 1;
                (0, None)
            }
            Some('+') => {
                self.pos += 1;
                (1, None)
            }
            Some('?') => {
                self.pos += 1;
                (0, Some(1))
            }
            Some('{') => match self.try_counted()? {
                Some(bounds) => bounds,
                None => return Ok(atom),
            },
            _ => return Ok(atom),
        };
        // Lazy marker: `a*?` enumerates exactly like `a*`.
        self.eat('?');
        match self.peek() {
            Some('*') | Some('+') | Some('?') => return Err(self.error("multiple repeat")),
            Some('{') => {
                if self.try_counted()?.is_some() {
                    return Err(self.error("multiple repeat"));
                }
            }
            _ => {}
        }
        Ok(Ast::Repeat {
            lo,
            hi,
            sub: Box::new(atom),
        })
    }

    /// Attempt to parse `{m}`, `{m,}`, `{,n}` or `{m,n}` with the cursor
    /// on `{`. Restores the cursor and returns `None` when the braces do
    /// not form a counted repetition (the `{` is then an ordinary
    /// literal, as in `a{x`).
    fn try_counted(&mut self) -> Result<Option<(u32, Option<u32>)>, Error> {
        let save = self.pos;
        self.pos += 1; // '{'
        let lo_digits = self.take_digits();
        let lo;
        let hi;
        if self.eat(',') {
            let hi_digits = self.take_digits();
            if !self.eat('}') || (lo_digits.is_empty() && hi_digits.is_empty()) {
                self.pos = save;
                return Ok(None);
            }
            lo = if lo_digits.is_empty() {
                0
            } else {
                parse_count(&lo_digits).ok_or_else(|| self.error("repeat count too large"))?
            };
            hi = if hi_digits.is_empty() {
                None
            } else {
                Some(parse_count(&hi_digits).ok_or_else(|| self.error("repeat count too large"))?)
            };
        } else {
            if lo_digits.is_empty() || !self.eat('}') {
                self.pos = save;
                return Ok(None);
            }
            let n = parse_count(&lo_digits).ok_or_else(|| self.error("repeat count too large"))?;
            lo = n;
            hi = Some(n);
        }
        if let Some(h) = hi {
            if lo > h {
                return Err(self.error("min repeat greater than max repeat"));
            }
        }
        Ok(Some((lo, hi)))
    }

    fn take_digits(&mut self) -> String {
        let mut digits = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                digits.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        digits
    }

    fn parse_atom(&mut self) -> Result<Ast, Error> {
        match self.bump() {
            Some('(') => self.parse_group(),
            Some('[') => self.parse_class(),
            Some('.') => Ok(Ast::Any),
            Some('^') => Ok(Ast::Assert(AssertKind::Start)),
            Some('$') => Ok(Ast::Assert(AssertKind::End)),
            Some('*') | Some('+') | Some('?') => Err(self.error("nothing to repeat")),
            Some('\\') => self.parse_escape(),
            Some(c) => Ok(Ast::Literal(c)),
            None => Err(self.error("unexpected end of pattern")),
        }
    }

    /// Parse a group body with the cursor just past `(`.
    fn parse_group(&mut self) -> Result<Ast, Error> {
        if !self.eat('?') {
            self.groups += 1;
            let index = self.groups;
            let sub = self.parse_alternation()?;
            self.expect(')')?;
            return Ok(Ast::Group {
                index,
                sub: Box::new(sub),
            });
        }
        match self.bump() {
            Some(':') => {
                let sub = self.parse_alternation()?;
                self.expect(')')?;
                Ok(sub)
            }
            Some('=') => self.parse_look(LookKind::Ahead),
            Some('!') => self.parse_look(LookKind::AheadNegative),
            Some('<') => match self.bump() {
                Some('=') => self.parse_look(LookKind::Behind),
                Some('!') => self.parse_look(LookKind::BehindNegative),
                _ => Err(self.error("unknown extension `(?<`")),
            },
            Some('P') => match self.bump() {
                Some('<') => {
                    let name = self.parse_group_name('>')?;
                    if self.names.iter().any(|(n, _)| n == &name) {
                        return Err(self.error("redefinition of group name"));
                    }
                    self.groups += 1;
                    let index = self.groups;
                    self.names.push((name, index));
                    let sub = self.parse_alternation()?;
                    self.expect(')')?;
                    Ok(Ast::Group {
                        index,
                        sub: Box::new(sub),
                    })
                }
                Some('=') => {
                    let name = self.parse_group_name(')')?;
                    match self.names.iter().find(|(n, _)| n == &name) {
                        Some((_, index)) => Ok(Ast::Backref(*index)),
                        None => Err(self.error("unknown group name")),
                    }
                }
                _ => Err(self.error("unknown extension `(?P`")),
            },
            _ => Err(self.error("unknown extension")),
        }
    }

    /// The body of a look-around is parsed (so groups inside it keep
    /// their numbers and the cursor stays in sync) and discarded; only
    /// the marker survives for the compiler to reject.
    fn parse_look(&mut self, kind: LookKind) -> Result<Ast, Error> {
        self.parse_alternation()?;
        self.expect(')')?;
        Ok(Ast::Look(kind))
    }

    fn parse_group_name(&mut self, terminator: char) -> Result<String, Error> {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                name.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        if name.is_empty() {
            return Err(self.error("missing group name"));
        }
        self.expect(terminator)?;
        Ok(name)
    }

    /// Parse a bracket expression with the cursor just past `[`.
    fn parse_class(&mut self) -> Result<Ast, Error> {
        let negated = self.eat('^');
        let mut items = Vec::new();
        // `]` directly after `[` or `[^` is an ordinary member.
        if self.eat(']') {
            items.push(ClassItem::Char(']'));
        }
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated character set")),
                Some(']') => {
                    self.pos += 1;
                    break;
                }
                Some(_) => {}
            }
            let first = self.parse_class_atom()?;
            if self.peek() == Some('-') && !matches!(self.peek_at(1), None | Some(']')) {
                self.pos += 1; // '-'
                let second = self.parse_class_atom()?;
                match (first, second) {
                    (ClassAtom::Char(a), ClassAtom::Char(b)) if a <= b => {
                        items.push(ClassItem::Range(a, b));
                    }
                    _ => return Err(self.error("bad character range")),
                }
            } else {
                items.push(match first {
                    ClassAtom::Char(c) => ClassItem::Char(c),
                    ClassAtom::Category(category) => ClassItem::Category(category),
                });
            }
        }
        Ok(Ast::Class { negated, items })
    }

    fn parse_class_atom(&mut self) -> Result<ClassAtom, Error> {
        match self.bump() {
            Some('\\') => self.parse_class_escape(),
            Some(c) => Ok(ClassAtom::Char(c)),
            None => Err(self.error("unterminated character set")),
        }
    }

    fn parse_class_escape(&mut self) -> Result<ClassAtom, Error> {
        match self.bump() {
            None => Err(self.error("bad escape at end of pattern")),
            Some('d') => Ok(ClassAtom::Category(Category::Digit)),
            Some('D') => Ok(ClassAtom::Category(Category::NotDigit)),
            Some('w') => Ok(ClassAtom::Category(Category::Word)),
            Some('W') => Ok(ClassAtom::Category(Category::NotWord)),
            Some('s') => Ok(ClassAtom::Category(Category::Space)),
            Some('S') => Ok(ClassAtom::Category(Category::NotSpace)),
            // Inside a class `\b` is a backspace, not a word boundary.
            Some('b') => Ok(ClassAtom::Char('\x08')),
            Some(c) => self.escape_char(c).map(ClassAtom::Char),
        }
    }

    /// Parse an escape with the cursor just past `\`.
    fn parse_escape(&mut self) -> Result<Ast, Error> {
        let class_of = |category| Ast::Class {
            negated: false,
            items: vec![ClassItem::Category(category)],
        };
        match self.bump() {
            None => Err(self.error("bad escape at end of pattern")),
            Some('d') => Ok(class_of(Category::Digit)),
            Some('D') => Ok(class_of(Category::NotDigit)),
            Some('w') => Ok(class_of(Category::Word)),
            Some('W') => Ok(class_of(Category::NotWord)),
            Some('s') => Ok(class_of(Category::Space)),
            Some('S') => Ok(class_of(Category::NotSpace)),
            Some('b') => Ok(Ast::Assert(AssertKind::WordBoundary)),
            Some('B') => Ok(Ast::Assert(AssertKind::NotWordBoundary)),
            Some('A') => Ok(Ast::Assert(AssertKind::TextStart)),
            Some('Z') => Ok(Ast::Assert(AssertKind::TextEnd)),
            Some(c @ '1'..='9') => {
                let mut digits = String::new();
                digits.push(c);
                while let Some(d) = self.peek() {
                    if d.is_ascii_digit() {
                        digits.push(d);
                        self.pos += 1;
                    } else {
                        break;
                    }
                }
                match digits.parse::<u32>() {
                    Ok(n) if n >= 1 && n <= self.groups => Ok(Ast::Backref(n)),
                    _ => Err(self.error("invalid group reference")),
                }
            }
            Some(c) => self.escape_char(c).map(Ast::Literal),
        }
    }

    /// Escapes shared between the top level and classes: control
    /// characters, `\xHH`, and identity escapes for punctuation.
    fn escape_char(&mut self, c: char) -> Result<char, Error> {
        match c {
            'n' => Ok('\n'),
            't' => Ok('\t'),
            'r' => Ok('\r'),
            'f' => Ok('\x0c'),
            'v' => Ok('\x0b'),
            'a' => Ok('\x07'),
            '0' => Ok('\0'),
            'x' => {
                let high = self.bump().filter(char::is_ascii_hexdigit);
                let low = self.bump().filter(char::is_ascii_hexdigit);
                match (high, low) {
                    (Some(h), Some(l)) => {
                        let value = hex_value(h) * 16 + hex_value(l);
                        char::from_u32(value).ok_or_else(|| self.error("bad hex escape"))
                    }
                    _ => Err(self.error("incomplete hex escape")),
                }
            }
            c if !c.is_alphanumeric() => Ok(c),
            _ => Err(self.error(&format!("bad escape \\{}", c))),
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum ClassAtom {
    Char(char),
    Category(Category),
}

fn parse_count(digits: &str) -> Option<u32> {
    digits.parse::<u32>().ok()
}

fn hex_value(c: char) -> u32 {
    c.to_digit(16).unwrap_or(0)
}

/// Drop a leading `^`/`\A` and a trailing `$`/`\Z` of the whole pattern,
/// looking through the top-level alternation and the outermost
/// concatenation. Used by [`AnchorPolicy::AbsorbOuter`].
fn strip_outer_anchors(ast: Ast) -> Ast {
    match ast {
        Ast::Assert(AssertKind::Start | AssertKind::TextStart) => Ast::Concat(Vec::new()),
        Ast::Assert(AssertKind::End | AssertKind::TextEnd) => Ast::Concat(Vec::new()),
        Ast::Alternate(arms) => {
            Ast::Alternate(arms.into_iter().map(strip_outer_anchors).collect())
        }
        Ast::Concat(mut items) => {
            while matches!(
                items.first(),
                Some(Ast::Assert(AssertKind::Start | AssertKind::TextStart))
            ) {
                items.remove(0);
            }
            while matches!(
                items.last(),
                Some(Ast::Assert(AssertKind::End | AssertKind::TextEnd))
            ) {
                items.pop();
            }
            Ast::Concat(items)
        }
        other => other,
    }
}

// ---------------------------------------------------------------------------
// Character classes
// ---------------------------------------------------------------------------

/// A computed set of code points: deduplicated, in ascending ordinal
/// order. Indexed access enumerates the set in that order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CharClass {
    chars: Vec<char>,
}

impl CharClass {
    fn new(chars: impl IntoIterator<Item = char>) -> CharClass {
        let mut chars: Vec<char> = chars.into_iter().collect();
        chars.sort_unstable();
        chars.dedup();
        CharClass { chars }
    }

    #[inline]
    fn len(&self) -> usize {
        self.chars.len()
    }

    #[inline]
    fn get(&self, index: usize) -> char {
        self.chars[index]
    }

    fn contains(&self, c: char) -> bool {
        self.chars.binary_search(&c).is_ok()
    }
}

/// Index into the class side table ([`Language::classes`]).
///
/// Identical classes are deduplicated during compilation, so patterns
/// like `\d-\d` share a single table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct ClassIdx(usize);

// ---------------------------------------------------------------------------
// The compiled space tree
// ---------------------------------------------------------------------------

/// Index identifying a node within one compiled tree, assigned in
/// compilation order. Used to key the membership memo table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct NodeId(u32);

/// One node of the compiled tree: the set of strings accepted by one
/// sub-pattern, with the derived data every operation needs precomputed.
#[derive(Debug)]
struct Node {
    id: NodeId,
    /// Cardinality of the set.
    len: BigUint,
    /// `Some(w)` iff every member has exactly `w` code points. Enables
    /// deterministic splits during membership tests.
    width: Option<u64>,
    /// Least member width in code points (saturating).
    min_width: u64,
    /// Greatest member width in code points (saturating).
    max_width: u64,
    /// Whether the subtree contains a capturing group or backreference.
    has_captures: bool,
    kind: Kind,
}

#[derive(Debug)]
enum Kind {
    /// The empty language: no strings at all. Produced by anchors and by
    /// classes that resolve to nothing.
    Empty,
    /// Exactly one string.
    Literal(String),
    /// One string per code point in the class, ascending.
    Class(ClassIdx),
    /// Cartesian product of the children, in sequence. The index is a
    /// mixed-radix number in child-cardinality digits, rightmost child
    /// fastest-varying.
    Concat(Vec<Node>),
    /// Disjoint union of the arms, in order. `sums` holds the cumulative
    /// cardinalities, one entry per arm, for binary-search dispatch.
    Branch { arms: Vec<Node>, sums: Vec<BigUint> },
    /// Between `lo` and `hi` concatenated picks from `inner`, shorter
    /// counts first.
    Repeat {
        inner: Box<Node>,
        lo: u32,
        hi: u32,
    },
    /// Same strings as `inner`; additionally records the span it
    /// contributed to the output under the group's index.
    Group { index: u32, inner: Box<Node> },
    /// Emits the text captured by an earlier group at the same index;
    /// contributes no index dimension of its own.
    Backref(u32),
}

/// `Σ_{k=lo..=hi} base^k`, with `0^0 = 1`.
///
/// For `base >= 2` this is the closed form
/// `(base^(hi+1) - base^lo) / (base - 1)`, so cardinalities of deep
/// repetitions cost O(log hi) big-integer multiplications.
fn power_sum(base: &BigUint, lo: u32, hi: u32) -> BigUint {
    debug_assert!(lo <= hi);
    if base.is_zero() {
        return if lo == 0 {
            BigUint::one()
        } else {
            BigUint::zero()
        };
    }
    if base.is_one() {
        return BigUint::from(u64::from(hi - lo) + 1);
    }
    let top = Pow::pow(base, u64::from(hi) + 1);
    let bottom = Pow::pow(base, u64::from(lo));
    (top - bottom) / (base - 1u32)
}

// ---------------------------------------------------------------------------
// Compiler: Ast -> Node tree
// ---------------------------------------------------------------------------

/// Builds the compiled tree bottom-up, interning character classes and
/// tracking which capture groups a backreference may legally refer to.
struct LanguageBuilder {
    /// The configured alphabet, sorted ascending, deduplicated.
    sigma: Vec<char>,
    /// The alphabet used by `.` and negated classes: `sigma`, minus
    /// `'\n'` unless dotall is set.
    sigma_dot: Vec<char>,
    max_count: u32,
    classes: IndexSet<CharClass>,
    next_node: u32,
    /// Width data of each closed group, by group index - 1.
    group_widths: Vec<Option<(Option<u64>, u64, u64)>>,
    /// Groups a backreference may refer to at the current point of the
    /// traversal. Alternation arms and repetition bodies restore the
    /// entry snapshot, so groups defined inside them are not available
    /// afterwards — exactly the forms whose capture would be absent or
    /// multi-valued per enumeration index.
    available: Vec<bool>,
    has_backref: bool,
}

impl LanguageBuilder {
    fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        id
    }

    fn compile(&mut self, ast: &Ast) -> Result<Node, Error> {
        match ast {
            Ast::Literal(c) => Ok(self.literal(c.to_string())),
            Ast::Any => {
                let set = CharClass::new(self.sigma_dot.iter().copied());
                Ok(self.class(set))
            }
            Ast::Class { negated, items } => Ok(self.compile_class(*negated, items)),
            Ast::Concat(items) => {
                let mut nodes = Vec::with_capacity(items.len());
                for item in items {
                    nodes.push(self.compile(item)?);
                }
                Ok(self.concat(nodes))
            }
            Ast::Alternate(arms) => {
                let snapshot = self.available.clone();
                let mut nodes = Vec::with_capacity(arms.len());
                for arm in arms {
                    self.available.copy_from_slice(&snapshot);
                    nodes.push(self.compile(arm)?);
                }
                self.available = snapshot;
                Ok(self.branch(nodes))
            }
            Ast::Repeat { lo, hi, sub } => {
                let lo = *lo;
                let hi = match hi {
                    Some(h) => *h,
                    None => self.max_count.max(lo),
                };
                let snapshot = self.available.clone();
                let inner = self.compile(sub)?;
                self.available = snapshot;
                Ok(self.repeat(inner, lo, hi))
            }
            Ast::Group { index, sub } => {
                let inner = self.compile(sub)?;
                Ok(self.group(*index, inner))
            }
            Ast::Backref(group) => {
                let idx = *group as usize - 1;
                if !self.available.get(idx).copied().unwrap_or(false) {
                    return Err(Error::Unsupported(format!(
                        "backreference \\{} does not follow a completed group \
                         with a single capture per index",
                        group
                    )));
                }
                self.has_backref = true;
                Ok(self.backref(*group))
            }
            Ast::Assert(_) => Ok(self.empty()),
            Ast::Look(kind) => Err(Error::Unsupported(kind.describe().to_string())),
        }
    }

    fn compile_class(&mut self, negated: bool, items: &[ClassItem]) -> Node {
        if negated {
            let mut excluded = HashSet::new();
            for item in items {
                match *item {
                    ClassItem::Char(c) => {
                        excluded.insert(c);
                    }
                    ClassItem::Range(a, b) => excluded.extend(a..=b),
                    ClassItem::Category(category) => {
                        excluded.extend(self.category_chars(category));
                    }
                }
            }
            let set = CharClass::new(
                self.sigma_dot
                    .iter()
                    .copied()
                    .filter(|c| !excluded.contains(c)),
            );
            return self.class(set);
        }
        // A positive bracket expression enumerates its items in written
        // order, duplicates and all: `[aa]` has length 2.
        let mut arms = Vec::with_capacity(items.len());
        for item in items {
            arms.push(match *item {
                ClassItem::Char(c) => self.literal(c.to_string()),
                ClassItem::Range(a, b) => self.class(CharClass::new(a..=b)),
                ClassItem::Category(category) => {
                    let chars = self.category_chars(category);
                    self.class(CharClass::new(chars))
                }
            });
        }
        self.branch(arms)
    }

    /// The members of a category escape within the configured alphabet.
    fn category_chars(&self, category: Category) -> Vec<char> {
        self.sigma
            .iter()
            .copied()
            .filter(|&c| category.matches(c))
            .collect()
    }

    fn empty(&mut self) -> Node {
        Node {
            id: self.next_id(),
            len: BigUint::zero(),
            width: None,
            min_width: 0,
            max_width: 0,
            has_captures: false,
            kind: Kind::Empty,
        }
    }

    fn literal(&mut self, text: String) -> Node {
        let width = text.chars().count() as u64;
        Node {
            id: self.next_id(),
            len: BigUint::one(),
            width: Some(width),
            min_width: width,
            max_width: width,
            has_captures: false,
            kind: Kind::Literal(text),
        }
    }

    fn class(&mut self, set: CharClass) -> Node {
        let size = set.len();
        let (index, _) = self.classes.insert_full(set);
        Node {
            id: self.next_id(),
            len: BigUint::from(size),
            width: Some(1),
            min_width: 1,
            max_width: 1,
            has_captures: false,
            kind: Kind::Class(ClassIdx(index)),
        }
    }

    fn concat(&mut self, nodes: Vec<Node>) -> Node {
        // Adjacent literals collapse into one, so `foo` is a single node.
        let mut children: Vec<Node> = Vec::with_capacity(nodes.len());
        for node in nodes {
            if let Kind::Literal(text) = &node.kind {
                if let Some(last) = children.last_mut() {
                    if let Kind::Literal(prev) = &mut last.kind {
                        prev.push_str(text);
                        let width = prev.chars().count() as u64;
                        last.width = Some(width);
                        last.min_width = width;
                        last.max_width = width;
                        continue;
                    }
                }
            }
            children.push(node);
        }
        if children.is_empty() {
            return self.literal(String::new());
        }
        if children.len() == 1 {
            return children.remove(0);
        }
        let mut len = BigUint::one();
        let mut width = Some(0u64);
        let mut min_width = 0u64;
        let mut max_width = 0u64;
        let mut has_captures = false;
        for child in &children {
            len *= &child.len;
            width = match (width, child.width) {
                (Some(a), Some(b)) => Some(a.saturating_add(b)),
                _ => None,
            };
            min_width = min_width.saturating_add(child.min_width);
            max_width = max_width.saturating_add(child.max_width);
            has_captures |= child.has_captures;
        }
        Node {
            id: self.next_id(),
            len,
            width,
            min_width,
            max_width,
            has_captures,
            kind: Kind::Concat(children),
        }
    }

    fn branch(&mut self, mut arms: Vec<Node>) -> Node {
        if arms.len() == 1 {
            return arms.remove(0);
        }
        if arms.is_empty() {
            return self.empty();
        }
        let mut sums = Vec::with_capacity(arms.len());
        let mut total = BigUint::zero();
        let mut width = arms.first().and_then(|arm| arm.width);
        let mut min_width = u64::MAX;
        let mut max_width = 0u64;
        let mut has_captures = false;
        for arm in &arms {
            total += &arm.len;
            sums.push(total.clone());
            if arm.width != width {
                width = None;
            }
            min_width = min_width.min(arm.min_width);
            max_width = max_width.max(arm.max_width);
            has_captures |= arm.has_captures;
        }
        Node {
            id: self.next_id(),
            len: total,
            width,
            min_width,
            max_width,
            has_captures,
            kind: Kind::Branch { arms, sums },
        }
    }

    fn repeat(&mut self, inner: Node, lo: u32, hi: u32) -> Node {
        debug_assert!(lo <= hi);
        let len = power_sum(&inner.len, lo, hi);
        let zero_inner = inner.len.is_zero();
        let width = if zero_inner || inner.width == Some(0) {
            // Only the empty string (at most) survives.
            Some(0)
        } else if lo == hi {
            inner.width.map(|w| w.saturating_mul(u64::from(lo)))
        } else {
            None
        };
        let (min_width, max_width) = if zero_inner {
            (0, 0)
        } else {
            (
                inner.min_width.saturating_mul(u64::from(lo)),
                inner.max_width.saturating_mul(u64::from(hi)),
            )
        };
        let has_captures = inner.has_captures;
        Node {
            id: self.next_id(),
            len,
            width,
            min_width,
            max_width,
            has_captures,
            kind: Kind::Repeat {
                inner: Box::new(inner),
                lo,
                hi,
            },
        }
    }

    fn group(&mut self, index: u32, inner: Node) -> Node {
        self.group_widths[index as usize - 1] =
            Some((inner.width, inner.min_width, inner.max_width));
        self.available[index as usize - 1] = true;
        Node {
            id: self.next_id(),
            len: inner.len.clone(),
            width: inner.width,
            min_width: inner.min_width,
            max_width: inner.max_width,
            has_captures: true,
            kind: Kind::Group {
                index,
                inner: Box::new(inner),
            },
        }
    }

    fn backref(&mut self, group: u32) -> Node {
        let Some(Some((width, min_width, max_width))) =
            self.group_widths.get(group as usize - 1).copied()
        else {
            unreachable!("backreference compiled before its group")
        };
        Node {
            id: self.next_id(),
            len: BigUint::one(),
            width,
            min_width,
            max_width,
            has_captures: true,
            kind: Kind::Backref(group),
        }
    }
}

// ---------------------------------------------------------------------------
// The compiled language
// ---------------------------------------------------------------------------

/// A fully compiled pattern: the node tree plus its side tables. Immutable
/// after construction — `render` and `matches` keep all working state on
/// the stack, so one `Language` may serve many threads concurrently.
#[derive(Debug)]
struct Language {
    root: Node,
    classes: Vec<CharClass>,
    group_count: u32,
    group_names: Vec<(String, u32)>,
    has_backref: bool,
}

impl Language {
    fn build(pattern: &str, options: &Options) -> Result<Language, Error> {
        let parsed = parse(pattern)?;
        let group_count = parsed.group_count;
        let group_names = parsed.group_names;
        let ast = if options.anchors == AnchorPolicy::AbsorbOuter {
            strip_outer_anchors(parsed.ast)
        } else {
            parsed.ast
        };
        let mut sigma: Vec<char> = options.charset.chars().collect();
        sigma.sort_unstable();
        sigma.dedup();
        let sigma_dot: Vec<char> = if options.dotall {
            sigma.clone()
        } else {
            sigma.iter().copied().filter(|&c| c != '\n').collect()
        };
        let mut builder = LanguageBuilder {
            sigma,
            sigma_dot,
            max_count: options.max_count,
            classes: IndexSet::new(),
            next_node: 0,
            group_widths: vec![None; group_count as usize],
            available: vec![false; group_count as usize],
            has_backref: false,
        };
        let root = builder.compile(&ast)?;
        Ok(Language {
            root,
            classes: builder.classes.into_iter().collect(),
            group_count,
            group_names,
            has_backref: builder.has_backref,
        })
    }

    #[inline]
    fn len(&self) -> &BigUint {
        &self.root.len
    }

    /// Produce the `index`-th string together with the byte span each
    /// capturing group contributed. `index` must be in range.
    fn render(&self, index: &BigUint) -> (String, Vec<Option<(usize, usize)>>) {
        let mut out = String::new();
        let mut caps = vec![None; self.group_count as usize];
        self.emit(&self.root, index.clone(), &mut out, &mut caps);
        (out, caps)
    }

    fn emit(
        &self,
        node: &Node,
        index: BigUint,
        out: &mut String,
        caps: &mut Vec<Option<(usize, usize)>>,
    ) {
        debug_assert!(index < node.len);
        match &node.kind {
            Kind::Empty => unreachable!("the empty language has no strings"),
            Kind::Literal(text) => out.push_str(text),
            Kind::Class(class) => {
                let Some(i) = index.to_usize() else {
                    unreachable!("class index exceeds usize")
                };
                out.push(self.classes[class.0].get(i));
            }
            Kind::Concat(children) => {
                // Mixed-radix decomposition, rightmost digit first; the
                // pieces are then emitted in left-to-right order.
                let mut digits = Vec::with_capacity(children.len());
                let mut rest = index;
                for child in children.iter().rev() {
                    digits.push(&rest % &child.len);
                    rest /= &child.len;
                }
                for (child, digit) in children.iter().zip(digits.into_iter().rev()) {
                    self.emit(child, digit, out, caps);
                }
            }
            Kind::Branch { arms, sums } => {
                let arm = sums.partition_point(|sum| sum <= &index);
                let base = if arm == 0 {
                    BigUint::zero()
                } else {
                    sums[arm - 1].clone()
                };
                self.emit(&arms[arm], index - base, out, caps);
            }
            Kind::Repeat { inner, lo, hi } => {
                let (count, residual) = locate_count(&inner.len, *lo, *hi, index);
                // Digits of the residual in base |inner|, least
                // significant first; missing leading digits are zero.
                let mut digits: Vec<BigUint> = Vec::new();
                let mut rest = residual;
                if inner.len > BigUint::one() {
                    while !rest.is_zero() {
                        digits.push(&rest % &inner.len);
                        rest /= &inner.len;
                    }
                }
                digits.resize(count, BigUint::zero());
                for digit in digits.into_iter().rev() {
                    self.emit(inner, digit, out, caps);
                }
            }
            Kind::Group { index: group, inner } => {
                let start = out.len();
                self.emit(inner, index, out, caps);
                caps[*group as usize - 1] = Some((start, out.len()));
            }
            Kind::Backref(group) => {
                let Some((start, end)) = caps[*group as usize - 1] else {
                    unreachable!("backreference rendered before its group")
                };
                let piece = out[start..end].to_string();
                out.push_str(&piece);
            }
        }
    }
}

/// Locate the piece count a repetition index falls into. Returns the
/// count and the residual index within the `base^count` block.
///
/// For `base >= 2` the cumulative block sizes grow geometrically, so the
/// scan exits after O(log index) iterations.
fn locate_count(base: &BigUint, lo: u32, hi: u32, index: BigUint) -> (usize, BigUint) {
    if base.is_zero() {
        // Only the empty string exists, exactly once, at count zero.
        return (0, BigUint::zero());
    }
    if base.is_one() {
        let Some(offset) = index.to_u64() else {
            unreachable!("repeat count exceeds u64")
        };
        return (lo as usize + offset as usize, BigUint::zero());
    }
    let mut rest = index;
    let mut block = Pow::pow(base, u64::from(lo));
    let mut count = lo;
    while rest >= block {
        rest -= &block;
        block *= base;
        count += 1;
        debug_assert!(count <= hi);
    }
    (count as usize, rest)
}

// ---------------------------------------------------------------------------
// Membership
// ---------------------------------------------------------------------------

/// Per-call state of a membership test.
struct MatchContext<'a> {
    text: &'a str,
    /// Memo of `(node, byte range) -> matched`. Entries are only written
    /// for subtrees whose outcome cannot depend on capture state.
    memo: HashMap<(NodeId, usize, usize), bool>,
    /// Group captures as byte spans into `text`. `None` unless the tree
    /// contains a backreference; plain groups need no tracking here.
    caps: Option<Vec<Option<(usize, usize)>>>,
}

impl Language {
    /// Full-match membership: does some index render exactly `text`?
    ///
    /// Never fails: text outside the alphabet is simply not a member.
    fn contains(&self, text: &str) -> bool {
        let mut ctx = MatchContext {
            text,
            memo: HashMap::new(),
            caps: if self.has_backref {
                Some(vec![None; self.group_count as usize])
            } else {
                None
            },
        };
        self.matches(&self.root, 0, text.len(), &mut ctx)
    }

    fn matches(&self, node: &Node, lo: usize, hi: usize, ctx: &mut MatchContext<'_>) -> bool {
        let memoable = ctx.caps.is_none() || !node.has_captures;
        if memoable {
            if let Some(&hit) = ctx.memo.get(&(node.id, lo, hi)) {
                return hit;
            }
        }
        let text = ctx.text;
        let result = match &node.kind {
            Kind::Empty => false,
            Kind::Literal(want) => &text[lo..hi] == want.as_str(),
            Kind::Class(class) => {
                let mut chars = text[lo..hi].chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => self.classes[class.0].contains(c),
                    _ => false,
                }
            }
            Kind::Concat(children) => self.seq_matches(children, lo, hi, ctx),
            Kind::Branch { arms, .. } => {
                let saved = ctx.caps.clone();
                let mut hit = false;
                for arm in arms {
                    if self.matches(arm, lo, hi, ctx) {
                        hit = true;
                        break;
                    }
                    ctx.caps = saved.clone();
                }
                hit
            }
            Kind::Repeat {
                inner,
                lo: need_lo,
                hi: need_hi,
            } => self.repeat_matches(inner, *need_lo, *need_hi, lo, hi, ctx),
            Kind::Group { index, inner } => {
                if self.matches(inner, lo, hi, ctx) {
                    if let Some(caps) = ctx.caps.as_mut() {
                        caps[*index as usize - 1] = Some((lo, hi));
                    }
                    true
                } else {
                    false
                }
            }
            Kind::Backref(group) => {
                match ctx.caps.as_ref().and_then(|caps| caps[*group as usize - 1]) {
                    Some((start, end)) => text[start..end] == text[lo..hi],
                    None => false,
                }
            }
        };
        if memoable {
            ctx.memo.insert((node.id, lo, hi), result);
        }
        result
    }

    /// Split `text[lo..hi]` among a concatenation's children.
    ///
    /// A fixed-width head makes the split point deterministic; otherwise
    /// every candidate prefix within the head's width bounds is probed,
    /// pruned by what the remaining children can still cover.
    fn seq_matches(
        &self,
        children: &[Node],
        lo: usize,
        hi: usize,
        ctx: &mut MatchContext<'_>,
    ) -> bool {
        let Some((first, rest)) = children.split_first() else {
            return lo == hi;
        };
        if rest.is_empty() {
            return self.matches(first, lo, hi, ctx);
        }
        let text = ctx.text;
        let sub = &text[lo..hi];
        let total = sub.chars().count() as u64;
        let mut rest_min = 0u64;
        let mut rest_max = 0u64;
        for node in rest {
            rest_min = rest_min.saturating_add(node.min_width);
            rest_max = rest_max.saturating_add(node.max_width);
        }
        if let Some(want) = first.width {
            if want > total || total - want < rest_min || total - want > rest_max {
                return false;
            }
            let Some(mid) = advance(text, lo, hi, want) else {
                return false;
            };
            return self.matches(first, lo, mid, ctx) && self.seq_matches(rest, mid, hi, ctx);
        }
        let saved = ctx.caps.clone();
        for (take, offset) in boundaries(sub) {
            if take < first.min_width || take > first.max_width {
                continue;
            }
            let remaining = total - take;
            if remaining < rest_min || remaining > rest_max {
                continue;
            }
            let mid = lo + offset;
            if self.matches(first, lo, mid, ctx) && self.seq_matches(rest, mid, hi, ctx) {
                return true;
            }
            ctx.caps = saved.clone();
        }
        false
    }

    /// Split `text[lo..hi]` into between `need_lo` and `need_hi` pieces,
    /// each a full match of `inner`.
    fn repeat_matches(
        &self,
        inner: &Node,
        need_lo: u32,
        need_hi: u32,
        lo: usize,
        hi: usize,
        ctx: &mut MatchContext<'_>,
    ) -> bool {
        if lo == hi {
            // Any pieces still owed must all be empty.
            return need_lo == 0 || self.matches(inner, lo, hi, ctx);
        }
        if need_hi == 0 {
            return false;
        }
        let text = ctx.text;
        let sub = &text[lo..hi];
        let total = sub.chars().count() as u64;
        if let Some(want) = inner.width {
            // Fixed-width pieces: the count and every split point are
            // forced.
            if want == 0 || total % want != 0 {
                return false;
            }
            let pieces = total / want;
            if pieces < u64::from(need_lo) || pieces > u64::from(need_hi) {
                return false;
            }
            let mut at = lo;
            while at < hi {
                let Some(next) = advance(text, at, hi, want) else {
                    return false;
                };
                if !self.matches(inner, at, next, ctx) {
                    return false;
                }
                at = next;
            }
            return true;
        }
        let saved = ctx.caps.clone();
        for (take, offset) in boundaries(sub) {
            // An empty piece never advances anything; empty-matchable
            // remainders are handled by the base case above.
            if take == 0 {
                continue;
            }
            if take < inner.min_width || take > inner.max_width {
                continue;
            }
            let remaining = total - take;
            if remaining > u64::from(need_hi - 1).saturating_mul(inner.max_width) {
                continue;
            }
            let mid = lo + offset;
            if self.matches(inner, lo, mid, ctx)
                && self.repeat_matches(inner, need_lo.saturating_sub(1), need_hi - 1, mid, hi, ctx)
            {
                return true;
            }
            ctx.caps = saved.clone();
        }
        false
    }
}

/// Char-boundary positions of `s`: `(chars consumed, byte offset)` pairs
/// from `(0, 0)` through `(char count, byte length)`.
fn boundaries(s: &str) -> impl Iterator<Item = (u64, usize)> + '_ {
    std::iter::once((0, 0)).chain(
        s.char_indices()
            .enumerate()
            .map(|(k, (offset, c))| (k as u64 + 1, offset + c.len_utf8())),
    )
}

/// Byte offset after `count` chars starting at `lo`, when `text[lo..hi]`
/// holds at least that many.
fn advance(text: &str, lo: usize, hi: usize, count: u64) -> Option<usize> {
    boundaries(&text[lo..hi])
        .find(|&(k, _)| k == count)
        .map(|(_, offset)| lo + offset)
}

// ---------------------------------------------------------------------------
// Facade: AllStrings
// ---------------------------------------------------------------------------

/// Normalize a possibly negative index against `length`, Python style:
/// `-1` is the last member.
fn normalize_index(index: BigInt, length: &BigUint) -> Result<BigUint, Error> {
    let adjusted = if index.is_negative() {
        &index + BigInt::from(length.clone())
    } else {
        index.clone()
    };
    match adjusted.to_biguint() {
        Some(i) if &i < length => Ok(i),
        _ => Err(Error::IndexOutOfRange {
            index,
            length: length.clone(),
        }),
    }
}

/// The set of strings fully matched by a pattern, as a lazily indexed
/// sequence.
///
/// ```
/// use regex_enumerate::AllStrings;
///
/// let space = AllStrings::new("[0-9]{2}")?;
/// assert_eq!(space.get(42)?, "42");
/// assert!(space.contains("07"));
/// assert!(!space.contains("7"));
/// # Ok::<(), regex_enumerate::Error>(())
/// ```
#[derive(Debug)]
pub struct AllStrings {
    language: Language,
}

impl AllStrings {
    /// Compile `pattern` with default [`Options`].
    pub fn new(pattern: &str) -> Result<AllStrings, Error> {
        Self::with_options(pattern, &Options::default())
    }

    pub fn with_options(pattern: &str, options: &Options) -> Result<AllStrings, Error> {
        Ok(AllStrings {
            language: Language::build(pattern, options)?,
        })
    }

    /// Cardinality of the space. May exceed any machine integer.
    pub fn len(&self) -> &BigUint {
        self.language.len()
    }

    /// True when the pattern matches nothing at all.
    pub fn is_empty(&self) -> bool {
        self.language.len().is_zero()
    }

    /// The `index`-th string in enumeration order. Negative indices count
    /// from the end.
    pub fn get<I: Into<BigInt>>(&self, index: I) -> Result<String, Error> {
        let i = normalize_index(index.into(), self.language.len())?;
        Ok(self.language.render(&i).0)
    }

    /// Full-match membership test, by structural decomposition — the
    /// space is never enumerated.
    pub fn contains(&self, text: &str) -> bool {
        self.language.contains(text)
    }

    /// Iterate the strings in index order. Astronomically large spaces
    /// iterate forever; pair with `take` or a slice.
    pub fn iter(&self) -> Strings<'_> {
        Strings {
            language: &self.language,
            next: BigUint::zero(),
        }
    }

    /// A lazy view of every `step`-th string from `start` (inclusive) to
    /// `stop` (exclusive), Python slice semantics: `None` bounds default
    /// per step direction, negative bounds count from the end, a negative
    /// step walks backwards.
    pub fn slice(
        &self,
        start: Option<BigInt>,
        stop: Option<BigInt>,
        step: i64,
    ) -> Result<StringsSlice<'_>, Error> {
        let bounds = SliceBounds::compute(start, stop, step, self.language.len())?;
        Ok(StringsSlice {
            language: &self.language,
            bounds,
        })
    }
}

impl<'a> IntoIterator for &'a AllStrings {
    type Item = String;
    type IntoIter = Strings<'a>;

    fn into_iter(self) -> Strings<'a> {
        self.iter()
    }
}

/// Iterator over an [`AllStrings`] space in index order.
#[derive(Clone, Debug)]
pub struct Strings<'a> {
    language: &'a Language,
    next: BigUint,
}

impl Iterator for Strings<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if &self.next >= self.language.len() {
            return None;
        }
        let out = self.language.render(&self.next).0;
        self.next += 1u32;
        Some(out)
    }
}

// ---------------------------------------------------------------------------
// Slicing
// ---------------------------------------------------------------------------

/// Resolved Python-style slice bounds over an index space.
#[derive(Clone, Debug)]
struct SliceBounds {
    start: BigInt,
    step: BigInt,
    len: BigUint,
}

impl SliceBounds {
    fn compute(
        start: Option<BigInt>,
        stop: Option<BigInt>,
        step: i64,
        size: &BigUint,
    ) -> Result<SliceBounds, Error> {
        if step == 0 {
            return Err(Error::ZeroStep);
        }
        let size_int = BigInt::from(size.clone());
        let start = match start {
            Some(n) => Self::adjust(n, &size_int, size, step < 0)?,
            None if step > 0 => BigInt::zero(),
            None => &size_int - 1,
        };
        let stop = match stop {
            Some(n) => Self::adjust(n, &size_int, size, false)?,
            None if step > 0 => size_int.clone(),
            None => BigInt::from(-1),
        };
        let span = if step > 0 {
            &stop - &start
        } else {
            &start - &stop
        };
        let len = if span <= BigInt::zero() {
            BigUint::zero()
        } else {
            let abs_step = BigInt::from(step.unsigned_abs());
            let count = (&span + &abs_step - BigInt::from(1)) / &abs_step;
            match count.to_biguint() {
                Some(count) => count,
                None => unreachable!("slice length cannot be negative"),
            }
        };
        Ok(SliceBounds {
            start,
            step: BigInt::from(step),
            len,
        })
    }

    /// Adjust one slice bound: negative bounds count from the end (still
    /// negative after that is an index error), bounds past the end clamp.
    fn adjust(
        bound: BigInt,
        size: &BigInt,
        size_raw: &BigUint,
        clamp_to_last: bool,
    ) -> Result<BigInt, Error> {
        let mut adjusted = bound.clone();
        if adjusted.is_negative() {
            adjusted += size;
        }
        if adjusted.is_negative() {
            return Err(Error::IndexOutOfRange {
                index: bound,
                length: size_raw.clone(),
            });
        }
        let limit = if clamp_to_last { size - 1 } else { size.clone() };
        if adjusted > limit {
            adjusted = limit;
        }
        Ok(adjusted)
    }

    /// The underlying-space index of the `j`-th slice member.
    fn index(&self, j: &BigUint) -> BigUint {
        let index = &self.start + &self.step * BigInt::from(j.clone());
        match index.to_biguint() {
            Some(index) => index,
            None => unreachable!("slice member index cannot be negative"),
        }
    }
}

/// A lazy slice of an [`AllStrings`] space; nothing is materialized.
#[derive(Debug)]
pub struct StringsSlice<'a> {
    language: &'a Language,
    bounds: SliceBounds,
}

impl StringsSlice<'_> {
    pub fn len(&self) -> &BigUint {
        &self.bounds.len
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.len.is_zero()
    }

    pub fn get<I: Into<BigInt>>(&self, index: I) -> Result<String, Error> {
        let j = normalize_index(index.into(), &self.bounds.len)?;
        Ok(self.language.render(&self.bounds.index(&j)).0)
    }

    pub fn iter(&self) -> impl Iterator<Item = String> + '_ {
        let mut next = BigUint::zero();
        std::iter::from_fn(move || {
            if next >= self.bounds.len {
                return None;
            }
            let out = self.language.render(&self.bounds.index(&next)).0;
            next += 1u32;
            Some(out)
        })
    }
}

// ---------------------------------------------------------------------------
// Facade: AllMatches
// ---------------------------------------------------------------------------

/// Like [`AllStrings`], but `get` returns a [`Match`] carrying capture
/// groups.
///
/// ```
/// use regex_enumerate::AllMatches;
///
/// let space = AllMatches::new("a(\\d)b")?;
/// let m = space.get(7)?;
/// assert_eq!(m.group(0), Some("a7b"));
/// assert_eq!(m.group(1), Some("7"));
/// # Ok::<(), regex_enumerate::Error>(())
/// ```
#[derive(Debug)]
pub struct AllMatches {
    language: Language,
}

impl AllMatches {
    pub fn new(pattern: &str) -> Result<AllMatches, Error> {
        Self::with_options(pattern, &Options::default())
    }

    pub fn with_options(pattern: &str, options: &Options) -> Result<AllMatches, Error> {
        Ok(AllMatches {
            language: Language::build(pattern, options)?,
        })
    }

    pub fn len(&self) -> &BigUint {
        self.language.len()
    }

    pub fn is_empty(&self) -> bool {
        self.language.len().is_zero()
    }

    pub fn get<I: Into<BigInt>>(&self, index: I) -> Result<Match<'_>, Error> {
        let i = normalize_index(index.into(), self.language.len())?;
        let (text, spans) = self.language.render(&i);
        Ok(Match {
            text,
            spans,
            names: &self.language.group_names,
        })
    }

    pub fn contains(&self, text: &str) -> bool {
        self.language.contains(text)
    }

    pub fn iter(&self) -> Matches<'_> {
        Matches {
            language: &self.language,
            next: BigUint::zero(),
        }
    }

    /// See [`AllStrings::slice`].
    pub fn slice(
        &self,
        start: Option<BigInt>,
        stop: Option<BigInt>,
        step: i64,
    ) -> Result<MatchesSlice<'_>, Error> {
        let bounds = SliceBounds::compute(start, stop, step, self.language.len())?;
        Ok(MatchesSlice {
            language: &self.language,
            bounds,
        })
    }
}

impl<'a> IntoIterator for &'a AllMatches {
    type Item = Match<'a>;
    type IntoIter = Matches<'a>;

    fn into_iter(self) -> Matches<'a> {
        self.iter()
    }
}

/// Iterator over an [`AllMatches`] space in index order.
#[derive(Clone, Debug)]
pub struct Matches<'a> {
    language: &'a Language,
    next: BigUint,
}

impl<'a> Iterator for Matches<'a> {
    type Item = Match<'a>;

    fn next(&mut self) -> Option<Match<'a>> {
        if &self.next >= self.language.len() {
            return None;
        }
        let (text, spans) = self.language.render(&self.next);
        self.next += 1u32;
        Some(Match {
            text,
            spans,
            names: &self.language.group_names,
        })
    }
}

/// A lazy slice of an [`AllMatches`] space.
#[derive(Debug)]
pub struct MatchesSlice<'a> {
    language: &'a Language,
    bounds: SliceBounds,
}

impl<'a> MatchesSlice<'a> {
    pub fn len(&self) -> &BigUint {
        &self.bounds.len
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.len.is_zero()
    }

    pub fn get<I: Into<BigInt>>(&self, index: I) -> Result<Match<'a>, Error> {
        let j = normalize_index(index.into(), &self.bounds.len)?;
        let (text, spans) = self.language.render(&self.bounds.index(&j));
        Ok(Match {
            text,
            spans,
            names: &self.language.group_names,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Match<'a>> + '_ {
        let mut next = BigUint::zero();
        std::iter::from_fn(move || {
            if next >= self.bounds.len {
                return None;
            }
            let (text, spans) = self.language.render(&self.bounds.index(&next));
            next += 1u32;
            Some(Match {
                text,
                spans,
                names: &self.language.group_names,
            })
        })
    }
}

// ---------------------------------------------------------------------------
// Match objects
// ---------------------------------------------------------------------------

/// One member of a space together with what its capturing groups
/// produced, snapshotted at `get` time.
///
/// Spans are byte offsets into the full string. A group that did not
/// participate in this member (an untaken alternation arm, a zero-count
/// repetition) has no span; a group inside a repetition records its last
/// piece.
#[derive(Clone, Debug)]
pub struct Match<'a> {
    text: String,
    spans: Vec<Option<(usize, usize)>>,
    names: &'a [(String, u32)],
}

impl Match<'_> {
    /// The full string; same as `group(0)`.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Text of a capturing group, 1-indexed; `group(0)` is the full
    /// string. `None` for unknown or non-participating groups.
    pub fn group(&self, index: usize) -> Option<&str> {
        if index == 0 {
            return Some(&self.text);
        }
        self.spans
            .get(index - 1)
            .copied()
            .flatten()
            .map(|(start, end)| &self.text[start..end])
    }

    /// All capturing groups in source order.
    pub fn groups(&self) -> Vec<Option<&str>> {
        (1..=self.spans.len()).map(|i| self.group(i)).collect()
    }

    /// Byte span of a group; `span(0)` covers the full string.
    pub fn span(&self, index: usize) -> Option<(usize, usize)> {
        if index == 0 {
            return Some((0, self.text.len()));
        }
        self.spans.get(index - 1).copied().flatten()
    }

    /// Text of a `(?P<name>...)` group.
    pub fn group_named(&self, name: &str) -> Option<&str> {
        self.names
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, index)| self.group(*index as usize))
    }

    /// All named groups with their texts, in definition order.
    pub fn named_groups(&self) -> Vec<(&str, Option<&str>)> {
        self.names
            .iter()
            .map(|(name, index)| (name.as_str(), self.group(*index as usize)))
            .collect()
    }

    /// Number of capturing groups in the pattern.
    pub fn group_count(&self) -> usize {
        self.spans.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile a pattern with default options, panicking on failure.
    fn strings(pattern: &str) -> AllStrings {
        AllStrings::new(pattern).expect("pattern should compile")
    }

    fn strings_with(pattern: &str, options: &Options) -> AllStrings {
        AllStrings::with_options(pattern, options).expect("pattern should compile")
    }

    fn matches(pattern: &str) -> AllMatches {
        AllMatches::new(pattern).expect("pattern should compile")
    }

    fn collect(space: &AllStrings) -> Vec<String> {
        space.iter().collect()
    }

    fn first(space: &AllStrings, n: usize) -> Vec<String> {
        space.iter().take(n).collect()
    }

    fn big(n: u64) -> BigUint {
        BigUint::from(n)
    }

    /// Assert that our structural membership test and the `regex` crate
    /// agree on whether `input` is fully matched. Only usable for
    /// patterns whose syntax means the same thing to both engines
    /// (ASCII, no `.`, no backreferences).
    fn assert_membership_matches_regex_crate(pattern: &str, space: &AllStrings, input: &str) {
        let re = regex::Regex::new(&format!("^(?:{})$", pattern))
            .expect("regex crate should parse pattern");
        assert_eq!(
            space.contains(input),
            re.is_match(input),
            "membership mismatch for pattern `{}` on input {:?}",
            pattern,
            input
        );
    }

    // -----------------------------------------------------------------------
    // Internal helper unit tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_char_class_sorts_and_dedups() {
        let class = CharClass::new("cabac".chars());
        assert_eq!(class.len(), 3);
        assert_eq!(class.get(0), 'a');
        assert_eq!(class.get(1), 'b');
        assert_eq!(class.get(2), 'c');
        assert!(class.contains('b'));
        assert!(!class.contains('d'));
    }

    #[test]
    fn test_power_sum_zero_base() {
        assert_eq!(power_sum(&big(0), 0, 5), big(1));
        assert_eq!(power_sum(&big(0), 1, 5), big(0));
    }

    #[test]
    fn test_power_sum_one_base() {
        assert_eq!(power_sum(&big(1), 0, 65535), big(65536));
        assert_eq!(power_sum(&big(1), 3, 3), big(1));
    }

    #[test]
    fn test_power_sum_geometric() {
        // 1 + 2 + 4 + 8
        assert_eq!(power_sum(&big(2), 0, 3), big(15));
        // 10 + 100
        assert_eq!(power_sum(&big(10), 1, 2), big(110));
        assert_eq!(power_sum(&big(26), 1, 5), big(26 + 676 + 17576 + 456976 + 11881376));
    }

    #[test]
    fn test_locate_count() {
        // Blocks of size 1, 2, 4, 8 covering indices 0..15.
        assert_eq!(locate_count(&big(2), 0, 3, big(0)), (0, big(0)));
        assert_eq!(locate_count(&big(2), 0, 3, big(1)), (1, big(0)));
        assert_eq!(locate_count(&big(2), 0, 3, big(6)), (2, big(3)));
        assert_eq!(locate_count(&big(2), 0, 3, big(10)), (3, big(3)));
        assert_eq!(locate_count(&big(2), 0, 3, big(14)), (3, big(7)));
        // Degenerate bases.
        assert_eq!(locate_count(&big(1), 2, 5, big(3)), (5, big(0)));
        assert_eq!(locate_count(&big(0), 0, 9, big(0)), (0, big(0)));
    }

    #[test]
    fn test_boundaries_multibyte() {
        let pairs: Vec<(u64, usize)> = boundaries("aé").collect();
        assert_eq!(pairs, vec![(0, 0), (1, 1), (2, 3)]);
        assert_eq!(advance("aé", 0, 3, 2), Some(3));
        assert_eq!(advance("aé", 0, 3, 3), None);
    }

    #[test]
    fn test_normalize_index() {
        let len = big(3);
        assert_eq!(normalize_index(BigInt::from(0), &len).unwrap(), big(0));
        assert_eq!(normalize_index(BigInt::from(-1), &len).unwrap(), big(2));
        assert!(matches!(
            normalize_index(BigInt::from(3), &len),
            Err(Error::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            normalize_index(BigInt::from(-4), &len),
            Err(Error::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            normalize_index(BigInt::from(0), &big(0)),
            Err(Error::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_slice_bounds() {
        // Full reverse of a six-member space.
        let bounds = SliceBounds::compute(None, None, -1, &big(6)).unwrap();
        assert_eq!(bounds.len, big(6));
        assert_eq!(bounds.index(&big(0)), big(5));
        assert_eq!(bounds.index(&big(5)), big(0));
        // Every other member.
        let bounds = SliceBounds::compute(None, None, 2, &big(6)).unwrap();
        assert_eq!(bounds.len, big(3));
        // Too-negative bounds are an error, oversized bounds clamp.
        assert!(matches!(
            SliceBounds::compute(Some(BigInt::from(-9)), None, 1, &big(6)),
            Err(Error::IndexOutOfRange { .. })
        ));
        let bounds = SliceBounds::compute(Some(BigInt::from(1)), Some(BigInt::from(99)), 1, &big(6))
            .unwrap();
        assert_eq!(bounds.len, big(5));
        assert!(matches!(
            SliceBounds::compute(None, None, 0, &big(6)),
            Err(Error::ZeroStep)
        ));
    }

    // -----------------------------------------------------------------------
    // Enumeration order
    // -----------------------------------------------------------------------

    #[test]
    fn test_simple_alternation() {
        assert_eq!(collect(&strings("1(234?|49?)")), ["123", "1234", "14", "149"]);
        assert_eq!(collect(&strings("asd|def")), ["asd", "def"]);
    }

    #[test]
    fn test_escaped_literals() {
        assert_eq!(
            collect(&strings("asd|def\\+|a\\.b\\.c")),
            ["asd", "def+", "a.b.c"]
        );
        assert_eq!(collect(&strings("a\\x41b")), ["aAb"]);
        assert_eq!(collect(&strings("a\\n")), ["a\n"]);
    }

    #[test]
    fn test_alternation_with_empty_arm() {
        assert_eq!(collect(&strings("a(b|c|)")), ["ab", "ac", "a"]);
        assert_eq!(collect(&strings("a(|b|c)")), ["a", "ab", "ac"]);
        assert_eq!(collect(&strings("a[bc]?")), ["a", "ab", "ac"]);
        assert_eq!(collect(&strings("a[bc]??")), ["a", "ab", "ac"]);
    }

    #[test]
    fn test_vowels() {
        assert_eq!(collect(&strings("[aeiou]")), ["a", "e", "i", "o", "u"]);
    }

    #[test]
    fn test_class_items_preserve_order_and_duplicates() {
        // A positive bracket expression is a union of its items in
        // written order; duplicates are kept.
        let space = strings("[aa]");
        assert_eq!(space.len(), &big(2));
        assert_eq!(collect(&space), ["a", "a"]);

        let space = strings("a|a");
        assert_eq!(space.len(), &big(2));
        assert_eq!(collect(&space), ["a", "a"]);

        let space = strings("foo|ba[rz]");
        assert_eq!(space.len(), &big(3));
        assert_eq!(collect(&space), ["foo", "bar", "baz"]);
    }

    #[test]
    fn test_empty_pattern() {
        let space = strings("");
        assert_eq!(space.len(), &big(1));
        assert_eq!(space.get(0).unwrap(), "");
        assert_eq!(collect(&strings("|")), ["", ""]);
    }

    #[test]
    fn test_natural_two_digit_order() {
        let space = strings("[0-9]{2}");
        assert_eq!(space.len(), &big(100));
        assert_eq!(space.get(0).unwrap(), "00");
        assert_eq!(space.get(1).unwrap(), "01");
        assert_eq!(space.get(42).unwrap(), "42");
        assert_eq!(space.get(98).unwrap(), "98");
        assert_eq!(space.get(99).unwrap(), "99");
    }

    #[test]
    fn test_shorter_repetitions_first() {
        let space = strings("x|[a-z]{1,5}");
        assert_eq!(space.get(0).unwrap(), "x");
        assert_eq!(space.get(1).unwrap(), "a");
        assert_eq!(space.get(23).unwrap(), "w");
        assert_eq!(space.get(24).unwrap(), "x");
        assert_eq!(space.get(25).unwrap(), "y");
        assert_eq!(space.get(26).unwrap(), "z");
        assert_eq!(space.get(27).unwrap(), "aa");
        assert_eq!(space.get(28).unwrap(), "ab");
        assert_eq!(space.get(-2).unwrap(), "zzzzy");
        assert_eq!(space.get(-1).unwrap(), "zzzzz");
    }

    #[test]
    fn test_mixed_radix_concat_identity() {
        // index = ((i0 * 2) + i1) * 2 + i2, rightmost digit fastest.
        let space = strings("[ab][cd][ef]");
        let axes = ["ab", "cd", "ef"];
        for i0 in 0..2usize {
            for i1 in 0..2usize {
                for i2 in 0..2usize {
                    let index = ((i0 * 2) + i1) * 2 + i2;
                    let expected: String = [
                        axes[0].as_bytes()[i0] as char,
                        axes[1].as_bytes()[i1] as char,
                        axes[2].as_bytes()[i2] as char,
                    ]
                    .iter()
                    .collect();
                    assert_eq!(space.get(index as u32).unwrap(), expected);
                }
            }
        }
    }

    #[test]
    fn test_branch_prefix_sum_dispatch() {
        let space = strings("foo|ba[rz]|x[yz]");
        assert_eq!(collect(&space), ["foo", "bar", "baz", "xy", "xz"]);
        // Index 1 + j lands in the second arm at offset j.
        assert_eq!(space.get(1).unwrap(), "bar");
        assert_eq!(space.get(2).unwrap(), "baz");
        assert_eq!(space.get(3).unwrap(), "xy");
    }

    #[test]
    fn test_iteration_matches_indexing() {
        let space = strings("(a|bb){1,3}");
        assert_eq!(space.len(), &big(2 + 4 + 8));
        for (i, member) in space.iter().enumerate() {
            assert_eq!(space.get(i as u64).unwrap(), member);
            assert!(space.contains(&member), "space should contain {:?}", member);
        }
    }

    #[test]
    fn test_empty_string_produced_once() {
        assert_eq!(collect(&strings("a{0,3}")), ["", "a", "aa", "aaa"]);
        // With two mandatory picks of (|a), the empty string appears via
        // the 00 digit pair only.
        assert_eq!(collect(&strings("(?:|a){2}")), ["", "a", "a", "aa"]);
        assert_eq!(collect(&strings("a{0}")), [""]);
    }

    #[test]
    fn test_zero_width_inner_repetition() {
        // Six counts of the empty string, one per count value.
        let space = strings("(?:){0,5}");
        assert_eq!(space.len(), &big(6));
        assert!(collect(&space).iter().all(String::is_empty));
    }

    #[test]
    fn test_empty_class_language() {
        let space = strings("[^\\x00-\\xff]");
        assert_eq!(space.len(), &big(0));
        assert!(space.is_empty());
        assert!(!space.contains(""));
        assert!(!space.contains("a"));
        assert!(matches!(
            space.get(0),
            Err(Error::IndexOutOfRange { .. })
        ));
        // Repeating the empty language still produces the empty string
        // exactly once at count zero.
        let space = strings("[^\\x00-\\xff]*");
        assert_eq!(space.len(), &big(1));
        assert_eq!(space.get(0).unwrap(), "");
    }

    #[test]
    fn test_greediness_does_not_affect_order() {
        let greedy = strings("a*");
        let lazy = strings("a*?");
        assert_eq!(greedy.len(), lazy.len());
        assert_eq!(first(&greedy, 5), first(&lazy, 5));

        let greedy = strings("(a|bc){1,2}");
        let lazy = strings("(a|bc){1,2}?");
        assert_eq!(greedy.len(), lazy.len());
        assert_eq!(collect(&greedy), collect(&lazy));
    }

    // -----------------------------------------------------------------------
    // Alphabet configuration
    // -----------------------------------------------------------------------

    #[test]
    fn test_dot_uses_configured_charset() {
        let options = Options {
            charset: "ab".to_string(),
            ..Options::default()
        };
        let space = strings_with(".", &options);
        assert_eq!(space.len(), &big(2));
        assert_eq!(collect(&space), ["a", "b"]);

        // The duplicate across arms is preserved.
        let space = strings_with(".|a", &options);
        assert_eq!(space.len(), &big(3));
        assert_eq!(collect(&space), ["a", "b", "a"]);
    }

    #[test]
    fn test_dot_excludes_newline_without_dotall() {
        let options = Options {
            charset: "abc\n".to_string(),
            ..Options::default()
        };
        assert_eq!(collect(&strings_with(".", &options)), ["a", "b", "c"]);

        let options = Options {
            dotall: true,
            ..options
        };
        // Computed classes enumerate in ascending code point order, so
        // the newline comes first.
        assert_eq!(
            collect(&strings_with(".", &options)),
            ["\n", "a", "b", "c"]
        );
    }

    #[test]
    fn test_category_cardinalities() {
        assert_eq!(strings("\\d").len(), &big(10));
        // ASCII letters + digits + underscore.
        assert_eq!(strings("\\w").len(), &big(63));
        assert_eq!(strings("\\s").len(), &big(6));
        // Complements resolve against the full 256-character alphabet.
        assert_eq!(strings("\\D").len(), &big(246));
        // A negated bracket expression resolves against the dot alphabet,
        // which excludes the newline unless dotall is set.
        assert_eq!(strings("[^0-9]").len(), &big(245));
        let dotall = Options {
            dotall: true,
            ..Options::default()
        };
        assert_eq!(strings_with("[^0-9]", &dotall).len(), &big(246));
    }

    #[test]
    fn test_cardinalities_multiply() {
        let dotall = Options {
            dotall: true,
            ..Options::default()
        };
        assert_eq!(strings_with("1.3", &dotall).len(), &big(256));
        assert_eq!(
            strings_with("[^-]3[._]1415", &dotall).len(),
            &big(255 * 2)
        );
        // (256 + 4 + 40) * 26 * (1 + 256)
        assert_eq!(
            strings_with("(.|5[6-9]|[6-9][0-9])[a-z].?", &dotall).len(),
            &big(300 * 26 * 257)
        );
        let digits = Options {
            charset: "0123456789".to_string(),
            ..Options::default()
        };
        assert_eq!(strings_with("..", &digits).len(), &big(100));
    }

    #[test]
    fn test_default_options() {
        let options = Options::default();
        assert_eq!(options.charset.chars().count(), 256);
        assert_eq!(options.max_count, DEFAULT_MAX_COUNT);
        assert!(!options.dotall);
        assert_eq!(options.anchors, AnchorPolicy::MatchNothing);
    }

    // -----------------------------------------------------------------------
    // Repetition bounds
    // -----------------------------------------------------------------------

    #[test]
    fn test_star_default_bound() {
        let space = strings("0*");
        assert_eq!(space.len(), &big(65536));
        let last = space.get(-1).unwrap();
        assert_eq!(last.chars().count(), 65535);
        assert!(last.chars().all(|c| c == '0'));
    }

    #[test]
    fn test_unbounded_lengths() {
        // 2^65536 - 1 members.
        let space = strings("[01]*");
        let expected = Pow::pow(&BigUint::from(2u32), 65536u64) - 1u32;
        assert_eq!(space.len(), &expected);

        let space = strings("\\d+");
        assert_eq!(space.len(), &power_sum(&big(10), 1, 65535));
        assert!(space.len() > &BigUint::from(u64::MAX));
    }

    #[test]
    fn test_max_count_option() {
        let options = Options {
            max_count: 4,
            ..Options::default()
        };
        let space = strings_with("[01]+", &options);
        assert_eq!(space.len(), &big(2 + 4 + 8 + 16));
        assert_eq!(space.get(-1).unwrap(), "1111");
    }

    #[test]
    fn test_explicit_counts() {
        assert_eq!(collect(&strings("x{2}")), ["xx"]);
        assert_eq!(collect(&strings("x{2,3}")), ["xx", "xxx"]);
        // A lower bound above the ceiling keeps the language non-empty.
        let options = Options {
            max_count: 3,
            ..Options::default()
        };
        let space = strings_with("x{5,}", &options);
        assert_eq!(space.len(), &big(1));
        assert_eq!(space.get(0).unwrap(), "xxxxx");
    }

    #[test]
    fn test_brace_literals() {
        // Braces that do not form a counted repetition are ordinary
        // characters.
        assert_eq!(collect(&strings("a{")), ["a{"]);
        assert_eq!(collect(&strings("{2}")), ["{2}"]);
        assert_eq!(collect(&strings("a{x}")), ["a{x}"]);
        assert_eq!(collect(&strings("a{,}")), ["a{,}"]);
    }

    #[test]
    fn test_deep_offset_count_location() {
        let space = strings("([0-9a-fA-F]{0,4}:){0,5}");
        let last = BigInt::from(space.len().clone()) - 1;
        assert_eq!(space.get(last).unwrap(), "ffff:".repeat(5));
    }

    // -----------------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------------

    #[test]
    fn test_membership_basics() {
        let space = strings("[01]+");
        assert!(space.contains("0101"));
        assert!(!space.contains("0201"));
        assert!(!space.contains(""));

        let space = strings("[ab]{3}");
        assert!(space.contains("aba"));
        assert!(!space.contains("ab"));
        assert!(!space.contains("abab"));

        let space = strings("foo|ba[rz]");
        assert!(space.contains("foo"));
        assert!(space.contains("baz"));
        assert!(!space.contains("bat"));
    }

    #[test]
    fn test_membership_outside_alphabet() {
        let space = strings("[ab]+");
        assert!(!space.contains("λ"));
        assert!(!space.contains("aλb"));
    }

    #[test]
    fn test_membership_of_every_enumerated_member() {
        for pattern in ["1(234?|49?)", "a[bc]?", "(a|bb){1,3}", "x|[a-z]{1,2}"] {
            let space = strings(pattern);
            for member in space.iter() {
                assert!(
                    space.contains(&member),
                    "pattern `{}` should contain {:?}",
                    pattern,
                    member
                );
            }
        }
    }

    #[test]
    fn test_membership_matches_regex_crate() {
        use itertools::Itertools;

        let patterns = ["(a|bc){1,2}", "[01]{1,4}", "a?b+c*", "(foo|ba[rz])+"];
        for pattern in patterns {
            let space = strings(pattern);
            // Everything the space enumerates early must agree, as must
            // mutations of it.
            for member in space.iter().take(20) {
                assert_membership_matches_regex_crate(pattern, &space, &member);
                assert_membership_matches_regex_crate(pattern, &space, &member[1..]);
                let mutated = format!("{}x", member);
                assert_membership_matches_regex_crate(pattern, &space, &mutated);
            }
            // All short words over the relevant alphabet.
            for n in 0..4usize {
                for word in std::iter::repeat("abc01".chars())
                    .take(n)
                    .multi_cartesian_product()
                {
                    let input: String = word.into_iter().collect();
                    assert_membership_matches_regex_crate(pattern, &space, &input);
                }
            }
        }
    }

    #[test]
    fn test_membership_variable_width_split() {
        // Both children are variable width, so the split backtracks.
        let space = strings("(?:a|ab)(?:b|c)?");
        assert!(space.contains("a"));
        assert!(space.contains("ab"));
        assert!(space.contains("abc"));
        assert!(space.contains("abb"));
        assert!(!space.contains("abcb"));
        assert!(!space.contains("b"));
    }

    // -----------------------------------------------------------------------
    // Capture groups and match objects
    // -----------------------------------------------------------------------

    #[test]
    fn test_nested_group_captures() {
        let space = matches("(([abc])d)e");
        let m = space.get(0).unwrap();
        assert_eq!(m.group(0), Some("ade"));
        assert_eq!(m.group(1), Some("ad"));
        assert_eq!(m.group(2), Some("a"));
        assert_eq!(m.span(1), Some((0, 2)));
        assert_eq!(m.span(2), Some((0, 1)));
        assert_eq!(m.groups(), vec![Some("ad"), Some("a")]);
        assert_eq!(m.group_count(), 2);
    }

    #[test]
    fn test_digit_group_matches() {
        let space = matches("a(\\d)b");
        assert_eq!(space.len(), &big(10));
        let m = space.get(0).unwrap();
        assert_eq!(m.group(0), Some("a0b"));
        assert_eq!(m.group(1), Some("0"));
        assert_eq!(m.span(1), Some((1, 2)));
    }

    #[test]
    fn test_named_groups() {
        let space = matches("x(?P<foo>[abc])x");
        let m = space.get(0).unwrap();
        assert_eq!(m.group(0), Some("xax"));
        assert_eq!(m.group(1), Some("a"));
        assert_eq!(m.group_named("foo"), Some("a"));
        assert_eq!(m.group_named("bar"), None);
        assert_eq!(m.named_groups(), vec![("foo", Some("a"))]);
    }

    #[test]
    fn test_group_in_untaken_arm_has_no_span() {
        let space = matches("(a)|(b)");
        let m = space.get(1).unwrap();
        assert_eq!(m.group(0), Some("b"));
        assert_eq!(m.group(1), None);
        assert_eq!(m.group(2), Some("b"));
        assert_eq!(m.span(1), None);
    }

    #[test]
    fn test_group_under_repetition_keeps_last_piece() {
        let space = matches("(a){0,2}");
        let m = space.get(0).unwrap();
        assert_eq!(m.group(0), Some(""));
        assert_eq!(m.group(1), None);
        let m = space.get(2).unwrap();
        assert_eq!(m.group(0), Some("aa"));
        assert_eq!(m.span(1), Some((1, 2)));
    }

    // -----------------------------------------------------------------------
    // Backreferences
    // -----------------------------------------------------------------------

    #[test]
    fn test_backref_enumeration() {
        let space = strings("([abc])-\\1");
        assert_eq!(space.len(), &big(3));
        assert_eq!(collect(&space), ["a-a", "b-b", "c-c"]);
    }

    #[test]
    fn test_backref_membership() {
        let space = strings("([abc])-\\1");
        assert!(space.contains("a-a"));
        assert!(space.contains("c-c"));
        assert!(!space.contains("a-b"));
        assert!(!space.contains("a-"));
    }

    #[test]
    fn test_quoted_backref_matches() {
        let space = matches("([\"'])([01]{3})\\1");
        assert_eq!(space.len(), &big(2 * 8));
        let m = space.get(0).unwrap();
        assert_eq!(m.group(0), Some("\"000\""));
        assert_eq!(m.groups(), vec![Some("\""), Some("000")]);
        assert!(space.contains("'101'"));
        assert!(!space.contains("'101\""));
    }

    #[test]
    fn test_named_backref() {
        let space = strings("(?P<x>a|b)(?P=x)");
        assert_eq!(collect(&space), ["aa", "bb"]);
        assert!(space.contains("bb"));
        assert!(!space.contains("ab"));
    }

    #[test]
    fn test_backref_inside_repeated_body() {
        // The group re-captures on every piece, and the backreference
        // reads the capture of its own piece.
        let space = strings("(?:([\"'])x\\1)+");
        assert_eq!(first(&space, 2), ["\"x\"", "'x'"]);
        assert!(space.contains("\"x\"'x'"));
        assert!(!space.contains("\"x'"));
    }

    #[test]
    fn test_backref_rejections() {
        // Group under a repetition the backreference is outside of.
        assert!(matches!(
            AllStrings::new("(a)*\\1"),
            Err(Error::Unsupported(_))
        ));
        // Group in a parallel alternation arm.
        assert!(matches!(
            AllStrings::new("(a)|b\\1"),
            Err(Error::Unsupported(_))
        ));
        // Group in some arm of an earlier alternation.
        assert!(matches!(
            AllStrings::new("((a)|b)\\2"),
            Err(Error::Unsupported(_))
        ));
        // Self reference inside the still-open group.
        assert!(matches!(
            AllStrings::new("(\\1)"),
            Err(Error::Unsupported(_))
        ));
    }

    #[test]
    fn test_backref_after_nested_groups_is_allowed() {
        let space = strings("((a))\\2");
        assert_eq!(collect(&space), ["aa"]);
    }

    // -----------------------------------------------------------------------
    // Anchors and unsupported constructs
    // -----------------------------------------------------------------------

    #[test]
    fn test_anchors_empty_the_language() {
        for pattern in ["foo$", "^foo", "^foo$", "a\\bb", "a\\Zb"] {
            let space = strings(pattern);
            assert_eq!(space.len(), &big(0), "pattern `{}`", pattern);
            assert!(!space.contains("foo"));
            assert!(matches!(
                space.get(0),
                Err(Error::IndexOutOfRange { .. })
            ));
        }
    }

    #[test]
    fn test_anchor_absorb_option() {
        let options = Options {
            anchors: AnchorPolicy::AbsorbOuter,
            ..Options::default()
        };
        assert_eq!(collect(&strings_with("^foo$", &options)), ["foo"]);
        assert_eq!(collect(&strings_with("foo$", &options)), ["foo"]);
        assert_eq!(collect(&strings_with("^a|b$", &options)), ["a", "b"]);
        // Anchors away from the pattern edges still empty the language.
        assert_eq!(strings_with("a^b", &options).len(), &big(0));
        assert_eq!(strings_with("a\\bb", &options).len(), &big(0));
    }

    #[test]
    fn test_lookarounds_are_rejected() {
        for pattern in ["(?=a)b", "(?!a)b", "(?<=a)b", "a(?<!b)"] {
            assert!(
                matches!(AllStrings::new(pattern), Err(Error::Unsupported(_))),
                "pattern `{}` should be rejected",
                pattern
            );
        }
    }

    // -----------------------------------------------------------------------
    // Parse failures and index errors
    // -----------------------------------------------------------------------

    #[test]
    fn test_parse_errors() {
        for pattern in [
            "a(",
            ")",
            "a)b",
            "a{2,1}",
            "*a",
            "a**",
            "[z-a]",
            "[abc",
            "a\\q",
            "\\x2",
            "(?P<n>a)(?P<n>b)",
            "(?P=missing)",
            "(a)\\2",
            "(?Qa)",
        ] {
            assert!(
                matches!(AllStrings::new(pattern), Err(Error::Parse { .. })),
                "pattern `{}` should fail to parse",
                pattern
            );
        }
    }

    #[test]
    fn test_index_errors() {
        let space = strings("[abc]");
        assert_eq!(space.get(-1).unwrap(), "c");
        assert_eq!(space.get(-3).unwrap(), "a");
        assert!(matches!(space.get(3), Err(Error::IndexOutOfRange { .. })));
        assert!(matches!(space.get(-4), Err(Error::IndexOutOfRange { .. })));
    }

    #[test]
    fn test_error_display() {
        let err = AllStrings::new("a(").unwrap_err();
        assert!(err.to_string().starts_with("parse error at position"));
        let err = strings("a").get(5).unwrap_err();
        assert_eq!(err.to_string(), "index 5 out of range for length 1");
    }

    // -----------------------------------------------------------------------
    // Slicing
    // -----------------------------------------------------------------------

    #[test]
    fn test_slices() {
        let space = strings("[abcdef]");
        let take = |start: Option<i64>, stop: Option<i64>, step: i64| -> Vec<String> {
            space
                .slice(start.map(BigInt::from), stop.map(BigInt::from), step)
                .unwrap()
                .iter()
                .collect()
        };
        assert_eq!(take(None, None, 2), ["a", "c", "e"]);
        assert_eq!(take(Some(1), None, 2), ["b", "d", "f"]);
        assert_eq!(take(Some(1), Some(-1), 1), ["b", "c", "d", "e"]);
        assert_eq!(take(Some(1), Some(-2), 1), ["b", "c", "d"]);
        assert_eq!(take(Some(1), Some(99), 1), ["b", "c", "d", "e", "f"]);
        assert_eq!(take(Some(1), Some(1), 1), Vec::<String>::new());
        assert_eq!(take(None, None, -1), ["f", "e", "d", "c", "b", "a"]);
        assert_eq!(take(None, None, -2), ["f", "d", "b"]);
        // An over-large explicit start with a negative step clamps to the
        // last member, so this is the full reverse.
        assert_eq!(take(Some(99), None, -1), ["f", "e", "d", "c", "b", "a"]);

        let reverse = space.slice(None, None, -1).unwrap();
        assert_eq!(reverse.get(0).unwrap(), "f");
        assert_eq!(reverse.get(-1).unwrap(), "a");
        assert!(matches!(space.slice(None, None, 0), Err(Error::ZeroStep)));
        // A bound still negative after end-relative adjustment is an
        // index error, not an empty slice.
        assert!(matches!(
            space.slice(Some(BigInt::from(-99)), None, 1),
            Err(Error::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_slice_of_giant_space() {
        let space = strings("\\d+");
        let head = space.slice(None, Some(BigInt::from(16)), 1).unwrap();
        assert_eq!(head.len(), &big(16));
        assert_eq!(head.iter().count(), 16);
        assert_eq!(head.get(10).unwrap(), "00");
    }

    #[test]
    fn test_slice_of_matches() {
        let space = matches("([abc])-\\1");
        let head = space.slice(None, Some(BigInt::from(2)), 1).unwrap();
        let texts: Vec<String> = head.iter().map(|m| m.as_str().to_string()).collect();
        assert_eq!(texts, ["a-a", "b-b"]);
        let m = head.get(1).unwrap();
        assert_eq!(m.group(1), Some("b"));
    }

    // -----------------------------------------------------------------------
    // Giant spaces
    // -----------------------------------------------------------------------

    #[test]
    fn test_iterate_giant_space() {
        let space = strings(".+");
        assert!(space.len() > &BigUint::from(u64::MAX));
        let mut iter = space.iter();
        assert_eq!(iter.next().unwrap(), "\u{0}");
        assert_eq!(iter.next().unwrap(), "\u{1}");
    }

    #[test]
    fn test_word_cluster() {
        let space =
            strings("bu|[rn]t|[coy]e|[mtg]a|j|iso|n[hl]|[ae]d|lev|sh|[lnd]i|[po]o|ls");
        assert_eq!(space.len(), &big(23));
        assert!(space.contains("bu"));
        assert!(!space.contains("b"));
        let head = space.slice(None, Some(BigInt::from(5)), 1).unwrap();
        let first_five: Vec<String> = head.iter().collect();
        assert_eq!(first_five, ["bu", "rt", "nt", "ce", "oe"]);
    }
}
