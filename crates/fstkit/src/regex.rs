// Byte-oriented regex search automaton.
//
// Patterns are compiled to a Thompson NFA over the byte alphabet; the
// automaton state is the epsilon-closed set of live NFA states, so no DFA
// is materialized and state size stays proportional to the pattern. A
// pattern matches whole keys (implicitly anchored at both ends), the same
// contract as exact lookup.
//
// Supported syntax:
// - literal characters (multi-byte UTF-8 literals match their byte sequence)
// - `.` matches any single byte
// - `[...]` and `[^...]` character classes with `-` ranges (single-byte members)
// - `|` alternation, `(...)` grouping
// - `*`, `+`, `?` postfix quantifiers
// - `\` escapes for metacharacters and `\n`, `\r`, `\t`, `\0`
//
// Malformed patterns fail at construction with `FstError::Automaton`;
// a constructed Regex never fails mid-traversal.

use crate::automaton::Automaton;
use crate::FstError;

/// Matches keys against a compiled pattern.
#[derive(Debug, Clone)]
pub struct Regex {
    insts: Vec<Inst>,
    start: usize,
}

#[derive(Debug, Clone)]
enum Inst {
    /// Consume one byte inside any of the inclusive ranges.
    Ranges { ranges: Vec<(u8, u8)>, next: usize },
    /// Epsilon-fork to both targets.
    Split(usize, usize),
    /// Accepting state.
    Match,
}

impl Regex {
    /// Compile `pattern`. Fails on syntax errors; never fails later.
    pub fn new(pattern: &str) -> Result<Regex, FstError> {
        let ast = Parser::new(pattern).parse()?;
        let mut insts = Vec::new();
        insts.push(Inst::Match);
        let start = compile(&ast, 0, &mut insts);
        Ok(Regex { insts, start })
    }

    /// Add `id` and everything reachable from it by epsilon moves.
    fn closure(&self, id: usize, set: &mut Vec<usize>, seen: &mut [bool]) {
        if seen[id] {
            return;
        }
        seen[id] = true;
        match self.insts[id] {
            Inst::Split(a, b) => {
                self.closure(a, set, seen);
                self.closure(b, set, seen);
            }
            Inst::Ranges { .. } | Inst::Match => set.push(id),
        }
    }

    fn closed(&self, ids: impl IntoIterator<Item = usize>) -> Vec<usize> {
        let mut seen = vec![false; self.insts.len()];
        let mut set = Vec::new();
        for id in ids {
            self.closure(id, &mut set, &mut seen);
        }
        set.sort_unstable();
        set
    }
}

impl Automaton for Regex {
    type State = Vec<usize>;

    fn start(&self) -> Vec<usize> {
        self.closed([self.start])
    }

    fn is_match(&self, state: &Vec<usize>) -> bool {
        state.iter().any(|&id| matches!(self.insts[id], Inst::Match))
    }

    fn can_match(&self, state: &Vec<usize>) -> bool {
        !state.is_empty()
    }

    fn accept(&self, state: &Vec<usize>, byte: u8) -> Vec<usize> {
        let mut moved = Vec::new();
        for &id in state {
            if let Inst::Ranges { ref ranges, next } = self.insts[id] {
                if ranges.iter().any(|&(lo, hi)| lo <= byte && byte <= hi) {
                    moved.push(next);
                }
            }
        }
        self.closed(moved)
    }
}

#[derive(Debug)]
enum Ast {
    /// Zero-length match.
    Empty,
    /// One byte from a set of inclusive ranges.
    Class(Vec<(u8, u8)>),
    Concat(Vec<Ast>),
    Alternate(Vec<Ast>),
    Repeat { inner: Box<Ast>, kind: RepeatKind },
}

#[derive(Debug, Clone, Copy)]
enum RepeatKind {
    ZeroOrOne,
    ZeroOrMore,
    OneOrMore,
}

/// Emit instructions for `ast` such that every accepting path continues at
/// `cont`; returns the fragment's entry instruction.
fn compile(ast: &Ast, cont: usize, insts: &mut Vec<Inst>) -> usize {
    match ast {
        Ast::Empty => cont,
        Ast::Class(ranges) => {
            insts.push(Inst::Ranges { ranges: ranges.clone(), next: cont });
            insts.len() - 1
        }
        Ast::Concat(items) => {
            let mut entry = cont;
            for item in items.iter().rev() {
                entry = compile(item, entry, insts);
            }
            entry
        }
        Ast::Alternate(alts) => {
            let mut entries = Vec::with_capacity(alts.len());
            for alt in alts {
                entries.push(compile(alt, cont, insts));
            }
            let mut entries = entries.into_iter();
            let first = entries.next().unwrap_or(cont);
            entries.fold(first, |acc, e| {
                insts.push(Inst::Split(acc, e));
                insts.len() - 1
            })
        }
        Ast::Repeat { inner, kind } => match kind {
            RepeatKind::ZeroOrOne => {
                let entry = compile(inner, cont, insts);
                insts.push(Inst::Split(entry, cont));
                insts.len() - 1
            }
            RepeatKind::ZeroOrMore => {
                // Loop split patched after the body is emitted.
                insts.push(Inst::Split(0, 0));
                let split = insts.len() - 1;
                let entry = compile(inner, split, insts);
                insts[split] = Inst::Split(entry, cont);
                split
            }
            RepeatKind::OneOrMore => {
                insts.push(Inst::Split(0, 0));
                let split = insts.len() - 1;
                let entry = compile(inner, split, insts);
                insts[split] = Inst::Split(entry, cont);
                entry
            }
        },
    }
}

struct Parser<'p> {
    chars: std::iter::Peekable<std::str::Chars<'p>>,
}

impl<'p> Parser<'p> {
    fn new(pattern: &'p str) -> Parser<'p> {
        Parser { chars: pattern.chars().peekable() }
    }

    fn error(msg: impl Into<String>) -> FstError {
        FstError::Automaton(msg.into())
    }

    fn parse(mut self) -> Result<Ast, FstError> {
        let ast = self.parse_alternate()?;
        if let Some(c) = self.chars.next() {
            return Err(Self::error(format!("unexpected '{c}' in pattern")));
        }
        Ok(ast)
    }

    fn parse_alternate(&mut self) -> Result<Ast, FstError> {
        let mut alts = vec![self.parse_concat()?];
        while self.chars.peek() == Some(&'|') {
            self.chars.next();
            alts.push(self.parse_concat()?);
        }
        if alts.len() == 1 {
            Ok(alts.pop().unwrap_or(Ast::Empty))
        } else {
            Ok(Ast::Alternate(alts))
        }
    }

    fn parse_concat(&mut self) -> Result<Ast, FstError> {
        let mut items = Vec::new();
        while let Some(&c) = self.chars.peek() {
            if c == '|' || c == ')' {
                break;
            }
            items.push(self.parse_repeat()?);
        }
        match items.len() {
            0 => Ok(Ast::Empty),
            1 => Ok(items.pop().unwrap_or(Ast::Empty)),
            _ => Ok(Ast::Concat(items)),
        }
    }

    fn parse_repeat(&mut self) -> Result<Ast, FstError> {
        let atom = self.parse_atom()?;
        let kind = match self.chars.peek() {
            Some('?') => RepeatKind::ZeroOrOne,
            Some('*') => RepeatKind::ZeroOrMore,
            Some('+') => RepeatKind::OneOrMore,
            _ => return Ok(atom),
        };
        self.chars.next();
        if matches!(atom, Ast::Empty) {
            return Err(Self::error("quantifier with nothing to repeat"));
        }
        Ok(Ast::Repeat { inner: Box::new(atom), kind })
    }

    fn parse_atom(&mut self) -> Result<Ast, FstError> {
        let c = match self.chars.next() {
            Some(c) => c,
            None => return Ok(Ast::Empty),
        };
        match c {
            '(' => {
                let inner = self.parse_alternate()?;
                match self.chars.next() {
                    Some(')') => Ok(inner),
                    _ => Err(Self::error("unclosed group")),
                }
            }
            '[' => self.parse_class(),
            '.' => Ok(Ast::Class(vec![(0x00, 0xFF)])),
            '*' | '+' | '?' => Err(Self::error("quantifier with nothing to repeat")),
            ')' => Err(Self::error("unmatched ')'")),
            '\\' => {
                let escaped = self.parse_escape()?;
                Ok(literal_char(escaped))
            }
            _ => Ok(literal_char(c)),
        }
    }

    fn parse_escape(&mut self) -> Result<char, FstError> {
        let c = self
            .chars
            .next()
            .ok_or_else(|| Self::error("dangling escape at end of pattern"))?;
        match c {
            '\\' | '.' | '*' | '+' | '?' | '(' | ')' | '[' | ']' | '|' | '-' | '^' => Ok(c),
            'n' => Ok('\n'),
            'r' => Ok('\r'),
            't' => Ok('\t'),
            '0' => Ok('\0'),
            _ => Err(Self::error(format!("unknown escape '\\{c}'"))),
        }
    }

    fn parse_class(&mut self) -> Result<Ast, FstError> {
        let negated = if self.chars.peek() == Some(&'^') {
            self.chars.next();
            true
        } else {
            false
        };
        let mut ranges: Vec<(u8, u8)> = Vec::new();
        loop {
            let c = match self.chars.next() {
                Some(']') if !ranges.is_empty() || negated => break,
                Some(']') => return Err(Self::error("empty character class")),
                Some('\\') => self.parse_escape()?,
                Some(c) => c,
                None => return Err(Self::error("unclosed character class")),
            };
            let lo = class_byte(c)?;
            if self.chars.peek() == Some(&'-') {
                self.chars.next();
                let c = match self.chars.next() {
                    Some(']') => {
                        // Trailing '-' is a literal member.
                        ranges.push((lo, lo));
                        ranges.push((b'-', b'-'));
                        break;
                    }
                    Some('\\') => self.parse_escape()?,
                    Some(c) => c,
                    None => return Err(Self::error("unclosed character class")),
                };
                let hi = class_byte(c)?;
                if hi < lo {
                    return Err(Self::error("reversed range in character class"));
                }
                ranges.push((lo, hi));
            } else {
                ranges.push((lo, lo));
            }
        }
        if negated {
            ranges = complement(ranges);
        }
        Ok(Ast::Class(ranges))
    }
}

/// A literal char as an AST fragment; multi-byte chars become their UTF-8
/// byte sequence so quantifiers apply to the whole character.
fn literal_char(c: char) -> Ast {
    let mut buf = [0u8; 4];
    let bytes = c.encode_utf8(&mut buf).as_bytes();
    if bytes.len() == 1 {
        Ast::Class(vec![(bytes[0], bytes[0])])
    } else {
        Ast::Concat(bytes.iter().map(|&b| Ast::Class(vec![(b, b)])).collect())
    }
}

fn class_byte(c: char) -> Result<u8, FstError> {
    u8::try_from(u32::from(c))
        .map_err(|_| Parser::error("multi-byte character in class; classes match single bytes"))
}

/// Complement a set of byte ranges over 0x00..=0xFF.
fn complement(mut ranges: Vec<(u8, u8)>) -> Vec<(u8, u8)> {
    ranges.sort_unstable();
    let mut out = Vec::new();
    let mut next: u32 = 0;
    for (lo, hi) in ranges {
        if u32::from(lo) > next {
            out.push((next as u8, lo - 1));
        }
        next = next.max(u32::from(hi) + 1);
    }
    if next <= 0xFF {
        out.push((next as u8, 0xFF));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(re: &Regex, key: &[u8]) -> bool {
        let mut state = re.start();
        for &b in key {
            if !re.can_match(&state) {
                return false;
            }
            state = re.accept(&state, b);
        }
        re.is_match(&state)
    }

    #[test]
    fn literal_is_anchored() {
        let re = Regex::new("abc").unwrap();
        assert!(matches(&re, b"abc"));
        assert!(!matches(&re, b"ab"));
        assert!(!matches(&re, b"abcd"));
        assert!(!matches(&re, b"xabc"));
    }

    #[test]
    fn dot_and_quantifiers() {
        let re = Regex::new("a.c").unwrap();
        assert!(matches(&re, b"abc"));
        assert!(matches(&re, b"azc"));
        assert!(!matches(&re, b"ac"));

        let re = Regex::new("ab*c").unwrap();
        assert!(matches(&re, b"ac"));
        assert!(matches(&re, b"abbbc"));

        let re = Regex::new("ab+c").unwrap();
        assert!(!matches(&re, b"ac"));
        assert!(matches(&re, b"abc"));

        let re = Regex::new("ab?c").unwrap();
        assert!(matches(&re, b"ac"));
        assert!(matches(&re, b"abc"));
        assert!(!matches(&re, b"abbc"));
    }

    #[test]
    fn alternation_and_groups() {
        let re = Regex::new("foo|bar").unwrap();
        assert!(matches(&re, b"foo"));
        assert!(matches(&re, b"bar"));
        assert!(!matches(&re, b"baz"));

        let re = Regex::new("a(b|c)d").unwrap();
        assert!(matches(&re, b"abd"));
        assert!(matches(&re, b"acd"));
        assert!(!matches(&re, b"ad"));

        let re = Regex::new("(ab)+").unwrap();
        assert!(matches(&re, b"ab"));
        assert!(matches(&re, b"abab"));
        assert!(!matches(&re, b"aba"));
    }

    #[test]
    fn character_classes() {
        let re = Regex::new("[a-c]x").unwrap();
        assert!(matches(&re, b"ax"));
        assert!(matches(&re, b"cx"));
        assert!(!matches(&re, b"dx"));

        let re = Regex::new("[^a-c]x").unwrap();
        assert!(!matches(&re, b"ax"));
        assert!(matches(&re, b"dx"));
        assert!(matches(&re, b"\x00x"));

        let re = Regex::new("[abz]").unwrap();
        assert!(matches(&re, b"z"));
        assert!(!matches(&re, b"c"));
    }

    #[test]
    fn escapes() {
        let re = Regex::new("a\\.b").unwrap();
        assert!(matches(&re, b"a.b"));
        assert!(!matches(&re, b"axb"));

        let re = Regex::new("a\\\\b").unwrap();
        assert!(matches(&re, b"a\\b"));
    }

    #[test]
    fn empty_pattern_matches_empty_key() {
        let re = Regex::new("").unwrap();
        assert!(matches(&re, b""));
        assert!(!matches(&re, b"a"));
    }

    #[test]
    fn pruning_dead_prefixes() {
        let re = Regex::new("abc").unwrap();
        let state = re.accept(&re.start(), b'x');
        assert!(!re.can_match(&state));
    }

    #[test]
    fn malformed_patterns_fail_at_construction() {
        for pattern in ["(", "a)", "[", "[]", "[z-a]", "*", "a\\q", "(a|b"] {
            let err = Regex::new(pattern).unwrap_err();
            assert!(
                matches!(err, FstError::Automaton(_)),
                "pattern {pattern:?} produced {err:?}"
            );
        }
    }

    #[test]
    fn multibyte_literals_match_their_utf8_bytes() {
        let re = Regex::new("ä+").unwrap();
        assert!(matches(&re, "ä".as_bytes()));
        assert!(matches(&re, "ää".as_bytes()));
        assert!(!matches(&re, b"a"));
    }
}
