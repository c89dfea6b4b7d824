// SPDX: CC0-1.0

use crate::{eval::OperatorTyp, stdlib};
use core::{fmt, iter::Peekable, str::CharIndices};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubStr {
    // yes, silly, but atomic operations are cheap for this use case
    src: Arc<String>,
    start: usize,
    len: usize,
}

impl SubStr {
    #[inline]
    pub const fn new(src: Arc<String>, start: usize, len: usize) -> Self {
        Self { src, start, len }
    }

    #[inline]
    pub fn all(src: Arc<String>) -> Self {
        let len = src.len();
        Self::new(src, 0, len)
    }

    /// Zero-width span just past the end of `src`.
    #[inline]
    pub fn end_of(src: Arc<String>) -> Self {
        let start = src.len();
        Self::new(src, start, 0)
    }

    pub fn src(&self) -> Arc<String> {
        Arc::clone(&self.src)
    }

    pub const fn start(&self) -> usize {
        self.start
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self) -> &str {
        &self.src[self.start..self.start + self.len]
    }

    pub fn shift_right(&mut self, by: usize) {
        self.len += by;
    }
}

impl fmt::Display for SubStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.get())
    }
}

/// Piece of raw input considered by the implicit multiplication pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Unit<'src> {
    /// Recognized name or a single letter.
    Letters(&'src str),
    Char(char),
}

/// Split a run of ascii letters into recognized names (longest match first)
/// and single letters.
fn split_letters<'src>(run: &'src str, units: &mut Vec<Unit<'src>>) {
    let mut rest = run;
    while !rest.is_empty() {
        let take = stdlib::NAMES
            .iter()
            .filter(|name| rest.starts_with(*name))
            .map(|name| name.len())
            .max()
            .unwrap_or(1);
        let (head, tail) = rest.split_at(take);
        units.push(Unit::Letters(head));
        rest = tail;
    }
}

/// Byte ranges of the maximal ascii letter runs in `raw`.
fn letter_runs(raw: &str) -> impl Iterator<Item = (usize, usize)> + '_ {
    let mut chars = raw.char_indices().peekable();
    core::iter::from_fn(move || loop {
        let (idx, chr) = chars.next()?;
        if chr.is_ascii_alphabetic() {
            let mut end = idx + 1;
            while chars.next_if(|(_, c)| c.is_ascii_alphabetic()).is_some() {
                end += 1;
            }
            return Some((idx, end));
        }
    })
}

/// First letter run of the raw text that contains something other than
/// recognized names and the variables.
pub fn first_unknown_word(raw: &Arc<String>) -> Option<SubStr> {
    letter_runs(raw).find_map(|(start, end)| {
        let mut pieces = Vec::new();
        split_letters(&raw[start..end], &mut pieces);
        let known = pieces.iter().all(|piece| match piece {
            Unit::Letters(s) => stdlib::NAMES.contains(s) || stdlib::is_variable(s),
            Unit::Char(_) => false,
        });
        (!known).then(|| SubStr::new(Arc::clone(raw), start, end - start))
    })
}

fn units(raw: &str) -> Vec<Unit<'_>> {
    let mut units = Vec::with_capacity(raw.len());
    let mut chars = raw.char_indices().peekable();
    while let Some((idx, chr)) = chars.next() {
        if chr.is_ascii_alphabetic() {
            let mut end = idx + 1;
            while let Some((_, _)) = chars.next_if(|(_, c)| c.is_ascii_alphabetic()) {
                end += 1;
            }
            split_letters(&raw[idx..end], &mut units);
        } else {
            units.push(Unit::Char(chr));
        }
    }
    units
}

fn needs_mul(left: Unit<'_>, right: Unit<'_>) -> bool {
    use Unit::{Char, Letters};
    match (left, right) {
        (Char(c), Letters(_)) => c.is_ascii_digit() || c == ')',
        (Letters(_), Char(c)) if c.is_ascii_digit() => true,
        // two equal single letters stay glued, so "xx" is one identifier
        (Letters(l), Letters(r)) => !(l.len() == 1 && l == r),
        (Char(c), Char('(')) => c.is_ascii_digit() || c == ')',
        (Letters(name), Char('(')) => !stdlib::is_function(name),
        _ => false,
    }
}

/// Insert implicit multiplication operators and strip whitespace.
///
/// `2x`, `x2`, `xsin(x)`, `(a)(b)`, `(a)x`, `2(a)` and `x(a)` all gain a `*`
/// between the juxtaposed parts. The pass looks at adjacent pieces of the raw
/// text, so whitespace between two parts suppresses the insertion.
pub fn preprocess(raw: &str) -> String {
    let units = units(raw);
    let mut out = String::with_capacity(raw.len() * 2);
    for (i, unit) in units.iter().enumerate() {
        match unit {
            Unit::Letters(s) => out.push_str(s),
            Unit::Char(c) => out.push(*c),
        }
        if let Some(next) = units.get(i + 1) {
            if needs_mul(*unit, *next) {
                out.push('*');
            }
        }
    }
    out.retain(|c| !c.is_whitespace());
    out
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokTyp {
    Ident,
    Number,
    Op(OperatorTyp),
    OpenParen,
    CloseParen,
    /// Anything else. Parsing never continues past it.
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Tok {
    pub typ: TokTyp,
    pub loc: SubStr,
}

#[derive(Debug)]
pub struct Lexer<'src> {
    src: &'src Arc<String>,
    cur: Peekable<CharIndices<'src>>,
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src Arc<String>) -> Self {
        Self {
            src,
            cur: src.char_indices().peekable(),
        }
    }

    pub fn trim_whitespace(&mut self) {
        while self.cur.next_if(|(_, chr)| chr.is_whitespace()).is_some() {}
    }

    pub fn consume_unambiguous(&mut self) -> Option<Tok> {
        let (idx, chr) = self.cur.peek().copied()?;
        let typ = match chr {
            '+' => TokTyp::Op(OperatorTyp::Add),
            '-' => TokTyp::Op(OperatorTyp::Sub),
            '*' => TokTyp::Op(OperatorTyp::Mul),
            '/' => TokTyp::Op(OperatorTyp::Div),
            '^' => TokTyp::Op(OperatorTyp::Pow),
            '(' => TokTyp::OpenParen,
            ')' => TokTyp::CloseParen,
            _ => return None,
        };
        self.cur.next();
        Some(Tok {
            typ,
            loc: SubStr::new(Arc::clone(self.src), idx, 1),
        })
    }

    pub fn consume_by<P>(&mut self, next_idx: usize, typ: TokTyp, predicate: P) -> Option<Tok>
    where
        P: Fn(char) -> bool,
    {
        let mut tok = Tok {
            typ,
            loc: SubStr::new(Arc::clone(self.src), next_idx, 0),
        };
        while let Some((_, chr)) = self.cur.next_if(|(_, chr)| predicate(*chr)) {
            tok.loc.shift_right(chr.len_utf8());
        }
        if tok.loc.is_empty() {
            None
        } else {
            Some(tok)
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Tok;

    fn next(&mut self) -> Option<Self::Item> {
        self.trim_whitespace();

        let (next_idx, next_chr) = self.cur.peek().copied()?;
        if let Some(tok) = self.consume_unambiguous() {
            Some(tok)
        } else if next_chr.is_ascii_alphabetic() {
            self.consume_by(next_idx, TokTyp::Ident, |chr| chr.is_ascii_alphabetic())
        } else if next_chr.is_ascii_digit() {
            // a literal starts with a digit, dots only after that
            self.consume_by(next_idx, TokTyp::Number, |chr| {
                chr.is_ascii_digit() || chr == '.'
            })
        } else {
            self.cur.next();
            Some(Tok {
                typ: TokTyp::Unknown,
                loc: SubStr::new(Arc::clone(self.src), next_idx, next_chr.len_utf8()),
            })
        }
    }
}
