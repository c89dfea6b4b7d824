// SPDX: CC0-1.0

// recursive descent over the preprocessed text:
//
//   expr   := term (('+' | '-') term)*
//   term   := factor (('*' | '/' | '^') factor)*
//   factor := '(' expr ')' | '-' factor | '+' factor | number | ident ['(' expr ')']
//
// all binary operators are left associative, including '^'

use crate::{
    eval::{Link, Node, OperatorTyp, Program, Var},
    lex::{self, Lexer, SubStr, Tok, TokTyp},
    stdlib, Number,
};
use core::{fmt, iter::Peekable};
use std::sync::Arc;

// parentheses, unary signs and call arguments all count. Each level costs a
// few parser frames, so this stays well inside a 2 MiB thread stack
const MAX_DEPTH: usize = 512;

#[derive(Clone, Copy, Debug)]
enum Prec {
    Sum,
    Product,
}

impl Prec {
    const fn ops(self) -> &'static [OperatorTyp] {
        match self {
            Self::Sum => &[OperatorTyp::Add, OperatorTyp::Sub],
            Self::Product => &[OperatorTyp::Mul, OperatorTyp::Div, OperatorTyp::Pow],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseErrTyp {
    UnexpectedChar,
    TrailingInput,
    MissingOperand,
    UnclosedParen,
    UnknownIdent { suggestion: Option<&'static str> },
    MissingArgs { name: &'static str },
    InvalidNumber,
    TooDeep,
}

impl fmt::Display for ParseErrTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedChar => write!(f, "unexpected character"),
            Self::TrailingInput => write!(f, "unexpected input after expression"),
            Self::MissingOperand => write!(f, "expected an operand"),
            Self::UnclosedParen => write!(f, "unclosed parenthesis"),
            Self::UnknownIdent { .. } => write!(f, "undefined identifier"),
            Self::MissingArgs { name } => {
                write!(f, "function '{name}' must be followed by '(' and its argument")
            }
            Self::InvalidNumber => write!(f, "invalid number"),
            Self::TooDeep => write!(f, "expression is nested too deeply"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseErr {
    pub typ: ParseErrTyp,
    pub loc: SubStr,
}

impl ParseErr {
    /// Whether the problem poisons the whole expression even in lenient mode.
    pub const fn is_fault(&self) -> bool {
        matches!(self.typ, ParseErrTyp::InvalidNumber | ParseErrTyp::TooDeep)
    }
}

impl fmt::Display for ParseErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.typ)?;
        if !self.loc.is_empty() {
            write!(f, " '{}'", self.loc)?;
        }
        if let ParseErrTyp::UnknownIdent {
            suggestion: Some(name),
        } = self.typ
        {
            write!(f, " (did you mean '{name}'?)")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseErr {}

#[derive(Debug)]
struct Parser<'src> {
    src: &'src Arc<String>,
    toks: Peekable<Lexer<'src>>,
    strict: bool,
    depth: usize,
}

impl<'src> Parser<'src> {
    fn new(src: &'src Arc<String>, strict: bool) -> Self {
        Self {
            src,
            toks: Lexer::new(src).peekable(),
            strict,
            depth: 0,
        }
    }

    fn end(&self) -> SubStr {
        SubStr::end_of(Arc::clone(self.src))
    }

    /// Substitute zero for a missing piece, unless parsing strictly.
    fn recover(&self, typ: ParseErrTyp, loc: SubStr) -> Result<Node, ParseErr> {
        if self.strict {
            Err(ParseErr { typ, loc })
        } else {
            Ok(Node::Const(0.0))
        }
    }

    fn next_if_typ(&mut self, typ: TokTyp) -> Option<Tok> {
        self.toks.next_if(|tok| tok.typ == typ)
    }

    fn next_if_op(&mut self, ops: &[OperatorTyp]) -> Option<(OperatorTyp, SubStr)> {
        let tok = self
            .toks
            .next_if(|tok| matches!(tok.typ, TokTyp::Op(op) if ops.contains(&op)))?;
        match tok.typ {
            TokTyp::Op(op) => Some((op, tok.loc)),
            _ => unreachable!("only operator tokens pass the filter"),
        }
    }

    fn close_paren(&mut self, open: SubStr) -> Result<(), ParseErr> {
        if self.next_if_typ(TokTyp::CloseParen).is_none() && self.strict {
            return Err(ParseErr {
                typ: ParseErrTyp::UnclosedParen,
                loc: open,
            });
        }
        Ok(())
    }

    /// Parse a run of operators of one precedence level into a flat chain.
    fn chain(&mut self, prec: Prec) -> Result<Node, ParseErr> {
        let first = self.operand(prec)?;
        let mut rest = Vec::new();
        while let Some((op, loc)) = self.next_if_op(prec.ops()) {
            let rhs = self.operand(prec)?;
            rest.push(Link { op, rhs, loc });
        }
        Ok(if rest.is_empty() {
            first
        } else {
            Node::Chain {
                first: Box::new(first),
                rest,
            }
        })
    }

    fn operand(&mut self, prec: Prec) -> Result<Node, ParseErr> {
        match prec {
            Prec::Sum => self.chain(Prec::Product),
            Prec::Product => self.factor(),
        }
    }

    fn expr(&mut self) -> Result<Node, ParseErr> {
        self.chain(Prec::Sum)
    }

    fn factor(&mut self) -> Result<Node, ParseErr> {
        if self.depth > MAX_DEPTH {
            let peeked = self.toks.peek().map(|tok| tok.loc.clone());
            return Err(ParseErr {
                typ: ParseErrTyp::TooDeep,
                loc: peeked.unwrap_or_else(|| self.end()),
            });
        }
        let Some(tok) = self.toks.peek().cloned() else {
            return self.recover(ParseErrTyp::MissingOperand, self.end());
        };
        self.depth += 1;
        let node = match tok.typ {
            TokTyp::OpenParen => {
                self.toks.next();
                self.expr()
                    .and_then(|inner| self.close_paren(tok.loc).map(|()| inner))
            }
            TokTyp::Op(OperatorTyp::Sub) => {
                self.toks.next();
                self.factor().map(|inner| Node::Neg(Box::new(inner)))
            }
            TokTyp::Op(OperatorTyp::Add) => {
                self.toks.next();
                self.factor()
            }
            TokTyp::Number => {
                self.toks.next();
                self.number(tok.loc)
            }
            TokTyp::Ident => {
                self.toks.next();
                self.ident(tok.loc)
            }
            TokTyp::Unknown => self.recover(ParseErrTyp::UnexpectedChar, tok.loc),
            // left in place, the caller decides what to do with it
            TokTyp::CloseParen | TokTyp::Op(_) => {
                self.recover(ParseErrTyp::MissingOperand, tok.loc)
            }
        };
        self.depth -= 1;
        node
    }

    fn number(&mut self, loc: SubStr) -> Result<Node, ParseErr> {
        let text = loc.get();
        // everything from a second '.' on is ignored
        let valid = match text.match_indices('.').nth(1) {
            Some((idx, _)) => {
                if self.strict {
                    return Err(ParseErr {
                        typ: ParseErrTyp::InvalidNumber,
                        loc,
                    });
                }
                &text[..idx]
            }
            None => text,
        };
        match valid.parse::<Number>() {
            Ok(val) if val.is_finite() => Ok(Node::Const(val)),
            _ => Err(ParseErr {
                typ: ParseErrTyp::InvalidNumber,
                loc,
            }),
        }
    }

    fn ident(&mut self, loc: SubStr) -> Result<Node, ParseErr> {
        let name = loc.get();
        if name == stdlib::X {
            return Ok(Node::Var(Var::X));
        }
        if name == stdlib::Y {
            return Ok(Node::Var(Var::Y));
        }
        if let Some((_, val)) = stdlib::constant(name) {
            return Ok(Node::Const(val));
        }

        let Some(open) = self.next_if_typ(TokTyp::OpenParen) else {
            return match stdlib::function(name) {
                Some((name, _)) => self.recover(ParseErrTyp::MissingArgs { name }, loc),
                None => self.unknown(loc),
            };
        };
        let arg = self.expr()?;
        self.close_paren(open.loc)?;
        match stdlib::function(name) {
            Some((name, fun)) => Ok(Node::Call {
                name,
                fun,
                arg: Box::new(arg),
                loc,
            }),
            None => self.unknown(loc),
        }
    }

    fn unknown(&self, loc: SubStr) -> Result<Node, ParseErr> {
        let suggestion = stdlib::similar_name(loc.get());
        self.recover(ParseErrTyp::UnknownIdent { suggestion }, loc)
    }
}

fn parse_with(text: &str, strict: bool) -> Result<Program, ParseErr> {
    if strict {
        // implicit multiplication splits unknown words into single letters, so
        // look for them in the raw text where the whole word is still visible
        let raw = Arc::new(text.to_string());
        if let Some(loc) = lex::first_unknown_word(&raw) {
            let suggestion = stdlib::similar_name(loc.get());
            return Err(ParseErr {
                typ: ParseErrTyp::UnknownIdent { suggestion },
                loc,
            });
        }
    }
    let src = Arc::new(lex::preprocess(text));
    let mut parser = Parser::new(&src, strict);
    let root = parser.expr()?;
    if let Some(tok) = parser.toks.next() {
        if strict {
            let typ = match tok.typ {
                TokTyp::Unknown => ParseErrTyp::UnexpectedChar,
                _ => ParseErrTyp::TrailingInput,
            };
            return Err(ParseErr { typ, loc: tok.loc });
        }
        // lenient parsing stops at the first thing it cannot use
    }
    Ok(Program::new(Arc::clone(&src), root))
}

/// Parse leniently.
///
/// Never fails: missing operands and unknown names become zero, parsing stops
/// at the first character that does not fit the grammar, and an expression
/// containing a malformed literal evaluates to zero as a whole.
pub fn parse(text: &str) -> Program {
    match parse_with(text, false) {
        Ok(prog) => prog,
        Err(err) => {
            debug_assert!(err.is_fault(), "lenient parse failed on {err}");
            tracing::debug!(%err, "expression faulted, using constant zero");
            Program::new(err.loc.src(), Node::Const(0.0))
        }
    }
}

/// Parse strictly, reporting the first problem found.
pub fn parse_strict(text: &str) -> Result<Program, ParseErr> {
    parse_with(text, true)
}
