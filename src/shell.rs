// SPDX: CC0-1.0

use crate::{
    eval::{EvalErr, EvalErrTyp, Program, Var},
    lex::SubStr,
    parse::{ParseErr, ParseErrTyp},
    session::Expression,
};
use anyhow::Context;
use core::fmt;
use std::{
    io::{self, BufRead, Write},
    sync::Arc,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    Add,
    Remove,
    Clear,
    List,
    Window,
    Pan,
    Zoom,
    ZoomIn,
    ZoomOut,
    Reset,
    Plot,
    PrintProg,
    Eval,
}

impl Command {
    pub const fn exhaustive() -> &'static [Command] {
        &[
            Self::Help,
            Self::Quit,
            Self::Add,
            Self::Remove,
            Self::Clear,
            Self::List,
            Self::Window,
            Self::Pan,
            Self::Zoom,
            Self::ZoomIn,
            Self::ZoomOut,
            Self::Reset,
            Self::Plot,
            Self::PrintProg,
            Self::Eval,
        ]
    }

    pub const fn help(&self) -> &'static str {
        match self {
            Self::Help => "display help for each command",
            Self::Quit => "quit the shell",
            Self::Add => "add an expression to plot",
            Self::Remove => "remove one expression by id",
            Self::Clear => "remove all expressions",
            Self::List => "list expressions with their ids and colors",
            Self::Window => "set the visible window",
            Self::Pan => "move the view as if dragged by some pixels",
            Self::Zoom => "zoom by a factor about a screen point",
            Self::ZoomIn => "zoom in about the center",
            Self::ZoomOut => "zoom out about the center",
            Self::Reset => "reset the window to its default",
            Self::Plot => "write the current frame to an svg file",
            Self::PrintProg => "print the parsed tree of an expression (for debugging)",
            Self::Eval => "evaluate an expression at a point, reporting problems",
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Quit => "quit",
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Clear => "clear",
            Self::List => "list",
            Self::Window => "window",
            Self::Pan => "pan",
            Self::Zoom => "zoom",
            Self::ZoomIn => "in",
            Self::ZoomOut => "out",
            Self::Reset => "reset",
            Self::Plot => "plot",
            Self::PrintProg => "prog",
            Self::Eval => "eval",
        }
    }

    /// Command whose name is closest to `s`, if any is reasonably close.
    pub fn similar(s: &str) -> Option<Command> {
        Self::exhaustive()
            .iter()
            .map(|c| (strsim::normalized_damerau_levenshtein(s, c.name()), *c))
            .reduce(|acc, elem| if elem.0 > acc.0 { elem } else { acc })
            .filter(|(sim, _)| *sim > 0.3)
            .map(|(_, c)| c)
    }
}

impl core::str::FromStr for Command {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        for c in Self::exhaustive() {
            if s == c.name() {
                return Ok(*c);
            }
        }
        Err(())
    }
}

/// Prompt for a line. `None` once the input is exhausted.
pub fn input<R: BufRead, W: Write>(
    mut inp: R,
    mut out: W,
    prompt: impl fmt::Display,
) -> anyhow::Result<Option<String>> {
    write!(out, "{prompt}").context("write to standard output failed")?;
    out.flush().context("write to standard output failed")?;
    let mut s = String::new();
    let read = inp
        .read_line(&mut s)
        .context("read from standard input failed")?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(s.trim().to_string()))
}

pub fn read_fromstr<R: BufRead, W: Write, T: core::str::FromStr>(
    inp: R,
    mut out: W,
    prompt: impl fmt::Display,
    ignore_empty: bool,
) -> anyhow::Result<Result<Option<T>, <T as core::str::FromStr>::Err>>
where
    <T as core::str::FromStr>::Err: fmt::Display,
{
    let Some(input) = input(inp, &mut out, prompt)? else {
        return Ok(Ok(None));
    };
    let input = Arc::new(input);
    if ignore_empty && input.is_empty() {
        return Ok(Ok(None));
    }
    match input.parse::<T>() {
        Ok(new) => Ok(Ok(Some(new))),
        Err(err) => {
            writeln!(out)?;
            underline(&mut out, &SubStr::all(input))?;
            writeln!(out, "parse error: {err}")?;
            Ok(Err(err))
        }
    }
}

pub fn underline<W: Write>(mut out: W, span: &SubStr) -> io::Result<()> {
    writeln!(out, "{}", span.src())?;
    writeln!(
        out,
        "{}{}",
        " ".repeat(span.start()),
        // zero-width spans point just past the text
        "^".repeat(span.len().max(1))
    )?;
    Ok(())
}

pub fn report_parse_err<W: Write>(mut out: W, err: &ParseErr) -> io::Result<()> {
    writeln!(out)?;
    underline(&mut out, &err.loc)?;
    writeln!(out, "parse error: {err}")?;
    match err.typ {
        ParseErrTyp::UnexpectedChar => writeln!(
            out,
            "note: available tokens are numbers, letters, and the symbols +-*/^()"
        )?,
        ParseErrTyp::InvalidNumber => writeln!(out, "note: parsing as floating point number")?,
        ParseErrTyp::UnknownIdent { .. } => writeln!(
            out,
            "note: repeated letters such as 'xx' form one name; write 'x*x' or 'x^2'"
        )?,
        ParseErrTyp::TrailingInput
        | ParseErrTyp::MissingOperand
        | ParseErrTyp::UnclosedParen
        | ParseErrTyp::MissingArgs { .. }
        | ParseErrTyp::TooDeep => {}
    }
    Ok(())
}

pub fn report_eval_err<W: Write>(mut out: W, prog: &Program, err: &EvalErr) -> io::Result<()> {
    let src = Arc::new(prog.src().to_string());
    // NOTE(unicode)
    let loc = err
        .loc
        .clone()
        .unwrap_or_else(|| SubStr::end_of(Arc::clone(&src)));
    underline(&mut out, &loc)?;
    writeln!(out, "evaluation error: {err}")?;
    match err.typ {
        EvalErrTyp::DivByZero | EvalErrTyp::Domain { .. } => {
            writeln!(out, "note: when plotting, this evaluates to 0")?
        }
        EvalErrTyp::NotFinite => writeln!(out, "note: when plotting, this point is skipped")?,
    }
    Ok(())
}

pub fn dump_program<W: Write>(
    mut out: W,
    prog: &Program,
    title: core::fmt::Arguments,
) -> io::Result<()> {
    writeln!(out, "{title}: ")?;
    writeln!(out, "  text: {}", prog.src())?;
    writeln!(out, "  tree: {prog}")?;
    let vars: Vec<String> = [Var::X, Var::Y]
        .into_iter()
        .filter(|var| prog.root().uses(*var))
        .map(|var| var.to_string())
        .collect();
    if vars.is_empty() {
        writeln!(out, "  uses: (nothing)")?;
    } else {
        writeln!(out, "  uses: {}", vars.join(", "))?;
    }
    Ok(())
}

pub fn list_expressions<'a, W: Write>(
    mut out: W,
    exprs: impl Iterator<Item = &'a Expression>,
) -> io::Result<()> {
    let mut any = false;
    for expr in exprs {
        any = true;
        writeln!(
            out,
            "{id} {color} {kind:?}: {text}",
            id = expr.id,
            color = expr.color,
            kind = expr.kind,
            text = expr.text,
        )?;
    }
    if !any {
        writeln!(out, "no expressions")?;
    }
    Ok(())
}

pub fn expr_undefined<W: Write>(mut out: W, id: impl fmt::Display) -> io::Result<()> {
    writeln!(out, "error: no expression has id {id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    #[test]
    fn commands_round_trip_through_names() {
        for c in Command::exhaustive() {
            assert_eq!(c.name().parse::<Command>(), Ok(*c));
        }
        assert_eq!("plto".parse::<Command>(), Err(()));
        assert_eq!(Command::similar("plto"), Some(Command::Plot));
        assert_eq!(Command::similar("lst"), Some(Command::List));
    }

    #[test]
    fn input_reports_end_of_input() {
        let mut out = Vec::new();
        assert_eq!(input(&b"  add \n"[..], &mut out, "> ").unwrap(), Some("add".into()));
        assert_eq!(input(&b""[..], &mut out, "> ").unwrap(), None);
        assert_eq!(out, b"> > ");
    }

    #[test]
    fn read_fromstr_underlines_bad_input() {
        let mut out = Vec::new();
        let got = read_fromstr::<_, _, f64>(&b"1.5x\n"[..], &mut out, "? ", true).unwrap();
        assert!(got.is_err());
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("1.5x\n^^^^\nparse error"));

        let mut out = Vec::new();
        let got = read_fromstr::<_, _, f64>(&b"\n"[..], &mut out, "? ", true).unwrap();
        assert_eq!(got, Ok(None));
    }

    #[test]
    fn parse_errors_point_at_the_problem() {
        let err = parse::parse_strict("1+2#3").unwrap_err();
        let mut out = Vec::new();
        report_parse_err(&mut out, &err).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("1+2#3\n   ^\n"));
        assert!(out.contains("parse error: unexpected character '#'"));
        assert!(out.contains("note: available tokens"));
    }

    #[test]
    fn glued_letters_are_explained_as_one_name() {
        let err = parse::parse_strict("xx+1").unwrap_err();
        let mut out = Vec::new();
        report_parse_err(&mut out, &err).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("xx+1\n^^\n"));
        assert!(out.contains("'xx' form one name; write 'x*x' or 'x^2'"));
        assert!(!out.contains("multiply only"));
    }

    #[test]
    fn eval_errors_point_at_the_operation() {
        let prog = parse::parse("1+1/0");
        let err = prog.eval_strict(Default::default()).unwrap_err();
        let mut out = Vec::new();
        report_eval_err(&mut out, &prog, &err).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("1+1/0\n   ^\n"));
        assert!(out.contains("evaluation error: division by zero"));
    }

    #[test]
    fn dumps_tree_and_variables() {
        let mut out = Vec::new();
        dump_program(&mut out, &parse::parse("2x"), format_args!("#0")).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert_eq!(out, "#0: \n  text: 2*x\n  tree: (* 2 x)\n  uses: x\n");
    }
}
