// SPDX: CC0-1.0

use crate::{lex::SubStr, parse, Number};
use core::fmt;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperatorTyp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl OperatorTyp {
    pub const fn symbol(&self) -> char {
        match self {
            Self::Add => '+',
            Self::Sub => '-',
            Self::Mul => '*',
            Self::Div => '/',
            Self::Pow => '^',
        }
    }

    /// Apply the operator. Division by zero saturates to zero.
    pub fn apply(&self, lhs: Number, rhs: Number) -> Number {
        match self {
            Self::Add => lhs + rhs,
            Self::Sub => lhs - rhs,
            Self::Mul => lhs * rhs,
            Self::Div => {
                if rhs != 0.0 {
                    lhs / rhs
                } else {
                    0.0
                }
            }
            Self::Pow => lhs.powf(rhs),
        }
    }
}

/// Unary real function, optionally restricted to a domain.
#[derive(Clone, Copy, Debug)]
pub struct Fun {
    fun: fn(Number) -> Number,
    domain: Option<fn(Number) -> bool>,
}

impl Fun {
    pub const fn total(fun: fn(Number) -> Number) -> Self {
        Self { fun, domain: None }
    }

    pub const fn partial(fun: fn(Number) -> Number, domain: fn(Number) -> bool) -> Self {
        Self {
            fun,
            domain: Some(domain),
        }
    }

    pub fn in_domain(&self, arg: Number) -> bool {
        self.domain.map_or(true, |domain| domain(arg))
    }

    /// Outside its domain a function evaluates to zero.
    pub fn apply(&self, arg: Number) -> Number {
        if self.in_domain(arg) {
            (self.fun)(arg)
        } else {
            0.0
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Var {
    X,
    Y,
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => f.write_str(crate::stdlib::X),
            Self::Y => f.write_str(crate::stdlib::Y),
        }
    }
}

/// Values of the free variables for one evaluation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bindings {
    pub x: Number,
    pub y: Number,
}

impl Bindings {
    #[inline]
    pub const fn new(x: Number, y: Number) -> Self {
        Self { x, y }
    }

    /// Binds `x`, leaving `y` at zero.
    #[inline]
    pub const fn x(x: Number) -> Self {
        Self { x, y: 0.0 }
    }

    #[inline]
    pub const fn get(&self, var: Var) -> Number {
        match var {
            Var::X => self.x,
            Var::Y => self.y,
        }
    }
}

/// One `op rhs` step of a [`Node::Chain`].
#[derive(Clone, Debug)]
pub struct Link {
    pub op: OperatorTyp,
    pub rhs: Node,
    pub loc: SubStr,
}

#[derive(Clone, Debug)]
pub enum Node {
    Const(Number),
    Var(Var),
    Neg(Box<Node>),
    /// Operators of equal precedence, applied left to right. A chain is
    /// stored flat so its length never turns into recursion depth.
    Chain {
        first: Box<Node>,
        rest: Vec<Link>,
    },
    Call {
        name: &'static str,
        fun: Fun,
        arg: Box<Node>,
        loc: SubStr,
    },
}

impl Node {
    pub fn value(&self, vars: Bindings) -> Number {
        match self {
            Self::Const(val) => *val,
            Self::Var(var) => vars.get(*var),
            Self::Neg(inner) => -inner.value(vars),
            Self::Chain { first, rest } => rest.iter().fold(first.value(vars), |acc, link| {
                link.op.apply(acc, link.rhs.value(vars))
            }),
            Self::Call { fun, arg, .. } => fun.apply(arg.value(vars)),
        }
    }

    pub fn value_strict(&self, vars: Bindings) -> Result<Number, EvalErr> {
        match self {
            Self::Const(val) => Ok(*val),
            Self::Var(var) => Ok(vars.get(*var)),
            Self::Neg(inner) => Ok(-inner.value_strict(vars)?),
            Self::Chain { first, rest } => {
                let mut acc = first.value_strict(vars)?;
                for Link { op, rhs, loc } in rest {
                    let rhs = rhs.value_strict(vars)?;
                    if *op == OperatorTyp::Div && rhs == 0.0 {
                        return Err(EvalErr {
                            typ: EvalErrTyp::DivByZero,
                            loc: Some(loc.clone()),
                        });
                    }
                    acc = op.apply(acc, rhs);
                }
                Ok(acc)
            }
            Self::Call {
                name,
                fun,
                arg,
                loc,
            } => {
                let arg = arg.value_strict(vars)?;
                if !fun.in_domain(arg) {
                    return Err(EvalErr {
                        typ: EvalErrTyp::Domain { name: *name, arg },
                        loc: Some(loc.clone()),
                    });
                }
                Ok(fun.apply(arg))
            }
        }
    }

    /// Whether the tree reads the given variable anywhere.
    pub fn uses(&self, var: Var) -> bool {
        match self {
            Self::Const(_) => false,
            Self::Var(v) => *v == var,
            Self::Neg(inner) => inner.uses(var),
            Self::Chain { first, rest } => {
                first.uses(var) || rest.iter().any(|link| link.rhs.uses(var))
            }
            Self::Call { arg, .. } => arg.uses(var),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const(val) => write!(f, "{val}"),
            Self::Var(var) => write!(f, "{var}"),
            Self::Neg(inner) => write!(f, "(neg {inner})"),
            // same text as nested binary nodes, written without recursing
            // along the chain
            Self::Chain { first, rest } => {
                for link in rest.iter().rev() {
                    write!(f, "({} ", link.op.symbol())?;
                }
                write!(f, "{first}")?;
                for link in rest {
                    write!(f, " {})", link.rhs)?;
                }
                Ok(())
            }
            Self::Call { name, arg, .. } => write!(f, "({name} {arg})"),
        }
    }
}

/// Outcome of evaluating at one sample point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Sample {
    Value(Number),
    /// NaN or infinite.
    Invalid,
}

impl Sample {
    pub fn value(self) -> Option<Number> {
        match self {
            Self::Value(val) => Some(val),
            Self::Invalid => None,
        }
    }
}

impl From<Number> for Sample {
    fn from(val: Number) -> Self {
        if val.is_finite() {
            Self::Value(val)
        } else {
            Self::Invalid
        }
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(val) => write!(f, "{val}"),
            Self::Invalid => f.write_str("invalid"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EvalErrTyp {
    DivByZero,
    Domain { name: &'static str, arg: Number },
    NotFinite,
}

#[derive(Debug, Clone)]
pub struct EvalErr {
    pub typ: EvalErrTyp,
    pub loc: Option<SubStr>, // if none, associated with the final result
}

impl fmt::Display for EvalErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.typ {
            EvalErrTyp::DivByZero => write!(f, "division by zero"),
            EvalErrTyp::Domain { name, arg } => {
                write!(f, "{arg} is outside the domain of function '{name}'")
            }
            EvalErrTyp::NotFinite => write!(f, "result is not a finite number"),
        }
    }
}

impl std::error::Error for EvalErr {}

/// Parsed expression, evaluated as many times as needed.
#[derive(Clone, Debug)]
pub struct Program {
    src: Arc<String>,
    root: Node,
}

impl Program {
    #[inline]
    pub const fn new(src: Arc<String>, root: Node) -> Self {
        Self { src, root }
    }

    /// Preprocessed text the program was parsed from.
    #[inline]
    pub fn src(&self) -> &str {
        &self.src
    }

    #[inline]
    pub const fn root(&self) -> &Node {
        &self.root
    }

    pub fn eval(&self, vars: Bindings) -> Sample {
        Sample::from(self.root.value(vars))
    }

    /// Like [`Program::eval`], but reports division by zero, out-of-domain
    /// arguments and non-finite results instead of absorbing them.
    pub fn eval_strict(&self, vars: Bindings) -> Result<Number, EvalErr> {
        let val = self.root.value_strict(vars)?;
        if val.is_finite() {
            Ok(val)
        } else {
            Err(EvalErr {
                typ: EvalErrTyp::NotFinite,
                loc: None,
            })
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}

/// Parse leniently and evaluate once.
pub fn evaluate(text: &str, x: Number, y: Number) -> Sample {
    parse::parse(text).eval(Bindings::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts;

    fn value(text: &str, x: Number) -> Number {
        evaluate(text, x, 0.0).value().unwrap()
    }

    #[test]
    fn respects_precedence() {
        assert_eq!(value("2+3*4", 0.0), 14.0);
        assert_eq!(value("(2+3)*4", 0.0), 20.0);
        assert_eq!(value("10-4-3", 0.0), 3.0);
        assert_eq!(value("2*3^2", 0.0), 36.0);
    }

    #[test]
    fn power_is_left_associative() {
        assert_eq!(value("2^3^2", 0.0), 64.0);
    }

    #[test]
    fn implicit_multiplication() {
        assert_eq!(value("2x", 5.0), 10.0);
        assert_eq!(value("xsin(x)", 0.0), 0.0);
        assert!((value("xsin(x)", 2.0) - 2.0 * 2.0_f64.sin()).abs() < 1e-12);
        assert_eq!(value("3(x+1)", 1.0), 6.0);
    }

    #[test]
    fn domain_and_division_leniency() {
        assert_eq!(value("sqrt(-4)", 0.0), 0.0);
        assert_eq!(value("log(0)", 0.0), 0.0);
        assert_eq!(value("log(-1)", 0.0), 0.0);
        assert_eq!(value("5/0", 0.0), 0.0);
        assert_eq!(value("0/0", 0.0), 0.0);
        assert_eq!(value("sqrt(16)", 0.0), 4.0);
    }

    #[test]
    fn constants_and_functions() {
        assert!((value("pi", 0.0) - consts::PI).abs() < 1e-12);
        assert!((value("e", 0.0) - consts::E).abs() < 1e-12);
        assert!((value("log(e)", 0.0) - 1.0).abs() < 1e-12);
        assert_eq!(value("abs(-3)", 0.0), 3.0);
        assert_eq!(value("exp(0)", 0.0), 1.0);
        assert!((value("cos(pi)", 0.0) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn unknown_names_are_zero() {
        assert_eq!(value("foo", 0.0), 0.0);
        assert_eq!(value("1+sin", 0.0), 1.0);
        assert_eq!(value("xx", 3.0), 0.0);
    }

    #[test]
    fn non_finite_results_are_invalid() {
        assert_eq!(evaluate("0^(0-1)", 0.0, 0.0), Sample::Invalid);
        assert_eq!(evaluate("exp(1000)", 0.0, 0.0), Sample::Invalid);
        assert_eq!(evaluate("(0-1)^0.5", 0.0, 0.0), Sample::Invalid);
    }

    #[test]
    fn binds_y() {
        assert_eq!(evaluate("x^2+y^2-25", 3.0, 4.0), Sample::Value(0.0));
        assert_eq!(evaluate("y", 1.0, 0.0), Sample::Value(0.0));
    }

    #[test]
    fn strict_evaluation_reports_problems() {
        let prog = parse::parse("1/x");
        let err = prog.eval_strict(Bindings::x(0.0)).unwrap_err();
        assert_eq!(err.typ, EvalErrTyp::DivByZero);
        assert_eq!(err.loc.unwrap().get(), "/");

        let prog = parse::parse("sqrt(x)");
        let err = prog.eval_strict(Bindings::x(-4.0)).unwrap_err();
        assert_eq!(
            err.typ,
            EvalErrTyp::Domain {
                name: "sqrt",
                arg: -4.0
            }
        );
        assert_eq!(prog.eval_strict(Bindings::x(9.0)).unwrap(), 3.0);

        let err = parse::parse("exp(x)")
            .eval_strict(Bindings::x(1000.0))
            .unwrap_err();
        assert_eq!(err.typ, EvalErrTyp::NotFinite);
        assert!(err.loc.is_none());
    }

    #[test]
    fn tracks_variable_usage() {
        let prog = parse::parse("x*sin(y)");
        assert!(prog.root().uses(Var::X));
        assert!(prog.root().uses(Var::Y));
        assert!(!parse::parse("2+pi").root().uses(Var::X));
    }

    #[test]
    fn dumps_as_prefix_notation() {
        assert_eq!(parse::parse("2x+sin(-x)").to_string(), "(+ (* 2 x) (sin (neg x)))");
        assert_eq!(parse::parse("1-2-3").to_string(), "(- (- 1 2) 3)");
    }

    #[test]
    fn long_sums_do_not_recurse() {
        let terms = 100_000;
        let text = format!("{}x", "x+".repeat(terms));
        assert_eq!(evaluate(&text, 1.0, 0.0), Sample::Value((terms + 1) as Number));

        let prog = parse::parse_strict(&text).unwrap();
        assert_eq!(
            prog.eval_strict(Bindings::x(2.0)).unwrap(),
            2.0 * (terms + 1) as Number
        );
        assert!(prog.root().uses(Var::X));
        assert!(!prog.root().uses(Var::Y));
        let dump = prog.to_string();
        assert!(dump.starts_with("(+ (+ (+ "));
        assert!(dump.ends_with(" x) x) x)"));
        assert_eq!(dump.matches('+').count(), terms);

        // the failing step is still located inside a long chain
        let text = format!("{}1/x", "x*".repeat(terms));
        let err = parse::parse_strict(&text)
            .unwrap()
            .eval_strict(Bindings::x(0.0))
            .unwrap_err();
        assert_eq!(err.typ, EvalErrTyp::DivByZero);
        assert_eq!(err.loc.unwrap().get(), "/");
    }
}
