// SPDX: CC0-1.0

use crate::{eval::Fun, Number};
use core::f64::consts;

pub const X: &str = "x";
pub const Y: &str = "y";

pub const FUNCTIONS: &[(&str, Fun)] = &[
    ("sin", Fun::total(Number::sin)),
    ("cos", Fun::total(Number::cos)),
    ("tan", Fun::total(Number::tan)),
    ("log", Fun::partial(Number::ln, positive)),
    ("sqrt", Fun::partial(Number::sqrt, non_negative)),
    ("exp", Fun::total(Number::exp)),
    ("abs", Fun::total(Number::abs)),
];

fn positive(x: Number) -> bool {
    x > 0.0
}

fn non_negative(x: Number) -> bool {
    x >= 0.0
}

pub const CONSTANTS: &[(&str, Number)] = &[("pi", consts::PI), ("e", consts::E)];

/// Names the implicit multiplication pass never splits apart.
pub const NAMES: &[&str] = &["sin", "cos", "tan", "log", "sqrt", "exp", "abs", "pi", "e"];

pub fn function(name: &str) -> Option<(&'static str, Fun)> {
    FUNCTIONS.iter().copied().find(|(n, _)| *n == name)
}

pub fn is_function(name: &str) -> bool {
    function(name).is_some()
}

pub fn is_variable(name: &str) -> bool {
    name == X || name == Y
}

pub fn constant(name: &str) -> Option<(&'static str, Number)> {
    CONSTANTS.iter().copied().find(|(n, _)| *n == name)
}

/// Known name most similar to `text`, if any is reasonably close.
pub fn similar_name(text: &str) -> Option<&'static str> {
    let text = text.to_ascii_lowercase();
    FUNCTIONS
        .iter()
        .map(|(name, _)| *name)
        .chain(CONSTANTS.iter().map(|(name, _)| *name))
        .chain([X, Y])
        .map(|name| (strsim::normalized_damerau_levenshtein(&text, name), name))
        .reduce(|acc, elem| if elem.0 > acc.0 { elem } else { acc })
        .filter(|(sim, _)| *sim > 0.3)
        .map(|(_, name)| name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_function_and_constant_is_a_protected_name() {
        for (name, _) in FUNCTIONS {
            assert!(NAMES.contains(name), "{name}");
        }
        for (name, _) in CONSTANTS {
            assert!(NAMES.contains(name), "{name}");
        }
    }

    #[test]
    fn partial_functions_report_their_domain() {
        let (_, log) = function("log").unwrap();
        assert!(!log.in_domain(0.0));
        assert!(log.in_domain(1.0));
        let (_, sqrt) = function("sqrt").unwrap();
        assert!(sqrt.in_domain(0.0));
        assert!(!sqrt.in_domain(-4.0));
        assert!(function("sin").unwrap().1.in_domain(-1e9));
    }

    #[test]
    fn suggests_close_names() {
        assert_eq!(similar_name("sni"), Some("sin"));
        assert_eq!(similar_name("SQRT"), Some("sqrt"));
        assert_eq!(similar_name("qwertyuiop"), None);
    }
}
