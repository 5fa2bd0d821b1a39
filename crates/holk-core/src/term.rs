//! The named surface syntax, exchanged with parsers and printers.

use itertools::Itertools;
use std::fmt;

use crate::{Const, Var};

/// Surface terms.
///
/// Binders are referred to by name. Surface terms are not trusted: the kernel
/// checks them for wellformedness before converting them into [`crate::Tm`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// A variable applied to parameters, eg. `F[x, y]`
    ///
    /// Bound variables never carry parameters.
    Var(Var, Vec<Term>),
    /// A constant with binders and parameters, eg. `all(x. P[x])`
    Const(Const, Vec<Var>, Vec<Term>),
}

impl Term {
    /// Construct a variable applied to parameters.
    pub fn var(var: Var, params: Vec<Term>) -> Term {
        Term::Var(var, params)
    }

    /// Construct a variable without parameters.
    pub fn leaf(var: Var) -> Term {
        Term::Var(var, Vec::new())
    }

    /// Construct a constant application.
    pub fn constant(konst: Const, binders: Vec<Var>, params: Vec<Term>) -> Term {
        Term::Const(konst, binders, params)
    }

    /// Construct a constant without binders or parameters.
    pub fn atom(konst: Const) -> Term {
        Term::Const(konst, Vec::new(), Vec::new())
    }

    /// Does the constant occur anywhere in this term?
    pub fn mentions_const(&self, konst: &Const) -> bool {
        match self {
            Term::Var(_, params) => params.iter().any(|param| param.mentions_const(konst)),
            Term::Const(c, _, params) => {
                c == konst || params.iter().any(|param| param.mentions_const(konst))
            },
        }
    }

    /// The number of nodes in the term.
    pub fn size(&self) -> usize {
        match self {
            Term::Var(_, params) | Term::Const(_, _, params) => {
                1 + params.iter().map(Term::size).sum::<usize>()
            },
        }
    }
}

/// Prints the generic form, eg. `F[x]`, `eq(a, b)` or `all(x. P[x])`.
impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Var(var, params) if params.is_empty() => write!(f, "{}", var),
            Term::Var(var, params) => write!(f, "{}[{}]", var, params.iter().join(", ")),
            Term::Const(konst, binders, params) if binders.is_empty() && params.is_empty() => {
                write!(f, "{}", konst)
            },
            Term::Const(konst, binders, params) if binders.is_empty() => {
                write!(f, "{}({})", konst, params.iter().join(", "))
            },
            Term::Const(konst, binders, params) => write!(
                f,
                "{}({}. {})",
                konst,
                binders.iter().join(" "),
                params.iter().join(", "),
            ),
        }
    }
}

/// A surface term abstracted over a list of hole variables.
///
/// This is the named counterpart of [`crate::TmWithHoles`], used to describe
/// the replacement of a variable with parameters: `F ↦ [x, y] body`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermWithHoles {
    pub holes: Vec<Var>,
    pub body: Term,
}

impl TermWithHoles {
    pub fn new(holes: Vec<Var>, body: Term) -> TermWithHoles {
        TermWithHoles { holes, body }
    }

    /// A replacement without holes.
    pub fn closed(body: Term) -> TermWithHoles {
        TermWithHoles::new(Vec::new(), body)
    }
}

impl fmt::Display for TermWithHoles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.holes.is_empty() {
            write!(f, "{}", self.body)
        } else {
            write!(f, "[{}] {}", self.holes.iter().join(", "), self.body)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Var {
        Var::parse(name).unwrap()
    }

    fn konst(name: &str) -> Const {
        Const::parse(name).unwrap()
    }

    #[test]
    fn display_generic_form() {
        let p = Term::var(var("P"), vec![Term::leaf(var("x"))]);
        let all = Term::constant(konst("all"), vec![var("x")], vec![p.clone()]);
        let eq = Term::constant(konst("eq"), vec![], vec![Term::leaf(var("a")), all.clone()]);

        assert_eq!(p.to_string(), "P[x]");
        assert_eq!(all.to_string(), "all(x. P[x])");
        assert_eq!(eq.to_string(), "eq(a, all(x. P[x]))");
        assert_eq!(Term::atom(konst("nat.zero")).to_string(), "nat.zero");
    }

    #[test]
    fn mentions_const() {
        let zero = konst("zero");
        let term = Term::var(var("F"), vec![Term::atom(zero.clone())]);
        assert!(term.mentions_const(&zero));
        assert!(!term.mentions_const(&konst("one")));
        assert_eq!(term.size(), 2);
    }
}
