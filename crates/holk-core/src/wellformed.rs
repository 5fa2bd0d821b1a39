//! Wellformedness of surface terms.
//!
//! The rules are:
//!
//! - a name bound in the current scope may only appear as a leaf
//! - a free variable must be used with the same number of parameters
//!   everywhere, and its parameters are checked in the same scope
//! - a constant must match its [`Head`] exactly in binder and parameter
//!   count, and must not bind the same name twice
//! - while checking parameter `i` of a constant, the visible binders are the
//!   outer ones plus the binders the head declares accessible for slot `i`
//!
//! Referring to a binder that is in scope but not accessible from the current
//! parameter is an error, even if an outer binder of the same name exists.

use std::error::Error;
use std::fmt;

use crate::{Const, FreeVars, Head, Signature, Term, TermWithHoles, Var};

/// An error produced during wellformedness checking.
#[derive(Debug, Clone, PartialEq)]
pub enum WellformednessError {
    UnknownConstant(Const),
    HeadMismatch {
        constant: Const,
        expected_binders: usize,
        found_binders: usize,
        expected_params: usize,
        found_params: usize,
    },
    DuplicateBinder(Var),
    BoundVarWithParams(Var),
    InaccessibleBinder(Var),
    ArityMismatch(Var),
}

impl Error for WellformednessError {}

impl fmt::Display for WellformednessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WellformednessError::UnknownConstant(konst) => {
                write!(f, "unknown constant `{}`", konst)
            },
            WellformednessError::HeadMismatch {
                constant,
                expected_binders,
                found_binders,
                expected_params,
                found_params,
            } => write!(
                f,
                "`{}` expects {} binders and {} parameters, found {} binders and {} parameters",
                constant, expected_binders, expected_params, found_binders, found_params,
            ),
            WellformednessError::DuplicateBinder(var) => write!(f, "duplicate binder `{}`", var),
            WellformednessError::BoundVarWithParams(var) => {
                write!(f, "bound variable `{}` applied to parameters", var)
            },
            WellformednessError::InaccessibleBinder(var) => {
                write!(f, "binder `{}` is not accessible here", var)
            },
            WellformednessError::ArityMismatch(var) => {
                write!(f, "variable `{}` used with inconsistent arities", var)
            },
        }
    }
}

enum Lookup {
    Bound,
    /// Only inaccessible binders carry the name
    Inaccessible,
    Free,
}

/// The binders in scope, innermost last.
#[derive(Debug, Clone, Default)]
struct Scope {
    entries: Vec<(Var, bool)>,
}

impl Scope {
    /// Resolve a name against the innermost accessible binder. Inaccessible
    /// binders are skipped, so they never hide an outer binder.
    fn lookup(&self, var: &Var) -> Lookup {
        let mut hidden = false;
        for (name, accessible) in self.entries.iter().rev() {
            if name == var {
                if *accessible {
                    return Lookup::Bound;
                }
                hidden = true;
            }
        }
        if hidden {
            Lookup::Inaccessible
        } else {
            Lookup::Free
        }
    }

    fn enter(&self, head: &Head, param: usize, binders: &[Var]) -> Scope {
        let mut scope = self.clone();
        scope.entries.extend(
            binders
                .iter()
                .enumerate()
                .map(|(position, binder)| (binder.clone(), head.is_accessible(param, position))),
        );
        scope
    }
}

/// Check that a term is wellformed, returning its free variables along with
/// their arities.
pub fn check_wellformedness(
    term: &Term,
    signature: &impl Signature,
) -> Result<FreeVars, WellformednessError> {
    let mut frees = FreeVars::new();
    check_term(signature, &Scope::default(), &mut frees, term)?;
    Ok(frees)
}

/// Check a term abstracted over holes. The holes are in scope as accessible
/// binders, and are not part of the returned free variables.
pub(crate) fn check_with_holes(
    term: &TermWithHoles,
    signature: &impl Signature,
) -> Result<FreeVars, WellformednessError> {
    check_distinct(&term.holes)?;
    let scope = Scope {
        entries: term.holes.iter().map(|hole| (hole.clone(), true)).collect(),
    };
    let mut frees = FreeVars::new();
    check_term(signature, &scope, &mut frees, &term.body)?;
    Ok(frees)
}

fn check_distinct(binders: &[Var]) -> Result<(), WellformednessError> {
    for (i, binder) in binders.iter().enumerate() {
        if binders[..i].contains(binder) {
            return Err(WellformednessError::DuplicateBinder(binder.clone()));
        }
    }
    Ok(())
}

fn check_term(
    signature: &impl Signature,
    scope: &Scope,
    frees: &mut FreeVars,
    term: &Term,
) -> Result<(), WellformednessError> {
    match term {
        Term::Var(var, params) => match scope.lookup(var) {
            Lookup::Bound if params.is_empty() => Ok(()),
            Lookup::Bound => Err(WellformednessError::BoundVarWithParams(var.clone())),
            Lookup::Inaccessible => Err(WellformednessError::InaccessibleBinder(var.clone())),
            Lookup::Free => {
                if !frees.add(var.clone(), params.len()) {
                    return Err(WellformednessError::ArityMismatch(var.clone()));
                }
                params
                    .iter()
                    .try_for_each(|param| check_term(signature, scope, frees, param))
            },
        },
        Term::Const(konst, binders, params) => {
            let head = signature
                .head(konst)
                .ok_or_else(|| WellformednessError::UnknownConstant(konst.clone()))?;

            if head.binders().len() != binders.len() || head.params().len() != params.len() {
                return Err(WellformednessError::HeadMismatch {
                    constant: konst.clone(),
                    expected_binders: head.binders().len(),
                    found_binders: binders.len(),
                    expected_params: head.params().len(),
                    found_params: params.len(),
                });
            }
            check_distinct(binders)?;

            for (index, param) in params.iter().enumerate() {
                let scope = scope.enter(head, index, binders);
                check_term(signature, &scope, frees, param)?;
            }
            Ok(())
        },
    }
}
