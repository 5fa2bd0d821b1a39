use std::error::Error;
use std::fmt;

use crate::{Const, HeadError, Term, Var, WellformednessError};

/// A rejected kernel operation.
#[derive(Debug, Clone, PartialEq)]
pub enum KernelError {
    UnknownConstant(Const),
    AlreadyDeclared(Const),
    AlreadySealed(Const),
    /// A definition mentions variables that are not parameters of the head
    NotCoveredByHead { constant: Const, term: Term },
    /// A theorem that was not established in the context it is used in
    InvalidTheorem(Term),
    UnprovedObligation(Term),
    NotAnImplication(Term),
    AntecedentMismatch { expected: Term, found: Term },
    NotAnExistential(Term),
    NotClosed(Term),
    AxiomOutOfRange(usize),
    EmptyJoin,
    JoinConflict(Const),
    /// A substitution image whose hole count differs from the variable's arity
    SubstitutionArity(Var),
    /// A substitution image with dangling indices beyond its holes
    SubstitutionNotClosed(Var),
    SubstitutionOfBound,
    ContextOutOfRange(usize),
    NotAChild,
    CannotLiftPastJoin,
    CannotLiftBinders(Const),
    CannotLiftAssumption(Term),
    Head(HeadError),
    Wellformedness(WellformednessError),
}

impl From<HeadError> for KernelError {
    fn from(src: HeadError) -> KernelError {
        KernelError::Head(src)
    }
}

impl From<WellformednessError> for KernelError {
    fn from(src: WellformednessError) -> KernelError {
        KernelError::Wellformedness(src)
    }
}

impl Error for KernelError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            KernelError::Head(error) => Some(error),
            KernelError::Wellformedness(error) => Some(error),
            _ => None,
        }
    }
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::UnknownConstant(konst) => write!(f, "unknown constant `{}`", konst),
            KernelError::AlreadyDeclared(konst) => write!(f, "already declared: `{}`", konst),
            KernelError::AlreadySealed(konst) => write!(f, "already sealed: `{}`", konst),
            KernelError::NotCoveredByHead { constant, term } => write!(
                f,
                "`{}` has free variables that are not parameters of `{}`",
                term, constant,
            ),
            KernelError::InvalidTheorem(prop) => {
                write!(f, "theorem `{}` is not valid in this context", prop)
            },
            KernelError::UnprovedObligation(prop) => {
                write!(f, "could not prove the obligation `{}`", prop)
            },
            KernelError::NotAnImplication(prop) => write!(f, "not an implication: `{}`", prop),
            KernelError::AntecedentMismatch { expected, found } => write!(
                f,
                "antecedent mismatch, expected `{}`, but found `{}`",
                expected, found,
            ),
            KernelError::NotAnExistential(prop) => write!(f, "not an existential: `{}`", prop),
            KernelError::NotClosed(prop) => write!(f, "not closed: `{}`", prop),
            KernelError::AxiomOutOfRange(index) => write!(f, "no axiom at index {}", index),
            KernelError::EmptyJoin => write!(f, "cannot join an empty list of contexts"),
            KernelError::JoinConflict(konst) => {
                write!(f, "conflicting definitions of `{}` in joined contexts", konst)
            },
            KernelError::SubstitutionArity(var) => {
                write!(f, "substitution image for `{}` has the wrong number of holes", var)
            },
            KernelError::SubstitutionNotClosed(var) => {
                write!(f, "substitution image for `{}` is not closed", var)
            },
            KernelError::SubstitutionOfBound => {
                write!(f, "theorems can only be instantiated at free variables")
            },
            KernelError::ContextOutOfRange(index) => write!(f, "no context at index {}", index),
            KernelError::NotAChild => write!(f, "context does not extend the end of the chain"),
            KernelError::CannotLiftPastJoin => write!(f, "cannot lift a theorem past a join"),
            KernelError::CannotLiftBinders(konst) => {
                write!(f, "cannot lift past `{}`, which has binders", konst)
            },
            KernelError::CannotLiftAssumption(hyp) => write!(
                f,
                "cannot lift past assumption `{}`, which has parametrized variables",
                hyp,
            ),
            KernelError::Head(err) => err.fmt(f),
            KernelError::Wellformedness(err) => err.fmt(f),
        }
    }
}
