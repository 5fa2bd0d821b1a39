//! The internal, locally nameless term representation.
//!
//! Bound variables are de Bruijn indices. A constant node with `k` binders
//! introduces `k` indices in every one of its parameters: inside a parameter,
//! the binder at position `j` is `Bound(k - 1 - j)`. Which of those binders a
//! parameter may actually mention is a matter of wellformedness, and is
//! checked before a [`Term`] is converted.
//!
//! Binder names are kept as hints for printing, but are ignored by equality,
//! ordering and hashing, so `==` on `Tm` is alpha-equivalence.

use itertools::Itertools;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::{Const, FreeVars, Signature, Term, Var};

/// Internal terms.
#[derive(Debug, Clone)]
pub enum Tm {
    /// A bound variable, as a de Bruijn index
    Bound(usize),
    /// A free variable applied to parameters
    Free(Var, Vec<Tm>),
    /// A constant with binder name hints and parameters
    Const(Const, Vec<Var>, Vec<Tm>),
}

impl Tm {
    /// Convert a term that is known to be wellformed in `signature`.
    pub(crate) fn from_wellformed_term(term: &Term, signature: &impl Signature) -> Tm {
        Tm::from_wellformed_term_in(&mut Vec::new(), signature, term)
    }

    /// Convert a wellformed term in a scope of binders, innermost last, each
    /// marked with whether it is accessible. A name resolves to the innermost
    /// accessible binder, and the index still counts the inaccessible binders
    /// it skips.
    pub(crate) fn from_wellformed_term_in(
        scope: &mut Vec<(Var, bool)>,
        signature: &impl Signature,
        term: &Term,
    ) -> Tm {
        match term {
            Term::Var(var, params) => {
                let bound = scope
                    .iter()
                    .rev()
                    .position(|(name, accessible)| *accessible && name == var);
                match bound {
                    Some(index) => Tm::Bound(index),
                    None => Tm::Free(
                        var.clone(),
                        params
                            .iter()
                            .map(|param| Tm::from_wellformed_term_in(scope, signature, param))
                            .collect(),
                    ),
                }
            },
            Term::Const(konst, binders, params) => {
                let head = signature.head(konst);
                let params = params
                    .iter()
                    .enumerate()
                    .map(|(index, param)| {
                        scope.extend(binders.iter().enumerate().map(|(position, binder)| {
                            let accessible =
                                head.map_or(true, |head| head.is_accessible(index, position));
                            (binder.clone(), accessible)
                        }));
                        let param = Tm::from_wellformed_term_in(scope, signature, param);
                        scope.truncate(scope.len() - binders.len());
                        param
                    })
                    .collect();
                Tm::Const(konst.clone(), binders.clone(), params)
            },
        }
    }

    /// Convert back to a surface term, choosing binder names that neither
    /// capture a free variable nor shadow an enclosing binder.
    ///
    /// # Panics
    ///
    /// If the term has dangling bound indices.
    pub fn term(&self) -> Term {
        let frees = self.free_vars();
        self.term_in(&frees, &mut Vec::new())
    }

    fn term_in(&self, frees: &FreeVars, path: &mut Vec<Var>) -> Term {
        match self {
            Tm::Bound(index) => match path.len().checked_sub(index + 1) {
                Some(position) => Term::leaf(path[position].clone()),
                None => panic!("dangling bound index {} in `{}`", index, self),
            },
            Tm::Free(var, params) => Term::var(
                var.clone(),
                params.iter().map(|param| param.term_in(frees, path)).collect(),
            ),
            Tm::Const(konst, hints, params) => {
                let mut binders = Vec::<Var>::with_capacity(hints.len());
                for hint in hints {
                    let mut binder = hint.clone();
                    while frees.contains(&binder) || path.contains(&binder) || binders.contains(&binder)
                    {
                        binder = binder.increment();
                    }
                    binders.push(binder);
                }

                path.extend(binders.iter().cloned());
                let params = params.iter().map(|param| param.term_in(frees, path)).collect();
                path.truncate(path.len() - binders.len());

                Term::constant(konst.clone(), binders, params)
            },
        }
    }

    /// The number of nodes in the term.
    pub fn size(&self) -> usize {
        match self {
            Tm::Bound(_) => 1,
            Tm::Free(_, params) | Tm::Const(_, _, params) => {
                1 + params.iter().map(Tm::size).sum::<usize>()
            },
        }
    }

    /// The free variables of the term, with their arities.
    pub fn free_vars(&self) -> FreeVars {
        let mut frees = FreeVars::new();
        self.collect_free_vars(&mut frees);
        frees
    }

    fn collect_free_vars(&self, frees: &mut FreeVars) {
        match self {
            Tm::Bound(_) => {},
            Tm::Free(var, params) => {
                frees.add(var.clone(), params.len());
                params.iter().for_each(|param| param.collect_free_vars(frees));
            },
            Tm::Const(_, _, params) => {
                params.iter().for_each(|param| param.collect_free_vars(frees));
            },
        }
    }

    /// Does the free variable occur anywhere in the term?
    pub fn occurs(&self, var: &Var) -> bool {
        match self {
            Tm::Bound(_) => false,
            Tm::Free(v, params) => v == var || params.iter().any(|param| param.occurs(var)),
            Tm::Const(_, _, params) => params.iter().any(|param| param.occurs(var)),
        }
    }

    /// Does the constant occur anywhere in the term?
    pub fn mentions_const(&self, konst: &Const) -> bool {
        match self {
            Tm::Bound(_) => false,
            Tm::Free(_, params) => params.iter().any(|param| param.mentions_const(konst)),
            Tm::Const(c, _, params) => {
                c == konst || params.iter().any(|param| param.mentions_const(konst))
            },
        }
    }

    /// Is every bound index bound either inside the term, or by one of
    /// `level` enclosing binders?
    pub fn is_closed_at(&self, level: usize) -> bool {
        match self {
            Tm::Bound(index) => *index < level,
            Tm::Free(_, params) => params.iter().all(|param| param.is_closed_at(level)),
            Tm::Const(_, binders, params) => {
                let level = level + binders.len();
                params.iter().all(|param| param.is_closed_at(level))
            },
        }
    }

    /// Does the term have bound indices that point outside of it?
    pub fn has_dangling(&self) -> bool {
        !self.is_closed_at(0)
    }

    /// Add `amount` to every bound index that is not bound by the `cutoff`
    /// innermost binders.
    pub fn shift(&self, cutoff: usize, amount: usize) -> Tm {
        if amount == 0 {
            return self.clone();
        }
        match self {
            Tm::Bound(index) if *index >= cutoff => Tm::Bound(index + amount),
            Tm::Bound(index) => Tm::Bound(*index),
            Tm::Free(var, params) => Tm::Free(
                var.clone(),
                params.iter().map(|param| param.shift(cutoff, amount)).collect(),
            ),
            Tm::Const(konst, binders, params) => {
                let cutoff = cutoff + binders.len();
                Tm::Const(
                    konst.clone(),
                    binders.clone(),
                    params.iter().map(|param| param.shift(cutoff, amount)).collect(),
                )
            },
        }
    }

    /// Move the term under `amount` additional binders.
    pub fn increment_dangling(&self, amount: usize) -> Tm {
        self.shift(0, amount)
    }

    /// Move a term from under `level` binders to the top level. This fails
    /// if the term refers to any of those binders.
    pub fn to_zero_level(&self, level: usize) -> Option<Tm> {
        if level == 0 {
            return Some(self.clone());
        }
        self.lower(0, level)
    }

    fn lower(&self, depth: usize, level: usize) -> Option<Tm> {
        match self {
            Tm::Bound(index) if *index < depth => Some(Tm::Bound(*index)),
            Tm::Bound(index) if *index - depth < level => None,
            Tm::Bound(index) => Some(Tm::Bound(index - level)),
            Tm::Free(var, params) => Some(Tm::Free(
                var.clone(),
                params
                    .iter()
                    .map(|param| param.lower(depth, level))
                    .collect::<Option<_>>()?,
            )),
            Tm::Const(konst, binders, params) => {
                let depth = depth + binders.len();
                Some(Tm::Const(
                    konst.clone(),
                    binders.clone(),
                    params
                        .iter()
                        .map(|param| param.lower(depth, level))
                        .collect::<Option<_>>()?,
                ))
            },
        }
    }

    /// Prepare the term to be placed under a new binder, turning the
    /// parameterless free variable `var` into a reference to that binder.
    pub fn abstract_free(&self, var: &Var) -> Tm {
        self.abstract_with(0, &|tm| match tm {
            Tm::Free(v, params) => v == var && params.is_empty(),
            _ => false,
        })
    }

    /// Prepare the term to be placed under a new binder, turning the nullary
    /// constant `konst` into a reference to that binder.
    pub fn abstract_const(&self, konst: &Const) -> Tm {
        self.abstract_with(0, &|tm| match tm {
            Tm::Const(c, binders, params) => c == konst && binders.is_empty() && params.is_empty(),
            _ => false,
        })
    }

    fn abstract_with(&self, depth: usize, target: &impl Fn(&Tm) -> bool) -> Tm {
        if target(self) {
            return Tm::Bound(depth);
        }
        match self {
            Tm::Bound(index) if *index >= depth => Tm::Bound(index + 1),
            Tm::Bound(index) => Tm::Bound(*index),
            Tm::Free(var, params) => Tm::Free(
                var.clone(),
                params.iter().map(|param| param.abstract_with(depth, target)).collect(),
            ),
            Tm::Const(konst, binders, params) => {
                let depth = depth + binders.len();
                Tm::Const(
                    konst.clone(),
                    binders.clone(),
                    params.iter().map(|param| param.abstract_with(depth, target)).collect(),
                )
            },
        }
    }

    /// Replace every occurrence of the binder-free constant `konst` by the
    /// free variable `var`, keeping the parameters.
    pub fn const_to_free(&self, konst: &Const, var: &Var) -> Tm {
        match self {
            Tm::Bound(index) => Tm::Bound(*index),
            Tm::Free(v, params) => Tm::Free(
                v.clone(),
                params.iter().map(|param| param.const_to_free(konst, var)).collect(),
            ),
            Tm::Const(c, binders, params) => {
                let params = params
                    .iter()
                    .map(|param| param.const_to_free(konst, var))
                    .collect();
                if c == konst && binders.is_empty() {
                    Tm::Free(var.clone(), params)
                } else {
                    Tm::Const(c.clone(), binders.clone(), params)
                }
            },
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Tm::Bound(_) => 0,
            Tm::Free(..) => 1,
            Tm::Const(..) => 2,
        }
    }
}

impl PartialEq for Tm {
    fn eq(&self, other: &Tm) -> bool {
        match (self, other) {
            (Tm::Bound(i1), Tm::Bound(i2)) => i1 == i2,
            (Tm::Free(v1, ps1), Tm::Free(v2, ps2)) => v1 == v2 && ps1 == ps2,
            (Tm::Const(c1, bs1, ps1), Tm::Const(c2, bs2, ps2)) => {
                c1 == c2 && bs1.len() == bs2.len() && ps1 == ps2
            },
            (_, _) => false,
        }
    }
}

impl Eq for Tm {}

impl Hash for Tm {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Tm::Bound(index) => index.hash(state),
            Tm::Free(var, params) => {
                var.hash(state);
                params.hash(state);
            },
            Tm::Const(konst, binders, params) => {
                konst.hash(state);
                binders.len().hash(state);
                params.hash(state);
            },
        }
    }
}

impl PartialOrd for Tm {
    fn partial_cmp(&self, other: &Tm) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tm {
    fn cmp(&self, other: &Tm) -> Ordering {
        match (self, other) {
            (Tm::Bound(i1), Tm::Bound(i2)) => i1.cmp(i2),
            (Tm::Free(v1, ps1), Tm::Free(v2, ps2)) => v1.cmp(v2).then_with(|| ps1.cmp(ps2)),
            (Tm::Const(c1, bs1, ps1), Tm::Const(c2, bs2, ps2)) => c1
                .cmp(c2)
                .then_with(|| bs1.len().cmp(&bs2.len()))
                .then_with(|| ps1.cmp(ps2)),
            (_, _) => self.rank().cmp(&other.rank()),
        }
    }
}

/// Prints bound variables as `#i`, eg. `all(x. eq(#0, y))`.
impl fmt::Display for Tm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tm::Bound(index) => write!(f, "#{}", index),
            Tm::Free(var, params) if params.is_empty() => write!(f, "{}", var),
            Tm::Free(var, params) => write!(f, "{}[{}]", var, params.iter().join(", ")),
            Tm::Const(konst, binders, params) if binders.is_empty() && params.is_empty() => {
                write!(f, "{}", konst)
            },
            Tm::Const(konst, binders, params) if binders.is_empty() => {
                write!(f, "{}({})", konst, params.iter().join(", "))
            },
            Tm::Const(konst, binders, params) => write!(
                f,
                "{}({}. {})",
                konst,
                binders.iter().join(" "),
                params.iter().join(", "),
            ),
        }
    }
}
