//! Binding signatures of constants.
//!
//! A [`Head`] fixes, for one constant, the binders it introduces and its
//! parameters. Each parameter is a variable applied to some of the binders,
//! eg. the head of universal quantification is `all(x. P[x])`. The binders a
//! parameter is applied to are exactly the binders that are accessible when
//! checking that parameter at a use site, so different parameters of the same
//! constant may see different subsets of its binders.

use std::error::Error;
use std::fmt;

use crate::{Const, FreeVars, Term, Var};

/// Lookup of the binding signatures of constants.
pub trait Signature {
    fn head(&self, konst: &Const) -> Option<&Head>;
}

/// An error produced while constructing a [`Head`].
#[derive(Debug, Clone, PartialEq)]
pub enum HeadError {
    DuplicateBinder(Var),
    ParamNotVar(Term),
    DuplicateParam(Var),
    ParamIsBinder(Var),
    DependencyNotBinder { param: Var, dependency: Term },
    DuplicateDependency { param: Var, binder: Var },
}

impl Error for HeadError {}

impl fmt::Display for HeadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeadError::DuplicateBinder(var) => write!(f, "duplicate binder `{}`", var),
            HeadError::ParamNotVar(term) => write!(f, "parameter is not a variable: `{}`", term),
            HeadError::DuplicateParam(var) => write!(f, "duplicate parameter `{}`", var),
            HeadError::ParamIsBinder(var) => {
                write!(f, "parameter `{}` has the same name as a binder", var)
            },
            HeadError::DependencyNotBinder { param, dependency } => write!(
                f,
                "parameter `{}` depends on `{}`, which is not a binder",
                param, dependency,
            ),
            HeadError::DuplicateDependency { param, binder } => write!(
                f,
                "parameter `{}` depends on binder `{}` more than once",
                param, binder,
            ),
        }
    }
}

/// The binding signature of a constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Head {
    constant: Const,
    binders: Vec<Var>,
    params: Vec<Term>,
    /// For each parameter, the positions of the binders it depends on, in
    /// the order the parameter is applied to them.
    selectors: Vec<Vec<usize>>,
}

impl Head {
    /// Validate and construct a head.
    pub fn new(constant: Const, binders: Vec<Var>, params: Vec<Term>) -> Result<Head, HeadError> {
        for (i, binder) in binders.iter().enumerate() {
            if binders[..i].contains(binder) {
                return Err(HeadError::DuplicateBinder(binder.clone()));
            }
        }

        let mut param_vars = Vec::<&Var>::with_capacity(params.len());
        let mut selectors = Vec::with_capacity(params.len());

        for param in &params {
            let (var, deps) = match param {
                Term::Var(var, deps) => (var, deps),
                Term::Const(..) => return Err(HeadError::ParamNotVar(param.clone())),
            };
            if binders.contains(var) {
                return Err(HeadError::ParamIsBinder(var.clone()));
            }
            if param_vars.contains(&var) {
                return Err(HeadError::DuplicateParam(var.clone()));
            }
            param_vars.push(var);

            let mut selector = Vec::with_capacity(deps.len());
            for dep in deps {
                let position = match dep {
                    Term::Var(binder, dep_params) if dep_params.is_empty() => {
                        binders.iter().position(|b| b == binder)
                    },
                    _ => None,
                };
                match position {
                    None => {
                        return Err(HeadError::DependencyNotBinder {
                            param: var.clone(),
                            dependency: dep.clone(),
                        });
                    },
                    Some(position) if selector.contains(&position) => {
                        return Err(HeadError::DuplicateDependency {
                            param: var.clone(),
                            binder: binders[position].clone(),
                        });
                    },
                    Some(position) => selector.push(position),
                }
            }
            selectors.push(selector);
        }

        Ok(Head {
            constant,
            binders,
            params,
            selectors,
        })
    }

    /// Heads the kernel itself relies on.
    pub(crate) fn builtin(
        constant: Const,
        binders: Vec<Var>,
        params: Vec<Term>,
        selectors: Vec<Vec<usize>>,
    ) -> Head {
        let head = Head {
            constant,
            binders,
            params,
            selectors,
        };
        debug_assert_eq!(
            Head::new(head.constant.clone(), head.binders.clone(), head.params.clone()).as_ref(),
            Ok(&head),
        );
        head
    }

    /// The head of a constant without binders or parameters.
    pub fn nullary(constant: Const) -> Head {
        Head {
            constant,
            binders: Vec::new(),
            params: Vec::new(),
            selectors: Vec::new(),
        }
    }

    pub fn constant(&self) -> &Const {
        &self.constant
    }

    pub fn binders(&self) -> &[Var] {
        &self.binders
    }

    pub fn params(&self) -> &[Term] {
        &self.params
    }

    /// The binder positions accessible from the parameter at `index`.
    ///
    /// # Panics
    ///
    /// If `index` is not a parameter position.
    pub fn accessible(&self, index: usize) -> &[usize] {
        &self.selectors[index]
    }

    /// Is the binder at position `binder` accessible from the parameter at
    /// position `param`?
    pub fn is_accessible(&self, param: usize, binder: usize) -> bool {
        self.selectors
            .get(param)
            .map_or(false, |selector| selector.contains(&binder))
    }

    /// The parameter variables, each with its arity.
    pub fn param_vars(&self) -> impl Iterator<Item = (&Var, usize)> + '_ {
        self.params.iter().filter_map(|param| match param {
            Term::Var(var, deps) => Some((var, deps.len())),
            Term::Const(..) => None,
        })
    }

    /// The parameter variables as a free variable set.
    pub fn param_frees(&self) -> FreeVars {
        let mut frees = FreeVars::new();
        for (var, arity) in self.param_vars() {
            frees.add(var.clone(), arity);
        }
        frees
    }

    /// The head as a surface term, eg. `all(x. P[x])`.
    pub fn term(&self) -> Term {
        Term::constant(
            self.constant.clone(),
            self.binders.clone(),
            self.params.clone(),
        )
    }
}

impl fmt::Display for Head {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.term().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Var {
        Var::parse(name).unwrap()
    }

    fn leaf(name: &str) -> Term {
        Term::leaf(var(name))
    }

    fn konst(name: &str) -> Const {
        Const::parse(name).unwrap()
    }

    #[test]
    fn accessibility_per_param() {
        // sum(i. lo, hi, F[i])
        let head = Head::new(
            konst("sum"),
            vec![var("i")],
            vec![
                leaf("lo"),
                leaf("hi"),
                Term::var(var("F"), vec![leaf("i")]),
            ],
        )
        .unwrap();

        assert!(head.accessible(0).is_empty());
        assert!(head.accessible(1).is_empty());
        assert_eq!(head.accessible(2), &[0]);
        assert!(head.is_accessible(2, 0));
        assert!(!head.is_accessible(0, 0));
        assert_eq!(
            head.param_vars().map(|(v, a)| (v.to_string(), a)).collect::<Vec<_>>(),
            vec![("lo".to_owned(), 0), ("hi".to_owned(), 0), ("F".to_owned(), 1)],
        );
        assert_eq!(head.to_string(), "sum(i. lo, hi, F[i])");
    }

    #[test]
    fn dependency_order_is_kept() {
        let head = Head::new(
            konst("swap"),
            vec![var("x"), var("y")],
            vec![Term::var(var("A"), vec![leaf("y"), leaf("x")])],
        )
        .unwrap();
        assert_eq!(head.accessible(0), &[1, 0]);
    }

    #[test]
    fn rejects_malformed_heads() {
        assert_eq!(
            Head::new(konst("c"), vec![var("x"), var("x")], vec![]),
            Err(HeadError::DuplicateBinder(var("x"))),
        );
        assert_eq!(
            Head::new(konst("c"), vec![var("x")], vec![leaf("x")]),
            Err(HeadError::ParamIsBinder(var("x"))),
        );
        assert_eq!(
            Head::new(konst("c"), vec![], vec![leaf("A"), leaf("A")]),
            Err(HeadError::DuplicateParam(var("A"))),
        );
        assert_eq!(
            Head::new(konst("c"), vec![], vec![Term::var(var("A"), vec![leaf("y")])]),
            Err(HeadError::DependencyNotBinder {
                param: var("A"),
                dependency: leaf("y"),
            }),
        );
        assert_eq!(
            Head::new(
                konst("c"),
                vec![var("x")],
                vec![Term::var(var("A"), vec![leaf("x"), leaf("x")])],
            ),
            Err(HeadError::DuplicateDependency {
                param: var("A"),
                binder: var("x"),
            }),
        );
        assert!(Head::new(konst("c"), vec![], vec![Term::atom(konst("d"))]).is_err());
    }
}
