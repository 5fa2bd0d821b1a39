//! The logical constants every context starts out with.
//!
//! | Constant | Head           |
//! |----------|----------------|
//! | `eq`     | `eq(A, B)`     |
//! | `imp`    | `imp(A, B)`    |
//! | `all`    | `all(x. P[x])` |
//! | `ex`     | `ex(x. P[x])`  |

use crate::{Const, Head, Id, Term, Tm, Var};

pub fn eq_const() -> Const {
    Const::simple(Id::from_static("eq"))
}

pub fn imp_const() -> Const {
    Const::simple(Id::from_static("imp"))
}

pub fn all_const() -> Const {
    Const::simple(Id::from_static("all"))
}

pub fn ex_const() -> Const {
    Const::simple(Id::from_static("ex"))
}

fn builtin_var(name: &'static str) -> Var {
    Var::from(Id::from_static(name))
}

fn binary_head(konst: Const) -> Head {
    Head::builtin(
        konst,
        Vec::new(),
        vec![Term::leaf(builtin_var("A")), Term::leaf(builtin_var("B"))],
        vec![Vec::new(), Vec::new()],
    )
}

fn quantifier_head(konst: Const) -> Head {
    let x = builtin_var("x");
    Head::builtin(
        konst,
        vec![x.clone()],
        vec![Term::var(builtin_var("P"), vec![Term::leaf(x)])],
        vec![vec![0]],
    )
}

/// The heads of the logical constants, in declaration order.
pub fn heads() -> Vec<Head> {
    vec![
        binary_head(eq_const()),
        binary_head(imp_const()),
        quantifier_head(all_const()),
        quantifier_head(ex_const()),
    ]
}

pub fn mk_eq(lhs: Term, rhs: Term) -> Term {
    Term::constant(eq_const(), Vec::new(), vec![lhs, rhs])
}

pub fn mk_imp(hyp: Term, concl: Term) -> Term {
    Term::constant(imp_const(), Vec::new(), vec![hyp, concl])
}

/// `h1 ⟶ h2 ⟶ … ⟶ concl`
pub fn mk_imps(hyps: impl IntoIterator<Item = Term>, concl: Term) -> Term {
    let hyps = hyps.into_iter().collect::<Vec<_>>();
    hyps.into_iter().rev().fold(concl, |concl, hyp| mk_imp(hyp, concl))
}

pub fn mk_all(var: Var, body: Term) -> Term {
    Term::constant(all_const(), vec![var], vec![body])
}

pub fn mk_ex(var: Var, body: Term) -> Term {
    Term::constant(ex_const(), vec![var], vec![body])
}

fn dest_binary<'a>(konst: &Const, term: &'a Term) -> Option<(&'a Term, &'a Term)> {
    match term {
        Term::Const(c, binders, params) if c == konst && binders.is_empty() && params.len() == 2 => {
            Some((&params[0], &params[1]))
        },
        _ => None,
    }
}

pub fn dest_eq(term: &Term) -> Option<(&Term, &Term)> {
    dest_binary(&eq_const(), term)
}

pub fn dest_imp(term: &Term) -> Option<(&Term, &Term)> {
    dest_binary(&imp_const(), term)
}

pub fn dest_ex(term: &Term) -> Option<(&Var, &Term)> {
    match term {
        Term::Const(c, binders, params)
            if *c == ex_const() && binders.len() == 1 && params.len() == 1 =>
        {
            Some((&binders[0], &params[0]))
        },
        _ => None,
    }
}

pub(crate) fn tm_imp(hyp: Tm, concl: Tm) -> Tm {
    Tm::Const(imp_const(), Vec::new(), vec![hyp, concl])
}

pub(crate) fn tm_eq(lhs: Tm, rhs: Tm) -> Tm {
    Tm::Const(eq_const(), Vec::new(), vec![lhs, rhs])
}

/// Quantify over the innermost dangling index of `body`.
pub(crate) fn tm_all(hint: Var, body: Tm) -> Tm {
    Tm::Const(all_const(), vec![hint], vec![body])
}

/// Existentially quantify over the innermost dangling index of `body`.
pub(crate) fn tm_ex(hint: Var, body: Tm) -> Tm {
    Tm::Const(ex_const(), vec![hint], vec![body])
}

pub(crate) fn dest_tm_imp(tm: &Tm) -> Option<(&Tm, &Tm)> {
    match tm {
        Tm::Const(c, binders, params)
            if *c == imp_const() && binders.is_empty() && params.len() == 2 =>
        {
            Some((&params[0], &params[1]))
        },
        _ => None,
    }
}

pub(crate) fn dest_tm_ex(tm: &Tm) -> Option<&Tm> {
    match tm {
        Tm::Const(c, binders, params)
            if *c == ex_const() && binders.len() == 1 && params.len() == 1 =>
        {
            Some(&params[0])
        },
        _ => None,
    }
}
