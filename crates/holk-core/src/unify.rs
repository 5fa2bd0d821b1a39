//! Higher-order unification and matching of internal terms.
//!
//! Higher-order unification is undecidable, so this is a bounded search.
//! Every node of the search is a [`Leaf`]: a substitution accumulated so far
//! together with the constraints that remain to be solved. Leaves are
//! expanded by trying a fixed list of strategies on their constraints, in
//! priority order, until no strategy applies any more. A leaf whose
//! substitution grows too large is frozen instead of being expanded further.
//!
//! Free variables are the unification variables. A term headed by a free
//! variable is *flexible*, any other term is *rigid*.

use im::OrdSet;
use itertools::Itertools;
use std::fmt;

use crate::{
    FreeVars, Id, KernelContext, KernelError, Signature, Term, Tm, TmSubstitution, TmWithHoles,
    Var,
};

/// The default factor relating the size of a problem to the largest
/// substitution explored for it.
pub const DEFAULT_LIMIT_FACTOR: usize = 10;

/// An equation between two terms, both under `level` binders.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub level: usize,
    pub lhs: Tm,
    pub rhs: Tm,
}

impl Constraint {
    pub fn new(level: usize, lhs: Tm, rhs: Tm) -> Constraint {
        Constraint { level, lhs, rhs }
    }

    fn normalize(&self, subst: &TmSubstitution) -> Constraint {
        Constraint {
            level: self.level,
            lhs: subst.apply(&self.lhs, self.level),
            rhs: subst.apply(&self.rhs, self.level),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ≟ {} @ {}", self.lhs, self.rhs, self.level)
    }
}

/// A node in the unification search.
#[derive(Debug, Clone)]
pub struct Leaf {
    substitution: TmSubstitution,
    constraints: im::Vector<Constraint>,
    /// Variables introduced by eliminating arguments, or already eliminated
    eliminated: OrdSet<Var>,
    /// Variables introduced by identifying two variables
    identified: OrdSet<Var>,
    /// Every variable in use, for picking fresh ones
    names: FreeVars,
    frozen: bool,
}

impl Leaf {
    pub fn substitution(&self) -> &TmSubstitution {
        &self.substitution
    }

    /// The constraints that remain, relative to the substitution.
    pub fn constraints(&self) -> &im::Vector<Constraint> {
        &self.constraints
    }

    pub fn is_solved(&self) -> bool {
        !self.frozen && self.constraints.is_empty()
    }

    /// Was the search abandoned at this leaf?
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn fresh(&mut self, hint: &'static str, arity: usize) -> Var {
        self.names.fresh(&Var::from(Id::from_static(hint)), arity)
    }

    fn bind(mut self, var: &Var, image: TmWithHoles) -> Leaf {
        log::trace!("bind {} ↦ {}", var, image);
        self.substitution = self
            .substitution
            .compose(&TmSubstitution::single(var.clone(), image));
        self
    }

    fn post(mut self, constraint: Constraint) -> Leaf {
        self.constraints.push_front(constraint);
        self
    }
}

impl fmt::Display for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.substitution)?;
        if !self.constraints.is_empty() {
            write!(f, " with {}", self.constraints.iter().join(", "))?;
        }
        if self.frozen {
            write!(f, " (frozen)")?;
        }
        Ok(())
    }
}

/// The outcome of trying a strategy on a constraint: `None` if it does not
/// apply, otherwise the leaves replacing the current one (no leaves at all
/// means the constraint has no solution).
type Outcome = Option<Vec<Leaf>>;

type Strategy = fn(&Unifier<'_>, &Leaf, &Constraint) -> Outcome;

const STRATEGIES: [(&str, Strategy); 6] = [
    ("trivial", trivial),
    ("rigid-rigid", rigid_rigid),
    ("first-order", first_order),
    ("flex-rigid", flex_rigid),
    ("flex-flex-same", flex_flex_same),
    ("flex-flex-different", flex_flex_different),
];

/// Unification and matching in a context, whose heads drive imitation.
#[derive(Debug, Clone)]
pub struct Unifier<'a> {
    context: &'a KernelContext,
    limit_factor: usize,
}

impl<'a> Unifier<'a> {
    pub fn new(context: &'a KernelContext) -> Unifier<'a> {
        Unifier::with_limit_factor(context, DEFAULT_LIMIT_FACTOR)
    }

    pub fn with_limit_factor(context: &'a KernelContext, limit_factor: usize) -> Unifier<'a> {
        Unifier {
            context,
            limit_factor,
        }
    }

    /// Unify two terms, returning all the leaves the search ended in, with
    /// substitutions restricted to the free variables of the two terms.
    ///
    /// Solved leaves are unifiers. Other leaves are stuck or frozen, and may
    /// or may not be extendable to unifiers.
    pub fn unify(&self, lhs: &Tm, rhs: &Tm) -> Vec<Leaf> {
        let mut names = lhs.free_vars();
        if !names.union(&rhs.free_vars()) {
            log::trace!("variables used with different arities in {} and {}", lhs, rhs);
            return Vec::new();
        }
        let domain = names.clone();
        let limit = self.limit_factor * (lhs.size() + rhs.size() + 1);

        let mut pending = vec![Leaf {
            substitution: TmSubstitution::new(),
            constraints: im::vector![Constraint::new(0, lhs.clone(), rhs.clone())],
            eliminated: OrdSet::new(),
            identified: OrdSet::new(),
            names,
            frozen: false,
        }];
        let mut done = Vec::new();

        while let Some(mut leaf) = pending.pop() {
            if leaf.constraints.is_empty() {
                log::trace!("solved: {}", leaf);
                done.push(leaf);
            } else if leaf.substitution.size() > limit {
                log::trace!("freezing: {}", leaf);
                leaf.frozen = true;
                done.push(leaf);
            } else {
                match self.step(&leaf) {
                    Some(children) => pending.extend(children.into_iter().rev()),
                    None => {
                        log::trace!("stuck: {}", leaf);
                        done.push(leaf);
                    },
                }
            }
        }

        done.into_iter()
            .map(|leaf| Leaf {
                substitution: leaf.substitution.restrict(&domain),
                ..leaf
            })
            .collect()
    }

    /// Apply the first strategy that applies to any of the constraints.
    fn step(&self, leaf: &Leaf) -> Outcome {
        for (index, constraint) in leaf.constraints.iter().enumerate() {
            let constraint = constraint.normalize(&leaf.substitution);
            let mut rest = leaf.clone();
            rest.constraints.remove(index);

            for (name, strategy) in STRATEGIES.iter() {
                if let Some(children) = strategy(self, &rest, &constraint) {
                    log::trace!("{}: {} ({} branches)", name, constraint, children.len());
                    return Some(children);
                }
            }
        }
        None
    }

    /// Find the substitutions for the free variables of `pattern` that make
    /// it equal to the ground term `instance`.
    pub fn match_tm(&self, pattern: &Tm, instance: &Tm) -> Vec<TmSubstitution> {
        if !instance.free_vars().is_empty() {
            return Vec::new();
        }
        let domain = pattern.free_vars();

        self.unify(pattern, instance)
            .into_iter()
            .filter(Leaf::is_solved)
            .map(|leaf| leaf.substitution.restrict(&domain))
            .unique()
            .filter(|subst| subst.apply(pattern, 0) == *instance)
            .collect()
    }

    /// Check and convert two terms, then unify them.
    pub fn unify_terms(&self, lhs: &Term, rhs: &Term) -> Result<Vec<Leaf>, KernelError> {
        let lhs = self.context.tm(lhs)?;
        let rhs = self.context.tm(rhs)?;
        Ok(self.unify(&lhs, &rhs))
    }

    /// Check and convert two terms, then match them.
    pub fn match_terms(
        &self,
        pattern: &Term,
        instance: &Term,
    ) -> Result<Vec<TmSubstitution>, KernelError> {
        let pattern = self.context.tm(pattern)?;
        let instance = self.context.tm(instance)?;
        Ok(self.match_tm(&pattern, &instance))
    }

    /// Bind `var`, applied to `arity` arguments, to a copy of the rigid
    /// constant with fresh variables for its parameters. Each fresh variable
    /// is applied to the holes, then to the binders its parameter can see.
    fn imitate(&self, leaf: &Leaf, var: &Var, arity: usize, rigid: &Tm) -> Option<Leaf> {
        let (konst, binders, params) = match rigid {
            Tm::Const(konst, binders, params) => (konst, binders, params),
            Tm::Bound(_) | Tm::Free(..) => return None,
        };
        let head = self.context.head(konst)?;
        if head.params().len() != params.len() || head.binders().len() != binders.len() {
            return None;
        }

        let mut leaf = leaf.clone();
        let depth = binders.len();
        let params = (0..params.len())
            .map(|index| {
                let accessible = head.accessible(index);
                let fresh = leaf.fresh("M", arity + accessible.len());
                let args = holes(arity, depth)
                    .chain(accessible.iter().map(|binder| Tm::Bound(depth - 1 - binder)))
                    .collect();
                Tm::Free(fresh, args)
            })
            .collect();

        let image = TmWithHoles::new(arity, Tm::Const(konst.clone(), binders.clone(), params));
        Some(leaf.bind(var, image))
    }
}

/// References to `count` holes, from under `depth` binders.
fn holes(count: usize, depth: usize) -> impl Iterator<Item = Tm> {
    (0..count).map(move |hole| Tm::Bound(depth + count - 1 - hole))
}

fn is_flex(tm: &Tm) -> bool {
    match tm {
        Tm::Free(..) => true,
        Tm::Bound(_) | Tm::Const(..) => false,
    }
}

/// Could the argument become the rigid term, when projected onto?
fn is_compatible(arg: &Tm, rigid: &Tm) -> bool {
    match (arg, rigid) {
        (Tm::Free(..), _) => true,
        (Tm::Bound(i1), Tm::Bound(i2)) => i1 == i2,
        (Tm::Const(c1, bs1, ps1), Tm::Const(c2, bs2, ps2)) => {
            c1 == c2 && bs1.len() == bs2.len() && ps1.len() == ps2.len()
        },
        (_, _) => false,
    }
}

fn projections<'l>(
    leaf: &'l Leaf,
    constraint: &'l Constraint,
    var: &'l Var,
    args: &'l [Tm],
    other: &'l Tm,
) -> impl Iterator<Item = Leaf> + 'l {
    let arity = args.len();
    args.iter()
        .enumerate()
        .filter(move |(_, arg)| is_compatible(arg, other))
        .map(move |(index, _)| {
            let image = TmWithHoles::new(arity, Tm::Bound(arity - 1 - index));
            leaf.clone().bind(var, image).post(constraint.clone())
        })
}

fn trivial(_: &Unifier<'_>, leaf: &Leaf, constraint: &Constraint) -> Outcome {
    if constraint.lhs == constraint.rhs {
        Some(vec![leaf.clone()])
    } else {
        None
    }
}

fn rigid_rigid(_: &Unifier<'_>, leaf: &Leaf, constraint: &Constraint) -> Outcome {
    match (&constraint.lhs, &constraint.rhs) {
        (Tm::Const(c1, bs1, ps1), Tm::Const(c2, bs2, ps2)) => {
            if c1 != c2 || bs1.len() != bs2.len() || ps1.len() != ps2.len() {
                return Some(Vec::new());
            }
            let level = constraint.level + bs1.len();
            let mut leaf = leaf.clone();
            for (lhs, rhs) in ps1.iter().zip(ps2).rev() {
                leaf = leaf.post(Constraint::new(level, lhs.clone(), rhs.clone()));
            }
            Some(vec![leaf])
        },
        (Tm::Bound(_), Tm::Bound(_))
        | (Tm::Bound(_), Tm::Const(..))
        | (Tm::Const(..), Tm::Bound(_)) => {
            // equal sides were handled by `trivial`
            Some(Vec::new())
        },
        (_, _) => None,
    }
}

fn first_order(_: &Unifier<'_>, leaf: &Leaf, constraint: &Constraint) -> Outcome {
    let (var, other) = match (&constraint.lhs, &constraint.rhs) {
        (Tm::Free(var, args), other) if args.is_empty() && !other.occurs(var) => (var, other),
        (other, Tm::Free(var, args)) if args.is_empty() && !other.occurs(var) => (var, other),
        (_, _) => return None,
    };
    let image = other.to_zero_level(constraint.level)?;
    Some(vec![leaf.clone().bind(var, TmWithHoles::closed(image))])
}

fn flex_rigid(unifier: &Unifier<'_>, leaf: &Leaf, constraint: &Constraint) -> Outcome {
    let (flex, rigid) = if is_flex(&constraint.lhs) && !is_flex(&constraint.rhs) {
        (&constraint.lhs, &constraint.rhs)
    } else if is_flex(&constraint.rhs) && !is_flex(&constraint.lhs) {
        (&constraint.rhs, &constraint.lhs)
    } else {
        return None;
    };
    let (var, args) = match flex {
        Tm::Free(var, args) => (var, args),
        Tm::Bound(_) | Tm::Const(..) => return None,
    };

    let mut children = Vec::new();
    if let Some(leaf) = unifier.imitate(leaf, var, args.len(), rigid) {
        children.push(leaf.post(constraint.clone()));
    }
    children.extend(projections(leaf, constraint, var, args, rigid));
    Some(children)
}

fn flex_flex_same(_: &Unifier<'_>, leaf: &Leaf, constraint: &Constraint) -> Outcome {
    let (var, lhs_args, rhs_args) = match (&constraint.lhs, &constraint.rhs) {
        (Tm::Free(v1, args1), Tm::Free(v2, args2)) if v1 == v2 && args1.len() == args2.len() => {
            (v1, args1, args2)
        },
        (_, _) => return None,
    };

    let mut decomposed = leaf.clone();
    for (lhs, rhs) in lhs_args.iter().zip(rhs_args).rev() {
        decomposed = decomposed.post(Constraint::new(constraint.level, lhs.clone(), rhs.clone()));
    }
    let mut children = vec![decomposed];

    // drop the argument positions that differ
    if !leaf.eliminated.contains(var) {
        let arity = lhs_args.len();
        let kept = (0..arity)
            .filter(|index| lhs_args[*index] == rhs_args[*index])
            .collect::<Vec<_>>();

        if kept.len() < arity {
            let mut eliminated = leaf.clone();
            let fresh = eliminated.fresh("G", kept.len());
            eliminated.eliminated.insert(var.clone());
            eliminated.eliminated.insert(fresh.clone());

            let args = kept.iter().map(|index| Tm::Bound(arity - 1 - index)).collect();
            let image = TmWithHoles::new(arity, Tm::Free(fresh, args));
            children.push(eliminated.bind(var, image).post(constraint.clone()));
        }
    }

    Some(children)
}

fn flex_flex_different(_: &Unifier<'_>, leaf: &Leaf, constraint: &Constraint) -> Outcome {
    let (lhs_var, lhs_args, rhs_var, rhs_args) = match (&constraint.lhs, &constraint.rhs) {
        (Tm::Free(v1, args1), Tm::Free(v2, args2)) if v1 != v2 => (v1, args1, v2, args2),
        (_, _) => return None,
    };

    let mut children = Vec::new();
    let lhs = (lhs_var, &lhs_args[..]);
    let rhs = (rhs_var, &rhs_args[..]);
    if let Some(identified) = identify(leaf, constraint, lhs, rhs) {
        children.push(identified);
    }
    children.extend(projections(leaf, constraint, lhs_var, lhs_args, &constraint.rhs));
    children.extend(projections(leaf, constraint, rhs_var, rhs_args, &constraint.lhs));
    Some(children)
}

/// Replace `F[ā] ≟ G[b̄]` by a fresh `H`, with `F ↦ [x̄] H[x̄, b̄]` and
/// `G ↦ [ȳ] H[ā, ȳ]`.
fn identify(
    leaf: &Leaf,
    constraint: &Constraint,
    (lhs_var, lhs_args): (&Var, &[Tm]),
    (rhs_var, rhs_args): (&Var, &[Tm]),
) -> Option<Leaf> {
    if leaf.identified.contains(lhs_var) && leaf.identified.contains(rhs_var) {
        return None;
    }

    let to_zero_level = |args: &[Tm]| {
        args.iter()
            .map(|arg| arg.to_zero_level(constraint.level))
            .collect::<Option<Vec<_>>>()
    };
    let lhs_args = to_zero_level(lhs_args)?;
    let rhs_args = to_zero_level(rhs_args)?;
    let occurs = |arg: &Tm| arg.occurs(lhs_var) || arg.occurs(rhs_var);
    if lhs_args.iter().chain(&rhs_args).any(occurs) {
        return None;
    }

    let mut leaf = leaf.clone();
    let fresh = leaf.fresh("H", lhs_args.len() + rhs_args.len());
    leaf.identified.insert(fresh.clone());

    let lhs_image = TmWithHoles::new(
        lhs_args.len(),
        Tm::Free(
            fresh.clone(),
            holes(lhs_args.len(), 0).chain(rhs_args.iter().cloned()).collect(),
        ),
    );
    let rhs_image = TmWithHoles::new(
        rhs_args.len(),
        Tm::Free(
            fresh,
            lhs_args.iter().cloned().chain(holes(rhs_args.len(), 0)).collect(),
        ),
    );

    log::trace!("identify {} and {}", lhs_var, rhs_var);
    let subst =
        TmSubstitution::single(lhs_var.clone(), lhs_image).with_free(rhs_var.clone(), rhs_image);
    leaf.substitution = leaf.substitution.compose(&subst);
    Some(leaf.post(constraint.clone()))
}
