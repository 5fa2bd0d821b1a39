//! Arity-checked free variable bookkeeping and fresh name generation.

use itertools::Itertools;
use std::fmt;

use crate::Var;

/// A map from free variables to their arities.
///
/// Iteration is in variable order, so anything derived from it (fresh names,
/// quantifier order during lifting) is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FreeVars {
    arities: im::OrdMap<Var, usize>,
}

impl FreeVars {
    /// Create a new, empty set of free variables.
    pub fn new() -> FreeVars {
        FreeVars {
            arities: im::OrdMap::new(),
        }
    }

    /// Record a variable with the given arity, returning `false` if the
    /// variable was already recorded with a different arity.
    pub fn add(&mut self, var: Var, arity: usize) -> bool {
        match self.arities.get(&var) {
            Some(existing) => *existing == arity,
            None => {
                self.arities.insert(var, arity);
                true
            },
        }
    }

    /// Merge another set into this one, returning `false` on an arity clash.
    pub fn union(&mut self, other: &FreeVars) -> bool {
        other
            .iter()
            .all(|(var, arity)| self.add(var.clone(), arity))
    }

    pub fn arity(&self, var: &Var) -> Option<usize> {
        self.arities.get(var).cloned()
    }

    pub fn contains(&self, var: &Var) -> bool {
        self.arities.contains_key(var)
    }

    pub fn len(&self) -> usize {
        self.arities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arities.is_empty()
    }

    /// Iterate over the variables and their arities, in variable order.
    pub fn iter(&self) -> impl Iterator<Item = (&Var, usize)> + '_ {
        self.arities.iter().map(|(var, arity)| (var, *arity))
    }

    pub fn vars(&self) -> impl Iterator<Item = &Var> + '_ {
        self.arities.keys()
    }

    /// Are all the variables parameterless?
    pub fn all_nullary(&self) -> bool {
        self.arities.values().all(|arity| *arity == 0)
    }

    /// Is every variable in this set also in `other`, with the same arity?
    pub fn is_covered_by(&self, other: &FreeVars) -> bool {
        self.iter()
            .all(|(var, arity)| other.arity(var) == Some(arity))
    }

    /// Generate a variable that is not yet in the set, starting from `hint`
    /// and adding primes as required. The new variable is recorded with the
    /// given arity, so it will not be handed out again.
    pub fn fresh(&mut self, hint: &Var, arity: usize) -> Var {
        let mut var = hint.clone();
        while self.contains(&var) {
            var = var.increment();
        }
        log::trace!("fresh variable: {}", var);
        self.arities.insert(var.clone(), arity);
        var
    }
}

impl fmt::Display for FreeVars {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{}}}",
            self.iter()
                .format_with(", ", |(var, arity), f| f(&format_args!("{}/{}", var, arity))),
        )
    }
}
