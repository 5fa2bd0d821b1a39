//! Capture-avoiding substitution over internal terms.
//!
//! A [`TmWithHoles`] abstracts a term over `h` holes: the `h` innermost
//! indices at its top level, with hole `i` being `Bound(h - 1 - i)`. A
//! free variable applied to `n` parameters is replaced by an image with `n`
//! holes, which are then filled with the (substituted) parameters.
//!
//! Images are relative to the level a substitution is applied at. While
//! walking under binders, their dangling indices are shifted up past the
//! binders crossed so far, and the parameters filling their holes are placed
//! at the depth of the occurrence, so no binder is ever captured.

use itertools::Itertools;
use std::fmt;

use crate::{FreeVars, Tm, Var};

/// A term abstracted over a number of holes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TmWithHoles {
    pub holes: usize,
    pub tm: Tm,
}

impl TmWithHoles {
    pub fn new(holes: usize, tm: Tm) -> TmWithHoles {
        TmWithHoles { holes, tm }
    }

    /// An image without holes.
    pub fn closed(tm: Tm) -> TmWithHoles {
        TmWithHoles::new(0, tm)
    }

    /// Fill the holes with the given arguments, which must be exactly as
    /// many as there are holes.
    pub fn fill_holes(&self, args: &[Tm]) -> Option<Tm> {
        if args.len() != self.holes {
            return None;
        }
        if self.holes == 0 {
            return Some(self.tm.clone());
        }
        Some(fill(&self.tm, 0, args))
    }

    /// Are all the dangling indices of the image holes?
    pub fn is_closed(&self) -> bool {
        self.tm.is_closed_at(self.holes)
    }

    pub fn size(&self) -> usize {
        self.tm.size()
    }
}

fn fill(tm: &Tm, depth: usize, args: &[Tm]) -> Tm {
    let holes = args.len();
    match tm {
        Tm::Bound(index) if *index < depth => Tm::Bound(*index),
        Tm::Bound(index) if *index - depth < holes => {
            args[holes - 1 - (*index - depth)].increment_dangling(depth)
        },
        Tm::Bound(index) => Tm::Bound(index - holes),
        Tm::Free(var, params) => Tm::Free(
            var.clone(),
            params.iter().map(|param| fill(param, depth, args)).collect(),
        ),
        Tm::Const(konst, binders, params) => {
            let depth = depth + binders.len();
            Tm::Const(
                konst.clone(),
                binders.clone(),
                params.iter().map(|param| fill(param, depth, args)).collect(),
            )
        },
    }
}

impl fmt::Display for TmWithHoles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.holes == 0 {
            write!(f, "{}", self.tm)
        } else {
            write!(f, "[{}] {}", self.holes, self.tm)
        }
    }
}

/// A substitution for free variables and dangling bound indices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TmSubstitution {
    free: im::OrdMap<Var, TmWithHoles>,
    bound: im::OrdMap<usize, TmWithHoles>,
}

impl TmSubstitution {
    /// The empty substitution.
    pub fn new() -> TmSubstitution {
        TmSubstitution {
            free: im::OrdMap::new(),
            bound: im::OrdMap::new(),
        }
    }

    /// Replace a single free variable.
    pub fn single(var: Var, image: TmWithHoles) -> TmSubstitution {
        TmSubstitution::new().with_free(var, image)
    }

    pub fn with_free(mut self, var: Var, image: TmWithHoles) -> TmSubstitution {
        self.free.insert(var, image);
        self
    }

    /// Replace the dangling index `index`. Bound images never have holes.
    pub fn with_bound(mut self, index: usize, image: Tm) -> TmSubstitution {
        self.bound.insert(index, TmWithHoles::closed(image));
        self
    }

    pub fn free(&self, var: &Var) -> Option<&TmWithHoles> {
        self.free.get(var)
    }

    pub fn bound(&self, index: usize) -> Option<&TmWithHoles> {
        self.bound.get(&index)
    }

    /// The free variables replaced by this substitution, in order.
    pub fn domain(&self) -> impl Iterator<Item = &Var> + '_ {
        self.free.keys()
    }

    pub fn free_images(&self) -> impl Iterator<Item = (&Var, &TmWithHoles)> + '_ {
        self.free.iter()
    }

    pub fn has_bound(&self) -> bool {
        !self.bound.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty() && self.bound.is_empty()
    }

    /// The combined size of all images.
    pub fn size(&self) -> usize {
        self.free.values().chain(self.bound.values()).map(TmWithHoles::size).sum()
    }

    /// Apply the substitution to a term that sits under `level` binders that
    /// the substitution must leave alone.
    ///
    /// An occurrence `F[t1, ..., tn]` is only replaced when the image of `F`
    /// has exactly `n` holes. Occurrences with any other number of
    /// parameters are kept, with the substitution applied to their
    /// parameters. [`KernelContext::substitute`] rejects such substitutions
    /// up front with [`KernelError::SubstitutionArity`].
    ///
    /// [`KernelContext::substitute`]: crate::KernelContext::substitute
    /// [`KernelError::SubstitutionArity`]: crate::KernelError::SubstitutionArity
    pub fn apply(&self, tm: &Tm, level: usize) -> Tm {
        if self.is_empty() {
            return tm.clone();
        }
        self.apply_at(tm, level)
    }

    fn apply_at(&self, tm: &Tm, depth: usize) -> Tm {
        match tm {
            Tm::Bound(index) if *index >= depth => match self.bound.get(&(index - depth)) {
                Some(image) => image.tm.increment_dangling(depth),
                None => Tm::Bound(*index),
            },
            Tm::Bound(index) => Tm::Bound(*index),
            Tm::Free(var, params) => {
                let params = params
                    .iter()
                    .map(|param| self.apply_at(param, depth))
                    .collect::<Vec<_>>();
                let image = match self.free.get(var) {
                    Some(image) => image,
                    None => return Tm::Free(var.clone(), params),
                };
                let shifted = TmWithHoles::new(image.holes, image.tm.shift(image.holes, depth));
                match shifted.fill_holes(&params) {
                    Some(tm) => tm,
                    None => {
                        log::debug!(
                            "`{}` has {} parameters but its image has {} holes, kept as is",
                            var,
                            params.len(),
                            image.holes,
                        );
                        Tm::Free(var.clone(), params)
                    },
                }
            },
            Tm::Const(konst, binders, params) => {
                let depth = depth + binders.len();
                Tm::Const(
                    konst.clone(),
                    binders.clone(),
                    params.iter().map(|param| self.apply_at(param, depth)).collect(),
                )
            },
        }
    }

    /// The substitution that applies `self` first, then `second`.
    pub fn compose(&self, second: &TmSubstitution) -> TmSubstitution {
        let mut free = self
            .free
            .iter()
            .map(|(var, image)| {
                let tm = second.apply(&image.tm, image.holes);
                (var.clone(), TmWithHoles::new(image.holes, tm))
            })
            .collect::<im::OrdMap<_, _>>();
        for (var, image) in second.free.iter() {
            if !free.contains_key(var) {
                free.insert(var.clone(), image.clone());
            }
        }

        let mut bound = self
            .bound
            .iter()
            .map(|(index, image)| (*index, TmWithHoles::closed(second.apply(&image.tm, 0))))
            .collect::<im::OrdMap<_, _>>();
        for (index, image) in second.bound.iter() {
            if !bound.contains_key(index) {
                bound.insert(*index, image.clone());
            }
        }

        TmSubstitution { free, bound }
    }

    /// Keep only the free variables in `vars`. Bound entries are dropped.
    pub fn restrict(&self, vars: &FreeVars) -> TmSubstitution {
        TmSubstitution {
            free: self
                .free
                .iter()
                .filter(|(var, _)| vars.contains(var))
                .map(|(var, image)| (var.clone(), image.clone()))
                .collect(),
            bound: im::OrdMap::new(),
        }
    }
}

impl fmt::Display for TmSubstitution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let free = self
            .free
            .iter()
            .map(|(var, image)| format!("{} ↦ {}", var, image));
        let bound = self
            .bound
            .iter()
            .map(|(index, image)| format!("#{} ↦ {}", index, image));
        write!(f, "{{{}}}", free.chain(bound).join(", "))
    }
}
