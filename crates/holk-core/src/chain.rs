//! Linear histories of contexts, and moving theorems along them.
//!
//! Lifting a theorem to a later context is free, since every extension is
//! conservative. Lifting it to an earlier context replays the extensions in
//! between in reverse, discharging each of them into the proposition:
//!
//! | Extension        | Lifted proposition                           |
//! |------------------|----------------------------------------------|
//! | `assume h`       | `(∀ frees(h). h) ⟶ P`                        |
//! | `define c`       | `(∀ params. hyps ⟶ c(params) = body) ⟶ P`    |
//! | `declare c`      | `P[v/c]` for a fresh variable `v`            |
//! | `choose c`       | `∃v. P[v/c]`                                 |
//! | `seal c`         | `P`                                          |
//! | `join`           | fails                                        |

use im::OrdSet;
use uuid::Uuid;

use crate::kernel::Ext;
use crate::{logic, Const, Head, KernelContext, KernelError, Term, Theorem, Tm, Var};

/// A linear sequence of contexts, each one extending the previous one.
#[derive(Debug, Clone)]
pub struct KCChain {
    contexts: im::Vector<KernelContext>,
}

impl KCChain {
    /// Start a chain at the given context.
    pub fn new(start: KernelContext) -> KCChain {
        let mut contexts = im::Vector::new();
        contexts.push_back(start);
        KCChain { contexts }
    }

    /// Extend the chain with a context built directly from its last element.
    pub fn append(&self, context: KernelContext) -> Result<KCChain, KernelError> {
        if context.parent() != Some(self.last().uuid()) {
            return Err(KernelError::NotAChild);
        }
        let mut contexts = self.contexts.clone();
        contexts.push_back(context);
        Ok(KCChain { contexts })
    }

    pub fn get(&self, index: usize) -> Option<&KernelContext> {
        self.contexts.get(index)
    }

    fn context(&self, index: usize) -> Result<&KernelContext, KernelError> {
        self.get(index).ok_or(KernelError::ContextOutOfRange(index))
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn last(&self) -> &KernelContext {
        &self.contexts[self.contexts.len() - 1]
    }

    pub fn iter(&self) -> impl Iterator<Item = &KernelContext> + '_ {
        self.contexts.iter()
    }

    /// The index of the context with the given identity.
    pub fn position(&self, uuid: Uuid) -> Option<usize> {
        self.contexts.iter().position(|context| context.uuid() == uuid)
    }

    /// Drop the contexts strictly between `from` and `to`.
    pub fn squash(&self, from: usize, to: usize) -> Result<KCChain, KernelError> {
        self.context(to)?;
        if from >= to {
            return Err(KernelError::ContextOutOfRange(from));
        }
        log::debug!("squash contexts {}..{}", from + 1, to);

        let mut contexts = self.contexts.take(from + 1);
        contexts.append(self.contexts.skip(to));
        Ok(KCChain { contexts })
    }

    /// Move a theorem valid in the context at `from` to the context at `to`.
    pub fn lift(&self, thm: &Theorem, from: usize, to: usize) -> Result<Theorem, KernelError> {
        let source = self.context(from)?;
        let target = self.context(to)?;
        if !source.is_valid(thm) {
            return Err(KernelError::InvalidTheorem(thm.prop().clone()));
        }

        // later contexts extend earlier ones, so lifting forward is a re-tag
        if from <= to {
            log::trace!("lift {} -> {}: {}", from, to, thm.prop());
            return Ok(target.theorem(thm.origin(), thm.prop().clone()));
        }

        // the proposition only depends on the extensions up to its origin
        let end = match self.position(thm.origin()) {
            Some(origin) if origin <= to => {
                log::trace!("lift {} -> {}: {}", from, to, thm.prop());
                return Ok(target.theorem(thm.origin(), thm.prop().clone()));
            },
            Some(origin) if origin <= from => origin,
            _ => from,
        };

        let end = self.context(end)?;
        if !end.extends(target) {
            return Err(KernelError::CannotLiftPastJoin);
        }

        let start = target.extensions().len();
        let extensions = end
            .extensions()
            .iter()
            .skip(start)
            .take(end.extensions().len() - start)
            .map(|extension| &extension.ext)
            .collect::<Vec<_>>();

        let tm = source.tm(thm.prop())?;
        let tm = Generalize::new(end, &extensions).run(tm)?;

        let prop = tm.term();
        target.check_wellformedness(&prop)?;
        log::trace!("lift {} -> {}: {}", from, to, prop);
        Ok(target.theorem(target.uuid(), prop))
    }
}

/// Discharges a range of extensions into a proposition.
struct Generalize<'a> {
    /// A context that knows all the constants of the range
    context: &'a KernelContext,
    extensions: &'a [&'a Ext],
    /// Sealed constants not occurring in the proposition at their seal
    sealed_absent: OrdSet<Const>,
}

impl<'a> Generalize<'a> {
    fn new(context: &'a KernelContext, extensions: &'a [&'a Ext]) -> Generalize<'a> {
        Generalize {
            context,
            extensions,
            sealed_absent: OrdSet::new(),
        }
    }

    fn run(mut self, mut current: Tm) -> Result<Tm, KernelError> {
        for index in (0..self.extensions.len()).rev() {
            current = self.discharge(index, current)?;
            log::trace!("generalized: {}", current);
        }
        Ok(current)
    }

    fn discharge(&mut self, index: usize, current: Tm) -> Result<Tm, KernelError> {
        let ext: &'a Ext = self.extensions[index];
        match ext {
            Ext::Join(_) => Err(KernelError::CannotLiftPastJoin),
            Ext::Seal(konst) => {
                if !current.mentions_const(konst) {
                    self.sealed_absent.insert(konst.clone());
                }
                Ok(current)
            },
            Ext::Assume(hyp) => {
                let hyp_tm = Tm::from_wellformed_term(hyp, self.context);
                if !hyp_tm.free_vars().all_nullary() {
                    return Err(KernelError::CannotLiftAssumption(hyp.clone()));
                }
                Ok(logic::tm_imp(close(hyp_tm), current))
            },
            Ext::Define { konst, hyps, body } => {
                if self.can_skip(index, konst, &current) {
                    log::trace!("skipping definition of sealed `{}`", konst);
                    return Ok(current);
                }
                let head = self.head(konst)?;
                if !head.binders().is_empty() {
                    return Err(KernelError::CannotLiftBinders(konst.clone()));
                }
                let axiom = logic::mk_imps(
                    hyps.iter().cloned(),
                    logic::mk_eq(head.term(), body.clone()),
                );
                let axiom = Tm::from_wellformed_term(&axiom, self.context);
                Ok(logic::tm_imp(close(axiom), current))
            },
            Ext::Declare(head) => {
                let konst = head.constant();
                if !head.binders().is_empty() {
                    return Err(KernelError::CannotLiftBinders(konst.clone()));
                }
                if !current.mentions_const(konst) {
                    return Ok(current);
                }
                let var = current
                    .free_vars()
                    .fresh(&Var::from(konst.id().clone()), head.params().len());
                Ok(current.const_to_free(konst, &var))
            },
            Ext::Choose { konst, .. } => {
                if !current.mentions_const(konst) {
                    return Ok(current);
                }
                let var = current.free_vars().fresh(&Var::from(konst.id().clone()), 0);
                Ok(logic::tm_ex(var, current.abstract_const(konst)))
            },
        }
    }

    /// A definition of a sealed constant can be dropped if the constant
    /// appears neither in the proposition, nor in anything that will still
    /// be discharged into it.
    fn can_skip(&self, index: usize, konst: &Const, current: &Tm) -> bool {
        self.sealed_absent.contains(konst)
            && !current.mentions_const(konst)
            && !self.extensions[..index]
                .iter()
                .any(|ext| mentions_const(ext, konst))
    }

    fn head(&self, konst: &Const) -> Result<&'a Head, KernelError> {
        self.context
            .def(konst)
            .map(|def| def.head())
            .ok_or_else(|| KernelError::UnknownConstant(konst.clone()))
    }
}

/// Does the extension mention the constant, other than by declaring,
/// defining or sealing it?
fn mentions_const(ext: &Ext, konst: &Const) -> bool {
    let mentions = |term: &Term| term.mentions_const(konst);
    match ext {
        Ext::Assume(hyp) => mentions(hyp),
        Ext::Define { konst: c, hyps, body } => {
            c != konst && (hyps.iter().any(mentions) || mentions(body))
        },
        Ext::Choose { from, .. } => mentions(from),
        Ext::Declare(_) | Ext::Seal(_) | Ext::Join(_) => false,
    }
}

/// Universally close a term over its (parameterless) free variables.
fn close(tm: Tm) -> Tm {
    let vars = tm.free_vars().vars().cloned().collect::<Vec<_>>();
    vars.into_iter()
        .rev()
        .fold(tm, |body, var| {
            let body = body.abstract_free(&var);
            logic::tm_all(var, body)
        })
}
