//! The trusted kernel state machine.
//!
//! A [`KernelContext`] is an immutable value. Every transition returns a new
//! context with a fresh identity, recording the extension it applied in its
//! log, so that theorems can later be moved across extensions (see
//! [`crate::chain`]).

use std::fmt;
use uuid::Uuid;

use crate::wellformed::check_with_holes;
use crate::{
    logic, Const, FreeVars, Head, KernelError, Signature, Term, TermWithHoles, Tm, TmSubstitution,
    TmWithHoles, Var,
};

/// One defining equation of a constant: `hyps ⟹ head = body`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefCase {
    pub hyps: Vec<Term>,
    pub body: Term,
}

/// Everything the kernel knows about a constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Def {
    head: Head,
    cases: im::Vector<DefCase>,
    sealed: bool,
}

impl Def {
    fn new(head: Head) -> Def {
        Def {
            head,
            cases: im::Vector::new(),
            sealed: false,
        }
    }

    pub fn head(&self) -> &Head {
        &self.head
    }

    pub fn cases(&self) -> &im::Vector<DefCase> {
        &self.cases
    }

    /// Sealed constants can not be given further definitions.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }
}

/// The extensions a context can be built with.
#[derive(Debug, Clone, PartialEq)]
pub enum Ext {
    Assume(Term),
    Declare(Head),
    Define {
        konst: Const,
        hyps: Vec<Term>,
        body: Term,
    },
    Seal(Const),
    /// A witness constant, chosen for the existential proposition
    Choose { konst: Const, from: Term },
    /// The contexts that were joined
    Join(Vec<Uuid>),
}

impl fmt::Display for Ext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ext::Assume(term) => write!(f, "assume {}", term),
            Ext::Declare(head) => write!(f, "declare {}", head),
            Ext::Define { konst, hyps, body } => {
                write!(f, "define {} = {}", konst, body)?;
                if !hyps.is_empty() {
                    write!(f, " if {}", itertools::join(hyps, ", "))?;
                }
                Ok(())
            },
            Ext::Seal(konst) => write!(f, "seal {}", konst),
            Ext::Choose { konst, from } => write!(f, "choose {} from {}", konst, from),
            Ext::Join(uuids) => write!(f, "join {}", itertools::join(uuids, ", ")),
        }
    }
}

/// An entry in the extension log of a context.
#[derive(Debug, Clone, PartialEq)]
pub struct Extension {
    /// The context the extension was applied to, `None` for joins
    pub base: Option<Uuid>,
    pub ext: Ext,
}

/// A proposition established by the kernel.
///
/// Theorems can only be produced by kernel operations. They are tagged with
/// the context they are valid in, and every operation consuming a theorem
/// rejects it unless the tag matches. The origin is the context the theorem
/// was established in before any lifting.
#[derive(Debug, Clone, PartialEq)]
pub struct Theorem {
    context: Uuid,
    origin: Uuid,
    prop: Term,
}

impl Theorem {
    pub(crate) fn new(context: Uuid, origin: Uuid, prop: Term) -> Theorem {
        Theorem {
            context,
            origin,
            prop,
        }
    }

    pub fn context(&self) -> Uuid {
        self.context
    }

    pub fn origin(&self) -> Uuid {
        self.origin
    }

    pub fn prop(&self) -> &Term {
        &self.prop
    }
}

impl fmt::Display for Theorem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "⊢ {}", self.prop)
    }
}

/// Discharges the compatibility obligations arising from definitions.
pub trait Prover {
    /// Prove `obligation` in `context`, returning `None` on failure.
    fn prove(&self, context: &KernelContext, obligation: &Term) -> Option<Theorem>;
}

impl<F> Prover for F
where
    F: Fn(&KernelContext, &Term) -> Option<Theorem>,
{
    fn prove(&self, context: &KernelContext, obligation: &Term) -> Option<Theorem> {
        self(context, obligation)
    }
}

/// A logical context.
///
/// Persistent data structures are used internally, so cloning a context and
/// extending it is cheap.
#[derive(Debug, Clone)]
pub struct KernelContext {
    uuid: Uuid,
    log: im::Vector<Extension>,
    axioms: im::Vector<Term>,
    constants: im::OrdMap<Const, Def>,
}

impl Signature for KernelContext {
    fn head(&self, konst: &Const) -> Option<&Head> {
        self.constants.get(konst).map(Def::head)
    }
}

impl KernelContext {
    /// The root context, knowing only the sealed logical constants.
    pub fn root() -> KernelContext {
        let constants = logic::heads()
            .into_iter()
            .map(|head| {
                let mut def = Def::new(head);
                def.sealed = true;
                (def.head.constant().clone(), def)
            })
            .collect();

        KernelContext {
            uuid: Uuid::new_v4(),
            log: im::Vector::new(),
            axioms: im::Vector::new(),
            constants,
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// The context this one was built from, if any.
    pub fn parent(&self) -> Option<Uuid> {
        self.log.last().and_then(|extension| extension.base)
    }

    pub fn extensions(&self) -> &im::Vector<Extension> {
        &self.log
    }

    pub fn axioms(&self) -> &im::Vector<Term> {
        &self.axioms
    }

    pub fn constants(&self) -> &im::OrdMap<Const, Def> {
        &self.constants
    }

    pub fn def(&self, konst: &Const) -> Option<&Def> {
        self.constants.get(konst)
    }

    /// Is this context built from `other` by a sequence of extensions?
    /// Every context extends itself.
    pub fn extends(&self, other: &KernelContext) -> bool {
        if self.uuid == other.uuid {
            return true;
        }
        match self.log.get(other.log.len()) {
            Some(extension) => extension.base == Some(other.uuid),
            None => false,
        }
    }

    /// Is the theorem valid in this context?
    pub fn is_valid(&self, thm: &Theorem) -> bool {
        thm.context == self.uuid
    }

    fn check_valid(&self, thm: &Theorem) -> Result<(), KernelError> {
        if self.is_valid(thm) {
            Ok(())
        } else {
            log::debug!("rejected theorem from another context: {}", thm);
            Err(KernelError::InvalidTheorem(thm.prop.clone()))
        }
    }

    pub(crate) fn theorem(&self, origin: Uuid, prop: Term) -> Theorem {
        Theorem::new(self.uuid, origin, prop)
    }

    /// Check that a term is wellformed in this context, returning its free
    /// variables.
    pub fn check_wellformedness(&self, term: &Term) -> Result<FreeVars, KernelError> {
        Ok(crate::check_wellformedness(term, self)?)
    }

    /// Check a term and convert it to the internal representation.
    pub fn tm(&self, term: &Term) -> Result<Tm, KernelError> {
        self.check_wellformedness(term)?;
        Ok(Tm::from_wellformed_term(term, self))
    }

    /// Check a term with holes and convert it to the internal representation.
    pub fn tm_with_holes(&self, term: &TermWithHoles) -> Result<TmWithHoles, KernelError> {
        check_with_holes(term, self)?;
        let mut scope = term.holes.iter().map(|hole| (hole.clone(), true)).collect();
        let tm = Tm::from_wellformed_term_in(&mut scope, self, &term.body);
        Ok(TmWithHoles::new(term.holes.len(), tm))
    }

    /// Are the two terms wellformed and equal up to the names of bound
    /// variables?
    pub fn alpha_equivalent(&self, lhs: &Term, rhs: &Term) -> bool {
        match (self.tm(lhs), self.tm(rhs)) {
            (Ok(lhs), Ok(rhs)) => lhs == rhs,
            (_, _) => false,
        }
    }

    fn extend(&self, ext: Ext) -> KernelContext {
        let mut log = self.log.clone();
        log.push_back(Extension {
            base: Some(self.uuid),
            ext,
        });

        KernelContext {
            uuid: Uuid::new_v4(),
            log,
            axioms: self.axioms.clone(),
            constants: self.constants.clone(),
        }
    }

    /// Declare a new constant, without any definitions.
    pub fn declare(&self, head: Head) -> Result<KernelContext, KernelError> {
        let konst = head.constant().clone();
        if self.constants.contains_key(&konst) {
            log::debug!("rejected declaration of `{}`: already declared", konst);
            return Err(KernelError::AlreadyDeclared(konst));
        }
        log::debug!("declare: {}", head);

        let mut context = self.extend(Ext::Declare(head.clone()));
        context.constants.insert(konst, Def::new(head));
        Ok(context)
    }

    fn unsealed_def(&self, konst: &Const) -> Result<&Def, KernelError> {
        match self.constants.get(konst) {
            None => Err(KernelError::UnknownConstant(konst.clone())),
            Some(def) if def.sealed => Err(KernelError::AlreadySealed(konst.clone())),
            Some(def) => Ok(def),
        }
    }

    /// Prevent any further definitions of a constant.
    pub fn seal(&self, konst: &Const) -> Result<KernelContext, KernelError> {
        let mut def = self.unsealed_def(konst)?.clone();
        log::debug!("seal: {}", konst);

        def.sealed = true;
        let mut context = self.extend(Ext::Seal(konst.clone()));
        context.constants.insert(konst.clone(), def);
        Ok(context)
    }

    /// Add the defining equation `hyps ⟹ head = body` for a constant.
    ///
    /// The free variables of the hypotheses and the body must be parameters
    /// of the constant's head. For every earlier case `hyps' ⟹ head = body'`,
    /// the prover must establish `hyps' ⟹ hyps ⟹ body' = body`, so that the
    /// cases agree wherever they overlap.
    pub fn define(
        &self,
        konst: &Const,
        hyps: Vec<Term>,
        body: Term,
        prover: &impl Prover,
    ) -> Result<KernelContext, KernelError> {
        let def = self.unsealed_def(konst)?;
        let params = def.head.param_frees();

        for term in hyps.iter().chain(std::iter::once(&body)) {
            let frees = self.check_wellformedness(term)?;
            if !frees.is_covered_by(&params) {
                log::debug!("rejected definition of `{}`: `{}` is not covered", konst, term);
                return Err(KernelError::NotCoveredByHead {
                    constant: konst.clone(),
                    term: term.clone(),
                });
            }
        }

        for case in def.cases.iter() {
            let obligation = logic::mk_imps(
                case.hyps.iter().chain(hyps.iter()).cloned(),
                logic::mk_eq(case.body.clone(), body.clone()),
            );
            log::trace!("definition obligation: {}", obligation);

            let proved = match prover.prove(self, &obligation) {
                Some(thm) => self.is_valid(&thm) && self.alpha_equivalent(&thm.prop, &obligation),
                None => false,
            };
            if !proved {
                log::debug!("rejected definition of `{}`: unproved {}", konst, obligation);
                return Err(KernelError::UnprovedObligation(obligation));
            }
        }

        let axiom = logic::mk_imps(hyps.iter().cloned(), logic::mk_eq(def.head.term(), body.clone()));
        log::debug!("define: {}", axiom);

        let mut def = def.clone();
        def.cases.push_back(DefCase {
            hyps: hyps.clone(),
            body: body.clone(),
        });

        let mut context = self.extend(Ext::Define {
            konst: konst.clone(),
            hyps,
            body,
        });
        context.constants.insert(konst.clone(), def);
        context.axioms.push_back(axiom);
        Ok(context)
    }

    /// Add an axiom. Its free variables are implicitly universally
    /// quantified.
    pub fn assume(&self, term: Term) -> Result<KernelContext, KernelError> {
        if let Err(error) = self.check_wellformedness(&term) {
            log::debug!("rejected assumption `{}`: {}", term, error);
            return Err(error);
        }
        log::debug!("assume: {}", term);

        let mut context = self.extend(Ext::Assume(term.clone()));
        context.axioms.push_back(term);
        Ok(context)
    }

    /// Introduce a new, sealed constant `konst` witnessing the existential
    /// theorem `from`, adding the witnessed proposition as an axiom.
    pub fn choose(&self, konst: Const, from: &Theorem) -> Result<KernelContext, KernelError> {
        self.check_valid(from)?;
        if self.constants.contains_key(&konst) {
            return Err(KernelError::AlreadyDeclared(konst));
        }

        let tm = self.tm(&from.prop)?;
        let body = match logic::dest_tm_ex(&tm) {
            Some(body) => body,
            None => return Err(KernelError::NotAnExistential(from.prop.clone())),
        };
        if !tm.free_vars().is_empty() {
            log::debug!("rejected choice of `{}`: `{}` is not closed", konst, from.prop);
            return Err(KernelError::NotClosed(from.prop.clone()));
        }

        let witness = Tm::Const(konst.clone(), Vec::new(), Vec::new());
        let axiom = TmSubstitution::new().with_bound(0, witness).apply(body, 0);
        if axiom.has_dangling() {
            return Err(KernelError::NotClosed(from.prop.clone()));
        }

        let mut def = Def::new(Head::nullary(konst.clone()));
        def.sealed = true;

        let mut context = self.extend(Ext::Choose {
            konst: konst.clone(),
            from: from.prop.clone(),
        });
        context.constants.insert(konst, def);

        let axiom = axiom.term();
        log::debug!("choose: {}", axiom);
        context.axioms.push_back(axiom);
        Ok(context)
    }

    /// Combine several contexts into a new context without a parent.
    ///
    /// Constants declared in more than one context must agree exactly.
    /// Axioms are kept in order, dropping literal duplicates.
    pub fn join(contexts: &[KernelContext]) -> Result<KernelContext, KernelError> {
        if contexts.is_empty() {
            return Err(KernelError::EmptyJoin);
        }

        let mut constants = im::OrdMap::<Const, Def>::new();
        let mut axioms = im::Vector::<Term>::new();
        for context in contexts {
            for (konst, def) in context.constants.iter() {
                match constants.get(konst) {
                    Some(existing) if existing != def => {
                        log::debug!("rejected join: conflicting `{}`", konst);
                        return Err(KernelError::JoinConflict(konst.clone()));
                    },
                    Some(_) => {},
                    None => {
                        constants.insert(konst.clone(), def.clone());
                    },
                }
            }
            for axiom in context.axioms.iter() {
                if !axioms.contains(axiom) {
                    axioms.push_back(axiom.clone());
                }
            }
        }

        let uuids = contexts.iter().map(KernelContext::uuid).collect::<Vec<_>>();
        log::debug!("join: {}", itertools::join(&uuids, ", "));

        let mut log = im::Vector::new();
        log.push_back(Extension {
            base: None,
            ext: Ext::Join(uuids),
        });

        Ok(KernelContext {
            uuid: Uuid::new_v4(),
            log,
            axioms,
            constants,
        })
    }

    /// The axiom at `index`, as a theorem.
    pub fn axiom(&self, index: usize) -> Result<Theorem, KernelError> {
        match self.axioms.get(index) {
            Some(prop) => Ok(self.theorem(self.uuid, prop.clone())),
            None => Err(KernelError::AxiomOutOfRange(index)),
        }
    }

    /// From `A` and `A ⟶ B`, conclude `B`.
    pub fn modus_ponens(&self, hyp: &Theorem, imp: &Theorem) -> Result<Theorem, KernelError> {
        self.check_valid(hyp)?;
        self.check_valid(imp)?;

        let (antecedent, consequent) = match logic::dest_imp(&imp.prop) {
            Some(parts) => parts,
            None => return Err(KernelError::NotAnImplication(imp.prop.clone())),
        };
        if !self.alpha_equivalent(antecedent, &hyp.prop) {
            return Err(KernelError::AntecedentMismatch {
                expected: antecedent.clone(),
                found: hyp.prop.clone(),
            });
        }

        log::trace!("modus ponens: {}", consequent);
        Ok(self.theorem(self.uuid, consequent.clone()))
    }

    /// From `P[x]`, conclude `∀x. P[x]`.
    pub fn all_intro(&self, var: Var, thm: &Theorem) -> Result<Theorem, KernelError> {
        self.check_valid(thm)?;

        let prop = logic::mk_all(var, thm.prop.clone());
        self.check_wellformedness(&prop)?;

        log::trace!("all intro: {}", prop);
        Ok(self.theorem(self.uuid, prop))
    }

    /// Instantiate the free variables of a theorem.
    pub fn substitute(
        &self,
        thm: &Theorem,
        subst: &TmSubstitution,
    ) -> Result<Theorem, KernelError> {
        self.check_valid(thm)?;
        if subst.has_bound() {
            return Err(KernelError::SubstitutionOfBound);
        }

        let tm = self.tm(&thm.prop)?;
        let frees = tm.free_vars();
        for (var, image) in subst.free_images() {
            if !image.is_closed() {
                return Err(KernelError::SubstitutionNotClosed(var.clone()));
            }
            match frees.arity(var) {
                Some(arity) if arity != image.holes => {
                    return Err(KernelError::SubstitutionArity(var.clone()));
                },
                Some(_) | None => {},
            }
        }

        let prop = subst.apply(&tm, 0).term();
        self.check_wellformedness(&prop)?;

        log::trace!("substitute {}: {}", subst, prop);
        Ok(self.theorem(self.uuid, prop))
    }
}
