//! The trusted logical kernel of holk.
//!
//! This crate lets a surrounding environment incrementally extend a theory by
//! declaring constants, defining them, asserting axioms and introducing
//! witnesses, while guaranteeing that every [`Theorem`] is traceable to a
//! finite chain of kernel steps.
//!
//! Terms come in two flavours:
//!
//! - [`Term`]: the named surface syntax, exchanged with parsers and printers
//! - [`Tm`]: the internal syntax, using de Bruijn indices for bound variables
//!
//! The two are connected by a single conversion pair at the kernel boundary,
//! and internal algorithms (substitution, lifting, unification) only ever
//! operate on [`Tm`].

#![warn(rust_2018_idioms)]

mod errors;
mod free_vars;
mod head;
mod id;
mod term;
mod wellformed;

pub mod chain;
pub mod kernel;
pub mod logic;
pub mod subst;
pub mod tm;
pub mod unify;

pub use crate::chain::KCChain;
pub use crate::errors::KernelError;
pub use crate::free_vars::FreeVars;
pub use crate::head::{Head, HeadError, Signature};
pub use crate::id::{Const, Id, IdError, Namespace, Var};
pub use crate::kernel::{Def, DefCase, Ext, Extension, KernelContext, Prover, Theorem};
pub use crate::subst::{TmSubstitution, TmWithHoles};
pub use crate::term::{Term, TermWithHoles};
pub use crate::tm::Tm;
pub use crate::unify::{Constraint, Leaf, Unifier};
pub use crate::wellformed::{check_wellformedness, WellformednessError};
