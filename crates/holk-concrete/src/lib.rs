//! The concrete syntax of holk terms, on the printing side.
//!
//! Every constant gets a notation: an ordered list of [`Fragment`]s together
//! with a [`Priority`] that decides where parentheses are needed. The logical
//! constants come with infix and binder notation, anything else is printed in
//! the generic prefix form `c(x y. A, B)`. The [`Syntax`] table is rebuilt
//! explicitly from a snapshot of a context's constants whenever the caller
//! wants the printer to know about new ones.

#![warn(rust_2018_idioms)]

mod printer;
mod syntax;

pub use crate::printer::Printer;
pub use crate::syntax::{ConstSyntax, Fragment, Priority, Syntax, SyntaxError};
