//! Pretty printing of surface terms, driven by a [`Syntax`] table.

use holk_core::{Const, Term, Var};
use pretty::{BoxDoc, Doc};

use crate::{ConstSyntax, Fragment, Priority, Syntax};

/// Prints terms using the notation of a syntax table.
#[derive(Debug, Clone, Copy)]
pub struct Printer<'syntax> {
    syntax: &'syntax Syntax,
}

impl<'syntax> Printer<'syntax> {
    pub fn new(syntax: &'syntax Syntax) -> Printer<'syntax> {
        Printer { syntax }
    }

    /// Convert the term into a pretty-printable document.
    pub fn term_to_doc<'term>(&self, term: &'term Term) -> Doc<'term, BoxDoc<'term, ()>> {
        self.to_doc_prec(term, Priority::BINDER)
    }

    /// Print the term, breaking lines to fit within `width` columns where
    /// possible.
    pub fn render(&self, term: &Term, width: usize) -> String {
        self.term_to_doc(term).group().pretty(width).to_string()
    }

    /// Print the term in a slot that needs at least the priority `min`.
    fn to_doc_prec<'term>(
        &self,
        term: &'term Term,
        min: Priority,
    ) -> Doc<'term, BoxDoc<'term, ()>> {
        let (doc, priority) = match term {
            Term::Var(var, params) => (self.to_doc_var(var, params), Priority::ATOMIC),
            Term::Const(konst, binders, params) => match self.syntax.get(konst) {
                Some(syntax) => (self.to_doc_const(syntax, binders, params), syntax.priority),
                None => (self.to_doc_generic(konst, binders, params), Priority::ATOMIC),
            },
        };

        if priority < min {
            Doc::text("(").append(doc.nest(1)).append(")")
        } else {
            doc
        }
    }

    fn to_doc_var<'term>(
        &self,
        var: &'term Var,
        params: &'term [Term],
    ) -> Doc<'term, BoxDoc<'term, ()>> {
        let name = Doc::as_string(var);
        if params.is_empty() {
            return name;
        }

        name.append("[")
            .append(self.to_doc_params(params))
            .append("]")
    }

    fn to_doc_const<'term>(
        &self,
        syntax: &ConstSyntax,
        binders: &'term [Var],
        params: &'term [Term],
    ) -> Doc<'term, BoxDoc<'term, ()>> {
        let fragments = syntax.fragments.iter().map(|fragment| match *fragment {
            Fragment::Text(ref text) => Doc::text(text.clone()),
            Fragment::Space => Doc::space(),
            Fragment::Binder(index) => match binders.get(index) {
                Some(binder) => Doc::as_string(binder),
                None => Doc::text("?"),
            },
            Fragment::Param(index, min) => match params.get(index) {
                Some(param) => self.to_doc_prec(param, min),
                None => Doc::text("?"),
            },
        });

        Doc::concat(fragments).group()
    }

    /// The notation of constants missing from the table.
    fn to_doc_generic<'term>(
        &self,
        konst: &'term Const,
        binders: &'term [Var],
        params: &'term [Term],
    ) -> Doc<'term, BoxDoc<'term, ()>> {
        let name = Doc::as_string(konst);
        if binders.is_empty() && params.is_empty() {
            return name;
        }

        let binders = if binders.is_empty() {
            Doc::nil()
        } else {
            Doc::intersperse(binders.iter().map(Doc::as_string), Doc::space())
                .append(".")
                .append(Doc::space())
        };
        name.append("(")
            .append(binders)
            .append(self.to_doc_params(params))
            .append(")")
            .group()
    }

    fn to_doc_params<'term>(&self, params: &'term [Term]) -> Doc<'term, BoxDoc<'term, ()>> {
        Doc::intersperse(
            params
                .iter()
                .map(|param| self.to_doc_prec(param, Priority::BINDER)),
            Doc::text(",").append(Doc::space()),
        )
        .nest(2)
    }
}
