//! Concrete notation for constants.

use holk_core::logic::{all_const, eq_const, ex_const, imp_const};
use holk_core::{Const, Def, Head};
use im::OrdMap;
use std::error::Error;
use std::fmt;

/// How tightly a form binds. Higher priorities bind tighter.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(pub u32);

impl Priority {
    /// Binding forms, which extend as far to the right as possible
    pub const BINDER: Priority = Priority(0);
    pub const IMP: Priority = Priority(10);
    pub const EQ: Priority = Priority(20);
    /// Forms that never need parentheses
    pub const ATOMIC: Priority = Priority(u32::max_value());

    /// The priority of the form just above this one.
    pub fn tighter(self) -> Priority {
        Priority(self.0.saturating_add(1))
    }
}

/// One piece of the concrete notation of a constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Literal text
    Text(String),
    /// A space, which may become a line break
    Space,
    /// The name of the binder at this index
    Binder(usize),
    /// The parameter at this index, parenthesized if it binds more loosely
    /// than the given priority
    Param(usize, Priority),
}

impl Fragment {
    pub fn text(text: impl Into<String>) -> Fragment {
        Fragment::Text(text.into())
    }
}

/// The notation of one constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstSyntax {
    pub fragments: Vec<Fragment>,
    pub priority: Priority,
}

impl ConstSyntax {
    pub fn new(fragments: Vec<Fragment>, priority: Priority) -> ConstSyntax {
        ConstSyntax {
            fragments,
            priority,
        }
    }

    /// Prefix notation: `c`, `c(A, B)` or `c(x y. A, B)`.
    pub fn generic(head: &Head) -> ConstSyntax {
        let mut fragments = vec![Fragment::text(head.constant().to_string())];
        if head.binders().is_empty() && head.params().is_empty() {
            return ConstSyntax::new(fragments, Priority::ATOMIC);
        }

        fragments.push(Fragment::text("("));
        for index in 0..head.binders().len() {
            if index > 0 {
                fragments.push(Fragment::Space);
            }
            fragments.push(Fragment::Binder(index));
        }
        if !head.binders().is_empty() {
            fragments.push(Fragment::text("."));
            if !head.params().is_empty() {
                fragments.push(Fragment::Space);
            }
        }
        for index in 0..head.params().len() {
            if index > 0 {
                fragments.push(Fragment::text(","));
                fragments.push(Fragment::Space);
            }
            fragments.push(Fragment::Param(index, Priority::BINDER));
        }
        fragments.push(Fragment::text(")"));

        ConstSyntax::new(fragments, Priority::ATOMIC)
    }

    /// A binding form such as `∀x. P`.
    fn quantifier(symbol: &str) -> ConstSyntax {
        ConstSyntax::new(
            vec![
                Fragment::text(symbol),
                Fragment::Binder(0),
                Fragment::text("."),
                Fragment::Space,
                Fragment::Param(0, Priority::BINDER),
            ],
            Priority::BINDER,
        )
    }

    /// An infix operator, associating to the right if `right` is set.
    fn infix(symbol: &str, priority: Priority, right: bool) -> ConstSyntax {
        let rhs = if right { priority } else { priority.tighter() };
        ConstSyntax::new(
            vec![
                Fragment::Param(0, priority.tighter()),
                Fragment::Space,
                Fragment::text(symbol),
                Fragment::Space,
                Fragment::Param(1, rhs),
            ],
            priority,
        )
    }
}

/// An error produced when checking a notation against a head.
#[derive(Debug, Clone, PartialEq)]
pub enum SyntaxError {
    UnknownConstant(Const),
    UnknownBinder { constant: Const, index: usize },
    UnknownParam { constant: Const, index: usize },
    RepeatedBinder { constant: Const, index: usize },
    RepeatedParam { constant: Const, index: usize },
    MissingBinder { constant: Const, index: usize },
    MissingParam { constant: Const, index: usize },
}

impl Error for SyntaxError {}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxError::UnknownConstant(constant) => {
                write!(f, "no notation can be given to unknown constant `{}`", constant)
            },
            SyntaxError::UnknownBinder { constant, index } => {
                write!(f, "`{}` has no binder {}", constant, index)
            },
            SyntaxError::UnknownParam { constant, index } => {
                write!(f, "`{}` has no parameter {}", constant, index)
            },
            SyntaxError::RepeatedBinder { constant, index } => {
                write!(f, "binder {} of `{}` appears more than once", index, constant)
            },
            SyntaxError::RepeatedParam { constant, index } => {
                write!(f, "parameter {} of `{}` appears more than once", index, constant)
            },
            SyntaxError::MissingBinder { constant, index } => {
                write!(f, "binder {} of `{}` does not appear", index, constant)
            },
            SyntaxError::MissingParam { constant, index } => {
                write!(f, "parameter {} of `{}` does not appear", index, constant)
            },
        }
    }
}

/// The notation of every constant of a context.
#[derive(Debug, Clone, Default)]
pub struct Syntax {
    entries: OrdMap<Const, (Head, ConstSyntax)>,
}

impl Syntax {
    /// Build the table for a snapshot of the constants of a context.
    pub fn rebuild(constants: &OrdMap<Const, Def>) -> Syntax {
        let builtin = builtins();
        let entries = constants
            .iter()
            .map(|(konst, def)| {
                let syntax = builtin
                    .get(konst)
                    .cloned()
                    .unwrap_or_else(|| ConstSyntax::generic(def.head()));
                (konst.clone(), (def.head().clone(), syntax))
            })
            .collect::<OrdMap<_, _>>();

        log::trace!("rebuilt syntax for {} constants", entries.len());
        Syntax { entries }
    }

    pub fn get(&self, konst: &Const) -> Option<&ConstSyntax> {
        self.entries.get(konst).map(|(_, syntax)| syntax)
    }

    /// Override the notation of a constant, returning the previous one.
    pub fn insert(
        &mut self,
        konst: &Const,
        syntax: ConstSyntax,
    ) -> Result<ConstSyntax, SyntaxError> {
        let (head, current) = match self.entries.get_mut(konst) {
            Some(entry) => entry,
            None => return Err(SyntaxError::UnknownConstant(konst.clone())),
        };
        Syntax::validate(head, &syntax)?;

        log::debug!("notation for `{}` changed", konst);
        Ok(std::mem::replace(current, syntax))
    }

    /// Check that a notation mentions every binder and every parameter of
    /// the head exactly once.
    pub fn validate(head: &Head, syntax: &ConstSyntax) -> Result<(), SyntaxError> {
        let constant = head.constant();
        let mut binders = vec![false; head.binders().len()];
        let mut params = vec![false; head.params().len()];

        for fragment in &syntax.fragments {
            match *fragment {
                Fragment::Text(_) | Fragment::Space => {},
                Fragment::Binder(index) => match binders.get_mut(index) {
                    None => {
                        let constant = constant.clone();
                        return Err(SyntaxError::UnknownBinder { constant, index });
                    },
                    Some(true) => {
                        let constant = constant.clone();
                        return Err(SyntaxError::RepeatedBinder { constant, index });
                    },
                    Some(seen) => *seen = true,
                },
                Fragment::Param(index, _) => match params.get_mut(index) {
                    None => {
                        let constant = constant.clone();
                        return Err(SyntaxError::UnknownParam { constant, index });
                    },
                    Some(true) => {
                        let constant = constant.clone();
                        return Err(SyntaxError::RepeatedParam { constant, index });
                    },
                    Some(seen) => *seen = true,
                },
            }
        }

        if let Some(index) = binders.iter().position(|seen| !seen) {
            let constant = constant.clone();
            return Err(SyntaxError::MissingBinder { constant, index });
        }
        if let Some(index) = params.iter().position(|seen| !seen) {
            let constant = constant.clone();
            return Err(SyntaxError::MissingParam { constant, index });
        }
        Ok(())
    }
}

fn builtins() -> OrdMap<Const, ConstSyntax> {
    let mut builtins = OrdMap::new();
    builtins.insert(eq_const(), ConstSyntax::infix("=", Priority::EQ, false));
    builtins.insert(imp_const(), ConstSyntax::infix("⟶", Priority::IMP, true));
    builtins.insert(all_const(), ConstSyntax::quantifier("∀"));
    builtins.insert(ex_const(), ConstSyntax::quantifier("∃"));
    builtins
}
