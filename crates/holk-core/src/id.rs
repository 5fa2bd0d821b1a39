//! Identifiers, variables and qualified constant names.

use itertools::Itertools;
use std::error::Error;
use std::fmt;
use std::str::FromStr;

/// An error produced while validating an identifier.
#[derive(Debug, Clone, PartialEq)]
pub enum IdError {
    Empty,
    InvalidStart(char),
    InvalidCharacter(char),
    DoubleHyphen,
    TrailingHyphen,
}

impl Error for IdError {}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdError::Empty => write!(f, "empty identifier"),
            IdError::InvalidStart(ch) => {
                write!(f, "identifiers must start with a letter, found `{}`", ch)
            },
            IdError::InvalidCharacter(ch) => write!(f, "invalid character in identifier: `{}`", ch),
            IdError::DoubleHyphen => write!(f, "identifiers must not contain `--`"),
            IdError::TrailingHyphen => write!(f, "identifiers must not end with `-`"),
        }
    }
}

/// A validated identifier.
///
/// An identifier starts with a letter, followed by letters, digits and single
/// hyphens. It may not end with a hyphen.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(String);

impl Id {
    /// Validate a name, returning an identifier.
    pub fn new(name: impl Into<String>) -> Result<Id, IdError> {
        let name = name.into();
        let mut chars = name.chars();
        let mut previous = match chars.next() {
            None => return Err(IdError::Empty),
            Some(ch) if !ch.is_alphabetic() => return Err(IdError::InvalidStart(ch)),
            Some(ch) => ch,
        };

        for ch in chars {
            match ch {
                '-' if previous == '-' => return Err(IdError::DoubleHyphen),
                '-' => {},
                ch if ch.is_alphanumeric() => {},
                ch => return Err(IdError::InvalidCharacter(ch)),
            }
            previous = ch;
        }

        if previous == '-' {
            return Err(IdError::TrailingHyphen);
        }

        Ok(Id(name))
    }

    /// Identifiers the kernel itself relies on.
    pub(crate) fn from_static(name: &'static str) -> Id {
        debug_assert!(Id::new(name).is_ok(), "invalid builtin identifier `{}`", name);
        Id(name.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Id {
    type Err = IdError;

    fn from_str(src: &str) -> Result<Id, IdError> {
        Id::new(src)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A variable: an identifier decorated with a number of primes.
///
/// Variables are totally ordered, first by identifier, then by prime count.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Var {
    id: Id,
    primes: u32,
}

impl Var {
    pub fn new(id: Id, primes: u32) -> Var {
        Var { id, primes }
    }

    /// Parse a variable of the form `name'''`.
    pub fn parse(src: &str) -> Result<Var, IdError> {
        let name = src.trim_end_matches('\'');
        let primes = (src.len() - name.len()) as u32;
        Ok(Var::new(Id::new(name)?, primes))
    }

    pub fn id(&self) -> &Id {
        &self.id
    }

    pub fn primes(&self) -> u32 {
        self.primes
    }

    /// The next variant of this variable, with one more prime.
    pub fn increment(&self) -> Var {
        Var::new(self.id.clone(), self.primes + 1)
    }
}

impl From<Id> for Var {
    fn from(src: Id) -> Var {
        Var::new(src, 0)
    }
}

impl FromStr for Var {
    type Err = IdError;

    fn from_str(src: &str) -> Result<Var, IdError> {
        Var::parse(src)
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)?;
        for _ in 0..self.primes {
            write!(f, "'")?;
        }
        Ok(())
    }
}

/// An ordered path of identifiers qualifying a constant.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Namespace(Vec<Id>);

impl Namespace {
    pub fn new(ids: Vec<Id>) -> Namespace {
        Namespace(ids)
    }

    /// The root namespace.
    pub fn root() -> Namespace {
        Namespace(Vec::new())
    }

    pub fn ids(&self) -> &[Id] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Append an identifier to the namespace.
    pub fn child(&self, id: Id) -> Namespace {
        let mut ids = self.0.clone();
        ids.push(id);
        Namespace(ids)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.iter().join("."))
    }
}

/// A constant name, qualified by a namespace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Const {
    namespace: Namespace,
    id: Id,
}

impl Const {
    pub fn new(namespace: Namespace, id: Id) -> Const {
        Const { namespace, id }
    }

    /// A constant living in the root namespace.
    pub fn simple(id: Id) -> Const {
        Const::new(Namespace::root(), id)
    }

    /// Parse a dot separated constant name, eg. `nat.add`.
    pub fn parse(src: &str) -> Result<Const, IdError> {
        let mut ids = src.split('.').map(Id::new).collect::<Result<Vec<_>, _>>()?;
        match ids.pop() {
            Some(id) => Ok(Const::new(Namespace::new(ids), id)),
            None => Err(IdError::Empty),
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn id(&self) -> &Id {
        &self.id
    }

    /// Place this constant inside the given namespace.
    pub fn qualify(&self, namespace: &Namespace) -> Const {
        let mut ids = namespace.ids().to_vec();
        ids.extend(self.namespace.ids().iter().cloned());
        Const::new(Namespace::new(ids), self.id.clone())
    }
}

impl FromStr for Const {
    type Err = IdError;

    fn from_str(src: &str) -> Result<Const, IdError> {
        Const::parse(src)
    }
}

impl fmt::Display for Const {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_root() {
            write!(f, "{}", self.id)
        } else {
            write!(f, "{}.{}", self.namespace, self.id)
        }
    }
}
