use crate::{BehaviorResult, Symbol};
use std::fmt::{self, Display, Formatter};

/// A failure to parse behavior tree source text.
///
/// Carries a human-readable explanation that includes the offending
/// location and, where available, what was expected there.
#[derive(Debug)]
pub struct ParseError {
    message: String,
}

impl ParseError {
    pub(crate) fn new(message: String) -> Self {
        Self { message }
    }
}

impl Display for ParseError {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        fmt.write_str(&self.message)
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug)]
#[non_exhaustive]
pub enum LoadError {
    MissingTree,
    MissingNode(String),
    InfiniteRecursion { node: String },
}

impl Display for LoadError {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        match self {
            Self::MissingTree => write!(fmt, "The main tree does not exist"),
            Self::MissingNode(node) => {
                write!(fmt, "Node type or subtree name not found {:?}", node)
            }
            Self::InfiniteRecursion { node } => write!(
                fmt,
                "Infinite recursion detected; the same subtree {node:?} was used in itself"
            ),
        }
    }
}

impl std::error::Error for LoadError {}

/// Structured errors raised while ticking. They propagate out of
/// [`crate::tick_node`] without being retried; the tree is left in a
/// consistent state and may be ticked again.
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum TickError {
    UndefinedPort(Symbol),
    WriteInputPort(Symbol),
    WriteToLiteral(Symbol),
    /// Not raised by the engine itself, which reports a missing variable
    /// as a `None` read. Hosts that want a hard failure can raise it.
    UndefinedVariable(Symbol),
    InvalidCount,
}

impl Display for TickError {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        match self {
            Self::UndefinedPort(port) => {
                write!(fmt, "Attempt to assign to an undefined port {:?}", port)
            }
            Self::WriteInputPort(port) => {
                write!(fmt, "Attempt to assign to an input port {:?}", port)
            }
            Self::WriteToLiteral(port) => {
                write!(fmt, "Attempt to assign to a literal {:?}", port)
            }
            Self::UndefinedVariable(name) => {
                write!(fmt, "Could not find the named variable {:?}", name)
            }
            Self::InvalidCount => write!(fmt, "Invalid count string"),
        }
    }
}

impl std::error::Error for TickError {}

pub type TickResult = Result<BehaviorResult, TickError>;
