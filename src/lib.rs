mod container;
mod context;
pub mod error;
mod nodes;
mod parser;
mod port;
mod registry;
mod symbol;

use std::collections::HashMap;

pub use crate::container::BehaviorNodeContainer;
pub use crate::context::Context;
pub use crate::error::{LoadError, ParseError, TickError, TickResult};
pub use crate::nodes::{
    FallbackNode, FalseNode, ForceFailureNode, ForceSuccessNode, IfNode, InverterNode,
    ReactiveFallbackNode, ReactiveSequenceNode, RepeatNode, RetryNode, SequenceNode, SetBoolNode,
    SubtreeNode, TrueNode,
};
pub use crate::parser::{load, parse_source, PortDef, PortMap, TreeDef, TreeRootDef, TreeSource};
pub use crate::port::{PortSpec, PortType};
pub use crate::registry::{boxify, Registry};
pub use crate::symbol::Symbol;
pub use ::once_cell::sync::Lazy;

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum BehaviorResult {
    Success,
    Fail,
    /// The node should keep running in the next tick
    Running,
}

/// A port binding at a call site, either a reference to a blackboard
/// variable (with the direction of the arrow it was bound with) or a
/// literal string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlackboardValue {
    Ref(Symbol, PortType),
    Literal(String),
}

pub type Blackboard = HashMap<Symbol, String>;
pub type BBMap = HashMap<Symbol, BlackboardValue>;

pub trait BehaviorNode {
    fn tick(&mut self, ctx: &mut Context) -> TickResult;
}

/// Run one tick of a loaded tree against a host-owned blackboard.
///
/// The host keeps calling this with the same container to make `Running`
/// nodes progress; blackboard mutations are visible to the host between
/// ticks.
pub fn tick_node(node: &mut BehaviorNodeContainer, blackboard: &mut Blackboard) -> TickResult {
    node.tick(blackboard)
}

#[macro_export]
macro_rules! hash_map {
    () => {
        std::collections::HashMap::default()
    };
    ($($name: literal => $val: expr),* $(,)?) => {{
        let mut ret = std::collections::HashMap::default();
        $(ret.insert($name.into(), $val.into());)*
        ret
    }};
}
