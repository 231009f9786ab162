use crate::{
    BBMap, BehaviorNodeContainer, BehaviorResult, Blackboard, BlackboardValue, PortType, Symbol,
    TickError,
};
use std::str::FromStr;

/// The per-tick view handed to a node's `tick`. It borrows the blackboard
/// of the enclosing scope together with the port map and children of the
/// container being ticked, so every recursion level gets a fresh view and
/// nothing has to be restored on unwind.
pub struct Context<'a> {
    pub(crate) blackboard: &'a mut Blackboard,
    pub(crate) blackboard_map: &'a BBMap,
    pub(crate) child_nodes: &'a mut [BehaviorNodeContainer],
}

impl<'a> Context<'a> {
    /// Read the value bound to a port. Returns `None` when the port is not
    /// bound by this node's call site, when it is bound with the output
    /// arrow (outputs are write-only), or when the referenced blackboard
    /// variable has not been written yet.
    pub fn get(&self, key: impl Into<Symbol>) -> Option<&str> {
        match self.blackboard_map.get(&key.into())? {
            BlackboardValue::Ref(_, PortType::Output) => None,
            BlackboardValue::Ref(name, _) => self.blackboard.get(name).map(String::as_str),
            BlackboardValue::Literal(value) => Some(value),
        }
    }

    /// Convenience method to parse a port value into a primitive such as
    /// i32 or bool.
    pub fn get_parse<F>(&self, key: impl Into<Symbol>) -> Option<F>
    where
        F: FromStr,
    {
        self.get(key).and_then(|value| value.parse().ok())
    }

    /// Write a value through a port into the enclosing blackboard.
    pub fn set(
        &mut self,
        key: impl Into<Symbol>,
        value: impl Into<String>,
    ) -> Result<(), TickError> {
        let key = key.into();
        match self.blackboard_map.get(&key) {
            None => Err(TickError::UndefinedPort(key)),
            Some(BlackboardValue::Ref(_, PortType::Input)) => Err(TickError::WriteInputPort(key)),
            Some(BlackboardValue::Ref(name, _)) => {
                self.blackboard.insert(*name, value.into());
                Ok(())
            }
            Some(BlackboardValue::Literal(_)) => Err(TickError::WriteToLiteral(key)),
        }
    }

    /// Tick the idx-th child of the current node. `Ok(None)` means there is
    /// no such child.
    pub fn tick_child(&mut self, idx: usize) -> Result<Option<BehaviorResult>, TickError> {
        let Some(child) = self.child_nodes.get_mut(idx) else {
            return Ok(None);
        };
        child.tick(self.blackboard).map(Some)
    }

    pub fn child_count(&self) -> usize {
        self.child_nodes.len()
    }
}
