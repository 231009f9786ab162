use super::nodes::{
    FallbackNode, FalseNode, ForceFailureNode, ForceSuccessNode, IfNode, InverterNode,
    ReactiveFallbackNode, ReactiveSequenceNode, RepeatNode, RetryNode, SequenceNode, SetBoolNode,
    TrueNode,
};
use super::BehaviorNode;
use std::collections::HashMap;

pub fn boxify<T>(cons: impl (Fn() -> T) + 'static) -> Box<dyn Fn() -> Box<dyn BehaviorNode>>
where
    T: BehaviorNode + 'static,
{
    Box::new(move || Box::new(cons()))
}

/// A mapping from node type names to factories. Each factory produces a
/// fresh behavior object, so per-node state such as a sequence cursor is
/// never shared between two loads of the same source.
pub struct Registry {
    node_types: HashMap<String, Box<dyn Fn() -> Box<dyn BehaviorNode>>>,
}

impl Default for Registry {
    fn default() -> Self {
        let mut ret = Self {
            node_types: HashMap::new(),
        };
        ret.register("Sequence", boxify(SequenceNode::default));
        ret.register("ReactiveSequence", boxify(ReactiveSequenceNode::default));
        ret.register("Fallback", boxify(FallbackNode::default));
        ret.register("ReactiveFallbackStar", boxify(ReactiveFallbackNode::default));
        ret.register("ForceSuccess", boxify(ForceSuccessNode::default));
        ret.register("ForceFailure", boxify(ForceFailureNode::default));
        ret.register("Inverter", boxify(InverterNode::default));
        ret.register("Repeat", boxify(RepeatNode::default));
        ret.register("Retry", boxify(RetryNode::default));
        ret.register("true", boxify(TrueNode::default));
        ret.register("false", boxify(FalseNode::default));
        ret.register("SetBool", boxify(SetBoolNode::default));
        ret.register("if", boxify(IfNode::default));
        ret
    }
}

impl Registry {
    pub fn register(
        &mut self,
        type_name: impl ToString,
        constructor: Box<dyn Fn() -> Box<dyn BehaviorNode>>,
    ) {
        self.node_types.insert(type_name.to_string(), constructor);
    }

    pub fn build(&self, type_name: &str) -> Option<Box<dyn BehaviorNode>> {
        self.node_types
            .get(type_name)
            .map(|constructor| constructor())
    }
}
