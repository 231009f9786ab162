use crate::{BBMap, BehaviorNode, Blackboard, Context, TickResult};

/// A runtime tree node: the behavior object together with the port
/// bindings from its call site and its children, in definition order.
pub struct BehaviorNodeContainer {
    /// Name of the type of the node
    pub(crate) name: String,
    pub(crate) node: Box<dyn BehaviorNode>,
    pub(crate) blackboard_map: BBMap,
    pub(crate) child_nodes: Vec<BehaviorNodeContainer>,
}

impl BehaviorNodeContainer {
    pub fn new(
        name: String,
        node: Box<dyn BehaviorNode>,
        blackboard_map: BBMap,
        child_nodes: Vec<BehaviorNodeContainer>,
    ) -> Self {
        Self {
            name,
            node,
            blackboard_map,
            child_nodes,
        }
    }

    pub fn new_node(node: impl BehaviorNode + 'static) -> Self {
        Self {
            name: "".to_owned(),
            node: Box::new(node),
            blackboard_map: BBMap::new(),
            child_nodes: vec![],
        }
    }

    /// Tick this node against the blackboard of the enclosing scope.
    /// A fresh [`Context`] borrowing this container's port map and
    /// children is built for the call, so the view the behavior sees is
    /// always its own.
    pub fn tick(&mut self, blackboard: &mut Blackboard) -> TickResult {
        let mut ctx = Context {
            blackboard,
            blackboard_map: &self.blackboard_map,
            child_nodes: &mut self.child_nodes,
        };
        self.node.tick(&mut ctx)
    }

    pub fn add_child(&mut self, child: BehaviorNodeContainer) {
        self.child_nodes.push(child);
    }

    pub fn children(&self) -> &[BehaviorNodeContainer] {
        &self.child_nodes
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn blackboard_map(&self) -> &BBMap {
        &self.blackboard_map
    }
}
