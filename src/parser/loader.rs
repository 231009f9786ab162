use log::debug;

use super::nom_parser::{BlackboardValue as AstValue, TreeDef, TreeSource};
use crate::{
    error::LoadError, nodes::SubtreeNode, BBMap, BehaviorNode, BehaviorNodeContainer, Blackboard,
    BlackboardValue, PortSpec, Registry,
};

/// Instantiate a behavior tree from the AST of a source text.
///
/// The tree named `main` becomes the root. Node names that match another
/// tree definition are expanded as subtrees (shadowing any registry entry
/// of the same name); everything else is built by the registry factory,
/// so each load gets behavior objects with fresh per-node state.
pub fn load(
    tree_source: &TreeSource,
    registry: &Registry,
) -> Result<BehaviorNodeContainer, LoadError> {
    let main = tree_source
        .tree_defs
        .iter()
        .find(|tree| tree.name == "main")
        .ok_or(LoadError::MissingTree)?;

    debug!("instantiating tree {:?}", main.name);
    let mut subtree_stack = vec![];
    load_recurse(&main.root, tree_source, registry, &mut subtree_stack)
}

fn load_recurse<'src>(
    parent: &TreeDef<'src>,
    tree_source: &TreeSource<'src>,
    registry: &Registry,
    subtree_stack: &mut Vec<&'src str>,
) -> Result<BehaviorNodeContainer, LoadError> {
    let subtree = tree_source
        .tree_defs
        .iter()
        .find(|tree| tree.name == parent.name);

    let (node, child_nodes) = if let Some(tree) = subtree {
        if subtree_stack.contains(&tree.name) {
            return Err(LoadError::InfiniteRecursion {
                node: tree.name.to_owned(),
            });
        }
        debug!("expanding subtree {:?}", tree.name);
        subtree_stack.push(tree.name);
        let loaded_subtree = load_recurse(&tree.root, tree_source, registry, subtree_stack)?;
        subtree_stack.pop();
        let params = tree
            .ports
            .iter()
            .map(|port| PortSpec {
                ty: port.direction,
                key: port.name.into(),
            })
            .collect();
        let node: Box<dyn BehaviorNode> = Box::new(SubtreeNode::new(Blackboard::new(), params));
        (node, vec![loaded_subtree])
    } else {
        let mut child_nodes = Vec::with_capacity(parent.children.len());
        for child in &parent.children {
            child_nodes.push(load_recurse(child, tree_source, registry, subtree_stack)?);
        }
        let node = registry
            .build(parent.name)
            .ok_or_else(|| LoadError::MissingNode(parent.name.to_owned()))?;
        (node, child_nodes)
    };

    let mut blackboard_map = BBMap::new();
    for entry in &parent.port_maps {
        blackboard_map.insert(
            entry.node_port.into(),
            match entry.blackboard_value {
                AstValue::Ref(value) => BlackboardValue::Ref(value.into(), entry.ty),
                AstValue::Literal(value) => BlackboardValue::Literal(value.to_string()),
            },
        );
    }

    Ok(BehaviorNodeContainer::new(
        parent.name.to_owned(),
        node,
        blackboard_map,
        child_nodes,
    ))
}
