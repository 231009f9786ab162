use super::*;
use crate::{hash_map, BehaviorNodeContainer, Blackboard, BlackboardValue, Symbol};
use std::{cell::RefCell, rc::Rc};

struct Append<const V: bool = true> {
    log: Rc<RefCell<Vec<bool>>>,
}

impl<const V: bool> BehaviorNode for Append<V> {
    fn tick(&mut self, _ctx: &mut Context) -> TickResult {
        self.log.borrow_mut().push(V);
        Ok(BehaviorResult::Success)
    }
}

struct AppendAndFail<const V: bool = true> {
    log: Rc<RefCell<Vec<bool>>>,
}

impl<const V: bool> BehaviorNode for AppendAndFail<V> {
    fn tick(&mut self, _ctx: &mut Context) -> TickResult {
        self.log.borrow_mut().push(V);
        Ok(BehaviorResult::Fail)
    }
}

struct Suspend;

impl BehaviorNode for Suspend {
    fn tick(&mut self, _ctx: &mut Context) -> TickResult {
        Ok(BehaviorResult::Running)
    }
}

struct AlwaysSucceed;

impl BehaviorNode for AlwaysSucceed {
    fn tick(&mut self, _ctx: &mut Context) -> TickResult {
        Ok(BehaviorResult::Success)
    }
}

struct AlwaysFail;

impl BehaviorNode for AlwaysFail {
    fn tick(&mut self, _ctx: &mut Context) -> TickResult {
        Ok(BehaviorResult::Fail)
    }
}

fn log_and_container(
    node: impl BehaviorNode + 'static,
) -> (Rc<RefCell<Vec<bool>>>, BehaviorNodeContainer) {
    (
        Rc::new(RefCell::new(vec![])),
        BehaviorNodeContainer::new_node(node),
    )
}

#[test]
fn test_sequence() {
    let (log, mut tree) = log_and_container(SequenceNode::default());
    tree.add_child(BehaviorNodeContainer::new_node(Append::<true> {
        log: log.clone(),
    }));
    tree.add_child(BehaviorNodeContainer::new_node(Append::<false> {
        log: log.clone(),
    }));

    let mut blackboard = Blackboard::new();
    assert_eq!(tree.tick(&mut blackboard), Ok(BehaviorResult::Success));
    assert_eq!(*log.borrow(), vec![true, false]);
}

#[test]
fn test_sequence_fail_skips_rest() {
    let (log, mut tree) = log_and_container(SequenceNode::default());
    tree.add_child(BehaviorNodeContainer::new_node(AppendAndFail::<true> {
        log: log.clone(),
    }));
    tree.add_child(BehaviorNodeContainer::new_node(Append::<false> {
        log: log.clone(),
    }));

    let mut blackboard = Blackboard::new();
    assert_eq!(tree.tick(&mut blackboard), Ok(BehaviorResult::Fail));
    assert_eq!(*log.borrow(), vec![true]);

    // The cursor was advanced past the failed child, so the next tick
    // resumes at the second one.
    assert_eq!(tree.tick(&mut blackboard), Ok(BehaviorResult::Success));
    assert_eq!(*log.borrow(), vec![true, false]);
}

#[test]
fn test_sequence_suspend() {
    let (log, mut tree) = log_and_container(SequenceNode::default());
    tree.add_child(BehaviorNodeContainer::new_node(Append::<true> {
        log: log.clone(),
    }));
    tree.add_child(BehaviorNodeContainer::new_node(Suspend));
    tree.add_child(BehaviorNodeContainer::new_node(Append::<false> {
        log: log.clone(),
    }));

    let mut blackboard = Blackboard::new();
    assert_eq!(tree.tick(&mut blackboard), Ok(BehaviorResult::Running));
    assert_eq!(*log.borrow(), vec![true]);

    // Even ticking again won't run the first child; the sequence resumes
    // at the suspended one.
    assert_eq!(tree.tick(&mut blackboard), Ok(BehaviorResult::Running));
    assert_eq!(*log.borrow(), vec![true]);
}

#[test]
fn test_reactive_sequence_suspend() {
    let (log, mut tree) = log_and_container(ReactiveSequenceNode::default());
    tree.add_child(BehaviorNodeContainer::new_node(Append::<true> {
        log: log.clone(),
    }));
    tree.add_child(BehaviorNodeContainer::new_node(Suspend));
    tree.add_child(BehaviorNodeContainer::new_node(Append::<false> {
        log: log.clone(),
    }));

    let mut blackboard = Blackboard::new();
    assert_eq!(tree.tick(&mut blackboard), Ok(BehaviorResult::Running));
    assert_eq!(*log.borrow(), vec![true]);

    // Unlike a SequenceNode, ticking again re-evaluates the first child.
    assert_eq!(tree.tick(&mut blackboard), Ok(BehaviorResult::Running));
    assert_eq!(*log.borrow(), vec![true, true]);
}

#[test]
fn test_fallback() {
    let (log, mut tree) = log_and_container(FallbackNode::default());
    tree.add_child(BehaviorNodeContainer::new_node(AppendAndFail::<true> {
        log: log.clone(),
    }));
    tree.add_child(BehaviorNodeContainer::new_node(AppendAndFail::<false> {
        log: log.clone(),
    }));

    let mut blackboard = Blackboard::new();
    assert_eq!(tree.tick(&mut blackboard), Ok(BehaviorResult::Fail));
    assert_eq!(*log.borrow(), vec![true, false]);
}

#[test]
fn test_fallback_stops_at_success() {
    let (log, mut tree) = log_and_container(FallbackNode::default());
    tree.add_child(BehaviorNodeContainer::new_node(AppendAndFail::<true> {
        log: log.clone(),
    }));
    tree.add_child(BehaviorNodeContainer::new_node(Append::<true> {
        log: log.clone(),
    }));
    tree.add_child(BehaviorNodeContainer::new_node(AppendAndFail::<false> {
        log: log.clone(),
    }));

    let mut blackboard = Blackboard::new();
    assert_eq!(tree.tick(&mut blackboard), Ok(BehaviorResult::Success));
    assert_eq!(*log.borrow(), vec![true, true]);

    // The cursor was advanced past the successful child and resumes there.
    assert_eq!(tree.tick(&mut blackboard), Ok(BehaviorResult::Fail));
    assert_eq!(*log.borrow(), vec![true, true, false]);
}

#[test]
fn test_fallback_suspend() {
    let (log, mut tree) = log_and_container(FallbackNode::default());
    tree.add_child(BehaviorNodeContainer::new_node(AppendAndFail::<true> {
        log: log.clone(),
    }));
    tree.add_child(BehaviorNodeContainer::new_node(Suspend));
    tree.add_child(BehaviorNodeContainer::new_node(AppendAndFail::<false> {
        log: log.clone(),
    }));

    let mut blackboard = Blackboard::new();
    assert_eq!(tree.tick(&mut blackboard), Ok(BehaviorResult::Running));
    assert_eq!(*log.borrow(), vec![true]);

    assert_eq!(tree.tick(&mut blackboard), Ok(BehaviorResult::Running));
    assert_eq!(*log.borrow(), vec![true]);
}

#[test]
fn test_reactive_fallback_suspend() {
    let (log, mut tree) = log_and_container(ReactiveFallbackNode::default());
    tree.add_child(BehaviorNodeContainer::new_node(AppendAndFail::<true> {
        log: log.clone(),
    }));
    tree.add_child(BehaviorNodeContainer::new_node(Suspend));
    tree.add_child(BehaviorNodeContainer::new_node(AppendAndFail::<false> {
        log: log.clone(),
    }));

    let mut blackboard = Blackboard::new();
    assert_eq!(tree.tick(&mut blackboard), Ok(BehaviorResult::Running));
    assert_eq!(*log.borrow(), vec![true]);

    // Unlike a FallbackNode, ticking again re-evaluates the first child.
    assert_eq!(tree.tick(&mut blackboard), Ok(BehaviorResult::Running));
    assert_eq!(*log.borrow(), vec![true, true]);
}

#[test]
fn test_inverter() {
    let mut blackboard = Blackboard::new();

    let mut invert_success = BehaviorNodeContainer::new_node(InverterNode);
    invert_success.add_child(BehaviorNodeContainer::new_node(AlwaysSucceed));
    assert_eq!(
        invert_success.tick(&mut blackboard),
        Ok(BehaviorResult::Fail)
    );

    let mut invert_failure = BehaviorNodeContainer::new_node(InverterNode);
    invert_failure.add_child(BehaviorNodeContainer::new_node(AlwaysFail));
    assert_eq!(
        invert_failure.tick(&mut blackboard),
        Ok(BehaviorResult::Success)
    );

    let mut invert_running = BehaviorNodeContainer::new_node(InverterNode);
    invert_running.add_child(BehaviorNodeContainer::new_node(Suspend));
    assert_eq!(
        invert_running.tick(&mut blackboard),
        Ok(BehaviorResult::Running)
    );

    let mut invert_empty = BehaviorNodeContainer::new_node(InverterNode);
    assert_eq!(invert_empty.tick(&mut blackboard), Ok(BehaviorResult::Fail));
}

#[test]
fn test_force_success() {
    let mut blackboard = Blackboard::new();

    let mut force_success = BehaviorNodeContainer::new_node(ForceSuccessNode);
    force_success.add_child(BehaviorNodeContainer::new_node(AlwaysFail));
    assert_eq!(
        force_success.tick(&mut blackboard),
        Ok(BehaviorResult::Success)
    );

    let mut force_running = BehaviorNodeContainer::new_node(ForceSuccessNode);
    force_running.add_child(BehaviorNodeContainer::new_node(Suspend));
    assert_eq!(
        force_running.tick(&mut blackboard),
        Ok(BehaviorResult::Running)
    );
}

#[test]
fn test_force_failure() {
    let mut blackboard = Blackboard::new();

    let mut force_failure = BehaviorNodeContainer::new_node(ForceFailureNode);
    force_failure.add_child(BehaviorNodeContainer::new_node(AlwaysSucceed));
    assert_eq!(
        force_failure.tick(&mut blackboard),
        Ok(BehaviorResult::Fail)
    );

    let mut force_running = BehaviorNodeContainer::new_node(ForceFailureNode);
    force_running.add_child(BehaviorNodeContainer::new_node(Suspend));
    assert_eq!(
        force_running.tick(&mut blackboard),
        Ok(BehaviorResult::Running)
    );
}

fn repeat_container(
    node: impl BehaviorNode + 'static,
    count: &str,
    child: BehaviorNodeContainer,
) -> BehaviorNodeContainer {
    BehaviorNodeContainer::new(
        "Repeat".to_string(),
        Box::new(node),
        hash_map!("n" => BlackboardValue::Literal(count.to_string())),
        vec![child],
    )
}

#[test]
fn test_repeat() {
    let log = Rc::new(RefCell::new(vec![]));
    let mut tree = repeat_container(
        RepeatNode::default(),
        "3",
        BehaviorNodeContainer::new_node(Append::<true> { log: log.clone() }),
    );

    let mut blackboard = Blackboard::new();
    let mut res = tree.tick(&mut blackboard).unwrap();
    while res == BehaviorResult::Running {
        res = tree.tick(&mut blackboard).unwrap();
    }
    assert_eq!(res, BehaviorResult::Success);
    assert_eq!(*log.borrow(), vec![true, true]);
}

#[test]
fn test_repeat_fail() {
    let log = Rc::new(RefCell::new(vec![]));
    let mut tree = repeat_container(
        RepeatNode::default(),
        "3",
        BehaviorNodeContainer::new_node(AppendAndFail::<true> { log: log.clone() }),
    );

    let mut blackboard = Blackboard::new();
    assert_eq!(tree.tick(&mut blackboard), Ok(BehaviorResult::Fail));
    assert_eq!(*log.borrow(), vec![true]);
}

#[test]
fn test_repeat_invalid_count() {
    let mut blackboard = Blackboard::new();

    let mut missing = BehaviorNodeContainer::new_node(RepeatNode::default());
    missing.add_child(BehaviorNodeContainer::new_node(AlwaysSucceed));
    assert_eq!(missing.tick(&mut blackboard), Err(TickError::InvalidCount));

    let mut zero = repeat_container(
        RepeatNode::default(),
        "0",
        BehaviorNodeContainer::new_node(AlwaysSucceed),
    );
    assert_eq!(zero.tick(&mut blackboard), Err(TickError::InvalidCount));

    let mut garbage = repeat_container(
        RepeatNode::default(),
        "three",
        BehaviorNodeContainer::new_node(AlwaysSucceed),
    );
    assert_eq!(garbage.tick(&mut blackboard), Err(TickError::InvalidCount));
}

#[test]
fn test_retry() {
    let log = Rc::new(RefCell::new(vec![]));
    let mut tree = repeat_container(
        RetryNode::default(),
        "3",
        BehaviorNodeContainer::new_node(AppendAndFail::<true> { log: log.clone() }),
    );

    let mut blackboard = Blackboard::new();
    let mut res = tree.tick(&mut blackboard).unwrap();
    while res == BehaviorResult::Running {
        res = tree.tick(&mut blackboard).unwrap();
    }
    assert_eq!(res, BehaviorResult::Success);
    assert_eq!(*log.borrow(), vec![true, true]);
}

#[test]
fn test_retry_success() {
    let log = Rc::new(RefCell::new(vec![]));
    let mut tree = repeat_container(
        RetryNode::default(),
        "3",
        BehaviorNodeContainer::new_node(Append::<true> { log: log.clone() }),
    );

    let mut blackboard = Blackboard::new();
    assert_eq!(tree.tick(&mut blackboard), Ok(BehaviorResult::Success));
    assert_eq!(*log.borrow(), vec![true]);
}

#[test]
fn test_set_bool() {
    let mut tree = BehaviorNodeContainer::new(
        "SetBool".to_string(),
        Box::new(SetBoolNode),
        hash_map!(
            "value" => BlackboardValue::Literal("true".to_string()),
            "output" => BlackboardValue::Ref("flag".into(), PortType::Output),
        ),
        vec![],
    );

    let mut blackboard = Blackboard::new();
    assert_eq!(tree.tick(&mut blackboard), Ok(BehaviorResult::Success));
    assert_eq!(
        blackboard.get(&Symbol::from("flag")).map(String::as_str),
        Some("true")
    );
}

#[test]
fn test_if() {
    let mut blackboard = Blackboard::new();
    let log = Rc::new(RefCell::new(vec![]));

    let mut then_branch = BehaviorNodeContainer::new_node(IfNode);
    then_branch.add_child(BehaviorNodeContainer::new_node(AlwaysSucceed));
    then_branch.add_child(BehaviorNodeContainer::new_node(Append::<true> {
        log: log.clone(),
    }));
    then_branch.add_child(BehaviorNodeContainer::new_node(Append::<false> {
        log: log.clone(),
    }));
    assert_eq!(then_branch.tick(&mut blackboard), Ok(BehaviorResult::Success));
    assert_eq!(*log.borrow(), vec![true]);

    log.borrow_mut().clear();
    let mut else_branch = BehaviorNodeContainer::new_node(IfNode);
    else_branch.add_child(BehaviorNodeContainer::new_node(AlwaysFail));
    else_branch.add_child(BehaviorNodeContainer::new_node(Append::<true> {
        log: log.clone(),
    }));
    else_branch.add_child(BehaviorNodeContainer::new_node(Append::<false> {
        log: log.clone(),
    }));
    assert_eq!(else_branch.tick(&mut blackboard), Ok(BehaviorResult::Success));
    assert_eq!(*log.borrow(), vec![false]);

    let mut no_else = BehaviorNodeContainer::new_node(IfNode);
    no_else.add_child(BehaviorNodeContainer::new_node(AlwaysFail));
    no_else.add_child(BehaviorNodeContainer::new_node(AlwaysSucceed));
    assert_eq!(no_else.tick(&mut blackboard), Ok(BehaviorResult::Fail));
}

struct WritePort;

impl BehaviorNode for WritePort {
    fn tick(&mut self, ctx: &mut Context) -> TickResult {
        ctx.set("output", "written")?;
        Ok(BehaviorResult::Success)
    }
}

#[test]
fn test_write_errors() {
    let mut blackboard = Blackboard::new();

    let mut unbound = BehaviorNodeContainer::new_node(WritePort);
    assert_eq!(
        unbound.tick(&mut blackboard),
        Err(TickError::UndefinedPort("output".into()))
    );

    let mut input_bound = BehaviorNodeContainer::new(
        "WritePort".to_string(),
        Box::new(WritePort),
        hash_map!("output" => BlackboardValue::Ref("x".into(), PortType::Input)),
        vec![],
    );
    assert_eq!(
        input_bound.tick(&mut blackboard),
        Err(TickError::WriteInputPort("output".into()))
    );

    let mut literal_bound = BehaviorNodeContainer::new(
        "WritePort".to_string(),
        Box::new(WritePort),
        hash_map!("output" => BlackboardValue::Literal("lit".to_string())),
        vec![],
    );
    assert_eq!(
        literal_bound.tick(&mut blackboard),
        Err(TickError::WriteToLiteral("output".into()))
    );
}

struct ExpectNoInput;

impl BehaviorNode for ExpectNoInput {
    fn tick(&mut self, ctx: &mut Context) -> TickResult {
        if ctx.get("input").is_none() {
            Ok(BehaviorResult::Success)
        } else {
            Ok(BehaviorResult::Fail)
        }
    }
}

#[test]
fn test_output_port_is_write_only() {
    let mut blackboard = hash_map!("x" => "val");
    let mut tree = BehaviorNodeContainer::new(
        "ExpectNoInput".to_string(),
        Box::new(ExpectNoInput),
        hash_map!("input" => BlackboardValue::Ref("x".into(), PortType::Output)),
        vec![],
    );
    assert_eq!(tree.tick(&mut blackboard), Ok(BehaviorResult::Success));
}

struct CopyPort;

impl BehaviorNode for CopyPort {
    fn tick(&mut self, ctx: &mut Context) -> TickResult {
        let value = ctx.get("input").map(str::to_string);
        if let Some(value) = value {
            ctx.set("output", value)?;
        }
        Ok(BehaviorResult::Success)
    }
}

#[test]
fn test_subtree_scope() {
    let leaf = BehaviorNodeContainer::new(
        "CopyPort".to_string(),
        Box::new(CopyPort),
        hash_map!(
            "input" => BlackboardValue::Ref("param".into(), PortType::Input),
            "output" => BlackboardValue::Ref("result".into(), PortType::Output),
        ),
        vec![],
    );
    let mut tree = BehaviorNodeContainer::new(
        "sub".to_string(),
        Box::new(SubtreeNode::new(
            Blackboard::new(),
            vec![PortSpec::new_in("param"), PortSpec::new_out("result")],
        )),
        hash_map!(
            "param" => BlackboardValue::Literal("42".to_string()),
            "result" => BlackboardValue::Ref("res".into(), PortType::Output),
        ),
        vec![leaf],
    );

    let mut blackboard = Blackboard::new();
    assert_eq!(tree.tick(&mut blackboard), Ok(BehaviorResult::Success));

    // The declared output came back out; the intermediate names did not.
    assert_eq!(
        blackboard.get(&Symbol::from("res")).map(String::as_str),
        Some("42")
    );
    assert!(!blackboard.contains_key(&Symbol::from("param")));
    assert!(!blackboard.contains_key(&Symbol::from("result")));
}
