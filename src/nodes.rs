use crate::{
    BehaviorNode, BehaviorResult, Blackboard, Context, PortSpec, PortType, TickError, TickResult,
};

/// Ticks children in order, resuming from where it left off on the
/// previous tick. A failing child is skipped on the next pass.
#[derive(Default)]
pub struct SequenceNode {
    current_child: usize,
}

impl BehaviorNode for SequenceNode {
    fn tick(&mut self, ctx: &mut Context) -> TickResult {
        let mut result = BehaviorResult::Success;
        while let Some(res) = ctx.tick_child(self.current_child)? {
            result = res;
            match res {
                BehaviorResult::Success => self.current_child += 1,
                BehaviorResult::Fail => {
                    self.current_child += 1;
                    break;
                }
                BehaviorResult::Running => break,
            }
        }
        if self.current_child == ctx.child_count() {
            self.current_child = 0;
        }
        Ok(result)
    }
}

/// Like [`SequenceNode`], but re-evaluates all children from the first
/// one on every tick.
#[derive(Default)]
pub struct ReactiveSequenceNode;

impl BehaviorNode for ReactiveSequenceNode {
    fn tick(&mut self, ctx: &mut Context) -> TickResult {
        let mut current_child = 0;
        let mut result = BehaviorResult::Success;
        while let Some(res) = ctx.tick_child(current_child)? {
            result = res;
            match res {
                BehaviorResult::Success => current_child += 1,
                BehaviorResult::Fail => break,
                BehaviorResult::Running => break,
            }
        }
        Ok(result)
    }
}

/// Ticks children in order until one succeeds, resuming from where it
/// left off on the previous tick.
#[derive(Default)]
pub struct FallbackNode {
    current_child: usize,
}

impl BehaviorNode for FallbackNode {
    fn tick(&mut self, ctx: &mut Context) -> TickResult {
        let mut result = BehaviorResult::Fail;
        while let Some(res) = ctx.tick_child(self.current_child)? {
            result = res;
            match res {
                BehaviorResult::Success => {
                    self.current_child += 1;
                    break;
                }
                BehaviorResult::Fail => self.current_child += 1,
                BehaviorResult::Running => break,
            }
        }
        if self.current_child == ctx.child_count() {
            self.current_child = 0;
        }
        Ok(result)
    }
}

/// Like [`FallbackNode`], but re-evaluates all children from the first
/// one on every tick.
#[derive(Default)]
pub struct ReactiveFallbackNode;

impl BehaviorNode for ReactiveFallbackNode {
    fn tick(&mut self, ctx: &mut Context) -> TickResult {
        let mut current_child = 0;
        let mut result = BehaviorResult::Fail;
        while let Some(res) = ctx.tick_child(current_child)? {
            result = res;
            match res {
                BehaviorResult::Success => break,
                BehaviorResult::Fail => current_child += 1,
                BehaviorResult::Running => break,
            }
        }
        Ok(result)
    }
}

#[derive(Default)]
pub struct InverterNode;

impl BehaviorNode for InverterNode {
    fn tick(&mut self, ctx: &mut Context) -> TickResult {
        Ok(match ctx.tick_child(0)? {
            Some(BehaviorResult::Success) => BehaviorResult::Fail,
            Some(BehaviorResult::Fail) => BehaviorResult::Success,
            Some(BehaviorResult::Running) => BehaviorResult::Running,
            None => BehaviorResult::Fail,
        })
    }
}

#[derive(Default)]
pub struct ForceSuccessNode;

impl BehaviorNode for ForceSuccessNode {
    fn tick(&mut self, ctx: &mut Context) -> TickResult {
        if let Some(BehaviorResult::Running) = ctx.tick_child(0)? {
            return Ok(BehaviorResult::Running);
        }
        Ok(BehaviorResult::Success)
    }
}

#[derive(Default)]
pub struct ForceFailureNode;

impl BehaviorNode for ForceFailureNode {
    fn tick(&mut self, ctx: &mut Context) -> TickResult {
        if let Some(BehaviorResult::Running) = ctx.tick_child(0)? {
            return Ok(BehaviorResult::Running);
        }
        Ok(BehaviorResult::Fail)
    }
}

/// Ticks its child up to `n` times, where `n` comes from the input port
/// of the same name. A failing child stops the repetition and the
/// failure is surfaced.
#[derive(Default)]
pub struct RepeatNode {
    n: i32,
}

impl BehaviorNode for RepeatNode {
    fn tick(&mut self, ctx: &mut Context) -> TickResult {
        let count = ctx.get("n").ok_or(TickError::InvalidCount)?;
        if self.n == 0 {
            self.n = count.parse().map_err(|_| TickError::InvalidCount)?;
            if self.n <= 0 {
                return Err(TickError::InvalidCount);
            }
        }
        self.n -= 1;
        if self.n == 0 {
            return Ok(BehaviorResult::Success);
        }
        match ctx.tick_child(0)? {
            None => Ok(BehaviorResult::Fail),
            Some(BehaviorResult::Fail) => {
                self.n = 0;
                Ok(BehaviorResult::Fail)
            }
            Some(_) => Ok(BehaviorResult::Running),
        }
    }
}

/// Ticks its child up to `n` times until it succeeds. The counter port
/// and bookkeeping mirror [`RepeatNode`] with the roles of Success and
/// Fail swapped: a failing child is retried, a succeeding child stops
/// the loop and the success is surfaced.
#[derive(Default)]
pub struct RetryNode {
    n: i32,
}

impl BehaviorNode for RetryNode {
    fn tick(&mut self, ctx: &mut Context) -> TickResult {
        let count = ctx.get("n").ok_or(TickError::InvalidCount)?;
        if self.n == 0 {
            self.n = count.parse().map_err(|_| TickError::InvalidCount)?;
            if self.n <= 0 {
                return Err(TickError::InvalidCount);
            }
        }
        self.n -= 1;
        if self.n == 0 {
            return Ok(BehaviorResult::Success);
        }
        match ctx.tick_child(0)? {
            None => Ok(BehaviorResult::Fail),
            Some(BehaviorResult::Success) => {
                self.n = 0;
                Ok(BehaviorResult::Success)
            }
            Some(_) => Ok(BehaviorResult::Running),
        }
    }
}

#[derive(Default)]
pub struct TrueNode;

impl BehaviorNode for TrueNode {
    fn tick(&mut self, _ctx: &mut Context) -> TickResult {
        Ok(BehaviorResult::Success)
    }
}

#[derive(Default)]
pub struct FalseNode;

impl BehaviorNode for FalseNode {
    fn tick(&mut self, _ctx: &mut Context) -> TickResult {
        Ok(BehaviorResult::Fail)
    }
}

/// Copies the `value` port to the `output` port. `var x = true`
/// declarations desugar to this node.
#[derive(Default)]
pub struct SetBoolNode;

impl BehaviorNode for SetBoolNode {
    fn tick(&mut self, ctx: &mut Context) -> TickResult {
        let value = ctx.get("value").map(str::to_string);
        if let Some(value) = value {
            ctx.set("output", value)?;
        }
        Ok(BehaviorResult::Success)
    }
}

/// Branch selection for the `if (cond) { ... } else { ... }` form.
/// Child 0 is the condition; exactly a failing condition selects the
/// else branch (child 2), anything else selects the then branch
/// (child 1). A missing selected branch yields Fail.
#[derive(Default)]
pub struct IfNode;

impl BehaviorNode for IfNode {
    fn tick(&mut self, ctx: &mut Context) -> TickResult {
        if ctx.tick_child(0)? == Some(BehaviorResult::Fail) {
            return Ok(ctx.tick_child(2)?.unwrap_or(BehaviorResult::Fail));
        }
        Ok(ctx.tick_child(1)?.unwrap_or(BehaviorResult::Fail))
    }
}

/// A container for a subtree, introducing a local name scope of
/// blackboard variables. The loader gives each subtree invocation its
/// own instance, so two call sites of the same tree never share state.
pub struct SubtreeNode {
    /// The local scope lives on the node payload between ticks.
    blackboard: Blackboard,
    params: Vec<PortSpec>,
}

impl SubtreeNode {
    pub fn new(blackboard: Blackboard, params: Vec<PortSpec>) -> Self {
        Self { blackboard, params }
    }
}

impl BehaviorNode for SubtreeNode {
    fn tick(&mut self, ctx: &mut Context) -> TickResult {
        for param in &self.params {
            if !matches!(param.ty, PortType::Input | PortType::InOut) {
                continue;
            }
            if let Some(value) = ctx.get(param.key) {
                let value = value.to_string();
                self.blackboard.insert(param.key, value);
            }
        }

        // The swap must be undone on the error path too, so no `?`
        // between the two swaps.
        std::mem::swap(&mut self.blackboard, ctx.blackboard);
        let res = ctx.tick_child(0);
        std::mem::swap(&mut self.blackboard, ctx.blackboard);
        let res = res?.unwrap_or(BehaviorResult::Success);

        // Outputs are assigned back even when the subtree failed or is
        // still running, which seems less counterintuitive.
        for param in &self.params {
            if !matches!(param.ty, PortType::Output | PortType::InOut) {
                continue;
            }
            if let Some(value) = self.blackboard.get(&param.key) {
                let value = value.clone();
                ctx.set(param.key, value)?;
            }
        }

        Ok(res)
    }
}

#[cfg(test)]
mod test;
