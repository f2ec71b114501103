//! A [`Process`] assembled from closures, one per suspension point.
//!
//! Each stage runs until its next suspension and says where to go from
//! there.  Locals shared across stages live in `L`.  A script built with
//! [`Script::new`] finishes with a [`Step`]; one built with
//! [`Script::for_state`] finishes with a [`Transition`] and can serve as
//! the body of a suspendable FSM state.
//!
//! ```rust
//! use sn_agent::{Flow, ProcessAgent, Script, Step};
//!
//! let _agent = ProcessAgent::new(|| {
//!     Script::new(0u32)
//!         .stage(|n, _| { *n += 1; Ok(Flow::next(1.0)) })
//!         .stage(|n, ctx| { ctx.set("count", *n); Ok(Flow::Return(Step::after(5.0))) })
//! });
//! ```

use sn_schedule::WakeupSpec;

use crate::{AgentContext, AgentResult, Process, Resume, Step, Transition, Yielded};

/// Where a [`Script`] continues after a stage.
#[derive(Debug)]
pub enum Flow<R = Step> {
    /// Suspend, then continue with the following stage.
    Next(Yielded),
    /// Suspend, then run this same stage again.
    Repeat(Yielded),
    /// Suspend, then continue at stage `usize`.
    Jump(usize, Yielded),
    /// Finish the script.
    Return(R),
}

impl<R> Flow<R> {
    pub fn next(delay: f64) -> Self {
        Flow::Next(Yielded::from(delay))
    }

    pub fn repeat(delay: f64) -> Self {
        Flow::Repeat(Yielded::from(delay))
    }

    /// Suspend with the default interval, then continue.
    pub fn next_default() -> Self {
        Flow::Next(Yielded::Wakeup(WakeupSpec::Default))
    }
}

type Stage<L, R> = Box<dyn FnMut(&mut L, &mut AgentContext<'_>) -> AgentResult<Flow<R>>>;

pub struct Script<L, R = Step> {
    locals: L,
    stages: Vec<Stage<L, R>>,
    pc:     usize,
}

impl<L: 'static> Script<L> {
    pub fn new(locals: L) -> Self {
        Script { locals, stages: Vec::new(), pc: 0 }
    }
}

impl<L: 'static> Script<L, Transition> {
    pub fn for_state(locals: L) -> Self {
        Script { locals, stages: Vec::new(), pc: 0 }
    }
}

impl<L: 'static, R: 'static> Script<L, R> {
    pub fn stage<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut L, &mut AgentContext<'_>) -> AgentResult<Flow<R>> + 'static,
    {
        self.stages.push(Box::new(f));
        self
    }

    pub fn locals(&self) -> &L {
        &self.locals
    }

    /// Index of the stage the next resume will run.
    pub fn pc(&self) -> usize {
        self.pc
    }
}

impl<L: 'static, R: Default + 'static> Process<R> for Script<L, R> {
    /// Resuming past the last stage finishes with `R::default()`.
    fn resume(&mut self, ctx: &mut AgentContext<'_>) -> AgentResult<Resume<R>> {
        let Some(stage) = self.stages.get_mut(self.pc) else {
            return Ok(Resume::done());
        };
        Ok(match stage(&mut self.locals, ctx)? {
            Flow::Next(y) => {
                self.pc += 1;
                Resume::Yield(y)
            }
            Flow::Repeat(y) => Resume::Yield(y),
            Flow::Jump(pc, y) => {
                self.pc = pc;
                Resume::Yield(y)
            }
            Flow::Return(out) => Resume::Return(out),
        })
    }
}
