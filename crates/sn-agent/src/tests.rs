//! Unit tests for sn-agent.

use sn_core::{AgentId, AgentRng, SimTime, State};
use sn_graph::generators;

use crate::{Agent, AgentContext, AgentResult, SpawnRequest, Step, World};

/// A path graph of `n` nodes with one fresh agent of kind "person" per node.
fn path_world(n: usize) -> World {
    let mut world = World::new(generators::path(n));
    for i in 0..n {
        world
            .register("person", Some(sn_core::NodeId(i as u32)), State::new())
            .unwrap();
    }
    world
}

/// Activate `agent` once as `id` at time `now`.
fn activate(
    agent: &mut dyn Agent,
    world: &mut World,
    id: AgentId,
    now: f64,
) -> (AgentResult<Step>, Vec<SpawnRequest>) {
    let mut rng = AgentRng::new(42, id);
    let mut spawned = Vec::new();
    let step = {
        let mut ctx = AgentContext::new(id, SimTime::from(now), 1.0, world, &mut rng, &mut spawned);
        agent.activate(&mut ctx)
    };
    (step, spawned)
}

/// Run `f` against a context for `id` at time `now`.
fn in_context<R>(world: &mut World, id: AgentId, now: f64, f: impl FnOnce(&mut AgentContext<'_>) -> R) -> R {
    let mut rng = AgentRng::new(42, id);
    let mut spawned = Vec::new();
    let mut ctx = AgentContext::new(id, SimTime::from(now), 1.0, world, &mut rng, &mut spawned);
    f(&mut ctx)
}

fn wake_delay(step: &Step) -> Option<f64> {
    match step {
        Step::Wake(sn_schedule::WakeupSpec::After(d)) => Some(*d),
        _ => None,
    }
}

// ── World ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod world_tests {
    use super::*;
    use crate::{AgentError, STATE_ID};
    use sn_core::NodeId;

    #[test]
    fn register_assigns_dense_ids() {
        let world = path_world(3);
        let ids: Vec<_> = world.agents().map(|r| r.id).collect();
        assert_eq!(ids, vec![AgentId(0), AgentId(1), AgentId(2)]);
        assert_eq!(world.agent_at(NodeId(2)), Some(AgentId(2)));
    }

    #[test]
    fn register_rejects_occupied_node() {
        let mut world = path_world(2);
        let err = world.register("person", Some(NodeId(1)), State::new()).unwrap_err();
        assert!(matches!(err, AgentError::NodeOccupied { by: AgentId(1), .. }));
    }

    #[test]
    fn register_rejects_unknown_node() {
        let mut world = path_world(2);
        let err = world.register("person", Some(NodeId(9)), State::new()).unwrap_err();
        assert!(matches!(err, AgentError::Graph(_)));
    }

    #[test]
    fn neighbors_are_ordered_and_skip_dead() {
        let mut world = path_world(3);
        assert_eq!(world.neighbors_of(AgentId(1)), vec![AgentId(0), AgentId(2)]);
        world.retire(AgentId(0));
        assert_eq!(world.neighbors_of(AgentId(1)), vec![AgentId(2)]);
        assert_eq!(world.alive_count(), 2);
        assert_eq!(world.agent_count(), 3);
    }

    #[test]
    fn retired_node_can_be_reused() {
        let mut world = path_world(2);
        world.retire(AgentId(1));
        let id = world.register("person", Some(NodeId(1)), State::new()).unwrap();
        assert_eq!(id, AgentId(2));
        assert_eq!(world.neighbors_of(AgentId(0)), vec![AgentId(2)]);
    }

    #[test]
    fn state_counts() {
        let mut world = path_world(3);
        for id in [AgentId(0), AgentId(2)] {
            world.agent_mut(id).unwrap().attrs.insert(STATE_ID.into(), "infected".into());
        }
        assert_eq!(world.count_in_state("infected"), 2);
        assert_eq!(world.count_neighbors_in_state(AgentId(1), "infected"), 2);
        world.retire(AgentId(2));
        assert_eq!(world.count_in_state("infected"), 1);
    }
}

// ── AgentContext ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod context_tests {
    use super::*;
    use crate::{from_fn, AgentError};
    use sn_core::Value;

    #[test]
    fn set_and_get_own_attrs() {
        let mut world = path_world(1);
        let mut agent = from_fn(|ctx| {
            ctx.set("mood", "happy");
            assert_eq!(ctx.get("mood"), Some(&Value::from("happy")));
            Ok(Step::default())
        });
        let (step, _) = activate(&mut agent, &mut world, AgentId(0), 0.0);
        assert!(matches!(step.unwrap(), Step::Wake(sn_schedule::WakeupSpec::Default)));
        assert_eq!(world.agent(AgentId(0)).unwrap().get("mood"), Some(&Value::from("happy")));
    }

    #[test]
    fn nudge_writes_other_agent() {
        let mut world = path_world(2);
        let mut agent = from_fn(|ctx| {
            let other = ctx.neighbors()[0];
            ctx.nudge(other, "heard", true)?;
            Ok(Step::Die)
        });
        let (step, _) = activate(&mut agent, &mut world, AgentId(0), 0.0);
        assert!(step.unwrap().is_die());
        assert_eq!(world.agent(AgentId(1)).unwrap().get("heard"), Some(&Value::Bool(true)));
    }

    #[test]
    fn nudge_dead_agent_fails() {
        let mut world = path_world(2);
        world.retire(AgentId(1));
        let mut agent = from_fn(|ctx| {
            ctx.nudge(AgentId(1), "x", 1)?;
            Ok(Step::default())
        });
        let (step, _) = activate(&mut agent, &mut world, AgentId(0), 0.0);
        assert!(matches!(step.unwrap_err(), AgentError::AgentNotFound(AgentId(1))));
    }

    #[test]
    fn globals_are_shared() {
        let mut world = path_world(1);
        world.set_global("rate", 0.5);
        let mut agent = from_fn(|ctx| {
            let rate = ctx.global("rate").and_then(Value::as_f64).unwrap_or(0.0);
            ctx.set_global("rate", rate * 2.0);
            Ok(Step::after(rate))
        });
        let (step, _) = activate(&mut agent, &mut world, AgentId(0), 0.0);
        assert_eq!(wake_delay(&step.unwrap()), Some(0.5));
        assert_eq!(world.global("rate"), Some(&Value::Float(1.0)));
    }

    #[test]
    fn spawn_is_collected_not_registered() {
        let mut world = path_world(1);
        let mut agent = from_fn(|ctx| {
            ctx.spawn(SpawnRequest::new("child", Box::new(from_fn(|_| Ok(Step::Die)))).attr("gen", 1));
            Ok(Step::default())
        });
        let (_, spawned) = activate(&mut agent, &mut world, AgentId(0), 0.0);
        assert_eq!(spawned.len(), 1);
        assert_eq!(spawned[0].kind, "child");
        assert_eq!(world.agent_count(), 1);
    }
}

// ── Processes ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod process_tests {
    use super::*;
    use crate::{AgentError, Flow, Process, ProcessAgent, Resume, Script, Yielded};
    use sn_core::Value;

    /// Counts activations across suspensions, finishing after three.
    struct Counter {
        seen: u32,
    }

    impl Process for Counter {
        fn resume(&mut self, ctx: &mut AgentContext<'_>) -> AgentResult<Resume> {
            self.seen += 1;
            ctx.set("seen", self.seen);
            if self.seen < 3 {
                Ok(Resume::after(1.0))
            } else {
                Ok(Resume::Return(Step::after(10.0)))
            }
        }
    }

    #[test]
    fn locals_survive_suspension() {
        let mut world = path_world(1);
        let mut agent = ProcessAgent::new(|| Counter { seen: 0 });
        assert!(!agent.is_suspended());

        let (s1, _) = activate(&mut agent, &mut world, AgentId(0), 0.0);
        assert_eq!(wake_delay(&s1.unwrap()), Some(1.0));
        assert!(agent.is_suspended());

        let (s2, _) = activate(&mut agent, &mut world, AgentId(0), 1.0);
        assert_eq!(wake_delay(&s2.unwrap()), Some(1.0));

        let (s3, _) = activate(&mut agent, &mut world, AgentId(0), 2.0);
        assert_eq!(wake_delay(&s3.unwrap()), Some(10.0));
        assert!(!agent.is_suspended());
        assert_eq!(world.agent(AgentId(0)).unwrap().get("seen"), Some(&Value::Int(3)));

        // A finished process restarts from scratch.
        let (s4, _) = activate(&mut agent, &mut world, AgentId(0), 12.0);
        assert_eq!(wake_delay(&s4.unwrap()), Some(1.0));
        assert_eq!(world.agent(AgentId(0)).unwrap().get("seen"), Some(&Value::Int(1)));
    }

    #[test]
    fn numeric_yield_is_a_delay() {
        assert!(matches!(
            Yielded::Value(Value::Int(4)).into_wakeup().unwrap(),
            sn_schedule::WakeupSpec::After(d) if d == 4.0
        ));
        assert!(matches!(
            Yielded::Value(Value::Null).into_wakeup().unwrap(),
            sn_schedule::WakeupSpec::Default
        ));
    }

    #[test]
    fn non_numeric_yield_fails_and_resets() {
        let mut world = path_world(1);
        let mut agent = ProcessAgent::new(|| {
            Script::new(()).stage(|_, _| Ok(Flow::Next(Yielded::Value(Value::from("soon")))))
        });
        let (step, _) = activate(&mut agent, &mut world, AgentId(0), 0.0);
        assert!(matches!(step.unwrap_err(), AgentError::InvalidYield(_)));
        assert!(!agent.is_suspended());
    }

    #[test]
    fn script_walks_stages_in_order() {
        let mut world = path_world(1);
        let mut agent = ProcessAgent::new(|| {
            Script::new(Vec::<u32>::new())
                .stage(|log, _| {
                    log.push(0);
                    Ok(Flow::next(1.0))
                })
                .stage(|log, ctx| {
                    log.push(1);
                    if log.len() < 4 {
                        Ok(Flow::repeat(2.0))
                    } else {
                        ctx.set("log", log.len() as u32);
                        Ok(Flow::Return(Step::Die))
                    }
                })
        });
        let mut delays = Vec::new();
        for now in 0..4 {
            let (step, _) = activate(&mut agent, &mut world, AgentId(0), now as f64);
            match step.unwrap() {
                Step::Die => delays.push(-1.0),
                s => delays.push(wake_delay(&s).unwrap()),
            }
        }
        assert_eq!(delays, vec![1.0, 2.0, 2.0, -1.0]);
        assert_eq!(world.agent(AgentId(0)).unwrap().get("log"), Some(&Value::Int(4)));
    }

    #[test]
    fn resuming_past_last_stage_finishes_with_default() {
        let mut world = path_world(1);
        let mut agent = ProcessAgent::new(|| Script::new(()).stage(|_, _| Ok(Flow::next(3.0))));
        let (s1, _) = activate(&mut agent, &mut world, AgentId(0), 0.0);
        assert_eq!(wake_delay(&s1.unwrap()), Some(3.0));
        let (s2, _) = activate(&mut agent, &mut world, AgentId(0), 3.0);
        assert!(matches!(s2.unwrap(), Step::Wake(sn_schedule::WakeupSpec::Default)));
        assert!(!agent.is_suspended());
    }

    #[test]
    fn step_error_resets_cursor() {
        let mut world = path_world(1);
        let mut agent = ProcessAgent::new(|| {
            Script::new(())
                .stage(|_, _| Ok(Flow::next(1.0)))
                .stage(|_, _| Err(AgentError::failed("boom")))
        });
        let _ = activate(&mut agent, &mut world, AgentId(0), 0.0);
        assert!(agent.is_suspended());
        let (step, _) = activate(&mut agent, &mut world, AgentId(0), 1.0);
        assert_eq!(step.unwrap_err().label(), "StepError");
        assert!(!agent.is_suspended());
    }
}

// ── FSM ───────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod fsm_tests {
    use super::*;
    use crate::{AgentError, AgentKind, StateTable, Transition, STATE_ID};
    use sn_core::Value;

    #[derive(Default)]
    struct Sick {
        days: u32,
    }

    fn healthy(_: &mut Sick, ctx: &mut AgentContext<'_>) -> AgentResult<Transition> {
        if ctx.count_neighbors_in_state("infected") > 0 {
            Ok(Transition::to("infected"))
        } else {
            Ok(Transition::stay())
        }
    }

    fn infected(s: &mut Sick, _: &mut AgentContext<'_>) -> AgentResult<Transition> {
        s.days += 1;
        if s.days >= 2 { Ok(Transition::die()) } else { Ok(Transition::stay().after(1.0)) }
    }

    fn broken(_: &mut Sick, _: &mut AgentContext<'_>) -> AgentResult<Transition> {
        Ok(Transition::to("nowhere"))
    }

    fn table() -> std::sync::Arc<StateTable<Sick>> {
        StateTable::builder()
            .default_state("healthy", healthy)
            .state("infected", infected)
            .state("broken", broken)
            .build()
            .unwrap()
    }

    #[test]
    fn builder_requires_one_default() {
        let none = StateTable::<Sick>::builder().state("a", healthy).build();
        assert!(matches!(none, Err(AgentError::Definition(_))));
        let two = StateTable::<Sick>::builder()
            .default_state("a", healthy)
            .default_state("b", healthy)
            .build();
        assert!(matches!(two, Err(AgentError::Definition(_))));
    }

    #[test]
    fn builder_rejects_duplicates() {
        let dup = StateTable::<Sick>::builder()
            .default_state("a", healthy)
            .state("a", infected)
            .build();
        assert!(matches!(dup, Err(AgentError::Definition(_))));
    }

    #[test]
    fn kind_seeds_default_state() {
        let kind = AgentKind::fsm("person", table(), Sick::default);
        assert_eq!(kind.defaults().get(STATE_ID), Some(&Value::from("healthy")));
        assert_eq!(table().states(), vec!["broken", "healthy", "infected"]);
    }

    #[test]
    fn transitions_follow_neighbors() {
        let mut world = path_world(2);
        world.agent_mut(AgentId(1)).unwrap().attrs.insert(STATE_ID.into(), "infected".into());
        let kind = AgentKind::fsm("person", table(), Sick::default);
        let mut agent = kind.instantiate();

        let (step, _) = activate(agent.as_mut(), &mut world, AgentId(0), 0.0);
        assert!(matches!(step.unwrap(), Step::Wake(sn_schedule::WakeupSpec::Default)));
        assert_eq!(world.agent(AgentId(0)).unwrap().state_id(), Some("infected"));

        let (step, _) = activate(agent.as_mut(), &mut world, AgentId(0), 1.0);
        assert_eq!(wake_delay(&step.unwrap()), Some(1.0));
        let (step, _) = activate(agent.as_mut(), &mut world, AgentId(0), 2.0);
        assert!(step.unwrap().is_die());
    }

    #[test]
    fn missing_state_id_falls_back_to_default() {
        let mut world = path_world(1);
        let mut agent = crate::Fsm::new(table(), Sick::default());
        let (step, _) = activate(&mut agent, &mut world, AgentId(0), 0.0);
        assert!(step.is_ok());
        assert_eq!(world.agent(AgentId(0)).unwrap().state_id(), Some("healthy"));
    }

    #[test]
    fn unknown_states_are_errors() {
        let mut world = path_world(1);
        let mut agent = crate::Fsm::new(table(), Sick::default());

        world.agent_mut(AgentId(0)).unwrap().attrs.insert(STATE_ID.into(), "broken".into());
        let (step, _) = activate(&mut agent, &mut world, AgentId(0), 0.0);
        assert!(matches!(step.unwrap_err(), AgentError::UnknownState(s) if s == "nowhere"));

        world.agent_mut(AgentId(0)).unwrap().attrs.insert(STATE_ID.into(), "limbo".into());
        let (step, _) = activate(&mut agent, &mut world, AgentId(0), 0.0);
        assert!(matches!(step.unwrap_err(), AgentError::UnknownState(s) if s == "limbo"));
    }
}

// ── Suspendable FSM states ────────────────────────────────────────────────────

#[cfg(test)]
mod fsm_process_tests {
    use super::*;
    use crate::{AgentError, AgentKind, Flow, Fsm, Process, Script, StateTable, Transition, STATE_ID};
    use sn_core::Value;

    fn idle(_: &mut (), _: &mut AgentContext<'_>) -> AgentResult<Transition> {
        Ok(Transition::to("working"))
    }

    fn done(_: &mut (), _: &mut AgentContext<'_>) -> AgentResult<Transition> {
        Ok(Transition::stay().never())
    }

    /// Three units of work, one per activation, then move on to `done`.
    fn working() -> Box<dyn Process<Transition>> {
        Box::new(Script::for_state(0u32).stage(|n, ctx| {
            *n += 1;
            ctx.set("progress", *n);
            if *n < 3 {
                Ok(Flow::repeat(2.0))
            } else {
                Ok(Flow::Return(Transition::to("done").after(5.0)))
            }
        }))
    }

    fn failing() -> Box<dyn Process<Transition>> {
        Box::new(
            Script::for_state(())
                .stage(|_, _| Ok(Flow::next(1.0)))
                .stage(|_, _| Err(AgentError::failed("dropped the tools"))),
        )
    }

    fn table() -> std::sync::Arc<StateTable<()>> {
        StateTable::builder()
            .default_state("idle", idle)
            .process_state("working", working)
            .process_state("failing", failing)
            .state("done", done)
            .build()
            .unwrap()
    }

    fn progress(world: &World) -> Option<&Value> {
        world.agent(AgentId(0)).unwrap().get("progress")
    }

    #[test]
    fn process_state_keeps_its_cursor_until_it_returns() {
        let mut world = path_world(1);
        let mut agent = Fsm::new(table(), ());

        let (step, _) = activate(&mut agent, &mut world, AgentId(0), 0.0);
        assert!(matches!(step.unwrap(), Step::Wake(sn_schedule::WakeupSpec::Default)));
        assert_eq!(world.agent(AgentId(0)).unwrap().state_id(), Some("working"));
        assert!(!agent.is_suspended());

        for (now, expected) in [(1.0, 1), (3.0, 2)] {
            let (step, _) = activate(&mut agent, &mut world, AgentId(0), now);
            assert_eq!(wake_delay(&step.unwrap()), Some(2.0));
            assert_eq!(progress(&world), Some(&Value::Int(expected)));
            assert_eq!(agent.suspended_in(), Some("working"));
            assert_eq!(world.agent(AgentId(0)).unwrap().state_id(), Some("working"));
        }

        let (step, _) = activate(&mut agent, &mut world, AgentId(0), 5.0);
        assert_eq!(wake_delay(&step.unwrap()), Some(5.0));
        assert_eq!(progress(&world), Some(&Value::Int(3)));
        assert_eq!(world.agent(AgentId(0)).unwrap().state_id(), Some("done"));
        assert!(!agent.is_suspended());
    }

    #[test]
    fn outside_state_change_drops_the_cursor() {
        let mut world = path_world(1);
        world.agent_mut(AgentId(0)).unwrap().attrs.insert(STATE_ID.into(), "working".into());
        let mut agent = Fsm::new(table(), ());

        let _ = activate(&mut agent, &mut world, AgentId(0), 0.0);
        assert_eq!(agent.suspended_in(), Some("working"));

        world.agent_mut(AgentId(0)).unwrap().attrs.insert(STATE_ID.into(), "done".into());
        let (step, _) = activate(&mut agent, &mut world, AgentId(0), 1.0);
        assert!(matches!(step.unwrap(), Step::Wake(sn_schedule::WakeupSpec::At(t)) if t.is_never()));
        assert!(!agent.is_suspended());

        // Re-entering the state starts the work over.
        world.agent_mut(AgentId(0)).unwrap().attrs.insert(STATE_ID.into(), "working".into());
        let _ = activate(&mut agent, &mut world, AgentId(0), 2.0);
        assert_eq!(progress(&world), Some(&Value::Int(1)));
    }

    #[test]
    fn process_state_error_resets_cursor() {
        let mut world = path_world(1);
        world.agent_mut(AgentId(0)).unwrap().attrs.insert(STATE_ID.into(), "failing".into());
        let mut agent = Fsm::new(table(), ());

        let (step, _) = activate(&mut agent, &mut world, AgentId(0), 0.0);
        assert_eq!(wake_delay(&step.unwrap()), Some(1.0));
        assert!(agent.is_suspended());

        let (step, _) = activate(&mut agent, &mut world, AgentId(0), 1.0);
        assert_eq!(step.unwrap_err().label(), "StepError");
        assert!(!agent.is_suspended());
    }

    #[test]
    fn process_states_count_as_states() {
        let t = table();
        assert_eq!(t.states(), vec!["done", "failing", "idle", "working"]);
        let dup = StateTable::<()>::builder()
            .default_state("idle", idle)
            .process_state("idle", working)
            .build();
        assert!(matches!(dup, Err(AgentError::Definition(_))));

        let kind = AgentKind::fsm("worker", t, || ());
        assert_eq!(kind.defaults().get(STATE_ID), Some(&Value::from("idle")));
    }
}

// ── Messages ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod message_tests {
    use super::*;
    use crate::{from_fn, AgentError, ConditionContext, MessageKind};
    use sn_core::Value;

    fn poll(cond: &mut crate::Condition, world: &World, agent: u32, now: f64) -> AgentResult<bool> {
        cond.check(&ConditionContext { agent: AgentId(agent), now: SimTime::from(now), world })
    }

    #[test]
    fn tell_delivers_in_order() {
        let mut world = path_world(2);
        let mut sender = from_fn(|ctx| {
            ctx.tell(AgentId(1), "hello")?;
            ctx.tell(AgentId(1), 2)?;
            Ok(Step::default())
        });
        let (step, _) = activate(&mut sender, &mut world, AgentId(0), 0.0);
        assert!(step.is_ok());
        assert_eq!(world.mailbox(AgentId(1)).unwrap().len(), 2);

        let mut inbox = Vec::new();
        let mut reader = from_fn(move |ctx| {
            while let Some(msg) = ctx.receive() {
                assert_eq!(msg.sender, Some(AgentId(0)));
                assert_eq!(msg.kind, MessageKind::Tell);
                inbox.push(msg.payload);
            }
            ctx.set("read", inbox.len() as i64);
            Ok(Step::default())
        });
        let _ = activate(&mut reader, &mut world, AgentId(1), 1.0);
        let mailbox = world.mailbox(AgentId(1)).unwrap();
        assert!(mailbox.is_empty());
        assert_eq!((mailbox.received(), mailbox.processed()), (2, 2));
        assert_eq!(world.agent(AgentId(1)).unwrap().get("read"), Some(&Value::Int(2)));
    }

    #[test]
    fn tell_to_dead_agent_fails() {
        let mut world = path_world(2);
        world.retire(AgentId(1));
        let mut sender = from_fn(|ctx| {
            ctx.tell(AgentId(1), "anyone?")?;
            Ok(Step::default())
        });
        let (step, _) = activate(&mut sender, &mut world, AgentId(0), 0.0);
        assert!(matches!(step.unwrap_err(), AgentError::AgentNotFound(AgentId(1))));
    }

    #[test]
    fn retiring_drops_unread_mail() {
        let mut world = path_world(2);
        world
            .post(AgentId(1), MessageKind::Tell, None, 1, SimTime::ZERO, SimTime::NEVER)
            .unwrap();
        world.retire(AgentId(1));
        assert!(world.mailbox(AgentId(1)).unwrap().is_empty());
    }

    #[test]
    fn tell_neighbors_reaches_live_neighbors() {
        let mut world = path_world(3);
        world.retire(AgentId(2));
        let mut hub = from_fn(|ctx| {
            let n = ctx.tell_neighbors("rumor")?;
            ctx.set("told", n as i64);
            Ok(Step::default())
        });
        let _ = activate(&mut hub, &mut world, AgentId(1), 0.0);
        assert_eq!(world.agent(AgentId(1)).unwrap().get("told"), Some(&Value::Int(1)));
        assert_eq!(world.mailbox(AgentId(0)).unwrap().len(), 1);
    }

    #[test]
    fn received_condition_waits_then_times_out() {
        let mut world = path_world(2);
        let mut cond = in_context(&mut world, AgentId(0), 1.0, |ctx| ctx.received(Some(3.0))).unwrap();

        assert!(!poll(&mut cond, &world, 0, 2.0).unwrap());
        let err = poll(&mut cond, &world, 0, 4.0).unwrap_err();
        assert_eq!(err.label(), "TimedOut");
    }

    #[test]
    fn received_condition_fires_on_new_mail_only() {
        let mut world = path_world(2);
        world
            .post(AgentId(0), MessageKind::Tell, None, "old", SimTime::ZERO, SimTime::NEVER)
            .unwrap();
        let mut cond = in_context(&mut world, AgentId(0), 1.0, |ctx| ctx.received(None)).unwrap();

        assert!(!poll(&mut cond, &world, 0, 2.0).unwrap());
        in_context(&mut world, AgentId(1), 2.0, |ctx| ctx.tell(AgentId(0), "new")).unwrap();
        assert!(poll(&mut cond, &world, 0, 2.0).unwrap());
        assert!(poll(&mut cond, &world, 0, 1000.0).unwrap());
    }

    #[test]
    fn negative_timeout_is_rejected() {
        let mut world = path_world(1);
        let err = in_context(&mut world, AgentId(0), 0.0, |ctx| ctx.received(Some(-1.0))).unwrap_err();
        assert_eq!(err.label(), "InvalidDelay");
    }

    #[test]
    fn ask_and_reply() {
        let mut world = path_world(2);
        let (msg, mut cond) =
            in_context(&mut world, AgentId(0), 0.0, |ctx| ctx.ask(AgentId(1), "status?", Some(5.0))).unwrap();
        assert!(!poll(&mut cond, &world, 0, 1.0).unwrap());

        let mut answerer = from_fn(|ctx| {
            let question = ctx.receive().ok_or_else(|| AgentError::failed("no question"))?;
            assert!(question.is_ask());
            ctx.reply(&question, "fine")?;
            Ok(Step::default())
        });
        let (step, _) = activate(&mut answerer, &mut world, AgentId(1), 1.0);
        assert!(step.is_ok());
        assert!(poll(&mut cond, &world, 0, 2.0).unwrap());

        let answer = in_context(&mut world, AgentId(0), 2.0, |ctx| ctx.take_reply(msg));
        assert_eq!(answer, Some(Value::from("fine")));
        assert!(world.reply(msg).is_none());
    }

    #[test]
    fn unanswered_ask_expires_on_both_ends() {
        let mut world = path_world(2);
        let (_, mut cond) =
            in_context(&mut world, AgentId(0), 0.0, |ctx| ctx.ask(AgentId(1), "ping", Some(2.0))).unwrap();

        let err = poll(&mut cond, &world, 0, 2.0).unwrap_err();
        assert!(matches!(err, AgentError::TimedOut(_)));
        // Too late to read: the question is discarded unread.
        assert!(world.take_message(AgentId(1), SimTime::from(3.0)).is_none());
        assert_eq!(world.mailbox(AgentId(1)).unwrap().processed(), 1);
    }

    #[test]
    fn replying_to_a_tell_fails() {
        let mut world = path_world(2);
        world
            .post(AgentId(1), MessageKind::Tell, Some(AgentId(0)), "hi", SimTime::ZERO, SimTime::NEVER)
            .unwrap();
        let mut agent = from_fn(|ctx| {
            let msg = ctx.receive().ok_or_else(|| AgentError::failed("empty"))?;
            ctx.reply(&msg, "hi back")?;
            Ok(Step::default())
        });
        let (step, _) = activate(&mut agent, &mut world, AgentId(1), 0.0);
        assert_eq!(step.unwrap_err().label(), "StepError");
    }
}

// ── Conditions ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod condition_tests {
    use super::*;
    use crate::{Condition, ConditionContext};

    #[test]
    fn builtin_conditions() {
        let mut world = path_world(2);
        let ctx = |world: &World| -> (bool, bool) {
            let c = ConditionContext { agent: AgentId(0), now: SimTime::ZERO, world };
            (
                Condition::global_equals("go", true).check(&c).unwrap(),
                Condition::neighbor_in_state("infected").check(&c).unwrap(),
            )
        };
        assert_eq!(ctx(&world), (false, false));
        world.set_global("go", true);
        world
            .agent_mut(AgentId(1))
            .unwrap()
            .attrs
            .insert(crate::STATE_ID.into(), "infected".into());
        assert_eq!(ctx(&world), (true, true));
    }

    #[test]
    fn attr_condition_reads_own_attrs() {
        let mut world = path_world(1);
        let mut cond = Condition::attr_equals("ready", 1);
        let c = ConditionContext { agent: AgentId(0), now: SimTime::ZERO, world: &world };
        assert!(!cond.check(&c).unwrap());
        world.agent_mut(AgentId(0)).unwrap().attrs.insert("ready".into(), 1.into());
        let c = ConditionContext { agent: AgentId(0), now: SimTime::ZERO, world: &world };
        assert!(cond.check(&c).unwrap());
    }
}
