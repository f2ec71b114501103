//! Agent kinds available to run files.
//!
//! - `person`: SIR state machine on a network node.  Susceptible agents park
//!   on a condition until a neighbor is infected (or someone infects them
//!   directly), then catch the infection with probability
//!   `1 - (1 - infection_prob)^k` per tick for `k` infected neighbors.
//!   Infected agents recover `recovery_time` after infection.
//! - `seeder`: a node-less scripted agent that infects a random susceptible
//!   person every `seed_period`, `seed_count` times, then dies.
//!
//! Parameters are read from globals so a run file can tune them without a
//! rebuild.

use sn_agent::{
    AgentContext, AgentKind, AgentResult, Condition, Flow, ProcessAgent, Script, StateTable, Step,
    Transition, STATE_ID,
};
use sn_core::{AgentId, Value};
use sn_sim::KindRegistry;

pub const SUSCEPTIBLE: &str = "susceptible";
pub const INFECTED: &str = "infected";
pub const RECOVERED: &str = "recovered";

/// Attribute holding the time an agent became infected.
pub const INFECTED_AT: &str = "infected_at";

const DEFAULT_INFECTION_PROB: f64 = 0.3;
const DEFAULT_RECOVERY_TIME: f64 = 5.0;

fn param(ctx: &AgentContext<'_>, key: &str, default: f64) -> f64 {
    ctx.global(key).and_then(Value::as_f64).unwrap_or(default)
}

fn count_infection(ctx: &mut AgentContext<'_>) {
    let total = ctx.global("infections").and_then(Value::as_i64).unwrap_or(0);
    ctx.set_global("infections", total + 1);
}

// ── person ────────────────────────────────────────────────────────────────────

/// Holds once an infected neighbor appears or the agent was infected directly.
fn exposed_or_changed() -> Condition {
    Condition::new(|c| {
        let still_susceptible = c.own(STATE_ID).and_then(Value::as_str) == Some(SUSCEPTIBLE);
        Ok(!still_susceptible || c.world.count_neighbors_in_state(c.agent, INFECTED) > 0)
    })
}

fn susceptible(_: &mut (), ctx: &mut AgentContext<'_>) -> AgentResult<Transition> {
    let k = ctx.count_neighbors_in_state(INFECTED);
    if k == 0 {
        return Ok(Transition::stay().when(exposed_or_changed()));
    }
    let beta = param(ctx, "infection_prob", DEFAULT_INFECTION_PROB);
    let p = 1.0 - (1.0 - beta.clamp(0.0, 1.0)).powi(k as i32);
    if ctx.rng().prob(p) {
        let now = ctx.now().value();
        ctx.set(INFECTED_AT, now);
        count_infection(ctx);
        Ok(Transition::to(INFECTED))
    } else {
        Ok(Transition::stay())
    }
}

fn infected(_: &mut (), ctx: &mut AgentContext<'_>) -> AgentResult<Transition> {
    let recovery = param(ctx, "recovery_time", DEFAULT_RECOVERY_TIME);
    // Seeded from the run file without a timestamp: infected since t=0.
    let since = ctx.get_f64(INFECTED_AT).unwrap_or(0.0);
    let due = since + recovery;
    if ctx.now().value() >= due {
        Ok(Transition::to(RECOVERED).never())
    } else {
        Ok(Transition::stay().at(due))
    }
}

fn recovered(_: &mut (), _: &mut AgentContext<'_>) -> AgentResult<Transition> {
    Ok(Transition::stay().never())
}

pub fn person() -> AgentResult<AgentKind> {
    let table = StateTable::builder()
        .default_state(SUSCEPTIBLE, susceptible)
        .state(INFECTED, infected)
        .state(RECOVERED, recovered)
        .build()?;
    Ok(AgentKind::fsm("person", table, || ()))
}

// ── seeder ────────────────────────────────────────────────────────────────────

/// Live susceptible agents on a node, in id order.
fn susceptible_people(ctx: &AgentContext<'_>) -> Vec<AgentId> {
    ctx.world()
        .alive_agents()
        .filter(|r| r.node.is_some() && r.in_state(SUSCEPTIBLE))
        .map(|r| r.id)
        .collect()
}

fn seed_script() -> Script<u32> {
    Script::new(0u32)
        .stage(|_, ctx| {
            let delay = param(ctx, "seed_at", 0.0);
            Ok(Flow::next(delay))
        })
        .stage(|seeded, ctx| {
            let budget = param(ctx, "seed_count", 1.0) as u32;
            if *seeded >= budget {
                return Ok(Flow::Return(Step::Die));
            }
            let candidates = susceptible_people(ctx);
            let Some(&target) = ctx.rng().choose(&candidates) else {
                return Ok(Flow::Return(Step::Die));
            };
            let now = ctx.now().value();
            ctx.nudge(target, STATE_ID, INFECTED)?;
            ctx.nudge(target, INFECTED_AT, now)?;
            count_infection(ctx);
            *seeded += 1;
            ctx.set("seeded", *seeded);
            tracing::debug!(seeder = %ctx.id(), target = %target, now, "seeded infection");
            let period = param(ctx, "seed_period", 1.0);
            Ok(Flow::repeat(period))
        })
}

pub fn seeder() -> AgentKind {
    AgentKind::new("seeder", || Box::new(ProcessAgent::new(seed_script)))
}

/// Every kind a run file may name.
pub fn registry() -> AgentResult<KindRegistry> {
    Ok(KindRegistry::new().with(person()?).with(seeder()))
}
