//! Fluent builder for a [`Model`].

use sn_agent::{AgentKind, World};
use sn_core::{NodeId, PopulationSpec, SimConfig, SimRng, State, Value};
use sn_graph::{Graph, Topology};

use crate::{KindRegistry, Model, Scheduler, SimError, SimResult};

/// One explicitly placed agent.
struct Placement {
    kind:  AgentKind,
    node:  Option<NodeId>,
    attrs: State,
}

/// One entry of the weighted one-agent-per-node assignment.
struct NetworkShare {
    kind:   AgentKind,
    weight: f64,
    attrs:  State,
}

/// Fluent builder for [`Model`].
///
/// # Inputs
///
/// | Method                  | Default                  |
/// |-------------------------|--------------------------|
/// | `.trial(k)`             | trial 0 (master seed)    |
/// | `.topology(g)`          | empty graph              |
/// | `.global(k, v)`         | no globals               |
/// | `.agent(kind, node, s)` | none                     |
/// | `.populate_network(..)` | none                     |
/// | `.add_agents(..)`       | none                     |
/// | `.population(reg, ..)`  | none                     |
///
/// Agents are created in that order: explicit agents, then one agent per
/// still-free node (node order, kind drawn by weight), then node-less
/// agents.  All of them first run at `t=0`.
///
/// # Example
///
/// ```rust,ignore
/// let mut model = ModelBuilder::new(config)
///     .topology(generators::complete(10))
///     .populate_network(person.clone(), 1.0, State::new())
///     .build()?;
/// model.run(&mut NoopObserver)?;
/// ```
pub struct ModelBuilder {
    config:   SimConfig,
    trial:    usize,
    topology: Graph,
    globals:  State,
    placed:   Vec<Placement>,
    network:  Vec<NetworkShare>,
    counted:  Vec<(AgentKind, usize, State)>,
}

impl ModelBuilder {
    pub fn new(config: SimConfig) -> Self {
        ModelBuilder {
            config,
            trial:    0,
            topology: Graph::empty(),
            globals:  State::new(),
            placed:   Vec::new(),
            network:  Vec::new(),
            counted:  Vec::new(),
        }
    }

    /// Which trial this model runs; selects the derived seed.
    pub fn trial(mut self, trial: usize) -> Self {
        self.trial = trial;
        self
    }

    pub fn topology(mut self, graph: Graph) -> Self {
        self.topology = graph;
        self
    }

    pub fn global(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.globals.insert(key.into(), value.into());
        self
    }

    pub fn globals(mut self, globals: State) -> Self {
        self.globals.extend(globals);
        self
    }

    /// One agent of `kind`, optionally bound to `node`.
    pub fn agent(mut self, kind: &AgentKind, node: Option<NodeId>, attrs: State) -> Self {
        self.placed.push(Placement { kind: kind.clone(), node, attrs });
        self
    }

    /// Take part in the weighted assignment of one agent per free node.
    pub fn populate_network(mut self, kind: AgentKind, weight: f64, attrs: State) -> Self {
        self.network.push(NetworkShare { kind, weight, attrs });
        self
    }

    /// `count` agents of `kind` with no topology node.
    pub fn add_agents(mut self, kind: AgentKind, count: usize, attrs: State) -> Self {
        self.counted.push((kind, count, attrs));
        self
    }

    /// Resolve configured population entries against `registry`.
    ///
    /// Entries with a `count` become node-less agents; the rest share the
    /// topology nodes by weight.
    pub fn population(mut self, registry: &KindRegistry, specs: &[PopulationSpec]) -> SimResult<Self> {
        for spec in specs {
            let kind = registry.resolve(&spec.kind)?.clone();
            match spec.count {
                Some(count) => self = self.add_agents(kind, count, spec.state.clone()),
                None => self = self.populate_network(kind, spec.weight, spec.state.clone()),
            }
        }
        Ok(self)
    }

    /// Validate the config and create every agent.
    pub fn build(self) -> SimResult<Model> {
        self.config.validate()?;
        let trial_seed = self.config.trial_seed(self.trial);
        let mut rng = SimRng::new(trial_seed);
        let mut world = World::new(self.topology);
        world.globals = self.globals;
        let mut scheduler = Scheduler::new(self.config.interval, trial_seed);

        for p in self.placed {
            add(&mut scheduler, &mut world, &p.kind, p.node, p.attrs)?;
        }

        if !self.network.is_empty() {
            let weights: Vec<f64> = self.network.iter().map(|s| s.weight).collect();
            let nodes: Vec<NodeId> = world.topology().node_ids().collect();
            for node in nodes {
                if world.agent_at(node).is_some() {
                    continue;
                }
                let pick = rng.weighted_index(&weights).ok_or_else(|| {
                    SimError::Config(format!("population weights {weights:?} are not a valid distribution"))
                })?;
                let share = &self.network[pick];
                add(&mut scheduler, &mut world, &share.kind, Some(node), share.attrs.clone())?;
            }
        }

        for (kind, count, attrs) in self.counted {
            for _ in 0..count {
                add(&mut scheduler, &mut world, &kind, None, attrs.clone())?;
            }
        }

        tracing::debug!(
            trial = self.trial,
            agents = world.agent_count(),
            nodes = world.topology().node_count(),
            "model built"
        );

        Ok(Model {
            config: self.config,
            trial: self.trial,
            world,
            scheduler,
            failures: Vec::new(),
            activations: 0,
        })
    }
}

fn add(
    scheduler: &mut Scheduler,
    world: &mut World,
    kind: &AgentKind,
    node: Option<NodeId>,
    attrs: State,
) -> SimResult<()> {
    let mut merged = kind.defaults().clone();
    merged.extend(attrs);
    scheduler.add_agent(world, kind.name(), kind.instantiate(), node, merged)?;
    Ok(())
}
