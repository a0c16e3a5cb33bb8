//! Connector system - per-tick state machine for connectors being dragged
//! out of a node.
//!
//! While a connector is in `NotConnect` each tick it follows the pointer,
//! re-prices itself and checks feasibility. A commit trigger on a feasible
//! tick probes the node layer under the pointer; a hit on a fresh, distinct
//! node commits the connector against the pool, registry and graph. Every
//! rejection is silent and reported only through the returned outcome.

use crate::components::{Connector, ConnectorState, Layer, Node, Position, Tint, Vec2};
use crate::systems::{
    BloodPool, ConnectionRegistry, Directive, EventBus, GraphEvent, HitTest, NodeGraph,
};
use bloodlink_logic::cost::{connection_cost, debit_amount, is_feasible};
use hecs::{Entity, World};

/// Pointer sample for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerFrame {
    /// Pointer position in world space
    pub position: Vec2,
    /// Commit trigger, edge-triggered (true only on the press tick)
    pub commit: bool,
}

impl PointerFrame {
    pub fn hover(x: f32, y: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            commit: false,
        }
    }

    pub fn press(x: f32, y: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            commit: true,
        }
    }
}

/// What a connector did during one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not tracking (undefined, committed, or source gone)
    Idle,
    /// Invalid or too expensive; drawn red
    Infeasible,
    /// Feasible, no commit trigger this tick
    Tracking,
    /// Trigger fired but nothing on the node layer under the pointer
    Missed,
    /// Trigger fired on the connector's own source
    SelfHit,
    /// The hit entity is not a registered node
    NotANode,
    /// Source and target are already connected
    Duplicate,
    /// The pool could not cover the debit at commit time
    Unaffordable,
    Committed { target: Entity, debited: i64 },
}

/// What a directive did to one connector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveOutcome {
    Ignored,
    /// Caller must tear the connector down
    Hidden,
    ValiditySet(bool),
}

/// Shared state a connector commits against
pub struct LinkContext<'a> {
    pub pool: &'a mut BloodPool,
    pub registry: &'a mut ConnectionRegistry,
    pub graph: &'a mut NodeGraph,
    pub events: &'a EventBus<GraphEvent>,
    pub cost_per_unit: f64,
    /// Half width of the connector outline
    pub half_width: f32,
}

/// Advance every connector by one tick.
pub fn connector_system(
    world: &mut World,
    ctx: &mut LinkContext<'_>,
    input: &PointerFrame,
    hit_test: &impl HitTest,
) -> Vec<(Entity, TickOutcome)> {
    let connectors: Vec<Entity> = world
        .query::<&Connector>()
        .iter()
        .map(|(entity, _)| entity)
        .collect();

    connectors
        .into_iter()
        .map(|entity| (entity, step_connector(world, entity, ctx, input, hit_test)))
        .collect()
}

/// Advance a single connector by one tick.
pub fn step_connector(
    world: &mut World,
    entity: Entity,
    ctx: &mut LinkContext<'_>,
    input: &PointerFrame,
    hit_test: &impl HitTest,
) -> TickOutcome {
    let Some(mut connector) = world.get::<&Connector>(entity).ok().map(|c| *c) else {
        return TickOutcome::Idle;
    };
    if connector.state != ConnectorState::NotConnect {
        return TickOutcome::Idle;
    }
    let Some(source_position) = world.get::<&Position>(connector.source).ok().map(|p| p.0) else {
        log::debug!("connector {:?} lost its source {:?}", entity, connector.source);
        return TickOutcome::Idle;
    };

    connector.start = source_position;
    connector.set_end(input.position, ctx.half_width);
    connector.cost = connection_cost(connector.length() as f64, ctx.cost_per_unit);

    let outcome = if !is_feasible(connector.valid, ctx.pool.available(), connector.cost) {
        connector.tint = Tint::Infeasible;
        TickOutcome::Infeasible
    } else {
        connector.tint = Tint::Feasible;
        if input.commit {
            try_commit(world, &mut connector, ctx, hit_test)
        } else {
            TickOutcome::Tracking
        }
    };

    if let Ok(mut stored) = world.get::<&mut Connector>(entity) {
        *stored = connector;
    }
    outcome
}

fn try_commit(
    world: &World,
    connector: &mut Connector,
    ctx: &mut LinkContext<'_>,
    hit_test: &impl HitTest,
) -> TickOutcome {
    let source = connector.source;
    let Some(hit) = hit_test.probe(world, connector.end, Vec2::ZERO, Layer::Node) else {
        return TickOutcome::Missed;
    };
    if hit.entity == source {
        return TickOutcome::SelfHit;
    }
    if !ctx.graph.contains(hit.entity) {
        log::debug!("probe hit {:?}, which is not a graph node", hit.entity);
        return TickOutcome::NotANode;
    }
    // The registry stores both orderings on every record, so the forward
    // lookup also covers an attempt made from the other end.
    if ctx.registry.is_connected(source, hit.entity) {
        log::debug!("{:?} and {:?} are already connected", source, hit.entity);
        return TickOutcome::Duplicate;
    }

    // Debit first so a failure leaves nothing mutated. Within one tick the
    // feasibility check already guarantees `debited <= cost <= available`, so
    // this branch is unreachable while the pool is only touched from here.
    let debited = debit_amount(connector.cost);
    if !ctx.pool.debit(debited) {
        log::debug!(
            "pool of {} cannot cover {} for {:?}",
            ctx.pool.available(),
            debited,
            source
        );
        return TickOutcome::Unaffordable;
    }

    let target = hit.entity;
    connector.set_end(hit.position, ctx.half_width);
    connector.state = ConnectorState::Connect;
    connector.target = Some(target);

    ctx.registry.record(source, target);
    ctx.registry.mark_linked(target);
    ctx.graph.activate(target);
    ctx.graph.add_child(source, target, ctx.events);
    ctx.graph.add_parent(target, source, ctx.events);

    log::info!(
        "connected {:?} -> {:?} for {} blood ({} left)",
        source,
        target,
        debited,
        ctx.pool.available()
    );
    TickOutcome::Committed { target, debited }
}

/// Apply a directive to one connector.
///
/// Committed connectors ignore every directive. Validity directives are also
/// ignored while the source node is being cleared.
pub fn apply_directive(world: &mut World, entity: Entity, directive: &Directive) -> DirectiveOutcome {
    let Some(connector) = world.get::<&Connector>(entity).ok().map(|c| *c) else {
        return DirectiveOutcome::Ignored;
    };
    if connector.is_committed() {
        return DirectiveOutcome::Ignored;
    }

    match directive {
        Directive::Hide(target) if target.matches(entity) => DirectiveOutcome::Hidden,
        Directive::Hide(_) => DirectiveOutcome::Ignored,
        Directive::Validity(valid) => {
            let clearing = world
                .get::<&Node>(connector.source)
                .map(|n| n.is_clearing())
                .unwrap_or(false);
            if clearing {
                return DirectiveOutcome::Ignored;
            }
            if let Ok(mut stored) = world.get::<&mut Connector>(entity) {
                stored.valid = *valid;
            }
            DirectiveOutcome::ValiditySet(*valid)
        }
    }
}
