//! Link engine - owns the world and the shared ledgers and drives the
//! connector state machine one tick at a time.

use crate::components::*;
use crate::settings::LinkSettings;
use crate::systems::*;
use bloodlink_logic::config::ConfigTable;
use hecs::{Entity, World};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Main connection engine
pub struct LinkEngine {
    /// ECS world containing nodes and connectors
    pub world: World,
    /// Blood shared by every connector
    pub pool: BloodPool,
    pub registry: ConnectionRegistry,
    pub graph: NodeGraph,
    pub settings: LinkSettings,

    notifications: EventBus<GraphEvent>,
    directives: EventBus<Directive>,
    /// Directives queued by connector handlers during a dispatch
    inbox: Rc<RefCell<Vec<(Entity, Directive)>>>,
    /// Directive subscription per live connector; removing one unsubscribes
    subscriptions: HashMap<Entity, Subscription>,

    next_node_id: u32,
    tick: u64,
}

impl LinkEngine {
    pub fn new(settings: LinkSettings) -> Self {
        Self {
            world: World::new(),
            pool: BloodPool::new(settings.starting_blood),
            registry: ConnectionRegistry::new(),
            graph: NodeGraph::new(),
            settings,
            notifications: EventBus::new(),
            directives: EventBus::new(),
            inbox: Rc::new(RefCell::new(Vec::new())),
            subscriptions: HashMap::new(),
            next_node_id: 1,
            tick: 0,
        }
    }

    /// Build an engine from a game state row
    pub fn from_config(table: &ConfigTable, state_id: i32, starting_blood: i64) -> Result<Self, LinkError> {
        let row = table.get(state_id).ok_or(LinkError::UnknownGameState(state_id))?;
        Ok(Self::new(LinkSettings::from_row(row, starting_blood)))
    }

    /// Spawn a node entity on the node layer
    pub fn spawn_node(&mut self, position: Vec2, radius: f32) -> Entity {
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;
        let entity = self
            .world
            .spawn((Node::new(id), Position(position), Collider::node(radius)));
        self.graph.insert(entity, id);
        entity
    }

    /// Tag a node as being cleared. Returns false if `node` is not a node.
    pub fn mark_clearing(&mut self, node: Entity) -> bool {
        match self.world.get::<&mut Node>(node) {
            Ok(mut n) => {
                n.mark = NodeMark::Clearing;
                true
            }
            Err(_) => false,
        }
    }

    /// Start dragging a connector out of `source`.
    ///
    /// The source must be a registered node with a position; otherwise the
    /// attempt is logged and nothing is spawned.
    pub fn begin_connection(&mut self, source: Entity) -> Result<Entity, LinkError> {
        let start = self.world.get::<&Position>(source).ok().map(|p| p.0);
        let Some(start) = start.filter(|_| self.graph.contains(source)) else {
            log::error!("connector source {:?} carries no node data", source);
            return Err(LinkError::MissingNodeData(source));
        };

        let mut connector = Connector::new(source, start);
        connector.set_end(start, self.settings.line_half_width);
        connector.state = ConnectorState::NotConnect;
        let entity = self.world.spawn((connector,));

        let inbox = Rc::clone(&self.inbox);
        let subscription = self
            .directives
            .subscribe(move |d: &Directive| inbox.borrow_mut().push((entity, *d)));
        self.subscriptions.insert(entity, subscription);

        log::debug!("connector {:?} started from {:?}", entity, source);
        Ok(entity)
    }

    /// Advance one tick using the collider hit test
    pub fn update(&mut self, input: &PointerFrame) -> Vec<(Entity, TickOutcome)> {
        self.update_with(input, &ColliderHitTest)
    }

    /// Advance one tick with a caller-supplied hit test
    pub fn update_with(
        &mut self,
        input: &PointerFrame,
        hit_test: &impl HitTest,
    ) -> Vec<(Entity, TickOutcome)> {
        self.tick += 1;
        let mut ctx = LinkContext {
            pool: &mut self.pool,
            registry: &mut self.registry,
            graph: &mut self.graph,
            events: &self.notifications,
            cost_per_unit: self.settings.cost_per_unit,
            half_width: self.settings.line_half_width,
        };
        let outcomes = connector_system(&mut self.world, &mut ctx, input, hit_test);

        // Committed connectors no longer listen for directives
        for (entity, outcome) in &outcomes {
            if matches!(outcome, TickOutcome::Committed { .. }) {
                self.subscriptions.remove(entity);
            }
        }
        outcomes
    }

    /// Deliver a directive to every subscribed connector, synchronously.
    /// Hidden connectors are despawned before this returns.
    pub fn dispatch(&mut self, directive: Directive) -> Vec<(Entity, DirectiveOutcome)> {
        self.directives.publish(&directive);
        let pending: Vec<(Entity, Directive)> = self.inbox.borrow_mut().drain(..).collect();

        let mut outcomes = Vec::with_capacity(pending.len());
        for (entity, directive) in pending {
            let outcome = apply_directive(&mut self.world, entity, &directive);
            match outcome {
                DirectiveOutcome::Hidden => self.teardown(entity),
                DirectiveOutcome::Ignored => {
                    log::debug!("connector {:?} ignored {:?}", entity, directive)
                }
                DirectiveOutcome::ValiditySet(_) => {}
            }
            outcomes.push((entity, outcome));
        }
        outcomes
    }

    fn teardown(&mut self, connector: Entity) {
        self.subscriptions.remove(&connector);
        if self.world.despawn(connector).is_err() {
            log::warn!("connector {:?} was already despawned", connector);
        }
    }

    /// Observe graph notifications; dropping the handle unsubscribes
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: FnMut(&GraphEvent) + 'static,
    {
        self.notifications.subscribe(handler)
    }

    pub fn blood(&self) -> i64 {
        self.pool.available()
    }

    pub fn connector(&self, entity: Entity) -> Option<Connector> {
        self.world.get::<&Connector>(entity).ok().map(|c| *c)
    }

    pub fn connector_count(&self) -> usize {
        self.world.query::<&Connector>().iter().count()
    }

    /// Connectors still listening for directives
    pub fn pending_count(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn node_id(&self, node: Entity) -> Option<NodeId> {
        self.world.get::<&Node>(node).ok().map(|n| n.id)
    }

    pub fn node_data(&self, node: Entity) -> Option<NodeData> {
        self.graph.node_data(node)
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }
}

impl Default for LinkEngine {
    fn default() -> Self {
        Self::new(LinkSettings::default())
    }
}

/// Errors surfaced by the engine. Policy rejections are never errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// The connector source is not a positioned, registered node
    MissingNodeData(Entity),
    UnknownGameState(i32),
}

impl std::fmt::Display for LinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkError::MissingNodeData(e) => write!(f, "entity {:?} carries no node data", e),
            LinkError::UnknownGameState(id) => write!(f, "no game state with id {}", id),
        }
    }
}

impl std::error::Error for LinkError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(blood: i64) -> LinkEngine {
        LinkEngine::new(LinkSettings {
            cost_per_unit: 2.0,
            starting_blood: blood,
            line_half_width: 1.0,
        })
    }

    #[test]
    fn test_engine_creation() {
        let engine = LinkEngine::default();
        assert_eq!(engine.blood(), 100);
        assert_eq!(engine.connector_count(), 0);
        assert_eq!(engine.tick(), 0);
    }

    #[test]
    fn test_spawn_node_ids() {
        let mut engine = engine(10);
        let a = engine.spawn_node(Vec2::ZERO, 0.5);
        let b = engine.spawn_node(Vec2::new(1.0, 1.0), 0.5);
        assert_eq!(engine.node_id(a), Some(NodeId(1)));
        assert_eq!(engine.node_id(b), Some(NodeId(2)));
        assert!(engine.graph.contains(a));
    }

    #[test]
    fn test_begin_connection_requires_node() {
        let mut engine = engine(10);
        let stray = engine.world.spawn((Position::new(0.0, 0.0),));
        assert_eq!(engine.begin_connection(stray), Err(LinkError::MissingNodeData(stray)));
        assert_eq!(engine.connector_count(), 0);
        assert_eq!(engine.pending_count(), 0);
    }

    #[test]
    fn test_hide_tears_down_pending_connector() {
        let mut engine = engine(10);
        let a = engine.spawn_node(Vec2::ZERO, 0.5);
        let c = engine.begin_connection(a).unwrap();

        let outcomes = engine.dispatch(Directive::Hide(HideTarget::All));
        assert_eq!(outcomes, vec![(c, DirectiveOutcome::Hidden)]);
        assert!(engine.connector(c).is_none());
        assert_eq!(engine.pending_count(), 0);

        // nobody left to deliver to
        assert!(engine.dispatch(Directive::Validity(false)).is_empty());
    }

    #[test]
    fn test_committed_connector_unsubscribes() {
        let mut engine = engine(10);
        let a = engine.spawn_node(Vec2::ZERO, 0.5);
        engine.spawn_node(Vec2::new(3.0, 0.0), 0.5);
        let c = engine.begin_connection(a).unwrap();

        engine.update(&PointerFrame::press(3.0, 0.0));
        assert_eq!(engine.pending_count(), 0);
        assert!(engine.dispatch(Directive::Hide(HideTarget::All)).is_empty());
        assert_eq!(engine.connector(c).map(|c| c.state), Some(ConnectorState::Connect));
    }

    #[test]
    fn test_from_config() {
        let table = ConfigTable::parse_text("\t1\tNormal\t2\t5\n").unwrap();
        let engine = LinkEngine::from_config(&table, 1, 10).unwrap();
        assert_eq!(engine.settings.cost_per_unit, 2.0);
        assert_eq!(engine.blood(), 10);
        assert!(matches!(
            LinkEngine::from_config(&table, 9, 10),
            Err(LinkError::UnknownGameState(9))
        ));
    }
}
