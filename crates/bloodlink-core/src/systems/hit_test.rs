//! Spatial hit test against collider layers

use crate::components::{Collider, Layer, Position, Vec2};
use hecs::{Entity, World};

/// Result of a successful probe
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub entity: Entity,
    /// Position of the hit entity (not the contact point)
    pub position: Vec2,
}

/// Scene query used by connectors to find the node under the pointer.
///
/// A zero `direction` is a point probe at `origin`; otherwise the probe is a
/// ray of unbounded length. At most one hit is returned.
pub trait HitTest {
    fn probe(&self, world: &World, origin: Vec2, direction: Vec2, layer: Layer) -> Option<Hit>;
}

/// Default hit test over `(Position, Collider)` entities
#[derive(Debug, Clone, Copy, Default)]
pub struct ColliderHitTest;

impl HitTest for ColliderHitTest {
    fn probe(&self, world: &World, origin: Vec2, direction: Vec2, layer: Layer) -> Option<Hit> {
        let dir = direction.normalize();
        let mut best: Option<(f32, Hit)> = None;

        for (entity, (position, collider)) in world.query::<(&Position, &Collider)>().iter() {
            if collider.layer != layer {
                continue;
            }
            let rank = if dir == Vec2::ZERO {
                point_rank(origin, position.0, collider.radius)
            } else {
                ray_rank(origin, dir, position.0, collider.radius)
            };
            let Some(rank) = rank else {
                continue;
            };
            if best.map_or(true, |(r, _)| rank < r) {
                best = Some((
                    rank,
                    Hit {
                        entity,
                        position: position.0,
                    },
                ));
            }
        }

        best.map(|(_, hit)| hit)
    }
}

/// Squared distance to the center if the point is inside the circle
fn point_rank(point: Vec2, center: Vec2, radius: f32) -> Option<f32> {
    let d2 = point.distance_squared(&center);
    (d2 <= radius * radius).then_some(d2)
}

/// Distance along a unit ray to the first contact with the circle
fn ray_rank(origin: Vec2, dir: Vec2, center: Vec2, radius: f32) -> Option<f32> {
    let m = origin - center;
    let b = m.dot(&dir);
    let c = m.dot(&m) - radius * radius;
    if c > 0.0 && b > 0.0 {
        return None;
    }
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    Some((-b - disc.sqrt()).max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_with_nodes() -> (World, Entity, Entity) {
        let mut world = World::new();
        let a = world.spawn((Position::new(0.0, 0.0), Collider::node(0.5)));
        let b = world.spawn((Position::new(3.0, 0.0), Collider::node(0.5)));
        (world, a, b)
    }

    #[test]
    fn test_point_probe_hits_node() {
        let (world, _, b) = world_with_nodes();
        let hit = ColliderHitTest
            .probe(&world, Vec2::new(3.2, 0.1), Vec2::ZERO, Layer::Node)
            .unwrap();
        assert_eq!(hit.entity, b);
        assert_eq!(hit.position, Vec2::new(3.0, 0.0));
    }

    #[test]
    fn test_point_probe_misses() {
        let (world, _, _) = world_with_nodes();
        let hit = ColliderHitTest.probe(&world, Vec2::new(1.5, 0.0), Vec2::ZERO, Layer::Node);
        assert!(hit.is_none());
    }

    #[test]
    fn test_layer_filter() {
        let (mut world, _, _) = world_with_nodes();
        world.spawn((
            Position::new(6.0, 0.0),
            Collider {
                radius: 1.0,
                layer: Layer::Connector,
            },
        ));
        let probe = Vec2::new(6.0, 0.0);
        assert!(ColliderHitTest.probe(&world, probe, Vec2::ZERO, Layer::Node).is_none());
        assert!(ColliderHitTest.probe(&world, probe, Vec2::ZERO, Layer::Connector).is_some());
    }

    #[test]
    fn test_ray_returns_nearest() {
        let (world, a, b) = world_with_nodes();
        let right = ColliderHitTest
            .probe(&world, Vec2::new(-2.0, 0.0), Vec2::new(1.0, 0.0), Layer::Node)
            .unwrap();
        assert_eq!(right.entity, a);

        let left = ColliderHitTest
            .probe(&world, Vec2::new(5.0, 0.0), Vec2::new(-1.0, 0.0), Layer::Node)
            .unwrap();
        assert_eq!(left.entity, b);

        let away = ColliderHitTest.probe(&world, Vec2::new(5.0, 0.0), Vec2::new(1.0, 0.0), Layer::Node);
        assert!(away.is_none());
    }
}
