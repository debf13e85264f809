use serde::{Deserialize, Serialize};

use crate::core::body::{BodyId, FixtureId};
use crate::core::shapes::Shape;

/// Collision filtering bits, matching the external filter contract:
/// `groupIndex` (signed) takes precedence when both fixtures share a
/// non-zero group; otherwise category/mask bits decide.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Filter {
    pub category_bits: u16,
    pub mask_bits: u16,
    pub group_index: i16,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            category_bits: 0x0001,
            mask_bits: 0xFFFF,
            group_index: 0,
        }
    }
}

impl Filter {
    /// True if two fixtures carrying these filters should collide,
    /// ignoring all other rules (same-body, static/static, etc.) which
    /// are the caller's responsibility.
    pub fn should_collide(a: &Filter, b: &Filter) -> bool {
        if a.group_index == b.group_index && a.group_index != 0 {
            return a.group_index > 0;
        }
        (a.category_bits & b.mask_bits) != 0 && (b.category_bits & a.mask_bits) != 0
    }
}

/// A shape bound to a body, carrying the material and filtering data the
/// contact pipeline consumes. Fixtures are owned by exactly one body;
/// they are destroyed when their body is destroyed.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub id: FixtureId,
    pub body: BodyId,
    pub shape: Shape,
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    pub filter: Filter,
    pub is_sensor: bool,
    /// Broad-phase proxy id for this fixture's single child (chain shapes
    /// with multiple children are not implemented, see SPEC_FULL.md).
    pub proxy_id: Option<crate::collision::broadphase::ProxyId>,
    pub user_data: u64,
}

impl Fixture {
    pub fn new(id: FixtureId, body: BodyId, shape: Shape, def: &FixtureDef) -> Self {
        Self {
            id,
            body,
            shape,
            density: def.density,
            friction: def.friction,
            restitution: def.restitution,
            filter: def.filter,
            is_sensor: def.is_sensor,
            proxy_id: None,
            user_data: def.user_data,
        }
    }
}

/// Definition used by `World::create_fixture`.
#[derive(Debug, Clone)]
pub struct FixtureDef {
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    pub filter: Filter,
    pub is_sensor: bool,
    pub user_data: u64,
}

impl Default for FixtureDef {
    fn default() -> Self {
        Self {
            density: 1.0,
            friction: 0.3,
            restitution: 0.0,
            filter: Filter::default(),
            is_sensor: false,
            user_data: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_group_index_overrides_masks() {
        let a = Filter {
            category_bits: 1,
            mask_bits: 0,
            group_index: -1,
        };
        let b = Filter {
            category_bits: 2,
            mask_bits: 0,
            group_index: -1,
        };
        assert!(!Filter::should_collide(&a, &b));
    }

    #[test]
    fn filter_default_collides_with_default() {
        let a = Filter::default();
        let b = Filter::default();
        assert!(Filter::should_collide(&a, &b));
    }
}
