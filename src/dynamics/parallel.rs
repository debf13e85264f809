//! Optional data-parallel batch helpers gated behind the `parallel`
//! feature. Order-independent and index-preserving only: nothing here may
//! touch island construction, contact/joint solving, or TOI, since those
//! stages run the sequential-impulse solver in a fixed, replay-critical
//! order. What's left that's genuinely embarrassingly parallel is
//! per-fixture AABB recomputation ahead of the broad-phase sync — each
//! fixture's new AABB depends only on its own shape and its body's
//! transform, so batching it with Rayon can't change the result.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::core::body::{Body, FixtureId};
use crate::core::fixture::Fixture;
use crate::core::shapes::Aabb;
use crate::utils::allocator::Arena;

/// Recomputes the world-space AABB for every fixture in `fixture_ids`,
/// returning `(fixture_id, aabb)` pairs in the same order the ids were
/// given. With the `parallel` feature enabled the per-fixture work runs
/// across a Rayon thread pool; `collect()` on an indexed parallel iterator
/// preserves input order, so the result is identical either way — the
/// caller applies the updates to the broad-phase sequentially afterward.
pub fn compute_fixture_aabbs(fixture_ids: &[FixtureId], fixtures: &Arena<Fixture>, bodies: &Arena<Body>) -> Vec<(FixtureId, Aabb)> {
    let compute = |&id: &FixtureId| -> Option<(FixtureId, Aabb)> {
        let fixture = fixtures.get(id)?;
        let body = bodies.get(fixture.body)?;
        Some((id, fixture.shape.compute_aabb(&body.transform)))
    };

    #[cfg(feature = "parallel")]
    {
        fixture_ids.par_iter().filter_map(compute).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        fixture_ids.iter().filter_map(compute).collect()
    }
}
