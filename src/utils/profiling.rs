use std::time::Duration;

/// Per-step timing and population snapshot. `World::step` updates one of
/// these each call when profiling is enabled; `report` logs it at debug
/// level rather than printing, so library consumers control whether it's
/// seen at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct PhysicsProfiler {
    pub broad_phase_time: Duration,
    pub narrow_phase_time: Duration,
    pub solver_time: Duration,
    pub integrator_time: Duration,
    pub total_frame_time: Duration,

    pub body_count: usize,
    pub contact_count: usize,
    pub active_island_count: usize,
}

impl PhysicsProfiler {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn report(&self) {
        let total_us = self.total_frame_time.as_micros() as f32;
        if total_us < 1.0 {
            return;
        }
        log::debug!(
            "step: bodies={} contacts={} islands={} total={:.2}ms broad={:.2}ms narrow={:.2}ms solve={:.2}ms integrate={:.2}ms",
            self.body_count,
            self.contact_count,
            self.active_island_count,
            self.total_frame_time.as_secs_f32() * 1000.0,
            self.broad_phase_time.as_secs_f32() * 1000.0,
            self.narrow_phase_time.as_secs_f32() * 1000.0,
            self.solver_time.as_secs_f32() * 1000.0,
            self.integrator_time.as_secs_f32() * 1000.0,
        );
    }
}
