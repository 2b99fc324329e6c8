//! Trapezoidal motion profile.
//!
//! Limits velocity and acceleration of a position reference. Each period the
//! profile advances from the previously profiled state toward the goal, so a
//! new goal mid-move blends smoothly from the current profiled velocity.

/// Velocity and acceleration limits [rot/s, rot/s²].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraints {
    pub max_velocity: f64,
    pub max_acceleration: f64,
}

/// Position and velocity sample on a profile.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProfileState {
    pub position: f64,
    pub velocity: f64,
}

impl ProfileState {
    pub const fn new(position: f64, velocity: f64) -> Self {
        Self { position, velocity }
    }

    #[inline]
    fn scaled(self, direction: f64) -> Self {
        Self::new(self.position * direction, self.velocity * direction)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrapezoidProfile {
    constraints: Constraints,
}

impl TrapezoidProfile {
    pub const fn new(constraints: Constraints) -> Self {
        Self { constraints }
    }

    #[inline]
    pub const fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    /// State `t` seconds after `current` on the profile toward `goal`.
    pub fn calculate(&self, t: f64, current: ProfileState, goal: ProfileState) -> ProfileState {
        let max_v = self.constraints.max_velocity;
        let max_a = self.constraints.max_acceleration;
        if max_v <= 0.0 || max_a <= 0.0 {
            return goal;
        }

        // Solve every profile as a forward move, then mirror back.
        let direction = if current.position > goal.position { -1.0 } else { 1.0 };
        let mut current = current.scaled(direction);
        let goal = goal.scaled(direction);

        if current.velocity > max_v {
            current.velocity = max_v;
        }

        let cutoff_begin = current.velocity / max_a;
        let cutoff_dist_begin = cutoff_begin * cutoff_begin * max_a / 2.0;
        let cutoff_end = goal.velocity / max_a;
        let cutoff_dist_end = cutoff_end * cutoff_end * max_a / 2.0;

        let full_trapezoid_dist =
            cutoff_dist_begin + (goal.position - current.position) + cutoff_dist_end;
        let mut accel_time = max_v / max_a;
        let mut full_speed_dist = full_trapezoid_dist - accel_time * accel_time * max_a;

        // Triangle profile: max velocity is never reached.
        if full_speed_dist < 0.0 {
            accel_time = (full_trapezoid_dist / max_a).max(0.0).sqrt();
            full_speed_dist = 0.0;
        }

        let end_accel = accel_time - cutoff_begin;
        let end_full_speed = end_accel + full_speed_dist / max_v;
        let end_decel = end_full_speed + accel_time - cutoff_end;

        let mut result = current;
        if t < end_accel {
            result.velocity += t * max_a;
            result.position += (current.velocity + t * max_a / 2.0) * t;
        } else if t < end_full_speed {
            result.velocity = max_v;
            result.position += (current.velocity + end_accel * max_a / 2.0) * end_accel
                + max_v * (t - end_accel);
        } else if t <= end_decel {
            let time_left = end_decel - t;
            result.velocity = goal.velocity + time_left * max_a;
            result.position = goal.position - (goal.velocity + time_left * max_a / 2.0) * time_left;
        } else {
            result = goal;
        }

        result.scaled(direction)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
