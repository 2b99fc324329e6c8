//! Drive commands.

use crescendo_common::hal::ChassisSpeeds;
use crescendo_common::robot::routine::DriveSegment;
use crescendo_common::subsystem::Requirements;
use std::time::Duration;

use super::{Command, Operand};
use crate::context::RobotContext;

/// Joystick driving; operands are fractions of the configured maxima.
pub struct TeleopDrive {
    vx: Operand,
    vy: Operand,
    omega: Operand,
    field_relative: bool,
}

impl TeleopDrive {
    pub fn new(vx: Operand, vy: Operand, omega: Operand, field_relative: bool) -> Self {
        Self {
            vx,
            vy,
            omega,
            field_relative,
        }
    }
}

impl Command for TeleopDrive {
    fn name(&self) -> &str {
        "TeleopDrive"
    }

    fn requirements(&self) -> Requirements {
        Requirements::DRIVE
    }

    fn tick(&mut self, ctx: &mut RobotContext) {
        let max_speed = ctx.subsystems.drive.config().max_speed;
        let max_omega = ctx.subsystems.drive.config().max_angular_speed;
        let speeds = ChassisSpeeds::new(
            self.vx.eval(ctx) * max_speed,
            self.vy.eval(ctx) * max_speed,
            self.omega.eval(ctx) * max_omega,
        );
        ctx.subsystems.drive.set_speeds(speeds, self.field_relative);
    }

    fn end(&mut self, ctx: &mut RobotContext, _interrupted: bool) {
        ctx.subsystems.drive.idle();
    }
}

/// Play back timed chassis-speed segments from a path planner.
pub struct FollowSegments {
    name: String,
    segments: Vec<DriveSegment>,
    index: usize,
    segment_start: Duration,
}

impl FollowSegments {
    pub fn new(name: impl Into<String>, segments: Vec<DriveSegment>) -> Self {
        Self {
            name: name.into(),
            segments,
            index: 0,
            segment_start: Duration::ZERO,
        }
    }

    fn advance(&mut self, now: Duration) {
        while let Some(seg) = self.segments.get(self.index) {
            // Unrepresentable lengths never elapse.
            let length =
                Duration::try_from_secs_f64(seg.seconds.max(0.0)).unwrap_or(Duration::MAX);
            if now.saturating_sub(self.segment_start) < length {
                break;
            }
            self.segment_start = self.segment_start.saturating_add(length);
            self.index += 1;
        }
    }
}

impl Command for FollowSegments {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> Requirements {
        Requirements::DRIVE
    }

    fn start(&mut self, ctx: &mut RobotContext) {
        self.index = 0;
        self.segment_start = ctx.now();
    }

    fn tick(&mut self, ctx: &mut RobotContext) {
        self.advance(ctx.now());
        let speeds = match self.segments.get(self.index) {
            Some(seg) => ChassisSpeeds::new(seg.vx, seg.vy, seg.omega),
            None => ChassisSpeeds::ZERO,
        };
        // Planner output is field-relative.
        ctx.subsystems.drive.set_speeds(speeds, true);
    }

    fn is_finished(&self, _ctx: &RobotContext) -> bool {
        self.index >= self.segments.len()
    }

    fn end(&mut self, ctx: &mut RobotContext, _interrupted: bool) {
        ctx.subsystems.drive.idle();
    }
}
