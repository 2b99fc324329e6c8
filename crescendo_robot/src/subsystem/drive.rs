//! Drivetrain facade over the swerve backend.
//!
//! Requested chassis speeds are limited to the configured translational
//! and angular maxima before being forwarded once per period.

use crescendo_common::hal::{ChassisSpeeds, DriveBase};
use crescendo_common::robot::config::DriveConfig;
use crescendo_common::telemetry::Telemetry;
use tracing::{info, warn};

use crate::control::clamp_symmetric;

pub struct DriveSubsystem {
    base: Box<dyn DriveBase>,
    config: DriveConfig,
    speeds: ChassisSpeeds,
    field_relative: bool,
    heading: f64,
    faulted: bool,
}

impl DriveSubsystem {
    pub fn new(base: Box<dyn DriveBase>, config: &DriveConfig) -> Self {
        Self {
            base,
            config: config.clone(),
            speeds: ChassisSpeeds::ZERO,
            field_relative: config.field_relative,
            heading: 0.0,
            faulted: false,
        }
    }

    pub fn config(&self) -> &DriveConfig {
        &self.config
    }

    /// Request chassis speeds; translation is scaled down as a vector so
    /// the direction of travel is preserved.
    pub fn set_speeds(&mut self, speeds: ChassisSpeeds, field_relative: bool) {
        let vx = if speeds.vx.is_finite() { speeds.vx } else { 0.0 };
        let vy = if speeds.vy.is_finite() { speeds.vy } else { 0.0 };
        let norm = vx.hypot(vy);
        let scale = if norm > self.config.max_speed {
            self.config.max_speed / norm
        } else {
            1.0
        };
        self.speeds = ChassisSpeeds::new(
            vx * scale,
            vy * scale,
            clamp_symmetric(speeds.omega, self.config.max_angular_speed),
        );
        self.field_relative = field_relative;
    }

    pub fn idle(&mut self) {
        self.speeds = ChassisSpeeds::ZERO;
    }

    pub fn zero_gyro(&mut self) {
        match self.base.zero_gyro() {
            Ok(()) => info!("drive: gyro zeroed"),
            Err(e) => warn!("drive: gyro zero failed: {e}"),
        }
    }

    pub fn set_motor_brake(&mut self, brake: bool) {
        if let Err(e) = self.base.set_motor_brake(brake) {
            warn!("drive: brake mode change failed: {e}");
        }
    }

    pub fn speeds(&self) -> ChassisSpeeds {
        self.speeds
    }

    /// Last heading read from the gyro [rad].
    pub fn heading(&self) -> f64 {
        self.heading
    }

    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    pub fn sample(&mut self) {
        if let Ok(heading) = self.base.heading() {
            self.heading = heading;
        }
    }

    pub fn apply(&mut self, telemetry: &mut Telemetry) {
        match self.base.drive(self.speeds, self.field_relative) {
            Ok(()) if self.faulted => {
                info!("drive: communication restored");
                self.faulted = false;
            }
            Ok(()) => {}
            Err(e) => {
                if !self.faulted {
                    warn!("drive: command rejected: {e}");
                    self.faulted = true;
                }
            }
        }
        telemetry.put("drive/vx", self.speeds.vx);
        telemetry.put("drive/vy", self.speeds.vy);
        telemetry.put("drive/omega", self.speeds.omega);
        telemetry.put("drive/heading", self.heading);
    }
}
