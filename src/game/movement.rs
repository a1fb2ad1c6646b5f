//! The shared movement integration step.
//!
//! Server simulation, client prediction and client reconciliation all call
//! the same routine with the same `WorldConfig`; any divergence between the
//! two sides shows up as a reconciliation pop and is treated as a bug.

use std::f32::consts::{PI, TAU};

use crate::config::WorldConfig;
use crate::ws::protocol::MoveInput;

/// Kinematic state of one entity, the unit of prediction and reconciliation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityState {
    pub x: f32,
    pub y: f32,
    /// Heading in radians
    pub angle: f32,
}

/// Apply one movement input to an entity state.
///
/// Axis-aligned directional model: each active direction moves the entity one
/// fixed step along that axis, opposing directions cancel, and the result is
/// clamped so the full hitbox stays inside `[0, map_size]`. Pure and
/// side-effect free.
pub fn step_movement(state: EntityState, input: MoveInput, cfg: &WorldConfig) -> EntityState {
    let step = cfg.move_step();

    let mut x = state.x;
    let mut y = state.y;

    if input.left {
        x -= step;
    }
    if input.right {
        x += step;
    }
    if input.up {
        y -= step;
    }
    if input.down {
        y += step;
    }

    let min = cfg.player_radius;
    let max = cfg.map_size - cfg.player_radius;

    EntityState {
        x: x.clamp(min, max),
        y: y.clamp(min, max),
        angle: state.angle,
    }
}

/// Resolve a shoot aim to an angle in radians.
///
/// An explicit angle wins; otherwise the target point is resolved via atan2
/// from the shooter's position. Returns `None` when the message carries
/// neither (malformed aim, discarded upstream).
pub fn aim_angle(
    shooter_x: f32,
    shooter_y: f32,
    angle: Option<f32>,
    target_x: Option<f32>,
    target_y: Option<f32>,
) -> Option<f32> {
    if let Some(angle) = angle {
        return Some(angle.rem_euclid(TAU));
    }
    match (target_x, target_y) {
        (Some(tx), Some(ty)) => Some((ty - shooter_y).atan2(tx - shooter_x).rem_euclid(TAU)),
        _ => None,
    }
}

/// Interpolate between two angles along the shortest angular path.
///
/// Wrap-aware: going from 350 deg to 10 deg passes through 0, not 180.
pub fn lerp_angle(from: f32, to: f32, t: f32) -> f32 {
    let mut diff = (to - from).rem_euclid(TAU);
    if diff > PI {
        diff -= TAU;
    }
    (from + diff * t).rem_euclid(TAU)
}

/// Linear interpolation between two scalars
pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}
