//! First-person walking through the room.
//!
//! Kinematic only: the eye stays at a fixed height and the body is a vertical
//! cylinder pushed out of any panel it overlaps on the XZ plane. Panels below
//! step height (floor) or entirely above the head are ignored.

use bevy::prelude::*;

use crate::geometry::RoomGeometry;

/// Walking speed in units per second.
pub const WALK_SPEED: f32 = 5.0;

/// Eye height above the floor.
pub const EYE_HEIGHT: f32 = 1.7;

/// Radius of the body cylinder.
pub const BODY_RADIUS: f32 = 0.3;

/// Anything lower than this above the feet is walked over.
pub const STEP_HEIGHT: f32 = 0.3;

/// Mouse look radians per pixel.
pub const MOUSE_SENSITIVITY: f32 = 0.003;

/// Held movement keys for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WalkInput {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

impl WalkInput {
    pub fn is_idle(&self) -> bool {
        !(self.forward || self.backward || self.left || self.right)
    }
}

/// Advance the eye position by one frame of walking at heading `yaw`.
pub fn step_walker(position: Vec3, yaw: f32, input: &WalkInput, dt: f32, room: &RoomGeometry) -> Vec3 {
    // In Bevy: +X right, +Y up, -Z forward.
    let forward = Vec3::new(-yaw.sin(), 0.0, -yaw.cos());
    let right = Vec3::new(yaw.cos(), 0.0, -yaw.sin());

    let mut move_dir = Vec3::ZERO;
    if input.forward {
        move_dir += forward;
    }
    if input.backward {
        move_dir -= forward;
    }
    if input.right {
        move_dir += right;
    }
    if input.left {
        move_dir -= right;
    }

    let mut next = position + move_dir.normalize_or_zero() * WALK_SPEED * dt.max(0.0);
    if !next.is_finite() {
        return position;
    }

    // Two passes settle corners where two panels meet
    for _ in 0..2 {
        next = resolve_panels(next, room);
    }
    next
}

fn resolve_panels(eye: Vec3, room: &RoomGeometry) -> Vec3 {
    let feet = eye.y - EYE_HEIGHT;
    let mut pos = eye;

    for panel in &room.panels {
        let (bottom, top) = panel.vertical_span();
        if top <= feet + STEP_HEIGHT || bottom >= eye.y {
            continue;
        }

        let rot = panel.rotation();
        let half = panel.half_extents();
        let local = rot.inverse() * (pos - panel.center());
        let p = Vec2::new(local.x, local.z);
        let extent = Vec2::new(half.x, half.z);

        let closest = p.clamp(-extent, extent);
        let delta = p - closest;
        let dist = delta.length();

        let pushed = if dist > 1e-5 {
            if dist >= BODY_RADIUS {
                continue;
            }
            closest + delta / dist * BODY_RADIUS
        } else {
            // Centre inside the footprint: leave through the nearest edge
            let gap = extent - p.abs();
            if gap.x < gap.y {
                Vec2::new((extent.x + BODY_RADIUS).copysign(p.x), p.y)
            } else {
                Vec2::new(p.x, (extent.y + BODY_RADIUS).copysign(p.y))
            }
        };

        let world = rot * Vec3::new(pushed.x, local.y, pushed.y) + panel.center();
        pos = Vec3::new(world.x, eye.y, world.z);
    }
    pos
}
