//! Pointer rays and room raycasting
//!
//! Pointer positions arrive in normalized device coordinates and are unprojected
//! through whichever camera is live. The room is described as a list of oriented
//! box panels (walls, partitions, floor, ceiling), each optionally tagged; a cast
//! returns every panel face the ray enters, nearest first, so callers can filter
//! by tag instead of stopping at the first hit.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::read_ron;
use crate::error::ConfigError;

/// Stable identifier of a room panel (the "owner mesh" of a hit).
pub type PanelId = u32;

/// Marks which collidable surfaces may carry artworks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SurfaceTag {
    Wall,
    #[default]
    Other,
}

/// One ray/surface intersection in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    pub point: Vec3,
    /// Outward-facing unit normal of the face that was entered.
    pub normal: Vec3,
    /// Ray parameter of the hit (distance along the unit direction).
    pub distance: f32,
    pub tag: SurfaceTag,
    pub owner: PanelId,
}

/// Scene raycast provider.
pub trait SceneRaycast {
    /// Every intersection along the ray, sorted nearest first.
    fn cast_all(&self, ray: Ray3d) -> Vec<SurfaceHit>;

    /// Nearest intersection regardless of tag.
    fn cast(&self, ray: Ray3d) -> Option<SurfaceHit> {
        self.cast_all(ray).into_iter().next()
    }
}

// =============================================================================
// UNPROJECTION
// =============================================================================

/// Projection parameters needed to turn NDC into a world ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewProjection {
    Perspective {
        /// Vertical field of view in radians
        fov_y: f32,
        aspect: f32,
    },
    /// Orthographic with one world unit per pixel at zoom 1.
    Orthographic { viewport: Vec2, zoom: f32 },
}

/// Pose and projection of the live camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    pub position: Vec3,
    pub rotation: Quat,
    pub projection: ViewProjection,
}

impl CameraView {
    /// Build the world-space pointer ray for an NDC position.
    ///
    /// Cameras look down their local -Z. Returns `None` when the projection or
    /// pointer is degenerate (zero zoom, non-finite input).
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Option<Ray3d> {
        if !ndc.is_finite() || !self.position.is_finite() || !self.rotation.is_finite() {
            return None;
        }

        let (origin, local_dir) = match self.projection {
            ViewProjection::Perspective { fov_y, aspect } => {
                if fov_y <= 0.0 || aspect <= 0.0 {
                    return None;
                }
                let tan_half = (fov_y * 0.5).tan();
                let dir = Vec3::new(ndc.x * tan_half * aspect, ndc.y * tan_half, -1.0);
                (self.position, dir)
            }
            ViewProjection::Orthographic { viewport, zoom } => {
                if zoom <= 0.0 || !zoom.is_finite() {
                    return None;
                }
                let half = viewport * 0.5 / zoom;
                let offset = self.rotation * Vec3::new(ndc.x * half.x, ndc.y * half.y, 0.0);
                (self.position + offset, Vec3::NEG_Z)
            }
        };

        let direction = Dir3::new(self.rotation * local_dir).ok()?;
        Some(Ray3d::new(origin, direction))
    }
}

/// Map a cursor position in window pixels (origin top-left) to NDC.
pub fn cursor_to_ndc(cursor: Vec2, window_size: Vec2) -> Option<Vec2> {
    if window_size.x <= 0.0 || window_size.y <= 0.0 {
        return None;
    }
    Some(Vec2::new(
        cursor.x / window_size.x * 2.0 - 1.0,
        1.0 - cursor.y / window_size.y * 2.0,
    ))
}

// =============================================================================
// ROOM GEOMETRY
// =============================================================================

/// An oriented box making up part of the room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomPanel {
    pub id: PanelId,
    pub name: String,
    pub center: [f32; 3],
    /// Full extents along the panel's local axes.
    pub size: [f32; 3],
    /// Rotation about +Y in radians.
    #[serde(default)]
    pub yaw: f32,
    /// Untagged panels never accept artworks.
    #[serde(default)]
    pub tag: Option<SurfaceTag>,
    /// Overhead beam the curator can hide; hidden beams are not hit.
    #[serde(default)]
    pub traverse: bool,
}

impl RoomPanel {
    pub fn center(&self) -> Vec3 {
        Vec3::from_array(self.center)
    }

    pub fn half_extents(&self) -> Vec3 {
        Vec3::from_array(self.size) * 0.5
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw)
    }

    pub fn tag(&self) -> SurfaceTag {
        self.tag.unwrap_or_default()
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.center()).with_rotation(self.rotation())
    }

    /// Lowest and highest world Y covered by the panel (yaw keeps Y axis-aligned).
    pub fn vertical_span(&self) -> (f32, f32) {
        let c = self.center[1];
        let h = self.size[1] * 0.5;
        (c - h, c + h)
    }

    /// Entry hit of a world ray against this panel.
    fn raycast(&self, ray: Ray3d) -> Option<SurfaceHit> {
        let inv_rot = self.rotation().inverse();
        let local_origin = inv_rot * (ray.origin - self.center());
        let local_dir = inv_rot * *ray.direction;

        let (t, local_normal) = ray_box_entry(local_origin, local_dir, self.half_extents())?;
        Some(SurfaceHit {
            point: ray.get_point(t),
            normal: (self.rotation() * local_normal).normalize(),
            distance: t,
            tag: self.tag(),
            owner: self.id,
        })
    }
}

/// Slab-method ray/AABB test that also reports the face entered.
///
/// Returns `None` when the box is behind the ray or the origin is inside it.
fn ray_box_entry(origin: Vec3, dir: Vec3, half: Vec3) -> Option<(f32, Vec3)> {
    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;
    let mut normal = Vec3::ZERO;

    for axis in 0..3 {
        let o = origin[axis];
        let d = dir[axis];
        let h = half[axis];

        if d.abs() < 1e-8 {
            if o < -h || o > h {
                return None;
            }
            continue;
        }

        let inv = 1.0 / d;
        let (mut t0, mut t1) = ((-h - o) * inv, (h - o) * inv);
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }

        if t0 > t_enter {
            t_enter = t0;
            normal = Vec3::ZERO;
            // Travelling +axis enters through the -axis face
            normal[axis] = if d > 0.0 { -1.0 } else { 1.0 };
        }
        t_exit = t_exit.min(t1);

        if t_enter > t_exit {
            return None;
        }
    }

    if t_enter < 0.0 || normal == Vec3::ZERO {
        return None;
    }
    Some((t_enter, normal))
}

/// The room model: every static collidable panel.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomGeometry {
    pub panels: Vec<RoomPanel>,
}

impl Default for RoomGeometry {
    fn default() -> Self {
        Self::gallery()
    }
}

impl RoomGeometry {
    /// Wall height of the built-in gallery room.
    pub const GALLERY_HEIGHT: f32 = 3.5;

    /// A 14 x 12 open-top gallery with a free-standing partition in the middle
    /// and two traverses spanning it.
    pub fn gallery() -> Self {
        const T: f32 = 0.2;
        const BEAM: f32 = 0.15;
        let (w, d, h) = (14.0_f32, 12.0_f32, Self::GALLERY_HEIGHT);

        let panel = |id, name: &str, center: [f32; 3], size: [f32; 3], yaw, tag| RoomPanel {
            id,
            name: name.to_string(),
            center,
            size,
            yaw,
            tag,
            traverse: false,
        };
        let beam = |id, name: &str, z: f32| RoomPanel {
            id,
            name: name.to_string(),
            center: [0.0, h - 0.2, z],
            size: [w, BEAM, BEAM],
            yaw: 0.0,
            tag: None,
            traverse: true,
        };

        Self {
            panels: vec![
                panel(1, "Floor", [0.0, -T * 0.5, 0.0], [w, T, d], 0.0, None),
                panel(3, "Wall North", [0.0, h * 0.5, -d * 0.5 - T * 0.5], [w, h, T], 0.0, Some(SurfaceTag::Wall)),
                panel(4, "Wall South", [0.0, h * 0.5, d * 0.5 + T * 0.5], [w, h, T], 0.0, Some(SurfaceTag::Wall)),
                panel(5, "Wall West", [-w * 0.5 - T * 0.5, h * 0.5, 0.0], [T, h, d], 0.0, Some(SurfaceTag::Wall)),
                panel(6, "Wall East", [w * 0.5 + T * 0.5, h * 0.5, 0.0], [T, h, d], 0.0, Some(SurfaceTag::Wall)),
                panel(7, "Partition", [0.0, 1.25, 0.0], [4.0, 2.5, T], 0.0, Some(SurfaceTag::Wall)),
                panel(8, "Bench", [0.0, 0.225, 2.2], [1.8, 0.45, 0.5], 0.0, Some(SurfaceTag::Other)),
                beam(9, "Traverse North", -3.0),
                beam(10, "Traverse South", 3.0),
            ],
        }
    }

    /// Load a room from a RON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        read_ron(path)
    }

    pub fn panel(&self, id: PanelId) -> Option<&RoomPanel> {
        self.panels.iter().find(|p| p.id == id)
    }

    /// The room as currently shown, for raycasting.
    pub fn visible(&self, show_traverses: bool) -> VisibleRoom<'_> {
        VisibleRoom { room: self, show_traverses }
    }
}

fn cast_panels<'a>(panels: impl Iterator<Item = &'a RoomPanel>, ray: Ray3d) -> Vec<SurfaceHit> {
    let mut hits: Vec<SurfaceHit> = panels.filter_map(|p| p.raycast(ray)).collect();
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}

impl SceneRaycast for RoomGeometry {
    fn cast_all(&self, ray: Ray3d) -> Vec<SurfaceHit> {
        cast_panels(self.panels.iter(), ray)
    }
}

/// Room view that skips traverses while they are hidden.
#[derive(Debug, Clone, Copy)]
pub struct VisibleRoom<'a> {
    room: &'a RoomGeometry,
    show_traverses: bool,
}

impl SceneRaycast for VisibleRoom<'_> {
    fn cast_all(&self, ray: Ray3d) -> Vec<SurfaceHit> {
        let show = self.show_traverses;
        cast_panels(self.room.panels.iter().filter(|p| show || !p.traverse), ray)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn ray(origin: Vec3, dir: Vec3) -> Ray3d {
        Ray3d::new(origin, Dir3::new(dir).unwrap())
    }

    #[test]
    fn hits_the_facing_side_of_a_wall() {
        let room = RoomGeometry::gallery();
        // From the room centre looking north
        let hit = room.cast(ray(Vec3::new(3.0, 1.5, -1.0), Vec3::NEG_Z)).unwrap();
        assert_eq!(hit.owner, 3);
        assert_eq!(hit.tag, SurfaceTag::Wall);
        assert_abs_diff_eq!(hit.normal.z, 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(hit.point.z, -6.0, epsilon = 1e-4);
    }

    #[test]
    fn hits_are_sorted_nearest_first() {
        let room = RoomGeometry::gallery();
        // Looking down through the bench onto the floor
        let hits = room.cast_all(ray(Vec3::new(0.0, 2.0, 2.2), Vec3::NEG_Y));
        assert!(hits.len() >= 2);
        assert_eq!(hits[0].owner, 8);
        assert_eq!(hits[1].owner, 1);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn untagged_panels_are_not_walls() {
        let room = RoomGeometry::gallery();
        let hit = room.cast(ray(Vec3::new(3.0, 1.0, -1.0), Vec3::NEG_Y)).unwrap();
        assert_eq!(hit.owner, 1);
        assert_eq!(hit.tag, SurfaceTag::Other);
        assert_abs_diff_eq!(hit.normal.y, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn rotated_panels_report_world_normals() {
        let room = RoomGeometry {
            panels: vec![RoomPanel {
                id: 1,
                name: "Angled".into(),
                center: [0.0, 1.0, -5.0],
                size: [4.0, 2.0, 0.2],
                yaw: std::f32::consts::FRAC_PI_4,
                tag: Some(SurfaceTag::Wall),
                traverse: false,
            }],
        };
        let hit = room.cast(ray(Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_Z)).unwrap();
        let expected = Quat::from_rotation_y(std::f32::consts::FRAC_PI_4) * Vec3::Z;
        assert_abs_diff_eq!(hit.normal.dot(expected), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn ray_starting_inside_a_panel_does_not_hit_it() {
        let room = RoomGeometry::gallery();
        let hits = room.cast_all(ray(Vec3::new(0.0, 1.0, 0.0), Vec3::Y));
        assert!(hits.iter().all(|h| h.owner != 7));
    }

    #[test]
    fn perspective_centre_ray_points_forward() {
        let view = CameraView {
            position: Vec3::new(0.0, 1.7, 5.0),
            rotation: Quat::IDENTITY,
            projection: ViewProjection::Perspective { fov_y: 75f32.to_radians(), aspect: 16.0 / 9.0 },
        };
        let r = view.ray_from_ndc(Vec2::ZERO).unwrap();
        assert_abs_diff_eq!(r.direction.z, -1.0, epsilon = 1e-6);
        assert_eq!(r.origin, view.position);

        let up = view.ray_from_ndc(Vec2::new(0.0, 1.0)).unwrap();
        let angle = up.direction.angle_between(Vec3::NEG_Z);
        assert_abs_diff_eq!(angle, 37.5f32.to_radians(), epsilon = 1e-4);
    }

    #[test]
    fn orthographic_rays_are_parallel_and_offset() {
        let view = CameraView {
            position: Vec3::new(0.0, 0.0, 10.0),
            rotation: Quat::IDENTITY,
            projection: ViewProjection::Orthographic { viewport: Vec2::new(800.0, 600.0), zoom: 40.0 },
        };
        let r = view.ray_from_ndc(Vec2::new(1.0, -1.0)).unwrap();
        assert_abs_diff_eq!(r.direction.z, -1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(r.origin.x, 10.0, epsilon = 1e-5);
        assert_abs_diff_eq!(r.origin.y, -7.5, epsilon = 1e-5);
    }

    #[test]
    fn degenerate_projection_yields_no_ray() {
        let view = CameraView {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            projection: ViewProjection::Orthographic { viewport: Vec2::new(800.0, 600.0), zoom: 0.0 },
        };
        assert!(view.ray_from_ndc(Vec2::ZERO).is_none());
        assert!(view.ray_from_ndc(Vec2::new(f32::NAN, 0.0)).is_none());
    }

    #[test]
    fn cursor_maps_to_ndc_corners() {
        let size = Vec2::new(1280.0, 720.0);
        assert_eq!(cursor_to_ndc(Vec2::ZERO, size), Some(Vec2::new(-1.0, 1.0)));
        assert_eq!(cursor_to_ndc(size, size), Some(Vec2::new(1.0, -1.0)));
        assert_eq!(cursor_to_ndc(Vec2::ZERO, Vec2::ZERO), None);
    }

    #[test]
    fn room_loads_from_ron() {
        let text = r#"(panels: [(id: 1, name: "W", center: (0.0, 1.0, 0.0), size: (1.0, 2.0, 0.1), tag: Some(Wall))])"#;
        let room: RoomGeometry = ron::from_str(text).unwrap();
        assert_eq!(room.panels[0].tag(), SurfaceTag::Wall);
        assert_eq!(room.panels[0].yaw, 0.0);
        assert!(!room.panels[0].traverse);
    }

    #[test]
    fn hidden_traverses_are_not_hit() {
        let room = RoomGeometry::gallery();
        // Looking straight up under the north traverse
        let up = ray(Vec3::new(4.0, 1.7, -3.0), Vec3::Y);

        let shown = room.visible(true).cast(up).unwrap();
        assert_eq!(shown.owner, 9);
        assert_eq!(shown.tag, SurfaceTag::Other);
        assert_eq!(room.cast(up).map(|h| h.owner), Some(9));

        assert!(room.visible(false).cast(up).is_none());
    }

    #[test]
    fn traverses_sit_above_head_height() {
        let room = RoomGeometry::gallery();
        let beams: Vec<_> = room.panels.iter().filter(|p| p.traverse).collect();
        assert_eq!(beams.len(), 2);
        for beam in beams {
            let (bottom, _) = beam.vertical_span();
            assert!(bottom > crate::walk::EYE_HEIGHT + 1.0);
            assert!(beam.tag.is_none());
        }
    }
}
