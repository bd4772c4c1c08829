//! Wall placement targeting
//!
//! Each tick the engine turns the pointer into a ray, finds the nearest
//! wall-tagged surface along it and derives an oriented, scaled transform for
//! the artwork. Non-vertical wall faces still produce a candidate (drawn as a
//! rejected ghost) but it is marked invalid and cannot be committed.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::catalog::{AssetId, AssetRecord};
use crate::geometry::{CameraView, SceneRaycast, SurfaceHit, SurfaceTag};
use crate::store::EditorStore;

/// A hit is a wall if the normal's vertical component stays below this.
pub const VERTICAL_EPSILON: f32 = 0.1;
/// Above this the normal is treated as parallel to up for orientation.
pub const NEAR_HORIZONTAL_THRESHOLD: f32 = 0.99;
/// Distance the artwork sits off the surface.
pub const SURFACE_OFFSET: f32 = 0.01;
/// Largest on-wall footprint side, in world units.
pub const MAX_DIMENSION: f32 = 3.0;
pub const CM_PER_UNIT: f32 = 100.0;
/// Used when an asset has no physical dimensions.
pub const DEFAULT_DIMENSION_CM: f32 = 50.0;

/// Tuning values for targeting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementSettings {
    pub vertical_epsilon: f32,
    pub near_horizontal: f32,
    pub surface_offset: f32,
    pub max_dimension: f32,
    pub cm_per_unit: f32,
    pub default_dimension_cm: f32,
}

impl Default for PlacementSettings {
    fn default() -> Self {
        Self {
            vertical_epsilon: VERTICAL_EPSILON,
            near_horizontal: NEAR_HORIZONTAL_THRESHOLD,
            surface_offset: SURFACE_OFFSET,
            max_dimension: MAX_DIMENSION,
            cm_per_unit: CM_PER_UNIT,
            default_dimension_cm: DEFAULT_DIMENSION_CM,
        }
    }
}

/// The artwork being placed; fixed for the whole session.
#[derive(Debug, Clone, PartialEq)]
pub struct DraggedAsset {
    pub asset_id: AssetId,
    pub width_cm: f32,
    pub height_cm: f32,
    pub url: String,
}

impl DraggedAsset {
    pub fn from_record(record: &AssetRecord, settings: &PlacementSettings) -> Self {
        let dim = |v: Option<f32>| match v {
            Some(cm) if cm.is_finite() && cm > 0.0 => cm,
            _ => settings.default_dimension_cm,
        };
        Self {
            asset_id: record.id,
            width_cm: dim(record.width_cm),
            height_cm: dim(record.height_cm),
            url: record.url.clone(),
        }
    }

    /// Physical size in world units.
    pub fn size_units(&self, settings: &PlacementSettings) -> Vec2 {
        Vec2::new(self.width_cm, self.height_cm) / settings.cm_per_unit
    }
}

/// Result of one targeting tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementCandidate {
    pub position: Vec3,
    /// Rotates local +Z onto the surface normal.
    pub orientation: Quat,
    pub scale: f32,
    /// Only near-vertical wall faces are valid.
    pub valid: bool,
    pub surface: SurfaceHit,
}

impl PlacementCandidate {
    /// Orientation as XYZ Euler angles, the form the persistence API stores.
    pub fn euler(&self) -> Vec3 {
        let (x, y, z) = self.orientation.to_euler(EulerRot::XYZ);
        Vec3::new(x, y, z)
    }

    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::Z
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.position).with_rotation(self.orientation)
    }
}

/// Minimal rotation taking unit vector `from` onto unit vector `to`.
pub fn shortest_arc(from: Vec3, to: Vec3) -> Quat {
    let dot = from.dot(to);
    if dot < -1.0 + 1e-6 {
        // Opposite vectors: half turn about any axis perpendicular to `from`
        let mut axis = Vec3::Y - from * from.y;
        if axis.length_squared() < 1e-6 {
            axis = Vec3::X - from * from.x;
        }
        return Quat::from_axis_angle(axis.normalize(), std::f32::consts::PI);
    }
    let c = from.cross(to);
    Quat::from_xyzw(c.x, c.y, c.z, 1.0 + dot).normalize()
}

/// Orientation whose +Z faces along `normal`.
///
/// General case: yaw toward the horizontal heading first, then tilt onto the
/// normal, which keeps the artwork's local X horizontal. Near-horizontal faces
/// use a single arc from +Z.
pub fn orientation_for_normal(normal: Vec3, near_horizontal: f32) -> Quat {
    if normal.y.abs() > near_horizontal {
        return shortest_arc(Vec3::Z, normal);
    }
    let heading = Vec3::new(normal.x, 0.0, normal.z).normalize_or_zero();
    if heading == Vec3::ZERO {
        return shortest_arc(Vec3::Z, normal);
    }
    shortest_arc(heading, normal) * shortest_arc(Vec3::Z, heading)
}

/// Uniform scale so that neither side exceeds `max_dimension` units.
pub fn placement_scale(size_units: Vec2, max_dimension: f32) -> f32 {
    let largest = size_units.max_element();
    if !largest.is_finite() || largest <= max_dimension {
        1.0
    } else {
        max_dimension / largest
    }
}

#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct PlacementEngine {
    pub settings: PlacementSettings,
}

impl PlacementEngine {
    pub fn new(settings: PlacementSettings) -> Self {
        Self { settings }
    }

    /// Nearest wall-tagged hit along `ray`; closer non-wall hits are skipped.
    pub fn target(&self, ray: Ray3d, scene: &impl SceneRaycast, asset: &DraggedAsset) -> Option<PlacementCandidate> {
        let hit = scene.cast_all(ray).into_iter().find(|h| h.tag == SurfaceTag::Wall)?;
        self.candidate_for_hit(&hit, asset)
    }

    pub fn candidate_for_hit(&self, hit: &SurfaceHit, asset: &DraggedAsset) -> Option<PlacementCandidate> {
        let normal = hit.normal.normalize_or_zero();
        if normal == Vec3::ZERO || !hit.point.is_finite() {
            return None;
        }

        let valid = normal.y.abs() < self.settings.vertical_epsilon;
        Some(PlacementCandidate {
            position: hit.point + normal * self.settings.surface_offset,
            orientation: orientation_for_normal(normal, self.settings.near_horizontal),
            scale: placement_scale(asset.size_units(&self.settings), self.settings.max_dimension),
            valid,
            surface: *hit,
        })
    }

    /// Run one targeting pass against the store's active session.
    ///
    /// `view` is `None` when no camera can currently produce rays.
    pub fn tick(&self, store: &mut EditorStore, view: Option<&CameraView>, scene: &impl SceneRaycast) {
        let Some(session) = store.session() else {
            return;
        };
        let pointer = session.pointer;
        let asset = session.asset.clone();

        let candidate = pointer
            .zip(view)
            .and_then(|(ndc, view)| view.ray_from_ndc(ndc))
            .and_then(|ray| self.target(ray, scene, &asset));
        store.set_candidate(candidate);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::geometry::PanelId;
    use crate::store::SessionOrigin;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    /// Scene double returning fixed hits.
    pub(crate) struct FixedHits(pub Vec<SurfaceHit>);

    impl SceneRaycast for FixedHits {
        fn cast_all(&self, _ray: Ray3d) -> Vec<SurfaceHit> {
            self.0.clone()
        }
    }

    pub(crate) fn hit(point: Vec3, normal: Vec3, distance: f32, tag: SurfaceTag, owner: PanelId) -> SurfaceHit {
        SurfaceHit { point, normal, distance, tag, owner }
    }

    pub(crate) fn asset(width_cm: f32, height_cm: f32) -> DraggedAsset {
        DraggedAsset { asset_id: 7, width_cm, height_cm, url: "/uploads/7.jpg".into() }
    }

    fn any_ray() -> Ray3d {
        Ray3d::new(Vec3::ZERO, Dir3::NEG_Z)
    }

    #[test]
    fn scenario_a_wall_facing_z() {
        let engine = PlacementEngine::default();
        let scene = FixedHits(vec![hit(Vec3::new(1.0, 1.5, 2.0), Vec3::Z, 3.0, SurfaceTag::Wall, 1)]);
        let c = engine.target(any_ray(), &scene, &asset(120.0, 80.0)).unwrap();
        assert!(c.valid);
        assert_eq!(c.scale, 1.0);
        assert_abs_diff_eq!(c.position.x, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(c.position.y, 1.5, epsilon = 1e-6);
        assert_abs_diff_eq!(c.position.z, 2.01, epsilon = 1e-6);
        assert_abs_diff_eq!(c.forward().dot(Vec3::Z), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn scenario_b_floor_gives_invalid_candidate() {
        let engine = PlacementEngine::default();
        let scene = FixedHits(vec![hit(Vec3::new(0.0, 0.0, 0.0), Vec3::Y, 2.0, SurfaceTag::Wall, 1)]);
        let c = engine.target(any_ray(), &scene, &asset(120.0, 80.0)).unwrap();
        assert!(!c.valid);
        assert_abs_diff_eq!(c.forward().dot(Vec3::Y), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn scenario_c_large_asset_is_scaled_down() {
        let engine = PlacementEngine::default();
        let scene = FixedHits(vec![hit(Vec3::ZERO, Vec3::X, 1.0, SurfaceTag::Wall, 1)]);
        let c = engine.target(any_ray(), &scene, &asset(400.0, 200.0)).unwrap();
        assert_relative_eq!(c.scale, 0.75);
        assert_relative_eq!(4.0 * c.scale, 3.0);
    }

    #[test]
    fn non_wall_hits_in_front_do_not_block() {
        let engine = PlacementEngine::default();
        let scene = FixedHits(vec![
            hit(Vec3::new(0.0, 1.0, -1.0), Vec3::Z, 1.0, SurfaceTag::Other, 8),
            hit(Vec3::new(0.0, 1.5, -4.0), Vec3::Z, 4.0, SurfaceTag::Wall, 3),
        ]);
        let c = engine.target(any_ray(), &scene, &asset(50.0, 50.0)).unwrap();
        assert_eq!(c.surface.owner, 3);
    }

    #[test]
    fn no_wall_means_no_candidate() {
        let engine = PlacementEngine::default();
        let scene = FixedHits(vec![hit(Vec3::ZERO, Vec3::Z, 1.0, SurfaceTag::Other, 8)]);
        assert!(engine.target(any_ray(), &scene, &asset(50.0, 50.0)).is_none());
        assert!(engine.target(any_ray(), &FixedHits(vec![]), &asset(50.0, 50.0)).is_none());
    }

    #[test]
    fn validity_follows_vertical_component() {
        let engine = PlacementEngine::default();
        let a = asset(50.0, 50.0);
        // Steps straddle but never land on the threshold
        for i in 0..40 {
            let ny = -0.987 + i as f32 * 0.05;
            let horizontal = (1.0 - ny * ny).max(0.0).sqrt();
            let n = Vec3::new(horizontal * 0.6, ny, horizontal * 0.8).normalize();
            let c = engine.candidate_for_hit(&hit(Vec3::ZERO, n, 1.0, SurfaceTag::Wall, 1), &a).unwrap();
            assert_eq!(c.valid, n.y.abs() < 0.1, "n = {n:?}");
            if c.valid {
                assert_abs_diff_eq!(c.forward().dot(n), 1.0, epsilon = 1e-4);
            }
        }
    }

    #[test]
    fn wall_orientation_keeps_local_x_horizontal() {
        for yaw in [0.0_f32, 0.7, 1.9, 3.1, -2.4] {
            let n = Vec3::new(yaw.sin(), 0.05, yaw.cos()).normalize();
            let q = orientation_for_normal(n, NEAR_HORIZONTAL_THRESHOLD);
            assert_abs_diff_eq!((q * Vec3::Z).dot(n), 1.0, epsilon = 1e-5);
            assert_abs_diff_eq!((q * Vec3::X).y, 0.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn facing_away_from_z_is_not_degenerate() {
        let q = orientation_for_normal(Vec3::NEG_Z, NEAR_HORIZONTAL_THRESHOLD);
        assert!(q.is_finite());
        assert_abs_diff_eq!((q * Vec3::Z).dot(Vec3::NEG_Z), 1.0, epsilon = 1e-5);

        let down = orientation_for_normal(Vec3::NEG_Y, NEAR_HORIZONTAL_THRESHOLD);
        assert_abs_diff_eq!((down * Vec3::Z).dot(Vec3::NEG_Y), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn scale_is_one_up_to_the_limit() {
        assert_eq!(placement_scale(Vec2::new(3.0, 2.0), 3.0), 1.0);
        assert_eq!(placement_scale(Vec2::new(0.5, 0.5), 3.0), 1.0);
        assert_relative_eq!(placement_scale(Vec2::new(2.0, 6.0), 3.0), 0.5);
    }

    #[test]
    fn missing_dimensions_default_to_fifty_cm() {
        let record = AssetRecord { id: 3, title: None, url: "/a.png".into(), width_cm: None, height_cm: Some(-4.0) };
        let dragged = DraggedAsset::from_record(&record, &PlacementSettings::default());
        assert_eq!(dragged.width_cm, 50.0);
        assert_eq!(dragged.height_cm, 50.0);
    }

    #[test]
    fn euler_round_trips_through_instance_rotation() {
        let engine = PlacementEngine::default();
        let n = Vec3::new(-0.6, 0.0, 0.8);
        let c = engine.candidate_for_hit(&hit(Vec3::ZERO, n, 1.0, SurfaceTag::Wall, 1), &asset(50.0, 50.0)).unwrap();
        let e = c.euler();
        let q = Quat::from_euler(EulerRot::XYZ, e.x, e.y, e.z);
        assert_abs_diff_eq!((q * Vec3::Z).dot(n), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn tick_clears_candidate_when_pointer_leaves() {
        let engine = PlacementEngine::default();
        let scene = FixedHits(vec![hit(Vec3::new(0.0, 1.5, -4.0), Vec3::Z, 4.0, SurfaceTag::Wall, 3)]);
        let view = CameraView {
            position: Vec3::new(0.0, 1.7, 0.0),
            rotation: Quat::IDENTITY,
            projection: crate::geometry::ViewProjection::Perspective { fov_y: 1.0, aspect: 1.5 },
        };
        let mut store = EditorStore::default();
        store.begin_session(asset(50.0, 50.0), SessionOrigin::Click);

        store.update_pointer(Some(Vec2::ZERO));
        engine.tick(&mut store, Some(&view), &scene);
        assert!(store.candidate().is_some());

        store.update_pointer(None);
        engine.tick(&mut store, Some(&view), &scene);
        assert!(store.candidate().is_none());
        assert!(store.session().is_some());
    }
}
