use glam::{Mat4, Vec3, Vec4};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::diagnostics::DiagnosticHub;
use crate::error::FidelityError;
use crate::resources::SceneNode;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    pub fn translated(&self, offset: Vec3) -> Self {
        Self::new(self.center + offset, self.radius)
    }
}

/// View frustum as six inward-facing planes (xyz = normal, w = constant).
/// Order: left, right, bottom, top, near, far.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frustum {
    pub planes: [Vec4; 6],
}

impl Frustum {
    /// Extract planes from a projection * view matrix with a -1..1 clip depth.
    pub fn from_view_projection(m: Mat4) -> Self {
        let (r0, r1, r2, r3) = (m.row(0), m.row(1), m.row(2), m.row(3));
        let planes = [r3 + r0, r3 - r0, r3 + r1, r3 - r1, r3 + r2, r3 - r2].map(normalize_plane);
        Self { planes }
    }

    pub fn intersects_sphere(&self, sphere: &BoundingSphere) -> bool {
        self.planes
            .iter()
            .all(|p| p.truncate().dot(sphere.center) + p.w >= -sphere.radius)
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|p| p.truncate().dot(point) + p.w >= 0.0)
    }
}

fn normalize_plane(p: Vec4) -> Vec4 {
    let len = p.truncate().length();
    if len > 0.0 {
        p / len
    } else {
        p
    }
}

#[cfg(feature = "parallel")]
pub trait MaybeSend: Send {}
#[cfg(feature = "parallel")]
impl<T: Send> MaybeSend for T {}

#[cfg(not(feature = "parallel"))]
pub trait MaybeSend {}
#[cfg(not(feature = "parallel"))]
impl<T> MaybeSend for T {}

/// Something the visibility helpers can hide or degrade.
pub trait Cullable {
    fn world_position(&self) -> Vec3;

    /// World-space bounds, if computed.
    fn bounds(&self) -> Option<BoundingSphere>;

    fn set_visible(&mut self, visible: bool);

    fn is_visible(&self) -> bool {
        true
    }

    fn set_env_reflections(&mut self, enabled: bool);
}

impl Cullable for SceneNode {
    fn world_position(&self) -> Vec3 {
        self.position
    }

    fn bounds(&self) -> Option<BoundingSphere> {
        self.bounds.map(|b| b.translated(self.position))
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn set_env_reflections(&mut self, enabled: bool) {
        self.env_reflections = enabled;
    }
}

/// Objects without bounds are never culled.
pub fn in_frustum(frustum: &Frustum, object: &impl Cullable) -> bool {
    match object.bounds() {
        Some(sphere) => frustum.intersects_sphere(&sphere),
        None => true,
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CullReport {
    pub visible: usize,
    /// Visible, but beyond half the distance so reflections are off.
    pub reflections_off: usize,
    pub hidden: usize,
}

impl CullReport {
    fn merge(self, other: CullReport) -> CullReport {
        CullReport {
            visible: self.visible + other.visible,
            reflections_off: self.reflections_off + other.reflections_off,
            hidden: self.hidden + other.hidden,
        }
    }
}

fn cull_one<T: Cullable>(object: &mut T, viewpoint: Vec3, max_distance: f32) -> CullReport {
    let distance = object.world_position().distance(viewpoint);
    let mut report = CullReport::default();
    if distance > max_distance {
        object.set_visible(false);
        object.set_env_reflections(false);
        report.hidden = 1;
    } else {
        let near = distance <= max_distance * 0.5;
        object.set_visible(true);
        object.set_env_reflections(near);
        report.visible = 1;
        if !near {
            report.reflections_off = 1;
        }
    }
    report
}

/// Hide objects past `max_distance` from `viewpoint`; drop environment
/// reflections past half of it.
pub fn cull_by_distance<T: Cullable + MaybeSend>(
    objects: &mut [T],
    viewpoint: Vec3,
    max_distance: f32,
) -> CullReport {
    #[cfg(feature = "parallel")]
    {
        objects
            .par_iter_mut()
            .map(|o| cull_one(o, viewpoint, max_distance))
            .reduce(CullReport::default, CullReport::merge)
    }

    #[cfg(not(feature = "parallel"))]
    {
        objects
            .iter_mut()
            .map(|o| cull_one(o, viewpoint, max_distance))
            .fold(CullReport::default(), CullReport::merge)
    }
}

/// Position of a placed item, or the origin when the data is missing.
pub fn resolve_position(position: Option<Vec3>, label: &str, diagnostics: &DiagnosticHub) -> Vec3 {
    match position {
        Some(p) if p.is_finite() => p,
        _ => {
            diagnostics.report(&FidelityError::MissingData(format!("{label} position")));
            Vec3::ZERO
        }
    }
}
