use glam::Vec3;

use crate::culling::{BoundingSphere, Cullable};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Distance along the ray to the nearest sphere hit in front of the origin.
    pub fn intersect_sphere(&self, sphere: &BoundingSphere) -> Option<f32> {
        let oc = self.origin - sphere.center;
        let b = oc.dot(self.direction);
        let c = oc.length_squared() - sphere.radius * sphere.radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        let root = disc.sqrt();
        let near = -b - root;
        if near >= 0.0 {
            return Some(near);
        }
        // origin inside the sphere
        let far = -b + root;
        (far >= 0.0).then_some(far)
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    /// Index into the slice that was tested.
    pub index: usize,
    pub distance: f32,
    pub point: Vec3,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RaycastOutcome {
    /// Hits sorted nearest first, possibly empty.
    Hits(Vec<RayHit>),
    /// Budget for this frame is spent; ask again next frame.
    Throttled,
}

impl RaycastOutcome {
    pub fn nearest(&self) -> Option<&RayHit> {
        match self {
            RaycastOutcome::Hits(hits) => hits.first(),
            RaycastOutcome::Throttled => None,
        }
    }

    pub fn is_throttled(&self) -> bool {
        matches!(self, RaycastOutcome::Throttled)
    }
}

/// Hit-testing with a per-frame budget, for hover effects driven by pointer
/// moves. Over-budget requests are refused instead of queued.
#[derive(Clone, Debug)]
pub struct ThrottledRaycaster {
    max_per_window: u32,
    window_ms: f64,
    window_start_ms: f64,
    used: u32,
}

pub const FRAME_WINDOW_MS: f64 = 16.0;

impl ThrottledRaycaster {
    pub fn new(max_per_window: u32) -> Self {
        Self::with_window(max_per_window, FRAME_WINDOW_MS)
    }

    /// Non-finite or non-positive windows fall back to one frame.
    pub fn with_window(max_per_window: u32, window_ms: f64) -> Self {
        let window_ms = if window_ms.is_finite() && window_ms > 0.0 {
            window_ms
        } else {
            log::warn!("invalid raycast window {}ms, using {}ms", window_ms, FRAME_WINDOW_MS);
            FRAME_WINDOW_MS
        };
        Self {
            max_per_window,
            window_ms,
            window_start_ms: f64::NEG_INFINITY,
            used: 0,
        }
    }

    /// Take one query from the budget at `now_ms`.
    pub fn try_acquire(&mut self, now_ms: f64) -> bool {
        if now_ms - self.window_start_ms >= self.window_ms {
            self.window_start_ms = now_ms;
            self.used = 0;
        }
        if self.used >= self.max_per_window {
            return false;
        }
        self.used += 1;
        true
    }

    /// Test `ray` against the bounds of every visible object.
    pub fn cast<T: Cullable>(&mut self, now_ms: f64, ray: &Ray, objects: &[T]) -> RaycastOutcome {
        if !self.try_acquire(now_ms) {
            return RaycastOutcome::Throttled;
        }
        let mut hits: Vec<RayHit> = objects
            .iter()
            .enumerate()
            .filter(|(_, o)| o.is_visible())
            .filter_map(|(index, o)| {
                let sphere = o.bounds()?;
                let distance = ray.intersect_sphere(&sphere)?;
                Some(RayHit {
                    index,
                    distance,
                    point: ray.at(distance),
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        RaycastOutcome::Hits(hits)
    }
}
