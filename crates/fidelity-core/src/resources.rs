use glam::Vec3;

use crate::culling::BoundingSphere;

/// GPU-side buffer handles. The host API doesn't collect these, so they are
/// released explicitly.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct GeometryHandle(pub u64);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TextureHandle(pub u64);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct MaterialHandle(pub u64);

/// Texture inputs a material may hold.
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TextureSlot {
    Map = 0,
    NormalMap = 1,
    RoughnessMap = 2,
    MetalnessMap = 3,
    EmissiveMap = 4,
    AoMap = 5,
    EnvMap = 6,
    LightMap = 7,
    AlphaMap = 8,
}

impl TextureSlot {
    pub const ALL: [TextureSlot; 9] = [
        TextureSlot::Map,
        TextureSlot::NormalMap,
        TextureSlot::RoughnessMap,
        TextureSlot::MetalnessMap,
        TextureSlot::EmissiveMap,
        TextureSlot::AoMap,
        TextureSlot::EnvMap,
        TextureSlot::LightMap,
        TextureSlot::AlphaMap,
    ];
}

#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub handle: Option<MaterialHandle>,
    textures: [Option<TextureHandle>; 9],
}

impl Material {
    pub fn new(handle: MaterialHandle) -> Self {
        Self {
            handle: Some(handle),
            textures: [None; 9],
        }
    }

    pub fn with_texture(mut self, slot: TextureSlot, texture: TextureHandle) -> Self {
        self.set_texture(slot, Some(texture));
        self
    }

    pub fn set_texture(&mut self, slot: TextureSlot, texture: Option<TextureHandle>) {
        self.textures[slot as usize] = texture;
    }

    pub fn texture(&self, slot: TextureSlot) -> Option<TextureHandle> {
        self.textures[slot as usize]
    }

    pub fn populated_slots(&self) -> usize {
        self.textures.iter().filter(|t| t.is_some()).count()
    }
}

/// One node of a scene subtree, as far as resources and visibility go.
#[derive(Clone, Debug)]
pub struct SceneNode {
    pub name: String,
    pub position: Vec3,
    pub visible: bool,
    /// Environment-map reflections, the first thing dropped with distance.
    pub env_reflections: bool,
    pub bounds: Option<BoundingSphere>,
    pub geometry: Option<GeometryHandle>,
    pub materials: Vec<Material>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: Vec3::ZERO,
            visible: true,
            env_reflections: true,
            bounds: None,
            geometry: None,
            materials: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_geometry(mut self, geometry: GeometryHandle) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.materials.push(material);
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_bounds(mut self, bounds: BoundingSphere) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Number of nodes below this one.
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|c| 1 + c.descendant_count())
            .sum()
    }
}

/// Host side of resource release.
pub trait GpuReleaser {
    fn release_geometry(&mut self, geometry: GeometryHandle);
    fn release_texture(&mut self, slot: TextureSlot, texture: TextureHandle);
    fn release_material(&mut self, material: MaterialHandle);
}

/// What a dispose call released.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DisposeReport {
    pub geometries: usize,
    pub materials: usize,
    pub textures: usize,
}

impl DisposeReport {
    fn absorb(&mut self, other: DisposeReport) {
        self.geometries += other.geometries;
        self.materials += other.materials;
        self.textures += other.textures;
    }
}

/// Release every texture slot, then the material. Handles are taken, so a
/// second call releases nothing.
pub fn dispose_material(material: &mut Material, releaser: &mut dyn GpuReleaser) -> DisposeReport {
    let mut report = DisposeReport::default();
    for slot in TextureSlot::ALL {
        if let Some(texture) = material.textures[slot as usize].take() {
            releaser.release_texture(slot, texture);
            report.textures += 1;
        }
    }
    if let Some(handle) = material.handle.take() {
        releaser.release_material(handle);
        report.materials += 1;
    }
    report
}

/// Release a subtree's GPU resources, children before parents.
///
/// The caller must already have detached `node` from the live scene; no
/// liveness check happens here.
pub fn dispose_object(node: &mut SceneNode, releaser: &mut dyn GpuReleaser) -> DisposeReport {
    let mut report = DisposeReport::default();
    for child in node.children.iter_mut() {
        report.absorb(dispose_object(child, releaser));
    }
    if let Some(geometry) = node.geometry.take() {
        releaser.release_geometry(geometry);
        report.geometries += 1;
    }
    for material in node.materials.iter_mut() {
        report.absorb(dispose_material(material, releaser));
    }
    log::trace!("disposed '{}': {:?}", node.name, report);
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        geometries: usize,
        textures: usize,
        materials: usize,
    }

    impl GpuReleaser for Counter {
        fn release_geometry(&mut self, _: GeometryHandle) {
            self.geometries += 1;
        }
        fn release_texture(&mut self, _: TextureSlot, _: TextureHandle) {
            self.textures += 1;
        }
        fn release_material(&mut self, _: MaterialHandle) {
            self.materials += 1;
        }
    }

    #[test]
    fn test_dispose_material_all_slots() {
        let mut material = TextureSlot::ALL
            .iter()
            .enumerate()
            .fold(Material::new(MaterialHandle(1)), |m, (i, slot)| {
                m.with_texture(*slot, TextureHandle(i as u64))
            });
        assert_eq!(material.populated_slots(), 9);

        let mut counter = Counter::default();
        let report = dispose_material(&mut material, &mut counter);
        assert_eq!(report.textures, 9);
        assert_eq!(report.materials, 1);
        assert_eq!(material.populated_slots(), 0);
        assert!(material.handle.is_none());
    }

    #[test]
    fn test_second_dispose_is_noop() {
        let mut node = SceneNode::new("plinth")
            .with_geometry(GeometryHandle(1))
            .with_material(Material::new(MaterialHandle(2)).with_texture(TextureSlot::Map, TextureHandle(3)));
        let mut counter = Counter::default();
        dispose_object(&mut node, &mut counter);
        let again = dispose_object(&mut node, &mut counter);
        assert_eq!(again, DisposeReport::default());
        assert_eq!((counter.geometries, counter.materials, counter.textures), (1, 1, 1));
    }

    #[test]
    fn test_descendant_count() {
        let node = SceneNode::new("root")
            .with_child(SceneNode::new("a").with_child(SceneNode::new("a1")))
            .with_child(SceneNode::new("b"));
        assert_eq!(node.descendant_count(), 3);
    }
}
