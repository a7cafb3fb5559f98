use std::collections::HashSet;

use fidelity_core::resources::{
    dispose_object, DisposeReport, GeometryHandle, GpuReleaser, Material, MaterialHandle,
    SceneNode, TextureHandle, TextureSlot,
};

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
enum Released {
    Geometry(u64),
    Texture(u64),
    Material(u64),
}

#[derive(Default)]
struct Recorder {
    order: Vec<Released>,
}

impl GpuReleaser for Recorder {
    fn release_geometry(&mut self, geometry: GeometryHandle) {
        self.order.push(Released::Geometry(geometry.0));
    }

    fn release_texture(&mut self, _slot: TextureSlot, texture: TextureHandle) {
        self.order.push(Released::Texture(texture.0));
    }

    fn release_material(&mut self, material: MaterialHandle) {
        self.order.push(Released::Material(material.0));
    }
}

/// Node `id` with one geometry and one two-texture material, ids derived
/// from `id` so every handle is unique.
fn exhibit(id: u64) -> SceneNode {
    SceneNode::new(format!("exhibit-{id}"))
        .with_geometry(GeometryHandle(id))
        .with_material(
            Material::new(MaterialHandle(id))
                .with_texture(TextureSlot::Map, TextureHandle(id * 10))
                .with_texture(TextureSlot::NormalMap, TextureHandle(id * 10 + 1)),
        )
}

fn gallery(depth: u32, next_id: &mut u64) -> SceneNode {
    *next_id += 1;
    let mut node = exhibit(*next_id);
    if depth > 0 {
        for _ in 0..2 {
            node = node.with_child(gallery(depth - 1, next_id));
        }
    }
    node
}

#[test]
fn test_every_handle_released_exactly_once() {
    let mut id = 0;
    let mut root = gallery(3, &mut id);
    let nodes = 1 + root.descendant_count();
    assert_eq!(nodes, 15);

    let mut recorder = Recorder::default();
    let report = dispose_object(&mut root, &mut recorder);

    assert_eq!(
        report,
        DisposeReport {
            geometries: nodes,
            materials: nodes,
            textures: nodes * 2,
        }
    );
    let unique: HashSet<Released> = recorder.order.iter().copied().collect();
    assert_eq!(unique.len(), recorder.order.len(), "a handle was released twice");
}

#[test]
fn test_children_released_before_parent() {
    let mut root = exhibit(1).with_child(exhibit(2).with_child(exhibit(3)));
    let mut recorder = Recorder::default();
    dispose_object(&mut root, &mut recorder);

    let position = |r: Released| recorder.order.iter().position(|x| *x == r).unwrap();
    assert!(position(Released::Geometry(3)) < position(Released::Geometry(2)));
    assert!(position(Released::Material(2)) < position(Released::Geometry(1)));
    // textures go before the material that held them
    assert!(position(Released::Texture(10)) < position(Released::Material(1)));
}

#[test]
fn test_shared_subtree_disposed_twice_is_harmless() {
    let mut root = exhibit(1).with_child(exhibit(2));
    let mut recorder = Recorder::default();
    dispose_object(&mut root, &mut recorder);
    let first = recorder.order.len();

    let again = dispose_object(&mut root, &mut recorder);
    assert_eq!(again, DisposeReport::default());
    assert_eq!(recorder.order.len(), first);
}

#[test]
fn test_empty_slots_skipped() {
    let mut node = SceneNode::new("bare").with_material(Material::new(MaterialHandle(9)));
    let mut recorder = Recorder::default();
    let report = dispose_object(&mut node, &mut recorder);
    assert_eq!(report.textures, 0);
    assert_eq!(recorder.order, vec![Released::Material(9)]);
}
