pub mod camera;
pub mod mesh;
pub mod object;
pub mod texture;

use crate::scene::camera::Camera;
use crate::scene::object::SceneObject;
use crate::scene::texture::Texture;
use std::collections::BTreeMap;

/// An owning, name-keyed collection of renderable objects plus the camera,
/// the ambient light level and an optional panoramic background.
///
/// Objects iterate in name order, which is stable within (and across)
/// frames; with opaque geometry the iteration order only decides who wins
/// exact depth ties, not image correctness.
#[derive(Default)]
pub struct Scene {
    pub camera: Camera,
    /// Flat ambient intensity added to every lit fragment.
    pub ambient_light: f32,
    /// Equirectangular background sampled by the skybox pass.
    pub skybox: Option<Texture>,
    objects: BTreeMap<String, SceneObject>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            camera: Camera::default(),
            ambient_light: 0.1,
            skybox: None,
            objects: BTreeMap::new(),
        }
    }

    pub fn with_skybox(skybox: Texture) -> Self {
        Self {
            skybox: Some(skybox),
            ..Self::new()
        }
    }

    /// Inserts or replaces the object under `name`.
    pub fn insert(&mut self, name: impl Into<String>, object: SceneObject) {
        self.objects.insert(name.into(), object);
    }

    pub fn remove(&mut self, name: &str) -> Option<SceneObject> {
        self.objects.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&SceneObject> {
        self.objects.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut SceneObject> {
        self.objects.get_mut(name)
    }

    /// Objects in stable (name) iteration order.
    pub fn objects(&self) -> impl Iterator<Item = (&str, &SceneObject)> {
        self.objects.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
