// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene-object wrapper with change subscriptions.
//!
//! The host editor owns the scene. Graph nodes never poll objects; instead the
//! engine registers a [`PropertyObserver`] on each bound object and every
//! write to a tracked field (position, rotation, scale, visibility) that
//! actually changes the value notifies the registered observers.

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Stable identifier of a scene object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub Uuid);

impl ObjectId {
    /// Create a new random object ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Object fields that are tracked for external mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackedField {
    /// World position
    Position,
    /// Euler rotation in radians
    Rotation,
    /// Per-axis scale
    Scale,
    /// Visibility flag
    Visible,
}

/// Notification delivered to observers when a tracked field changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyChange {
    /// Object that changed
    pub object: ObjectId,
    /// Field that changed
    pub field: TrackedField,
}

/// Receiver of tracked-field changes
pub trait PropertyObserver: Send + Sync {
    /// Called synchronously after a tracked field changed
    fn property_changed(&self, change: &PropertyChange);
}

/// Handle of a registered observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(u64);

/// Storage cell for a tracked field
#[derive(Debug, Clone, Copy, PartialEq)]
struct Tracked<T: PartialEq + Copy> {
    value: T,
}

impl<T: PartialEq + Copy> Tracked<T> {
    fn new(value: T) -> Self {
        Self { value }
    }

    fn get(&self) -> T {
        self.value
    }

    /// Replace the value, returning whether it changed
    fn replace(&mut self, value: T) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        true
    }
}

struct Watcher {
    id: WatchId,
    observer: Arc<dyn PropertyObserver>,
}

/// A live object in the host scene
pub struct SceneObject {
    id: ObjectId,
    /// Display name
    pub name: String,
    position: Tracked<[f32; 3]>,
    rotation: Tracked<[f32; 3]>,
    scale: Tracked<[f32; 3]>,
    visible: Tracked<bool>,
    watchers: Vec<Watcher>,
}

impl fmt::Debug for SceneObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneObject")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("position", &self.position.get())
            .field("rotation", &self.rotation.get())
            .field("scale", &self.scale.get())
            .field("visible", &self.visible.get())
            .field("watchers", &self.watchers.len())
            .finish()
    }
}

impl SceneObject {
    /// Create an object at the origin with unit scale
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(ObjectId::new(), name)
    }

    /// Create an object with a known id (used by hosts restoring scenes)
    pub fn with_id(id: ObjectId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            position: Tracked::new([0.0; 3]),
            rotation: Tracked::new([0.0; 3]),
            scale: Tracked::new([1.0; 3]),
            visible: Tracked::new(true),
            watchers: Vec::new(),
        }
    }

    /// Object id
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Current position
    pub fn position(&self) -> [f32; 3] {
        self.position.get()
    }

    /// Current rotation
    pub fn rotation(&self) -> [f32; 3] {
        self.rotation.get()
    }

    /// Current scale
    pub fn scale(&self) -> [f32; 3] {
        self.scale.get()
    }

    /// Current visibility
    pub fn visible(&self) -> bool {
        self.visible.get()
    }

    /// Set the position and notify observers if it changed
    pub fn set_position(&mut self, value: [f32; 3]) {
        if self.position.replace(value) {
            self.notify(TrackedField::Position);
        }
    }

    /// Set the rotation and notify observers if it changed
    pub fn set_rotation(&mut self, value: [f32; 3]) {
        if self.rotation.replace(value) {
            self.notify(TrackedField::Rotation);
        }
    }

    /// Set the scale and notify observers if it changed
    pub fn set_scale(&mut self, value: [f32; 3]) {
        if self.scale.replace(value) {
            self.notify(TrackedField::Scale);
        }
    }

    /// Set the visibility and notify observers if it changed
    pub fn set_visible(&mut self, value: bool) {
        if self.visible.replace(value) {
            self.notify(TrackedField::Visible);
        }
    }

    /// Number of registered observers
    pub fn watcher_count(&self) -> usize {
        self.watchers.len()
    }

    fn notify(&self, field: TrackedField) {
        let change = PropertyChange {
            object: self.id,
            field,
        };
        for watcher in &self.watchers {
            watcher.observer.property_changed(&change);
        }
    }
}

/// Collection of scene objects owned by the host
#[derive(Debug, Default)]
pub struct Scene {
    objects: IndexMap<ObjectId, SceneObject>,
    next_watch_id: u64,
}

/// Scene handle shared between the host and the graph engine
pub type SharedScene = Arc<RwLock<Scene>>;

impl Scene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap the scene in a shared handle
    pub fn into_shared(self) -> SharedScene {
        Arc::new(RwLock::new(self))
    }

    /// Insert an object, returning its id
    pub fn insert(&mut self, object: SceneObject) -> ObjectId {
        let id = object.id;
        self.objects.insert(id, object);
        id
    }

    /// Remove an object; its observers are dropped with it
    pub fn remove(&mut self, id: ObjectId) -> Option<SceneObject> {
        self.objects.shift_remove(&id)
    }

    /// Get an object
    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(&id)
    }

    /// Get a mutable object
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.get_mut(&id)
    }

    /// Check whether an object exists
    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    /// All objects in insertion order
    pub fn objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.values()
    }

    /// Register an observer for an object's tracked fields
    pub fn watch(&mut self, id: ObjectId, observer: Arc<dyn PropertyObserver>) -> Option<WatchId> {
        let watch_id = WatchId(self.next_watch_id);
        let object = self.objects.get_mut(&id)?;
        self.next_watch_id += 1;
        object.watchers.push(Watcher {
            id: watch_id,
            observer,
        });
        Some(watch_id)
    }

    /// Remove a previously registered observer
    pub fn unwatch(&mut self, id: ObjectId, watch_id: WatchId) -> bool {
        let Some(object) = self.objects.get_mut(&id) else {
            return false;
        };
        let before = object.watchers.len();
        object.watchers.retain(|w| w.id != watch_id);
        object.watchers.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<PropertyChange>>);

    impl PropertyObserver for Recorder {
        fn property_changed(&self, change: &PropertyChange) {
            self.0.lock().push(*change);
        }
    }

    #[test]
    fn test_only_real_changes_notify() {
        let mut scene = Scene::new();
        let id = scene.insert(SceneObject::new("Cube"));
        let recorder = Arc::new(Recorder::default());
        scene.watch(id, recorder.clone()).unwrap();

        let object = scene.get_mut(id).unwrap();
        object.set_position([1.0, 0.0, 0.0]);
        object.set_position([1.0, 0.0, 0.0]);
        object.set_visible(false);

        let changes = recorder.0.lock();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].field, TrackedField::Position);
        assert_eq!(changes[1].field, TrackedField::Visible);
    }

    #[test]
    fn test_unwatch_stops_notifications() {
        let mut scene = Scene::new();
        let id = scene.insert(SceneObject::new("Light"));
        let recorder = Arc::new(Recorder::default());
        let watch = scene.watch(id, recorder.clone()).unwrap();

        assert!(scene.unwatch(id, watch));
        assert!(!scene.unwatch(id, watch));
        scene.get_mut(id).unwrap().set_scale([2.0; 3]);
        assert!(recorder.0.lock().is_empty());
        assert!(scene.watch(ObjectId::new(), recorder).is_none());
    }
}
